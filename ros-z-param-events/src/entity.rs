use sha2::Digest;
use zenoh::{Result, key_expr::KeyExpr, session::ZenohId};

use crate::{attachment::GidArray, qos::QosProfile};

const EMPTY_NAMESPACE: &str = "%";
const EMPTY_ENCLAVE: &str = "%";
/// Hash segment used by rmw_zenoh for types published without a type hash.
const TYPE_HASH_NOT_SUPPORTED: &str = "TypeHashNotSupported";
pub const ADMIN_SPACE: &str = "@ros2_lv";

#[derive(Default, Debug, Hash, Clone, PartialEq, Eq)]
pub struct NodeEntity {
    pub domain_id: usize,
    pub z_id: ZenohId,
    pub id: usize,
    pub name: String,
    pub namespace: String,
}

impl NodeEntity {
    pub fn new(
        domain_id: usize,
        z_id: ZenohId,
        id: usize,
        name: String,
        namespace: String,
    ) -> Self {
        Self {
            domain_id,
            z_id,
            id,
            name,
            namespace,
        }
    }

    pub fn fully_qualified_name(&self) -> String {
        crate::names::node_fully_qualified_name(&self.namespace, &self.name)
    }

    // <ADMIN_SPACE>/<domain_id>/<zid>/<nid>/<nid>/NN/<enclave>/<namespace>/<node_name>
    pub fn lv_token_key_expr(&self) -> Result<KeyExpr<'static>> {
        let NodeEntity {
            domain_id,
            z_id,
            id,
            name,
            namespace,
        } = self;
        let namespace = mangle_namespace(namespace);
        let kind = EntityKind::Node;
        Ok(format!(
            "{ADMIN_SPACE}/{domain_id}/{z_id}/{id}/{id}/{kind}/{EMPTY_ENCLAVE}/{namespace}/{name}"
        )
        .try_into()?)
    }
}

#[derive(Default, Debug, Hash, strum::Display, Eq, PartialEq, Clone, Copy)]
pub enum EntityKind {
    #[default]
    #[strum(serialize = "NN")]
    Node,
    #[strum(serialize = "MP")]
    Publisher,
    #[strum(serialize = "MS")]
    Subscription,
}

/// DDS-mangled type name. Types are announced without a type hash.
#[derive(Debug, Hash, PartialEq, Eq, Clone)]
pub struct TypeInfo {
    pub name: String,
}

impl TypeInfo {
    pub fn new(name: &str) -> Self {
        TypeInfo {
            name: name.to_string(),
        }
    }
}

#[derive(Default, Debug, Hash, PartialEq, Eq, Clone)]
pub struct EndpointEntity {
    pub id: usize,
    pub node: NodeEntity,
    pub kind: EntityKind,
    /// Fully qualified once the endpoint is built
    pub topic: String,
    pub type_info: Option<TypeInfo>,
    pub qos: QosProfile,
}

fn mangle_name(name: &str) -> String {
    name.replace('/', "%")
}

fn mangle_namespace(namespace: &str) -> String {
    if namespace.is_empty() {
        EMPTY_NAMESPACE.to_string()
    } else {
        mangle_name(namespace)
    }
}

impl EndpointEntity {
    /// `<domain_id>/<topic_name>/<topic_type>/<topic_type_hash>`
    ///
    /// Subscriptions match any hash, publishers announce none.
    pub fn topic_key_expr(&self) -> Result<KeyExpr<'static>> {
        let domain_id = self.node.domain_id;
        let topic = {
            let s = &self.topic;
            let s = s.strip_prefix('/').unwrap_or(s);
            let s = s.strip_suffix('/').unwrap_or(s);
            mangle_name(s)
        };
        let type_info = self
            .type_info
            .as_ref()
            .ok_or_else(|| zenoh::Error::from(format!("No type info for topic {}", self.topic)))?;
        let hash = match self.kind {
            EntityKind::Subscription => "*",
            _ => TYPE_HASH_NOT_SUPPORTED,
        };
        Ok(format!("{domain_id}/{topic}/{}/{hash}", type_info.name).try_into()?)
    }

    // <ADMIN_SPACE>/<domain_id>/<zid>/<nid>/<eid>/<entity_kind>/<enclave>/<namespace>/<node_name>/<topic_name>/<topic_type>/<topic_type_hash>/<topic_qos>
    pub fn lv_token_key_expr(&self) -> Result<KeyExpr<'static>> {
        let EndpointEntity {
            id,
            node:
                NodeEntity {
                    domain_id,
                    z_id,
                    id: node_id,
                    name: node_name,
                    namespace: node_namespace,
                },
            kind,
            topic,
            type_info,
            qos,
        } = self;

        let node_namespace = mangle_namespace(node_namespace);
        let node_name = mangle_name(node_name);
        let topic = mangle_name(topic);
        let type_info = type_info
            .as_ref()
            .ok_or_else(|| zenoh::Error::from(format!("No type info for topic {}", self.topic)))?;
        let type_name = mangle_name(&type_info.name);
        let qos = qos.encode();

        Ok(format!(
            "{ADMIN_SPACE}/{domain_id}/{z_id}/{node_id}/{id}/{kind}/{EMPTY_ENCLAVE}/{node_namespace}/{node_name}/{topic}/{type_name}/{TYPE_HASH_NOT_SUPPORTED}/{qos}",
        )
        .try_into()?)
    }

    pub fn gid(&self) -> GidArray {
        let mut gid = GidArray::default();
        let identity = format!(
            "{}/{}/{}/{}/{}",
            self.node.z_id, self.node.id, self.id, self.kind, self.topic
        );
        let hash = sha2::Sha256::digest(identity.as_bytes());
        let len = gid.len();
        gid.copy_from_slice(&hash[..len]);
        gid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint(kind: EntityKind, type_info: TypeInfo) -> EndpointEntity {
        EndpointEntity {
            id: 3,
            node: NodeEntity::new(7, ZenohId::default(), 1, "talker".into(), "/ns".into()),
            kind,
            topic: "/parameter_events".into(),
            type_info: Some(type_info),
            qos: QosProfile::default(),
        }
    }

    #[test]
    fn test_topic_key_expr_without_hash() {
        let info = TypeInfo::new("rcl_interfaces::msg::dds_::ParameterEvent_");
        let sub = endpoint(EntityKind::Subscription, info.clone());
        assert_eq!(
            sub.topic_key_expr().unwrap().as_str(),
            "7/parameter_events/rcl_interfaces::msg::dds_::ParameterEvent_/*"
        );
        let publisher = endpoint(EntityKind::Publisher, info);
        assert_eq!(
            publisher.topic_key_expr().unwrap().as_str(),
            "7/parameter_events/rcl_interfaces::msg::dds_::ParameterEvent_/TypeHashNotSupported"
        );
        // A wildcard subscription matches the publisher's key
        assert!(
            sub.topic_key_expr()
                .unwrap()
                .intersects(&publisher.topic_key_expr().unwrap())
        );
    }

    #[test]
    fn test_liveliness_key_expr() {
        let sub = endpoint(
            EntityKind::Subscription,
            TypeInfo::new("rcl_interfaces::msg::dds_::ParameterEvent_"),
        );
        let ke = sub.lv_token_key_expr().unwrap();
        assert!(ke.as_str().starts_with("@ros2_lv/7/"));
        assert!(ke.as_str().contains("/3/MS/%/%ns/talker/%parameter_events/"));
        assert!(ke.as_str().ends_with("/TypeHashNotSupported/::,10:,:,:,,"));
    }

    #[test]
    fn test_gid_is_stable_per_endpoint() {
        let info = TypeInfo::new("T");
        let a = endpoint(EntityKind::Publisher, info);
        let mut b = a.clone();
        assert_eq!(a.gid(), b.gid());
        b.id = 4;
        assert_ne!(a.gid(), b.gid());

        // Another session never shares GIDs with this one
        let mut c = a.clone();
        c.node.z_id = ZenohId::default();
        assert_ne!(a.gid(), c.gid());
    }
}
