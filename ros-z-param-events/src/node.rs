use std::sync::Arc;

use tracing::info;
use zenoh::liveliness::LivelinessToken;
use zenoh::{Result, Session, Wait};

use crate::parameter::wire_types::WireParameterEvent;
use crate::parameter::{
    PARAMETER_EVENTS_TOPIC, ParameterEventPublisher, ParameterEventsSubscriberBuilder,
};
use crate::{
    Builder,
    context::GlobalCounter,
    entity::{EndpointEntity, EntityKind, NodeEntity},
    msg::MessageTypeInfo,
    names,
    pubsub::{ZPubBuilder, ZSubBuilder},
    qos::QosProfile,
};

pub struct ZNode {
    pub entity: NodeEntity,
    session: Arc<Session>,
    counter: Arc<GlobalCounter>,
    _lv_token: LivelinessToken,
}

pub struct ZNodeBuilder {
    pub domain_id: usize,
    pub name: String,
    pub namespace: String,
    pub session: Arc<Session>,
    pub counter: Arc<GlobalCounter>,
}

impl ZNodeBuilder {
    pub fn with_namespace<S: AsRef<str>>(mut self, namespace: S) -> Self {
        self.namespace = namespace.as_ref().to_owned();
        self
    }
}

impl Builder for ZNodeBuilder {
    type Output = ZNode;

    #[tracing::instrument(name = "node_build", skip(self), fields(
        name = %self.name,
        namespace = %self.namespace
    ))]
    fn build(self) -> Result<ZNode> {
        names::validate_node_name(&self.name)
            .map_err(|e| zenoh::Error::from(format!("Failed to create node: {}", e)))?;
        names::validate_namespace(&self.namespace)
            .map_err(|e| zenoh::Error::from(format!("Failed to create node: {}", e)))?;

        let id = self.counter.increment();
        let node = NodeEntity::new(
            self.domain_id,
            self.session.zid(),
            id,
            self.name,
            self.namespace,
        );
        let lv_token = self
            .session
            .liveliness()
            .declare_token(node.lv_token_key_expr()?)
            .wait()?;
        info!("[NODE] Node ready: {}", node.fully_qualified_name());

        Ok(ZNode {
            entity: node,
            session: self.session,
            counter: self.counter,
            _lv_token: lv_token,
        })
    }
}

impl ZNode {
    /// `/<namespace>/<name>`, the name other nodes address this one by.
    pub fn fully_qualified_name(&self) -> String {
        self.entity.fully_qualified_name()
    }

    fn endpoint(&self, topic: &str, kind: EntityKind) -> EndpointEntity {
        EndpointEntity {
            id: self.counter.increment(),
            node: self.entity.clone(),
            topic: topic.to_string(),
            kind,
            ..Default::default()
        }
    }

    /// Create a publisher for the given topic
    pub fn create_pub<T>(&self, topic: &str) -> ZPubBuilder<T>
    where
        T: MessageTypeInfo,
    {
        let mut entity = self.endpoint(topic, EntityKind::Publisher);
        entity.type_info = Some(T::type_info());
        ZPubBuilder {
            entity,
            session: self.session.clone(),
            _phantom_data: Default::default(),
        }
    }

    /// Create a subscriber for the given topic
    pub fn create_sub<T>(&self, topic: &str) -> ZSubBuilder<T>
    where
        T: MessageTypeInfo,
    {
        let mut entity = self.endpoint(topic, EntityKind::Subscription);
        entity.type_info = Some(T::type_info());
        ZSubBuilder {
            entity,
            session: self.session.clone(),
            _phantom_data: Default::default(),
        }
    }

    /// Subscribe to `/parameter_events` with callbacks resolved against
    /// this node's fully qualified name.
    pub fn create_parameter_events_subscriber(&self) -> ParameterEventsSubscriberBuilder {
        let sub = self
            .create_sub::<WireParameterEvent>(PARAMETER_EVENTS_TOPIC)
            .with_qos(QosProfile::parameter_events());
        ParameterEventsSubscriberBuilder::new(sub, self.fully_qualified_name())
    }

    /// Publisher announcing this node's parameter changes on `/parameter_events`.
    pub fn create_parameter_event_publisher(&self) -> Result<ParameterEventPublisher> {
        let publisher = self
            .create_pub::<WireParameterEvent>(PARAMETER_EVENTS_TOPIC)
            .with_qos(QosProfile::parameter_events())
            .build()?;
        Ok(ParameterEventPublisher::new(
            publisher,
            self.fully_qualified_name(),
        ))
    }
}
