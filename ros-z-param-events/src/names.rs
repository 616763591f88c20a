// Copyright 2025 ZettaScale Technology
//
// Name qualification for topics and node names, following ROS 2 rules

/// Errors that can occur during topic name qualification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopicNameError {
    /// Topic name is empty
    Empty,
    /// Topic name contains invalid characters
    InvalidCharacters(String),
    /// Namespace is invalid
    InvalidNamespace(String),
    /// Node name is invalid
    InvalidNodeName(String),
}

impl std::fmt::Display for TopicNameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "Topic name is empty"),
            Self::InvalidCharacters(s) => write!(f, "Topic name contains invalid characters: {}", s),
            Self::InvalidNamespace(s) => write!(f, "Invalid namespace: {}", s),
            Self::InvalidNodeName(s) => write!(f, "Invalid node name: {}", s),
        }
    }
}

impl std::error::Error for TopicNameError {}

const SEPARATOR: char = '/';

/// Components must start with a letter or underscore, followed by alphanumeric or underscores
fn is_valid_component(component: &str) -> bool {
    let bytes = component.as_bytes();
    let Some(first) = bytes.first() else {
        return false;
    };
    if !first.is_ascii_alphabetic() && *first != b'_' {
        return false;
    }
    bytes[1..].iter().all(|&b| b.is_ascii_alphanumeric() || b == b'_')
}

/// Namespaces can be empty, "/", or a series of valid components separated by "/"
pub fn validate_namespace(namespace: &str) -> Result<(), TopicNameError> {
    if namespace.is_empty() || namespace == "/" {
        return Ok(());
    }
    if namespace.ends_with(SEPARATOR) {
        return Err(TopicNameError::InvalidNamespace(
            "namespace cannot end with '/'".to_string(),
        ));
    }
    for part in namespace.split(SEPARATOR) {
        if part.is_empty() {
            continue;
        }
        if !is_valid_component(part) {
            return Err(TopicNameError::InvalidNamespace(format!(
                "invalid component '{}'",
                part
            )));
        }
    }
    Ok(())
}

pub fn validate_node_name(node_name: &str) -> Result<(), TopicNameError> {
    if node_name.is_empty() {
        return Err(TopicNameError::InvalidNodeName(
            "node name is empty".to_string(),
        ));
    }
    if !is_valid_component(node_name) {
        return Err(TopicNameError::InvalidNodeName(format!(
            "invalid node name '{}'",
            node_name
        )));
    }
    Ok(())
}

/// Fully qualified name of a node: `/<name>` in the root namespace,
/// `<namespace>/<name>` otherwise.
pub fn node_fully_qualified_name(namespace: &str, name: &str) -> String {
    if namespace.is_empty() || namespace == "/" {
        format!("/{}", name)
    } else if namespace.starts_with(SEPARATOR) {
        format!("{}/{}", namespace, name)
    } else {
        format!("/{}/{}", namespace, name)
    }
}

/// Resolve a possibly relative node name against `self_name`.
///
/// - An empty `raw_name` resolves to `self_name`.
/// - An absolute `raw_name` (leading `/`) is returned as-is.
/// - A relative `raw_name` is placed in the namespace of `self_name`. When
///   `self_name` is not absolute it carries no namespace and `raw_name` is
///   returned unchanged.
///
/// No validation happens here, malformed names are passed through.
///
/// ```
/// use ros_z_param_events::names::resolve_node_name;
///
/// assert_eq!(resolve_node_name("", "/ns/me"), "/ns/me");
/// assert_eq!(resolve_node_name("other", "/ns/me"), "/ns/other");
/// assert_eq!(resolve_node_name("other", "/me"), "/other");
/// assert_eq!(resolve_node_name("/abs/other", "/ns/me"), "/abs/other");
/// assert_eq!(resolve_node_name("other", "me"), "other");
/// ```
pub fn resolve_node_name(raw_name: &str, self_name: &str) -> String {
    if raw_name.is_empty() {
        return self_name.to_string();
    }
    if raw_name.starts_with(SEPARATOR) || !self_name.starts_with(SEPARATOR) {
        return raw_name.to_string();
    }
    // self_name starts with '/', so rfind always hits
    let namespace = self_name
        .rfind(SEPARATOR)
        .map_or("", |idx| &self_name[..idx]);
    format!("{}/{}", namespace, raw_name)
}

/// Qualify a topic name according to ROS 2 naming rules
///
/// - Absolute topics (starting with '/') are returned as-is (with trailing slash removed if present)
/// - Private topics (starting with '~') are expanded to /<namespace>/<node_name>/<topic>
/// - Relative topics are expanded to /<namespace>/<topic>
/// - Empty namespace is treated as "/"
///
/// ```
/// use ros_z_param_events::names::qualify_topic_name;
///
/// assert_eq!(qualify_topic_name("/parameter_events", "/ns", "node").unwrap(), "/parameter_events");
/// assert_eq!(qualify_topic_name("chatter", "/ns", "node").unwrap(), "/ns/chatter");
/// assert_eq!(qualify_topic_name("~my_topic", "/ns", "node").unwrap(), "/ns/node/my_topic");
/// ```
pub fn qualify_topic_name(
    topic: &str,
    namespace: &str,
    node_name: &str,
) -> Result<String, TopicNameError> {
    if topic.is_empty() {
        return Err(TopicNameError::Empty);
    }

    validate_namespace(namespace)?;
    validate_node_name(node_name)?;

    let namespace = if namespace.is_empty() || namespace == "/" {
        ""
    } else {
        namespace
    };

    let check_components = |path: &str| -> Result<(), TopicNameError> {
        for part in path.split(SEPARATOR) {
            if !part.is_empty() && !is_valid_component(part) {
                return Err(TopicNameError::InvalidCharacters(format!(
                    "invalid component '{}'",
                    part
                )));
            }
        }
        Ok(())
    };

    let qualified = if let Some(stripped) = topic.strip_prefix(SEPARATOR) {
        let stripped = stripped.strip_suffix(SEPARATOR).unwrap_or(stripped);
        if stripped.is_empty() {
            return Err(TopicNameError::InvalidCharacters(
                "topic cannot be just '/'".to_string(),
            ));
        }
        check_components(stripped)?;
        format!("/{}", stripped)
    } else if let Some(suffix) = topic.strip_prefix('~') {
        let suffix = suffix.strip_prefix(SEPARATOR).unwrap_or(suffix);
        check_components(suffix)?;
        match (namespace.is_empty(), suffix.is_empty()) {
            (true, true) => format!("/{}", node_name),
            (true, false) => format!("/{}/{}", node_name, suffix),
            (false, true) => format!("{}/{}", namespace, node_name),
            (false, false) => format!("{}/{}/{}", namespace, node_name, suffix),
        }
    } else {
        let topic = topic.strip_suffix(SEPARATOR).unwrap_or(topic);
        check_components(topic)?;
        if namespace.is_empty() {
            format!("/{}", topic)
        } else {
            format!("{}/{}", namespace, topic)
        }
    };

    Ok(qualified)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_empty_defaults_to_self() {
        assert_eq!(resolve_node_name("", "/ns/node"), "/ns/node");
        assert_eq!(resolve_node_name("", "/node"), "/node");
        assert_eq!(resolve_node_name("", "node"), "node");
    }

    #[test]
    fn test_resolve_absolute_unchanged() {
        assert_eq!(resolve_node_name("/robot1", "/ns/node"), "/robot1");
        assert_eq!(resolve_node_name("/a/b/robot1", "node"), "/a/b/robot1");
    }

    #[test]
    fn test_resolve_relative_uses_self_namespace() {
        assert_eq!(resolve_node_name("robot1", "/node"), "/robot1");
        assert_eq!(resolve_node_name("robot1", "/ns/node"), "/ns/robot1");
        assert_eq!(resolve_node_name("sub/robot1", "/a/b/node"), "/a/b/sub/robot1");
    }

    #[test]
    fn test_resolve_without_self_namespace() {
        assert_eq!(resolve_node_name("robot1", "node"), "robot1");
        assert_eq!(resolve_node_name("robot1", ""), "robot1");
    }

    #[test]
    fn test_resolve_passes_malformed_names_through() {
        assert_eq!(resolve_node_name("//robot1", "/ns/node"), "//robot1");
        assert_eq!(resolve_node_name("a//b", "/ns/node"), "/ns/a//b");
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let selves = ["/node", "/ns/node", "/a/b/node", "node", ""];
        let names = ["", "robot1", "/robot1", "ns/robot1", "/x/y", "a//b"];
        for self_name in selves {
            for name in names {
                let once = resolve_node_name(name, self_name);
                let twice = resolve_node_name(&once, self_name);
                assert_eq!(once, twice, "name={name:?} self={self_name:?}");
            }
        }
    }

    #[test]
    fn test_node_fully_qualified_name() {
        assert_eq!(node_fully_qualified_name("", "talker"), "/talker");
        assert_eq!(node_fully_qualified_name("/", "talker"), "/talker");
        assert_eq!(node_fully_qualified_name("/ns", "talker"), "/ns/talker");
        assert_eq!(node_fully_qualified_name("ns", "talker"), "/ns/talker");
    }

    #[test]
    fn test_absolute_topics() {
        assert_eq!(
            qualify_topic_name("/parameter_events", "/ns", "node").unwrap(),
            "/parameter_events"
        );
        assert_eq!(
            qualify_topic_name("/foo/bar/", "/ns", "node").unwrap(),
            "/foo/bar"
        );
    }

    #[test]
    fn test_relative_and_private_topics() {
        assert_eq!(qualify_topic_name("chatter", "", "node").unwrap(), "/chatter");
        assert_eq!(
            qualify_topic_name("foo/bar", "/ns", "node").unwrap(),
            "/ns/foo/bar"
        );
        assert_eq!(qualify_topic_name("~", "/ns", "node").unwrap(), "/ns/node");
        assert_eq!(
            qualify_topic_name("~/my_topic", "/", "node").unwrap(),
            "/node/my_topic"
        );
    }

    #[test]
    fn test_invalid_topics() {
        assert_eq!(qualify_topic_name("", "/", "node"), Err(TopicNameError::Empty));
        assert!(matches!(
            qualify_topic_name("/", "/", "node"),
            Err(TopicNameError::InvalidCharacters(_))
        ));
        assert!(matches!(
            qualify_topic_name("foo-bar", "/", "node"),
            Err(TopicNameError::InvalidCharacters(_))
        ));
        assert!(matches!(
            qualify_topic_name("chatter", "/ns/", "node"),
            Err(TopicNameError::InvalidNamespace(_))
        ));
        assert!(matches!(
            qualify_topic_name("chatter", "/ns", "123node"),
            Err(TopicNameError::InvalidNodeName(_))
        ));
    }

    #[test]
    fn test_valid_components() {
        assert!(is_valid_component("foo"));
        assert!(is_valid_component("_foo"));
        assert!(is_valid_component("foo_123"));
        assert!(!is_valid_component(""));
        assert!(!is_valid_component("123"));
        assert!(!is_valid_component("foo bar"));
    }
}
