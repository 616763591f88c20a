use tracing::debug;
use zenoh::Result;

use super::types::{ParameterEvent, Time};
use super::wire_types::WireParameterEvent;
use crate::msg::CdrSerdes;
use crate::pubsub::ZPub;

/// Announces parameter changes of one node.
pub struct ParameterEventPublisher {
    publisher: ZPub<WireParameterEvent, CdrSerdes<WireParameterEvent>>,
    node_name: String,
}

impl ParameterEventPublisher {
    pub(crate) fn new(
        publisher: ZPub<WireParameterEvent, CdrSerdes<WireParameterEvent>>,
        node_name: String,
    ) -> Self {
        Self {
            publisher,
            node_name,
        }
    }

    /// Fully qualified name stamped into events that leave `node` empty.
    pub fn node_name(&self) -> &str {
        &self.node_name
    }

    pub fn topic(&self) -> &str {
        &self.publisher.entity.topic
    }

    /// Publish `event`, filling a zero stamp with the current time and an
    /// empty `node` with this publisher's node.
    pub fn publish(&self, event: &ParameterEvent) -> Result<()> {
        let mut wire = event.to_wire();
        if event.stamp.is_zero() {
            let now = Time::now();
            wire.stamp.sec = now.sec;
            wire.stamp.nanosec = now.nanosec;
        }
        if event.node.is_empty() {
            wire.node = self.node_name.clone();
        }
        debug!(
            "[PARAM_EVENTS] Publishing event of {}: {} new, {} changed, {} deleted",
            wire.node,
            wire.new_parameters.len(),
            wire.changed_parameters.len(),
            wire.deleted_parameters.len()
        );
        self.publisher.publish(&wire)
    }
}
