use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, trace, warn};
use zenoh::Result;
use zenoh::sample::Sample;

use super::dispatcher::ParameterEventDispatcher;
use super::types::ParameterEvent;
use super::wire_types::WireParameterEvent;
use crate::Builder;
use crate::msg::CdrSerdes;
use crate::pubsub::{ZSub, ZSubBuilder};
use crate::qos::QosProfile;

type WireSerdes = CdrSerdes<WireParameterEvent>;

enum Delivery {
    /// Dispatched on the Zenoh delivery thread
    Callback(ZSub<WireParameterEvent, (), WireSerdes>),
    /// Buffered until the owner spins
    Queued(ZSub<WireParameterEvent, Sample, WireSerdes>),
}

pub struct ParameterEventsSubscriberBuilder {
    sub: ZSubBuilder<WireParameterEvent>,
    node_name: String,
}

impl ParameterEventsSubscriberBuilder {
    pub(crate) fn new(sub: ZSubBuilder<WireParameterEvent>, node_name: String) -> Self {
        Self { sub, node_name }
    }

    /// Defaults to [`QosProfile::parameter_events`].
    pub fn with_qos(mut self, qos: QosProfile) -> Self {
        self.sub = self.sub.with_qos(qos);
        self
    }

    /// Listen on another topic than `/parameter_events`, e.g. a remapped one.
    pub fn with_topic(mut self, topic: &str) -> Self {
        self.sub.entity.topic = topic.to_string();
        self
    }

    /// Build a subscriber that buffers events until [`spin_once`] or
    /// [`spin_some`] is called, keeping at most the QoS history depth.
    ///
    /// [`spin_once`]: ParameterEventsSubscriber::spin_once
    /// [`spin_some`]: ParameterEventsSubscriber::spin_some
    pub fn build_queued(self) -> Result<ParameterEventsSubscriber> {
        let dispatcher = Arc::new(ParameterEventDispatcher::new(self.node_name));
        let sub = self.sub.build()?;
        info!(
            "[PARAM_EVENTS] Queued subscriber ready: node={}, topic={}",
            dispatcher.node_name(),
            sub.entity.topic
        );
        Ok(ParameterEventsSubscriber {
            dispatcher,
            delivery: Delivery::Queued(sub),
        })
    }
}

impl Builder for ParameterEventsSubscriberBuilder {
    type Output = ParameterEventsSubscriber;

    /// Build a subscriber dispatching every event as soon as it arrives.
    #[tracing::instrument(name = "param_events_build", skip(self), fields(
        node = %self.node_name,
        qos = %self.sub.entity.qos
    ))]
    fn build(self) -> Result<ParameterEventsSubscriber> {
        let dispatcher = Arc::new(ParameterEventDispatcher::new(self.node_name));
        let target = dispatcher.clone();
        let sub = self.sub.build_with_callback(move |wire: WireParameterEvent| {
            target.on_event(&ParameterEvent::from_wire(wire));
        })?;
        info!(
            "[PARAM_EVENTS] Subscriber ready: node={}, topic={}",
            dispatcher.node_name(),
            sub.entity.topic
        );
        Ok(ParameterEventsSubscriber {
            dispatcher,
            delivery: Delivery::Callback(sub),
        })
    }
}

/// Subscription to parameter events with per-parameter callback dispatch.
///
/// Derefs to its [`ParameterEventDispatcher`], so callbacks are registered
/// directly on the subscriber. Dropping it ends the subscription.
pub struct ParameterEventsSubscriber {
    dispatcher: Arc<ParameterEventDispatcher>,
    delivery: Delivery,
}

impl ParameterEventsSubscriber {
    pub fn dispatcher(&self) -> &Arc<ParameterEventDispatcher> {
        &self.dispatcher
    }

    pub fn qos(&self) -> QosProfile {
        match &self.delivery {
            Delivery::Callback(sub) => sub.entity.qos,
            Delivery::Queued(sub) => sub.entity.qos,
        }
    }

    pub fn topic(&self) -> &str {
        match &self.delivery {
            Delivery::Callback(sub) => &sub.entity.topic,
            Delivery::Queued(sub) => &sub.entity.topic,
        }
    }

    pub fn is_queued(&self) -> bool {
        matches!(self.delivery, Delivery::Queued(_))
    }

    /// Dispatch one buffered event, waiting up to `timeout` for it.
    ///
    /// Returns `true` if an event was dispatched. A buffered event that fails
    /// to decode is logged and dropped, returning `false`. Always `false` for a
    /// subscriber built with [`Builder::build`], which dispatches on arrival.
    pub fn spin_once(&self, timeout: Duration) -> bool {
        let Delivery::Queued(sub) = &self.delivery else {
            return false;
        };
        match sub.recv_timeout(timeout) {
            Some(Ok(wire)) => {
                self.dispatcher.on_event(&ParameterEvent::from_wire(wire));
                true
            }
            Some(Err(e)) => {
                warn!("[PARAM_EVENTS] Dropping undecodable event: {}", e);
                false
            }
            None => {
                trace!("[PARAM_EVENTS] No event within {:?}", timeout);
                false
            }
        }
    }

    /// Dispatch every buffered event without waiting, returning how many were.
    pub fn spin_some(&self) -> usize {
        let Delivery::Queued(sub) = &self.delivery else {
            return 0;
        };
        let mut dispatched = 0;
        while let Some(received) = sub.try_recv() {
            match received {
                Ok(wire) => {
                    self.dispatcher.on_event(&ParameterEvent::from_wire(wire));
                    dispatched += 1;
                }
                Err(e) => warn!("[PARAM_EVENTS] Dropping undecodable event: {}", e),
            }
        }
        dispatched
    }
}

impl Deref for ParameterEventsSubscriber {
    type Target = ParameterEventDispatcher;

    fn deref(&self) -> &Self::Target {
        &self.dispatcher
    }
}
