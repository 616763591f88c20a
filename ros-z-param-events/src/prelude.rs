//! Convenience re-exports for common types.
//!
//! ```rust,ignore
//! use ros_z_param_events::prelude::*;
//! ```

pub use crate::Builder;

pub use crate::context::{ZContext, ZContextBuilder};
pub use crate::node::ZNode;

pub use crate::qos::{QosDurability, QosHistory, QosProfile, QosReliability};

pub use crate::parameter::{
    Parameter, ParameterCallbackHandle, ParameterEvent, ParameterEventCallbackHandle,
    ParameterEventDispatcher, ParameterEventPublisher, ParameterEventsError,
    ParameterEventsSubscriber, ParameterType, ParameterValue, Time, get_parameter_from_event,
    get_parameter_from_event_or_unset,
};
