//! # ros-z-param-events: parameter event subscriptions for ros-z nodes
//!
//! Subscribe by name to changes of ROS 2 parameters owned by any node, without
//! parsing every `/parameter_events` message yourself.
//!
//! ```rust,ignore
//! use ros_z_param_events::prelude::*;
//!
//! let ctx = ZContextBuilder::default().build()?;
//! let node = ctx.create_node("listener").build()?;
//! let events = node.create_parameter_events_subscriber().build()?;
//!
//! let handle = events.add_parameter_callback(
//!     "speed",
//!     |p: &Parameter| println!("speed is now {:?}", p.value),
//!     "/robot1",
//! );
//! // The callback stays registered while `handle` is alive.
//! ```
//!
//! The registry and dispatch logic in [`parameter`] do not depend on the
//! transport: a [`ParameterEventDispatcher`](parameter::ParameterEventDispatcher)
//! can be fed events from any source.

pub mod attachment;
mod common;
pub mod context;
pub mod entity;
pub mod msg;
pub mod names;
pub mod node;
pub mod parameter;
pub mod prelude;
pub mod pubsub;
pub mod qos;
pub mod queue;

pub use attachment::GidArray;
pub use entity::TypeInfo;
pub use parameter::ParameterEventsError;
pub use zenoh::Result;

/// Builds a configured object, consuming the builder.
///
/// Bring it into scope to call `.build()`:
///
/// ```rust,ignore
/// use ros_z_param_events::Builder;
/// let ctx = ZContextBuilder::default().build()?;
/// ```
pub trait Builder {
    type Output;
    /// Consume the builder and construct the configured object.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or if the Zenoh
    /// session or one of its declarations could not be created.
    fn build(self) -> Result<Self::Output>;
}
