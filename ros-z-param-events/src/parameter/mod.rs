//! Subscriptions to ROS 2 parameter events.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │  ParameterEventsSubscriber                                     │
//! │  ├── sub: ZSub on /parameter_events (CDR ParameterEvent)       │
//! │  └── dispatcher: Arc<ParameterEventDispatcher>                 │
//! │      └── ReentrantMutex<RefCell<CallbackRegistry>>             │
//! │          ├── event_callbacks:     [Weak<EventHandle>]          │
//! │          └── parameter_callbacks: {(param, node) → [Weak<..>]} │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Events flow from the subscription into
//! [`ParameterEventDispatcher::on_event`], which looks every registered key
//! up in the event with [`get_parameter_from_event`]'s matching rules.

pub mod dispatcher;
pub mod error;
pub mod event;
pub mod publisher;
pub mod registry;
pub mod subscriber;
pub mod types;
pub mod wire_types;

pub use dispatcher::ParameterEventDispatcher;
pub use error::ParameterEventsError;
pub use event::{get_parameter_from_event, get_parameter_from_event_or_unset};
pub use publisher::ParameterEventPublisher;
pub use registry::{ParameterCallbackHandle, ParameterEventCallbackHandle, RegistryKey};
pub use subscriber::{ParameterEventsSubscriber, ParameterEventsSubscriberBuilder};
pub use types::{Parameter, ParameterEvent, ParameterType, ParameterValue, Time};

/// Topic on which nodes publish their parameter changes.
pub const PARAMETER_EVENTS_TOPIC: &str = "/parameter_events";
