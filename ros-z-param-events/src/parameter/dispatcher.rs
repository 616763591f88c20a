//! Dispatch of received parameter events to registered callbacks.

use std::cell::RefCell;
use std::sync::Arc;

use parking_lot::ReentrantMutex;
use tracing::{debug, trace};

use super::error::ParameterEventsError;
use super::event::match_parameter;
use super::registry::{
    CallbackRegistry, ParameterCallbackHandle, ParameterEventCallbackHandle, RegistryKey,
};
use super::types::{Parameter, ParameterEvent};
use crate::names::resolve_node_name;

/// Callback registry of one subscriber together with the lock guarding it.
///
/// Every registration, removal and dispatch goes through the same reentrant
/// lock: dispatch from different threads is serialized, while a callback
/// running inside [`on_event`](Self::on_event) may register or remove
/// callbacks on the same thread. Callbacks are invoked on a snapshot taken
/// when the event arrives, so such changes take effect from the next event.
pub struct ParameterEventDispatcher {
    /// Fully qualified name used when a caller omits the node name.
    node_name: String,
    registry: ReentrantMutex<RefCell<CallbackRegistry>>,
}

impl ParameterEventDispatcher {
    pub fn new(node_name: impl Into<String>) -> Self {
        Self {
            node_name: node_name.into(),
            registry: ReentrantMutex::new(RefCell::new(CallbackRegistry::new())),
        }
    }

    /// Name of the node this dispatcher resolves relative names against.
    pub fn node_name(&self) -> &str {
        &self.node_name
    }

    /// Canonical form of `node_name`, empty meaning this dispatcher's node.
    pub fn resolve_node_name(&self, node_name: &str) -> String {
        resolve_node_name(node_name, &self.node_name)
    }

    /// Register a callback receiving every event, whatever its content.
    ///
    /// The callback stays registered while the returned handle is alive.
    pub fn add_parameter_event_callback<F>(&self, callback: F) -> Arc<ParameterEventCallbackHandle>
    where
        F: Fn(&ParameterEvent) + Send + Sync + 'static,
    {
        let handle = Arc::new(ParameterEventCallbackHandle {
            callback: Box::new(callback),
        });
        let registry = self.registry.lock();
        registry.borrow_mut().add_event_callback(&handle);
        debug!("[PARAM_EVENTS] Added parameter event callback");
        handle
    }

    /// Unregister a whole-event callback.
    ///
    /// Fails with [`ParameterEventsError::EventCallbackNotFound`] if the
    /// handle was never registered here or was already removed.
    pub fn remove_parameter_event_callback(
        &self,
        handle: &ParameterEventCallbackHandle,
    ) -> Result<(), ParameterEventsError> {
        let registry = self.registry.lock();
        let result = registry.borrow_mut().remove_event_callback(handle);
        debug!("[PARAM_EVENTS] Removed parameter event callback: {:?}", result);
        result
    }

    /// Register a callback for `parameter_name` of `node_name`.
    ///
    /// An empty `node_name` means this dispatcher's own node, a relative one
    /// is resolved in its namespace. The callback fires whenever an event of
    /// that node sets, changes or deletes the parameter; deletions deliver
    /// [`ParameterValue::NotSet`](super::ParameterValue::NotSet).
    pub fn add_parameter_callback<F>(
        &self,
        parameter_name: &str,
        callback: F,
        node_name: &str,
    ) -> Arc<ParameterCallbackHandle>
    where
        F: Fn(&Parameter) + Send + Sync + 'static,
    {
        let handle = Arc::new(ParameterCallbackHandle {
            parameter_name: parameter_name.to_string(),
            node_name: self.resolve_node_name(node_name),
            callback: Box::new(callback),
        });
        let registry = self.registry.lock();
        registry.borrow_mut().add_parameter_callback(&handle);
        debug!(
            "[PARAM_EVENTS] Added callback: parameter={}, node={}",
            handle.parameter_name, handle.node_name
        );
        handle
    }

    /// Unregister a single per-parameter callback, identified by its handle.
    pub fn remove_parameter_callback(
        &self,
        handle: &ParameterCallbackHandle,
    ) -> Result<(), ParameterEventsError> {
        let registry = self.registry.lock();
        let result = registry.borrow_mut().remove_parameter_callback(handle);
        debug!(
            "[PARAM_EVENTS] Removed callback: parameter={}, node={}, result={:?}",
            handle.parameter_name, handle.node_name, result
        );
        result
    }

    /// Unregister every callback of `parameter_name` of `node_name`.
    ///
    /// Fails with [`ParameterEventsError::ParameterCallbackNotFound`] if no
    /// callback is registered under that key.
    pub fn remove_parameter_callbacks(
        &self,
        parameter_name: &str,
        node_name: &str,
    ) -> Result<(), ParameterEventsError> {
        let key = RegistryKey::new(parameter_name, self.resolve_node_name(node_name));
        let registry = self.registry.lock();
        let removed = registry.borrow_mut().remove_parameter_callbacks(&key)?;
        debug!(
            "[PARAM_EVENTS] Removed {} callback(s): parameter={}, node={}",
            removed, key.parameter_name, key.node_name
        );
        Ok(())
    }

    /// Number of live whole-event callbacks.
    pub fn event_callback_count(&self) -> usize {
        let registry = self.registry.lock();
        registry.borrow_mut().event_callback_count()
    }

    /// Number of live per-parameter callbacks, over all keys.
    pub fn parameter_callback_count(&self) -> usize {
        let registry = self.registry.lock();
        registry.borrow_mut().parameter_callback_count()
    }

    pub fn has_parameter_callbacks(&self, parameter_name: &str, node_name: &str) -> bool {
        let key = RegistryKey::new(parameter_name, self.resolve_node_name(node_name));
        let registry = self.registry.lock();
        registry.borrow_mut().has_parameter_callbacks(&key)
    }

    /// Deliver one event.
    ///
    /// Whole-event callbacks run first, in registration order. Then, for each
    /// registered (parameter, node) key in the order keys were first
    /// registered, the callbacks of that key run in registration order if the
    /// event mentions the parameter.
    ///
    /// A panicking callback is not caught; the registry stays consistent.
    pub fn on_event(&self, event: &ParameterEvent) {
        let registry = self.registry.lock();
        let (event_callbacks, parameter_callbacks) = {
            let mut registry = registry.borrow_mut();
            (
                registry.snapshot_event_callbacks(),
                registry.snapshot_parameter_callbacks(),
            )
        };
        trace!(
            "[PARAM_EVENTS] Dispatching event from {}: {} event callback(s), {} key(s)",
            event.node,
            event_callbacks.len(),
            parameter_callbacks.len()
        );

        for handle in &event_callbacks {
            handle.invoke(event);
        }

        for (key, callbacks) in &parameter_callbacks {
            let Some(parameter) = match_parameter(event, &key.parameter_name, &key.node_name)
            else {
                continue;
            };
            trace!(
                "[PARAM_EVENTS] {} of {} matched, {} callback(s)",
                key.parameter_name,
                key.node_name,
                callbacks.len()
            );
            for handle in callbacks {
                handle.invoke(&parameter);
            }
        }
    }
}
