//! Registration tables for parameter event callbacks.
//!
//! The tables hold `Weak` references only. A registration is live while the
//! caller keeps the `Arc` handle returned at registration; entries whose
//! handle has been dropped are pruned on the next snapshot or removal.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use super::error::ParameterEventsError;
use super::types::{Parameter, ParameterEvent};

pub type ParameterCallback = Box<dyn Fn(&Parameter) + Send + Sync>;
pub type ParameterEventCallback = Box<dyn Fn(&ParameterEvent) + Send + Sync>;

/// Handle of a per-parameter registration.
///
/// The registration stays active for as long as this handle is alive.
pub struct ParameterCallbackHandle {
    pub parameter_name: String,
    /// Canonical name of the node owning the parameter.
    pub node_name: String,
    pub(crate) callback: ParameterCallback,
}

impl ParameterCallbackHandle {
    pub(crate) fn key(&self) -> RegistryKey {
        RegistryKey::new(&self.parameter_name, &self.node_name)
    }

    pub(crate) fn invoke(&self, parameter: &Parameter) {
        (self.callback)(parameter)
    }
}

impl fmt::Debug for ParameterCallbackHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterCallbackHandle")
            .field("parameter_name", &self.parameter_name)
            .field("node_name", &self.node_name)
            .finish_non_exhaustive()
    }
}

/// Handle of a whole-event registration.
pub struct ParameterEventCallbackHandle {
    pub(crate) callback: ParameterEventCallback,
}

impl ParameterEventCallbackHandle {
    pub(crate) fn invoke(&self, event: &ParameterEvent) {
        (self.callback)(event)
    }
}

impl fmt::Debug for ParameterEventCallbackHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterEventCallbackHandle")
            .finish_non_exhaustive()
    }
}

/// (parameter name, canonical node name). Both components compare exactly.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegistryKey {
    pub parameter_name: String,
    pub node_name: String,
}

impl RegistryKey {
    pub fn new(parameter_name: impl Into<String>, node_name: impl Into<String>) -> Self {
        Self {
            parameter_name: parameter_name.into(),
            node_name: node_name.into(),
        }
    }

    fn not_found(&self) -> ParameterEventsError {
        ParameterEventsError::ParameterCallbackNotFound {
            parameter_name: self.parameter_name.clone(),
            node_name: self.node_name.clone(),
        }
    }
}

struct KeyedCallbacks {
    /// Position of the key in dispatch order
    seq: u64,
    callbacks: Vec<Weak<ParameterCallbackHandle>>,
}

/// Live callbacks of one key, taken out of the table for dispatch.
pub(crate) type KeySnapshot = (RegistryKey, Vec<Arc<ParameterCallbackHandle>>);

/// Per-parameter and whole-event registration tables.
///
/// Not synchronized; [`ParameterEventDispatcher`](super::ParameterEventDispatcher)
/// owns one behind its lock.
#[derive(Default)]
pub struct CallbackRegistry {
    parameter_callbacks: HashMap<RegistryKey, KeyedCallbacks>,
    event_callbacks: Vec<Weak<ParameterEventCallbackHandle>>,
    next_seq: u64,
}

fn is_handle<T>(weak: &Weak<T>, handle: &T) -> bool {
    std::ptr::eq(weak.as_ptr(), handle)
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_event_callback(&mut self, handle: &Arc<ParameterEventCallbackHandle>) {
        self.event_callbacks.push(Arc::downgrade(handle));
    }

    pub fn remove_event_callback(
        &mut self,
        handle: &ParameterEventCallbackHandle,
    ) -> Result<(), ParameterEventsError> {
        self.event_callbacks.retain(|w| w.strong_count() > 0);
        let idx = self
            .event_callbacks
            .iter()
            .position(|w| is_handle(w, handle))
            .ok_or(ParameterEventsError::EventCallbackNotFound)?;
        self.event_callbacks.remove(idx);
        Ok(())
    }

    pub fn add_parameter_callback(&mut self, handle: &Arc<ParameterCallbackHandle>) {
        let key = handle.key();
        let next_seq = &mut self.next_seq;
        self.parameter_callbacks
            .entry(key)
            .or_insert_with(|| {
                let seq = *next_seq;
                *next_seq += 1;
                KeyedCallbacks {
                    seq,
                    callbacks: Vec::new(),
                }
            })
            .callbacks
            .push(Arc::downgrade(handle));
    }

    /// Remove one registration. The key is taken from the handle itself.
    pub fn remove_parameter_callback(
        &mut self,
        handle: &ParameterCallbackHandle,
    ) -> Result<(), ParameterEventsError> {
        let key = handle.key();
        let Some(entry) = self.parameter_callbacks.get_mut(&key) else {
            return Err(key.not_found());
        };
        entry.callbacks.retain(|w| w.strong_count() > 0);
        let found = entry
            .callbacks
            .iter()
            .position(|w| is_handle(w, handle))
            .map(|idx| entry.callbacks.remove(idx))
            .is_some();
        if entry.callbacks.is_empty() {
            self.parameter_callbacks.remove(&key);
        }
        if found { Ok(()) } else { Err(key.not_found()) }
    }

    /// Remove every registration under `key` at once.
    pub fn remove_parameter_callbacks(
        &mut self,
        key: &RegistryKey,
    ) -> Result<usize, ParameterEventsError> {
        let entry = self
            .parameter_callbacks
            .remove(key)
            .ok_or_else(|| key.not_found())?;
        let live = entry
            .callbacks
            .iter()
            .filter(|w| w.strong_count() > 0)
            .count();
        if live == 0 {
            return Err(key.not_found());
        }
        Ok(live)
    }

    /// Live whole-event callbacks in registration order. Stale entries are
    /// dropped from the table.
    pub(crate) fn snapshot_event_callbacks(&mut self) -> Vec<Arc<ParameterEventCallbackHandle>> {
        let mut live = Vec::with_capacity(self.event_callbacks.len());
        self.event_callbacks.retain(|w| match w.upgrade() {
            Some(handle) => {
                live.push(handle);
                true
            }
            None => false,
        });
        live
    }

    /// Live per-parameter callbacks grouped by key, keys in the order they
    /// were first registered. Stale entries and emptied keys are dropped.
    pub(crate) fn snapshot_parameter_callbacks(&mut self) -> Vec<KeySnapshot> {
        let mut snapshot = Vec::with_capacity(self.parameter_callbacks.len());
        self.parameter_callbacks.retain(|key, entry| {
            let mut live = Vec::with_capacity(entry.callbacks.len());
            entry.callbacks.retain(|w| match w.upgrade() {
                Some(handle) => {
                    live.push(handle);
                    true
                }
                None => false,
            });
            if live.is_empty() {
                return false;
            }
            snapshot.push((entry.seq, key.clone(), live));
            true
        });
        snapshot.sort_unstable_by_key(|(seq, _, _)| *seq);
        snapshot
            .into_iter()
            .map(|(_, key, live)| (key, live))
            .collect()
    }

    pub fn event_callback_count(&mut self) -> usize {
        self.event_callbacks.retain(|w| w.strong_count() > 0);
        self.event_callbacks.len()
    }

    pub fn parameter_callback_count(&mut self) -> usize {
        self.prune_parameter_callbacks();
        self.parameter_callbacks
            .values()
            .map(|entry| entry.callbacks.len())
            .sum()
    }

    pub fn has_parameter_callbacks(&mut self, key: &RegistryKey) -> bool {
        self.prune_parameter_callbacks();
        self.parameter_callbacks.contains_key(key)
    }

    fn prune_parameter_callbacks(&mut self) {
        self.parameter_callbacks.retain(|_, entry| {
            entry.callbacks.retain(|w| w.strong_count() > 0);
            !entry.callbacks.is_empty()
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn param_handle(
        name: &str,
        node: &str,
        log: &Arc<Mutex<Vec<String>>>,
        tag: &'static str,
    ) -> Arc<ParameterCallbackHandle> {
        let log = log.clone();
        Arc::new(ParameterCallbackHandle {
            parameter_name: name.to_string(),
            node_name: node.to_string(),
            callback: Box::new(move |_| log.lock().unwrap().push(tag.to_string())),
        })
    }

    fn event_handle() -> Arc<ParameterEventCallbackHandle> {
        Arc::new(ParameterEventCallbackHandle {
            callback: Box::new(|_| {}),
        })
    }

    #[test]
    fn test_event_callbacks_keep_order_and_remove_by_identity() {
        let mut registry = CallbackRegistry::new();
        let first = event_handle();
        let second = event_handle();
        registry.add_event_callback(&first);
        registry.add_event_callback(&second);

        let snapshot = registry.snapshot_event_callbacks();
        assert!(Arc::ptr_eq(&snapshot[0], &first));
        assert!(Arc::ptr_eq(&snapshot[1], &second));
        drop(snapshot);

        registry.remove_event_callback(&first).unwrap();
        assert_eq!(registry.event_callback_count(), 1);
        assert_eq!(
            registry.remove_event_callback(&first),
            Err(ParameterEventsError::EventCallbackNotFound)
        );
    }

    #[test]
    fn test_unknown_event_handle_is_not_found() {
        let mut registry = CallbackRegistry::new();
        let never_added = event_handle();
        assert!(registry.remove_event_callback(&never_added).is_err());
    }

    #[test]
    fn test_dropped_handles_are_pruned() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = CallbackRegistry::new();
        let kept = param_handle("speed", "/robot1", &log, "kept");
        let dropped = param_handle("speed", "/robot1", &log, "dropped");
        let other = param_handle("mode", "/robot1", &log, "other");
        registry.add_parameter_callback(&kept);
        registry.add_parameter_callback(&dropped);
        registry.add_parameter_callback(&other);
        assert_eq!(registry.parameter_callback_count(), 3);

        drop(dropped);
        drop(other);
        let snapshot = registry.snapshot_parameter_callbacks();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].0, RegistryKey::new("speed", "/robot1"));
        assert_eq!(snapshot[0].1.len(), 1);
        assert!(!registry.has_parameter_callbacks(&RegistryKey::new("mode", "/robot1")));

        let event = event_handle();
        registry.add_event_callback(&event);
        drop(event);
        assert!(registry.snapshot_event_callbacks().is_empty());
        assert_eq!(registry.event_callback_count(), 0);
    }

    #[test]
    fn test_snapshot_orders_keys_by_first_registration() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = CallbackRegistry::new();
        let names = ["c", "a", "d", "b", "e"];
        let handles: Vec<_> = names
            .iter()
            .map(|n| param_handle(n, "/node", &log, "x"))
            .collect();
        for handle in &handles {
            registry.add_parameter_callback(handle);
        }
        // A later registration on an existing key keeps the key's position
        let extra = param_handle("c", "/node", &log, "y");
        registry.add_parameter_callback(&extra);

        let order: Vec<_> = registry
            .snapshot_parameter_callbacks()
            .into_iter()
            .map(|(key, live)| (key.parameter_name, live.len()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("c".to_string(), 2),
                ("a".to_string(), 1),
                ("d".to_string(), 1),
                ("b".to_string(), 1),
                ("e".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_remove_single_handle_drops_empty_key() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = CallbackRegistry::new();
        let first = param_handle("speed", "/robot1", &log, "1");
        let second = param_handle("speed", "/robot1", &log, "2");
        registry.add_parameter_callback(&first);
        registry.add_parameter_callback(&second);

        registry.remove_parameter_callback(&first).unwrap();
        assert!(registry.has_parameter_callbacks(&first.key()));
        registry.remove_parameter_callback(&second).unwrap();
        assert!(!registry.has_parameter_callbacks(&first.key()));

        assert_eq!(
            registry.remove_parameter_callback(&second),
            Err(ParameterEventsError::ParameterCallbackNotFound {
                parameter_name: "speed".to_string(),
                node_name: "/robot1".to_string(),
            })
        );
    }

    #[test]
    fn test_remove_handle_never_matches_same_key_other_handle() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = CallbackRegistry::new();
        let registered = param_handle("speed", "/robot1", &log, "1");
        let stranger = param_handle("speed", "/robot1", &log, "2");
        registry.add_parameter_callback(&registered);

        assert!(registry.remove_parameter_callback(&stranger).is_err());
        assert_eq!(registry.parameter_callback_count(), 1);
    }

    #[test]
    fn test_bulk_remove_by_key() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = CallbackRegistry::new();
        let a = param_handle("speed", "/robot1", &log, "a");
        let b = param_handle("speed", "/robot1", &log, "b");
        let c = param_handle("speed", "/robot2", &log, "c");
        for h in [&a, &b, &c] {
            registry.add_parameter_callback(h);
        }

        let key = RegistryKey::new("speed", "/robot1");
        assert_eq!(registry.remove_parameter_callbacks(&key), Ok(2));
        assert!(registry.remove_parameter_callbacks(&key).is_err());
        assert_eq!(registry.parameter_callback_count(), 1);

        // Removing the whole key leaves the individual handles unknown
        assert!(registry.remove_parameter_callback(&a).is_err());
    }

    #[test]
    fn test_bulk_remove_of_only_stale_entries_is_not_found() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = CallbackRegistry::new();
        let a = param_handle("speed", "/robot1", &log, "a");
        registry.add_parameter_callback(&a);
        drop(a);
        assert!(
            registry
                .remove_parameter_callbacks(&RegistryKey::new("speed", "/robot1"))
                .is_err()
        );
    }
}
