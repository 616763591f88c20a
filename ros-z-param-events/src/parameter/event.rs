//! Lookups of a single parameter inside a received [`ParameterEvent`].
//!
//! Two forms are provided and they are not interchangeable:
//!
//! - [`get_parameter_from_event`] returns `None` when the event does not
//!   mention the parameter, and `Some` with [`ParameterValue::NotSet`] when the
//!   event deletes it.
//! - [`get_parameter_from_event_or_unset`] returns a `NotSet` parameter in both
//!   cases. Callers that need to tell a deletion from an unrelated event must
//!   use the first form.

use super::types::{Parameter, ParameterEvent, ParameterValue};
use crate::names::resolve_node_name;

/// Find `parameter_name` of `node_name` in `event`.
///
/// `node_name` is resolved against the event's own node: an empty name means
/// "the node that sent this event" and a relative name is looked up in that
/// node's namespace.
///
/// ```
/// use ros_z_param_events::parameter::{Parameter, ParameterEvent, ParameterValue, get_parameter_from_event};
///
/// let event = ParameterEvent::new("/robot1")
///     .with_changed(Parameter::new("speed", 3.5))
///     .with_deleted("legacy");
///
/// let speed = get_parameter_from_event(&event, "speed", "/robot1").unwrap();
/// assert_eq!(speed.value, ParameterValue::Double(3.5));
///
/// let legacy = get_parameter_from_event(&event, "legacy", "").unwrap();
/// assert_eq!(legacy.value, ParameterValue::NotSet);
///
/// assert!(get_parameter_from_event(&event, "speed", "/robot2").is_none());
/// ```
pub fn get_parameter_from_event(
    event: &ParameterEvent,
    parameter_name: &str,
    node_name: &str,
) -> Option<Parameter> {
    let node_name = resolve_node_name(node_name, &event.node);
    match_parameter(event, parameter_name, &node_name)
}

/// Like [`get_parameter_from_event`], but absent parameters come back as
/// `NotSet` instead of `None`.
pub fn get_parameter_from_event_or_unset(
    event: &ParameterEvent,
    parameter_name: &str,
    node_name: &str,
) -> Parameter {
    get_parameter_from_event(event, parameter_name, node_name)
        .unwrap_or_else(|| Parameter::not_set(parameter_name))
}

/// Exact lookup with an already canonical node name.
///
/// New parameters are searched first, then changed, then deleted; the first
/// hit wins. A deleted hit yields `NotSet`.
pub(crate) fn match_parameter(
    event: &ParameterEvent,
    parameter_name: &str,
    canonical_node: &str,
) -> Option<Parameter> {
    if event.node != canonical_node {
        return None;
    }

    event
        .new_parameters
        .iter()
        .chain(event.changed_parameters.iter())
        .find(|p| p.name == parameter_name)
        .cloned()
        .or_else(|| {
            event
                .deleted_parameters
                .iter()
                .any(|p| p.name == parameter_name)
                .then(|| Parameter::new(parameter_name, ParameterValue::NotSet))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_event() -> ParameterEvent {
        ParameterEvent::new("/ns/robot1")
            .with_new(Parameter::new("mode", "auto"))
            .with_changed(Parameter::new("speed", 3.5))
            .with_deleted("legacy")
    }

    #[test]
    fn test_new_and_changed_values() {
        let event = sample_event();
        assert_eq!(
            get_parameter_from_event(&event, "mode", "/ns/robot1"),
            Some(Parameter::new("mode", "auto"))
        );
        assert_eq!(
            get_parameter_from_event(&event, "speed", "/ns/robot1"),
            Some(Parameter::new("speed", 3.5))
        );
    }

    #[test]
    fn test_deleted_yields_not_set() {
        let event = sample_event();
        let legacy = get_parameter_from_event(&event, "legacy", "/ns/robot1");
        assert_eq!(legacy, Some(Parameter::not_set("legacy")));
    }

    #[test]
    fn test_deleted_value_is_ignored() {
        let mut event = ParameterEvent::new("/robot1");
        event.deleted_parameters.push(Parameter::new("gain", 2.0));
        assert_eq!(
            get_parameter_from_event(&event, "gain", "/robot1"),
            Some(Parameter::not_set("gain"))
        );
    }

    #[test]
    fn test_absent_parameter_and_other_node() {
        let event = sample_event();
        assert_eq!(get_parameter_from_event(&event, "missing", "/ns/robot1"), None);
        assert_eq!(get_parameter_from_event(&event, "speed", "/ns/robot2"), None);
        assert_eq!(get_parameter_from_event(&event, "speed", "/robot1"), None);
    }

    #[test]
    fn test_node_name_resolution_against_event_node() {
        let event = sample_event();
        assert!(get_parameter_from_event(&event, "speed", "").is_some());
        assert!(get_parameter_from_event(&event, "speed", "robot1").is_some());
        assert!(get_parameter_from_event(&event, "speed", "robot2").is_none());
    }

    #[test]
    fn test_new_wins_over_changed_and_deleted() {
        let event = ParameterEvent::new("/robot1")
            .with_new(Parameter::new("gain", 1))
            .with_changed(Parameter::new("gain", 2))
            .with_deleted("gain");
        assert_eq!(
            get_parameter_from_event(&event, "gain", "/robot1").map(|p| p.value),
            Some(ParameterValue::Integer(1))
        );

        let event = ParameterEvent::new("/robot1")
            .with_changed(Parameter::new("gain", 2))
            .with_deleted("gain");
        assert_eq!(
            get_parameter_from_event(&event, "gain", "/robot1").map(|p| p.value),
            Some(ParameterValue::Integer(2))
        );
    }

    #[test]
    fn test_or_unset_masks_absent_and_deleted() {
        let event = sample_event();
        let deleted = get_parameter_from_event_or_unset(&event, "legacy", "/ns/robot1");
        let absent = get_parameter_from_event_or_unset(&event, "missing", "/ns/robot1");
        let other = get_parameter_from_event_or_unset(&event, "speed", "/ns/robot2");
        assert_eq!(deleted.value, ParameterValue::NotSet);
        assert_eq!(absent, Parameter::not_set("missing"));
        assert_eq!(other, Parameter::not_set("speed"));
        assert_eq!(
            get_parameter_from_event_or_unset(&event, "speed", "").value,
            ParameterValue::Double(3.5)
        );
    }
}
