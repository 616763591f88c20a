//! Error types for parameter event subscriptions.

use std::fmt;

/// Errors returned by the registration API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterEventsError {
    /// No live per-parameter registration matches the handle or key.
    ParameterCallbackNotFound {
        parameter_name: String,
        node_name: String,
    },

    /// No live whole-event registration matches the handle.
    EventCallbackNotFound,
}

impl ParameterEventsError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ParameterCallbackNotFound { .. } | Self::EventCallbackNotFound
        )
    }
}

impl fmt::Display for ParameterEventsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ParameterCallbackNotFound {
                parameter_name,
                node_name,
            } => write!(
                f,
                "Callback doesn't exist for parameter '{}' of node '{}'",
                parameter_name, node_name
            ),
            Self::EventCallbackNotFound => write!(f, "Parameter event callback doesn't exist"),
        }
    }
}

impl std::error::Error for ParameterEventsError {}
