//! Report and metric records carried to the telemetry relay.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Contextual fields attached to every outbound report.
///
/// Only one of `event_message` / `error_message` is meaningful per dispatch;
/// consumers read whichever is non-empty via [`ReportState::message`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportState {
    /// Reporting component name.
    #[serde(default)]
    pub name: String,
    /// Application version.
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub context: String,
    #[serde(default)]
    pub sub_context: String,
    #[serde(default)]
    pub operation_type: String,
    #[serde(default)]
    pub event_message: String,
    #[serde(default)]
    pub error_message: String,
    #[serde(default)]
    pub custom_dimensions: HashMap<String, String>,
}

impl ReportState {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            ..Self::default()
        }
    }

    /// The populated message, preferring the event message.
    pub fn message(&self) -> &str {
        if self.event_message.is_empty() {
            &self.error_message
        } else {
            &self.event_message
        }
    }
}

/// A single named metric observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
    pub value: f64,
    pub app_version: String,
    #[serde(default)]
    pub custom_dimensions: HashMap<String, String>,
}
