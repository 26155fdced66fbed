//! Configuration source tracking.

use serde::Serialize;
use std::fmt;

/// Where a configuration value came from, in increasing priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigSource {
    Default,
    ParameterStore,
    Environment,
    State,
    Event,
}

impl ConfigSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigSource::Default => "default",
            ConfigSource::ParameterStore => "parameter_store",
            ConfigSource::Environment => "environment",
            ConfigSource::State => "state",
            ConfigSource::Event => "event",
        }
    }
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
