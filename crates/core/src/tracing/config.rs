//! Configuration for tracing and log output

use serde::{Deserialize, Serialize};

/// Output format of the fmt layer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable, one line per event
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

/// Main instrumentation configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentationConfig {
    /// Service name attached to log lines
    pub service_name: String,
    /// Log level filter (e.g., "info", "debug", "medadmin_http=trace")
    pub log_level: String,
    /// Output format
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for InstrumentationConfig {
    fn default() -> Self {
        Self {
            service_name: "medadmin".to_string(),
            log_level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_deserializes_lowercase() {
        let config: InstrumentationConfig = serde_json::from_str(
            r#"{"service_name":"admin","log_level":"warn","format":"json"}"#,
        )
        .unwrap();
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn test_format_defaults_to_pretty() {
        let config: InstrumentationConfig =
            serde_json::from_str(r#"{"service_name":"admin","log_level":"info"}"#).unwrap();
        assert_eq!(config.format, LogFormat::Pretty);
    }
}
