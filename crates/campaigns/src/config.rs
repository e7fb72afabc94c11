//! Service configuration loaded from environment variables.

use std::str::FromStr;

use domain::Currency;

/// Output format of the log layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format {other:?}")),
        }
    }
}

/// Campaign service configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `CAMPAIGNS_DEFAULT_CURRENCY`: metrics currency for campaigns created
///   without a budget (default: `"EUR"`)
/// - `CAMPAIGNS_ALERTS_ENABLED`: whether tracked events trigger alert
///   evaluation (default: `true`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `CAMPAIGNS_LOG_FORMAT`: `pretty` or `json` (default: `pretty`)
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub default_currency: Currency,
    pub alerts_enabled: bool,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl ServiceConfig {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup.
    ///
    /// Missing or unparsable values fall back to the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            default_currency: lookup("CAMPAIGNS_DEFAULT_CURRENCY")
                .and_then(|v| Currency::new(v.trim().to_ascii_uppercase()).ok())
                .unwrap_or(defaults.default_currency),
            alerts_enabled: lookup("CAMPAIGNS_ALERTS_ENABLED")
                .and_then(|v| parse_bool(&v))
                .unwrap_or(defaults.alerts_enabled),
            log_level: lookup("RUST_LOG")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.log_level),
            log_format: lookup("CAMPAIGNS_LOG_FORMAT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.log_format),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            default_currency: Currency::eur(),
            alerts_enabled: true,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_values() {
        let config = ServiceConfig::default();
        assert_eq!(config.default_currency, Currency::eur());
        assert!(config.alerts_enabled);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_reads_every_variable() {
        let config = ServiceConfig::from_lookup(lookup(&[
            ("CAMPAIGNS_DEFAULT_CURRENCY", "usd"),
            ("CAMPAIGNS_ALERTS_ENABLED", "false"),
            ("RUST_LOG", "campaigns=debug"),
            ("CAMPAIGNS_LOG_FORMAT", "JSON"),
        ]));

        assert_eq!(config.default_currency, Currency::usd());
        assert!(!config.alerts_enabled);
        assert_eq!(config.log_level, "campaigns=debug");
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_unparsable_values_fall_back() {
        let config = ServiceConfig::from_lookup(lookup(&[
            ("CAMPAIGNS_DEFAULT_CURRENCY", "euros"),
            ("CAMPAIGNS_ALERTS_ENABLED", "maybe"),
            ("RUST_LOG", "  "),
            ("CAMPAIGNS_LOG_FORMAT", "xml"),
        ]));

        assert_eq!(config.default_currency, Currency::eur());
        assert!(config.alerts_enabled);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Pretty);
    }
}
