/// Configuration schema and defaults for querydeck.
///
/// Defines the TOML-serializable configuration structure with the sections
/// `[api]`, `[display]` and `[history]`.
///
/// Every field has a built-in default. Users only need to set the values
/// they want to override.
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level querydeck configuration.
///
/// Maps directly to `~/.querydeck/config.toml` and `.querydeck.toml`. All
/// sections and fields are optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryDeckConfig {
    pub api: ApiConfig,
    pub display: DisplayConfig,
    pub history: HistoryConfig,
}

// ---------------------------------------------------------------------------
// [api]
// ---------------------------------------------------------------------------

/// Backend connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Origin serving `/api/*`.
    pub base_url: String,
    /// Request timeout in milliseconds. `0` waits indefinitely.
    pub timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_ms: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// [display]
// ---------------------------------------------------------------------------

/// Terminal presentation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Print the raw JSON of each result.
    pub show_raw_json: bool,
    /// Sparkline width in columns.
    pub chart_width: usize,
    /// Colored output.
    pub color: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            show_raw_json: false,
            chart_width: 60,
            color: true,
        }
    }
}

// ---------------------------------------------------------------------------
// [history]
// ---------------------------------------------------------------------------

/// Run log settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Append each run to `~/.querydeck/run-log.jsonl`.
    pub enabled: bool,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

// ---------------------------------------------------------------------------
// Default TOML content
// ---------------------------------------------------------------------------

impl QueryDeckConfig {
    /// Generate the annotated default TOML config file content.
    pub fn default_toml() -> String {
        r#"# querydeck Configuration
#
# Configuration hierarchy (highest precedence wins):
#   1. Environment variables (QUERYDECK_*)
#   2. Project config (.querydeck.toml in current directory)
#   3. User global config (~/.querydeck/config.toml)
#   4. Built-in defaults

[api]
base_url = "http://localhost:8000"
timeout_ms = 0            # 0 = wait indefinitely

[display]
show_raw_json = false
chart_width = 60
color = true

[history]
enabled = true            # Append runs to ~/.querydeck/run-log.jsonl
"#
        .to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = QueryDeckConfig::default();
        assert_eq!(config.api.base_url, "http://localhost:8000");
        assert_eq!(config.api.timeout_ms, 0);
        assert!(!config.display.show_raw_json);
        assert_eq!(config.display.chart_width, 60);
        assert!(config.display.color);
        assert!(config.history.enabled);
    }

    #[test]
    fn deserialize_minimal_toml() {
        let toml_str = r#"
[api]
base_url = "http://warehouse:9000"
"#;
        let config: QueryDeckConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.api.base_url, "http://warehouse:9000");
        // All other fields fall back to defaults
        assert_eq!(config.api.timeout_ms, 0);
        assert!(config.history.enabled);
    }

    #[test]
    fn default_toml_matches_defaults() {
        let config: QueryDeckConfig = toml::from_str(&QueryDeckConfig::default_toml()).unwrap();
        assert_eq!(config, QueryDeckConfig::default());
    }

    #[test]
    fn empty_toml_is_default() {
        let config: QueryDeckConfig = toml::from_str("").unwrap();
        assert_eq!(config, QueryDeckConfig::default());
    }
}
