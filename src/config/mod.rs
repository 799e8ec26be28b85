//! Configuration module for chatroute
//!
//! Provides layered configuration loading from files, environment variables, and defaults.
//!
//! # Configuration Precedence
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`CHATROUTE_*`)
//! 3. Configuration file (TOML)
//! 4. Default values (lowest priority)
//!
//! # Example
//!
//! ```rust
//! use chatroute::config::ChatrouteConfig;
//!
//! let toml = r#"
//! [server]
//! port = 9000
//!
//! [[backends]]
//! name = "gemini"
//! type = "gemini"
//! api_key_env = "GEMINI_API_KEY"
//! "#;
//! let config: ChatrouteConfig = toml::from_str(toml).unwrap();
//! assert_eq!(config.server.port, 9000);
//! assert_eq!(config.backends.len(), 1);
//! ```

pub mod backend;
pub mod error;
pub mod feedback;
pub mod logging;
pub mod recommendation;
pub mod server;

pub use backend::{BackendConfig, BackendType};
pub use error::ConfigError;
pub use feedback::FeedbackConfig;
pub use logging::{LogFormat, LoggingConfig};
pub use recommendation::RecommendationConfig;
pub use server::ServerConfig;

use crate::style::{ConversationStyle, StyleCatalog, StyleOverride};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Annotated example configuration, written by `chatroute config init`.
pub const EXAMPLE_CONFIG: &str = include_str!("../../chatroute.example.toml");

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ChatrouteConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub feedback: FeedbackConfig,
    pub recommendation: RecommendationConfig,
    /// Per-style prompt/temperature overrides keyed by style name
    pub styles: HashMap<String, StyleOverride>,
    /// Backends in declaration order; declaration order breaks priority ties
    pub backends: Vec<BackendConfig>,
}

impl ChatrouteConfig {
    /// Load configuration from a TOML file
    ///
    /// If path is None, returns default configuration.
    /// If path doesn't exist, returns NotFound error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.to_path_buf()));
                }
                let content = std::fs::read_to_string(p)?;
                toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Invalid values are silently ignored (the file or default value is kept).
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(port) = std::env::var("CHATROUTE_PORT") {
            if let Ok(p) = port.parse() {
                self.server.port = p;
            }
        }
        if let Ok(host) = std::env::var("CHATROUTE_HOST") {
            if !host.trim().is_empty() {
                self.server.host = host;
            }
        }
        if let Ok(level) = std::env::var("CHATROUTE_LOG_LEVEL") {
            if !level.trim().is_empty() {
                self.logging.level = level;
            }
        }
        if let Ok(format) = std::env::var("CHATROUTE_LOG_FORMAT") {
            if let Ok(f) = format.parse() {
                self.logging.format = f;
            }
        }
        if let Ok(db) = std::env::var("CHATROUTE_FEEDBACK_DB") {
            if !db.trim().is_empty() {
                self.feedback.database_path = Some(PathBuf::from(db));
            }
        }

        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::invalid("server.port", "port must be non-zero"));
        }
        if self.server.request_timeout_seconds == 0 {
            return Err(ConfigError::invalid(
                "server.request_timeout_seconds",
                "must be greater than zero",
            ));
        }

        if self.recommendation.ttl_seconds == 0 {
            return Err(ConfigError::invalid(
                "recommendation.ttl_seconds",
                "must be greater than zero",
            ));
        }

        for (field, value) in [
            (
                "feedback.underperforming_threshold",
                self.feedback.underperforming_threshold,
            ),
            (
                "feedback.top_performer_threshold",
                self.feedback.top_performer_threshold,
            ),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::invalid(field, "must be between 0 and 1"));
            }
        }
        if self.feedback.trend_days == 0 {
            return Err(ConfigError::invalid(
                "feedback.trend_days",
                "must be greater than zero",
            ));
        }

        self.parsed_style_overrides()?;

        let mut seen = HashSet::new();
        for (i, backend) in self.backends.iter().enumerate() {
            if backend.name.trim().is_empty() {
                return Err(ConfigError::invalid(
                    format!("backends[{}].name", i),
                    "name cannot be empty",
                ));
            }
            if !seen.insert(backend.name.as_str()) {
                return Err(ConfigError::invalid(
                    format!("backends[{}].name", i),
                    format!("duplicate backend name '{}'", backend.name),
                ));
            }
            if backend.url.as_deref().is_some_and(|u| u.trim().is_empty()) {
                return Err(ConfigError::invalid(
                    format!("backends[{}].url", i),
                    "URL cannot be empty",
                ));
            }
            if backend.requests_per_minute() == 0 {
                return Err(ConfigError::invalid(
                    format!("backends[{}].requests_per_minute", i),
                    "must be greater than zero",
                ));
            }
            if backend.requests_per_day() == 0 {
                return Err(ConfigError::invalid(
                    format!("backends[{}].requests_per_day", i),
                    "must be greater than zero",
                ));
            }
            if backend.timeout_seconds == 0 {
                return Err(ConfigError::invalid(
                    format!("backends[{}].timeout_seconds", i),
                    "must be greater than zero",
                ));
            }
        }

        Ok(())
    }

    fn parsed_style_overrides(
        &self,
    ) -> Result<HashMap<ConversationStyle, StyleOverride>, ConfigError> {
        let mut parsed = HashMap::new();
        for (name, style_override) in &self.styles {
            let style: ConversationStyle = name
                .parse()
                .map_err(|e: String| ConfigError::invalid(format!("styles.{}", name), e))?;
            if let Some(t) = style_override.temperature {
                if !(0.0..=2.0).contains(&t) {
                    return Err(ConfigError::invalid(
                        format!("styles.{}.temperature", name),
                        "must be between 0 and 2",
                    ));
                }
            }
            parsed.insert(style, style_override.clone());
        }
        Ok(parsed)
    }

    /// Built-in styles with this configuration's overrides applied.
    pub fn style_catalog(&self) -> Result<StyleCatalog, ConfigError> {
        Ok(StyleCatalog::new(&self.parsed_style_overrides()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ChatrouteConfig::default();
        assert_eq!(config.server.port, 8080);
        assert!(config.backends.is_empty());
        assert!(config.styles.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_example_config_parses_and_validates() {
        let config: ChatrouteConfig = toml::from_str(EXAMPLE_CONFIG).unwrap();
        assert!(config.validate().is_ok());
        assert!(config.backends.len() >= 2);
        assert_eq!(config.backends[0].backend_type, BackendType::Gemini);
    }

    #[test]
    fn test_load_missing_file() {
        let err = ChatrouteConfig::load(Some(Path::new("/nonexistent/chatroute.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_load_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[server\nport = ").unwrap();
        let err = ChatrouteConfig::load(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_duplicate_backend_names_rejected() {
        let config: ChatrouteConfig = toml::from_str(
            r#"
            [[backends]]
            name = "gemini"
            type = "gemini"

            [[backends]]
            name = "gemini"
            type = "openai"
            "#,
        )
        .unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate backend name"));
    }

    #[test]
    fn test_zero_rate_limit_rejected() {
        let config: ChatrouteConfig = toml::from_str(
            r#"
            [[backends]]
            name = "hf"
            type = "huggingface"
            requests_per_minute = 0
            "#,
        )
        .unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation { field, .. }) if field == "backends[0].requests_per_minute"
        ));
    }

    #[test]
    fn test_unknown_style_rejected() {
        let config: ChatrouteConfig = toml::from_str(
            r#"
            [styles.sarcastic]
            temperature = 1.0
            "#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_style_override_applied() {
        let config: ChatrouteConfig = toml::from_str(
            r#"
            [styles.Creative]
            temperature = 1.2
            "#,
        )
        .unwrap();
        config.validate().unwrap();
        let catalog = config.style_catalog().unwrap();
        let creative = catalog.get(ConversationStyle::Creative);
        assert_eq!(creative.temperature, 1.2);
        assert!(creative.system_prompt.starts_with("You are a creative"));
    }

    #[test]
    fn test_temperature_range() {
        let config: ChatrouteConfig = toml::from_str(
            r#"
            [styles.casual]
            temperature = 3.5
            "#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let mut config = ChatrouteConfig::default();
        config.recommendation.ttl_seconds = 0;
        assert!(config.validate().is_err());
    }
}
