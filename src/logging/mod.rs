//! Structured logging helpers
//!
//! Filter directive construction for the subscriber installed by `serve`,
//! plus privacy-safe previews of conversation content.

use crate::agent::{ChatTurn, Role};
use crate::config::LoggingConfig;

/// Characters kept in a content preview.
pub const CONTENT_PREVIEW_CHARS: usize = 100;

/// Build filter directives string from LoggingConfig
///
/// Produces `"base_level,chatroute::component=level,..."`. Components are
/// emitted in sorted order so the string is stable across runs.
///
/// # Examples
///
/// ```
/// use chatroute::config::{LogFormat, LoggingConfig};
/// use chatroute::logging::build_filter_directives;
/// use std::collections::HashMap;
///
/// let mut component_levels = HashMap::new();
/// component_levels.insert("routing".to_string(), "debug".to_string());
///
/// let config = LoggingConfig {
///     level: "info".to_string(),
///     format: LogFormat::Pretty,
///     component_levels: Some(component_levels),
///     enable_content_logging: false,
/// };
///
/// assert_eq!(build_filter_directives(&config), "info,chatroute::routing=debug");
/// ```
pub fn build_filter_directives(config: &LoggingConfig) -> String {
    let mut filter_str = config.level.clone();

    if let Some(component_levels) = &config.component_levels {
        let mut components: Vec<_> = component_levels.iter().collect();
        components.sort();
        for (component, level) in components {
            filter_str.push_str(&format!(",chatroute::{}={}", component, level));
        }
    }

    filter_str
}

/// Truncate text to at most `max_chars` characters, appending "..." when cut.
pub fn truncate_content(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

/// Preview of the latest user turn, or `None` when content logging is off.
pub fn conversation_preview(conversation: &[ChatTurn], enabled: bool) -> Option<String> {
    if !enabled {
        return None;
    }
    conversation
        .iter()
        .rev()
        .find(|t| t.role == Role::User)
        .map(|t| truncate_content(&t.content, CONTENT_PREVIEW_CHARS))
}

/// Generate a new request ID for log correlation.
pub fn generate_request_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogFormat;
    use std::collections::HashMap;

    #[test]
    fn directives_without_components() {
        let config = LoggingConfig::default();
        assert_eq!(build_filter_directives(&config), "info");
    }

    #[test]
    fn directives_are_sorted() {
        let mut levels = HashMap::new();
        levels.insert("routing".to_string(), "trace".to_string());
        levels.insert("feedback".to_string(), "debug".to_string());
        let config = LoggingConfig {
            level: "warn".to_string(),
            format: LogFormat::Json,
            component_levels: Some(levels),
            enable_content_logging: false,
        };
        assert_eq!(
            build_filter_directives(&config),
            "warn,chatroute::feedback=debug,chatroute::routing=trace"
        );
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_content("short", 10), "short");
        assert_eq!(truncate_content("héllo wörld", 5), "héllo...");
        assert_eq!(truncate_content("", 5), "");
    }

    #[test]
    fn preview_gated_by_flag() {
        let conversation = vec![
            ChatTurn::user("first question"),
            ChatTurn::assistant("answer"),
            ChatTurn::user("follow up"),
        ];
        assert_eq!(conversation_preview(&conversation, false), None);
        assert_eq!(
            conversation_preview(&conversation, true).as_deref(),
            Some("follow up")
        );
    }

    #[test]
    fn request_ids_are_unique() {
        assert_ne!(generate_request_id(), generate_request_id());
    }
}
