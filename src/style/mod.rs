//! Conversation styles.
//!
//! A style is a named response personality applied uniformly across backends:
//! a system prompt plus a sampling temperature. Agents consume the resolved
//! [`StyleConfig`] opaquely.

use crate::agent::{ChatTurn, Role};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// The fixed set of conversation styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConversationStyle {
    Professional,
    Friendly,
    Creative,
    Analytical,
    Casual,
    #[default]
    Helpful,
}

impl ConversationStyle {
    pub const ALL: [ConversationStyle; 6] = [
        ConversationStyle::Professional,
        ConversationStyle::Friendly,
        ConversationStyle::Creative,
        ConversationStyle::Analytical,
        ConversationStyle::Casual,
        ConversationStyle::Helpful,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationStyle::Professional => "professional",
            ConversationStyle::Friendly => "friendly",
            ConversationStyle::Creative => "creative",
            ConversationStyle::Analytical => "analytical",
            ConversationStyle::Casual => "casual",
            ConversationStyle::Helpful => "helpful",
        }
    }

    /// Built-in prompt and temperature for this style.
    pub fn default_config(&self) -> StyleConfig {
        let (system_prompt, temperature) = match self {
            ConversationStyle::Friendly => (
                "You are a friendly and warm AI assistant. Be encouraging, use a conversational \
                 tone, and show empathy. Use casual language while remaining helpful.",
                0.8,
            ),
            ConversationStyle::Professional => (
                "You are a professional AI assistant. Provide clear, concise, and accurate \
                 responses. Use formal language and focus on efficiency and precision.",
                0.6,
            ),
            ConversationStyle::Creative => (
                "You are a creative AI assistant. Think outside the box, offer innovative ideas, \
                 and inspire creativity. Use vivid language and encourage exploration of new \
                 possibilities.",
                0.9,
            ),
            ConversationStyle::Analytical => (
                "You are an analytical AI assistant. Provide logical, well-reasoned responses. \
                 Break down complex problems, use data when possible, and explain your \
                 reasoning step by step.",
                0.5,
            ),
            ConversationStyle::Casual => (
                "You are a casual AI assistant. Keep things relaxed and informal. Use everyday \
                 language, be conversational, and don't be afraid to use humor when appropriate.",
                0.7,
            ),
            ConversationStyle::Helpful => (
                "You are a helpful AI assistant focused on providing practical solutions. Always \
                 try to be as useful as possible, offer concrete suggestions, and go the extra \
                 mile to help.",
                0.7,
            ),
        };

        StyleConfig {
            style: *self,
            system_prompt: system_prompt.to_string(),
            temperature,
        }
    }
}

impl fmt::Display for ConversationStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConversationStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "professional" => Ok(ConversationStyle::Professional),
            "friendly" => Ok(ConversationStyle::Friendly),
            "creative" => Ok(ConversationStyle::Creative),
            "analytical" => Ok(ConversationStyle::Analytical),
            "casual" => Ok(ConversationStyle::Casual),
            "helpful" => Ok(ConversationStyle::Helpful),
            _ => Err(format!("Unknown conversation style: {}", s)),
        }
    }
}

/// Resolved style parameters handed to a backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleConfig {
    pub style: ConversationStyle,
    pub system_prompt: String,
    pub temperature: f32,
}

impl StyleConfig {
    /// Prepend the style's system prompt unless the conversation already
    /// carries a system turn.
    pub fn apply(&self, conversation: &[ChatTurn]) -> Vec<ChatTurn> {
        let mut turns = Vec::with_capacity(conversation.len() + 1);
        if !conversation.iter().any(|t| t.role == Role::System) {
            turns.push(ChatTurn::system(self.system_prompt.clone()));
        }
        turns.extend_from_slice(conversation);
        turns
    }
}

/// Prompt/temperature override for one style, as read from configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleOverride {
    pub system_prompt: Option<String>,
    pub temperature: Option<f32>,
}

/// All style configurations, built once at startup.
#[derive(Debug, Clone)]
pub struct StyleCatalog {
    styles: HashMap<ConversationStyle, StyleConfig>,
}

impl StyleCatalog {
    pub fn new(overrides: &HashMap<ConversationStyle, StyleOverride>) -> Self {
        let styles = ConversationStyle::ALL
            .iter()
            .map(|style| {
                let mut config = style.default_config();
                if let Some(ov) = overrides.get(style) {
                    if let Some(prompt) = &ov.system_prompt {
                        config.system_prompt = prompt.clone();
                    }
                    if let Some(temp) = ov.temperature {
                        config.temperature = temp;
                    }
                }
                (*style, config)
            })
            .collect();
        Self { styles }
    }

    pub fn get(&self, style: ConversationStyle) -> StyleConfig {
        self.styles
            .get(&style)
            .cloned()
            .unwrap_or_else(|| style.default_config())
    }
}

impl Default for StyleCatalog {
    fn default() -> Self {
        Self::new(&HashMap::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_temperatures() {
        assert_eq!(ConversationStyle::Friendly.default_config().temperature, 0.8);
        assert_eq!(ConversationStyle::Professional.default_config().temperature, 0.6);
        assert_eq!(ConversationStyle::Creative.default_config().temperature, 0.9);
        assert_eq!(ConversationStyle::Analytical.default_config().temperature, 0.5);
        assert_eq!(ConversationStyle::Casual.default_config().temperature, 0.7);
        assert_eq!(ConversationStyle::Helpful.default_config().temperature, 0.7);
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(
            "Creative".parse::<ConversationStyle>().unwrap(),
            ConversationStyle::Creative
        );
        assert_eq!(
            " ANALYTICAL ".parse::<ConversationStyle>().unwrap(),
            ConversationStyle::Analytical
        );
        assert!("sarcastic".parse::<ConversationStyle>().is_err());
    }

    #[test]
    fn default_style_is_helpful() {
        assert_eq!(ConversationStyle::default(), ConversationStyle::Helpful);
    }

    #[test]
    fn apply_prepends_system_prompt_once() {
        let config = ConversationStyle::Casual.default_config();
        let conversation = vec![ChatTurn::user("hey")];

        let applied = config.apply(&conversation);
        assert_eq!(applied.len(), 2);
        assert_eq!(applied[0].role, Role::System);
        assert_eq!(applied[1].content, "hey");

        let reapplied = config.apply(&applied);
        assert_eq!(reapplied.len(), 2);
    }

    #[test]
    fn catalog_applies_overrides() {
        let mut overrides = HashMap::new();
        overrides.insert(
            ConversationStyle::Creative,
            StyleOverride {
                system_prompt: Some("Be wild.".to_string()),
                temperature: Some(1.2),
            },
        );

        let catalog = StyleCatalog::new(&overrides);
        let creative = catalog.get(ConversationStyle::Creative);
        assert_eq!(creative.system_prompt, "Be wild.");
        assert_eq!(creative.temperature, 1.2);

        let helpful = catalog.get(ConversationStyle::Helpful);
        assert_eq!(helpful.temperature, 0.7);
    }
}
