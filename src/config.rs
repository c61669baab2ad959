//! Skill configuration
//!
//! Device names, canned phrases and config-defined intents. Field names follow
//! the camelCase keys used in the config file.

use crate::handler::CannedIntent;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_CONVERSATION_END: &str = "Bye";
const DEFAULT_CONVERSATION_QUESTION: &str = "What can I do?";
const DEFAULT_NEXT_CONVERSATION_QUESTION: &str = "What else can I do?";
const DEFAULT_RESPONSE_ERROR: &str = "Error";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unsupported config format: .{0}")]
    UnsupportedFormat(String),
}

/// One phrase or a list of alternatives to pick from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Phrases {
    One(String),
    Many(Vec<String>),
}

impl Phrases {
    /// Pick a phrase; random when there are alternatives
    pub fn pick(&self) -> Option<&str> {
        match self {
            Phrases::One(phrase) => Some(phrase.as_str()),
            Phrases::Many(phrases) => phrases
                .choose(&mut rand::thread_rng())
                .map(String::as_str),
        }
    }

    /// Whether `phrase` is one of the configured alternatives
    #[cfg(test)]
    pub fn contains(&self, phrase: &str) -> bool {
        match self {
            Phrases::One(p) => p == phrase,
            Phrases::Many(ps) => ps.iter().any(|p| p == phrase),
        }
    }
}

impl From<&str> for Phrases {
    fn from(phrase: &str) -> Self {
        Phrases::One(phrase.to_string())
    }
}

impl From<Vec<&str>> for Phrases {
    fn from(phrases: Vec<&str>) -> Self {
        Phrases::Many(phrases.into_iter().map(String::from).collect())
    }
}

/// Read-only configuration consumed by the dispatcher
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SkillConfig {
    /// Device id to human readable label
    pub devices: HashMap<String, String>,
    /// Handler name invoked for launch requests
    pub launch_request_app: String,
    pub conversation_end: Option<Phrases>,
    pub conversation_question: Option<Phrases>,
    pub next_conversation_question: Option<Phrases>,
    pub response_error: Option<Phrases>,
    /// Handlers defined entirely in config
    pub intents: HashMap<String, CannedIntent>,
    /// Idle sessions older than this are swept. No expiry when unset.
    pub session_idle_timeout_secs: Option<u64>,
}

impl SkillConfig {
    /// Load from a `.toml` or `.json` file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");
        match ext {
            "toml" => Ok(toml::from_str(&raw)?),
            "json" => Ok(serde_json::from_str(&raw)?),
            other => Err(ConfigError::UnsupportedFormat(other.to_string())),
        }
    }

    pub fn goodbye_phrase(&self) -> String {
        pick_or(self.conversation_end.as_ref(), DEFAULT_CONVERSATION_END)
    }

    pub fn question_phrase(&self) -> String {
        pick_or(
            self.conversation_question.as_ref(),
            DEFAULT_CONVERSATION_QUESTION,
        )
    }

    pub fn next_question_phrase(&self) -> String {
        pick_or(
            self.next_conversation_question.as_ref(),
            DEFAULT_NEXT_CONVERSATION_QUESTION,
        )
    }

    pub fn error_phrase(&self) -> String {
        pick_or(self.response_error.as_ref(), DEFAULT_RESPONSE_ERROR)
    }

    pub fn session_idle_timeout(&self) -> Option<Duration> {
        self.session_idle_timeout_secs.map(Duration::from_secs)
    }
}

fn pick_or(phrases: Option<&Phrases>, default: &str) -> String {
    phrases
        .and_then(Phrases::pick)
        .unwrap_or(default)
        .to_string()
}
