use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const THREAD_ID_ENV: &str = "MESSAGE_LIST_THREAD_ID";
const RESOURCE_ID_ENV: &str = "MESSAGE_LIST_RESOURCE_ID";
const WARN_ON_DROPPED_PARTS_ENV: &str = "MESSAGE_LIST_WARN_ON_DROPPED_PARTS";

/// Settings for one message list.
///
/// `thread_id` and `resource_id` bind the list to a conversation; non-memory
/// messages declaring a different thread or resource are rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageListConfig {
    #[serde(default)]
    pub thread_id: Option<String>,
    #[serde(default)]
    pub resource_id: Option<String>,
    /// Log dropped content parts (unknown types, orphan tool results) at
    /// warn instead of debug.
    #[serde(default)]
    pub warn_on_dropped_parts: bool,
}

fn parse_bool_env(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "on"
    )
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl MessageListConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_thread(thread_id: impl Into<String>) -> Self {
        Self {
            thread_id: Some(thread_id.into()),
            ..Self::default()
        }
    }

    pub fn with_resource(mut self, resource_id: impl Into<String>) -> Self {
        self.resource_id = Some(resource_id.into());
        self
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load from a TOML file, then apply environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&content)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Defaults plus environment overrides.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(thread_id) = lookup(THREAD_ID_ENV).and_then(non_empty) {
            self.thread_id = Some(thread_id);
        }
        if let Some(resource_id) = lookup(RESOURCE_ID_ENV).and_then(non_empty) {
            self.resource_id = Some(resource_id);
        }
        if let Some(warn) = lookup(WARN_ON_DROPPED_PARTS_ENV) {
            self.warn_on_dropped_parts = parse_bool_env(&warn);
        }
    }
}
