//! Provider identifiers: the closed set of built-in providers, the open set
//! of user-defined ones, and the canonical id shape shared by both.

use std::{collections::HashSet, fmt};

use serde::{Serialize, Serializer};

/// Id of the built-in catch-all provider that owns legacy custom-mode URLs.
pub const LEGACY_CUSTOM_PROVIDER_ID: &str = "legacy-custom-default";

/// Base used when a user-defined provider has no usable id of its own.
pub const CUSTOM_PROVIDER_ID_BASE: &str = "custom-provider";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BuiltinProvider {
    OpenAi,
    DeepSeek,
    Moonshot,
    OpenRouter,
    Aiml,
    ChatGlm,
    Ollama,
    LegacyCustom,
}

impl BuiltinProvider {
    /// Catalog order. Provider listings keep this order.
    pub const ALL: [Self; 8] = [
        Self::OpenAi,
        Self::DeepSeek,
        Self::Moonshot,
        Self::OpenRouter,
        Self::Aiml,
        Self::ChatGlm,
        Self::Ollama,
        Self::LegacyCustom,
    ];

    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::DeepSeek => "deepseek",
            Self::Moonshot => "moonshot",
            Self::OpenRouter => "openrouter",
            Self::Aiml => "aiml",
            Self::ChatGlm => "chatglm",
            Self::Ollama => "ollama",
            Self::LegacyCustom => LEGACY_CUSTOM_PROVIDER_ID,
        }
    }

    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|provider| provider.id() == id)
    }

    /// The pre-registry top-level field that used to hold this provider's key.
    #[must_use]
    pub fn legacy_key_field(self) -> LegacyKeyField {
        match self {
            Self::OpenAi => LegacyKeyField::ApiKey,
            Self::DeepSeek => LegacyKeyField::DeepSeekApiKey,
            Self::Moonshot => LegacyKeyField::MoonshotApiKey,
            Self::OpenRouter => LegacyKeyField::OpenRouterApiKey,
            Self::Aiml => LegacyKeyField::AimlApiKey,
            Self::ChatGlm => LegacyKeyField::ChatglmApiKey,
            Self::Ollama => LegacyKeyField::OllamaApiKey,
            Self::LegacyCustom => LegacyKeyField::CustomApiKey,
        }
    }
}

impl fmt::Display for BuiltinProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Top-level per-provider key fields kept for older readers of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LegacyKeyField {
    ApiKey,
    DeepSeekApiKey,
    MoonshotApiKey,
    OpenRouterApiKey,
    AimlApiKey,
    ChatglmApiKey,
    OllamaApiKey,
    CustomApiKey,
}

impl LegacyKeyField {
    pub const ALL: [Self; 8] = [
        Self::ApiKey,
        Self::DeepSeekApiKey,
        Self::MoonshotApiKey,
        Self::OpenRouterApiKey,
        Self::AimlApiKey,
        Self::ChatglmApiKey,
        Self::OllamaApiKey,
        Self::CustomApiKey,
    ];

    #[must_use]
    pub fn storage_key(self) -> &'static str {
        match self {
            Self::ApiKey => "apiKey",
            Self::DeepSeekApiKey => "deepSeekApiKey",
            Self::MoonshotApiKey => "moonshotApiKey",
            Self::OpenRouterApiKey => "openRouterApiKey",
            Self::AimlApiKey => "aimlApiKey",
            Self::ChatglmApiKey => "chatglmApiKey",
            Self::OllamaApiKey => "ollamaApiKey",
            Self::CustomApiKey => "customApiKey",
        }
    }

    #[must_use]
    pub fn provider(self) -> BuiltinProvider {
        match self {
            Self::ApiKey => BuiltinProvider::OpenAi,
            Self::DeepSeekApiKey => BuiltinProvider::DeepSeek,
            Self::MoonshotApiKey => BuiltinProvider::Moonshot,
            Self::OpenRouterApiKey => BuiltinProvider::OpenRouter,
            Self::AimlApiKey => BuiltinProvider::Aiml,
            Self::ChatglmApiKey => BuiltinProvider::ChatGlm,
            Self::OllamaApiKey => BuiltinProvider::Ollama,
            Self::CustomApiKey => BuiltinProvider::LegacyCustom,
        }
    }
}

/// A provider id as stored in sessions and secrets.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProviderId {
    Builtin(BuiltinProvider),
    Custom(String),
}

impl ProviderId {
    /// Classifies a stored id. Built-in ids match exactly, anything else is custom.
    #[must_use]
    pub fn parse(id: &str) -> Self {
        let id = id.trim();
        match BuiltinProvider::from_id(id) {
            Some(builtin) => Self::Builtin(builtin),
            None => Self::Custom(id.to_string()),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Builtin(builtin) => builtin.id(),
            Self::Custom(id) => id,
        }
    }

    #[must_use]
    pub fn builtin(&self) -> Option<BuiltinProvider> {
        match self {
            Self::Builtin(builtin) => Some(*builtin),
            Self::Custom(_) => None,
        }
    }

    #[must_use]
    pub fn is_legacy_custom(&self) -> bool {
        matches!(self, Self::Builtin(BuiltinProvider::LegacyCustom))
    }
}

impl From<BuiltinProvider> for ProviderId {
    fn from(value: BuiltinProvider) -> Self {
        Self::Builtin(value)
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ProviderId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Lower-cases `raw`, collapses every run of characters outside `[a-z0-9]`
/// into a single `-`, and strips leading and trailing separators.
#[must_use]
pub fn normalize_provider_id(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    let mut normalized = String::with_capacity(lowered.len());
    let mut pending_separator = false;
    for ch in lowered.chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_separator && !normalized.is_empty() {
                normalized.push('-');
            }
            pending_separator = false;
            normalized.push(ch);
        } else {
            pending_separator = true;
        }
    }
    normalized
}

/// Returns `candidate` (or [`CUSTOM_PROVIDER_ID_BASE`] when empty) suffixed
/// with the first `-2`, `-3`, … that is not already in `used`.
#[must_use]
pub fn ensure_unique_provider_id(candidate: &str, used: &HashSet<String>) -> String {
    let base = if candidate.is_empty() {
        CUSTOM_PROVIDER_ID_BASE
    } else {
        candidate
    };
    if !used.contains(base) {
        return base.to_string();
    }
    let mut suffix = 2usize;
    loop {
        let id = format!("{base}-{suffix}");
        if !used.contains(&id) {
            return id;
        }
        suffix += 1;
    }
}

/// Set of all built-in ids, the starting point for custom id allocation.
#[must_use]
pub fn builtin_provider_ids() -> HashSet<String> {
    BuiltinProvider::ALL
        .into_iter()
        .map(|provider| provider.id().to_string())
        .collect()
}
