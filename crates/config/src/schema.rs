//! Typed view of the extension's flat key/value store.
//!
//! The store is written by several generations of the extension, so every
//! field is read leniently: wrong-typed values degrade to their empty form
//! and unknown keys are carried through [`UserConfig::extra`] untouched.

use std::{
    collections::{BTreeMap, HashSet},
    fmt,
};

use {
    serde::{Deserialize, Deserializer, Serialize, Serializer},
    serde_json::{Map, Value},
    tracing::warn,
};

use crate::provider_id::{
    BuiltinProvider, LegacyKeyField, ensure_unique_provider_id, normalize_provider_id,
};

// ── Storage keys ────────────────────────────────────────────────────────────

pub const PROVIDER_SECRETS_KEY: &str = "providerSecrets";
pub const CUSTOM_PROVIDERS_KEY: &str = "customOpenAIProviders";
pub const CUSTOM_API_MODES_KEY: &str = "customApiModes";
pub const API_MODE_KEY: &str = "apiMode";
pub const CONFIG_SCHEMA_VERSION_KEY: &str = "configSchemaVersion";
pub const CUSTOM_OPENAI_API_URL_KEY: &str = "customOpenAiApiUrl";
pub const OLLAMA_ENDPOINT_KEY: &str = "ollamaEndpoint";
pub const CUSTOM_MODEL_API_URL_KEY: &str = "customModelApiUrl";
pub const CUSTOM_CHATGPT_WEB_API_URL_KEY: &str = "customChatGptWebApiUrl";
pub const MODEL_NAME_KEY: &str = "modelName";
pub const CUSTOM_MODEL_NAME_KEY: &str = "customModelName";

pub const DEFAULT_CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";
pub const DEFAULT_COMPLETIONS_PATH: &str = "/v1/completions";

// ── Lenient field readers ───────────────────────────────────────────────────

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(value) => value,
        _ => String::new(),
    })
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(matches!(Value::deserialize(deserializer)?, Value::Bool(true)))
}

/// Only a literal `false` disables; anything else, including absence, enables.
fn enabled_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(!matches!(Value::deserialize(deserializer)?, Value::Bool(false)))
}

fn default_enabled() -> bool {
    true
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn warn_malformed(key: &str, value: &Value) {
    warn!(key, kind = json_kind(value), "ignoring malformed config value");
}

// ── Api mode groups ─────────────────────────────────────────────────────────

/// Provider family a selectable chat mode belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ApiModeGroup {
    ChatgptWeb,
    ClaudeWeb,
    MoonshotWeb,
    BingWeb,
    BardWeb,
    ChatgptApi,
    ClaudeApi,
    MoonshotApi,
    ChatglmApi,
    OllamaApi,
    AzureOpenAiApi,
    GptCompletionApi,
    GithubThirdPartyApi,
    DeepSeekApi,
    OpenRouterApi,
    AimlLegacy,
    AimlApi,
    CustomApi,
    /// A group this build does not know, kept verbatim.
    Other(String),
}

impl Default for ApiModeGroup {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl ApiModeGroup {
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name {
            "chatgptWebModelKeys" => Self::ChatgptWeb,
            "claudeWebModelKeys" => Self::ClaudeWeb,
            "moonshotWebModelKeys" => Self::MoonshotWeb,
            "bingWebModelKeys" => Self::BingWeb,
            "bardWebModelKeys" => Self::BardWeb,
            "chatgptApiModelKeys" => Self::ChatgptApi,
            "claudeApiModelKeys" => Self::ClaudeApi,
            "moonshotApiModelKeys" => Self::MoonshotApi,
            "chatglmApiModelKeys" => Self::ChatglmApi,
            "ollamaApiModelKeys" => Self::OllamaApi,
            "azureOpenAiApiModelKeys" => Self::AzureOpenAiApi,
            "gptApiModelKeys" => Self::GptCompletionApi,
            "githubThirdPartyApiModelKeys" => Self::GithubThirdPartyApi,
            "deepSeekApiModelKeys" => Self::DeepSeekApi,
            "openRouterApiModelKeys" => Self::OpenRouterApi,
            "aimlModelKeys" => Self::AimlLegacy,
            "aimlApiModelKeys" => Self::AimlApi,
            "customApiModelKeys" => Self::CustomApi,
            other => Self::Other(other.to_string()),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::ChatgptWeb => "chatgptWebModelKeys",
            Self::ClaudeWeb => "claudeWebModelKeys",
            Self::MoonshotWeb => "moonshotWebModelKeys",
            Self::BingWeb => "bingWebModelKeys",
            Self::BardWeb => "bardWebModelKeys",
            Self::ChatgptApi => "chatgptApiModelKeys",
            Self::ClaudeApi => "claudeApiModelKeys",
            Self::MoonshotApi => "moonshotApiModelKeys",
            Self::ChatglmApi => "chatglmApiModelKeys",
            Self::OllamaApi => "ollamaApiModelKeys",
            Self::AzureOpenAiApi => "azureOpenAiApiModelKeys",
            Self::GptCompletionApi => "gptApiModelKeys",
            Self::GithubThirdPartyApi => "githubThirdPartyApiModelKeys",
            Self::DeepSeekApi => "deepSeekApiModelKeys",
            Self::OpenRouterApi => "openRouterApiModelKeys",
            Self::AimlLegacy => "aimlModelKeys",
            Self::AimlApi => "aimlApiModelKeys",
            Self::CustomApi => "customApiModelKeys",
            Self::Other(name) => name,
        }
    }

    /// Registry provider serving this group, if it is OpenAI-compatible.
    #[must_use]
    pub fn provider(&self) -> Option<BuiltinProvider> {
        match self {
            Self::ChatgptApi | Self::GptCompletionApi => Some(BuiltinProvider::OpenAi),
            Self::MoonshotApi => Some(BuiltinProvider::Moonshot),
            Self::DeepSeekApi => Some(BuiltinProvider::DeepSeek),
            Self::OpenRouterApi => Some(BuiltinProvider::OpenRouter),
            Self::AimlLegacy | Self::AimlApi => Some(BuiltinProvider::Aiml),
            Self::ChatglmApi => Some(BuiltinProvider::ChatGlm),
            Self::OllamaApi => Some(BuiltinProvider::Ollama),
            Self::CustomApi => Some(BuiltinProvider::LegacyCustom),
            Self::ChatgptWeb
            | Self::ClaudeWeb
            | Self::MoonshotWeb
            | Self::BingWeb
            | Self::BardWeb
            | Self::ClaudeApi
            | Self::AzureOpenAiApi
            | Self::GithubThirdPartyApi
            | Self::Other(_) => None,
        }
    }

    #[must_use]
    pub fn is_custom(&self) -> bool {
        matches!(self, Self::CustomApi)
    }

    /// Groups that talk to the legacy text-completion endpoint.
    #[must_use]
    pub fn is_completion(&self) -> bool {
        matches!(self, Self::GptCompletionApi)
    }
}

impl fmt::Display for ApiModeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ApiModeGroup {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ApiModeGroup {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Self::parse(&lenient_string(deserializer)?))
    }
}

// ── Api modes ───────────────────────────────────────────────────────────────

/// A user-selectable chat mode.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApiMode {
    pub group_name: ApiModeGroup,
    #[serde(deserialize_with = "lenient_string")]
    pub item_name: String,
    #[serde(deserialize_with = "lenient_bool")]
    pub is_custom: bool,
    #[serde(deserialize_with = "lenient_string")]
    pub custom_name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub custom_url: String,
    #[serde(deserialize_with = "lenient_string")]
    pub api_key: String,
    #[serde(deserialize_with = "lenient_string")]
    pub provider_id: String,
    #[serde(deserialize_with = "lenient_bool")]
    pub active: bool,
    /// Fields written by other parts of the extension.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl fmt::Debug for ApiMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiMode")
            .field("group_name", &self.group_name)
            .field("item_name", &self.item_name)
            .field("is_custom", &self.is_custom)
            .field("custom_name", &self.custom_name)
            .field("custom_url", &self.custom_url)
            .field(
                "api_key",
                &(!self.api_key.is_empty()).then_some("[REDACTED]"),
            )
            .field("provider_id", &self.provider_id)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

impl ApiMode {
    #[must_use]
    pub fn new(group_name: ApiModeGroup, item_name: impl Into<String>) -> Self {
        Self {
            group_name,
            item_name: item_name.into(),
            active: true,
            ..Self::default()
        }
    }

    /// Whether both modes point at the same selection, ignoring `active`.
    #[must_use]
    pub fn is_same_selection(&self, other: &Self) -> bool {
        self.group_name == other.group_name
            && self.item_name == other.item_name
            && self.is_custom == other.is_custom
            && self.custom_name == other.custom_name
            && self.custom_url == other.custom_url
            && self.api_key == other.api_key
            && self.provider_id == other.provider_id
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(_) => match serde_json::from_value(value) {
                Ok(mode) => Some(mode),
                Err(error) => {
                    warn!(error = %error, "ignoring unreadable api mode");
                    None
                },
            },
            Value::Null => None,
            other => {
                warn_malformed(API_MODE_KEY, &other);
                None
            },
        }
    }
}

// ── Custom providers ────────────────────────────────────────────────────────

/// Stored record of a user-defined OpenAI-compatible provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CustomProvider {
    #[serde(deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub base_url: String,
    #[serde(deserialize_with = "lenient_string")]
    pub chat_completions_path: String,
    #[serde(deserialize_with = "lenient_string")]
    pub completions_path: String,
    #[serde(deserialize_with = "lenient_string")]
    pub chat_completions_url: String,
    #[serde(deserialize_with = "lenient_string")]
    pub completions_url: String,
    #[serde(default = "default_enabled", deserialize_with = "enabled_flag")]
    pub enabled: bool,
    #[serde(deserialize_with = "lenient_bool")]
    pub allow_legacy_response_field: bool,
}

impl Default for CustomProvider {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            base_url: String::new(),
            chat_completions_path: String::new(),
            completions_path: String::new(),
            chat_completions_url: String::new(),
            completions_url: String::new(),
            enabled: true,
            allow_legacy_response_field: false,
        }
    }
}

impl CustomProvider {
    /// Canonical form of the entry at `index`: trimmed fields, default
    /// paths, and an id that is normalized and unique against `used`.
    /// The chosen id is added to `used`.
    #[must_use]
    pub fn normalized(&self, index: usize, used: &mut HashSet<String>) -> Self {
        let ordinal = index + 1;
        let preferred = match normalize_provider_id(&self.id) {
            id if id.is_empty() => format!("custom-provider-{ordinal}"),
            id => id,
        };
        let id = ensure_unique_provider_id(&preferred, used);
        used.insert(id.clone());

        let name = match self.name.trim() {
            "" => format!("Custom Provider {ordinal}"),
            name => name.to_string(),
        };
        Self {
            id,
            name,
            base_url: self.base_url.trim().to_string(),
            chat_completions_path: non_empty_or(&self.chat_completions_path, DEFAULT_CHAT_COMPLETIONS_PATH),
            completions_path: non_empty_or(&self.completions_path, DEFAULT_COMPLETIONS_PATH),
            chat_completions_url: self.chat_completions_url.trim().to_string(),
            completions_url: self.completions_url.trim().to_string(),
            enabled: self.enabled,
            allow_legacy_response_field: self.allow_legacy_response_field,
        }
    }
}

fn non_empty_or(value: &str, fallback: &str) -> String {
    match value.trim() {
        "" => fallback.to_string(),
        value => value.to_string(),
    }
}

// ── Provider secrets ────────────────────────────────────────────────────────

/// API keys by provider id. Empty values are never stored.
#[derive(Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ProviderSecrets(BTreeMap<String, String>);

impl fmt::Debug for ProviderSecrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.0.keys().map(|id| (id, "[REDACTED]")))
            .finish()
    }
}

impl ProviderSecrets {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Trimmed secret for `id`, if one is stored.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&str> {
        self.0
            .get(id)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Stores the trimmed value; an empty value removes the entry.
    pub fn set(&mut self, id: impl Into<String>, value: &str) {
        let id = id.into();
        match value.trim() {
            "" => {
                self.0.remove(&id);
            },
            value => {
                self.0.insert(id, value.to_string());
            },
        }
    }

    /// Stores `value` only when `id` has no secret yet. Returns whether it was stored.
    pub fn insert_if_absent(&mut self, id: &str, value: &str) -> bool {
        if self.contains(id) || value.trim().is_empty() {
            return false;
        }
        self.set(id, value);
        true
    }

    pub fn remove(&mut self, id: &str) -> Option<String> {
        self.0.remove(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(id, value)| (id.as_str(), value.as_str()))
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(entries) => Some(
                entries
                    .into_iter()
                    .filter_map(|(id, value)| match value {
                        Value::String(secret) => Some((id, secret)),
                        _ => None,
                    })
                    .collect(),
            ),
            Value::Null => None,
            other => {
                warn_malformed(PROVIDER_SECRETS_KEY, &other);
                None
            },
        }
    }
}

impl<K: Into<String>, V: AsRef<str>> FromIterator<(K, V)> for ProviderSecrets {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut secrets = Self::new();
        for (id, value) in iter {
            secrets.set(id, value.as_ref());
        }
        secrets
    }
}

// ── User config ─────────────────────────────────────────────────────────────

/// Everything the provider subsystem reads from the store.
///
/// `None` means the key is absent (or unreadable) in storage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserConfig {
    pub provider_secrets: Option<ProviderSecrets>,
    pub custom_providers: Option<Vec<CustomProvider>>,
    pub custom_api_modes: Option<Vec<ApiMode>>,
    pub api_mode: Option<ApiMode>,
    pub config_schema_version: Option<u32>,
    pub legacy_keys: BTreeMap<LegacyKeyField, String>,
    pub custom_openai_api_url: Option<String>,
    pub ollama_endpoint: Option<String>,
    pub custom_model_api_url: Option<String>,
    pub custom_chatgpt_web_api_url: Option<String>,
    pub model_name: Option<String>,
    pub custom_model_name: Option<String>,
    /// Keys owned by other parts of the extension.
    pub extra: Map<String, Value>,
}

impl UserConfig {
    /// Builds a typed config from the raw store contents.
    #[must_use]
    pub fn from_map(mut raw: Map<String, Value>) -> Self {
        let mut config = Self {
            provider_secrets: raw
                .remove(PROVIDER_SECRETS_KEY)
                .and_then(ProviderSecrets::from_value),
            custom_providers: raw
                .remove(CUSTOM_PROVIDERS_KEY)
                .and_then(|value| object_list(CUSTOM_PROVIDERS_KEY, value)),
            custom_api_modes: raw
                .remove(CUSTOM_API_MODES_KEY)
                .and_then(|value| object_list(CUSTOM_API_MODES_KEY, value)),
            api_mode: raw.remove(API_MODE_KEY).and_then(ApiMode::from_value),
            config_schema_version: raw
                .remove(CONFIG_SCHEMA_VERSION_KEY)
                .and_then(|value| schema_version(&value)),
            custom_openai_api_url: take_string(&mut raw, CUSTOM_OPENAI_API_URL_KEY),
            ollama_endpoint: take_string(&mut raw, OLLAMA_ENDPOINT_KEY),
            custom_model_api_url: take_string(&mut raw, CUSTOM_MODEL_API_URL_KEY),
            custom_chatgpt_web_api_url: take_string(&mut raw, CUSTOM_CHATGPT_WEB_API_URL_KEY),
            model_name: take_string(&mut raw, MODEL_NAME_KEY),
            custom_model_name: take_string(&mut raw, CUSTOM_MODEL_NAME_KEY),
            ..Self::default()
        };
        for field in LegacyKeyField::ALL {
            if let Some(value) = take_string(&mut raw, field.storage_key()) {
                config.legacy_keys.insert(field, value);
            }
        }
        config.extra = raw;
        config
    }

    /// Serializes back to the flat store shape. Absent fields are omitted.
    pub fn to_map(&self) -> serde_json::Result<Map<String, Value>> {
        let mut map = self.extra.clone();
        if let Some(secrets) = &self.provider_secrets {
            map.insert(PROVIDER_SECRETS_KEY.into(), serde_json::to_value(secrets)?);
        }
        if let Some(providers) = &self.custom_providers {
            map.insert(CUSTOM_PROVIDERS_KEY.into(), serde_json::to_value(providers)?);
        }
        if let Some(modes) = &self.custom_api_modes {
            map.insert(CUSTOM_API_MODES_KEY.into(), serde_json::to_value(modes)?);
        }
        if let Some(mode) = &self.api_mode {
            map.insert(API_MODE_KEY.into(), serde_json::to_value(mode)?);
        }
        if let Some(version) = self.config_schema_version {
            map.insert(CONFIG_SCHEMA_VERSION_KEY.into(), Value::from(version));
        }
        let strings = [
            (CUSTOM_OPENAI_API_URL_KEY, &self.custom_openai_api_url),
            (OLLAMA_ENDPOINT_KEY, &self.ollama_endpoint),
            (CUSTOM_MODEL_API_URL_KEY, &self.custom_model_api_url),
            (CUSTOM_CHATGPT_WEB_API_URL_KEY, &self.custom_chatgpt_web_api_url),
            (MODEL_NAME_KEY, &self.model_name),
            (CUSTOM_MODEL_NAME_KEY, &self.custom_model_name),
        ];
        for (key, value) in strings {
            if let Some(value) = value {
                map.insert(key.into(), Value::String(value.clone()));
            }
        }
        for (field, value) in &self.legacy_keys {
            map.insert(field.storage_key().into(), Value::String(value.clone()));
        }
        Ok(map)
    }

    /// Fills every absent field from `defaults`.
    #[must_use]
    pub fn with_defaults(mut self, defaults: &Self) -> Self {
        fn fill<T: Clone>(slot: &mut Option<T>, fallback: &Option<T>) {
            if slot.is_none() {
                slot.clone_from(fallback);
            }
        }
        fill(&mut self.provider_secrets, &defaults.provider_secrets);
        fill(&mut self.custom_providers, &defaults.custom_providers);
        fill(&mut self.custom_api_modes, &defaults.custom_api_modes);
        fill(&mut self.api_mode, &defaults.api_mode);
        fill(&mut self.config_schema_version, &defaults.config_schema_version);
        fill(&mut self.custom_openai_api_url, &defaults.custom_openai_api_url);
        fill(&mut self.ollama_endpoint, &defaults.ollama_endpoint);
        fill(&mut self.custom_model_api_url, &defaults.custom_model_api_url);
        fill(&mut self.custom_chatgpt_web_api_url, &defaults.custom_chatgpt_web_api_url);
        fill(&mut self.model_name, &defaults.model_name);
        fill(&mut self.custom_model_name, &defaults.custom_model_name);
        for (field, value) in &defaults.legacy_keys {
            self.legacy_keys.entry(*field).or_insert_with(|| value.clone());
        }
        for (key, value) in &defaults.extra {
            self.extra
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
        self
    }

    /// Trimmed legacy top-level key, if non-empty.
    #[must_use]
    pub fn legacy_key(&self, field: LegacyKeyField) -> Option<&str> {
        self.legacy_keys
            .get(&field)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }

    #[must_use]
    pub fn custom_providers(&self) -> &[CustomProvider] {
        self.custom_providers.as_deref().unwrap_or_default()
    }

    #[must_use]
    pub fn custom_api_modes(&self) -> &[ApiMode] {
        self.custom_api_modes.as_deref().unwrap_or_default()
    }
}

fn take_string(raw: &mut Map<String, Value>, key: &str) -> Option<String> {
    match raw.remove(key)? {
        Value::String(value) => Some(value),
        Value::Null => None,
        other => {
            warn_malformed(key, &other);
            None
        },
    }
}

fn schema_version(value: &Value) -> Option<u32> {
    let version = value.as_u64().and_then(|version| u32::try_from(version).ok());
    if version.is_none() && !value.is_null() {
        warn_malformed(CONFIG_SCHEMA_VERSION_KEY, value);
    }
    version
}

fn object_list<T: serde::de::DeserializeOwned>(key: &str, value: Value) -> Option<Vec<T>> {
    let entries = match value {
        Value::Array(entries) => entries,
        Value::Null => return None,
        other => {
            warn_malformed(key, &other);
            return None;
        },
    };
    let mut parsed = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        if !entry.is_object() {
            warn!(key, index, kind = json_kind(&entry), "dropping non-object list entry");
            continue;
        }
        match serde_json::from_value(entry) {
            Ok(item) => parsed.push(item),
            Err(error) => warn!(key, index, error = %error, "dropping unreadable list entry"),
        }
    }
    Some(parsed)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, serde_json::json};

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn api_mode_reads_wrong_typed_fields_as_empty() {
        let mode: ApiMode = serde_json::from_value(json!({
            "groupName": "customApiModelKeys",
            "itemName": 42,
            "customUrl": null,
            "apiKey": ["nope"],
            "active": "yes",
            "providerId": "myproxy",
        }))
        .unwrap();
        assert_eq!(mode.group_name, ApiModeGroup::CustomApi);
        assert_eq!(mode.item_name, "");
        assert_eq!(mode.custom_url, "");
        assert_eq!(mode.api_key, "");
        assert!(!mode.active);
        assert_eq!(mode.provider_id, "myproxy");
    }

    #[test]
    fn api_mode_keeps_unknown_fields() {
        let raw = json!({
            "groupName": "chatgptApiModelKeys",
            "itemName": "chatgptApi4oMini",
            "displayHint": "fast",
        });
        let mode: ApiMode = serde_json::from_value(raw).unwrap();
        assert_eq!(mode.extra.get("displayHint"), Some(&json!("fast")));
        let back = serde_json::to_value(&mode).unwrap();
        assert_eq!(back["displayHint"], json!("fast"));
        assert_eq!(back["groupName"], json!("chatgptApiModelKeys"));
    }

    #[test]
    fn api_mode_debug_redacts_key() {
        let mut mode = ApiMode::new(ApiModeGroup::CustomApi, "custom");
        mode.api_key = "sk-live-123".into();
        let rendered = format!("{mode:?}");
        assert!(!rendered.contains("sk-live-123"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn unknown_group_is_preserved_verbatim() {
        let group = ApiModeGroup::parse("poeWebModelKeys");
        assert_eq!(group.as_str(), "poeWebModelKeys");
        assert_eq!(group.provider(), None);
    }

    #[test]
    fn same_selection_ignores_active_flag() {
        let mut left = ApiMode::new(ApiModeGroup::ChatgptApi, "chatgptApi4oMini");
        let mut right = left.clone();
        right.active = false;
        assert!(left.is_same_selection(&right));
        left.provider_id = "openai".into();
        assert!(!left.is_same_selection(&right));
    }

    #[test]
    fn provider_enabled_only_false_when_literally_false() {
        let providers: Vec<CustomProvider> = serde_json::from_value(json!([
            { "id": "a" },
            { "id": "b", "enabled": false },
            { "id": "c", "enabled": 0 },
            { "id": "d", "enabled": null },
        ]))
        .unwrap();
        let enabled: Vec<bool> = providers.iter().map(|provider| provider.enabled).collect();
        assert_eq!(enabled, [true, false, true, true]);
    }

    #[test]
    fn normalized_provider_fills_defaults() {
        let mut used = HashSet::new();
        let raw = CustomProvider {
            id: "  ".into(),
            name: " ".into(),
            base_url: " https://proxy.example.com ".into(),
            ..CustomProvider::default()
        };
        let normalized = raw.normalized(2, &mut used);
        assert_eq!(normalized.id, "custom-provider-3");
        assert_eq!(normalized.name, "Custom Provider 3");
        assert_eq!(normalized.base_url, "https://proxy.example.com");
        assert_eq!(normalized.chat_completions_path, DEFAULT_CHAT_COMPLETIONS_PATH);
        assert_eq!(normalized.completions_path, DEFAULT_COMPLETIONS_PATH);
        assert!(used.contains("custom-provider-3"));
    }

    #[test]
    fn secrets_never_hold_empty_values() {
        let mut secrets = ProviderSecrets::new();
        secrets.set("openai", "  sk-1  ");
        secrets.set("deepseek", "   ");
        assert_eq!(secrets.get("openai"), Some("sk-1"));
        assert!(!secrets.contains("deepseek"));
        assert!(!secrets.insert_if_absent("openai", "sk-2"));
        assert!(secrets.insert_if_absent("moonshot", "sk-3"));
        secrets.set("openai", "");
        assert_eq!(secrets.len(), 1);
    }

    #[test]
    fn secrets_debug_hides_values() {
        let secrets: ProviderSecrets = [("openai", "sk-secret")].into_iter().collect();
        let rendered = format!("{secrets:?}");
        assert!(rendered.contains("openai"));
        assert!(!rendered.contains("sk-secret"));
    }

    #[test]
    fn from_map_degrades_malformed_values() {
        let config = UserConfig::from_map(map(json!({
            "providerSecrets": "oops",
            "customOpenAIProviders": [{ "id": "a" }, 7, "x"],
            "customApiModes": { "not": "a list" },
            "apiMode": 5,
            "configSchemaVersion": "1",
            "apiKey": 12,
            "ollamaEndpoint": "http://127.0.0.1:11434",
            "themeMode": "dark",
        })));
        assert_eq!(config.provider_secrets, None);
        assert_eq!(config.custom_providers().len(), 1);
        assert_eq!(config.custom_api_modes, None);
        assert_eq!(config.api_mode, None);
        assert_eq!(config.config_schema_version, None);
        assert!(config.legacy_keys.is_empty());
        assert_eq!(
            config.ollama_endpoint.as_deref(),
            Some("http://127.0.0.1:11434")
        );
        assert_eq!(config.extra.get("themeMode"), Some(&json!("dark")));
    }

    #[test]
    fn to_map_round_trips_owned_and_foreign_keys() {
        let raw = map(json!({
            "providerSecrets": { "openai": "sk-1" },
            "customOpenAIProviders": [],
            "customApiModes": [],
            "apiMode": { "groupName": "chatgptApiModelKeys", "itemName": "chatgptApi4oMini" },
            "configSchemaVersion": 1,
            "apiKey": "sk-1",
            "themeMode": "dark",
        }));
        let config = UserConfig::from_map(raw);
        let back = UserConfig::from_map(config.to_map().unwrap());
        assert_eq!(back, config);
    }

    #[test]
    fn with_defaults_only_fills_absent_fields() {
        let defaults = UserConfig {
            custom_openai_api_url: Some("https://api.openai.com".into()),
            model_name: Some("chatgptFree35".into()),
            ..UserConfig::default()
        };
        let stored = UserConfig {
            model_name: Some("chatgptApi4oMini".into()),
            ..UserConfig::default()
        };
        let merged = stored.with_defaults(&defaults);
        assert_eq!(merged.model_name.as_deref(), Some("chatgptApi4oMini"));
        assert_eq!(
            merged.custom_openai_api_url.as_deref(),
            Some("https://api.openai.com")
        );
    }
}
