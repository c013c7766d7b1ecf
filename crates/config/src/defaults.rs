//! Default values for a fresh install.

use serde_json::Value;

use crate::{
    migrate::CONFIG_SCHEMA_VERSION,
    provider_id::LegacyKeyField,
    schema::{ApiMode, ProviderSecrets, UserConfig},
};

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_OLLAMA_ENDPOINT: &str = "http://127.0.0.1:11434";
pub const DEFAULT_CUSTOM_MODEL_API_URL: &str = "http://localhost:8000/v1/chat/completions";
pub const DEFAULT_CHATGPT_WEB_API_URL: &str = "https://chatgpt.com";
pub const DEFAULT_CUSTOM_MODEL_NAME: &str = "gpt-4.1";
pub const DEFAULT_OLLAMA_MODEL_NAME: &str = "llama4";

/// Facts about the host the defaults depend on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    /// BCP 47 language tag reported by the browser, e.g. `en-US`.
    pub language: String,
    pub mobile: bool,
}

impl Environment {
    #[must_use]
    pub fn new(language: impl Into<String>, mobile: bool) -> Self {
        Self {
            language: language.into(),
            mobile,
        }
    }

    /// UI language code: `zhHant` for traditional Chinese locales, otherwise
    /// the two-letter primary tag.
    #[must_use]
    pub fn ui_language(&self) -> String {
        let tag = self.language.trim().to_lowercase();
        let traditional = ["zh-hk", "zh-mo", "zh-tw", "zh-cht", "zh-hant"];
        if traditional.iter().any(|locale| tag.starts_with(locale)) {
            return "zhHant".to_string();
        }
        tag.chars().take(2).collect()
    }
}

/// Builds the defaults layered under whatever the store holds.
#[must_use]
pub fn default_config(env: &Environment) -> UserConfig {
    let language = env.ui_language();
    let model_name = if language == "zh" {
        "moonshotWebFree"
    } else {
        "claude2WebFree"
    };

    let mut config = UserConfig {
        provider_secrets: Some(ProviderSecrets::new()),
        custom_providers: Some(Vec::new()),
        custom_api_modes: Some(vec![ApiMode::default()]),
        api_mode: None,
        config_schema_version: Some(CONFIG_SCHEMA_VERSION),
        custom_openai_api_url: Some(DEFAULT_OPENAI_BASE_URL.into()),
        ollama_endpoint: Some(DEFAULT_OLLAMA_ENDPOINT.into()),
        custom_model_api_url: Some(DEFAULT_CUSTOM_MODEL_API_URL.into()),
        custom_chatgpt_web_api_url: Some(DEFAULT_CHATGPT_WEB_API_URL.into()),
        model_name: Some(model_name.into()),
        custom_model_name: Some(DEFAULT_CUSTOM_MODEL_NAME.into()),
        ..UserConfig::default()
    };
    for field in LegacyKeyField::ALL {
        config.legacy_keys.insert(field, String::new());
    }
    config
        .extra
        .insert("userLanguage".into(), Value::String(language.clone()));
    config
        .extra
        .insert("preferredLanguage".into(), Value::String(language));
    config
        .extra
        .insert("insertAtTop".into(), Value::Bool(env.mobile));
    config.extra.insert(
        "ollamaModelName".into(),
        Value::String(DEFAULT_OLLAMA_MODEL_NAME.into()),
    );
    config
}
