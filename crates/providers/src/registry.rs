//! Built-in and user-defined OpenAI-compatible providers, and the URLs they
//! serve.

use std::collections::HashSet;

use serde::Serialize;

use chatbox_config::{
    BuiltinProvider, CustomProvider, ProviderId, UserConfig, builtin_provider_ids,
    defaults::{DEFAULT_CUSTOM_MODEL_API_URL, DEFAULT_OLLAMA_ENDPOINT, DEFAULT_OPENAI_BASE_URL},
    schema::{DEFAULT_CHAT_COMPLETIONS_PATH, DEFAULT_COMPLETIONS_PATH},
};

const OPENAI_COMPAT_CHAT_PATH: &str = "/chat/completions";
const OPENAI_COMPAT_COMPLETIONS_PATH: &str = "/completions";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointType {
    Chat,
    Completion,
}

/// A provider as seen at request time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Provider {
    pub id: ProviderId,
    pub name: String,
    pub base_url: Option<String>,
    pub chat_completions_path: String,
    pub completions_path: String,
    pub chat_completions_url: Option<String>,
    pub completions_url: Option<String>,
    pub enabled: bool,
    pub builtin: bool,
    pub allow_legacy_response_field: bool,
}

/// Built-in provider definition for table-driven registration.
struct BuiltinDef {
    provider: BuiltinProvider,
    name: &'static str,
    /// `None` when the base URL comes from the user config.
    default_base_url: Option<&'static str>,
    chat_completions_path: &'static str,
    completions_path: &'static str,
}

const BUILTIN_PROVIDERS: &[BuiltinDef] = &[
    BuiltinDef {
        provider: BuiltinProvider::OpenAi,
        name: "OpenAI",
        default_base_url: None,
        chat_completions_path: DEFAULT_CHAT_COMPLETIONS_PATH,
        completions_path: DEFAULT_COMPLETIONS_PATH,
    },
    BuiltinDef {
        provider: BuiltinProvider::DeepSeek,
        name: "DeepSeek",
        default_base_url: Some("https://api.deepseek.com"),
        chat_completions_path: OPENAI_COMPAT_CHAT_PATH,
        completions_path: OPENAI_COMPAT_COMPLETIONS_PATH,
    },
    BuiltinDef {
        provider: BuiltinProvider::Moonshot,
        name: "Kimi.Moonshot",
        default_base_url: Some("https://api.moonshot.cn/v1"),
        chat_completions_path: OPENAI_COMPAT_CHAT_PATH,
        completions_path: OPENAI_COMPAT_COMPLETIONS_PATH,
    },
    BuiltinDef {
        provider: BuiltinProvider::OpenRouter,
        name: "OpenRouter",
        default_base_url: Some("https://openrouter.ai/api/v1"),
        chat_completions_path: OPENAI_COMPAT_CHAT_PATH,
        completions_path: OPENAI_COMPAT_COMPLETIONS_PATH,
    },
    BuiltinDef {
        provider: BuiltinProvider::Aiml,
        name: "AI/ML",
        default_base_url: Some("https://api.aimlapi.com/v1"),
        chat_completions_path: OPENAI_COMPAT_CHAT_PATH,
        completions_path: OPENAI_COMPAT_COMPLETIONS_PATH,
    },
    BuiltinDef {
        provider: BuiltinProvider::ChatGlm,
        name: "ChatGLM",
        default_base_url: Some("https://open.bigmodel.cn/api/paas/v4"),
        chat_completions_path: OPENAI_COMPAT_CHAT_PATH,
        completions_path: OPENAI_COMPAT_COMPLETIONS_PATH,
    },
    BuiltinDef {
        provider: BuiltinProvider::Ollama,
        name: "Ollama",
        default_base_url: None,
        chat_completions_path: OPENAI_COMPAT_CHAT_PATH,
        completions_path: OPENAI_COMPAT_COMPLETIONS_PATH,
    },
    BuiltinDef {
        provider: BuiltinProvider::LegacyCustom,
        name: "Custom Model (Legacy)",
        default_base_url: None,
        chat_completions_path: OPENAI_COMPAT_CHAT_PATH,
        completions_path: OPENAI_COMPAT_COMPLETIONS_PATH,
    },
];

/// Every provider the config defines, built-ins first.
pub struct ProviderRegistry {
    providers: Vec<Provider>,
    openai_base_url: String,
    custom_model_api_url: String,
}

impl ProviderRegistry {
    #[must_use]
    pub fn from_config(config: &UserConfig) -> Self {
        let openai_base_url = trim_slashes(non_empty(
            config.custom_openai_api_url.as_deref(),
            DEFAULT_OPENAI_BASE_URL,
        ))
        .to_string();
        let ollama_base_url = format!(
            "{}/v1",
            trim_slashes(non_empty(
                config.ollama_endpoint.as_deref(),
                DEFAULT_OLLAMA_ENDPOINT
            ))
        );
        let custom_model_api_url = non_empty(
            config.custom_model_api_url.as_deref(),
            DEFAULT_CUSTOM_MODEL_API_URL,
        )
        .to_string();

        let mut providers = Vec::with_capacity(BUILTIN_PROVIDERS.len() + config.custom_providers().len());
        for def in BUILTIN_PROVIDERS {
            let (base_url, chat_completions_url) = match def.provider {
                BuiltinProvider::OpenAi => (Some(openai_base_url.clone()), None),
                BuiltinProvider::Ollama => (Some(ollama_base_url.clone()), None),
                BuiltinProvider::LegacyCustom => (None, Some(custom_model_api_url.clone())),
                BuiltinProvider::DeepSeek
                | BuiltinProvider::Moonshot
                | BuiltinProvider::OpenRouter
                | BuiltinProvider::Aiml
                | BuiltinProvider::ChatGlm => (def.default_base_url.map(str::to_string), None),
            };
            providers.push(Provider {
                id: ProviderId::Builtin(def.provider),
                name: def.name.to_string(),
                base_url,
                chat_completions_path: def.chat_completions_path.to_string(),
                completions_path: def.completions_path.to_string(),
                chat_completions_url,
                completions_url: None,
                enabled: true,
                builtin: true,
                allow_legacy_response_field: def.provider == BuiltinProvider::LegacyCustom,
            });
        }

        let mut used: HashSet<String> = builtin_provider_ids();
        for (index, entry) in config.custom_providers().iter().enumerate() {
            providers.push(custom_provider(&entry.normalized(index, &mut used)));
        }

        Self {
            providers,
            openai_base_url,
            custom_model_api_url,
        }
    }

    #[must_use]
    pub fn providers(&self) -> &[Provider] {
        &self.providers
    }

    #[must_use]
    pub fn into_providers(self) -> Vec<Provider> {
        self.providers
    }

    /// Looks up an enabled provider by exact id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Provider> {
        let id = id.trim();
        self.providers
            .iter()
            .find(|provider| provider.enabled && provider.id.as_str() == id)
    }

    pub fn custom_providers(&self) -> impl Iterator<Item = &Provider> {
        self.providers.iter().filter(|provider| !provider.builtin)
    }

    /// Effective URL for `endpoint_type`, or an empty string when the provider
    /// cannot serve it.
    #[must_use]
    pub fn resolve_endpoint_url(&self, provider: &Provider, endpoint_type: EndpointType) -> String {
        let (explicit, path) = match endpoint_type {
            EndpointType::Chat => (&provider.chat_completions_url, &provider.chat_completions_path),
            EndpointType::Completion => (&provider.completions_url, &provider.completions_path),
        };
        if let Some(url) = explicit.as_deref().map(str::trim).filter(|url| !url.is_empty()) {
            return url.to_string();
        }
        if let Some(base_url) = provider.base_url.as_deref() {
            return join_url(base_url, path);
        }
        if provider.id.is_legacy_custom() {
            return match endpoint_type {
                EndpointType::Chat => self.custom_model_api_url.clone(),
                EndpointType::Completion => format!("{}{DEFAULT_COMPLETIONS_PATH}", self.openai_base_url),
            };
        }
        String::new()
    }
}

/// Built-in and custom providers for `config`, built-ins first.
#[must_use]
pub fn list_providers(config: &UserConfig) -> Vec<Provider> {
    ProviderRegistry::from_config(config).into_providers()
}

/// Chat URL to prefill when editing a stored provider: its explicit chat URL,
/// else base URL plus chat path.
#[must_use]
pub fn resolve_provider_chat_endpoint_url(provider: &CustomProvider) -> String {
    let explicit = trim_slashes(&provider.chat_completions_url);
    if !explicit.is_empty() {
        return explicit.to_string();
    }
    let base_url = trim_slashes(&provider.base_url);
    if base_url.is_empty() {
        return String::new();
    }
    join_url(
        base_url,
        &leading_slash(&provider.chat_completions_path, DEFAULT_CHAT_COMPLETIONS_PATH),
    )
}

fn custom_provider(record: &CustomProvider) -> Provider {
    let base_url = trim_slashes(&record.base_url);
    Provider {
        id: ProviderId::parse(&record.id),
        name: record.name.clone(),
        base_url: (!base_url.is_empty()).then(|| base_url.to_string()),
        chat_completions_path: leading_slash(&record.chat_completions_path, DEFAULT_CHAT_COMPLETIONS_PATH),
        completions_path: leading_slash(&record.completions_path, DEFAULT_COMPLETIONS_PATH),
        chat_completions_url: non_empty_owned(&record.chat_completions_url),
        completions_url: non_empty_owned(&record.completions_url),
        enabled: record.enabled,
        builtin: false,
        allow_legacy_response_field: record.allow_legacy_response_field,
    }
}

pub(crate) fn trim_slashes(url: &str) -> &str {
    url.trim().trim_end_matches('/')
}

fn non_empty<'a>(value: Option<&'a str>, fallback: &'a str) -> &'a str {
    match value.map(str::trim) {
        Some(value) if !value.is_empty() => value,
        _ => fallback,
    }
}

fn non_empty_owned(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn leading_slash(path: &str, fallback: &str) -> String {
    match path.trim() {
        "" => fallback.to_string(),
        path if path.starts_with('/') => path.to_string(),
        path => format!("/{path}"),
    }
}

fn join_url(base_url: &str, path: &str) -> String {
    let base_url = trim_slashes(base_url);
    if base_url.is_empty() {
        return String::new();
    }
    format!("{base_url}{}", leading_slash(path, ""))
}
