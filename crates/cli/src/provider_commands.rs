//! Commands that inspect the provider registry and request resolution.

use {
    anyhow::Result,
    clap::Args,
    secrecy::ExposeSecret,
    serde_json::{Value, json},
};

use {
    chatbox_config::{ApiMode, ApiModeGroup, UserConfig, redact::REDACTED},
    chatbox_providers::{
        EndpointType, ProviderRegistry, ResolvedRequest, Session, parse_chat_completions_endpoint_url,
        resolve_request,
    },
};

use crate::config_commands::print_json;

#[derive(Args, Debug, Default)]
pub struct ResolveArgs {
    /// Api mode group, e.g. `chatgptApiModelKeys` or `customApiModelKeys`.
    #[arg(long, required_unless_present = "model_name")]
    pub group: Option<String>,
    /// Api mode item, e.g. `chatgptApi4oMini`.
    #[arg(long, default_value = "")]
    pub item: String,
    /// Provider id bound to a custom mode.
    #[arg(long)]
    pub provider_id: Option<String>,
    /// Model name sent by a custom mode.
    #[arg(long)]
    pub custom_name: Option<String>,
    /// Legacy session model name, used when no group is given.
    #[arg(long)]
    pub model_name: Option<String>,
}

impl ResolveArgs {
    fn session(&self) -> Session {
        let model_name = self.model_name.clone().unwrap_or_default();
        let Some(group) = &self.group else {
            return Session::from_model_name(model_name);
        };
        let mut mode = ApiMode::new(ApiModeGroup::parse(group.trim()), self.item.trim());
        mode.provider_id = self.provider_id.clone().unwrap_or_default();
        mode.custom_name = self.custom_name.clone().unwrap_or_default();
        Session {
            model_name,
            api_mode: Some(mode),
        }
    }
}

/// One line of `chatbox providers`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderRow {
    pub id: String,
    pub name: String,
    pub chat_url: String,
    pub enabled: bool,
    pub builtin: bool,
}

#[must_use]
pub fn provider_rows(config: &UserConfig) -> Vec<ProviderRow> {
    let registry = ProviderRegistry::from_config(config);
    registry
        .providers()
        .iter()
        .map(|provider| ProviderRow {
            id: provider.id.to_string(),
            name: provider.name.clone(),
            chat_url: registry.resolve_endpoint_url(provider, EndpointType::Chat),
            enabled: provider.enabled,
            builtin: provider.builtin,
        })
        .collect()
}

pub fn handle_providers(config: &UserConfig) {
    let rows = provider_rows(config);
    let id_width = rows.iter().map(|row| row.id.len()).max().unwrap_or(0);
    let name_width = rows.iter().map(|row| row.name.len()).max().unwrap_or(0);
    for row in &rows {
        let status = if row.enabled {
            "✓"
        } else {
            "✗"
        };
        let kind = if row.builtin {
            "builtin"
        } else {
            "custom"
        };
        println!(
            "{status} {:<id_width$}  {:<name_width$}  {kind:<7}  {}",
            row.id, row.name, row.chat_url
        );
    }
}

/// The resolved request as printed, with the key reduced to whether one is set.
#[must_use]
pub fn request_summary(request: &ResolvedRequest) -> Value {
    let api_key = if request.api_key.expose_secret().is_empty() {
        Value::Null
    } else {
        Value::String(REDACTED.to_string())
    };
    json!({
        "providerId": request.provider_id,
        "providerName": request.provider.name,
        "endpointType": request.endpoint_type,
        "requestUrl": request.request_url,
        "model": request.model,
        "allowLegacyResponseField": request.provider.allow_legacy_response_field,
        "apiKey": api_key,
    })
}

#[must_use]
pub fn resolve_summary(config: &UserConfig, args: &ResolveArgs) -> Option<Value> {
    resolve_request(config, &args.session()).map(|request| request_summary(&request))
}

pub fn handle_resolve(config: &UserConfig, args: &ResolveArgs) -> Result<()> {
    let Some(summary) = resolve_summary(config, args) else {
        eprintln!("provider not configured");
        std::process::exit(1);
    };
    print_json(&summary)
}

pub fn handle_check_url(url: &str) -> Result<()> {
    let parsed = parse_chat_completions_endpoint_url(url);
    if !parsed.valid {
        eprintln!("not a chat completions URL: {url}");
        std::process::exit(1);
    }
    print_json(&serde_json::to_value(parsed)?)
}
