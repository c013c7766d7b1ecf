//! Resolution of a chat session into the concrete request target.

use {secrecy::Secret, tracing::debug};

use chatbox_config::{UserConfig, normalize_provider_id};

use crate::{
    legacy,
    models::resolve_model_name,
    registry::{EndpointType, Provider, ProviderRegistry, trim_slashes},
    secrets::resolve_secret,
    session::Session,
};

/// Everything needed to issue an OpenAI-compatible request.
#[derive(Debug, Clone)]
pub struct ResolvedRequest {
    pub provider_id: String,
    pub provider: Provider,
    pub endpoint_type: EndpointType,
    pub request_url: String,
    pub model: String,
    pub api_key: Secret<String>,
}

/// Provider id a session asks for, before any registry lookup.
#[must_use]
pub fn resolve_provider_id(session: &Session) -> Option<String> {
    if let Some(mode) = &session.api_mode {
        let explicit = mode.provider_id.trim();
        if mode.group_name.is_custom() && !explicit.is_empty() {
            return Some(explicit.to_string());
        }
        if let Some(provider) = mode.group_name.provider() {
            return Some(provider.id().to_string());
        }
        if !explicit.is_empty() {
            return Some(explicit.to_string());
        }
    }
    legacy::provider_for_model_name(&session.model_name).map(|provider| provider.id().to_string())
}

#[must_use]
pub fn resolve_endpoint_type(session: &Session) -> EndpointType {
    let completion = match &session.api_mode {
        Some(mode) => mode.group_name.is_completion(),
        None => legacy::is_completion_model_name(&session.model_name),
    };
    if completion {
        EndpointType::Completion
    } else {
        EndpointType::Chat
    }
}

/// Resolves `session` against `config`. `None` means the session's provider
/// is unknown, disabled, or has no usable URL.
#[must_use]
pub fn resolve_request(config: &UserConfig, session: &Session) -> Option<ResolvedRequest> {
    let Some(requested_id) = resolve_provider_id(session) else {
        debug!(model_name = %session.model_name, "session names no provider");
        return None;
    };
    let registry = ProviderRegistry::from_config(config);
    let provider = match registry.get(&requested_id) {
        Some(provider) => provider.clone(),
        None => {
            let Some(provider) = recover_custom_provider(&registry, session, &requested_id) else {
                debug!(provider_id = %requested_id, "provider unknown or disabled");
                return None;
            };
            debug!(
                requested = %requested_id,
                provider_id = %provider.id,
                "recovered stale custom provider id"
            );
            provider.clone()
        },
    };

    let endpoint_type = resolve_endpoint_type(session);
    let request_url = unmigrated_custom_url(session, endpoint_type)
        .unwrap_or_else(|| registry.resolve_endpoint_url(&provider, endpoint_type));
    if request_url.is_empty() {
        debug!(provider_id = %provider.id, ?endpoint_type, "provider has no url for endpoint");
        return None;
    }

    let provider_id = provider.id.to_string();
    let api_key = resolve_secret(config, &provider_id, session);
    Some(ResolvedRequest {
        model: resolve_model_name(config, session),
        api_key: Secret::new(api_key),
        provider_id,
        provider,
        endpoint_type,
        request_url,
    })
}

/// A custom-group session whose stored id no longer matches: retry with the
/// normalized id, then by the mode's custom URL.
fn recover_custom_provider<'a>(
    registry: &'a ProviderRegistry,
    session: &Session,
    requested_id: &str,
) -> Option<&'a Provider> {
    let mode = session.custom_mode()?;

    let normalized = normalize_provider_id(requested_id);
    if !normalized.is_empty()
        && let Some(provider) = enabled_custom(registry).find(|provider| provider.id.as_str() == normalized)
    {
        return Some(provider);
    }

    let custom_url = trim_slashes(&mode.custom_url);
    if custom_url.is_empty() {
        return None;
    }
    enabled_custom(registry).find(|provider| {
        trim_slashes(&registry.resolve_endpoint_url(provider, EndpointType::Chat)) == custom_url
    })
}

fn enabled_custom(registry: &ProviderRegistry) -> impl Iterator<Item = &Provider> {
    registry.custom_providers().filter(|provider| provider.enabled)
}

/// Chat URL stored directly on a custom mode that migration has not yet
/// bound to a provider.
fn unmigrated_custom_url(session: &Session, endpoint_type: EndpointType) -> Option<String> {
    let mode = session.custom_mode()?;
    let custom_url = mode.custom_url.trim();
    (endpoint_type == EndpointType::Chat && mode.provider_id.trim().is_empty() && !custom_url.is_empty())
        .then(|| custom_url.to_string())
}
