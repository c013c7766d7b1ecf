//! Which API key a request uses, and what to write when the user edits one.

use std::collections::BTreeSet;

use {
    serde_json::{Map, Value},
    tracing::debug,
};

use chatbox_config::{
    ApiMode, BuiltinProvider, UserConfig,
    schema::{API_MODE_KEY, CUSTOM_API_MODES_KEY, PROVIDER_SECRETS_KEY},
};

use crate::session::Session;

/// API key for `provider_id` in the context of `session`, in precedence
/// order: the custom-group mode's own key, the registry secret, the legacy
/// top-level field of a built-in provider. Empty when none is set.
#[must_use]
pub fn resolve_secret(config: &UserConfig, provider_id: &str, session: &Session) -> String {
    if let Some(mode) = session.custom_mode() {
        let mode_key = mode.api_key.trim();
        if !mode_key.is_empty() {
            return mode_key.to_string();
        }
    }
    let provider_id = provider_id.trim();
    if let Some(secret) = config
        .provider_secrets
        .as_ref()
        .and_then(|secrets| secrets.get(provider_id))
    {
        return secret.to_string();
    }
    BuiltinProvider::from_id(provider_id)
        .and_then(|provider| config.legacy_key(provider.legacy_key_field()))
        .unwrap_or_default()
        .to_string()
}

/// Store patch for setting `provider_id`'s key to `api_key`.
///
/// Besides the registry entry and the mirrored legacy field, custom-group
/// modes bound to the provider drop keys they only inherited from the old
/// provider key, and the selected mode adopts the new one.
pub fn build_provider_secret_update(
    config: &UserConfig,
    provider_id: &str,
    api_key: &str,
) -> serde_json::Result<Map<String, Value>> {
    let provider_id = provider_id.trim();
    let mut patch = Map::new();
    if provider_id.is_empty() {
        return Ok(patch);
    }
    let api_key = api_key.trim();
    let legacy_field = BuiltinProvider::from_id(provider_id).map(BuiltinProvider::legacy_key_field);

    let mut secrets = config.provider_secrets.clone().unwrap_or_default();
    let baselines: BTreeSet<String> = [
        secrets.get(provider_id).map(str::to_string),
        legacy_field
            .and_then(|field| config.legacy_key(field))
            .map(str::to_string),
    ]
    .into_iter()
    .flatten()
    .collect();

    secrets.set(provider_id, api_key);
    patch.insert(PROVIDER_SECRETS_KEY.into(), serde_json::to_value(&secrets)?);
    if let Some(field) = legacy_field {
        patch.insert(field.storage_key().into(), Value::String(api_key.to_string()));
    }

    let selected = config.api_mode.as_ref();
    let update = |mode: &ApiMode| {
        let is_selected = selected.is_some_and(|selected| selected.is_same_selection(mode));
        rekey_mode(mode, provider_id, api_key, &baselines, is_selected)
    };

    let modes = config.custom_api_modes();
    let rekeyed: Vec<Option<ApiMode>> = modes.iter().map(update).collect();
    if rekeyed.iter().any(Option::is_some) {
        let next: Vec<ApiMode> = modes
            .iter()
            .zip(rekeyed)
            .map(|(mode, rekeyed)| rekeyed.unwrap_or_else(|| mode.clone()))
            .collect();
        debug!(provider_id, "provider key edit updated saved modes");
        patch.insert(CUSTOM_API_MODES_KEY.into(), serde_json::to_value(next)?);
    }
    if let Some(mode) = selected
        && let Some(next) = rekey_mode(mode, provider_id, api_key, &baselines, true)
    {
        patch.insert(API_MODE_KEY.into(), serde_json::to_value(next)?);
    }
    Ok(patch)
}

/// New version of `mode` after the key edit, or `None` when it is unaffected.
fn rekey_mode(
    mode: &ApiMode,
    provider_id: &str,
    api_key: &str,
    baselines: &BTreeSet<String>,
    is_selected: bool,
) -> Option<ApiMode> {
    let mode_key = mode.api_key.trim();
    if !mode.group_name.is_custom() || mode.provider_id.trim() != provider_id || mode_key.is_empty() {
        return None;
    }
    let next_key = if baselines.contains(mode_key) {
        ""
    } else if is_selected && mode_key != api_key {
        api_key
    } else {
        return None;
    };
    let mut next = mode.clone();
    next.api_key = next_key.to_string();
    Some(next)
}
