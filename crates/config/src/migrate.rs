//! One-way upgrade of historical config shapes into the provider-registry
//! schema.
//!
//! Every step takes the previous step's output by value and returns the next
//! snapshot, so the whole pipeline is a pure function of its input. Running
//! it on its own output changes nothing.

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::{debug, info};

use crate::{
    provider_id::{
        LEGACY_CUSTOM_PROVIDER_ID, LegacyKeyField, builtin_provider_ids, ensure_unique_provider_id,
        normalize_provider_id,
    },
    schema::{
        ApiMode, CustomProvider, DEFAULT_CHAT_COMPLETIONS_PATH, DEFAULT_COMPLETIONS_PATH,
        ProviderSecrets, UserConfig,
    },
};

/// Version stamped on every migrated config.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Hosts that moved. Values equal to the first element are rewritten.
const RETIRED_CHATGPT_WEB_URLS: &[(&str, &str)] =
    &[("https://chat.openai.com", "https://chatgpt.com")];

#[derive(Debug, Clone, PartialEq)]
pub struct Migration {
    pub migrated: UserConfig,
    /// Whether `migrated` differs from the input.
    pub dirty: bool,
}

/// Upgrades `raw` to the current schema.
#[must_use]
pub fn migrate(raw: &UserConfig) -> Migration {
    let config = canonicalize_urls(raw.clone());

    let secrets = import_legacy_secrets(
        config.provider_secrets.clone().unwrap_or_default(),
        &config.legacy_keys,
    );
    let legacy_custom_secret = secrets.get(LEGACY_CUSTOM_PROVIDER_ID).map(str::to_string);
    let registry = normalize_custom_providers(config.custom_providers());
    let secrets = propagate_renamed_secrets(secrets, &registry);

    let mut state = AssignmentState {
        next_ordinal: registry.providers.len(),
        providers: registry.providers,
        used_ids: registry.used_ids,
        secrets,
        legacy_custom_secret,
    };
    let modes = config
        .custom_api_modes()
        .iter()
        .cloned()
        .map(|mode| assign_mode(mode, &mut state, &registry.renames, KeyPolicy::FirstSeen))
        .collect::<Vec<_>>();
    let api_mode = config
        .api_mode
        .clone()
        .map(|mode| assign_mode(mode, &mut state, &registry.renames, KeyPolicy::Overwrite));

    let legacy_keys = sync_legacy_keys(config.legacy_keys.clone(), &state.secrets);

    let migrated = UserConfig {
        provider_secrets: Some(state.secrets),
        custom_providers: Some(state.providers),
        custom_api_modes: Some(modes),
        api_mode,
        config_schema_version: Some(CONFIG_SCHEMA_VERSION),
        legacy_keys,
        ..config
    };
    let dirty = migrated != *raw;
    if dirty {
        info!(
            schema_version = CONFIG_SCHEMA_VERSION,
            providers = migrated.custom_providers().len(),
            secrets = migrated.provider_secrets.as_ref().map_or(0, ProviderSecrets::len),
            "migrated user config"
        );
    }
    Migration { migrated, dirty }
}

// ── Step 1: retired URLs ────────────────────────────────────────────────────

fn canonicalize_urls(mut config: UserConfig) -> UserConfig {
    if let Some(url) = config.custom_chatgpt_web_api_url.as_mut()
        && let Some((_, replacement)) = RETIRED_CHATGPT_WEB_URLS
            .iter()
            .find(|(retired, _)| url.as_str() == *retired)
    {
        debug!(replacement, "rewrote retired chatgpt web url");
        *url = (*replacement).to_string();
    }
    config
}

// ── Step 2: legacy top-level keys ───────────────────────────────────────────

fn import_legacy_secrets(
    mut secrets: ProviderSecrets,
    legacy_keys: &BTreeMap<LegacyKeyField, String>,
) -> ProviderSecrets {
    for (field, value) in legacy_keys {
        let provider_id = field.provider().id();
        if secrets.insert_if_absent(provider_id, value) {
            debug!(provider_id, field = field.storage_key(), "imported legacy api key");
        }
    }
    secrets
}

// ── Step 3: custom provider ids ─────────────────────────────────────────────

#[derive(Debug)]
struct ProviderRename {
    raw_id: String,
    old_id: String,
    new_id: String,
}

#[derive(Debug, Default)]
struct NormalizedRegistry {
    providers: Vec<CustomProvider>,
    used_ids: HashSet<String>,
    /// Old normalized id → new id, for ids that no surviving provider kept.
    renames: HashMap<String, String>,
    renamed: Vec<ProviderRename>,
    /// Trimmed raw id → final id, for every provider with a raw id.
    raw_ids: Vec<(String, String)>,
}

fn normalize_custom_providers(raw: &[CustomProvider]) -> NormalizedRegistry {
    let mut registry = NormalizedRegistry {
        used_ids: builtin_provider_ids(),
        ..NormalizedRegistry::default()
    };
    let mut kept_ids = HashSet::new();

    for (index, entry) in raw.iter().enumerate() {
        let raw_id = entry.id.trim();
        let old_id = normalize_provider_id(raw_id);
        let provider = entry.normalized(index, &mut registry.used_ids);

        if !old_id.is_empty() {
            if old_id == provider.id {
                kept_ids.insert(old_id.clone());
            } else {
                debug!(old_id = %old_id, new_id = %provider.id, "reassigned custom provider id");
                registry.renamed.push(ProviderRename {
                    raw_id: raw_id.to_string(),
                    old_id: old_id.clone(),
                    new_id: provider.id.clone(),
                });
            }
        }
        if !raw_id.is_empty() {
            registry
                .raw_ids
                .push((raw_id.to_string(), provider.id.clone()));
        }
        registry.providers.push(provider);
    }

    for rename in &registry.renamed {
        if !kept_ids.contains(&rename.old_id) {
            registry
                .renames
                .entry(rename.old_id.clone())
                .or_insert_with(|| rename.new_id.clone());
        }
    }
    registry
}

// ── Step 4: secrets follow renamed providers ────────────────────────────────

fn propagate_renamed_secrets(
    mut secrets: ProviderSecrets,
    registry: &NormalizedRegistry,
) -> ProviderSecrets {
    for rename in &registry.renamed {
        if secrets.contains(&rename.new_id) {
            continue;
        }
        let inherited = secrets
            .get(&rename.raw_id)
            .or_else(|| secrets.get(&rename.old_id))
            .map(str::to_string);
        if let Some(secret) = inherited {
            debug!(
                old_id = %rename.old_id,
                new_id = %rename.new_id,
                "copied secret to reassigned provider id"
            );
            secrets.set(rename.new_id.clone(), &secret);
        }
    }

    // Ids that only changed case or punctuation keep their secret too.
    for (raw_id, new_id) in &registry.raw_ids {
        if raw_id == new_id || secrets.contains(new_id) {
            continue;
        }
        if let Some(secret) = secrets.get(raw_id).map(str::to_string) {
            debug!(new_id = %new_id, "copied secret stored under raw provider id");
            secrets.set(new_id.clone(), &secret);
        }
    }
    secrets
}

// ── Steps 5-7: bind modes to providers ──────────────────────────────────────

struct AssignmentState {
    providers: Vec<CustomProvider>,
    used_ids: HashSet<String>,
    secrets: ProviderSecrets,
    next_ordinal: usize,
    legacy_custom_secret: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyPolicy {
    /// The first mode to supply a key for a provider wins.
    FirstSeen,
    /// The mode's key replaces whatever the provider had.
    Overwrite,
}

fn assign_mode(
    mode: ApiMode,
    state: &mut AssignmentState,
    renames: &HashMap<String, String>,
    policy: KeyPolicy,
) -> ApiMode {
    if mode.group_name.is_custom() {
        bind_custom_mode(mode, state, renames, policy)
    } else {
        promote_builtin_mode_key(mode, &mut state.secrets)
    }
}

fn promote_builtin_mode_key(mut mode: ApiMode, secrets: &mut ProviderSecrets) -> ApiMode {
    let target = mode
        .group_name
        .provider()
        .map(|provider| provider.id().to_string())
        .or_else(|| {
            let id = mode.provider_id.trim();
            (!id.is_empty()).then(|| id.to_string())
        });
    if !mode.api_key.trim().is_empty()
        && let Some(target) = target
    {
        if secrets.insert_if_absent(&target, &mode.api_key) {
            debug!(provider_id = %target, group = %mode.group_name, "promoted mode api key");
        }
        mode.api_key.clear();
    }
    mode.provider_id.clear();
    mode
}

fn bind_custom_mode(
    mut mode: ApiMode,
    state: &mut AssignmentState,
    renames: &HashMap<String, String>,
    policy: KeyPolicy,
) -> ApiMode {
    if !mode.provider_id.trim().is_empty() {
        let normalized = normalize_provider_id(&mode.provider_id);
        mode.provider_id = renames.get(&normalized).cloned().unwrap_or(normalized);
    }

    let mut assigned_from_url = false;
    if mode.provider_id.is_empty() {
        let custom_url = mode.custom_url.trim().to_string();
        if custom_url.is_empty() {
            mode.provider_id = LEGACY_CUSTOM_PROVIDER_ID.to_string();
        } else {
            mode.provider_id = provider_for_url(&mode, &custom_url, state);
            mode.custom_url.clear();
            assigned_from_url = true;
        }
    }

    let mode_key = mode.api_key.trim().to_string();
    if !mode_key.is_empty() {
        match policy {
            KeyPolicy::FirstSeen => {
                state.secrets.insert_if_absent(&mode.provider_id, &mode_key);
            },
            KeyPolicy::Overwrite => {
                if state.secrets.get(&mode.provider_id) != Some(mode_key.as_str()) {
                    debug!(provider_id = %mode.provider_id, "selected mode key replaced provider secret");
                    state.secrets.set(mode.provider_id.clone(), &mode_key);
                }
            },
        }
        mode.api_key.clear();
    } else if assigned_from_url && let Some(secret) = state.legacy_custom_secret.as_deref() {
        state.secrets.insert_if_absent(&mode.provider_id, secret);
    }
    mode
}

/// Finds a provider already serving `custom_url` whose secret does not
/// conflict with the mode's key, or registers a new one.
fn provider_for_url(mode: &ApiMode, custom_url: &str, state: &mut AssignmentState) -> String {
    let wanted = endpoint_key(custom_url);
    let mode_key = mode.api_key.trim();
    let existing = state.providers.iter().find(|provider| {
        endpoint_key(&provider.chat_completions_url) == wanted
            && (mode_key.is_empty()
                || state
                    .secrets
                    .get(&provider.id)
                    .is_none_or(|secret| secret == mode_key))
    });
    if let Some(provider) = existing {
        return provider.id.clone();
    }

    state.next_ordinal += 1;
    let ordinal = state.next_ordinal;
    let preferred = match normalize_provider_id(&mode.custom_name) {
        id if id.is_empty() => format!("custom-provider-{ordinal}"),
        id => id,
    };
    let id = ensure_unique_provider_id(&preferred, &state.used_ids);
    state.used_ids.insert(id.clone());
    let name = match mode.custom_name.trim() {
        "" => format!("Custom Provider {ordinal}"),
        name => name.to_string(),
    };
    debug!(provider_id = %id, "registered provider for legacy custom url");
    state.providers.push(CustomProvider {
        id: id.clone(),
        name,
        chat_completions_path: DEFAULT_CHAT_COMPLETIONS_PATH.to_string(),
        completions_path: DEFAULT_COMPLETIONS_PATH.to_string(),
        chat_completions_url: custom_url.to_string(),
        allow_legacy_response_field: true,
        ..CustomProvider::default()
    });
    id
}

fn endpoint_key(url: &str) -> &str {
    url.trim().trim_end_matches('/')
}

// ── Step 8: mirror secrets back to legacy fields ────────────────────────────

fn sync_legacy_keys(
    mut legacy_keys: BTreeMap<LegacyKeyField, String>,
    secrets: &ProviderSecrets,
) -> BTreeMap<LegacyKeyField, String> {
    for field in LegacyKeyField::ALL {
        let Some(secret) = secrets.get(field.provider().id()) else {
            continue;
        };
        let current = legacy_keys.get(&field).map(|value| value.trim());
        if current != Some(secret) {
            legacy_keys.insert(field, secret.to_string());
        }
    }
    legacy_keys
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::schema::ApiModeGroup,
        serde_json::{Map, Value, json},
    };

    fn config(value: Value) -> UserConfig {
        let Value::Object(map) = value else {
            panic!("expected object");
        };
        UserConfig::from_map(map)
    }

    fn secrets_json(config: &UserConfig) -> Value {
        serde_json::to_value(config.provider_secrets.as_ref().unwrap()).unwrap()
    }

    #[test]
    fn rewrites_retired_chatgpt_web_url() {
        let result = migrate(&config(json!({
            "customChatGptWebApiUrl": "https://chat.openai.com",
        })));
        assert_eq!(
            result.migrated.custom_chatgpt_web_api_url.as_deref(),
            Some("https://chatgpt.com")
        );
        assert!(result.dirty);
    }

    #[test]
    fn retired_url_must_match_exactly() {
        let result = migrate(&config(json!({
            "customChatGptWebApiUrl": " https://chat.openai.com ",
        })));
        assert_eq!(
            result.migrated.custom_chatgpt_web_api_url.as_deref(),
            Some(" https://chat.openai.com ")
        );
    }

    #[test]
    fn imports_legacy_keys_without_overwriting() {
        let result = migrate(&config(json!({
            "apiKey": "legacy-openai",
            "deepSeekApiKey": "legacy-deepseek",
            "providerSecrets": { "openai": "existing-openai" },
        })));
        assert_eq!(
            secrets_json(&result.migrated),
            json!({ "openai": "existing-openai", "deepseek": "legacy-deepseek" })
        );
        // Reverse sync makes the legacy field agree with the registry.
        assert_eq!(
            result.migrated.legacy_key(LegacyKeyField::ApiKey),
            Some("existing-openai")
        );
    }

    #[test]
    fn empty_config_gains_schema_and_collections() {
        let result = migrate(&UserConfig::default());
        assert!(result.dirty);
        assert_eq!(result.migrated.config_schema_version, Some(CONFIG_SCHEMA_VERSION));
        assert_eq!(result.migrated.provider_secrets, Some(ProviderSecrets::new()));
        assert_eq!(result.migrated.custom_providers, Some(Vec::new()));
        assert_eq!(result.migrated.custom_api_modes, Some(Vec::new()));
        assert_eq!(result.migrated.api_mode, None);
    }

    #[test]
    fn colliding_custom_id_is_renamed_and_inherits_raw_secret() {
        let result = migrate(&config(json!({
            "providerSecrets": {
                "openai": "builtin-provider-secret",
                "OpenAI": "custom-provider-secret",
            },
            "customOpenAIProviders": [
                { "id": "OpenAI", "name": "Custom OpenAI", "chatCompletionsUrl": "https://proxy.example.com/v1/chat/completions" },
            ],
            "customApiModes": [
                { "groupName": "customApiModelKeys", "itemName": "custom", "providerId": "OpenAI", "active": true },
            ],
        })));
        let migrated = &result.migrated;
        assert_eq!(migrated.custom_providers()[0].id, "openai-2");
        assert_eq!(migrated.custom_api_modes()[0].provider_id, "openai-2");
        let secrets = migrated.provider_secrets.as_ref().unwrap();
        assert_eq!(secrets.get("openai"), Some("builtin-provider-secret"));
        assert_eq!(secrets.get("openai-2"), Some("custom-provider-secret"));
    }

    #[test]
    fn duplicate_ids_keep_first_and_suffix_the_rest() {
        let result = migrate(&config(json!({
            "customOpenAIProviders": [
                { "id": "proxy" },
                { "id": "Proxy" },
                { "id": "" },
            ],
        })));
        let ids: Vec<&str> = result
            .migrated
            .custom_providers()
            .iter()
            .map(|provider| provider.id.as_str())
            .collect();
        assert_eq!(ids, ["proxy", "proxy-2", "custom-provider-3"]);
    }

    #[test]
    fn mode_bound_to_kept_id_is_not_redirected_by_duplicate() {
        let result = migrate(&config(json!({
            "customOpenAIProviders": [{ "id": "proxy" }, { "id": "PROXY" }],
            "customApiModes": [
                { "groupName": "customApiModelKeys", "providerId": "Proxy" },
            ],
        })));
        assert_eq!(result.migrated.custom_api_modes()[0].provider_id, "proxy");
    }

    #[test]
    fn raw_id_secret_follows_normalization() {
        let result = migrate(&config(json!({
            "providerSecrets": { "MyProxy": "proxy-secret" },
            "customOpenAIProviders": [{ "id": "MyProxy", "name": "My Proxy" }],
        })));
        let secrets = result.migrated.provider_secrets.unwrap();
        assert_eq!(secrets.get("myproxy"), Some("proxy-secret"));
    }

    #[test]
    fn secret_of_absent_provider_is_not_carried_to_a_new_id() {
        let result = migrate(&config(json!({
            "providerSecrets": { "OpenAI": "x" },
            "customOpenAIProviders": [{ "id": "proxy" }],
        })));
        let migrated = &result.migrated;
        let ids: Vec<&str> = migrated
            .custom_providers()
            .iter()
            .map(|provider| provider.id.as_str())
            .collect();
        assert_eq!(ids, ["proxy"]);
        assert_eq!(secrets_json(migrated), json!({ "OpenAI": "x" }));
    }

    #[test]
    fn builtin_mode_key_moves_into_registry() {
        let result = migrate(&config(json!({
            "customApiModes": [
                { "groupName": "chatgptApiModelKeys", "itemName": "chatgptApi4oMini", "apiKey": "sk-from-mode", "providerId": "openai" },
            ],
        })));
        let mode = &result.migrated.custom_api_modes()[0];
        assert_eq!(mode.api_key, "");
        assert_eq!(mode.provider_id, "");
        assert_eq!(
            result.migrated.provider_secrets.as_ref().unwrap().get("openai"),
            Some("sk-from-mode")
        );
        assert_eq!(
            result.migrated.legacy_key(LegacyKeyField::ApiKey),
            Some("sk-from-mode")
        );
    }

    #[test]
    fn builtin_mode_key_without_target_is_left_in_place() {
        let result = migrate(&config(json!({
            "customApiModes": [
                { "groupName": "claudeApiModelKeys", "itemName": "claude37SonnetApi", "apiKey": "claude-key" },
            ],
        })));
        assert_eq!(result.migrated.custom_api_modes()[0].api_key, "claude-key");
    }

    #[test]
    fn custom_mode_without_url_binds_to_legacy_provider() {
        let result = migrate(&config(json!({
            "customApiModes": [
                { "groupName": "customApiModelKeys", "itemName": "custom", "customName": "local", "apiKey": "k1" },
            ],
        })));
        let mode = &result.migrated.custom_api_modes()[0];
        assert_eq!(mode.provider_id, LEGACY_CUSTOM_PROVIDER_ID);
        assert_eq!(mode.api_key, "");
        assert_eq!(
            result.migrated.legacy_key(LegacyKeyField::CustomApiKey),
            Some("k1")
        );
    }

    #[test]
    fn url_mode_inherits_legacy_custom_key() {
        let result = migrate(&config(json!({
            "customApiKey": "legacy-key",
            "customApiModes": [
                { "groupName": "customApiModelKeys", "itemName": "custom", "customName": "My Proxy", "customUrl": "https://proxy.example.com/v1/chat/completions" },
            ],
        })));
        let migrated = &result.migrated;
        let provider = &migrated.custom_providers()[0];
        assert_eq!(provider.id, "my-proxy");
        assert_eq!(provider.name, "My Proxy");
        assert!(provider.allow_legacy_response_field);
        let mode = &migrated.custom_api_modes()[0];
        assert_eq!(mode.provider_id, "my-proxy");
        assert_eq!(mode.custom_url, "");
        assert_eq!(
            migrated.provider_secrets.as_ref().unwrap().get("my-proxy"),
            Some("legacy-key")
        );
    }

    #[test]
    fn url_mode_inherits_legacy_custom_secret_from_registry() {
        let result = migrate(&config(json!({
            "providerSecrets": { "legacy-custom-default": "canonical" },
            "customApiModes": [
                { "groupName": "customApiModelKeys", "itemName": "custom", "customName": "P", "customUrl": "https://p.example.com/v1/chat/completions" },
            ],
        })));
        let migrated = &result.migrated;
        assert_eq!(migrated.custom_api_modes()[0].provider_id, "p");
        assert_eq!(
            migrated.provider_secrets.as_ref().unwrap().get("p"),
            Some("canonical")
        );
    }

    #[test]
    fn url_mode_prefers_registry_secret_over_stale_legacy_field() {
        let result = migrate(&config(json!({
            "customApiKey": "stale-field",
            "providerSecrets": { "legacy-custom-default": "canonical" },
            "customApiModes": [
                { "groupName": "customApiModelKeys", "itemName": "custom", "customName": "P", "customUrl": "https://p.example.com/v1/chat/completions" },
            ],
        })));
        let migrated = &result.migrated;
        let secrets = migrated.provider_secrets.as_ref().unwrap();
        assert_eq!(secrets.get("p"), Some("canonical"));
        assert_eq!(secrets.get(LEGACY_CUSTOM_PROVIDER_ID), Some("canonical"));
        assert_eq!(
            migrated.legacy_key(LegacyKeyField::CustomApiKey),
            Some("canonical")
        );
    }

    #[test]
    fn same_url_with_different_keys_splits_providers() {
        let result = migrate(&config(json!({
            "customApiModes": [
                { "groupName": "customApiModelKeys", "customName": "mode-a", "customUrl": "https://same.example.com/v1/chat/completions", "apiKey": "key-a" },
                { "groupName": "customApiModelKeys", "customName": "mode-b", "customUrl": "https://same.example.com/v1/chat/completions/", "apiKey": "key-b" },
                { "groupName": "customApiModelKeys", "customName": "mode-c", "customUrl": "https://same.example.com/v1/chat/completions", "apiKey": "key-a" },
            ],
        })));
        let migrated = &result.migrated;
        assert_eq!(migrated.custom_providers().len(), 2);
        let bound: Vec<&str> = migrated
            .custom_api_modes()
            .iter()
            .map(|mode| mode.provider_id.as_str())
            .collect();
        assert_eq!(bound, ["mode-a", "mode-b", "mode-a"]);
        let secrets = migrated.provider_secrets.as_ref().unwrap();
        assert_eq!(secrets.get("mode-a"), Some("key-a"));
        assert_eq!(secrets.get("mode-b"), Some("key-b"));
    }

    #[test]
    fn selected_mode_key_overwrites_provider_secret() {
        let modes = json!([
            { "groupName": "customApiModelKeys", "providerId": "myproxy", "apiKey": "key-a", "active": true },
            { "groupName": "customApiModelKeys", "providerId": "myproxy", "apiKey": "key-b", "active": true },
        ]);
        let result = migrate(&config(json!({
            "customOpenAIProviders": [{ "id": "myproxy" }],
            "customApiModes": modes,
            "apiMode": { "groupName": "customApiModelKeys", "providerId": "myproxy", "apiKey": "key-b", "active": true },
        })));
        let migrated = &result.migrated;
        assert_eq!(
            migrated.provider_secrets.as_ref().unwrap().get("myproxy"),
            Some("key-b")
        );
        assert!(migrated.custom_api_modes().iter().all(|mode| mode.api_key.is_empty()));
        assert_eq!(migrated.api_mode.as_ref().unwrap().api_key, "");
    }

    #[test]
    fn selected_mode_with_url_binds_like_its_list_entry() {
        let mode = json!({
            "groupName": "customApiModelKeys",
            "itemName": "custom",
            "customName": "Proxy",
            "customUrl": "https://proxy.example.com/v1/chat/completions",
            "apiKey": "proxy-key",
            "active": true,
        });
        let result = migrate(&config(json!({
            "customApiModes": [mode.clone()],
            "apiMode": mode,
        })));
        let migrated = &result.migrated;
        assert_eq!(migrated.custom_providers().len(), 1);
        let selected = migrated.api_mode.as_ref().unwrap();
        assert_eq!(selected.provider_id, "proxy");
        assert!(selected.is_same_selection(&migrated.custom_api_modes()[0]));
    }

    #[test]
    fn selected_builtin_mode_fills_only_absent_secret() {
        let result = migrate(&config(json!({
            "providerSecrets": { "deepseek": "stored" },
            "apiMode": { "groupName": "deepSeekApiModelKeys", "itemName": "deepseek_chat", "apiKey": "from-mode", "providerId": "deepseek" },
        })));
        let migrated = &result.migrated;
        assert_eq!(
            migrated.provider_secrets.as_ref().unwrap().get("deepseek"),
            Some("stored")
        );
        let selected = migrated.api_mode.as_ref().unwrap();
        assert_eq!(selected.group_name, ApiModeGroup::DeepSeekApi);
        assert_eq!(selected.api_key, "");
        assert_eq!(selected.provider_id, "");
    }

    #[test]
    fn migration_is_idempotent() {
        let raw = config(json!({
            "apiKey": "sk-openai",
            "customApiKey": "legacy-key",
            "customChatGptWebApiUrl": "https://chat.openai.com",
            "providerSecrets": { "OpenAI": "custom-secret" },
            "customOpenAIProviders": [
                { "id": "OpenAI", "name": "Proxy" },
                { "id": "openai-2" },
                { "name": "  " },
            ],
            "customApiModes": [
                { "groupName": "customApiModelKeys", "customName": "Proxy", "customUrl": "https://p.example.com/v1/chat/completions", "apiKey": "a" },
                { "groupName": "customApiModelKeys", "providerId": "OpenAI", "apiKey": "b" },
                { "groupName": "chatgptApiModelKeys", "itemName": "chatgptApi4oMini", "apiKey": "c" },
            ],
            "apiMode": { "groupName": "customApiModelKeys", "providerId": "OpenAI", "apiKey": "b" },
        }));
        let first = migrate(&raw);
        assert!(first.dirty);
        let second = migrate(&first.migrated);
        assert!(!second.dirty, "second pass changed {:?}", second.migrated);
        assert_eq!(second.migrated, first.migrated);
    }

    #[test]
    fn unrelated_keys_survive_migration() {
        let mut extra = Map::new();
        extra.insert("themeMode".into(), json!("dark"));
        let raw = UserConfig {
            extra,
            ..UserConfig::default()
        };
        let migrated = migrate(&raw).migrated;
        assert_eq!(migrated.extra.get("themeMode"), Some(&json!("dark")));
    }
}
