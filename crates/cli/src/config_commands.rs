//! Commands that read or write the config store.

use {
    anyhow::{Result, bail},
    secrecy::{ExposeSecret, Secret},
    serde_json::{Map, Value},
    tracing::{info, warn},
};

use {
    chatbox_config::{
        ConfigStore, UserConfig, load_user_config, plan_migration, redact_sensitive,
    },
    chatbox_providers::{ProviderRegistry, build_provider_secret_update},
};

/// Outcome of `chatbox migrate`.
#[derive(Debug)]
pub struct MigrateReport {
    pub patch: Map<String, Value>,
    pub written: bool,
}

/// Migrates the store, writing the patch unless `dry_run`.
pub fn migrate_store(store: &dyn ConfigStore, dry_run: bool) -> Result<MigrateReport> {
    let plan = plan_migration(&store.read_all()?)?;
    let written = !dry_run && !plan.patch.is_empty();
    if written {
        store.write_patch(plan.patch.clone())?;
    }
    Ok(MigrateReport {
        patch: plan.patch,
        written,
    })
}

pub fn handle_migrate(store: &dyn ConfigStore, dry_run: bool) -> Result<()> {
    let report = migrate_store(store, dry_run)?;
    if report.patch.is_empty() {
        eprintln!("Config is already up to date.");
        return Ok(());
    }
    print_json(&Value::Object(report.patch.clone()))?;
    if report.written {
        eprintln!("Updated {} key(s).", report.patch.len());
    } else {
        eprintln!("Dry run: {} key(s) would change.", report.patch.len());
    }
    Ok(())
}

/// Loaded config with defaults applied, secrets redacted.
pub fn show_config(store: &dyn ConfigStore, defaults: &UserConfig) -> Result<Value> {
    let config = load_user_config(store, defaults)?;
    Ok(redact_sensitive(&Value::Object(config.to_map()?)))
}

pub fn handle_show(store: &dyn ConfigStore, defaults: &UserConfig) -> Result<()> {
    print_json(&show_config(store, defaults)?)
}

/// Stores `api_key` for `provider_id` and returns the keys written.
pub fn set_provider_key(
    store: &dyn ConfigStore,
    defaults: &UserConfig,
    provider_id: &str,
    api_key: &Secret<String>,
) -> Result<Vec<String>> {
    let config = load_user_config(store, defaults)?;
    if ProviderRegistry::from_config(&config)
        .get(provider_id)
        .is_none()
    {
        warn!(provider_id, "no enabled provider with this id, storing the key anyway");
    }
    let patch = build_provider_secret_update(&config, provider_id, api_key.expose_secret())?;
    if patch.is_empty() {
        bail!("provider id must not be empty");
    }
    let keys: Vec<String> = patch.keys().cloned().collect();
    store.write_patch(patch)?;
    info!(provider_id, ?keys, "stored provider key");
    Ok(keys)
}

pub fn handle_set_key(
    store: &dyn ConfigStore,
    defaults: &UserConfig,
    provider_id: &str,
    api_key: Secret<String>,
) -> Result<()> {
    let keys = set_provider_key(store, defaults, provider_id, &api_key)?;
    eprintln!("Updated key for {} ({}).", provider_id.trim(), keys.join(", "));
    Ok(())
}

pub(crate) fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        chatbox_config::{Environment, JsonFileStore, MemoryStore, default_config},
        serde_json::json,
    };

    fn store(value: Value) -> MemoryStore {
        let Value::Object(map) = value else {
            panic!("expected object");
        };
        MemoryStore::with_contents(map)
    }

    #[test]
    fn dry_run_leaves_store_untouched() {
        let store = store(json!({ "apiKey": "sk-openai" }));
        let report = migrate_store(&store, true).unwrap();
        assert!(!report.written);
        assert!(report.patch.contains_key("providerSecrets"));
        assert!(!store.read_all().unwrap().contains_key("providerSecrets"));
    }

    #[test]
    fn migrate_writes_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("config.json"));
        store
            .write_patch(Map::from_iter([("ollamaApiKey".to_string(), json!("ok"))]))
            .unwrap();

        let first = migrate_store(&store, false).unwrap();
        assert!(first.written);
        let second = migrate_store(&store, false).unwrap();
        assert!(!second.written);
        assert!(second.patch.is_empty());
    }

    #[test]
    fn show_redacts_secrets() {
        let store = store(json!({ "apiKey": "sk-visible", "providerSecrets": { "openai": "sk-visible" } }));
        let shown = show_config(&store, &default_config(&Environment::new("en", false))).unwrap();
        let text = shown.to_string();
        assert!(!text.contains("sk-visible"), "leaked: {text}");
        assert_eq!(shown["modelName"], json!("claude2WebFree"));
    }

    #[test]
    fn environment_defaults_reach_loaded_config() {
        let store = store(json!({}));
        let defaults = default_config(&Environment::new("zh-CN", false));
        let shown = show_config(&store, &defaults).unwrap();
        assert_eq!(shown["modelName"], json!("moonshotWebFree"));
    }

    #[test]
    fn set_key_writes_registry_and_legacy_field() {
        let store = store(json!({}));
        let keys = set_provider_key(
            &store,
            &UserConfig::default(),
            "deepseek",
            &Secret::new("ds-new".into()),
        )
        .unwrap();
        assert!(keys.contains(&"providerSecrets".to_string()));
        let stored = store.read_all().unwrap();
        assert_eq!(stored["providerSecrets"]["deepseek"], json!("ds-new"));
        assert_eq!(stored["deepSeekApiKey"], json!("ds-new"));
    }

    #[test]
    fn set_key_rejects_blank_provider_id() {
        let store = store(json!({}));
        let blank = set_provider_key(&store, &UserConfig::default(), "  ", &Secret::new("k".into()));
        assert!(blank.is_err());
    }
}
