//! Minimal write-back after a migration.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::{
    provider_id::LegacyKeyField,
    schema::{
        API_MODE_KEY, CONFIG_SCHEMA_VERSION_KEY, CUSTOM_API_MODES_KEY,
        CUSTOM_CHATGPT_WEB_API_URL_KEY, CUSTOM_PROVIDERS_KEY, PROVIDER_SECRETS_KEY, ProviderSecrets,
        UserConfig,
    },
};

/// Keys compared by JSON equality. Absent counts as `null`.
const STRUCTURAL_KEYS: [&str; 4] = [
    CUSTOM_API_MODES_KEY,
    CUSTOM_PROVIDERS_KEY,
    API_MODE_KEY,
    CONFIG_SCHEMA_VERSION_KEY,
];

/// Entries of `migrated` that differ from what the store holds in `original`.
pub fn storage_patch(
    original: &Map<String, Value>,
    migrated: &UserConfig,
) -> serde_json::Result<Map<String, Value>> {
    let target = migrated.to_map()?;
    let mut patch = Map::new();

    for key in STRUCTURAL_KEYS {
        let next = target.get(key).unwrap_or(&Value::Null);
        let previous = original.get(key).unwrap_or(&Value::Null);
        if next != previous {
            patch.insert(key.into(), next.clone());
        }
    }

    if let Some(secrets) = &migrated.provider_secrets
        && !same_secrets(original.get(PROVIDER_SECRETS_KEY), secrets)
    {
        patch.insert(PROVIDER_SECRETS_KEY.into(), serde_json::to_value(secrets)?);
    }

    let string_keys = LegacyKeyField::ALL
        .into_iter()
        .map(LegacyKeyField::storage_key)
        .chain([CUSTOM_CHATGPT_WEB_API_URL_KEY]);
    for key in string_keys {
        if let Some(next) = target.get(key)
            && original.get(key) != Some(next)
        {
            patch.insert(key.into(), next.clone());
        }
    }
    Ok(patch)
}

fn same_secrets(stored: Option<&Value>, secrets: &ProviderSecrets) -> bool {
    let Some(Value::Object(stored)) = stored else {
        return false;
    };
    let stored: BTreeMap<&str, &str> = stored
        .iter()
        .filter_map(|(id, value)| {
            let value = value.as_str()?.trim();
            (!value.is_empty()).then_some((id.as_str(), value))
        })
        .collect();
    let current: BTreeMap<&str, &str> = secrets.iter().map(|(id, value)| (id, value.trim())).collect();
    stored == current
}
