//! Persisted user configuration: schema, defaults, storage, and the upgrade
//! of legacy shapes into the provider registry.
//!
//! The store is one flat JSON object shared with the rest of the extension.
//! Loading always migrates, so callers only ever see the current schema.

pub mod defaults;
pub mod error;
pub mod loader;
pub mod migrate;
pub mod patch;
pub mod provider_id;
pub mod redact;
pub mod schema;
pub mod store;

pub use {
    defaults::{Environment, default_config},
    error::{Error, Result},
    loader::{MigrationPlan, load_user_config, plan_migration},
    migrate::{CONFIG_SCHEMA_VERSION, Migration, migrate},
    patch::storage_patch,
    provider_id::{
        BuiltinProvider, CUSTOM_PROVIDER_ID_BASE, LEGACY_CUSTOM_PROVIDER_ID, LegacyKeyField,
        ProviderId, builtin_provider_ids, ensure_unique_provider_id, normalize_provider_id,
    },
    redact::redact_sensitive,
    schema::{ApiMode, ApiModeGroup, CustomProvider, ProviderSecrets, UserConfig},
    store::{ConfigStore, JsonFileStore, MemoryStore, default_store_path},
};
