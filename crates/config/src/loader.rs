//! Read → migrate → write back → layer defaults.

use {
    serde_json::{Map, Value},
    tracing::debug,
};

use crate::{
    error::Result,
    migrate::{Migration, migrate},
    patch::storage_patch,
    schema::UserConfig,
    store::ConfigStore,
};

/// A migrated config and the patch that would bring the store up to date.
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationPlan {
    pub migrated: UserConfig,
    pub patch: Map<String, Value>,
}

/// Computes, without writing, what loading `raw` would persist.
pub fn plan_migration(raw: &Map<String, Value>) -> Result<MigrationPlan> {
    let Migration { migrated, dirty } = migrate(&UserConfig::from_map(raw.clone()));
    let patch = if dirty {
        storage_patch(raw, &migrated)?
    } else {
        Map::new()
    };
    Ok(MigrationPlan { migrated, patch })
}

/// Loads the user config, persisting any migration before returning it.
pub fn load_user_config(store: &dyn ConfigStore, defaults: &UserConfig) -> Result<UserConfig> {
    let raw = store.read_all()?;
    let MigrationPlan { migrated, patch } = plan_migration(&raw)?;
    if !patch.is_empty() {
        debug!(keys = ?patch.keys().collect::<Vec<_>>(), "persisting migrated config");
        store.write_patch(patch)?;
    }
    Ok(migrated.with_defaults(defaults))
}
