use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use log::{info, warn};

use super::config::{StoreConfig, StoreType};
use super::{MemoryStore, RoleStore, SqliteStore};

pub struct StoreFactory;

impl StoreFactory {
    pub fn new() -> Self {
        Self
    }

    pub fn build_store(&self, cfg: &StoreConfig) -> Result<Arc<dyn RoleStore>> {
        match cfg.name {
            StoreType::Memory => {
                info!("Using memory role store with {} seeded roles", cfg.roles.len());
                Ok(Arc::new(MemoryStore::with_roles(cfg.roles.clone())))
            }
            StoreType::Sqlite => {
                let store = self.build_sqlite(cfg)?;
                Ok(Arc::new(store))
            }
        }
    }

    fn build_sqlite(&self, cfg: &StoreConfig) -> Result<SqliteStore> {
        let store = if cfg.sqlite.memory {
            warn!("Using in-memory sqlite role store, the roles will be lost when the process stops");
            SqliteStore::memory()?
        } else {
            info!("Using sqlite role store: {}", cfg.sqlite.path);
            SqliteStore::open(Path::new(&cfg.sqlite.path))?
        };

        let existing = store.list_roles().context("list existing roles")?;
        for role in cfg.roles.iter() {
            if existing.iter().any(|r| r.id == role.id) {
                continue;
            }
            store
                .create_role(role)
                .with_context(|| format!("seed role '{}'", role.authority))?;
        }

        Ok(store)
    }
}
