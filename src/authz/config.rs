use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::CommonConfig;

use super::hierarchy::StaticHierarchy;
use super::store::config::StoreConfig;

/// Authorization related configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AuthzConfig {
    /// Upper bound for one role store lookup. A store that does not answer
    /// in time fails the request like any other store error.
    /// Default: 10
    #[serde(default = "AuthzConfig::default_store_timeout_secs")]
    pub store_timeout_secs: u64,

    /// Role hierarchy rules, e.g. `"ADMIN > EDITOR"`. A role satisfies every
    /// role below it, transitively.
    /// Defaults to empty.
    #[serde(default)]
    pub hierarchy: Vec<String>,

    #[serde(default = "StoreConfig::default")]
    pub store: StoreConfig,
}

impl CommonConfig for AuthzConfig {
    fn default() -> Self {
        Self {
            store_timeout_secs: Self::default_store_timeout_secs(),
            hierarchy: vec![],
            store: StoreConfig::default(),
        }
    }

    fn complete(&mut self) -> Result<()> {
        if self.store_timeout_secs == 0 {
            bail!("store_timeout_secs must be greater than 0");
        }

        StaticHierarchy::parse(&self.hierarchy).context("hierarchy")?;
        self.store.complete().context("store")?;

        Ok(())
    }
}

impl AuthzConfig {
    fn default_store_timeout_secs() -> u64 {
        10
    }
}
