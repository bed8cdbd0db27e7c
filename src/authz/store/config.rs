use std::collections::HashSet;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::{expandenv, CommonConfig};

use super::RoleDocument;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StoreConfig {
    #[serde(default = "StoreConfig::default_name")]
    pub name: StoreType,

    #[serde(default = "SqliteConfig::default")]
    pub sqlite: SqliteConfig,

    /// Roles written to the store at startup. Existing documents with the
    /// same id are left untouched.
    #[serde(default)]
    pub roles: Vec<RoleDocument>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum StoreType {
    #[serde(rename = "memory")]
    Memory,

    #[serde(rename = "sqlite")]
    Sqlite,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SqliteConfig {
    #[serde(default)]
    pub memory: bool,

    /// Database file, environment variables are expanded.
    #[serde(default)]
    pub path: String,
}

impl CommonConfig for StoreConfig {
    fn default() -> Self {
        Self {
            name: Self::default_name(),
            sqlite: SqliteConfig::default(),
            roles: vec![],
        }
    }

    fn complete(&mut self) -> Result<()> {
        let mut ids = HashSet::with_capacity(self.roles.len());
        let mut authorities = HashSet::with_capacity(self.roles.len());
        for role in self.roles.iter() {
            if role.id.is_empty() || role.authority.is_empty() {
                bail!("role id and authority are required");
            }
            if !ids.insert(role.id.as_str()) {
                bail!("duplicate role id '{}'", role.id);
            }
            if !authorities.insert(role.authority.as_str()) {
                bail!("duplicate role authority '{}'", role.authority);
            }
        }

        if matches!(self.name, StoreType::Sqlite) {
            self.sqlite.complete().context("sqlite")?;
        }

        Ok(())
    }
}

impl StoreConfig {
    fn default_name() -> StoreType {
        StoreType::Memory
    }
}

impl CommonConfig for SqliteConfig {
    fn default() -> Self {
        Self {
            memory: false,
            path: String::new(),
        }
    }

    fn complete(&mut self) -> Result<()> {
        if self.memory {
            return Ok(());
        }

        self.path = expandenv("path", &self.path)?;
        if self.path.is_empty() {
            bail!("path is required when memory is disabled");
        }

        Ok(())
    }
}
