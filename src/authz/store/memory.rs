use std::sync::RwLock;

use anyhow::{bail, Result};
use async_trait::async_trait;

use super::{RoleDocument, RoleQuery, RoleStore};

/// A memory-based role store. Documents are kept in insertion order and are
/// lost when the process exits.
pub struct MemoryStore {
    roles: RwLock<Vec<RoleDocument>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_roles(vec![])
    }

    pub fn with_roles(roles: Vec<RoleDocument>) -> Self {
        Self {
            roles: RwLock::new(roles),
        }
    }

    /// Adds a role, replacing any document with the same id.
    pub fn insert(&self, role: RoleDocument) -> Result<()> {
        let mut roles = match self.roles.write() {
            Ok(roles) => roles,
            Err(e) => bail!("failed to lock roles: {:#}", e),
        };
        match roles.iter_mut().find(|r| r.id == role.id) {
            Some(existing) => *existing = role,
            None => roles.push(role),
        }
        Ok(())
    }

    pub fn remove(&self, id: &str) -> Result<bool> {
        let mut roles = match self.roles.write() {
            Ok(roles) => roles,
            Err(e) => bail!("failed to lock roles: {:#}", e),
        };
        let len = roles.len();
        roles.retain(|r| r.id != id);
        Ok(roles.len() != len)
    }

    pub fn list(&self) -> Result<Vec<RoleDocument>> {
        match self.roles.read() {
            Ok(roles) => Ok(roles.clone()),
            Err(e) => bail!("failed to lock roles: {:#}", e),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RoleStore for MemoryStore {
    async fn find(&self, query: &RoleQuery) -> Result<Vec<RoleDocument>> {
        let roles = match self.roles.read() {
            Ok(roles) => roles,
            Err(e) => bail!("failed to lock roles: {:#}", e),
        };
        Ok(roles.iter().filter(|r| query.matches(r)).cloned().collect())
    }
}
