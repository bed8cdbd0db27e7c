mod memory;
mod sqlite;

pub mod config;
pub mod factory;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::principal::Authority;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Backing store for role documents.
///
/// Implementations must be safe to query from many requests at once and
/// must return documents in a stable order for a fixed content.
#[async_trait]
pub trait RoleStore: Send + Sync {
    /// Returns every role document whose authority is one of
    /// `query.authorities` or whose id is one of `query.ids`.
    async fn find(&self, query: &RoleQuery) -> Result<Vec<RoleDocument>>;
}

/// A role as kept by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDocument {
    pub id: String,
    pub authority: String,
}

/// Lookup keys collected from the authorities a principal holds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleQuery {
    /// Plain role names.
    pub authorities: Vec<String>,
    /// Ids of referenced role documents.
    pub ids: Vec<String>,
}

impl RoleDocument {
    pub fn new(id: impl Into<String>, authority: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            authority: authority.into(),
        }
    }
}

impl RoleQuery {
    /// Splits authorities into name and id keys, dropping duplicates while
    /// keeping first-seen order.
    pub fn from_authorities(authorities: &[Authority]) -> Self {
        let mut query = Self::default();
        for authority in authorities {
            let (keys, key) = match authority {
                Authority::Name(name) => (&mut query.authorities, name),
                Authority::Reference { id } => (&mut query.ids, id),
            };
            if !keys.contains(key) {
                keys.push(key.clone());
            }
        }
        query
    }

    pub fn is_empty(&self) -> bool {
        self.authorities.is_empty() && self.ids.is_empty()
    }

    pub fn matches(&self, doc: &RoleDocument) -> bool {
        self.authorities.contains(&doc.authority) || self.ids.contains(&doc.id)
    }
}
