use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use log::debug;
use rusqlite::{params, params_from_iter, Connection};

use super::{RoleDocument, RoleQuery, RoleStore};

const CREATE_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS role (
    id TEXT PRIMARY KEY NOT NULL,
    authority TEXT NOT NULL UNIQUE
);
"#;

/// SQLite-backed role store. Supports both file-based and in-memory
/// databases. Queries run on the blocking thread pool so they never stall
/// the request executor.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Opens a SQLite database file. Creates one if it doesn't exist.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("open sqlite database {}", path.display()))?;
        Self::init(conn)
    }

    /// Creates a new in-memory database. Content is lost when the store is
    /// dropped.
    pub fn memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory sqlite database")?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(CREATE_TABLE_SQL)
            .context("create role table")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn create_role(&self, role: &RoleDocument) -> Result<()> {
        let sql = "INSERT INTO role (id, authority) VALUES (?, ?)";
        debug!("Database create_role: {sql}, {role:?}");
        self.with_conn(|conn| {
            conn.execute(sql, params![role.id, role.authority])?;
            Ok(())
        })
    }

    pub fn delete_role(&self, id: &str) -> Result<bool> {
        let sql = "DELETE FROM role WHERE id = ?";
        debug!("Database delete_role: {sql}, {id}");
        self.with_conn(|conn| {
            let count = conn.execute(sql, params![id])?;
            Ok(count > 0)
        })
    }

    pub fn list_roles(&self) -> Result<Vec<RoleDocument>> {
        let sql = "SELECT id, authority FROM role ORDER BY rowid";
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(sql)?;
            let rows = stmt.query_map([], |row| {
                Ok(RoleDocument {
                    id: row.get(0)?,
                    authority: row.get(1)?,
                })
            })?;
            let mut roles = Vec::new();
            for row in rows {
                roles.push(row?);
            }
            Ok(roles)
        })
    }

    fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = match self.conn.lock() {
            Ok(conn) => conn,
            Err(e) => bail!("failed to lock connection: {:#}", e),
        };
        f(&conn)
    }

    fn build_find_sql(query: &RoleQuery) -> (String, Vec<String>) {
        let mut conds = Vec::new();
        let mut values = Vec::new();
        if !query.authorities.is_empty() {
            conds.push(format!("authority IN ({})", placeholders(query.authorities.len())));
            values.extend(query.authorities.iter().cloned());
        }
        if !query.ids.is_empty() {
            conds.push(format!("id IN ({})", placeholders(query.ids.len())));
            values.extend(query.ids.iter().cloned());
        }

        let sql = format!(
            "SELECT id, authority FROM role WHERE {} ORDER BY rowid",
            conds.join(" OR ")
        );
        (sql, values)
    }
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

#[async_trait]
impl RoleStore for SqliteStore {
    async fn find(&self, query: &RoleQuery) -> Result<Vec<RoleDocument>> {
        if query.is_empty() {
            return Ok(vec![]);
        }

        let (sql, values) = Self::build_find_sql(query);
        debug!("Database find_roles: {sql}, {values:?}");

        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || -> Result<Vec<RoleDocument>> {
            let conn = match conn.lock() {
                Ok(conn) => conn,
                Err(e) => bail!("failed to lock connection: {:#}", e),
            };
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(values.iter()), |row| {
                Ok(RoleDocument {
                    id: row.get(0)?,
                    authority: row.get(1)?,
                })
            })?;

            let mut roles = Vec::new();
            for row in rows {
                roles.push(row?);
            }
            Ok(roles)
        })
        .await
        .context("join sqlite query task")?
    }
}
