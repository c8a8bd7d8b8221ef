//! SQLite-backed store for players, tournaments and scores.
//!
//! `Database` owns a single connection. Operations that span several
//! statements run inside one transaction, so a failed write leaves no
//! partial effect behind.

mod entries;
mod groups;
mod holes;
mod players;
pub mod schema_gen;
mod scores;
mod settings;
mod tournaments;

pub use settings::{APP_LOGO_URL, DEFAULT_SETTINGS};

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, Row, Transaction, TransactionBehavior};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::schema::{DependencyResolver, TableSchema};
use schema_gen::{generate_create_table, generate_indexes};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) a database file and bring its schema up to date
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(db_path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;

        debug!(path = %db_path.display(), "opened database");
        let mut db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Open a private in-memory database with the schema applied
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        let mut db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Create any missing tables and indexes, then seed default settings.
    /// Safe to run against an already initialised database.
    pub fn initialize(&mut self) -> Result<()> {
        let tables = DependencyResolver::new()
            .creation_order()
            .map_err(StoreError::Validation)?;

        let tx = self.conn.transaction()?;
        create_tables(&tx, &tables)?;
        let seeded = settings::seed_defaults(&tx)?;
        tx.commit()?;

        info!(tables = tables.len(), seeded, "schema ready");
        Ok(())
    }

    /// Raw connection, for callers that need queries the store does not offer
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Start a transaction that takes the write lock up front
    fn write_transaction(&mut self) -> Result<Transaction<'_>> {
        Ok(self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?)
    }

    /// Delete one row by id. Child rows go with it through ON DELETE CASCADE.
    fn delete_by_id(&self, table: &TableSchema, entity: &'static str, id: Uuid) -> Result<()> {
        let sql = format!("DELETE FROM {} WHERE id = ?1", table.name);
        let deleted = self.conn.execute(&sql, [id.to_string()])?;
        if deleted == 0 {
            return Err(StoreError::not_found(entity, id));
        }

        let cascades = DependencyResolver::new()
            .cascade_targets(table.name)
            .unwrap_or_default();
        debug!(table = table.name, %id, ?cascades, "deleted row");
        Ok(())
    }
}

fn create_tables(conn: &Connection, schemas: &[&TableSchema]) -> Result<()> {
    for schema in schemas {
        conn.execute(&generate_create_table(schema), [])?;

        for index_sql in generate_indexes(schema) {
            conn.execute(&index_sql, [])?;
        }
        debug!(table = schema.name, "table ensured");
    }
    Ok(())
}

fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Read a UUID stored as text
fn uuid_column(row: &Row, column: &str) -> rusqlite::Result<Uuid> {
    let text: String = row.get(column)?;
    Uuid::parse_str(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))
}
