use anyhow::{bail, Context, Result};
use log::info;
use rusqlite::Connection;
use std::path::Path;

use super::schema_gen::create_tables;
use super::seed::{insert_seed, SeedCounts};
use crate::schema::TableSchema;

/// Connection pragmas applied to every database this crate opens
pub const CONNECTION_PRAGMAS: &str = "PRAGMA foreign_keys = ON;";

pub struct SqliteWriter {
    conn: Connection,
}

impl SqliteWriter {
    /// Create a fresh database at `db_path`. An existing file is replaced only
    /// when `overwrite` is set.
    pub fn new(db_path: &Path, overwrite: bool) -> Result<Self> {
        if db_path.exists() {
            if !overwrite {
                bail!(
                    "Database {:?} already exists (use --force to replace it)",
                    db_path
                );
            }
            std::fs::remove_file(db_path).context("Failed to remove existing database")?;
        }

        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }

        let conn = Connection::open(db_path).context("Failed to create database")?;

        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;

        Ok(Self { conn })
    }

    /// Writer over an in-memory database
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        conn.execute_batch(CONNECTION_PRAGMAS)?;
        Ok(Self { conn })
    }

    /// Create all tables for the given schemas
    pub fn create_tables(&self, schemas: &[&TableSchema]) -> Result<()> {
        info!("Creating {} tables", schemas.len());

        for schema in schemas {
            create_tables(&self.conn, &[*schema])
                .with_context(|| format!("Failed to create table: {}", schema.name))?;
        }

        Ok(())
    }

    /// Write the seed rows in one transaction
    pub fn seed(&mut self) -> Result<SeedCounts> {
        let tx = self.conn.transaction()?;
        let counts = insert_seed(&tx).context("Failed to insert seed data")?;
        tx.commit()?;

        info!(
            "Seeded {} item types, {} items, {} characteristics, {} loading rows",
            counts.item_types, counts.items, counts.characteristics, counts.loadings
        );
        Ok(counts)
    }

    /// Finalize the database and hand back the connection
    pub fn finalize(self) -> Result<Connection> {
        self.conn.execute_batch("PRAGMA optimize;")?;
        Ok(self.conn)
    }
}

/// Summary of an `initialize_database` run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitSummary {
    pub tables: Vec<&'static str>,
    pub seeded: SeedCounts,
}

/// Create a database with the given tables and, optionally, the seed rows.
///
/// Seeding needs every table; it is refused when `tables` is a subset.
pub fn initialize_database(
    output_db: &Path,
    tables: Vec<&TableSchema>,
    seed: bool,
    overwrite: bool,
) -> Result<InitSummary> {
    if seed && tables.len() != crate::schema::ALL_TABLES.len() {
        bail!("Seed data needs every table; pass --no-seed when filtering tables");
    }

    let mut writer = SqliteWriter::new(output_db, overwrite)?;
    writer.create_tables(&tables)?;

    let seeded = if seed { writer.seed()? } else { SeedCounts::default() };
    writer.finalize()?;

    info!("Initialized {:?}", output_db);

    Ok(InitSummary {
        tables: tables.iter().map(|t| t.name).collect(),
        seeded,
    })
}
