pub mod migrate;
pub mod schema_gen;
pub mod seed;
pub mod sqlite;

pub use migrate::{migrate_database, upgrade};
pub use schema_gen::{create_tables, generate_create_table, generate_indexes};
pub use seed::SeedCounts;
pub use sqlite::{initialize_database, InitSummary, SqliteWriter, CONNECTION_PRAGMAS};
