//! Declarative table registry. Every constraint the database enforces is
//! written down here once and rendered to DDL by `writer::schema_gen`.

pub mod dependencies;
pub mod tables;
pub mod types;

pub use dependencies::DependencyResolver;
pub use tables::{get_table, table_names, ALL_TABLES, MONTH_YEAR_CHECK};
pub use types::{Column, ColumnType, ForeignKey, Index, PrimaryKey, TableSchema};
