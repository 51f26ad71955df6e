use rusqlite::{ffi, ErrorCode};
use thiserror::Error;

/// Store error types
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("foreign key violation on {table}: referenced row does not exist")]
    ForeignKey { table: &'static str },

    #[error("uniqueness violation on {table}: {detail}")]
    Unique { table: &'static str, detail: String },

    #[error("check violation on {table}: {detail}")]
    Check { table: &'static str, detail: String },

    #[error("missing required value on {table}: {detail}")]
    NotNull { table: &'static str, detail: String },

    #[error("{table} row {id} not found")]
    NotFound { table: &'static str, id: i64 },

    #[error("item {item_id} is not mapped to product {product_id}")]
    MappingNotFound { item_id: i64, product_id: i64 },

    #[error("item name '{0}' already exists")]
    DuplicateName(String),

    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("no fields to update")]
    NoFieldsToUpdate,

    #[error("at least one filter must be provided")]
    NoFilters,

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

impl StoreError {
    /// Classify a failed write against `table`. Constraint violations become
    /// typed variants; anything else is passed through.
    pub fn from_sqlite(table: &'static str, err: rusqlite::Error) -> Self {
        let constraint = match &err {
            rusqlite::Error::SqliteFailure(e, msg) if e.code == ErrorCode::ConstraintViolation => {
                Some((e.extended_code, msg.clone().unwrap_or_default()))
            }
            _ => None,
        };

        match constraint {
            Some((ffi::SQLITE_CONSTRAINT_FOREIGNKEY, _)) => StoreError::ForeignKey { table },
            Some((ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY, detail)) => {
                StoreError::Unique { table, detail }
            }
            Some((ffi::SQLITE_CONSTRAINT_CHECK, detail)) => StoreError::Check { table, detail },
            Some((ffi::SQLITE_CONSTRAINT_NOTNULL, detail)) => StoreError::NotNull { table, detail },
            _ => StoreError::Sqlite(err),
        }
    }

    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            StoreError::ForeignKey { .. }
                | StoreError::Unique { .. }
                | StoreError::Check { .. }
                | StoreError::NotNull { .. }
        )
    }
}

/// Attach the table name to rusqlite results from writes
pub(crate) trait WriteContext<T> {
    fn on_table(self, table: &'static str) -> Result<T>;
}

impl<T> WriteContext<T> for rusqlite::Result<T> {
    fn on_table(self, table: &'static str) -> Result<T> {
        self.map_err(|e| StoreError::from_sqlite(table, e))
    }
}
