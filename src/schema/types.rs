use std::collections::HashSet;

/// Column data type
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnType {
    Integer,
    Real,
    Text,
    /// Stored as INTEGER, restricted to 0 or 1
    Boolean,
}

impl ColumnType {
    pub const fn sql_type(&self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Real => "REAL",
            ColumnType::Text => "TEXT",
            ColumnType::Boolean => "INTEGER",
        }
    }
}

/// Column definition
#[derive(Debug, Clone)]
pub struct Column {
    pub name: &'static str,
    pub col_type: ColumnType,
    pub nullable: bool,
    pub unique: bool,
    /// SQL expression for a column-level CHECK constraint
    pub check: Option<&'static str>,
}

impl Column {
    /// Create an optional (nullable) column
    pub const fn new(name: &'static str, col_type: ColumnType) -> Self {
        Self {
            name,
            col_type,
            nullable: true,
            unique: false,
            check: None,
        }
    }

    /// Create a required (non-nullable) column
    pub const fn required(name: &'static str, col_type: ColumnType) -> Self {
        Self {
            name,
            col_type,
            nullable: false,
            unique: false,
            check: None,
        }
    }

    /// Add a CHECK constraint to the column
    pub const fn check(self, expr: &'static str) -> Self {
        Self {
            check: Some(expr),
            ..self
        }
    }

    /// Mark the column UNIQUE
    pub const fn unique(self) -> Self {
        Self {
            unique: true,
            ..self
        }
    }
}

/// Primary key layout
#[derive(Debug, Clone)]
pub enum PrimaryKey {
    /// `id INTEGER PRIMARY KEY AUTOINCREMENT`
    AutoIncrement(&'static str),
    /// Composite key over existing columns
    Composite(&'static [&'static str]),
}

/// Foreign key reference. Deletes and updates always cascade.
#[derive(Debug, Clone)]
pub struct ForeignKey {
    pub column: &'static str,
    pub references_table: &'static str,
    pub references_column: &'static str,
}

impl ForeignKey {
    pub const fn new(column: &'static str, references_table: &'static str) -> Self {
        Self {
            column,
            references_table,
            references_column: "id",
        }
    }
}

/// Index definition
#[derive(Debug, Clone)]
pub struct Index {
    pub name: &'static str,
    /// Column names or SQL expressions
    pub columns: &'static [&'static str],
    pub unique: bool,
}

impl Index {
    /// Create a non-unique index
    pub const fn on(name: &'static str, columns: &'static [&'static str]) -> Self {
        Self {
            name,
            columns,
            unique: false,
        }
    }

    /// Create a unique index
    pub const fn unique(name: &'static str, columns: &'static [&'static str]) -> Self {
        Self {
            name,
            columns,
            unique: true,
        }
    }
}

/// Table schema definition
#[derive(Debug, Clone)]
pub struct TableSchema {
    pub name: &'static str,
    pub primary_key: PrimaryKey,
    pub columns: &'static [Column],
    pub foreign_keys: &'static [ForeignKey],
    /// Table-level UNIQUE constraints
    pub unique: &'static [&'static [&'static str]],
    /// Explicit index definitions, created in addition to the per-FK indexes
    pub indexes: &'static [Index],
}

impl TableSchema {
    /// Get all tables this table depends on (FK parents), excluding itself
    pub fn dependencies(&self) -> HashSet<&'static str> {
        self.foreign_keys
            .iter()
            .map(|fk| fk.references_table)
            .filter(|t| *t != self.name)
            .collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.name).collect()
    }
}
