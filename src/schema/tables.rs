//! Table schema definitions for the item / loading store

use super::types::*;

/// Strict `YYYY-MM` with year 2000..=2100 and month 1..=12
pub const MONTH_YEAR_CHECK: &str = "monthyear GLOB '[0-9][0-9][0-9][0-9]-[0-9][0-9]' \
     AND CAST(substr(monthyear, 1, 4) AS INTEGER) BETWEEN 2000 AND 2100 \
     AND CAST(substr(monthyear, 6, 2) AS INTEGER) BETWEEN 1 AND 12";

// =============================================================================
// Independent Tables (no FK dependencies)
// =============================================================================

pub static ITEM_TYPES: TableSchema = TableSchema {
    name: "itemtypes",
    primary_key: PrimaryKey::AutoIncrement("id"),
    columns: &[
        Column::required("id", ColumnType::Integer),
        Column::required("typename", ColumnType::Text).unique(),
    ],
    foreign_keys: &[],
    unique: &[],
    indexes: &[],
};

// =============================================================================
// Level 1 Dependencies
// =============================================================================

pub static ITEMS: TableSchema = TableSchema {
    name: "items",
    primary_key: PrimaryKey::AutoIncrement("id"),
    columns: &[
        Column::required("id", ColumnType::Integer),
        Column::required("itemname", ColumnType::Text),
        Column::required("fkitemtype", ColumnType::Integer),
    ],
    foreign_keys: &[ForeignKey::new("fkitemtype", "itemtypes")],
    unique: &[],
    indexes: &[Index::on("idx_items_itemname", &["itemname"])],
};

// =============================================================================
// Level 2 Dependencies
// =============================================================================

pub static ITEM_CHARACTERISTICS: TableSchema = TableSchema {
    name: "itemcharacteristics",
    primary_key: PrimaryKey::AutoIncrement("id"),
    columns: &[
        Column::required("id", ColumnType::Integer),
        Column::required("fkitem", ColumnType::Integer),
        Column::required("itemkey", ColumnType::Text),
        Column::required("itemvalue", ColumnType::Text),
        Column::new("itemkeyvaluetype", ColumnType::Text),
    ],
    foreign_keys: &[ForeignKey::new("fkitem", "items")],
    unique: &[&["fkitem", "itemkey"]],
    indexes: &[],
};

pub static ITEM_LOADING: TableSchema = TableSchema {
    name: "itemloading",
    primary_key: PrimaryKey::AutoIncrement("id"),
    columns: &[
        Column::required("id", ColumnType::Integer),
        Column::required("fkitem", ColumnType::Integer),
        Column::required("dailyrollupexists", ColumnType::Boolean)
            .check("dailyrollupexists IN (0, 1)"),
        Column::required("monthyear", ColumnType::Text).check(MONTH_YEAR_CHECK),
        Column::required("percent", ColumnType::Real).check("percent BETWEEN 0 AND 100"),
        // NULL means unallocated capacity
        Column::new("fkproduct", ColumnType::Integer),
    ],
    foreign_keys: &[
        ForeignKey::new("fkitem", "items"),
        ForeignKey::new("fkproduct", "items"),
    ],
    unique: &[],
    indexes: &[
        // One row per item, month and product scope; the unallocated scope counts once.
        Index::unique(
            "uq_itemloading_item_month_product",
            &["fkitem", "monthyear", "IFNULL(fkproduct, 0)"],
        ),
        Index::on("idx_itemloading_monthyear", &["monthyear"]),
    ],
};

pub static ITEM_PRODUCT_MAP: TableSchema = TableSchema {
    name: "item_product_map",
    primary_key: PrimaryKey::Composite(&["fkitem", "fkproduct"]),
    columns: &[
        Column::required("fkitem", ColumnType::Integer),
        Column::required("fkproduct", ColumnType::Integer),
    ],
    foreign_keys: &[
        ForeignKey::new("fkitem", "items"),
        ForeignKey::new("fkproduct", "items"),
    ],
    unique: &[],
    indexes: &[],
};

pub static PRODUCT_LOADING: TableSchema = TableSchema {
    name: "productloading",
    primary_key: PrimaryKey::AutoIncrement("id"),
    columns: &[
        Column::required("id", ColumnType::Integer),
        Column::required("fkproduct", ColumnType::Integer),
        Column::required("fkitemtype", ColumnType::Integer),
        Column::required("monthyear", ColumnType::Text).check(MONTH_YEAR_CHECK),
        Column::required("quantity", ColumnType::Real).check("quantity >= 0"),
        Column::new("notes", ColumnType::Text),
    ],
    foreign_keys: &[
        ForeignKey::new("fkproduct", "items"),
        ForeignKey::new("fkitemtype", "itemtypes"),
    ],
    unique: &[&["fkproduct", "fkitemtype", "monthyear"]],
    indexes: &[
        Index::on("idx_productloading_product_month", &["fkproduct", "monthyear"]),
        Index::on("idx_productloading_type_month", &["fkitemtype", "monthyear"]),
    ],
};

// =============================================================================
// Schema Registry
// =============================================================================

/// All table schemas in dependency order
pub static ALL_TABLES: &[&TableSchema] = &[
    // Wave 1: No dependencies
    &ITEM_TYPES,
    // Wave 2: Level 1 deps
    &ITEMS,
    // Wave 3: Level 2 deps
    &ITEM_CHARACTERISTICS,
    &ITEM_LOADING,
    &ITEM_PRODUCT_MAP,
    &PRODUCT_LOADING,
];

/// Get table schema by name
pub fn get_table(name: &str) -> Option<&'static TableSchema> {
    ALL_TABLES.iter().find(|t| t.name == name).copied()
}

/// Get all table names
pub fn table_names() -> Vec<&'static str> {
    ALL_TABLES.iter().map(|t| t.name).collect()
}
