//! Output formatting for command results.
//!
//! Every command produces a serializable value that renders either as plain
//! text lines or as pretty-printed JSON.

use serde::Serialize;

use crate::model::{
    Item, ItemCharacteristic, ItemLoading, ItemType, ItemWithType, Overallocation,
    ProductRequirement, ProductUsage,
};

/// Output format for command results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Types that can be formatted for output
pub trait Outputable: Serialize {
    /// Format as human-readable text
    fn to_table(&self) -> String;

    fn format(&self, format: OutputFormat) -> String {
        match format {
            OutputFormat::Table => self.to_table(),
            OutputFormat::Json => serde_json::to_string_pretty(self).unwrap_or_default(),
        }
    }
}

/// One line of a listing
pub trait TableRow {
    const HEADER: &'static str;

    fn to_row(&self) -> String;
}

impl<T: TableRow + Serialize> Outputable for Vec<T> {
    fn to_table(&self) -> String {
        if self.is_empty() {
            return "(none)".to_string();
        }
        std::iter::once(T::HEADER.to_string())
            .chain(self.iter().map(TableRow::to_row))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl TableRow for ItemType {
    const HEADER: &'static str = "ID     TYPE";

    fn to_row(&self) -> String {
        format!("{:<6} {}", self.id, self.type_name)
    }
}

impl TableRow for Item {
    const HEADER: &'static str = "ID     NAME                       TYPE ID";

    fn to_row(&self) -> String {
        format!("{:<6} {:<26} {}", self.id, self.name, self.item_type_id)
    }
}

impl TableRow for ItemWithType {
    const HEADER: &'static str = "ID     NAME                       TYPE";

    fn to_row(&self) -> String {
        format!("{:<6} {:<26} {}", self.id, self.name, self.type_name)
    }
}

impl TableRow for ItemCharacteristic {
    const HEADER: &'static str = "ID     KEY                  VALUE";

    fn to_row(&self) -> String {
        let value_type = self
            .value_type
            .as_deref()
            .map(|t| format!(" ({})", t))
            .unwrap_or_default();
        format!("{:<6} {:<20} {}{}", self.id, self.key, self.value, value_type)
    }
}

impl TableRow for ItemLoading {
    const HEADER: &'static str = "ID     MONTH    PERCENT  PRODUCT     ROLLUP";

    fn to_row(&self) -> String {
        let product = self
            .product_id
            .map(|p| p.to_string())
            .unwrap_or_else(|| "unallocated".to_string());
        format!(
            "{:<6} {:<8} {:>7.1}  {:<11} {}",
            self.id,
            self.month_year,
            self.percent,
            product,
            if self.daily_rollup_exists { "yes" } else { "no" }
        )
    }
}

impl TableRow for ProductRequirement {
    const HEADER: &'static str = "ID     MONTH    TYPE         QUANTITY  NOTES";

    fn to_row(&self) -> String {
        format!(
            "{:<6} {:<8} {:<12} {:>8.1}  {}",
            self.id,
            self.month_year,
            self.type_name,
            self.quantity,
            self.notes.as_deref().unwrap_or("")
        )
    }
}

impl TableRow for ProductUsage {
    const HEADER: &'static str = "ID     PRODUCT                    ITEMS  LOADING ROWS";

    fn to_row(&self) -> String {
        format!(
            "{:<6} {:<26} {:>5}  {:>12}",
            self.id, self.name, self.mapped_items, self.loading_count
        )
    }
}

impl TableRow for Overallocation {
    const HEADER: &'static str = "MONTH    ITEM                           TOTAL";

    fn to_row(&self) -> String {
        format!(
            "{:<8} {:<6} {:<24} {:>6.1}",
            self.month_year, self.item_id, self.item_name, self.total_percent
        )
    }
}

impl TableRow for String {
    const HEADER: &'static str = "MONTH";

    fn to_row(&self) -> String {
        self.clone()
    }
}

/// Summed loading of one item in one month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthTotal {
    pub item_id: i64,
    pub month_year: String,
    pub total_percent: f64,
}

impl TableRow for MonthTotal {
    const HEADER: &'static str = "ITEM   MONTH    TOTAL";

    fn to_row(&self) -> String {
        format!("{:<6} {:<8} {:>6.1}", self.item_id, self.month_year, self.total_percent)
    }
}

/// DDL for one table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableDdl {
    pub table: &'static str,
    pub statements: Vec<String>,
}

/// DDL for a set of tables, in creation order
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SchemaDdl(pub Vec<TableDdl>);

impl Outputable for SchemaDdl {
    fn to_table(&self) -> String {
        self.0
            .iter()
            .flat_map(|t| t.statements.iter().map(|s| format!("{};", s)))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Table names in creation order
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TableList(pub Vec<&'static str>);

impl Outputable for TableList {
    fn to_table(&self) -> String {
        self.0.join("\n")
    }
}

/// Result of a single write
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Changed {
    pub action: &'static str,
    pub table: &'static str,
    pub id: i64,
}

impl Changed {
    pub fn new(action: &'static str, table: &'static str, id: i64) -> Self {
        Self { action, table, id }
    }
}

impl Outputable for Changed {
    fn to_table(&self) -> String {
        format!("{} {} {}", self.action, self.table, self.id)
    }
}

/// An item with everything attached to it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemDetail {
    pub item: ItemWithType,
    pub characteristics: Vec<ItemCharacteristic>,
    pub loading: Vec<ItemLoading>,
    pub products: Vec<Item>,
}

impl Outputable for ItemDetail {
    fn to_table(&self) -> String {
        let mut lines = vec![
            format!("{} {} ({})", self.item.id, self.item.name, self.item.type_name),
            String::new(),
            "Characteristics:".to_string(),
        ];
        lines.extend(self.characteristics.iter().map(|c| format!("  {}", c.to_row())));

        lines.push(String::new());
        lines.push("Loading:".to_string());
        lines.extend(self.loading.iter().map(|l| format!("  {}", l.to_row())));

        lines.push(String::new());
        lines.push("Products:".to_string());
        lines.extend(self.products.iter().map(|p| format!("  {} {}", p.id, p.name)));

        lines.join("\n")
    }
}

/// Result of `init`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InitReport {
    pub path: String,
    pub tables: Vec<&'static str>,
    pub seeded_rows: usize,
}

impl Outputable for InitReport {
    fn to_table(&self) -> String {
        format!(
            "Created {} ({} tables, {} seed rows)",
            self.path,
            self.tables.len(),
            self.seeded_rows
        )
    }
}

/// Result of `migrate`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MigrateReport {
    pub path: String,
    pub applied: Vec<String>,
}

impl Outputable for MigrateReport {
    fn to_table(&self) -> String {
        if self.applied.is_empty() {
            return format!("{} is up to date", self.path);
        }
        let mut lines = vec![format!("Upgraded {}:", self.path)];
        lines.extend(self.applied.iter().map(|s| format!("  {}", s)));
        lines.join("\n")
    }
}
