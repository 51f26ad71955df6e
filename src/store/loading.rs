use log::debug;
use rusqlite::types::Value;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::error::{Result, WriteContext};
use super::{integer, nullable_integer, present, text, Store};
use crate::model::{ItemLoading, LoadingFilter, LoadingUpdate, NewLoading};

const TABLE: &str = "itemloading";

fn loading_from_row(row: &Row) -> rusqlite::Result<ItemLoading> {
    Ok(ItemLoading {
        id: row.get("id")?,
        item_id: row.get("fkitem")?,
        month_year: row.get("monthyear")?,
        percent: row.get("percent")?,
        daily_rollup_exists: row.get("dailyrollupexists")?,
        product_id: row.get("fkproduct")?,
    })
}

fn insert_loading(conn: &Connection, new: &NewLoading) -> Result<i64> {
    conn.execute(
        "INSERT INTO itemloading (fkitem, dailyrollupexists, monthyear, percent, fkproduct)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            new.item_id,
            new.daily_rollup_exists,
            new.month_year,
            new.percent,
            new.product_id
        ],
    )
    .on_table(TABLE)?;
    Ok(conn.last_insert_rowid())
}

/// Insert, or overwrite the percent of the row for the same item, month and product scope
fn upsert_loading(conn: &Connection, new: &NewLoading) -> Result<i64> {
    let existing: Option<i64> = conn
        .query_row(
            "SELECT id FROM itemloading
             WHERE fkitem = ?1 AND monthyear = ?2 AND fkproduct IS ?3",
            params![new.item_id, new.month_year, new.product_id],
            |row| row.get(0),
        )
        .optional()?;

    match existing {
        Some(id) => {
            conn.execute(
                "UPDATE itemloading SET percent = ?1 WHERE id = ?2",
                params![new.percent, id],
            )
            .on_table(TABLE)?;
            Ok(id)
        }
        None => insert_loading(conn, new),
    }
}

impl Store {
    pub fn add_loading(&self, new: &NewLoading) -> Result<i64> {
        let id = insert_loading(&self.conn, new)?;
        debug!(
            "Added loading {}% for item {} in {}",
            new.percent, new.item_id, new.month_year
        );
        Ok(id)
    }

    /// Set the percent for (item, month, product scope). New rows start with
    /// `dailyrollupexists` as given; existing rows keep their flag.
    pub fn upsert_loading(&self, new: &NewLoading) -> Result<i64> {
        let tx = self.conn.unchecked_transaction()?;
        let id = upsert_loading(&tx, new)?;
        tx.commit()?;
        Ok(id)
    }

    /// Upsert every entry, or none of them
    pub fn save_loadings(&self, entries: &[NewLoading]) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        for entry in entries {
            upsert_loading(&tx, entry)?;
        }
        tx.commit()?;
        debug!("Saved {} loading value(s)", entries.len());
        Ok(entries.len())
    }

    pub fn update_loading(&self, id: i64, update: LoadingUpdate) -> Result<()> {
        let fields = present(vec![
            ("fkitem", integer(update.item_id)),
            ("monthyear", text(update.month_year)),
            ("percent", update.percent.map(Value::Real)),
            (
                "dailyrollupexists",
                update.daily_rollup_exists.map(|b| Value::Integer(b as i64)),
            ),
            ("fkproduct", nullable_integer(update.product_id)),
        ]);
        self.update_row(TABLE, id, fields)
    }

    pub fn delete_loading(&self, id: i64) -> Result<()> {
        self.delete_row(TABLE, id)
    }

    pub fn loading(&self, id: i64) -> Result<Option<ItemLoading>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, fkitem, dailyrollupexists, monthyear, percent, fkproduct
                 FROM itemloading WHERE id = ?1",
                [id],
                loading_from_row,
            )
            .optional()?;
        Ok(row)
    }

    /// Loading rows for an item, by month then product scope
    pub fn loadings_for_item(&self, item_id: i64) -> Result<Vec<ItemLoading>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, fkitem, dailyrollupexists, monthyear, percent, fkproduct
             FROM itemloading WHERE fkitem = ?1
             ORDER BY monthyear, fkproduct, id",
        )?;
        let rows = stmt
            .query_map([item_id], loading_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Loading rows attributed to a product, across all items
    pub fn loadings_for_product(&self, product_id: i64) -> Result<Vec<ItemLoading>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, fkitem, dailyrollupexists, monthyear, percent, fkproduct
             FROM itemloading WHERE fkproduct = ?1
             ORDER BY monthyear, fkitem, id",
        )?;
        let rows = stmt
            .query_map([product_id], loading_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn find_loading_ids(&self, filter: LoadingFilter) -> Result<Vec<i64>> {
        let filters = present(vec![
            ("fkitem", integer(filter.item_id)),
            ("monthyear", text(filter.month_year)),
            ("fkproduct", nullable_integer(filter.product_id)),
        ]);
        self.ids_matching(TABLE, filters)
    }
}
