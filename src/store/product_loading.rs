use log::debug;
use rusqlite::{params, Row};

use super::error::{Result, WriteContext};
use super::Store;
use crate::model::ProductRequirement;

const TABLE: &str = "productloading";

fn requirement_from_row(row: &Row) -> rusqlite::Result<ProductRequirement> {
    Ok(ProductRequirement {
        id: row.get("id")?,
        product_id: row.get("fkproduct")?,
        item_type_id: row.get("fkitemtype")?,
        type_name: row.get("typename")?,
        month_year: row.get("monthyear")?,
        quantity: row.get("quantity")?,
        notes: row.get("notes")?,
    })
}

impl Store {
    /// Set how many resources of `item_type_id` the product needs in
    /// `month_year`, replacing any earlier figure for that month and type
    pub fn set_product_requirement(
        &self,
        product_id: i64,
        item_type_id: i64,
        month_year: &str,
        quantity: f64,
        notes: Option<&str>,
    ) -> Result<i64> {
        let id = self
            .conn
            .query_row(
                "INSERT INTO productloading (fkproduct, fkitemtype, monthyear, quantity, notes)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT (fkproduct, fkitemtype, monthyear) DO UPDATE
                 SET quantity = excluded.quantity, notes = excluded.notes
                 RETURNING id",
                params![product_id, item_type_id, month_year, quantity, notes],
                |row| row.get(0),
            )
            .on_table(TABLE)?;
        debug!(
            "Product {} needs {} of type {} in {}",
            product_id, quantity, item_type_id, month_year
        );
        Ok(id)
    }

    pub fn product_requirements(&self, product_id: i64) -> Result<Vec<ProductRequirement>> {
        let mut stmt = self.conn.prepare(
            "SELECT p.id, p.fkproduct, p.fkitemtype, t.typename, p.monthyear, p.quantity, p.notes
             FROM productloading p
             JOIN itemtypes t ON p.fkitemtype = t.id
             WHERE p.fkproduct = ?1
             ORDER BY p.monthyear, t.typename",
        )?;
        let rows = stmt
            .query_map([product_id], requirement_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn delete_product_requirement(&self, id: i64) -> Result<()> {
        self.delete_row(TABLE, id)
    }
}
