use log::debug;
use rusqlite::params;

use super::error::{Result, StoreError, WriteContext};
use super::Store;
use crate::model::{Item, ItemProductMapping};

const TABLE: &str = "item_product_map";

impl Store {
    /// Record that `item_id` can work on `product_id`. Both must be existing
    /// items; a pair can be mapped once.
    pub fn map_item_to_product(&self, item_id: i64, product_id: i64) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO item_product_map (fkitem, fkproduct) VALUES (?1, ?2)",
                params![item_id, product_id],
            )
            .on_table(TABLE)?;
        debug!("Mapped item {} to product {}", item_id, product_id);
        Ok(())
    }

    pub fn unmap_item_from_product(&self, item_id: i64, product_id: i64) -> Result<()> {
        let changed = self
            .conn
            .execute(
                "DELETE FROM item_product_map WHERE fkitem = ?1 AND fkproduct = ?2",
                params![item_id, product_id],
            )
            .on_table(TABLE)?;
        if changed == 0 {
            return Err(StoreError::MappingNotFound {
                item_id,
                product_id,
            });
        }
        Ok(())
    }

    pub fn products_for_item(&self, item_id: i64) -> Result<Vec<Item>> {
        self.mapped_items(
            "SELECT i.id, i.itemname, i.fkitemtype
             FROM item_product_map m JOIN items i ON m.fkproduct = i.id
             WHERE m.fkitem = ?1 ORDER BY i.id",
            item_id,
        )
    }

    pub fn items_for_product(&self, product_id: i64) -> Result<Vec<Item>> {
        self.mapped_items(
            "SELECT i.id, i.itemname, i.fkitemtype
             FROM item_product_map m JOIN items i ON m.fkitem = i.id
             WHERE m.fkproduct = ?1 ORDER BY i.id",
            product_id,
        )
    }

    pub fn list_product_mappings(&self) -> Result<Vec<ItemProductMapping>> {
        let mut stmt = self
            .conn
            .prepare("SELECT fkitem, fkproduct FROM item_product_map ORDER BY fkitem, fkproduct")?;
        let rows = stmt
            .query_map([], |row| {
                Ok(ItemProductMapping {
                    item_id: row.get(0)?,
                    product_id: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn mapped_items(&self, sql: &str, id: i64) -> Result<Vec<Item>> {
        let mut stmt = self.conn.prepare(sql)?;
        let items = stmt
            .query_map([id], |row| {
                Ok(Item {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    item_type_id: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(items)
    }
}
