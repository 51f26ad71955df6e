use log::debug;
use rusqlite::{params, OptionalExtension, Row};

use super::error::{Result, StoreError, WriteContext};
use super::{integer, present, text, Store};
use crate::model::{type_names, Item, ItemUpdate, ItemWithType};

const TABLE: &str = "items";

fn item_from_row(row: &Row) -> rusqlite::Result<Item> {
    Ok(Item {
        id: row.get("id")?,
        name: row.get("itemname")?,
        item_type_id: row.get("fkitemtype")?,
    })
}

fn item_with_type_from_row(row: &Row) -> rusqlite::Result<ItemWithType> {
    Ok(ItemWithType {
        id: row.get("id")?,
        name: row.get("itemname")?,
        item_type_id: row.get("fkitemtype")?,
        type_name: row.get("typename")?,
    })
}

fn clean_name(name: &str) -> Result<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(StoreError::Invalid {
            field: "itemname",
            reason: "name is required".to_string(),
        });
    }
    Ok(name)
}

impl Store {
    /// Insert an item. Names are trimmed and must not already be in use.
    pub fn add_item(&self, name: &str, item_type_id: i64) -> Result<i64> {
        let name = clean_name(name)?;
        if self.item_by_name(name)?.is_some() {
            return Err(StoreError::DuplicateName(name.to_string()));
        }

        self.conn
            .execute(
                "INSERT INTO items (itemname, fkitemtype) VALUES (?1, ?2)",
                params![name, item_type_id],
            )
            .on_table(TABLE)?;
        let id = self.conn.last_insert_rowid();
        debug!("Added item {} ({})", name, id);
        Ok(id)
    }

    pub fn update_item(&self, id: i64, update: ItemUpdate) -> Result<()> {
        let name = match update.name.as_deref() {
            Some(raw) => {
                let name = clean_name(raw)?;
                if let Some(existing) = self.item_by_name(name)? {
                    if existing.id != id {
                        return Err(StoreError::DuplicateName(name.to_string()));
                    }
                }
                Some(name.to_string())
            }
            None => None,
        };

        let fields = present(vec![
            ("itemname", text(name)),
            ("fkitemtype", integer(update.item_type_id)),
        ]);
        self.update_row(TABLE, id, fields)
    }

    pub fn rename_item(&self, id: i64, name: &str) -> Result<()> {
        self.update_item(
            id,
            ItemUpdate {
                name: Some(name.to_string()),
                ..Default::default()
            },
        )
    }

    /// Delete an item together with its characteristics, loading rows (as
    /// item or as product) and product mappings on either side
    pub fn delete_item(&self, id: i64) -> Result<()> {
        self.delete_row(TABLE, id)
    }

    pub fn item(&self, id: i64) -> Result<Option<Item>> {
        let item = self
            .conn
            .query_row(
                "SELECT id, itemname, fkitemtype FROM items WHERE id = ?1",
                [id],
                item_from_row,
            )
            .optional()?;
        Ok(item)
    }

    pub fn item_by_name(&self, name: &str) -> Result<Option<Item>> {
        let item = self
            .conn
            .query_row(
                "SELECT id, itemname, fkitemtype FROM items WHERE itemname = ?1 ORDER BY id LIMIT 1",
                [name],
                item_from_row,
            )
            .optional()?;
        Ok(item)
    }

    pub fn list_items(&self) -> Result<Vec<Item>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, itemname, fkitemtype FROM items ORDER BY id")?;
        let items = stmt
            .query_map([], item_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(items)
    }

    pub fn list_items_with_type(&self) -> Result<Vec<ItemWithType>> {
        let mut stmt = self.conn.prepare(
            "SELECT i.id, i.itemname, i.fkitemtype, t.typename
             FROM items i
             JOIN itemtypes t ON i.fkitemtype = t.id
             ORDER BY i.id",
        )?;
        let items = stmt
            .query_map([], item_with_type_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(items)
    }

    pub fn items_of_type(&self, type_name: &str) -> Result<Vec<Item>> {
        let mut stmt = self.conn.prepare(
            "SELECT i.id, i.itemname, i.fkitemtype
             FROM items i
             JOIN itemtypes t ON i.fkitemtype = t.id
             WHERE t.typename = ?1
             ORDER BY i.id",
        )?;
        let items = stmt
            .query_map([type_name], item_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(items)
    }

    /// Add a product item. Product names are stored uppercase and the
    /// PRODUCT type is created on first use.
    pub fn add_product(&self, name: &str) -> Result<i64> {
        let name = clean_name(name)?.to_uppercase();
        let tx = self.conn.unchecked_transaction()?;
        let product_type = self.ensure_item_type(type_names::PRODUCT)?;
        let id = self.add_item(&name, product_type)?;
        tx.commit()?;
        Ok(id)
    }

    pub fn is_product(&self, id: i64) -> Result<bool> {
        let is_product = self
            .conn
            .query_row(
                "SELECT t.typename = ?2
                 FROM items i JOIN itemtypes t ON i.fkitemtype = t.id
                 WHERE i.id = ?1",
                params![id, type_names::PRODUCT],
                |row| row.get(0),
            )
            .optional()?;
        Ok(is_product.unwrap_or(false))
    }
}
