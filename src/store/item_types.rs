use log::debug;
use rusqlite::types::Value;
use rusqlite::{params, OptionalExtension, Row};

use super::error::{Result, WriteContext};
use super::Store;
use crate::model::ItemType;

const TABLE: &str = "itemtypes";

fn item_type_from_row(row: &Row) -> rusqlite::Result<ItemType> {
    Ok(ItemType {
        id: row.get("id")?,
        type_name: row.get("typename")?,
    })
}

impl Store {
    pub fn add_item_type(&self, type_name: &str) -> Result<i64> {
        self.conn
            .execute("INSERT INTO itemtypes (typename) VALUES (?1)", params![type_name])
            .on_table(TABLE)?;
        let id = self.conn.last_insert_rowid();
        debug!("Added item type {} ({})", type_name, id);
        Ok(id)
    }

    pub fn rename_item_type(&self, id: i64, type_name: &str) -> Result<()> {
        self.update_row(TABLE, id, vec![("typename", Value::Text(type_name.to_string()))])
    }

    /// Deleting a type removes every item of that type, and everything hanging off those items
    pub fn delete_item_type(&self, id: i64) -> Result<()> {
        self.delete_row(TABLE, id)
    }

    pub fn item_type(&self, id: i64) -> Result<Option<ItemType>> {
        let t = self
            .conn
            .query_row(
                "SELECT id, typename FROM itemtypes WHERE id = ?1",
                [id],
                item_type_from_row,
            )
            .optional()?;
        Ok(t)
    }

    pub fn item_type_id_by_name(&self, type_name: &str) -> Result<Option<i64>> {
        let id = self
            .conn
            .query_row(
                "SELECT id FROM itemtypes WHERE typename = ?1",
                [type_name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    pub fn list_item_types(&self) -> Result<Vec<ItemType>> {
        let mut stmt = self.conn.prepare("SELECT id, typename FROM itemtypes ORDER BY id")?;
        let types = stmt
            .query_map([], item_type_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(types)
    }

    /// Id of the type called `type_name`, creating it if needed
    pub fn ensure_item_type(&self, type_name: &str) -> Result<i64> {
        match self.item_type_id_by_name(type_name)? {
            Some(id) => Ok(id),
            None => self.add_item_type(type_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::store::{Store, StoreError};

    #[test]
    fn test_add_and_lookup() {
        let store = Store::open_in_memory().unwrap();
        let id = store.add_item_type("STATION").unwrap();

        assert_eq!(store.item_type_id_by_name("STATION").unwrap(), Some(id));
        assert_eq!(store.item_type(id).unwrap().unwrap().type_name, "STATION");
        assert_eq!(store.item_type_id_by_name("UNIT").unwrap(), None);
    }

    #[test]
    fn test_type_names_are_unique() {
        let store = Store::open_in_memory().unwrap();
        store.add_item_type("STATION").unwrap();
        let err = store.add_item_type("STATION").unwrap_err();
        assert!(matches!(err, StoreError::Unique { table: "itemtypes", .. }));
    }

    #[test]
    fn test_ensure_is_get_or_create() {
        let store = Store::open_in_memory().unwrap();
        let first = store.ensure_item_type("PRODUCT").unwrap();
        let second = store.ensure_item_type("PRODUCT").unwrap();
        assert_eq!(first, second);
        assert_eq!(store.list_item_types().unwrap().len(), 1);
    }

    #[test]
    fn test_rename_and_delete() {
        let store = Store::open_in_memory().unwrap();
        let id = store.add_item_type("STATON").unwrap();
        store.rename_item_type(id, "STATION").unwrap();
        assert_eq!(store.item_type(id).unwrap().unwrap().type_name, "STATION");

        let item = store.add_item("DV-JAGUAR", id).unwrap();
        store.delete_item_type(id).unwrap();
        assert!(store.item(item).unwrap().is_none(), "items cascade with their type");
    }
}
