use log::debug;
use rusqlite::{params, Row};

use super::error::{Result, WriteContext};
use super::{integer, present, text, Store};
use crate::model::{CharacteristicFilter, CharacteristicUpdate, ItemCharacteristic, NewCharacteristic};

const TABLE: &str = "itemcharacteristics";

fn characteristic_from_row(row: &Row) -> rusqlite::Result<ItemCharacteristic> {
    Ok(ItemCharacteristic {
        id: row.get("id")?,
        item_id: row.get("fkitem")?,
        key: row.get("itemkey")?,
        value: row.get("itemvalue")?,
        value_type: row.get("itemkeyvaluetype")?,
    })
}

impl Store {
    /// Insert a characteristic; a second value for the same key on the same
    /// item is a uniqueness violation
    pub fn add_characteristic(&self, new: &NewCharacteristic) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO itemcharacteristics (fkitem, itemkey, itemvalue, itemkeyvaluetype)
                 VALUES (?1, ?2, ?3, ?4)",
                params![new.item_id, new.key, new.value, new.value_type],
            )
            .on_table(TABLE)?;
        let id = self.conn.last_insert_rowid();
        debug!("Added characteristic {}={} to item {}", new.key, new.value, new.item_id);
        Ok(id)
    }

    /// Insert or replace the value stored under `new.key` for `new.item_id`
    pub fn set_characteristic(&self, new: &NewCharacteristic) -> Result<i64> {
        let id = self
            .conn
            .query_row(
                "INSERT INTO itemcharacteristics (fkitem, itemkey, itemvalue, itemkeyvaluetype)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT (fkitem, itemkey) DO UPDATE
                 SET itemvalue = excluded.itemvalue, itemkeyvaluetype = excluded.itemkeyvaluetype
                 RETURNING id",
                params![new.item_id, new.key, new.value, new.value_type],
                |row| row.get(0),
            )
            .on_table(TABLE)?;
        debug!("Set characteristic {}={} on item {}", new.key, new.value, new.item_id);
        Ok(id)
    }

    pub fn update_characteristic(&self, id: i64, update: CharacteristicUpdate) -> Result<()> {
        let fields = present(vec![
            ("fkitem", integer(update.item_id)),
            ("itemkey", text(update.key)),
            ("itemvalue", text(update.value)),
            ("itemkeyvaluetype", text(update.value_type)),
        ]);
        self.update_row(TABLE, id, fields)
    }

    pub fn delete_characteristic(&self, id: i64) -> Result<()> {
        self.delete_row(TABLE, id)
    }

    pub fn characteristics_for_item(&self, item_id: i64) -> Result<Vec<ItemCharacteristic>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, fkitem, itemkey, itemvalue, itemkeyvaluetype
             FROM itemcharacteristics WHERE fkitem = ?1 ORDER BY id",
        )?;
        let rows = stmt
            .query_map([item_id], characteristic_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn find_characteristic_ids(&self, filter: CharacteristicFilter) -> Result<Vec<i64>> {
        let filters = present(vec![
            ("fkitem", integer(filter.item_id)),
            ("itemkey", text(filter.key)),
            ("itemvalue", text(filter.value)),
            ("itemkeyvaluetype", text(filter.value_type)),
        ]);
        self.ids_matching(TABLE, filters)
    }
}
