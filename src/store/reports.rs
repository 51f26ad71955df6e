use rusqlite::params_from_iter;
use std::collections::BTreeMap;

use super::error::Result;
use super::Store;
use crate::model::{type_names, Overallocation, ProductUsage};

impl Store {
    /// Distinct months that have any loading, ascending
    pub fn list_months(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT monthyear FROM itemloading ORDER BY monthyear")?;
        let months = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(months)
    }

    /// Total loading per (item, month) for the given items, summed over product scopes
    pub fn monthly_totals(&self, item_ids: &[i64]) -> Result<BTreeMap<(i64, String), f64>> {
        if item_ids.is_empty() {
            return Ok(BTreeMap::new());
        }

        let placeholders = vec!["?"; item_ids.len()].join(", ");
        let sql = format!(
            "SELECT fkitem, monthyear, SUM(percent)
             FROM itemloading
             WHERE fkitem IN ({})
             GROUP BY fkitem, monthyear",
            placeholders
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(item_ids.iter()), |row| {
            Ok(((row.get::<_, i64>(0)?, row.get::<_, String>(1)?), row.get::<_, f64>(2)?))
        })?;

        let mut totals = BTreeMap::new();
        for row in rows {
            let (key, total) = row?;
            totals.insert(key, total);
        }
        Ok(totals)
    }

    /// Every product with the number of items mapped to it and loading rows attributed to it
    pub fn product_usage(&self) -> Result<Vec<ProductUsage>> {
        let mut stmt = self.conn.prepare(
            "SELECT i.id, i.itemname,
                    COUNT(DISTINCT m.fkitem) AS mapped_items,
                    COUNT(DISTINCT l.id) AS loading_count
             FROM items i
             JOIN itemtypes t ON i.fkitemtype = t.id
             LEFT JOIN item_product_map m ON i.id = m.fkproduct
             LEFT JOIN itemloading l ON i.id = l.fkproduct
             WHERE t.typename = ?1
             GROUP BY i.id, i.itemname
             ORDER BY i.itemname",
        )?;
        let rows = stmt
            .query_map([type_names::PRODUCT], |row| {
                Ok(ProductUsage {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    mapped_items: row.get(2)?,
                    loading_count: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Item-months whose loading sums to more than 100 percent
    pub fn overallocated_months(&self) -> Result<Vec<Overallocation>> {
        let mut stmt = self.conn.prepare(
            "SELECT l.fkitem, i.itemname, l.monthyear, SUM(l.percent) AS total
             FROM itemloading l
             JOIN items i ON l.fkitem = i.id
             GROUP BY l.fkitem, l.monthyear
             HAVING SUM(l.percent) > 100
             ORDER BY l.monthyear, l.fkitem",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(Overallocation {
                    item_id: row.get(0)?,
                    item_name: row.get(1)?,
                    month_year: row.get(2)?,
                    total_percent: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use crate::model::NewLoading;
    use crate::store::test_support::small_store;

    #[test]
    fn test_months_and_totals() {
        let (store, station, resource, product_a, product_b) = small_store();
        store.add_loading(&NewLoading::new(station, "2025-02", 30.0)).unwrap();
        store
            .add_loading(&NewLoading::new(station, "2025-02", 25.0).for_product(product_a))
            .unwrap();
        store
            .add_loading(&NewLoading::new(station, "2025-01", 10.0).for_product(product_b))
            .unwrap();
        store.add_loading(&NewLoading::new(resource, "2025-03", 80.0)).unwrap();

        assert_eq!(store.list_months().unwrap(), vec!["2025-01", "2025-02", "2025-03"]);

        let totals = store.monthly_totals(&[station]).unwrap();
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[&(station, "2025-02".to_string())], 55.0);
        assert_eq!(totals[&(station, "2025-01".to_string())], 10.0);

        assert!(store.monthly_totals(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_product_usage() {
        let (store, station, resource, product_a, product_b) = small_store();
        store.map_item_to_product(station, product_a).unwrap();
        store.map_item_to_product(resource, product_a).unwrap();
        store
            .add_loading(&NewLoading::new(station, "2025-01", 10.0).for_product(product_a))
            .unwrap();

        let usage = store.product_usage().unwrap();
        assert_eq!(usage.len(), 2);

        let a = usage.iter().find(|u| u.id == product_a).unwrap();
        assert_eq!((a.mapped_items, a.loading_count), (2, 1));
        let b = usage.iter().find(|u| u.id == product_b).unwrap();
        assert_eq!((b.mapped_items, b.loading_count), (0, 0));
    }

    #[test]
    fn test_overallocated_months() {
        let (store, station, _, product_a, product_b) = small_store();
        store
            .add_loading(&NewLoading::new(station, "2025-01", 60.0).for_product(product_a))
            .unwrap();
        store
            .add_loading(&NewLoading::new(station, "2025-01", 50.0).for_product(product_b))
            .unwrap();
        store
            .add_loading(&NewLoading::new(station, "2025-02", 100.0).for_product(product_a))
            .unwrap();

        let over = store.overallocated_months().unwrap();
        assert_eq!(over.len(), 1);
        assert_eq!(over[0].month_year, "2025-01");
        assert_eq!(over[0].item_name, "DV-SPYKER");
        assert_eq!(over[0].total_percent, 110.0);
    }
}
