//! Literal seed rows written by `fluid-db init`.
//!
//! Identifiers are fixed; existing consumers look rows up by these ids.

use rusqlite::{params, Transaction};

pub struct SeedItemType {
    pub id: i64,
    pub name: &'static str,
}

pub struct SeedItem {
    pub id: i64,
    pub name: &'static str,
    pub item_type_id: i64,
}

pub struct SeedCharacteristic {
    pub item_id: i64,
    pub key: &'static str,
    pub value: &'static str,
    pub value_type: Option<&'static str>,
}

pub struct SeedLoading {
    pub item_id: i64,
    pub month_year: &'static str,
    pub percent: f64,
}

pub static ITEM_TYPES: &[SeedItemType] = &[
    SeedItemType { id: 3, name: "STATION" },
    SeedItemType { id: 4, name: "RESOURCE" },
    SeedItemType { id: 5, name: "UNIT" },
    SeedItemType { id: 6, name: "PRODUCT" },
];

pub static ITEMS: &[SeedItem] = &[
    SeedItem { id: 1, name: "DV-JAGUAR", item_type_id: 3 },
    SeedItem { id: 2, name: "DV-PUMA", item_type_id: 3 },
    SeedItem { id: 3, name: "Gabor Farkas", item_type_id: 4 },
    SeedItem { id: 4, name: "Marie Tremblay", item_type_id: 4 },
    SeedItem { id: 5, name: "Daniel Okafor", item_type_id: 4 },
    SeedItem { id: 6, name: "DV-SPYKER", item_type_id: 3 },
    SeedItem { id: 7, name: "BEEHIVE 300G", item_type_id: 6 },
    SeedItem { id: 8, name: "BEEHIVE 500G", item_type_id: 6 },
    SeedItem { id: 9, name: "GENERIC 300L", item_type_id: 6 },
    SeedItem { id: 10, name: "GENERIC 500L", item_type_id: 6 },
    SeedItem { id: 11, name: "UNALLOCATED", item_type_id: 6 },
];

pub static CHARACTERISTICS: &[SeedCharacteristic] = &[SeedCharacteristic {
    item_id: 6,
    key: "Location",
    value: "Ottawa",
    value_type: Some("str"),
}];

pub static LOADINGS: &[SeedLoading] = &[
    SeedLoading { item_id: 6, month_year: "2025-01", percent: 14.0 },
    SeedLoading { item_id: 6, month_year: "2025-02", percent: 22.0 },
    SeedLoading { item_id: 6, month_year: "2025-03", percent: 22.0 },
    SeedLoading { item_id: 6, month_year: "2025-04", percent: 22.0 },
    SeedLoading { item_id: 6, month_year: "2025-05", percent: 22.0 },
];

/// Row counts written per table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedCounts {
    pub item_types: usize,
    pub items: usize,
    pub characteristics: usize,
    pub loadings: usize,
}

impl SeedCounts {
    pub fn total(&self) -> usize {
        self.item_types + self.items + self.characteristics + self.loadings
    }
}

/// Insert all seed rows. The caller owns the transaction.
pub fn insert_seed(tx: &Transaction) -> rusqlite::Result<SeedCounts> {
    let mut counts = SeedCounts::default();

    {
        let mut stmt = tx.prepare_cached("INSERT INTO itemtypes (id, typename) VALUES (?1, ?2)")?;
        for t in ITEM_TYPES {
            counts.item_types += stmt.execute(params![t.id, t.name])?;
        }
    }

    {
        let mut stmt =
            tx.prepare_cached("INSERT INTO items (id, itemname, fkitemtype) VALUES (?1, ?2, ?3)")?;
        for item in ITEMS {
            counts.items += stmt.execute(params![item.id, item.name, item.item_type_id])?;
        }
    }

    {
        let mut stmt = tx.prepare_cached(
            "INSERT INTO itemcharacteristics (fkitem, itemkey, itemvalue, itemkeyvaluetype)
             VALUES (?1, ?2, ?3, ?4)",
        )?;
        for c in CHARACTERISTICS {
            counts.characteristics += stmt.execute(params![c.item_id, c.key, c.value, c.value_type])?;
        }
    }

    {
        let mut stmt = tx.prepare_cached(
            "INSERT INTO itemloading (fkitem, dailyrollupexists, monthyear, percent, fkproduct)
             VALUES (?1, 0, ?2, ?3, NULL)",
        )?;
        for l in LOADINGS {
            counts.loadings += stmt.execute(params![l.item_id, l.month_year, l.percent])?;
        }
    }

    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_seed_ids_are_unique() {
        let type_ids: HashSet<_> = ITEM_TYPES.iter().map(|t| t.id).collect();
        assert_eq!(type_ids.len(), ITEM_TYPES.len());

        let item_ids: HashSet<_> = ITEMS.iter().map(|i| i.id).collect();
        assert_eq!(item_ids.len(), 11);
        assert!(ITEMS.iter().all(|i| type_ids.contains(&i.item_type_id)));
    }

    #[test]
    fn test_seed_item_kinds() {
        let ids_of = |type_id: i64| -> Vec<i64> {
            ITEMS.iter().filter(|i| i.item_type_id == type_id).map(|i| i.id).collect()
        };
        assert_eq!(ids_of(3), vec![1, 2, 6]);
        assert_eq!(ids_of(4), vec![3, 4, 5]);
        assert_eq!(ids_of(6), vec![7, 8, 9, 10, 11]);
    }
}
