//! Nested grouping of table rows by one or more key columns.
//!
//! Groups keep first-seen key order, so iterating a grouped table visits keys
//! in the order they appear in the source file.

use std::collections::HashMap;
use std::fmt;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::table::{DecodedTable, Row};
use crate::value::CellValue;

/// Hashable projection of a [`CellValue`] used as a group or index key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupKey {
    Null,
    /// Bit pattern of the number (with -0.0 folded into 0.0)
    Number(u64),
    Boolean(bool),
    /// Milliseconds since the epoch
    Date(i64),
    Text(String),
}

impl GroupKey {
    pub fn number(n: f64) -> Self {
        let n = if n == 0.0 { 0.0 } else { n };
        GroupKey::Number(n.to_bits())
    }

    pub fn text(s: impl Into<String>) -> Self {
        GroupKey::Text(s.into())
    }
}

impl From<&CellValue> for GroupKey {
    fn from(value: &CellValue) -> Self {
        match value {
            CellValue::Null => GroupKey::Null,
            CellValue::Number(n) => GroupKey::number(*n),
            CellValue::Boolean(b) => GroupKey::Boolean(*b),
            CellValue::Date(d) => GroupKey::Date(d.timestamp_millis()),
            CellValue::Text(s) => GroupKey::Text(s.clone()),
        }
    }
}

impl From<f64> for GroupKey {
    fn from(n: f64) -> Self {
        GroupKey::number(n)
    }
}

impl From<&str> for GroupKey {
    fn from(s: &str) -> Self {
        GroupKey::text(s)
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Null => f.write_str("null"),
            GroupKey::Number(bits) => {
                let n = f64::from_bits(*bits);
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            GroupKey::Boolean(b) => write!(f, "{}", b),
            GroupKey::Date(ms) => write!(f, "{}", ms),
            GroupKey::Text(s) => f.write_str(s),
        }
    }
}

/// Rows grouped by the remaining key columns.
#[derive(Debug, Clone, PartialEq)]
pub enum Grouped {
    /// Leaf: rows sharing every key on the path
    Rows(Vec<Row>),
    /// Next grouping level
    Groups(GroupMap),
}

impl Grouped {
    /// Child group or leaf for `key`; `None` on a leaf or unknown key.
    pub fn get(&self, key: &GroupKey) -> Option<&Grouped> {
        match self {
            Grouped::Rows(_) => None,
            Grouped::Groups(map) => map.get(key),
        }
    }

    /// Follow a path of keys down the nested groups.
    pub fn path(&self, keys: &[GroupKey]) -> Option<&Grouped> {
        keys.iter().try_fold(self, |node, key| node.get(key))
    }

    /// Rows at a leaf.
    pub fn rows(&self) -> Option<&[Row]> {
        match self {
            Grouped::Rows(rows) => Some(rows),
            Grouped::Groups(_) => None,
        }
    }

    /// Number of keys at this level (or rows at a leaf).
    pub fn len(&self) -> usize {
        match self {
            Grouped::Rows(rows) => rows.len(),
            Grouped::Groups(map) => map.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total number of rows below this node.
    pub fn row_count(&self) -> usize {
        match self {
            Grouped::Rows(rows) => rows.len(),
            Grouped::Groups(map) => map.iter().map(|(_, child)| child.row_count()).sum(),
        }
    }
}

impl Serialize for Grouped {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Grouped::Rows(rows) => {
                let mut seq = serializer.serialize_seq(Some(rows.len()))?;
                for row in rows {
                    seq.serialize_element(row)?;
                }
                seq.end()
            }
            Grouped::Groups(map) => map.serialize(serializer),
        }
    }
}

/// Insertion-ordered map from group key to child node.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GroupMap {
    keys: Vec<GroupKey>,
    children: Vec<Grouped>,
    index: HashMap<GroupKey, usize>,
}

impl GroupMap {
    pub fn get(&self, key: &GroupKey) -> Option<&Grouped> {
        self.index.get(key).map(|&i| &self.children[i])
    }

    pub fn keys(&self) -> &[GroupKey] {
        &self.keys
    }

    pub fn iter(&self) -> impl Iterator<Item = (&GroupKey, &Grouped)> {
        self.keys.iter().zip(self.children.iter())
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl Serialize for GroupMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.keys.len()))?;
        for (key, child) in self.iter() {
            map.serialize_entry(&key.to_string(), child)?;
        }
        map.end()
    }
}

/// Group rows by `keys`, outermost first. With no keys the rows are returned
/// as a single leaf. A row missing a key column is grouped under `Null`.
pub fn group_by<K: AsRef<str>>(table: &DecodedTable, keys: &[K]) -> Grouped {
    group_rows(table.rows().to_vec(), keys)
}

fn group_rows<K: AsRef<str>>(rows: Vec<Row>, keys: &[K]) -> Grouped {
    let Some((first, rest)) = keys.split_first() else {
        return Grouped::Rows(rows);
    };

    let mut buckets: Vec<(GroupKey, Vec<Row>)> = Vec::new();
    let mut index: HashMap<GroupKey, usize> = HashMap::new();
    for row in rows {
        let key = row
            .get(first.as_ref())
            .map(GroupKey::from)
            .unwrap_or(GroupKey::Null);
        match index.get(&key) {
            Some(&i) => buckets[i].1.push(row),
            None => {
                index.insert(key.clone(), buckets.len());
                buckets.push((key, vec![row]));
            }
        }
    }

    let mut map = GroupMap {
        keys: Vec::with_capacity(buckets.len()),
        children: Vec::with_capacity(buckets.len()),
        index,
    };
    for (key, bucket) in buckets {
        map.keys.push(key);
        map.children.push(group_rows(bucket, rest));
    }
    Grouped::Groups(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsv::parse_dsv;

    fn hw_table() -> DecodedTable {
        parse_dsv(
            "posid,exposure_id,exp_iter,x\n\
             M01,100,0,1.0\n\
             M01,100,1,1.1\n\
             M02,100,0,2.0\n\
             M01,101,0,1.2\n",
            ',',
        )
    }

    #[test]
    fn test_single_level_group_keeps_insertion_order() {
        let grouped = group_by(&hw_table(), &["posid"]);
        let Grouped::Groups(map) = &grouped else {
            panic!("expected groups");
        };
        assert_eq!(map.keys(), &[GroupKey::text("M01"), GroupKey::text("M02")]);
        assert_eq!(grouped.get(&"M01".into()).unwrap().len(), 3);
        assert_eq!(grouped.row_count(), 4);
    }

    #[test]
    fn test_three_level_group() {
        let grouped = group_by(&hw_table(), &["posid", "exposure_id", "exp_iter"]);
        let leaf = grouped
            .path(&["M01".into(), 100.0.into(), 1.0.into()])
            .and_then(Grouped::rows)
            .unwrap();
        assert_eq!(leaf.len(), 1);
        assert_eq!(leaf[0].get("x"), Some(&CellValue::Number(1.1)));
        assert!(grouped.path(&["M02".into(), 101.0.into()]).is_none());
    }

    #[test]
    fn test_no_keys_is_flat() {
        let grouped = group_by::<&str>(&hw_table(), &[]);
        assert_eq!(grouped.rows().map(|r| r.len()), Some(4));
    }

    #[test]
    fn test_missing_key_column_groups_under_null() {
        let grouped = group_by(&hw_table(), &["location"]);
        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped.get(&GroupKey::Null).unwrap().len(), 4);
    }

    #[test]
    fn test_grouped_serializes_with_string_keys() {
        let table = parse_dsv("location,v\n4001,1\n4002,2\n", ',');
        let json = serde_json::to_value(group_by(&table, &["location"])).unwrap();
        assert_eq!(json["4001"][0]["v"], 1.0);
        assert_eq!(json["4002"][0]["location"], 4002.0);
    }
}
