use std::collections::BTreeMap;

use serde::Serialize;

/// A single cell value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Flag(bool),
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Flag(v)
    }
}

/// One table row, addressed by the table's field enum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Row<F: Ord> {
    values: BTreeMap<F, FieldValue>,
}

impl<F: Ord> Default for Row<F> {
    fn default() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }
}

impl<F: Ord + Copy> Row<F> {
    pub fn set(&mut self, field: F, value: impl Into<FieldValue>) {
        self.values.insert(field, value.into());
    }

    pub fn get(&self, field: F) -> Option<&FieldValue> {
        self.values.get(&field)
    }

    pub fn text(&self, field: F) -> Option<&str> {
        match self.values.get(&field) {
            Some(FieldValue::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn flag(&self, field: F) -> Option<bool> {
        match self.values.get(&field) {
            Some(FieldValue::Flag(b)) => Some(*b),
            _ => None,
        }
    }
}

/// A record type that knows how to fill a table row.
///
/// The field set is fixed per table, so `Field` is an enum rather than a
/// runtime string name.
pub trait TiledRecord {
    type Field: Ord + Copy;

    fn project(&self, row: &mut Row<Self::Field>);
}

/// Row storage for one tiled table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableModel<F: Ord> {
    pub title: String,
    rows: Vec<Row<F>>,
}

impl<F: Ord + Copy> TableModel<F> {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            rows: Vec::new(),
        }
    }

    /// Replace all rows with one row per record, in input order.
    ///
    /// Callers filter and sort beforehand.
    pub fn populate_rows<R>(&mut self, records: &[R])
    where
        R: TiledRecord<Field = F>,
    {
        self.clear();
        self.rows.reserve(records.len());
        for record in records {
            let mut row = Row::default();
            record.project(&mut row);
            self.rows.push(row);
        }
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }

    pub fn rows(&self) -> &[Row<F>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn value(&self, row: usize, field: F) -> Option<&FieldValue> {
        self.rows.get(row).and_then(|r| r.get(field))
    }
}
