use rusqlite::Row;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::sqlite::Value;

/// Decodes one result row into an owned value.
///
/// Implementations must not keep anything borrowed from the row: the decoded
/// value outlives the statement and the session it came from.
pub trait FromRow: Sized {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

/// A row decoded by column name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a named field, replacing any earlier field with the same name
    pub fn with_field(mut self, name: &str, value: impl Into<Value>) -> Self {
        let value = value.into();
        match self.fields.iter_mut().find(|(field, _)| field == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name.to_string(), value)),
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// The `id` column, if the row has one.
    pub fn id(&self) -> Option<&Value> {
        self.get("id")
    }

    /// Fields in column order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromRow for Record {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let stmt: &rusqlite::Statement<'_> = row.as_ref();
        let mut record = Record::new();
        for index in 0..stmt.column_count() {
            let name = stmt.column_name(index)?;
            record = record.with_field(name, row.get::<_, Value>(index)?);
        }
        Ok(record)
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
