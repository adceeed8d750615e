use rusqlite::types::{FromSql, FromSqlResult, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, Rows, ToSql};
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

use crate::config::DataSource;
use crate::error::{Error, Result};
use crate::record::FromRow;
use crate::statement::MappedStatement;

/// Core value types for SQLite operations
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
    Boolean(bool),
}

impl Value {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => Some(*v),
            Value::Boolean(v) => Some(i64::from(*v)),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Blob(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Borrowed(ValueRef::Null),
            Value::Integer(v) => ToSqlOutput::Borrowed(ValueRef::Integer(*v)),
            Value::Real(v) => ToSqlOutput::Borrowed(ValueRef::Real(*v)),
            Value::Text(v) => ToSqlOutput::Borrowed(ValueRef::Text(v.as_bytes())),
            Value::Blob(v) => ToSqlOutput::Borrowed(ValueRef::Blob(v.as_slice())),
            Value::Boolean(v) => ToSqlOutput::Borrowed(ValueRef::Integer(i64::from(*v))),
        })
    }
}

impl FromSql for Value {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        Ok(match value {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(v) => Value::Integer(v),
            ValueRef::Real(v) => Value::Real(v),
            ValueRef::Text(_) => Value::Text(value.as_str()?.to_string()),
            ValueRef::Blob(v) => Value::Blob(v.to_vec()),
        })
    }
}

/// Parameter bindings for SQL queries
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Params {
    pub values: HashMap<String, Value>,
}

impl Params {
    /// Create a new Params object
    pub fn new() -> Self {
        Self::default()
    }
    /// Add a named value; bound to `:name` unless the name carries its own prefix
    pub fn with_value(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.values.insert(name.to_string(), value.into());
        self
    }
}

/// What a statement is bound with.
#[derive(Debug, Default, Clone, PartialEq)]
pub enum Parameter {
    #[default]
    None,
    /// Bound to the first positional placeholder (`?` / `?1`).
    Single(Value),
    /// Bound by name.
    Named(Params),
}

impl From<()> for Parameter {
    fn from(_: ()) -> Self {
        Parameter::None
    }
}

impl From<Params> for Parameter {
    fn from(params: Params) -> Self {
        Parameter::Named(params)
    }
}

impl<T: Into<Value>> From<T> for Parameter {
    fn from(value: T) -> Self {
        Parameter::Single(value.into())
    }
}

fn placeholder(name: &str) -> String {
    if name.starts_with([':', '@', '$']) {
        name.to_string()
    } else {
        format!(":{name}")
    }
}

/// Open a connection on the data source. In-memory databases get the
/// bootstrap batch here since they do not outlive their connection.
pub(crate) fn open(source: &DataSource, schema: Option<&str>) -> Result<Connection> {
    let conn = match source {
        DataSource::Memory => Connection::open_in_memory(),
        DataSource::File { path } => Connection::open(path),
    }
    .map_err(|e| Error::Open {
        path: source.to_string(),
        source: e,
    })?;

    if let (DataSource::Memory, Some(sql)) = (source, schema) {
        bootstrap(&conn, source, sql)?;
    }
    Ok(conn)
}

/// Run the bootstrap batch against a connection.
pub(crate) fn bootstrap(conn: &Connection, source: &DataSource, sql: &str) -> Result<()> {
    debug!(data_source = %source, "running bootstrap sql");
    conn.execute_batch(sql).map_err(|e| Error::Open {
        path: source.to_string(),
        source: e,
    })
}

/// Run a mapped statement and decode at most one row.
///
/// Issues exactly one query. A second row is an error rather than being
/// silently dropped.
pub(crate) fn query_one<T: FromRow>(
    conn: &Connection,
    statement: &MappedStatement,
    parameter: &Parameter,
) -> Result<Option<T>> {
    let id = statement.id.as_str();
    let fail = |e: rusqlite::Error| Error::backing_store(id, e);

    let mut stmt = conn.prepare(&statement.sql).map_err(fail)?;
    let mut rows = bind(&mut stmt, parameter).map_err(fail)?;

    let first = match rows.next().map_err(fail)? {
        Some(row) => T::from_row(row).map_err(fail)?,
        None => return Ok(None),
    };
    if rows.next().map_err(fail)?.is_some() {
        return Err(Error::TooManyResults(id.to_string()));
    }
    Ok(Some(first))
}

fn bind<'s>(
    stmt: &'s mut rusqlite::Statement<'_>,
    parameter: &Parameter,
) -> rusqlite::Result<Rows<'s>> {
    match parameter {
        Parameter::None => stmt.query(params![]),
        Parameter::Single(value) => stmt.query(params![value]),
        Parameter::Named(params) => {
            let expected = stmt.parameter_count();
            if params.values.len() != expected {
                return Err(rusqlite::Error::InvalidParameterCount(
                    params.values.len(),
                    expected,
                ));
            }
            let names: Vec<(String, &Value)> = params
                .values
                .iter()
                .map(|(name, value)| (placeholder(name), value))
                .collect();
            let bound: Vec<(&str, &dyn ToSql)> = names
                .iter()
                .map(|(name, value)| (name.as_str(), *value as &dyn ToSql))
                .collect();
            stmt.query(bound.as_slice())
        }
    }
}
