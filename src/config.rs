use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::statement::{MappedStatement, StatementId};

/// Where sessions get their connection from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataSource {
    /// A private in-memory database per session.
    Memory,
    /// A SQLite database file, created if missing.
    File { path: PathBuf },
}

impl DataSource {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        DataSource::File { path: path.into() }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Memory => f.write_str(":memory:"),
            DataSource::File { path } => write!(f, "{}", path.display()),
        }
    }
}

/// One statement inside a mapper file; `id` is relative to the namespace.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StatementConfig {
    pub id: String,
    pub sql: String,
}

/// A namespace and the statements declared under it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MapperFile {
    pub namespace: String,
    #[serde(default)]
    pub statements: Vec<StatementConfig>,
}

impl MapperFile {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            statements: Vec::new(),
        }
    }

    pub fn with_statement(mut self, id: impl Into<String>, sql: impl Into<String>) -> Self {
        self.statements.push(StatementConfig {
            id: id.into(),
            sql: sql.into(),
        });
        self
    }
}

/// Mapper configuration: data source, optional bootstrap SQL and mapper files.
///
/// Deserializable from any serde format; the crate itself reads no files.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MapperConfig {
    pub data_source: DataSource,
    /// SQL batch run once when the factory is built (file databases) or on
    /// every session open (in-memory databases).
    #[serde(default)]
    pub schema: Option<String>,
    #[serde(default)]
    pub mappers: Vec<MapperFile>,
}

impl MapperConfig {
    /// Create a new config with no schema and no mappers
    pub fn new(data_source: DataSource) -> Self {
        Self {
            data_source,
            schema: None,
            mappers: Vec::new(),
        }
    }

    pub fn with_schema(mut self, sql: impl Into<String>) -> Self {
        self.schema = Some(sql.into());
        self
    }

    pub fn add_mapper(mut self, mapper: MapperFile) -> Self {
        self.mappers.push(mapper);
        self
    }
}

/// Registry of mapped statements keyed by full statement id.
///
/// Built once and then only read; sessions share it behind an `Arc`.
#[derive(Debug, Default, Clone)]
pub struct Configuration {
    statements: HashMap<String, MappedStatement>,
}

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every statement of every mapper file.
    pub fn from_mappers(mappers: &[MapperFile]) -> Result<Self> {
        let mut configuration = Self::new();
        for mapper in mappers {
            for statement in &mapper.statements {
                let id = StatementId::new(&mapper.namespace, &statement.id)?;
                configuration.register(MappedStatement::new(id, statement.sql.clone()))?;
            }
        }
        Ok(configuration)
    }

    pub fn register(&mut self, statement: MappedStatement) -> Result<()> {
        let key = statement.id.to_string();
        if self.statements.contains_key(&key) {
            return Err(Error::DuplicateStatement(key));
        }
        self.statements.insert(key, statement);
        Ok(())
    }

    pub fn resolve(&self, id: &str) -> Option<&MappedStatement> {
        self.statements.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.statements.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}
