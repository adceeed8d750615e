use std::fmt;

use crate::error::{Error, Result};

/// Key of a declared statement: `<namespace>.<operation>`.
///
/// The namespace may itself contain dots (`com.example.EmployeeMapper`), so the
/// id is split at its last dot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StatementId {
    full: String,
    split: usize,
}

impl StatementId {
    /// Parse a full id, rejecting ids without a namespace or an operation.
    pub fn parse(id: impl Into<String>) -> Result<Self> {
        let full = id.into();
        match full.rfind('.') {
            Some(split) if split > 0 && split + 1 < full.len() => Ok(Self { full, split }),
            _ => Err(Error::InvalidStatementId(full)),
        }
    }

    /// Join a namespace (or interface qualified name) and an operation.
    pub fn new(namespace: &str, operation: &str) -> Result<Self> {
        Self::parse(format!("{namespace}.{operation}"))
    }

    pub fn namespace(&self) -> &str {
        &self.full[..self.split]
    }

    pub fn operation(&self) -> &str {
        &self.full[self.split + 1..]
    }

    pub fn as_str(&self) -> &str {
        &self.full
    }
}

impl fmt::Display for StatementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full)
    }
}

impl AsRef<str> for StatementId {
    fn as_ref(&self) -> &str {
        &self.full
    }
}

/// A registered statement: its id and the SQL it runs.
///
/// Every mapped statement is single-row; `select_one` rejects extra rows.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedStatement {
    pub id: StatementId,
    pub sql: String,
}

impl MappedStatement {
    pub fn new(id: StatementId, sql: impl Into<String>) -> Self {
        Self {
            id,
            sql: sql.into(),
        }
    }
}
