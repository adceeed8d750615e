use thiserror::Error;

/// Result type for mapper operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while resolving, binding or executing statements.
///
/// A lookup that matches no row is not an error: it comes back as `Ok(None)`.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Unknown statement '{0}'")]
    UnknownStatement(String),

    #[error("Method '{method}' of '{interface}' is not bound: no statement '{statement}'")]
    UnboundMethod {
        interface: String,
        method: String,
        statement: String,
    },

    #[error("Statement '{statement}' failed: {source}")]
    BackingStore {
        statement: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Statement '{0}' is declared single-row but returned more than one row")]
    TooManyResults(String),

    #[error("Cannot run '{0}': session is closed")]
    SessionClosed(String),

    #[error("Invalid statement id '{0}': expected '<namespace>.<operation>'")]
    InvalidStatementId(String),

    #[error("Statement '{0}' is already registered")]
    DuplicateStatement(String),

    #[error("Failed to open database '{path}': {source}")]
    Open {
        path: String,
        #[source]
        source: rusqlite::Error,
    },
}

impl Error {
    pub(crate) fn backing_store(statement: impl Into<String>, source: rusqlite::Error) -> Self {
        Error::BackingStore {
            statement: statement.into(),
            source,
        }
    }

    /// The statement id this error is about, when there is one.
    pub fn statement(&self) -> Option<&str> {
        match self {
            Error::UnknownStatement(id)
            | Error::TooManyResults(id)
            | Error::InvalidStatementId(id)
            | Error::DuplicateStatement(id) => Some(id),
            Error::UnboundMethod { statement, .. } | Error::BackingStore { statement, .. } => {
                Some(statement)
            }
            Error::SessionClosed(_) | Error::Open { .. } => None,
        }
    }
}
