use rusqlite::Connection;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::{Configuration, DataSource, MapperConfig};
use crate::error::{Error, Result};
use crate::proxy::{InterfaceDescriptor, Mapper, Proxy};
use crate::record::FromRow;
use crate::sqlite::{self, Parameter};

/// Builds sessions from one mapper configuration.
///
/// The statement registry is resolved once here and then shared read-only by
/// every session the factory opens. The factory can be shared across threads;
/// sessions cannot.
#[derive(Debug)]
pub struct SessionFactory {
    configuration: Arc<Configuration>,
    data_source: DataSource,
    schema: Option<String>,
}

impl SessionFactory {
    /// Register all mapped statements and prepare the data source.
    ///
    /// Malformed or duplicate statement ids fail here. For file databases the
    /// bootstrap schema runs once, now; in-memory databases get it per session.
    pub fn build(config: MapperConfig) -> Result<Self> {
        let configuration = Configuration::from_mappers(&config.mappers)?;

        if let (DataSource::File { .. }, Some(sql)) = (&config.data_source, &config.schema) {
            let conn = sqlite::open(&config.data_source, None)?;
            sqlite::bootstrap(&conn, &config.data_source, sql)?;
        }

        info!(
            data_source = %config.data_source,
            statements = configuration.len(),
            "session factory built"
        );

        Ok(Self {
            configuration: Arc::new(configuration),
            data_source: config.data_source,
            schema: config.schema,
        })
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    pub fn data_source(&self) -> &DataSource {
        &self.data_source
    }

    /// Open a new session on its own connection.
    pub fn open_session(&self) -> Result<Session> {
        let connection = sqlite::open(&self.data_source, self.schema.as_deref())?;
        debug!(data_source = %self.data_source, "session opened");
        Ok(Session {
            configuration: Arc::clone(&self.configuration),
            connection: Some(connection),
        })
    }
}

/// One logical connection to the database.
///
/// A session runs one statement at a time and is not shared between threads.
/// Its connection is released when it is closed or dropped, whichever comes
/// first; closing again is a no-op.
#[derive(Debug)]
pub struct Session {
    configuration: Arc<Configuration>,
    connection: Option<Connection>,
}

impl Session {
    /// Run the statement registered under `statement` and decode at most one row.
    ///
    /// Returns `Ok(None)` when no row matches and `TooManyResults` when more
    /// than one does.
    pub fn select_one<T: FromRow>(
        &self,
        statement: &str,
        parameter: impl Into<Parameter>,
    ) -> Result<Option<T>> {
        let conn = self.connection(statement)?;
        let mapped = self
            .configuration
            .resolve(statement)
            .ok_or_else(|| Error::UnknownStatement(statement.to_string()))?;

        debug!(statement, "executing statement");
        sqlite::query_one(conn, mapped, &parameter.into())
    }

    /// Bind an interface to its statements, one per method.
    ///
    /// Every method must have a statement named `<interface>.<method>`; the
    /// first one missing fails the bind. Nothing is queried until a method is
    /// invoked.
    pub fn bind_proxy(&self, descriptor: &InterfaceDescriptor) -> Result<Proxy<'_>> {
        self.connection(descriptor.qualified_name())?;
        Proxy::bind(self, descriptor)
    }

    /// Typed form of [`Session::bind_proxy`] for mappers declared with [`crate::mapper!`].
    pub fn get_mapper<'s, M: Mapper<'s>>(&'s self) -> Result<M> {
        let proxy = self.bind_proxy(&M::descriptor())?;
        Ok(M::from_proxy(proxy))
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    pub fn is_closed(&self) -> bool {
        self.connection.is_none()
    }

    /// Release the connection. Safe to call more than once.
    ///
    /// A bound proxy borrows the session, so it cannot be used past `close`:
    ///
    /// ```compile_fail
    /// use rust_mapper::{DataSource, InterfaceDescriptor, MapperConfig, Record, SessionFactory};
    ///
    /// # fn main() -> rust_mapper::Result<()> {
    /// let factory = SessionFactory::build(MapperConfig::new(DataSource::Memory))?;
    /// let mut session = factory.open_session()?;
    /// let proxy = session.bind_proxy(&InterfaceDescriptor::new("emp.Mapper"))?;
    /// session.close();
    /// let _: Option<Record> = proxy.invoke("getEmpById", 1)?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn close(&mut self) {
        if let Some(conn) = self.connection.take() {
            release(conn);
        }
    }

    fn connection(&self, target: &str) -> Result<&Connection> {
        self.connection
            .as_ref()
            .ok_or_else(|| Error::SessionClosed(target.to_string()))
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}

fn release(conn: Connection) {
    match conn.close() {
        Ok(()) => debug!("session closed"),
        Err((_, err)) => warn!(error = %err, "failed to close session connection"),
    }
}
