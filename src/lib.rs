//! Statement mapping and mapper proxies over SQLite for the Runar ecosystem.
//!
//! # Intention
//!
//! - Run a declared statement by its id (`<namespace>.<operation>`) and map
//!   the single resulting row into a typed value.
//! - Bind mapper interfaces to statements by naming convention, failing at
//!   bind time when a method has no statement behind it.
//!
//! # Architectural Boundaries
//!
//! - Only statement resolution, execution and row decoding belong here.
//! - No pooling, transactions, migrations or query building.
//!
//! ```no_run
//! use rust_mapper::{DataSource, MapperConfig, MapperFile, Record, SessionFactory};
//!
//! # fn main() -> rust_mapper::Result<()> {
//! let config = MapperConfig::new(DataSource::file("app.db")).add_mapper(
//!     MapperFile::new("com.example.EmployeeMapper")
//!         .with_statement("getEmpById", "SELECT id, name FROM employee WHERE id = ?1"),
//! );
//! let factory = SessionFactory::build(config)?;
//! let session = factory.open_session()?;
//! let employee: Option<Record> =
//!     session.select_one("com.example.EmployeeMapper.getEmpById", 1)?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod proxy;
pub mod record;
pub mod session;
pub mod sqlite;
pub mod statement;

pub use config::{Configuration, DataSource, MapperConfig, MapperFile, StatementConfig};
pub use error::{Error, Result};
pub use proxy::{InterfaceDescriptor, Mapper, Proxy};
pub use record::{FromRow, Record};
pub use session::{Session, SessionFactory};
pub use sqlite::{Parameter, Params, Value};
pub use statement::{MappedStatement, StatementId};
