//! Mapper proxies: interfaces bound to statements by naming convention.
//!
//! An interface is described by its qualified name and its method names. At
//! bind time every method `m` of interface `I` is resolved to the statement
//! `I.m`, producing a dispatch table; a method without a statement fails the
//! bind. Invoking a method then runs [`Session::select_one`] with the
//! statement from the table.
//!
//! Typed mappers are declared with [`mapper!`](crate::mapper), which generates
//! one Rust method per statement on top of a [`Proxy`].

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Error, Result};
use crate::record::FromRow;
use crate::session::Session;
use crate::sqlite::Parameter;
use crate::statement::StatementId;

/// The shape of a mapper interface: qualified name and method names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceDescriptor {
    qualified_name: String,
    methods: Vec<String>,
}

impl InterfaceDescriptor {
    pub fn new(qualified_name: impl Into<String>) -> Self {
        Self {
            qualified_name: qualified_name.into(),
            methods: Vec::new(),
        }
    }

    /// Declare a method; declaring the same name twice has no effect
    pub fn with_method(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.methods.contains(&name) {
            self.methods.push(name);
        }
        self
    }

    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    pub fn methods(&self) -> &[String] {
        &self.methods
    }
}

/// An interface bound to a session: method name -> statement id.
pub struct Proxy<'s> {
    session: &'s Session,
    interface: String,
    dispatch: BTreeMap<String, StatementId>,
}

impl<'s> Proxy<'s> {
    pub(crate) fn bind(session: &'s Session, descriptor: &InterfaceDescriptor) -> Result<Self> {
        let configuration = session.configuration();
        let mut dispatch = BTreeMap::new();

        for method in descriptor.methods() {
            let unbound = || Error::UnboundMethod {
                interface: descriptor.qualified_name().to_string(),
                method: method.clone(),
                statement: format!("{}.{}", descriptor.qualified_name(), method),
            };
            let statement =
                StatementId::new(descriptor.qualified_name(), method).map_err(|_| unbound())?;
            if !configuration.contains(statement.as_str()) {
                return Err(unbound());
            }
            dispatch.insert(method.clone(), statement);
        }

        Ok(Self {
            session,
            interface: descriptor.qualified_name().to_string(),
            dispatch,
        })
    }

    /// Run the statement bound to `method`.
    pub fn invoke<T: FromRow>(
        &self,
        method: &str,
        parameter: impl Into<Parameter>,
    ) -> Result<Option<T>> {
        let statement = self
            .dispatch
            .get(method)
            .ok_or_else(|| Error::UnboundMethod {
                interface: self.interface.clone(),
                method: method.to_string(),
                statement: format!("{}.{}", self.interface, method),
            })?;
        self.session.select_one(statement.as_str(), parameter)
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }

    pub fn statement_id(&self, method: &str) -> Option<&StatementId> {
        self.dispatch.get(method)
    }

    /// Bound methods with their statements, ordered by method name.
    pub fn bindings(&self) -> impl Iterator<Item = (&str, &StatementId)> {
        self.dispatch
            .iter()
            .map(|(method, statement)| (method.as_str(), statement))
    }
}

impl fmt::Debug for Proxy<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Proxy")
            .field("interface", &self.interface)
            .field("dispatch", &self.dispatch)
            .finish_non_exhaustive()
    }
}

/// A typed mapper built on a [`Proxy`]; implemented by [`mapper!`](crate::mapper).
pub trait Mapper<'s>: Sized {
    /// Qualified interface name, the namespace of its statements.
    const INTERFACE: &'static str;
    /// Method names as they appear in statement ids.
    const METHODS: &'static [&'static str];

    fn from_proxy(proxy: Proxy<'s>) -> Self;

    fn proxy(&self) -> &Proxy<'s>;

    fn descriptor() -> InterfaceDescriptor {
        Self::METHODS
            .iter()
            .fold(InterfaceDescriptor::new(Self::INTERFACE), |descriptor, method| {
                descriptor.with_method(*method)
            })
    }
}

/// Declare a typed mapper interface.
///
/// Each `fn` line names the Rust method, the statement operation it maps to,
/// an optional single parameter and the row type it decodes into. The
/// generated struct borrows the session it was bound on.
///
/// ```no_run
/// use rust_mapper::{mapper, Record};
///
/// mapper! {
///     /// Employee lookups.
///     pub struct EmployeeMapper => "com.example.EmployeeMapper" {
///         fn get_emp_by_id = "getEmpById" (id: i64) -> Record;
///         fn first_emp = "firstEmp" () -> Record;
///     }
/// }
/// ```
#[macro_export]
macro_rules! mapper {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident => $interface:literal {
            $(
                $(#[$fn_meta:meta])*
                fn $method:ident = $operation:literal ( $($arg:ident : $arg_ty:ty)? ) -> $ret:ty;
            )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug)]
        $vis struct $name<'s> {
            proxy: $crate::Proxy<'s>,
        }

        impl<'s> $crate::Mapper<'s> for $name<'s> {
            const INTERFACE: &'static str = $interface;
            const METHODS: &'static [&'static str] = &[$($operation),*];

            fn from_proxy(proxy: $crate::Proxy<'s>) -> Self {
                Self { proxy }
            }

            fn proxy(&self) -> &$crate::Proxy<'s> {
                &self.proxy
            }
        }

        impl<'s> $name<'s> {
            $(
                $(#[$fn_meta])*
                pub fn $method(&self $(, $arg: $arg_ty)?) -> $crate::Result<::std::option::Option<$ret>> {
                    self.proxy.invoke($operation, $crate::Parameter::from(($($arg)?)))
                }
            )*
        }
    };
}
