// Tests for mapper proxies and the mapper! macro
//
// Interfaces are bound to statements named `<interface>.<method>`. Binding
// fails as soon as one method has no statement; no query runs until a method
// is invoked.

use anyhow::Result;
use rust_mapper::{
    mapper, DataSource, Error, FromRow, InterfaceDescriptor, Mapper, MapperConfig, MapperFile,
    Params, Record, SessionFactory, Value,
};

#[derive(Debug, Clone, PartialEq)]
struct Employee {
    id: i64,
    last_name: String,
    email: String,
}

impl FromRow for Employee {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Employee {
            id: row.get(0)?,
            last_name: row.get(1)?,
            email: row.get(2)?,
        })
    }
}

const INTERFACE: &str = "com.example.mapper.EmployeeMapper";

mapper! {
    /// Employee lookups bound to `com.example.mapper.EmployeeMapper`.
    pub struct EmployeeMapper => "com.example.mapper.EmployeeMapper" {
        fn get_emp_by_id = "getEmpById" (id: i64) -> Employee;
        fn get_emp_by_email = "getEmpByEmail" (params: Params) -> Employee;
        /// Lowest id first.
        fn first_emp = "firstEmp" () -> Record;
    }
}

mapper! {
    struct IncompleteMapper => "com.example.mapper.EmployeeMapper" {
        fn get_emp_by_id = "getEmpById" (id: i64) -> Employee;
        fn delete_emp = "deleteEmp" (id: i64) -> Record;
    }
}

fn create_test_factory() -> Result<SessionFactory> {
    let config = MapperConfig::new(DataSource::Memory)
        .with_schema(
            r#"
            CREATE TABLE tbl_employee (
                id INTEGER PRIMARY KEY,
                last_name TEXT NOT NULL,
                email TEXT NOT NULL
            );
            INSERT INTO tbl_employee VALUES (1, 'tom', 'tom@example.com');
            INSERT INTO tbl_employee VALUES (2, 'jerry', 'jerry@example.com');
            "#,
        )
        .add_mapper(
            MapperFile::new(INTERFACE)
                .with_statement(
                    "getEmpById",
                    "SELECT id, last_name, email FROM tbl_employee WHERE id = ?1",
                )
                .with_statement(
                    "getEmpByEmail",
                    "SELECT id, last_name, email FROM tbl_employee WHERE email = :email",
                )
                .with_statement(
                    "firstEmp",
                    "SELECT id, last_name FROM tbl_employee ORDER BY id LIMIT 1",
                ),
        )
        .add_mapper(
            MapperFile::new("emp.Broken")
                .with_statement("lookup", "SELECT * FROM missing WHERE id = ?1"),
        );
    Ok(SessionFactory::build(config)?)
}

#[test]
fn test_bind_fails_fast_on_unbound_method() -> Result<()> {
    let factory = create_test_factory()?;
    let session = factory.open_session()?;

    let descriptor = InterfaceDescriptor::new("emp.Mapper").with_method("getEmpById");
    let err = session.bind_proxy(&descriptor).unwrap_err();

    match err {
        Error::UnboundMethod {
            interface,
            method,
            statement,
        } => {
            assert_eq!(interface, "emp.Mapper");
            assert_eq!(method, "getEmpById");
            assert_eq!(statement, "emp.Mapper.getEmpById");
        }
        other => panic!("expected UnboundMethod, got {other:?}"),
    }
    Ok(())
}

#[test]
fn test_empty_method_name_is_unbound() -> Result<()> {
    let factory = create_test_factory()?;
    let session = factory.open_session()?;

    let descriptor = InterfaceDescriptor::new(INTERFACE).with_method("");
    let err = session.bind_proxy(&descriptor).unwrap_err();

    match err {
        Error::UnboundMethod {
            interface, method, ..
        } => {
            assert_eq!(interface, INTERFACE);
            assert!(method.is_empty());
        }
        other => panic!("expected UnboundMethod, got {other:?}"),
    }
    Ok(())
}

#[test]
fn test_proxy_forwards_to_statement() -> Result<()> {
    let factory = create_test_factory()?;
    let session = factory.open_session()?;

    let descriptor = InterfaceDescriptor::new(INTERFACE).with_method("getEmpById");
    let proxy = session.bind_proxy(&descriptor)?;

    assert_eq!(proxy.interface(), INTERFACE);
    assert_eq!(
        proxy.statement_id("getEmpById").map(|id| id.as_str()),
        Some("com.example.mapper.EmployeeMapper.getEmpById")
    );

    let tom: Option<Record> = proxy.invoke("getEmpById", 1)?;
    assert_eq!(tom.and_then(|r| r.get("last_name").cloned()), Some(Value::from("tom")));

    let nobody: Option<Record> = proxy.invoke("getEmpById", 999)?;
    assert!(nobody.is_none());
    Ok(())
}

#[test]
fn test_invoking_undeclared_method_is_unbound() -> Result<()> {
    let factory = create_test_factory()?;
    let session = factory.open_session()?;

    // firstEmp is registered but not part of this descriptor.
    let descriptor = InterfaceDescriptor::new(INTERFACE).with_method("getEmpById");
    let proxy = session.bind_proxy(&descriptor)?;

    let err = proxy.invoke::<Record>("firstEmp", ()).unwrap_err();
    assert!(matches!(err, Error::UnboundMethod { ref method, .. } if method == "firstEmp"));
    Ok(())
}

#[test]
fn test_bind_proxy_is_idempotent() -> Result<()> {
    let factory = create_test_factory()?;
    let session = factory.open_session()?;
    let descriptor = InterfaceDescriptor::new(INTERFACE)
        .with_method("getEmpById")
        .with_method("firstEmp");

    let first = session.bind_proxy(&descriptor)?;
    let second = session.bind_proxy(&descriptor)?;

    let first_bindings: Vec<_> = first.bindings().collect();
    let second_bindings: Vec<_> = second.bindings().collect();
    assert_eq!(first_bindings, second_bindings);

    let a: Option<Record> = first.invoke("getEmpById", 2)?;
    let b: Option<Record> = second.invoke("getEmpById", 2)?;
    assert_eq!(a, b);
    assert!(a.is_some());
    Ok(())
}

#[test]
fn test_bind_issues_no_query() -> Result<()> {
    let factory = create_test_factory()?;
    let session = factory.open_session()?;

    // The statement's table does not exist; binding still succeeds.
    let descriptor = InterfaceDescriptor::new("emp.Broken").with_method("lookup");
    let proxy = session.bind_proxy(&descriptor)?;

    let err = proxy.invoke::<Record>("lookup", 1).unwrap_err();
    assert!(matches!(
        err,
        Error::BackingStore { ref statement, .. } if statement == "emp.Broken.lookup"
    ));
    Ok(())
}

#[test]
fn test_bind_after_close_is_rejected() -> Result<()> {
    let factory = create_test_factory()?;
    let mut session = factory.open_session()?;
    session.close();

    let descriptor = InterfaceDescriptor::new(INTERFACE).with_method("getEmpById");
    let err = session.bind_proxy(&descriptor).unwrap_err();
    assert!(matches!(err, Error::SessionClosed(ref target) if target == INTERFACE));

    let err = session.get_mapper::<EmployeeMapper>().unwrap_err();
    assert!(matches!(err, Error::SessionClosed(_)));
    Ok(())
}

#[test]
fn test_typed_mapper_methods() -> Result<()> {
    let factory = create_test_factory()?;
    let session = factory.open_session()?;

    let mapper = session.get_mapper::<EmployeeMapper>()?;

    let tom = mapper.get_emp_by_id(1)?;
    assert_eq!(
        tom,
        Some(Employee {
            id: 1,
            last_name: "tom".to_string(),
            email: "tom@example.com".to_string(),
        })
    );
    assert_eq!(mapper.get_emp_by_id(999)?, None);

    let jerry = mapper.get_emp_by_email(Params::new().with_value("email", "jerry@example.com"))?;
    assert_eq!(jerry.map(|e| e.id), Some(2));

    let first = mapper.first_emp()?;
    assert_eq!(first.and_then(|r| r.id().cloned()), Some(Value::Integer(1)));
    Ok(())
}

#[test]
fn test_typed_mapper_descriptor_and_bind_failure() -> Result<()> {
    assert_eq!(EmployeeMapper::INTERFACE, INTERFACE);
    let descriptor = EmployeeMapper::descriptor();
    assert_eq!(descriptor.methods(), ["getEmpById", "getEmpByEmail", "firstEmp"]);

    let factory = create_test_factory()?;
    let session = factory.open_session()?;

    let mapper = session.get_mapper::<EmployeeMapper>()?;
    assert_eq!(mapper.proxy().bindings().count(), 3);

    let err = session.get_mapper::<IncompleteMapper>().unwrap_err();
    assert!(matches!(
        err,
        Error::UnboundMethod { ref statement, .. }
            if statement == "com.example.mapper.EmployeeMapper.deleteEmp"
    ));
    Ok(())
}
