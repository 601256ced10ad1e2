//! crudkit - dynamic, parameterized CRUD against a single relational table
//!
//! A [`Table`] wraps one database session and a table name. Filters and row
//! data are runtime column → value mappings; values are always bound as
//! parameters and identifiers are always quoted.

pub mod builder;
pub mod error;
pub mod executor;
pub mod fields;
pub mod frame;
pub mod ident;
pub mod table;
pub mod value;

// Re-export main types
pub use builder::{Dialect, IntoColumns, Projection, QueryBuilder, Statement};
pub use error::{Error, Result};
pub use executor::Connection;
pub use fields::{Fields, Filter, RowData};
pub use frame::{Frame, Row};
pub use ident::Ident;
pub use table::{Commit, Fetch, Table};
pub use value::Value;

#[cfg(feature = "postgres")]
pub use executor::postgres::PgSession;
#[cfg(feature = "sqlite")]
pub use executor::sqlite::SqliteSession;

/// Create a table accessor on `conn`
pub fn table<C: Connection>(conn: C, name: &str) -> Result<Table<C>> {
    Table::new(conn, name)
}
