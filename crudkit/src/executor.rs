//! Connection interface and sqlx-backed sessions

use crate::builder::Dialect;
use crate::frame::Row;
use crate::{Result, Value};
use std::future::Future;

/// A database connection the table accessor issues statements on.
///
/// Implementations open a transaction implicitly before the first statement
/// and keep it open until [`Connection::commit`] or [`Connection::rollback`].
pub trait Connection: Send {
    /// Placeholder syntax statements are rendered with
    const DIALECT: Dialect;

    /// Execute a statement that returns no rows (INSERT, UPDATE, DELETE)
    fn execute(
        &mut self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Result<u64>> + Send;

    /// Execute a query that returns multiple rows
    fn fetch_all(
        &mut self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Result<Vec<Row>>> + Send;

    /// Execute a query and return its first row, if any
    fn fetch_optional(
        &mut self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Result<Option<Row>>> + Send;

    /// Commit the open transaction, if any
    fn commit(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Roll back the open transaction, if any
    fn rollback(&mut self) -> impl Future<Output = Result<()>> + Send;
}

/// Several accessors can take turns on one session by each holding `&mut`
impl<C: Connection> Connection for &mut C {
    const DIALECT: Dialect = C::DIALECT;

    fn execute(
        &mut self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Result<u64>> + Send {
        (**self).execute(sql, params)
    }

    fn fetch_all(
        &mut self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Result<Vec<Row>>> + Send {
        (**self).fetch_all(sql, params)
    }

    fn fetch_optional(
        &mut self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Result<Option<Row>>> + Send {
        (**self).fetch_optional(sql, params)
    }

    fn commit(&mut self) -> impl Future<Output = Result<()>> + Send {
        (**self).commit()
    }

    fn rollback(&mut self) -> impl Future<Output = Result<()>> + Send {
        (**self).rollback()
    }
}

/// PostgreSQL session
#[cfg(feature = "postgres")]
pub mod postgres {
    use super::*;
    use crate::Error;
    use sqlx::encode::IsNull;
    use sqlx::postgres::types::Oid;
    use sqlx::postgres::{PgArgumentBuffer, PgArguments, PgConnection, PgRow, PgTypeInfo};
    use sqlx::query::Query;
    use sqlx::{Column, Connection as _, Postgres, Row as _, TypeInfo, ValueRef};

    /// A single PostgreSQL connection with implicit transactions
    pub struct PgSession {
        conn: PgConnection,
        in_transaction: bool,
    }

    impl PgSession {
        /// Connect from a `postgres://` URL
        pub async fn connect(database_url: &str) -> Result<Self> {
            let conn = PgConnection::connect(database_url).await?;
            Ok(Self::from_connection(conn))
        }

        /// Connect using the `DATABASE_URL` environment variable
        pub async fn connect_env() -> Result<Self> {
            let url = std::env::var("DATABASE_URL")
                .map_err(|_| Error::configuration("DATABASE_URL is not set"))?;
            Self::connect(&url).await
        }

        /// Wrap an existing connection that has no open transaction
        pub fn from_connection(conn: PgConnection) -> Self {
            Self {
                conn,
                in_transaction: false,
            }
        }

        pub fn in_transaction(&self) -> bool {
            self.in_transaction
        }

        /// Run a statement outside the crudkit builders, inside the open transaction
        pub async fn execute_raw(&mut self, sql: &str) -> Result<u64> {
            Connection::execute(self, sql, &[]).await
        }

        /// Roll back anything uncommitted and close the connection
        pub async fn close(mut self) -> Result<()> {
            Connection::rollback(&mut self).await?;
            self.conn.close().await?;
            Ok(())
        }

        async fn begin_if_idle(&mut self) -> Result<()> {
            if !self.in_transaction {
                sqlx::query("BEGIN").execute(&mut self.conn).await?;
                self.in_transaction = true;
            }
            Ok(())
        }
    }

    impl Connection for PgSession {
        const DIALECT: Dialect = Dialect::Postgres;

        async fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64> {
            self.begin_if_idle().await?;
            let result = bind_values(sqlx::query(sql), params)
                .execute(&mut self.conn)
                .await?;
            Ok(result.rows_affected())
        }

        async fn fetch_all(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
            self.begin_if_idle().await?;
            let rows = bind_values(sqlx::query(sql), params)
                .fetch_all(&mut self.conn)
                .await?;
            rows.iter().map(decode_row).collect()
        }

        async fn fetch_optional(&mut self, sql: &str, params: &[Value]) -> Result<Option<Row>> {
            self.begin_if_idle().await?;
            let row = bind_values(sqlx::query(sql), params)
                .fetch_optional(&mut self.conn)
                .await?;
            row.as_ref().map(decode_row).transpose()
        }

        async fn commit(&mut self) -> Result<()> {
            if self.in_transaction {
                // a failed COMMIT still ends the transaction
                self.in_transaction = false;
                sqlx::query("COMMIT").execute(&mut self.conn).await?;
            }
            Ok(())
        }

        async fn rollback(&mut self) -> Result<()> {
            if self.in_transaction {
                self.in_transaction = false;
                sqlx::query("ROLLBACK").execute(&mut self.conn).await?;
            }
            Ok(())
        }
    }

    /// A NULL parameter declared with type oid 0, which leaves the server to
    /// infer the type from context as it does for an untyped literal NULL
    struct UntypedNull;

    impl sqlx::Type<Postgres> for UntypedNull {
        fn type_info() -> PgTypeInfo {
            PgTypeInfo::with_oid(Oid(0))
        }
    }

    impl<'q> sqlx::Encode<'q, Postgres> for UntypedNull {
        fn encode_by_ref(&self, _buf: &mut PgArgumentBuffer) -> IsNull {
            IsNull::Yes
        }
    }

    /// Bind crudkit Values to a SQLx query
    fn bind_values<'q>(
        mut query: Query<'q, Postgres, PgArguments>,
        params: &'q [Value],
    ) -> Query<'q, Postgres, PgArguments> {
        for param in params {
            query = match param {
                Value::Null => query.bind(UntypedNull),
                Value::Bool(b) => query.bind(*b),
                Value::I32(i) => query.bind(*i),
                Value::I64(i) => query.bind(*i),
                Value::F32(f) => query.bind(*f),
                Value::F64(f) => query.bind(*f),
                Value::String(s) => query.bind(s.as_str()),
                Value::Bytes(b) => query.bind(b.as_slice()),
                Value::Json(j) => query.bind(j.clone()),
                #[cfg(feature = "uuid-support")]
                Value::Uuid(u) => query.bind(*u),
                #[cfg(feature = "datetime-support")]
                Value::Timestamp(t) => query.bind(*t),
                #[cfg(feature = "datetime-support")]
                Value::TimestampTz(t) => query.bind(*t),
                #[cfg(feature = "decimal-support")]
                Value::Decimal(d) => query.bind(*d),
            };
        }
        query
    }

    fn decode_row(row: &PgRow) -> Result<Row> {
        (0..row.len()).map(|index| decode_cell(row, index)).collect()
    }

    fn decode_cell(row: &PgRow, index: usize) -> Result<Value> {
        let raw = row.try_get_raw(index)?;
        if raw.is_null() {
            return Ok(Value::Null);
        }
        let type_name = raw.type_info().name().to_string();

        let value = match type_name.as_str() {
            "BOOL" => Value::Bool(cell(row, index)?),
            "INT2" => Value::I32(i32::from(cell::<i16>(row, index)?)),
            "INT4" => Value::I32(cell(row, index)?),
            "INT8" => Value::I64(cell(row, index)?),
            "FLOAT4" => Value::F32(cell(row, index)?),
            "FLOAT8" => Value::F64(cell(row, index)?),
            "TEXT" | "VARCHAR" | "CHAR" | "BPCHAR" | "NAME" | "CITEXT" | "UNKNOWN" => {
                Value::String(cell(row, index)?)
            }
            "BYTEA" => Value::Bytes(cell(row, index)?),
            "JSON" | "JSONB" => Value::Json(cell(row, index)?),
            #[cfg(feature = "uuid-support")]
            "UUID" => Value::Uuid(cell(row, index)?),
            #[cfg(feature = "datetime-support")]
            "TIMESTAMP" => Value::Timestamp(cell(row, index)?),
            #[cfg(feature = "datetime-support")]
            "TIMESTAMPTZ" => Value::TimestampTz(cell(row, index)?),
            #[cfg(feature = "decimal-support")]
            "NUMERIC" => Value::Decimal(cell(row, index)?),
            other => return Err(Error::unsupported_type(column_name(row, index), other)),
        };
        Ok(value)
    }

    fn cell<'r, T>(row: &'r PgRow, index: usize) -> Result<T>
    where
        T: sqlx::Decode<'r, Postgres>,
    {
        row.try_get_unchecked(index)
            .map_err(|e| Error::decode(column_name(row, index), e.to_string()))
    }

    fn column_name(row: &PgRow, index: usize) -> String {
        row.columns()
            .get(index)
            .map(|c| c.name().to_string())
            .unwrap_or_else(|| index.to_string())
    }

}

/// SQLite session
#[cfg(feature = "sqlite")]
pub mod sqlite {
    use super::*;
    use crate::Error;
    use sqlx::query::Query;
    use sqlx::sqlite::{SqliteArguments, SqliteConnection, SqliteRow};
    use sqlx::{Column, Connection as _, Row as _, Sqlite, TypeInfo, ValueRef};

    /// A single SQLite connection with implicit transactions
    pub struct SqliteSession {
        conn: SqliteConnection,
        in_transaction: bool,
    }

    impl SqliteSession {
        /// Connect from a `sqlite:` URL
        pub async fn connect(database_url: &str) -> Result<Self> {
            let conn = SqliteConnection::connect(database_url).await?;
            Ok(Self::from_connection(conn))
        }

        /// A private in-memory database
        pub async fn in_memory() -> Result<Self> {
            Self::connect("sqlite::memory:").await
        }

        /// Wrap an existing connection that has no open transaction
        pub fn from_connection(conn: SqliteConnection) -> Self {
            Self {
                conn,
                in_transaction: false,
            }
        }

        pub fn in_transaction(&self) -> bool {
            self.in_transaction
        }

        /// Run a statement outside the crudkit builders, e.g. schema setup.
        /// It joins the open transaction like any other statement.
        pub async fn execute_raw(&mut self, sql: &str) -> Result<u64> {
            Connection::execute(self, sql, &[]).await
        }

        /// Roll back anything uncommitted and close the connection
        pub async fn close(mut self) -> Result<()> {
            Connection::rollback(&mut self).await?;
            self.conn.close().await?;
            Ok(())
        }

        async fn begin_if_idle(&mut self) -> Result<()> {
            if !self.in_transaction {
                sqlx::query("BEGIN").execute(&mut self.conn).await?;
                self.in_transaction = true;
            }
            Ok(())
        }
    }

    impl Connection for SqliteSession {
        const DIALECT: Dialect = Dialect::Sqlite;

        async fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64> {
            self.begin_if_idle().await?;
            let result = bind_values(sqlx::query(sql), params)
                .execute(&mut self.conn)
                .await?;
            Ok(result.rows_affected())
        }

        async fn fetch_all(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
            self.begin_if_idle().await?;
            let rows = bind_values(sqlx::query(sql), params)
                .fetch_all(&mut self.conn)
                .await?;
            rows.iter().map(decode_row).collect()
        }

        async fn fetch_optional(&mut self, sql: &str, params: &[Value]) -> Result<Option<Row>> {
            self.begin_if_idle().await?;
            let row = bind_values(sqlx::query(sql), params)
                .fetch_optional(&mut self.conn)
                .await?;
            row.as_ref().map(decode_row).transpose()
        }

        async fn commit(&mut self) -> Result<()> {
            if self.in_transaction {
                self.in_transaction = false;
                sqlx::query("COMMIT").execute(&mut self.conn).await?;
            }
            Ok(())
        }

        async fn rollback(&mut self) -> Result<()> {
            if self.in_transaction {
                self.in_transaction = false;
                sqlx::query("ROLLBACK").execute(&mut self.conn).await?;
            }
            Ok(())
        }
    }

    // SQLite stores values dynamically; types it has no storage class for are
    // bound as text.
    fn bind_values<'q>(
        mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
        params: &'q [Value],
    ) -> Query<'q, Sqlite, SqliteArguments<'q>> {
        for param in params {
            query = match param {
                Value::Null => query.bind(None::<String>),
                Value::Bool(b) => query.bind(*b),
                Value::I32(i) => query.bind(*i),
                Value::I64(i) => query.bind(*i),
                Value::F32(f) => query.bind(f64::from(*f)),
                Value::F64(f) => query.bind(*f),
                Value::String(s) => query.bind(s.as_str()),
                Value::Bytes(b) => query.bind(b.as_slice()),
                Value::Json(j) => query.bind(j.to_string()),
                #[cfg(feature = "uuid-support")]
                Value::Uuid(u) => query.bind(u.to_string()),
                #[cfg(feature = "datetime-support")]
                Value::Timestamp(t) => query.bind(t.to_string()),
                #[cfg(feature = "datetime-support")]
                Value::TimestampTz(t) => query.bind(t.to_rfc3339()),
                #[cfg(feature = "decimal-support")]
                Value::Decimal(d) => query.bind(d.to_string()),
            };
        }
        query
    }

    fn decode_row(row: &SqliteRow) -> Result<Row> {
        (0..row.len()).map(|index| decode_cell(row, index)).collect()
    }

    fn decode_cell(row: &SqliteRow, index: usize) -> Result<Value> {
        let raw = row.try_get_raw(index)?;
        if raw.is_null() {
            return Ok(Value::Null);
        }
        let type_name = raw.type_info().name().to_string();

        let value = match type_name.as_str() {
            "BOOLEAN" => Value::Bool(cell(row, index)?),
            "INTEGER" => Value::I64(cell(row, index)?),
            "REAL" => Value::F64(cell(row, index)?),
            "TEXT" | "DATE" | "TIME" | "DATETIME" => Value::String(cell(row, index)?),
            "BLOB" => Value::Bytes(cell(row, index)?),
            other => return Err(Error::unsupported_type(column_name(row, index), other)),
        };
        Ok(value)
    }

    fn cell<'r, T>(row: &'r SqliteRow, index: usize) -> Result<T>
    where
        T: sqlx::Decode<'r, Sqlite>,
    {
        row.try_get_unchecked(index)
            .map_err(|e| Error::decode(column_name(row, index), e.to_string()))
    }

    fn column_name(row: &SqliteRow, index: usize) -> String {
        row.columns()
            .get(index)
            .map(|c| c.name().to_string())
            .unwrap_or_else(|| index.to_string())
    }

}
