//! The table accessor: dynamic CRUD against one table.
//!
//! Every public operation funnels its outcome through [`Table::guard`], which
//! rolls the connection back before handing an error to the caller. A failed
//! operation therefore never leaves a half-applied transaction open.

use crate::builder::{
    DeleteStatement, InsertStatement, IntoColumns, Projection, QueryBuilder, SelectStatement,
    Statement, UpdateStatement,
};
use crate::executor::Connection;
use crate::fields::{Fields, Filter, RowData};
use crate::frame::Frame;
use crate::ident::Ident;
use crate::{Error, Result, Value};

/// Rows per statement for [`Table::insert_bulk`] unless configured otherwise
pub const DEFAULT_BULK_PAGE_SIZE: usize = 100;

/// Whether a mutation commits right away
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Commit {
    /// Commit after the statement succeeds
    #[default]
    Immediate,
    /// Leave the transaction open for further operations; the caller commits
    Deferred,
}

/// How many rows a select retrieves
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Fetch {
    #[default]
    All,
    /// At most one row
    One,
}

/// Dynamic CRUD access to a single table.
///
/// # Examples
/// ```no_run
/// use crudkit::{Commit, Fetch, Fields, Projection, Table};
/// use crudkit::executor::sqlite::SqliteSession;
///
/// # async fn demo() -> crudkit::Result<()> {
/// let mut session = SqliteSession::connect("sqlite://app.db").await?;
/// let mut users = Table::new(&mut session, "users")?.with_columns(["id", "name"]);
///
/// users.insert(Fields::new().with("name", "Ann"), Commit::Immediate).await?;
/// let id = users.get_id(Fields::new().with("name", "Ann")).await?;
/// let everyone = users.select(Projection::All, Fields::new(), Fetch::All).await?;
/// # let _ = (id, everyone);
/// # Ok(())
/// # }
/// ```
pub struct Table<C: Connection> {
    conn: C,
    name: Ident,
    columns: Option<Vec<String>>,
    bulk_page_size: usize,
}

impl<C: Connection> Table<C> {
    /// Create an accessor for `name` on `conn`
    pub fn new(conn: C, name: &str) -> Result<Self> {
        Ok(Self {
            conn,
            name: Ident::new(name)?,
            columns: None,
            bulk_page_size: DEFAULT_BULK_PAGE_SIZE,
        })
    }

    /// Known column list, used to label `SELECT *` results
    pub fn with_columns<T: IntoColumns>(mut self, columns: T) -> Self {
        self.columns = Some(columns.into_columns());
        self
    }

    /// Qualify the table with a schema
    pub fn in_schema(mut self, schema: &str) -> Result<Self> {
        self.name = Ident::qualified(schema, self.name.name())?;
        Ok(self)
    }

    /// Rows per bulk-insert statement; values below one are treated as one
    pub fn with_bulk_page_size(mut self, rows: usize) -> Self {
        self.bulk_page_size = rows.max(1);
        self
    }

    pub fn name(&self) -> &Ident {
        &self.name
    }

    pub fn columns(&self) -> Option<&[String]> {
        self.columns.as_deref()
    }

    pub fn connection(&mut self) -> &mut C {
        &mut self.conn
    }

    pub fn into_connection(self) -> C {
        self.conn
    }

    /// `SELECT <projection> FROM <table> [WHERE ...]`.
    ///
    /// Rows are labeled with the explicit projection, else the configured
    /// columns, else left unlabeled.
    pub async fn select(
        &mut self,
        projection: impl Into<Projection>,
        filter: impl Into<Filter>,
        fetch: Fetch,
    ) -> Result<Frame> {
        let outcome = self
            .run_select(projection.into(), filter.into(), fetch)
            .await;
        self.guard(outcome).await
    }

    /// The `id` of the first row matching `filter`.
    ///
    /// Fails with [`Error::EmptyResult`] when nothing matches.
    pub async fn get_id(&mut self, filter: impl Into<Filter>) -> Result<Value> {
        let outcome = self.run_get_id(filter.into()).await;
        self.guard(outcome).await
    }

    /// `SELECT COUNT(*) FROM <table> [WHERE ...]`
    pub async fn count(&mut self, filter: impl Into<Filter>) -> Result<i64> {
        let outcome = self.run_count(filter.into()).await;
        self.guard(outcome).await
    }

    /// Insert one row. Returns the number of rows inserted.
    pub async fn insert(&mut self, data: impl Into<RowData>, commit: Commit) -> Result<u64> {
        let statement = InsertStatement::values(self.name.clone(), data.into());
        let outcome = self.run_mutation(statement.build(C::DIALECT), commit).await;
        self.guard(outcome).await
    }

    /// Insert every row of a labeled frame using multi-row VALUES lists, one
    /// statement per page. All pages share one transaction.
    pub async fn insert_bulk(&mut self, rows: &Frame, commit: Commit) -> Result<u64> {
        let outcome = self.run_insert_bulk(rows, commit).await;
        self.guard(outcome).await
    }

    /// `UPDATE <table> SET ... [WHERE ...]`. An empty filter updates every row.
    pub async fn update(
        &mut self,
        data: impl Into<RowData>,
        filter: impl Into<Filter>,
        commit: Commit,
    ) -> Result<u64> {
        let statement = UpdateStatement::new(self.name.clone())
            .set(data.into())
            .filter(filter.into());
        let outcome = self.run_mutation(statement.build(C::DIALECT), commit).await;
        self.guard(outcome).await
    }

    /// `DELETE FROM <table> [WHERE ...]`. An empty filter deletes every row.
    pub async fn delete(&mut self, filter: impl Into<Filter>, commit: Commit) -> Result<u64> {
        let statement = DeleteStatement::new(self.name.clone()).filter(filter.into());
        let outcome = self.run_mutation(statement.build(C::DIALECT), commit).await;
        self.guard(outcome).await
    }

    /// Commit work left open by [`Commit::Deferred`] operations
    pub async fn commit(&mut self) -> Result<()> {
        let outcome = self.conn.commit().await;
        if outcome.is_ok() {
            tracing::debug!(target: "crudkit::sql", table = %self.name, "committed");
        }
        self.guard(outcome).await
    }

    /// Discard work left open by [`Commit::Deferred`] operations
    pub async fn rollback(&mut self) -> Result<()> {
        self.conn.rollback().await
    }

    async fn run_select(
        &mut self,
        projection: Projection,
        filter: Fields,
        fetch: Fetch,
    ) -> Result<Frame> {
        let labels = projection
            .labels()
            .map(<[String]>::to_vec)
            .or_else(|| self.columns.clone());
        let statement = SelectStatement::new(self.name.clone())
            .columns(projection)
            .filter(filter)
            .build(C::DIALECT)?;

        self.trace(&statement);
        let rows = match fetch {
            Fetch::One => self
                .conn
                .fetch_optional(&statement.sql, &statement.params)
                .await?
                .into_iter()
                .collect(),
            Fetch::All => self.conn.fetch_all(&statement.sql, &statement.params).await?,
        };

        Frame::with_labels(labels, rows)
    }

    async fn run_get_id(&mut self, filter: Fields) -> Result<Value> {
        let frame = self.run_select(Projection::from(["id"]), filter, Fetch::One).await?;
        if frame.is_empty() {
            return Err(Error::empty_result(format!(
                "no row in {} matches the filter",
                self.name
            )));
        }
        frame.value(0, "id").cloned()
    }

    async fn run_count(&mut self, filter: Fields) -> Result<i64> {
        let statement = SelectStatement::count(self.name.clone())
            .filter(filter)
            .build(C::DIALECT)?;

        self.trace(&statement);
        let row = self
            .conn
            .fetch_optional(&statement.sql, &statement.params)
            .await?;
        row.and_then(|cells| cells.first().and_then(Value::as_i64))
            .ok_or_else(|| Error::decode("count", "COUNT(*) did not return an integer"))
    }

    async fn run_insert_bulk(&mut self, rows: &Frame, commit: Commit) -> Result<u64> {
        let pages = InsertStatement::values_many(self.name.clone(), rows)?
            .build_pages(C::DIALECT, self.bulk_page_size)?;

        let mut inserted = 0;
        for statement in &pages {
            self.trace(statement);
            inserted += self.conn.execute(&statement.sql, &statement.params).await?;
        }
        self.finish(commit).await?;
        Ok(inserted)
    }

    async fn run_mutation(&mut self, statement: Result<Statement>, commit: Commit) -> Result<u64> {
        let statement = statement?;
        self.trace(&statement);
        let affected = self.conn.execute(&statement.sql, &statement.params).await?;
        self.finish(commit).await?;
        Ok(affected)
    }

    async fn finish(&mut self, commit: Commit) -> Result<()> {
        if commit == Commit::Immediate {
            self.conn.commit().await?;
            tracing::debug!(target: "crudkit::sql", table = %self.name, "committed");
        }
        Ok(())
    }

    /// Roll back on error, then hand the original error back unchanged
    async fn guard<T>(&mut self, outcome: Result<T>) -> Result<T> {
        if let Err(err) = &outcome {
            tracing::warn!(table = %self.name, error = %err, "operation failed, rolling back");
            if let Err(rollback_err) = self.conn.rollback().await {
                tracing::warn!(
                    table = %self.name,
                    error = %rollback_err,
                    "rollback after failed operation also failed"
                );
            }
        }
        outcome
    }

    fn trace(&self, statement: &Statement) {
        tracing::debug!(
            target: "crudkit::sql",
            table = %self.name,
            sql = %statement.sql,
            params = statement.params.len(),
            "executing statement"
        );
    }
}
