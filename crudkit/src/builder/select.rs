//! SELECT statement builder

use super::common::{Dialect, Projection, QueryBuilder, SqlWriter, Statement};
use crate::fields::Fields;
use crate::ident::Ident;
use crate::{Error, Result};

/// SELECT statement builder
#[derive(Debug, Clone)]
pub struct SelectStatement {
    table: Ident,
    projection: Projection,
    filter: Fields,
    count: bool,
}

impl SelectStatement {
    /// `SELECT * FROM table`
    pub fn new(table: Ident) -> Self {
        Self {
            table,
            projection: Projection::All,
            filter: Fields::new(),
            count: false,
        }
    }

    /// `SELECT COUNT(*) FROM table`
    pub fn count(table: Ident) -> Self {
        Self {
            count: true,
            ..Self::new(table)
        }
    }

    pub fn columns(mut self, projection: impl Into<Projection>) -> Self {
        self.projection = projection.into();
        self
    }

    pub fn filter(mut self, filter: Fields) -> Self {
        self.filter = filter;
        self
    }
}

impl QueryBuilder for SelectStatement {
    fn build(&self, dialect: Dialect) -> Result<Statement> {
        let mut sql = SqlWriter::new(dialect);

        sql.push_sql("SELECT ");
        if self.count {
            sql.push_sql("COUNT(*)");
        } else {
            match &self.projection {
                Projection::All => sql.push_sql("*"),
                Projection::Columns(columns) if columns.is_empty() => {
                    return Err(Error::invalid_query(
                        "SELECT requires at least one column",
                    ));
                }
                Projection::Columns(columns) => {
                    sql.push_column_list(columns.iter().map(String::as_str))?
                }
            }
        }

        sql.push_sql(" FROM ");
        sql.push_ident(&self.table);
        sql.push_filter(&self.filter)?;

        Ok(sql.finish())
    }
}
