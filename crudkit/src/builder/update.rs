//! UPDATE statement builder

use super::common::{Dialect, QueryBuilder, SqlWriter, Statement};
use crate::fields::Fields;
use crate::ident::Ident;
use crate::Result;

/// UPDATE statement builder
#[derive(Debug, Clone)]
pub struct UpdateStatement {
    table: Ident,
    set_clauses: Fields,
    filter: Fields,
}

impl UpdateStatement {
    pub fn new(table: Ident) -> Self {
        Self {
            table,
            set_clauses: Fields::new(),
            filter: Fields::new(),
        }
    }

    /// Set column values
    pub fn set(mut self, data: Fields) -> Self {
        for (column, value) in data {
            self.set_clauses.set(column, value);
        }
        self
    }

    /// Restrict the rows updated. An empty filter updates every row.
    pub fn filter(mut self, filter: Fields) -> Self {
        self.filter = filter;
        self
    }
}

impl QueryBuilder for UpdateStatement {
    fn build(&self, dialect: Dialect) -> Result<Statement> {
        let mut sql = SqlWriter::new(dialect);

        sql.push_sql("UPDATE ");
        sql.push_ident(&self.table);
        sql.push_sql(" SET ");
        // SET values are bound before WHERE values, matching placeholder order
        sql.push_assignments(&self.set_clauses)?;
        sql.push_filter(&self.filter)?;

        Ok(sql.finish())
    }
}
