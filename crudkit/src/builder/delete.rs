//! DELETE statement builder

use super::common::{Dialect, QueryBuilder, SqlWriter, Statement};
use crate::fields::Fields;
use crate::ident::Ident;
use crate::Result;

/// DELETE statement builder. Without a filter every row is deleted.
#[derive(Debug, Clone)]
pub struct DeleteStatement {
    table: Ident,
    filter: Fields,
}

impl DeleteStatement {
    pub fn new(table: Ident) -> Self {
        Self {
            table,
            filter: Fields::new(),
        }
    }

    pub fn filter(mut self, filter: Fields) -> Self {
        self.filter = filter;
        self
    }
}

impl QueryBuilder for DeleteStatement {
    fn build(&self, dialect: Dialect) -> Result<Statement> {
        let mut sql = SqlWriter::new(dialect);

        sql.push_sql("DELETE FROM ");
        sql.push_ident(&self.table);
        sql.push_filter(&self.filter)?;

        Ok(sql.finish())
    }
}
