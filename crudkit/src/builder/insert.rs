//! INSERT statement builder, single-row and multi-row

use super::common::{Dialect, QueryBuilder, SqlWriter, Statement};
use crate::fields::Fields;
use crate::frame::{Frame, Row};
use crate::ident::Ident;
use crate::{Error, Result};

/// INSERT statement builder
#[derive(Debug, Clone)]
pub struct InsertStatement {
    table: Ident,
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl InsertStatement {
    /// One row from a column → value mapping
    pub fn values(table: Ident, data: Fields) -> Self {
        let mut columns = Vec::with_capacity(data.len());
        let mut row = Vec::with_capacity(data.len());
        for (column, value) in data {
            columns.push(column);
            row.push(value);
        }
        Self {
            table,
            columns,
            rows: vec![row],
        }
    }

    /// Many rows from a labeled frame
    pub fn values_many(table: Ident, frame: &Frame) -> Result<Self> {
        let columns = frame
            .columns()
            .ok_or_else(|| Error::invalid_query("bulk INSERT requires labeled columns"))?
            .to_vec();
        Ok(Self {
            table,
            columns,
            rows: frame.rows().to_vec(),
        })
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Split into statements of at most `page_size` rows each, further capped
    /// by the dialect's parameter limit. No rows yields no statements.
    pub fn build_pages(&self, dialect: Dialect, page_size: usize) -> Result<Vec<Statement>> {
        self.validate()?;
        let by_params = (dialect.max_parameters() / self.columns.len()).max(1);
        let rows_per_page = page_size.clamp(1, by_params);

        self.rows
            .chunks(rows_per_page)
            .map(|page| self.render(dialect, page))
            .collect()
    }

    fn validate(&self) -> Result<()> {
        if self.columns.is_empty() {
            return Err(Error::invalid_query("INSERT requires at least one column"));
        }
        if let Some(row) = self.rows.iter().find(|row| row.len() != self.columns.len()) {
            return Err(Error::ColumnCountMismatch {
                expected: self.columns.len(),
                found: row.len(),
            });
        }
        Ok(())
    }

    fn render(&self, dialect: Dialect, rows: &[Row]) -> Result<Statement> {
        let mut sql = SqlWriter::new(dialect);

        sql.push_sql("INSERT INTO ");
        sql.push_ident(&self.table);
        sql.push_sql(" (");
        sql.push_column_list(self.columns.iter().map(String::as_str))?;
        sql.push_sql(") VALUES ");

        for (i, row) in rows.iter().enumerate() {
            if i > 0 {
                sql.push_sql(", ");
            }
            sql.push_param_group(row.iter().cloned());
        }

        Ok(sql.finish())
    }
}

impl QueryBuilder for InsertStatement {
    /// All rows in one statement
    fn build(&self, dialect: Dialect) -> Result<Statement> {
        self.validate()?;
        if self.rows.is_empty() {
            return Err(Error::invalid_query("INSERT requires values"));
        }
        self.render(dialect, &self.rows)
    }
}
