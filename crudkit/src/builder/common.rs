//! Common types shared across all statement builders

use crate::fields::Fields;
use crate::ident::{self, Ident};
use crate::{Error, Result, Value};

/// Placeholder flavour of the target database
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// `$1, $2, ...`
    Postgres,
    /// `?1, ?2, ...`
    Sqlite,
}

impl Dialect {
    /// Placeholder for the 1-based parameter `index`
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            Dialect::Postgres => format!("${}", index),
            Dialect::Sqlite => format!("?{}", index),
        }
    }

    /// Identifier quote character. SQLite falls back to a string literal for
    /// an unknown double-quoted name, but never for a backticked one.
    pub fn identifier_quote(&self) -> char {
        match self {
            Dialect::Postgres => '"',
            Dialect::Sqlite => '`',
        }
    }

    /// Most bind parameters one statement may carry
    pub fn max_parameters(&self) -> usize {
        match self {
            Dialect::Postgres => 65_535,
            Dialect::Sqlite => 32_766,
        }
    }
}

/// A finished SQL template and its bound values, in placeholder order
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

/// Core trait for all statement builders
pub trait QueryBuilder {
    /// Render the statement for `dialect`
    fn build(&self, dialect: Dialect) -> Result<Statement>;
}

/// Accumulates SQL text and parameters side by side.
///
/// Identifiers only enter the text through [`Ident`] quoting and values only
/// enter through [`SqlWriter::push_param`], which appends a placeholder and
/// records the value.
#[derive(Debug)]
pub struct SqlWriter {
    dialect: Dialect,
    sql: String,
    params: Vec<Value>,
}

impl SqlWriter {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            sql: String::new(),
            params: Vec::new(),
        }
    }

    /// Append fixed SQL text. Never pass caller-supplied strings here.
    pub fn push_sql(&mut self, fragment: &str) {
        self.sql.push_str(fragment);
    }

    pub fn push_ident(&mut self, ident: &Ident) {
        ident.write_sql(self.dialect, &mut self.sql);
    }

    pub fn push_column(&mut self, name: &str) -> Result<()> {
        ident::write_column(name, self.dialect, &mut self.sql)
    }

    /// `"a", "b", "c"`
    pub fn push_column_list<'a, I>(&mut self, columns: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a str>,
    {
        for (i, column) in columns.into_iter().enumerate() {
            if i > 0 {
                self.sql.push_str(", ");
            }
            self.push_column(column)?;
        }
        Ok(())
    }

    /// Append the next placeholder and bind `value` to it
    pub fn push_param(&mut self, value: Value) {
        self.params.push(value);
        let placeholder = self.dialect.placeholder(self.params.len());
        self.sql.push_str(&placeholder);
    }

    /// `($1, $2, $3)`
    pub fn push_param_group<I>(&mut self, values: I)
    where
        I: IntoIterator<Item = Value>,
    {
        self.sql.push('(');
        for (i, value) in values.into_iter().enumerate() {
            if i > 0 {
                self.sql.push_str(", ");
            }
            self.push_param(value);
        }
        self.sql.push(')');
    }

    /// `"column" = $n`
    pub fn push_equality_predicate(&mut self, column: &str, value: Value) -> Result<()> {
        self.push_column(column)?;
        self.sql.push_str(" = ");
        self.push_param(value);
        Ok(())
    }

    /// ` WHERE "a" = $1 AND "b" = $2`, or nothing for an empty filter
    pub fn push_filter(&mut self, filter: &Fields) -> Result<()> {
        for (i, (column, value)) in filter.iter().enumerate() {
            self.sql.push_str(if i == 0 { " WHERE " } else { " AND " });
            self.push_equality_predicate(column, value.clone())?;
        }
        Ok(())
    }

    /// `"a" = $1, "b" = $2`
    pub fn push_assignments(&mut self, data: &Fields) -> Result<()> {
        if data.is_empty() {
            return Err(Error::invalid_query("UPDATE requires SET clauses"));
        }
        for (i, (column, value)) in data.iter().enumerate() {
            if i > 0 {
                self.sql.push_str(", ");
            }
            self.push_equality_predicate(column, value.clone())?;
        }
        Ok(())
    }

    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    pub fn finish(self) -> Statement {
        Statement {
            sql: self.sql,
            params: self.params,
        }
    }
}

/// Column list of a SELECT
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Projection {
    /// `*`
    #[default]
    All,
    /// An explicit, non-empty list; also used as result labels
    Columns(Vec<String>),
}

impl Projection {
    /// Labels implied by the projection, if explicit
    pub fn labels(&self) -> Option<&[String]> {
        match self {
            Projection::All => None,
            Projection::Columns(columns) => Some(columns),
        }
    }
}

impl From<Vec<String>> for Projection {
    fn from(columns: Vec<String>) -> Self {
        Projection::Columns(columns)
    }
}

impl From<Vec<&str>> for Projection {
    fn from(columns: Vec<&str>) -> Self {
        Projection::Columns(columns.into_columns())
    }
}

impl From<&[&str]> for Projection {
    fn from(columns: &[&str]) -> Self {
        Projection::Columns(columns.into_columns())
    }
}

impl<const N: usize> From<[&str; N]> for Projection {
    fn from(columns: [&str; N]) -> Self {
        Projection::Columns(columns.into_columns())
    }
}

/// Trait to convert various types into column lists
pub trait IntoColumns {
    fn into_columns(self) -> Vec<String>;
}

impl IntoColumns for Vec<String> {
    fn into_columns(self) -> Vec<String> {
        self
    }
}

impl IntoColumns for Vec<&str> {
    fn into_columns(self) -> Vec<String> {
        self.into_iter().map(|s| s.to_string()).collect()
    }
}

impl IntoColumns for &[&str] {
    fn into_columns(self) -> Vec<String> {
        self.iter().map(|s| s.to_string()).collect()
    }
}

impl<const N: usize> IntoColumns for [&str; N] {
    fn into_columns(self) -> Vec<String> {
        self.iter().map(|s| s.to_string()).collect()
    }
}
