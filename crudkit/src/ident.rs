//! Structurally quoted SQL identifiers.
//!
//! Every table and column name that reaches SQL text goes through [`Ident`]. Each part is
//! wrapped in the dialect's identifier quote with embedded quotes doubled, so a name is
//! always read by the database as one literal identifier and never as SQL syntax.
//!
//! SQLite reads a double-quoted name that matches no column as a string literal, so
//! SQLite statements quote with backticks, which have no such fallback.
//!
//! ```
//! use crudkit::Ident;
//!
//! let users = Ident::qualified("public", "users")?;
//! assert_eq!(users.to_sql(), r#""public"."users""#);
//!
//! let odd = Ident::new(r#"say "hi""#)?;
//! assert_eq!(odd.to_sql(), r#""say ""hi""""#);
//! # Ok::<(), crudkit::Error>(())
//! ```

use crate::builder::Dialect;
use crate::{Error, Result};
use std::fmt;

/// A possibly schema-qualified SQL identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ident {
    parts: Vec<String>,
}

impl Ident {
    /// A single-part identifier. The name is taken literally: dots, quotes and
    /// reserved words are all part of the name.
    pub fn new(name: &str) -> Result<Self> {
        validate_part(name)?;
        Ok(Self {
            parts: vec![name.to_string()],
        })
    }

    /// A `schema.name` identifier
    pub fn qualified(schema: &str, name: &str) -> Result<Self> {
        validate_part(schema)?;
        validate_part(name)?;
        Ok(Self {
            parts: vec![schema.to_string(), name.to_string()],
        })
    }

    /// The unqualified (last) part of the identifier
    pub fn name(&self) -> &str {
        self.parts.last().map(String::as_str).unwrap_or_default()
    }

    /// The schema part, if qualified
    pub fn schema(&self) -> Option<&str> {
        if self.parts.len() > 1 {
            self.parts.first().map(String::as_str)
        } else {
            None
        }
    }

    /// Render the identifier in standard double-quoted form
    pub fn to_sql(&self) -> String {
        self.to_sql_for(Dialect::Postgres)
    }

    /// Render the identifier for `dialect`
    pub fn to_sql_for(&self, dialect: Dialect) -> String {
        let cap = self.parts.iter().map(|p| p.len() + 3).sum();
        let mut out = String::with_capacity(cap);
        self.write_sql(dialect, &mut out);
        out
    }

    pub(crate) fn write_sql(&self, dialect: Dialect, out: &mut String) {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            write_quoted(part, dialect.identifier_quote(), out);
        }
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}

/// Quote a single column name into `out`
pub(crate) fn write_column(name: &str, dialect: Dialect, out: &mut String) -> Result<()> {
    validate_part(name)?;
    write_quoted(name, dialect.identifier_quote(), out);
    Ok(())
}

fn write_quoted(part: &str, quote: char, out: &mut String) {
    out.push(quote);
    for ch in part.chars() {
        if ch == quote {
            out.push(quote);
        }
        out.push(ch);
    }
    out.push(quote);
}

fn validate_part(part: &str) -> Result<()> {
    if part.is_empty() {
        return Err(Error::invalid_identifier("identifier cannot be empty"));
    }
    if part.contains('\0') {
        return Err(Error::invalid_identifier(
            "identifier cannot contain NUL character",
        ));
    }
    Ok(())
}
