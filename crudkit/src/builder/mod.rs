//! Statement builders

pub mod common;
pub mod select;
pub mod insert;
pub mod update;
pub mod delete;

// Re-export types from submodules
pub use common::{Dialect, IntoColumns, Projection, QueryBuilder, SqlWriter, Statement};
pub use select::SelectStatement;
pub use insert::InsertStatement;
pub use update::UpdateStatement;
pub use delete::DeleteStatement;
