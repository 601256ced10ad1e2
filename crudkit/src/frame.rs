//! Labeled tabular data: select results and bulk-insert input

use crate::{Error, Result, Value};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// One row of cells, in column order
pub type Row = Vec<Value>;

/// An ordered set of rows with optional column labels.
///
/// When labels are present every row has exactly one value per label.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawFrame")]
pub struct Frame {
    columns: Option<Vec<String>>,
    rows: Vec<Row>,
}

/// Unchecked wire form of [`Frame`]
#[derive(Deserialize)]
struct RawFrame {
    columns: Option<Vec<String>>,
    rows: Vec<Row>,
}

impl TryFrom<RawFrame> for Frame {
    type Error = Error;

    fn try_from(raw: RawFrame) -> Result<Self> {
        Frame::with_labels(raw.columns, raw.rows)
    }
}

impl Frame {
    /// Build a labeled frame, checking every row's width
    ///
    /// # Examples
    /// ```
    /// use crudkit::{Frame, Value};
    ///
    /// let frame = Frame::new(
    ///     vec!["name", "age"],
    ///     vec![
    ///         vec![Value::from("Ann"), Value::from(31)],
    ///         vec![Value::from("Bo"), Value::from(27)],
    ///     ],
    /// )?;
    /// assert_eq!(frame.len(), 2);
    /// # Ok::<(), crudkit::Error>(())
    /// ```
    pub fn new<S: Into<String>>(columns: Vec<S>, rows: Vec<Row>) -> Result<Self> {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        Self::with_labels(Some(columns), rows)
    }

    /// A frame without column labels
    pub fn unlabeled(rows: Vec<Row>) -> Self {
        Self {
            columns: None,
            rows,
        }
    }

    pub(crate) fn with_labels(columns: Option<Vec<String>>, rows: Vec<Row>) -> Result<Self> {
        if let Some(labels) = &columns {
            if let Some(row) = rows.iter().find(|row| row.len() != labels.len()) {
                return Err(Error::ColumnCountMismatch {
                    expected: labels.len(),
                    found: row.len(),
                });
            }
        }
        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> Option<&[String]> {
        self.columns.as_deref()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn first(&self) -> Option<&Row> {
        self.rows.first()
    }

    /// Append a row, checking its width against the labels
    pub fn push_row(&mut self, row: Row) -> Result<()> {
        if let Some(labels) = &self.columns {
            if row.len() != labels.len() {
                return Err(Error::ColumnCountMismatch {
                    expected: labels.len(),
                    found: row.len(),
                });
            }
        }
        self.rows.push(row);
        Ok(())
    }

    /// Position of a labeled column
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns
            .as_ref()
            .and_then(|labels| labels.iter().position(|c| c == column))
    }

    /// The cell at `row` in the labeled `column`.
    ///
    /// Fails with [`Error::EmptyResult`] when the frame has no such row and
    /// [`Error::ColumnNotFound`] when no label matches.
    pub fn value(&self, row: usize, column: &str) -> Result<&Value> {
        let index = self
            .column_index(column)
            .ok_or_else(|| Error::column_not_found(column))?;
        self.rows
            .get(row)
            .and_then(|cells| cells.get(index))
            .ok_or_else(|| Error::empty_result(format!("frame has no row {}", row)))
    }

    /// Rows as JSON: objects keyed by label, or plain arrays when unlabeled
    pub fn to_json_records(&self) -> serde_json::Value {
        serde_json::Value::Array(self.json_rows().collect())
    }

    /// Deserialize every row into `T` through its JSON record
    pub fn deserialize<T>(&self) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        self.json_rows()
            .map(|record| serde_json::from_value(record).map_err(Error::from))
            .collect()
    }

    fn json_rows(&self) -> impl Iterator<Item = serde_json::Value> + '_ {
        self.rows.iter().map(move |row| match &self.columns {
            Some(labels) => serde_json::Value::Object(
                labels
                    .iter()
                    .cloned()
                    .zip(row.iter().map(Value::to_json))
                    .collect(),
            ),
            None => serde_json::Value::Array(row.iter().map(Value::to_json).collect()),
        })
    }
}
