//! Strict field readers over uploaded CSV rows.

use indexmap::IndexMap;

/// One uploaded CSV row, keyed by header in file order.
pub type RawRow = IndexMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RowError {
    #[error("Row {row}: missing column '{column}'")]
    MissingColumn { row: usize, column: String },
    #[error("Row {row}: column '{column}' expected {expected}, got '{value}'")]
    InvalidNumber {
        row: usize,
        column: String,
        value: String,
        expected: &'static str,
    },
}

/// Read access to a single row, remembering its 1-based position for errors.
#[derive(Debug, Clone, Copy)]
pub struct RowReader<'a> {
    row: &'a RawRow,
    number: usize,
}

impl<'a> RowReader<'a> {
    pub const fn new(row: &'a RawRow, number: usize) -> Self {
        Self { row, number }
    }

    /// Column lookup is case-insensitive because headers are matched that way.
    fn raw(&self, column: &str) -> Result<&'a str, RowError> {
        self.row
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(column))
            .map(|(_, value)| value.as_str())
            .ok_or_else(|| RowError::MissingColumn {
                row: self.number,
                column: column.to_string(),
            })
    }

    pub fn text(&self, column: &str) -> Result<String, RowError> {
        self.raw(column).map(str::to_string)
    }

    pub fn int(&self, column: &str) -> Result<i64, RowError> {
        let value = self.raw(column)?;
        parse_int(value).ok_or_else(|| self.invalid(column, value, "an integer"))
    }

    pub fn float(&self, column: &str) -> Result<f64, RowError> {
        let value = self.raw(column)?;
        parse_float(value).ok_or_else(|| self.invalid(column, value, "a number"))
    }

    /// Only the literal `"true"` is true; a missing column is still an error.
    pub fn flag(&self, column: &str) -> Result<bool, RowError> {
        self.raw(column).map(|value| value == "true")
    }

    fn invalid(&self, column: &str, value: &str, expected: &'static str) -> RowError {
        RowError::InvalidNumber {
            row: self.number,
            column: column.to_string(),
            value: value.to_string(),
            expected,
        }
    }
}

pub fn parse_int(value: &str) -> Option<i64> {
    value.trim().parse().ok()
}

pub fn parse_float(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|parsed| parsed.is_finite())
}

/// Applies `convert` to every row, failing the whole batch on the first bad row.
pub fn convert_all<T>(
    rows: &[RawRow],
    convert: impl Fn(&RowReader<'_>) -> Result<T, RowError>,
) -> Result<Vec<T>, RowError> {
    rows.iter()
        .enumerate()
        .map(|(index, row)| convert(&RowReader::new(row, index + 1)))
        .collect()
}
