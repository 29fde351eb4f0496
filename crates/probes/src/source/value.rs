use std::fmt;

/// Text placed after every column when a row is flattened.
pub const COLUMN_SEPARATOR: &str = " - ";

/// A single column value as returned by the data source
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl fmt::Display for ColumnValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnValue::Null => write!(f, "null"),
            ColumnValue::Integer(v) => write!(f, "{v}"),
            // Debug keeps the fractional part on whole numbers (`2.0`, not `2`)
            ColumnValue::Real(v) => write!(f, "{v:?}"),
            ColumnValue::Text(v) => write!(f, "{v}"),
            ColumnValue::Blob(v) => write!(f, "{}", hex::encode(v)),
        }
    }
}

impl From<libsql::Value> for ColumnValue {
    fn from(value: libsql::Value) -> Self {
        match value {
            libsql::Value::Null => ColumnValue::Null,
            libsql::Value::Integer(v) => ColumnValue::Integer(v),
            libsql::Value::Real(v) => ColumnValue::Real(v),
            libsql::Value::Text(v) => ColumnValue::Text(v),
            libsql::Value::Blob(v) => ColumnValue::Blob(v),
        }
    }
}

impl From<i64> for ColumnValue {
    fn from(value: i64) -> Self {
        ColumnValue::Integer(value)
    }
}

impl From<&str> for ColumnValue {
    fn from(value: &str) -> Self {
        ColumnValue::Text(value.to_string())
    }
}

/// One result row, columns kept in result-set order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<ColumnValue>,
}

impl Row {
    pub fn new(columns: Vec<ColumnValue>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[ColumnValue] {
        &self.columns
    }

    /// Render the row as notification content: every column followed by
    /// [`COLUMN_SEPARATOR`], including the last one.
    pub fn flatten(&self) -> String {
        let mut flattened = String::new();
        for column in &self.columns {
            flattened.push_str(&column.to_string());
            flattened.push_str(COLUMN_SEPARATOR);
        }
        flattened
    }
}

impl From<Vec<ColumnValue>> for Row {
    fn from(columns: Vec<ColumnValue>) -> Self {
        Self::new(columns)
    }
}
