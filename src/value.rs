//! Value and result-set module for sqltool
//!
//! This module provides the driver-neutral representation of everything that
//! crosses the connection boundary:
//!
//! - `Value`, a single cell or bound parameter
//! - `ColumnType`, the coarse SQL type classification that drives rendering
//!   and DSV parsing (justification, null handling, temporal formatting)
//! - `ColumnInfo` and `ResultSet`, a fully fetched query result

use std::fmt;

/// Represents a value in a result cell or a bound statement parameter
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// SQL NULL
    Null,
    /// 64-bit signed integer
    Integer(i64),
    /// 64-bit floating point number
    Float(f64),
    /// UTF-8 string
    Text(String),
    /// Raw bytes of a binary column
    Blob(Vec<u8>),
}

impl Value {
    /// Whether this value is SQL NULL
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The string form used by renderers, `None` for NULL
    ///
    /// Binary values are hex encoded so they survive a DSV round trip.
    pub fn as_display(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Blob(bytes) => Some(encode_hex(bytes)),
            other => Some(other.to_string()),
        }
    }
}

/// Implementation of string formatting for Value
///
/// NULL prints as `NULL`; renderers substitute the configured null token
/// instead of relying on this.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(float) => write!(f, "{}", float),
            Value::Text(s) => write!(f, "{}", s),
            Value::Blob(bytes) => write!(f, "{}", encode_hex(bytes)),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

/// Coarse SQL type classification of a result column
///
/// Derived from the declared type name with the same substring rules SQLite
/// uses for type affinity, refined with the temporal and boolean names that
/// scripts commonly declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Float,
    Decimal,
    Boolean,
    Char,
    Clob,
    Date,
    Time,
    Timestamp,
    Binary,
    /// No declared type (expressions) or an unrecognized one
    Other,
}

impl ColumnType {
    /// Classify a declared column type
    pub fn from_decl(decl: Option<&str>) -> Self {
        let decl = match decl {
            Some(d) if !d.trim().is_empty() => d.to_ascii_uppercase(),
            _ => return ColumnType::Other,
        };

        if decl.contains("INT") {
            ColumnType::Integer
        } else if decl.contains("BOOL") || decl == "BIT" {
            ColumnType::Boolean
        } else if decl.contains("TIMESTAMP") || decl.contains("DATETIME") {
            ColumnType::Timestamp
        } else if decl.contains("DATE") {
            ColumnType::Date
        } else if decl.contains("TIME") {
            ColumnType::Time
        } else if decl.contains("CLOB") || decl.contains("TEXT") {
            ColumnType::Clob
        } else if decl.contains("CHAR") {
            ColumnType::Char
        } else if decl.contains("BLOB") || decl.contains("BINARY") || decl.contains("BYTEA") {
            ColumnType::Binary
        } else if decl.contains("REAL") || decl.contains("FLOA") || decl.contains("DOUB") {
            ColumnType::Float
        } else if decl.contains("NUMERIC") || decl.contains("DECIMAL") {
            ColumnType::Decimal
        } else {
            ColumnType::Other
        }
    }

    /// Numeric columns are rendered right-justified
    pub fn right_justified(self) -> bool {
        matches!(
            self,
            ColumnType::Integer | ColumnType::Float | ColumnType::Decimal
        )
    }

    /// Whether an empty field means NULL for this type
    ///
    /// Character types can hold an empty string distinct from NULL, so only
    /// the remaining types collapse empty input to NULL.
    pub fn autonull(self) -> bool {
        !matches!(self, ColumnType::Char | ColumnType::Clob | ColumnType::Other)
    }

    pub fn is_temporal(self) -> bool {
        matches!(
            self,
            ColumnType::Date | ColumnType::Time | ColumnType::Timestamp
        )
    }
}

/// Metadata for one result column
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnInfo {
    /// Column label as reported by the driver
    pub label: String,
    /// Declared type name, if the column maps to a table column
    pub decl_type: Option<String>,
    /// Classification of `decl_type`
    pub kind: ColumnType,
}

impl ColumnInfo {
    pub fn new(label: &str, decl_type: Option<&str>) -> Self {
        ColumnInfo {
            label: label.to_string(),
            decl_type: decl_type.map(str::to_string),
            kind: ColumnType::from_decl(decl_type),
        }
    }

    /// Human readable type name for reports
    pub fn type_name(&self) -> &str {
        self.decl_type.as_deref().unwrap_or("UNKNOWN")
    }
}

/// A fully fetched query result
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    /// Column metadata in select-list order
    pub columns: Vec<ColumnInfo>,
    /// Row data, each row holding one value per column
    pub rows: Vec<Vec<Value>>,
}

impl ResultSet {
    pub fn new(columns: Vec<ColumnInfo>) -> Self {
        ResultSet {
            columns,
            rows: Vec::new(),
        }
    }

    /// Get the column count
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Get the row count
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Column labels in select-list order
    pub fn labels(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.label.clone()).collect()
    }

    /// First column of the first row, if there is one
    pub fn scalar(&self) -> Option<&Value> {
        self.rows.first().and_then(|row| row.first())
    }
}

/// Lower-case hex encoding of a byte string
pub fn encode_hex(bytes: &[u8]) -> String {
    const DIGITS: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push(DIGITS[(b >> 4) as usize] as char);
        out.push(DIGITS[(b & 0x0f) as usize] as char);
    }
    out
}

/// Decode a hex string (either case); `None` for odd length or bad digits
pub fn decode_hex(text: &str) -> Option<Vec<u8>> {
    let text = text.trim();
    if text.len() % 2 != 0 {
        return None;
    }
    let digits = text.as_bytes();
    let mut out = Vec::with_capacity(digits.len() / 2);
    for pair in digits.chunks(2) {
        let hi = (pair[0] as char).to_digit(16)?;
        let lo = (pair[1] as char).to_digit(16)?;
        out.push((hi * 16 + lo) as u8);
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_type_classification() {
        assert_eq!(ColumnType::from_decl(Some("INTEGER")), ColumnType::Integer);
        assert_eq!(ColumnType::from_decl(Some("bigint")), ColumnType::Integer);
        assert_eq!(ColumnType::from_decl(Some("VARCHAR(20)")), ColumnType::Char);
        assert_eq!(ColumnType::from_decl(Some("TEXT")), ColumnType::Clob);
        assert_eq!(ColumnType::from_decl(Some("TIMESTAMP")), ColumnType::Timestamp);
        assert_eq!(ColumnType::from_decl(Some("DATE")), ColumnType::Date);
        assert_eq!(ColumnType::from_decl(Some("BLOB")), ColumnType::Binary);
        assert_eq!(ColumnType::from_decl(Some("DECIMAL(10,2)")), ColumnType::Decimal);
        assert_eq!(ColumnType::from_decl(None), ColumnType::Other);
    }

    #[test]
    fn test_autonull_and_justification() {
        assert!(ColumnType::Integer.autonull());
        assert!(ColumnType::Date.autonull());
        assert!(!ColumnType::Clob.autonull());
        assert!(!ColumnType::Char.autonull());
        assert!(ColumnType::Float.right_justified());
        assert!(!ColumnType::Char.right_justified());
    }

    #[test]
    fn test_hex() {
        assert_eq!(encode_hex(&[0x00, 0xab, 0x10]), "00ab10");
        assert_eq!(decode_hex("00AB10"), Some(vec![0x00, 0xab, 0x10]));
        assert_eq!(decode_hex("abc"), None);
        assert_eq!(decode_hex("zz"), None);
    }
}
