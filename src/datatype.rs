//! Supported MySQL column datatypes and their size rules.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::TabulaError;

/// Largest `varchar`/`text` size kept as-is; anything bigger becomes `mediumtext`.
pub const VARCHAR_PROMOTION_THRESHOLD: u32 = 21845;

/// Display width cap for `int` columns.
pub const INT_MAX_SIZE: u32 = 11;

/// Upper bound for `char` columns.
pub const CHAR_MAX_SIZE: u32 = 255;

/// Upper bound for `bit` columns.
pub const BIT_MAX_SIZE: u32 = 64;

/// Column datatype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Int,
    Varchar,
    Char,
    Text,
    MediumText,
    Timestamp,
    DateTime,
    TinyBlob,
    Blob,
    MediumBlob,
    LongBlob,
    Decimal,
    Float,
    Double,
    Bit,
    Boolean,
}

impl DataType {
    pub const ALL: [DataType; 16] = [
        DataType::Int,
        DataType::Varchar,
        DataType::Char,
        DataType::Text,
        DataType::MediumText,
        DataType::Timestamp,
        DataType::DateTime,
        DataType::TinyBlob,
        DataType::Blob,
        DataType::MediumBlob,
        DataType::LongBlob,
        DataType::Decimal,
        DataType::Float,
        DataType::Double,
        DataType::Bit,
        DataType::Boolean,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Int => "int",
            DataType::Varchar => "varchar",
            DataType::Char => "char",
            DataType::Text => "text",
            DataType::MediumText => "mediumtext",
            DataType::Timestamp => "timestamp",
            DataType::DateTime => "datetime",
            DataType::TinyBlob => "tinyblob",
            DataType::Blob => "blob",
            DataType::MediumBlob => "mediumblob",
            DataType::LongBlob => "longblob",
            DataType::Decimal => "decimal",
            DataType::Float => "float",
            DataType::Double => "double",
            DataType::Bit => "bit",
            DataType::Boolean => "boolean",
        }
    }

    /// Character types that carry a collation and take quoted string values.
    pub fn is_string(&self) -> bool {
        matches!(
            self,
            DataType::Varchar | DataType::Char | DataType::Text | DataType::MediumText
        )
    }

    pub fn is_blob(&self) -> bool {
        matches!(
            self,
            DataType::TinyBlob | DataType::Blob | DataType::MediumBlob | DataType::LongBlob
        )
    }

    pub fn is_date(&self) -> bool {
        matches!(self, DataType::Timestamp | DataType::DateTime)
    }

    /// Types with precision and scale.
    pub fn is_real(&self) -> bool {
        matches!(self, DataType::Decimal | DataType::Float | DataType::Double)
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, DataType::Bit | DataType::Boolean)
    }

    /// Size applied by `set_type` when the caller does not give one.
    pub fn default_size(&self) -> Option<u32> {
        match self {
            DataType::Int => Some(INT_MAX_SIZE),
            DataType::Varchar | DataType::Char | DataType::Bit => Some(1),
            DataType::Decimal => Some(10),
            DataType::Float | DataType::Double => Some(0),
            _ => None,
        }
    }

    /// Token that makes a date column default to the insertion time.
    pub fn now_token(&self) -> Option<&'static str> {
        match self {
            DataType::Timestamp => Some("current_timestamp"),
            DataType::DateTime => Some("now()"),
            _ => None,
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = TabulaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        DataType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == lower)
            .or(match lower.as_str() {
                "integer" => Some(DataType::Int),
                "bool" => Some(DataType::Boolean),
                _ => None,
            })
            .ok_or_else(|| TabulaError::UnsupportedDatatype(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!("VARCHAR".parse::<DataType>().unwrap(), DataType::Varchar);
        assert_eq!("MediumText".parse::<DataType>().unwrap(), DataType::MediumText);
        assert_eq!("bool".parse::<DataType>().unwrap(), DataType::Boolean);
    }

    #[test]
    fn test_parse_unsupported() {
        let err = "geometry".parse::<DataType>().unwrap_err();
        assert_eq!(err, TabulaError::UnsupportedDatatype("geometry".into()));
    }

    #[test]
    fn test_categories() {
        assert!(DataType::Text.is_string());
        assert!(!DataType::Blob.is_string());
        assert!(DataType::LongBlob.is_blob());
        assert!(DataType::DateTime.is_date());
        assert!(DataType::Double.is_real());
        assert_eq!(DataType::Timestamp.now_token(), Some("current_timestamp"));
    }
}
