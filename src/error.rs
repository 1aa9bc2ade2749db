//! Error types for tabula.

use thiserror::Error;

/// The main error type for tabula operations.
///
/// Most structural mutations (adding a column, changing a size, attaching a
/// foreign key) report one of these and leave the receiver untouched. Only
/// [`TabulaError::UnsupportedQueryType`] signals a programming error.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TabulaError {
    /// Identifier is empty or contains characters outside `[A-Za-z0-9_-]`.
    #[error("Invalid name: '{0}'")]
    InvalidName(String),

    /// Datatype is not one of the supported MySQL types.
    #[error("Unsupported datatype: '{0}'")]
    UnsupportedDatatype(String),

    /// Size is outside the range accepted by the datatype.
    #[error("Size {size} is out of range for {datatype}")]
    SizeOutOfRange { datatype: String, size: i64 },

    /// The datatype does not carry a size.
    #[error("Size is not supported by {0}")]
    SizeNotSupported(String),

    /// Scale is not supported or not smaller than the size.
    #[error("Invalid scale {scale} for {datatype}")]
    InvalidScale { datatype: String, scale: u32 },

    /// Default value does not match the column datatype.
    #[error("Invalid default for {datatype}: {message}")]
    InvalidDefault { datatype: String, message: String },

    /// Column key or database name already present in the table.
    #[error("Duplicate column: '{0}'")]
    DuplicateColumn(String),

    /// Column key, name or index could not be resolved.
    #[error("Column not found: '{0}'")]
    ColumnNotFound(String),

    /// Two columns that must share a datatype do not.
    #[error("Type mismatch: {left} vs {right}")]
    TypeMismatch { left: String, right: String },

    /// A query type outside select/update/delete/insert/show/create/alter/drop.
    #[error("Unsupported query type: '{0}'")]
    UnsupportedQueryType(String),

    /// Failed to parse a type declaration or filter expression.
    #[error("Parse error at position {position}: {message}")]
    Parse { position: usize, message: String },

    /// Configuration or schema file error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(String),
}

impl TabulaError {
    /// Create a parse error at the given position.
    pub fn parse(position: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            position,
            message: message.into(),
        }
    }

    /// Create an invalid default error.
    pub fn invalid_default(datatype: impl ToString, message: impl Into<String>) -> Self {
        Self::InvalidDefault {
            datatype: datatype.to_string(),
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for TabulaError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Result type alias for tabula operations.
pub type TabulaResult<T> = Result<T, TabulaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TabulaError::parse(5, "unexpected character");
        assert_eq!(
            err.to_string(),
            "Parse error at position 5: unexpected character"
        );
    }

    #[test]
    fn test_size_errors_are_distinct() {
        let out_of_range = TabulaError::SizeOutOfRange {
            datatype: "int".into(),
            size: 0,
        };
        let not_supported = TabulaError::SizeNotSupported("datetime".into());
        assert_ne!(out_of_range, not_supported);
        assert_eq!(not_supported.to_string(), "Size is not supported by datetime");
    }
}
