//! Errors that can be thrown when processing configuration.

use std::path::PathBuf;

use thiserror::Error;

/// The errors that can be thrown when reading a configuration directory.
#[derive(Debug, Error)]
pub enum ParseConfigurationError {
    #[error(
        "parse error on {}:{}:{}: {}",
        .file_path.display(),
        .line,
        .column,
        .message
    )]
    ParseError {
        file_path: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },
    #[error("unsupported configuration version {0}")]
    UnsupportedVersion(u32),
    #[error("I/O error: {0}")]
    IoErrorButStringified(String),
}

/// The errors that can be thrown when writing a configuration directory.
#[derive(Debug, Error)]
pub enum WriteParsedConfigurationError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// The errors that can be thrown when validating a parsed configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MakeRuntimeConfigurationError {
    #[error("row type '{row_type}': primary key '{primary_key}' is not a column")]
    PrimaryKeyNotAColumn {
        row_type: String,
        primary_key: String,
    },
    #[error("row type '{row_type}': foreign key '{column}' is not a column")]
    ForeignKeyNotAColumn { row_type: String, column: String },
    #[error("row type '{row_type}' refers to unknown row type '{target}'")]
    UnknownRowType { row_type: String, target: String },
    #[error("row type '{row_type}': navigation '{navigation}' targets '{target}', which has no foreign key to '{row_type}'")]
    NavigationWithoutForeignKey {
        row_type: String,
        navigation: String,
        target: String,
    },
}
