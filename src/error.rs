use core::fmt;
use std::path::PathBuf;

/// Result alias for `guild`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the prediction pipeline.
///
/// Only data-integrity problems are errors. Quality-gating rejections
/// (a community or grid cell failing its AUROC cut) are ordinary
/// outcomes carried in return values, never `Err`.
#[derive(Debug)]
pub enum Error {
    /// Input was empty.
    EmptyInput,

    /// Matrix dimension mismatch (usize).
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Found dimension.
        found: usize,
    },

    /// Shape mismatch (string description).
    ShapeMismatch {
        /// Expected shape description.
        expected: String,
        /// Actual shape description.
        actual: String,
    },

    /// Protein identifier absent from a similarity matrix universe.
    UnknownProtein {
        /// The identifier that failed to resolve.
        pid: String,
    },

    /// Score column length does not match the molecule count.
    ColumnLength {
        /// Column name.
        column: String,
        /// Expected length (molecule count).
        expected: usize,
        /// Actual column length.
        found: usize,
    },

    /// Invalid parameter value.
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Error message.
        message: &'static str,
    },

    /// File I/O error with path context.
    Io {
        /// Path that caused the error.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Malformed input file (bundle, table, or token list).
    Parse {
        /// Path that failed to parse.
        path: PathBuf,
        /// What went wrong.
        message: String,
    },

    /// A required column is missing from a tabular input.
    MissingColumn {
        /// Path of the table.
        path: PathBuf,
        /// Name of the missing column.
        column: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::EmptyInput => write!(f, "empty input provided"),
            Error::DimensionMismatch { expected, found } => {
                write!(f, "dimension mismatch: expected {expected}, found {found}")
            }
            Error::ShapeMismatch { expected, actual } => {
                write!(f, "shape mismatch: expected {expected}, actual {actual}")
            }
            Error::UnknownProtein { pid } => {
                write!(f, "protein '{pid}' is not in the similarity matrix universe")
            }
            Error::ColumnLength {
                column,
                expected,
                found,
            } => write!(
                f,
                "column '{column}' has {found} values, expected {expected}"
            ),
            Error::InvalidParameter { name, message } => {
                write!(f, "invalid parameter '{name}': {message}")
            }
            Error::Io { path, source } => write!(f, "{}: {source}", path.display()),
            Error::Parse { path, message } => write!(f, "{}: {message}", path.display()),
            Error::MissingColumn { path, column } => {
                write!(f, "{}: missing column '{column}'", path.display())
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}
