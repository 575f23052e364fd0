use std::{
    num::{ParseFloatError, ParseIntError},
    path::PathBuf,
};
use thiserror::Error;

pub type VcfResult<T> = std::result::Result<T, VcfError>;

/// Coarse classification of a [`VcfError`], used by callers that decide
/// whether to stop or to skip-and-continue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Grammar,
    Schema,
    Structural,
    Io,
    Other,
}

#[derive(Debug, Error)]
pub enum VcfError {
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    ParseInt(#[from] ParseIntError),
    #[error(transparent)]
    ParseFloat(#[from] ParseFloatError),
    /// Malformed header line value syntax.
    #[error("Malformed header line: {message}")]
    Grammar { message: String },
    /// Unrecognized enum value, out-of-range index or invalid token.
    #[error("Invalid value: {message}")]
    Schema { message: String },
    /// Column or field counts and sample sets that disagree with the header.
    #[error("Inconsistent record: {message}")]
    Structural { message: String },
    #[error("Line {line_number}: {source}")]
    AtLine {
        line_number: usize,
        #[source]
        source: Box<VcfError>,
    },
    #[error("Invalid gzip header: {}", path.display())]
    InvalidGzipHeader { path: PathBuf },
}

impl VcfError {
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }

    pub fn grammar(message: impl Into<String>) -> Self {
        Self::Grammar {
            message: message.into(),
        }
    }

    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema {
            message: message.into(),
        }
    }

    pub fn structural(message: impl Into<String>) -> Self {
        Self::Structural {
            message: message.into(),
        }
    }

    pub fn at_line(self, line_number: usize) -> Self {
        match self {
            already @ Self::AtLine { .. } => already,
            other => Self::AtLine {
                line_number,
                source: Box::new(other),
            },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Grammar { .. } => ErrorKind::Grammar,
            Self::Schema { .. } | Self::ParseInt(_) | Self::ParseFloat(_) => ErrorKind::Schema,
            Self::Structural { .. } => ErrorKind::Structural,
            Self::Io(_) | Self::InvalidGzipHeader { .. } => ErrorKind::Io,
            Self::AtLine { source, .. } => source.kind(),
            Self::Message(_) => ErrorKind::Other,
        }
    }
}

#[macro_export]
macro_rules! vcf_error {
    ($($arg:tt)*) => {
        $crate::error::VcfError::message(format!($($arg)*))
    };
}
