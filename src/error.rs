use std::io;
use thiserror::Error;

use crate::error_value::ErrorValue;

/// Outcome of a failed parse attempt against a byte slice.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// More bytes are needed; retry once they arrive.
    #[error("incomplete")]
    Incomplete,

    #[error("invalid resp")]
    InvalidValue,

    #[error("invalid integer")]
    InvalidInteger,

    #[error("arrays nested deeper than {0} levels")]
    TooDeep(usize),

    /// A grammar error that can be sent back to the peer as is.
    #[error("{0}")]
    Protocol(ErrorValue),
}

impl ParseError {
    pub fn is_incomplete(&self) -> bool {
        matches!(self, ParseError::Incomplete)
    }

    pub fn error_value(&self) -> Option<&ErrorValue> {
        match self {
            ParseError::Protocol(value) => Some(value),
            _ => None,
        }
    }
}

impl From<ErrorValue> for ParseError {
    fn from(value: ErrorValue) -> Self {
        ParseError::Protocol(value)
    }
}

/// Errors returned by the buffered readers.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Read buffer would exceed {limit} bytes")]
    BufferTooLarge { limit: usize },

    #[error("End of stream")]
    Eof,

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    pub fn is_eof(&self) -> bool {
        matches!(self, Error::Eof)
    }

    /// The wire-encodable error to answer the peer with, if there is one.
    pub fn error_value(&self) -> Option<&ErrorValue> {
        match self {
            Error::Parse(err) => err.error_value(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

pub type ParseResult<T> = std::result::Result<T, ParseError>;
