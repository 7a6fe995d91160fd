use thiserror::Error;

/// Malformed token stream. Every variant carries the byte offset at which
/// decoding stopped.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    #[error("unexpected byte {byte:#04x} at offset {offset}")]
    UnexpectedByte { offset: usize, byte: u8 },

    #[error("expected decimal digit at offset {offset}")]
    ExpectedDigit { offset: usize },

    #[error("token length {length} at offset {offset} exceeds remaining {remaining} bytes")]
    LengthOverflow {
        offset: usize,
        length: usize,
        remaining: usize,
    },

    #[error("unexpected end of input at offset {offset}")]
    UnexpectedEnd { offset: usize },

    #[error("container opened at offset {offset} is not terminated")]
    Unterminated { offset: usize },

    #[error("nesting deeper than {limit} at offset {offset}")]
    TooDeep { offset: usize, limit: usize },

    #[error("invalid UTF-8 in token at offset {offset}")]
    InvalidUtf8 { offset: usize },

    #[error("illegal container at offset {offset}: {reason}")]
    IllegalShape { offset: usize, reason: String },

    #[error("trailing bytes after top-level container at offset {offset}")]
    TrailingBytes { offset: usize },
}

impl FormatError {
    /// Byte offset at which decoding failed.
    pub fn offset(&self) -> usize {
        match self {
            Self::UnexpectedByte { offset, .. }
            | Self::ExpectedDigit { offset }
            | Self::LengthOverflow { offset, .. }
            | Self::UnexpectedEnd { offset }
            | Self::Unterminated { offset }
            | Self::TooDeep { offset, .. }
            | Self::InvalidUtf8 { offset }
            | Self::IllegalShape { offset, .. }
            | Self::TrailingBytes { offset } => *offset,
        }
    }
}

pub type FormatResult<T> = Result<T, FormatError>;
