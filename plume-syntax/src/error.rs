//! Error types for content-stream lexing and parsing.

use thiserror::Error;

/// Errors produced while lexing or parsing a content stream.
///
/// Offsets are byte positions into the stream the lexer was constructed
/// with, pointing at the start of the offending construct.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    #[error("malformed number at offset {0}")]
    MalformedNumber(usize),

    #[error("unterminated string starting at offset {0}")]
    UnterminatedString(usize),

    #[error("unterminated hex string starting at offset {0}")]
    UnterminatedHexString(usize),

    #[error("dictionary at offset {0} not closed with '>>'")]
    UnterminatedDict(usize),

    #[error("array at offset {0} not closed with ']'")]
    UnterminatedArray(usize),

    #[error("expected a name key in dictionary at offset {0}")]
    ExpectedDictKey(usize),

    #[error("expected a value in dictionary at offset {0}")]
    ExpectedDictValue(usize),

    #[error("inline image data starting at offset {0} has no 'EI' terminator")]
    UnterminatedImageData(usize),
}

pub type Result<T> = std::result::Result<T, SyntaxError>;
