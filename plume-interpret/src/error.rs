//! The interpreter's error taxonomy.

use thiserror::Error;

/// Errors that abort interpretation of the current stream.
///
/// Inside a `BX … EX` bracket, [`Error::UnknownOperator`] and
/// [`Error::Collaborator`] are downgraded to warnings; everything else is
/// fatal regardless of the bracket.
#[derive(Error, Debug)]
pub enum Error {
    /// The lexer or object parser rejected the stream.
    #[error(transparent)]
    Syntax(#[from] plume_syntax::SyntaxError),

    /// An operand of the wrong kind was popped from the stack.
    #[error("type error: expected {expected} on the operand stack")]
    Type { expected: &'static str },

    /// A named resource is missing or of an unexpected category or subtype.
    #[error("resource error: {0}")]
    Resource(String),

    /// An operator outside the supported set, encountered outside `BX … EX`.
    #[error("unknown operator: {0}")]
    UnknownOperator(String),

    /// A font, image, color-space, pattern or shader collaborator failed.
    #[error("{0}")]
    Collaborator(String),
}

impl Error {
    /// Whether a `BX … EX` bracket downgrades this error to a warning.
    pub(crate) fn is_suppressible(&self) -> bool {
        matches!(self, Error::UnknownOperator(_) | Error::Collaborator(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
