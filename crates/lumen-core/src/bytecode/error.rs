//! Compiler error types

use std::fmt;

use thiserror::Error;

use crate::lexer::Span;

/// Result of compiling a source text; every reported error is returned
pub type CompileResult<T> = Result<T, Vec<CompileError>>;

/// A compilation error, formatted as `[line L] Error at 'x': message`
#[derive(Debug, Clone, PartialEq)]
pub struct CompileError {
    /// The kind of error
    pub kind: CompileErrorKind,

    /// Source line of the offending token
    pub line: u32,

    /// Where on that line the error points
    pub location: ErrorLocation,

    /// Byte span of the offending token
    pub span: Span,
}

impl CompileError {
    #[must_use]
    pub fn new(kind: CompileErrorKind, line: u32, location: ErrorLocation, span: Span) -> Self {
        Self {
            kind,
            line,
            location,
            span,
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[line {}] Error{}: {}", self.line, self.location, self.kind)
    }
}

impl std::error::Error for CompileError {}

/// The token an error is reported against
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorLocation {
    /// The end of input
    AtEnd,
    /// A token with this lexeme
    At(String),
    /// A scanner error; its message already describes the input
    Scanner,
}

impl fmt::Display for ErrorLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorLocation::AtEnd => f.write_str(" at end"),
            ErrorLocation::At(lexeme) => write!(f, " at '{lexeme}'"),
            ErrorLocation::Scanner => Ok(()),
        }
    }
}

/// The kind of compilation error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileErrorKind {
    #[error("Expect expression.")]
    ExpectExpression,

    #[error("Expect ')' after expression.")]
    ExpectRightParen,

    #[error("Expect end of expression.")]
    ExpectEndOfExpression,

    #[error("Expression nested too deeply.")]
    TooDeeplyNested,

    #[error("Too many constants in one chunk.")]
    TooManyConstants,

    #[error("Invalid number literal '{0}'.")]
    InvalidNumber(String),

    /// Malformed input reported by the scanner
    #[error("{0}")]
    Scanner(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_like_a_diagnostic() {
        let at_token = CompileError::new(
            CompileErrorKind::ExpectExpression,
            3,
            ErrorLocation::At("+".to_string()),
            Span::new(4, 5),
        );
        assert_eq!(at_token.to_string(), "[line 3] Error at '+': Expect expression.");

        let at_end = CompileError::new(
            CompileErrorKind::ExpectRightParen,
            1,
            ErrorLocation::AtEnd,
            Span::point(6),
        );
        assert_eq!(
            at_end.to_string(),
            "[line 1] Error at end: Expect ')' after expression."
        );

        let scanner = CompileError::new(
            CompileErrorKind::Scanner("Unexpected character.".to_string()),
            2,
            ErrorLocation::Scanner,
            Span::new(0, 1),
        );
        assert_eq!(scanner.to_string(), "[line 2] Error: Unexpected character.");
    }
}
