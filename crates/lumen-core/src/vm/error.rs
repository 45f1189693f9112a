//! Runtime errors for the Lumen virtual machine

use std::fmt;

use thiserror::Error;

use crate::bytecode::CompileError;

/// Result type for VM execution
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Exit status for input that failed to compile (sysexits `EX_DATAERR`)
pub const EXIT_COMPILE_ERROR: i32 = 65;
/// Exit status for a program that failed at run time (sysexits `EX_SOFTWARE`)
pub const EXIT_RUNTIME_ERROR: i32 = 70;

/// A runtime error that stopped execution
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeError {
    /// The kind of error
    pub kind: RuntimeErrorKind,

    /// Source line of the instruction that failed
    pub line: u32,
}

impl RuntimeError {
    #[must_use]
    pub fn new(kind: RuntimeErrorKind, line: u32) -> Self {
        Self { kind, line }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n[line {}] in script", self.kind, self.line)
    }
}

impl std::error::Error for RuntimeError {}

/// The kind of runtime error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuntimeErrorKind {
    #[error("Operands must be numbers.")]
    OperandsMustBeNumbers,

    #[error("Operand must be a number.")]
    OperandMustBeNumber,

    #[error("Stack overflow.")]
    StackOverflow,

    // Internal errors: only reachable with a malformed chunk
    #[error("Stack underflow.")]
    StackUnderflow,

    #[error("Unknown opcode {0}.")]
    InvalidOpcode(u8),

    #[error("Constant index {0} is out of range.")]
    InvalidConstant(u8),

    #[error("Unexpected end of bytecode.")]
    UnexpectedEnd,

    #[error("Could not write output: {0}")]
    Output(String),
}

impl RuntimeErrorKind {
    /// True for errors caused by a malformed chunk or a broken output sink
    /// rather than by the program being run
    #[must_use]
    pub fn is_internal(&self) -> bool {
        !matches!(
            self,
            RuntimeErrorKind::OperandsMustBeNumbers
                | RuntimeErrorKind::OperandMustBeNumber
                | RuntimeErrorKind::StackOverflow
        )
    }
}

/// Failure of [`VM::interpret`](super::VM::interpret)
#[derive(Error, Debug, Clone)]
pub enum InterpretError {
    /// The source did not compile; nothing was executed
    #[error("{}", join_lines(.0))]
    Compile(Vec<CompileError>),

    /// Execution stopped at a runtime error
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl InterpretError {
    /// Process exit status for this failure
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            InterpretError::Compile(_) => EXIT_COMPILE_ERROR,
            InterpretError::Runtime(_) => EXIT_RUNTIME_ERROR,
        }
    }
}

fn join_lines(errors: &[CompileError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::{CompileErrorKind, ErrorLocation};
    use crate::lexer::Span;

    #[test]
    fn runtime_error_format() {
        let error = RuntimeError::new(RuntimeErrorKind::OperandsMustBeNumbers, 4);
        assert_eq!(error.to_string(), "Operands must be numbers.\n[line 4] in script");
    }

    #[test]
    fn internal_kinds() {
        assert!(!RuntimeErrorKind::StackOverflow.is_internal());
        assert!(RuntimeErrorKind::StackUnderflow.is_internal());
        assert!(RuntimeErrorKind::InvalidOpcode(99).is_internal());
    }

    #[test]
    fn exit_codes() {
        let runtime = InterpretError::from(RuntimeError::new(RuntimeErrorKind::StackOverflow, 1));
        assert_eq!(runtime.exit_code(), 70);

        let compile = InterpretError::Compile(vec![CompileError::new(
            CompileErrorKind::ExpectExpression,
            1,
            ErrorLocation::AtEnd,
            Span::point(0),
        )]);
        assert_eq!(compile.exit_code(), 65);
        assert_eq!(compile.to_string(), "[line 1] Error at end: Expect expression.");
    }
}
