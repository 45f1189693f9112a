//! Test utilities for Lumen
//!
//! Helpers that run source text on a fresh VM with captured output and
//! unwrap the result into plain Rust values.

use crate::bytecode::Value;
use crate::vm::{InterpretError, OutputCapture, RuntimeError, VmConfig, VM};

/// Result type for test helpers
pub type TestResult<T> = Result<T, String>;

/// A VM whose printed output goes to the returned capture
#[must_use]
pub fn capturing_vm(config: VmConfig) -> (VM, OutputCapture) {
    let output = OutputCapture::new();
    let vm = VM::with_config(config).with_output(output.clone());
    (vm, output)
}

/// Evaluate an expression and return what it printed, without the newline
///
/// # Errors
/// Returns the formatted diagnostic if compilation or execution fails
pub fn eval(source: &str) -> TestResult<String> {
    let (mut vm, output) = capturing_vm(VmConfig::default());
    vm.interpret(source).map_err(|e| e.to_string())?;
    Ok(output.contents().trim_end_matches('\n').to_string())
}

/// Evaluate an expression and return its value
///
/// Object values are only meaningful while the VM is alive, so this is for
/// primitive results.
///
/// # Errors
/// Returns the formatted diagnostic if compilation or execution fails
pub fn eval_value(source: &str) -> TestResult<Value> {
    let (mut vm, _) = capturing_vm(VmConfig::default());
    vm.interpret(source).map_err(|e| e.to_string())
}

/// Evaluate an expression and expect a number
///
/// # Errors
/// Returns error if evaluation fails or the result is not a number
pub fn eval_number(source: &str) -> TestResult<f64> {
    let value = eval_value(source)?;
    value
        .as_number()
        .ok_or_else(|| format!("Expected number, got {}", value.type_name()))
}

/// Evaluate an expression and expect a boolean
///
/// # Errors
/// Returns error if evaluation fails or the result is not a boolean
pub fn eval_bool(source: &str) -> TestResult<bool> {
    let value = eval_value(source)?;
    value
        .as_bool()
        .ok_or_else(|| format!("Expected bool, got {}", value.type_name()))
}

/// Evaluate an expression that must fail at run time
///
/// # Errors
/// Returns error if the expression compiles with errors or runs successfully
pub fn eval_runtime_error(source: &str) -> TestResult<RuntimeError> {
    let (mut vm, _) = capturing_vm(VmConfig::default());
    match vm.interpret(source) {
        Err(InterpretError::Runtime(error)) => {
            if !vm.stack().is_empty() {
                return Err("stack was not reset after a runtime error".to_string());
            }
            Ok(error)
        }
        Err(other) => Err(format!("Expected runtime error, got: {other}")),
        Ok(value) => Err(format!("Expected runtime error, got {}", value.type_name())),
    }
}

/// Compile an expression that must fail, returning each formatted error
///
/// # Errors
/// Returns error if the expression compiles
pub fn compile_errors(source: &str) -> TestResult<Vec<String>> {
    let mut heap = crate::heap::Heap::new();
    match crate::bytecode::compile(source, &mut heap) {
        Ok(_) => Err(format!("Expected compile errors for {source:?}")),
        Err(errors) => Ok(errors.iter().map(ToString::to_string).collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eval_helpers() {
        assert_eq!(eval("1 + 2").unwrap(), "3");
        assert_eq!(eval_number("2 * 4").unwrap(), 8.0);
        assert!(eval_bool("1 < 2").unwrap());
        assert!(eval_number("true").is_err());
    }

    #[test]
    fn error_helpers() {
        let error = eval_runtime_error("nil * 2").unwrap();
        assert_eq!(error.line, 1);
        assert!(eval_runtime_error("1").is_err());
        assert_eq!(compile_errors("(").unwrap().len(), 1);
        assert!(compile_errors("1").is_err());
    }
}
