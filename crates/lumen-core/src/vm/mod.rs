//! Virtual Machine for the Lumen language
//!
//! A stack-based bytecode interpreter. The VM owns the object heap, so
//! everything compiled or produced while it runs is released when the VM is
//! dropped. Each call to [`VM::run`] starts from an empty operand stack and
//! stops at the first `RETURN` or runtime error.

mod config;
mod error;
mod output;

pub use config::{VmConfig, DEFAULT_STACK_MAX};
pub use error::{
    InterpretError, RuntimeError, RuntimeErrorKind, RuntimeResult, EXIT_COMPILE_ERROR,
    EXIT_RUNTIME_ERROR,
};
pub use output::OutputCapture;

use std::io::{self, Write};

use tracing::{debug, instrument, trace};

use crate::bytecode::{compile, disassemble_chunk, trace_instruction, Chunk, OpCode, Value};
use crate::heap::Heap;

type ExecResult<T> = Result<T, RuntimeErrorKind>;

/// The Lumen virtual machine
pub struct VM {
    /// Operand stack, never longer than `config.stack_max`
    stack: Vec<Value>,

    /// Offset of the next byte to execute in the current chunk
    ip: usize,

    /// Owner of every object created by compiled code
    heap: Heap,

    config: VmConfig,

    /// Where `RETURN` prints its result
    output: Box<dyn Write>,
}

impl VM {
    /// Create a VM with default settings that prints to stdout
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(VmConfig::default())
    }

    #[must_use]
    pub fn with_config(config: VmConfig) -> Self {
        Self {
            stack: Vec::with_capacity(config.stack_max.min(DEFAULT_STACK_MAX)),
            ip: 0,
            heap: Heap::new(),
            config,
            output: Box::new(io::stdout()),
        }
    }

    /// Redirect printed results to `output`
    #[must_use]
    pub fn with_output(mut self, output: impl Write + 'static) -> Self {
        self.output = Box::new(output);
        self
    }

    #[must_use]
    pub fn config(&self) -> &VmConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut VmConfig {
        &mut self.config
    }

    #[must_use]
    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    /// Mutable heap access, for building chunks by hand
    pub fn heap_mut(&mut self) -> &mut Heap {
        &mut self.heap
    }

    /// Current operand stack, bottom first
    #[must_use]
    pub fn stack(&self) -> &[Value] {
        &self.stack
    }

    /// Compile and run one expression
    ///
    /// Nothing is executed if compilation fails. The result is printed to
    /// the VM's output before it is returned.
    #[instrument(level = "debug", skip_all, fields(len = source.len()))]
    pub fn interpret(&mut self, source: &str) -> Result<Value, InterpretError> {
        let chunk = compile(source, &mut self.heap).map_err(InterpretError::Compile)?;

        if self.config.print_code {
            debug!(
                target: "lumen_core::code",
                "\n{}",
                disassemble_chunk(&chunk, &self.heap, "code")
            );
        }

        let value = self.run(&chunk)?;
        Ok(value)
    }

    /// Execute a compiled chunk
    pub fn run(&mut self, chunk: &Chunk) -> RuntimeResult<Value> {
        self.reset_stack();
        self.ip = 0;

        match self.execute(chunk) {
            Ok(value) => {
                debug!(result = %value.display(&self.heap), "run finished");
                Ok(value)
            }
            Err(kind) => {
                let error = self.runtime_error(chunk, kind);
                self.reset_stack();
                debug!(%error, "runtime error");
                Err(error)
            }
        }
    }

    /// Main execution loop
    fn execute(&mut self, chunk: &Chunk) -> ExecResult<Value> {
        loop {
            if self.config.trace_execution {
                trace!(
                    target: "lumen_core::trace",
                    "\n{}",
                    trace_instruction(chunk, &self.heap, self.ip, &self.stack)
                );
            }

            let byte = self.read_byte(chunk)?;
            let opcode = OpCode::try_from(byte).map_err(RuntimeErrorKind::InvalidOpcode)?;

            match opcode {
                OpCode::Constant => {
                    let index = self.read_byte(chunk)?;
                    let value = chunk
                        .get_constant(index)
                        .ok_or(RuntimeErrorKind::InvalidConstant(index))?;
                    self.push(value)?;
                }

                OpCode::Nil => self.push(Value::Nil)?,
                OpCode::True => self.push(Value::Bool(true))?,
                OpCode::False => self.push(Value::Bool(false))?,

                OpCode::Equal => {
                    let b = self.pop()?;
                    let a = self.pop()?;
                    self.push(Value::Bool(a == b))?;
                }

                OpCode::Greater => self.binary_op(|a, b| Value::Bool(a > b))?,
                OpCode::Less => self.binary_op(|a, b| Value::Bool(a < b))?,
                OpCode::Add => self.binary_op(|a, b| Value::Number(a + b))?,
                OpCode::Subtract => self.binary_op(|a, b| Value::Number(a - b))?,
                OpCode::Multiply => self.binary_op(|a, b| Value::Number(a * b))?,
                OpCode::Divide => self.binary_op(|a, b| Value::Number(a / b))?,

                OpCode::Not => {
                    let value = self.pop()?;
                    self.push(Value::Bool(value.is_falsey()))?;
                }

                OpCode::Negate => {
                    let Some(n) = self.peek(0)?.as_number() else {
                        return Err(RuntimeErrorKind::OperandMustBeNumber);
                    };
                    self.pop()?;
                    self.push(Value::Number(-n))?;
                }

                OpCode::Return => {
                    let result = self.pop()?;
                    writeln!(self.output, "{}", result.display(&self.heap))
                        .map_err(|e| RuntimeErrorKind::Output(e.to_string()))?;
                    return Ok(result);
                }
            }
        }
    }

    #[inline]
    fn read_byte(&mut self, chunk: &Chunk) -> ExecResult<u8> {
        let byte = chunk
            .read_byte(self.ip)
            .ok_or(RuntimeErrorKind::UnexpectedEnd)?;
        self.ip += 1;
        Ok(byte)
    }

    /// Pop two numbers, push `op(left, right)`
    ///
    /// Operands are type-checked in place so a failure leaves them on the
    /// stack for the error path to discard.
    fn binary_op(&mut self, op: impl FnOnce(f64, f64) -> Value) -> ExecResult<()> {
        let (Some(b), Some(a)) = (self.peek(0)?.as_number(), self.peek(1)?.as_number()) else {
            return Err(RuntimeErrorKind::OperandsMustBeNumbers);
        };
        self.pop()?;
        self.pop()?;
        self.push(op(a, b))
    }

    // ===== Stack operations =====

    #[inline]
    fn push(&mut self, value: Value) -> ExecResult<()> {
        if self.stack.len() >= self.config.stack_max {
            return Err(RuntimeErrorKind::StackOverflow);
        }
        self.stack.push(value);
        Ok(())
    }

    #[inline]
    fn pop(&mut self) -> ExecResult<Value> {
        debug_assert!(!self.stack.is_empty(), "pop from an empty operand stack");
        self.stack.pop().ok_or(RuntimeErrorKind::StackUnderflow)
    }

    #[inline]
    fn peek(&self, distance: usize) -> ExecResult<Value> {
        self.stack
            .len()
            .checked_sub(1 + distance)
            .and_then(|index| self.stack.get(index))
            .copied()
            .ok_or(RuntimeErrorKind::StackUnderflow)
    }

    fn reset_stack(&mut self) {
        self.stack.clear();
    }

    // ===== Error handling =====

    /// Attach the line of the instruction that just ran
    fn runtime_error(&self, chunk: &Chunk, kind: RuntimeErrorKind) -> RuntimeError {
        let line = chunk.get_line(self.ip.saturating_sub(1));
        RuntimeError::new(kind, line)
    }
}

impl Default for VM {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for VM {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VM")
            .field("stack", &self.stack)
            .field("ip", &self.ip)
            .field("objects", &self.heap.object_count())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
