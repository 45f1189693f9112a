//! Bytecode module for the Lumen virtual machine
//!
//! This module provides:
//! - `OpCode`: The bytecode instruction set
//! - `Value`: Runtime value representation
//! - `Chunk`: A sequence of bytecode instructions with its constants
//! - `Compiler`: Single-pass token-to-bytecode compilation
//! - Disassembler utilities for debugging

mod chunk;
mod compiler;
mod debug;
mod error;
mod opcode;
mod value;

pub use chunk::{Chunk, MAX_CONSTANTS};
pub use compiler::{compile, Compiler, Precedence, MAX_NESTING};
pub use debug::{disassemble_chunk, disassemble_instruction, trace_instruction};
pub use error::{CompileError, CompileErrorKind, CompileResult, ErrorLocation};
pub use opcode::OpCode;
pub use value::{Value, ValueDisplay};
