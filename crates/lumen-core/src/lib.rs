//! Lumen Core - compiler and virtual machine for the Lumen expression language
//!
//! This crate provides:
//! - Lexer: Tokenization of source text
//! - Heap: Interned string objects and the open-addressing table behind them
//! - Bytecode: Instruction set, chunks and the single-pass compiler
//! - VM: Stack-based bytecode execution

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Lexer module - tokenization of Lumen source text
pub mod lexer;

/// Object heap - string objects, handles and the intern table
pub mod heap;

/// Bytecode module - instruction set and compiler
pub mod bytecode;

/// Virtual Machine module - bytecode execution
pub mod vm;

/// Test utilities - helpers for evaluating Lumen source in tests
pub mod testutil;

pub use bytecode::{compile, Chunk, Compiler, Value};
pub use heap::{Heap, ObjRef, Table};
pub use lexer::{Scanner, Token, TokenKind};
pub use vm::{InterpretError, OutputCapture, RuntimeError, VmConfig, VM};
