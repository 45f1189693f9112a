//! Bytecode chunk - instructions, constant pool and line table

use super::opcode::OpCode;
use super::value::Value;

/// Largest number of constants a chunk can hold; indices are one byte
pub const MAX_CONSTANTS: usize = u8::MAX as usize + 1;

/// A chunk of bytecode
///
/// `lines` runs parallel to `code`: `lines[i]` is the source line of
/// `code[i]`, operand bytes included. The constant pool is append-only and
/// never deduplicated.
#[derive(Clone, Default)]
pub struct Chunk {
    /// Raw bytecode instructions
    code: Vec<u8>,

    /// Source line of every byte in `code`
    lines: Vec<u32>,

    /// Constant pool
    constants: Vec<Value>,
}

impl Chunk {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of bytes in the chunk
    #[must_use]
    pub fn len(&self) -> usize {
        self.code.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    #[must_use]
    pub fn code(&self) -> &[u8] {
        &self.code
    }

    #[must_use]
    pub fn lines(&self) -> &[u32] {
        &self.lines
    }

    #[must_use]
    pub fn constants(&self) -> &[Value] {
        &self.constants
    }

    /// Get a constant by index
    #[must_use]
    pub fn get_constant(&self, index: u8) -> Option<Value> {
        self.constants.get(usize::from(index)).copied()
    }

    /// Append a byte tagged with its source line
    pub fn write(&mut self, byte: u8, line: u32) {
        self.code.push(byte);
        self.lines.push(line);
    }

    pub fn write_op(&mut self, op: OpCode, line: u32) {
        self.write(op as u8, line);
    }

    /// Write an opcode followed by a one-byte operand
    pub fn write_op_u8(&mut self, op: OpCode, operand: u8, line: u32) {
        self.write(op as u8, line);
        self.write(operand, line);
    }

    /// Add a constant to the pool and return its index
    ///
    /// Returns `None`, leaving the pool untouched, once [`MAX_CONSTANTS`]
    /// entries exist.
    #[allow(clippy::cast_possible_truncation)]
    pub fn add_constant(&mut self, value: Value) -> Option<u8> {
        let index = self.constants.len();
        if index >= MAX_CONSTANTS {
            return None;
        }
        self.constants.push(value);
        Some(index as u8)
    }

    #[must_use]
    pub fn read_byte(&self, offset: usize) -> Option<u8> {
        self.code.get(offset).copied()
    }

    /// Source line of the byte at `offset`
    ///
    /// Offsets past the end report the last line, or 0 for an empty chunk.
    #[must_use]
    pub fn get_line(&self, offset: usize) -> u32 {
        self.lines
            .get(offset)
            .or_else(|| self.lines.last())
            .copied()
            .unwrap_or(0)
    }
}

impl std::fmt::Debug for Chunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chunk")
            .field("code_len", &self.code.len())
            .field("constants_len", &self.constants.len())
            .finish()
    }
}
