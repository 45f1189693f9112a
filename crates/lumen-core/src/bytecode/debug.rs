//! Bytecode disassembler for debugging

use std::fmt::{self, Write};

use super::chunk::Chunk;
use super::opcode::OpCode;
use super::value::Value;
use crate::heap::Heap;

/// Disassemble a chunk to a string
pub fn disassemble_chunk(chunk: &Chunk, heap: &Heap, name: &str) -> String {
    let mut output = format!("== {name} ==\n");

    let mut offset = 0;
    while offset < chunk.len() {
        offset = write_instruction(&mut output, chunk, heap, offset).unwrap_or(chunk.len());
    }

    output
}

/// Disassemble the instruction at `offset`, returning it with the offset of
/// the next instruction
pub fn disassemble_instruction(chunk: &Chunk, heap: &Heap, offset: usize) -> (String, usize) {
    let mut output = String::new();
    let next = write_instruction(&mut output, chunk, heap, offset).unwrap_or(offset + 1);
    (output, next)
}

/// Render the operand stack followed by the instruction about to execute
pub fn trace_instruction(chunk: &Chunk, heap: &Heap, offset: usize, stack: &[Value]) -> String {
    let mut output = String::from("          ");
    for value in stack {
        output.push_str(&format!("[ {} ]", value.display(heap)));
    }
    output.push('\n');
    let (instruction, _) = disassemble_instruction(chunk, heap, offset);
    output.push_str(&instruction);
    output
}

fn write_instruction(
    output: &mut impl Write,
    chunk: &Chunk,
    heap: &Heap,
    offset: usize,
) -> Result<usize, fmt::Error> {
    write!(output, "{offset:04} ")?;

    // Line number, or | when it repeats the previous byte's
    let line = chunk.get_line(offset);
    if offset > 0 && line == chunk.get_line(offset - 1) {
        write!(output, "   | ")?;
    } else {
        write!(output, "{line:4} ")?;
    }

    let Some(byte) = chunk.read_byte(offset) else {
        writeln!(output, "Invalid offset")?;
        return Ok(offset + 1);
    };

    let Ok(opcode) = OpCode::try_from(byte) else {
        writeln!(output, "Unknown opcode {byte}")?;
        return Ok(offset + 1);
    };

    match opcode {
        OpCode::Constant => {
            let Some(index) = chunk.read_byte(offset + 1) else {
                writeln!(output, "{:<16} <missing operand>", opcode.name())?;
                return Ok(chunk.len());
            };
            match chunk.get_constant(index) {
                Some(value) => writeln!(
                    output,
                    "{:<16} {:4} '{}'",
                    opcode.name(),
                    index,
                    value.display(heap)
                )?,
                None => writeln!(output, "{:<16} {:4} <invalid>", opcode.name(), index)?,
            }
        }
        _ => writeln!(output, "{}", opcode.name())?,
    }

    Ok(offset + opcode.size())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disassembles_a_chunk() {
        let heap = Heap::new();
        let mut chunk = Chunk::new();
        let index = chunk.add_constant(Value::Number(1.2)).unwrap();
        chunk.write_op_u8(OpCode::Constant, index, 123);
        chunk.write_op(OpCode::Negate, 123);
        chunk.write_op(OpCode::Return, 124);

        let listing = disassemble_chunk(&chunk, &heap, "test chunk");
        assert_eq!(
            listing,
            "== test chunk ==\n\
             0000  123 OP_CONSTANT         0 '1.2'\n\
             0002    | OP_NEGATE\n\
             0003  124 OP_RETURN\n"
        );
    }

    #[test]
    fn string_constants_print_raw() {
        let mut heap = Heap::new();
        let mut chunk = Chunk::new();
        let greeting = heap.copy_string("hi");
        let index = chunk.add_constant(Value::Obj(greeting)).unwrap();
        chunk.write_op_u8(OpCode::Constant, index, 1);

        let (line, next) = disassemble_instruction(&chunk, &heap, 0);
        assert_eq!(line, "0000    1 OP_CONSTANT         0 'hi'\n");
        assert_eq!(next, 2);
    }

    #[test]
    fn unknown_opcode() {
        let heap = Heap::new();
        let mut chunk = Chunk::new();
        chunk.write(200, 1);

        let (line, next) = disassemble_instruction(&chunk, &heap, 0);
        assert_eq!(line, "0000    1 Unknown opcode 200\n");
        assert_eq!(next, 1);
    }

    #[test]
    fn trace_shows_stack() {
        let heap = Heap::new();
        let mut chunk = Chunk::new();
        chunk.write_op(OpCode::Add, 1);

        let trace = trace_instruction(
            &chunk,
            &heap,
            0,
            &[Value::Number(1.0), Value::Bool(true)],
        );
        assert_eq!(trace, "          [ 1 ][ true ]\n0000    1 OP_ADD\n");
    }
}
