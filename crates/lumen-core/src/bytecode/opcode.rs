//! Instruction set for the Lumen virtual machine

/// Bytecode operation codes
///
/// A stack-based instruction set: operands come off the operand stack and
/// results go back onto it. Only `Constant` carries an inline operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OpCode {
    // ===== Literals =====
    /// Push a value from the constant pool
    /// Operand: u8 constant index
    Constant,

    /// Push nil
    Nil,

    /// Push true
    True,

    /// Push false
    False,

    // ===== Comparison =====
    /// Pop two values, push whether they are equal
    Equal,

    /// Pop two numbers (right, left), push left > right
    Greater,

    /// Pop two numbers (right, left), push left < right
    Less,

    // ===== Arithmetic =====
    /// Pop two numbers, push their sum
    Add,

    /// Pop two numbers (right, left), push left - right
    Subtract,

    /// Pop two numbers, push their product
    Multiply,

    /// Pop two numbers (right, left), push left / right
    Divide,

    /// Pop a value, push whether it is falsey
    Not,

    /// Pop a number, push its negation
    Negate,

    // ===== Control =====
    /// Pop the result, print it, and halt
    Return,
}

impl OpCode {
    /// Size of the instruction including operands
    #[must_use]
    pub const fn size(self) -> usize {
        match self {
            OpCode::Constant => 2,
            OpCode::Nil
            | OpCode::True
            | OpCode::False
            | OpCode::Equal
            | OpCode::Greater
            | OpCode::Less
            | OpCode::Add
            | OpCode::Subtract
            | OpCode::Multiply
            | OpCode::Divide
            | OpCode::Not
            | OpCode::Negate
            | OpCode::Return => 1,
        }
    }

    /// Mnemonic used by the disassembler
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            OpCode::Constant => "OP_CONSTANT",
            OpCode::Nil => "OP_NIL",
            OpCode::True => "OP_TRUE",
            OpCode::False => "OP_FALSE",
            OpCode::Equal => "OP_EQUAL",
            OpCode::Greater => "OP_GREATER",
            OpCode::Less => "OP_LESS",
            OpCode::Add => "OP_ADD",
            OpCode::Subtract => "OP_SUBTRACT",
            OpCode::Multiply => "OP_MULTIPLY",
            OpCode::Divide => "OP_DIVIDE",
            OpCode::Not => "OP_NOT",
            OpCode::Negate => "OP_NEGATE",
            OpCode::Return => "OP_RETURN",
        }
    }
}

impl std::fmt::Display for OpCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl TryFrom<u8> for OpCode {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(OpCode::Constant),
            1 => Ok(OpCode::Nil),
            2 => Ok(OpCode::True),
            3 => Ok(OpCode::False),
            4 => Ok(OpCode::Equal),
            5 => Ok(OpCode::Greater),
            6 => Ok(OpCode::Less),
            7 => Ok(OpCode::Add),
            8 => Ok(OpCode::Subtract),
            9 => Ok(OpCode::Multiply),
            10 => Ok(OpCode::Divide),
            11 => Ok(OpCode::Not),
            12 => Ok(OpCode::Negate),
            13 => Ok(OpCode::Return),
            _ => Err(value),
        }
    }
}
