//! Single-pass bytecode compiler
//!
//! The compiler pulls tokens straight from the scanner and emits bytecode as
//! it goes, without building a syntax tree. Expressions are parsed with an
//! operator-precedence (Pratt) parser: every token kind has a [`ParseRule`]
//! naming what to do when the token starts an expression (prefix), what to
//! do when it follows one (infix), and how tightly it binds as an infix
//! operator.
//!
//! Errors are recorded, not thrown. After the first error the parser enters
//! panic mode and stays silent for the rest of the compilation; parsing
//! still runs to the end of input but the chunk is discarded.

use tracing::debug;

use super::chunk::Chunk;
use super::error::{CompileError, CompileErrorKind, CompileResult, ErrorLocation};
use super::opcode::OpCode;
use super::value::Value;
use crate::heap::Heap;
use crate::lexer::{Scanner, Token, TokenKind};

/// Compile a source string into a chunk, interning literals into `heap`
pub fn compile(source: &str, heap: &mut Heap) -> CompileResult<Chunk> {
    Compiler::new(Scanner::new(source), heap).compile()
}

/// Deepest prefix nesting (groupings and unary operators) one expression may use
pub const MAX_NESTING: usize = 1024;

/// Binding power of infix operators, weakest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    None,
    Assignment, // =
    Or,         // or
    And,        // and
    Equality,   // == !=
    Comparison, // < > <= >=
    Term,       // + -
    Factor,     // * /
    Unary,      // ! -
    Call,       // . ()
    Primary,
}

impl Precedence {
    /// The next tighter level; right operands of left-associative binary
    /// operators are parsed at this level
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Precedence::None => Precedence::Assignment,
            Precedence::Assignment => Precedence::Or,
            Precedence::Or => Precedence::And,
            Precedence::And => Precedence::Equality,
            Precedence::Equality => Precedence::Comparison,
            Precedence::Comparison => Precedence::Term,
            Precedence::Term => Precedence::Factor,
            Precedence::Factor => Precedence::Unary,
            Precedence::Unary => Precedence::Call,
            Precedence::Call | Precedence::Primary => Precedence::Primary,
        }
    }
}

/// Parse actions a rule can name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseFn {
    Grouping,
    Unary,
    Binary,
    Number,
    String,
    Literal,
}

#[derive(Debug, Clone, Copy)]
struct ParseRule {
    prefix: Option<ParseFn>,
    infix: Option<ParseFn>,
    precedence: Precedence,
}

impl ParseRule {
    const fn new(prefix: Option<ParseFn>, infix: Option<ParseFn>, precedence: Precedence) -> Self {
        Self {
            prefix,
            infix,
            precedence,
        }
    }
}

fn get_rule(kind: TokenKind) -> ParseRule {
    use ParseFn as F;
    match kind {
        TokenKind::LeftParen => ParseRule::new(Some(F::Grouping), None, Precedence::None),
        TokenKind::Minus => ParseRule::new(Some(F::Unary), Some(F::Binary), Precedence::Term),
        TokenKind::Plus => ParseRule::new(None, Some(F::Binary), Precedence::Term),
        TokenKind::Slash | TokenKind::Star => {
            ParseRule::new(None, Some(F::Binary), Precedence::Factor)
        }
        TokenKind::Bang => ParseRule::new(Some(F::Unary), None, Precedence::None),
        TokenKind::BangEqual | TokenKind::EqualEqual => {
            ParseRule::new(None, Some(F::Binary), Precedence::Equality)
        }
        TokenKind::Greater
        | TokenKind::GreaterEqual
        | TokenKind::Less
        | TokenKind::LessEqual => ParseRule::new(None, Some(F::Binary), Precedence::Comparison),
        TokenKind::Number => ParseRule::new(Some(F::Number), None, Precedence::None),
        TokenKind::String => ParseRule::new(Some(F::String), None, Precedence::None),
        TokenKind::False | TokenKind::True | TokenKind::Nil => {
            ParseRule::new(Some(F::Literal), None, Precedence::None)
        }
        _ => ParseRule::new(None, None, Precedence::None),
    }
}

/// Token window and error flags for one compilation
struct Parser<'src> {
    current: Token<'src>,
    previous: Token<'src>,
    /// Set by the first error; decides whether compilation succeeded
    had_error: bool,
    /// Suppresses reports after the first error
    panic_mode: bool,
}

/// Bytecode compiler over a token stream
pub struct Compiler<'src, 'heap, I>
where
    I: Iterator<Item = Token<'src>>,
{
    tokens: I,
    heap: &'heap mut Heap,
    chunk: Chunk,
    parser: Parser<'src>,
    errors: Vec<CompileError>,
    depth: usize,
}

impl<'src, 'heap, I> Compiler<'src, 'heap, I>
where
    I: Iterator<Item = Token<'src>>,
{
    /// Create a compiler that reads `tokens` and interns string literals
    /// into `heap`
    pub fn new(tokens: I, heap: &'heap mut Heap) -> Self {
        let start = Token::eof(1, 0);
        Self {
            tokens,
            heap,
            chunk: Chunk::new(),
            parser: Parser {
                current: start,
                previous: start,
                had_error: false,
                panic_mode: false,
            },
            errors: Vec::new(),
            depth: 0,
        }
    }

    /// Compile a single expression followed by end of input
    ///
    /// Returns every reported error if compilation failed.
    pub fn compile(mut self) -> CompileResult<Chunk> {
        self.advance();
        self.expression();
        self.consume(TokenKind::Eof, CompileErrorKind::ExpectEndOfExpression);
        self.emit_op(OpCode::Return);

        if self.parser.had_error {
            debug!(errors = self.errors.len(), "compilation failed");
            Err(self.errors)
        } else {
            debug!(
                bytes = self.chunk.len(),
                constants = self.chunk.constants().len(),
                "compiled chunk"
            );
            Ok(self.chunk)
        }
    }

    // ===== Token handling =====

    fn next_token(&mut self) -> Token<'src> {
        let fallback = Token::eof(self.parser.current.line, self.parser.current.span.end);
        self.tokens.next().unwrap_or(fallback)
    }

    fn advance(&mut self) {
        self.parser.previous = self.parser.current;
        loop {
            self.parser.current = self.next_token();
            if self.parser.current.kind != TokenKind::Error {
                break;
            }
            let message = self.parser.current.lexeme.to_string();
            self.error_at_current(CompileErrorKind::Scanner(message));
        }
    }

    fn consume(&mut self, kind: TokenKind, error: CompileErrorKind) {
        if self.parser.current.kind == kind {
            self.advance();
        } else {
            self.error_at_current(error);
        }
    }

    // ===== Error reporting =====

    fn error_at_current(&mut self, kind: CompileErrorKind) {
        self.error_at(self.parser.current, kind);
    }

    fn error(&mut self, kind: CompileErrorKind) {
        self.error_at(self.parser.previous, kind);
    }

    fn error_at(&mut self, token: Token<'src>, kind: CompileErrorKind) {
        if self.parser.panic_mode {
            return;
        }
        self.parser.panic_mode = true;
        self.parser.had_error = true;

        let location = match token.kind {
            TokenKind::Eof => ErrorLocation::AtEnd,
            TokenKind::Error => ErrorLocation::Scanner,
            _ => ErrorLocation::At(token.lexeme.to_string()),
        };
        let error = CompileError::new(kind, token.line, location, token.span);
        debug!(%error, "compile error");
        self.errors.push(error);
    }

    // ===== Emission =====

    fn emit_byte(&mut self, byte: u8) {
        self.chunk.write(byte, self.parser.previous.line);
    }

    fn emit_op(&mut self, op: OpCode) {
        self.emit_byte(op as u8);
    }

    fn emit_ops(&mut self, first: OpCode, second: OpCode) {
        self.emit_op(first);
        self.emit_op(second);
    }

    fn make_constant(&mut self, value: Value) -> u8 {
        if let Some(index) = self.chunk.add_constant(value) {
            index
        } else {
            self.error(CompileErrorKind::TooManyConstants);
            0
        }
    }

    fn emit_constant(&mut self, value: Value) {
        let index = self.make_constant(value);
        self.emit_op(OpCode::Constant);
        self.emit_byte(index);
    }

    // ===== Expressions =====

    fn expression(&mut self) {
        self.parse_precedence(Precedence::Assignment);
    }

    fn parse_precedence(&mut self, precedence: Precedence) {
        if self.depth >= MAX_NESTING {
            self.error_at_current(CompileErrorKind::TooDeeplyNested);
            return;
        }
        self.depth += 1;
        self.parse_operators(precedence);
        self.depth -= 1;
    }

    fn parse_operators(&mut self, precedence: Precedence) {
        self.advance();
        let Some(prefix) = get_rule(self.parser.previous.kind).prefix else {
            self.error(CompileErrorKind::ExpectExpression);
            return;
        };
        self.apply(prefix);

        while precedence <= get_rule(self.parser.current.kind).precedence {
            self.advance();
            if let Some(infix) = get_rule(self.parser.previous.kind).infix {
                self.apply(infix);
            }
        }
    }

    fn apply(&mut self, parse_fn: ParseFn) {
        match parse_fn {
            ParseFn::Grouping => self.grouping(),
            ParseFn::Unary => self.unary(),
            ParseFn::Binary => self.binary(),
            ParseFn::Number => self.number(),
            ParseFn::String => self.string(),
            ParseFn::Literal => self.literal(),
        }
    }

    fn grouping(&mut self) {
        self.expression();
        self.consume(TokenKind::RightParen, CompileErrorKind::ExpectRightParen);
    }

    fn unary(&mut self) {
        let operator = self.parser.previous.kind;
        self.parse_precedence(Precedence::Unary);

        match operator {
            TokenKind::Minus => self.emit_op(OpCode::Negate),
            TokenKind::Bang => self.emit_op(OpCode::Not),
            _ => unreachable!("no unary rule for {operator:?}"),
        }
    }

    fn binary(&mut self) {
        let operator = self.parser.previous.kind;
        let rule = get_rule(operator);
        self.parse_precedence(rule.precedence.next());

        match operator {
            TokenKind::BangEqual => self.emit_ops(OpCode::Equal, OpCode::Not),
            TokenKind::EqualEqual => self.emit_op(OpCode::Equal),
            TokenKind::Greater => self.emit_op(OpCode::Greater),
            TokenKind::GreaterEqual => self.emit_ops(OpCode::Less, OpCode::Not),
            TokenKind::Less => self.emit_op(OpCode::Less),
            TokenKind::LessEqual => self.emit_ops(OpCode::Greater, OpCode::Not),
            TokenKind::Plus => self.emit_op(OpCode::Add),
            TokenKind::Minus => self.emit_op(OpCode::Subtract),
            TokenKind::Star => self.emit_op(OpCode::Multiply),
            TokenKind::Slash => self.emit_op(OpCode::Divide),
            _ => unreachable!("no binary rule for {operator:?}"),
        }
    }

    fn number(&mut self) {
        let lexeme = self.parser.previous.lexeme;
        match lexeme.parse::<f64>() {
            Ok(value) => self.emit_constant(Value::Number(value)),
            Err(_) => self.error(CompileErrorKind::InvalidNumber(lexeme.to_string())),
        }
    }

    fn string(&mut self) {
        let lexeme = self.parser.previous.lexeme;
        let chars = lexeme
            .strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))
            .unwrap_or(lexeme);
        let handle = self.heap.copy_string(chars);
        self.emit_constant(Value::Obj(handle));
    }

    fn literal(&mut self) {
        match self.parser.previous.kind {
            TokenKind::False => self.emit_op(OpCode::False),
            TokenKind::True => self.emit_op(OpCode::True),
            TokenKind::Nil => self.emit_op(OpCode::Nil),
            kind => unreachable!("no literal rule for {kind:?}"),
        }
    }
}
