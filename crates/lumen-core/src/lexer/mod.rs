//! Scanner for Lumen source text
//!
//! The scanner turns source text into a stream of [`Token`]s that the
//! compiler pulls one at a time. It never fails: malformed input becomes an
//! [`TokenKind::Error`] token whose lexeme is the diagnostic message, and the
//! stream always ends with [`TokenKind::Eof`] (repeated forever once reached).

#![allow(clippy::cast_possible_truncation)] // u32 offsets; sources over 4GB are unsupported

mod span;
mod token;

pub use span::{LineIndex, Span};
pub use token::TokenKind;

use logos::Logos;

/// Diagnostic carried by error tokens for characters no rule matches
pub const UNEXPECTED_CHARACTER: &str = "Unexpected character.";
/// Diagnostic carried by error tokens for strings missing a closing quote
pub const UNTERMINATED_STRING: &str = "Unterminated string.";

/// A scanned token
///
/// `lexeme` borrows from the source, except for error tokens where it holds
/// the diagnostic message.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token<'src> {
    pub kind: TokenKind,
    pub lexeme: &'src str,
    pub line: u32,
    pub span: Span,
}

impl<'src> Token<'src> {
    #[must_use]
    pub fn new(kind: TokenKind, lexeme: &'src str, line: u32, span: Span) -> Self {
        Self {
            kind,
            lexeme,
            line,
            span,
        }
    }

    /// An end-of-input token at `line`
    #[must_use]
    pub fn eof(line: u32, offset: u32) -> Self {
        Self::new(TokenKind::Eof, "", line, Span::point(offset))
    }
}

/// Pull-based scanner over a source string
pub struct Scanner<'src> {
    inner: logos::Lexer<'src, TokenKind>,
    lines: LineIndex,
    source_len: u32,
}

impl<'src> Scanner<'src> {
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        Self {
            inner: TokenKind::lexer(source),
            lines: LineIndex::new(source),
            source_len: source.len() as u32,
        }
    }

    /// Scan the next token
    ///
    /// Once the input is exhausted every call returns an EOF token.
    pub fn scan_token(&mut self) -> Token<'src> {
        let Some(result) = self.inner.next() else {
            let line = self.lines.line(self.source_len);
            return Token::eof(line, self.source_len);
        };

        let span = Span::from(self.inner.span());
        let line = self.lines.line(span.start);
        match result {
            Ok(TokenKind::UnterminatedString) => {
                Token::new(TokenKind::Error, UNTERMINATED_STRING, line, span)
            }
            Ok(kind) => Token::new(kind, self.inner.slice(), line, span),
            Err(()) => Token::new(TokenKind::Error, UNEXPECTED_CHARACTER, line, span),
        }
    }
}

impl<'src> Iterator for Scanner<'src> {
    type Item = Token<'src>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.scan_token())
    }
}

/// Scan a whole source string, up to and including the EOF token
#[must_use]
pub fn tokenize(source: &str) -> Vec<Token<'_>> {
    let mut scanner = Scanner::new(source);
    let mut tokens = Vec::new();
    loop {
        let token = scanner.scan_token();
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            return tokens;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn punctuation_and_operators() {
        assert_eq!(
            kinds("( ) - + / * ! != == <= >= < >"),
            vec![
                TokenKind::LeftParen,
                TokenKind::RightParen,
                TokenKind::Minus,
                TokenKind::Plus,
                TokenKind::Slash,
                TokenKind::Star,
                TokenKind::Bang,
                TokenKind::BangEqual,
                TokenKind::EqualEqual,
                TokenKind::LessEqual,
                TokenKind::GreaterEqual,
                TokenKind::Less,
                TokenKind::Greater,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn keywords_win_over_identifiers() {
        assert_eq!(
            kinds("true false nil truthy"),
            vec![
                TokenKind::True,
                TokenKind::False,
                TokenKind::Nil,
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn number_lexemes() {
        let tokens = tokenize("12 3.25");
        assert_eq!(tokens[0].lexeme, "12");
        assert_eq!(tokens[1].lexeme, "3.25");
        assert_eq!(tokens[1].kind, TokenKind::Number);
    }

    #[test]
    fn string_keeps_quotes() {
        let tokens = tokenize("\"hi there\"");
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].lexeme, "\"hi there\"");
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(
            kinds("1 // one\n2"),
            vec![TokenKind::Number, TokenKind::Number, TokenKind::Eof]
        );
    }

    #[test]
    fn lines_are_tracked() {
        let tokens = tokenize("1\n\n+ 2\n");
        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens[1].line, 3);
        assert_eq!(tokens[2].line, 3);
    }

    #[test]
    fn eof_sits_after_trailing_newline() {
        let tokens = tokenize("1 + 2\n");
        assert_eq!(tokens.last().map(|t| (t.kind, t.line)), Some((TokenKind::Eof, 2)));

        let tokens = tokenize("1 + 2");
        assert_eq!(tokens.last().map(|t| t.line), Some(1));
    }

    #[test]
    fn unexpected_character() {
        let tokens = tokenize("1 @");
        assert_eq!(tokens[1].kind, TokenKind::Error);
        assert_eq!(tokens[1].lexeme, UNEXPECTED_CHARACTER);
    }

    #[test]
    fn unterminated_string() {
        let tokens = tokenize("\"abc");
        assert_eq!(tokens[0].kind, TokenKind::Error);
        assert_eq!(tokens[0].lexeme, UNTERMINATED_STRING);
        assert_eq!(tokens[1].kind, TokenKind::Eof);
    }

    #[test]
    fn kind_descriptions() {
        assert_eq!(TokenKind::Eof.to_string(), "end of input");
        assert_eq!(TokenKind::LessEqual.to_string(), "'<='");
        assert_eq!(TokenKind::While.to_string(), "keyword");
    }

    #[test]
    fn eof_repeats() {
        let mut scanner = Scanner::new("");
        assert_eq!(scanner.scan_token().kind, TokenKind::Eof);
        assert_eq!(scanner.scan_token().kind, TokenKind::Eof);
        assert_eq!(scanner.next().map(|t| t.kind), Some(TokenKind::Eof));
    }
}
