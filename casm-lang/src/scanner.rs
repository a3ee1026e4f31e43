//! Cursor over one lexed line, used by the executor's operand parsers.

use casm_common::token::{Token, TokenKind};
use casm_common::CasmError;

/// A cursor with one token of lookahead. None of its operations allocate;
/// mismatches surface as [`CasmError::ParseExpectedToken`].
#[derive(Debug)]
pub struct Scanner<'a> {
    tokens: &'a [Token<'a>],
    cur: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(tokens: &'a [Token<'a>]) -> Self {
        Self { tokens, cur: 0 }
    }

    pub fn peek(&self) -> Option<&'a Token<'a>> {
        self.tokens.get(self.cur)
    }

    pub fn advance(&mut self) -> Option<&'a Token<'a>> {
        let token = self.peek()?;
        self.cur += 1;
        Some(token)
    }

    pub fn prev(&self) -> Option<&'a Token<'a>> {
        self.tokens.get(self.cur.checked_sub(1)?)
    }

    pub fn at_end(&self) -> bool {
        self.cur == self.tokens.len()
    }

    /// Like [`Self::consume`] without advancing.
    pub fn check(&self, kind: TokenKind) -> Result<&'a Token<'a>, CasmError> {
        match self.peek() {
            Some(token) if token.kind == kind => Ok(token),
            found => Err(expected(kind, found)),
        }
    }

    /// Take the next token, requiring it to be of `kind`.
    pub fn consume(&mut self, kind: TokenKind) -> Result<&'a Token<'a>, CasmError> {
        match self.advance() {
            Some(token) if token.kind == kind => Ok(token),
            found => Err(expected(kind, found)),
        }
    }
}

fn expected(expected: TokenKind, found: Option<&Token>) -> CasmError {
    CasmError::ParseExpectedToken {
        expected,
        found: found.map_or(TokenKind::None, |token| token.kind),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::lexer::tokenize_line;

    #[test]
    fn walks_a_line() {
        let tokens = tokenize_line("LOAD R1, =8").unwrap();
        let mut scanner = Scanner::new(&tokens);
        assert_eq!(scanner.peek().unwrap().kind, TokenKind::Load);
        assert_eq!(scanner.advance().unwrap().kind, TokenKind::Load);
        assert_eq!(scanner.prev().unwrap().kind, TokenKind::Load);
        assert_eq!(scanner.consume(TokenKind::Register).unwrap().literal, "R1");
        assert_eq!(scanner.consume(TokenKind::Comma).unwrap().kind, TokenKind::Comma);
        assert!(!scanner.at_end());
        scanner.advance();
        scanner.advance();
        assert!(scanner.at_end());
        assert!(scanner.advance().is_none());
    }

    #[test]
    fn check_does_not_advance() {
        let tokens = tokenize_line("HALT").unwrap();
        let scanner = Scanner::new(&tokens);
        assert!(scanner.check(TokenKind::Halt).is_ok());
        assert!(scanner.check(TokenKind::Halt).is_ok());
        assert_eq!(
            scanner.check(TokenKind::Comma).unwrap_err(),
            CasmError::ParseExpectedToken {
                expected: TokenKind::Comma,
                found: TokenKind::Halt,
            }
        );
    }

    #[test]
    fn consume_reports_what_it_found() {
        let tokens = tokenize_line("ADD R1 R2").unwrap();
        let mut scanner = Scanner::new(&tokens);
        scanner.advance();
        scanner.advance();
        let err = scanner.consume(TokenKind::Comma).unwrap_err();
        assert_eq!(
            err,
            CasmError::ParseExpectedToken {
                expected: TokenKind::Comma,
                found: TokenKind::Register,
            }
        );
        assert_eq!(err.to_string(), "Expected ',' but found register");
    }

    #[test]
    fn consume_past_the_end_finds_nothing() {
        let tokens = tokenize_line("INC").unwrap();
        let mut scanner = Scanner::new(&tokens);
        scanner.advance();
        assert_eq!(
            scanner.consume(TokenKind::Register).unwrap_err(),
            CasmError::ParseExpectedToken {
                expected: TokenKind::Register,
                found: TokenKind::None,
            }
        );
    }
}
