//! Byte-driven lexer for a single casm source line.

use casm_common::token::{Token, TokenKind};
use casm_common::{CasmError, MAX_TOKENS};

/// Lex one line into tokens.
///
/// A line ends at the end of the string, at a newline, or at `;` (the rest
/// is a comment). The returned tokens borrow their literals from `line`.
pub fn tokenize_line(line: &str) -> Result<Vec<Token<'_>>, CasmError> {
    Lexer::new(line).run()
}

struct Lexer<'a> {
    line: &'a str,
    input: &'a [u8],
    start: usize,
    cur: usize,
    tokens: Vec<Token<'a>>,
}

impl<'a> Lexer<'a> {
    fn new(line: &'a str) -> Self {
        Self {
            line,
            input: line.as_bytes(),
            start: 0,
            cur: 0,
            tokens: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Vec<Token<'a>>, CasmError> {
        while !self.at_end() {
            self.skip_whitespace();
            if self.at_end() {
                break;
            }
            let c = self.advance();
            match c {
                b'=' => self.add_token(TokenKind::Equal)?,
                b']' => self.add_token(TokenKind::RBracket)?,
                b'[' => self.add_token(TokenKind::LBracket)?,
                b'@' => self.add_token(TokenKind::At)?,
                b'$' => self.add_token(TokenKind::Dollar)?,
                b',' => self.add_token(TokenKind::Comma)?,
                b':' => self.add_token(TokenKind::Colon)?,
                _ if c.is_ascii_digit() => self.scan_number()?,
                _ if c.is_ascii_alphabetic() => self.scan_identifier()?,
                _ => {
                    return Err(CasmError::LexUnexpectedChar {
                        ch: c as char,
                        column: self.cur,
                    })
                }
            }
        }
        Ok(self.tokens)
    }

    fn at_end(&self) -> bool {
        match self.input.get(self.cur) {
            None => true,
            Some(&c) => c == b'\n' || c == b';',
        }
    }

    fn peek(&self) -> u8 {
        self.input[self.cur]
    }

    fn advance(&mut self) -> u8 {
        self.cur += 1;
        self.input[self.cur - 1]
    }

    fn skip_whitespace(&mut self) {
        while !self.at_end() && matches!(self.peek(), b' ' | b'\t' | b'\r') {
            self.start += 1;
            self.cur += 1;
        }
    }

    fn add_token(&mut self, kind: TokenKind) -> Result<(), CasmError> {
        if self.tokens.len() >= MAX_TOKENS {
            return Err(CasmError::LexTooManyTokens { limit: MAX_TOKENS });
        }
        let literal = &self.line[self.start..self.cur];
        self.tokens.push(Token::new(kind, literal));
        self.start = self.cur;
        Ok(())
    }

    fn scan_number(&mut self) -> Result<(), CasmError> {
        while !self.at_end() && self.peek().is_ascii_digit() {
            self.advance();
        }
        self.add_token(TokenKind::Number)
    }

    fn scan_identifier(&mut self) -> Result<(), CasmError> {
        while !self.at_end() {
            let c = self.peek();
            if !c.is_ascii_alphanumeric() && c != b'_' {
                break;
            }
            self.advance();
        }
        let text = &self.line[self.start..self.cur];
        if is_register(text) {
            self.add_token(TokenKind::Register)
        } else {
            self.add_token(classify_identifier(text))
        }
    }
}

fn is_register(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.len() == 2 && bytes[0].eq_ignore_ascii_case(&b'R') && bytes[1].is_ascii_digit()
}

/// Keyword lookup as a hard-coded trie over the first letters. Anything
/// that is not exactly a reserved mnemonic is a label reference.
fn classify_identifier(text: &str) -> TokenKind {
    let bytes = text.as_bytes();
    match bytes[0].to_ascii_uppercase() {
        b'A' => check_rest(text, 1, "DD", TokenKind::Add),
        b'B' => {
            if bytes.len() < 2 {
                return TokenKind::LabelRef;
            }
            match bytes[1].to_ascii_uppercase() {
                b'E' => check_rest(text, 2, "Q", TokenKind::Beq),
                b'G' => {
                    if bytes.len() < 3 {
                        return TokenKind::LabelRef;
                    }
                    match bytes[2].to_ascii_uppercase() {
                        b'T' => check_rest(text, 3, "", TokenKind::Bgt),
                        b'E' => check_rest(text, 3, "Q", TokenKind::Bgeq),
                        _ => TokenKind::LabelRef,
                    }
                }
                b'L' => {
                    if bytes.len() < 3 {
                        return TokenKind::LabelRef;
                    }
                    match bytes[2].to_ascii_uppercase() {
                        b'E' => check_rest(text, 3, "Q", TokenKind::Bleq),
                        b'T' => check_rest(text, 3, "", TokenKind::Blt),
                        _ => TokenKind::LabelRef,
                    }
                }
                b'N' => check_rest(text, 2, "EQ", TokenKind::Bneq),
                b'R' => check_rest(text, 2, "", TokenKind::Br),
                _ => TokenKind::LabelRef,
            }
        }
        b'D' => check_rest(text, 1, "IV", TokenKind::Div),
        b'H' => check_rest(text, 1, "ALT", TokenKind::Halt),
        b'I' => check_rest(text, 1, "NC", TokenKind::Inc),
        b'L' => check_rest(text, 1, "OAD", TokenKind::Load),
        b'M' => check_rest(text, 1, "UL", TokenKind::Mul),
        b'R' => check_rest(text, 1, "EAD", TokenKind::Read),
        b'S' => {
            if bytes.len() < 2 {
                return TokenKind::LabelRef;
            }
            match bytes[1].to_ascii_uppercase() {
                b'T' => check_rest(text, 2, "ORE", TokenKind::Store),
                b'U' => check_rest(text, 2, "B", TokenKind::Sub),
                _ => TokenKind::LabelRef,
            }
        }
        b'W' => check_rest(text, 1, "RITE", TokenKind::Write),
        _ => TokenKind::LabelRef,
    }
}

fn check_rest(text: &str, pos: usize, rest: &str, kind: TokenKind) -> TokenKind {
    if text.len() - pos == rest.len() && text[pos..].eq_ignore_ascii_case(rest) {
        kind
    } else {
        TokenKind::LabelRef
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn kinds(line: &str) -> Vec<TokenKind> {
        tokenize_line(line)
            .unwrap()
            .iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn tokenizes_a_load_line() {
        use TokenKind::*;
        assert_eq!(
            kinds("LOAD R1, =10"),
            vec![Load, Register, Comma, Equal, Number]
        );
    }

    #[test]
    fn tokenizes_punctuation_without_whitespace() {
        use TokenKind::*;
        assert_eq!(
            kinds("5[]$=100=,10"),
            vec![Number, LBracket, RBracket, Dollar, Equal, Number, Equal, Comma, Number]
        );
    }

    #[test]
    fn tokenizes_a_label_definition() {
        use TokenKind::*;
        assert_eq!(
            kinds("Loop: BGEQ R1, R2, End"),
            vec![LabelRef, Colon, Bgeq, Register, Comma, Register, Comma, LabelRef]
        );
    }

    #[test]
    fn keywords_are_case_insensitive() {
        use TokenKind::*;
        assert_eq!(kinds("load r1, =1"), vec![Load, Register, Comma, Equal, Number]);
        assert_eq!(kinds("hAlT"), vec![Halt]);
    }

    #[test]
    fn classifies_every_mnemonic() {
        use TokenKind::*;
        let all = "LOAD STORE READ WRITE HALT ADD SUB MUL DIV INC BR BLT";
        assert_eq!(
            kinds(all),
            vec![Load, Store, Read, Write, Halt, Add, Sub, Mul, Div, Inc, Br, Blt]
        );
        assert_eq!(kinds("BGT BGEQ BLEQ BEQ BNEQ"), vec![Bgt, Bgeq, Bleq, Beq, Bneq]);
    }

    #[test]
    fn near_keywords_are_labels() {
        use TokenKind::*;
        assert_eq!(
            kinds("WRRITE STTORE SUBB BLEQQ BRR LOA MULflub"),
            vec![LabelRef; 7]
        );
    }

    #[test]
    fn registers_need_exactly_one_digit() {
        use TokenKind::*;
        assert_eq!(kinds("R5 r0"), vec![Register, Register]);
        // Too long for a register, not READ either
        assert_eq!(kinds("R12 Rx"), vec![LabelRef, LabelRef]);
    }

    #[test]
    fn literals_point_into_the_line() {
        let tokens = tokenize_line("BR Loop_2").unwrap();
        assert_eq!(tokens[0].literal, "BR");
        assert_eq!(tokens[1].literal, "Loop_2");
    }

    #[test]
    fn semicolon_starts_a_comment() {
        use TokenKind::*;
        assert_eq!(kinds("INC R1 ; bump the counter"), vec![Inc, Register]);
        assert_eq!(kinds("; nothing but comment"), vec![]);
    }

    #[test]
    fn blank_lines_lex_to_nothing() {
        assert_eq!(kinds(""), vec![]);
        assert_eq!(kinds("   \t "), vec![]);
    }

    #[test]
    fn rejects_unexpected_characters() {
        assert_eq!(
            tokenize_line("LOAD R1, #5").unwrap_err(),
            CasmError::LexUnexpectedChar { ch: '#', column: 10 }
        );
    }

    #[test]
    fn rejects_too_many_tokens() {
        let line = ",".repeat(MAX_TOKENS + 1);
        assert_eq!(
            tokenize_line(&line).unwrap_err(),
            CasmError::LexTooManyTokens { limit: MAX_TOKENS }
        );
    }
}
