use crate::token::TokenKind;
use thiserror::Error;

/// Every way a casm program can fail, from lexing through execution.
///
/// The variant is the structured tag; the display string is the message the
/// visualizer shows. The interpreter records the first error of a step and
/// drops any later ones, so a single value describes a whole failed run.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CasmError {
    #[error("Unexpected character '{ch}' at column {column}")]
    LexUnexpectedChar { ch: char, column: usize },
    #[error("Too many tokens on this line (limit {limit})")]
    LexTooManyTokens { limit: usize },

    #[error("Duplicate label: {name}")]
    PreprocessDuplicateLabel { name: String },
    #[error("Too many labels (limit {limit})")]
    PreprocessTooManyLabels { limit: usize },

    #[error("Expected {expected} but found {found}")]
    ParseExpectedToken {
        expected: TokenKind,
        found: TokenKind,
    },
    #[error("Too many tokens on this line")]
    ParseTrailingTokens,
    #[error("Unexpected token: {literal}")]
    ParseUnknownInstruction { literal: String },

    #[error("Expected address to be a multiple of 4: {address}")]
    AddrMisaligned { address: i64 },
    #[error("Address out of range: {address}")]
    AddrOutOfRange { address: i64 },
    #[error("Addressing mode {mode} is not allowed here")]
    AddrIllegalMode { mode: &'static str },

    #[error("Garbage contained at memory address {address}")]
    MemUninitialized { address: i64 },
    #[error("Register R{index} cannot be used here")]
    RegOutOfRange { index: usize },
    #[error("Division by zero")]
    DivByZero,
    #[error("Unknown label: {name}")]
    UnknownLabel { name: String },

    #[error("Possible infinite loop after {limit} label jumps ({breakdown})")]
    PossibleInfiniteLoop { limit: u32, breakdown: String },
}
