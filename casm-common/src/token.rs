use std::fmt;

/// The closed set of token kinds a casm source line can produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Punctuation
    Equal,
    RBracket,
    LBracket,
    At,
    Dollar,
    Comma,
    Colon,

    // Data movement
    Load,
    Store,
    Read,
    Write,
    Halt,

    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Inc,

    // Control flow
    Br,
    Blt,
    Bgt,
    Bleq,
    Bgeq,
    Beq,
    Bneq,

    LabelRef,
    Register,
    Number,

    /// Sentinel for "no token here"; only ever appears in diagnostics.
    None,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use TokenKind::*;
        let s = match self {
            Equal => "'='",
            RBracket => "']'",
            LBracket => "'['",
            At => "'@'",
            Dollar => "'$'",
            Comma => "','",
            Colon => "':'",
            Load => "LOAD",
            Store => "STORE",
            Read => "READ",
            Write => "WRITE",
            Halt => "HALT",
            Add => "ADD",
            Sub => "SUB",
            Mul => "MUL",
            Div => "DIV",
            Inc => "INC",
            Br => "BR",
            Blt => "BLT",
            Bgt => "BGT",
            Bleq => "BLEQ",
            Bgeq => "BGEQ",
            Beq => "BEQ",
            Bneq => "BNEQ",
            LabelRef => "label",
            Register => "register",
            Number => "number",
            None => "nothing",
        };
        f.write_str(s)
    }
}

/// One token of a source line. The literal borrows from the line, so a
/// token never outlives the text it was lexed from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub literal: &'a str,
}

impl<'a> Token<'a> {
    pub fn new(kind: TokenKind, literal: &'a str) -> Self {
        Self { kind, literal }
    }
}
