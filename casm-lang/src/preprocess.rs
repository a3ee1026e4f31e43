//! Label harvesting pass over a whole program.

use casm_common::token::TokenKind;
use casm_common::{CasmError, MAX_LABELS};

use crate::lexer::tokenize_line;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Label {
    name: String,
    line: usize,
    /// Times a branch instruction resolved this label.
    jumps: u32,
}

/// Name -> line-index table of bounded capacity, with a per-label jump
/// counter the interpreter charges on every branch resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelTable {
    entries: Vec<Label>,
}

impl LabelTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, name: &str, line: usize) -> Result<(), CasmError> {
        // Case-sensitive: `loop` and `Loop` are distinct labels.
        if self.entries.iter().any(|label| label.name == name) {
            return Err(CasmError::PreprocessDuplicateLabel {
                name: name.to_owned(),
            });
        }
        if self.entries.len() >= MAX_LABELS {
            return Err(CasmError::PreprocessTooManyLabels { limit: MAX_LABELS });
        }
        self.entries.push(Label {
            name: name.to_owned(),
            line,
            jumps: 0,
        });
        Ok(())
    }

    /// The line index a label names, if it exists.
    pub fn line_of(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .find(|label| label.name == name)
            .map(|label| label.line)
    }

    pub fn record_jump(&mut self, name: &str) {
        if let Some(label) = self.entries.iter_mut().find(|label| label.name == name) {
            label.jumps += 1;
        }
    }

    pub fn jumps_of(&self, name: &str) -> Option<u32> {
        self.entries
            .iter()
            .find(|label| label.name == name)
            .map(|label| label.jumps)
    }

    pub fn total_jumps(&self) -> u32 {
        self.entries.iter().map(|label| label.jumps).sum()
    }

    /// `name: count` listing of every label that has been jumped through,
    /// for the infinite-loop diagnostic.
    pub fn jump_breakdown(&self) -> String {
        self.entries
            .iter()
            .filter(|label| label.jumps > 0)
            .map(|label| format!("{}: {}", label.name, label.jumps))
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Walk every line and collect `name:` definitions.
///
/// Lines are not rewritten; the executor skips a leading label pair again
/// when the line is fetched. A line holding nothing but a label is still a
/// valid jump target that falls through.
pub fn preprocess<S: AsRef<str>>(lines: &[S]) -> Result<LabelTable, CasmError> {
    let mut labels = LabelTable::new();
    for (i, line) in lines.iter().enumerate() {
        let tokens = tokenize_line(line.as_ref())?;
        if let [first, second, ..] = tokens.as_slice() {
            if first.kind == TokenKind::LabelRef && second.kind == TokenKind::Colon {
                labels.insert(first.literal, i)?;
            }
        }
    }
    Ok(labels)
}
