use casm_common::token::TokenKind;
use casm_common::{CasmError, MAX_LABEL_JUMPS, MEMORY_SIZE, NUM_REGISTERS, STORAGE_SIZE};
use casm_lang::{preprocess, tokenize_line, LabelTable, Scanner};

use super::event::{Event, EventBus};

/// Register 0 holds the program counter and is only ever touched through
/// instruction fetch and branches.
pub(super) const PC: usize = 0;

#[derive(Debug)]
pub struct Interpreter {
    pub(super) registers: [i64; NUM_REGISTERS],
    memory: [Option<String>; MEMORY_SIZE],
    storage: [Option<String>; STORAGE_SIZE],
    labels: LabelTable,
    num_label_jumps: u32,
    halted: bool,
    /// First error of the current program; later errors are dropped.
    error: Option<CasmError>,
    /// Word index a recorded error is attributed to. Captured before any
    /// failing operation runs, since the PC may or may not have been
    /// incremented by the time an error surfaces.
    error_pc: usize,
    bus: EventBus,
    cycles: u64,
}

/// A copy of everything the visualizer may inspect between steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub pc: usize,
    /// General purpose registers; index 0 is R1.
    pub registers: [i64; NUM_REGISTERS - 1],
    pub memory: Vec<Option<String>>,
    pub storage: Vec<Option<String>>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self {
            registers: [0; NUM_REGISTERS],
            memory: std::array::from_fn(|_| None),
            storage: std::array::from_fn(|_| None),
            labels: LabelTable::new(),
            num_label_jumps: 0,
            halted: false,
            error: None,
            error_pc: 0,
            bus: EventBus::new(),
            cycles: 0,
        }
    }

    /// Reset the whole machine, preprocess the program and install its
    /// lines into memory cells `0..lines.len()`.
    pub fn load<S: AsRef<str>>(&mut self, lines: &[S]) -> Result<(), CasmError> {
        self.reset();

        if lines.len() > MEMORY_SIZE {
            // The first cell that does not exist
            self.error_pc = MEMORY_SIZE;
            return Err(self.fail(CasmError::AddrOutOfRange {
                address: (MEMORY_SIZE * 4) as i64,
            }));
        }
        match preprocess(lines) {
            Ok(labels) => self.labels = labels,
            Err(err) => return Err(self.fail(err)),
        }
        for (i, line) in lines.iter().enumerate() {
            self.memory[i] = Some(line.as_ref().to_owned());
        }

        log::debug!("loaded {} lines, {} labels", lines.len(), self.labels.len());
        Ok(())
    }

    fn reset(&mut self) {
        self.registers = [0; NUM_REGISTERS];
        self.memory = std::array::from_fn(|_| None);
        self.storage = std::array::from_fn(|_| None);
        self.labels = LabelTable::new();
        self.num_label_jumps = 0;
        self.halted = false;
        self.error = None;
        self.error_pc = 0;
        self.cycles = 0;
    }

    /// Execute exactly one instruction.
    ///
    /// Returns `Ok(true)` while there is more to do, `Ok(false)` once the
    /// machine has halted (or already carries an error), and `Err` when this
    /// step failed. The error is also recorded for [`Self::error_report`].
    pub fn step(&mut self) -> Result<bool, CasmError> {
        if self.halted || self.error.is_some() {
            return Ok(false);
        }
        match self.step_inner() {
            Ok(()) => Ok(!self.halted),
            Err(err) => Err(self.fail(err)),
        }
    }

    fn step_inner(&mut self) -> Result<(), CasmError> {
        self.cycles += 1;

        // Whatever fails during this step is blamed on the cell being
        // fetched, whether or not the PC gets incremented below
        let pc = self.registers[PC];
        self.error_pc = pc.max(0) as usize;
        if pc < 0 || pc as usize >= MEMORY_SIZE {
            return Err(CasmError::AddrOutOfRange {
                address: pc.wrapping_mul(4),
            });
        }
        let pc = pc as usize;
        self.set_pc(pc + 1);
        let Some(line) = self.memory[pc].clone() else {
            return Err(CasmError::MemUninitialized {
                address: (pc * 4) as i64,
            });
        };
        log::trace!("0x{:02X}: {}", pc * 4, line.trim());

        let tokens = tokenize_line(&line)?;
        // A leading `name:` pair was consumed by the preprocessor; skip it
        // here so the label line executes as whatever follows it.
        let tokens = match tokens.as_slice() {
            [first, second, rest @ ..]
                if first.kind == TokenKind::LabelRef && second.kind == TokenKind::Colon =>
            {
                rest
            }
            all => all,
        };
        if tokens.is_empty() {
            return Ok(());
        }
        self.execute(&mut Scanner::new(tokens))
    }

    /// Run until the program halts or fails.
    pub fn run(&mut self) -> Result<(), CasmError> {
        while self.step()? {}
        log::debug!("stopped after {} cycles, {} label jumps", self.cycles, self.num_label_jumps);
        Ok(())
    }

    // Setters. Every successful mutation emits exactly one event, after the
    // new value is in place.

    pub fn set_register(&mut self, index: usize, value: i64) -> Result<(), CasmError> {
        if index == PC || index >= NUM_REGISTERS {
            return Err(CasmError::RegOutOfRange { index });
        }
        let old = self.registers[index];
        self.registers[index] = value;
        self.bus.emit(Event::RegisterChanged { index, old, new: value });
        Ok(())
    }

    pub(super) fn set_pc(&mut self, new: usize) {
        let old = self.registers[PC] as usize;
        self.registers[PC] = new as i64;
        self.bus.emit(Event::PcChanged { old, new });
    }

    pub fn set_memory(&mut self, address: i64, value: String) -> Result<(), CasmError> {
        let word_index = word_index(address, MEMORY_SIZE)?;
        let old = self.memory[word_index].replace(value.clone());
        self.bus.emit(Event::MemoryChanged { word_index, old, new: value });
        Ok(())
    }

    pub fn set_storage(&mut self, address: i64, value: String) -> Result<(), CasmError> {
        let word_index = word_index(address, STORAGE_SIZE)?;
        let old = self.storage[word_index].replace(value.clone());
        self.bus.emit(Event::StorageChanged { word_index, old, new: value });
        Ok(())
    }

    pub(super) fn halt(&mut self) {
        self.halted = true;
        self.bus.emit(Event::Halted);
    }

    /// Record an error. The slot is write-once per program: the first
    /// failure wins and later ones are dropped.
    fn fail(&mut self, error: CasmError) -> CasmError {
        if self.error.is_none() {
            self.error = Some(error.clone());
            self.bus.emit(Event::Errored {
                message: error.to_string(),
            });
        }
        error
    }

    // Reads.

    /// Read the memory cell at a byte address as an integer.
    pub fn get_memory(&self, address: i64) -> Result<i64, CasmError> {
        let word_index = word_index(address, MEMORY_SIZE)?;
        let cell = self.memory[word_index]
            .as_deref()
            .ok_or(CasmError::MemUninitialized { address })?;
        Ok(parse_int(cell))
    }

    /// Read the storage cell at a byte address as an integer.
    pub fn get_storage(&self, address: i64) -> Result<i64, CasmError> {
        let word_index = word_index(address, STORAGE_SIZE)?;
        let cell = self.storage[word_index]
            .as_deref()
            .ok_or(CasmError::MemUninitialized { address })?;
        Ok(parse_int(cell))
    }

    /// Byte address of the instruction currently being executed; the PC is
    /// pre-incremented at fetch, so this is one word back.
    pub(super) fn relative_base(&self) -> i64 {
        (self.registers[PC] - 1).wrapping_mul(4)
    }

    /// Look up a branch target and charge the jump counters. Counts every
    /// resolution, taken or not, and trips the infinite-loop guard once the
    /// budget is spent.
    pub(super) fn resolve_jump(&mut self, name: &str) -> Result<usize, CasmError> {
        let target = self
            .labels
            .line_of(name)
            .ok_or_else(|| CasmError::UnknownLabel {
                name: name.to_owned(),
            })?;
        if self.num_label_jumps >= MAX_LABEL_JUMPS {
            return Err(CasmError::PossibleInfiniteLoop {
                limit: MAX_LABEL_JUMPS,
                breakdown: self.labels.jump_breakdown(),
            });
        }
        self.num_label_jumps += 1;
        self.labels.record_jump(name);
        Ok(target)
    }

    // Host API for the visualizer.

    pub fn subscribe(&mut self, listener: impl FnMut(&Event) + 'static) {
        self.bus.subscribe(listener);
    }

    pub fn snapshot(&self) -> Snapshot {
        let mut registers = [0; NUM_REGISTERS - 1];
        registers.copy_from_slice(&self.registers[1..]);
        Snapshot {
            pc: self.pc(),
            registers,
            memory: self.memory.to_vec(),
            storage: self.storage.to_vec(),
        }
    }

    /// The user-facing rendering of the recorded error, if any.
    pub fn error_report(&self) -> Option<String> {
        let error = self.error.as_ref()?;
        let line = self
            .memory
            .get(self.error_pc)
            .and_then(|cell| cell.as_deref())
            .unwrap_or("");
        Some(format!(
            "Error at address {} executing '{}'\n{}",
            self.error_pc * 4,
            line.trim(),
            error
        ))
    }

    pub fn pc(&self) -> usize {
        self.registers[PC] as usize
    }

    pub fn registers(&self) -> &[i64] {
        &self.registers
    }

    pub fn memory(&self) -> &[Option<String>] {
        &self.memory
    }

    pub fn storage(&self) -> &[Option<String>] {
        &self.storage
    }

    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    pub fn num_label_jumps(&self) -> u32 {
        self.num_label_jumps
    }

    pub fn halted(&self) -> bool {
        self.halted
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn error(&self) -> Option<&CasmError> {
        self.error.as_ref()
    }
}

/// Check a byte address and turn it into a word index.
fn word_index(address: i64, size: usize) -> Result<usize, CasmError> {
    if address % 4 != 0 {
        return Err(CasmError::AddrMisaligned { address });
    }
    if address < 0 || (address / 4) as usize >= size {
        return Err(CasmError::AddrOutOfRange { address });
    }
    Ok((address / 4) as usize)
}

/// Evaluate a cell or literal the way `atoi` would: an optional sign and a
/// leading digit run, anything else yields 0. Accumulation wraps, matching
/// the machine's two's-complement arithmetic.
pub(super) fn parse_int(text: &str) -> i64 {
    let text = text.trim_start();
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let mut value: i64 = 0;
    for byte in digits.bytes() {
        if !byte.is_ascii_digit() {
            break;
        }
        value = value.wrapping_mul(10).wrapping_add((byte - b'0') as i64);
    }
    if negative {
        value.wrapping_neg()
    } else {
        value
    }
}
