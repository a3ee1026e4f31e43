pub mod error;
pub mod token;

pub use error::CasmError;

/// Number of word cells in main memory.
pub const MEMORY_SIZE: usize = 64;
/// Number of word cells in persistent storage.
pub const STORAGE_SIZE: usize = 64;
/// Register file size. Register 0 is the program counter.
pub const NUM_REGISTERS: usize = 10;
/// Capacity of the label table.
pub const MAX_LABELS: usize = 16;
/// Label jumps executed before the infinite-loop guard trips.
pub const MAX_LABEL_JUMPS: u32 = 1000;
/// Tokens the lexer will emit for a single line.
pub const MAX_TOKENS: usize = 16;
