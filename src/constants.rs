//! Wire-format constants for the optimized-lookup binary layout.

use crate::types::{SymbolNumber, TransitionTableIndex};

/// Sentinel symbol number: absent / end of string / wildcard-in-index.
pub const NO_SYMBOL: SymbolNumber = 0xFFFF;

/// Sentinel table index: no such index.
pub const NO_TABLE_INDEX: TransitionTableIndex = 0xFFFF_FFFF;

/// Indices at or above this value address the transition table; subtract it to get
/// the offset within that table. Indices below it address the index table directly.
pub const TRANSITION_TARGET_TABLE_START: TransitionTableIndex = 0x8000_0000;

/// Byte size of one transition-index record (`input: u16, target: u32`).
pub const INDEX_TABLE_RECORD_SIZE: usize = 6;

/// Byte size of one plain transition record (`input: u16, output: u16, target: u32`).
pub const TRANSITION_RECORD_SIZE_PLAIN: usize = 8;

/// Byte size of one weighted transition record (plain + `weight: f32`).
pub const TRANSITION_RECORD_SIZE_WEIGHTED: usize = 12;

/// Capacity of the per-lookup output scratch buffer. Also the effective recursion
/// depth bound: a branch that would write past this is abandoned (the only runtime
/// defense against epsilon cycles, see the engine's cycle guard).
pub const OUTPUT_BUFFER_CAPACITY: usize = 1000;

/// How many recursive calls elapse between wall-clock checks for `time_cutoff_seconds`.
pub const TIME_CUTOFF_CHECK_INTERVAL: u64 = 1_000_000;

/// Maximum byte length (including the terminating NUL) of one alphabet symbol string.
pub const MAX_SYMBOL_LENGTH: usize = 1000;

/// HFST3 container magic.
pub const HFST3_MAGIC: &[u8; 5] = b"HFST\0";
