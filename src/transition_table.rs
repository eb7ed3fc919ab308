use byteorder::{ByteOrder, LittleEndian};

use crate::constants::{
    NO_SYMBOL, NO_TABLE_INDEX, TRANSITION_RECORD_SIZE_PLAIN, TRANSITION_RECORD_SIZE_WEIGHTED,
};
use crate::transducer::Buffer;
use crate::types::{SymbolNumber, TransitionTableIndex, Weight};

/// One transition record: input symbol, output symbol, target index, and
/// (for weighted transducers) the transition weight.
#[derive(Debug, Clone, Copy)]
pub struct SymbolTransition {
    pub input: SymbolNumber,
    pub output: SymbolNumber,
    pub target: TransitionTableIndex,
    pub weight: Weight,
}

/// View over the transition table: fixed 8- or 12-byte records, read directly out
/// of the backing buffer. Reading past the logical end yields the same sentinel
/// values the on-disk format appends as synthetic weighted-table terminators,
/// without requiring those bytes to actually be present.
pub struct TransitionTable {
    buf: Buffer,
    start: usize,
    len: usize,
    weighted: bool,
    record_size: usize,
}

impl TransitionTable {
    pub fn new(buf: Buffer, start: usize, len: usize, weighted: bool) -> TransitionTable {
        let record_size = if weighted { TRANSITION_RECORD_SIZE_WEIGHTED } else { TRANSITION_RECORD_SIZE_PLAIN };
        TransitionTable { buf, start, len, weighted, record_size }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn is_weighted(&self) -> bool {
        self.weighted
    }

    fn record(&self, i: TransitionTableIndex) -> SymbolTransition {
        let i = i as usize;
        if i >= self.len {
            return SymbolTransition { input: NO_SYMBOL, output: NO_SYMBOL, target: NO_TABLE_INDEX, weight: 0.0 };
        }
        let bytes_all: &[u8] = self.buf.as_ref().as_ref();
        let off = self.start + i * self.record_size;
        let bytes = &bytes_all[off..off + self.record_size];
        let input = LittleEndian::read_u16(&bytes[0..2]);
        let output = LittleEndian::read_u16(&bytes[2..4]);
        let target = LittleEndian::read_u32(&bytes[4..8]);
        let weight = if self.weighted { LittleEndian::read_f32(&bytes[8..12]) } else { 0.0 };
        SymbolTransition { input, output, target, weight }
    }

    #[inline]
    pub fn input_symbol(&self, i: TransitionTableIndex) -> Option<SymbolNumber> {
        let r = self.record(i);
        if r.input == NO_SYMBOL { None } else { Some(r.input) }
    }

    #[inline]
    pub fn output_symbol(&self, i: TransitionTableIndex) -> Option<SymbolNumber> {
        let r = self.record(i);
        if r.output == NO_SYMBOL { None } else { Some(r.output) }
    }

    #[inline]
    pub fn target(&self, i: TransitionTableIndex) -> Option<TransitionTableIndex> {
        let t = self.record(i).target;
        if t == NO_TABLE_INDEX { None } else { Some(t) }
    }

    #[inline]
    pub fn symbol_transition(&self, i: TransitionTableIndex) -> SymbolTransition {
        self.record(i)
    }

    #[inline]
    pub fn is_final(&self, i: TransitionTableIndex) -> bool {
        let r = self.record(i);
        if self.weighted {
            r.input == NO_SYMBOL && r.output == NO_SYMBOL && r.target == 1
        } else {
            r.target == 1
        }
    }

    #[inline]
    pub fn weight(&self, i: TransitionTableIndex) -> Option<Weight> {
        if !self.weighted {
            return None;
        }
        Some(self.record(i).weight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn buffer_of(bytes: Vec<u8>) -> Buffer {
        Arc::new(bytes)
    }

    #[test]
    fn reads_plain_transition() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&2u16.to_le_bytes());
        bytes.extend_from_slice(&7u32.to_le_bytes());
        let buf = buffer_of(bytes);
        let table = TransitionTable::new(buf, 0, 1, false);
        assert_eq!(table.input_symbol(0), Some(1));
        assert_eq!(table.output_symbol(0), Some(2));
        assert_eq!(table.target(0), Some(7));
        assert!(!table.is_final(0));
    }

    #[test]
    fn weighted_final_requires_both_symbols_absent() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&NO_SYMBOL.to_le_bytes());
        bytes.extend_from_slice(&NO_SYMBOL.to_le_bytes());
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.extend_from_slice(&2.5f32.to_le_bytes());
        let buf = buffer_of(bytes);
        let table = TransitionTable::new(buf, 0, 1, true);
        assert!(table.is_final(0));
        assert_eq!(table.weight(0), Some(2.5));
    }

    #[test]
    fn out_of_range_reads_as_sentinel() {
        let buf = buffer_of(vec![]);
        let table = TransitionTable::new(buf, 0, 0, true);
        let r = table.symbol_transition(3);
        assert_eq!(r.input, NO_SYMBOL);
        assert_eq!(r.output, NO_SYMBOL);
        assert_eq!(r.target, NO_TABLE_INDEX);
    }
}
