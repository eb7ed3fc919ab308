use byteorder::{ByteOrder, LittleEndian};

use crate::constants::{INDEX_TABLE_RECORD_SIZE, NO_SYMBOL, NO_TABLE_INDEX};
use crate::transducer::Buffer;
use crate::types::{SymbolNumber, TransitionTableIndex, Weight};

/// View over the transition-index table: fixed 6-byte `{input: u16, target: u32}`
/// records, read directly out of the backing buffer (the mmapped file, in
/// production use).
pub struct IndexTable {
    buf: Buffer,
    start: usize,
    len: usize,
    weighted: bool,
}

impl IndexTable {
    pub fn new(buf: Buffer, start: usize, len: usize, weighted: bool) -> IndexTable {
        IndexTable { buf, start, len, weighted }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn record(&self, i: TransitionTableIndex) -> Option<(SymbolNumber, u32)> {
        let i = i as usize;
        if i >= self.len {
            return None;
        }
        let bytes_all: &[u8] = self.buf.as_ref().as_ref();
        let off = self.start + i * INDEX_TABLE_RECORD_SIZE;
        let bytes = &bytes_all[off..off + INDEX_TABLE_RECORD_SIZE];
        let input = LittleEndian::read_u16(&bytes[0..2]);
        let target = LittleEndian::read_u32(&bytes[2..6]);
        Some((input, target))
    }

    #[inline]
    pub fn input_symbol(&self, i: TransitionTableIndex) -> Option<SymbolNumber> {
        self.record(i).map(|(input, _)| input).filter(|&s| s != NO_SYMBOL)
    }

    /// The raw input field, including `NO_SYMBOL` (used for wildcard-slot checks).
    #[inline]
    pub fn raw_input_symbol(&self, i: TransitionTableIndex) -> Option<SymbolNumber> {
        self.record(i).map(|(input, _)| input)
    }

    #[inline]
    pub fn target(&self, i: TransitionTableIndex) -> Option<TransitionTableIndex> {
        self.record(i).map(|(_, target)| target).filter(|&t| t != NO_TABLE_INDEX)
    }

    /// Plain transducers mark a final index slot with `target == 1`; weighted
    /// transducers instead store the final weight's float bits in `target`, so
    /// finality there is `input_symbol == NO_SYMBOL && target != NO_TABLE_INDEX`
    /// (matching `final_weight`'s validity condition below).
    #[inline]
    pub fn is_final(&self, i: TransitionTableIndex) -> bool {
        match self.record(i) {
            Some((input, target)) => {
                if self.weighted {
                    input == NO_SYMBOL && target != NO_TABLE_INDEX
                } else {
                    target == 1
                }
            }
            None => false,
        }
    }

    /// Bit-reinterprets the raw `target` field as a weight; valid only for a final
    /// index slot in a weighted transducer (`input_symbol == NO_SYMBOL`).
    #[inline]
    pub fn final_weight(&self, i: TransitionTableIndex) -> Option<Weight> {
        match self.record(i) {
            Some((input, target)) if input == NO_SYMBOL && target != NO_TABLE_INDEX => {
                Some(f32::from_bits(target))
            }
            _ => None,
        }
    }
}
