use byteorder::{ByteOrder, LittleEndian};
use log::{debug, warn};

use crate::constants::HFST3_MAGIC;
use crate::error::{Error, Result};
use crate::types::{HeaderFlag, SymbolNumber};

const FIXED_PREFIX_SIZE: usize = 20;
const FLAG_COUNT: usize = 9;
const FLAGS_SIZE: usize = FLAG_COUNT * 4;

/// Parsed fixed-layout header, plus the nine boolean flags.
#[derive(Debug)]
pub struct TransducerHeader {
    input_symbol_count: SymbolNumber,
    symbol_count: SymbolNumber,
    index_table_size: u32,
    target_table_size: u32,
    state_count: u32,
    transition_count: u32,
    flags: [bool; FLAG_COUNT],
    /// Total bytes consumed from the start of the file, including any HFST3
    /// container prefix. The alphabet begins at this offset.
    total_len: usize,
}

impl TransducerHeader {
    pub fn new(buf: &[u8]) -> Result<TransducerHeader> {
        let container_len = skip_hfst3_container(buf)?;
        let rest = &buf[container_len..];

        if rest.len() < FIXED_PREFIX_SIZE + FLAGS_SIZE {
            return Err(Error::bad_header("truncated fixed header prefix"));
        }

        let input_symbol_count = LittleEndian::read_u16(&rest[0..2]);
        let symbol_count = LittleEndian::read_u16(&rest[2..4]);
        let index_table_size = LittleEndian::read_u32(&rest[4..8]);
        let target_table_size = LittleEndian::read_u32(&rest[8..12]);
        let state_count = LittleEndian::read_u32(&rest[12..16]);
        let transition_count = LittleEndian::read_u32(&rest[16..20]);

        let mut flags = [false; FLAG_COUNT];
        for (i, flag) in flags.iter_mut().enumerate() {
            let off = FIXED_PREFIX_SIZE + i * 4;
            *flag = LittleEndian::read_u32(&rest[off..off + 4]) != 0;
        }

        debug!(
            "header: input_symbols={} symbols={} index_table_size={} target_table_size={} states={} transitions={}",
            input_symbol_count, symbol_count, index_table_size, target_table_size, state_count, transition_count
        );

        if flags[HeaderFlag::Cyclic as usize] {
            warn!("transducer header reports a cyclic automaton");
        }
        if flags[HeaderFlag::HasInputEpsilonCycles as usize] {
            warn!("transducer header reports input-epsilon cycles; lookup is not guaranteed to terminate");
        }
        if flags[HeaderFlag::HasUnweightedInputEpsilonCycles as usize] {
            warn!("transducer header reports unweighted input-epsilon cycles; lookup is not guaranteed to terminate");
        }

        Ok(TransducerHeader {
            input_symbol_count,
            symbol_count,
            index_table_size,
            target_table_size,
            state_count,
            transition_count,
            flags,
            total_len: container_len + FIXED_PREFIX_SIZE + FLAGS_SIZE,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.total_len
    }

    #[inline]
    pub fn input_symbol_count(&self) -> SymbolNumber {
        self.input_symbol_count
    }

    #[inline]
    pub fn symbol_count(&self) -> SymbolNumber {
        self.symbol_count
    }

    #[inline]
    pub fn index_table_size(&self) -> usize {
        self.index_table_size as usize
    }

    #[inline]
    pub fn target_table_size(&self) -> usize {
        self.target_table_size as usize
    }

    #[inline]
    pub fn state_count(&self) -> u32 {
        self.state_count
    }

    #[inline]
    pub fn transition_count(&self) -> u32 {
        self.transition_count
    }

    #[inline]
    pub fn has_flag(&self, flag: HeaderFlag) -> bool {
        self.flags[flag as usize]
    }
}

/// Probes for and consumes an optional HFST3 container header, returning the
/// number of bytes it occupies (0 if absent).
fn skip_hfst3_container(buf: &[u8]) -> Result<usize> {
    if buf.len() < HFST3_MAGIC.len() || &buf[..HFST3_MAGIC.len()] != HFST3_MAGIC.as_slice() {
        return Ok(0);
    }

    let after_magic = HFST3_MAGIC.len();
    if buf.len() < after_magic + 2 {
        return Err(Error::bad_header("truncated HFST3 container length"));
    }
    let payload_len = LittleEndian::read_u16(&buf[after_magic..after_magic + 2]) as usize;

    let nul_offset = after_magic + 2;
    if buf.len() <= nul_offset || buf[nul_offset] != 0 {
        return Err(Error::bad_header("HFST3 container missing separator NUL"));
    }

    let payload_offset = nul_offset + 1;
    let payload_end = payload_offset
        .checked_add(payload_len)
        .ok_or_else(|| Error::bad_header("HFST3 container length overflow"))?;
    if buf.len() < payload_end {
        return Err(Error::bad_header("truncated HFST3 container payload"));
    }
    let payload = &buf[payload_offset..payload_end];

    if payload_len == 0 || payload[payload_len - 1] != 0 {
        return Err(Error::bad_header("HFST3 container payload must end in NUL"));
    }

    if let Some(k) = find_subslice(payload, b"type") {
        let value_offset = k + 5;
        let value = payload.get(value_offset..).unwrap_or(&[]);
        if !(value.starts_with(b"HFST_OLW") || value.starts_with(b"HFST_OL")) {
            return Err(Error::bad_header("HFST3 container type is not HFST_OL or HFST_OLW"));
        }
    }

    Ok(payload_end)
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}
