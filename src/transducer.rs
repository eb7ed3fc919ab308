use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use log::trace;
use memmap2::Mmap;

use crate::alphabet::Alphabet;
use crate::constants::{INDEX_TABLE_RECORD_SIZE, TRANSITION_RECORD_SIZE_PLAIN, TRANSITION_RECORD_SIZE_WEIGHTED};
use crate::engine::{self, LookupResult};
use crate::error::{Error, Result};
use crate::header::TransducerHeader;
use crate::index_table::IndexTable;
use crate::options::LookupOptions;
use crate::tokenizer::Tokenizer;
use crate::transition_table::TransitionTable;
use crate::types::HeaderFlag;

/// The backing byte buffer a transducer's tables are read from. A trait object so
/// tests can substitute a plain `Vec<u8>` for a real mmapped file.
pub type Buffer = Arc<dyn AsRef<[u8]> + Send + Sync>;

/// An opened, exclusively-owned transducer handle: header, alphabet, tokenizer,
/// and the two on-disk tables, plus everything a lookup call needs as scratch
/// state. Constructed once; reused across many calls to `lookup`.
pub struct Transducer {
    header: TransducerHeader,
    alphabet: Alphabet,
    tokenizer: Tokenizer,
    index_table: IndexTable,
    transition_table: TransitionTable,
}

impl Transducer {
    /// Opens and fully parses a transducer file, memory-mapping its tables.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Transducer> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| Error::NotFound { path: path.to_path_buf(), source })?;
        let mmap = unsafe { Mmap::map(&file) }
            .map_err(|source| Error::NotFound { path: path.to_path_buf(), source })?;
        let buf: Buffer = Arc::new(mmap);
        Transducer::from_buffer(buf)
    }

    /// Builds a transducer directly from an in-memory buffer (used by tests and by
    /// `open`, which wraps a memory-mapped file in the same `Buffer` type).
    pub fn from_buffer(buf: Buffer) -> Result<Transducer> {
        let whole: &[u8] = buf.as_ref().as_ref();
        let header = TransducerHeader::new(whole)?;

        let alphabet_offset = header.len();
        if whole.len() < alphabet_offset {
            return Err(Error::bad_header("file ends before alphabet block"));
        }
        let alphabet = Alphabet::new(
            &whole[alphabet_offset..],
            header.input_symbol_count(),
            header.symbol_count(),
        )?;

        let index_table_offset = alphabet_offset + alphabet.len();
        let index_table_bytes = header.index_table_size() * INDEX_TABLE_RECORD_SIZE;
        let index_table_end = index_table_offset + index_table_bytes;
        if whole.len() < index_table_end {
            return Err(Error::bad_header("file ends before index table is fully read"));
        }
        trace!(
            "index table block: offset={} records={} bytes={}",
            index_table_offset, header.index_table_size(), index_table_bytes
        );
        let weighted = header.has_flag(HeaderFlag::Weighted);
        let index_table = IndexTable::new(buf.clone(), index_table_offset, header.index_table_size(), weighted);

        let transition_record_size =
            if weighted { TRANSITION_RECORD_SIZE_WEIGHTED } else { TRANSITION_RECORD_SIZE_PLAIN };
        let transition_table_bytes = header.target_table_size() * transition_record_size;
        let transition_table_end = index_table_end + transition_table_bytes;
        if whole.len() < transition_table_end {
            return Err(Error::bad_header("file ends before transition table is fully read"));
        }
        trace!(
            "transition table block: offset={} records={} bytes={}",
            index_table_end, header.target_table_size(), transition_table_bytes
        );
        let transition_table =
            TransitionTable::new(buf, index_table_end, header.target_table_size(), weighted);

        let tokenizer = Tokenizer::new(&alphabet);

        Ok(Transducer { header, alphabet, tokenizer, index_table, transition_table })
    }

    /// Looks up every analysis of `input` under the given options. Never returns
    /// an error: tokenization failures, timeouts, and the unsupported
    /// weighted+flags+unique combination are reported as flags on the result.
    pub fn lookup(&self, input: &str, options: &LookupOptions) -> LookupResult {
        engine::lookup(self, input, options)
    }

    #[inline]
    pub fn symbol_count(&self) -> u16 {
        self.alphabet.symbol_count() as u16
    }

    #[inline]
    pub(crate) fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    #[inline]
    pub(crate) fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    #[inline]
    pub(crate) fn index_table(&self) -> &IndexTable {
        &self.index_table
    }

    #[inline]
    pub(crate) fn transition_table(&self) -> &TransitionTable {
        &self.transition_table
    }

    #[inline]
    pub fn is_weighted(&self) -> bool {
        self.header.has_flag(HeaderFlag::Weighted)
    }
}
