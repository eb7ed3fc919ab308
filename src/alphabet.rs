use hashbrown::HashMap;
use log::debug;
use smol_str::SmolStr;

use crate::constants::{MAX_SYMBOL_LENGTH, NO_SYMBOL};
use crate::error::{Error, Result};
use crate::types::{
    FlagDiacriticOperation, FlagDiacriticOperator, OperationsMap, SymbolNumber, ValueNumber,
};

/// The symbol table and flag-diacritic operation table parsed from an alphabet
/// block: the printable text, interning map, and per-symbol flag operation for
/// every symbol in the transducer.
#[derive(Debug)]
pub struct Alphabet {
    key_table: Vec<SmolStr>,
    input_symbol_count: SymbolNumber,
    flag_state_size: SymbolNumber,
    /// Bytes consumed from the start of the alphabet block, including trailing
    /// NUL padding.
    length: usize,
    string_to_symbol: HashMap<SmolStr, SymbolNumber>,
    operations: OperationsMap,
}

struct AlphabetParser {
    key_table: Vec<SmolStr>,
    string_to_symbol: HashMap<SmolStr, SymbolNumber>,
    operations: OperationsMap,
    feature_bucket: HashMap<SmolStr, SymbolNumber>,
    value_bucket: HashMap<SmolStr, ValueNumber>,
    val_n: ValueNumber,
    feat_n: SymbolNumber,
}

impl AlphabetParser {
    fn new() -> AlphabetParser {
        let mut value_bucket = HashMap::new();
        value_bucket.insert(SmolStr::from(""), 0);
        AlphabetParser {
            key_table: Vec::with_capacity(64),
            string_to_symbol: HashMap::new(),
            operations: HashMap::new(),
            feature_bucket: HashMap::new(),
            value_bucket,
            val_n: 1,
            feat_n: 0,
        }
    }

    fn handle_flag_symbol(&mut self, i: SymbolNumber, key: &str) -> Result<()> {
        let mut chunks = key[1..key.len() - 1].split('.');
        let op_str = chunks.next().ok_or_else(|| Error::bad_header("empty flag diacritic symbol"))?;
        let fdo = FlagDiacriticOperator::from_str(op_str)
            .ok_or_else(|| Error::bad_header(format!("unknown flag diacritic operator: {}", op_str)))?;

        let feature: SmolStr = chunks.next().unwrap_or("").into();
        let value: SmolStr = chunks.next().unwrap_or("").into();

        if !self.feature_bucket.contains_key(&feature) {
            self.feature_bucket.insert(feature.clone(), self.feat_n);
            self.feat_n += 1;
        }
        if !self.value_bucket.contains_key(&value) {
            self.value_bucket.insert(value.clone(), self.val_n);
            self.val_n += 1;
        }

        let op = FlagDiacriticOperation {
            operation: fdo,
            feature: self.feature_bucket[&feature],
            value: self.value_bucket[&value],
        };

        self.operations.insert(i, op);
        self.key_table.push(SmolStr::from(""));
        Ok(())
    }

    fn handle_plain_symbol(&mut self, i: SymbolNumber, key: SmolStr) {
        self.operations.insert(
            i,
            FlagDiacriticOperation {
                operation: FlagDiacriticOperator::PositiveSet,
                feature: NO_SYMBOL,
                value: 0,
            },
        );
        self.string_to_symbol.insert(key.clone(), i);
        self.key_table.push(key);
    }

    fn is_flag_pattern(key: &str) -> bool {
        let bytes = key.as_bytes();
        bytes.len() >= 5
            && bytes[0] == b'@'
            && bytes[bytes.len() - 1] == b'@'
            && bytes[2] == b'.'
            && matches!(bytes[1], b'P' | b'N' | b'R' | b'D' | b'C' | b'U')
    }

    fn parse_inner(&mut self, buf: &[u8], symbols: SymbolNumber) -> Result<usize> {
        let mut offset = 0usize;

        for i in 0..symbols {
            let start = offset;
            let mut end = start;
            while buf.get(end).copied().unwrap_or(0) != 0 {
                end += 1;
                if end - start >= MAX_SYMBOL_LENGTH {
                    return Err(Error::bad_header("alphabet symbol exceeds maximum length"));
                }
            }
            if end >= buf.len() {
                return Err(Error::bad_header("truncated alphabet symbol table"));
            }

            let key: SmolStr = String::from_utf8_lossy(&buf[start..end]).into();

            if Self::is_flag_pattern(&key) {
                self.handle_flag_symbol(i, &key)?;
            } else {
                self.handle_plain_symbol(i, key);
            }

            offset = end + 1;
        }

        // Epsilon always prints as the empty string.
        if let Some(first) = self.key_table.get_mut(0) {
            *first = SmolStr::from("");
        }

        while buf.get(offset).copied().unwrap_or(0) == 0 && offset < buf.len() {
            offset += 1;
        }

        Ok(offset)
    }
}

impl Alphabet {
    pub fn new(buf: &[u8], input_symbol_count: SymbolNumber, symbol_count: SymbolNumber) -> Result<Alphabet> {
        let mut parser = AlphabetParser::new();
        let length = parser.parse_inner(buf, symbol_count)?;

        let flag_state_size = parser.feat_n;
        debug!(
            "alphabet: {} symbols, {} flag features, {} bytes",
            symbol_count, flag_state_size, length
        );
        if flag_state_size == 0 {
            debug!("transducer alphabet contains no flag diacritics; using flagless engine path");
        }

        Ok(Alphabet {
            key_table: parser.key_table,
            input_symbol_count,
            flag_state_size,
            length,
            string_to_symbol: parser.string_to_symbol,
            operations: parser.operations,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.length
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    #[inline]
    pub fn key_table(&self) -> &[SmolStr] {
        &self.key_table
    }

    #[inline]
    pub fn symbol_text(&self, symbol: SymbolNumber) -> Option<&str> {
        self.key_table.get(symbol as usize).map(|s| s.as_str())
    }

    #[inline]
    pub fn input_symbol_count(&self) -> SymbolNumber {
        self.input_symbol_count
    }

    #[inline]
    pub fn symbol_count(&self) -> usize {
        self.key_table.len()
    }

    /// Width of the flag-diacritic state vector (number of distinct features).
    #[inline]
    pub fn state_size(&self) -> SymbolNumber {
        self.flag_state_size
    }

    #[inline]
    pub fn has_flags(&self) -> bool {
        self.flag_state_size > 0
    }

    #[inline]
    pub fn operation(&self, symbol: SymbolNumber) -> Option<&FlagDiacriticOperation> {
        self.operations.get(&symbol).filter(|op| op.feature != NO_SYMBOL)
    }

    #[inline]
    pub fn is_flag(&self, symbol: SymbolNumber) -> bool {
        self.operation(symbol).is_some()
    }

    #[inline]
    pub fn string_to_symbol(&self) -> &HashMap<SmolStr, SymbolNumber> {
        &self.string_to_symbol
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nul_join(words: &[&str]) -> Vec<u8> {
        let mut buf = Vec::new();
        for w in words {
            buf.extend_from_slice(w.as_bytes());
            buf.push(0);
        }
        buf
    }

    #[test]
    fn parses_plain_symbols() {
        let buf = nul_join(&["", "a", "b", "x"]);
        let alphabet = Alphabet::new(&buf, 2, 4).unwrap();
        assert_eq!(alphabet.symbol_text(1), Some("a"));
        assert_eq!(alphabet.symbol_text(2), Some("b"));
        assert_eq!(alphabet.symbol_text(0), Some(""));
        assert_eq!(alphabet.state_size(), 0);
        assert!(!alphabet.is_flag(1));
    }

    #[test]
    fn parses_flag_diacritic_symbols() {
        let buf = nul_join(&["", "cat", "@P.CASE.NOM@", "@R.CASE.ACC@"]);
        let alphabet = Alphabet::new(&buf, 1, 4).unwrap();
        assert!(alphabet.is_flag(2));
        assert!(alphabet.is_flag(3));
        assert_eq!(alphabet.symbol_text(2), Some(""));

        let p = alphabet.operation(2).unwrap();
        assert_eq!(p.operation, FlagDiacriticOperator::PositiveSet);
        let r = alphabet.operation(3).unwrap();
        assert_eq!(r.operation, FlagDiacriticOperator::Require);
        assert_eq!(p.feature, r.feature, "CASE interned to the same feature id");
        assert_eq!(alphabet.state_size(), 1);
    }

    #[test]
    fn rejects_oversized_symbol() {
        let long = "a".repeat(MAX_SYMBOL_LENGTH + 1);
        let buf = nul_join(&[&long]);
        assert!(Alphabet::new(&buf, 1, 1).is_err());
    }
}
