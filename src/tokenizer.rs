use hashbrown::HashMap;
use log::debug;

use crate::alphabet::Alphabet;
use crate::constants::NO_SYMBOL;
use crate::types::SymbolNumber;

#[derive(Default)]
struct TrieNode {
    symbol: SymbolNumber,
    children: HashMap<u8, TrieNode>,
}

impl TrieNode {
    fn new() -> TrieNode {
        TrieNode { symbol: NO_SYMBOL, children: HashMap::new() }
    }
}

/// Greedy longest-match tokenizer over input-eligible alphabet symbols: a 256-way
/// byte trie with an ASCII fast path for the common case of single ASCII-byte
/// symbols not shadowed by any multi-byte symbol sharing that first byte.
pub struct Tokenizer {
    root: TrieNode,
    ascii_fast: [SymbolNumber; 128],
}

impl Tokenizer {
    pub fn new(alphabet: &Alphabet) -> Tokenizer {
        let mut tokenizer = Tokenizer { root: TrieNode::new(), ascii_fast: [NO_SYMBOL; 128] };

        for symbol in 0..alphabet.input_symbol_count() {
            if symbol == 0 {
                // Epsilon prints as the empty string; it is never a tokenizable key.
                continue;
            }
            let text = match alphabet.symbol_text(symbol) {
                Some(t) if !t.is_empty() => t,
                _ => continue,
            };
            tokenizer.insert(text, symbol);
        }

        debug!("tokenizer built over {} input symbols", alphabet.input_symbol_count());
        tokenizer
    }

    fn insert(&mut self, text: &str, symbol: SymbolNumber) {
        let bytes = text.as_bytes();

        let mut node = &mut self.root;
        for &b in bytes {
            node = node.children.entry(b).or_insert_with(TrieNode::new);
        }
        let shadowed_by_longer = !node.children.is_empty();
        node.symbol = symbol;

        if bytes.len() == 1 && bytes[0] <= 127 {
            if !shadowed_by_longer {
                self.ascii_fast[bytes[0] as usize] = symbol;
            }
        } else if let Some(&first) = bytes.first() {
            if first <= 127 {
                self.ascii_fast[first as usize] = NO_SYMBOL;
            }
        }
    }

    /// Advances `cursor` past the next tokenized symbol and returns its symbol
    /// number, or `NO_SYMBOL` (advancing by one byte) if no alphabet symbol
    /// prefixes the remaining input.
    pub fn find_next_key(&self, input: &[u8], cursor: &mut usize) -> SymbolNumber {
        let start = *cursor;
        if start >= input.len() {
            return NO_SYMBOL;
        }

        let first = input[start];
        if first <= 127 {
            let fast = self.ascii_fast[first as usize];
            if fast != NO_SYMBOL {
                *cursor += 1;
                return fast;
            }
        }

        let mut node = &self.root;
        let mut best: Option<(usize, SymbolNumber)> = None;
        let mut offset = 0usize;
        while start + offset < input.len() {
            match node.children.get(&input[start + offset]) {
                Some(next) => {
                    node = next;
                    offset += 1;
                    if node.symbol != NO_SYMBOL {
                        best = Some((offset, node.symbol));
                    }
                }
                None => break,
            }
        }

        match best {
            Some((len, symbol)) => {
                *cursor += len;
                symbol
            }
            None => {
                *cursor += 1;
                NO_SYMBOL
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::Alphabet;

    fn alphabet_of(symbols: &[&str]) -> Alphabet {
        let mut buf = Vec::new();
        for s in symbols {
            buf.extend_from_slice(s.as_bytes());
            buf.push(0);
        }
        Alphabet::new(&buf, symbols.len() as SymbolNumber, symbols.len() as SymbolNumber).unwrap()
    }

    #[test]
    fn longest_match_prefers_longer_symbol() {
        let alphabet = alphabet_of(&["", "a", "ab", "abc"]);
        let tokenizer = Tokenizer::new(&alphabet);

        let input = b"abcd";
        let mut cursor = 0;
        assert_eq!(tokenizer.find_next_key(input, &mut cursor), 3);
        assert_eq!(cursor, 3);
        assert_eq!(tokenizer.find_next_key(input, &mut cursor), NO_SYMBOL);
        assert_eq!(cursor, 4);
    }

    #[test]
    fn longest_match_falls_back_on_partial_miss() {
        let alphabet = alphabet_of(&["", "a", "ab", "abc"]);
        let tokenizer = Tokenizer::new(&alphabet);

        let mut cursor = 0;
        assert_eq!(tokenizer.find_next_key(b"abd", &mut cursor), 2);
        assert_eq!(cursor, 2);

        let mut cursor = 0;
        assert_eq!(tokenizer.find_next_key(b"ad", &mut cursor), 1);
        assert_eq!(cursor, 1);
    }

    #[test]
    fn ascii_shadowing_clears_fast_path() {
        let alphabet = alphabet_of(&["", "x", "xy"]);
        let tokenizer = Tokenizer::new(&alphabet);
        assert_eq!(tokenizer.ascii_fast[b'x' as usize], NO_SYMBOL);

        let mut cursor = 0;
        assert_eq!(tokenizer.find_next_key(b"xy", &mut cursor), 2);
    }

    #[test]
    fn unshadowed_ascii_symbol_uses_fast_path() {
        let alphabet = alphabet_of(&["", "x"]);
        let tokenizer = Tokenizer::new(&alphabet);
        assert_eq!(tokenizer.ascii_fast[b'x' as usize], 1);
    }
}
