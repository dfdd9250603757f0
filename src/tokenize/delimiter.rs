use super::table::ClassificationTable;
use super::{Tokenizer, Tokens};

/// strtok-style tokenizer over an explicit delimiter list.
///
/// Runs of delimiter bytes are overwritten with zero and the start offset of
/// every remaining run is returned.
pub struct DelimiterTokenizer {
    delimiters: Vec<u8>,
    /// Membership bits for `delimiters`, 4 x 64 covers every byte value
    set: [u64; 4],
}

impl DelimiterTokenizer {
    pub fn new(delimiters: &[u8]) -> Self {
        let mut set = [0u64; 4];
        for &b in delimiters {
            set[(b >> 6) as usize] |= 1u64 << (b & 63);
        }
        Self {
            delimiters: delimiters.to_vec(),
            set,
        }
    }

    /// Derive the delimiter list from a classification table
    pub fn from_table(table: &ClassificationTable) -> Self {
        Self::new(&table.delimiters())
    }

    pub fn delimiters(&self) -> &[u8] {
        &self.delimiters
    }

    #[inline(always)]
    fn is_delimiter(&self, byte: u8) -> bool {
        self.set[(byte >> 6) as usize] & (1u64 << (byte & 63)) != 0
    }
}

impl Tokenizer for DelimiterTokenizer {
    fn name(&self) -> &'static str {
        "delimiter"
    }

    fn mutates_input(&self) -> bool {
        true
    }

    fn tokenize(&self, content: &mut [u8]) -> Tokens {
        let mut starts = Vec::new();
        let len = content.len();
        let mut i = 0;

        while i < len {
            // Skip (and zero) the delimiter run
            while i < len && self.is_delimiter(content[i]) {
                content[i] = 0;
                i += 1;
            }
            if i == len {
                break;
            }
            starts.push(i);
            while i < len && !self.is_delimiter(content[i]) {
                i += 1;
            }
        }

        Tokens::Offsets(starts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_list() {
        let tokenizer = DelimiterTokenizer::new(b" ,");
        let mut buf = b"a,b  c".to_vec();
        let tokens = tokenizer.tokenize(&mut buf);
        assert_eq!(tokens, Tokens::Offsets(vec![0, 2, 5]));
        assert_eq!(buf, b"a\0b\0\0c");
    }

    #[test]
    fn test_from_table_matches_branchless_layout() {
        let tokenizer = DelimiterTokenizer::from_table(&ClassificationTable::alphanumeric());
        assert!(tokenizer.delimiters().contains(&b' '));
        let mut buf = b"ab cd".to_vec();
        let tokens = tokenizer.tokenize(&mut buf);
        assert_eq!(tokens, Tokens::Offsets(vec![0, 3]));
        assert_eq!(buf, b"ab\0cd");
    }

    #[test]
    fn test_zero_byte_in_input_is_delimiter() {
        let tokenizer = DelimiterTokenizer::from_table(&ClassificationTable::alphanumeric());
        let mut buf = b"x\0y".to_vec();
        assert_eq!(tokenizer.tokenize(&mut buf).len(), 2);
    }
}
