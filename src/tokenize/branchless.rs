use super::table::{ClassificationTable, DELIMITER};
use super::{Tokenizer, Tokens};
use std::sync::Arc;

/// Table-driven tokenizer that rewrites delimiters to zero in place.
///
/// A token starts wherever a DELIMITER-class byte is followed by a WORD-class
/// byte; position 0 behaves as if preceded by a delimiter. Only start offsets
/// are recorded. The buffer is changed irreversibly, so a second pass over the
/// same bytes is invalid.
pub struct BranchlessTokenizer {
    table: Arc<ClassificationTable>,
}

impl BranchlessTokenizer {
    pub fn new(table: Arc<ClassificationTable>) -> Self {
        Self { table }
    }

    /// Count token starts without touching the buffer
    #[inline]
    fn count_starts(&self, content: &[u8]) -> usize {
        let mut prev = DELIMITER;
        let mut count = 0usize;
        for &byte in content {
            let class = self.table.mask(byte);
            count += (!prev & class & 1) as usize;
            prev = class;
        }
        count
    }
}

impl Tokenizer for BranchlessTokenizer {
    fn name(&self) -> &'static str {
        "branchless"
    }

    fn mutates_input(&self) -> bool {
        true
    }

    fn tokenize(&self, content: &mut [u8]) -> Tokens {
        let count = self.count_starts(content);

        // One spare slot so the unconditional store below never goes out of bounds
        let mut starts = vec![0usize; count + 1];
        let mut n = 0usize;
        let mut prev = DELIMITER;

        for (i, byte) in content.iter_mut().enumerate() {
            let class = self.table.mask(*byte);
            *byte &= class;
            starts[n] = i;
            n += (!prev & class & 1) as usize;
            prev = class;
        }

        debug_assert_eq!(n, count);
        starts.truncate(count);
        Tokens::Offsets(starts)
    }
}
