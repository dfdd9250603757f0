use super::{Tokenizer, Tokens};
use regex::bytes::Regex;
use std::sync::LazyLock;

/// ASCII alphanumeric runs. Byte-oriented so invalid UTF-8 never fails a match.
static WORD_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?-u)[A-Za-z0-9]+").expect("Invalid word regex"));

/// Regex tokenizer. Leaves the buffer untouched and returns copies of each match.
pub struct PatternTokenizer {
    pattern: Regex,
}

impl PatternTokenizer {
    pub fn new() -> Self {
        Self {
            pattern: WORD_PATTERN.clone(),
        }
    }
}

impl Default for PatternTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer for PatternTokenizer {
    fn name(&self) -> &'static str {
        "pattern"
    }

    fn mutates_input(&self) -> bool {
        false
    }

    fn tokenize(&self, content: &mut [u8]) -> Tokens {
        let content: &[u8] = content;
        Tokens::Owned(
            self.pattern
                .find_iter(content)
                .map(|m| m.as_bytes().to_vec())
                .collect(),
        )
    }
}
