//! Tokenizer strategies.
//!
//! Three interchangeable algorithms split a raw byte buffer into tokens:
//!
//! - [`BranchlessTokenizer`] - table lookup + AND mask, rewrites the buffer in
//!   place and records token start offsets
//! - [`PatternTokenizer`] - a word regex over the bytes, leaves the buffer
//!   untouched and returns copies
//! - [`DelimiterTokenizer`] - strtok-style split on an explicit delimiter list,
//!   rewrites the buffer in place and records start offsets
//!
//! All of them treat ASCII alphanumerics as word bytes and everything else
//! as a delimiter, so they agree on token counts for any input.
//!
//! ```
//! use nidx::tokenize::{ClassificationTable, Tokenizer, TokenizerKind};
//! use std::sync::Arc;
//!
//! let table = Arc::new(ClassificationTable::alphanumeric());
//! let tokenizer = TokenizerKind::Branchless.build(table);
//!
//! let mut buf = b"ab cd".to_vec();
//! let tokens = tokenizer.tokenize(&mut buf);
//! assert_eq!(tokens.offsets(), Some(&[0usize, 3][..]));
//! assert_eq!(buf[2], 0);
//! ```

pub mod branchless;
pub mod delimiter;
pub mod pattern;
pub mod table;

pub use branchless::BranchlessTokenizer;
pub use delimiter::DelimiterTokenizer;
pub use pattern::PatternTokenizer;
pub use table::{ClassificationTable, DELIMITER, WORD};

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Output of one tokenizer call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tokens {
    /// Start offsets into the (rewritten, zero-separated) buffer
    Offsets(Vec<usize>),
    /// Owned copies of each token
    Owned(Vec<Vec<u8>>),
}

impl Tokens {
    pub fn len(&self) -> usize {
        match self {
            Tokens::Offsets(v) => v.len(),
            Tokens::Owned(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn offsets(&self) -> Option<&[usize]> {
        match self {
            Tokens::Offsets(v) => Some(v),
            Tokens::Owned(_) => None,
        }
    }

    /// Token texts, resolving offsets against the buffer they were taken from
    pub fn texts<'a>(&'a self, buffer: &'a [u8]) -> Vec<&'a [u8]> {
        match self {
            Tokens::Offsets(v) => v.iter().map(|&start| token_at(buffer, start)).collect(),
            Tokens::Owned(v) => v.iter().map(Vec::as_slice).collect(),
        }
    }
}

/// A tokenization strategy.
///
/// Implementations must never read outside `content`. Strategies that rewrite
/// the buffer report it through [`Tokenizer::mutates_input`]; running them a
/// second time over the same bytes is invalid and is refused by
/// [`LoadedBuffer::tokenize_with`](crate::ingest::LoadedBuffer::tokenize_with).
pub trait Tokenizer: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether `tokenize` rewrites delimiter bytes to zero
    fn mutates_input(&self) -> bool;

    fn tokenize(&self, content: &mut [u8]) -> Tokens;
}

/// Recover the text of a token from its start offset in a rewritten buffer.
///
/// Scans forward to the next zero byte or the end of the buffer.
pub fn token_at(buffer: &[u8], start: usize) -> &[u8] {
    let rest = buffer.get(start..).unwrap_or(&[]);
    let end = memchr::memchr(0, rest).unwrap_or(rest.len());
    &rest[..end]
}

/// Strategy selector, fixed when the engine is built
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TokenizerKind {
    #[default]
    Branchless,
    Pattern,
    Delimiter,
}

impl TokenizerKind {
    pub const ALL: [TokenizerKind; 3] = [
        TokenizerKind::Branchless,
        TokenizerKind::Pattern,
        TokenizerKind::Delimiter,
    ];

    /// Construct the strategy over a shared classification table
    pub fn build(self, table: Arc<ClassificationTable>) -> Arc<dyn Tokenizer> {
        match self {
            TokenizerKind::Branchless => Arc::new(BranchlessTokenizer::new(table)),
            TokenizerKind::Pattern => Arc::new(PatternTokenizer::new()),
            TokenizerKind::Delimiter => Arc::new(DelimiterTokenizer::from_table(&table)),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TokenizerKind::Branchless => "branchless",
            TokenizerKind::Pattern => "pattern",
            TokenizerKind::Delimiter => "delimiter",
        }
    }
}

impl fmt::Display for TokenizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenizerKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "branchless" | "table" => Ok(TokenizerKind::Branchless),
            "pattern" | "regex" => Ok(TokenizerKind::Pattern),
            "delimiter" | "strtok" => Ok(TokenizerKind::Delimiter),
            other => Err(ConfigError::UnknownStrategy(other.to_string())),
        }
    }
}
