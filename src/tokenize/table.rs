/// Mask stored for word bytes (all bits set)
pub const WORD: u8 = 0xFF;

/// Mask stored for delimiter bytes
pub const DELIMITER: u8 = 0x00;

/// Byte classifier mapping every byte value to [`WORD`] or [`DELIMITER`].
///
/// The stored value doubles as an AND mask: `byte & table.mask(byte)` keeps
/// word bytes and zeroes delimiters. Built once, then shared read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationTable {
    masks: [u8; 256],
}

impl ClassificationTable {
    /// ASCII alphanumerics are words, everything else delimits
    pub fn alphanumeric() -> Self {
        Self::from_fn(|b| b.is_ascii_alphanumeric())
    }

    /// Build a table from a word-byte predicate
    pub fn from_fn(is_word: impl Fn(u8) -> bool) -> Self {
        let mut masks = [DELIMITER; 256];
        for (byte, mask) in masks.iter_mut().enumerate() {
            if is_word(byte as u8) {
                *mask = WORD;
            }
        }
        Self { masks }
    }

    #[inline(always)]
    pub fn mask(&self, byte: u8) -> u8 {
        self.masks[byte as usize]
    }

    #[inline(always)]
    pub fn is_word(&self, byte: u8) -> bool {
        self.mask(byte) == WORD
    }

    /// Every byte value classified as a delimiter, ascending
    pub fn delimiters(&self) -> Vec<u8> {
        (0..=255u8).filter(|&b| !self.is_word(b)).collect()
    }
}

impl Default for ClassificationTable {
    fn default() -> Self {
        Self::alphanumeric()
    }
}
