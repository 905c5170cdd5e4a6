//! Core lexical types for the natlog engine.
//!
//! Words are the atomic units of the search space. Every token in a query is
//! a [`Word`] (a 24-bit lexical id) wrapped in a [`TaggedWord`] that carries
//! its sense and monotonicity marker in a single packed `u32`.

use serde::{Deserialize, Serialize};

/// Maximum number of tokens in a query tree.
///
/// Bounded by the 26-bit deletion bitmask and the 5-bit cursor index carried
/// by every search node.
pub const MAX_QUERY_LENGTH: usize = 26;

/// Sentinel governor index marking the root of a dependency tree (6 bits, all set).
pub const TREE_ROOT: u8 = 63;

/// The reserved word used as the governor of the root's incoming edge.
pub const TREE_ROOT_WORD: Word = Word(0);

const WORD_BITS: u32 = 24;
const WORD_MASK: u32 = (1 << WORD_BITS) - 1;
const SENSE_MASK: u32 = 0x1F;

/// A 24-bit lexical id.
///
/// Ids above 2^24 - 1 are truncated at construction; the vocabulary indexer
/// that assigns them never exceeds that range.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[repr(transparent)]
pub struct Word(u32);

impl Word {
    /// Create a word id, masking to 24 bits.
    pub const fn new(raw: u32) -> Self {
        Word(raw & WORD_MASK)
    }

    /// The underlying id.
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for Word {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "w:{}", self.0)
    }
}

impl From<u32> for Word {
    fn from(raw: u32) -> Self {
        Word::new(raw)
    }
}

/// Per-word monotonicity marker (2 bits).
///
/// Controls whether generalising or specialising the word preserves truth at
/// its position in the sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Monotonicity {
    /// Upward monotone: generalisation preserves truth.
    Up = 0,
    /// Downward monotone: specialisation preserves truth.
    Down = 1,
    /// Non-monotone context.
    Flat = 2,
    /// No marking; treated as upward by the projection rules.
    #[default]
    Default = 3,
}

impl Monotonicity {
    fn from_bits(bits: u32) -> Self {
        match bits & 0x3 {
            0 => Monotonicity::Up,
            1 => Monotonicity::Down,
            2 => Monotonicity::Flat,
            _ => Monotonicity::Default,
        }
    }
}

impl std::fmt::Display for Monotonicity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Monotonicity::Up => write!(f, "up"),
            Monotonicity::Down => write!(f, "down"),
            Monotonicity::Flat => write!(f, "flat"),
            Monotonicity::Default => write!(f, "default"),
        }
    }
}

/// A word bundled with its sense and monotonicity, packed into one `u32`.
///
/// Layout: word (bits 0..24) | sense (24..29) | monotonicity (29..31).
/// Bit 31 is reserved zero; the search node borrows it for bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct TaggedWord(u32);

const _: () = assert!(std::mem::size_of::<TaggedWord>() == 4);

impl TaggedWord {
    /// Pack a word, sense, and monotonicity.
    pub fn new(word: Word, sense: u8, monotonicity: Monotonicity) -> Self {
        TaggedWord(
            (word.get() & WORD_MASK)
                | ((sense as u32 & SENSE_MASK) << 24)
                | ((monotonicity as u32) << 29),
        )
    }

    /// Reconstruct from raw packed bits (bit 31 is cleared).
    pub fn from_bits(bits: u32) -> Self {
        TaggedWord(bits & 0x7FFF_FFFF)
    }

    /// The raw packed representation.
    pub fn bits(self) -> u32 {
        self.0
    }

    /// The lexical id.
    pub fn word(self) -> Word {
        Word(self.0 & WORD_MASK)
    }

    /// The 5-bit sense id.
    pub fn sense(self) -> u8 {
        ((self.0 >> 24) & SENSE_MASK) as u8
    }

    /// The monotonicity marker.
    pub fn monotonicity(self) -> Monotonicity {
        Monotonicity::from_bits(self.0 >> 29)
    }

    /// This word with a different monotonicity marker.
    pub fn with_monotonicity(self, monotonicity: Monotonicity) -> Self {
        TaggedWord::new(self.word(), self.sense(), monotonicity)
    }
}

impl std::fmt::Display for TaggedWord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}^{}", self.word(), self.sense(), self.monotonicity())
    }
}
