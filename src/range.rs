//! Inclusive article number ranges

use std::fmt;

/// Inclusive range of article numbers
///
/// Used both for the locally-known bounds of a group, `(0, 0)` when
/// nothing is stored, and for the bounds a server reports, where an empty
/// group may come back as `(low, low - 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ArticleRange {
    /// Lowest article number
    pub min: u64,
    /// Highest article number
    pub max: u64,
}

impl ArticleRange {
    /// The empty range
    pub const EMPTY: ArticleRange = ArticleRange { min: 0, max: 0 };

    /// Create a range; callers are expected to pass `min <= max`
    pub const fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    /// True when no article is covered
    pub fn is_empty(&self) -> bool {
        self.max < 1 || self.min > self.max
    }

    /// Number of article numbers covered (not the number of articles present)
    pub fn span(&self) -> u64 {
        if self.is_empty() {
            0
        } else {
            self.max - self.min + 1
        }
    }

    /// Whether `article` lies inside the range
    pub fn contains(&self, article: u64) -> bool {
        !self.is_empty() && self.min <= article && article <= self.max
    }
}

/// Formats as the NNTP range argument `min-max`
impl fmt::Display for ArticleRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.min, self.max)
    }
}
