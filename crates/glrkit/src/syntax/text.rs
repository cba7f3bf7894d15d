#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};
use std::fmt;

/// Byte offset into UTF-8 source text. Arithmetic saturates at `u32::MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct TextSize(u32);

/// Half-open byte span `start..end` of source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct TextRange {
    start: TextSize,
    end: TextSize,
}

impl TextSize {
    #[must_use]
    pub const fn new(offset: u32) -> Self {
        Self(offset)
    }

    #[must_use]
    pub const fn zero() -> Self {
        Self(0)
    }

    /// Length of `text` in bytes, saturating at `u32::MAX`
    #[must_use]
    pub fn of(text: &str) -> Self {
        Self(u32::try_from(text.len()).unwrap_or(u32::MAX))
    }

    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn to_usize(self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for TextSize {
    fn from(offset: u32) -> Self {
        Self(offset)
    }
}

impl std::ops::Add<Self> for TextSize {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl std::ops::AddAssign<Self> for TextSize {
    fn add_assign(&mut self, rhs: Self) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl TextRange {
    /// # Panics
    ///
    /// If `start` is past `end`.
    #[must_use]
    pub const fn new(start: TextSize, end: TextSize) -> Self {
        assert!(start.0 <= end.0, "text range start is past its end");
        Self { start, end }
    }

    /// Range of `len` bytes from `start`, clamped at `u32::MAX`.
    #[must_use]
    pub const fn at(start: TextSize, len: TextSize) -> Self {
        Self::new(start, TextSize(start.0.saturating_add(len.0)))
    }

    /// Empty range at `offset`
    #[must_use]
    pub const fn empty(offset: TextSize) -> Self {
        Self::new(offset, offset)
    }

    #[must_use]
    pub const fn start(self) -> TextSize {
        self.start
    }

    #[must_use]
    pub const fn end(self) -> TextSize {
        self.end
    }

    #[must_use]
    pub const fn len(self) -> TextSize {
        // a deserialized range may be inverted
        TextSize(self.end.0.saturating_sub(self.start.0))
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.start.0 == self.end.0
    }

    #[must_use]
    pub const fn contains(self, offset: TextSize) -> bool {
        offset.0 >= self.start.0 && offset.0 < self.end.0
    }

    /// Smallest range covering both `self` and `other`
    #[must_use]
    pub fn cover(self, other: Self) -> Self {
        Self::new(self.start.min(other.start), self.end.max(other.end))
    }

    /// Slice `source` by this range, or `None` if the range falls outside it
    /// or splits a UTF-8 sequence.
    #[must_use]
    pub fn slice(self, source: &str) -> Option<&str> {
        source.get(self.start.to_usize()..self.end.to_usize())
    }
}

impl fmt::Display for TextRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start.0, self.end.0)
    }
}

#[cfg(feature = "diagnostics")]
impl From<TextRange> for miette::SourceSpan {
    fn from(range: TextRange) -> Self {
        use miette::SourceOffset;
        Self::new(
            SourceOffset::from(range.start().to_usize()),
            range.len().to_usize(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_size_of() {
        assert_eq!(TextSize::of("héllo").get(), 6);
        assert_eq!(TextSize::of("").get(), 0);
    }

    #[test]
    fn test_text_range_at() {
        let range = TextRange::at(TextSize::new(10), TextSize::new(5));
        assert_eq!(range.start(), TextSize::new(10));
        assert_eq!(range.end(), TextSize::new(15));
        assert_eq!(range.len(), TextSize::new(5));
    }

    #[test]
    fn test_text_arithmetic_saturates() {
        let range = TextRange::at(TextSize::new(u32::MAX - 1), TextSize::new(5));
        assert_eq!(range.end(), TextSize::new(u32::MAX));
        assert_eq!(range.len(), TextSize::new(1));

        let mut size = TextSize::new(u32::MAX);
        size += TextSize::new(1);
        assert_eq!(size, TextSize::new(u32::MAX));
        assert_eq!(TextSize::new(3) + TextSize::new(4), TextSize::new(7));
    }

    #[test]
    #[should_panic(expected = "start is past its end")]
    fn test_inverted_range_is_refused() {
        let _ = TextRange::new(TextSize::new(5), TextSize::new(4));
    }

    #[test]
    fn test_text_range_contains() {
        let range = TextRange::new(TextSize::new(10), TextSize::new(20));

        assert!(!range.contains(TextSize::new(9)));
        assert!(range.contains(TextSize::new(10)));
        assert!(!range.contains(TextSize::new(20))); // exclusive end
    }

    #[test]
    fn test_text_range_cover() {
        let a = TextRange::new(TextSize::new(4), TextSize::new(6));
        let b = TextRange::new(TextSize::new(1), TextSize::new(3));
        assert_eq!(a.cover(b), TextRange::new(TextSize::new(1), TextSize::new(6)));
    }

    #[test]
    fn test_text_range_slice() {
        let source = "let x = 1;";
        let range = TextRange::at(TextSize::new(4), TextSize::new(1));
        assert_eq!(range.slice(source), Some("x"));
        assert_eq!(TextRange::at(TextSize::new(8), TextSize::new(9)).slice(source), None);
    }

    #[test]
    fn test_text_range_display() {
        let range = TextRange::new(TextSize::new(10), TextSize::new(20));
        assert_eq!(format!("{range}"), "10..20");
    }
}
