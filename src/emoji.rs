//! Emoji lookup seam.
//!
//! The glyph atlas lives outside this crate; the tokenizer only needs to
//! know whether the upcoming scalar sequence is an emoji and how many
//! scalars it consumes. [`BuiltinEmoji`] recognizes the common single-scalar
//! ranges plus keycap, variation-selector and regional-indicator pairs,
//! which is enough for layout; embedders with a real atlas implement
//! [`EmojiTable`] themselves.

/// Opaque reference into an external emoji atlas.
///
/// [`BuiltinEmoji`] uses the leading scalar value as the reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EmojiRef(pub u32);

/// A successful lookup: which glyph, and how many scalars it covers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EmojiMatch {
    pub emoji: EmojiRef,
    /// Number of scalars consumed from the input, at least 1.
    pub len: usize,
}

/// Lookup table consulted by the tokenizer after every accepted scalar.
pub trait EmojiTable {
    /// Match an emoji at the start of `chars`. Multi-scalar emoji must
    /// match exactly or the lookup fails as a whole.
    fn find(&self, chars: &[char]) -> Option<EmojiMatch>;
}

/// Table that never matches; text stays plain.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoEmoji;

impl EmojiTable for NoEmoji {
    fn find(&self, _chars: &[char]) -> Option<EmojiMatch> {
        None
    }
}

/// Combining enclosing keycap.
pub const KEYCAP: char = '\u{20E3}';
/// Emoji variation selector (VS16).
pub const VARIATION: char = '\u{FE0F}';

/// Built-in recognizer over the common emoji scalar ranges.
#[derive(Clone, Copy, Debug, Default)]
pub struct BuiltinEmoji;

impl BuiltinEmoji {
    fn is_emoji_scalar(ch: char) -> bool {
        matches!(u32::from(ch),
            0x1F000..=0x1F0FF    // mahjong, dominoes, cards
            | 0x1F300..=0x1F5FF  // symbols & pictographs
            | 0x1F600..=0x1F64F  // emoticons
            | 0x1F680..=0x1F6FF  // transport
            | 0x1F900..=0x1F9FF  // supplemental symbols
            | 0x2600..=0x26FF    // miscellaneous symbols
            | 0x2700..=0x27BF    // dingbats
            | 0x2B00..=0x2BFF)   // arrows, stars
    }

    fn is_regional(ch: char) -> bool {
        matches!(u32::from(ch), 0x1F1E6..=0x1F1FF)
    }
}

impl EmojiTable for BuiltinEmoji {
    fn find(&self, chars: &[char]) -> Option<EmojiMatch> {
        let &first = chars.first()?;

        // Keycap pairs: digit or '#' followed by U+20E3.
        if (first.is_ascii_digit() || first == '#') && chars.get(1) == Some(&KEYCAP) {
            return Some(EmojiMatch {
                emoji: EmojiRef(u32::from(first)),
                len: 2,
            });
        }

        // Flag pairs: two regional indicators.
        if Self::is_regional(first) {
            let second = *chars.get(1)?;
            if !Self::is_regional(second) {
                return None;
            }
            return Some(EmojiMatch {
                emoji: EmojiRef(u32::from(first)),
                len: 2,
            });
        }

        if Self::is_emoji_scalar(first) {
            // Absorb a trailing VS16 into the same glyph.
            let len = if chars.get(1) == Some(&VARIATION) { 2 } else { 1 };
            return Some(EmojiMatch {
                emoji: EmojiRef(u32::from(first)),
                len,
            });
        }

        None
    }
}
