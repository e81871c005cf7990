//! Run and word model: cached layout metrics over the normalized buffer.
//!
//! A run is a maximal span of the buffer with uniform kind, style and link
//! index. Text runs carry a pre-segmented word list so the wrap loop never
//! re-measures glyphs; emoji and skip-placeholder runs are fixed-size
//! "objects" covering one logical position each.

use crate::bidi::Direction;
use crate::color::Rgba;
use crate::emoji::EmojiRef;
use crate::fixed::Fixed;
use crate::font::FontMetrics;
use crate::style::StyleFlags;
use unicode_segmentation::UnicodeSegmentation;

/// A wrap-safe sub-span of a Text run with precomputed advance metrics.
///
/// A negative `width` marks a mid-grapheme fragment produced by the
/// over-wide-word fallback: measurable, but not a safe wrap point.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Word {
    pub(crate) from: u16,
    pub(crate) width: Fixed,
    pub(crate) rbearing: Fixed,
    pub(crate) rpadding: Fixed,
}

impl Word {
    /// Buffer offset of the first scalar.
    #[must_use]
    pub fn from(&self) -> u16 {
        self.from
    }

    /// Signed advance width; see the type docs for the sign convention.
    #[must_use]
    pub fn width(&self) -> Fixed {
        self.width
    }

    /// True when a line may break after this word.
    #[must_use]
    pub fn ends_word(&self) -> bool {
        !self.width.is_negative()
    }

    pub(crate) fn abs_width(&self) -> Fixed {
        self.width.abs()
    }

    pub(crate) fn rbearing(&self) -> Fixed {
        self.rbearing
    }

    pub(crate) fn rpadding(&self) -> Fixed {
        self.rpadding
    }
}

/// Kind-specific payload of a [`Run`].
#[derive(Clone, Debug, PartialEq)]
pub enum RunKind {
    /// Ordinary text with its word segmentation.
    Text { words: Vec<Word> },
    /// Paragraph boundary; caches the direction of the paragraph that
    /// follows it.
    Newline { next_direction: Direction },
    /// One emoji glyph.
    Emoji { emoji: EmojiRef },
    /// Fixed-size opaque reservation (one `_` buffer position).
    Skip { height: i32 },
}

/// A span of the buffer with uniform kind, style and link index.
#[derive(Clone, Debug, PartialEq)]
pub struct Run {
    pub from: u16,
    pub length: u16,
    pub flags: StyleFlags,
    /// 1-based index into the document link table; 0 = no link.
    pub link_index: u16,
    /// Explicit foreground override from markup.
    pub color: Option<Rgba>,
    pub(crate) width: Fixed,
    pub(crate) lpadding: Fixed,
    pub(crate) rpadding: Fixed,
    pub kind: RunKind,
}

impl Run {
    /// Buffer offset just past this run.
    #[must_use]
    pub fn end(&self) -> u16 {
        self.from + self.length
    }

    /// Cached advance width (leading padding included, trailing excluded).
    #[must_use]
    pub fn width(&self) -> Fixed {
        self.width
    }

    /// Trailing whitespace width carried to the next run on the same line.
    #[must_use]
    pub fn rpadding(&self) -> Fixed {
        self.rpadding
    }

    /// Right-side bearing of the final word.
    pub(crate) fn rbearing(&self) -> Fixed {
        match &self.kind {
            RunKind::Text { words } => words.last().map_or(Fixed::ZERO, Word::rbearing),
            _ => Fixed::ZERO,
        }
    }

    /// Emoji and skip runs are opaque objects for BiDi and hit-testing.
    #[must_use]
    pub fn is_object(&self) -> bool {
        matches!(self.kind, RunKind::Emoji { .. } | RunKind::Skip { .. })
    }

    #[must_use]
    pub fn is_newline(&self) -> bool {
        matches!(self.kind, RunKind::Newline { .. })
    }

    /// Build a text run, segmenting `buffer[from..from+length]` into words.
    pub(crate) fn new_text(
        buffer: &[char],
        from: usize,
        length: usize,
        flags: StyleFlags,
        link_index: u16,
        color: Option<Rgba>,
        metrics: &dyn FontMetrics,
        min_resize_width: i32,
    ) -> Self {
        let text: String = buffer[from..from + length].iter().collect();
        let mut words: Vec<Word> = Vec::new();
        let mut lpadding = Fixed::ZERO;
        let mut width = Fixed::ZERO;
        let mut offset = from;

        for segment in text.split_word_bounds() {
            let scalars = segment.chars().count();
            if segment.chars().all(char::is_whitespace) {
                let w = metrics.text_width(flags, segment);
                width += w;
                match words.last_mut() {
                    Some(last) => last.rpadding += w,
                    None => lpadding += w,
                }
                offset += scalars;
                continue;
            }

            let segment_width = metrics.text_width(flags, segment);
            let over_wide =
                min_resize_width > 0 && segment_width > Fixed::from_int(min_resize_width);
            if over_wide {
                // Re-split per grapheme so the long word stays wrappable;
                // every fragment but the last is marked unsafe.
                let clusters: Vec<&str> = segment.graphemes(true).collect();
                let count = clusters.len();
                for (i, cluster) in clusters.iter().enumerate() {
                    let w = metrics.cluster_width(flags, cluster);
                    let rbearing = metrics.right_bearing(flags, cluster).min(Fixed::ZERO);
                    words.push(Word {
                        from: offset as u16,
                        width: if i + 1 == count { w } else { -w },
                        rbearing,
                        rpadding: Fixed::ZERO,
                    });
                    width += w;
                    offset += cluster.chars().count();
                }
            } else {
                let last_cluster = segment.graphemes(true).next_back().unwrap_or(segment);
                let rbearing = metrics.right_bearing(flags, last_cluster).min(Fixed::ZERO);
                words.push(Word {
                    from: offset as u16,
                    width: segment_width,
                    rbearing,
                    rpadding: Fixed::ZERO,
                });
                width += segment_width;
                offset += scalars;
            }
        }

        // Trailing whitespace is padding, not width.
        let rpadding = words.last().map_or(Fixed::ZERO, Word::rpadding);
        width -= rpadding;

        Self {
            from: from as u16,
            length: length as u16,
            flags,
            link_index,
            color,
            width,
            lpadding,
            rpadding,
            kind: RunKind::Text { words },
        }
    }

    pub(crate) fn new_newline(from: usize) -> Self {
        Self {
            from: from as u16,
            length: 1,
            flags: StyleFlags::empty(),
            link_index: 0,
            color: None,
            width: Fixed::ZERO,
            lpadding: Fixed::ZERO,
            rpadding: Fixed::ZERO,
            kind: RunKind::Newline {
                next_direction: Direction::Neutral,
            },
        }
    }

    pub(crate) fn new_emoji(
        from: usize,
        length: usize,
        flags: StyleFlags,
        link_index: u16,
        color: Option<Rgba>,
        emoji: EmojiRef,
        width: Fixed,
    ) -> Self {
        Self {
            from: from as u16,
            length: length as u16,
            flags,
            link_index,
            color,
            width,
            lpadding: Fixed::ZERO,
            rpadding: Fixed::ZERO,
            kind: RunKind::Emoji { emoji },
        }
    }

    pub(crate) fn new_skip(from: usize, width: i32, height: i32, link_index: u16) -> Self {
        Self {
            from: from as u16,
            length: 1,
            flags: StyleFlags::empty(),
            link_index,
            color: None,
            width: Fixed::from_int(width),
            lpadding: Fixed::ZERO,
            rpadding: Fixed::ZERO,
            kind: RunKind::Skip { height },
        }
    }
}
