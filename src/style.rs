//! Text styling, parse options and palette types.
//!
//! This module provides the option types threaded through parsing and
//! painting:
//!
//! - [`StyleFlags`]: Bitflags for bold, italic, underline
//! - [`ParseFlags`] / [`ParseOptions`]: tokenizer behavior switches
//! - [`Align`]: horizontal line alignment
//! - [`TextPalette`]: colors for text, links and selection
//! - [`TextStyle`]: font metrics plus the per-document layout constants
//!
//! # Examples
//!
//! ```
//! use richtext::{ParseFlags, ParseOptions, StyleFlags};
//!
//! let flags = StyleFlags::BOLD | StyleFlags::UNDERLINE;
//! assert!(flags.contains(StyleFlags::BOLD));
//!
//! let options = ParseOptions::default().with_flags(ParseFlags::MULTILINE | ParseFlags::AUTO_LINKS);
//! assert!(options.flags.contains(ParseFlags::AUTO_LINKS));
//! ```

use crate::bidi::Direction;
use crate::color::Rgba;
use crate::fixed::Fixed;
use crate::font::FontMetrics;
use bitflags::bitflags;
use std::fmt;
use std::sync::Arc;

bitflags! {
    /// Character style attributes carried by a run.
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
    pub struct StyleFlags: u16 {
        /// Bold weight.
        const BOLD      = 0x01;
        /// Italic slant.
        const ITALIC    = 0x02;
        /// Underlined.
        const UNDERLINE = 0x04;
    }
}

bitflags! {
    /// Tokenizer behavior switches.
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
    pub struct ParseFlags: u16 {
        /// Keep explicit newlines; otherwise they collapse to spaces.
        const MULTILINE        = 0x01;
        /// Run the link pre-scan and turn detected URLs/emails into links.
        const AUTO_LINKS       = 0x02;
        /// Interpret inline markup commands.
        const RICH             = 0x04;
        /// Permit line breaks inside words without a safe break point.
        const BREAK_EVERYWHERE = 0x08;
    }
}

/// Horizontal alignment of wrapped lines within the layout width.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

/// Options for one tokenization pass.
#[derive(Clone, Copy, Debug)]
pub struct ParseOptions {
    pub flags: ParseFlags,
    /// Width budget in pixels for the early-stop heuristic (0 = unlimited).
    pub max_width: i32,
    /// Height budget in pixels for the early-stop heuristic (0 = unlimited).
    pub max_height: i32,
    /// Forced paragraph direction; `Neutral` auto-detects per paragraph.
    pub direction: Direction,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            flags: ParseFlags::MULTILINE | ParseFlags::AUTO_LINKS,
            max_width: 0,
            max_height: 0,
            direction: Direction::Neutral,
        }
    }
}

impl ParseOptions {
    /// Plain single-line text, no link detection.
    #[must_use]
    pub fn plain() -> Self {
        Self {
            flags: ParseFlags::empty(),
            ..Self::default()
        }
    }

    /// Replace the flag set.
    #[must_use]
    pub fn with_flags(mut self, flags: ParseFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Set the early-stop budget.
    #[must_use]
    pub fn with_budget(mut self, max_width: i32, max_height: i32) -> Self {
        self.max_width = max_width;
        self.max_height = max_height;
        self
    }

    /// Force the paragraph direction instead of auto-detecting.
    #[must_use]
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }
}

/// Colors used when painting text, links and selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextPalette {
    pub text: Rgba,
    pub link: Rgba,
    pub link_active: Rgba,
    pub link_pressed: Rgba,
    pub select_bg: Rgba,
    pub select_text: Rgba,
    pub select_link: Rgba,
}

impl Default for TextPalette {
    fn default() -> Self {
        Self {
            text: Rgba::BLACK,
            link: Rgba::rgb(0x16, 0x8a, 0xcd),
            link_active: Rgba::rgb(0x10, 0x6a, 0xa0),
            link_pressed: Rgba::rgb(0x0d, 0x56, 0x82),
            select_bg: Rgba::rgb(0xad, 0xd8, 0xf7),
            select_text: Rgba::BLACK,
            select_link: Rgba::rgb(0x0d, 0x56, 0x82),
        }
    }
}

/// Font metrics plus the per-document layout constants.
///
/// Owned by the document; every layout and paint pass reads through it.
#[derive(Clone)]
pub struct TextStyle {
    /// Shaping/measurement backend.
    pub metrics: Arc<dyn FontMetrics>,
    /// Minimum line height in pixels (0 means the font height).
    pub line_height: i32,
    /// Emoji glyph size in pixels.
    pub emoji_size: i32,
    /// Horizontal padding on each side of an emoji glyph.
    pub emoji_padding: Fixed,
    /// Pixel cap for the display form of auto-detected URLs.
    pub link_crop: i32,
    /// Words wider than this are re-split per grapheme cluster (0 = never).
    pub min_resize_width: i32,
}

impl TextStyle {
    /// Style with the given metrics backend and default constants.
    #[must_use]
    pub fn new(metrics: Arc<dyn FontMetrics>) -> Self {
        let emoji_size = metrics.height();
        Self {
            metrics,
            line_height: 0,
            emoji_size,
            emoji_padding: Fixed::ZERO,
            link_crop: 360,
            min_resize_width: 0,
        }
    }

    /// Override the minimum line height.
    #[must_use]
    pub fn with_line_height(mut self, line_height: i32) -> Self {
        self.line_height = line_height;
        self
    }

    /// Override the grapheme-fallback width threshold.
    #[must_use]
    pub fn with_min_resize_width(mut self, width: i32) -> Self {
        self.min_resize_width = width;
        self
    }

    /// Effective minimum line height.
    #[must_use]
    pub fn base_line_height(&self) -> i32 {
        if self.line_height > 0 {
            self.line_height
        } else {
            self.metrics.height()
        }
    }

    /// Full advance width of an emoji run.
    #[must_use]
    pub fn emoji_width(&self) -> Fixed {
        Fixed::from_int(self.emoji_size) + self.emoji_padding + self.emoji_padding
    }
}

impl fmt::Debug for TextStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextStyle")
            .field("line_height", &self.line_height)
            .field("emoji_size", &self.emoji_size)
            .field("link_crop", &self.link_crop)
            .field("min_resize_width", &self.min_resize_width)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::CellMetrics;

    #[test]
    fn test_style_flags_combine() {
        let flags = StyleFlags::BOLD | StyleFlags::ITALIC;
        assert!(flags.contains(StyleFlags::BOLD));
        assert!(!flags.contains(StyleFlags::UNDERLINE));
    }

    #[test]
    fn test_parse_options_default() {
        let options = ParseOptions::default();
        assert!(options.flags.contains(ParseFlags::MULTILINE));
        assert!(options.flags.contains(ParseFlags::AUTO_LINKS));
        assert_eq!(options.direction, Direction::Neutral);
    }

    #[test]
    fn test_base_line_height_falls_back_to_font() {
        let style = TextStyle::new(Arc::new(CellMetrics::default()));
        assert_eq!(style.base_line_height(), style.metrics.height());
        let style = style.with_line_height(24);
        assert_eq!(style.base_line_height(), 24);
    }

    #[test]
    fn test_emoji_width_includes_padding() {
        let mut style = TextStyle::new(Arc::new(CellMetrics::default()));
        style.emoji_size = 16;
        style.emoji_padding = Fixed::from_int(2);
        assert_eq!(style.emoji_width(), Fixed::from_int(20));
    }
}
