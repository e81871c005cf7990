//! Font metrics seam and the deterministic cell-based backend.
//!
//! Real shaping lives outside this crate; [`FontMetrics`] is the trait the
//! layout engine measures through. [`CellMetrics`] is a deterministic
//! implementation that scales terminal-style display-width cells to pixels,
//! suitable for headless measurement and the test-suite.

use crate::fixed::Fixed;
use crate::style::StyleFlags;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// The glyph sequence appended when a line is elided.
pub const ELLIPSIS: &str = "...";

/// Measurement backend consulted by tokenization and layout.
///
/// All widths are sub-pixel [`Fixed`] values; implementations must be
/// deterministic for a given `(flags, cluster)` pair, since cached word
/// metrics are reused across every layout pass.
pub trait FontMetrics {
    /// Line height of the font in pixels.
    fn height(&self) -> i32;

    /// Baseline distance from the top of a line box.
    fn ascent(&self) -> i32;

    /// Advance width of one grapheme cluster.
    fn cluster_width(&self, flags: StyleFlags, cluster: &str) -> Fixed;

    /// Advance width of a whole string (sum of its clusters).
    fn text_width(&self, flags: StyleFlags, text: &str) -> Fixed {
        text.graphemes(true)
            .map(|g| self.cluster_width(flags, g))
            .sum()
    }

    /// Advance width of a plain space.
    fn space_width(&self) -> Fixed {
        self.cluster_width(StyleFlags::empty(), " ")
    }

    /// Right-side bearing of a cluster; zero means the ink does not
    /// overhang the advance width.
    fn right_bearing(&self, _flags: StyleFlags, _cluster: &str) -> Fixed {
        Fixed::ZERO
    }

    /// Advance width of the elision marker.
    fn elision_width(&self, flags: StyleFlags) -> Fixed {
        self.text_width(flags, ELLIPSIS)
    }
}

/// Deterministic metrics: every cluster is a whole number of fixed-width
/// cells (per `unicode-width`), scaled to pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellMetrics {
    /// Pixel width of one cell.
    pub cell: i32,
    /// Line height in pixels.
    pub line_height: i32,
    /// Ascent in pixels.
    pub font_ascent: i32,
}

impl CellMetrics {
    #[must_use]
    pub const fn new(cell: i32, line_height: i32, font_ascent: i32) -> Self {
        Self {
            cell,
            line_height,
            font_ascent,
        }
    }
}

impl Default for CellMetrics {
    fn default() -> Self {
        Self::new(8, 16, 12)
    }
}

impl FontMetrics for CellMetrics {
    fn height(&self) -> i32 {
        self.line_height
    }

    fn ascent(&self) -> i32 {
        self.font_ascent
    }

    fn cluster_width(&self, _flags: StyleFlags, cluster: &str) -> Fixed {
        Fixed::from_int(cluster.width() as i32 * self.cell)
    }
}

/// Truncate `text` to fit `width` pixels, appending [`ELLIPSIS`] when cut.
///
/// Returns the display string and whether anything was removed. Used for
/// the display form of over-long auto-detected URLs.
pub fn elide_right(
    metrics: &dyn FontMetrics,
    flags: StyleFlags,
    text: &str,
    width: i32,
) -> (String, bool) {
    let budget = Fixed::from_int(width);
    if metrics.text_width(flags, text) <= budget {
        return (text.to_string(), false);
    }
    let avail = budget - metrics.elision_width(flags);
    let mut used = Fixed::ZERO;
    let mut out = String::new();
    for cluster in text.graphemes(true) {
        let w = metrics.cluster_width(flags, cluster);
        if used + w > avail {
            break;
        }
        used += w;
        out.push_str(cluster);
    }
    out.push_str(ELLIPSIS);
    (out, true)
}
