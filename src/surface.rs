//! Paint surface seam.
//!
//! The widget framework supplies the real canvas; the layout engine issues
//! only three kinds of paint operation through [`Surface`].
//! [`RecordingSurface`] captures them for headless use and tests.

use crate::color::Rgba;
use crate::emoji::EmojiRef;
use crate::fixed::Fixed;
use crate::style::StyleFlags;

/// Canvas operations issued by the paint pass.
pub trait Surface {
    /// Fill a pixel rectangle (selection background).
    fn fill_rect(&mut self, x: i32, y: i32, width: i32, height: i32, color: Rgba);

    /// Draw a text fragment with its left edge at `x` and baseline at `y`.
    fn draw_text(&mut self, x: Fixed, y: i32, text: &str, flags: StyleFlags, color: Rgba);

    /// Draw an emoji glyph with its top-left corner at `(x, y)`.
    fn draw_emoji(&mut self, x: Fixed, y: i32, emoji: EmojiRef, size: i32);
}

/// One recorded paint operation.
#[derive(Clone, Debug, PartialEq)]
pub enum PaintOp {
    Rect {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        color: Rgba,
    },
    Text {
        x: Fixed,
        y: i32,
        text: String,
        flags: StyleFlags,
        color: Rgba,
    },
    Emoji {
        x: Fixed,
        y: i32,
        emoji: EmojiRef,
        size: i32,
    },
}

/// Surface that records operations instead of painting.
#[derive(Clone, Debug, Default)]
pub struct RecordingSurface {
    pub ops: Vec<PaintOp>,
}

impl RecordingSurface {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Concatenation of all drawn text fragments, in paint order.
    #[must_use]
    pub fn text(&self) -> String {
        let mut out = String::new();
        for op in &self.ops {
            if let PaintOp::Text { text, .. } = op {
                out.push_str(text);
            }
        }
        out
    }

    /// Right edge of the farthest-right painted fragment, in pixels.
    #[must_use]
    pub fn max_right(&self, metrics: &dyn crate::font::FontMetrics) -> i32 {
        self.ops
            .iter()
            .map(|op| match op {
                PaintOp::Rect { x, width, .. } => x + width,
                PaintOp::Text { x, text, flags, .. } => {
                    (*x + metrics.text_width(*flags, text)).ceil()
                }
                PaintOp::Emoji { x, size, .. } => (*x + Fixed::from_int(*size)).ceil(),
            })
            .max()
            .unwrap_or(0)
    }
}

impl Surface for RecordingSurface {
    fn fill_rect(&mut self, x: i32, y: i32, width: i32, height: i32, color: Rgba) {
        self.ops.push(PaintOp::Rect {
            x,
            y,
            width,
            height,
            color,
        });
    }

    fn draw_text(&mut self, x: Fixed, y: i32, text: &str, flags: StyleFlags, color: Rgba) {
        self.ops.push(PaintOp::Text {
            x,
            y,
            text: text.to_string(),
            flags,
            color,
        });
    }

    fn draw_emoji(&mut self, x: Fixed, y: i32, emoji: EmojiRef, size: i32) {
        self.ops.push(PaintOp::Emoji { x, y, emoji, size });
    }
}
