//! `richtext` - rich-text layout and hit-testing engine
//!
//! The text core of a chat-style UI: a markup tokenizer producing a
//! normalized character buffer with styled runs and a link table, a
//! greedy word-wrap painter with restricted bidirectional reordering,
//! multi-line elision, and pixel-to-character/link reverse hit-testing.
//! Font shaping, emoji atlases and the widget canvas stay outside the
//! crate, reached through the [`FontMetrics`], [`EmojiTable`] and
//! [`Surface`] traits.
//!
//! ```
//! use richtext::{
//!     CellMetrics, DrawContext, LinkValidator, NoEmoji, ParseContext, ParseOptions,
//!     RecordingSurface, RichText, TextStyle,
//! };
//! use std::sync::Arc;
//!
//! let validator = LinkValidator::new();
//! let ctx = ParseContext::new(&validator, &NoEmoji);
//! let mut text = RichText::new(TextStyle::new(Arc::new(CellMetrics::default())));
//! text.set_text(&ctx, "read the docs at example.com today", &ParseOptions::default());
//! assert!(text.has_links());
//!
//! let mut surface = RecordingSurface::new();
//! text.draw(&mut surface, &DrawContext::new(0, 0, text.max_width()));
//! ```

// Crate-level lint configuration
#![warn(unsafe_code)]
#![allow(clippy::cast_possible_truncation)] // Intentional offset casts (buffer is capped)
#![allow(clippy::cast_sign_loss)] // Intentional coordinate conversions
#![allow(clippy::cast_possible_wrap)] // Intentional coordinate conversions
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::doc_markdown)] // Allow technical names without backticks
#![allow(clippy::use_self)]
#![allow(clippy::collapsible_if)] // Sometimes nested ifs are clearer
#![allow(clippy::items_after_statements)] // Common pattern in tests
#![allow(clippy::redundant_clone)] // Clones in tests for clarity are fine
#![allow(clippy::semicolon_if_nothing_returned)]

pub mod bidi;
mod chars;
pub mod color;
pub mod command;
pub mod emoji;
pub mod entity;
pub mod error;
pub mod fixed;
pub mod font;
pub mod layout;
mod parse;
pub mod run;
pub mod style;
pub mod surface;
pub mod text;
pub mod validator;

// Re-export core types at crate root
pub use bidi::{BidiItem, Direction};
pub use color::Rgba;
pub use command::{COMMAND_CHAR, Command, Lexer, MAX_URL_LEN, Token};
pub use emoji::{BuiltinEmoji, EmojiMatch, EmojiRef, EmojiTable, NoEmoji};
pub use entity::{LinkCandidate, LinkKind};
pub use error::{Error, Result};
pub use fixed::Fixed;
pub use font::{CellMetrics, ELLIPSIS, FontMetrics};
pub use layout::{DrawContext, Selection, SymbolState, TextState};
pub use run::{Run, RunKind, Word};
pub use style::{Align, ParseFlags, ParseOptions, StyleFlags, TextPalette, TextStyle};
pub use surface::{PaintOp, RecordingSurface, Surface};
pub use text::{
    ExpandLinks, Granularity, Link, LinkDisplay, ParseContext, RichText, TagMap,
};
pub use validator::LinkValidator;
