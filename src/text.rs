//! The `RichText` document façade.
//!
//! Owns the normalized buffer, the run list and the link table, and fronts
//! every operation a widget needs: (re)parsing, painting, height/width
//! measurement, point hit-testing, selection snapping and source-text
//! recovery. Parsing collaborators (link validator, emoji table) are
//! constructed by the embedder and passed in by reference through
//! [`ParseContext`]; transient view state (hovered/pressed link,
//! selection) comes in through [`DrawContext`] on every paint.

use crate::bidi::Direction;
use crate::command::Command;
use crate::emoji::EmojiTable;
use crate::error::{Error, Result};
use crate::fixed::Fixed;
use crate::layout::{
    DrawContext, Elide, Layout, Selection, SymbolState, TextState, recount_natural_size,
};
use crate::parse;
use crate::run::{Run, RunKind};
use crate::style::{Align, ParseFlags, ParseOptions, TextStyle};
use crate::surface::Surface;
use crate::validator::LinkValidator;
use std::collections::HashMap;

/// How a link's display text relates to its target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkDisplay {
    /// Email address shown verbatim.
    Email,
    /// Full target (or readable form) shown.
    Full,
    /// Display form was cropped; the target holds the whole URL.
    Elided,
}

/// One slot of the document link table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Link {
    pub target: String,
    pub display: LinkDisplay,
}

/// Parsing collaborators, built once by the embedder.
#[derive(Clone, Copy)]
pub struct ParseContext<'a> {
    pub validator: &'a LinkValidator,
    pub emoji: &'a dyn EmojiTable,
}

impl<'a> ParseContext<'a> {
    #[must_use]
    pub fn new(validator: &'a LinkValidator, emoji: &'a dyn EmojiTable) -> Self {
        Self { validator, emoji }
    }
}

/// Selection snapping unit for [`RichText::adjust_selection`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Granularity {
    Letters,
    Words,
    Paragraphs,
}

/// Link handling when recovering source text with [`RichText::original`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExpandLinks {
    /// Keep display text as shown.
    None,
    /// Replace only cropped links with their full target.
    Shortened,
    /// Replace every link with its target.
    All,
}

/// Custom single-character authoring tags for [`RichText::set_rich_text`]:
/// `[x]`/`[/x]` expand to the registered open/close substitutions
/// (typically command encodings built with [`Command::encoded`]).
#[derive(Clone, Debug, Default)]
pub struct TagMap {
    map: HashMap<char, (String, String)>,
}

impl TagMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tag: char, open: impl Into<String>, close: impl Into<String>) {
        self.map.insert(tag, (open.into(), close.into()));
    }

    fn get(&self, tag: char) -> Option<&(String, String)> {
        self.map.get(&tag)
    }
}

/// A parsed rich-text document: normalized buffer, styled runs, links and
/// cached natural size.
#[derive(Clone, Debug)]
pub struct RichText {
    style: TextStyle,
    buffer: Vec<char>,
    runs: Vec<Run>,
    links: Vec<Option<Link>>,
    max_width: Fixed,
    min_height: i32,
    start_direction: Direction,
    break_everywhere: bool,
}

impl RichText {
    /// An empty document with the given style.
    #[must_use]
    pub fn new(style: TextStyle) -> Self {
        Self {
            style,
            buffer: Vec::new(),
            runs: Vec::new(),
            links: Vec::new(),
            max_width: Fixed::ZERO,
            min_height: 0,
            start_direction: Direction::Neutral,
            break_everywhere: false,
        }
    }

    /// Replace the content by tokenizing `raw` under `options`.
    pub fn set_text(&mut self, ctx: &ParseContext<'_>, raw: &str, options: &ParseOptions) {
        let out = parse::parse(&self.style, raw, options, ctx.validator, ctx.emoji);
        self.buffer = out.buffer;
        self.runs = out.runs;
        self.links = out.links;
        self.start_direction = out.start_direction;
        self.break_everywhere = options.flags.contains(ParseFlags::BREAK_EVERYWHERE);
        self.recount();
    }

    /// Replace the content from authoring markup: `[b] [i] [u] [/x]
    /// [a href="…"]`, custom `tags`, and backslash escapes are translated
    /// into the command encoding, then tokenized in rich mode.
    pub fn set_rich_text(
        &mut self,
        ctx: &ParseContext<'_>,
        raw: &str,
        options: &ParseOptions,
        tags: &TagMap,
    ) {
        let encoded = encode_rich(raw, tags);
        let options = options.with_flags(options.flags | ParseFlags::RICH);
        self.set_text(ctx, &encoded, &options);
    }

    /// Drop all content.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.runs.clear();
        self.links.clear();
        self.max_width = Fixed::ZERO;
        self.min_height = 0;
        self.start_direction = Direction::Neutral;
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Normalized length in scalar values.
    #[must_use]
    pub fn length(&self) -> usize {
        self.buffer.len()
    }

    #[must_use]
    pub fn style(&self) -> &TextStyle {
        &self.style
    }

    #[must_use]
    pub fn has_links(&self) -> bool {
        !self.links.is_empty()
    }

    /// The link in 1-based slot `index`, if set.
    #[must_use]
    pub fn link(&self, index: u16) -> Option<&Link> {
        usize::from(index)
            .checked_sub(1)
            .and_then(|slot| self.links.get(slot))
            .and_then(Option::as_ref)
    }

    /// Fill an explicit link slot left unset by markup.
    ///
    /// # Errors
    /// [`Error::LinkIndexOutOfRange`] when no such slot exists.
    pub fn set_link(&mut self, index: u16, target: impl Into<String>) -> Result<()> {
        let slots = self.links.len();
        let Some(slot) = usize::from(index)
            .checked_sub(1)
            .and_then(|i| self.links.get_mut(i))
        else {
            return Err(Error::LinkIndexOutOfRange {
                index: usize::from(index),
                slots,
            });
        };
        *slot = Some(Link {
            target: target.into(),
            display: LinkDisplay::Full,
        });
        Ok(())
    }

    /// Natural width: the widest paragraph, unwrapped.
    #[must_use]
    pub fn max_width(&self) -> i32 {
        self.max_width.ceil()
    }

    /// Height when given at least [`Self::max_width`] pixels.
    #[must_use]
    pub fn min_height(&self) -> i32 {
        self.min_height
    }

    /// Pixel height when wrapped to `width`.
    #[must_use]
    pub fn count_height(&self, width: i32) -> i32 {
        self.layout().count_height(&DrawContext::new(0, 0, width))
    }

    /// Width of the widest line when wrapped to `width`.
    #[must_use]
    pub fn count_width(&self, width: i32) -> i32 {
        self.layout().count_width(&DrawContext::new(0, 0, width))
    }

    /// Paint the document.
    pub fn draw(&self, surface: &mut dyn Surface, ctx: &DrawContext) {
        self.layout().draw(surface, ctx, None);
    }

    /// Paint at most `lines` lines, eliding the last; `remove_from_end`
    /// reserves extra pixels at the elided line's end.
    pub fn draw_elided(
        &self,
        surface: &mut dyn Surface,
        ctx: &DrawContext,
        lines: i32,
        remove_from_end: i32,
    ) {
        self.layout().draw(
            surface,
            ctx,
            Some(Elide {
                max_lines: lines,
                remove_from_end,
            }),
        );
    }

    /// What is under the point, for cursor shape and click dispatch.
    #[must_use]
    pub fn state_at(&self, x: i32, y: i32, width: i32, align: Align) -> TextState {
        self.layout()
            .state_at(&DrawContext::new(0, 0, width).with_align(align), x, y)
    }

    /// The link under the point, if any.
    #[must_use]
    pub fn link_at(&self, x: i32, y: i32, width: i32, align: Align) -> Option<&Link> {
        let state = self.state_at(x, y, width, align);
        self.link(state.link)
    }

    /// Caret position nearest to the point.
    #[must_use]
    pub fn symbol_at(&self, x: i32, y: i32, width: i32, align: Align) -> SymbolState {
        self.layout()
            .symbol_at(&DrawContext::new(0, 0, width).with_align(align), x, y)
    }

    /// Snap a selection outward to the given granularity.
    #[must_use]
    pub fn adjust_selection(&self, selection: Selection, granularity: Granularity) -> Selection {
        let len = self.buffer.len() as u16;
        let mut from = selection.from.min(len);
        let mut to = selection.to.clamp(from, len);
        match granularity {
            Granularity::Letters => {}
            Granularity::Words => {
                if from < len && !is_word_separator(self.buffer[usize::from(from)]) {
                    while from > 0 && !is_word_separator(self.buffer[usize::from(from) - 1]) {
                        from -= 1;
                    }
                }
                if to < len && !is_word_separator(self.buffer[usize::from(to)]) {
                    while to < len && !is_word_separator(self.buffer[usize::from(to)]) {
                        to += 1;
                    }
                }
            }
            Granularity::Paragraphs => {
                while from > 0 && self.buffer[usize::from(from) - 1] != '\n' {
                    from -= 1;
                }
                while to < len && self.buffer[usize::from(to)] != '\n' {
                    to += 1;
                }
            }
        }
        Selection::new(from, to)
    }

    /// Recover source text for a buffer range, optionally expanding link
    /// display text back into targets. A link only partially inside the
    /// range stays as displayed.
    #[must_use]
    pub fn original(&self, selection: Selection, expand: ExpandLinks) -> String {
        let len = self.buffer.len() as u16;
        let from = selection.from.min(len);
        let to = selection.to.clamp(from, len);
        let mut out = String::new();

        let mut ri = self.runs.partition_point(|r| r.end() <= from);
        while ri < self.runs.len() && self.runs[ri].from < to {
            let index = self.runs[ri].link_index;
            if index == 0 || expand == ExpandLinks::None {
                self.push_range(&mut out, self.runs[ri].from.max(from), self.runs[ri].end().min(to));
                ri += 1;
                continue;
            }
            let mut group_end = ri;
            while group_end < self.runs.len() && self.runs[group_end].link_index == index {
                group_end += 1;
            }
            let ga = self.runs[ri].from;
            let gb = self.runs[group_end - 1].end();
            let whole = ga >= from && gb <= to;
            match self.link(index) {
                Some(link)
                    if whole
                        && (expand == ExpandLinks::All
                            || link.display == LinkDisplay::Elided) =>
                {
                    out.push_str(&link.target);
                }
                _ => self.push_range(&mut out, ga.max(from), gb.min(to)),
            }
            ri = group_end;
        }
        out
    }

    /// Append a trailing fixed-size reservation (e.g. a timestamp overlay),
    /// replacing any existing one.
    pub fn set_skip_block(&mut self, width: i32, height: i32) {
        if let Some(last) = self.runs.last_mut() {
            if let RunKind::Skip { .. } = last.kind {
                *last = Run::new_skip(usize::from(last.from), width, height, last.link_index);
                self.recount();
                return;
            }
        }
        self.buffer.push('_');
        self.runs
            .push(Run::new_skip(self.buffer.len() - 1, width, height, 0));
        self.recount();
    }

    /// Remove the trailing reservation, if present.
    pub fn remove_skip_block(&mut self) {
        let Some(last) = self.runs.last() else {
            return;
        };
        if matches!(last.kind, RunKind::Skip { .. }) {
            self.runs.pop();
            self.buffer.pop();
            self.recount();
        }
    }

    fn push_range(&self, out: &mut String, from: u16, to: u16) {
        if from < to {
            out.extend(&self.buffer[usize::from(from)..usize::from(to)]);
        }
    }

    fn recount(&mut self) {
        let (max_width, min_height) =
            recount_natural_size(&self.style, &self.buffer, &mut self.runs);
        self.max_width = max_width;
        self.min_height = min_height;
    }

    fn layout(&self) -> Layout<'_> {
        Layout {
            style: &self.style,
            buffer: &self.buffer,
            runs: &self.runs,
            start_direction: self.start_direction,
            break_everywhere: self.break_everywhere,
        }
    }
}

/// Word boundary characters for selection snapping.
fn is_word_separator(ch: char) -> bool {
    crate::chars::is_word_separator(ch)
}

/// Translate authoring markup into the in-band command encoding. Unknown
/// or malformed tags stay literal; a backslash escapes the next character.
fn encode_rich(raw: &str, tags: &TagMap) -> String {
    let chars: Vec<char> = raw.chars().collect();
    let mut out = String::new();
    let mut i = 0;
    while i < chars.len() {
        let ch = chars[i];
        if ch == '\\' && i + 1 < chars.len() {
            out.push(chars[i + 1]);
            i += 2;
            continue;
        }
        if ch != '[' {
            out.push(ch);
            i += 1;
            continue;
        }
        let Some(close) = chars[i + 1..].iter().position(|&c| c == ']') else {
            out.push('[');
            i += 1;
            continue;
        };
        let inner: String = chars[i + 1..i + 1 + close].iter().collect();
        match translate_tag(&inner, tags) {
            Some(translated) => {
                out.push_str(&translated);
                i += close + 2;
            }
            None => {
                out.push('[');
                i += 1;
            }
        }
    }
    out
}

fn translate_tag(inner: &str, tags: &TagMap) -> Option<String> {
    let (closing, name) = match inner.strip_prefix('/') {
        Some(rest) => (true, rest),
        None => (false, inner),
    };
    let command = match name {
        "b" => Some(if closing { Command::NoBold } else { Command::Bold }),
        "i" => Some(if closing { Command::NoItalic } else { Command::Italic }),
        "u" => Some(if closing {
            Command::NoUnderline
        } else {
            Command::Underline
        }),
        "a" if closing => Some(Command::LinkIndex(0)),
        _ if !closing && name.starts_with("a href=\"") && name.ends_with('"') => {
            Some(Command::LinkText(name[8..name.len() - 1].to_string()))
        }
        _ => None,
    };
    if let Some(command) = command {
        return command.encoded().ok();
    }

    let mut it = name.chars();
    let tag = it.next()?;
    if it.next().is_some() {
        return None;
    }
    tags.get(tag)
        .map(|(open, close)| if closing { close.clone() } else { open.clone() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgba;
    use crate::emoji::NoEmoji;
    use crate::font::CellMetrics;
    use crate::style::StyleFlags;
    use crate::surface::RecordingSurface;
    use std::sync::Arc;

    fn style() -> TextStyle {
        TextStyle::new(Arc::new(CellMetrics::default()))
    }

    fn doc(raw: &str) -> RichText {
        let validator = LinkValidator::new();
        let ctx = ParseContext::new(&validator, &NoEmoji);
        let mut text = RichText::new(style());
        text.set_text(&ctx, raw, &ParseOptions::default());
        text
    }

    fn full(text: &RichText) -> Selection {
        Selection::new(0, text.length() as u16)
    }

    #[test]
    fn test_empty_document() {
        let text = RichText::new(style());
        assert!(text.is_empty());
        assert_eq!(text.max_width(), 0);
        assert_eq!(text.min_height(), 0);
        assert_eq!(text.count_height(100), 0);
    }

    #[test]
    fn test_natural_size_and_wrapped_height() {
        let text = doc("hello world");
        assert_eq!(text.max_width(), 88);
        assert_eq!(text.min_height(), 16);
        assert_eq!(text.count_height(88), 16);
        assert_eq!(text.count_height(48), 32);
        assert_eq!(text.count_width(48), 40);
    }

    #[test]
    fn test_set_text_replaces_content() {
        let validator = LinkValidator::new();
        let ctx = ParseContext::new(&validator, &NoEmoji);
        let mut text = RichText::new(style());
        text.set_text(&ctx, "first version", &ParseOptions::default());
        text.set_text(&ctx, "second", &ParseOptions::default());
        assert_eq!(text.original(full(&text), ExpandLinks::None), "second");
        assert_eq!(text.length(), 6);
    }

    #[test]
    fn test_clear() {
        let mut text = doc("some text");
        text.clear();
        assert!(text.is_empty());
        assert_eq!(text.min_height(), 0);
    }

    #[test]
    fn test_original_round_trips_plain_text() {
        for raw in ["hello world", "a\nb\nc", "go to example.com now"] {
            let text = doc(raw);
            assert_eq!(text.original(full(&text), ExpandLinks::None), raw);
        }
    }

    #[test]
    fn test_original_expands_links() {
        let text = doc("visit foo.com now");
        assert_eq!(
            text.original(full(&text), ExpandLinks::None),
            "visit foo.com now"
        );
        // Fully displayed link keeps its display form under Shortened.
        assert_eq!(
            text.original(full(&text), ExpandLinks::Shortened),
            "visit foo.com now"
        );
        assert_eq!(
            text.original(full(&text), ExpandLinks::All),
            "visit http://foo.com now"
        );
    }

    #[test]
    fn test_original_expands_elided_link_when_shortened() {
        let long = format!("http://example.com/{}", "a".repeat(200));
        let text = doc(&format!("x {long} y"));
        let recovered = text.original(full(&text), ExpandLinks::Shortened);
        assert_eq!(recovered, format!("x {long} y"));
    }

    #[test]
    fn test_original_partial_link_not_expanded() {
        let text = doc("see example.com here");
        // Range ends inside the link's display text.
        let partial = text.original(Selection::new(0, 8), ExpandLinks::All);
        assert_eq!(partial, "see exam");
    }

    #[test]
    fn test_state_and_link_lookup() {
        let text = doc("go to example.com now");
        let state = text.state_at(6 * 8 + 4, 8, 400, Align::Left);
        assert_eq!(state.link, 1);
        let link = text.link_at(6 * 8 + 4, 8, 400, Align::Left).unwrap();
        assert_eq!(link.target, "http://example.com");
        assert!(text.link_at(0, 8, 400, Align::Left).is_none());
        assert!(text.has_links());
    }

    #[test]
    fn test_symbol_lookup() {
        let text = doc("hello world");
        let s = text.symbol_at(20, 8, 400, Align::Left);
        assert_eq!(s.symbol, 2);
    }

    #[test]
    fn test_set_link_fills_explicit_slot() {
        let validator = LinkValidator::new();
        let ctx = ParseContext::new(&validator, &NoEmoji);
        let mut raw = String::new();
        Command::LinkIndex(1).encode_into(&mut raw).unwrap();
        raw.push_str("tap here");
        Command::LinkIndex(0).encode_into(&mut raw).unwrap();
        let mut text = RichText::new(style());
        text.set_text(
            &ctx,
            &raw,
            &ParseOptions::default().with_flags(ParseFlags::RICH),
        );
        assert!(text.has_links());
        assert!(text.link(1).is_none());
        text.set_link(1, "https://example.org").unwrap();
        assert_eq!(text.link(1).unwrap().target, "https://example.org");
        let err = text.set_link(5, "x").unwrap_err();
        assert!(matches!(err, Error::LinkIndexOutOfRange { index: 5, slots: 1 }));
    }

    #[test]
    fn test_adjust_selection_words() {
        let text = doc("hello world");
        let sel = text.adjust_selection(Selection::new(3, 3), Granularity::Words);
        assert_eq!(sel, Selection::new(0, 5));
        let sel = text.adjust_selection(Selection::new(3, 8), Granularity::Words);
        assert_eq!(sel, Selection::new(0, 11));
        // Starting on the separator does not extend backward.
        let sel = text.adjust_selection(Selection::new(5, 5), Granularity::Words);
        assert_eq!(sel, Selection::new(5, 5));
    }

    #[test]
    fn test_adjust_selection_letters_clamps() {
        let text = doc("short");
        let sel = text.adjust_selection(Selection::new(2, 400), Granularity::Letters);
        assert_eq!(sel, Selection::new(2, 5));
    }

    #[test]
    fn test_adjust_selection_paragraphs() {
        let text = doc("one\ntwo three\nfour");
        let sel = text.adjust_selection(Selection::new(5, 6), Granularity::Paragraphs);
        assert_eq!(sel, Selection::new(4, 13));
    }

    #[test]
    fn test_rich_text_bold_tag() {
        let validator = LinkValidator::new();
        let ctx = ParseContext::new(&validator, &NoEmoji);
        let mut text = RichText::new(style());
        text.set_rich_text(
            &ctx,
            "[b]bold[/b] plain",
            &ParseOptions::default(),
            &TagMap::new(),
        );
        assert_eq!(text.original(full(&text), ExpandLinks::None), "bold plain");
        let bold: String = text
            .runs
            .iter()
            .filter(|r| r.flags.contains(StyleFlags::BOLD))
            .map(|r| {
                text.buffer[usize::from(r.from)..usize::from(r.end())]
                    .iter()
                    .collect::<String>()
            })
            .collect();
        assert_eq!(bold, "bold");
    }

    #[test]
    fn test_rich_text_anchor_tag() {
        let validator = LinkValidator::new();
        let ctx = ParseContext::new(&validator, &NoEmoji);
        let mut text = RichText::new(style());
        text.set_rich_text(
            &ctx,
            "see [a href=\"https://example.org/x\"]docs[/a] here",
            &ParseOptions::default(),
            &TagMap::new(),
        );
        assert_eq!(
            text.original(full(&text), ExpandLinks::None),
            "see docs here"
        );
        assert_eq!(
            text.original(full(&text), ExpandLinks::All),
            "see https://example.org/x here"
        );
    }

    #[test]
    fn test_rich_text_escape_and_unknown_tag() {
        let validator = LinkValidator::new();
        let ctx = ParseContext::new(&validator, &NoEmoji);
        let mut text = RichText::new(style());
        text.set_rich_text(
            &ctx,
            "\\[b]literal [zz] stays",
            &ParseOptions::default(),
            &TagMap::new(),
        );
        assert_eq!(
            text.original(full(&text), ExpandLinks::None),
            "[b]literal [zz] stays"
        );
    }

    #[test]
    fn test_rich_text_custom_tag() {
        let validator = LinkValidator::new();
        let ctx = ParseContext::new(&validator, &NoEmoji);
        let mut tags = TagMap::new();
        tags.insert(
            'r',
            Command::Color(Rgba::rgb(200, 0, 0)).encoded().unwrap(),
            Command::NoColor.encoded().unwrap(),
        );
        let mut text = RichText::new(style());
        text.set_rich_text(&ctx, "a [r]red[/r] word", &ParseOptions::default(), &tags);
        let colored = text
            .runs
            .iter()
            .find(|r| r.color == Some(Rgba::rgb(200, 0, 0)))
            .unwrap();
        let s: String = text.buffer
            [usize::from(colored.from)..usize::from(colored.end())]
            .iter()
            .collect();
        assert_eq!(s, "red");
    }

    #[test]
    fn test_skip_block_roundtrip() {
        let mut text = doc("message");
        let base_width = text.max_width();
        text.set_skip_block(40, 20);
        assert_eq!(text.max_width(), base_width + 40);
        assert_eq!(text.min_height(), 20);
        // Replacing updates in place.
        text.set_skip_block(48, 20);
        assert_eq!(text.max_width(), base_width + 48);
        text.remove_skip_block();
        assert_eq!(text.max_width(), base_width);
        assert_eq!(text.min_height(), 16);
        assert_eq!(text.original(full(&text), ExpandLinks::None), "message");
    }

    #[test]
    fn test_draw_smoke() {
        let text = doc("hello world");
        let mut surface = RecordingSurface::new();
        text.draw(&mut surface, &DrawContext::new(0, 0, 200));
        assert_eq!(surface.text(), "hello world");

        let mut surface = RecordingSurface::new();
        text.draw_elided(&mut surface, &DrawContext::new(0, 0, 48), 1, 0);
        assert_eq!(surface.text(), "hel...");
    }
}
