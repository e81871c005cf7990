//! Layout and paint engine: wrapping, painting, hit-testing, elision.
//!
//! One word-wrap pass drives every operation. The pass produces disposable
//! line records (buffer range, y, height, paragraph direction); painting
//! and hit-testing then walk each line's runs in visual order after
//! bidirectional reordering. Nothing here mutates the document: elision
//! shortens only the display form of the last permitted line.
//!
//! Wrapping follows the cached word metrics from [`crate::run`]: the fit
//! test accounts for the right bearing of the previous word and the
//! pending inter-word padding, so a wrapped layout measures exactly like
//! the unwrapped text. When a word does not fit, the line is rolled back
//! to the last safe break point; a word wider than the whole line is
//! placed alone on a fresh line and overflows.

use crate::bidi::{self, Direction};
use crate::color::Rgba;
use crate::fixed::Fixed;
use crate::font::ELLIPSIS;
use crate::run::{Run, RunKind};
use crate::style::{Align, StyleFlags, TextPalette, TextStyle};
use crate::surface::Surface;
use unicode_segmentation::UnicodeSegmentation;

/// A half-open scalar range of selected text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    pub from: u16,
    pub to: u16,
}

impl Selection {
    #[must_use]
    pub const fn new(from: u16, to: u16) -> Self {
        Self { from, to }
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.from >= self.to
    }

    #[must_use]
    pub const fn contains(self, pos: u16) -> bool {
        self.from <= pos && pos < self.to
    }
}

/// What a point hit-test found under the cursor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextState {
    /// 1-based link slot under the point; 0 = none.
    pub link: u16,
    /// Whether the point is over painted content at all.
    pub upon_text: bool,
}

/// Caret position resolved from a point.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SymbolState {
    /// Scalar index of the character under the point.
    pub symbol: u16,
    /// True when the point is past the character's midpoint, so the caret
    /// belongs after it.
    pub after_symbol: bool,
    pub upon_text: bool,
}

impl SymbolState {
    /// Caret index: the symbol itself, or one past it.
    #[must_use]
    pub fn caret(self) -> u16 {
        self.symbol + u16::from(self.after_symbol)
    }
}

/// Geometry and paint parameters for one layout pass.
#[derive(Clone, Copy, Debug)]
pub struct DrawContext {
    pub left: i32,
    pub top: i32,
    /// Available width in pixels.
    pub width: i32,
    pub align: Align,
    /// Paint only lines intersecting `[y_from, y_to)`; `y_to == 0` means
    /// unbounded below.
    pub y_from: i32,
    pub y_to: i32,
    pub selection: Selection,
    pub palette: TextPalette,
    /// Link slot currently hovered; painted with the active color.
    pub active_link: u16,
    /// Link slot currently pressed.
    pub pressed_link: u16,
    /// Direction substituted for paragraphs with no strong character.
    pub ambient: Direction,
}

impl DrawContext {
    #[must_use]
    pub fn new(left: i32, top: i32, width: i32) -> Self {
        Self {
            left,
            top,
            width,
            align: Align::Left,
            y_from: i32::MIN,
            y_to: 0,
            selection: Selection::default(),
            palette: TextPalette::default(),
            active_link: 0,
            pressed_link: 0,
            ambient: Direction::Neutral,
        }
    }

    #[must_use]
    pub fn with_align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    #[must_use]
    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    #[must_use]
    pub fn with_palette(mut self, palette: TextPalette) -> Self {
        self.palette = palette;
        self
    }

    /// Restrict painting to the `[y_from, y_to)` band.
    #[must_use]
    pub fn with_viewport(mut self, y_from: i32, y_to: i32) -> Self {
        self.y_from = y_from;
        self.y_to = y_to;
        self
    }

    #[must_use]
    pub fn with_active_link(mut self, link: u16) -> Self {
        self.active_link = link;
        self
    }

    #[must_use]
    pub fn with_pressed_link(mut self, link: u16) -> Self {
        self.pressed_link = link;
        self
    }

    #[must_use]
    pub fn with_ambient(mut self, ambient: Direction) -> Self {
        self.ambient = ambient;
        self
    }
}

/// Elision request for the paint pass.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Elide {
    /// Number of lines permitted; the last one is elided when content
    /// remains.
    pub max_lines: i32,
    /// Extra pixels reserved at the line end besides the marker itself.
    pub remove_from_end: i32,
}

/// Borrowed view of a document, ready for layout passes.
pub(crate) struct Layout<'a> {
    pub style: &'a TextStyle,
    pub buffer: &'a [char],
    pub runs: &'a [Run],
    pub start_direction: Direction,
    pub break_everywhere: bool,
}

/// One wrapped line: a buffer range plus vertical placement. Elided lines
/// nominally extend to the buffer end; the display cut happens later.
#[derive(Clone, Copy, Debug)]
struct Line {
    from: u16,
    to: u16,
    y: i32,
    height: i32,
    dir: Direction,
    elide: bool,
}

/// A wrappable unit: one word, one object run, or a paragraph break.
#[derive(Clone, Copy, Debug)]
struct Atom {
    run: usize,
    from: u16,
    end: u16,
    width: Fixed,
    rbearing: Fixed,
    rpadding: Fixed,
    breakable: bool,
    newline: bool,
    object_height: Option<i32>,
}

/// A line-local span with a resolved embedding level.
#[derive(Clone, Copy, Debug)]
struct Cell {
    start: u16,
    end: u16,
    level: u8,
    run: usize,
}

impl Cell {
    fn is_even(self) -> bool {
        self.level & 1 == 0
    }
}

/// The fully prepared display form of one line.
struct LineDisplay {
    from: u16,
    to: u16,
    x: Fixed,
    width: Fixed,
    cells: Vec<Cell>,
    ellipsis: bool,
}

impl<'a> Layout<'a> {
    /// Total pixel height at the context width.
    pub(crate) fn count_height(&self, ctx: &DrawContext) -> i32 {
        self.wrap(ctx, None)
            .last()
            .map_or(0, |line| line.y + line.height - ctx.top)
    }

    /// Width of the widest wrapped line at the context width.
    pub(crate) fn count_width(&self, ctx: &DrawContext) -> i32 {
        self.wrap(ctx, None)
            .iter()
            .map(|line| self.lay_line(ctx, line, None).width)
            .max()
            .unwrap_or(Fixed::ZERO)
            .ceil()
    }

    /// Paint every line intersecting the context's y band.
    pub(crate) fn draw(
        &self,
        surface: &mut dyn Surface,
        ctx: &DrawContext,
        elide: Option<Elide>,
    ) {
        let lines = self.wrap(ctx, elide.as_ref());
        for line in &lines {
            if ctx.y_to > 0 && line.y >= ctx.y_to {
                break;
            }
            if line.y + line.height <= ctx.y_from {
                continue;
            }
            self.draw_line(surface, ctx, line, elide.as_ref());
        }
    }

    /// Link lookup under a point. Outside any painted content the result
    /// is empty.
    pub(crate) fn state_at(&self, ctx: &DrawContext, px: i32, py: i32) -> TextState {
        let lines = self.wrap(ctx, None);
        let Some(line) = lines
            .iter()
            .find(|l| py >= l.y && py < l.y + l.height)
        else {
            return TextState::default();
        };
        let display = self.lay_line(ctx, line, None);
        let point = Fixed::from_int(px);
        if point < display.x || point >= display.x + display.width {
            return TextState::default();
        }
        let mut x = display.x;
        for cell in &display.cells {
            let cw = self.cell_width(cell);
            if point < x + cw {
                return TextState {
                    link: self.runs[cell.run].link_index,
                    upon_text: true,
                };
            }
            x += cw;
        }
        TextState::default()
    }

    /// Caret lookup under a point. Always resolves to the nearest
    /// character: points above map to the start, points below or past a
    /// line edge clamp to that line.
    pub(crate) fn symbol_at(&self, ctx: &DrawContext, px: i32, py: i32) -> SymbolState {
        let lines = self.wrap(ctx, None);
        let Some(first) = lines.first() else {
            return SymbolState::default();
        };
        if py < first.y {
            return SymbolState::default();
        }
        let line = lines
            .iter()
            .find(|l| py >= l.y && py < l.y + l.height)
            .or(lines.last())
            .copied()
            .unwrap_or(*first);

        let display = self.lay_line(ctx, &line, None);
        if display.from == display.to {
            return SymbolState {
                symbol: display.from,
                after_symbol: false,
                upon_text: false,
            };
        }

        let point = Fixed::from_int(px);
        let upon = py >= line.y
            && py < line.y + line.height
            && point >= display.x
            && point < display.x + display.width;
        let end = display.x + display.width - Fixed::from_raw(1);
        let point = point.clamp(display.x, end.max(display.x));

        let mut x = display.x;
        for cell in &display.cells {
            let cw = self.cell_width(cell);
            if point < x + cw {
                // Offset along the cell in logical order.
                let t = if cell.is_even() {
                    point - x
                } else {
                    x + cw - point
                };
                if let Some(state) = self.symbol_in_cell(cell, cw, t, upon) {
                    return state;
                }
            }
            x += cw;
        }
        SymbolState {
            symbol: display.to,
            after_symbol: false,
            upon_text: false,
        }
    }

    fn symbol_in_cell(&self, cell: &Cell, cw: Fixed, t: Fixed, upon: bool) -> Option<SymbolState> {
        let run = &self.runs[cell.run];
        if run.is_object() {
            return Some(SymbolState {
                symbol: run.from,
                after_symbol: t >= cw.half(),
                upon_text: upon,
            });
        }
        let text: String = self.buffer[usize::from(cell.start)..usize::from(cell.end)]
            .iter()
            .collect();
        let mut acc = Fixed::ZERO;
        let mut pos = cell.start;
        for cluster in text.graphemes(true) {
            let count = cluster.chars().count() as i32;
            let width = self.style.metrics.cluster_width(run.flags, cluster);
            if t < acc + width && width > Fixed::ZERO {
                // Split the cluster advance evenly over its scalars; the
                // caret lands after a scalar once past its midpoint.
                let char_w = width / count.max(1);
                let within = t - acc;
                let index = if char_w > Fixed::ZERO {
                    (within.raw() / char_w.raw()).clamp(0, count - 1)
                } else {
                    0
                };
                let frac = within - char_w * index;
                return Some(SymbolState {
                    symbol: pos + index as u16,
                    after_symbol: frac >= char_w.half(),
                    upon_text: upon,
                });
            }
            acc += width;
            pos += count as u16;
        }
        None
    }

    /// The word-wrap pass: pure line bookkeeping, no painting.
    fn wrap(&self, ctx: &DrawContext, elide: Option<&Elide>) -> Vec<Line> {
        let mut lines = Vec::new();
        if self.buffer.is_empty() {
            return lines;
        }
        let len = self.buffer.len() as u16;
        let w = Fixed::from_int(ctx.width);
        let base_height = self.style.base_line_height();
        let ambient = ctx.ambient.resolve(Direction::Ltr);
        let mut dir = self.start_direction.resolve(ambient);

        let atoms = self.atoms();
        let mut y = ctx.top;
        let mut line_from: u16 = 0;
        let mut width_left = w;
        let mut last_rbearing = Fixed::ZERO;
        let mut last_rpadding = Fixed::ZERO;
        let mut line_height = base_height;
        let mut first_on_line = true;
        let mut fallback: Option<(usize, i32)> = None;

        let mut i = 0;
        while i < atoms.len() {
            let atom = atoms[i];

            if atom.newline {
                if push_line(&mut lines, line_from, atom.from, y, line_height, dir, elide, len) {
                    return lines;
                }
                y += line_height;
                line_from = atom.end;
                width_left = w;
                last_rbearing = Fixed::ZERO;
                last_rpadding = Fixed::ZERO;
                line_height = base_height;
                first_on_line = true;
                fallback = None;
                if let RunKind::Newline { next_direction } = self.runs[atom.run].kind {
                    dir = next_direction.resolve(ambient);
                }
                i += 1;
                continue;
            }

            let new_width_left =
                width_left - last_rbearing - (last_rpadding + atom.width - atom.rbearing);
            if first_on_line || new_width_left >= Fixed::ZERO {
                // The first atom of a line is always placed, even when it
                // alone overflows the width.
                width_left = new_width_left;
                last_rbearing = atom.rbearing;
                last_rpadding = atom.rpadding;
                if let Some(h) = atom.object_height {
                    line_height = line_height.max(h);
                }
                if atom.breakable {
                    fallback = Some((i, line_height));
                }
                first_on_line = false;
                i += 1;
                continue;
            }

            if let Some((back, back_height)) = fallback.take() {
                // Roll back to the last safe break point and re-run the
                // rejected atoms on a fresh line.
                let brk = atoms[back].end;
                if push_line(&mut lines, line_from, brk, y, back_height, dir, elide, len) {
                    return lines;
                }
                y += back_height;
                line_from = brk;
                i = back + 1;
            } else {
                let brk = atom.from;
                if push_line(&mut lines, line_from, brk, y, line_height, dir, elide, len) {
                    return lines;
                }
                y += line_height;
                line_from = brk;
            }
            width_left = w;
            last_rbearing = Fixed::ZERO;
            last_rpadding = Fixed::ZERO;
            line_height = base_height;
            first_on_line = true;
        }

        // `line_from == len` means the last atom was a newline: the empty
        // trailing paragraph still takes a line, matching the natural
        // height count.
        push_line(&mut lines, line_from, len, y, line_height, dir, elide, len);
        lines
    }

    fn atoms(&self) -> Vec<Atom> {
        let mut out: Vec<Atom> = Vec::new();
        for (ri, run) in self.runs.iter().enumerate() {
            match &run.kind {
                RunKind::Newline { .. } => out.push(Atom {
                    run: ri,
                    from: run.from,
                    end: run.end(),
                    width: Fixed::ZERO,
                    rbearing: Fixed::ZERO,
                    rpadding: Fixed::ZERO,
                    breakable: false,
                    newline: true,
                    object_height: None,
                }),
                RunKind::Emoji { .. } | RunKind::Skip { .. } => out.push(Atom {
                    run: ri,
                    from: run.from,
                    end: run.end(),
                    width: run.width(),
                    rbearing: Fixed::ZERO,
                    rpadding: Fixed::ZERO,
                    breakable: true,
                    newline: false,
                    object_height: match run.kind {
                        RunKind::Skip { height } => Some(height),
                        _ => None,
                    },
                }),
                RunKind::Text { words } => {
                    if run.lpadding > Fixed::ZERO {
                        // Leading whitespace binds to the previous atom as
                        // inter-word padding; at a line start it vanishes.
                        if let Some(prev) = out.last_mut() {
                            if !prev.newline {
                                prev.rpadding += run.lpadding;
                            }
                        }
                    }
                    for (wi, word) in words.iter().enumerate() {
                        let end = words.get(wi + 1).map_or(run.end(), crate::run::Word::from);
                        out.push(Atom {
                            run: ri,
                            from: word.from(),
                            end,
                            width: word.abs_width(),
                            rbearing: word.rbearing(),
                            rpadding: word.rpadding(),
                            breakable: word.ends_word() || self.break_everywhere,
                            newline: false,
                            object_height: None,
                        });
                    }
                }
            }
        }
        out
    }

    /// Resolve one line into its display form: trim, elide, align, reorder.
    fn lay_line(&self, ctx: &DrawContext, line: &Line, elide: Option<&Elide>) -> LineDisplay {
        let from = line.from;
        let mut to = line.to;
        let mut ellipsis = false;

        if line.elide {
            let remove = elide.map_or(0, |e| e.remove_from_end);
            let marker = self.style.metrics.elision_width(StyleFlags::empty());
            let budget = Fixed::from_int(ctx.width) - Fixed::from_int(remove);
            if budget < marker {
                // Not even the marker fits the budget; paint nothing
                // rather than overflow it.
                to = from;
            } else {
                to = self.elide_cut(from, to, budget - marker);
                ellipsis = true;
            }
        }

        // Trailing spaces do not take part in alignment or painting; an
        // all-space line keeps a single one.
        let mut trimmed = to;
        while trimmed > from && self.buffer[usize::from(trimmed) - 1] == ' ' {
            trimmed -= 1;
        }
        if trimmed == from && to > from {
            trimmed = from + 1;
        }
        let to = trimmed;

        let mut width = self.range_width(from, to);
        if ellipsis {
            width += self.style.metrics.elision_width(StyleFlags::empty());
        }

        let avail = (Fixed::from_int(ctx.width) - width).max(Fixed::ZERO);
        let offset = match (ctx.align, line.dir.is_rtl()) {
            (Align::Center, _) => avail.half(),
            (Align::Left, false) | (Align::Right, true) => Fixed::ZERO,
            (Align::Left, true) | (Align::Right, false) => avail,
        };
        let x = Fixed::from_int(ctx.left) + offset;

        LineDisplay {
            from,
            to,
            x,
            width,
            cells: self.line_cells(from, to, line.dir),
            ellipsis,
        }
    }

    /// Cut point for an elided line: the longest prefix fitting `avail`,
    /// never crossing a paragraph break.
    fn elide_cut(&self, from: u16, to: u16, avail: Fixed) -> u16 {
        let cap = self.buffer[usize::from(from)..usize::from(to)]
            .iter()
            .position(|&c| c == '\n')
            .map_or(to, |p| from + p as u16);

        let mut used = Fixed::ZERO;
        let mut cut = from;
        for ri in self.run_range(from, cap) {
            let run = &self.runs[ri];
            if run.is_object() {
                if used + run.width() > avail {
                    return cut;
                }
                used += run.width();
                cut = run.end();
                continue;
            }
            let s = run.from.max(from);
            let e = run.end().min(cap);
            let text: String = self.buffer[usize::from(s)..usize::from(e)].iter().collect();
            for cluster in text.graphemes(true) {
                let w = self.style.metrics.cluster_width(run.flags, cluster);
                if used + w > avail {
                    return cut;
                }
                used += w;
                cut += cluster.chars().count() as u16;
            }
        }
        cut
    }

    fn draw_line(
        &self,
        surface: &mut dyn Surface,
        ctx: &DrawContext,
        line: &Line,
        elide: Option<&Elide>,
    ) {
        let display = self.lay_line(ctx, line, elide);
        let metrics = self.style.metrics.as_ref();
        let baseline = line.y + (line.height - metrics.height()) / 2 + metrics.ascent();
        let elision_width = metrics.elision_width(StyleFlags::empty());
        let mut x = display.x;

        // The marker takes the base direction: on an RTL line it sits at
        // the visual start (left edge).
        if display.ellipsis && line.dir.is_rtl() {
            surface.draw_text(x, baseline, ELLIPSIS, StyleFlags::empty(), ctx.palette.text);
            x += elision_width;
        }

        for cell in &display.cells {
            let run = &self.runs[cell.run];
            match &run.kind {
                RunKind::Emoji { emoji } => {
                    if ctx.selection.contains(run.from) {
                        self.fill_selection(surface, ctx, x, run.width(), line);
                    }
                    surface.draw_emoji(
                        x + self.style.emoji_padding,
                        line.y + (line.height - self.style.emoji_size) / 2,
                        *emoji,
                        self.style.emoji_size,
                    );
                    x += run.width();
                }
                RunKind::Skip { .. } => {
                    if ctx.selection.contains(run.from) {
                        self.fill_selection(surface, ctx, x, run.width(), line);
                    }
                    x += run.width();
                }
                RunKind::Newline { .. } => {}
                RunKind::Text { .. } => {
                    x += self.draw_text_cell(surface, ctx, cell, x, baseline, line);
                }
            }
        }

        if display.ellipsis && !line.dir.is_rtl() {
            surface.draw_text(x, baseline, ELLIPSIS, StyleFlags::empty(), ctx.palette.text);
        }
    }

    /// Paint one text cell, splitting around the selection; returns the
    /// cell advance.
    fn draw_text_cell(
        &self,
        surface: &mut dyn Surface,
        ctx: &DrawContext,
        cell: &Cell,
        x: Fixed,
        baseline: i32,
        line: &Line,
    ) -> Fixed {
        let run = &self.runs[cell.run];
        let metrics = self.style.metrics.as_ref();
        let cell_width = self.cell_width(cell);

        let s0 = ctx.selection.from.clamp(cell.start, cell.end);
        let s1 = ctx.selection.to.clamp(cell.start, cell.end);
        let segments = [
            (cell.start, s0, false),
            (s0, s1, true),
            (s1, cell.end, false),
        ];

        let mut logical = Fixed::ZERO;
        for (a, b, selected) in segments {
            if a >= b {
                continue;
            }
            let text: String = self.buffer[usize::from(a)..usize::from(b)].iter().collect();
            let width = metrics.text_width(run.flags, &text);
            // Odd-level cells lay out right-to-left within the cell box.
            let sx = if cell.is_even() {
                x + logical
            } else {
                x + cell_width - logical - width
            };
            if selected {
                self.fill_selection(surface, ctx, sx, width, line);
            }
            let color = segment_color(run, selected, ctx);
            surface.draw_text(sx, baseline, &text, run.flags, color);
            logical += width;
        }
        cell_width
    }

    fn fill_selection(
        &self,
        surface: &mut dyn Surface,
        ctx: &DrawContext,
        x: Fixed,
        width: Fixed,
        line: &Line,
    ) {
        let left = x.round();
        surface.fill_rect(
            left,
            line.y,
            (x + width).round() - left,
            line.height,
            ctx.palette.select_bg,
        );
    }

    /// Measure a buffer range run by run, so style flags apply.
    fn range_width(&self, from: u16, to: u16) -> Fixed {
        let mut width = Fixed::ZERO;
        for ri in self.run_range(from, to) {
            let run = &self.runs[ri];
            if run.is_newline() {
                continue;
            }
            if run.is_object() {
                width += run.width();
                continue;
            }
            let s = run.from.max(from);
            let e = run.end().min(to);
            let text: String = self.buffer[usize::from(s)..usize::from(e)].iter().collect();
            width += self.style.metrics.text_width(run.flags, &text);
        }
        width
    }

    fn cell_width(&self, cell: &Cell) -> Fixed {
        let run = &self.runs[cell.run];
        if run.is_object() {
            return run.width();
        }
        let text: String = self.buffer[usize::from(cell.start)..usize::from(cell.end)]
            .iter()
            .collect();
        self.style.metrics.text_width(run.flags, &text)
    }

    /// Indices of runs overlapping `[from, to)`.
    fn run_range(&self, from: u16, to: u16) -> std::ops::Range<usize> {
        let a = self.runs.partition_point(|r| r.end() <= from);
        let b = self.runs.partition_point(|r| r.from < to);
        a..b.max(a)
    }

    /// Level-resolve the line and split items at run boundaries, returning
    /// cells in visual order.
    fn line_cells(&self, from: u16, to: u16, dir: Direction) -> Vec<Cell> {
        if from >= to {
            return Vec::new();
        }
        let slice = &self.buffer[usize::from(from)..usize::from(to)];
        let mut object = vec![false; slice.len()];
        for ri in self.run_range(from, to) {
            let run = &self.runs[ri];
            if run.is_object() {
                for pos in run.from.max(from)..run.end().min(to) {
                    object[usize::from(pos - from)] = true;
                }
            }
        }

        let items = bidi::itemize(slice, &object, dir.resolve(Direction::Ltr));
        let mut cells: Vec<Cell> = Vec::new();
        for item in &items {
            let ia = from + item.start as u16;
            let ib = from + item.end as u16;
            for ri in self.run_range(ia, ib) {
                let run = &self.runs[ri];
                let start = run.from.max(ia);
                let end = run.end().min(ib);
                if start >= end {
                    continue;
                }
                // Skip placeholders never join a reversed run.
                let level = if matches!(run.kind, RunKind::Skip { .. }) {
                    0
                } else {
                    item.level
                };
                cells.push(Cell {
                    start,
                    end,
                    level,
                    run: ri,
                });
            }
        }

        let levels: Vec<u8> = cells.iter().map(|c| c.level).collect();
        let mut order = bidi::visual_order(&levels);

        // A trailing skip placeholder on an RTL line stays pinned at the
        // visual front.
        if dir.is_rtl() && !cells.is_empty() {
            let last = cells.len() - 1;
            if matches!(self.runs[cells[last].run].kind, RunKind::Skip { .. }) {
                if let Some(p) = order.iter().position(|&o| o == last) {
                    order.remove(p);
                    order.insert(0, last);
                }
            }
        }

        order.into_iter().map(|o| cells[o]).collect()
    }
}

fn segment_color(run: &Run, selected: bool, ctx: &DrawContext) -> Rgba {
    if run.link_index != 0 {
        if selected {
            ctx.palette.select_link
        } else if ctx.pressed_link == run.link_index {
            ctx.palette.link_pressed
        } else if ctx.active_link == run.link_index {
            ctx.palette.link_active
        } else {
            ctx.palette.link
        }
    } else if selected {
        ctx.palette.select_text
    } else {
        run.color.unwrap_or(ctx.palette.text)
    }
}

#[allow(clippy::too_many_arguments)]
fn push_line(
    lines: &mut Vec<Line>,
    from: u16,
    to: u16,
    y: i32,
    height: i32,
    dir: Direction,
    elide: Option<&Elide>,
    len: u16,
) -> bool {
    if let Some(mode) = elide {
        let max_lines = mode.max_lines.max(1) as usize;
        if lines.len() + 1 == max_lines && to < len {
            lines.push(Line {
                from,
                to: len,
                y,
                height,
                dir,
                elide: true,
            });
            return true;
        }
    }
    lines.push(Line {
        from,
        to,
        y,
        height,
        dir,
        elide: false,
    });
    false
}

/// Natural (unwrapped) size of the document: the widest paragraph and the
/// stacked height of all paragraphs. Also refreshes each newline run's
/// cached next-paragraph direction.
pub(crate) fn recount_natural_size(
    style: &TextStyle,
    buffer: &[char],
    runs: &mut [Run],
) -> (Fixed, i32) {
    if buffer.is_empty() {
        return (Fixed::ZERO, 0);
    }
    let base_height = style.base_line_height();
    let mut max_width = Fixed::ZERO;
    let mut min_height = 0;
    let mut current = Fixed::ZERO;
    let mut carry = Fixed::ZERO;
    let mut line_height = base_height;

    for i in 0..runs.len() {
        match runs[i].kind {
            RunKind::Newline { .. } => {
                max_width = max_width.max(current);
                min_height += line_height;
                current = Fixed::ZERO;
                carry = Fixed::ZERO;
                line_height = base_height;

                let start = usize::from(runs[i].end());
                let end = buffer[start..]
                    .iter()
                    .position(|&c| c == '\n')
                    .map_or(buffer.len(), |p| start + p);
                let next = bidi::first_strong(&buffer[start..end]);
                if let RunKind::Newline { next_direction } = &mut runs[i].kind {
                    *next_direction = next;
                }
            }
            RunKind::Skip { height } => {
                line_height = line_height.max(height);
                current += carry + runs[i].width();
                carry = Fixed::ZERO;
            }
            _ => {
                // Run width already includes any leading padding.
                current = current + carry + runs[i].width();
                carry = runs[i].rpadding();
            }
        }
    }
    max_width = max_width.max(current);
    min_height += line_height;
    (max_width, min_height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Command;
    use crate::emoji::NoEmoji;
    use crate::font::CellMetrics;
    use crate::parse::{self, ParseOutput};
    use crate::style::{ParseFlags, ParseOptions};
    use crate::surface::{PaintOp, RecordingSurface};
    use crate::validator::LinkValidator;
    use std::sync::Arc;

    fn style() -> TextStyle {
        TextStyle::new(Arc::new(CellMetrics::default()))
    }

    fn parsed(raw: &str, options: &ParseOptions) -> (TextStyle, ParseOutput) {
        let style = style();
        let mut out = parse::parse(&style, raw, options, &LinkValidator::new(), &NoEmoji);
        recount_natural_size(&style, &out.buffer, &mut out.runs);
        (style, out)
    }

    fn layout<'a>(style: &'a TextStyle, out: &'a ParseOutput) -> Layout<'a> {
        Layout {
            style,
            buffer: &out.buffer,
            runs: &out.runs,
            start_direction: out.start_direction,
            break_everywhere: false,
        }
    }

    fn drawn_text(raw: &str, width: i32) -> String {
        let (style, out) = parsed(raw, &ParseOptions::default());
        let mut surface = RecordingSurface::new();
        layout(&style, &out).draw(&mut surface, &DrawContext::new(0, 0, width), None);
        surface.text()
    }

    #[test]
    fn test_single_line_height() {
        let (style, out) = parsed("hello world", &ParseOptions::default());
        let h = layout(&style, &out).count_height(&DrawContext::new(0, 0, 200));
        assert_eq!(h, 16);
    }

    #[test]
    fn test_wrap_at_word_boundary() {
        let (style, out) = parsed("hello world", &ParseOptions::default());
        let h = layout(&style, &out).count_height(&DrawContext::new(0, 0, 48));
        assert_eq!(h, 32);

        let mut surface = RecordingSurface::new();
        layout(&style, &out).draw(&mut surface, &DrawContext::new(0, 0, 48), None);
        let texts: Vec<String> = surface
            .ops
            .iter()
            .filter_map(|op| match op {
                PaintOp::Text { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(texts, vec!["hello", "world"]);
    }

    #[test]
    fn test_height_monotonic_in_width() {
        let (style, out) = parsed(
            "the quick brown fox jumps over the lazy dog",
            &ParseOptions::default(),
        );
        let l = layout(&style, &out);
        let mut last = i32::MAX;
        for width in [40, 80, 120, 200, 400] {
            let h = l.count_height(&DrawContext::new(0, 0, width));
            assert!(h <= last, "height grew when width grew");
            last = h;
        }
    }

    #[test]
    fn test_oversized_word_overflows_single_line() {
        // No resize threshold, no safe break: the word overflows.
        let (style, out) = parsed("abcdefghij", &ParseOptions::default());
        let h = layout(&style, &out).count_height(&DrawContext::new(0, 0, 40));
        assert_eq!(h, 16);
    }

    #[test]
    fn test_oversized_word_breaks_with_resize_threshold() {
        let style = style().with_min_resize_width(40);
        let mut out = parse::parse(
            &style,
            "abcdefghij",
            &ParseOptions::default(),
            &LinkValidator::new(),
            &NoEmoji,
        );
        recount_natural_size(&style, &out.buffer, &mut out.runs);
        let l = layout(&style, &out);
        // 80px of text over 40px lines.
        assert_eq!(l.count_height(&DrawContext::new(0, 0, 40)), 32);

        let mut surface = RecordingSurface::new();
        l.draw(&mut surface, &DrawContext::new(0, 0, 40), None);
        assert_eq!(surface.text(), "abcdefghij");
    }

    #[test]
    fn test_trailing_newline_keeps_empty_last_line() {
        // A trailing command keeps the final newline from being trimmed,
        // so the buffer ends with an empty paragraph.
        let mut raw = String::from("a\n");
        Command::Bold.encode_into(&mut raw).unwrap();
        let options =
            ParseOptions::default().with_flags(ParseFlags::MULTILINE | ParseFlags::RICH);
        let style = style();
        let mut out = parse::parse(&style, &raw, &options, &LinkValidator::new(), &NoEmoji);
        let (_, min_height) = recount_natural_size(&style, &out.buffer, &mut out.runs);
        assert_eq!(out.buffer.last(), Some(&'\n'));

        let h = layout(&style, &out).count_height(&DrawContext::new(0, 0, 200));
        assert_eq!(h, min_height);
        assert_eq!(h, 32);
    }

    #[test]
    fn test_explicit_newlines_make_lines() {
        let (style, out) = parsed("a\nb\nc", &ParseOptions::default());
        assert_eq!(
            layout(&style, &out).count_height(&DrawContext::new(0, 0, 200)),
            48
        );
    }

    #[test]
    fn test_draw_covers_all_visible_text() {
        for width in [48, 100, 400] {
            assert_eq!(drawn_text("hello world again", width).replace(' ', ""), "helloworldagain");
        }
    }

    #[test]
    fn test_alignment_offsets() {
        let (style, out) = parsed("hi", &ParseOptions::default());
        let l = layout(&style, &out);
        for (align, expect) in [
            (Align::Left, 0),
            (Align::Center, 42),
            (Align::Right, 84),
        ] {
            let mut surface = RecordingSurface::new();
            l.draw(
                &mut surface,
                &DrawContext::new(0, 0, 100).with_align(align),
                None,
            );
            let Some(PaintOp::Text { x, .. }) = surface.ops.first() else {
                panic!("no text drawn");
            };
            assert_eq!(x.round(), expect, "{align:?}");
        }
    }

    #[test]
    fn test_rtl_line_flushes_right_under_left_align() {
        let (style, out) = parsed("שלום", &ParseOptions::default());
        let mut surface = RecordingSurface::new();
        layout(&style, &out).draw(&mut surface, &DrawContext::new(0, 0, 100), None);
        let Some(PaintOp::Text { x, .. }) = surface.ops.first() else {
            panic!("no text drawn");
        };
        assert_eq!(x.round(), 100 - 4 * 8);
    }

    #[test]
    fn test_mixed_direction_visual_order() {
        // RTL base: the Latin fragment paints at the visual left.
        let (style, out) = parsed("שלום abc", &ParseOptions::default());
        let mut surface = RecordingSurface::new();
        layout(&style, &out).draw(&mut surface, &DrawContext::new(0, 0, 200), None);
        let texts: Vec<(i32, String)> = surface
            .ops
            .iter()
            .filter_map(|op| match op {
                PaintOp::Text { x, text, .. } => Some((x.round(), text.clone())),
                _ => None,
            })
            .collect();
        let abc = texts.iter().find(|(_, t)| t.contains("abc")).unwrap();
        let heb = texts.iter().find(|(_, t)| t.contains("שלום")).unwrap();
        assert!(abc.0 < heb.0, "latin should be left of hebrew: {texts:?}");
    }

    #[test]
    fn test_selection_paints_background_and_colors() {
        let (style, out) = parsed("hello", &ParseOptions::default());
        let palette = TextPalette {
            select_text: Rgba::rgb(250, 250, 250),
            ..TextPalette::default()
        };
        let ctx = DrawContext::new(0, 0, 200)
            .with_selection(Selection::new(1, 3))
            .with_palette(palette);
        let mut surface = RecordingSurface::new();
        layout(&style, &out).draw(&mut surface, &ctx, None);

        let rects: Vec<_> = surface
            .ops
            .iter()
            .filter(|op| matches!(op, PaintOp::Rect { .. }))
            .collect();
        assert_eq!(rects.len(), 1);
        let PaintOp::Rect { x, width, color, .. } = rects[0] else {
            unreachable!();
        };
        assert_eq!((*x, *width), (8, 16));
        assert_eq!(*color, ctx.palette.select_bg);

        let selected: Vec<String> = surface
            .ops
            .iter()
            .filter_map(|op| match op {
                PaintOp::Text { text, color, .. } if *color == ctx.palette.select_text => {
                    Some(text.clone())
                }
                _ => None,
            })
            .collect();
        assert_eq!(selected, vec!["el"]);
    }

    #[test]
    fn test_link_colors_follow_hover_and_press() {
        let (style, out) = parsed("go to example.com now", &ParseOptions::default());
        let l = layout(&style, &out);
        let link_text = |ctx: &DrawContext| -> Rgba {
            let mut surface = RecordingSurface::new();
            l.draw(&mut surface, ctx, None);
            surface
                .ops
                .iter()
                .find_map(|op| match op {
                    PaintOp::Text { text, color, .. } if text.contains("example.com") => {
                        Some(*color)
                    }
                    _ => None,
                })
                .unwrap()
        };
        let base = DrawContext::new(0, 0, 400);
        assert_eq!(link_text(&base), base.palette.link);
        assert_eq!(
            link_text(&base.with_active_link(1)),
            base.palette.link_active
        );
        assert_eq!(
            link_text(&base.with_pressed_link(1)),
            base.palette.link_pressed
        );
    }

    #[test]
    fn test_state_at_finds_link() {
        let (style, out) = parsed("go to example.com now", &ParseOptions::default());
        let l = layout(&style, &out);
        let ctx = DrawContext::new(0, 0, 400);
        // "go to " is 6 cells; the link spans cells 6..17.
        let state = l.state_at(&ctx, 6 * 8 + 4, 8);
        assert_eq!(state, TextState { link: 1, upon_text: true });
        let state = l.state_at(&ctx, 2 * 8, 8);
        assert_eq!(state, TextState { link: 0, upon_text: true });
        // Outside the painted line.
        assert_eq!(l.state_at(&ctx, 390, 8), TextState::default());
        assert_eq!(l.state_at(&ctx, 50, 100), TextState::default());
    }

    #[test]
    fn test_symbol_at_half_advance() {
        let (style, out) = parsed("hello world", &ParseOptions::default());
        let l = layout(&style, &out);
        let ctx = DrawContext::new(0, 0, 400);
        let s = l.symbol_at(&ctx, 2, 8);
        assert_eq!((s.symbol, s.after_symbol), (0, false));
        let s = l.symbol_at(&ctx, 6, 8);
        assert_eq!((s.symbol, s.after_symbol), (0, true));
        let s = l.symbol_at(&ctx, 20, 8);
        assert_eq!(s.symbol, 2);
        assert!(s.upon_text);
    }

    #[test]
    fn test_symbol_at_clamps_outside() {
        let (style, out) = parsed("hi\nthere", &ParseOptions::default());
        let l = layout(&style, &out);
        let ctx = DrawContext::new(0, 0, 400);
        // Above the first line.
        let s = l.symbol_at(&ctx, 50, -10);
        assert_eq!((s.symbol, s.upon_text), (0, false));
        // Below the last line clamps into it.
        let s = l.symbol_at(&ctx, 0, 500);
        assert_eq!(s.symbol, 3);
        assert!(!s.upon_text);
        // Right of a line clamps to its last character.
        let s = l.symbol_at(&ctx, 350, 8);
        assert_eq!(s.caret(), 2);
        assert!(!s.upon_text);
    }

    #[test]
    fn test_second_line_hits() {
        let (style, out) = parsed("hi\nthere", &ParseOptions::default());
        let l = layout(&style, &out);
        let ctx = DrawContext::new(0, 0, 400);
        let s = l.symbol_at(&ctx, 2, 20);
        assert_eq!(s.symbol, 3);
        assert!(s.upon_text);
    }

    #[test]
    fn test_elided_draw_appends_marker() {
        let (style, out) = parsed("hello world", &ParseOptions::default());
        let mut surface = RecordingSurface::new();
        layout(&style, &out).draw(
            &mut surface,
            &DrawContext::new(0, 0, 48),
            Some(Elide {
                max_lines: 1,
                remove_from_end: 0,
            }),
        );
        assert_eq!(surface.text(), "hel...");
        assert!(surface.max_right(style.metrics.as_ref()) <= 48);
    }

    #[test]
    fn test_elide_with_reserved_end_space() {
        let (style, out) = parsed("hello world", &ParseOptions::default());
        let mut surface = RecordingSurface::new();
        layout(&style, &out).draw(
            &mut surface,
            &DrawContext::new(0, 0, 48),
            Some(Elide {
                max_lines: 1,
                remove_from_end: 8,
            }),
        );
        assert_eq!(surface.text(), "he...");
    }

    #[test]
    fn test_elide_not_needed_when_fits() {
        let (style, out) = parsed("hi", &ParseOptions::default());
        let mut surface = RecordingSurface::new();
        layout(&style, &out).draw(
            &mut surface,
            &DrawContext::new(0, 0, 200),
            Some(Elide {
                max_lines: 1,
                remove_from_end: 0,
            }),
        );
        assert_eq!(surface.text(), "hi");
    }

    #[test]
    fn test_elide_narrower_than_marker_paints_nothing() {
        // 16px cannot hold the 24px marker; the line degrades to empty
        // instead of overflowing.
        let (style, out) = parsed("hello world", &ParseOptions::default());
        let mut surface = RecordingSurface::new();
        layout(&style, &out).draw(
            &mut surface,
            &DrawContext::new(0, 0, 16),
            Some(Elide {
                max_lines: 1,
                remove_from_end: 0,
            }),
        );
        assert_eq!(surface.text(), "");
        assert!(surface.max_right(style.metrics.as_ref()) <= 16);
    }

    #[test]
    fn test_elide_stops_at_paragraph_break() {
        let (style, out) = parsed("one\ntwo three four five", &ParseOptions::default());
        let mut surface = RecordingSurface::new();
        layout(&style, &out).draw(
            &mut surface,
            &DrawContext::new(0, 0, 400),
            Some(Elide {
                max_lines: 1,
                remove_from_end: 0,
            }),
        );
        assert_eq!(surface.text(), "one...");
    }

    #[test]
    fn test_viewport_skips_lines() {
        let (style, out) = parsed("a\nb\nc\nd", &ParseOptions::default());
        let mut surface = RecordingSurface::new();
        layout(&style, &out).draw(
            &mut surface,
            &DrawContext::new(0, 0, 200).with_viewport(16, 48),
            None,
        );
        assert_eq!(surface.text(), "bc");
    }

    #[test]
    fn test_natural_size() {
        let (style, mut out) = parsed("hello world\nhi", &ParseOptions::default());
        let (max_width, min_height) = recount_natural_size(&style, &out.buffer, &mut out.runs);
        assert_eq!(max_width, Fixed::from_int(88));
        assert_eq!(min_height, 32);
    }

    #[test]
    fn test_natural_size_empty() {
        let (style, mut out) = parsed("", &ParseOptions::default());
        let (max_width, min_height) = recount_natural_size(&style, &out.buffer, &mut out.runs);
        assert_eq!(max_width, Fixed::ZERO);
        assert_eq!(min_height, 0);
    }

    #[test]
    fn test_newline_direction_cached() {
        let (_, out) = parsed("hello\nשלום", &ParseOptions::default());
        let newline = out.runs.iter().find(|r| r.is_newline()).unwrap();
        let RunKind::Newline { next_direction } = newline.kind else {
            unreachable!();
        };
        assert_eq!(next_direction, Direction::Rtl);
    }

    #[test]
    fn test_wrapped_width_never_exceeds_budget_at_safe_breaks() {
        let (style, out) = parsed(
            "alpha beta gamma delta epsilon zeta",
            &ParseOptions::default(),
        );
        let l = layout(&style, &out);
        for width in [64, 96, 128] {
            let mut surface = RecordingSurface::new();
            l.draw(&mut surface, &DrawContext::new(0, 0, width), None);
            assert!(
                surface.max_right(style.metrics.as_ref()) <= width,
                "overflow at width {width}"
            );
        }
    }
}
