//! The markup tokenizer: raw annotated input to `(buffer, runs, links)`.
//!
//! One left-to-right pass. Rich input is consumed through the command
//! lexer ([`crate::command`]); detected link candidates come from the
//! up-front pre-scan ([`crate::entity`]) and are spliced in when the scan
//! reaches them. Characters are normalized on the way into the buffer:
//! known-bad code points drop, whitespace collapses, combining marks cap,
//! emoji sequences fold into object runs. The pass stops early when the
//! measured width exceeds the caller's budget or the buffer hits its hard
//! cap; a partial document is valid, just shorter.

use crate::bidi::{self, Direction};
use crate::chars;
use crate::color::Rgba;
use crate::command::{COMMAND_CHAR, Command, Lexer, Token};
use crate::emoji::EmojiTable;
use crate::entity::{self, LinkCandidate, LinkKind};
use crate::fixed::Fixed;
use crate::font::elide_right;
use crate::run::Run;
use crate::style::{ParseFlags, ParseOptions, StyleFlags, TextStyle};
use crate::text::{Link, LinkDisplay};
use crate::validator::LinkValidator;
use std::collections::VecDeque;

/// Sentinel base for links pushed during the pass; renumbered to follow
/// all explicit slots before the tokenizer returns. The command decoder
/// rejects wire indices at or above this value, so the sentinel range
/// never collides with explicit slots.
pub(crate) const LINK_INDEX_SHIFT: u16 = crate::command::MAX_LINK_INDEX + 1;

/// Hard cap on normalized buffer length, in scalars.
pub(crate) const MAX_CHARS: usize = 0x8000;

/// Hard cap on links in one document.
pub(crate) const MAX_LINKS: usize = 0x7FFF;

/// Consecutive combining marks kept per base character. Two observed
/// upstream revisions disagree (4 vs 2); this implementation fixes the
/// cap at 2.
pub(crate) const MAX_MARKS_PER_BASE: usize = 2;

/// Everything one tokenization pass produces.
pub(crate) struct ParseOutput {
    pub buffer: Vec<char>,
    pub runs: Vec<Run>,
    pub links: Vec<Option<Link>>,
    pub start_direction: Direction,
}

/// Tokenize `raw` under `options`, consulting `validator` for link
/// detection and `emoji` for emoji folding.
pub(crate) fn parse(
    style: &TextStyle,
    raw: &str,
    options: &ParseOptions,
    validator: &LinkValidator,
    emoji: &dyn EmojiTable,
) -> ParseOutput {
    let rich = options.flags.contains(ParseFlags::RICH);
    let src: Vec<char> = raw.chars().collect();
    let (start, end) = trim_bounds(&src, rich);
    let src = &src[start..end];

    let candidates = if options.flags.contains(ParseFlags::AUTO_LINKS) {
        entity::scan_links(src, validator, rich).into()
    } else {
        VecDeque::new()
    };

    let stop_after = if options.max_width > 0 && options.max_height > 0 {
        let lines = options.max_height / style.base_line_height() + 1;
        Some(Fixed::from_int(options.max_width) * lines)
    } else {
        None
    };

    let mut parser = Parser {
        style,
        flags: StyleFlags::empty(),
        color: None,
        link_index: 0,
        buffer: Vec::with_capacity(src.len().min(MAX_CHARS)),
        runs: Vec::new(),
        pushed: Vec::new(),
        block_start: 0,
        marks_on_base: 0,
        last_was_object: false,
        sum_width: Fixed::ZERO,
    };
    parser.scan(src, options, candidates, stop_after, emoji);
    parser.finish(options)
}

/// Leading/trailing trimmable scalars, without eating command characters.
fn trim_bounds(src: &[char], rich: bool) -> (usize, usize) {
    let keeps = |ch: char| !chars::is_trimmable(ch) || (rich && ch == COMMAND_CHAR);
    let start = src.iter().position(|&c| keeps(c)).unwrap_or(src.len());
    let end = src
        .iter()
        .rposition(|&c| keeps(c))
        .map_or(start, |p| p + 1);
    (start, end.max(start))
}

struct Parser<'a> {
    style: &'a TextStyle,
    flags: StyleFlags,
    color: Option<Rgba>,
    link_index: u16,
    buffer: Vec<char>,
    runs: Vec<Run>,
    pushed: Vec<Link>,
    block_start: usize,
    marks_on_base: usize,
    last_was_object: bool,
    sum_width: Fixed,
}

impl Parser<'_> {
    fn scan(
        &mut self,
        src: &[char],
        options: &ParseOptions,
        mut candidates: VecDeque<LinkCandidate>,
        stop_after: Option<Fixed>,
        emoji: &dyn EmojiTable,
    ) {
        let rich = options.flags.contains(ParseFlags::RICH);
        let multiline = options.flags.contains(ParseFlags::MULTILINE);
        let mut lexer = Lexer::new(src, rich);

        loop {
            let pos = lexer.pos();
            if pos >= src.len() || self.buffer.len() >= MAX_CHARS {
                break;
            }
            if stop_after.is_some_and(|budget| self.sum_width > budget) {
                break;
            }

            // Splice in the next waiting link when the scan reaches it.
            while candidates.front().is_some_and(|c| c.start < pos) {
                candidates.pop_front();
            }
            if self.link_index == 0
                && candidates.front().is_some_and(|c| c.start == pos)
                && self.pushed.len() < MAX_LINKS
            {
                if let Some(candidate) = candidates.pop_front() {
                    self.place_link(src, &candidate);
                    lexer.seek(candidate.end);
                }
                continue;
            }

            // Emoji sequences are consumed raw, before lexing; they never
            // begin with a command or whitespace character.
            if !(rich && src[pos] == COMMAND_CHAR) {
                if let Some(found) = emoji.find(&src[pos..]) {
                    self.flush_block();
                    let start = self.buffer.len();
                    self.buffer.extend_from_slice(&src[pos..pos + found.len]);
                    self.runs.push(Run::new_emoji(
                        start,
                        found.len,
                        self.flags,
                        self.link_index,
                        self.color,
                        found.emoji,
                        self.style.emoji_width(),
                    ));
                    self.block_start = self.buffer.len();
                    self.sum_width += self.style.emoji_width();
                    self.marks_on_base = 0;
                    self.last_was_object = true;
                    lexer.seek(pos + found.len);
                    continue;
                }
            }

            match lexer.next() {
                None => break,
                Some(Token::Command(cmd)) => self.apply_command(cmd),
                Some(Token::Char(ch)) => self.push_char(ch, multiline),
            }
        }

        self.flush_block();
    }

    fn push_char(&mut self, ch: char, multiline: bool) {
        if chars::is_bad(ch) {
            return;
        }

        if chars::is_newline(ch) {
            if multiline {
                self.flush_block();
                self.buffer.push('\n');
                self.runs.push(Run::new_newline(self.buffer.len() - 1));
                self.block_start = self.buffer.len();
                self.marks_on_base = 0;
                self.last_was_object = false;
            } else {
                self.push_space();
            }
            return;
        }

        if chars::is_space_like(ch) {
            self.push_space();
            return;
        }

        if chars::is_mark(ch) {
            let has_base = !self.last_was_object
                && self.buffer.last().is_some_and(|&b| b != ' ' && b != '\n');
            if has_base && self.marks_on_base < MAX_MARKS_PER_BASE {
                self.buffer.push(ch);
                self.marks_on_base += 1;
            }
            return;
        }

        self.buffer.push(ch);
        self.marks_on_base = 0;
        self.last_was_object = false;
        let mut one = [0u8; 4];
        self.sum_width += self
            .style
            .metrics
            .cluster_width(self.flags, ch.encode_utf8(&mut one));
    }

    /// Flush pending text into a run, push the link record and append the
    /// link's display text as a dedicated run.
    fn place_link(&mut self, src: &[char], candidate: &LinkCandidate) {
        self.flush_block();

        let text: String = src[candidate.start..candidate.end].iter().collect();
        let (shown, link) = match candidate.kind {
            LinkKind::Email => (
                text.clone(),
                Link {
                    target: text,
                    display: LinkDisplay::Email,
                },
            ),
            LinkKind::Url => {
                let target = if candidate.has_scheme {
                    text.clone()
                } else {
                    format!("http://{text}")
                };
                let (shown, cut) = elide_right(
                    self.style.metrics.as_ref(),
                    self.flags,
                    &text,
                    self.style.link_crop,
                );
                (
                    shown,
                    Link {
                        target,
                        display: if cut {
                            LinkDisplay::Elided
                        } else {
                            LinkDisplay::Full
                        },
                    },
                )
            }
        };

        self.pushed.push(link);
        let index = LINK_INDEX_SHIFT + self.pushed.len() as u16;

        let start = self.buffer.len();
        self.buffer.extend(shown.chars());
        self.sum_width += self.style.metrics.text_width(self.flags, &shown);
        self.runs.push(Run::new_text(
            &self.buffer,
            start,
            self.buffer.len() - start,
            self.flags,
            index,
            self.color,
            self.style.metrics.as_ref(),
            self.style.min_resize_width,
        ));
        self.block_start = self.buffer.len();
        self.marks_on_base = 0;
        self.last_was_object = false;
    }

    fn apply_command(&mut self, cmd: Command) {
        self.flush_block();
        match cmd {
            Command::Bold => self.flags.insert(StyleFlags::BOLD),
            Command::NoBold => self.flags.remove(StyleFlags::BOLD),
            Command::Italic => self.flags.insert(StyleFlags::ITALIC),
            Command::NoItalic => self.flags.remove(StyleFlags::ITALIC),
            Command::Underline => self.flags.insert(StyleFlags::UNDERLINE),
            Command::NoUnderline => self.flags.remove(StyleFlags::UNDERLINE),
            Command::LinkIndex(index) => self.link_index = index,
            Command::LinkText(url) => {
                // Past the cap, further link commands degrade to no-ops.
                if self.pushed.len() < MAX_LINKS {
                    self.pushed.push(Link {
                        target: url,
                        display: LinkDisplay::Full,
                    });
                    self.link_index = LINK_INDEX_SHIFT + self.pushed.len() as u16;
                }
            }
            Command::Color(color) => self.color = Some(color),
            Command::NoColor => self.color = None,
            Command::Skip { width, height } => {
                self.buffer.push('_');
                self.runs.push(Run::new_skip(
                    self.buffer.len() - 1,
                    width,
                    height,
                    self.link_index,
                ));
                self.block_start = self.buffer.len();
                self.sum_width += Fixed::from_int(width);
                self.marks_on_base = 0;
                self.last_was_object = true;
            }
        }
    }

    fn push_space(&mut self) {
        self.marks_on_base = 0;
        let collapse =
            self.last_was_object || self.buffer.last().is_none_or(|&b| b == ' ' || b == '\n');
        if !collapse {
            self.buffer.push(' ');
            self.sum_width += self.style.metrics.space_width();
        }
    }

    fn flush_block(&mut self) {
        if self.buffer.len() > self.block_start {
            self.runs.push(Run::new_text(
                &self.buffer,
                self.block_start,
                self.buffer.len() - self.block_start,
                self.flags,
                self.link_index,
                self.color,
                self.style.metrics.as_ref(),
                self.style.min_resize_width,
            ));
            self.block_start = self.buffer.len();
        }
    }

    fn finish(mut self, options: &ParseOptions) -> ParseOutput {
        // Renumber sentinel link indices to follow all explicit slots.
        let max_explicit = self
            .runs
            .iter()
            .map(|r| r.link_index)
            .filter(|&i| i > 0 && i < LINK_INDEX_SHIFT)
            .max()
            .unwrap_or(0);
        for run in &mut self.runs {
            if run.link_index >= LINK_INDEX_SHIFT {
                run.link_index = max_explicit + (run.link_index - LINK_INDEX_SHIFT);
            }
        }
        let mut links: Vec<Option<Link>> = vec![None; usize::from(max_explicit)];
        links.extend(self.pushed.into_iter().map(Some));

        let start_direction = if options.direction == Direction::Neutral {
            let first_paragraph = self
                .buffer
                .iter()
                .position(|&c| c == '\n')
                .unwrap_or(self.buffer.len());
            bidi::first_strong(&self.buffer[..first_paragraph])
        } else {
            options.direction
        };

        ParseOutput {
            buffer: self.buffer,
            runs: self.runs,
            links,
            start_direction,
        }
    }
}
