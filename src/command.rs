//! Inline markup commands: tagged token stream, lexer and encoders.
//!
//! Rich input carries commands in-band: a private control character, a
//! one-character opcode, fixed-size operands, and the control character
//! again as terminator. [`Lexer`] turns that encoding into a stream of
//! [`Token`]s so the tokenizer never scans for sentinel bytes itself; a
//! malformed or truncated sequence degrades to an ordinary space.
//!
//! The encoders are the write side, used by the rich-markup pre-pass to
//! translate authoring tags into command sequences.

use crate::color::Rgba;
use crate::error::{Error, Result};

/// The private control character introducing and terminating a command.
pub const COMMAND_CHAR: char = '\u{0010}';

/// Longest URL accepted by the [`Command::LinkText`] encoder.
pub const MAX_URL_LEN: usize = 4096;

/// Largest link index a wire command may carry; values above are reserved
/// for parser-internal bookkeeping and rejected by the decoder.
pub(crate) const MAX_LINK_INDEX: u16 = 0x7FFF;

const CMD_BOLD: u32 = 0x01;
const CMD_NO_BOLD: u32 = 0x02;
const CMD_ITALIC: u32 = 0x03;
const CMD_NO_ITALIC: u32 = 0x04;
const CMD_UNDERLINE: u32 = 0x05;
const CMD_NO_UNDERLINE: u32 = 0x06;
const CMD_LINK_INDEX: u32 = 0x09;
const CMD_LINK_TEXT: u32 = 0x0A;
const CMD_COLOR: u32 = 0x0B;
const CMD_NO_COLOR: u32 = 0x0C;
const CMD_SKIP: u32 = 0x0D;

/// One decoded markup command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Bold,
    NoBold,
    Italic,
    NoItalic,
    Underline,
    NoUnderline,
    /// Point following text at an explicit link slot; 0 ends the link.
    LinkIndex(u16),
    /// Push a literal-URL link; following text belongs to it until
    /// `LinkIndex(0)`.
    LinkText(String),
    /// Foreground color override for following text.
    Color(Rgba),
    NoColor,
    /// Fixed-size opaque placeholder (one buffer position).
    Skip { width: i32, height: i32 },
}

impl Command {
    /// Append the in-band encoding of this command to `out`.
    ///
    /// # Errors
    /// [`Error::UrlTooLong`] when a `LinkText` URL exceeds [`MAX_URL_LEN`].
    pub fn encode_into(&self, out: &mut String) -> Result<()> {
        out.push(COMMAND_CHAR);
        match self {
            Self::Bold => out.push(operand(CMD_BOLD)),
            Self::NoBold => out.push(operand(CMD_NO_BOLD)),
            Self::Italic => out.push(operand(CMD_ITALIC)),
            Self::NoItalic => out.push(operand(CMD_NO_ITALIC)),
            Self::Underline => out.push(operand(CMD_UNDERLINE)),
            Self::NoUnderline => out.push(operand(CMD_NO_UNDERLINE)),
            Self::LinkIndex(index) => {
                out.push(operand(CMD_LINK_INDEX));
                out.push(operand(u32::from(*index)));
            }
            Self::LinkText(url) => {
                let len = url.chars().count();
                if len > MAX_URL_LEN {
                    out.pop();
                    return Err(Error::UrlTooLong {
                        len,
                        max: MAX_URL_LEN,
                    });
                }
                out.push(operand(CMD_LINK_TEXT));
                out.push(operand(len as u32));
                out.push_str(url);
            }
            Self::Color(color) => {
                out.push(operand(CMD_COLOR));
                out.push(operand(u32::from(color.r)));
                out.push(operand(u32::from(color.g)));
                out.push(operand(u32::from(color.b)));
                out.push(operand(u32::from(color.a)));
            }
            Self::NoColor => out.push(operand(CMD_NO_COLOR)),
            Self::Skip { width, height } => {
                out.push(operand(CMD_SKIP));
                out.push(operand((*width).max(0) as u32));
                out.push(operand((*height).max(0) as u32));
            }
        }
        out.push(COMMAND_CHAR);
        Ok(())
    }

    /// The in-band encoding of this command.
    ///
    /// # Errors
    /// [`Error::UrlTooLong`] when a `LinkText` URL exceeds [`MAX_URL_LEN`].
    pub fn encoded(&self) -> Result<String> {
        let mut out = String::new();
        self.encode_into(&mut out)?;
        Ok(out)
    }
}

/// Operand values are carried as single scalars; anything outside the
/// BMP-before-surrogates range cannot be encoded and clamps.
fn operand(v: u32) -> char {
    char::from_u32(v.min(0xD7FF)).unwrap_or(' ')
}

/// One lexed element of rich input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    Char(char),
    Command(Command),
}

/// Decode the command starting at `chars[start]` (which must be the
/// control character). Returns the command and the index just past its
/// terminator, or `None` if the sequence is malformed.
pub(crate) fn parse_command(chars: &[char], start: usize) -> Option<(Command, usize)> {
    let mut i = start;
    if chars.get(i) != Some(&COMMAND_CHAR) {
        return None;
    }
    i += 1;
    let opcode = u32::from(*chars.get(i)?);
    i += 1;

    let mut take = |n: usize| -> Option<Vec<u32>> {
        let vals: Vec<u32> = chars.get(i..i + n)?.iter().map(|&c| u32::from(c)).collect();
        i += n;
        Some(vals)
    };

    let command = match opcode {
        CMD_BOLD => Command::Bold,
        CMD_NO_BOLD => Command::NoBold,
        CMD_ITALIC => Command::Italic,
        CMD_NO_ITALIC => Command::NoItalic,
        CMD_UNDERLINE => Command::Underline,
        CMD_NO_UNDERLINE => Command::NoUnderline,
        CMD_LINK_INDEX => {
            let v = take(1)?[0];
            let index = u16::try_from(v).ok().filter(|&i| i <= MAX_LINK_INDEX)?;
            Command::LinkIndex(index)
        }
        CMD_LINK_TEXT => {
            let len = take(1)?[0] as usize;
            let url: String = chars.get(i..i + len)?.iter().collect();
            i += len;
            Command::LinkText(url)
        }
        CMD_COLOR => {
            let v = take(4)?;
            if v.iter().any(|&c| c > 255) {
                return None;
            }
            Command::Color(Rgba::rgba(v[0] as u8, v[1] as u8, v[2] as u8, v[3] as u8))
        }
        CMD_NO_COLOR => Command::NoColor,
        CMD_SKIP => {
            let v = take(2)?;
            Command::Skip {
                width: v[0] as i32,
                height: v[1] as i32,
            }
        }
        _ => return None,
    };

    if chars.get(i) != Some(&COMMAND_CHAR) {
        return None;
    }
    Some((command, i + 1))
}

/// Index just past the command at `start`, or `None` if malformed.
pub(crate) fn command_span(chars: &[char], start: usize) -> Option<usize> {
    parse_command(chars, start).map(|(_, end)| end)
}

/// Streaming lexer over rich input.
pub struct Lexer<'a> {
    chars: &'a [char],
    pos: usize,
    rich: bool,
}

impl<'a> Lexer<'a> {
    #[must_use]
    pub fn new(chars: &'a [char], rich: bool) -> Self {
        Self {
            chars,
            pos: 0,
            rich,
        }
    }

    /// Index of the next unread scalar.
    #[must_use]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Reposition the lexer (used when the tokenizer consumes a detected
    /// link or emoji sequence directly).
    pub fn seek(&mut self, pos: usize) {
        self.pos = pos.min(self.chars.len());
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        let &ch = self.chars.get(self.pos)?;
        if self.rich && ch == COMMAND_CHAR {
            if let Some((command, end)) = parse_command(self.chars, self.pos) {
                self.pos = end;
                return Some(Token::Command(command));
            }
            self.pos += 1;
            return Some(Token::Char(' '));
        }
        self.pos += 1;
        Some(Token::Char(ch))
    }
}
