//! RGBA color type for text and selection painting.
//!
//! Colors are stored as 8-bit components, matching the four one-byte
//! operands of the inline foreground-color markup command. Blending and
//! palette conversion are the paint surface's concern, not this crate's.
//!
//! # Examples
//!
//! ```
//! use richtext::Rgba;
//!
//! let ink = Rgba::BLACK;
//! let accent = Rgba::from_hex("#1a6aa8").unwrap();
//! assert_eq!(accent.r, 0x1a);
//! assert_eq!(ink.a, 255);
//! ```

use crate::error::{Error, Result};
use std::fmt;

/// RGBA color with u8 components.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    /// Create an opaque color from RGB components.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Create a color from RGBA components.
    #[must_use]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse a `#RGB`, `#RRGGBB` or `#RRGGBBAA` hex literal.
    ///
    /// The leading `#` is optional.
    pub fn from_hex(input: &str) -> Result<Self> {
        let hex = input.strip_prefix('#').unwrap_or(input);
        let invalid = || Error::InvalidColor(input.to_string());
        let byte = |s: &str| u8::from_str_radix(s, 16).map_err(|_| invalid());
        match hex.len() {
            3 => {
                let nibble = |s: &str| byte(s).map(|v| v * 17);
                Ok(Self::rgb(
                    nibble(&hex[0..1])?,
                    nibble(&hex[1..2])?,
                    nibble(&hex[2..3])?,
                ))
            }
            6 => Ok(Self::rgb(byte(&hex[0..2])?, byte(&hex[2..4])?, byte(&hex[4..6])?)),
            8 => Ok(Self::rgba(
                byte(&hex[0..2])?,
                byte(&hex[2..4])?,
                byte(&hex[4..6])?,
                byte(&hex[6..8])?,
            )),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 255 {
            write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}
