//! 26.6 fixed-point arithmetic for sub-pixel text metrics.
//!
//! All cached advance widths, bearings and paddings are kept in [`Fixed`]
//! units (1/64 of a pixel) so that wrapped line widths match un-wrapped
//! natural widths bit-for-bit, with no float drift across layout passes.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

/// A sub-pixel length in 1/64 pixel units.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fixed(i32);

impl Fixed {
    /// Zero length.
    pub const ZERO: Self = Self(0);
    /// One pixel.
    pub const ONE: Self = Self(1 << Self::SHIFT);
    /// Largest representable length.
    pub const MAX: Self = Self(i32::MAX);

    const SHIFT: u32 = 6;

    /// A whole number of pixels.
    #[must_use]
    pub const fn from_int(pixels: i32) -> Self {
        Self(pixels << Self::SHIFT)
    }

    /// From raw 1/64 units.
    #[must_use]
    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    /// Raw value in 1/64 units.
    #[must_use]
    pub const fn raw(self) -> i32 {
        self.0
    }

    /// Round to the nearest whole pixel.
    #[must_use]
    pub const fn round(self) -> i32 {
        (self.0 + 32) >> Self::SHIFT
    }

    /// Largest whole pixel not above this length.
    #[must_use]
    pub const fn floor(self) -> i32 {
        self.0 >> Self::SHIFT
    }

    /// Smallest whole pixel not below this length.
    #[must_use]
    pub const fn ceil(self) -> i32 {
        (self.0 + 63) >> Self::SHIFT
    }

    /// True for lengths below zero (used by [`crate::run::Word`] to mark
    /// mid-grapheme fragments).
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Magnitude of the length.
    #[must_use]
    pub const fn abs(self) -> Self {
        Self(self.0.abs())
    }

    /// Halve, rounding toward negative infinity.
    #[must_use]
    pub const fn half(self) -> Self {
        Self(self.0 >> 1)
    }
}

impl From<i32> for Fixed {
    fn from(pixels: i32) -> Self {
        Self::from_int(pixels)
    }
}

impl Add for Fixed {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Fixed {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl Neg for Fixed {
    type Output = Self;
    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl AddAssign for Fixed {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl SubAssign for Fixed {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Mul<i32> for Fixed {
    type Output = Self;
    fn mul(self, rhs: i32) -> Self {
        Self(self.0.saturating_mul(rhs))
    }
}

impl Div<i32> for Fixed {
    type Output = Self;
    fn div(self, rhs: i32) -> Self {
        Self(self.0 / rhs)
    }
}

impl Sum for Fixed {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Debug for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fixed({})", f64::from(self.0) / 64.0)
    }
}

impl fmt::Display for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", f64::from(self.0) / 64.0)
    }
}
