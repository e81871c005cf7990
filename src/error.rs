//! Error types for richtext.
//!
//! The layout and hit-testing paths never fail: malformed markup degrades to
//! literal text and out-of-range queries clamp. Errors only surface at
//! explicit construction boundaries (color literals, command encoding,
//! link-slot assignment).

use std::fmt;

/// Result type alias for richtext operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by construction-boundary operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Invalid color format (e.g., malformed hex string).
    InvalidColor(String),
    /// A link URL exceeds the command-encoding length cap.
    UrlTooLong { len: usize, max: usize },
    /// `set_link` was called with an index outside the explicit-slot range.
    LinkIndexOutOfRange { index: usize, slots: usize },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidColor(s) => write!(f, "invalid color format: {s}"),
            Self::UrlTooLong { len, max } => {
                write!(f, "link URL of {len} characters exceeds the {max} character cap")
            }
            Self::LinkIndexOutOfRange { index, slots } => {
                write!(f, "link index {index} out of range (document has {slots} explicit slots)")
            }
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::UrlTooLong { len: 5000, max: 4096 };
        assert!(err.to_string().contains("5000"));
        assert!(err.to_string().contains("4096"));

        let err = Error::InvalidColor("#zzz".into());
        assert!(err.to_string().contains("#zzz"));

        let err = Error::LinkIndexOutOfRange { index: 3, slots: 1 };
        assert!(err.to_string().contains('3'));
    }

    #[test]
    fn test_error_is_std_error() {
        fn assert_std_error<E: std::error::Error>(_: &E) {}
        assert_std_error(&Error::InvalidColor(String::new()));
    }
}
