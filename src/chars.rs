//! Character classification used by the tokenizer, link scanner and
//! selection snapping.

use unicode_normalization::char::is_combining_mark;

/// Code points dropped outright during normalization: NUL, the legacy
/// line/paragraph separator block, stray variation selectors (VS16 kept
/// for emoji folding) and C1 controls.
pub(crate) fn is_bad(ch: char) -> bool {
    let c = u32::from(ch);
    c == 0
        || (8232..8237).contains(&c)
        || (65024..65040).contains(&c) && c != 65039
        || (127..160).contains(&c) && c != 156
}

/// Space-like characters that collapse into a single space.
pub(crate) fn is_space_like(ch: char) -> bool {
    ch.is_whitespace()
        || u32::from(ch) < 32
        || ch == '\u{2029}' // paragraph separator
        || ch == '\u{2028}' // line separator
        || ch == '\u{FFFC}' // object replacement
        || ch == '\u{00AD}' // soft hyphen
}

/// Explicit newline, the paragraph boundary.
pub(crate) fn is_newline(ch: char) -> bool {
    ch == '\n'
}

/// Trimmable from line ends: whitespace and dropped characters.
pub(crate) fn is_trimmable(ch: char) -> bool {
    is_space_like(ch) || is_bad(ch)
}

/// Non-spacing combining mark.
pub(crate) fn is_mark(ch: char) -> bool {
    is_combining_mark(ch)
}

/// Hard terminator for a URL being extended past its domain.
pub(crate) fn is_link_end(ch: char) -> bool {
    ch == crate::command::COMMAND_CHAR || is_bad(ch) || is_space_like(ch) || is_newline(ch)
}

/// Trailing sentence punctuation stripped from a detected URL.
pub(crate) fn is_almost_link_end(ch: char) -> bool {
    matches!(ch, '?' | ',' | '.' | '"' | ':' | '!' | '\'')
}

/// Word boundary for word-granularity selection snapping.
pub(crate) fn is_word_separator(ch: char) -> bool {
    is_space_like(ch)
        || is_newline(ch)
        || matches!(
            ch,
            '.' | ','
                | '?'
                | '!'
                | '@'
                | '#'
                | '$'
                | ':'
                | ';'
                | '-'
                | '<'
                | '>'
                | '['
                | ']'
                | '('
                | ')'
                | '{'
                | '}'
                | '='
                | '/'
                | '+'
                | '%'
                | '&'
                | '^'
                | '*'
                | '\''
                | '"'
                | '`'
                | '~'
                | '|'
        )
}

/// Paragraph boundary for paragraph-granularity selection snapping.
pub(crate) fn is_paragraph_separator(ch: char) -> bool {
    is_newline(ch)
}

/// Characters allowed in a non-final domain label.
pub(crate) fn is_domain_label_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '-' || ch == '_'
}

/// Characters allowed in the top-level label (2..=22 of them).
pub(crate) fn is_top_label_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '-'
}

/// Characters that, immediately before a candidate domain, suppress the
/// match (mid-identifier, percent-encoded or key=value positions).
pub(crate) fn is_link_lookbehind(ch: char) -> bool {
    ch.is_alphanumeric() || matches!(ch, '$' | '-' | '_' | '%' | '=')
}

/// Characters of a mail local-part, matched leftward from `@`.
pub(crate) fn is_mail_name_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.')
}
