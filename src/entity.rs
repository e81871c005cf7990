//! Link pre-scan: find URL and email candidates in raw input.
//!
//! Runs over the whole raw string before the main tokenizer pass,
//! independent of markup commands (candidates that fall inside a command
//! sequence are discarded). A candidate needs a domain shape (optional
//! scheme, one to five dotted labels, a 2-22 character top label) and is
//! then gated by the [`LinkValidator`]: a present scheme must be on the
//! protocol allow-list; with no scheme the top label must be a known TLD.
//! URLs extend rightward past balanced brackets with trailing sentence
//! punctuation stripped; a preceding `@` with a mail local-part behind it
//! turns the candidate into an email instead.

use crate::chars;
use crate::command;
use crate::validator::LinkValidator;

/// Longest accepted mail local-part, in scalars.
const MAX_MAIL_NAME: usize = 256;

/// What a candidate was classified as.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkKind {
    Url,
    Email,
}

/// One detected link range over the raw input, `[start, end)` in scalars.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkCandidate {
    pub start: usize,
    pub end: usize,
    pub kind: LinkKind,
    /// Whether the text already carries an explicit scheme.
    pub has_scheme: bool,
}

struct DomainMatch {
    /// Scheme start if present, else domain start.
    start: usize,
    domain_start: usize,
    /// Start of the top-level label.
    top_start: usize,
    /// Just past the top-level label.
    top_end: usize,
    /// Just past the domain, including an explicit port.
    domain_end: usize,
    scheme: Option<String>,
}

/// Scan `raw` for link candidates, in order, non-overlapping.
pub fn scan_links(raw: &[char], validator: &LinkValidator, rich: bool) -> Vec<LinkCandidate> {
    let cmd_ranges = if rich { command_ranges(raw) } else { Vec::new() };
    let mut out = Vec::new();
    let mut pos = 0;

    while let Some(m) = find_domain(raw, pos) {
        // Candidates inside a passed-over command sequence are not links.
        if let Some(&(_, cmd_end)) = cmd_ranges
            .iter()
            .find(|&&(s, e)| s < m.domain_end && m.start < e)
        {
            pos = cmd_end.max(m.domain_end);
            continue;
        }

        let top: String = raw[m.top_start..m.top_end].iter().collect();

        // Email: domain directly preceded by `@` with a local-part behind it.
        if m.scheme.is_none() && m.domain_start > 0 && raw[m.domain_start - 1] == '@' {
            let at = m.domain_start - 1;
            let mut local = at;
            while local > 0 && at - local < MAX_MAIL_NAME && chars::is_mail_name_char(raw[local - 1])
            {
                local -= 1;
            }
            if local < at {
                if validator.is_valid_top_domain(&top) {
                    out.push(LinkCandidate {
                        start: local,
                        end: m.domain_end,
                        kind: LinkKind::Email,
                        has_scheme: false,
                    });
                }
                pos = m.domain_end;
                continue;
            }
        }

        let scheme_ok = m
            .scheme
            .as_deref()
            .is_none_or(|s| validator.is_valid_protocol(s));
        let domain_ok = m.scheme.is_some() || validator.is_valid_top_domain(&top);
        if !scheme_ok || !domain_ok {
            pos = m.domain_end;
            continue;
        }

        let end = extend_url(raw, m.domain_end);
        out.push(LinkCandidate {
            start: m.start,
            end,
            kind: LinkKind::Url,
            has_scheme: m.scheme.is_some(),
        });
        pos = end;
    }

    out
}

/// Spans covered by well-formed command sequences, in order.
fn command_ranges(raw: &[char]) -> Vec<(usize, usize)> {
    let mut ranges = Vec::new();
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == command::COMMAND_CHAR {
            if let Some(end) = command::command_span(raw, i) {
                ranges.push((i, end));
                i = end;
                continue;
            }
        }
        i += 1;
    }
    ranges
}

/// Extend a URL candidate past its domain: only when the domain is followed
/// by a path or query introducer, with bracket balancing, then trailing
/// sentence punctuation stripped.
fn extend_url(raw: &[char], domain_end: usize) -> usize {
    if !matches!(raw.get(domain_end), Some('/' | '?')) {
        return domain_end;
    }
    let mut stack: Vec<char> = Vec::new();
    let mut p = domain_end;
    while p < raw.len() {
        let ch = raw[p];
        if chars::is_link_end(ch) {
            break;
        }
        match ch {
            '(' => stack.push(')'),
            '[' => stack.push(']'),
            '{' => stack.push('}'),
            '<' => stack.push('>'),
            ')' | ']' | '}' | '>' => {
                if stack.pop() != Some(ch) {
                    break;
                }
            }
            _ => {}
        }
        p += 1;
    }
    while p > domain_end && chars::is_almost_link_end(raw[p - 1]) {
        p -= 1;
    }
    p
}

/// Find the next domain-shaped substring at or after `from`.
fn find_domain(raw: &[char], from: usize) -> Option<DomainMatch> {
    let mut pos = from;
    while pos < raw.len() {
        let ch = raw[pos];
        if !chars::is_domain_label_char(ch) {
            pos += 1;
            continue;
        }
        // A match can only start where the preceding character does not
        // bind (mid-identifier, `%xx`, `key=value`).
        if pos > 0 && chars::is_link_lookbehind(raw[pos - 1]) {
            pos = skip_label_run(raw, pos);
            continue;
        }
        if let Some(m) = try_match(raw, pos) {
            return Some(m);
        }
        pos = skip_label_run(raw, pos);
    }
    None
}

fn skip_label_run(raw: &[char], pos: usize) -> usize {
    let mut p = pos;
    while p < raw.len() && chars::is_domain_label_char(raw[p]) {
        p += 1;
    }
    p.max(pos + 1)
}

fn try_match(raw: &[char], start: usize) -> Option<DomainMatch> {
    let mut i = start;

    // Optional scheme: ascii letters followed by "://".
    let mut scheme = None;
    let mut alpha = i;
    while alpha < raw.len() && raw[alpha].is_ascii_alphabetic() {
        alpha += 1;
    }
    if alpha > i && raw.get(alpha..alpha + 3) == Some(&[':', '/', '/']) {
        scheme = Some(raw[i..alpha].iter().collect::<String>().to_lowercase());
        i = alpha + 3;
    }
    let domain_start = i;

    // One to five dotted labels, then the top label.
    let mut labels = 0;
    loop {
        let run = count_while(raw, i, chars::is_domain_label_char);
        if run == 0 {
            break;
        }
        let dotted = raw.get(i + run) == Some(&'.')
            && raw
                .get(i + run + 1)
                .is_some_and(|&c| chars::is_domain_label_char(c));
        if dotted && labels < 5 {
            labels += 1;
            i += run + 1;
        } else {
            break;
        }
    }
    if labels == 0 {
        return None;
    }

    let top_start = i;
    let top_run = count_while(raw, i, chars::is_top_label_char);
    if !(2..=22).contains(&top_run) {
        return None;
    }
    // The top label must not continue as a longer identifier.
    if raw
        .get(i + top_run)
        .is_some_and(|&c| chars::is_domain_label_char(c))
    {
        return None;
    }

    // An explicit port belongs to the domain match itself.
    let top_end = i + top_run;
    let mut domain_end = top_end;
    if raw.get(domain_end) == Some(&':') {
        let digits = count_while(raw, domain_end + 1, |c| c.is_ascii_digit());
        if digits > 0 {
            domain_end += 1 + digits;
        }
    }

    Some(DomainMatch {
        start,
        domain_start,
        top_start,
        top_end,
        domain_end,
        scheme,
    })
}

fn count_while(raw: &[char], from: usize, pred: fn(char) -> bool) -> usize {
    raw[from.min(raw.len())..]
        .iter()
        .take_while(|&&c| pred(c))
        .count()
}
