//! Protocol and top-level-domain allow-lists for link detection.
//!
//! Absence from the TLD set makes a domain-looking substring plain text,
//! not a link: false negatives are preferred over false-positive
//! highlighting. The validator is built once by the embedder and passed by
//! reference into parsing; nothing here is global or mutable afterwards.

use std::collections::HashSet;

const PROTOCOLS: &[&str] = &["itmss", "http", "https", "ftp", "tg"];

const TOP_DOMAINS: &[&str] = &[
    // generic
    "com", "net", "org", "edu", "gov", "mil", "int", "biz", "info", "mobi", "name", "tel",
    "aero", "asia", "cat", "coop", "jobs", "museum", "pro", "travel", "xxx", "arpa",
    // country code
    "ac", "ad", "ae", "af", "ag", "ai", "al", "am", "ao", "ar", "as", "at", "au", "aw", "az",
    "ba", "bb", "bd", "be", "bf", "bg", "bh", "bi", "bj", "bm", "bn", "bo", "br", "bs", "bt",
    "bw", "by", "bz", "ca", "cc", "cd", "cf", "cg", "ch", "ci", "ck", "cl", "cm", "cn", "co",
    "cr", "cu", "cv", "cx", "cy", "cz", "de", "dj", "dk", "dm", "do", "dz", "ec", "ee", "eg",
    "er", "es", "et", "eu", "fi", "fj", "fk", "fm", "fo", "fr", "ga", "gd", "ge", "gf", "gg",
    "gh", "gi", "gl", "gm", "gn", "gp", "gq", "gr", "gs", "gt", "gu", "gw", "gy", "hk", "hm",
    "hn", "hr", "ht", "hu", "id", "ie", "il", "im", "in", "io", "iq", "ir", "is", "it", "je",
    "jm", "jo", "jp", "ke", "kg", "kh", "ki", "km", "kn", "kp", "kr", "kw", "ky", "kz", "la",
    "lb", "lc", "li", "lk", "lr", "ls", "lt", "lu", "lv", "ly", "ma", "mc", "md", "me", "mg",
    "mh", "mk", "ml", "mm", "mn", "mo", "mp", "mq", "mr", "ms", "mt", "mu", "mv", "mw", "mx",
    "my", "mz", "na", "nc", "ne", "nf", "ng", "ni", "nl", "no", "np", "nr", "nu", "nz", "om",
    "pa", "pe", "pf", "pg", "ph", "pk", "pl", "pm", "pn", "pr", "ps", "pt", "pw", "py", "qa",
    "re", "ro", "rs", "ru", "rw", "sa", "sb", "sc", "sd", "se", "sg", "sh", "si", "sk", "sl",
    "sm", "sn", "so", "sr", "ss", "st", "su", "sv", "sx", "sy", "sz", "tc", "td", "tf", "tg",
    "th", "tj", "tk", "tl", "tm", "tn", "to", "tr", "tt", "tv", "tw", "tz", "ua", "ug", "uk",
    "us", "uy", "uz", "va", "vc", "ve", "vg", "vi", "vn", "vu", "wf", "ws", "ye", "yt", "za",
    "zm", "zw",
    // newer generic
    "dev", "app", "online", "site", "store", "tech", "xyz", "club", "live", "blog", "shop",
    "media", "news", "agency", "email", "space", "website", "top", "design", "wiki", "chat",
    // internationalized
    "рф", "xn--p1ai",
];

/// Immutable protocol/TLD allow-lists consulted during link detection.
#[derive(Clone, Debug)]
pub struct LinkValidator {
    protocols: HashSet<String>,
    top_domains: HashSet<String>,
}

impl LinkValidator {
    /// Build the default allow-lists.
    #[must_use]
    pub fn new() -> Self {
        Self {
            protocols: PROTOCOLS.iter().map(|s| (*s).to_string()).collect(),
            top_domains: TOP_DOMAINS.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    /// Add extra protocols (lower-cased) to the allow-list.
    #[must_use]
    pub fn with_protocols<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.protocols
            .extend(extra.into_iter().map(|s| s.as_ref().to_lowercase()));
        self
    }

    /// Add extra top-level domains (lower-cased) to the allow-list.
    #[must_use]
    pub fn with_top_domains<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.top_domains
            .extend(extra.into_iter().map(|s| s.as_ref().to_lowercase()));
        self
    }

    /// Whether `name` (case-insensitive) is an allowed scheme.
    #[must_use]
    pub fn is_valid_protocol(&self, name: &str) -> bool {
        self.protocols.contains(&name.to_lowercase())
    }

    /// Whether `name` (case-insensitive) is an allowed top-level domain.
    #[must_use]
    pub fn is_valid_top_domain(&self, name: &str) -> bool {
        self.top_domains.contains(&name.to_lowercase())
    }
}

impl Default for LinkValidator {
    fn default() -> Self {
        Self::new()
    }
}
