//! Paragraph direction and restricted bidirectional reordering.
//!
//! A self-contained subset of UAX #9, sized for chat text: category lookup
//! comes from `unicode-bidi`, everything else operates on plain
//! `(category, level)` pairs. Emoji and skip-placeholder positions are
//! forced to the Common Separator category so objects never affect the
//! surrounding direction. The output is a contiguous `(start, end, level)`
//! item list per paragraph; within one wrapped line, visual order is the
//! standard reverse-each-odd-level-run reordering.

use unicode_bidi::{BidiClass, bidi_class};

/// Base paragraph direction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Direction {
    Ltr,
    Rtl,
    /// No strong character; the ambient UI direction applies.
    #[default]
    Neutral,
}

impl Direction {
    /// Substitute the ambient direction for `Neutral`.
    #[must_use]
    pub fn resolve(self, ambient: Self) -> Self {
        if self == Self::Neutral { ambient } else { self }
    }

    #[must_use]
    pub fn is_rtl(self) -> bool {
        self == Self::Rtl
    }

    /// Paragraph embedding level.
    #[must_use]
    pub fn base_level(self) -> u8 {
        u8::from(self.is_rtl())
    }
}

/// Maximal explicit embedding depth honored by [`itemize`].
pub const MAX_LEVEL: u8 = 61;

/// A level-tagged span of a paragraph, `[start, end)` in scalars.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BidiItem {
    pub start: usize,
    pub end: usize,
    /// Even = left-to-right, odd = right-to-left.
    pub level: u8,
}

/// First-strong-character direction of a paragraph slice.
#[must_use]
pub fn first_strong(chars: &[char]) -> Direction {
    for &ch in chars {
        match bidi_class(ch) {
            BidiClass::L => return Direction::Ltr,
            BidiClass::R | BidiClass::AL => return Direction::Rtl,
            _ => {}
        }
    }
    Direction::Neutral
}

/// Resolve embedding levels for one paragraph slice and group them into
/// items. `object[i]` marks positions covered by emoji/skip runs.
///
/// `base` must already be resolved (not `Neutral`).
#[must_use]
pub fn itemize(chars: &[char], object: &[bool], base: Direction) -> Vec<BidiItem> {
    let n = chars.len();
    if n == 0 {
        return Vec::new();
    }
    debug_assert_eq!(object.len(), n);

    let base_level = base.base_level();

    // Fast path: nothing at or above the first RTL block and an LTR base
    // means every level is 0.
    if !base.is_rtl() && chars.iter().all(|&c| u32::from(c) < 0x0590) {
        return vec![BidiItem {
            start: 0,
            end: n,
            level: 0,
        }];
    }

    let mut class: Vec<BidiClass> = (0..n)
        .map(|i| {
            if object[i] {
                BidiClass::CS
            } else {
                bidi_class(chars[i])
            }
        })
        .collect();
    let mut level = vec![base_level; n];

    resolve_explicit(&mut class, &mut level, base_level);
    resolve_weak(&mut class, base);
    resolve_neutral(&mut class, &level, base);
    resolve_implicit(&class, &mut level);

    // Removed embedding controls take the following level so items stay
    // contiguous.
    let mut next_level = base_level;
    for i in (0..n).rev() {
        if class[i] == BidiClass::BN {
            level[i] = next_level;
        } else {
            next_level = level[i];
        }
    }

    let mut items: Vec<BidiItem> = Vec::new();
    for (i, &lv) in level.iter().enumerate() {
        match items.last_mut() {
            Some(item) if item.level == lv => item.end = i + 1,
            _ => items.push(BidiItem {
                start: i,
                end: i + 1,
                level: lv,
            }),
        }
    }
    items
}

/// X1..X9: explicit embeddings and overrides. Control characters become
/// `BN` and are transparent from here on.
fn resolve_explicit(class: &mut [BidiClass], level: &mut [u8], base_level: u8) {
    let mut stack: Vec<(u8, Option<BidiClass>)> = Vec::new();
    let mut cur_level = base_level;
    let mut cur_override = None;

    for i in 0..class.len() {
        match class[i] {
            BidiClass::RLE | BidiClass::RLO | BidiClass::LRE | BidiClass::LRO => {
                let rtl = matches!(class[i], BidiClass::RLE | BidiClass::RLO);
                let next = if rtl {
                    (cur_level + 1) | 1
                } else {
                    (cur_level + 2) & !1
                };
                let over = match class[i] {
                    BidiClass::RLO => Some(BidiClass::R),
                    BidiClass::LRO => Some(BidiClass::L),
                    _ => None,
                };
                class[i] = BidiClass::BN;
                level[i] = cur_level;
                if next <= MAX_LEVEL {
                    stack.push((cur_level, cur_override));
                    cur_level = next;
                    cur_override = over;
                }
            }
            BidiClass::PDF => {
                class[i] = BidiClass::BN;
                level[i] = cur_level;
                if let Some((l, o)) = stack.pop() {
                    cur_level = l;
                    cur_override = o;
                }
            }
            // Isolates are out of the restricted subset; drop them.
            BidiClass::LRI | BidiClass::RLI | BidiClass::FSI | BidiClass::PDI => {
                class[i] = BidiClass::BN;
                level[i] = cur_level;
            }
            _ => {
                level[i] = cur_level;
                if let Some(over) = cur_override {
                    class[i] = over;
                }
            }
        }
    }
}

/// W1..W7 over the paragraph, with the base direction as sos/eos.
fn resolve_weak(class: &mut [BidiClass], base: Direction) {
    let sos = if base.is_rtl() {
        BidiClass::R
    } else {
        BidiClass::L
    };
    let idx: Vec<usize> = (0..class.len())
        .filter(|&i| class[i] != BidiClass::BN)
        .collect();

    // W1: combining marks take the class of their base.
    let mut prev = sos;
    for &i in &idx {
        if class[i] == BidiClass::NSM {
            class[i] = prev;
        }
        prev = class[i];
    }

    // W2: European digits after an Arabic strong type become Arabic.
    let mut strong = sos;
    for &i in &idx {
        match class[i] {
            BidiClass::L | BidiClass::R | BidiClass::AL => strong = class[i],
            BidiClass::EN if strong == BidiClass::AL => class[i] = BidiClass::AN,
            _ => {}
        }
    }

    // W3.
    for &i in &idx {
        if class[i] == BidiClass::AL {
            class[i] = BidiClass::R;
        }
    }

    // W4: single separators between matching digits join them.
    for w in 0..idx.len() {
        let i = idx[w];
        if w == 0 || w + 1 == idx.len() {
            continue;
        }
        let before = class[idx[w - 1]];
        let after = class[idx[w + 1]];
        match class[i] {
            BidiClass::ES if before == BidiClass::EN && after == BidiClass::EN => {
                class[i] = BidiClass::EN;
            }
            BidiClass::CS if before == BidiClass::EN && after == BidiClass::EN => {
                class[i] = BidiClass::EN;
            }
            BidiClass::CS if before == BidiClass::AN && after == BidiClass::AN => {
                class[i] = BidiClass::AN;
            }
            _ => {}
        }
    }

    // W5: terminator runs adjacent to European digits join them.
    let mut w = 0;
    while w < idx.len() {
        if class[idx[w]] != BidiClass::ET {
            w += 1;
            continue;
        }
        let run_start = w;
        while w < idx.len() && class[idx[w]] == BidiClass::ET {
            w += 1;
        }
        let before_en = run_start > 0 && class[idx[run_start - 1]] == BidiClass::EN;
        let after_en = w < idx.len() && class[idx[w]] == BidiClass::EN;
        if before_en || after_en {
            for &i in &idx[run_start..w] {
                class[i] = BidiClass::EN;
            }
        }
    }

    // W6: leftover separators/terminators are neutral.
    for &i in &idx {
        if matches!(class[i], BidiClass::ES | BidiClass::ET | BidiClass::CS) {
            class[i] = BidiClass::ON;
        }
    }

    // W7: European digits in a left context become L.
    let mut strong = sos;
    for &i in &idx {
        match class[i] {
            BidiClass::L | BidiClass::R => strong = class[i],
            BidiClass::EN if strong == BidiClass::L => class[i] = BidiClass::L,
            _ => {}
        }
    }
}

/// N1..N2: neutral runs take the surrounding direction when it agrees on
/// both sides, else the embedding direction.
fn resolve_neutral(class: &mut [BidiClass], level: &[u8], base: Direction) {
    let strength = |c: BidiClass| -> Option<BidiClass> {
        match c {
            BidiClass::L => Some(BidiClass::L),
            BidiClass::R | BidiClass::EN | BidiClass::AN => Some(BidiClass::R),
            _ => None,
        }
    };
    let is_neutral = |c: BidiClass| {
        matches!(
            c,
            BidiClass::ON | BidiClass::WS | BidiClass::B | BidiClass::S
        )
    };
    let sos = if base.is_rtl() {
        BidiClass::R
    } else {
        BidiClass::L
    };

    let idx: Vec<usize> = (0..class.len())
        .filter(|&i| class[i] != BidiClass::BN)
        .collect();
    let mut w = 0;
    while w < idx.len() {
        if !is_neutral(class[idx[w]]) {
            w += 1;
            continue;
        }
        let run_start = w;
        while w < idx.len() && is_neutral(class[idx[w]]) {
            w += 1;
        }
        let before = if run_start > 0 {
            strength(class[idx[run_start - 1]]).unwrap_or(sos)
        } else {
            sos
        };
        let after = if w < idx.len() {
            strength(class[idx[w]]).unwrap_or(sos)
        } else {
            sos
        };
        for &i in &idx[run_start..w] {
            class[i] = if before == after {
                before
            } else if level[i] & 1 == 1 {
                BidiClass::R
            } else {
                BidiClass::L
            };
        }
    }
}

/// I1..I2: bump levels by resolved class.
fn resolve_implicit(class: &[BidiClass], level: &mut [u8]) {
    for (i, &c) in class.iter().enumerate() {
        if c == BidiClass::BN {
            continue;
        }
        let lv = level[i];
        level[i] = if lv & 1 == 0 {
            match c {
                BidiClass::R => lv + 1,
                BidiClass::AN | BidiClass::EN => lv + 2,
                _ => lv,
            }
        } else {
            match c {
                BidiClass::L | BidiClass::AN | BidiClass::EN => lv + 1,
                _ => lv,
            }
        };
    }
}

/// Standard level-based reordering: the returned permutation maps visual
/// slots (left to right) to logical indices.
#[must_use]
pub fn visual_order(levels: &[u8]) -> Vec<usize> {
    let n = levels.len();
    let mut order: Vec<usize> = (0..n).collect();
    let Some(&max) = levels.iter().max() else {
        return order;
    };
    let min_odd = levels
        .iter()
        .copied()
        .filter(|l| l & 1 == 1)
        .min()
        .unwrap_or(max + 1);
    let mut lv = max;
    while lv >= min_odd && lv >= 1 {
        let mut i = 0;
        while i < n {
            if levels[i] >= lv {
                let start = i;
                while i < n && levels[i] >= lv {
                    i += 1;
                }
                order[start..i].reverse();
            } else {
                i += 1;
            }
        }
        lv -= 1;
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    fn levels(s: &str, base: Direction) -> Vec<u8> {
        let cs = chars(s);
        let object = vec![false; cs.len()];
        let items = itemize(&cs, &object, base);
        let mut out = vec![0; cs.len()];
        for item in items {
            for slot in &mut out[item.start..item.end] {
                *slot = item.level;
            }
        }
        out
    }

    #[test]
    fn test_first_strong() {
        assert_eq!(first_strong(&chars("hello")), Direction::Ltr);
        assert_eq!(first_strong(&chars("שלום")), Direction::Rtl);
        assert_eq!(first_strong(&chars("123 !")), Direction::Neutral);
        assert_eq!(first_strong(&chars("... שלום ok")), Direction::Rtl);
        assert_eq!(first_strong(&[]), Direction::Neutral);
    }

    #[test]
    fn test_pure_ltr_fast_path() {
        let cs = chars("hello, world");
        let items = itemize(&cs, &vec![false; cs.len()], Direction::Ltr);
        assert_eq!(
            items,
            vec![BidiItem {
                start: 0,
                end: cs.len(),
                level: 0
            }]
        );
    }

    #[test]
    fn test_pure_rtl() {
        let lv = levels("שלום", Direction::Rtl);
        assert!(lv.iter().all(|&l| l == 1));
    }

    #[test]
    fn test_mixed_ltr_base() {
        let lv = levels("abc שלום xyz", Direction::Ltr);
        assert_eq!(lv[0], 0);
        assert_eq!(lv[4], 1); // Hebrew
        assert_eq!(*lv.last().unwrap(), 0);
    }

    #[test]
    fn test_numbers_in_rtl() {
        // Digits inside RTL text get level 2.
        let lv = levels("של 123 ום", Direction::Rtl);
        assert_eq!(lv[4], 2);
        assert_eq!(lv[0], 1);
    }

    #[test]
    fn test_neutral_between_same_direction_joins() {
        let lv = levels("של - ום", Direction::Rtl);
        assert!(lv.iter().all(|&l| l == 1), "{lv:?}");
    }

    #[test]
    fn test_objects_are_direction_neutral() {
        // An "object" position inside RTL text keeps the RTL level.
        let cs = chars("של×ום");
        let mut object = vec![false; cs.len()];
        object[2] = true;
        let items = itemize(&cs, &object, Direction::Rtl);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].level, 1);
    }

    #[test]
    fn test_itemize_covers_slice_contiguously() {
        let cs = chars("abc שלום 12 xyz");
        let items = itemize(&cs, &vec![false; cs.len()], Direction::Ltr);
        assert_eq!(items[0].start, 0);
        assert_eq!(items.last().unwrap().end, cs.len());
        for pair in items.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
            assert_ne!(pair[0].level, pair[1].level);
        }
    }

    #[test]
    fn test_explicit_embedding_honored() {
        // RLO forces even latin letters to R levels.
        let s = "a\u{202E}bc\u{202C}d";
        let lv = levels(s, Direction::Ltr);
        assert_eq!(lv[0], 0);
        assert!(lv[2] & 1 == 1, "{lv:?}");
        assert_eq!(lv[5], 0);
    }

    #[test]
    fn test_visual_order_ltr_identity() {
        assert_eq!(visual_order(&[0, 0, 0]), vec![0, 1, 2]);
    }

    #[test]
    fn test_visual_order_reverses_odd_run() {
        assert_eq!(visual_order(&[0, 1, 1, 0]), vec![0, 2, 1, 3]);
        assert_eq!(visual_order(&[1, 1, 1]), vec![2, 1, 0]);
    }

    #[test]
    fn test_visual_order_nested_levels() {
        // RTL run containing an embedded number (level 2).
        assert_eq!(visual_order(&[1, 2, 2, 1]), vec![3, 1, 2, 0]);
    }
}
