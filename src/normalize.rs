//! Text canonicalization applied to extracted content before storage.
//!
//! Every document body goes through [`normalize`] exactly once, at index
//! time, so stored text and query literals meet on the same form:
//!
//! 1. line breaks (`\r\n`, `\r`) unified to `\n`
//! 2. whitespace runs (including the unified line breaks) collapsed to a
//!    single ASCII space
//! 3. full-width digits `０`-`９` folded to ASCII `0`-`9`
//! 4. `〜` (U+301C) replaced with `～` (U+FF5E), `−` (U+2212) with `-`
//! 5. leading and trailing whitespace trimmed
//!
//! Other full-width/half-width pairs (letters, katakana) are left as-is;
//! matching on those is the searcher's problem, not the normalizer's.

/// Canonicalizes extracted text. Returns an empty string for
/// whitespace-only input.
pub fn normalize(raw: &str) -> String {
    let unified = raw.replace("\r\n", "\n").replace('\r', "\n");
    let collapsed = unified.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.chars().map(fold_char).collect()
}

fn fold_char(c: char) -> char {
    match c {
        // Full-width digits share a contiguous block, U+FF10..=U+FF19.
        '\u{FF10}'..='\u{FF19}' => {
            char::from_u32(c as u32 - 0xFF10 + '0' as u32).unwrap_or(c)
        }
        '\u{301C}' => '\u{FF5E}',
        '\u{2212}' => '-',
        _ => c,
    }
}
