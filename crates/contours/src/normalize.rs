//! Accent- and case-insensitive text folding.
//!
//! The same function is applied to queries and to dataset names, so matching
//! is symmetric: `normalize("Fléville") == normalize("FLEVILLE")`.

use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

/// Fold `input` to a comparison key.
///
/// Canonical decomposition (NFD) splits accented letters into a base letter
/// and combining marks, which are dropped. Ligatures that have no
/// decomposition are expanded, the result is lowercased, trimmed, and inner
/// whitespace runs collapse to a single space.
pub fn normalize(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_space = false;

    for c in input.nfd().filter(|c| !is_combining_mark(*c)) {
        if c.is_whitespace() {
            pending_space = !out.is_empty();
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        match c {
            'œ' | 'Œ' => out.push_str("oe"),
            'æ' | 'Æ' => out.push_str("ae"),
            'ß' => out.push_str("ss"),
            _ => out.extend(c.to_lowercase()),
        }
    }
    out
}
