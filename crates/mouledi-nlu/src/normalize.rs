//! Text canonicalization shared by the matchers.
//!
//! Two strengths exist on purpose: [`normalize`] folds accents and drops
//! punctuation for district lookup, while [`normalize_loose`] keeps accents
//! and punctuation so keyword tables can list accented surface forms.

use unicode_normalization::UnicodeNormalization;

/// Combining Diacritical Marks block, stripped after canonical decomposition.
const COMBINING_DIACRITICS: std::ops::RangeInclusive<char> = '\u{0300}'..='\u{036F}';

/// Lower-cases, folds accents, maps everything outside `[a-z0-9 ]` to a
/// space, collapses whitespace and trims.
///
/// Total and idempotent: `normalize(&normalize(x)) == normalize(x)`.
pub fn normalize(text: &str) -> String {
    let cleaned: String = text
        .to_lowercase()
        .nfd()
        .filter(|c| !COMBINING_DIACRITICS.contains(c))
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() {
                c
            } else {
                ' '
            }
        })
        .collect();

    collapse_whitespace(&cleaned)
}

/// Lower-cases, trims, collapses whitespace and unifies apostrophe variants.
///
/// Accents are kept.
pub fn normalize_loose(text: &str) -> String {
    collapse_whitespace(&text.to_lowercase()).replace('\u{2019}', "'")
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
