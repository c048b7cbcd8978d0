//! Title cleanup used for search retries, and file-name folding for downloads.
//!
//! Retries only ever strip text; they never rewrite case or spelling, because the
//! catalog search is what does the fuzzy part of the matching.

use any_ascii::any_ascii;
use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

// ============================================================================
// REGEX PATTERNS
// ============================================================================

/// Featured artists: "(feat. Artist)", "(ft.Someone)", "[featuring X]".
/// Without a dot the keyword must be followed by whitespace, so "(Featherweight)" stays.
pub static FEAT_CLAUSE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s*[\(\[](?:(?:feat|ft)\.\s*|(?:featuring|feat|ft)\s+)[^)\]]*[\)\]]").unwrap()
});

/// Any bracketed group: "(Remix)", "[Live]", "(feat. X)"
pub static BRACKET_GROUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\(\[].*?[\)\]]").unwrap());

/// Regex to collapse multiple whitespace into single space
pub static MULTI_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").unwrap());

/// Characters that are not allowed in file names on at least one common platform.
pub static UNSAFE_FILE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[<>:"/\\|?*\x00-\x1F]"#).unwrap());

/// Longest file stem produced for a download, in characters.
pub const MAX_FILE_STEM_CHARS: usize = 150;

// ============================================================================
// TITLE VARIANTS
// ============================================================================

fn tidy(s: &str) -> String {
    MULTI_SPACE.replace_all(s, " ").trim().to_string()
}

/// Remove a featured-artist clause: "Track (feat. Other) [Live]" → "Track [Live]"
pub fn strip_feat(title: &str) -> String {
    tidy(&FEAT_CLAUSE.replace_all(title, ""))
}

/// Remove every bracketed group: "Track (feat. Other) [Live]" → "Track"
pub fn strip_brackets(title: &str) -> String {
    tidy(&BRACKET_GROUP.replace_all(title, ""))
}

/// Title forms to search with, in retry order: the original title, then the
/// feat-stripped and bracket-stripped forms when they differ from every earlier
/// form and are not empty.
pub fn title_variants(title: &str) -> Vec<String> {
    let mut variants = vec![title.to_string()];
    for variant in [strip_feat(title), strip_brackets(title)] {
        if !variant.is_empty() && !variants.contains(&variant) {
            variants.push(variant);
        }
    }
    variants
}

// ============================================================================
// FILE NAMES
// ============================================================================

/// Check if a character is a Unicode combining mark (diacritical mark).
pub fn is_combining_mark(c: char) -> bool {
    matches!(c as u32, 0x0300..=0x036F | 0x1AB0..=0x1AFF | 0x1DC0..=0x1DFF | 0xFE20..=0xFE2F)
}

/// Fold text to portable ASCII, keeping case: "Beyoncé" → "Beyonce".
pub fn fold_to_ascii(s: &str) -> String {
    let stripped: String = s.nfkd().filter(|c| !is_combining_mark(*c)).collect();
    any_ascii(&stripped)
}

/// File stem for a downloaded track: ASCII only, no path separators or reserved
/// characters, no leading/trailing dots or spaces, bounded length.
pub fn file_stem(artist: &str, title: &str) -> String {
    let folded = fold_to_ascii(&format!("{} - {}", artist, title));
    let cleaned = UNSAFE_FILE_CHARS.replace_all(&folded, "_");
    let collapsed = tidy(&cleaned);
    let bounded: String = collapsed.chars().take(MAX_FILE_STEM_CHARS).collect();
    let stem = bounded.trim_matches(|c: char| c == '.' || c.is_whitespace());
    if stem.is_empty() {
        "track".to_string()
    } else {
        stem.to_string()
    }
}

// ============================================================================
// TESTS
// ============================================================================
