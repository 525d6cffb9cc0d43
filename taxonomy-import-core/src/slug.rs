//! URL-safe path segments derived from display names.
//!
//! The remote tree addresses folders by a slugged version of their name. When
//! the search index has not caught up with a folder we just created, the
//! resolver predicts the folder's path with [`slug`]. Once Discovery reports
//! the real path, that value wins.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Returned for names that contain nothing sluggable.
pub const PLACEHOLDER: &str = "unnamed";

/// Maps a display name to a lowercase ASCII path segment.
///
/// `"Älvsbyhus AB"` becomes `"alvsbyhus-ab"`, `""` becomes [`PLACEHOLDER`].
pub fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_dash = true; // swallows leading dashes

    for c in transliterate(&name.to_lowercase()).chars() {
        let c = if c.is_ascii_lowercase() || c.is_ascii_digit() {
            c
        } else {
            '-'
        };
        if c == '-' {
            if !last_dash {
                out.push('-');
            }
            last_dash = true;
        } else {
            out.push(c);
            last_dash = false;
        }
    }

    while out.ends_with('-') {
        out.pop();
    }

    if out.is_empty() {
        PLACEHOLDER.to_string()
    } else {
        out
    }
}

/// Closest-ASCII rendering: decompose, drop combining marks, expand ligatures.
fn transliterate(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.nfkd() {
        if is_combining_mark(c) {
            continue;
        }
        match c {
            'ß' => out.push_str("ss"),
            'æ' => out.push_str("ae"),
            'œ' => out.push_str("oe"),
            'þ' => out.push_str("th"),
            'ø' => out.push('o'),
            'ł' => out.push('l'),
            'đ' | 'ð' => out.push('d'),
            'ı' => out.push('i'),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_accents_and_lowercases() {
        assert_eq!(slug("Älvsbyhus AB"), "alvsbyhus-ab");
        assert_eq!(slug("Citroën C5 Aircross"), "citroen-c5-aircross");
    }

    #[test]
    fn accented_and_plain_names_agree() {
        assert_eq!(slug("Älvsbyhus AB"), slug("alvsbyhus-ab"));
    }

    #[test]
    fn collapses_and_trims_separators() {
        assert_eq!(slug("  --Pro  X!!  "), "pro-x");
        assert_eq!(slug("a___b...c"), "a-b-c");
    }

    #[test]
    fn empty_or_symbol_only_names_get_placeholder() {
        assert_eq!(slug(""), PLACEHOLDER);
        assert_eq!(slug("   "), PLACEHOLDER);
        assert_eq!(slug("?!*"), PLACEHOLDER);
    }

    #[test]
    fn expands_ligatures() {
        assert_eq!(slug("Straße"), "strasse");
        assert_eq!(slug("Ærø"), "aero");
    }

    #[test]
    fn output_is_restricted_alphabet() {
        for name in ["Škoda Octavia RS", "Mercedes-Benz E 300 de", "Ø 12/13", "日本"] {
            let s = slug(name);
            assert!(
                s.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'),
                "unexpected char in {s:?}"
            );
            assert!(!s.starts_with('-') && !s.ends_with('-') && !s.contains("--"), "{s:?}");
        }
    }
}
