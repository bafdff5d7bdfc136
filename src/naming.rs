//! Folder-name to movie-title extraction rules.
//!
//! The rules run in a fixed order and the first match wins. Each matcher is a
//! standalone function returning `Option` so the precedence stays explicit and
//! each rule is testable on its own.

/// Release-format tokens recognized inside a parenthesized segment.
///
/// Recognition is informational only: any complete parenthesized segment
/// triggers the cut, with or without a known token (the title before a plain
/// `(2019)` is still the title). The token is surfaced so callers can log what
/// kind of suffix was stripped.
pub const RELEASE_FORMAT_MARKERS: [&str; 4] = ["blu-ray", "bluray", "dvd", "rip"];

/// Literal rating-suffix marker, as in `Whiplash - 7of10 Extended`.
pub const RATING_MARKER: &str = "of10";

/// Outcome of the parenthetical rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentheticalMatch {
    /// Trimmed text before the first `(`. May be empty.
    pub title: String,
    /// First release-format token found in any parenthesized segment.
    pub recognized_marker: Option<&'static str>,
}

/// Rule 1: cut at the first parenthesized segment.
///
/// Matches when the name has at least one character before its first `(` and a
/// `)` somewhere after it. The returned title may trim down to empty; that
/// still counts as a match and the caller drops the record.
pub fn parenthetical_title(name: &str) -> Option<ParentheticalMatch> {
    let open = name.find('(')?;
    if open == 0 {
        return None;
    }
    name[open..].find(')')?;
    Some(ParentheticalMatch {
        title: name[..open].trim().to_string(),
        recognized_marker: recognized_release_marker(name),
    })
}

/// Rule 2: strip a trailing `- <N>of10` rating suffix.
///
/// Matches the earliest `-` that is followed (after optional whitespace) by
/// one or more digits and the literal `of10`, case-insensitively. Anything
/// after the marker is discarded.
pub fn rating_suffix_title(name: &str) -> Option<String> {
    for (position, ch) in name.char_indices() {
        if ch != '-' || position == 0 {
            continue;
        }
        let rest = name[position + 1..].trim_start();
        let digit_count = rest.chars().take_while(char::is_ascii_digit).count();
        if digit_count == 0 {
            continue;
        }
        if starts_with_ignore_case(&rest[digit_count..], RATING_MARKER) {
            return Some(name[..position].trim().to_string());
        }
    }
    None
}

/// Derives the clean movie title from a folder name.
///
/// Applies [`parenthetical_title`] then [`rating_suffix_title`]; names that
/// match neither rule pass through trimmed. Deterministic, never rejects. An
/// empty result means the folder carries no usable title and should be
/// skipped by the caller.
pub fn clean_title(folder_name: &str) -> String {
    if let Some(matched) = parenthetical_title(folder_name) {
        return matched.title;
    }
    if let Some(title) = rating_suffix_title(folder_name) {
        return title;
    }
    folder_name.trim().to_string()
}

/// Replaces characters that are illegal in file names with `_`, producing the
/// stem used for downloaded poster and icon artifacts.
pub fn safe_file_stem(title: &str) -> String {
    title
        .chars()
        .map(|ch| match ch {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            other => other,
        })
        .collect()
}

fn recognized_release_marker(name: &str) -> Option<&'static str> {
    let lowered = name.to_ascii_lowercase();
    let mut rest = lowered.as_str();
    while let Some(open) = rest.find('(') {
        let Some(close) = rest[open..].find(')') else {
            break;
        };
        let segment = &rest[open + 1..open + close];
        for marker in RELEASE_FORMAT_MARKERS {
            if segment.contains(marker) {
                return Some(marker);
            }
        }
        rest = &rest[open + close + 1..];
    }
    None
}

fn starts_with_ignore_case(value: &str, prefix: &str) -> bool {
    value
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

#[cfg(test)]
mod tests {
    use super::{
        clean_title, parenthetical_title, rating_suffix_title, safe_file_stem, ParentheticalMatch,
    };

    #[test]
    fn test_parenthetical_cuts_at_first_segment() {
        let matched = parenthetical_title("Inception (2010) (Bluray Rip)").unwrap();
        assert_eq!(
            matched,
            ParentheticalMatch {
                title: "Inception".to_string(),
                recognized_marker: Some("bluray"),
            }
        );
    }

    #[test]
    fn test_parenthetical_matches_without_known_marker() {
        let matched = parenthetical_title("Arrival (2016)").unwrap();
        assert_eq!(matched.title, "Arrival");
        assert_eq!(matched.recognized_marker, None);
    }

    #[test]
    fn test_parenthetical_recognizes_marker_variants() {
        for (name, marker) in [
            ("Heat (Blu-Ray)", "blu-ray"),
            ("Heat (DVD 2005)", "dvd"),
            ("Heat (WebRip)", "rip"),
        ] {
            let matched = parenthetical_title(name).unwrap();
            assert_eq!(matched.recognized_marker, Some(marker), "{name}");
        }
    }

    #[test]
    fn test_parenthetical_requires_text_before_and_a_close() {
        assert_eq!(parenthetical_title("(Bluray)"), None);
        assert_eq!(parenthetical_title("Name (unclosed"), None);
    }

    #[test]
    fn test_parenthetical_match_can_trim_to_empty() {
        let matched = parenthetical_title(" (2010)").unwrap();
        assert_eq!(matched.title, "");
    }

    #[test]
    fn test_rating_suffix_strips_marker_and_trailing_text() {
        assert_eq!(
            rating_suffix_title("Whiplash - 7of10 Extended"),
            Some("Whiplash".to_string())
        );
        assert_eq!(rating_suffix_title("X-5of10"), Some("X".to_string()));
        assert_eq!(
            rating_suffix_title("Seven - 10of10"),
            Some("Seven".to_string())
        );
    }

    #[test]
    fn test_rating_suffix_requires_digits_then_literal() {
        assert_eq!(rating_suffix_title("Whiplash - of10"), None);
        assert_eq!(rating_suffix_title("Whiplash - 7 of10"), None);
        assert_eq!(rating_suffix_title("Whiplash - 7of9"), None);
    }

    #[test]
    fn test_clean_title_rule_order() {
        // Rule 1 runs first even when a rating suffix precedes the segment.
        assert_eq!(
            clean_title("Movie - 10of10 (Director's Cut)"),
            "Movie - 10of10"
        );
        assert_eq!(clean_title("Whiplash - 7of10 Extended"), "Whiplash");
        assert_eq!(clean_title("  plainfolder  "), "plainfolder");
    }

    #[test]
    fn test_clean_title_is_idempotent() {
        for name in [
            "Inception (2010) (Bluray Rip)",
            "Whiplash - 7of10 Extended",
            "plainfolder",
            "Name (unclosed",
        ] {
            let once = clean_title(name);
            assert_eq!(clean_title(&once), once, "{name}");
        }
    }

    #[test]
    fn test_safe_file_stem_replaces_illegal_characters() {
        assert_eq!(safe_file_stem("A/B\\C:D*E?F\"G<H>I|J"), "A_B_C_D_E_F_G_H_I_J");
        assert_eq!(safe_file_stem("Inception"), "Inception");
    }
}
