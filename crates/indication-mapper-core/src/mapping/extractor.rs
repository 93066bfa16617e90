//! Indication statement extraction from label text.
//!
//! Handles:
//! - Section headers ("1 INDICATIONS AND USAGE", "1.1 Indication")
//! - Bare section markers, bullets and hyphens
//! - Numeric prefixes ("1.2 COPD" → "COPD")

/// Glyphs treated as bare list markers.
const BULLET_GLYPHS: &[&str] = &["-", "•", "·", "*", "–", "—", "○", "▪"];

/// Split raw indication text into candidate statements.
///
/// Order is preserved and duplicates are kept.
pub fn extract_statements(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| !is_section_header(line))
        .filter(|line| !is_bare_marker(line))
        .map(|line| strip_section_prefix(line).to_string())
        .filter(|line| !line.is_empty())
        .collect()
}

/// Split a section number ("1", "1.2") off the front of a line.
///
/// Returns the number and the remainder, or `None` if the line does not start
/// with digits.
fn split_section_number(line: &str) -> Option<(&str, &str)> {
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }

    let mut end = digits;
    let rest = &line[digits..];
    if let Some(after_dot) = rest.strip_prefix('.') {
        let sub_digits = after_dot.chars().take_while(|c| c.is_ascii_digit()).count();
        if sub_digits > 0 {
            end += 1 + sub_digits;
        }
    }

    Some((&line[..end], &line[end..]))
}

/// A numbered line whose first word is "INDICATION" or "INDICATIONS".
fn is_section_header(line: &str) -> bool {
    let Some((_, rest)) = split_section_number(line) else {
        return false;
    };
    if !rest.starts_with(char::is_whitespace) {
        return false;
    }

    match rest.split_whitespace().next() {
        Some(word) => {
            let word = word.to_uppercase();
            word == "INDICATION" || word == "INDICATIONS"
        }
        None => false,
    }
}

/// A line made only of a section number, a bullet glyph or a hyphen.
fn is_bare_marker(line: &str) -> bool {
    if BULLET_GLYPHS.contains(&line) {
        return true;
    }

    match split_section_number(line) {
        Some((_, rest)) => rest.trim_matches(|c| c == '.' || c == ')').is_empty(),
        None => false,
    }
}

/// Remove a leading "1 " / "1.2 " / "1. " / "2) " section number.
fn strip_section_prefix(line: &str) -> &str {
    let Some((_, rest)) = split_section_number(line) else {
        return line;
    };
    let rest = rest.trim_start_matches(|c| c == '.' || c == ')');
    if rest.starts_with(char::is_whitespace) {
        rest.trim_start()
    } else {
        line
    }
}
