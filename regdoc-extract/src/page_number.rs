//! Human-visible page number recovery.
//!
//! Regulatory PDFs carry front matter (cover, table of contents) that shifts
//! the physical page index relative to the printed page number an author
//! cites. Recovering the printed number lets citations read "p.12" instead of
//! the physical index "p.16".

use std::sync::LazyLock;

use regex::Regex;

static PAGE_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*page\s+(\d+)\s*$").unwrap());
static PAGE_OF_PAGES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d+)\s*/\s*\d+\s*$").unwrap());
static DASHED_FOOTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*-\s*(\d+)\s*-\s*$").unwrap());
static ISOLATED_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*(\d+)\s*$").unwrap());

/// Scans the first and last three non-empty lines of a page's text for one of
/// the recognized page-number patterns, in priority order. Returns the first
/// match across all scanned lines.
#[must_use]
pub fn recover(text: &str) -> Option<u32> {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.is_empty() {
        return None;
    }

    let tail_start = lines.len().saturating_sub(3);
    let candidates: Vec<&str> = lines[..lines.len().min(3)]
        .iter()
        .chain(lines[tail_start..].iter())
        .copied()
        .collect();

    for pattern in [&*PAGE_WORD, &*PAGE_OF_PAGES, &*DASHED_FOOTER, &*ISOLATED_NUMBER] {
        for line in &candidates {
            if let Some(caps) = pattern.captures(line)
                && let Some(n) = caps.get(1)
                && let Ok(value) = n.as_str().parse::<u32>()
            {
                return Some(value);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_page_word() {
        assert_eq!(recover("Introduction\n...\nPage 12"), Some(12));
        assert_eq!(recover("PAGE 7\nbody text"), Some(7));
    }

    #[test]
    fn recovers_page_of_pages() {
        assert_eq!(recover("body\nmore body\n3/45"), Some(3));
    }

    #[test]
    fn recovers_dashed_footer() {
        assert_eq!(recover("body\n- 9 -"), Some(9));
    }

    #[test]
    fn recovers_isolated_numeric_line() {
        assert_eq!(recover("Article 1\nbody\n14"), Some(14));
    }

    #[test]
    fn returns_none_when_no_pattern_matches() {
        assert_eq!(recover("just some prose\nwith no footer"), None);
    }

    #[test]
    fn priority_favors_page_word_over_isolated_number() {
        // "Page 12" on the first line should win even though a later line is a bare number.
        assert_eq!(recover("Page 12\nbody\n999"), Some(12));
    }

    #[test]
    fn only_scans_first_and_last_three_lines() {
        let mut lines = vec!["header"];
        lines.extend(std::iter::repeat_n("filler line", 10));
        lines.push("body");
        let text = lines.join("\n");
        assert_eq!(recover(&text), None);
    }
}
