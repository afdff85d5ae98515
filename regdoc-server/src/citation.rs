//! Citation sentinel extraction and validation (§4.10 step 4, §9).
//!
//! The sentinel form is `⟨cite id="C<i>"⟩<span>⟨/cite⟩`, chosen (per the
//! design notes) for its Unicode delimiters, which do not collide with the
//! literal angle brackets that show up in regulatory prose.

use std::sync::LazyLock;

use regex::Regex;

static SENTINEL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"(?s)⟨cite id="(C\d+)"⟩(.*?)⟨/cite⟩"#).expect("citation sentinel pattern is valid"));

/// One `⟨cite⟩` span found in the streamed text, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedCitation {
    pub id: String,
    pub span: String,
}

/// Scans `text` for every well-formed citation sentinel.
#[must_use]
pub fn extract(text: &str) -> Vec<ExtractedCitation> {
    SENTINEL
        .captures_iter(text)
        .map(|c| ExtractedCitation {
            id: c[1].to_string(),
            span: c[2].to_string(),
        })
        .collect()
}

/// Outcome of validating one extracted citation against its passage.
#[derive(Debug, Clone)]
pub enum Validation {
    /// The span occurs verbatim, or fuzzy-matches at or above the threshold.
    Accepted { fuzzy: bool },
    /// The referenced id does not correspond to a retrieved passage.
    UnknownId,
    /// The span matches neither verbatim nor within the fuzzy threshold.
    NoMatch,
}

/// Validates `citation.span` against `passage_content` (§4.10 step 4: exact
/// match ignoring outer whitespace, else LCS-ratio fuzzy match at
/// `fuzzy_accept`).
#[must_use]
pub fn validate(span: &str, passage_content: &str, fuzzy_accept: f32) -> Validation {
    if passage_content.contains(span.trim()) {
        return Validation::Accepted { fuzzy: false };
    }
    if best_window_ratio(span.trim(), passage_content) >= fuzzy_accept {
        return Validation::Accepted { fuzzy: true };
    }
    Validation::NoMatch
}

/// Longest-common-subsequence ratio (Ratcliff/Obershelp-style: `2*LCS /
/// (len(a)+len(b))`) between `a` and the best-aligned window of `b` of
/// approximately `a`'s length.
fn best_window_ratio(a: &str, b: &str) -> f32 {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    if a_chars.is_empty() || b_chars.is_empty() {
        return 0.0;
    }
    if b_chars.len() <= a_chars.len() {
        return lcs_ratio(&a_chars, &b_chars);
    }

    let window = a_chars.len();
    let step = (window / 4).max(1);
    let mut best = 0.0f32;
    let mut start = 0;
    while start + window <= b_chars.len() {
        best = best.max(lcs_ratio(&a_chars, &b_chars[start..start + window]));
        start += step;
    }
    let last_start = b_chars.len() - window;
    best.max(lcs_ratio(&a_chars, &b_chars[last_start..]))
}

fn lcs_ratio(a: &[char], b: &[char]) -> f32 {
    let lcs = lcs_length(a, b) as f32;
    #[allow(clippy::cast_precision_loss)]
    let denom = (a.len() + b.len()) as f32;
    if denom == 0.0 {
        0.0
    } else {
        2.0 * lcs / denom
    }
}

fn lcs_length(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for &ac in a {
        for (j, &bc) in b.iter().enumerate() {
            curr[j + 1] = if ac == bc { prev[j] + 1 } else { prev[j + 1].max(curr[j]) };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_a_single_well_formed_citation() {
        let text = r#"The rule requires ⟨cite id="C1"⟩a minimum ratio of 4.5%⟨/cite⟩ at all times."#;
        let found = extract(text);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "C1");
        assert_eq!(found[0].span, "a minimum ratio of 4.5%");
    }

    #[test]
    fn extracts_multiple_citations_in_order() {
        let text = r#"⟨cite id="C1"⟩first⟨/cite⟩ and ⟨cite id="C2"⟩second⟨/cite⟩"#;
        let found = extract(text);
        assert_eq!(found.iter().map(|c| c.id.as_str()).collect::<Vec<_>>(), vec!["C1", "C2"]);
    }

    #[test]
    fn verbatim_span_is_accepted_without_fuzzy_flag() {
        let passage = "The minimum CET1 ratio is 4.5%.";
        match validate("The minimum CET1 ratio is 4.5%.", passage, 0.90) {
            Validation::Accepted { fuzzy } => assert!(!fuzzy),
            other => panic!("expected acceptance, got {other:?}"),
        }
    }

    #[test]
    fn near_verbatim_span_is_accepted_as_fuzzy() {
        let passage = "The minimum CET1 ratio is 4.5 percent of risk-weighted assets.";
        match validate("The minimum CET1 ratio is 4.5% of risk weighted assets", passage, 0.80) {
            Validation::Accepted { fuzzy } => assert!(fuzzy),
            other => panic!("expected fuzzy acceptance, got {other:?}"),
        }
    }

    #[test]
    fn hallucinated_span_is_rejected() {
        let passage = "The minimum CET1 ratio is 4.5%.";
        match validate("The minimum CET1 ratio is 9.9%.", passage, 0.90) {
            Validation::NoMatch => {}
            other => panic!("expected no match, got {other:?}"),
        }
    }
}
