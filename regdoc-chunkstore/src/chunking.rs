//! Token-based hierarchical chunker (component C2, §4.2).

use std::sync::LazyLock;

use regdoc_extract::{ExtractedDocument, PAGE_SENTINEL_PREFIX, PAGE_SENTINEL_SUFFIX};
use regex::Regex;

use crate::config::ChunkingConfig;
use crate::types::ChunkMetadata;

/// Separators in descending semantic strength, per §4.2 step 2. Header-style
/// separators prefix the following piece; sentence punctuation suffixes the
/// preceding piece, so neither loses its anchor text during merge.
const PREFIX_SEPARATORS: [&str; 6] = ["\n\n\n", "\nARTICLE ", "\nSection ", "\nChapitre ", "\n\n", "\n"];
const SUFFIX_SEPARATORS: [&str; 6] = [". ", "! ", "? ", "; ", ", ", " "];

const SECTION_KEYWORDS: [&str; 13] = [
    "ARTICLE",
    "CHAPITRE",
    "SECTION",
    "TITRE",
    "PARTIE",
    "ANNEXE",
    "APPENDIX",
    "INTRODUCTION",
    "CONCLUSION",
    "DÉFINITIONS",
    "DEFINITIONS",
    "GLOSSAIRE",
    "GLOSSARY",
];

static ENUMERATED_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[IVXivx\d]+[.)]\s+[A-Z]").expect("valid regex"));
static NUMBERED_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(\.\d+)*\s+[A-Z]").expect("valid regex"));
static SENTINEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        "{}(\\d+):(-|\\d+){}",
        regex::escape(PAGE_SENTINEL_PREFIX),
        regex::escape(PAGE_SENTINEL_SUFFIX)
    ))
    .expect("valid regex")
});

/// A prospective chunk before it is assigned an id, an ordinal, and an
/// embedding — those are the ingestion coordinator's responsibility.
#[derive(Debug, Clone)]
pub struct ChunkDraft {
    /// Cleaned, sentinel-free chunk text.
    pub content: String,
    /// Token count under the canonical tokenizer.
    pub token_count: u32,
    /// Page/section metadata, minus the identity fields filled in later.
    pub metadata: ChunkMetadata,
}

/// Splits one document's extracted pages into prospective chunks.
///
/// Never fails: a document with no extractable text simply yields an empty
/// vector (§4.2 Failure). `document_name` is stamped into each chunk's
/// metadata for prompt assembly without a document-table join.
#[must_use]
pub fn chunk(doc: &ExtractedDocument, document_name: &str, config: &ChunkingConfig) -> Vec<ChunkDraft> {
    if doc.full_text.trim().is_empty() {
        return Vec::new();
    }

    // Bound the split target by the hard cap so a deployer-supplied
    // `CHUNK_SIZE_TOKENS` above `chunk_size_hard_cap` can't produce chunks
    // whose real token count exceeds it (§3 invariant).
    let config = &config.clamped();

    let cascade: [&str; 13] = [
        "\n\n\n", "\nARTICLE ", "\nSection ", "\nChapitre ", "\n\n", "\n", ". ", "! ", "? ", "; ", ", ", " ", "",
    ];

    let raw_chunks = split_text(&doc.full_text, &cascade, config);

    let mut drafts = Vec::with_capacity(raw_chunks.len());
    let mut current_physical: u32 = 1;
    let mut current_recovered: Option<u32> = None;

    for raw in raw_chunks {
        let mut starting_physical = current_physical;
        let mut starting_recovered = current_recovered;
        let mut saw_sentinel = false;

        for caps in SENTINEL.captures_iter(&raw) {
            let physical: u32 = caps[1].parse().unwrap_or(current_physical);
            let recovered: Option<u32> = caps[2].parse().ok();

            if !saw_sentinel {
                starting_physical = physical;
                starting_recovered = recovered;
                saw_sentinel = true;
            }
            current_physical = physical;
            current_recovered = recovered;
        }

        let stripped = SENTINEL.replace_all(&raw, "").to_string();
        let cleaned = clean_boundaries(&stripped);
        let trimmed = cleaned.trim();
        if trimmed.is_empty() {
            continue;
        }

        let token_count = crate::tokenizer::count(trimmed);
        if token_count < config.chunk_min_tokens {
            continue;
        }

        let page = starting_recovered.unwrap_or(starting_physical);
        let metadata = ChunkMetadata {
            page,
            page_extracted: starting_recovered.is_some(),
            physical_position: starting_physical,
            section: detect_section(trimmed),
            document_name: document_name.to_string(),
            extra: std::collections::BTreeMap::new(),
        };

        drafts.push(ChunkDraft {
            content: trimmed.to_string(),
            token_count,
            metadata,
        });
    }

    drafts
}

fn split_text(text: &str, separators: &[&str], config: &ChunkingConfig) -> Vec<String> {
    if crate::tokenizer::count(text) <= config.chunk_size_tokens {
        return vec![text.to_string()];
    }

    let Some((separator, rest)) = separators.split_first() else {
        return hard_split(text, config);
    };

    if separator.is_empty() {
        return hard_split(text, config);
    }

    let pieces = split_keep_separator(text, separator);
    if pieces.len() <= 1 {
        return split_text(text, rest, config);
    }

    let mut good_splits: Vec<String> = Vec::new();
    let mut chunks: Vec<String> = Vec::new();

    for piece in pieces {
        if crate::tokenizer::count(&piece) <= config.chunk_size_tokens {
            good_splits.push(piece);
        } else {
            if !good_splits.is_empty() {
                chunks.extend(merge_splits(&good_splits, config));
                good_splits.clear();
            }
            chunks.extend(split_text(&piece, rest, config));
        }
    }
    if !good_splits.is_empty() {
        chunks.extend(merge_splits(&good_splits, config));
    }

    chunks
}

fn split_keep_separator(text: &str, separator: &str) -> Vec<String> {
    let parts: Vec<&str> = text.split(separator).collect();
    if parts.len() <= 1 {
        return vec![text.to_string()];
    }

    let prefix = PREFIX_SEPARATORS.contains(&separator);
    let last = parts.len() - 1;
    let mut out = Vec::with_capacity(parts.len());

    for (idx, part) in parts.iter().enumerate() {
        let piece = if prefix {
            if idx == 0 { (*part).to_string() } else { format!("{separator}{part}") }
        } else if idx == last {
            (*part).to_string()
        } else {
            format!("{part}{separator}")
        };
        if !piece.is_empty() {
            out.push(piece);
        }
    }
    out
}

fn merge_splits(splits: &[String], config: &ChunkingConfig) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut current_tokens: u32 = 0;

    for split in splits {
        let split_tokens = crate::tokenizer::count(split);

        if current_tokens + split_tokens > config.chunk_size_tokens && !current.is_empty() {
            chunks.push(current.concat());

            let mut overlap_tokens: u32 = 0;
            let mut keep: Vec<String> = Vec::new();
            for piece in current.iter().rev() {
                let piece_tokens = crate::tokenizer::count(piece);
                if overlap_tokens + piece_tokens > config.chunk_overlap_tokens {
                    break;
                }
                overlap_tokens += piece_tokens;
                keep.push(piece.clone());
            }
            keep.reverse();
            current = keep;
            current_tokens = overlap_tokens;
        }

        current.push(split.clone());
        current_tokens += split_tokens;
    }

    if !current.is_empty() {
        chunks.push(current.concat());
    }

    chunks
}

/// Last-resort split for text with no usable separator (e.g. one
/// pathologically long run without whitespace). Windows by an approximate
/// chars-per-token ratio rather than an exact tokenizer binary search.
fn hard_split(text: &str, config: &ChunkingConfig) -> Vec<String> {
    const APPROX_CHARS_PER_TOKEN: usize = 4;

    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return Vec::new();
    }

    let window = ((config.chunk_size_tokens as usize) * APPROX_CHARS_PER_TOKEN).max(1);
    let overlap = ((config.chunk_overlap_tokens as usize) * APPROX_CHARS_PER_TOKEN).min(window.saturating_sub(1));

    let mut out = Vec::new();
    let mut start = 0usize;
    while start < chars.len() {
        let end = (start + window).min(chars.len());
        out.push(chars[start..end].iter().collect());
        if end == chars.len() {
            break;
        }
        start = end.saturating_sub(overlap).max(start + 1);
    }
    out
}

const TERMINATORS: [char; 3] = ['.', '!', '?'];

/// Boundary cleanup per §4.2 step 5: drop a ragged leading fragment (a
/// lowercase-started continuation of a sentence split mid-way) and a ragged
/// trailing fragment (an incomplete final sentence), each only when the cut
/// is small relative to the chunk.
fn clean_boundaries(text: &str) -> String {
    let after_leading = drop_leading_fragment(text);
    drop_trailing_fragment(&after_leading)
}

fn drop_leading_fragment(text: &str) -> String {
    let trimmed = text.trim_start();
    let Some(first_char) = trimmed.chars().next() else {
        return text.to_string();
    };
    if !first_char.is_lowercase() {
        return text.to_string();
    }

    let len = trimmed.len();
    let threshold = ((len as f64) * 0.3) as usize;
    if let Some(pos) = trimmed.find(TERMINATORS) {
        if pos < threshold {
            return trimmed[pos + 1..].trim_start().to_string();
        }
    }
    text.to_string()
}

fn drop_trailing_fragment(text: &str) -> String {
    let trimmed = text.trim_end();
    if trimmed.ends_with(['.', '!', '?', '\n']) {
        return trimmed.to_string();
    }

    let len = trimmed.len();
    let threshold = len.saturating_sub(((len as f64) * 0.3) as usize);
    if let Some(pos) = trimmed.rfind(TERMINATORS) {
        if pos >= threshold {
            return trimmed[..=pos].to_string();
        }
    }
    trimmed.to_string()
}

/// Section detection per §4.2 step 6: first of the first five non-empty
/// lines matching any rule, truncated to 150 chars.
fn detect_section(text: &str) -> Option<String> {
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()).take(5) {
        if matches_section_rule(line) {
            return Some(truncate_chars(line, 150));
        }
    }
    None
}

fn matches_section_rule(line: &str) -> bool {
    if ENUMERATED_HEADING.is_match(line) {
        return true;
    }
    let upper = line.to_uppercase();
    if SECTION_KEYWORDS.iter().any(|kw| upper.contains(kw)) {
        return true;
    }
    if NUMBERED_HEADING.is_match(line) {
        return true;
    }
    line.chars().count() >= 10 && !line.ends_with('.') && line.chars().all(|c| !c.is_lowercase())
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use regdoc_extract::Page;

    fn doc_with_pages(pages: Vec<(u32, Option<u32>, &str)>) -> ExtractedDocument {
        let pages: Vec<Page> = pages
            .into_iter()
            .map(|(physical_position, recovered_page_number, text)| Page {
                physical_position,
                recovered_page_number,
                text: text.to_string(),
            })
            .collect();
        let full_text = pages
            .iter()
            .map(|p| format!("{}\n{}\n", regdoc_extract::page_sentinel(p), p.text))
            .collect();
        ExtractedDocument { pages, full_text }
    }

    #[test]
    fn empty_document_yields_no_chunks() {
        let doc = doc_with_pages(vec![(1, None, "")]);
        let drafts = chunk(&doc, "empty.txt", &ChunkingConfig::default());
        assert!(drafts.is_empty());
    }

    #[test]
    fn recovered_page_number_is_attributed() {
        let doc = doc_with_pages(vec![(4, Some(1), "The minimum CET1 ratio is 4.5%. It applies bank-wide.")]);
        let drafts = chunk(&doc, "D.pdf", &ChunkingConfig::default());
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].metadata.page, 1);
        assert!(drafts[0].metadata.page_extracted);
        assert_eq!(drafts[0].metadata.physical_position, 4);
    }

    #[test]
    fn missing_page_number_falls_back_to_physical_position() {
        let doc = doc_with_pages(vec![(2, None, "No printed page number appears anywhere on this cover sheet.")]);
        let drafts = chunk(&doc, "D.pdf", &ChunkingConfig::default());
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].metadata.page, 2);
        assert!(!drafts[0].metadata.page_extracted);
    }

    #[test]
    fn section_heading_is_detected() {
        let doc = doc_with_pages(vec![(
            1,
            Some(1),
            "ARTICLE 5. Capital requirements\n\nBanks must hold a minimum CET1 ratio of 4.5% at all times.",
        )]);
        let drafts = chunk(&doc, "D.pdf", &ChunkingConfig::default());
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].metadata.section.as_deref(), Some("ARTICLE 5. Capital requirements"));
    }

    #[test]
    fn tiny_chunk_is_dropped_below_min_tokens() {
        let mut config = ChunkingConfig::default();
        config.chunk_min_tokens = 1000;
        let doc = doc_with_pages(vec![(1, None, "Too short to keep.")]);
        let drafts = chunk(&doc, "D.pdf", &config);
        assert!(drafts.is_empty());
    }

    #[test]
    fn long_document_splits_into_multiple_chunks() {
        let mut config = ChunkingConfig::default();
        config.chunk_size_tokens = 50;
        config.chunk_overlap_tokens = 10;
        config.chunk_min_tokens = 1;

        let paragraph = "Capital adequacy rules require banks to maintain buffers. ".repeat(40);
        let doc = doc_with_pages(vec![(1, Some(1), paragraph.as_str())]);
        let drafts = chunk(&doc, "D.pdf", &config);
        assert!(drafts.len() > 1);
        for draft in &drafts {
            assert!(draft.token_count <= config.chunk_size_hard_cap);
        }
    }

    #[test]
    fn leading_lowercase_fragment_is_dropped() {
        let text = "banking union. Article 4 establishes common rules across member states.";
        let cleaned = drop_leading_fragment(text);
        assert!(cleaned.starts_with("Article 4"));
    }

    #[test]
    fn trailing_ragged_fragment_is_dropped() {
        let text = "Banks must report quarterly. This is a short trailing frag";
        let cleaned = drop_trailing_fragment(text);
        assert!(cleaned.ends_with("quarterly."));
    }
}
