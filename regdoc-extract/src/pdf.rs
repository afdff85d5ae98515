use lopdf::Document;

use crate::error::{ExtractError, Result};
use crate::model::{ExtractedDocument, Page, page_sentinel};
use crate::page_number;

pub(crate) fn extract(bytes: &[u8]) -> Result<ExtractedDocument> {
    let doc = Document::load_mem(bytes).map_err(|e| ExtractError::ExtractionFailed {
        mime: "pdf",
        reason: e.to_string(),
    })?;

    let page_map = doc.get_pages();
    let mut page_numbers: Vec<u32> = page_map.keys().copied().collect();
    page_numbers.sort_unstable();

    let mut pages = Vec::with_capacity(page_numbers.len());
    for (idx, page_number) in page_numbers.iter().enumerate() {
        let raw = doc.extract_text(&[*page_number]).unwrap_or_default();
        let text = normalize(&raw);
        let recovered = page_number::recover(&text);
        pages.push(Page {
            physical_position: u32::try_from(idx + 1).unwrap_or(u32::MAX),
            recovered_page_number: recovered,
            text,
        });
    }

    let full_text = assemble_full_text(&pages);
    Ok(ExtractedDocument { pages, full_text })
}

fn normalize(text: &str) -> String {
    text.lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}

pub(crate) fn assemble_full_text(pages: &[Page]) -> String {
    let mut out = String::new();
    for page in pages {
        out.push_str(&page_sentinel(page));
        out.push('\n');
        out.push_str(&page.text);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corrupt_bytes_fail_with_extraction_failed() {
        let err = extract(b"not a pdf").unwrap_err();
        assert!(matches!(err, ExtractError::ExtractionFailed { mime: "pdf", .. }));
    }
}
