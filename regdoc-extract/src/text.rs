use crate::model::{ExtractedDocument, Page};
use crate::pdf::assemble_full_text;

/// Plain text has no pagination; the whole input is one logical section.
pub(crate) fn extract(bytes: &[u8]) -> ExtractedDocument {
    let text = String::from_utf8_lossy(bytes).replace("\r\n", "\n");
    let page = Page {
        physical_position: 1,
        recovered_page_number: None,
        text: text.trim().to_string(),
    };
    let pages = vec![page];
    let full_text = assemble_full_text(&pages);
    ExtractedDocument { pages, full_text }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_page_for_plain_text() {
        let doc = extract(b"hello\nworld");
        assert_eq!(doc.pages.len(), 1);
        assert_eq!(doc.pages[0].physical_position, 1);
        assert_eq!(doc.pages[0].recovered_page_number, None);
    }
}
