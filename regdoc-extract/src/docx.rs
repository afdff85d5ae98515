use docx_rs::{DocumentChild, ParagraphChild, RunChild, TableRowChild, read_docx};

use crate::error::{ExtractError, Result};
use crate::model::ExtractedDocument;
use crate::pdf::assemble_full_text;
use crate::model::Page;

/// DOCX has no pagination concept the extractor can see without rendering;
/// the whole body is a single logical section, per component C1's contract.
pub(crate) fn extract(bytes: &[u8]) -> Result<ExtractedDocument> {
    let docx = read_docx(bytes).map_err(|e| ExtractError::ExtractionFailed {
        mime: "docx",
        reason: e.to_string(),
    })?;

    let mut text = String::new();
    for child in &docx.document.children {
        collect_document_child(child, &mut text);
    }

    let page = Page {
        physical_position: 1,
        recovered_page_number: None,
        text: text.trim().to_string(),
    };
    let pages = vec![page];
    let full_text = assemble_full_text(&pages);
    Ok(ExtractedDocument { pages, full_text })
}

fn collect_document_child(child: &DocumentChild, out: &mut String) {
    match child {
        DocumentChild::Paragraph(p) => {
            for run in &p.children {
                collect_paragraph_child(run, out);
            }
            out.push('\n');
        }
        DocumentChild::Table(t) => {
            for row in &t.rows {
                let docx_rs::TableChild::TableRow(row) = row;
                for cell in &row.cells {
                    let TableRowChild::TableCell(cell) = cell;
                    for child in &cell.children {
                        if let docx_rs::TableCellContent::Paragraph(p) = child {
                            for run in &p.children {
                                collect_paragraph_child(run, out);
                            }
                            out.push('\n');
                        }
                    }
                }
            }
        }
        _ => {}
    }
}

fn collect_paragraph_child(child: &ParagraphChild, out: &mut String) {
    if let ParagraphChild::Run(run) = child {
        for piece in &run.children {
            if let RunChild::Text(t) = piece {
                out.push_str(&t.text);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_docx_fails_with_extraction_failed() {
        let err = extract(b"not a docx").unwrap_err();
        assert!(matches!(err, ExtractError::ExtractionFailed { mime: "docx", .. }));
    }
}
