/// Document MIME kind accepted by the extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MimeKind {
    /// Portable Document Format.
    Pdf,
    /// Office Open XML word processing document.
    Docx,
    /// Plain UTF-8 text.
    Text,
}

impl MimeKind {
    /// Classifies a MIME kind from a content-type string and/or filename extension.
    ///
    /// # Errors
    /// Returns `None` when neither the content type nor the extension is recognized.
    #[must_use]
    pub fn detect(content_type: &str, filename: &str) -> Option<Self> {
        let ct = content_type.to_ascii_lowercase();
        if ct.contains("pdf") {
            return Some(Self::Pdf);
        }
        if ct.contains("wordprocessingml") || ct.contains("msword") {
            return Some(Self::Docx);
        }
        if ct.starts_with("text/") {
            return Some(Self::Text);
        }

        let ext = filename.rsplit('.').next().unwrap_or("").to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "txt" | "text" | "md" => Some(Self::Text),
            _ => None,
        }
    }

    /// Static label used in error messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Text => "text",
        }
    }
}

/// One extracted page (or logical section, for non-paginated formats).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// 1-based position in document order.
    pub physical_position: u32,
    /// Human-visible page number recovered from page content, if any.
    pub recovered_page_number: Option<u32>,
    /// Extracted text for this page. May be empty.
    pub text: String,
}

/// Output of extraction for one document: ordered pages plus a concatenated,
/// page-boundary-annotated view of the full text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedDocument {
    /// Pages in document order.
    pub pages: Vec<Page>,
    /// Concatenated text with an embedded page sentinel before each page's
    /// content so downstream chunking can recover page attribution.
    pub full_text: String,
}

/// Sentinel inserted into `full_text` ahead of each page's content.
///
/// Format: `{PAGE_SENTINEL_PREFIX}<physical_position>:<recovered_or_dash>{PAGE_SENTINEL_SUFFIX}`.
/// The chunker treats this as an unsplittable token and strips it before
/// handing content to the embedding/reranker gateways.
pub const PAGE_SENTINEL_PREFIX: &str = "\u{0}PAGE:";
pub const PAGE_SENTINEL_SUFFIX: &str = "\u{0}";

/// Renders the page sentinel for a given page.
#[must_use]
pub fn page_sentinel(page: &Page) -> String {
    let recovered = page
        .recovered_page_number
        .map_or_else(|| "-".to_string(), |n| n.to_string());
    format!(
        "{PAGE_SENTINEL_PREFIX}{}:{recovered}{PAGE_SENTINEL_SUFFIX}",
        page.physical_position
    )
}
