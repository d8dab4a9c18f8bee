use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::Path;
use tracing::warn;

use crate::models::DEFAULT_DOC_TITLE;

/// Extract the text layer of a PDF from raw bytes.
///
/// Returns the per-page texts joined with newlines in page order (pages
/// without a text layer contribute empty strings, keeping positions) and
/// the page count, with the whole result trimmed. Any failure (corrupt
/// bytes, encryption, image-only content) degrades to `("", 0)`; this
/// function never returns an error. Callers treat `("", 0)` as "no usable
/// text" and carry on.
pub fn read_pdf_text(bytes: &[u8]) -> (String, usize) {
    // pdf-extract panics on some malformed files; treat that the same as a
    // parse error.
    let parsed = catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem_by_pages(bytes)
    }));

    match parsed {
        Ok(Ok(pages)) => {
            let page_count = pages.len();
            let text = pages.join("\n").trim().to_string();
            (text, page_count)
        }
        Ok(Err(e)) => {
            warn!("PDF text extraction failed: {}", e);
            (String::new(), 0)
        }
        Err(_) => {
            warn!("PDF text extraction panicked on malformed input");
            (String::new(), 0)
        }
    }
}

/// Derive a document title from an uploaded filename (stem without the
/// extension), falling back to the default report title.
pub fn title_from_filename(filename: Option<&str>) -> String {
    filename
        .and_then(|name| Path::new(name).file_stem())
        .and_then(|stem| stem.to_str())
        .map(str::trim)
        .filter(|stem| !stem.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| DEFAULT_DOC_TITLE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_bytes_degrade_to_empty() {
        let (text, pages) = read_pdf_text(b"this is not a pdf at all");
        assert_eq!(text, "");
        assert_eq!(pages, 0);
    }

    #[test]
    fn empty_input_degrades_to_empty() {
        let (text, pages) = read_pdf_text(&[]);
        assert_eq!(text, "");
        assert_eq!(pages, 0);
    }

    #[test]
    fn truncated_header_degrades_to_empty() {
        let (text, pages) = read_pdf_text(b"%PDF-1.7\n%%EOF");
        assert_eq!(text, "");
        assert_eq!(pages, 0);
    }

    #[test]
    fn title_comes_from_filename_stem() {
        assert_eq!(
            title_from_filename(Some("2024_安全研修.pdf")),
            "2024_安全研修"
        );
        assert_eq!(title_from_filename(Some("report.final.pdf")), "report.final");
    }

    #[test]
    fn title_falls_back_to_default() {
        assert_eq!(title_from_filename(None), DEFAULT_DOC_TITLE);
        assert_eq!(title_from_filename(Some("")), DEFAULT_DOC_TITLE);
    }
}
