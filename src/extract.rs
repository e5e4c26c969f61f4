//! Local PDF text extraction, used when the service's OCR is unavailable.
//!
//! `pdf-extract` is tried first; documents it cannot read (or panics on)
//! go through `lopdf`'s content-stream text extraction instead. Pages are
//! joined with `--- Page N ---` markers so answers can cite page numbers.

use lopdf::Document;
use tracing::{debug, warn};

use crate::error::PdfAssistError;

/// Extract the text of every page, off the async runtime.
pub async fn extract_pdf_text(bytes: Vec<u8>) -> Result<String, PdfAssistError> {
    tokio::task::spawn_blocking(move || extract_pages(&bytes).map(|pages| join_pages(&pages)))
        .await
        .map_err(|e| PdfAssistError::Extraction(format!("extraction task failed: {e}")))?
}

fn extract_pages(bytes: &[u8]) -> Result<Vec<String>, PdfAssistError> {
    let primary = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(bytes));
    match primary {
        Ok(Ok(pages)) => {
            debug!(pages = pages.len(), "pdf-extract succeeded");
            return Ok(pages);
        }
        Ok(Err(e)) => warn!(error = %e, "pdf-extract failed, trying lopdf"),
        Err(_) => warn!("pdf-extract panicked, trying lopdf"),
    }
    pages_with_lopdf(bytes)
}

fn pages_with_lopdf(bytes: &[u8]) -> Result<Vec<String>, PdfAssistError> {
    let doc = Document::load_mem(bytes)
        .map_err(|e| PdfAssistError::Extraction(format!("not a readable PDF: {e}")))?;

    Ok(doc
        .get_pages()
        .keys()
        .map(|&page| match doc.extract_text(&[page]) {
            Ok(text) => text,
            Err(e) => {
                debug!(page, error = %e, "no text on page");
                String::new()
            }
        })
        .collect())
}

/// Page-marked text; empty when no page has any text, so image-only
/// documents are still recognised as scanned downstream.
fn join_pages(pages: &[String]) -> String {
    if pages.iter().all(|p| p.trim().is_empty()) {
        return String::new();
    }
    let mut out = String::new();
    for (i, page) in pages.iter().enumerate() {
        out.push_str(&format!("\n\n--- Page {} ---\n\n", i + 1));
        out.push_str(page.trim());
    }
    out
}

/// Builds a small text-only PDF, one text line per page.
#[cfg(test)]
pub(crate) fn sample_pdf(pages: &[&str]) -> Vec<u8> {
    use lopdf::content::{Content, Operation};
    use lopdf::{Object, Stream, dictionary};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_pages_marks_each_page() {
        let text = join_pages(&["first".to_string(), "  second \n".to_string()]);
        assert_eq!(text, "\n\n--- Page 1 ---\n\nfirst\n\n--- Page 2 ---\n\nsecond");
    }

    #[test]
    fn blank_pages_yield_no_text() {
        assert_eq!(join_pages(&[" ".to_string(), String::new()]), "");
        assert_eq!(join_pages(&[]), "");
    }

    #[test]
    fn lopdf_reads_generated_pages() {
        let pages = pages_with_lopdf(&sample_pdf(&["Invoice 42", "Total due"])).unwrap();
        assert_eq!(pages.len(), 2);
        assert!(pages[0].contains("Invoice"));
        assert!(pages[1].contains("Total"));
    }

    #[tokio::test]
    async fn extracts_text_with_page_markers() {
        let text = extract_pdf_text(sample_pdf(&["Invoice 42", "Total due"]))
            .await
            .unwrap();
        let first = text.find("--- Page 1 ---").unwrap();
        let second = text.find("--- Page 2 ---").unwrap();
        assert!(first < second);
        assert!(text[first..second].contains("Invoice"));
        assert!(text[second..].contains("Total"));
    }

    #[tokio::test]
    async fn garbage_is_an_extraction_error() {
        let err = extract_pdf_text(b"definitely not a pdf".to_vec())
            .await
            .unwrap_err();
        assert!(matches!(err, PdfAssistError::Extraction(_)));
    }
}
