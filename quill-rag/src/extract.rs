//! Text extraction from uploaded files.
//!
//! Dispatches on the filename extension: plain text and markdown are
//! decoded with statistical encoding detection, PDFs are extracted
//! page by page. Anything else is rejected outright.

use std::path::Path;

use tracing::debug;

use crate::error::{RagError, Result};

/// Extract plain text from raw file bytes.
///
/// Supported extensions: `.txt`, `.md`, `.text` (encoding auto-detected,
/// undecodable bytes replaced rather than failing) and `.pdf` (pages
/// joined with newlines; pages yielding no text contribute an empty
/// string).
///
/// # Errors
///
/// - [`RagError::UnsupportedFileType`] for any other extension — there is
///   no byte-inspection fallback.
/// - [`RagError::NoExtractableText`] if the result is empty or
///   all-whitespace, regardless of file type.
/// - [`RagError::PdfExtraction`] when the PDF parser rejects the file.
pub fn extract_text(bytes: &[u8], filename: &str) -> Result<String> {
    let extension = Path::new(filename)
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    let text = match extension.as_str() {
        "pdf" => extract_pdf(bytes)?,
        "txt" | "md" | "text" => decode_text(bytes),
        _ => {
            return Err(RagError::UnsupportedFileType { extension: format!(".{extension}") });
        }
    };

    if text.trim().is_empty() {
        return Err(RagError::NoExtractableText);
    }

    debug!(source = filename, chars = text.len(), "extracted document text");
    Ok(text)
}

/// Decode text bytes, auto-detecting the encoding.
///
/// Valid UTF-8 short-circuits detection. Otherwise the encoding is
/// guessed from byte statistics and decoded with replacement, so
/// malformed input never fails.
fn decode_text(bytes: &[u8]) -> String {
    // UTF-8 first; detection only matters for legacy encodings.
    let (decoded, had_errors) = encoding_rs::UTF_8.decode_without_bom_handling(bytes);
    if !had_errors {
        return decoded.into_owned();
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(bytes, true);
    let encoding = detector.guess(None, true);
    let (decoded, _, _) = encoding.decode(bytes);
    decoded.into_owned()
}

/// Extract text from a PDF, page by page, joined with newlines.
fn extract_pdf(bytes: &[u8]) -> Result<String> {
    let doc =
        lopdf::Document::load_mem(bytes).map_err(|e| RagError::PdfExtraction(e.to_string()))?;

    let pages: Vec<String> = doc
        .get_pages()
        .keys()
        // Pages with no recoverable text contribute an empty string.
        .map(|&number| doc.extract_text(&[number]).unwrap_or_default())
        .collect();

    Ok(pages.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_plain_utf8_text() {
        let text = extract_text(b"Hello world. This is a test document.", "doc.txt").unwrap();
        assert_eq!(text, "Hello world. This is a test document.");
    }

    #[test]
    fn extracts_markdown_and_text_extensions() {
        assert!(extract_text(b"# Title\n\nBody", "notes.md").is_ok());
        assert!(extract_text(b"plain", "notes.text").is_ok());
        assert!(extract_text(b"plain", "NOTES.TXT").is_ok());
    }

    #[test]
    fn rejects_unsupported_extension_by_name() {
        let err = extract_text(b"PK\x03\x04", "report.docx").unwrap_err();
        match &err {
            RagError::UnsupportedFileType { extension } => assert_eq!(extension, ".docx"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("unsupported"));
        assert!(err.is_document_error());
    }

    #[test]
    fn rejects_empty_and_whitespace_only_text() {
        assert!(matches!(extract_text(b"", "empty.txt"), Err(RagError::NoExtractableText)));
        assert!(matches!(
            extract_text(b"   \n\t  ", "blank.txt"),
            Err(RagError::NoExtractableText)
        ));
    }

    #[test]
    fn decodes_non_utf8_bytes_with_replacement_instead_of_failing() {
        // "café" in Latin-1; 0xE9 is not valid UTF-8.
        let text = extract_text(b"caf\xe9 au lait", "menu.txt").unwrap();
        assert!(text.contains("caf"));
        assert!(text.contains("au lait"));
    }

    #[test]
    fn corrupt_pdf_maps_to_extraction_error() {
        let err = extract_text(b"this is not a pdf", "broken.pdf").unwrap_err();
        assert!(matches!(err, RagError::PdfExtraction(_)));
        assert!(err.is_document_error());
    }

    #[test]
    fn roundtrip_through_chunker_keeps_every_word() {
        use crate::chunker::TextChunker;

        let text = extract_text(b"Hello world. This is a test document.", "doc.txt").unwrap();
        let chunks = TextChunker::new(16, 4).unwrap().chunk(&text);
        let all = chunks.join(" ");
        for word in ["Hello", "world", "This", "is", "a", "test", "document"] {
            assert!(all.contains(word), "missing {word}");
        }
    }
}
