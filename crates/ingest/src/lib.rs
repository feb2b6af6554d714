//! Attachment ingestion — converts uploaded files into bounded text snippets.
//!
//! Each file is dispatched on a closed kind ({plain text, PDF}), extracted
//! with a kind-specific strategy, truncated to a configured character bound,
//! and tagged with a kind-specific prefix. A file that fails to extract is
//! logged, recorded as a warning, and skipped — one bad file never aborts
//! the batch. Snippets are not persisted across turns; the controller merges
//! the joined text into the next user turn's prompt.

use deepdesk_core::error::AttachmentError;
use tracing::warn;

/// Default bound on extracted characters per file.
pub const DEFAULT_MAX_FILE_CONTENT: usize = 1000;

/// A file-like input at the ingestion boundary: a name, a declared content
/// type, and raw bytes. How the bytes were obtained (upload, disk read) is
/// the caller's concern.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(
        name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }
}

/// The closed set of extraction strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    PlainText,
    Pdf,
}

impl AttachmentKind {
    /// Select a kind from the declared content type, falling back to a
    /// guess from the file name. Anything that is not a PDF is treated as
    /// decodable text.
    pub fn detect(content_type: &str, file_name: &str) -> Self {
        if content_type.eq_ignore_ascii_case("application/pdf") {
            return Self::Pdf;
        }
        if content_type.is_empty()
            && mime_guess::from_path(file_name).first_or_octet_stream() == mime_guess::mime::APPLICATION_PDF
        {
            return Self::Pdf;
        }
        Self::PlainText
    }

    /// The snippet prefix for this kind.
    fn prefix(&self) -> &'static str {
        match self {
            Self::PlainText => "FILE_CONTENT",
            Self::Pdf => "PDF_CONTENT",
        }
    }
}

/// The result of ingesting a batch of files.
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    /// Newline-joined snippets of all successful files, in input order.
    /// Empty if no files were given or all of them failed.
    pub text: String,

    /// Per-file failures, for user-visible warnings.
    pub failures: Vec<AttachmentError>,
}

impl IngestReport {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Converts uploaded files into bounded, labeled text snippets.
#[derive(Debug, Clone)]
pub struct AttachmentIngestor {
    max_file_content: usize,
}

impl AttachmentIngestor {
    /// Create an ingestor with the given per-file character bound.
    pub fn new(max_file_content: usize) -> Self {
        Self { max_file_content }
    }

    /// Ingest a batch of files.
    ///
    /// Processing continues past per-file failures; a failed file
    /// contributes no snippet.
    pub fn ingest(&self, files: &[UploadedFile]) -> IngestReport {
        let mut snippets = Vec::new();
        let mut failures = Vec::new();

        for file in files {
            match self.extract(file) {
                Ok(snippet) => snippets.push(snippet),
                Err(err) => {
                    warn!(file = %file.name, "Error processing attachment: {err}");
                    failures.push(err);
                }
            }
        }

        IngestReport {
            text: snippets.join("\n"),
            failures,
        }
    }

    /// Extract one file into its labeled snippet.
    fn extract(&self, file: &UploadedFile) -> Result<String, AttachmentError> {
        let kind = AttachmentKind::detect(&file.content_type, &file.name);
        let text = match kind {
            AttachmentKind::Pdf => extract_pdf_text(file)?,
            AttachmentKind::PlainText => String::from_utf8_lossy(&file.bytes).into_owned(),
        };
        Ok(self.snippet(kind, &file.name, &text))
    }

    /// Truncate to the character bound and tag with the kind prefix. The
    /// trailing ellipsis marks that truncation may have occurred.
    fn snippet(&self, kind: AttachmentKind, name: &str, text: &str) -> String {
        let bounded: String = text.chars().take(self.max_file_content).collect();
        format!("{}:{}: {}...", kind.prefix(), name, bounded)
    }
}

impl Default for AttachmentIngestor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FILE_CONTENT)
    }
}

/// Extract text from every page of a PDF, concatenated with a single
/// separating space. A page that fails to extract contributes empty text;
/// only a document that fails to load at all fails the file.
fn extract_pdf_text(file: &UploadedFile) -> Result<String, AttachmentError> {
    let doc = lopdf::Document::load_mem(&file.bytes).map_err(|e| AttachmentError::PdfParse {
        name: file.name.clone(),
        reason: e.to_string(),
    })?;

    let pages: Vec<String> = doc
        .get_pages()
        .keys()
        .map(|&page| doc.extract_text(&[page]).unwrap_or_default())
        .collect();

    Ok(pages.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

    fn plain(name: &str, bytes: &[u8]) -> UploadedFile {
        UploadedFile::new(name, "text/plain", bytes)
    }

    /// Build a one-page-per-string PDF in memory. `None` produces a page
    /// whose content stream reference dangles, so text extraction for that
    /// page fails while the document itself still loads.
    fn pdf_bytes(page_texts: &[Option<&str>]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for text in page_texts {
            let content_id = match text {
                Some(text) => {
                    let content = Content {
                        operations: vec![
                            Operation::new("BT", vec![]),
                            Operation::new("Tf", vec!["F1".into(), 12.into()]),
                            Operation::new("Td", vec![50.into(), 700.into()]),
                            Operation::new("Tj", vec![Object::string_literal(*text)]),
                            Operation::new("ET", vec![]),
                        ],
                    };
                    doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()))
                }
                None => doc.new_object_id(),
            };
            kids.push(
                doc.add_object(dictionary! {
                    "Type" => "Page",
                    "Parent" => pages_id,
                    "Contents" => content_id,
                })
                .into(),
            );
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn plain_file_snippet() {
        let ingestor = AttachmentIngestor::default();
        let report = ingestor.ingest(&[plain("a.txt", b"hello")]);
        assert_eq!(report.text, "FILE_CONTENT:a.txt: hello...");
        assert!(report.failures.is_empty());
    }

    #[test]
    fn invalid_utf8_is_replaced_not_fatal() {
        let ingestor = AttachmentIngestor::default();
        let report = ingestor.ingest(&[plain("bin.txt", &[0x68, 0x69, 0xff, 0xfe])]);
        assert!(report.failures.is_empty());
        assert!(report.text.starts_with("FILE_CONTENT:bin.txt: hi"));
        assert!(report.text.contains('\u{FFFD}'));
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let ingestor = AttachmentIngestor::new(3);
        // Four multibyte characters; only the first three may survive.
        let report = ingestor.ingest(&[plain("jp.txt", "日本語文".as_bytes())]);
        assert_eq!(report.text, "FILE_CONTENT:jp.txt: 日本語...");
    }

    #[test]
    fn long_content_is_bounded() {
        let ingestor = AttachmentIngestor::new(10);
        let long = "x".repeat(500);
        let report = ingestor.ingest(&[plain("long.txt", long.as_bytes())]);
        assert_eq!(report.text, format!("FILE_CONTENT:long.txt: {}...", "x".repeat(10)));
    }

    #[test]
    fn unknown_content_type_treated_as_plain() {
        let ingestor = AttachmentIngestor::default();
        let file = UploadedFile::new("notes", "application/x-whatever", b"some notes".to_vec());
        let report = ingestor.ingest(&[file]);
        assert_eq!(report.text, "FILE_CONTENT:notes: some notes...");
    }

    #[test]
    fn pdf_kind_detected_by_declared_type() {
        assert_eq!(
            AttachmentKind::detect("application/pdf", "anything.bin"),
            AttachmentKind::Pdf
        );
        assert_eq!(
            AttachmentKind::detect("APPLICATION/PDF", "caps.pdf"),
            AttachmentKind::Pdf
        );
        assert_eq!(
            AttachmentKind::detect("text/plain", "a.txt"),
            AttachmentKind::PlainText
        );
    }

    #[test]
    fn pdf_kind_guessed_from_name_when_type_missing() {
        assert_eq!(AttachmentKind::detect("", "report.pdf"), AttachmentKind::Pdf);
        assert_eq!(AttachmentKind::detect("", "report.txt"), AttachmentKind::PlainText);
    }

    #[test]
    fn pdf_text_is_extracted_into_a_snippet() {
        let ingestor = AttachmentIngestor::default();
        let bytes = pdf_bytes(&[Some("Quarterly revenue grew")]);
        let report = ingestor.ingest(&[UploadedFile::new("report.pdf", "application/pdf", bytes)]);

        assert!(report.failures.is_empty());
        assert!(report.text.starts_with("PDF_CONTENT:report.pdf: "));
        assert!(report.text.contains("Quarterly revenue grew"));
        assert!(report.text.ends_with("..."));
    }

    #[test]
    fn unextractable_page_contributes_empty_text() {
        let ingestor = AttachmentIngestor::default();
        let bytes = pdf_bytes(&[Some("page one text"), None, Some("page three text")]);
        let report = ingestor.ingest(&[UploadedFile::new("mixed.pdf", "application/pdf", bytes)]);

        // The bad page degrades but never fails the file.
        assert!(report.failures.is_empty());
        assert!(report.text.starts_with("PDF_CONTENT:mixed.pdf: "));
        assert!(report.text.contains("page one text"));
        assert!(report.text.contains("page three text"));
    }

    #[test]
    fn corrupt_pdf_fails_only_that_file() {
        let ingestor = AttachmentIngestor::default();
        let files = [
            plain("first.txt", b"ok"),
            UploadedFile::new("bad.pdf", "application/pdf", b"not a pdf at all".to_vec()),
            plain("last.txt", b"still ok"),
        ];
        let report = ingestor.ingest(&files);

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].file_name(), "bad.pdf");
        // Remaining files survive, in input order
        assert_eq!(
            report.text,
            "FILE_CONTENT:first.txt: ok...\nFILE_CONTENT:last.txt: still ok..."
        );
    }

    #[test]
    fn empty_batch_yields_empty_text() {
        let ingestor = AttachmentIngestor::default();
        let report = ingestor.ingest(&[]);
        assert!(report.is_empty());
        assert!(report.failures.is_empty());
    }

    #[test]
    fn snippets_keep_input_order() {
        let ingestor = AttachmentIngestor::default();
        let report = ingestor.ingest(&[plain("one.txt", b"1"), plain("two.txt", b"2")]);
        let lines: Vec<&str> = report.text.lines().collect();
        assert_eq!(lines[0], "FILE_CONTENT:one.txt: 1...");
        assert_eq!(lines[1], "FILE_CONTENT:two.txt: 2...");
    }
}
