//! Text extraction from downloaded documents
//!
//! - [`docx`] - paragraphs of word-processing containers
//! - [`xlsx`] - cell values of spreadsheet containers
//! - [`shared_strings`] - in-memory and spilled shared-string tables
//! - [`pdf`] - external converter wrapper
//!
//! The container formats are decoded straight from their ZIP+XML parts with
//! streaming readers.

pub mod docx;
pub mod pdf;
pub mod shared_strings;
pub mod xlsx;

pub use docx::{DocxDocument, Paragraphs};
pub use pdf::PdfConverter;
pub use shared_strings::{InMemoryStrings, SharedStringTable, SpilledStrings};
pub use xlsx::{TableOptions, XlsxWorkbook};

/// Document formats that are scanned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Docx,
    Xlsx,
    Pdf,
}

impl DocumentKind {
    /// Map a lower-cased extension with its leading dot
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension {
            ".docx" => Some(Self::Docx),
            ".xlsx" => Some(Self::Xlsx),
            ".pdf" => Some(Self::Pdf),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(".docx", Some(DocumentKind::Docx))]
    #[test_case(".xlsx", Some(DocumentKind::Xlsx))]
    #[test_case(".pdf", Some(DocumentKind::Pdf))]
    #[test_case(".pptx", None)]
    #[test_case("", None)]
    fn test_from_extension(extension: &str, expected: Option<DocumentKind>) {
        assert_eq!(DocumentKind::from_extension(extension), expected);
    }
}
