//! Driven ports for writing and inspecting PDF documents.

use super::define_port_error;

/// Content of a document, top to bottom.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PdfDocument {
    pub title: String,
    pub lines: Vec<PdfLine>,
}

/// One block of a [`PdfDocument`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PdfLine {
    /// Large bold text, centred.
    Heading(String),
    /// Small bold text, centred.
    SubHeading(String),
    /// Left-aligned body text.
    Text(String),
    Blank,
    /// Short horizontal rule, centred.
    Divider,
}

/// Result of opening an uploaded PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PdfInspection {
    Ok,
    Encrypted,
    Unreadable,
}

define_port_error! {
    /// Errors surfaced while writing a PDF.
    pub enum PdfGeneratorError {
        /// The document could not be serialised.
        Write { message: String } => "kunne ikke lage pdf: {message}",
    }
}

/// Port rendering a [`PdfDocument`] to bytes.
#[cfg_attr(test, mockall::automock)]
pub trait PdfGenerator: Send + Sync {
    fn generate(&self, document: &PdfDocument) -> Result<Vec<u8>, PdfGeneratorError>;
}

/// Port checking whether uploaded bytes are an openable PDF.
#[cfg_attr(test, mockall::automock)]
pub trait PdfInspector: Send + Sync {
    fn inspect(&self, data: &[u8]) -> PdfInspection;
}
