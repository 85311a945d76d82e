//! Per-file checks run before anything is sent to Fiks.

use serde::Serialize;
use utoipa::ToSchema;

/// Largest accepted file, in bytes.
pub const MAKS_FILSTORRELSE: usize = 10 * 1024 * 1024;

const PDF_MAGIC: &[u8] = b"%PDF";
const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";
const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];

/// Extensions of JPEG variants Fiks does not accept.
const AVVISTE_BILDEENDELSER: [&str; 3] = ["jfif", "pjpeg", "pjp"];

/// Outcome reported per file to the frontend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationValue {
    Ok,
    CouldNotLoadDocument,
    PdfIsEncrypted,
    IllegalFileType,
    IllegalFilename,
    FileTooLarge,
}

/// File types accepted for upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilType {
    Pdf,
    Png,
    Jpeg,
}

impl FilType {
    /// Detect the type from the leading bytes.
    pub fn detect(data: &[u8]) -> Option<Self> {
        if data.starts_with(PDF_MAGIC) {
            Some(Self::Pdf)
        } else if data.starts_with(PNG_MAGIC) {
            Some(Self::Png)
        } else if data.starts_with(JPEG_MAGIC) {
            Some(Self::Jpeg)
        } else {
            None
        }
    }

    /// Extension used for the stored filename.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Pdf => ".pdf",
            Self::Png => ".png",
            Self::Jpeg => ".jpg",
        }
    }

    pub fn mimetype(self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }
}

/// Validation outcome with the detected type when the file passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationResult {
    pub value: ValidationValue,
    pub fil_type: Option<FilType>,
}

impl ValidationResult {
    pub fn rejected(value: ValidationValue) -> Self {
        Self { value, fil_type: None }
    }

    pub fn ok(fil_type: FilType) -> Self {
        Self {
            value: ValidationValue::Ok,
            fil_type: Some(fil_type),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.value == ValidationValue::Ok
    }
}

/// True for image types whose extension marks a variant Fiks rejects.
pub(crate) fn har_avvist_bildeendelse(fil_type: FilType, filnavn: &str) -> bool {
    if fil_type == FilType::Pdf {
        return false;
    }
    filnavn
        .rsplit_once('.')
        .is_some_and(|(_, ext)| AVVISTE_BILDEENDELSER.contains(&ext.to_lowercase().as_str()))
}
