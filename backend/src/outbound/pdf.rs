//! `lopdf` renderer for receipts and inspector for uploaded PDFs.
//!
//! The renderer lays out an A4 document with the standard Helvetica fonts,
//! so no font files are embedded. Text is encoded as WinAnsi; characters
//! outside Latin-1 are replaced with `?`.

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, dictionary};
use tracing::debug;

use crate::domain::ports::{
    PdfDocument, PdfGenerator, PdfGeneratorError, PdfInspection, PdfInspector, PdfLine,
};

const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const MARGIN: i64 = 50;
const TEXT_SIZE: i64 = 11;
const HEADING_SIZE: i64 = 18;
const SUB_HEADING_SIZE: i64 = 12;
const LEADING: i64 = 16;
/// Characters per body line at [`TEXT_SIZE`].
const WRAP_COLUMNS: usize = 90;

#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfGenerator;

#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfInspector;

/// Collects operations per page while tracking the cursor.
struct Layout {
    pages: Vec<Vec<Operation>>,
    current: Vec<Operation>,
    y: i64,
}

impl Layout {
    fn new() -> Self {
        Self {
            pages: Vec::new(),
            current: Vec::new(),
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    fn advance(&mut self, height: i64) {
        if self.y - height < MARGIN {
            self.pages.push(std::mem::take(&mut self.current));
            self.y = PAGE_HEIGHT - MARGIN;
        }
        self.y -= height;
    }

    fn text(&mut self, font: &str, size: i64, x: i64, text: &str) {
        self.current.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![font.into(), size.into()]),
            Operation::new("Td", vec![x.into(), self.y.into()]),
            Operation::new("Tj", vec![Object::string_literal(win_ansi(text))]),
            Operation::new("ET", vec![]),
        ]);
    }

    fn centred(&mut self, font: &str, size: i64, text: &str) {
        self.advance(size + LEADING / 2);
        let x = ((PAGE_WIDTH - estimated_width(text, size)) / 2).max(MARGIN);
        self.text(font, size, x, text);
    }

    fn line(&mut self, text: &str) {
        for wrapped in wrap(text, WRAP_COLUMNS) {
            self.advance(LEADING);
            self.text("F1", TEXT_SIZE, MARGIN, &wrapped);
        }
    }

    fn divider(&mut self) {
        self.advance(LEADING);
        let half: i64 = 60;
        let centre = PAGE_WIDTH / 2;
        self.current.extend([
            Operation::new("w", vec![1_i64.into()]),
            Operation::new("m", vec![(centre - half).into(), self.y.into()]),
            Operation::new("l", vec![(centre + half).into(), self.y.into()]),
            Operation::new("S", vec![]),
        ]);
    }

    fn finish(mut self) -> Vec<Vec<Operation>> {
        self.pages.push(self.current);
        self.pages
    }
}

/// Helvetica averages about half an em per glyph.
fn estimated_width(text: &str, size: i64) -> i64 {
    let glyphs = i64::try_from(text.chars().count()).unwrap_or(i64::MAX);
    glyphs.saturating_mul(size) / 2
}

fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

/// Greedy word wrap; words longer than a line are split.
fn wrap(text: &str, columns: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let mut rest: Vec<char> = word.chars().collect();
        while rest.len() > columns {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let tail = rest.split_off(columns);
            lines.push(rest.into_iter().collect());
            rest = tail;
        }
        let word: String = rest.into_iter().collect();
        let needed =
            current.chars().count() + usize::from(!current.is_empty()) + word.chars().count();
        if needed > columns && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

fn layout(document: &PdfDocument) -> Vec<Vec<Operation>> {
    let mut layout = Layout::new();
    for line in &document.lines {
        match line {
            PdfLine::Heading(text) => layout.centred("F2", HEADING_SIZE, text),
            PdfLine::SubHeading(text) => layout.centred("F2", SUB_HEADING_SIZE, text),
            PdfLine::Text(text) => layout.line(text),
            PdfLine::Blank => layout.advance(LEADING),
            PdfLine::Divider => layout.divider(),
        }
    }
    layout.finish()
}

fn write_error(err: impl std::fmt::Display) -> PdfGeneratorError {
    PdfGeneratorError::write(err.to_string())
}

impl PdfGenerator for LopdfGenerator {
    fn generate(&self, document: &PdfDocument) -> Result<Vec<u8>, PdfGeneratorError> {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        let regular = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let bold = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => regular, "F2" => bold },
        });

        let mut kids: Vec<ObjectId> = Vec::new();
        for operations in layout(document) {
            let content = Content { operations }.encode().map_err(write_error)?;
            let content_id = doc.add_object(Stream::new(dictionary! {}, content));
            kids.push(doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            }));
        }
        let count = i64::try_from(kids.len()).map_err(write_error)?;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids.into_iter().map(Object::from).collect::<Vec<_>>(),
                "Count" => count,
                "Resources" => resources,
                "MediaBox" => vec![0_i64.into(), 0_i64.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
            }),
        );
        let info = doc.add_object(dictionary! {
            "Title" => Object::string_literal(win_ansi(&document.title)),
        });
        let catalog = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog);
        doc.trailer.set("Info", info);
        doc.compress();

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).map_err(write_error)?;
        debug!(bytes = bytes.len(), tittel = document.title.as_str(), "laget pdf");
        Ok(bytes)
    }
}

impl PdfInspector for LopdfInspector {
    fn inspect(&self, data: &[u8]) -> PdfInspection {
        // The trailer is never stream-compressed, so the key is visible in raw bytes.
        if contains(data, b"/Encrypt") {
            return PdfInspection::Encrypted;
        }
        match Document::load_mem(data) {
            Ok(doc) if doc.is_encrypted() => PdfInspection::Encrypted,
            Ok(_) => PdfInspection::Ok,
            Err(err) => {
                debug!(error = %err, "kunne ikke åpne pdf");
                PdfInspection::Unreadable
            }
        }
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn kvittering(lines: usize) -> PdfDocument {
        let mut content = vec![
            PdfLine::Heading("Ettersendelse av vedlegg".to_owned()),
            PdfLine::SubHeading("Søknad om økonomisk sosialhjelp".to_owned()),
            PdfLine::Divider,
            PdfLine::Blank,
        ];
        content.extend((0..lines).map(|i| PdfLine::Text(format!("lønnslipp-{i}.pdf"))));
        PdfDocument {
            title: "ettersendelse".to_owned(),
            lines: content,
        }
    }

    #[rstest]
    fn generated_pdf_opens_cleanly() {
        let bytes = LopdfGenerator.generate(&kvittering(3)).expect("pdf");
        assert!(bytes.starts_with(b"%PDF-1.7"));
        assert_eq!(LopdfInspector.inspect(&bytes), PdfInspection::Ok);
        let doc = Document::load_mem(&bytes).expect("loads");
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[rstest]
    fn long_documents_span_pages() {
        let bytes = LopdfGenerator.generate(&kvittering(120)).expect("pdf");
        let doc = Document::load_mem(&bytes).expect("loads");
        assert!(doc.get_pages().len() > 1);
    }

    #[rstest]
    #[case::garbage(b"dette er ikke en pdf".as_slice())]
    #[case::truncated(b"%PDF-1.4\n1 0 obj".as_slice())]
    fn unreadable_bytes_are_reported(#[case] data: &[u8]) {
        assert_eq!(LopdfInspector.inspect(data), PdfInspection::Unreadable);
    }

    #[rstest]
    fn encrypt_dictionary_marks_the_file_encrypted() {
        let mut bytes = LopdfGenerator.generate(&kvittering(1)).expect("pdf");
        bytes.extend_from_slice(b"\ntrailer\n<< /Encrypt 99 0 R >>\n");
        assert_eq!(LopdfInspector.inspect(&bytes), PdfInspection::Encrypted);
    }

    #[rstest]
    #[case::short("kort linje", 90, vec!["kort linje"])]
    #[case::wrapped("aaa bbb ccc", 7, vec!["aaa bbb", "ccc"])]
    #[case::long_word("abcdefghij", 4, vec!["abcd", "efgh", "ij"])]
    #[case::empty("", 10, vec![""])]
    fn wraps_on_word_boundaries(
        #[case] text: &str,
        #[case] columns: usize,
        #[case] expected: Vec<&str>,
    ) {
        assert_eq!(wrap(text, columns), expected);
    }

    #[rstest]
    fn norwegian_letters_survive_win_ansi() {
        assert_eq!(win_ansi("æøå€"), vec![0xE6, 0xF8, 0xE5, b'?']);
    }
}
