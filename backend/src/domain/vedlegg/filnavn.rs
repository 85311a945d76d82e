//! Filename rules for uploaded and listed vedlegg.

use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

use super::validering::FilType;

/// Characters kept from the original name before the uuid suffix.
const MAKS_NAVNELENGDE: usize = 50;

/// `-` plus the first uuid group appended to stored filenames.
const LENGTH_OF_UUID_PART: usize = 9;

/// NFC-normalise and trim a filename.
///
/// # Examples
/// ```
/// use innsyn_api::domain::vedlegg::sanitize_file_name;
///
/// assert_eq!(sanitize_file_name("  kontrakt.pdf "), "kontrakt.pdf");
/// ```
pub fn sanitize_file_name(filnavn: &str) -> String {
    filnavn.nfc().collect::<String>().trim().to_owned()
}

/// True when the sanitised name contains anything outside the accepted set.
pub fn contains_illegal_characters(filnavn: &str) -> bool {
    sanitize_file_name(filnavn).chars().any(|c| !is_legal(c))
}

fn is_legal(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(
            c,
            'æ' | 'ø' | 'å' | 'Æ' | 'Ø' | 'Å' | ' ' | '(' | ')' | ',' | '.' | '_' | '–' | '-'
        )
}

/// Filename split into stem and a recognised extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNameSplit {
    pub name: String,
    /// Extension including the dot, empty when not recognised.
    pub extension: String,
}

/// Split off `.jpg`, `.jpeg`, `.png` or `.pdf`; other extensions stay in the name.
pub fn split_file_name(filnavn: &str) -> FileNameSplit {
    match filnavn.rsplit_once('.') {
        Some((name, ext)) if matches!(ext, "jpg" | "jpeg" | "png" | "pdf") => FileNameSplit {
            name: name.to_owned(),
            extension: format!(".{ext}"),
        },
        _ => FileNameSplit {
            name: filnavn.to_owned(),
            extension: String::new(),
        },
    }
}

/// Name stored in Fiks: truncated stem, first uuid group and detected type.
pub fn lag_filnavn(filnavn: &str, uuid: Uuid, fil_type: FilType) -> String {
    let split = split_file_name(&sanitize_file_name(filnavn));
    let stem: String = split.name.chars().take(MAKS_NAVNELENGDE).collect();
    let uuid = uuid.to_string();
    let prefix = uuid.split('-').next().unwrap_or_default();
    format!("{stem}-{prefix}{}", fil_type.extension())
}

/// Undo the uuid suffix added by [`lag_filnavn`] for display.
///
/// # Examples
/// ```
/// use innsyn_api::domain::vedlegg::remove_uuid_from_filename;
///
/// assert_eq!(remove_uuid_from_filename("kontrakt-1a2b3c4d.pdf"), "kontrakt.pdf");
/// assert_eq!(remove_uuid_from_filename("kontrakt.pdf"), "kontrakt.pdf");
/// ```
pub fn remove_uuid_from_filename(filnavn: &str) -> String {
    let chars: Vec<char> = filnavn.chars().collect();
    let Some(index_of_extension) = chars.iter().rposition(|c| *c == '.') else {
        return filnavn.to_owned();
    };
    if index_of_extension <= LENGTH_OF_UUID_PART {
        return filnavn.to_owned();
    }
    let uuid_start = index_of_extension - LENGTH_OF_UUID_PART;
    if chars.get(uuid_start) != Some(&'-') {
        return filnavn.to_owned();
    }
    chars
        .iter()
        .take(uuid_start)
        .chain(chars.iter().skip(index_of_extension))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::plain("kontrakt.pdf", false)]
    #[case::norwegian("Lønnsslipp for måned (2).png", false)]
    #[case::dashes("a–b-c_d, e.jpg", false)]
    #[case::slash("mappe/fil.pdf", true)]
    #[case::question("hva?.pdf", true)]
    #[case::combining_ring("a\u{030A}rsoppgave.pdf", false)]
    #[case::emoji("smil😀.png", true)]
    fn filename_characters_are_checked(#[case] filnavn: &str, #[case] illegal: bool) {
        assert_eq!(contains_illegal_characters(filnavn), illegal);
    }

    #[rstest]
    #[case::pdf("kontrakt.pdf", "kontrakt", ".pdf")]
    #[case::jpeg("bilde.av.meg.jpeg", "bilde.av.meg", ".jpeg")]
    #[case::unknown("dokument.docx", "dokument.docx", "")]
    #[case::uppercase("SKANNET.PDF", "SKANNET.PDF", "")]
    #[case::none("uten_endelse", "uten_endelse", "")]
    fn known_extensions_are_split(
        #[case] filnavn: &str,
        #[case] name: &str,
        #[case] extension: &str,
    ) {
        let split = split_file_name(filnavn);
        assert_eq!(split.name, name);
        assert_eq!(split.extension, extension);
    }

    #[rstest]
    fn stored_name_carries_uuid_prefix_and_detected_type() {
        let uuid = Uuid::parse_str("1a2b3c4d-0000-4000-8000-000000000000").expect("uuid");
        assert_eq!(lag_filnavn(" kontrakt.png ", uuid, FilType::Pdf), "kontrakt-1a2b3c4d.pdf");
        assert_eq!(lag_filnavn("skannet.jfif", uuid, FilType::Jpeg), "skannet.jfif-1a2b3c4d.jpg");
    }

    #[rstest]
    fn long_names_are_truncated_to_fifty_characters() {
        let uuid = Uuid::parse_str("1a2b3c4d-0000-4000-8000-000000000000").expect("uuid");
        let long = format!("{}.pdf", "æ".repeat(80));
        assert_eq!(
            lag_filnavn(&long, uuid, FilType::Pdf),
            format!("{}-1a2b3c4d.pdf", "æ".repeat(50))
        );
    }

    #[rstest]
    #[case::with_uuid("kontrakt-1a2b3c4d.pdf", "kontrakt.pdf")]
    #[case::without_uuid("kontrakt.pdf", "kontrakt.pdf")]
    #[case::short("a-1234567.pdf", "a-1234567.pdf")]
    #[case::no_dash("kontrakt11a2b3c4d.pdf", "kontrakt11a2b3c4d.pdf")]
    #[case::no_extension("kontrakt-1a2b3c4d", "kontrakt-1a2b3c4d")]
    fn uuid_suffix_is_removed_for_display(#[case] filnavn: &str, #[case] expected: &str) {
        assert_eq!(remove_uuid_from_filename(filnavn), expected);
    }
}
