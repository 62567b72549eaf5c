//! Local precondition checks, run before any network call.

use crate::error::UploadError;

/// Extensions the registry accepts.
pub const ALLOWED_EXTENSIONS: [&str; 6] = ["pdf", "doc", "docx", "jpg", "jpeg", "png"];

/// 10 MiB upload cap.
pub const MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;

/// Document names share the on-chain 28-character cap.
pub const MAX_NAME_LEN: usize = 28;

/// A file selected for upload.
#[derive(Debug, Clone)]
pub struct FileInput {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl FileInput {
    /// Lowercased extension after the last dot, when there is one.
    pub fn extension(&self) -> Option<String> {
        self.file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
    }
}

pub fn validate_document_name(name: &str) -> Result<(), UploadError> {
    if name.is_empty() {
        return Err(UploadError::NameRequired);
    }
    if name.len() > MAX_NAME_LEN {
        return Err(UploadError::NameTooLong);
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ' ')
    {
        return Err(UploadError::NameInvalid);
    }
    Ok(())
}

/// Check presence, extension and size; returns the extension.
pub fn validate_file(file: &FileInput) -> Result<String, UploadError> {
    if file.file_name.is_empty() || file.bytes.is_empty() {
        return Err(UploadError::NoFile);
    }

    let extension = file
        .extension()
        .ok_or_else(|| UploadError::UnsupportedType(String::new()))?;
    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(UploadError::UnsupportedType(extension));
    }

    if file.bytes.len() as u64 > MAX_FILE_BYTES {
        return Err(UploadError::FileTooLarge);
    }

    Ok(extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, len: usize) -> FileInput {
        FileInput {
            file_name: name.to_owned(),
            bytes: vec![0u8; len],
        }
    }

    #[test]
    fn extension_is_lowercased_tail() {
        assert_eq!(file("Report.PDF", 1).extension().as_deref(), Some("pdf"));
        assert_eq!(file("archive.tar.docx", 1).extension().as_deref(), Some("docx"));
        assert_eq!(file("no_extension", 1).extension(), None);
        assert_eq!(file("trailing.", 1).extension(), None);
    }

    #[test]
    fn disallowed_extensions_are_rejected() {
        assert!(matches!(
            validate_file(&file("malware.exe", 10)),
            Err(UploadError::UnsupportedType(ext)) if ext == "exe"
        ));
        assert!(matches!(
            validate_file(&file("plain", 10)),
            Err(UploadError::UnsupportedType(_))
        ));
    }

    #[test]
    fn size_cap_is_10_mib() {
        assert!(validate_file(&file("ok.pdf", MAX_FILE_BYTES as usize)).is_ok());
        assert!(matches!(
            validate_file(&file("big.pdf", MAX_FILE_BYTES as usize + 1)),
            Err(UploadError::FileTooLarge)
        ));
    }

    #[test]
    fn names_allow_spaces_but_not_punctuation() {
        assert!(validate_document_name("Report_2024").is_ok());
        assert!(validate_document_name("Quarterly Report 4").is_ok());
        assert!(matches!(
            validate_document_name(""),
            Err(UploadError::NameRequired)
        ));
        assert!(matches!(
            validate_document_name(&"x".repeat(MAX_NAME_LEN + 1)),
            Err(UploadError::NameTooLong)
        ));
        assert!(matches!(
            validate_document_name("bad/name"),
            Err(UploadError::NameInvalid)
        ));
    }
}
