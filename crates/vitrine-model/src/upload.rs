//! Uploaded binaries and derived images
//!
//! [`UploadedFile`] mirrors what the multipart layer hands over: the form
//! field it arrived under, the client-supplied filename, transfer
//! encoding, MIME type, declared size, and the bytes themselves.

use serde::{Deserialize, Serialize};

/// Errors raised while checking an upload's shape
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadError {
    /// The upload carried no usable filename
    #[error("uploaded file at position {0} has no filename")]
    MissingFilename(usize),
}

/// One binary file received alongside the save request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    /// Multipart field name the file arrived under
    pub field_name: String,
    /// Client-supplied filename, extension included
    pub original_name: String,
    /// Transfer encoding reported by the client
    pub encoding: String,
    /// MIME type reported by the client
    pub mime_type: String,
    /// Declared size in bytes
    pub size: u64,
    /// Raw file content
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    /// Build an upload from its parts, deriving `size` from the content
    #[must_use]
    pub fn new(
        field_name: impl Into<String>,
        original_name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            field_name: field_name.into(),
            original_name: original_name.into(),
            encoding: "7bit".to_string(),
            mime_type: mime_type.into(),
            size: bytes.len() as u64,
            bytes,
        }
    }

    /// Check the structural shape expected of an upload
    ///
    /// `position` is the file's index in the request, used in the error.
    ///
    /// # Errors
    /// [`UploadError::MissingFilename`] when the filename is empty.
    pub fn ensure_well_formed(&self, position: usize) -> Result<(), UploadError> {
        if self.original_name.trim().is_empty() {
            return Err(UploadError::MissingFilename(position));
        }
        Ok(())
    }

    /// File extension taken from the original filename, if any
    #[must_use]
    pub fn extension(&self) -> Option<&str> {
        let (stem, ext) = self.original_name.rsplit_once('.')?;
        (!stem.is_empty() && !ext.is_empty()).then_some(ext)
    }
}

/// An image derived from an upload (the generated thumbnail)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedImage {
    /// Encoded thumbnail content
    pub bytes: Vec<u8>,
    /// MIME type of the derived image
    pub mime_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_derives_size() {
        let file = UploadedFile::new("images", "photo.jpg", "image/jpeg", vec![1, 2, 3]);
        assert_eq!(file.size, 3);
        assert!(file.ensure_well_formed(0).is_ok());
    }

    #[test]
    fn extension_from_filename() {
        let file = UploadedFile::new("images", "photo.final.JPG", "image/jpeg", vec![]);
        assert_eq!(file.extension(), Some("JPG"));
    }

    #[test]
    fn hidden_file_has_no_extension() {
        let file = UploadedFile::new("images", ".gitignore", "text/plain", vec![]);
        assert_eq!(file.extension(), None);
    }

    #[test]
    fn empty_filename_rejected() {
        let file = UploadedFile::new("images", "  ", "image/jpeg", vec![0]);
        assert_eq!(
            file.ensure_well_formed(2),
            Err(UploadError::MissingFilename(2))
        );
    }
}
