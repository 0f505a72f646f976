//! Collaborator contracts
//!
//! All four resources are injected into the engine as `Arc<dyn …>`. The
//! engine never retries or compensates on their behalf: a failure here
//! propagates to the caller unmodified.

use std::cmp::Ordering;
use vitrine_model::{DerivedImage, ImageRecord, ObjectPath, ProductId, UploadedFile};

/// Errors raised by the blob store
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// Writing an object failed
    #[error("object write failed at {path}: {reason}")]
    WriteFailed {
        /// Target path of the failed write
        path: String,
        /// Backend-reported cause
        reason: String,
    },

    /// A move referenced a source object that does not exist
    #[error("no object at {0} to move")]
    MissingSource(String),

    /// The backend itself was unreachable
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised by the thumbnail generator
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ThumbnailError {
    /// The upload could not be decoded or downscaled
    #[error("thumbnail generation failed for {file}: {reason}")]
    Generation {
        /// Original filename of the upload
        file: String,
        /// Generator-reported cause
        reason: String,
    },
}

/// Errors raised by the relational collaborators
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    /// A query or batch write failed
    #[error("repository operation failed: {0}")]
    Query(String),
}

/// Deterministic listing order for image records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageOrder {
    /// Name ascending (unnamed records first), then active ascending
    ///
    /// The listing contract callers rely on after a bulk save.
    #[default]
    NameThenActive,
}

impl ImageOrder {
    /// Compare two records under this order
    #[must_use]
    pub fn compare(&self, a: &ImageRecord, b: &ImageRecord) -> Ordering {
        match self {
            Self::NameThenActive => a
                .name
                .cmp(&b.name)
                .then_with(|| a.active.cmp(&b.active)),
        }
    }

    /// Sort a listing in place
    pub fn sort(&self, records: &mut [ImageRecord]) {
        records.sort_by(|a, b| self.compare(a, b));
    }
}

/// A parent product loaded together with its current images
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductWithImages {
    /// Product identifier
    pub id: ProductId,
    /// All image records currently owned by the product, soft-deleted
    /// ones included
    pub images: Vec<ImageRecord>,
}

/// Loads the parent product eagerly with its image collection
#[async_trait::async_trait]
pub trait ProductLookup: Send + Sync {
    /// Fetch a product and its images; `None` when the product is unknown
    async fn get_with_images(
        &self,
        product_id: &ProductId,
    ) -> Result<Option<ProductWithImages>, RepositoryError>;
}

/// Path-addressed object storage
#[async_trait::async_trait]
pub trait BlobStore: Send + Sync {
    /// Store an object at a path, overwriting any previous content
    async fn save(&self, bytes: &[u8], path: &ObjectPath) -> Result<(), StorageError>;

    /// Relocate an object: after success the old path no longer resolves
    async fn move_object(
        &self,
        new_path: &ObjectPath,
        old_path: &ObjectPath,
    ) -> Result<(), StorageError>;
}

/// Derives a thumbnail image from an uploaded original
#[async_trait::async_trait]
pub trait ThumbnailGenerator: Send + Sync {
    /// Produce the derived image for one upload
    async fn generate(&self, file: &UploadedFile) -> Result<DerivedImage, ThumbnailError>;
}

/// Batch persistence of image records scoped to a parent product
#[async_trait::async_trait]
pub trait ImageRepository: Send + Sync {
    /// Upsert the full record set in one batch
    async fn save_all(&self, records: &[ImageRecord]) -> Result<(), RepositoryError>;

    /// List every record owned by a product in the given order
    async fn find_all_for_product(
        &self,
        product_id: &ProductId,
        order: ImageOrder,
    ) -> Result<Vec<ImageRecord>, RepositoryError>;
}
