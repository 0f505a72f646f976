//! In-memory reference stores
//!
//! Back the workspace test suites and the simulator binary. Concurrency
//! characteristics roughly match the production collaborators: the blob
//! store is keyed by full path, the repository upserts by record id, and
//! the catalog only answers for registered products.

use crate::contracts::{
    BlobStore, ImageOrder, ImageRepository, ProductLookup, ProductWithImages, RepositoryError,
    StorageError, ThumbnailError, ThumbnailGenerator,
};
use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use vitrine_model::{DerivedImage, ImageId, ImageRecord, ObjectPath, ProductId, UploadedFile};

/// Blob store holding objects in a concurrent map keyed by path
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    objects: DashMap<String, Vec<u8>>,
}

impl MemoryBlobStore {
    /// Create an empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an object currently exists at `path`
    #[must_use]
    pub fn contains(&self, path: &ObjectPath) -> bool {
        self.objects.contains_key(path.as_str())
    }

    /// Fetch an object's bytes, when present
    #[must_use]
    pub fn object(&self, path: &ObjectPath) -> Option<Vec<u8>> {
        self.objects.get(path.as_str()).map(|e| e.value().clone())
    }

    /// Number of live objects
    #[must_use]
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Snapshot of every live path, for live-set assertions in tests
    #[must_use]
    pub fn live_paths(&self) -> Vec<String> {
        self.objects.iter().map(|e| e.key().clone()).collect()
    }
}

#[async_trait::async_trait]
impl BlobStore for MemoryBlobStore {
    async fn save(&self, bytes: &[u8], path: &ObjectPath) -> Result<(), StorageError> {
        self.objects.insert(path.as_str().to_string(), bytes.to_vec());
        Ok(())
    }

    async fn move_object(
        &self,
        new_path: &ObjectPath,
        old_path: &ObjectPath,
    ) -> Result<(), StorageError> {
        let (_, bytes) = self
            .objects
            .remove(old_path.as_str())
            .ok_or_else(|| StorageError::MissingSource(old_path.as_str().to_string()))?;
        self.objects.insert(new_path.as_str().to_string(), bytes);
        Ok(())
    }
}

/// Thumbnail stand-in producing a deterministic reduced copy
///
/// The production generator decodes and downscales; this one keeps every
/// eighth byte so tests can tell originals and thumbnails apart without
/// an image pipeline.
#[derive(Debug, Default)]
pub struct MemoryThumbnailer;

impl MemoryThumbnailer {
    /// Create the stand-in generator
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl ThumbnailGenerator for MemoryThumbnailer {
    async fn generate(&self, file: &UploadedFile) -> Result<DerivedImage, ThumbnailError> {
        if file.bytes.is_empty() {
            return Err(ThumbnailError::Generation {
                file: file.original_name.clone(),
                reason: "empty upload".to_string(),
            });
        }
        let bytes = file.bytes.iter().copied().step_by(8).collect();
        Ok(DerivedImage {
            bytes,
            mime_type: file.mime_type.clone(),
        })
    }
}

/// Image repository over a locked map keyed by record id
#[derive(Debug, Default)]
pub struct MemoryImageRepository {
    rows: RwLock<HashMap<ImageId, ImageRecord>>,
}

impl MemoryImageRepository {
    /// Create an empty repository
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch one record by id
    #[must_use]
    pub fn get(&self, id: &ImageId) -> Option<ImageRecord> {
        self.rows.read().get(id).cloned()
    }

    /// Total stored rows, all products together
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.read().len()
    }

    fn list(&self, product_id: &ProductId, order: ImageOrder) -> Vec<ImageRecord> {
        let mut records: Vec<_> = self
            .rows
            .read()
            .values()
            .filter(|r| &r.product_id == product_id)
            .cloned()
            .collect();
        order.sort(&mut records);
        records
    }
}

#[async_trait::async_trait]
impl ImageRepository for MemoryImageRepository {
    async fn save_all(&self, records: &[ImageRecord]) -> Result<(), RepositoryError> {
        let mut rows = self.rows.write();
        for record in records {
            rows.insert(record.id, record.clone());
        }
        Ok(())
    }

    async fn find_all_for_product(
        &self,
        product_id: &ProductId,
        order: ImageOrder,
    ) -> Result<Vec<ImageRecord>, RepositoryError> {
        Ok(self.list(product_id, order))
    }
}

/// Catalog of known products, images pulled from the shared repository
#[derive(Debug)]
pub struct MemoryProductCatalog {
    products: RwLock<HashSet<ProductId>>,
    repository: Arc<MemoryImageRepository>,
}

impl MemoryProductCatalog {
    /// Create a catalog backed by `repository`
    #[must_use]
    pub fn new(repository: Arc<MemoryImageRepository>) -> Self {
        Self {
            products: RwLock::new(HashSet::new()),
            repository,
        }
    }

    /// Register a product so lookups start answering for it
    pub fn register(&self, product_id: ProductId) {
        self.products.write().insert(product_id);
    }
}

#[async_trait::async_trait]
impl ProductLookup for MemoryProductCatalog {
    async fn get_with_images(
        &self,
        product_id: &ProductId,
    ) -> Result<Option<ProductWithImages>, RepositoryError> {
        if !self.products.read().contains(product_id) {
            return Ok(None);
        }
        Ok(Some(ProductWithImages {
            id: *product_id,
            images: self.repository.list(product_id, ImageOrder::default()),
        }))
    }
}
