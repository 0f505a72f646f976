//! Testing utilities for the Vitrine workspace
//!
//! Shared fixtures, wired engines, and fault-injecting store doubles.

#![allow(missing_docs)]

use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use vitrine_images::{ImageReconciler, SaveConfig};
use vitrine_model::{ImageId, ImageRecord, ObjectPath, ProductId, UploadedFile, Visibility};
use vitrine_store::{
    BlobStore, ImageRepository, MemoryBlobStore, MemoryImageRepository, MemoryProductCatalog,
    MemoryThumbnailer, ProductLookup, StorageError,
};

/// A reconciler wired to in-memory stores, with handles kept for assertions
pub struct TestEnv {
    pub reconciler: ImageReconciler,
    pub blobs: Arc<MemoryBlobStore>,
    pub repository: Arc<MemoryImageRepository>,
    pub catalog: Arc<MemoryProductCatalog>,
    pub product_id: ProductId,
}

pub fn setup_env() -> TestEnv {
    setup_env_with_config(SaveConfig::default())
}

pub fn setup_env_with_config(config: SaveConfig) -> TestEnv {
    let repository = Arc::new(MemoryImageRepository::new());
    let catalog = Arc::new(MemoryProductCatalog::new(Arc::clone(&repository)));
    let blobs = Arc::new(MemoryBlobStore::new());
    let product_id = ProductId::new();
    catalog.register(product_id);

    let reconciler = ImageReconciler::with_config(
        Arc::clone(&catalog) as Arc<dyn ProductLookup>,
        Arc::clone(&blobs) as Arc<dyn BlobStore>,
        Arc::new(MemoryThumbnailer::new()),
        Arc::clone(&repository) as Arc<dyn ImageRepository>,
        config,
    );

    TestEnv {
        reconciler,
        blobs,
        repository,
        catalog,
        product_id,
    }
}

impl TestEnv {
    /// Raw product id string, the way the request layer passes it
    pub fn pid(&self) -> String {
        self.product_id.to_string()
    }

    /// Register a second product and return its id
    pub fn register_other_product(&self) -> ProductId {
        let other = ProductId::new();
        self.catalog.register(other);
        other
    }

    /// Persist a pre-existing record (with live blobs) for `product_id`
    pub async fn seed_record(
        &self,
        product_id: ProductId,
        name: Option<&str>,
        active: bool,
    ) -> ImageRecord {
        let id = ImageId::new();
        let visibility = Visibility::derive(active, false);
        let original_path =
            ObjectPath::resolve(visibility, &product_id, &id, Some("jpg"), false);
        let thumbnail_path =
            ObjectPath::resolve(visibility, &product_id, &id, Some("jpg"), true);
        let record = ImageRecord {
            id,
            product_id,
            name: name.map(str::to_string),
            description: None,
            original_path: original_path.clone(),
            thumbnail_path: thumbnail_path.clone(),
            active,
            main: false,
            deleted_at: None,
        };

        self.blobs.save(&[1u8; 32], &original_path).await.unwrap();
        self.blobs.save(&[2u8; 8], &thumbnail_path).await.unwrap();
        self.repository
            .save_all(std::slice::from_ref(&record))
            .await
            .unwrap();
        record
    }
}

/// Deterministic upload fixture
pub fn upload(name: &str) -> UploadedFile {
    UploadedFile::new("images", name, "image/jpeg", vec![0x55; 64])
}

/// Wrap items into the wire-shaped metadata container
pub fn payload(items: Vec<Value>) -> Value {
    json!({ "items": items })
}

/// Blob store that starts failing writes after a budget of successes
///
/// Moves count against the budget too, so mid-apply failures can be
/// provoked at any point of a plan.
pub struct FailingBlobStore {
    inner: MemoryBlobStore,
    remaining: AtomicUsize,
}

impl FailingBlobStore {
    pub fn failing_after(successes: usize) -> Self {
        Self {
            inner: MemoryBlobStore::new(),
            remaining: AtomicUsize::new(successes),
        }
    }

    pub fn contains(&self, path: &ObjectPath) -> bool {
        self.inner.contains(path)
    }

    pub fn object_count(&self) -> usize {
        self.inner.object_count()
    }

    fn spend(&self, path: &ObjectPath) -> Result<(), StorageError> {
        let mut current = self.remaining.load(Ordering::SeqCst);
        loop {
            if current == 0 {
                return Err(StorageError::WriteFailed {
                    path: path.as_str().to_string(),
                    reason: "injected failure".to_string(),
                });
            }
            match self.remaining.compare_exchange(
                current,
                current - 1,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return Ok(()),
                Err(actual) => current = actual,
            }
        }
    }
}

#[async_trait::async_trait]
impl BlobStore for FailingBlobStore {
    async fn save(&self, bytes: &[u8], path: &ObjectPath) -> Result<(), StorageError> {
        self.spend(path)?;
        self.inner.save(bytes, path).await
    }

    async fn move_object(
        &self,
        new_path: &ObjectPath,
        old_path: &ObjectPath,
    ) -> Result<(), StorageError> {
        self.spend(new_path)?;
        self.inner.move_object(new_path, old_path).await
    }
}

/// Env wired with a [`FailingBlobStore`] for mid-apply failure tests
pub struct FailingEnv {
    pub reconciler: ImageReconciler,
    pub blobs: Arc<FailingBlobStore>,
    pub repository: Arc<MemoryImageRepository>,
    pub product_id: ProductId,
}

pub fn setup_failing_env(successes: usize) -> FailingEnv {
    let repository = Arc::new(MemoryImageRepository::new());
    let catalog = Arc::new(MemoryProductCatalog::new(Arc::clone(&repository)));
    let blobs = Arc::new(FailingBlobStore::failing_after(successes));
    let product_id = ProductId::new();
    catalog.register(product_id);

    let reconciler = ImageReconciler::new(
        catalog,
        Arc::clone(&blobs) as Arc<dyn BlobStore>,
        Arc::new(MemoryThumbnailer::new()),
        Arc::clone(&repository) as Arc<dyn ImageRepository>,
    );

    FailingEnv {
        reconciler,
        blobs,
        repository,
        product_id,
    }
}
