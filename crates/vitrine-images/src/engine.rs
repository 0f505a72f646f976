//! The reconciliation engine
//!
//! One public operation: [`ImageReconciler::bulk_save`]. A call carries a
//! mix of new uploads and metadata about new and existing images for one
//! product; the engine validates the whole request against the current
//! snapshot, then executes creates, partial patches and soft-deletes
//! across the blob store and the image repository.
//!
//! # Failure semantics
//!
//! Validation is fully pre-computed (see [`crate::plan`]); a rejected
//! call leaves both stores untouched. A collaborator failure *during*
//! execution is propagated unmodified and is **not** rolled back — the
//! two stores share no transaction, so partial completion is a
//! documented, caller-visible risk.

use crate::config::SaveConfig;
use crate::error::SaveImagesError;
use crate::locks::ProductLocks;
use crate::normalize::normalize;
use crate::payload::SavePayload;
use crate::plan::{build_plan, BlobAction, SavePlan};
use chrono::Utc;
use std::sync::Arc;
use vitrine_model::{ImageRecord, ProductId, UploadedFile};
use vitrine_store::{BlobStore, ImageOrder, ImageRepository, ProductLookup, ThumbnailGenerator};

/// Orchestrates bulk product-image saves
///
/// Collaborators are injected as trait objects; the engine owns only the
/// configuration and the per-product lock registry.
pub struct ImageReconciler {
    catalog: Arc<dyn ProductLookup>,
    blobs: Arc<dyn BlobStore>,
    thumbnails: Arc<dyn ThumbnailGenerator>,
    repository: Arc<dyn ImageRepository>,
    config: SaveConfig,
    locks: ProductLocks,
}

impl ImageReconciler {
    /// Create an engine with default limits
    #[must_use]
    pub fn new(
        catalog: Arc<dyn ProductLookup>,
        blobs: Arc<dyn BlobStore>,
        thumbnails: Arc<dyn ThumbnailGenerator>,
        repository: Arc<dyn ImageRepository>,
    ) -> Self {
        Self::with_config(catalog, blobs, thumbnails, repository, SaveConfig::default())
    }

    /// Create an engine with explicit limits
    #[must_use]
    pub fn with_config(
        catalog: Arc<dyn ProductLookup>,
        blobs: Arc<dyn BlobStore>,
        thumbnails: Arc<dyn ThumbnailGenerator>,
        repository: Arc<dyn ImageRepository>,
        config: SaveConfig,
    ) -> Self {
        Self {
            catalog,
            blobs,
            thumbnails,
            repository,
            config,
            locks: ProductLocks::new(),
        }
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &SaveConfig {
        &self.config
    }

    /// Reconcile uploads and metadata into the product's image set
    ///
    /// `product_id` arrives raw from the request layer; `files` is the
    /// ordered upload list (absent for metadata-only calls); `payload`
    /// is the loose-JSON metadata container.
    ///
    /// Returns the product's full image listing after the save, ordered
    /// by name ascending then active ascending.
    ///
    /// # Errors
    /// See [`SaveImagesError`]; every variant maps to a coarse kind via
    /// [`SaveImagesError::kind`]. Validation failures precede any store
    /// write.
    pub async fn bulk_save(
        &self,
        product_id: &str,
        files: Option<Vec<UploadedFile>>,
        payload: &serde_json::Value,
    ) -> Result<Vec<ImageRecord>, SaveImagesError> {
        // Boundary checks before touching any collaborator.
        let product_id: ProductId = product_id.parse()?;
        let payload = SavePayload::parse(payload)?;

        let _guard = self
            .locks
            .try_acquire(product_id)
            .ok_or(SaveImagesError::Busy(product_id))?;

        tracing::info!(
            product = %product_id,
            files = files.as_ref().map_or(0, Vec::len),
            items = payload.items.len(),
            "reconciling product images"
        );

        let product = self
            .catalog
            .get_with_images(&product_id)
            .await?
            .ok_or(SaveImagesError::ProductNotFound(product_id))?;

        if files.is_none() && payload.is_empty() {
            return Err(SaveImagesError::NothingToSave);
        }

        let items = normalize(files, &payload.items, &self.config)?;
        let plan = build_plan(&product, items, &self.config, Utc::now())?;
        tracing::debug!(
            product = %product_id,
            uploads = plan.upload_count(),
            relocations = plan.relocation_count(),
            records = plan.records.len(),
            "save plan validated"
        );

        self.apply(plan).await?;

        let records = self
            .repository
            .find_all_for_product(&product_id, ImageOrder::NameThenActive)
            .await?;
        tracing::info!(product = %product_id, records = records.len(), "reconciliation complete");
        Ok(records)
    }

    /// Execute a validated plan, one item at a time
    ///
    /// Sequential on purpose: parallel writes for one product would race
    /// the projected-count check the plan was validated under.
    async fn apply(&self, plan: SavePlan) -> Result<(), SaveImagesError> {
        for action in plan.actions {
            match action {
                BlobAction::Upload {
                    file,
                    original,
                    thumbnail,
                } => {
                    self.blobs.save(&file.bytes, &original).await?;
                    let derived = self.thumbnails.generate(&file).await?;
                    self.blobs.save(&derived.bytes, &thumbnail).await?;
                }
                BlobAction::Relocate {
                    original,
                    thumbnail,
                } => {
                    self.blobs.move_object(&original.to, &original.from).await?;
                    self.blobs.move_object(&thumbnail.to, &thumbnail.from).await?;
                }
            }
        }

        self.repository.save_all(&plan.records).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use vitrine_model::ImageId;
    use vitrine_store::{
        MemoryBlobStore, MemoryImageRepository, MemoryProductCatalog, MemoryThumbnailer,
    };

    struct Env {
        reconciler: ImageReconciler,
        product_id: ProductId,
    }

    fn env() -> Env {
        let repository = Arc::new(MemoryImageRepository::new());
        let catalog = Arc::new(MemoryProductCatalog::new(Arc::clone(&repository)));
        let product_id = ProductId::new();
        catalog.register(product_id);

        let reconciler = ImageReconciler::new(
            catalog,
            Arc::new(MemoryBlobStore::new()),
            Arc::new(MemoryThumbnailer::new()),
            repository,
        );
        Env {
            reconciler,
            product_id,
        }
    }

    #[tokio::test]
    async fn raw_product_id_is_validated_first() {
        let env = env();
        let err = env
            .reconciler
            .bulk_save("", None, &json!({ "items": [] }))
            .await
            .unwrap_err();
        assert!(matches!(err, SaveImagesError::Id(_)));

        let err = env
            .reconciler
            .bulk_save("not-an-id", None, &json!(null))
            .await
            .unwrap_err();
        // Id shape beats payload shape: first violation wins.
        assert!(matches!(err, SaveImagesError::Id(_)));
    }

    #[tokio::test]
    async fn unknown_product_is_not_found() {
        let env = env();
        let err = env
            .reconciler
            .bulk_save(
                &ProductId::new().to_string(),
                None,
                &json!({ "items": [{ "imageId": ImageId::new().to_string() }] }),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SaveImagesError::ProductNotFound(_)));
    }

    #[tokio::test]
    async fn empty_call_is_nothing_to_save() {
        let env = env();
        let err = env
            .reconciler
            .bulk_save(&env.product_id.to_string(), None, &json!({ "items": [] }))
            .await
            .unwrap_err();
        assert_eq!(err, SaveImagesError::NothingToSave);
    }
}
