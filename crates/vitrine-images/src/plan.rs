//! Plan phase of a bulk save
//!
//! Every cross-item invariant is checked here, over the in-memory
//! snapshot, before a single store is touched. The output is a
//! [`SavePlan`]: the product's final record set plus the ordered blob
//! operations that realize it. A plan that validates is executed as-is;
//! a plan that does not leaves both stores untouched.

use crate::config::SaveConfig;
use crate::error::SaveImagesError;
use crate::normalize::{CreateItem, UpdateItem, WorkItem};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use vitrine_model::{ImageId, ImageRecord, ObjectPath, UploadedFile, Visibility};
use vitrine_store::ProductWithImages;

/// One blob relocation: the object at `from` ends up at `to`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMove {
    /// Current location
    pub from: ObjectPath,
    /// Target location
    pub to: ObjectPath,
}

/// One blob-store operation owed by the plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlobAction {
    /// Store a new original and its generated thumbnail
    Upload {
        /// The uploaded binary
        file: UploadedFile,
        /// Where the original goes
        original: ObjectPath,
        /// Where the thumbnail goes
        thumbnail: ObjectPath,
    },
    /// Relocate an existing pair after a visibility change
    Relocate {
        /// Move of the original object
        original: PathMove,
        /// Move of the thumbnail object
        thumbnail: PathMove,
    },
}

/// A fully validated bulk save, ready to execute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavePlan {
    /// The product's complete record set after the save
    pub records: Vec<ImageRecord>,
    /// Blob operations in item order
    pub actions: Vec<BlobAction>,
}

impl SavePlan {
    /// Number of new uploads the plan will store
    #[must_use]
    pub fn upload_count(&self) -> usize {
        self.actions
            .iter()
            .filter(|a| matches!(a, BlobAction::Upload { .. }))
            .count()
    }

    /// Number of path relocations the plan will issue
    #[must_use]
    pub fn relocation_count(&self) -> usize {
        self.actions
            .iter()
            .filter(|a| matches!(a, BlobAction::Relocate { .. }))
            .count()
    }
}

/// Validate the normalized items against the loaded product and build
/// the plan
///
/// Check order is part of the contract (first violation wins): the
/// projected count, then unknown image references, then duplicated
/// references.
///
/// # Errors
/// [`SaveImagesError::LimitExceeded`], [`SaveImagesError::ImageNotFound`]
/// or [`SaveImagesError::DuplicatedImageId`].
pub fn build_plan(
    product: &ProductWithImages,
    items: Vec<WorkItem>,
    config: &SaveConfig,
    now: DateTime<Utc>,
) -> Result<SavePlan, SaveImagesError> {
    let current = product.images.iter().filter(|r| !r.is_deleted()).count();
    let creations = items.iter().filter(|i| i.is_creation()).count();
    // A delete aimed at an already-deleted record frees nothing, so only
    // deletions that transition a live record count toward the projection.
    let deletions = items
        .iter()
        .filter(|item| match item {
            WorkItem::Create(create) => create.delete,
            WorkItem::Update(update) => {
                update.delete == Some(true)
                    && product
                        .images
                        .iter()
                        .any(|r| r.id == update.image_id && !r.is_deleted())
            }
        })
        .count();
    let projected = current as i64 + creations as i64 - deletions as i64;
    if projected > config.max_images_per_product as i64 {
        return Err(SaveImagesError::LimitExceeded {
            current,
            projected: usize::try_from(projected).unwrap_or(0),
            max: config.max_images_per_product,
        });
    }

    for item in &items {
        if let WorkItem::Update(update) = item {
            // Only this product's images were loaded, so a foreign
            // product's id fails here exactly like an unknown one.
            if !product.images.iter().any(|r| r.id == update.image_id) {
                return Err(SaveImagesError::ImageNotFound(update.image_id));
            }
        }
    }

    let mut seen = HashSet::new();
    for item in &items {
        if let WorkItem::Update(update) = item {
            if !seen.insert(update.image_id) {
                return Err(SaveImagesError::DuplicatedImageId(update.image_id));
            }
        }
    }

    let mut records = product.images.clone();
    let mut actions = Vec::with_capacity(items.len());
    for item in items {
        match item {
            WorkItem::Create(create) => {
                plan_creation(product, create, now, &mut records, &mut actions);
            }
            WorkItem::Update(update) => {
                plan_update(update, now, &mut records, &mut actions)?;
            }
        }
    }

    Ok(SavePlan { records, actions })
}

fn plan_creation(
    product: &ProductWithImages,
    create: CreateItem,
    now: DateTime<Utc>,
    records: &mut Vec<ImageRecord>,
    actions: &mut Vec<BlobAction>,
) {
    let id = ImageId::new();
    let deleted_at = create.delete.then_some(now);
    let visibility = Visibility::derive(create.active, deleted_at.is_some());
    let extension = create.file.extension().map(str::to_string);
    let original = ObjectPath::resolve(
        visibility,
        &product.id,
        &id,
        extension.as_deref(),
        false,
    );
    let thumbnail = ObjectPath::resolve(
        visibility,
        &product.id,
        &id,
        extension.as_deref(),
        true,
    );

    records.push(ImageRecord {
        id,
        product_id: product.id,
        name: create.name,
        description: create.description,
        original_path: original.clone(),
        thumbnail_path: thumbnail.clone(),
        active: create.active,
        main: create.main,
        deleted_at,
    });
    actions.push(BlobAction::Upload {
        file: create.file,
        original,
        thumbnail,
    });
}

fn plan_update(
    update: UpdateItem,
    now: DateTime<Utc>,
    records: &mut [ImageRecord],
    actions: &mut Vec<BlobAction>,
) -> Result<(), SaveImagesError> {
    let Some(record) = records.iter_mut().find(|r| r.id == update.image_id) else {
        return Err(SaveImagesError::ImageNotFound(update.image_id));
    };

    let before = record.visibility();

    // Partial patch: only fields the caller declared are touched.
    if let Some(name) = update.name {
        record.name = Some(name);
    }
    if let Some(description) = update.description {
        record.description = Some(description);
    }
    if let Some(main) = update.main {
        record.main = main;
    }
    if let Some(active) = update.active {
        record.active = active;
    }
    // The delete flag only ever sets; `delete: false` never resurrects,
    // and an already-deleted record keeps its original timestamp.
    if update.delete == Some(true) && record.deleted_at.is_none() {
        record.deleted_at = Some(now);
    }

    if record.visibility() != before {
        let from_original = record.original_path.clone();
        let from_thumbnail = record.thumbnail_path.clone();
        let (to_original, to_thumbnail) = record.resolved_paths();
        record.relocate(to_original.clone(), to_thumbnail.clone());
        actions.push(BlobAction::Relocate {
            original: PathMove {
                from: from_original,
                to: to_original,
            },
            thumbnail: PathMove {
                from: from_thumbnail,
                to: to_thumbnail,
            },
        });
    }

    Ok(())
}
