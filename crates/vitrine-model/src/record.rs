//! Persisted image records
//!
//! An [`ImageRecord`] is one row of the image table, owned by exactly one
//! parent product. Deletion is soft: `deleted_at` marks the record, the
//! row and its blobs stay.

use crate::id::{ImageId, ProductId};
use crate::path::ObjectPath;
use crate::visibility::Visibility;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One stored image belonging to a parent product
///
/// # Invariant
/// `original_path` and `thumbnail_path` always encode the same visibility
/// state and the same `id`; they are only ever rewritten together via
/// [`ImageRecord::relocate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// Engine-assigned identifier, immutable after creation
    pub id: ImageId,
    /// Owning product, immutable
    pub product_id: ProductId,
    /// Optional display text
    pub name: Option<String>,
    /// Optional longer description
    pub description: Option<String>,
    /// Storage path of the full image
    pub original_path: ObjectPath,
    /// Storage path of the derived thumbnail
    pub thumbnail_path: ObjectPath,
    /// Whether the image is publicly served
    pub active: bool,
    /// Whether the image is flagged as the product's main one
    ///
    /// No uniqueness enforced; several images may carry the flag.
    pub main: bool,
    /// Soft-deletion timestamp; `Some` means deleted
    pub deleted_at: Option<DateTime<Utc>>,
}

impl ImageRecord {
    /// Derived visibility state, never stored
    #[inline]
    #[must_use]
    pub fn visibility(&self) -> Visibility {
        Visibility::derive(self.active, self.deleted_at.is_some())
    }

    /// Whether the record is soft-deleted
    #[inline]
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Rewrite both storage paths together
    pub fn relocate(&mut self, original: ObjectPath, thumbnail: ObjectPath) {
        self.original_path = original;
        self.thumbnail_path = thumbnail;
    }

    /// Re-resolve both paths for the record's current visibility
    ///
    /// The extension is recovered from the current original path so a
    /// relocation preserves whatever the upload originally carried.
    #[must_use]
    pub fn resolved_paths(&self) -> (ObjectPath, ObjectPath) {
        let visibility = self.visibility();
        let extension = self.original_path.extension().map(str::to_string);
        let original = ObjectPath::resolve(
            visibility,
            &self.product_id,
            &self.id,
            extension.as_deref(),
            false,
        );
        let thumbnail = ObjectPath::resolve(
            visibility,
            &self.product_id,
            &self.id,
            extension.as_deref(),
            true,
        );
        (original, thumbnail)
    }
}
