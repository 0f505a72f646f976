//! Storage object paths
//!
//! Every stored blob (original or thumbnail) lives at a deterministic
//! path derived from the owning record:
//!
//! ```text
//! /{visibility}/products/{product_id}/images/{image_id}[.thumbnail][.{ext}]
//! ```
//!
//! The visibility prefix is part of the path on purpose: relocating an
//! image between `public`, `private` and `deleted` is a blob-store move,
//! and a record's pair of paths always encodes the same state and id.

use crate::id::{ImageId, ProductId};
use crate::visibility::Visibility;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Marker segment distinguishing a thumbnail object from its original
const THUMBNAIL_SEGMENT: &str = "thumbnail";

/// A resolved location in the blob store
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectPath(String);

impl ObjectPath {
    /// Resolve the storage path for one image object
    ///
    /// Pure function of its inputs; identifier validity is guaranteed by
    /// the typed ids, so resolution cannot fail.
    ///
    /// # Examples
    /// - original, `jpg`: `/public/products/<pid>/images/<iid>.jpg`
    /// - thumbnail, no extension: `/deleted/products/<pid>/images/<iid>.thumbnail`
    #[must_use]
    pub fn resolve(
        visibility: Visibility,
        product_id: &ProductId,
        image_id: &ImageId,
        extension: Option<&str>,
        thumbnail: bool,
    ) -> Self {
        let mut path = format!(
            "/{}/products/{}/images/{}",
            visibility.as_str(),
            product_id,
            image_id
        );
        if thumbnail {
            path.push('.');
            path.push_str(THUMBNAIL_SEGMENT);
        }
        if let Some(ext) = extension {
            path.push('.');
            path.push_str(ext);
        }
        Self(path)
    }

    /// Path as a string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this path addresses a thumbnail object
    #[must_use]
    pub fn is_thumbnail(&self) -> bool {
        self.suffix_segments().any(|s| s == THUMBNAIL_SEGMENT)
    }

    /// Recover the file extension encoded in the path, if any
    ///
    /// Used when relocating an existing record: the new paths must carry
    /// the extension of the originally uploaded file.
    #[must_use]
    pub fn extension(&self) -> Option<&str> {
        self.suffix_segments().filter(|s| *s != THUMBNAIL_SEGMENT).last()
    }

    /// Leading visibility segment, when the path carries a known one
    #[must_use]
    pub fn visibility_segment(&self) -> Option<&str> {
        let segment = self.0.strip_prefix('/')?.split('/').next()?;
        matches!(segment, "public" | "private" | "deleted").then_some(segment)
    }

    /// Dot-separated suffix segments after the file stem
    fn suffix_segments(&self) -> impl Iterator<Item = &str> {
        let name = self.0.rsplit('/').next().unwrap_or(&self.0);
        name.split('.').skip(1)
    }
}

impl Display for ObjectPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
