//! Derived visibility state of an image
//!
//! Visibility is never stored. It is computed from `(active, deleted_at)`
//! so the stored flags and the storage-path prefix can never disagree.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Where an image lives in the blob store and who may see it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Active image, served publicly
    Public,
    /// Inactive image, reachable by staff only
    Private,
    /// Soft-deleted image, retained but hidden
    Deleted,
}

impl Visibility {
    /// Derive visibility from the record flags
    ///
    /// Deletion dominates: a soft-deleted image is `Deleted` regardless
    /// of its `active` flag.
    #[inline]
    #[must_use]
    pub fn derive(active: bool, deleted: bool) -> Self {
        if deleted {
            Self::Deleted
        } else if active {
            Self::Public
        } else {
            Self::Private
        }
    }

    /// Path segment used by the object-path resolver
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
            Self::Deleted => "deleted",
        }
    }
}

impl Display for Visibility {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deletion_dominates_active() {
        assert_eq!(Visibility::derive(true, true), Visibility::Deleted);
        assert_eq!(Visibility::derive(false, true), Visibility::Deleted);
    }

    #[test]
    fn active_maps_to_public() {
        assert_eq!(Visibility::derive(true, false), Visibility::Public);
        assert_eq!(Visibility::derive(false, false), Visibility::Private);
    }

    #[test]
    fn segment_names() {
        assert_eq!(Visibility::Public.to_string(), "public");
        assert_eq!(Visibility::Deleted.as_str(), "deleted");
    }
}
