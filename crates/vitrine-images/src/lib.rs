//! Bulk product-image reconciliation
//!
//! Two-phase design:
//! 1. **Plan phase**: parse the boundary input, normalize files against
//!    metadata, and validate every invariant over the in-memory snapshot
//! 2. **Apply phase**: execute the validated plan against the blob store
//!    and the image repository, one item at a time
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use vitrine_images::prelude::*;
//!
//! let reconciler = ImageReconciler::new(catalog, blobs, thumbnails, repository);
//! let records = reconciler
//!     .bulk_save(&product_id, Some(files), &payload)
//!     .await?;
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod locks;
pub mod normalize;
pub mod payload;
pub mod plan;
pub mod simulator;

pub use config::SaveConfig;
pub use engine::ImageReconciler;
pub use error::{ErrorKind, NormalizeError, PayloadError, SaveImagesError};

/// Re-exports for convenience
pub mod prelude {
    pub use crate::config::SaveConfig;
    pub use crate::engine::ImageReconciler;
    pub use crate::error::{ErrorKind, NormalizeError, PayloadError, SaveImagesError};
    pub use crate::normalize::{normalize, CreateItem, UpdateItem, WorkItem};
    pub use crate::payload::{ImageDirective, SavePayload};
    pub use crate::plan::{build_plan, BlobAction, PathMove, SavePlan};
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
