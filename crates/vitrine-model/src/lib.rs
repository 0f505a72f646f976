//! Domain types for the product-image subsystem
//!
//! Leaf crate of the workspace. Holds the types shared by the stores and
//! the reconciliation engine:
//! - Typed identifiers ([`ProductId`], [`ImageId`])
//! - Derived visibility state ([`Visibility`])
//! - Storage object paths ([`ObjectPath`])
//! - Upload payloads ([`UploadedFile`], [`DerivedImage`])
//! - Persisted image records ([`ImageRecord`])
//!
//! No I/O and no async here; everything is plain data and pure functions.

pub mod id;
pub mod path;
pub mod record;
pub mod upload;
pub mod visibility;

pub use id::{IdError, ImageId, ProductId};
pub use path::ObjectPath;
pub use record::ImageRecord;
pub use upload::{DerivedImage, UploadError, UploadedFile};
pub use visibility::Visibility;
