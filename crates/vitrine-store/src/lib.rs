//! Storage collaborators of the product-image subsystem
//!
//! The reconciliation engine talks to four external resources. This crate
//! defines their contracts and ships in-memory reference implementations:
//! - [`ProductLookup`] — loads a parent product with its images
//! - [`BlobStore`] — path-addressed object storage (save / move)
//! - [`ThumbnailGenerator`] — derives a thumbnail from an upload
//! - [`ImageRepository`] — batch save + ordered listing of image records
//!
//! Production deployments supply their own implementations (object
//! storage client, relational repository); the in-memory ones back the
//! test suites and the simulator binary.

pub mod contracts;
pub mod memory;

pub use contracts::{
    BlobStore, ImageOrder, ImageRepository, ProductLookup, ProductWithImages, RepositoryError,
    StorageError, ThumbnailError, ThumbnailGenerator,
};
pub use memory::{MemoryBlobStore, MemoryImageRepository, MemoryProductCatalog, MemoryThumbnailer};
