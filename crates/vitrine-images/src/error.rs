//! Error taxonomy of the bulk save routine
//!
//! Every rejection maps to a coarse [`ErrorKind`] so the request layer
//! can pick the right external status without parsing messages. Layered
//! enums mirror the stages of a call: payload parsing, normalization,
//! then the save itself.

use vitrine_model::{IdError, ImageId, ProductId, UploadError};
use vitrine_store::{RepositoryError, StorageError, ThumbnailError};

/// Coarse classification of a save failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The request was malformed (ids, payload shape, field limits)
    InvalidArgument,
    /// A referenced resource does not exist for this caller
    NotFound,
    /// The request conflicts with current state (limits, duplicates, contention)
    Conflict,
    /// A storage collaborator failed; the call may have partially completed
    Storage,
}

/// Errors raised while parsing the metadata container
///
/// The container arrives as loose JSON; this taxonomy distinguishes the
/// shapes the request layer must report differently.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayloadError {
    /// The container was null or missing entirely
    #[error("image data is not defined")]
    NotDefined,

    /// The container was present but not an object
    #[error("image data must be an object, got {0}")]
    NotAnObject(&'static str),

    /// The container had no `items` list
    #[error("image data is missing the `items` list")]
    MissingItems,

    /// The container carried a field outside its schema
    #[error("image data field `{0}` is not recognized")]
    UnknownField(String),

    /// `items` was present but not an array
    #[error("`items` must be an array, got {0}")]
    ItemsNotAnArray(&'static str),

    /// An item was not an object
    #[error("item {0} must be an object, got {1}")]
    ItemNotAnObject(usize, &'static str),

    /// An item carried a field outside its schema
    #[error("item {index}: field `{field}` is not recognized")]
    UnknownItemField {
        /// Position of the item in the list
        index: usize,
        /// The unrecognized field name
        field: String,
    },

    /// An item field had the wrong JSON type
    #[error("item {index}: `{field}` must be a {expected}")]
    WrongFieldType {
        /// Position of the item in the list
        index: usize,
        /// Field that failed
        field: &'static str,
        /// Expected JSON type
        expected: &'static str,
    },

    /// An item's image id was not identifier-shaped
    #[error("item {index}: image id {value:?} has invalid format")]
    BadImageId {
        /// Position of the item in the list
        index: usize,
        /// The offending value
        value: String,
    },
}

/// Errors raised while merging files and metadata items
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NormalizeError {
    /// A file list was supplied but contained nothing
    #[error("file list was supplied but is empty")]
    EmptyFileList,

    /// An upload was structurally malformed
    #[error(transparent)]
    MalformedUpload(#[from] UploadError),

    /// An item referenced a file position with no corresponding upload
    #[error("item {index} references file {file_index}, but no such file was supplied")]
    FileNotSupplied {
        /// Position of the item in the list
        index: usize,
        /// The referenced file position
        file_index: usize,
    },

    /// Two items claimed the same uploaded file
    #[error("item {index} references file {file_index}, which is already claimed")]
    DuplicateFileIndex {
        /// Position of the later item
        index: usize,
        /// The contested file position
        file_index: usize,
    },

    /// An item supplied both an image id and a new file
    #[error("item {index} supplies both an image id and a new file")]
    FileWithImageId {
        /// Position of the item in the list
        index: usize,
    },

    /// An item referenced neither an image nor an uploaded file
    #[error("item {index} references neither an image nor an uploaded file")]
    UnboundItem {
        /// Position of the item in the list
        index: usize,
    },

    /// An item's name exceeded the configured cap
    #[error("item {index}: name exceeds {max} characters")]
    NameTooLong {
        /// Position of the item in the list
        index: usize,
        /// Configured cap
        max: usize,
    },

    /// An item's description exceeded the configured cap
    #[error("item {index}: description exceeds {max} characters")]
    DescriptionTooLong {
        /// Position of the item in the list
        index: usize,
        /// Configured cap
        max: usize,
    },
}

/// Top-level error of [`bulk_save`](crate::engine::ImageReconciler::bulk_save)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SaveImagesError {
    /// The product id was absent or malformed
    #[error(transparent)]
    Id(#[from] IdError),

    /// The metadata container failed to parse
    #[error(transparent)]
    Payload(#[from] PayloadError),

    /// The parent product does not exist
    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    /// Neither files nor metadata items were supplied
    #[error("nothing to save: no files and no image items")]
    NothingToSave,

    /// File/metadata merging failed
    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    /// An item referenced an image this product does not own
    #[error("image {0} not found for this product")]
    ImageNotFound(ImageId),

    /// Two items referenced the same existing image
    #[error("image {0} is referenced more than once")]
    DuplicatedImageId(ImageId),

    /// The save would exceed the per-product image cap
    #[error("saving would leave {projected} images, above the maximum of {max}")]
    LimitExceeded {
        /// Non-deleted images before the save
        current: usize,
        /// Projected count after creates and deletes
        projected: usize,
        /// Configured cap
        max: usize,
    },

    /// Another save for the same product is in flight
    #[error("another save for product {0} is in progress")]
    Busy(ProductId),

    /// Blob store failure, propagated unmodified
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Thumbnail generation failure, propagated unmodified
    #[error(transparent)]
    Thumbnail(#[from] ThumbnailError),

    /// Repository failure, propagated unmodified
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl SaveImagesError {
    /// Classify the failure for the request layer
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Id(_) | Self::Payload(_) | Self::NothingToSave => ErrorKind::InvalidArgument,
            // A dangling file reference reads as "referenced image not
            // found" to the caller; every other normalizer rejection is
            // a shape problem.
            Self::Normalize(NormalizeError::FileNotSupplied { .. }) => ErrorKind::NotFound,
            Self::Normalize(_) => ErrorKind::InvalidArgument,
            Self::ProductNotFound(_) | Self::ImageNotFound(_) => ErrorKind::NotFound,
            Self::DuplicatedImageId(_) | Self::LimitExceeded { .. } | Self::Busy(_) => {
                ErrorKind::Conflict
            }
            Self::Storage(_) | Self::Thumbnail(_) | Self::Repository(_) => ErrorKind::Storage,
        }
    }

    /// Whether the caller may simply retry the identical call
    ///
    /// Only contention qualifies: storage failures can leave partial
    /// state behind, so a blind retry is not safe.
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Busy(_))
    }
}
