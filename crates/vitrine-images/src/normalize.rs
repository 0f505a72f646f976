//! Merging uploaded files with declared metadata items
//!
//! Produces one [`WorkItem`] per eventual image: declared items first in
//! their original order, then a synthesized default creation for every
//! uploaded file no item claimed. Pure; the first violation wins.

use crate::config::SaveConfig;
use crate::error::NormalizeError;
use crate::payload::ImageDirective;
use vitrine_model::{ImageId, UploadedFile};

/// A creation: a new upload plus its declared (or defaulted) metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateItem {
    /// The uploaded binary this record will be created from
    pub file: UploadedFile,
    /// Display name, when declared
    pub name: Option<String>,
    /// Description, when declared
    pub description: Option<String>,
    /// Main flag, defaulted to false
    pub main: bool,
    /// Active flag, defaulted to false
    pub active: bool,
    /// Immediate soft-deletion intent, defaulted to false
    pub delete: bool,
}

/// A partial patch against an existing record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateItem {
    /// The record being patched
    pub image_id: ImageId,
    /// New name, when declared
    pub name: Option<String>,
    /// New description, when declared
    pub description: Option<String>,
    /// New main flag, when declared
    pub main: Option<bool>,
    /// New active flag, when declared
    pub active: Option<bool>,
    /// Soft-deletion intent, when declared
    pub delete: Option<bool>,
}

/// One normalized reconciliation input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkItem {
    /// Create a record from a new upload
    Create(CreateItem),
    /// Patch (possibly soft-delete) an existing record
    Update(UpdateItem),
}

impl WorkItem {
    /// Whether this item adds a record
    #[inline]
    #[must_use]
    pub fn is_creation(&self) -> bool {
        matches!(self, Self::Create(_))
    }
}

/// Merge files and directives into normalized work items
///
/// Files are moved into the creation items that claim them, so the
/// "every supplied file is referenced by exactly one item" invariant is
/// also what makes the move total.
///
/// # Errors
/// The first violation, in declaration order: empty file list, malformed
/// upload, over-long fields, exclusivity breaches, dangling or contested
/// file references, items bound to nothing.
pub fn normalize(
    files: Option<Vec<UploadedFile>>,
    directives: &[ImageDirective],
    limits: &SaveConfig,
) -> Result<Vec<WorkItem>, NormalizeError> {
    if let Some(files) = &files {
        if files.is_empty() {
            return Err(NormalizeError::EmptyFileList);
        }
        for (position, file) in files.iter().enumerate() {
            file.ensure_well_formed(position)?;
        }
    }

    // Each slot is taken by the first item claiming it; leftovers become
    // synthesized default creations.
    let mut slots: Option<Vec<Option<UploadedFile>>> =
        files.map(|fs| fs.into_iter().map(Some).collect());

    let mut items = Vec::with_capacity(directives.len());
    for (index, directive) in directives.iter().enumerate() {
        check_lengths(index, directive, limits)?;

        match (directive.file_index, directive.image_id) {
            (Some(_), Some(_)) => return Err(NormalizeError::FileWithImageId { index }),
            (Some(file_index), None) => {
                let slot = slots
                    .as_mut()
                    .and_then(|s| s.get_mut(file_index))
                    .ok_or(NormalizeError::FileNotSupplied { index, file_index })?;
                let file = slot
                    .take()
                    .ok_or(NormalizeError::DuplicateFileIndex { index, file_index })?;
                items.push(WorkItem::Create(CreateItem {
                    file,
                    name: directive.name.clone(),
                    description: directive.description.clone(),
                    main: directive.main.unwrap_or(false),
                    active: directive.active.unwrap_or(false),
                    delete: directive.delete.unwrap_or(false),
                }));
            }
            (None, Some(image_id)) => items.push(WorkItem::Update(UpdateItem {
                image_id,
                name: directive.name.clone(),
                description: directive.description.clone(),
                main: directive.main,
                active: directive.active,
                delete: directive.delete,
            })),
            (None, None) => return Err(NormalizeError::UnboundItem { index }),
        }
    }

    // Unclaimed files, in file order, get structural defaults.
    if let Some(slots) = slots {
        for file in slots.into_iter().flatten() {
            items.push(WorkItem::Create(CreateItem {
                file,
                name: None,
                description: None,
                main: false,
                active: false,
                delete: false,
            }));
        }
    }

    Ok(items)
}

fn check_lengths(
    index: usize,
    directive: &ImageDirective,
    limits: &SaveConfig,
) -> Result<(), NormalizeError> {
    if let Some(name) = &directive.name {
        if name.chars().count() > limits.max_name_len {
            return Err(NormalizeError::NameTooLong {
                index,
                max: limits.max_name_len,
            });
        }
    }
    if let Some(description) = &directive.description {
        if description.chars().count() > limits.max_description_len {
            return Err(NormalizeError::DescriptionTooLong {
                index,
                max: limits.max_description_len,
            });
        }
    }
    Ok(())
}
