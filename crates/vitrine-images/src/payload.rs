//! Boundary parse of the metadata container
//!
//! The request layer hands the container over as loose JSON. It is
//! parsed exactly once, here, into a typed [`SavePayload`]; everything
//! past this point works with typed directives. The parse distinguishes
//! "not defined" (null) from "not an object" (array, scalar) from a
//! specific field violation, because the request layer reports each
//! differently.

use crate::error::PayloadError;
use serde_json::Value;
use vitrine_model::ImageId;

/// One metadata item as declared by the caller
///
/// Booleans are tri-state: `None` means the caller did not mention the
/// field, which an update interprets as "leave untouched".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ImageDirective {
    /// Existing image this item patches; absent for creations
    pub image_id: Option<ImageId>,
    /// Position of the uploaded file this item describes; absent for updates
    pub file_index: Option<usize>,
    /// Display name to set
    pub name: Option<String>,
    /// Description to set
    pub description: Option<String>,
    /// Main flag to set
    pub main: Option<bool>,
    /// Active flag to set
    pub active: Option<bool>,
    /// Soft-deletion intent
    pub delete: Option<bool>,
}

/// The parsed metadata container
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SavePayload {
    /// Declared items, order preserved
    pub items: Vec<ImageDirective>,
}

impl SavePayload {
    /// Parse the raw container
    ///
    /// # Errors
    /// A [`PayloadError`] naming the first violation: the container
    /// shape, the `items` list, or a specific item field.
    pub fn parse(value: &Value) -> Result<Self, PayloadError> {
        let object = match value {
            Value::Null => return Err(PayloadError::NotDefined),
            Value::Object(map) => map,
            other => return Err(PayloadError::NotAnObject(json_type(other))),
        };

        let mut items_value = None;
        for (key, val) in object {
            match key.as_str() {
                "items" => items_value = Some(val),
                other => return Err(PayloadError::UnknownField(other.to_string())),
            }
        }

        let items_value = items_value.ok_or(PayloadError::MissingItems)?;
        let raw_items = items_value
            .as_array()
            .ok_or_else(|| PayloadError::ItemsNotAnArray(json_type(items_value)))?;

        let items = raw_items
            .iter()
            .enumerate()
            .map(|(index, raw)| parse_item(index, raw))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { items })
    }

    /// Whether the caller declared no items at all
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

fn parse_item(index: usize, raw: &Value) -> Result<ImageDirective, PayloadError> {
    let object = match raw {
        Value::Object(map) => map,
        other => return Err(PayloadError::ItemNotAnObject(index, json_type(other))),
    };

    let mut item = ImageDirective::default();
    for (key, val) in object {
        // Explicit nulls are treated as absent, the way optional DTO
        // fields arrive from permissive clients.
        if val.is_null() {
            continue;
        }
        match key.as_str() {
            "imageId" => {
                let s = expect_str(index, "imageId", val)?;
                item.image_id = Some(s.parse().map_err(|_| PayloadError::BadImageId {
                    index,
                    value: s.to_string(),
                })?);
            }
            "fileIndex" => {
                let n = val
                    .as_u64()
                    .ok_or(PayloadError::WrongFieldType {
                        index,
                        field: "fileIndex",
                        expected: "non-negative integer",
                    })?;
                item.file_index = Some(n as usize);
            }
            "name" => item.name = Some(expect_str(index, "name", val)?.to_string()),
            "description" => {
                item.description = Some(expect_str(index, "description", val)?.to_string());
            }
            "main" => item.main = Some(expect_bool(index, "main", val)?),
            "active" => item.active = Some(expect_bool(index, "active", val)?),
            "delete" => item.delete = Some(expect_bool(index, "delete", val)?),
            other => {
                return Err(PayloadError::UnknownItemField {
                    index,
                    field: other.to_string(),
                })
            }
        }
    }

    Ok(item)
}

fn expect_str<'v>(index: usize, field: &'static str, val: &'v Value) -> Result<&'v str, PayloadError> {
    val.as_str().ok_or(PayloadError::WrongFieldType {
        index,
        field,
        expected: "string",
    })
}

fn expect_bool(index: usize, field: &'static str, val: &Value) -> Result<bool, PayloadError> {
    val.as_bool().ok_or(PayloadError::WrongFieldType {
        index,
        field,
        expected: "boolean",
    })
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
