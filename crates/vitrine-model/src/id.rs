//! Typed identifiers for products and images
//!
//! Identifiers arrive from the request layer as strings and are parsed
//! exactly once at the boundary. The rest of the workspace only ever sees
//! the typed forms, so downstream code (path resolution, repositories)
//! never re-validates.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

/// Errors raised while parsing an identifier from its string form
///
/// "Absent" and "malformed" are distinct so the caller can surface the
/// matching rejection ("required" vs "invalid format").
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// The identifier string was empty
    #[error("{0} is required")]
    Required(&'static str),

    /// The identifier string was not a well-formed id
    #[error("{kind} has invalid format: {value}")]
    InvalidFormat {
        /// Which identifier failed
        kind: &'static str,
        /// The offending input
        value: String,
    },
}

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident, $label:literal) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a fresh random identifier
            #[inline]
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Access the underlying uuid
            #[inline]
            #[must_use]
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                if s.is_empty() {
                    return Err(IdError::Required($label));
                }
                Uuid::parse_str(s)
                    .map(Self)
                    .map_err(|_| IdError::InvalidFormat {
                        kind: $label,
                        value: s.to_string(),
                    })
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }
    };
}

uuid_id!(
    /// Identifier of a parent product
    ProductId,
    "product id"
);

uuid_id!(
    /// Identifier of one stored image
    ImageId,
    "image id"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_id_roundtrip() {
        let id = ProductId::new();
        let parsed: ProductId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn empty_is_required_error() {
        let result: Result<ProductId, _> = "".parse();
        assert_eq!(result, Err(IdError::Required("product id")));
    }

    #[test]
    fn malformed_is_invalid_format() {
        let result: Result<ImageId, _> = "not-a-uuid".parse();
        assert!(matches!(result, Err(IdError::InvalidFormat { kind, .. }) if kind == "image id"));
    }

    #[test]
    fn ids_are_unique() {
        assert_ne!(ImageId::new(), ImageId::new());
    }

    #[test]
    fn serde_transparent() {
        let id = ImageId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id));
    }
}
