//! Engine configuration

use serde::Deserialize;

/// Limits consumed by the reconciliation engine
///
/// Deserializable so deployments can load it from their service config;
/// defaults match the catalog's standard tier.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SaveConfig {
    /// Maximum images one product may own after a save
    pub max_images_per_product: usize,
    /// Maximum length of an image name, in characters
    pub max_name_len: usize,
    /// Maximum length of an image description, in characters
    pub max_description_len: usize,
}

impl SaveConfig {
    /// Configuration with default limits
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the per-product image cap
    #[inline]
    #[must_use]
    pub fn with_max_images(mut self, max: usize) -> Self {
        self.max_images_per_product = max;
        self
    }

    /// Override the name length cap
    #[inline]
    #[must_use]
    pub fn with_max_name_len(mut self, max: usize) -> Self {
        self.max_name_len = max;
        self
    }

    /// Override the description length cap
    #[inline]
    #[must_use]
    pub fn with_max_description_len(mut self, max: usize) -> Self {
        self.max_description_len = max;
        self
    }
}

impl Default for SaveConfig {
    fn default() -> Self {
        Self {
            max_images_per_product: 10,
            max_name_len: 120,
            max_description_len: 1000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SaveConfig::new();
        assert_eq!(config.max_images_per_product, 10);
        assert_eq!(config.max_name_len, 120);
    }

    #[test]
    fn builders_override() {
        let config = SaveConfig::new().with_max_images(3).with_max_name_len(8);
        assert_eq!(config.max_images_per_product, 3);
        assert_eq!(config.max_name_len, 8);
        assert_eq!(config.max_description_len, 1000);
    }

    #[test]
    fn deserialize_partial() {
        let config: SaveConfig =
            serde_json::from_str(r#"{"max_images_per_product": 5}"#).unwrap();
        assert_eq!(config.max_images_per_product, 5);
        assert_eq!(config.max_description_len, 1000);
    }
}
