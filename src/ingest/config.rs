//! Run configuration for the ingestion pipeline

use crate::database::Collection;
use crate::database::config::{
    DEFAULT_BATCH_SIZE, DEFAULT_COLLECTION, DEFAULT_DISPLAY_FIELD, DEFAULT_KEY_FIELD,
    DEFAULT_TAG_FIELD, IngestSection,
};
use crate::validation::{
    ValidationResult, validate_batch_size, validate_collection_name, validate_field_name,
};

/// Validated settings for an [`IngestionPipeline`](super::IngestionPipeline)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestConfig {
    /// Target collection and its natural key field
    pub collection: Collection,
    /// Field shown next to each skipped duplicate
    pub display_field: String,
    /// Field stamped with the run tag
    pub tag_field: String,
    /// Records per bulk insert
    pub batch_size: usize,
    /// Fields the first record must carry
    pub required_fields: Vec<String>,
}

impl IngestConfig {
    /// Start building a configuration from the defaults
    pub fn builder() -> IngestConfigBuilder {
        IngestConfigBuilder::default()
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            collection: Collection::new(DEFAULT_COLLECTION, DEFAULT_KEY_FIELD),
            display_field: DEFAULT_DISPLAY_FIELD.to_string(),
            tag_field: DEFAULT_TAG_FIELD.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            required_fields: vec![
                DEFAULT_DISPLAY_FIELD.to_string(),
                DEFAULT_KEY_FIELD.to_string(),
            ],
        }
    }
}

/// Builder for [`IngestConfig`]
#[derive(Debug, Clone, Default)]
pub struct IngestConfigBuilder {
    config: IngestConfig,
}

impl IngestConfigBuilder {
    pub fn collection(mut self, name: impl Into<String>) -> Self {
        self.config.collection.name = name.into();
        self
    }

    pub fn key_field(mut self, field: impl Into<String>) -> Self {
        self.config.collection.key_field = field.into();
        self
    }

    pub fn display_field(mut self, field: impl Into<String>) -> Self {
        self.config.display_field = field.into();
        self
    }

    pub fn tag_field(mut self, field: impl Into<String>) -> Self {
        self.config.tag_field = field.into();
        self
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.config.batch_size = batch_size;
        self
    }

    /// Replace the required field set
    pub fn required_fields<I, T>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.config.required_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Validate and produce the configuration
    pub fn build(self) -> ValidationResult<IngestConfig> {
        let config = self.config;
        validate_collection_name(&config.collection.name)?;
        validate_field_name("key field", &config.collection.key_field)?;
        validate_field_name("display field", &config.display_field)?;
        validate_field_name("tag field", &config.tag_field)?;
        validate_batch_size(config.batch_size)?;
        for field in &config.required_fields {
            validate_field_name("required field", field)?;
        }
        Ok(config)
    }
}

impl From<&IngestSection> for IngestConfigBuilder {
    fn from(section: &IngestSection) -> Self {
        IngestConfig::builder()
            .collection(section.collection.as_str())
            .key_field(section.key_field.as_str())
            .display_field(section.display_field.as_str())
            .tag_field(section.tag_field.as_str())
            .batch_size(section.batch_size)
            .required_fields(section.required_fields.iter().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationError;

    #[test]
    fn test_defaults_are_valid() {
        let config = IngestConfig::builder().build().unwrap();
        assert_eq!(config, IngestConfig::default());
        assert_eq!(config.collection.key_field, "phoneNumber");
        assert_eq!(config.batch_size, 500);
    }

    #[test]
    fn test_builder_overrides() {
        let config = IngestConfig::builder()
            .collection("enquiries")
            .key_field("email")
            .batch_size(10)
            .required_fields(["email"])
            .build()
            .unwrap();
        assert_eq!(config.collection, Collection::new("enquiries", "email"));
        assert_eq!(config.required_fields, vec!["email"]);
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let err = IngestConfig::builder().batch_size(0).build().unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { .. }));
    }

    #[test]
    fn test_empty_key_field_rejected() {
        let err = IngestConfig::builder().key_field("").build().unwrap_err();
        assert_eq!(err, ValidationError::Empty("key field"));
    }

    #[test]
    fn test_invalid_collection_rejected() {
        assert!(IngestConfig::builder().collection("leads; drop").build().is_err());
    }

    #[test]
    fn test_from_section() {
        let section = IngestSection {
            batch_size: 25,
            ..Default::default()
        };
        let config = IngestConfigBuilder::from(&section).build().unwrap();
        assert_eq!(config.batch_size, 25);
        assert_eq!(config.tag_field, "source");
    }
}
