use serde_json::Value;

use crate::validate::ValidationError;

/// Required string fields of `config.json`, in reporting order.
pub const REQUIRED_FIELDS: &[&str] = &["name", "version", "description", "previewImage"];

/// The parsed theme manifest.
///
/// The four required fields are lifted out for the record; the full
/// document is kept as `metadata` so manifest fields added by newer themes
/// survive a round-trip through the registry.
#[derive(Clone, Debug)]
pub struct Manifest {
    pub name: String,
    pub version: String,
    pub description: String,
    pub preview_image: String,
    pub metadata: Value,
}

impl Manifest {
    /// Parse manifest bytes, checking that every required field is present,
    /// a string, and non-empty. Errors name the exact offending field.
    pub fn parse(bytes: &[u8]) -> Result<Self, ValidationError> {
        let metadata: Value =
            serde_json::from_slice(bytes).map_err(ValidationError::ManifestParse)?;

        let mut fields = Vec::with_capacity(REQUIRED_FIELDS.len());
        for &name in REQUIRED_FIELDS {
            let value = metadata
                .get(name)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .ok_or(ValidationError::MissingField { name })?;
            fields.push(value.to_string());
        }

        let mut fields = fields.into_iter();
        Ok(Self {
            name: fields.next().unwrap_or_default(),
            version: fields.next().unwrap_or_default(),
            description: fields.next().unwrap_or_default(),
            preview_image: fields.next().unwrap_or_default(),
            metadata,
        })
    }
}
