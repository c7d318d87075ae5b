//! Per-type field schemas.
//!
//! Schemas come from configuration and are read-only at request time. A
//! [`SchemaRegistry`] holds a default schema and optional per-type
//! overrides, and is usually deserialized from the `[schema]` section of
//! the TOML config.

use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;

use crate::value::Value;

/// Field rules for one asset type.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AssetTypeSchema {
    /// Fields that must be present when an asset is created.
    pub required_fields: BTreeSet<String>,

    /// Fields restricted to a set of allowed values.
    pub enforced_fields: BTreeMap<String, Vec<Value>>,

    /// Whether creating the first asset of an unseen type requires admin.
    pub auto_create_requires_admin: bool,
}

impl Default for AssetTypeSchema {
    fn default() -> Self {
        Self {
            required_fields: BTreeSet::new(),
            enforced_fields: BTreeMap::new(),
            auto_create_requires_admin: true,
        }
    }
}

impl AssetTypeSchema {
    /// Add a required field.
    pub fn require(mut self, field: impl Into<String>) -> Self {
        self.required_fields.insert(field.into());
        self
    }

    /// Restrict a field to the given values.
    pub fn enforce<I, V>(mut self, field: impl Into<String>, allowed: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.enforced_fields
            .insert(field.into(), allowed.into_iter().map(Into::into).collect());
        self
    }

    /// Set whether unseen types can only be created by admins.
    pub fn with_auto_create_requires_admin(mut self, required: bool) -> Self {
        self.auto_create_requires_admin = required;
        self
    }

    /// Check a value against the allowed set of an enforced field.
    ///
    /// Lists pass when every element is allowed. Fields without a rule
    /// always pass.
    pub fn allows(&self, field: &str, value: &Value) -> bool {
        let Some(allowed) = self.enforced_fields.get(field) else {
            return true;
        };
        match value {
            Value::List(items) => items.iter().all(|item| allowed.contains(item)),
            other => allowed.contains(other),
        }
    }
}

/// Read-only lookup of the schema that applies to an asset type.
pub trait SchemaProvider: Send + Sync {
    fn schema(&self, asset_type: &str) -> &AssetTypeSchema;
}

/// Default schema plus per-type overrides.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SchemaRegistry {
    #[serde(flatten)]
    default: AssetTypeSchema,

    #[serde(default)]
    types: BTreeMap<String, AssetTypeSchema>,
}

impl SchemaRegistry {
    /// Registry where every type uses `default`.
    pub fn new(default: AssetTypeSchema) -> Self {
        Self {
            default,
            types: BTreeMap::new(),
        }
    }

    /// Override the schema for one asset type.
    pub fn with_type(mut self, asset_type: impl Into<String>, schema: AssetTypeSchema) -> Self {
        self.types.insert(asset_type.into(), schema);
        self
    }

    /// Parse a registry from a TOML document shaped like the `[schema]`
    /// config section.
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

impl SchemaProvider for SchemaRegistry {
    fn schema(&self, asset_type: &str) -> &AssetTypeSchema {
        self.types.get(asset_type).unwrap_or(&self.default)
    }
}
