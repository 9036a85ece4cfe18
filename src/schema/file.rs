//! Schema description files (YAML or JSON).
//!
//! ```yaml
//! models:
//!   - name: customer
//!     schema: public
//!     fields:
//!       - kind: scalar
//!         name: id
//!         type: int4
//!         is_id: true
//!         is_generated: true
//!         has_default: true
//!         sequence: { identifier: customer_id_seq }
//!   - name: order
//!     fields:
//!       - { kind: scalar, name: customer_id, type: int4, is_nullable: false }
//!       - { kind: relation, name: customer, target: customer, from: [customer_id], to: [id] }
//! ```

use super::{Model, Schema, SchemaError};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// On-disk schema description
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SchemaFile {
    /// Models in declaration order
    #[serde(default)]
    pub models: Vec<Model>,
}

impl SchemaFile {
    /// Parse a description from YAML text (JSON is valid YAML)
    pub fn from_yaml(content: &str) -> Result<Self, SchemaError> {
        serde_yaml_ng::from_str(content).map_err(|e| SchemaError::Parse(e.to_string()))
    }

    /// Parse a description from JSON text
    pub fn from_json(content: &str) -> Result<Self, SchemaError> {
        serde_json::from_str(content).map_err(|e| SchemaError::Parse(e.to_string()))
    }

    /// Load a description file, choosing the format by extension
    pub fn load(path: &Path) -> Result<Self, SchemaError> {
        let content = fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .map(|e| e.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        if is_json {
            Self::from_json(&content)
        } else {
            Self::from_yaml(&content)
        }
    }

    /// Validate and build the schema
    pub fn into_schema(self) -> Result<Schema, SchemaError> {
        Schema::new(self.models)
    }
}

impl Schema {
    /// Load and validate a schema description file
    pub fn load(path: &Path) -> Result<Self, SchemaError> {
        SchemaFile::load(path)?.into_schema()
    }
}
