//! Schema description for seed synthesis.
//!
//! This module provides:
//! - Data models for models (tables), scalar fields and relation fields
//! - Loading a schema description from YAML or JSON
//! - The model dependency graph used to sequence inserts

mod file;
mod graph;

pub use file::*;
pub use graph::*;

use ahash::AHashMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a model within a schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelId(pub u32);

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModelId({})", self.0)
    }
}

/// Declared column type classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    /// Integer types: INT, INTEGER, SMALLINT, SERIAL
    Int,
    /// Big integer types: BIGINT, BIGSERIAL
    BigInt,
    /// Floating point: REAL, DOUBLE, FLOAT
    Float,
    /// Exact numerics: DECIMAL, NUMERIC, MONEY
    Decimal,
    /// Text types: CHAR, VARCHAR, TEXT, etc.
    Text,
    Uuid,
    Bool,
    Date,
    Time,
    /// Timestamp without time zone
    DateTime,
    /// Timestamp with time zone
    DateTimeTz,
    /// JSON / JSONB
    Json,
    /// Binary types: BYTEA, BLOB, VARBINARY
    Bytes,
    /// User-defined enum type
    Enum(String),
    /// Array of the element type (PostgreSQL `int[]` / `_int4`)
    Array(Box<FieldType>),
    /// Any other type
    Other(String),
}

impl FieldType {
    /// Parse a SQL type string into a FieldType
    /// Supports PostgreSQL, MySQL, SQLite and SQL Server type names
    pub fn from_sql_type(type_str: &str) -> Self {
        let trimmed = type_str.trim();

        if let Some(element) = trimmed.strip_suffix("[]") {
            return FieldType::Array(Box::new(FieldType::from_sql_type(element)));
        }
        if let Some(element) = trimmed.strip_prefix('_') {
            return FieldType::Array(Box::new(FieldType::from_sql_type(element)));
        }
        if let Some(name) = trimmed.strip_prefix("enum:") {
            return FieldType::Enum(name.trim().to_string());
        }

        let type_lower = trimmed.to_lowercase();
        let base_type = type_lower.split('(').next().unwrap_or(&type_lower).trim();

        match base_type {
            "int" | "integer" | "tinyint" | "smallint" | "mediumint" | "int4" | "int2"
            | "serial" | "smallserial" | "serial4" => FieldType::Int,
            "bigint" | "int8" | "bigserial" | "serial8" => FieldType::BigInt,
            "real" | "float" | "double" | "double precision" | "float4" | "float8" => {
                FieldType::Float
            }
            "decimal" | "numeric" | "money" | "smallmoney" => FieldType::Decimal,
            "char" | "varchar" | "text" | "tinytext" | "mediumtext" | "longtext" | "character"
            | "character varying" | "nchar" | "nvarchar" | "ntext" | "citext" | "string" => {
                FieldType::Text
            }
            "uuid" | "uniqueidentifier" => FieldType::Uuid,
            "bool" | "boolean" | "bit" => FieldType::Bool,
            "date" => FieldType::Date,
            "time" | "timetz" | "time without time zone" => FieldType::Time,
            "datetime" | "datetime2" | "timestamp" | "timestamp without time zone"
            | "smalldatetime" => FieldType::DateTime,
            "timestamptz" | "timestamp with time zone" | "datetimeoffset" => {
                FieldType::DateTimeTz
            }
            "json" | "jsonb" => FieldType::Json,
            "bytea" | "blob" | "binary" | "varbinary" | "longblob" | "mediumblob"
            | "tinyblob" | "image" => FieldType::Bytes,
            _ => FieldType::Other(trimmed.to_string()),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Int => write!(f, "int"),
            FieldType::BigInt => write!(f, "bigint"),
            FieldType::Float => write!(f, "float"),
            FieldType::Decimal => write!(f, "decimal"),
            FieldType::Text => write!(f, "text"),
            FieldType::Uuid => write!(f, "uuid"),
            FieldType::Bool => write!(f, "boolean"),
            FieldType::Date => write!(f, "date"),
            FieldType::Time => write!(f, "time"),
            FieldType::DateTime => write!(f, "timestamp"),
            FieldType::DateTimeTz => write!(f, "timestamptz"),
            FieldType::Json => write!(f, "json"),
            FieldType::Bytes => write!(f, "bytea"),
            FieldType::Enum(name) => write!(f, "enum:{}", name),
            FieldType::Array(element) => write!(f, "{}[]", element),
            FieldType::Other(raw) => write!(f, "{}", raw),
        }
    }
}

impl Serialize for FieldType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for FieldType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(FieldType::from_sql_type(&s))
    }
}

/// Sequence backing a scalar column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Sequence {
    /// Sequence name
    pub identifier: String,
    /// Schema holding the sequence (defaults to the model's schema)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
}

/// Column-backed field
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ScalarField {
    /// Field name as used in rows
    pub name: String,
    /// Column name (defaults to the field name)
    #[serde(default)]
    pub column: String,
    /// Declared SQL type
    #[serde(rename = "type")]
    #[schemars(with = "String")]
    pub field_type: FieldType,
    /// Part of the model's id
    #[serde(default)]
    pub is_id: bool,
    /// Value is computed by the database (identity or generated column)
    #[serde(default)]
    pub is_generated: bool,
    /// Column has a schema default
    #[serde(default)]
    pub has_default: bool,
    /// Column accepts NULL
    #[serde(default = "default_true")]
    pub is_nullable: bool,
    /// Sequence feeding this column
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<Sequence>,
}

fn default_true() -> bool {
    true
}

impl ScalarField {
    /// Create a nullable scalar field whose column matches its name
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        let name = name.into();
        Self {
            column: name.clone(),
            name,
            field_type,
            is_id: false,
            is_generated: false,
            has_default: false,
            is_nullable: true,
            sequence: None,
        }
    }

    pub fn id(mut self) -> Self {
        self.is_id = true;
        self.is_nullable = false;
        self
    }

    pub fn generated(mut self) -> Self {
        self.is_generated = true;
        self
    }

    pub fn with_default(mut self) -> Self {
        self.has_default = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.is_nullable = false;
        self
    }

    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.column = column.into();
        self
    }

    pub fn sequence(mut self, identifier: impl Into<String>) -> Self {
        self.sequence = Some(Sequence {
            identifier: identifier.into(),
            schema: None,
        });
        self
    }

    /// Identity column: generated id with a default and a sequence
    pub fn identity(self, sequence: impl Into<String>) -> Self {
        self.id().generated().with_default().sequence(sequence)
    }
}

/// Foreign-key-backed link to another model
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RelationField {
    /// Field name
    pub name: String,
    /// Referenced model name
    pub target: String,
    /// Local columns holding the reference
    pub from: Vec<String>,
    /// Referenced columns on the target model
    pub to: Vec<String>,
    /// Whether the local columns may legally hold NULL
    #[serde(default)]
    pub is_nullable: bool,
}

impl RelationField {
    pub fn new(
        name: impl Into<String>,
        target: impl Into<String>,
        from: &[&str],
        to: &[&str],
    ) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            from: from.iter().map(|s| s.to_string()).collect(),
            to: to.iter().map(|s| s.to_string()).collect(),
            is_nullable: false,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.is_nullable = true;
        self
    }
}

/// A model field: either a column or a relation
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Field {
    Scalar(ScalarField),
    Relation(RelationField),
}

impl From<ScalarField> for Field {
    fn from(f: ScalarField) -> Self {
        Field::Scalar(f)
    }
}

impl From<RelationField> for Field {
    fn from(f: RelationField) -> Self {
        Field::Relation(f)
    }
}

/// A schema entity backed by one table
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Model {
    /// Model name
    pub name: String,
    /// Table name (defaults to the model name)
    #[serde(default)]
    pub table: String,
    /// Schema/namespace holding the table
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    /// Fields in declaration order
    #[serde(default)]
    pub fields: Vec<Field>,
}

impl Model {
    /// Create a new model whose table matches its name
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            table: name.clone(),
            name,
            schema: None,
            fields: Vec::new(),
        }
    }

    pub fn in_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    pub fn field(mut self, field: impl Into<Field>) -> Self {
        self.fields.push(field.into());
        self
    }

    /// Scalar fields in declaration order
    pub fn scalars(&self) -> impl Iterator<Item = &ScalarField> {
        self.fields.iter().filter_map(|f| match f {
            Field::Scalar(s) => Some(s),
            Field::Relation(_) => None,
        })
    }

    /// Relation fields in declaration order
    pub fn relations(&self) -> impl Iterator<Item = &RelationField> {
        self.fields.iter().filter_map(|f| match f {
            Field::Relation(r) => Some(r),
            Field::Scalar(_) => None,
        })
    }

    /// Id fields in declaration order
    pub fn id_fields(&self) -> impl Iterator<Item = &ScalarField> {
        self.scalars().filter(|s| s.is_id)
    }

    pub fn has_id(&self) -> bool {
        self.id_fields().next().is_some()
    }

    /// Get a scalar field by field name
    pub fn get_scalar(&self, name: &str) -> Option<&ScalarField> {
        self.scalars().find(|s| s.name == name)
    }

    /// Get the scalar field backing a column (case-insensitive)
    pub fn scalar_by_column(&self, column: &str) -> Option<&ScalarField> {
        self.scalars()
            .find(|s| s.column == column)
            .or_else(|| self.scalars().find(|s| s.column.eq_ignore_ascii_case(column)))
    }

    /// Fill in table/column names left empty in a description file
    fn normalize(&mut self) {
        if self.table.is_empty() {
            self.table = self.name.clone();
        }
        for field in &mut self.fields {
            if let Field::Scalar(s) = field {
                if s.column.is_empty() {
                    s.column = s.name.clone();
                }
                if s.is_id {
                    s.is_nullable = false;
                }
            }
        }
    }
}

/// Errors raised while building a schema
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("duplicate model '{0}'")]
    DuplicateModel(String),
    #[error("relation '{model}.{relation}' targets unknown model '{target}'")]
    UnknownTarget {
        model: String,
        relation: String,
        target: String,
    },
    #[error("relation '{model}.{relation}' references unknown column '{column}'")]
    UnknownColumn {
        model: String,
        relation: String,
        column: String,
    },
    #[error("relation '{model}.{relation}' has {from} local columns but {to} referenced columns")]
    ColumnCountMismatch {
        model: String,
        relation: String,
        from: usize,
        to: usize,
    },
    #[error("failed to read schema file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse schema file: {0}")]
    Parse(String),
}

/// Complete, validated schema description
#[derive(Debug, Clone)]
pub struct Schema {
    /// Map from model name to model ID
    models: AHashMap<String, ModelId>,
    /// Models indexed by ModelId, in declaration order
    model_list: Vec<Model>,
}

impl Schema {
    /// Build a schema from models in declaration order.
    ///
    /// Every relation must target a declared model, and its local and
    /// referenced columns must exist as scalar columns.
    pub fn new(models: Vec<Model>) -> Result<Self, SchemaError> {
        let mut schema = Self {
            models: AHashMap::with_capacity(models.len()),
            model_list: Vec::with_capacity(models.len()),
        };

        for mut model in models {
            model.normalize();
            if schema.models.contains_key(&model.name) {
                return Err(SchemaError::DuplicateModel(model.name));
            }
            let id = ModelId(schema.model_list.len() as u32);
            schema.models.insert(model.name.clone(), id);
            schema.model_list.push(model);
        }

        schema.validate_relations()?;
        Ok(schema)
    }

    fn validate_relations(&self) -> Result<(), SchemaError> {
        for model in &self.model_list {
            for rel in model.relations() {
                let target = self.get_model(&rel.target).ok_or_else(|| {
                    SchemaError::UnknownTarget {
                        model: model.name.clone(),
                        relation: rel.name.clone(),
                        target: rel.target.clone(),
                    }
                })?;

                if rel.from.len() != rel.to.len() {
                    return Err(SchemaError::ColumnCountMismatch {
                        model: model.name.clone(),
                        relation: rel.name.clone(),
                        from: rel.from.len(),
                        to: rel.to.len(),
                    });
                }

                let missing = rel
                    .from
                    .iter()
                    .find(|c| model.scalar_by_column(c).is_none())
                    .or_else(|| rel.to.iter().find(|c| target.scalar_by_column(c).is_none()));
                if let Some(column) = missing {
                    return Err(SchemaError::UnknownColumn {
                        model: model.name.clone(),
                        relation: rel.name.clone(),
                        column: column.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Get model ID by name (case-insensitive fallback)
    pub fn get_model_id(&self, name: &str) -> Option<ModelId> {
        if let Some(&id) = self.models.get(name) {
            return Some(id);
        }
        let name_lower = name.to_lowercase();
        self.models
            .iter()
            .find(|(k, _)| k.to_lowercase() == name_lower)
            .map(|(_, &id)| id)
    }

    /// Get model by ID
    pub fn model(&self, id: ModelId) -> Option<&Model> {
        self.model_list.get(id.0 as usize)
    }

    /// All models, indexed by `ModelId`
    pub fn models(&self) -> &[Model] {
        &self.model_list
    }

    /// Get model by name
    pub fn get_model(&self, name: &str) -> Option<&Model> {
        self.get_model_id(name).and_then(|id| self.model(id))
    }

    /// Get the number of models
    pub fn len(&self) -> usize {
        self.model_list.len()
    }

    /// Check if schema is empty
    pub fn is_empty(&self) -> bool {
        self.model_list.is_empty()
    }

    /// Iterate over all models in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (ModelId, &Model)> {
        self.model_list
            .iter()
            .enumerate()
            .map(|(i, m)| (ModelId(i as u32), m))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_type_arrays() {
        assert_eq!(
            FieldType::from_sql_type("int4[]"),
            FieldType::Array(Box::new(FieldType::Int))
        );
        assert_eq!(
            FieldType::from_sql_type("_text"),
            FieldType::Array(Box::new(FieldType::Text))
        );
    }

    #[test]
    fn test_field_type_display_roundtrip() {
        for raw in ["int", "timestamptz", "enum:mood", "text[]", "geometry"] {
            let parsed = FieldType::from_sql_type(raw);
            assert_eq!(FieldType::from_sql_type(&parsed.to_string()), parsed);
        }
    }

    #[test]
    fn test_normalize_fills_names() {
        let schema = Schema::new(vec![Model {
            name: "user".to_string(),
            table: String::new(),
            schema: None,
            fields: vec![Field::Scalar(ScalarField {
                column: String::new(),
                ..ScalarField::new("id", FieldType::Int).id()
            })],
        }])
        .unwrap();

        let model = schema.get_model("user").unwrap();
        assert_eq!(model.table, "user");
        assert_eq!(model.scalars().next().unwrap().column, "id");
    }
}
