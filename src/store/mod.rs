//! Row store: the rows a caller wants seeded, grouped per model.
//!
//! Rows are appended with [`Store::add`] and kept in call order. The store
//! performs no validation of field names or value types; that is left to
//! the schema layer and to synthesis.

mod rows_file;

pub use rows_file::*;

use crate::codec::{SqlDialect, Value};
use crate::schema::Schema;
use crate::synth::{Synthesis, SynthesisError, Synthesizer};
use ahash::AHashMap;

/// A partial row: field name → optional value.
///
/// A field missing from the row means "use the schema default or let the
/// database assign it"; a field present with `None` is an explicit NULL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    values: AHashMap<String, Option<Value>>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field to a value
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(field.into(), Some(value.into()));
        self
    }

    /// Set a field to an explicit NULL
    pub fn null(mut self, field: impl Into<String>) -> Self {
        self.values.insert(field.into(), None);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: Option<Value>) {
        self.values.insert(field.into(), value);
    }

    /// Look up a field: `None` if absent, `Some(None)` if explicitly null
    pub fn get(&self, field: &str) -> Option<Option<&Value>> {
        self.values.get(field).map(|v| v.as_ref())
    }

    pub fn contains(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&Value>)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }
}

impl<K: Into<String>> FromIterator<(K, Option<Value>)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, Option<Value>)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Ordered, per-model collection of rows bound to one schema.
pub struct Store<'a> {
    schema: &'a Schema,
    rows: AHashMap<String, Vec<Row>>,
    dialect: SqlDialect,
    reconcile_sequences: bool,
    skip: Vec<String>,
}

impl<'a> Store<'a> {
    /// Create an empty store for the given schema
    pub fn new(schema: &'a Schema) -> Self {
        Self {
            schema,
            rows: AHashMap::new(),
            dialect: SqlDialect::default(),
            reconcile_sequences: true,
            skip: Vec::new(),
        }
    }

    pub fn with_dialect(mut self, dialect: SqlDialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn with_sequences(mut self, reconcile: bool) -> Self {
        self.reconcile_sequences = reconcile;
        self
    }

    /// Leave rows of these models out of synthesis
    pub fn with_skip(mut self, models: Vec<String>) -> Self {
        self.skip = models;
        self
    }

    /// Append a row to the named model
    pub fn add(&mut self, model: &str, row: Row) {
        let key = self.canonical_name(model);
        self.rows.entry(key).or_default().push(row);
    }

    /// Rows added for a model, in call order
    pub fn rows(&self, model: &str) -> &[Row] {
        self.rows
            .get(&self.canonical_name(model))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Declared model name for `model`, or the name as given if undeclared
    fn canonical_name(&self, model: &str) -> String {
        self.schema
            .get_model_id(model)
            .and_then(|id| self.schema.model(id))
            .map(|m| m.name.clone())
            .unwrap_or_else(|| model.to_string())
    }

    /// Names of models with at least one row (unordered)
    pub fn model_names(&self) -> impl Iterator<Item = &str> {
        self.rows
            .iter()
            .filter(|(_, rows)| !rows.is_empty())
            .map(|(name, _)| name.as_str())
    }

    /// Total number of rows across all models
    pub fn len(&self) -> usize {
        self.rows.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn schema(&self) -> &'a Schema {
        self.schema
    }

    pub fn dialect(&self) -> SqlDialect {
        self.dialect
    }

    /// Whether a model's rows take part in synthesis
    pub(crate) fn is_skipped(&self, model: &str) -> bool {
        self.skip.iter().any(|s| s.eq_ignore_ascii_case(model))
    }

    /// Produce the ordered statement batch for everything added so far.
    pub fn synthesize(&self) -> Result<Synthesis, SynthesisError> {
        Synthesizer::new(self)
            .with_sequences(self.reconcile_sequences)
            .run()
    }
}
