//! JSON rows files: `{ "model": [ { "field": value, ... }, ... ] }`.

use super::{Row, Store};
use crate::codec::Value;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Rows to seed, keyed by model name. Row order within a model is kept.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct RowsFile {
    pub models: BTreeMap<String, Vec<BTreeMap<String, serde_json::Value>>>,
}

#[derive(Debug, thiserror::Error)]
pub enum RowsFileError {
    #[error("failed to read rows file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse rows file: {0}")]
    Parse(#[from] serde_json::Error),
}

impl RowsFile {
    pub fn from_json(content: &str) -> Result<Self, RowsFileError> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self, RowsFileError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Number of rows across all models
    pub fn row_count(&self) -> usize {
        self.models.values().map(Vec::len).sum()
    }

    /// Convert each JSON object into a [`Row`], keeping order per model
    pub fn into_rows(self) -> impl Iterator<Item = (String, Row)> {
        self.models.into_iter().flat_map(|(model, rows)| {
            rows.into_iter().map(move |fields| {
                let row = fields
                    .into_iter()
                    .map(|(k, v)| (k, Value::from_json(v)))
                    .collect::<Row>();
                (model.clone(), row)
            })
        })
    }
}

impl Store<'_> {
    /// Append every row of a rows file
    pub fn add_rows_file(&mut self, file: RowsFile) {
        for (model, row) in file.into_rows() {
            self.add(&model, row);
        }
    }
}
