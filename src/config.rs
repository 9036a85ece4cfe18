//! YAML run configuration for the synthesize command.
//!
//! Every setting is optional; command-line flags take precedence.

use crate::codec::SqlDialect;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Complete YAML configuration for a seeding run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SeedConfig {
    /// Target dialect
    pub dialect: Option<SqlDialect>,
    /// Schema description file (YAML or JSON)
    pub schema: Option<PathBuf>,
    /// Rows file (JSON)
    pub rows: Option<PathBuf>,
    /// Output SQL file
    pub output: Option<PathBuf>,
    /// Emit sequence reconciliation statements
    pub sequences: Option<bool>,
    /// Wrap output in a transaction
    pub transaction: Option<bool>,
    /// Write header comments
    pub header: Option<bool>,
    /// Models whose rows are left out of the batch
    pub skip: Vec<String>,
}

impl SeedConfig {
    /// Load configuration from a YAML file.
    ///
    /// Relative paths inside the file are resolved against its directory.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let mut config: SeedConfig = serde_yaml_ng::from_str(&content)
            .map_err(|e| anyhow::anyhow!("invalid config {}: {}", path.display(), e))?;

        if let Some(base) = path.parent() {
            for p in [&mut config.schema, &mut config.rows, &mut config.output]
                .into_iter()
                .flatten()
            {
                if p.is_relative() {
                    *p = base.join(&*p);
                }
            }
        }

        Ok(config)
    }
}
