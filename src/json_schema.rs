//! JSON Schema generation for input files and `--json` output.
//!
//! Schemas are generated with schemars and exported via the `schema` subcommand.

use schemars::{schema_for, Schema};
use std::collections::BTreeMap;

/// Returns every published JSON schema.
/// Uses BTreeMap for deterministic ordering (important for diffable output).
pub fn all_schemas() -> BTreeMap<&'static str, Schema> {
    let mut schemas = BTreeMap::new();

    // input files
    schemas.insert("models", schema_for!(crate::schema::SchemaFile));
    schemas.insert("rows", schema_for!(crate::store::RowsFile));

    // command output
    schemas.insert("order", schema_for!(crate::cmd::order::OrderJsonOutput));
    schemas.insert(
        "synthesize",
        schema_for!(crate::cmd::synthesize::SynthesizeJsonOutput),
    );

    schemas
}

/// Generate a single schema by name.
pub fn get_schema(name: &str) -> Option<Schema> {
    all_schemas().remove(name)
}

/// List all available schema names.
pub fn schema_names() -> Vec<&'static str> {
    all_schemas().keys().copied().collect()
}
