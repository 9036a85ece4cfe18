//! Order command - show the sequence in which models are seeded.

use crate::schema::{ModelGraph, Schema};
use anyhow::{bail, Context, Result};
use schemars::JsonSchema;
use serde::Serialize;
use std::path::PathBuf;

/// JSON output for the order command
#[derive(Serialize, JsonSchema)]
pub struct OrderJsonOutput {
    pub order: Vec<String>,
    /// Models placed before at least one model they reference
    pub cyclic_models: Vec<String>,
}

/// Run the order command
pub fn run(schema: PathBuf, reverse: bool, json: bool) -> Result<()> {
    if !schema.exists() {
        bail!("input file does not exist: {}", schema.display());
    }

    let schema = Schema::load(&schema)
        .with_context(|| format!("failed to load schema {}", schema.display()))?;
    let graph = ModelGraph::from_schema(&schema);
    let result = graph.sequence();

    let name = |id| graph.model_name(id).map(str::to_string);
    let mut order: Vec<String> = result.order.iter().filter_map(|&id| name(id)).collect();
    let cyclic: Vec<String> = result
        .cyclic_models
        .iter()
        .filter_map(|&id| name(id))
        .collect();

    if reverse {
        order.reverse();
    }

    if json {
        let output = OrderJsonOutput {
            order,
            cyclic_models: cyclic,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if graph.is_empty() {
        eprintln!("No models found in the schema.");
        return Ok(());
    }

    println!("Seeding order ({} models):", order.len());
    for (i, model) in order.iter().enumerate() {
        let marker = if cyclic.contains(model) {
            "  (cycle)"
        } else {
            ""
        };
        println!("  {}. {}{}", i + 1, model, marker);
    }

    if !cyclic.is_empty() {
        eprintln!("\nWarning: Circular dependencies detected!");
        eprintln!("Rows of these models may be inserted before the rows they reference:");
        for model in &cyclic {
            eprintln!("  - {}", model);
        }
        eprintln!("Nullable references are written as NULL and patched after all inserts.");
    }

    Ok(())
}
