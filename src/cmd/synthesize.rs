//! Synthesize command - turn a schema and a rows file into a seed script.

use crate::codec::SqlDialect;
use crate::config::SeedConfig;
use crate::schema::Schema;
use crate::store::{RowsFile, Store};
use crate::synth::{print_summary, SynthesisWarning};
use crate::writer::BatchWriter;
use anyhow::{bail, Context};
use schemars::JsonSchema;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;

/// Command-line options for the synthesize command
#[derive(Debug, Default)]
pub struct SynthesizeOptions {
    pub schema: Option<PathBuf>,
    pub rows: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub dialect: Option<String>,
    pub config: Option<PathBuf>,
    pub no_sequences: bool,
    pub transaction: bool,
    pub no_header: bool,
    pub skip: Option<String>,
    pub verbose: bool,
    pub json: bool,
}

/// JSON output for the synthesize command
#[derive(Serialize, JsonSchema)]
pub struct SynthesizeJsonOutput {
    pub dialect: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_file: Option<String>,
    pub model_order: Vec<String>,
    pub statistics: SynthesizeStatistics,
    pub statements: Vec<String>,
    pub warnings: Vec<SynthesisWarning>,
}

#[derive(Serialize, JsonSchema)]
pub struct SynthesizeStatistics {
    pub rows: usize,
    pub inserts: usize,
    pub updates: usize,
    pub sequence_fixes: usize,
    pub elapsed_secs: f64,
}

/// Settings after merging command-line flags over the config file
#[derive(Debug)]
struct Resolved {
    schema: PathBuf,
    rows: PathBuf,
    output: Option<PathBuf>,
    dialect: SqlDialect,
    sequences: bool,
    transaction: bool,
    header: bool,
    skip: Vec<String>,
}

fn resolve(opts: SynthesizeOptions) -> anyhow::Result<Resolved> {
    let config = match &opts.config {
        Some(path) => {
            if !path.exists() {
                bail!("config file does not exist: {}", path.display());
            }
            SeedConfig::load(path)?
        }
        None => SeedConfig::default(),
    };

    let dialect = match opts.dialect {
        Some(d) => d.parse().map_err(|e: String| anyhow::anyhow!(e))?,
        None => config.dialect.unwrap_or_default(),
    };

    let Some(schema) = opts.schema.or(config.schema) else {
        bail!("no schema file given (use --schema or set `schema` in the config)");
    };
    let Some(rows) = opts.rows.or(config.rows) else {
        bail!("no rows file given (use --rows or set `rows` in the config)");
    };

    let mut skip = config.skip;
    if let Some(list) = opts.skip {
        skip.extend(
            list.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
        );
    }

    Ok(Resolved {
        schema,
        rows,
        output: opts.output.or(config.output),
        dialect,
        sequences: !opts.no_sequences && config.sequences.unwrap_or(true),
        transaction: opts.transaction || config.transaction.unwrap_or(false),
        header: !opts.no_header && config.header.unwrap_or(true),
        skip,
    })
}

pub fn run(opts: SynthesizeOptions) -> anyhow::Result<()> {
    let verbose = opts.verbose;
    let json = opts.json;
    let settings = resolve(opts)?;

    for path in [&settings.schema, &settings.rows] {
        if !path.exists() {
            bail!("input file does not exist: {}", path.display());
        }
    }

    let start = Instant::now();

    let schema = Schema::load(&settings.schema)
        .with_context(|| format!("failed to load schema {}", settings.schema.display()))?;
    let rows = RowsFile::load(&settings.rows)
        .with_context(|| format!("failed to load rows {}", settings.rows.display()))?;
    let row_count = rows.row_count();

    if verbose {
        eprintln!(
            "Loaded {} models and {} rows (dialect: {})",
            schema.len(),
            row_count,
            settings.dialect
        );
    }

    let mut store = Store::new(&schema)
        .with_dialect(settings.dialect)
        .with_sequences(settings.sequences)
        .with_skip(settings.skip.clone());
    store.add_rows_file(rows);

    let synthesis = store.synthesize()?;
    let elapsed = start.elapsed();

    if verbose {
        eprintln!("Model order:");
        for (i, name) in synthesis.model_order.iter().enumerate() {
            eprintln!("  {}. {} ({} rows)", i + 1, name, store.rows(name).len());
        }
        if !settings.skip.is_empty() {
            eprintln!("Skipped models: {}", settings.skip.join(", "));
        }
    }

    if json {
        let batch = &synthesis.batch;
        let output = SynthesizeJsonOutput {
            dialect: settings.dialect.to_string(),
            output_file: settings.output.as_ref().map(|p| p.display().to_string()),
            model_order: synthesis.model_order.clone(),
            statistics: SynthesizeStatistics {
                rows: row_count,
                inserts: batch.inserts.len(),
                updates: batch.updates.len(),
                sequence_fixes: batch.sequence_fixes.len(),
                elapsed_secs: elapsed.as_secs_f64(),
            },
            statements: synthesis.statements().map(str::to_string).collect(),
            warnings: synthesis.warnings,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let stats = BatchWriter::new(settings.dialect)
        .with_header(settings.header)
        .with_transaction(settings.transaction)
        .write_to(&synthesis.batch, settings.output.as_deref())?;

    if verbose {
        eprintln!(
            "\nSynthesis completed in {:.3}s: {} inserts, {} updates, {} sequence fixes",
            elapsed.as_secs_f64(),
            synthesis.batch.inserts.len(),
            synthesis.batch.updates.len(),
            synthesis.batch.sequence_fixes.len()
        );
    }
    if let Some(path) = &settings.output {
        eprintln!(
            "Wrote {} statements ({} bytes) to {}",
            stats.statements_written,
            stats.bytes_written,
            path.display()
        );
    }

    print_summary(&synthesis.warnings);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = dir.path().join("seed.yaml");
        std::fs::write(
            &config,
            "dialect: mysql\nschema: models.yaml\nrows: rows.json\ntransaction: true\nskip: [audit]\n",
        )
        .unwrap();

        let resolved = resolve(SynthesizeOptions {
            config: Some(config),
            dialect: Some("sqlite".to_string()),
            no_sequences: true,
            skip: Some("log, ".to_string()),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(resolved.dialect, SqlDialect::Sqlite);
        assert_eq!(resolved.schema, dir.path().join("models.yaml"));
        assert!(!resolved.sequences);
        assert!(resolved.transaction);
        assert!(resolved.header);
        assert_eq!(resolved.skip, vec!["audit", "log"]);
    }

    #[test]
    fn test_missing_schema_is_an_error() {
        let err = resolve(SynthesizeOptions {
            rows: Some(PathBuf::from("rows.json")),
            ..Default::default()
        })
        .unwrap_err();
        assert!(err.to_string().contains("no schema file"));
    }
}
