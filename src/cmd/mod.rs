pub mod order;
mod schema;
pub mod synthesize;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;
use synthesize::SynthesizeOptions;

#[derive(Parser)]
#[command(name = "sql-seeder")]
#[command(version)]
#[command(about = "Turn seed rows into dependency-ordered SQL insert scripts", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Synthesize INSERT/UPDATE statements for a set of seed rows
    Synthesize {
        /// Model description file (.yaml, .yml or .json)
        #[arg(short, long)]
        schema: Option<PathBuf>,

        /// Rows file (JSON object: model name -> array of rows)
        #[arg(short, long)]
        rows: Option<PathBuf>,

        /// Output SQL file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// SQL dialect: postgres, mysql, sqlite, mssql (default: postgres)
        #[arg(short, long)]
        dialect: Option<String>,

        /// YAML config file with run settings
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Skip sequence reconciliation statements
        #[arg(long)]
        no_sequences: bool,

        /// Wrap output in a transaction
        #[arg(long)]
        transaction: bool,

        /// Skip header comments
        #[arg(long)]
        no_header: bool,

        /// Leave rows of these models out (comma-separated)
        #[arg(long)]
        skip: Option<String>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,

        /// Output results as JSON instead of SQL
        #[arg(long)]
        json: bool,
    },

    /// Show the order in which models are seeded
    Order {
        /// Model description file (.yaml, .yml or .json)
        schema: PathBuf,

        /// Show the order reversed (children first, e.g. for deletes)
        #[arg(long)]
        reverse: bool,

        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export JSON schemas for input files and --json output
    Schema {
        /// Schema to print (default: all)
        name: Option<String>,

        /// Write each schema to <dir>/<name>.schema.json instead of stdout
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// List available schema names
        #[arg(long)]
        list: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Synthesize {
            schema,
            rows,
            output,
            dialect,
            config,
            no_sequences,
            transaction,
            no_header,
            skip,
            verbose,
            json,
        } => synthesize::run(SynthesizeOptions {
            schema,
            rows,
            output,
            dialect,
            config,
            no_sequences,
            transaction,
            no_header,
            skip,
            verbose,
            json,
        }),
        Commands::Order {
            schema,
            reverse,
            json,
        } => order::run(schema, reverse, json),
        Commands::Schema {
            name,
            output_dir,
            list,
        } => schema::run(name, output_dir, list),
        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "sql-seeder", &mut io::stdout());
            Ok(())
        }
    }
}
