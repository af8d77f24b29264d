//! `census` — command-line front end for census unit data entry.
//!
//! Drives the same entry form a field device would: fill the twelve
//! fields, "Save and Continue", list what has been recorded.

mod commands;

use std::path::PathBuf;

use census_core::ServiceConfig;
use census_entry::{CensusFields, Field};
use clap::{Args, Parser, Subcommand};
use tracing::debug;

/// Census unit data entry.
#[derive(Parser, Debug)]
#[command(name = "census", about = "Census unit data entry")]
struct Cli {
    /// Directory holding census.sqlite.
    #[arg(long = "data-dir", global = true, env = "CENSUS_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Explicit database file (overrides --data-dir).
    #[arg(long = "db", global = true, env = "CENSUS_DB")]
    db: Option<PathBuf>,

    /// Output format: table or json.
    #[arg(long = "output", short = 'o', global = true, default_value = "table")]
    output: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the database if needed and report how many records it holds.
    Init,

    /// List all recorded census units.
    List,

    /// Save and Continue: validate the draft and create or update a record.
    Save {
        /// Edit this record instead of creating a new one.
        #[arg(long)]
        id: Option<i64>,

        /// Ask on stdin for any field not given as a flag.
        #[arg(long)]
        prompt: bool,

        #[command(flatten)]
        draft: DraftArgs,
    },

    /// Delete a record.
    Delete {
        id: i64,
        /// Skip confirmation.
        #[arg(long = "yes", short = 'y')]
        yes: bool,
    },

    /// Show the form fields.
    Fields,

    /// Show version.
    Version,
}

/// One flag per form field. Unset flags leave the field empty
/// (or, with `--id`, keep the stored value).
#[derive(Args, Debug, Default)]
struct DraftArgs {
    #[arg(long)]
    province: Option<String>,
    #[arg(long)]
    district: Option<String>,
    /// Local Level Government.
    #[arg(long)]
    llg: Option<String>,
    #[arg(long)]
    ward: Option<String>,
    #[arg(long)]
    census_unit: Option<String>,
    #[arg(long)]
    census_unit_type: Option<String>,
    /// Workload number / enumeration area.
    #[arg(long)]
    workload_no: Option<String>,
    #[arg(long)]
    locality: Option<String>,
    #[arg(long)]
    section: Option<String>,
    #[arg(long)]
    structure_record_no: Option<String>,
    #[arg(long, value_parser = commands::entry::parse_numeric)]
    lot: Option<String>,
    #[arg(long, value_parser = commands::entry::parse_numeric)]
    household_no: Option<String>,
    /// Set a field by column name, e.g. `--set censusUnit=CU01`.
    /// Applied after the flags above.
    #[arg(long = "set", value_name = "FIELD=VALUE", value_parser = commands::entry::parse_assignment)]
    set: Vec<(Field, String)>,
}

impl DraftArgs {
    /// Flag values in form order, as (field, value) pairs.
    fn given(&self) -> Vec<(Field, &str)> {
        let values = [
            &self.province,
            &self.district,
            &self.llg,
            &self.ward,
            &self.census_unit,
            &self.census_unit_type,
            &self.workload_no,
            &self.locality,
            &self.section,
            &self.structure_record_no,
            &self.lot,
            &self.household_no,
        ];
        Field::ALL
            .into_iter()
            .zip(values)
            .filter_map(|(f, v)| v.as_deref().map(|v| (f, v)))
            .collect()
    }

    /// Write the given flags over `draft`.
    fn apply(&self, draft: &mut CensusFields) {
        for (field, value) in self.given() {
            draft.set(field, value);
        }
        for (field, value) in &self.set {
            draft.set(*field, value.as_str());
        }
    }
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so `-o json` output stays clean.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let json_output = cli.output == "json";

    let result = run(cli, json_output);
    if let Err(err) = &result {
        if json_output {
            println!("{}", commands::entry::error_json(err));
        }
    }
    result
}

fn run(cli: Cli, json_output: bool) -> anyhow::Result<()> {
    let config = ServiceConfig {
        data_dir: cli.data_dir,
        sqlite_path: cli.db,
    };
    debug!(db = %config.resolve_sqlite_path().display(), "using census database");

    match cli.command {
        Commands::Init => {
            commands::entry::init(&config)?;
        }

        Commands::List => {
            commands::entry::list(&config, json_output)?;
        }

        Commands::Save { id, prompt, draft } => {
            commands::entry::save(&config, id, &draft, prompt, json_output)?;
        }

        Commands::Delete { id, yes } => {
            if !yes {
                eprint!("Delete census record {id}? [y/N]: ");
                let mut s = String::new();
                std::io::stdin().read_line(&mut s)?;
                if !s.trim().eq_ignore_ascii_case("y") {
                    println!("Cancelled.");
                    return Ok(());
                }
            }
            commands::entry::delete(&config, id)?;
        }

        Commands::Fields => {
            commands::entry::fields();
        }

        Commands::Version => {
            println!("census v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
