//! Frames CLI - declarative table pipelines
//!
//! # Main Commands
//!
//! ```bash
//! frames run ventas.csv "['descripcion']" "{'total': 'sum'}" "{'total': 'precio * cantidad'}"
//! frames exec pipeline.json        # Same options as a JSON document
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! frames load ventas.csv           # Load a source and dump its records
//! frames operations                # Comparators, operators, aggregates
//! frames example-config            # Example JSON configuration
//! ```

use clap::{Parser, Subcommand};
use frames::config::{PipelineConfig, Settings};
use frames::logs::{self, log_error};
use frames::output::{render_json, Emission};
use frames::source::{FileLoader, Loader};
use frames::transform::dsl::operations_description;
use frames::transform::execute;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "frames")]
#[command(about = "Derive, filter, group or pivot, sort and round tabular data", long_about = None)]
struct Cli {
    /// Echo log messages to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a pipeline from positional options (`None` or "" skips one)
    Run {
        /// Query text or file path (.csv, .xlsx, .json)
        source: String,
        /// Field list, e.g. "['descripcion']"
        group_fields: Option<String>,
        /// e.g. "{'total': 'sum', 'precio': ['sum', 'mean']}"
        aggregate_map: Option<String>,
        /// e.g. "{'total': 'precio * cantidad'}"
        derive_map: Option<String>,
        /// Output file (.csv, .xlsx, .json)
        destination: Option<String>,
        /// e.g. "{'index': 'region', 'columns': 'mes', 'values': 'total', 'aggfunc': 'sum'}"
        pivot_spec: Option<String>,
        /// Print a readable table instead of JSON
        display_mode: Option<String>,
        /// Decimal places for float columns
        #[arg(allow_hyphen_values = true)]
        decimals: Option<String>,
        /// Print the .xlsx destination as base64
        return_base64: Option<String>,
        /// e.g. "{'precio': ['>', 100]}"
        pre_filter: Option<String>,
        /// e.g. "{'total': 'desc'}"
        sort_spec: Option<String>,
        /// Filter applied after grouping or pivoting
        post_filter: Option<String>,
    },

    /// Run a pipeline from a JSON configuration file
    Exec {
        /// Configuration file
        config: PathBuf,
    },

    /// Load a source and output its records as JSON
    Load {
        /// Query text or file path
        source: String,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show comparators, expression operators and aggregate functions
    Operations,

    /// Show an example JSON configuration
    ExampleConfig,
}

fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut settings = Settings::from_env();
    settings.verbose |= cli.verbose;
    logs::init(&settings);

    let result = match cli.command {
        Commands::Run {
            source,
            group_fields,
            aggregate_map,
            derive_map,
            destination,
            pivot_spec,
            display_mode,
            decimals,
            return_base64,
            pre_filter,
            sort_spec,
            post_filter,
        } => {
            let args: Vec<String> = [
                Some(source),
                group_fields,
                aggregate_map,
                derive_map,
                destination,
                pivot_spec,
                display_mode,
                decimals,
                return_base64,
                pre_filter,
                sort_spec,
                post_filter,
            ]
            .into_iter()
            .map(Option::unwrap_or_default)
            .collect();
            cmd_run(&args)
        }

        Commands::Exec { config } => cmd_exec(&config),

        Commands::Load { source, output } => cmd_load(&source, output.as_deref()),

        Commands::Operations => cmd_operations(),

        Commands::ExampleConfig => cmd_example_config(),
    };

    if let Err(e) = result {
        log_error(e.to_string());
        println!("ERROR_JSON: {}", e);
        std::process::exit(1);
    }
}

fn cmd_run(args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let config = PipelineConfig::from_args(args)?;
    let emission = execute(&config, &FileLoader)?;
    print_emission(emission);
    Ok(())
}

fn cmd_exec(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let content = fs::read_to_string(path)?;
    let config = PipelineConfig::from_json(&content)?;
    let emission = execute(&config, &FileLoader)?;
    print_emission(emission);
    Ok(())
}

fn print_emission(emission: Emission) {
    if let Some(path) = emission.written {
        eprintln!("💾 Output written to: {}", path.display());
    }
    if let Some(payload) = emission.stdout {
        println!("{}", payload);
    }
}

fn cmd_load(source: &str, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Loading: {}", source);

    let table = FileLoader.load(source)?;
    eprintln!("   Columns: {}", table.column_names().join(", "));
    eprintln!("✅ Loaded {} records", table.num_rows());

    let json = render_json(&table)?;
    match output {
        Some(p) => {
            fs::write(p, json)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn cmd_operations() -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", operations_description());
    Ok(())
}

fn cmd_example_config() -> Result<(), Box<dyn std::error::Error>> {
    let example = serde_json::to_string_pretty(&PipelineConfig::example())?;
    println!("{}", example);
    Ok(())
}
