//! Sheetmap CLI - migrate spreadsheets through a mapping workbook
//!
//! # Main Commands
//!
//! ```bash
//! sheetmap run -c config.xlsx -s old.xlsx -o new.xlsx   # Full migration
//! sheetmap run -c config.xlsx -s new.xlsx -o old.xlsx -d reverse
//! sheetmap serve                                        # HTTP server (port 3000)
//! ```
//!
//! # Inspection Commands
//!
//! ```bash
//! sheetmap mapping -c config.xlsx           # Print the resolved mapping document
//! sheetmap check -c config.xlsx -s old.xlsx # List unmapped sheets and columns
//! sheetmap rules                            # Show rules and configuration layout
//! ```

use clap::{Parser, Subcommand};
use sheetmap::transform::pipeline::resolve_mapping;
use sheetmap::{
    find_unmapped, load_mapping, open_source, rules_description, transform_files, DataSource,
    Direction, ExcelWorkbook, TransformOptions,
};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable holding the default server port.
const PORT_ENV: &str = "SHEETMAP_PORT";
const DEFAULT_PORT: u16 = 3000;

#[derive(Parser)]
#[command(name = "sheetmap")]
#[command(about = "Migrate spreadsheets from one layout to another using a mapping workbook", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Full migration: config + source -> output workbook
    Run {
        /// Configuration workbook ("<Source> - <Target>" sheets)
        #[arg(short, long)]
        config: PathBuf,

        /// Source data: spreadsheet, CSV file or directory of CSV files
        #[arg(short, long)]
        source: PathBuf,

        /// Output: .xlsx, .csv (one target sheet) or a directory
        #[arg(short, long)]
        output: PathBuf,

        /// forward (1) or reverse (2); default from SHEETMAP_DIRECTION
        #[arg(short, long)]
        direction: Option<Direction>,

        /// Use a saved mapping document instead of the configuration workbook
        #[arg(short, long)]
        mapping: Option<PathBuf>,

        /// Write a JSON run report
        #[arg(short, long)]
        report: Option<PathBuf>,

        /// Skip mapping document validation
        #[arg(long)]
        no_validate: bool,
    },

    /// Print the resolved mapping as a JSON mapping document
    Mapping {
        /// Configuration workbook
        #[arg(short, long)]
        config: PathBuf,

        /// forward (1) or reverse (2); default from SHEETMAP_DIRECTION
        #[arg(short, long)]
        direction: Option<Direction>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List source sheets and columns the mapping does not cover
    Check {
        /// Configuration workbook
        #[arg(short, long)]
        config: PathBuf,

        /// Source data: spreadsheet, CSV file or directory of CSV files
        #[arg(short, long)]
        source: PathBuf,

        /// forward (1) or reverse (2); default from SHEETMAP_DIRECTION
        #[arg(short, long)]
        direction: Option<Direction>,
    },

    /// Show available rules and the configuration layout
    Rules,

    /// Start HTTP server
    Serve {
        /// Port to listen on (default: SHEETMAP_PORT or 3000)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            config,
            source,
            output,
            direction,
            mapping,
            report,
            no_validate,
        } => {
            let mut options = base_options(direction);
            options.mapping_path = mapping.map(|p| p.to_string_lossy().to_string());
            options.skip_validation = no_validate;
            cmd_run(&config, &source, &output, report.as_deref(), &options)
        }

        Commands::Mapping {
            config,
            direction,
            output,
        } => cmd_mapping(&config, &base_options(direction), output.as_deref()),

        Commands::Check {
            config,
            source,
            direction,
        } => cmd_check(&config, &source, &base_options(direction)),

        Commands::Rules => cmd_rules(),

        Commands::Serve { port } => cmd_serve(port).await,
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

/// Environment defaults, overridden by an explicit `--direction`.
fn base_options(direction: Option<Direction>) -> TransformOptions {
    let options = TransformOptions::from_env();
    match direction {
        Some(direction) => options.with_direction(direction),
        None => options,
    }
}

fn cmd_run(
    config: &Path,
    source: &Path,
    output: &Path,
    report: Option<&Path>,
    options: &TransformOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!(
        "📄 Migrating {} -> {} ({})",
        source.display(),
        output.display(),
        options.direction
    );

    let result = transform_files(config, source, output, options)?;

    if let Some(report_path) = report {
        sheetmap::transform::pipeline::write_report(&result, report_path)?;
        eprintln!("   💾 Report saved to: {}", report_path.display());
    }

    eprintln!("\n✨ {}", result.summary());
    Ok(())
}

fn cmd_mapping(
    config: &Path,
    options: &TransformOptions,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("🗺️  Building mapping from: {}", config.display());

    let mut workbook = ExcelWorkbook::open(config)?;
    let mapping = load_mapping(&mut workbook)?.oriented(options.direction);

    write_output(&mapping.to_json()?, output)?;
    Ok(())
}

fn cmd_check(
    config: &Path,
    source: &Path,
    options: &TransformOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("🔍 Checking {} against {}", source.display(), config.display());

    let mut workbook = ExcelWorkbook::open(config)?;
    let mapping = resolve_mapping(&mut workbook, options)?;
    let dataset = open_source(source)?.read_dataset()?;

    let unmapped = find_unmapped(&dataset, &mapping);
    if unmapped.is_empty() {
        eprintln!("\n✅ Every sheet and column of {} is mapped", source.display());
        return Ok(());
    }

    eprintln!("\n⚠️  {} unmapped items:", unmapped.len());
    for report in &unmapped {
        println!("{}", report);
    }
    std::process::exit(1);
}

fn cmd_rules() -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", rules_description());
    Ok(())
}

async fn cmd_serve(port: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let port = match port {
        Some(port) => port,
        None => match std::env::var(PORT_ENV) {
            Ok(value) => value
                .parse()
                .map_err(|e| format!("{}='{}': {}", PORT_ENV, value, e))?,
            Err(_) => DEFAULT_PORT,
        },
    };
    sheetmap::server::start_server(port).await
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
