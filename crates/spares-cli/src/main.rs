//! Spare-parts reorganizer CLI
//!
//! Command-line tool for turning serial-block spares lists into per-model
//! reports.

use clap::{Parser, Subcommand, ValueEnum};
use spares_core::{
    read_sheets, resolve_sheet, run, OutputFormat, PipelineConfig, RunOptions, RunSummary,
};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "spares-cli")]
#[command(about = "Spare-parts list reorganizer", long_about = None)]
#[command(version)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reorganize every sheet of an input file into a grouped report
    Reorganize {
        /// Spares list (xlsx, xls, ods or csv)
        #[arg(short, long)]
        input: PathBuf,

        /// Equipment reference table (SerialNumber, Model, EquipmentType)
        #[arg(short, long)]
        reference: PathBuf,

        /// Output file, or directory for csv
        #[arg(short, long)]
        output: PathBuf,

        /// Output format; guessed from the output path when omitted
        #[arg(long, value_enum)]
        format: Option<FormatArg>,

        /// Pipeline config file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Show how each sheet's headers map to the required fields
    Columns {
        /// Spares list (xlsx, xls, ods or csv)
        #[arg(short, long)]
        input: PathBuf,

        /// Pipeline config file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Write a config file with the default settings
    InitConfig {
        /// Output path for the config file
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Xlsx,
    Csv,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Xlsx => OutputFormat::Xlsx,
            FormatArg::Csv => OutputFormat::Csv,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = dispatch(cli.command) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// RUST_LOG wins when set; otherwise info, or debug with --verbose
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn dispatch(command: Commands) -> spares_core::Result<()> {
    match command {
        Commands::Reorganize {
            input,
            reference,
            output,
            format,
            config,
        } => cmd_reorganize(input, reference, output, format, config.as_deref()),
        Commands::Columns { input, config } => cmd_columns(&input, config.as_deref()),
        Commands::InitConfig { output } => cmd_init_config(&output),
    }
}

fn load_config(path: Option<&Path>) -> spares_core::Result<PipelineConfig> {
    match path {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            PipelineConfig::load(path)
        }
        None => Ok(PipelineConfig::default()),
    }
}

fn cmd_reorganize(
    input: PathBuf,
    reference: PathBuf,
    output: PathBuf,
    format: Option<FormatArg>,
    config: Option<&Path>,
) -> spares_core::Result<()> {
    let format = format
        .map(OutputFormat::from)
        .unwrap_or_else(|| OutputFormat::from_path(&output));
    info!(
        input = %input.display(),
        output = %output.display(),
        ?format,
        "reorganizing"
    );

    let options = RunOptions {
        input,
        reference,
        output,
        format,
        config: load_config(config)?,
    };

    let summary = run(&options)?;
    print_summary(&summary);

    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!("Sections ({}):", summary.sections.len());
    for section in &summary.sections {
        match &section.error {
            Some(error) => println!("  {} [failed] {}", section.name, error),
            None => println!(
                "  {} ({} models, {} parts)",
                section.name, section.groups, section.parts
            ),
        }
    }

    println!();
    for path in &summary.outputs {
        println!("Wrote {}", path.display());
    }

    if summary.failed_count() > 0 {
        println!(
            "\nWarning: {} sheet(s) could not be processed",
            summary.failed_count()
        );
    }
}

fn cmd_columns(input: &Path, config: Option<&Path>) -> spares_core::Result<()> {
    let config = load_config(config)?;
    let sheets = read_sheets(input)?;

    for sheet in &sheets {
        println!("{} ({} rows)", sheet.name, sheet.row_count());
        match resolve_sheet(sheet, config.similarity_metric, config.similarity_floor) {
            Ok(mapping) => {
                for (field, column) in mapping.iter() {
                    println!(
                        "  {:<12} <- '{}' (column {}, score {:.2})",
                        field.name(),
                        column.header,
                        column.index + 1,
                        column.score
                    );
                }
            }
            Err(e) => println!("  {}", e),
        }
        println!();
    }

    Ok(())
}

fn cmd_init_config(output: &Path) -> spares_core::Result<()> {
    let config = PipelineConfig::default();
    config.save(output)?;
    debug!(path = %output.display(), "wrote default config");

    println!("Created config file: {}", output.display());
    println!();
    println!("Edit the file to change matching or grouping, then run:");
    println!(
        "  spares-cli reorganize --input <file> --reference <file> --output <file> --config {}",
        output.display()
    );

    Ok(())
}
