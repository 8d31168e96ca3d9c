//! Lattice Sheets CLI - replays formatting edit scripts

mod script;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lattice_sheets::prelude::*;
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::script::Script;

#[derive(Parser)]
#[command(name = "lattice")]
#[command(
    author,
    version,
    about = "Replay formatting and structural edits against a sheet model"
)]
struct Cli {
    /// Log progress to stderr (repeat for more detail)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an edit script and print the resulting workbook snapshot as JSON
    Replay {
        /// JSON edit script
        script: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write JSON without indentation
        #[arg(long)]
        compact: bool,

        /// Skip failing operations instead of stopping
        #[arg(short, long)]
        keep_going: bool,
    },

    /// Run an edit script and summarize each sheet
    Info {
        /// JSON edit script
        script: PathBuf,
    },
}

/// Writes log records to stderr
struct StderrLogger {
    level: LevelFilter,
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let tag = match record.level() {
            Level::Error => "error",
            Level::Warn => "warning",
            Level::Info => "info",
            Level::Debug => "debug",
            Level::Trace => "trace",
        };
        eprintln!("{}: {}", tag, record.args());
    }

    fn flush(&self) {}
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let logger = Box::new(StderrLogger { level });
    if log::set_boxed_logger(logger).is_ok() {
        log::set_max_level(level);
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Replay {
            script,
            output,
            compact,
            keep_going,
        } => replay(&script, output.as_deref(), compact, keep_going),
        Commands::Info { script } => show_info(&script),
    }
}

fn load_script(path: &Path) -> Result<Script> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read '{}'", path.display()))?;
    Script::from_json(&text).with_context(|| format!("Failed to parse '{}'", path.display()))
}

fn replay(path: &Path, output: Option<&Path>, compact: bool, keep_going: bool) -> Result<()> {
    let script = load_script(path)?;
    let mut workbook = script.replay(keep_going)?;
    for sheet in workbook.worksheets_mut() {
        sheet.apply_conditional_formats();
    }

    let snapshot = workbook.snapshot();
    let mut json = if compact {
        serde_json::to_string(&snapshot)
    } else {
        serde_json::to_string_pretty(&snapshot)
    }
    .context("Failed to serialize snapshot")?;
    json.push('\n');

    if let Some(output_path) = output {
        std::fs::write(output_path, &json)
            .with_context(|| format!("Failed to write '{}'", output_path.display()))?;
        eprintln!(
            "Wrote {} sheet(s) to '{}'",
            snapshot.sheets.len(),
            output_path.display()
        );
    } else {
        io::stdout()
            .write_all(json.as_bytes())
            .context("Failed to write to stdout")?;
    }

    Ok(())
}

fn show_info(path: &Path) -> Result<()> {
    let script = load_script(path)?;
    let workbook = script.replay(true)?;

    println!("Script: {}", path.display());
    println!("Sheets: {}", workbook.sheet_count());

    for (i, sheet) in workbook.worksheets().enumerate() {
        println!();
        println!("  Sheet {}: \"{}\"", i, sheet.name());
        println!(
            "    Size: {} rows x {} columns",
            sheet.row_count(),
            sheet.col_count()
        );
        println!("    Style deltas: {}", sheet.snapshot().cell_styles.len());
        println!("    Merged regions: {}", list_areas(sheet.merged_regions()));
        println!("    Array regions: {}", list_areas(sheet.array_regions()));
        println!(
            "    Conditional formats: {}",
            sheet.conditional_formats().len()
        );
        println!(
            "    Custom sizes: {} row(s), {} column(s)",
            sheet.custom_row_heights().len(),
            sheet.custom_column_widths().len()
        );
    }

    if !workbook.named_ranges().is_empty() {
        println!();
        println!("  Names:");
        for name in workbook.named_ranges().iter() {
            println!("    {} = {}", name.name, name.label());
        }
    }

    Ok(())
}

fn list_areas<'a>(areas: impl Iterator<Item = &'a Area>) -> String {
    let labels: Vec<String> = areas.map(Area::to_a1_string).collect();
    if labels.is_empty() {
        "none".to_string()
    } else {
        labels.join(", ")
    }
}
