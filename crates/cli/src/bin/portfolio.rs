use anyhow::Result;
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use data_pipeline::{Config, RunReport};
use models::{AggregationMode, SourceFormat};
use std::path::PathBuf;

/// Consolidates brokerage position exports into a ledger and a per-symbol summary.
#[derive(Debug, Parser)]
#[command(name = "portfolio", author, version, about = "Build portfolio ledger and summary reports", long_about = None)]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace). RUST_LOG overrides it.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Read all enabled sources, write the ledger and the summary
    Run(SourceArgs),
    /// Read all enabled sources, write only the ledger
    Ledger(SourceArgs),
    /// Aggregate an existing ledger report into a summary
    Summary {
        /// Ledger report written by an earlier run (Summary_Master_*.csv)
        #[arg(short, long)]
        ledger: PathBuf,

        /// Directory for the summary report
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// exclude | rescale
        #[arg(short, long, default_value = "exclude")]
        mode: AggregationMode,
    },
}

#[derive(Debug, Args)]
struct SourceArgs {
    /// Settings JSON; defaults to ./settings.json, then built-in defaults
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Directory for the reports (overrides settings)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// exclude | rescale (overrides settings)
    #[arg(short, long)]
    mode: Option<AggregationMode>,

    /// Turn on a source format, e.g. --enable sprott
    #[arg(long = "enable")]
    enable: Vec<SourceFormat>,

    /// Turn off a source format, e.g. --disable canaccord
    #[arg(long = "disable")]
    disable: Vec<SourceFormat>,
}

impl SourceArgs {
    fn into_config(self, summary: bool, date: NaiveDate) -> Config {
        Config {
            settings_file: self.settings,
            output_dir: self.output_dir,
            mode: self.mode,
            enable: self.enable,
            disable: self.disable,
            summary,
            date,
        }
    }
}

fn print_report(report: &RunReport) {
    println!(
        "Ledger: {} ({} records)",
        report.ledger_path.display(),
        report.build.ledger.len()
    );
    if let Some(path) = &report.summary_path {
        println!("Summary: {} ({} symbols)", path.display(), report.summary_rows);
    }
    if report.build.dropped > 0 {
        println!("Dropped {} records without a quantity", report.build.dropped);
    }
    if !report.build.failures.is_empty() {
        println!("{} statement(s) could not be read:", report.build.failures.len());
        for failure in &report.build.failures {
            println!("[ERROR] {}", failure);
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::init(cli.verbose);

    let today = Local::now().date_naive();
    match cli.command {
        Command::Run(args) => {
            let report = data_pipeline::run(args.into_config(true, today))?;
            print_report(&report);
        }
        Command::Ledger(args) => {
            let report = data_pipeline::run(args.into_config(false, today))?;
            print_report(&report);
        }
        Command::Summary {
            ledger,
            output_dir,
            mode,
        } => {
            let path = data_pipeline::summarize(&ledger, &output_dir, mode, today)?;
            println!("Summary: {}", path.display());
        }
    }
    Ok(())
}
