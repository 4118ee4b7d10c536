pub mod aggregate;
pub mod ledger;
pub mod registry;
pub mod report;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use models::{AggregationMode, Settings, SourceFormat, StatementFile};
use tracing::{info, warn};
use utils::StatementError;

pub use crate::aggregate::aggregate;
pub use crate::ledger::{LedgerBuild, LedgerBuilder, SourceFiles};
pub use crate::registry::parser_for;
pub use crate::report::{read_ledger_csv, write_ledger_csv, write_summary_csv};

pub struct Config {
    pub settings_file: Option<PathBuf>,
    /// Overrides the settings' output directory.
    pub output_dir: Option<PathBuf>,
    /// Overrides the settings' aggregation mode.
    pub mode: Option<AggregationMode>,
    pub enable: Vec<SourceFormat>,
    pub disable: Vec<SourceFormat>,
    /// Also write the consolidated summary, not just the ledger.
    pub summary: bool,
    /// Date stamped into the report file names.
    pub date: NaiveDate,
}

#[derive(Debug)]
pub struct RunReport {
    pub build: LedgerBuild,
    pub ledger_path: PathBuf,
    pub summary_path: Option<PathBuf>,
    pub summary_rows: usize,
}

/// Loads settings, reads every enabled source directory, builds the ledger and
/// writes the dated reports. Failing statements are collected, not fatal.
pub fn run(cfg: Config) -> Result<RunReport> {
    let settings = resolve_settings(&cfg)?;
    let builder = LedgerBuilder::from_settings(&settings);

    let (files, unreadable) = load_source_files(&settings, &builder.formats())?;
    let mut build = builder.build(&files);
    build.failures.extend(unreadable);
    info!(
        records = build.ledger.len(),
        failures = build.failures.len(),
        dropped = build.dropped,
        "ledger built"
    );

    let ledger_path = settings.output_dir.join(report::ledger_file_name(cfg.date));
    report::write_ledger_file(&ledger_path, &build.ledger)?;
    info!(path = %ledger_path.display(), "ledger written");

    let mut summary_path = None;
    let mut summary_rows = 0;
    if cfg.summary {
        let summary = aggregate(&build.ledger, settings.aggregation_mode);
        let path = settings.output_dir.join(report::summary_file_name(cfg.date));
        report::write_summary_file(&path, &summary)?;
        info!(path = %path.display(), rows = summary.len(), "summary written");
        summary_rows = summary.len();
        summary_path = Some(path);
    }

    Ok(RunReport {
        build,
        ledger_path,
        summary_path,
        summary_rows,
    })
}

/// Aggregates a ledger report written by an earlier run.
pub fn summarize(
    ledger_path: &Path,
    output_dir: &Path,
    mode: AggregationMode,
    date: NaiveDate,
) -> Result<PathBuf> {
    let ledger = report::read_ledger_file(ledger_path)?;
    let summary = aggregate(&ledger, mode);
    let path = output_dir.join(report::summary_file_name(date));
    report::write_summary_file(&path, &summary)?;
    info!(path = %path.display(), rows = summary.len(), "summary written");
    Ok(path)
}

/// Settings file (or defaults) with the command line overrides applied.
pub fn resolve_settings(cfg: &Config) -> Result<Settings> {
    let mut settings = settings_loader::load_settings_with_fallback(cfg.settings_file.as_deref())?;
    for format in &cfg.enable {
        settings.set_enabled(*format, true);
    }
    for format in &cfg.disable {
        settings.set_enabled(*format, false);
    }
    if let Some(mode) = cfg.mode {
        settings.aggregation_mode = mode;
    }
    if let Some(dir) = &cfg.output_dir {
        settings.output_dir = dir.clone();
    }
    Ok(settings)
}

/// Reads the input directory of each format. A missing directory means no
/// statements for that format; a file that cannot be read is returned as a
/// failure next to the files that could.
pub fn load_source_files(
    settings: &Settings,
    formats: &[SourceFormat],
) -> Result<(SourceFiles, Vec<StatementError>)> {
    let mut files = SourceFiles::new();
    let mut unreadable = Vec::new();
    for format in formats {
        let dir = settings
            .input_dir(*format)
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(format.default_input_dir()));
        if !dir.is_dir() {
            warn!(%format, dir = %dir.display(), "input directory not found");
            continue;
        }
        let contents = read_statement_dir(&dir, *format)?;
        files.insert(*format, contents.files);
        unreadable.extend(contents.unreadable);
    }
    Ok((files, unreadable))
}

/// Statements of one input directory.
#[derive(Debug, Default)]
pub struct StatementDir {
    pub files: Vec<StatementFile>,
    /// Files that were listed but could not be read, e.g. locked by Excel.
    pub unreadable: Vec<StatementError>,
}

/// Files directly inside `dir`, in name order. Subdirectories are ignored.
pub fn read_statement_dir(dir: &Path, format: SourceFormat) -> Result<StatementDir> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("Reading input dir: {}", dir.display()))?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("Listing input dir: {}", dir.display()))?
            .path();
        if path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();

    let mut contents = StatementDir::default();
    for path in paths {
        let name = path.to_string_lossy().into_owned();
        match fs::read(&path) {
            Ok(bytes) => contents.files.push(StatementFile::new(name, bytes)),
            Err(source) => {
                warn!(file = %name, %format, error = %source, "cannot read statement");
                contents.unreadable.push(StatementError::Unreadable {
                    file: name,
                    format,
                    source,
                });
            }
        }
    }
    Ok(contents)
}
