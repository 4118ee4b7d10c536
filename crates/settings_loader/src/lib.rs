//! # Settings Loader
//!
//! Loads the portfolio `settings.json`: which brokerage formats are enabled and
//! where their exports live, the hand-maintained positions, the aggregation
//! mode and the output directory.
//!
//! ## Usage Examples
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! // Load settings from a specific path
//! let settings = settings_loader::load_settings("config/portfolio.json")?;
//!
//! // Explicit path, else ./settings.json, else built-in defaults
//! let settings = settings_loader::load_settings_with_fallback(Some(Path::new("settings.json")))?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use models::Settings;
use tracing::info;

pub const DEFAULT_SETTINGS_FILE: &str = "settings.json";

/// Loads settings from a JSON file
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Reading settings file: {}", path.display()))?;
    let settings: Settings = serde_json::from_str(&raw)
        .with_context(|| format!("Parsing settings JSON in {}", path.display()))?;
    Ok(settings)
}

/// Loads settings from the default location (settings.json in the current directory)
pub fn load_default_settings() -> Result<Settings> {
    load_settings(DEFAULT_SETTINGS_FILE)
}

/// An explicit path must load. Without one, `settings.json` is used when present
/// and the built-in defaults otherwise.
pub fn load_settings_with_fallback(path: Option<&Path>) -> Result<Settings> {
    if let Some(settings_path) = path {
        return load_settings(settings_path);
    }

    if Path::new(DEFAULT_SETTINGS_FILE).is_file() {
        return load_default_settings();
    }

    info!("no settings file, using built-in defaults");
    Ok(Settings::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::{AggregationMode, SourceFormat};

    #[test]
    fn test_load_settings_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(
            &path,
            r#"{
                "sources": [
                    { "format": "fidelity", "input_dir": "exports/fidelity" },
                    { "format": "sprott", "input_dir": "exports/sprott", "enabled": false }
                ],
                "manual_positions": [],
                "aggregation_mode": "rescale_digit_symbols",
                "output_dir": "reports"
            }"#,
        )
        .unwrap();

        let settings = load_settings_with_fallback(Some(path.as_path())).unwrap();
        assert_eq!(settings.enabled_formats(), vec![SourceFormat::Fidelity]);
        assert_eq!(
            settings.input_dir(SourceFormat::Sprott),
            Some(Path::new("exports/sprott"))
        );
        assert!(settings.manual_positions.is_empty());
        assert_eq!(settings.aggregation_mode, AggregationMode::RescaleDigitSymbols);
    }

    #[test]
    fn test_explicit_path_errors_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(load_settings_with_fallback(Some(missing.as_path())).is_err());

        let broken = dir.path().join("broken.json");
        fs::write(&broken, "{ not json").unwrap();
        let err = load_settings(&broken).unwrap_err();
        assert!(format!("{:#}", err).contains("Parsing settings JSON"));
    }
}
