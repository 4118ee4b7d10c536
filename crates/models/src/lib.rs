use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

// Source formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
	Fidelity,
	Etrade,
	Schwab,
	Canaccord,
	/// Retired export layout, kept for old statements.
	Ameritrade,
	/// Precious-metals broker, retired.
	Sprott,
}

impl SourceFormat {
	/// Processing order used when no explicit order is configured.
	pub const ALL: [SourceFormat; 6] = [
		SourceFormat::Fidelity,
		SourceFormat::Etrade,
		SourceFormat::Sprott,
		SourceFormat::Ameritrade,
		SourceFormat::Canaccord,
		SourceFormat::Schwab,
	];

	pub fn name(&self) -> &'static str {
		match self {
			SourceFormat::Fidelity => "Fidelity",
			SourceFormat::Etrade => "E*Trade",
			SourceFormat::Schwab => "Schwab",
			SourceFormat::Canaccord => "Canaccord",
			SourceFormat::Ameritrade => "Ameritrade",
			SourceFormat::Sprott => "Sprott",
		}
	}

	pub fn default_input_dir(&self) -> &'static str {
		match self {
			SourceFormat::Fidelity => "Fidelity/",
			SourceFormat::Etrade => "Etrade/",
			SourceFormat::Schwab => "Schwab/",
			SourceFormat::Canaccord => "Canaccord/",
			SourceFormat::Ameritrade => "Ameritrade/",
			SourceFormat::Sprott => "sprott/",
		}
	}

	pub fn is_deprecated(&self) -> bool {
		matches!(self, SourceFormat::Ameritrade | SourceFormat::Sprott)
	}
}

impl fmt::Display for SourceFormat {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

impl FromStr for SourceFormat {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"fidelity" => Ok(SourceFormat::Fidelity),
			"etrade" | "e*trade" | "e-trade" => Ok(SourceFormat::Etrade),
			"schwab" => Ok(SourceFormat::Schwab),
			"canaccord" => Ok(SourceFormat::Canaccord),
			"ameritrade" | "tdameritrade" => Ok(SourceFormat::Ameritrade),
			"sprott" => Ok(SourceFormat::Sprott),
			other => Err(format!("unknown source format '{}'", other)),
		}
	}
}

/// One statement export as handed over by whoever read it from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementFile {
	pub name: String,
	pub contents: Vec<u8>,
}

impl StatementFile {
	pub fn new(name: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
		Self {
			name: name.into(),
			contents: contents.into(),
		}
	}

	/// File name without directories and without the last extension.
	pub fn stem(&self) -> &str {
		let base = self
			.name
			.rsplit(['/', '\\'])
			.next()
			.unwrap_or(self.name.as_str());
		match base.rfind('.') {
			Some(dot) if dot > 0 => &base[..dot],
			_ => base,
		}
	}
}

// Ledger rows
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CanonicalRecord {
	#[serde(rename = "Account Name/Number", default)]
	pub account: String,
	#[serde(rename = "Symbol")]
	pub symbol: Option<String>,
	#[serde(rename = "Description", default)]
	pub description: String,
	#[serde(rename = "Quantity")]
	pub quantity: Option<f64>,
	#[serde(rename = "Last Price")]
	pub last_price: Option<f64>,
	#[serde(rename = "Current Value")]
	pub current_value: Option<f64>,
	#[serde(rename = "Total Gain/Loss Dollar")]
	pub total_gain_loss_dollar: Option<f64>,
	#[serde(rename = "Total Gain/Loss Percent")]
	pub total_gain_loss_percent: Option<f64>,
	#[serde(rename = "Cost Basis Per Share")]
	pub cost_basis_per_share: Option<f64>,
	#[serde(rename = "Total Cost Basis")]
	pub total_cost_basis: Option<f64>,
}

impl CanonicalRecord {
	pub const COLUMNS: [&'static str; 10] = [
		"Account Name/Number",
		"Symbol",
		"Description",
		"Quantity",
		"Last Price",
		"Current Value",
		"Total Gain/Loss Dollar",
		"Total Gain/Loss Percent",
		"Cost Basis Per Share",
		"Total Cost Basis",
	];

	pub fn new(account: impl Into<String>) -> Self {
		Self {
			account: account.into(),
			..Self::default()
		}
	}

	pub fn has_quantity(&self) -> bool {
		self.quantity.is_some()
	}

	/// The trimmed symbol, or `None` when it is missing or blank.
	pub fn symbol_text(&self) -> Option<&str> {
		self.symbol
			.as_deref()
			.map(str::trim)
			.filter(|s| !s.is_empty())
	}
}

// Aggregated rows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRecord {
	#[serde(rename = "Symbol")]
	pub symbol: String,
	#[serde(rename = "Description")]
	pub description: String,
	#[serde(rename = "Quantity")]
	pub quantity: f64,
	#[serde(rename = "Last Price", serialize_with = "unavailable_as_na")]
	pub last_price: Option<f64>,
	#[serde(rename = "Current Value")]
	pub current_value: f64,
	#[serde(rename = "Total Gain/Loss Dollar")]
	pub gain_loss_dollar: f64,
	#[serde(rename = "Total Gain/Loss Percent", serialize_with = "unavailable_as_na")]
	pub gain_loss_percent: Option<f64>,
	#[serde(rename = "Average Cost Basis", serialize_with = "unavailable_as_na")]
	pub average_cost_basis: Option<f64>,
	#[serde(rename = "Total Cost Basis")]
	pub total_cost_basis: f64,
	#[serde(rename = "Position Size(%)", serialize_with = "unavailable_as_na")]
	pub position_size_percent: Option<f64>,
}

impl SummaryRecord {
	pub const COLUMNS: [&'static str; 10] = [
		"Symbol",
		"Description",
		"Quantity",
		"Last Price",
		"Current Value",
		"Total Gain/Loss Dollar",
		"Total Gain/Loss Percent",
		"Average Cost Basis",
		"Total Cost Basis",
		"Position Size(%)",
	];
}

pub const UNAVAILABLE: &str = "n/a";

fn unavailable_as_na<S: Serializer>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
	match value {
		Some(v) => serializer.serialize_f64(*v),
		None => serializer.serialize_str(UNAVAILABLE),
	}
}

// Hand-maintained positions (bank cash, off-exchange holdings)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualPosition {
	pub account: String,
	pub symbol: String,
	#[serde(default)]
	pub description: String,
	#[serde(default)]
	pub quantity: Option<f64>,
	#[serde(default)]
	pub last_price: Option<f64>,
	#[serde(default)]
	pub current_value: Option<f64>,
	#[serde(default)]
	pub total_cost_basis: Option<f64>,
}

impl ManualPosition {
	pub fn new(account: &str, symbol: &str, description: &str, last_price: Option<f64>) -> Self {
		Self {
			account: account.to_string(),
			symbol: symbol.to_string(),
			description: description.to_string(),
			quantity: None,
			last_price,
			current_value: None,
			total_cost_basis: None,
		}
	}

	pub fn to_record(&self) -> CanonicalRecord {
		CanonicalRecord {
			account: self.account.clone(),
			symbol: Some(self.symbol.clone()),
			description: self.description.clone(),
			quantity: self.quantity,
			last_price: self.last_price,
			current_value: self.current_value,
			total_cost_basis: self.total_cost_basis,
			..CanonicalRecord::default()
		}
	}

	/// Built-in table used when the settings file does not provide one.
	///
	/// Every entry is a placeholder without a quantity, so the ledger's
	/// no-quantity filter drops all of them until the holdings are filled in
	/// through `manual_positions` in the settings file.
	pub fn default_table() -> Vec<ManualPosition> {
		vec![
			ManualPosition::new("QCU", "Cash", "Cash", Some(1.0)),
			ManualPosition::new("Etrade", "Cash", "Cash", Some(1.0)),
			ManualPosition::new("VioBank", "Cash", "Cash", Some(1.0)),
			ManualPosition::new("Dealmaker", "DTRC", "JR Resources", None),
			ManualPosition::new("Dealmaker", "Carbon Streaming", "Carbon Streaming", None),
			ManualPosition::new("Dealmaker", "Carbon Streaming", "Carbon Streaming", None),
			ManualPosition::new("Dealmaker", "DTRC", "Dakota Territory Resource Corp", None),
			ManualPosition::new("Robin Hood", "BTC", "BTC", None),
			ManualPosition::new("Robin Hood", "Cash", "Cash", None),
			ManualPosition::new("Kraken", "BTC", "BTC", None),
		]
	}
}

// Aggregation options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationMode {
	/// Symbols containing digits are left out of the summary.
	#[default]
	ExcludeDigitSymbols,
	/// Symbols containing digits stay in; their cost basis per share is quoted per 100.
	RescaleDigitSymbols,
}

impl FromStr for AggregationMode {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"exclude" | "exclude_digit_symbols" => Ok(AggregationMode::ExcludeDigitSymbols),
			"rescale" | "rescale_digit_symbols" => Ok(AggregationMode::RescaleDigitSymbols),
			other => Err(format!("unknown aggregation mode '{}'", other)),
		}
	}
}

// Settings models
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSettings {
	pub format: SourceFormat,
	pub input_dir: PathBuf,
	#[serde(default = "default_enabled")]
	pub enabled: bool,
}

fn default_enabled() -> bool {
	true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
	#[serde(default = "default_sources")]
	pub sources: Vec<SourceSettings>,
	#[serde(default = "ManualPosition::default_table")]
	pub manual_positions: Vec<ManualPosition>,
	#[serde(default)]
	pub aggregation_mode: AggregationMode,
	#[serde(default = "default_output_dir")]
	pub output_dir: PathBuf,
}

fn default_sources() -> Vec<SourceSettings> {
	SourceFormat::ALL
		.iter()
		.map(|format| SourceSettings {
			format: *format,
			input_dir: PathBuf::from(format.default_input_dir()),
			enabled: !format.is_deprecated(),
		})
		.collect()
}

fn default_output_dir() -> PathBuf {
	PathBuf::from(".")
}

impl Default for Settings {
	fn default() -> Self {
		Self {
			sources: default_sources(),
			manual_positions: ManualPosition::default_table(),
			aggregation_mode: AggregationMode::default(),
			output_dir: default_output_dir(),
		}
	}
}

impl Settings {
	/// Enabled formats in configured order.
	pub fn enabled_formats(&self) -> Vec<SourceFormat> {
		self.sources
			.iter()
			.filter(|s| s.enabled)
			.map(|s| s.format)
			.collect()
	}

	pub fn input_dir(&self, format: SourceFormat) -> Option<&Path> {
		self.sources
			.iter()
			.find(|s| s.format == format)
			.map(|s| s.input_dir.as_path())
	}

	/// Turns a format on or off; formats missing from the list are appended with their default directory.
	pub fn set_enabled(&mut self, format: SourceFormat, enabled: bool) {
		match self.sources.iter_mut().find(|s| s.format == format) {
			Some(source) => source.enabled = enabled,
			None => self.sources.push(SourceSettings {
				format,
				input_dir: PathBuf::from(format.default_input_dir()),
				enabled,
			}),
		}
	}
}
