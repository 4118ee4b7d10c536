use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use csv::WriterBuilder;
use models::{CanonicalRecord, SummaryRecord};

const REPORT_DATE_FORMAT: &str = "%b-%d-%Y";

pub fn ledger_file_name(date: NaiveDate) -> String {
    format!("Summary_Master_{}.csv", date.format(REPORT_DATE_FORMAT))
}

pub fn summary_file_name(date: NaiveDate) -> String {
    format!("Concise_{}.csv", date.format(REPORT_DATE_FORMAT))
}

/// Ledger as CSV with the canonical column titles; unavailable values are empty cells.
pub fn write_ledger_csv<W: Write>(writer: W, ledger: &[CanonicalRecord]) -> Result<()> {
    // Header written by hand so an empty ledger still gets one
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(writer);
    wtr.write_record(CanonicalRecord::COLUMNS)?;
    for record in ledger {
        wtr.serialize(record)
            .with_context(|| format!("Serializing ledger row for {}", record.account))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Summary as CSV; unavailable values are written as `n/a`.
pub fn write_summary_csv<W: Write>(writer: W, summary: &[SummaryRecord]) -> Result<()> {
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(writer);
    wtr.write_record(SummaryRecord::COLUMNS)?;
    for row in summary {
        wtr.serialize(row)
            .with_context(|| format!("Serializing summary row for {}", row.symbol))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Reads a ledger previously written by [`write_ledger_csv`].
pub fn read_ledger_csv<R: Read>(reader: R) -> Result<Vec<CanonicalRecord>> {
    let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
    let mut ledger = Vec::new();
    for (idx, row) in rdr.deserialize::<CanonicalRecord>().enumerate() {
        let record = row.with_context(|| format!("Parsing ledger row {}", idx + 1))?;
        ledger.push(record);
    }
    Ok(ledger)
}

pub fn write_ledger_file(path: &Path, ledger: &[CanonicalRecord]) -> Result<()> {
    let file = create_report(path)?;
    write_ledger_csv(file, ledger).with_context(|| format!("Writing ledger: {}", path.display()))
}

pub fn write_summary_file(path: &Path, summary: &[SummaryRecord]) -> Result<()> {
    let file = create_report(path)?;
    write_summary_csv(file, summary).with_context(|| format!("Writing summary: {}", path.display()))
}

pub fn read_ledger_file(path: &Path) -> Result<Vec<CanonicalRecord>> {
    let file = File::open(path).with_context(|| format!("Opening ledger: {}", path.display()))?;
    read_ledger_csv(file).with_context(|| format!("Reading ledger: {}", path.display()))
}

fn create_report(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Creating output dir: {}", parent.display()))?;
        }
    }
    File::create(path).with_context(|| format!("Creating report: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn to_string(buf: Vec<u8>) -> String {
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_report_file_names() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        assert_eq!(ledger_file_name(date), "Summary_Master_Mar-04-2024.csv");
        assert_eq!(summary_file_name(date), "Concise_Mar-04-2024.csv");
    }

    #[test]
    fn test_empty_ledger_still_has_header() {
        let mut buf = Vec::new();
        write_ledger_csv(&mut buf, &[]).unwrap();
        assert_eq!(
            to_string(buf),
            "Account Name/Number,Symbol,Description,Quantity,Last Price,Current Value,\
Total Gain/Loss Dollar,Total Gain/Loss Percent,Cost Basis Per Share,Total Cost Basis\n"
        );
    }

    #[test]
    fn test_ledger_unavailable_cells_are_empty_and_read_back() {
        let record = CanonicalRecord {
            symbol: Some("ABC".to_string()),
            description: "ABC, Inc".to_string(),
            quantity: Some(10.0),
            current_value: Some(1000.5),
            ..CanonicalRecord::new("Z1 Individual")
        };
        let mut buf = Vec::new();
        write_ledger_csv(&mut buf, std::slice::from_ref(&record)).unwrap();

        let text = to_string(buf.clone());
        let row = text.lines().nth(1).unwrap();
        assert_eq!(row, "Z1 Individual,ABC,\"ABC, Inc\",10.0,,1000.5,,,,");

        let back = read_ledger_csv(buf.as_slice()).unwrap();
        assert_eq!(back, vec![record]);
    }

    #[test]
    fn test_summary_writes_na_for_unavailable() {
        let row = SummaryRecord {
            symbol: "XYZ".to_string(),
            description: "XYZ Corp".to_string(),
            quantity: 0.0,
            last_price: None,
            current_value: 10.0,
            gain_loss_dollar: 10.0,
            gain_loss_percent: None,
            average_cost_basis: None,
            total_cost_basis: 0.0,
            position_size_percent: Some(100.0),
        };
        let mut buf = Vec::new();
        write_summary_csv(&mut buf, &[row]).unwrap();
        let text = to_string(buf);
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("Symbol,Description,Quantity,Last Price,Current Value,Total Gain/Loss Dollar,Total Gain/Loss Percent,Average Cost Basis,Total Cost Basis,Position Size(%)")
        );
        assert_eq!(lines.next(), Some("XYZ,XYZ Corp,0.0,n/a,10.0,10.0,n/a,n/a,0.0,100.0"));
    }

    #[test]
    fn test_ledger_file_round_trip_creates_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports").join(ledger_file_name(
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
        ));
        let ledger = vec![CanonicalRecord {
            quantity: Some(1.0),
            ..CanonicalRecord::new("QCU")
        }];
        write_ledger_file(&path, &ledger).unwrap();
        assert_eq!(read_ledger_file(&path).unwrap(), ledger);
    }
}
