use calamine::{open_workbook_auto_from_rs, Data, Reader};
use encoding_rs::WINDOWS_1252;
use models::StatementFile;
use std::collections::HashMap;
use std::io::Cursor;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Spreadsheet,
    Delimited,
}

/// Every line of an export, split into cells. Blank lines are kept so line
/// numbers match the file.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub kind: TableKind,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Error)]
pub enum DelimitedError {
    #[error("no text content")]
    Empty,
    #[error("line {line}: {source}")]
    Csv {
        line: usize,
        #[source]
        source: csv::Error,
    },
}

#[derive(Debug, Error)]
#[error("not a spreadsheet ({spreadsheet}) and not delimited text ({delimited})")]
pub struct TableError {
    pub spreadsheet: calamine::Error,
    pub delimited: DelimitedError,
}

/// Spreadsheet first, delimited text second. Which one succeeded is kept in
/// [`Table::kind`]; the spreadsheet failure is logged when text parsing takes over.
pub fn read_table(file: &StatementFile) -> Result<Table, TableError> {
    match read_spreadsheet(&file.contents) {
        Ok(rows) => Ok(Table {
            kind: TableKind::Spreadsheet,
            rows,
        }),
        Err(spreadsheet) => {
            debug!(file = %file.name, error = %spreadsheet, "not a spreadsheet, reading as delimited text");
            let text = decode_text(&file.contents);
            match read_delimited(&text) {
                Ok(rows) => Ok(Table {
                    kind: TableKind::Delimited,
                    rows,
                }),
                Err(delimited) => Err(TableError {
                    spreadsheet,
                    delimited,
                }),
            }
        }
    }
}

/// First worksheet of an xls/xlsx/xlsb/ods workbook. Rows and columns before
/// the first used cell are padded back in.
pub fn read_spreadsheet(bytes: &[u8]) -> Result<Vec<Vec<String>>, calamine::Error> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(calamine::Error::Msg("workbook has no sheets"))??;

    let (first_row, first_col) = range.start().unwrap_or((0, 0));
    let mut rows: Vec<Vec<String>> = (0..first_row).map(|_| vec![String::new()]).collect();
    for row in range.rows() {
        let mut cells: Vec<String> = vec![String::new(); first_col as usize];
        cells.extend(row.iter().map(cell_str));
        rows.push(cells);
    }
    Ok(rows)
}

/// Parses each line on its own so that blank lines survive as empty rows.
pub fn read_delimited(text: &str) -> Result<Vec<Vec<String>>, DelimitedError> {
    if text.trim().is_empty() {
        return Err(DelimitedError::Empty);
    }

    let mut rows = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(line.as_bytes());
        let row = match reader.records().next() {
            Some(rec) => {
                let rec = rec.map_err(|source| DelimitedError::Csv {
                    line: idx + 1,
                    source,
                })?;
                rec.iter().map(|c| c.to_string()).collect()
            }
            None => vec![String::new()],
        };
        rows.push(row);
    }
    Ok(rows)
}

/// Exports are UTF-8 (sometimes with a BOM) or Windows-1252.
pub fn decode_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            let (decoded, _, _) = WINDOWS_1252.decode(bytes);
            decoded.into_owned()
        }
    }
}

fn cell_str(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::Empty => String::new(),
        _ => cell.to_string(),
    }
}

/// Trimmed cell at `idx`, empty when the row is short.
pub fn cell(row: &[String], idx: usize) -> &str {
    row.get(idx).map(|c| c.trim()).unwrap_or("")
}

/// Like [`cell`] for optional columns.
pub fn opt_cell(row: &[String], idx: Option<usize>) -> &str {
    idx.map(|i| cell(row, i)).unwrap_or("")
}

/// Header name to column position. The first occurrence of a name wins and
/// ignored names are never indexed.
#[derive(Debug, Clone, Default)]
pub struct ColumnIndex {
    idx: HashMap<String, usize>,
}

impl ColumnIndex {
    pub fn new(header: &[String], ignored: &[&str]) -> Self {
        let mut idx = HashMap::new();
        for (i, name) in header.iter().enumerate() {
            let name = name.trim();
            if name.is_empty() || ignored.iter().any(|ig| ig.eq_ignore_ascii_case(name)) {
                continue;
            }
            idx.entry(name.to_string()).or_insert(i);
        }
        Self { idx }
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.idx.get(name).copied()
    }

    /// Position of the first name present, for columns renamed between export versions.
    pub fn first_of(&self, names: &[&str]) -> Option<usize> {
        names.iter().find_map(|n| self.position(n))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.idx.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.idx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.idx.is_empty()
    }
}
