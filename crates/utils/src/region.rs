use thiserror::Error;
use tracing::debug;

/// Format-specific test applied to one row (a line split into cells).
pub type RowPredicate = fn(&[String]) -> bool;

#[derive(Debug, Clone, Copy)]
pub enum StartMarker {
    /// The header is the first row matching `matches`. When nothing matches,
    /// `fallback` is used as the header line if the format defines one.
    Header {
        label: &'static str,
        matches: RowPredicate,
        fallback: Option<usize>,
    },
    /// The header always sits on this line.
    Fixed(usize),
}

#[derive(Debug, Clone, Copy)]
pub enum EndMarker {
    /// The body runs to the last line.
    None,
    /// The first row below the header matching the predicate ends the body (and is excluded).
    FromTop(RowPredicate),
    /// Scanning upwards, the first row matching the predicate ends the body (and is excluded).
    FromBottom(RowPredicate),
}

#[derive(Debug, Clone, Copy)]
pub struct RegionSpec {
    pub start: StartMarker,
    pub end: EndMarker,
}

/// Rows kept after dropping `skip_top` lines of banner and `skip_bottom` lines of footer.
/// The first kept row is the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub skip_top: usize,
    pub skip_bottom: usize,
}

impl Region {
    pub fn header_index(&self) -> usize {
        self.skip_top
    }

    /// Exclusive end of the region for a table of `total` rows.
    pub fn end_index(&self, total: usize) -> usize {
        total.saturating_sub(self.skip_bottom)
    }

    pub fn is_empty(&self, total: usize) -> bool {
        self.skip_top >= self.end_index(total)
    }

    /// Header plus body rows.
    pub fn slice<'a, T>(&self, rows: &'a [T]) -> &'a [T] {
        if self.is_empty(rows.len()) {
            return &[];
        }
        &rows[self.skip_top..self.end_index(rows.len())]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegionError {
    #[error("start marker '{0}' not found")]
    StartNotFound(&'static str),
    #[error("region is empty or inverted (skip {skip_top} from top, {skip_bottom} from bottom of {total} rows)")]
    Empty {
        skip_top: usize,
        skip_bottom: usize,
        total: usize,
    },
}

pub fn locate_region(rows: &[Vec<String>], spec: &RegionSpec) -> Result<Region, RegionError> {
    let total = rows.len();

    let header = match spec.start {
        StartMarker::Fixed(line) => line,
        StartMarker::Header {
            label,
            matches,
            fallback,
        } => match rows.iter().position(|row| matches(row)) {
            Some(line) => line,
            None => {
                let line = fallback.ok_or(RegionError::StartNotFound(label))?;
                debug!(marker = label, line, "start marker missing, using fixed offset");
                line
            }
        },
    };

    let end = match spec.end {
        EndMarker::None => total,
        EndMarker::FromTop(matches) => rows
            .iter()
            .enumerate()
            .skip(header + 1)
            .find(|(_, row)| matches(row))
            .map(|(line, _)| line)
            .unwrap_or(total),
        EndMarker::FromBottom(matches) => rows
            .iter()
            .rposition(|row| matches(row))
            .filter(|&line| line > header)
            .unwrap_or(total),
    };

    let region = Region {
        skip_top: header,
        skip_bottom: total - end,
    };
    if region.is_empty(total) {
        return Err(RegionError::Empty {
            skip_top: region.skip_top,
            skip_bottom: region.skip_bottom,
            total,
        });
    }
    Ok(region)
}

/// First cell of a row, trimmed.
pub fn first_cell(row: &[String]) -> &str {
    row.first().map(|c| c.trim()).unwrap_or("")
}

pub fn is_blank_row(row: &[String]) -> bool {
    row.iter().all(|c| c.trim().is_empty())
}
