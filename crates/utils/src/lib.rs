pub mod numbers;
pub mod parser;
pub mod region;
pub mod repair;
pub mod table;

// Re-export commonly used items
pub use crate::numbers::{clean_number, ratio, CoercionError, DecimalMark, NumberCleaner};
pub use crate::parser::{ParseFailure, ParsedStatement, Statement, StatementError, StatementParser};
pub use crate::region::{
    first_cell, is_blank_row, locate_region, EndMarker, Region, RegionError, RegionSpec, StartMarker,
};
pub use crate::repair::{CashMatch, GainLossSign};
pub use crate::table::{cell, opt_cell, read_table, ColumnIndex, Table, TableError, TableKind};
