//! Delimited-text parsing and field mapping for file-based distributor feeds.

pub mod mapper;
pub mod parser;

pub use mapper::{map_rows, parse_price, parse_quantity, FieldRule};
pub use parser::{parse_delimited, ParsedTable, Row};
