//! Field mapper: projects parsed rows into typed records.
//!
//! Each target field resolves through exactly one of two rule kinds: a
//! direct column copy (string, unconverted) or a compute function over the
//! whole row. Compute functions are the only coercion point - numeric and
//! boolean parsing happens here, never in the parser.

use crate::error::FeedError;
use crate::textfeed::parser::Row;

/// One mapping rule for a target field of `T`.
///
/// `Column` copies `row[column]` verbatim into the record through the
/// setter; a missing column yields the empty string. `Compute` receives the
/// entire row and may fail, which aborts the whole mapping - a commerce feed
/// must never lose records silently.
pub enum FieldRule<T> {
    Column {
        column: &'static str,
        set: fn(&mut T, String),
    },
    Compute {
        /// Target field name, carried for mapping diagnostics.
        target: &'static str,
        apply: fn(&mut T, &Row) -> Result<(), FeedError>,
    },
}

impl<T> FieldRule<T> {
    pub fn column(column: &'static str, set: fn(&mut T, String)) -> Self {
        FieldRule::Column { column, set }
    }

    pub fn compute(target: &'static str, apply: fn(&mut T, &Row) -> Result<(), FeedError>) -> Self {
        FieldRule::Compute { target, apply }
    }
}

/// Apply `rules` to every row, producing one record per row in input order.
///
/// A failing compute rule propagates with the row index and target field in
/// the diagnostic; no record is skipped or reordered.
pub fn map_rows<T: Default>(rows: &[Row], rules: &[FieldRule<T>]) -> Result<Vec<T>, FeedError> {
    let mut out = Vec::with_capacity(rows.len());
    for (idx, row) in rows.iter().enumerate() {
        let mut record = T::default();
        for rule in rules {
            match rule {
                FieldRule::Column { column, set } => {
                    set(&mut record, row.get(*column).cloned().unwrap_or_default());
                }
                FieldRule::Compute { target, apply } => {
                    apply(&mut record, row).map_err(|e| {
                        FeedError::Map(format!("row {idx}, field \"{target}\": {e}"))
                    })?;
                }
            }
        }
        out.push(record);
    }
    Ok(out)
}

/// Parse a feed price value. Tolerates `$` prefixes and comma grouping
/// (`"$1,299.99"`); an empty value is an error - a product row without a
/// price is a broken feed, not a free product.
pub fn parse_price(raw: &str) -> Result<f64, FeedError> {
    let cleaned: String = raw
        .trim()
        .trim_start_matches('$')
        .chars()
        .filter(|c| *c != ',')
        .collect();
    if cleaned.is_empty() {
        return Err(FeedError::Map("empty price value".to_string()));
    }
    cleaned
        .parse::<f64>()
        .map_err(|_| FeedError::Map(format!("invalid price {raw:?}")))
}

/// Parse a feed quantity value. Blank means zero on hand (distributors ship
/// blanks for out-of-stock lines); anything else must be an integer.
pub fn parse_quantity(raw: &str) -> Result<i64, FeedError> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return Ok(0);
    }
    cleaned
        .parse::<i64>()
        .map_err(|_| FeedError::Map(format!("invalid quantity {raw:?}")))
}
