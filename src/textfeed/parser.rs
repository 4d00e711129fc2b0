//! Resilient delimited-text parser used by the file-based adapters.
//!
//! Comma-separated, double-quote quoting, newline row separator (`\n` or
//! `\r\n`). The first row is always the header row. Pure function of its
//! input; no I/O, no partial results - either the whole document parses or
//! the call fails with a diagnostic.

use indexmap::IndexMap;

use crate::error::FeedError;

/// One parsed row: header name -> raw string value, in header order.
pub type Row = IndexMap<String, String>;

/// Result of parsing one delimited-text document.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTable {
    /// Column headers in source order.
    pub headers: Vec<String>,
    /// Data rows, in source order. Every header is present as a key; rows
    /// shorter than the header row carry empty strings for the missing
    /// trailing columns, and fields beyond the header count are dropped.
    pub rows: Vec<Row>,
}

struct RawField {
    value: String,
    quoted: bool,
}

/// Parse a delimited-text document into headers plus rows.
///
/// Quoted fields may embed separators and newlines verbatim; a doubled
/// double-quote inside a quoted field decodes to one literal quote. Blank
/// and whitespace-only lines are skipped. Stray quotes (a quote opening
/// mid-field, or content after a closing quote) are parse failures rather
/// than best-effort recovery - distributor feeds that trip this are broken
/// at the source and must not be guessed at.
pub fn parse_delimited(input: &str) -> Result<ParsedTable, FeedError> {
    let records = tokenize(input)?;

    let mut non_blank = records.into_iter().filter(|rec| !is_blank_record(rec));
    let header_record = non_blank
        .next()
        .ok_or_else(|| FeedError::Parse("empty input: no header row".to_string()))?;
    let headers: Vec<String> = header_record.into_iter().map(|f| f.value).collect();

    let mut rows = Vec::new();
    for record in non_blank {
        let mut fields = record.into_iter();
        let mut row = Row::with_capacity(headers.len());
        for header in &headers {
            let value = fields.next().map(|f| f.value).unwrap_or_default();
            row.insert(header.clone(), value);
        }
        // Fields beyond the header count have no name to land under.
        rows.push(row);
    }

    Ok(ParsedTable { headers, rows })
}

/// A record produced by a blank or whitespace-only source line. A quoted
/// empty field (`""`) is deliberately not blank.
fn is_blank_record(record: &[RawField]) -> bool {
    record.len() == 1 && !record[0].quoted && record[0].value.trim().is_empty()
}

fn tokenize(input: &str) -> Result<Vec<Vec<RawField>>, FeedError> {
    let mut records: Vec<Vec<RawField>> = Vec::new();
    let mut record: Vec<RawField> = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut in_quotes = false;
    // Set after a closing quote: only a separator or row end may follow.
    let mut closed = false;
    let mut line = 1usize;

    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' => {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        field.push('"');
                    } else {
                        in_quotes = false;
                        closed = true;
                    }
                }
                '\n' => {
                    field.push(c);
                    line += 1;
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.is_empty() && !closed => {
                in_quotes = true;
                quoted = true;
            }
            '"' => {
                return Err(FeedError::Parse(format!(
                    "line {line}: unexpected quote inside unquoted field"
                )));
            }
            ',' => {
                record.push(RawField {
                    value: std::mem::take(&mut field),
                    quoted,
                });
                quoted = false;
                closed = false;
            }
            '\r' if chars.peek() == Some(&'\n') => {
                // CRLF: handled by the '\n' arm on the next iteration.
            }
            '\n' => {
                record.push(RawField {
                    value: std::mem::take(&mut field),
                    quoted,
                });
                records.push(std::mem::take(&mut record));
                quoted = false;
                closed = false;
                line += 1;
            }
            _ if closed => {
                return Err(FeedError::Parse(format!(
                    "line {line}: unexpected character {c:?} after closing quote"
                )));
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(FeedError::Parse(
            "unterminated quoted field at end of input".to_string(),
        ));
    }

    // Flush a final record not terminated by a newline.
    if !field.is_empty() || quoted || !record.is_empty() {
        record.push(RawField {
            value: field,
            quoted,
        });
        records.push(record);
    }

    Ok(records)
}
