// crates/flight-atlas-engine-http/src/csv.rs
// ============================================================================
// Module: CSV Result Decoder
// Description: Quoted-field CSV decoding for engine result objects.
// Purpose: Turn delimited result text into named result rows.
// Dependencies: flight-atlas-core, thiserror
// ============================================================================

//! ## Overview
//! Engine results are comma-delimited text with a header record. This decoder
//! handles quoted fields, doubled-quote escapes, and CRLF line endings. The
//! header names the columns; data records shorter or longer than the header
//! still decode, pairing values positionally, and the transformer reports any
//! column that ends up missing. Quoting errors fail the whole decode because
//! field boundaries are no longer trustworthy past that point.

// ============================================================================
// SECTION: Imports
// ============================================================================

use flight_atlas_core::ResultRow;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CSV decoding errors.
///
/// # Invariants
/// - Record numbers are one-based and count the header.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CsvError {
    /// The input has no header record.
    #[error("csv input is empty")]
    Empty,
    /// A quoted field was never closed.
    #[error("unterminated quoted field starting in record {record}")]
    UnterminatedQuote {
        /// One-based record number where the open quote started.
        record: usize,
    },
    /// A quote appeared inside an unquoted field.
    #[error("unexpected quote in record {record}")]
    UnexpectedQuote {
        /// One-based record number containing the stray quote.
        record: usize,
    },
}

// ============================================================================
// SECTION: Decoder
// ============================================================================

/// Parser position within a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldState {
    /// At the start of a field; quoting is still possible.
    Start,
    /// Inside an unquoted field.
    Unquoted,
    /// Inside a quoted field.
    Quoted,
    /// Just consumed a quote inside a quoted field.
    QuoteInQuoted,
}

/// Splits raw CSV text into records of fields.
fn parse_records(input: &str) -> Result<Vec<Vec<String>>, CsvError> {
    let mut records = Vec::new();
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut state = FieldState::Start;
    let mut chars = input.chars().peekable();
    while let Some(ch) = chars.next() {
        match state {
            FieldState::Start => match ch {
                '"' => state = FieldState::Quoted,
                ',' => fields.push(String::new()),
                '\r' | '\n' => {
                    if ch == '\r' && chars.peek() == Some(&'\n') {
                        chars.next();
                    }
                    // A bare newline with no pending fields is a blank line,
                    // not a record.
                    if !fields.is_empty() {
                        fields.push(String::new());
                        records.push(std::mem::take(&mut fields));
                    }
                }
                other => {
                    field.push(other);
                    state = FieldState::Unquoted;
                }
            },
            FieldState::Unquoted => match ch {
                '"' => {
                    return Err(CsvError::UnexpectedQuote {
                        record: records.len() + 1,
                    });
                }
                ',' => {
                    fields.push(std::mem::take(&mut field));
                    state = FieldState::Start;
                }
                '\r' | '\n' => {
                    if ch == '\r' && chars.peek() == Some(&'\n') {
                        chars.next();
                    }
                    fields.push(std::mem::take(&mut field));
                    records.push(std::mem::take(&mut fields));
                    state = FieldState::Start;
                }
                other => field.push(other),
            },
            FieldState::Quoted => match ch {
                '"' => state = FieldState::QuoteInQuoted,
                other => field.push(other),
            },
            FieldState::QuoteInQuoted => match ch {
                '"' => {
                    field.push('"');
                    state = FieldState::Quoted;
                }
                ',' => {
                    fields.push(std::mem::take(&mut field));
                    state = FieldState::Start;
                }
                '\r' | '\n' => {
                    if ch == '\r' && chars.peek() == Some(&'\n') {
                        chars.next();
                    }
                    fields.push(std::mem::take(&mut field));
                    records.push(std::mem::take(&mut fields));
                    state = FieldState::Start;
                }
                _ => {
                    return Err(CsvError::UnexpectedQuote {
                        record: records.len() + 1,
                    });
                }
            },
        }
    }
    match state {
        FieldState::Quoted => {
            return Err(CsvError::UnterminatedQuote {
                record: records.len() + 1,
            });
        }
        FieldState::Unquoted | FieldState::QuoteInQuoted => {
            fields.push(std::mem::take(&mut field));
            records.push(fields);
        }
        FieldState::Start => {
            // A trailing newline leaves nothing pending; a dangling comma
            // leaves an empty final field.
            if !fields.is_empty() {
                fields.push(String::new());
                records.push(fields);
            }
        }
    }
    Ok(records)
}

/// Decodes CSV text with a header record into named result rows.
///
/// # Errors
///
/// Returns [`CsvError`] when the input is empty or quoting is malformed.
pub fn decode_rows(input: &str) -> Result<Vec<ResultRow>, CsvError> {
    let mut records = parse_records(input)?.into_iter();
    let header = records.next().ok_or(CsvError::Empty)?;
    let rows = records
        .map(|record| {
            ResultRow::new(header.iter().cloned().zip(record).collect())
        })
        .collect();
    Ok(rows)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
