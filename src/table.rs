//! In-memory table parsed from delimited text.
//!
//! Parsing happens in two passes. The first pass reads every record as raw
//! strings and lets each column's [`TypeCandidate`] vote; the second pass
//! consumes the raw rows and coerces each cell into the decided
//! [`ColumnKind`]. Raw strings are dropped row by row as they are converted.

use log::debug;

use crate::{
    data::{Cell, is_missing_token, parse_boolean, parse_float, parse_integer},
    error::ParseError,
    io_utils,
    schema::{ColumnKind, NumericKind, TypeCandidate, disambiguate_headers},
};

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

#[derive(Debug, Clone)]
pub struct Table {
    columns: Vec<Column>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn parse(text: &str, delimiter: u8) -> Result<Self, ParseError> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        check_quotes(text.as_bytes(), delimiter)?;

        let mut reader = io_utils::open_csv_reader(text.as_bytes(), delimiter);
        let mut records = reader.records();
        let header = match records.next() {
            Some(record) => record?,
            None => return Err(ParseError::Empty),
        };
        let raw_headers = header.iter().map(str::to_string).collect::<Vec<_>>();
        let names = disambiguate_headers(&raw_headers);
        let width = names.len();

        let mut candidates = vec![TypeCandidate::new(); width];
        let mut raw_rows: Vec<Vec<String>> = Vec::new();
        for record in records {
            let record = record?;
            if record.len() > width {
                let line = record
                    .position()
                    .map(|pos| pos.line() as usize)
                    .unwrap_or(raw_rows.len() + 2);
                return Err(ParseError::FieldCount {
                    line,
                    expected: width,
                    found: record.len(),
                });
            }
            let mut row = Vec::with_capacity(width);
            for (idx, field) in record.iter().enumerate() {
                candidates[idx].update(field);
                row.push(field.to_string());
            }
            raw_rows.push(row);
        }

        let columns = names
            .into_iter()
            .zip(candidates.iter())
            .map(|(name, candidate)| Column {
                name,
                kind: candidate.decide(),
            })
            .collect::<Vec<_>>();
        debug!(
            "Parsed {} row(s); column kinds: {:?}",
            raw_rows.len(),
            columns.iter().map(|c| c.kind.as_str()).collect::<Vec<_>>()
        );

        let rows = raw_rows
            .into_iter()
            .map(|raw| {
                let mut cells = raw
                    .into_iter()
                    .zip(columns.iter())
                    .map(|(value, column)| coerce_cell(value, column.kind))
                    .collect::<Vec<_>>();
                cells.resize(width, Cell::Missing);
                cells
            })
            .collect();

        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn column_cells(&self, index: usize) -> impl Iterator<Item = &Cell> + '_ {
        self.rows.iter().filter_map(move |row| row.get(index))
    }

    pub fn missing_count(&self, index: usize) -> usize {
        self.column_cells(index).filter(|c| c.is_missing()).count()
    }

    pub fn into_rows(self) -> Vec<Vec<Cell>> {
        self.rows
    }
}

fn coerce_cell(raw: String, kind: ColumnKind) -> Cell {
    if is_missing_token(&raw) {
        return Cell::Missing;
    }
    let coerced = match kind {
        ColumnKind::Numeric(NumericKind::Integer) => parse_integer(&raw).map(Cell::Integer),
        ColumnKind::Numeric(NumericKind::Float) => parse_float(&raw).map(Cell::Float),
        ColumnKind::Boolean => parse_boolean(&raw).map(Cell::Boolean),
        ColumnKind::Temporal(_) | ColumnKind::Text => None,
    };
    coerced.unwrap_or(Cell::Text(raw))
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum QuoteState {
    FieldStart,
    Unquoted,
    Quoted,
    QuoteInQuoted,
}

/// Rejects input whose final quoted field never closes. The csv reader would
/// otherwise swallow the remainder of the text into that field.
fn check_quotes(bytes: &[u8], delimiter: u8) -> Result<(), ParseError> {
    let mut state = QuoteState::FieldStart;
    let mut line = 1usize;
    let mut opened_on = 1usize;
    for &byte in bytes {
        let terminator = byte == b'\n' || byte == b'\r';
        state = match state {
            QuoteState::FieldStart | QuoteState::Unquoted | QuoteState::QuoteInQuoted
                if terminator || byte == delimiter =>
            {
                QuoteState::FieldStart
            }
            QuoteState::FieldStart if byte == b'"' => {
                opened_on = line;
                QuoteState::Quoted
            }
            QuoteState::FieldStart | QuoteState::Unquoted => QuoteState::Unquoted,
            QuoteState::Quoted if byte == b'"' => QuoteState::QuoteInQuoted,
            QuoteState::Quoted => QuoteState::Quoted,
            QuoteState::QuoteInQuoted if byte == b'"' => QuoteState::Quoted,
            QuoteState::QuoteInQuoted => QuoteState::Unquoted,
        };
        if byte == b'\n' {
            line += 1;
        }
    }
    if state == QuoteState::Quoted {
        return Err(ParseError::UnterminatedQuote { line: opened_on });
    }
    Ok(())
}
