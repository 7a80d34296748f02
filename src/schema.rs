//! Column naming and type inference.
//!
//! Inference is a vote over every value in a column: a [`TypeCandidate`]
//! records which coercions each non-missing value survives, and
//! [`TypeCandidate::decide`] picks the narrowest kind that all of them
//! survived. Missing values never vote, so a column with no values at all
//! is vacuously numeric.

use std::{collections::HashSet, fmt};

use serde::{Serialize, Serializer};

use crate::data::{
    is_missing_token, parse_boolean, parse_float, parse_integer, parse_naive_date,
    parse_naive_datetime,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericKind {
    Integer,
    Float,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemporalKind {
    Date,
    DateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Numeric(NumericKind),
    Boolean,
    Temporal(TemporalKind),
    Text,
}

impl ColumnKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnKind::Numeric(NumericKind::Integer) => "integer",
            ColumnKind::Numeric(NumericKind::Float) => "float",
            ColumnKind::Boolean => "boolean",
            ColumnKind::Temporal(TemporalKind::Date) => "date",
            ColumnKind::Temporal(TemporalKind::DateTime) => "datetime",
            ColumnKind::Text => "string",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnKind::Numeric(_))
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ColumnKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default)]
pub struct TypeCandidate {
    non_missing: usize,
    integer_matches: usize,
    float_matches: usize,
    boolean_matches: usize,
    date_matches: usize,
    datetime_matches: usize,
}

impl TypeCandidate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, value: &str) {
        if is_missing_token(value) {
            return;
        }
        self.non_missing += 1;

        if parse_integer(value).is_some() {
            self.integer_matches += 1;
        }
        if parse_float(value).is_some() {
            self.float_matches += 1;
            return;
        }
        if parse_boolean(value).is_some() {
            self.boolean_matches += 1;
            return;
        }
        if parse_naive_date(value).is_some() {
            self.date_matches += 1;
        } else if parse_naive_datetime(value).is_some() {
            self.datetime_matches += 1;
        }
    }

    fn all(&self, count: usize) -> bool {
        count == self.non_missing
    }

    pub fn decide(&self) -> ColumnKind {
        if self.all(self.integer_matches) {
            ColumnKind::Numeric(if self.non_missing == 0 {
                NumericKind::Float
            } else {
                NumericKind::Integer
            })
        } else if self.all(self.float_matches) {
            ColumnKind::Numeric(NumericKind::Float)
        } else if self.all(self.boolean_matches) {
            ColumnKind::Boolean
        } else if self.all(self.date_matches) {
            ColumnKind::Temporal(TemporalKind::Date)
        } else if self.all(self.date_matches + self.datetime_matches) {
            ColumnKind::Temporal(TemporalKind::DateTime)
        } else {
            ColumnKind::Text
        }
    }
}

/// Produces a unique, non-empty name for every header field.
///
/// Blank headers become `Unnamed: <index>`. A repeated name `x` becomes
/// `x.1`, `x.2`, ... using the first suffix not already taken.
pub fn disambiguate_headers(raw: &[String]) -> Vec<String> {
    let mut taken: HashSet<String> = HashSet::with_capacity(raw.len());
    let mut names = Vec::with_capacity(raw.len());
    for (idx, header) in raw.iter().enumerate() {
        let base = if header.trim().is_empty() {
            format!("Unnamed: {idx}")
        } else {
            header.clone()
        };
        let mut candidate = base.clone();
        let mut suffix = 1usize;
        while taken.contains(&candidate) {
            candidate = format!("{base}.{suffix}");
            suffix += 1;
        }
        taken.insert(candidate.clone());
        names.push(candidate);
    }
    names
}
