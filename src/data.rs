use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Serialize, Serializer};

/// Tokens that mark a cell as "not available" once surrounding whitespace is
/// trimmed. Matching is case-sensitive.
pub const MISSING_TOKENS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN", "<NA>",
    "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%Y/%m/%d", "%d-%m-%Y"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// A single table cell after column coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Missing,
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Text(String),
}

impl Cell {
    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Integer(i) => Some(*i as f64),
            Cell::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl Serialize for Cell {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Cell::Missing => serializer.serialize_none(),
            Cell::Integer(i) => serializer.serialize_i64(*i),
            Cell::Float(f) => match json_safe(*f) {
                Some(value) => serializer.serialize_f64(value),
                None => serializer.serialize_none(),
            },
            Cell::Boolean(b) => serializer.serialize_bool(*b),
            Cell::Text(s) => serializer.serialize_str(s),
        }
    }
}

/// Maps NaN and the infinities to `None` so no encoder ever sees them.
pub fn json_safe(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

pub fn is_missing_token(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.is_empty() || MISSING_TOKENS.contains(&trimmed)
}

pub fn parse_integer(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok()
}

pub fn parse_float(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| !value.is_nan())
}

pub fn parse_boolean(raw: &str) -> Option<bool> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        Some(true)
    } else if trimmed.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

pub fn parse_naive_date(raw: &str) -> Option<NaiveDate> {
    let value = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
}

pub fn parse_naive_datetime(raw: &str) -> Option<NaiveDateTime> {
    let value = raw.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.naive_utc())
        })
}

pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        String::new()
    } else if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.4}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_tokens_are_trimmed_and_case_sensitive() {
        assert!(is_missing_token(""));
        assert!(is_missing_token("   "));
        assert!(is_missing_token(" NA "));
        assert!(is_missing_token("null"));
        assert!(is_missing_token("#N/A"));
        assert!(!is_missing_token("Na"));
        assert!(!is_missing_token("NONE"));
        assert!(!is_missing_token("0"));
    }

    #[test]
    fn parse_float_rejects_nan_but_keeps_infinity() {
        assert_eq!(parse_float(" 2.5 "), Some(2.5));
        assert_eq!(parse_float("1e3"), Some(1000.0));
        assert_eq!(parse_float("NAN"), None);
        assert_eq!(parse_float("inf"), Some(f64::INFINITY));
        assert_eq!(parse_float("abc"), None);
    }

    #[test]
    fn parse_boolean_ignores_case_only() {
        assert_eq!(parse_boolean("TRUE"), Some(true));
        assert_eq!(parse_boolean("False"), Some(false));
        assert_eq!(parse_boolean("yes"), None);
        assert_eq!(parse_boolean("1"), None);
    }

    #[test]
    fn parse_naive_date_supports_multiple_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 5, 6).unwrap();
        assert_eq!(parse_naive_date("2024-05-06"), Some(expected));
        assert_eq!(parse_naive_date("06/05/2024"), Some(expected));
        assert_eq!(parse_naive_date("2024/05/06"), Some(expected));
        assert_eq!(parse_naive_date("May 6th"), None);
    }

    #[test]
    fn parse_naive_datetime_accepts_rfc3339() {
        let expected =
            NaiveDateTime::parse_from_str("2024-05-06 14:30:00", "%Y-%m-%d %H:%M:%S").unwrap();
        assert_eq!(parse_naive_datetime("2024-05-06T14:30:00"), Some(expected));
        assert_eq!(parse_naive_datetime("2024-05-06 14:30"), Some(expected));
        assert_eq!(
            parse_naive_datetime("2024-05-06T16:30:00+02:00"),
            Some(expected)
        );
    }

    #[test]
    fn non_finite_floats_serialize_as_null() {
        let cells = vec![
            Cell::Float(f64::INFINITY),
            Cell::Float(f64::NAN),
            Cell::Float(1.5),
            Cell::Missing,
            Cell::Integer(7),
            Cell::Text("x".into()),
        ];
        let json = serde_json::to_string(&cells).unwrap();
        assert_eq!(json, r#"[null,null,1.5,null,7,"x"]"#);
    }
}
