//! Builds the JSON-safe [`Summary`] of a delimited-text table.
//!
//! [`summarize`] is a pure function of its inputs: no clocks, no randomness,
//! and every map in the output keeps header order, so identical input yields
//! byte-identical JSON. The only designed degradations are per-column `null`
//! statistics and the `null` full-data marker above the row ceiling.

use std::sync::Arc;

use log::debug;
use serde::{
    Serialize, Serializer,
    ser::{SerializeMap, SerializeSeq},
};

use crate::{
    data::Cell,
    error::ParseError,
    io_utils::DEFAULT_CSV_DELIMITER,
    schema::ColumnKind,
    stats::{ColumnStats, NumericStats},
    table::Table,
};

pub const DEFAULT_SAMPLE_ROWS: usize = 5;
pub const DEFAULT_FULL_DATA_ROW_CEILING: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryOptions {
    pub include_full_data: bool,
    pub full_data_row_ceiling: usize,
    pub sample_rows: usize,
    pub delimiter: u8,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self {
            include_full_data: false,
            full_data_row_ceiling: DEFAULT_FULL_DATA_ROW_CEILING,
            sample_rows: DEFAULT_SAMPLE_ROWS,
            delimiter: DEFAULT_CSV_DELIMITER,
        }
    }
}

impl SummaryOptions {
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }
}

/// Ordered column-keyed mapping that serializes as a JSON object.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMap<T>(Vec<(String, T)>);

impl<T> ColumnMap<T> {
    pub fn get(&self, column: &str) -> Option<&T> {
        self.0
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl<T> FromIterator<(String, T)> for ColumnMap<T> {
    fn from_iter<I: IntoIterator<Item = (String, T)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<T: Serialize> Serialize for ColumnMap<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// One table row, serialized as an object keyed by column name. Column
/// names are shared between all records of a summary.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    columns: Arc<[String]>,
    cells: Vec<Cell>,
}

impl Record {
    pub fn get(&self, column: &str) -> Option<&Cell> {
        self.columns
            .iter()
            .position(|name| name == column)
            .and_then(|idx| self.cells.get(idx))
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }
}

impl Serialize for Record {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (name, cell) in self.columns.iter().zip(&self.cells) {
            map.serialize_entry(name, cell)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FullData {
    NotRequested,
    OverCeiling,
    Rows(Vec<Record>),
}

impl FullData {
    pub fn is_not_requested(&self) -> bool {
        matches!(self, FullData::NotRequested)
    }

    pub fn rows(&self) -> Option<&[Record]> {
        match self {
            FullData::Rows(rows) => Some(rows.as_slice()),
            _ => None,
        }
    }
}

impl Serialize for FullData {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            FullData::NotRequested | FullData::OverCeiling => serializer.serialize_none(),
            FullData::Rows(rows) => {
                let mut seq = serializer.serialize_seq(Some(rows.len()))?;
                for row in rows {
                    seq.serialize_element(row)?;
                }
                seq.end()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub rows: usize,
    pub columns: usize,
    pub column_names: Vec<String>,
    pub column_types: ColumnMap<ColumnKind>,
    pub missing_values: ColumnMap<usize>,
    pub sample_data: Vec<Record>,
    #[serde(skip_serializing_if = "FullData::is_not_requested")]
    pub full_data: FullData,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numeric_stats: Option<ColumnMap<NumericStats>>,
}

impl Summary {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Parses `raw_text` and summarizes the resulting table.
pub fn summarize(raw_text: &str, options: &SummaryOptions) -> Result<Summary, ParseError> {
    let table = Table::parse(raw_text, options.delimiter)?;
    Ok(summarize_table(table, options))
}

/// Consumes `table`; rows included as full data are moved, not copied.
pub fn summarize_table(table: Table, options: &SummaryOptions) -> Summary {
    let rows = table.row_count();
    let columns = table.column_count();
    let column_names = table.column_names();
    let shared_names: Arc<[String]> = column_names.clone().into();

    let column_types = table
        .columns()
        .iter()
        .map(|column| (column.name.clone(), column.kind))
        .collect::<ColumnMap<_>>();

    let missing_values = (0..columns)
        .map(|idx| (column_names[idx].clone(), table.missing_count(idx)))
        .collect::<ColumnMap<_>>();

    let numeric = table
        .columns()
        .iter()
        .enumerate()
        .filter(|(_, column)| column.kind.is_numeric())
        .map(|(idx, column)| {
            let stats = ColumnStats::from_cells(table.column_cells(idx));
            (column.name.clone(), stats.finish())
        })
        .collect::<ColumnMap<_>>();
    let numeric_stats = (!numeric.is_empty()).then_some(numeric);

    let to_record = |cells: Vec<Cell>| Record {
        columns: Arc::clone(&shared_names),
        cells,
    };

    let sample_data = table
        .rows()
        .iter()
        .take(options.sample_rows)
        .cloned()
        .map(to_record)
        .collect::<Vec<_>>();

    let full_data = if !options.include_full_data {
        FullData::NotRequested
    } else if rows > options.full_data_row_ceiling {
        debug!(
            "Omitting full data: {rows} row(s) exceeds ceiling of {}",
            options.full_data_row_ceiling
        );
        FullData::OverCeiling
    } else {
        FullData::Rows(table.into_rows().into_iter().map(to_record).collect())
    };

    Summary {
        rows,
        columns,
        column_names,
        column_types,
        missing_values,
        sample_data,
        full_data,
        numeric_stats,
    }
}

/// Stateless summarization service configured once at startup.
#[derive(Debug, Clone, Copy)]
pub struct Summarizer {
    sample_rows: usize,
    full_data_row_ceiling: usize,
}

impl Default for Summarizer {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_ROWS, DEFAULT_FULL_DATA_ROW_CEILING)
    }
}

impl Summarizer {
    pub fn new(sample_rows: usize, full_data_row_ceiling: usize) -> Self {
        Self {
            sample_rows,
            full_data_row_ceiling,
        }
    }

    pub fn options(&self, include_full_data: bool, delimiter: u8) -> SummaryOptions {
        SummaryOptions {
            include_full_data,
            full_data_row_ceiling: self.full_data_row_ceiling,
            sample_rows: self.sample_rows,
            delimiter,
        }
    }

    pub fn summarize(
        &self,
        raw_text: &str,
        include_full_data: bool,
        delimiter: u8,
    ) -> Result<Summary, ParseError> {
        summarize(raw_text, &self.options(include_full_data, delimiter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn to_value(summary: &Summary) -> Value {
        serde_json::to_value(summary).expect("serialize summary")
    }

    #[test]
    fn summary_fields_serialize_in_wire_order() {
        let summary = summarize("b,a\n1,x\n", &SummaryOptions::default()).unwrap();
        let json = summary.to_json().unwrap();
        assert_eq!(
            json,
            concat!(
                r#"{"rows":1,"columns":2,"columnNames":["b","a"],"#,
                r#""columnTypes":{"b":"integer","a":"string"},"#,
                r#""missingValues":{"b":0,"a":0},"#,
                r#""sampleData":[{"b":1,"a":"x"}],"#,
                r#""numericStats":{"b":{"mean":1.0,"min":1.0,"max":1.0,"std":null}}}"#
            )
        );
    }

    #[test]
    fn text_only_table_omits_numeric_stats() {
        let summary = summarize("name\nAnn\nBo\n", &SummaryOptions::default()).unwrap();
        assert!(summary.numeric_stats.is_none());
        assert!(to_value(&summary).get("numericStats").is_none());
    }

    #[test]
    fn zero_row_table_keeps_columns_and_null_stats() {
        let summary = summarize("a,b\n", &SummaryOptions::default()).unwrap();
        let value = to_value(&summary);
        assert_eq!(value["rows"], 0);
        assert_eq!(value["columns"], 2);
        assert_eq!(value["sampleData"], json!([]));
        assert_eq!(
            value["numericStats"]["a"],
            json!({"mean": null, "min": null, "max": null, "std": null})
        );
    }

    #[test]
    fn full_data_over_ceiling_is_explicit_null() {
        let options = SummaryOptions {
            include_full_data: true,
            full_data_row_ceiling: 2,
            ..SummaryOptions::default()
        };
        let summary = summarize("v\n1\n2\n3\n", &options).unwrap();
        assert_eq!(summary.full_data, FullData::OverCeiling);
        let value = to_value(&summary);
        assert_eq!(value.get("fullData"), Some(&Value::Null));
    }

    #[test]
    fn full_data_at_ceiling_includes_every_row() {
        let options = SummaryOptions {
            include_full_data: true,
            full_data_row_ceiling: 3,
            ..SummaryOptions::default()
        };
        let summary = summarize("v\n1\n2\n3\n", &options).unwrap();
        let rows = summary.full_data.rows().expect("rows included");
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2].get("v"), Some(&Cell::Integer(3)));
    }

    #[test]
    fn sample_respects_configured_size() {
        let summarizer = Summarizer::new(2, 10);
        let summary = summarizer.summarize("v\n1\n2\n3\n", false, b',').unwrap();
        assert_eq!(summary.sample_data.len(), 2);
        assert!(to_value(&summary).get("fullData").is_none());
    }
}
