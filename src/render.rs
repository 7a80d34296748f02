//! Plain-text column profile for the `summarize --table` command.

use std::fmt::Write as _;

use itertools::Itertools;

use crate::{data::format_number, summary::Summary};

const PROFILE_HEADERS: [&str; 7] = ["column", "type", "missing", "mean", "min", "max", "std"];

/// One line per column: its type, missing count, and (for numeric columns)
/// the descriptive statistics. Undefined statistics render as blanks.
pub fn render_profile(summary: &Summary) -> String {
    let rows = summary
        .column_names
        .iter()
        .map(|name| {
            let kind = summary
                .column_types
                .get(name)
                .map(|kind| kind.as_str())
                .unwrap_or_default();
            let missing = summary.missing_values.get(name).copied().unwrap_or(0);
            let stats = summary
                .numeric_stats
                .as_ref()
                .and_then(|stats| stats.get(name));
            let metric = |pick: fn(&crate::stats::NumericStats) -> Option<f64>| {
                stats
                    .and_then(pick)
                    .map(format_number)
                    .unwrap_or_default()
            };
            vec![
                name.clone(),
                kind.to_string(),
                missing.to_string(),
                metric(|s| s.mean),
                metric(|s| s.min),
                metric(|s| s.max),
                metric(|s| s.std),
            ]
        })
        .collect::<Vec<_>>();

    let mut output = format!(
        "{} row(s) x {} column(s)\n",
        summary.rows, summary.columns
    );
    output.push_str(&render_table(&PROFILE_HEADERS, &rows));
    output
}

pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths = headers
        .iter()
        .map(|h| h.chars().count().max(3))
        .collect::<Vec<_>>();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(sanitize(cell).chars().count());
        }
    }

    let mut output = String::new();
    let header_cells = headers.iter().map(|h| h.to_string()).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_line(&header_cells, &widths));
    let rule = widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_line(&rule, &widths));
    for row in rows {
        let _ = writeln!(output, "{}", format_line(row, &widths));
    }
    output
}

fn format_line(cells: &[String], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", sanitize(cell), width = *width))
        .join("  ")
        .trim_end()
        .to_string()
}

fn sanitize(value: &str) -> String {
    value.replace(['\n', '\r', '\t'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::{SummaryOptions, summarize};

    #[test]
    fn render_table_pads_columns() {
        let rows = vec![
            vec!["1".to_string(), "Alice".to_string()],
            vec!["2".to_string(), "Bo\tb".to_string()],
        ];
        let rendered = render_table(&["id", "name"], &rows);
        let lines = rendered.lines().collect::<Vec<_>>();
        assert_eq!(lines, vec!["id   name", "---  -----", "1    Alice", "2    Bo b"]);
    }

    #[test]
    fn profile_lists_every_column() {
        let summary = summarize("n,label\n1,a\n2,\n3,c\n", &SummaryOptions::default()).unwrap();
        let rendered = render_profile(&summary);
        let lines = rendered.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], "3 row(s) x 2 column(s)");
        assert!(lines[3].starts_with("n "));
        assert!(lines[3].contains("integer"));
        assert!(lines[3].ends_with("1"));
        assert_eq!(lines[4], "label   string   1");
    }
}
