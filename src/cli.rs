use std::{net::SocketAddr, path::PathBuf};

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about = "Summarize delimited data files", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the HTTP analyze service
    Serve(ServeArgs),
    /// Summarize a local CSV file and print the result
    Summarize(SummarizeArgs),
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// YAML file with service settings; flags below override it
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Socket address to listen on (defaults to 127.0.0.1:8000)
    #[arg(long)]
    pub bind: Option<SocketAddr>,
    /// Number of sample rows included in each summary
    #[arg(long = "sample-rows")]
    pub sample_rows: Option<usize>,
    /// Maximum row count for which full data is returned
    #[arg(long = "full-data-row-ceiling")]
    pub full_data_row_ceiling: Option<usize>,
    /// Timeout in seconds for downloading the source file
    #[arg(long = "fetch-timeout-secs")]
    pub fetch_timeout_secs: Option<u64>,
    /// Origin allowed by CORS (repeatable)
    #[arg(long = "allow-origin", action = clap::ArgAction::Append)]
    pub allowed_origins: Vec<String>,
    /// Force a delimiter instead of resolving it from the file URL
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
}

#[derive(Debug, Args)]
pub struct SummarizeArgs {
    /// Input CSV file to summarize ('-' for stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Include every row when the file is within the row ceiling
    #[arg(long = "full-data")]
    pub full_data: bool,
    /// Maximum row count for which full data is returned
    #[arg(long = "full-data-row-ceiling", default_value_t = crate::summary::DEFAULT_FULL_DATA_ROW_CEILING)]
    pub full_data_row_ceiling: usize,
    /// Number of sample rows to include
    #[arg(long = "sample-rows", default_value_t = crate::summary::DEFAULT_SAMPLE_ROWS)]
    pub sample_rows: usize,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Pretty-print the JSON output
    #[arg(long)]
    pub pretty: bool,
    /// Render a column profile table instead of JSON
    #[arg(long = "table", conflicts_with = "pretty")]
    pub table: bool,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            check_delimiter(first)
        }
    }
}

/// Accepts ASCII delimiters other than the quote character and line breaks.
pub fn check_delimiter(delimiter: char) -> Result<u8, String> {
    if !delimiter.is_ascii() || matches!(delimiter, '"' | '\n' | '\r') {
        return Err(format!(
            "Delimiter {delimiter:?} must be an ASCII character other than a quote or line break"
        ));
    }
    Ok(delimiter as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_delimiter_accepts_names_and_single_chars() {
        assert_eq!(parse_delimiter("tab"), Ok(b'\t'));
        assert_eq!(parse_delimiter("semicolon"), Ok(b';'));
        assert_eq!(parse_delimiter(":"), Ok(b':'));
        assert!(parse_delimiter("").is_err());
        assert!(parse_delimiter("ab").is_err());
        assert!(parse_delimiter("\"").is_err());
        assert!(parse_delimiter("é").is_err());
        assert!(parse_delimiter("\n").is_err());
        assert!(parse_delimiter("\r").is_err());
    }

    #[test]
    fn serve_flags_parse() {
        let cli = Cli::try_parse_from([
            "csv-summary",
            "serve",
            "--bind",
            "0.0.0.0:9000",
            "--allow-origin",
            "http://a",
            "--allow-origin",
            "http://b",
        ])
        .expect("parse serve args");
        match cli.command {
            Commands::Serve(args) => {
                assert_eq!(args.bind.unwrap().port(), 9000);
                assert_eq!(args.allowed_origins, vec!["http://a", "http://b"]);
                assert!(args.sample_rows.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
