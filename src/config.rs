use std::{fs::File, io::BufReader, net::SocketAddr, path::Path, time::Duration};

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

use crate::{
    cli::{ServeArgs, check_delimiter},
    summary::{DEFAULT_FULL_DATA_ROW_CEILING, DEFAULT_SAMPLE_ROWS, Summarizer},
};

const DEFAULT_BIND: &str = "127.0.0.1:8000";
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;
const DEFAULT_ALLOWED_ORIGINS: &[&str] = &["http://localhost:5173", "http://localhost:3000"];

/// Settings for the analyze service. Loaded from YAML when a config file is
/// given, then overridden by any command-line flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    pub bind: SocketAddr,
    pub sample_rows: usize,
    pub full_data_row_ceiling: usize,
    pub fetch_timeout_secs: u64,
    pub allowed_origins: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<char>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND
                .parse()
                .unwrap_or_else(|_| SocketAddr::from(([127, 0, 0, 1], 8000))),
            sample_rows: DEFAULT_SAMPLE_ROWS,
            full_data_row_ceiling: DEFAULT_FULL_DATA_ROW_CEILING,
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            allowed_origins: DEFAULT_ALLOWED_ORIGINS
                .iter()
                .map(|origin| origin.to_string())
                .collect(),
            delimiter: None,
        }
    }
}

impl ServiceConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening config file {path:?}"))?;
        let reader = BufReader::new(file);
        let config: ServiceConfig =
            serde_yaml::from_reader(reader).context("Parsing service config YAML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_args(args: &ServeArgs) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        if let Some(bind) = args.bind {
            config.bind = bind;
        }
        if let Some(rows) = args.sample_rows {
            config.sample_rows = rows;
        }
        if let Some(ceiling) = args.full_data_row_ceiling {
            config.full_data_row_ceiling = ceiling;
        }
        if let Some(secs) = args.fetch_timeout_secs {
            config.fetch_timeout_secs = secs;
        }
        if !args.allowed_origins.is_empty() {
            config.allowed_origins = args.allowed_origins.clone();
        }
        if let Some(delimiter) = args.delimiter {
            config.delimiter = Some(delimiter as char);
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        check_sample_rows(self.sample_rows)?;
        ensure!(
            self.fetch_timeout_secs >= 1,
            "fetch_timeout_secs must be at least 1"
        );
        if let Some(delimiter) = self.delimiter {
            check_delimiter(delimiter).map_err(anyhow::Error::msg)?;
        }
        Ok(())
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn delimiter_byte(&self) -> Option<u8> {
        self.delimiter.map(|c| c as u8)
    }

    pub fn summarizer(&self) -> Summarizer {
        Summarizer::new(self.sample_rows, self.full_data_row_ceiling)
    }
}

/// Summaries always carry at least one sample row when the table has any.
pub fn check_sample_rows(sample_rows: usize) -> Result<()> {
    ensure!(sample_rows >= 1, "sample_rows must be at least 1");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_match_service_constants() {
        let config = ServiceConfig::default();
        assert_eq!(config.sample_rows, 5);
        assert_eq!(config.full_data_row_ceiling, 10_000);
        assert_eq!(config.bind.to_string(), "127.0.0.1:8000");
        assert_eq!(config.allowed_origins.len(), 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn yaml_overrides_only_listed_fields() {
        let mut file = NamedTempFile::new().expect("temp file");
        writeln!(file, "full_data_row_ceiling: 50").unwrap();
        writeln!(file, "delimiter: \"|\"").unwrap();
        writeln!(file, "allowed_origins: [\"https://app.example.com\"]").unwrap();

        let config = ServiceConfig::load(file.path()).expect("load config");
        assert_eq!(config.full_data_row_ceiling, 50);
        assert_eq!(config.sample_rows, 5);
        assert_eq!(config.delimiter_byte(), Some(b'|'));
        assert_eq!(config.allowed_origins, vec!["https://app.example.com"]);
    }

    #[test]
    fn unknown_and_invalid_settings_are_rejected() {
        let mut unknown = NamedTempFile::new().expect("temp file");
        writeln!(unknown, "sample_row: 3").unwrap();
        assert!(ServiceConfig::load(unknown.path()).is_err());

        let mut zero = NamedTempFile::new().expect("temp file");
        writeln!(zero, "sample_rows: 0").unwrap();
        let err = ServiceConfig::load(zero.path()).unwrap_err();
        assert!(err.to_string().contains("sample_rows"));
    }

    #[test]
    fn delimiters_follow_command_line_rules() {
        for bad in ['"', '\n', '\r', 'é'] {
            let config = ServiceConfig {
                delimiter: Some(bad),
                ..ServiceConfig::default()
            };
            let err = config.validate().unwrap_err();
            assert!(err.to_string().contains("Delimiter"), "{bad:?}: {err}");
        }

        let mut quoted = NamedTempFile::new().expect("temp file");
        writeln!(quoted, "delimiter: '\"'").unwrap();
        assert!(ServiceConfig::load(quoted.path()).is_err());

        let tab = ServiceConfig {
            delimiter: Some('\t'),
            ..ServiceConfig::default()
        };
        assert!(tab.validate().is_ok());
        assert_eq!(tab.delimiter_byte(), Some(b'\t'));
    }
}
