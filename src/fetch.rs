//! Downloads source files for the analyze endpoint.

use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, info};
use reqwest::header::CONTENT_TYPE;

use crate::{error::FetchError, io_utils};

#[derive(Debug, Clone)]
pub struct FetchedFile {
    pub text: String,
    pub encoding: &'static str,
}

#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Building HTTP client")?;
        Ok(Self { client })
    }

    /// GETs `url` and decodes the body as text. Non-2xx statuses, transport
    /// failures, and undecodable bodies are all [`FetchError`]s.
    pub async fn fetch(&self, url: &str) -> Result<FetchedFile, FetchError> {
        let response = self.client.get(url).send().await.map_err(|source| {
            if source.is_builder() {
                FetchError::InvalidUrl {
                    url: url.to_string(),
                    source,
                }
            } else {
                FetchError::Transport {
                    url: url.to_string(),
                    source,
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let declared = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(io_utils::charset_from_content_type)
            .and_then(|label| encoding_rs::Encoding::for_label(label.as_bytes()));
        let encoding = declared.unwrap_or(encoding_rs::UTF_8);
        debug!("Decoding '{url}' as {}", encoding.name());

        let bytes = response
            .bytes()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;
        let text = io_utils::decode_text(&bytes, Some(encoding)).ok_or(FetchError::Decode {
            url: url.to_string(),
            encoding: encoding.name(),
        })?;
        info!("Downloaded {} byte(s) from '{url}'", bytes.len());
        Ok(FetchedFile {
            text,
            encoding: encoding.name(),
        })
    }
}
