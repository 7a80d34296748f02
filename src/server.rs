//! HTTP front end for the summarizer.
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/analyze` | Fetch `fileUrl` and return its summary |
//!
//! Validation failures answer `400`, fetch and parse failures `500`; both
//! carry a `{"detail": "..."}` body. The only shared state is the
//! [`AnalyzeService`], which holds configuration and an HTTP client.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

use crate::{
    config::ServiceConfig,
    error::AnalyzeError,
    fetch::HttpFetcher,
    io_utils,
    summary::{Summarizer, Summary},
};

pub type AppState = Arc<AnalyzeService>;

/// Body of `POST /analyze`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub file_url: Option<String>,
    pub include_full_data: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRequest {
    pub file_url: String,
    pub include_full_data: bool,
}

impl AnalyzeRequest {
    pub fn validate(self) -> Result<ValidatedRequest, AnalyzeError> {
        let file_url = self
            .file_url
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .ok_or_else(|| AnalyzeError::Validation("fileUrl is required".to_string()))?;
        Ok(ValidatedRequest {
            file_url,
            include_full_data: self.include_full_data.unwrap_or(false),
        })
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    detail: String,
}

#[derive(Debug)]
pub struct ApiError(AnalyzeError);

impl From<AnalyzeError> for ApiError {
    fn from(err: AnalyzeError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = if self.0.is_client_error() {
            (StatusCode::BAD_REQUEST, self.0.to_string())
        } else {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error processing CSV: {}", self.0),
            )
        };
        (status, Json(ErrorResponse { detail })).into_response()
    }
}

#[derive(Debug, Clone)]
pub struct AnalyzeService {
    summarizer: Summarizer,
    fetcher: HttpFetcher,
    delimiter: Option<u8>,
}

impl AnalyzeService {
    pub fn new(summarizer: Summarizer, fetcher: HttpFetcher, delimiter: Option<u8>) -> Self {
        Self {
            summarizer,
            fetcher,
            delimiter,
        }
    }

    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        let fetcher = HttpFetcher::new(config.fetch_timeout())?;
        Ok(Self::new(
            config.summarizer(),
            fetcher,
            config.delimiter_byte(),
        ))
    }

    pub async fn analyze(&self, request: ValidatedRequest) -> Result<Summary, AnalyzeError> {
        let ValidatedRequest {
            file_url,
            include_full_data,
        } = request;
        let fetched = self.fetcher.fetch(&file_url).await?;
        let delimiter = io_utils::resolve_url_delimiter(&file_url, self.delimiter);
        info!(
            "Parsing {} byte(s) of {} text from '{file_url}' with delimiter '{}'",
            fetched.text.len(),
            fetched.encoding,
            io_utils::printable_delimiter(delimiter)
        );

        let summarizer = self.summarizer;
        let summary = tokio::task::spawn_blocking(move || {
            summarizer.summarize(&fetched.text, include_full_data, delimiter)
        })
        .await
        .map_err(|err| AnalyzeError::Task(err.to_string()))??;

        info!(
            "Summarized '{file_url}': {} row(s), {} column(s)",
            summary.rows, summary.columns
        );
        Ok(summary)
    }
}

pub fn router(state: AppState, allowed_origins: &[String]) -> Result<Router> {
    let origins = allowed_origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin).with_context(|| format!("Invalid CORS origin '{origin}'"))
        })
        .collect::<Result<Vec<_>>>()?;
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request());

    Ok(Router::new()
        .route("/analyze", post(analyze))
        .with_state(state)
        .layer(cors))
}

async fn analyze(
    State(service): State<AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<Summary>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        warn!("Rejected analyze request: {}", rejection.body_text());
        AnalyzeError::Validation(format!("Invalid request body: {}", rejection.body_text()))
    })?;
    let request = request.validate().inspect_err(|err| warn!("{err}"))?;
    info!("Received fileUrl: {}", request.file_url);

    match service.analyze(request).await {
        Ok(summary) => Ok(Json(summary)),
        Err(err) => {
            error!("Analysis failed: {err}");
            Err(err.into())
        }
    }
}

/// Binds the configured address and serves until Ctrl-C.
pub async fn serve(config: ServiceConfig) -> Result<()> {
    let service = Arc::new(AnalyzeService::from_config(&config)?);
    let app = router(service, &config.allowed_origins)?;

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Binding {}", config.bind))?;
    info!(
        "Listening on http://{} (sample rows {}, full-data ceiling {})",
        config.bind, config.sample_rows, config.full_data_row_ceiling
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Serving HTTP")?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {err}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_requires_non_blank_file_url() {
        let missing = AnalyzeRequest::default().validate().unwrap_err();
        assert_eq!(missing.to_string(), "fileUrl is required");
        assert!(missing.is_client_error());

        let blank = AnalyzeRequest {
            file_url: Some("   ".into()),
            include_full_data: Some(true),
        };
        assert!(blank.validate().is_err());
    }

    #[test]
    fn validate_defaults_include_full_data_to_false() {
        let request: AnalyzeRequest =
            serde_json::from_str(r#"{"fileUrl": "http://host/data.csv"}"#).unwrap();
        assert_eq!(
            request.validate().unwrap(),
            ValidatedRequest {
                file_url: "http://host/data.csv".into(),
                include_full_data: false,
            }
        );
    }

    #[test]
    fn invalid_origin_is_reported() {
        let service = Arc::new(AnalyzeService::new(
            Summarizer::default(),
            HttpFetcher::new(std::time::Duration::from_secs(1)).unwrap(),
            None,
        ));
        let err = router(service, &["bad\norigin".to_string()]).unwrap_err();
        assert!(err.to_string().contains("Invalid CORS origin"));
    }
}
