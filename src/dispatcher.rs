// src/dispatcher.rs
//! Sends search and style requests to the assistant backend.
//!
//! Failures never escape as `Err`: they are folded into the result's
//! `error` field so the renderer can show them with a retry action.

use std::time::Duration;

use log::{info, warn};
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::errors::QuanBuyError;
use crate::models::{AnalysisResult, SearchRequest, SearchResult, StyleRequest};

pub const SEARCH_PATH: &str = "/api/search-products";
pub const ANALYZE_STYLE_PATH: &str = "/api/analyze-style";

pub struct Dispatcher {
    client: Client,
    base_url: String,
}

impl Dispatcher {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, QuanBuyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| QuanBuyError::Transport(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn search(&self, request: &SearchRequest) -> SearchResult {
        match self.post(SEARCH_PATH, request).await {
            Ok(result) => result,
            Err(e) => SearchResult::from_error(e.to_string()),
        }
    }

    pub async fn analyze_style(&self, request: &StyleRequest) -> AnalysisResult {
        match self.post(ANALYZE_STYLE_PATH, request).await {
            Ok(result) => result,
            Err(e) => AnalysisResult::from_error(e.to_string()),
        }
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, DispatchError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        info!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                warn!("Request to {} failed: {}", url, e);
                DispatchError::Transport(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!("{} answered {}", url, status);
            return Err(DispatchError::Status(status));
        }

        response
            .json::<R>()
            .await
            .map_err(|e| DispatchError::Transport(format!("Invalid response body: {}", e)))
    }
}

#[derive(Debug, thiserror::Error)]
enum DispatchError {
    #[error("HTTP {} {}", .0.as_u16(), .0.canonical_reason().unwrap_or("Unknown Status"))]
    Status(reqwest::StatusCode),

    #[error("{0}")]
    Transport(String),
}
