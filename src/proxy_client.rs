use crate::listing::{FetchError, MovieSource};
use crate::models::{Filters, MovieSummary};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const FETCH_MOVIES_PATH: &str = "/api/fetch-movies";

/// Talks to a running CineSeek server's `/api/fetch-movies` endpoint.
#[derive(Debug, Clone)]
pub struct ProxyClient {
    client: Client,
    base_url: String,
}

#[derive(Deserialize)]
struct MoviesBody {
    #[serde(default)]
    movies: Option<Vec<MovieSummary>>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

impl ProxyClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(60))
            .build()
            .context("Failed to build proxy HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}{FETCH_MOVIES_PATH}", self.base_url)
    }
}

#[async_trait]
impl MovieSource for ProxyClient {
    async fn fetch_movies(&self, filters: &Filters) -> Result<Vec<MovieSummary>, FetchError> {
        let res = self
            .client
            .post(self.endpoint())
            .json(filters)
            .send()
            .await
            .map_err(|e| FetchError::new(e.to_string()))?;
        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|e| FetchError::new(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&text)
                .ok()
                .and_then(|b| b.error)
                .unwrap_or_else(|| "Failed to fetch movies".to_string());
            return Err(FetchError::new(message));
        }

        let body: MoviesBody =
            serde_json::from_str(&text).map_err(|e| FetchError::new(e.to_string()))?;
        Ok(body.movies.unwrap_or_default())
    }
}
