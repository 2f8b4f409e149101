use crate::models::RawTitle;
use anyhow::Context;
use async_trait::async_trait;
use chrono::Datelike;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

pub const MOVIES_DB_BASE: &str = "https://moviesdatabase.p.rapidapi.com";
const MOVIES_DB_HOST: &str = "moviesdatabase.p.rapidapi.com";
const SORT_ORDER: &str = "year.decr";
pub const PAGE_SIZE: usize = 12;

/// One upstream listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleQuery {
    pub year: i32,
    pub page: u32,
    pub genre: Option<String>,
}

impl TitleQuery {
    /// Unset (or zero) year means the current calendar year; "All" drops the genre qualifier.
    pub fn new(page: u32, year: Option<i32>, genre: Option<&str>) -> Self {
        Self::with_current_year(page, year, genre, chrono::Local::now().year())
    }

    pub fn with_current_year(
        page: u32,
        year: Option<i32>,
        genre: Option<&str>,
        current_year: i32,
    ) -> Self {
        let genre = genre
            .map(str::trim)
            .filter(|g| !g.is_empty() && *g != "All")
            .map(|g| g.to_string());
        Self {
            year: year.filter(|y| *y != 0).unwrap_or(current_year),
            page,
            genre,
        }
    }

    pub fn query_string(&self) -> String {
        let mut qs = format!(
            "year={}&sort={SORT_ORDER}&limit={PAGE_SIZE}&page={}",
            self.year, self.page
        );
        if let Some(genre) = &self.genre {
            qs.push_str("&genre=");
            qs.push_str(&urlencoding::encode(genre));
        }
        qs
    }
}

#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// Upstream answered with a non-success status.
    #[error("upstream responded with {status}")]
    Status { status: u16, message: Option<String> },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[async_trait]
pub trait TitlesApi: Send + Sync {
    async fn list_titles(
        &self,
        api_key: &str,
        query: &TitleQuery,
    ) -> Result<Vec<RawTitle>, UpstreamError>;
}

#[derive(Debug, Clone)]
pub struct MoviesDatabaseClient {
    client: Client,
    base_url: String,
}

impl MoviesDatabaseClient {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let user_agent = format!("cineseek/{}", env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .user_agent(user_agent)
            .build()
            .context("Failed to build movies API HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn titles_url(&self, query: &TitleQuery) -> String {
        format!("{}/titles?{}", self.base_url, query.query_string())
    }
}

#[async_trait]
impl TitlesApi for MoviesDatabaseClient {
    async fn list_titles(
        &self,
        api_key: &str,
        query: &TitleQuery,
    ) -> Result<Vec<RawTitle>, UpstreamError> {
        #[derive(Deserialize)]
        struct TitlesResponse {
            #[serde(default)]
            results: Option<Vec<RawTitle>>,
        }

        let url = self.titles_url(query);
        debug!("Requesting {}", url);
        let res = self
            .client
            .get(&url)
            .header("x-rapidapi-host", MOVIES_DB_HOST)
            .header("x-rapidapi-key", api_key)
            .send()
            .await
            .context("request failed")?;
        let status = res.status();
        let text = res.text().await.context("reading body failed")?;
        if !status.is_success() {
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                message: error_message(&text),
            });
        }
        let parsed: TitlesResponse =
            serde_json::from_str(&text).context("JSON parse failed")?;
        Ok(parsed.results.unwrap_or_default())
    }
}

/// Best-effort `message` field out of an upstream error body.
pub fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()?
        .get("message")?
        .as_str()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(|m| m.to_string())
}
