use crate::config::Config;
use crate::error::ProxyError;
use crate::models::MovieSummary;
use crate::movies_db::{MoviesDatabaseClient, TitleQuery, TitlesApi, UpstreamError, PAGE_SIZE};
use crate::pages;
use anyhow::Result;
use axum::{
    body::{to_bytes, Body},
    extract::State,
    http::{header, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

const MAX_BODY_BYTES: usize = 16 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub titles: Arc<dyn TitlesApi>,
}

impl AppState {
    pub fn new(config: Config, titles: Arc<dyn TitlesApi>) -> Self {
        Self {
            config: Arc::new(config),
            titles,
        }
    }
}

/// Body accepted by `POST /api/fetch-movies`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FetchMoviesRequest {
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub year: Option<i64>,
    #[serde(default)]
    pub genre: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MoviesResponse {
    pub movies: Vec<MovieSummary>,
}

pub async fn run_server(config: Config) -> Result<()> {
    let titles: Arc<dyn TitlesApi> = Arc::new(MoviesDatabaseClient::new(&config.movies_api_base)?);
    info!("Using movies API at {}", config.movies_api_base);
    let addr = config.bind_addr;
    let app = build_router(AppState::new(config, titles));

    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(pages::landing))
        .route("/movies", get(pages::movies))
        .route(
            "/api/fetch-movies",
            post(fetch_movies).fallback(method_not_allowed),
        )
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

async fn method_not_allowed(method: Method) -> impl IntoResponse {
    warn!("Rejecting {} on /api/fetch-movies", method);
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, "POST")],
        format!("Method {} Not Allowed", method),
    )
}

async fn fetch_movies(
    State(state): State<AppState>,
    body: Body,
) -> Result<Json<MoviesResponse>, ProxyError> {
    let api_key = state
        .config
        .movie_api_key
        .as_deref()
        .ok_or(ProxyError::MissingCredential)?;

    // Read at most one byte past the cap so oversized bodies are never buffered whole
    let body = to_bytes(body, MAX_BODY_BYTES + 1).await.map_err(|e| {
        warn!("Rejecting request: failed to read body: {}", e);
        ProxyError::PayloadTooLarge(MAX_BODY_BYTES)
    })?;
    if body.len() > MAX_BODY_BYTES {
        warn!(
            "Rejecting request: body too large ({} bytes > {} bytes)",
            body.len(),
            MAX_BODY_BYTES
        );
        return Err(ProxyError::PayloadTooLarge(MAX_BODY_BYTES));
    }

    let request: FetchMoviesRequest = serde_json::from_slice(&body).map_err(|e| {
        warn!("Rejecting request: invalid JSON body: {}", e);
        ProxyError::BadRequest("Request body must be JSON with a numeric page.".to_string())
    })?;

    let movies = load_movies(state.titles.as_ref(), api_key, &request).await?;
    Ok(Json(MoviesResponse { movies }))
}

/// Runs one upstream listing request and reshapes its results.
pub async fn load_movies(
    titles: &dyn TitlesApi,
    api_key: &str,
    request: &FetchMoviesRequest,
) -> Result<Vec<MovieSummary>, ProxyError> {
    let query = title_query(request)?;
    match titles.list_titles(api_key, &query).await {
        Ok(results) => Ok(results
            .into_iter()
            .take(PAGE_SIZE)
            .map(MovieSummary::from)
            .collect()),
        Err(UpstreamError::Status { status, message }) => {
            warn!(
                "Movies API error {} for page {}: {}",
                status,
                query.page,
                message.as_deref().unwrap_or("<no message>")
            );
            Err(ProxyError::upstream(status, message))
        }
        Err(UpstreamError::Other(err)) => {
            error!("Fetching movies failed: {:?}", err);
            Err(ProxyError::Internal(err))
        }
    }
}

fn title_query(request: &FetchMoviesRequest) -> Result<TitleQuery, ProxyError> {
    let page = match request.page {
        None => 1,
        Some(p) if p >= 1 => u32::try_from(p)
            .map_err(|_| ProxyError::BadRequest(format!("page {} is out of range", p)))?,
        Some(p) => {
            return Err(ProxyError::BadRequest(format!(
                "page must be a positive integer, got {}",
                p
            )))
        }
    };
    let year = match request.year {
        None => None,
        Some(y) => Some(
            i32::try_from(y)
                .map_err(|_| ProxyError::BadRequest(format!("year {} is out of range", y)))?,
        ),
    };
    Ok(TitleQuery::new(page, year, request.genre.as_deref()))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        term.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Shutdown signal received (Ctrl+C)");
        }
        _ = terminate => {
            info!("Shutdown signal received (SIGTERM)");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_page_defaults_to_first() {
        let query = title_query(&FetchMoviesRequest::default()).unwrap();
        assert_eq!(query.page, 1);
    }

    #[test]
    fn rejects_non_positive_page() {
        let request = FetchMoviesRequest {
            page: Some(0),
            ..FetchMoviesRequest::default()
        };
        let err = title_query(&request).unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn keeps_explicit_year_and_genre() {
        let request = FetchMoviesRequest {
            page: Some(4),
            year: Some(2018),
            genre: Some("Action".to_string()),
        };
        let query = title_query(&request).unwrap();
        assert_eq!(query.year, 2018);
        assert_eq!(query.page, 4);
        assert_eq!(query.genre.as_deref(), Some("Action"));
    }
}
