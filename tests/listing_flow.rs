use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use cineseek::app::{build_router, AppState};
use cineseek::config::Config;
use cineseek::listing::{ListingController, NO_MORE_MOVIES, NO_MOVIES_FOUND};
use cineseek::models::{Genre, PLACEHOLDER_POSTER};
use cineseek::movies_db::MoviesDatabaseClient;
use cineseek::proxy_client::ProxyClient;
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

const LIVE_KEY: &str = "live-key";

type Seen = Arc<Mutex<Vec<(HashMap<String, String>, Option<String>)>>>;

/// Stand-in for the movies API: two titles on pages 1 and 2, nothing after, no Fantasy.
async fn fake_titles(
    State(seen): State<Seen>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let host = headers
        .get("x-rapidapi-host")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());
    seen.lock().unwrap().push((params.clone(), host));

    if headers.get("x-rapidapi-key").and_then(|v| v.to_str().ok()) != Some(LIVE_KEY) {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({ "message": "You are not subscribed to this API." })),
        )
            .into_response();
    }
    if params.get("year").map(String::as_str) == Some("2017") {
        return (StatusCode::INTERNAL_SERVER_ERROR, "<html>upstream exploded</html>")
            .into_response();
    }

    let page: u32 = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    let has_titles = params.get("genre").map(String::as_str) != Some("Fantasy");
    let results = if has_titles && page <= 2 {
        vec![
            json!({
                "id": format!("tt{page}01"),
                "primaryImage": { "url": format!("https://img/{page}01.jpg") },
                "titleText": { "text": format!("Page {page} First") },
                "releaseYear": { "year": 2024 }
            }),
            json!({
                "id": format!("tt{page}02"),
                "primaryImage": null,
                "titleText": { "text": format!("Page {page} Second") },
                "releaseYear": { "year": 2024 }
            }),
        ]
    } else {
        Vec::new()
    };
    Json(json!({ "page": page, "next": null, "entries": results.len(), "results": results }))
        .into_response()
}

async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn start_stack(key: &str) -> (ProxyClient, Seen) {
    let seen: Seen = Arc::new(Mutex::new(Vec::new()));
    let upstream = spawn(
        Router::new()
            .route("/titles", get(fake_titles))
            .with_state(seen.clone()),
    )
    .await;

    let mut config = Config::with_api_key(Some(key));
    config.movies_api_base = upstream.clone();
    let titles = Arc::new(MoviesDatabaseClient::new(&upstream).unwrap());
    let proxy = spawn(build_router(AppState::new(config, titles))).await;

    (ProxyClient::new(&proxy).unwrap(), seen)
}

fn seen_pages(seen: &Seen) -> Vec<String> {
    seen.lock()
        .unwrap()
        .iter()
        .map(|(params, _)| params.get("page").cloned().unwrap_or_default())
        .collect()
}

#[tokio::test]
async fn browsing_past_last_page_rolls_back() {
    let (client, seen) = start_stack(LIVE_KEY).await;
    let controller = ListingController::new(client);

    let state = controller.refresh().await;
    assert_eq!(state.movies.len(), 2);
    assert_eq!(state.movies[0].title, "Page 1 First");
    assert_eq!(state.movies[0].poster_image_url, "https://img/101.jpg");
    assert_eq!(state.movies[1].poster_image_url, PLACEHOLDER_POSTER);
    assert_eq!(state.movies[1].release_year, "2024");

    let state = controller.next().await;
    assert_eq!(state.filters.page, 2);
    assert_eq!(state.error, None);

    let state = controller.next().await;
    assert_eq!(state.filters.page, 2);
    assert_eq!(state.error.as_deref(), Some(NO_MORE_MOVIES));
    assert_eq!(state.movies[0].title, "Page 2 First");
    assert!(!state.loading);

    assert_eq!(seen_pages(&seen), vec!["1", "2", "3", "2"]);
}

#[tokio::test]
async fn upstream_query_carries_filters_and_host() {
    let (client, seen) = start_stack(LIVE_KEY).await;
    let controller = ListingController::new(client);
    controller.refresh().await;
    controller.next().await;
    let state = controller.select_genre(Genre::Drama).await;
    assert_eq!(state.filters.page, 1);

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 3);
    let (params, host) = &seen[2];
    assert_eq!(params.get("genre").map(String::as_str), Some("Drama"));
    assert_eq!(params.get("page").map(String::as_str), Some("1"));
    assert_eq!(params.get("limit").map(String::as_str), Some("12"));
    assert_eq!(params.get("sort").map(String::as_str), Some("year.decr"));
    assert_eq!(host.as_deref(), Some("moviesdatabase.p.rapidapi.com"));
    assert!(!seen[0].0.contains_key("genre"));
}

#[tokio::test]
async fn upstream_rejection_surfaces_its_message() {
    let (client, _seen) = start_stack("wrong-key").await;
    let controller = ListingController::new(client);
    let state = controller.refresh().await;
    assert!(state.movies.is_empty());
    assert_eq!(
        state.error.as_deref(),
        Some("You are not subscribed to this API.")
    );
}

#[tokio::test]
async fn unparseable_upstream_error_gets_generic_message() {
    let (client, _seen) = start_stack(LIVE_KEY).await;
    let controller = ListingController::new(client);
    controller.refresh().await;
    let state = controller.select_year(Some(2017)).await;
    assert!(state.movies.is_empty());
    assert_eq!(
        state.error.as_deref(),
        Some("Failed to fetch movies from external API.")
    );
}

#[tokio::test]
async fn empty_first_page_reports_no_movies() {
    let (client, seen) = start_stack(LIVE_KEY).await;
    let controller = ListingController::new(client);
    controller.refresh().await;
    controller.next().await;

    let state = controller.select_genre(Genre::Fantasy).await;
    assert_eq!(state.filters.page, 1);
    assert!(state.movies.is_empty());
    assert_eq!(state.error.as_deref(), Some(NO_MOVIES_FOUND));
    assert_eq!(seen_pages(&seen), vec!["1", "2", "1"]);
}
