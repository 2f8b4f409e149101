//! Fetch one page of titles from the movies API and print the raw query plus the
//! reshaped movie summaries the proxy would return.
//! Usage:
//!   cargo run --bin titles_props -- [page] [year] [genre]
//! Requires MOVIE_API_KEY in the environment (.env supported).

use anyhow::{Context, Result};
use cineseek::models::MovieSummary;
use cineseek::movies_db::{MoviesDatabaseClient, TitleQuery, TitlesApi, MOVIES_DB_BASE};
use dotenvy::dotenv;
use serde_json::json;
use std::env;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let api_key = env::var("MOVIE_API_KEY").context("MOVIE_API_KEY not set")?;
    let base = env::var("MOVIES_API_BASE").unwrap_or_else(|_| MOVIES_DB_BASE.to_string());

    let args: Vec<String> = env::args().skip(1).collect();
    let page = match args.first() {
        Some(p) => p.parse::<u32>().context("page must be a positive number")?,
        None => 1,
    };
    let year = match args.get(1) {
        Some(y) => Some(y.parse::<i32>().context("year must be a number")?),
        None => None,
    };
    let genre = args.get(2).map(String::as_str);

    let client = MoviesDatabaseClient::new(&base)?;
    let query = TitleQuery::new(page, year, genre);
    println!("GET {}", client.titles_url(&query));

    let titles = client
        .list_titles(&api_key, &query)
        .await
        .map_err(anyhow::Error::from)?;
    let movies: Vec<MovieSummary> = titles.into_iter().map(MovieSummary::from).collect();
    println!(
        "{}",
        serde_json::to_string_pretty(&json!({ "count": movies.len(), "movies": movies }))?
    );
    Ok(())
}
