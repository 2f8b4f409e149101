//! Terminal front end for the movies listing, driving the same controller as the
//! web page against a running server.
//! Usage:
//!   cargo run --bin browse -- [server_url]
//! Commands: n (next), p (previous), g <genre>, y <year|none>, r (reload), q (quit).

use anyhow::Result;
use cineseek::listing::{ListingController, ListingState};
use cineseek::models::Genre;
use cineseek::proxy_client::ProxyClient;
use std::env;
use tokio::io::{AsyncBufReadExt, BufReader};

fn print_state(state: &ListingState) {
    let filters = state.filters;
    let year = filters
        .year
        .map(|y| y.to_string())
        .unwrap_or_else(|| "Latest".to_string());
    println!();
    println!("{} {} Movie List | Page {}", year, filters.genre, filters.page);
    if let Some(error) = &state.error {
        println!("Error: {}", error);
    }
    for movie in &state.movies {
        println!("  {:<50} {}", movie.title, movie.release_year);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let base = env::args()
        .nth(1)
        .unwrap_or_else(|| "http://127.0.0.1:3000".to_string());
    let controller = ListingController::new(ProxyClient::new(&base)?);
    print_state(&controller.refresh().await);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let mut parts = line.split_whitespace();
        let state = match (parts.next(), parts.next()) {
            (Some("q"), _) => break,
            (Some("n"), _) => controller.next().await,
            (Some("p"), _) => controller.previous().await,
            (Some("r"), _) => controller.refresh().await,
            (Some("g"), Some(name)) => match name.parse::<Genre>() {
                Ok(genre) => controller.select_genre(genre).await,
                Err(e) => {
                    println!("{}", e);
                    continue;
                }
            },
            (Some("y"), Some("none")) => controller.select_year(None).await,
            (Some("y"), Some(year)) => match year.parse::<i32>() {
                Ok(year) => controller.select_year(Some(year)).await,
                Err(_) => {
                    println!("year must be a number or 'none'");
                    continue;
                }
            },
            _ => {
                println!("commands: n, p, g <genre>, y <year|none>, r, q");
                continue;
            }
        };
        print_state(&state);
    }
    Ok(())
}
