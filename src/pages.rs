//! Server-rendered pages: the layout shell, the landing page and the movies
//! listing. The listing runs the same [`ListingController`] a browser client
//! would, against an in-process source that shares the proxy's upstream path.

use crate::app::{load_movies, AppState, FetchMoviesRequest};
use crate::error::ProxyError;
use crate::listing::{FetchError, ListingController, ListingState, MovieSource};
use crate::models::{normalize_year, Filters, Genre, MovieSummary, YEAR_CHOICES};
use async_trait::async_trait;
use axum::{
    extract::{Query, State},
    response::Html,
};
use serde::Deserialize;

const ACCENT: &str = "#E2D609";
const HERO_BACKGROUND: &str = "https://themebeyond.com/html/movflx/img/bg/breadcrumb_bg.jpg";

/// Movie source that skips the HTTP hop and calls the upstream directly.
pub struct LocalSource {
    state: AppState,
}

impl LocalSource {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl MovieSource for LocalSource {
    async fn fetch_movies(&self, filters: &Filters) -> Result<Vec<MovieSummary>, FetchError> {
        let api_key = self
            .state
            .config
            .movie_api_key
            .as_deref()
            .ok_or_else(|| FetchError::new(ProxyError::MissingCredential.to_string()))?;
        let request = FetchMoviesRequest {
            page: Some(filters.page.into()),
            year: filters.year.map(i64::from),
            genre: Some(filters.genre.as_str().to_string()),
        };
        load_movies(self.state.titles.as_ref(), api_key, &request)
            .await
            .map_err(|e| FetchError::new(e.to_string()))
    }
}

/// Query string of `GET /movies`. Fields stay strings so an empty `year=` is not a 400.
#[derive(Debug, Default, Deserialize)]
pub struct MoviesQuery {
    pub page: Option<String>,
    pub year: Option<String>,
    pub genre: Option<String>,
}

impl MoviesQuery {
    pub fn filters(&self) -> Filters {
        let page = self
            .page
            .as_deref()
            .and_then(|p| p.trim().parse::<u32>().ok())
            .filter(|p| *p >= 1)
            .unwrap_or(1);
        let year = normalize_year(
            self.year
                .as_deref()
                .and_then(|y| y.trim().parse::<i32>().ok()),
        );
        let genre = self
            .genre
            .as_deref()
            .and_then(|g| g.parse::<Genre>().ok())
            .unwrap_or_default();
        Filters { page, year, genre }
    }
}

pub async fn landing() -> Html<String> {
    let body = format!(
        r#"<section class="hero" style="background-image: url('{HERO_BACKGROUND}')">
  <div class="hero-overlay">
    <h1>Discover Your Next Favorite <span class="accent">Movie</span></h1>
    <p>Explore the latest blockbuster movies, critically acclaimed films, and your personal favorites, all in one place.</p>
    {browse}
  </div>
</section>
<section class="join">
  <h2>Join CineSeek Now!</h2>
  <p>Sign up today to get access to the latest movies, exclusive content, and personalized movie recommendations.</p>
  {start}
</section>"#,
        browse = button("Browse Movies", Some("/movies"), false, ""),
        start = button("Get Started", None, true, ""),
    );
    Html(layout("CineSeek", &body))
}

pub async fn movies(State(state): State<AppState>, Query(query): Query<MoviesQuery>) -> Html<String> {
    let controller = ListingController::with_filters(LocalSource::new(state), query.filters());
    let view = controller.refresh().await;
    Html(layout("Movies | CineSeek", &render_listing(&view)))
}

pub fn render_listing(view: &ListingState) -> String {
    let filters = view.filters;
    let mut out = String::new();

    out.push_str(r#"<div class="listing"><div class="toolbar">"#);
    out.push_str(
        r#"<input type="text" placeholder="Search for a movie... (Functionality coming soon)" disabled>"#,
    );
    out.push_str(&year_select(&filters));
    out.push_str("</div>");

    out.push_str(&format!(
        r#"<p class="accent page-label">Online streaming | Page {}</p>"#,
        filters.page
    ));
    let year_label = filters
        .year
        .map(|y| y.to_string())
        .unwrap_or_else(|| "Latest".to_string());
    out.push_str(&format!(
        r#"<div class="heading"><h1>{} {} Movie List</h1><div class="genres">"#,
        escape(&year_label),
        filters.genre
    ));
    for genre in Genre::CHOICES {
        let target = Filters {
            page: 1,
            genre,
            ..filters
        };
        let class = if genre == filters.genre { "active" } else { "" };
        out.push_str(&button(genre.as_str(), Some(movies_href(&target).as_str()), false, class));
    }
    out.push_str("</div></div>");

    if let Some(error) = &view.error {
        out.push_str(&format!(
            r#"<div class="error-banner"><p><strong>Error:</strong></p> {}</div>"#,
            escape(error)
        ));
    }

    out.push_str(r#"<div class="grid">"#);
    if !view.loading {
        for movie in &view.movies {
            out.push_str(&movie_card(movie));
        }
    }
    out.push_str("</div>");

    let previous = Filters {
        page: filters.page.saturating_sub(1).max(1),
        ..filters
    };
    let next = Filters {
        page: filters.page.saturating_add(1),
        ..filters
    };
    out.push_str(r#"<div class="pagination">"#);
    out.push_str(&button(
        "Previous",
        Some(movies_href(&previous).as_str()),
        filters.page == 1 || view.loading,
        "",
    ));
    out.push_str(&button(
        &format!("Next (Page {})", next.page),
        Some(movies_href(&next).as_str()),
        view.loading,
        "",
    ));
    out.push_str("</div></div>");

    if view.loading {
        out.push_str(&loading_overlay());
    }
    out
}

pub fn movies_href(filters: &Filters) -> String {
    let mut href = format!("/movies?page={}", filters.page);
    if let Some(year) = filters.year {
        href.push_str(&format!("&year={}", year));
    }
    href.push_str("&genre=");
    href.push_str(&urlencoding::encode(filters.genre.as_str()));
    href
}

fn year_select(filters: &Filters) -> String {
    let mut out = String::from(
        r#"<form method="get" action="/movies" class="year-form"><select name="year" onchange="this.form.submit()"><option value="">Select Year</option>"#,
    );
    for year in YEAR_CHOICES {
        let selected = if filters.year == Some(year) { " selected" } else { "" };
        out.push_str(&format!(r#"<option value="{year}"{selected}>{year}</option>"#));
    }
    out.push_str(&format!(
        r#"</select><input type="hidden" name="genre" value="{}"><noscript><button type="submit">Go</button></noscript></form>"#,
        filters.genre
    ));
    out
}

/// Pill button; rendered as a link when it has a target and is enabled.
pub fn button(title: &str, href: Option<&str>, disabled: bool, class: &str) -> String {
    let class = format!("btn {}", class).trim().to_string();
    match href {
        Some(href) if !disabled => format!(
            r#"<a class="{}" href="{}">{}</a>"#,
            class,
            escape(href),
            escape(title)
        ),
        _ => format!(
            r#"<button class="{}"{}>{}</button>"#,
            class,
            if disabled { " disabled" } else { "" },
            escape(title)
        ),
    }
}

pub fn movie_card(movie: &MovieSummary) -> String {
    format!(
        r#"<div class="card"><img src="{poster}" alt="{title}" width="400" height="600"><div class="card-meta"><p class="card-title">{title}</p><p class="accent">{year}</p></div></div>"#,
        poster = escape(&movie.poster_image_url),
        title = escape(&movie.title),
        year = escape(&movie.release_year),
    )
}

/// Shown over the grid while a fetch is in flight. `/movies` renders after the
/// fetch settles, so only callers rendering a mid-fetch snapshot see it.
pub fn loading_overlay() -> String {
    r#"<div class="loading"><div><h1>Loading...</h1><p>Please wait, we're getting next set of movies ready for you.</p></div></div>"#
        .to_string()
}

fn header() -> String {
    format!(
        r#"<header><h2 class="logo">Cine<span class="accent">Seek</span></h2><nav>{links}</nav><div>{sign_in}</div></header>"#,
        links = nav_links(&[("/", "Home"), ("/movies", "Movies"), ("/contact", "Contact")]),
        sign_in = button("Sign in", None, false, ""),
    )
}

fn footer() -> String {
    format!(
        r#"<footer><div class="footer-row"><h2 class="logo">Cine<span class="accent">Seek</span></h2><nav>{links}</nav><div class="social">{social}</div></div><p class="copyright">&copy; 2024 CineSeek. All rights reserved.</p></footer>"#,
        links = nav_links(&[
            ("/", "Home"),
            ("/movies", "Movies"),
            ("/contact", "Contact"),
            ("/privacy", "Privacy Policy"),
        ]),
        social = [
            ("https://twitter.com", "Twitter"),
            ("https://facebook.com", "Facebook"),
            ("https://instagram.com", "Instagram"),
        ]
        .iter()
        .map(|(href, label)| {
            format!(r#"<a href="{href}" target="_blank" rel="noopener noreferrer">{label}</a>"#)
        })
        .collect::<String>(),
    )
}

fn nav_links(links: &[(&str, &str)]) -> String {
    links
        .iter()
        .map(|(href, label)| format!(r#"<a href="{href}">{label}</a>"#))
        .collect()
}

pub fn layout(title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{title}</title>
<style>
  body {{ margin: 0; font-family: system-ui, sans-serif; background: #110F17; color: #fff; display: flex; flex-direction: column; min-height: 100vh; }}
  main {{ flex-grow: 1; }}
  a {{ color: inherit; text-decoration: none; }}
  .accent {{ color: {ACCENT}; }}
  header, footer {{ background: #171D22; padding: 24px 10%; }}
  header {{ display: flex; align-items: center; justify-content: space-between; }}
  nav a {{ padding: 0 16px; font-weight: 600; }}
  nav a:hover, .social a:hover {{ color: {ACCENT}; }}
  .footer-row {{ display: flex; justify-content: space-between; align-items: center; }}
  .social a {{ margin-left: 12px; }}
  .copyright {{ text-align: center; color: #9ca3af; font-size: 14px; margin-top: 32px; }}
  .btn {{ display: inline-block; padding: 8px 32px; border: 2px solid {ACCENT}; border-radius: 9999px; background: transparent; color: #fff; font: inherit; cursor: pointer; margin: 4px; }}
  .btn:hover, .btn.active {{ background: {ACCENT}; color: #000; }}
  .btn:disabled {{ opacity: 0.4; cursor: not-allowed; }}
  .hero {{ height: 100vh; background-size: cover; background-position: center; }}
  .hero-overlay {{ background: rgba(0,0,0,0.5); height: 100%; display: flex; flex-direction: column; justify-content: center; align-items: center; text-align: center; }}
  .join {{ padding: 64px 10%; background: #121018; text-align: center; }}
  .listing {{ padding: 64px 10%; }}
  .toolbar, .heading {{ display: flex; justify-content: space-between; align-items: center; flex-wrap: wrap; }}
  .toolbar input, .toolbar select {{ border: 2px solid {ACCENT}; background: transparent; color: #fff; padding: 8px 16px; border-radius: 9999px; }}
  .toolbar select option {{ background: #110F17; }}
  .page-label {{ font-size: 20px; margin: 24px 0; }}
  .error-banner {{ margin-top: 32px; padding: 16px; text-align: center; background: #991b1b; border-radius: 8px; }}
  .grid {{ display: grid; grid-template-columns: repeat(auto-fill, minmax(180px, 1fr)); gap: 16px; margin-top: 40px; }}
  .card img {{ width: 100%; height: 430px; object-fit: cover; border-radius: 6px; }}
  .card-meta {{ display: flex; justify-content: space-between; padding: 16px 0; font-size: 20px; }}
  .card-title {{ font-weight: 700; overflow: hidden; text-overflow: ellipsis; white-space: nowrap; }}
  .pagination {{ display: flex; justify-content: flex-end; margin-top: 24px; }}
  .loading {{ position: fixed; inset: 0; background: rgba(0,0,0,0.5); display: flex; justify-content: center; align-items: center; }}
</style>
</head>
<body>
{header}
<main>{content}</main>
{footer}
</body>
</html>"#,
        title = escape(title),
        header = header(),
        footer = footer(),
    )
}

pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
