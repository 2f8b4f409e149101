use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Poster shown when the upstream record has no usable image.
pub const PLACEHOLDER_POSTER: &str = "/placeholder.png";

/// Years offered by the listing page's year picker, newest first.
pub const YEAR_CHOICES: [i32; 8] = [2024, 2023, 2022, 2021, 2020, 2019, 2018, 2017];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Genre {
    #[default]
    All,
    Animation,
    Comedy,
    Fantasy,
    Action,
    Drama,
}

impl Genre {
    pub const CHOICES: [Genre; 6] = [
        Genre::All,
        Genre::Animation,
        Genre::Comedy,
        Genre::Fantasy,
        Genre::Action,
        Genre::Drama,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Genre::All => "All",
            Genre::Animation => "Animation",
            Genre::Comedy => "Comedy",
            Genre::Fantasy => "Fantasy",
            Genre::Action => "Action",
            Genre::Drama => "Drama",
        }
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Genre {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        Genre::CHOICES
            .into_iter()
            .find(|g| g.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| anyhow!("unknown genre '{}'", s))
    }
}

/// The filter tuple driving a listing query. Also the proxy request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Filters {
    pub page: u32,
    pub year: Option<i32>,
    pub genre: Genre,
}

impl Default for Filters {
    fn default() -> Self {
        Self {
            page: 1,
            year: None,
            genre: Genre::All,
        }
    }
}

/// `0` is how the year picker says "no year".
pub fn normalize_year(year: Option<i32>) -> Option<i32> {
    year.filter(|y| *y != 0)
}

/// Flat movie shape handed to the browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    pub poster_image_url: String,
    pub release_year: String,
}

/// Title record as returned by the upstream listing API.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTitle {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub primary_image: Option<PrimaryImage>,
    #[serde(default)]
    pub title_text: Option<TitleText>,
    #[serde(default)]
    pub release_year: Option<ReleaseYear>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PrimaryImage {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TitleText {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReleaseYear {
    #[serde(default)]
    pub year: Option<Value>,
}

impl From<RawTitle> for MovieSummary {
    fn from(raw: RawTitle) -> Self {
        let poster_image_url = raw
            .primary_image
            .and_then(|i| i.url)
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| PLACEHOLDER_POSTER.to_string());
        let title = raw.title_text.and_then(|t| t.text).unwrap_or_default();
        let release_year = raw
            .release_year
            .and_then(|r| r.year)
            .map(|y| match y {
                Value::String(s) => s,
                Value::Null => String::new(),
                other => other.to_string(),
            })
            .unwrap_or_default();

        MovieSummary {
            id: raw.id,
            title,
            poster_image_url,
            release_year,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reshapes_nested_title_record() {
        let raw: RawTitle = serde_json::from_value(json!({
            "id": "tt0111161",
            "primaryImage": { "url": "https://m.media-amazon.com/poster.jpg", "width": 1000 },
            "titleText": { "text": "The Shawshank Redemption" },
            "releaseYear": { "year": 1994, "endYear": null }
        }))
        .expect("raw title");
        let movie = MovieSummary::from(raw);
        assert_eq!(movie.id.as_deref(), Some("tt0111161"));
        assert_eq!(movie.title, "The Shawshank Redemption");
        assert_eq!(movie.poster_image_url, "https://m.media-amazon.com/poster.jpg");
        assert_eq!(movie.release_year, "1994");
    }

    #[test]
    fn missing_image_falls_back_to_placeholder() {
        let raw: RawTitle = serde_json::from_value(json!({
            "id": "tt1",
            "primaryImage": null,
            "titleText": { "text": "No Poster" },
            "releaseYear": null
        }))
        .expect("raw title");
        let movie = MovieSummary::from(raw);
        assert_eq!(movie.poster_image_url, PLACEHOLDER_POSTER);
        assert_eq!(movie.release_year, "");
    }

    #[test]
    fn summary_serializes_camel_case() {
        let movie = MovieSummary {
            id: None,
            title: "Dune".to_string(),
            poster_image_url: PLACEHOLDER_POSTER.to_string(),
            release_year: "2021".to_string(),
        };
        let value = serde_json::to_value(&movie).expect("serialize");
        assert_eq!(
            value,
            json!({ "title": "Dune", "posterImageUrl": "/placeholder.png", "releaseYear": "2021" })
        );
    }

    #[test]
    fn parses_genre_case_insensitively() {
        assert_eq!("comedy".parse::<Genre>().unwrap(), Genre::Comedy);
        assert_eq!(" All ".parse::<Genre>().unwrap(), Genre::All);
        assert!("Horror".parse::<Genre>().is_err());
    }

    #[test]
    fn filters_serialize_as_proxy_body() {
        let filters = Filters {
            page: 2,
            year: None,
            genre: Genre::Drama,
        };
        assert_eq!(
            serde_json::to_value(filters).unwrap(),
            json!({ "page": 2, "year": null, "genre": "Drama" })
        );
    }
}
