use crate::movies_db::MOVIES_DB_BASE;
use anyhow::{Context, Result};
use std::env;
use std::fmt;
use std::net::SocketAddr;
use tracing::{info, warn};

pub const DEFAULT_BIND: &str = "0.0.0.0:3000";

/// Process configuration, read once at startup and handed to the router.
#[derive(Clone)]
pub struct Config {
    pub movie_api_key: Option<String>,
    pub movies_api_base: String,
    pub bind_addr: SocketAddr,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let movie_api_key = env::var("MOVIE_API_KEY")
            .ok()
            .filter(|s| !s.trim().is_empty());
        if movie_api_key.is_some() {
            info!("MOVIE_API_KEY found");
        } else {
            warn!("MOVIE_API_KEY is not set, /api/fetch-movies will answer with a configuration error");
        }

        let movies_api_base = env::var("MOVIES_API_BASE")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| MOVIES_DB_BASE.to_string());

        let bind = env::var("CINESEEK_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string());
        let bind_addr = bind
            .parse()
            .with_context(|| format!("CINESEEK_BIND is not a socket address: {}", bind))?;

        Ok(Self {
            movie_api_key,
            movies_api_base,
            bind_addr,
        })
    }

    /// Configuration pointing at the public upstream with the given key.
    pub fn with_api_key(movie_api_key: Option<&str>) -> Self {
        Self {
            movie_api_key: movie_api_key.map(|k| k.to_string()),
            movies_api_base: MOVIES_DB_BASE.to_string(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field(
                "movie_api_key",
                &self.movie_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("movies_api_base", &self.movies_api_base)
            .field("bind_addr", &self.bind_addr)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_hides_the_key() {
        let config = Config::with_api_key(Some("super-secret"));
        let printed = format!("{:?}", config);
        assert!(!printed.contains("super-secret"));
        assert!(printed.contains("<redacted>"));
    }
}
