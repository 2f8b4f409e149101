//! View state behind the movies page: the page/year/genre filters, the fetched
//! list, and the loading/error flags.
//!
//! Every change to the filters issues exactly one fetch. Each fetch is tagged
//! with a generation number and its outcome is applied only if no newer fetch
//! has started since, so overlapping requests cannot clobber fresher state.
//! A fetch that is dropped before its outcome lands releases `loading` again.

use crate::models::{normalize_year, Filters, Genre, MovieSummary};
use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

pub const NO_MORE_MOVIES: &str = "No more movies found for the current filter/page.";
pub const NO_MOVIES_FOUND: &str = "No movies found for the selected filters.";
pub const FETCH_FAILED: &str = "Something went wrong during data fetching.";

/// Automatic page rollbacks allowed per user-triggered change.
const MAX_ROLLBACKS: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", .message.as_deref().unwrap_or(FETCH_FAILED))]
pub struct FetchError {
    pub message: Option<String>,
}

impl FetchError {
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            message: Some(message).filter(|m| !m.trim().is_empty()),
        }
    }

    pub fn display_message(&self) -> &str {
        self.message.as_deref().unwrap_or(FETCH_FAILED)
    }
}

/// Where the controller gets its movies from.
#[async_trait]
pub trait MovieSource: Send + Sync {
    async fn fetch_movies(&self, filters: &Filters) -> Result<Vec<MovieSummary>, FetchError>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingState {
    pub filters: Filters,
    pub movies: Vec<MovieSummary>,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub generation: u64,
    pub filters: Filters,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The outcome settled the state.
    Done,
    /// The page was rolled back; the ticket for the rolled-back page is
    /// already issued.
    Refetch(Ticket),
    /// A newer fetch was issued; the outcome was dropped.
    Stale,
}

/// Pure state machine; [`ListingController`] drives it against a [`MovieSource`].
#[derive(Debug, Clone, Default)]
pub struct Listing {
    view: ListingState,
    generation: u64,
    rollbacks: u32,
    keep_notice: bool,
}

impl Listing {
    pub fn new(filters: Filters) -> Self {
        Self {
            view: ListingState {
                filters,
                ..ListingState::default()
            },
            ..Self::default()
        }
    }

    pub fn view(&self) -> &ListingState {
        &self.view
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Starts a fetch for the current filters.
    pub fn begin(&mut self) -> Ticket {
        self.generation += 1;
        self.view.loading = true;
        if !self.keep_notice {
            self.view.error = None;
        }
        self.keep_notice = false;
        Ticket {
            generation: self.generation,
            filters: self.view.filters,
        }
    }

    pub fn apply(
        &mut self,
        ticket: &Ticket,
        outcome: Result<Vec<MovieSummary>, FetchError>,
    ) -> Step {
        if ticket.generation != self.generation {
            return Step::Stale;
        }

        let step = match outcome {
            Err(err) => {
                self.view.error = Some(err.display_message().to_string());
                self.view.movies.clear();
                Step::Done
            }
            Ok(movies) if !movies.is_empty() => {
                self.view.movies = movies;
                Step::Done
            }
            Ok(_) if self.view.filters.page > 1 => {
                self.view.error = Some(NO_MORE_MOVIES.to_string());
                if self.rollbacks < MAX_ROLLBACKS {
                    self.rollbacks += 1;
                    self.view.filters.page -= 1;
                    self.keep_notice = true;
                    Step::Refetch(self.begin())
                } else {
                    self.view.movies.clear();
                    Step::Done
                }
            }
            Ok(_) => {
                self.view.movies.clear();
                self.view.error = Some(NO_MOVIES_FOUND.to_string());
                Step::Done
            }
        };

        if step == Step::Done {
            self.view.loading = false;
        }
        step
    }

    /// Gives up on a fetch whose outcome will never arrive.
    pub fn abandon(&mut self, ticket: &Ticket) {
        if ticket.generation == self.generation {
            self.view.loading = false;
            self.keep_notice = false;
        }
    }

    pub fn previous(&mut self) -> bool {
        if self.view.loading || self.view.filters.page <= 1 {
            return false;
        }
        self.view.filters.page -= 1;
        self.user_change();
        true
    }

    pub fn next(&mut self) -> bool {
        if self.view.loading {
            return false;
        }
        self.view.filters.page = self.view.filters.page.saturating_add(1);
        self.user_change();
        true
    }

    pub fn select_genre(&mut self, genre: Genre) -> bool {
        let filters = &mut self.view.filters;
        if filters.genre == genre && filters.page == 1 {
            return false;
        }
        filters.genre = genre;
        filters.page = 1;
        self.user_change();
        true
    }

    pub fn select_year(&mut self, year: Option<i32>) -> bool {
        let year = normalize_year(year);
        let filters = &mut self.view.filters;
        if filters.year == year && filters.page == 1 {
            return false;
        }
        filters.year = year;
        filters.page = 1;
        self.user_change();
        true
    }

    fn user_change(&mut self) {
        self.rollbacks = 0;
        self.keep_notice = false;
    }
}

pub struct ListingController<S> {
    source: S,
    state: Mutex<Listing>,
}

fn lock(state: &Mutex<Listing>) -> MutexGuard<'_, Listing> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Holds a ticket while its fetch is awaited; abandons it if dropped unsettled.
struct InFlight<'a> {
    state: &'a Mutex<Listing>,
    ticket: Ticket,
    settled: bool,
}

impl<'a> InFlight<'a> {
    fn new(state: &'a Mutex<Listing>, ticket: Ticket) -> Self {
        Self {
            state,
            ticket,
            settled: false,
        }
    }

    fn settle(mut self, outcome: Result<Vec<MovieSummary>, FetchError>) -> Step {
        self.settled = true;
        lock(self.state).apply(&self.ticket, outcome)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            debug!("Fetch (generation {}) dropped before it settled", self.ticket.generation);
            lock(self.state).abandon(&self.ticket);
        }
    }
}

impl<S: MovieSource> ListingController<S> {
    pub fn new(source: S) -> Self {
        Self::with_filters(source, Filters::default())
    }

    pub fn with_filters(source: S, filters: Filters) -> Self {
        Self {
            source,
            state: Mutex::new(Listing::new(filters)),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub async fn snapshot(&self) -> ListingState {
        lock(&self.state).view().clone()
    }

    /// Fetches the current filters, following at most the allowed rollbacks.
    pub async fn refresh(&self) -> ListingState {
        let mut ticket = lock(&self.state).begin();
        loop {
            debug!(
                "Fetching movies (generation {}): page {}, year {:?}, genre {}",
                ticket.generation, ticket.filters.page, ticket.filters.year, ticket.filters.genre
            );
            let in_flight = InFlight::new(&self.state, ticket);
            let outcome = self.source.fetch_movies(&ticket.filters).await;
            if let Err(err) = &outcome {
                warn!("Fetching movies failed: {}", err);
            }
            match in_flight.settle(outcome) {
                Step::Refetch(rollback) => {
                    debug!(
                        "Page {} was empty, rolling back to page {}",
                        ticket.filters.page, rollback.filters.page
                    );
                    ticket = rollback;
                }
                Step::Stale => {
                    debug!("Dropping stale response (generation {})", ticket.generation);
                    break;
                }
                Step::Done => break,
            }
        }
        self.snapshot().await
    }

    pub async fn previous(&self) -> ListingState {
        let changed = lock(&self.state).previous();
        self.refresh_if(changed).await
    }

    pub async fn next(&self) -> ListingState {
        let changed = lock(&self.state).next();
        self.refresh_if(changed).await
    }

    pub async fn select_genre(&self, genre: Genre) -> ListingState {
        let changed = lock(&self.state).select_genre(genre);
        self.refresh_if(changed).await
    }

    pub async fn select_year(&self, year: Option<i32>) -> ListingState {
        let changed = lock(&self.state).select_year(year);
        self.refresh_if(changed).await
    }

    async fn refresh_if(&self, changed: bool) -> ListingState {
        if changed {
            self.refresh().await
        } else {
            self.snapshot().await
        }
    }
}
