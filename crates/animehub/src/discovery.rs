//! Discovery feed: the paginated, filterable, searchable anime list.
//!
//! [`FeedState`] is a synchronous state machine. Every fetch it wants is
//! handed out as a [`PendingFetch`] carrying a ticket; results are fed back
//! through [`FeedState::complete`]. Starting a new query tuple (filter change,
//! search, reset) bumps the generation, so completions for an older tuple are
//! discarded instead of overwriting the visible list.
//!
//! [`DiscoveryView`] drives the state machine against an [`AnimeSource`].

use jikan_client::{AnimeSource, ApiError};
use shared::{Anime, FeedFilters, FeedQuery, Genre, Page};
use tracing::{debug, info, warn};

/// Request the state machine wants performed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchRequest {
    Feed(FeedQuery),
    Search { term: String, page: u32, limit: u32 },
}

/// Identifies which query tuple and page a fetch belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
    page: u32,
    append: bool,
}

impl FetchTicket {
    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn appends(&self) -> bool {
        self.append
    }
}

/// A fetch to perform, plus the ticket to complete it with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFetch {
    pub ticket: FetchTicket,
    pub request: FetchRequest,
}

/// What a completion did to the list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Page 1 of a new query tuple replaced the list
    Replaced,
    /// A further page was appended
    Appended,
    /// The result belonged to an older query tuple and was dropped
    Stale,
    /// The fetch failed; see [`FeedState::error`]
    Failed,
}

/// List state of the discovery feed
#[derive(Debug, Clone)]
pub struct FeedState {
    items: Vec<Anime>,
    page: u32,
    has_more: bool,
    loading: bool,
    filters: FeedFilters,
    search: Option<String>,
    generation: u64,
    limit: u32,
    error: Option<String>,
}

impl FeedState {
    /// Empty feed requesting `limit` items per page
    pub fn new(limit: u32) -> Self {
        Self {
            items: Vec::new(),
            page: 1,
            has_more: false,
            loading: false,
            filters: FeedFilters::default(),
            search: None,
            generation: 0,
            limit,
            error: None,
        }
    }

    pub fn items(&self) -> &[Anime] {
        &self.items
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Selected filters; ignored by requests while a search is active
    pub fn filters(&self) -> FeedFilters {
        self.filters
    }

    /// Active search term, if the list shows search results
    pub fn active_search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    /// Message of the last failed fetch for the current tuple
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn request_for(&self, page: u32) -> FetchRequest {
        match &self.search {
            Some(term) => FetchRequest::Search {
                term: term.clone(),
                page,
                limit: self.limit,
            },
            None => FetchRequest::Feed(FeedQuery::new(page, self.limit, self.filters)),
        }
    }

    /// Start page 1 of the current tuple under a fresh generation
    fn restart(&mut self) -> PendingFetch {
        self.generation += 1;
        self.page = 1;
        self.loading = true;
        self.error = None;
        debug!(generation = self.generation, search = ?self.search, "Starting new query tuple");

        PendingFetch {
            ticket: FetchTicket {
                generation: self.generation,
                page: 1,
                append: false,
            },
            request: self.request_for(1),
        }
    }

    /// New filter selection; leaves search mode
    pub fn change_filters(&mut self, filters: FeedFilters) -> PendingFetch {
        self.filters = filters;
        self.search = None;
        self.restart()
    }

    /// Switch to search results for `term`; blank terms are ignored
    pub fn submit_search(&mut self, term: &str) -> Option<PendingFetch> {
        let term = term.trim();
        if term.is_empty() {
            return None;
        }
        self.search = Some(term.to_string());
        Some(self.restart())
    }

    /// Start from `filters`, or from search results when `search` is non-blank
    pub fn start(&mut self, filters: FeedFilters, search: Option<&str>) -> PendingFetch {
        self.filters = filters;
        self.search = search
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(str::to_string);
        self.restart()
    }

    /// Clear search and filters back to the default feed
    pub fn reset(&mut self) -> PendingFetch {
        self.filters = FeedFilters::default();
        self.search = None;
        self.restart()
    }

    /// The last rendered item became visible
    ///
    /// Yields the next page only when nothing is loading and more pages exist.
    pub fn last_item_visible(&mut self) -> Option<PendingFetch> {
        if self.loading || !self.has_more {
            return None;
        }
        self.page += 1;
        self.loading = true;
        Some(PendingFetch {
            ticket: FetchTicket {
                generation: self.generation,
                page: self.page,
                append: true,
            },
            request: self.request_for(self.page),
        })
    }

    /// Apply the result of a fetch started by this state
    pub fn complete(&mut self, ticket: FetchTicket, result: Result<Page<Anime>, ApiError>) -> Completion {
        if ticket.generation != self.generation {
            debug!(
                ticket_generation = ticket.generation,
                generation = self.generation,
                page = ticket.page,
                "Dropping stale feed response"
            );
            return Completion::Stale;
        }
        self.loading = false;

        match result {
            Ok(page) => {
                self.has_more = page.has_next;
                self.error = None;
                if ticket.append {
                    self.items.extend(page.items);
                    Completion::Appended
                } else {
                    self.items = page.items;
                    Completion::Replaced
                }
            }
            Err(e) => {
                warn!(page = ticket.page, error = %e, "Feed fetch failed");
                self.error = Some(e.to_string());
                if ticket.append {
                    // Let the next trigger retry the same page
                    self.page = ticket.page.saturating_sub(1).max(1);
                } else {
                    self.items.clear();
                    self.has_more = false;
                }
                Completion::Failed
            }
        }
    }
}

/// Discovery screen: genre list plus the feed, backed by an [`AnimeSource`]
pub struct DiscoveryView<S> {
    source: S,
    state: FeedState,
    genres: Vec<Genre>,
    genre_error: Option<String>,
}

impl<S: AnimeSource> DiscoveryView<S> {
    pub fn new(source: S, page_size: u32) -> Self {
        Self {
            source,
            state: FeedState::new(page_size),
            genres: Vec::new(),
            genre_error: None,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn state(&self) -> &FeedState {
        &self.state
    }

    pub fn genres(&self) -> &[Genre] {
        &self.genres
    }

    pub fn genre_error(&self) -> Option<&str> {
        self.genre_error.as_deref()
    }

    async fn fetch(&self, request: &FetchRequest) -> Result<Page<Anime>, ApiError> {
        match request {
            FetchRequest::Feed(query) => self.source.fetch_feed(query).await,
            FetchRequest::Search { term, page, limit } => {
                self.source.search(term, *page, *limit).await
            }
        }
    }

    async fn run(&mut self, pending: PendingFetch) -> Completion {
        let result = self.fetch(&pending.request).await;
        self.state.complete(pending.ticket, result)
    }

    /// Fetch the genre list and page 1 of the default feed together
    pub async fn initial_load(&mut self) -> Completion {
        self.initial_load_with(FeedFilters::default(), None).await
    }

    /// Like [`initial_load`](Self::initial_load), starting from the given filters or search
    pub async fn initial_load_with(&mut self, filters: FeedFilters, search: Option<&str>) -> Completion {
        let pending = self.state.start(filters, search);
        let (genres, page) = tokio::join!(self.source.fetch_genres(), self.fetch(&pending.request));

        match genres {
            Ok(genres) => {
                info!(count = genres.len(), "Genres loaded");
                self.genres = genres;
                self.genre_error = None;
            }
            Err(e) => {
                warn!(error = %e, "Genre fetch failed");
                self.genre_error = Some(e.to_string());
            }
        }
        self.state.complete(pending.ticket, page)
    }

    /// Replace the list with page 1 under `filters`
    pub async fn apply_filters(&mut self, filters: FeedFilters) -> Completion {
        let pending = self.state.change_filters(filters);
        self.run(pending).await
    }

    /// Replace the list with page 1 of search results; `None` for blank terms
    pub async fn submit_search(&mut self, term: &str) -> Option<Completion> {
        let pending = self.state.submit_search(term)?;
        Some(self.run(pending).await)
    }

    /// Back to the default feed; the genre list is kept
    pub async fn reset(&mut self) -> Completion {
        let pending = self.state.reset();
        self.run(pending).await
    }

    /// Append the next page if the feed allows it
    pub async fn last_item_visible(&mut self) -> Option<Completion> {
        let pending = self.state.last_item_visible()?;
        Some(self.run(pending).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{anime, page_of, Call, FakeSource};
    use jikan_client::StatusCode;
    use shared::SortKey;

    fn filters(genre: Option<u32>, year: Option<i32>, sort: SortKey) -> FeedFilters {
        FeedFilters { genre, year, sort }
    }

    #[test]
    fn test_reset_requests_default_feed() {
        let mut state = FeedState::new(12);
        let pending = state.reset();

        assert!(state.is_loading());
        assert!(!pending.ticket.appends());
        assert_eq!(
            pending.request,
            FetchRequest::Feed(FeedQuery::new(1, 12, FeedFilters::default()))
        );
    }

    #[test]
    fn test_no_page_advance_when_exhausted() {
        let mut state = FeedState::new(12);
        let pending = state.reset();
        state.complete(pending.ticket, Ok(page_of(&[1, 2, 3], false)));

        assert!(!state.has_more());
        assert_eq!(state.last_item_visible(), None);
        assert_eq!(state.page(), 1);
        assert_eq!(state.items().len(), 3);
    }

    #[test]
    fn test_no_page_advance_while_loading() {
        let mut state = FeedState::new(12);
        let first = state.reset();
        state.complete(first.ticket, Ok(page_of(&[1], true)));

        let second = state.last_item_visible().unwrap();
        assert_eq!(second.ticket.page(), 2);
        assert_eq!(state.last_item_visible(), None);
        assert_eq!(state.page(), 2);
    }

    #[test]
    fn test_next_page_appends() {
        let mut state = FeedState::new(2);
        let first = state.change_filters(filters(Some(1), Some(2023), SortKey::Popularity));
        state.complete(first.ticket, Ok(page_of(&[1, 2], true)));

        let next = state.last_item_visible().unwrap();
        assert_eq!(
            next.request,
            FetchRequest::Feed(FeedQuery::new(
                2,
                2,
                filters(Some(1), Some(2023), SortKey::Popularity)
            ))
        );
        assert_eq!(state.complete(next.ticket, Ok(page_of(&[3, 4], false))), Completion::Appended);

        let ids: Vec<u32> = state.items().iter().map(|a| a.mal_id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        assert!(!state.has_more());
    }

    #[test]
    fn test_filter_change_replaces_list() {
        let mut state = FeedState::new(12);
        let first = state.reset();
        state.complete(first.ticket, Ok(page_of(&[1, 2], true)));
        let more = state.last_item_visible().unwrap();
        state.complete(more.ticket, Ok(page_of(&[3, 4], true)));

        let changed = state.change_filters(filters(Some(8), None, SortKey::Episodes));
        assert_eq!(state.page(), 1);
        assert_eq!(changed.ticket.page(), 1);
        assert_eq!(state.complete(changed.ticket, Ok(page_of(&[80], false))), Completion::Replaced);
        assert_eq!(state.items().len(), 1);
        assert_eq!(state.items()[0].mal_id, 80);
    }

    #[test]
    fn test_latest_filter_wins_when_responses_cross() {
        let mut state = FeedState::new(12);
        let action = state.change_filters(filters(Some(1), None, SortKey::Score));
        let drama = state.change_filters(filters(Some(8), None, SortKey::Score));

        // The second tuple resolves first, the first one straggles in afterwards
        assert_eq!(state.complete(drama.ticket, Ok(page_of(&[800, 801], true))), Completion::Replaced);
        assert_eq!(state.complete(action.ticket, Ok(page_of(&[100, 101], false))), Completion::Stale);

        let ids: Vec<u32> = state.items().iter().map(|a| a.mal_id).collect();
        assert_eq!(ids, vec![800, 801]);
        assert!(state.has_more());
        assert_eq!(state.filters().genre, Some(8));
    }

    #[test]
    fn test_stale_page_advance_is_dropped() {
        let mut state = FeedState::new(12);
        let first = state.reset();
        state.complete(first.ticket, Ok(page_of(&[1], true)));
        let old_page = state.last_item_visible().unwrap();

        let search = state.submit_search("bebop").unwrap();
        assert_eq!(state.complete(old_page.ticket, Ok(page_of(&[2], true))), Completion::Stale);
        assert!(state.is_loading());

        state.complete(search.ticket, Ok(page_of(&[9], false)));
        let ids: Vec<u32> = state.items().iter().map(|a| a.mal_id).collect();
        assert_eq!(ids, vec![9]);
    }

    #[test]
    fn test_search_suppresses_filters() {
        let mut state = FeedState::new(12);
        let first = state.change_filters(filters(Some(1), Some(2020), SortKey::Popularity));
        state.complete(first.ticket, Ok(page_of(&[1], true)));

        let search = state.submit_search("  steins gate ").unwrap();
        assert_eq!(
            search.request,
            FetchRequest::Search {
                term: "steins gate".to_string(),
                page: 1,
                limit: 12
            }
        );
        assert_eq!(state.active_search(), Some("steins gate"));
        state.complete(search.ticket, Ok(page_of(&[5], true)));

        // Paging continues on the search path
        let next = state.last_item_visible().unwrap();
        assert!(matches!(next.request, FetchRequest::Search { page: 2, .. }));
    }

    #[test]
    fn test_blank_search_is_ignored() {
        let mut state = FeedState::new(12);
        let first = state.reset();
        state.complete(first.ticket, Ok(page_of(&[1, 2], true)));

        assert_eq!(state.submit_search("   "), None);
        assert_eq!(state.active_search(), None);
        assert!(!state.is_loading());
        assert_eq!(state.items().len(), 2);
    }

    #[test]
    fn test_reset_clears_search_and_filters() {
        let mut state = FeedState::new(12);
        state.change_filters(filters(Some(1), Some(2001), SortKey::Episodes));
        state.submit_search("lain");

        let pending = state.reset();
        assert_eq!(state.active_search(), None);
        assert_eq!(state.filters(), FeedFilters::default());
        assert_eq!(
            pending.request,
            FetchRequest::Feed(FeedQuery::new(1, 12, FeedFilters::default()))
        );
    }

    #[test]
    fn test_failed_page_advance_can_retry() {
        let mut state = FeedState::new(12);
        let first = state.reset();
        state.complete(first.ticket, Ok(page_of(&[1], true)));

        let second = state.last_item_visible().unwrap();
        let outcome = state.complete(
            second.ticket,
            Err(ApiError::Http(StatusCode::INTERNAL_SERVER_ERROR)),
        );
        assert_eq!(outcome, Completion::Failed);
        assert!(state.error().is_some());
        assert_eq!(state.page(), 1);
        assert_eq!(state.items().len(), 1);

        let retry = state.last_item_visible().unwrap();
        assert_eq!(retry.ticket.page(), 2);
    }

    #[test]
    fn test_failed_first_page_empties_list() {
        let mut state = FeedState::new(12);
        let first = state.reset();
        state.complete(first.ticket, Ok(page_of(&[1], true)));

        let changed = state.change_filters(filters(None, Some(1999), SortKey::Score));
        state.complete(changed.ticket, Err(ApiError::Parse("bad envelope".to_string())));
        assert!(state.items().is_empty());
        assert!(!state.has_more());
        assert!(state.error().unwrap().contains("bad envelope"));
    }

    #[tokio::test]
    async fn test_initial_load_fetches_genres_and_first_page() {
        let mut view = DiscoveryView::new(FakeSource::with_pages(3), 12);
        assert_eq!(view.initial_load().await, Completion::Replaced);

        assert_eq!(view.genres().len(), 2);
        assert_eq!(view.state().items().len(), 12);
        assert!(view.state().has_more());

        let calls = view.source().calls();
        assert!(calls.contains(&Call::Genres));
        assert!(calls.contains(&Call::Feed(FeedQuery::new(1, 12, FeedFilters::default()))));
    }

    #[tokio::test]
    async fn test_initial_load_with_filters_sends_one_feed_request() {
        let mut view = DiscoveryView::new(FakeSource::with_pages(2), 12);
        let chosen = filters(Some(8), Some(2004), SortKey::Popularity);
        assert_eq!(view.initial_load_with(chosen, None).await, Completion::Replaced);

        assert_eq!(view.state().filters(), chosen);
        let feeds: Vec<Call> = view
            .source()
            .calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Feed(_) | Call::Search(..)))
            .collect();
        assert_eq!(feeds, vec![Call::Feed(FeedQuery::new(1, 12, chosen))]);
    }

    #[tokio::test]
    async fn test_initial_load_with_search_skips_default_feed() {
        let mut view = DiscoveryView::new(FakeSource::with_pages(2), 12);
        view.initial_load_with(FeedFilters::default(), Some("  bebop ")).await;

        assert_eq!(view.state().active_search(), Some("bebop"));
        let calls = view.source().calls();
        assert!(calls.contains(&Call::Genres));
        assert!(calls.contains(&Call::Search("bebop".to_string(), 1)));
        assert!(!calls.iter().any(|c| matches!(c, Call::Feed(_))));
    }

    #[test]
    fn test_start_with_blank_search_uses_filters() {
        let mut state = FeedState::new(12);
        let chosen = filters(Some(1), None, SortKey::Episodes);
        let pending = state.start(chosen, Some("   "));
        assert_eq!(state.active_search(), None);
        assert_eq!(pending.request, FetchRequest::Feed(FeedQuery::new(1, 12, chosen)));
    }

    #[tokio::test]
    async fn test_exhausted_feed_issues_no_fetch() {
        let mut view = DiscoveryView::new(FakeSource::with_pages(1), 12);
        view.initial_load().await;
        let before = view.source().calls().len();

        assert_eq!(view.last_item_visible().await, None);
        assert_eq!(view.state().page(), 1);
        assert_eq!(view.source().calls().len(), before);
    }

    #[tokio::test]
    async fn test_scrolling_through_search_results() {
        let mut view = DiscoveryView::new(FakeSource::with_pages(2), 5);
        view.initial_load().await;

        assert_eq!(view.submit_search("mecha").await, Some(Completion::Replaced));
        assert_eq!(view.last_item_visible().await, Some(Completion::Appended));
        assert_eq!(view.state().items().len(), 10);
        assert_eq!(view.last_item_visible().await, None);

        let calls = view.source().calls();
        assert!(calls.contains(&Call::Search("mecha".to_string(), 2)));
    }

    #[tokio::test]
    async fn test_genre_failure_keeps_feed() {
        let source = FakeSource::with_pages(1).failing_genres();
        let mut view = DiscoveryView::new(source, 12);

        assert_eq!(view.initial_load().await, Completion::Replaced);
        assert!(view.genres().is_empty());
        assert!(view.genre_error().is_some());
        assert_eq!(view.state().items()[0], anime(1_01));
    }
}
