//! In-memory stand-ins for the metadata API and the watchlist table.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use chrono::{Duration, TimeZone, Utc};
use jikan_client::{AnimeSource, ApiError, StatusCode};
use shared::{
    Anime, AuthUser, FeedQuery, Genre, NewWatchlistEntry, Page, Session, WatchlistEntry,
};
use supabase_client::{StoreError, WatchlistStore};

pub fn anime(mal_id: u32) -> Anime {
    Anime {
        mal_id,
        title: format!("Anime {}", mal_id),
        title_english: None,
        title_japanese: None,
        images: Default::default(),
        score: Some(8.0),
        rank: Some(mal_id),
        popularity: None,
        episodes: Some(12),
        year: Some(2020),
        synopsis: None,
        trailer: None,
        genres: Vec::new(),
    }
}

pub fn page_of(ids: &[u32], has_next: bool) -> Page<Anime> {
    Page {
        items: ids.iter().copied().map(anime).collect(),
        has_next,
        current_page: 1,
        total_pages: None,
    }
}

pub fn session(user: &str) -> Session {
    Session {
        access_token: format!("token-{}", user),
        token_type: Some("bearer".to_string()),
        expires_in: None,
        expires_at: None,
        refresh_token: None,
        user: AuthUser {
            id: user.to_string(),
            email: Some(format!("{}@example.com", user)),
            created_at: None,
        },
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Feed(FeedQuery),
    Genres,
    Details(String),
    Search(String, u32),
}

/// Metadata source serving `pages` pages for every query
///
/// Page `p` holds ids `p*100 + 1 ..= p*100 + limit`.
pub struct FakeSource {
    pages: u32,
    fail_genres: bool,
    calls: Mutex<Vec<Call>>,
}

impl FakeSource {
    pub fn with_pages(pages: u32) -> Self {
        Self {
            pages,
            fail_genres: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_genres(mut self) -> Self {
        self.fail_genres = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn page(&self, page: u32, limit: u32) -> Page<Anime> {
        let items = if page <= self.pages {
            (1..=limit).map(|i| anime(page * 100 + i)).collect()
        } else {
            Vec::new()
        };
        Page {
            items,
            has_next: page < self.pages,
            current_page: page,
            total_pages: Some(self.pages),
        }
    }
}

impl AnimeSource for FakeSource {
    async fn fetch_feed(&self, query: &FeedQuery) -> Result<Page<Anime>, ApiError> {
        self.record(Call::Feed(*query));
        Ok(self.page(query.page, query.limit))
    }

    async fn fetch_genres(&self) -> Result<Vec<Genre>, ApiError> {
        self.record(Call::Genres);
        if self.fail_genres {
            return Err(ApiError::Http(StatusCode::SERVICE_UNAVAILABLE));
        }
        Ok(vec![
            Genre {
                mal_id: 1,
                name: "Action".to_string(),
                count: None,
            },
            Genre {
                mal_id: 8,
                name: "Drama".to_string(),
                count: None,
            },
        ])
    }

    async fn fetch_details(&self, id: &str) -> Result<Anime, ApiError> {
        self.record(Call::Details(id.to_string()));
        match id.trim().parse::<u32>() {
            Err(_) => Err(ApiError::Validation(format!("invalid anime id: {}", id))),
            Ok(mal_id) if (1..1000).contains(&mal_id) => Ok(anime(mal_id)),
            Ok(_) => Err(ApiError::NotFound),
        }
    }

    async fn search(&self, term: &str, page: u32, limit: u32) -> Result<Page<Anime>, ApiError> {
        self.record(Call::Search(term.to_string(), page));
        Ok(self.page(page, limit))
    }
}

/// Watchlist table kept in memory
#[derive(Default)]
pub struct FakeStore {
    rows: Mutex<Vec<WatchlistEntry>>,
    requests: AtomicUsize,
    mutations: AtomicUsize,
    failing: AtomicBool,
}

impl FakeStore {
    pub fn rows(&self) -> Vec<WatchlistEntry> {
        self.rows.lock().unwrap().clone()
    }

    pub fn matching(&self, user_id: &str, anime_id: &str) -> usize {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.user_id == user_id && r.anime_id == anime_id)
            .count()
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn mutations(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn seed(&self, user_id: &str, anime_id: u32, title: &str) {
        let mut rows = self.rows.lock().unwrap();
        let created_at = Utc.timestamp_opt(1_700_000_000, 0).unwrap()
            + Duration::minutes(rows.len() as i64);
        rows.push(WatchlistEntry {
            user_id: user_id.to_string(),
            anime_id: anime_id.to_string(),
            anime_title: title.to_string(),
            anime_image: String::new(),
            created_at,
        });
    }

    fn begin(&self) -> Result<(), StoreError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Api {
                status: 500,
                message: "store unavailable".to_string(),
            });
        }
        Ok(())
    }
}

impl WatchlistStore for FakeStore {
    async fn contains(&self, session: &Session, anime_id: &str) -> Result<bool, StoreError> {
        self.begin()?;
        Ok(self.matching(session.user_id(), anime_id) > 0)
    }

    async fn insert(&self, session: &Session, entry: &NewWatchlistEntry) -> Result<(), StoreError> {
        self.begin()?;
        self.mutations.fetch_add(1, Ordering::SeqCst);
        assert_eq!(session.user_id(), entry.user_id);
        let mut rows = self.rows.lock().unwrap();
        let created_at = Utc.timestamp_opt(1_700_000_000, 0).unwrap()
            + Duration::minutes(rows.len() as i64);
        rows.push(WatchlistEntry {
            user_id: entry.user_id.clone(),
            anime_id: entry.anime_id.clone(),
            anime_title: entry.anime_title.clone(),
            anime_image: entry.anime_image.clone(),
            created_at,
        });
        Ok(())
    }

    async fn remove(&self, session: &Session, anime_id: &str) -> Result<(), StoreError> {
        self.begin()?;
        self.mutations.fetch_add(1, Ordering::SeqCst);
        self.rows
            .lock()
            .unwrap()
            .retain(|r| !(r.user_id == session.user_id() && r.anime_id == anime_id));
        Ok(())
    }

    async fn list(&self, session: &Session) -> Result<Vec<WatchlistEntry>, StoreError> {
        self.begin()?;
        let mut rows: Vec<WatchlistEntry> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.user_id == session.user_id())
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }
}
