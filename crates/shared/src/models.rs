//! Data models shared across the workspace.
//!
//! Anime records and genres come straight off the metadata API and are never
//! stored locally. Watchlist entries and sessions belong to the auth/storage
//! backend; the app only holds snapshots of them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Anime record as returned by the metadata API
///
/// Feed, search and detail lookups all deserialize into this type. Fields only
/// present on the "full" detail response default to empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anime {
    pub mal_id: u32,

    // Titles
    pub title: String,
    #[serde(default)]
    pub title_english: Option<String>,
    #[serde(default)]
    pub title_japanese: Option<String>,

    #[serde(default)]
    pub images: Images,

    // Scores and rankings
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub rank: Option<u32>,
    #[serde(default)]
    pub popularity: Option<u32>,

    #[serde(default)]
    pub episodes: Option<u32>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub synopsis: Option<String>,
    #[serde(default)]
    pub trailer: Option<Trailer>,
    #[serde(default)]
    pub genres: Vec<NamedResource>,
}

impl Anime {
    /// Localized title when available, default title otherwise
    pub fn display_title(&self) -> &str {
        self.title_english
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or(&self.title)
    }

    /// Regular-size cover image
    pub fn image_url(&self) -> Option<&str> {
        self.images.jpg.image_url.as_deref()
    }

    /// Largest cover image available
    pub fn large_image_url(&self) -> Option<&str> {
        self.images
            .jpg
            .large_image_url
            .as_deref()
            .or_else(|| self.image_url())
    }
}

/// Cover images in the formats the API serves
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Images {
    #[serde(default)]
    pub jpg: ImageSet,
    #[serde(default)]
    pub webp: Option<ImageSet>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageSet {
    pub image_url: Option<String>,
    #[serde(default)]
    pub small_image_url: Option<String>,
    #[serde(default)]
    pub large_image_url: Option<String>,
}

/// Trailer reference
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trailer {
    #[serde(default)]
    pub youtube_id: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub embed_url: Option<String>,
}

/// Id/name pair referenced from an anime record (genre, studio, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedResource {
    pub mal_id: u32,
    pub name: String,
}

/// Genre usable as a feed filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genre {
    pub mal_id: u32,
    pub name: String,
    #[serde(default)]
    pub count: Option<u32>,
}

/// Feed ordering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Score,
    Popularity,
    Episodes,
}

impl SortKey {
    /// Value of the API's `order_by` parameter
    pub fn order_by(&self) -> &'static str {
        match self {
            SortKey::Score => "score",
            SortKey::Popularity => "popularity",
            SortKey::Episodes => "episodes",
        }
    }
}

impl std::fmt::Display for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.order_by())
    }
}

impl std::str::FromStr for SortKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "score" => Ok(SortKey::Score),
            "popularity" => Ok(SortKey::Popularity),
            "episodes" => Ok(SortKey::Episodes),
            _ => Err(anyhow::anyhow!(
                "Invalid sort key: {} (expected score, popularity or episodes)",
                s
            )),
        }
    }
}

/// Filter part of a feed query
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedFilters {
    pub genre: Option<u32>,
    pub year: Option<i32>,
    pub sort: SortKey,
}

/// Everything that determines one feed request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedQuery {
    pub page: u32,
    pub limit: u32,
    pub filters: FeedFilters,
}

impl FeedQuery {
    pub fn new(page: u32, limit: u32, filters: FeedFilters) -> Self {
        Self { page, limit, filters }
    }
}

/// Normalized page of a collection endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub has_next: bool,
    pub current_page: u32,
    pub total_pages: Option<u32>,
}

/// Row of the watchlist table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchlistEntry {
    pub user_id: String,
    pub anime_id: String,
    pub anime_title: String,
    /// Empty when the row has no image; stored rows may hold `null`
    #[serde(default, deserialize_with = "null_as_empty")]
    pub anime_image: String,
    pub created_at: DateTime<Utc>,
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Insert payload for the watchlist table; `created_at` is assigned remotely
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewWatchlistEntry {
    pub user_id: String,
    pub anime_id: String,
    pub anime_title: String,
    pub anime_image: String,
}

impl NewWatchlistEntry {
    pub fn for_anime(user_id: &str, anime: &Anime) -> Self {
        Self {
            user_id: user_id.to_string(),
            anime_id: anime.mal_id.to_string(),
            anime_title: anime.display_title().to_string(),
            anime_image: anime.image_url().unwrap_or_default().to_string(),
        }
    }
}

/// Signed-in identity issued by the auth service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    /// Unix timestamp (seconds) after which the access token is rejected
    #[serde(default)]
    pub expires_at: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub user: AuthUser,
}

impl Session {
    pub fn user_id(&self) -> &str {
        &self.user.id
    }

    /// Whether the token is past its expiry at `now`; sessions without an expiry never expire
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at
            .map(|at| at <= now.timestamp())
            .unwrap_or(false)
    }
}

/// User record attached to a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_anime_from_feed_item() {
        let json = r#"{
            "mal_id": 5114,
            "title": "Fullmetal Alchemist: Brotherhood",
            "title_english": "Fullmetal Alchemist: Brotherhood",
            "images": {"jpg": {"image_url": "https://cdn/a.jpg", "large_image_url": "https://cdn/l.jpg"}},
            "score": 9.1,
            "rank": 1,
            "episodes": 64,
            "year": 2009,
            "genres": [{"mal_id": 1, "type": "anime", "name": "Action", "url": "https://x"}]
        }"#;
        let anime: Anime = serde_json::from_str(json).unwrap();
        assert_eq!(anime.mal_id, 5114);
        assert_eq!(anime.rank, Some(1));
        assert_eq!(anime.genres[0].name, "Action");
        assert_eq!(anime.large_image_url(), Some("https://cdn/l.jpg"));
    }

    #[test]
    fn test_display_title_falls_back() {
        let json = r#"{"mal_id": 1, "title": "Kimetsu no Yaiba", "title_english": null}"#;
        let anime: Anime = serde_json::from_str(json).unwrap();
        assert_eq!(anime.display_title(), "Kimetsu no Yaiba");
        assert_eq!(anime.image_url(), None);
        assert_eq!(anime.large_image_url(), None);
    }

    #[test]
    fn test_sort_key_parse() {
        assert_eq!("Popularity".parse::<SortKey>().unwrap(), SortKey::Popularity);
        assert_eq!(SortKey::Episodes.order_by(), "episodes");
        assert!("members".parse::<SortKey>().is_err());
        assert_eq!(FeedFilters::default().sort, SortKey::Score);
    }

    #[test]
    fn test_new_entry_denormalizes_title_and_image() {
        let json = r#"{"mal_id": 21, "title": "One Piece",
            "images": {"jpg": {"image_url": "https://cdn/op.jpg"}}}"#;
        let anime: Anime = serde_json::from_str(json).unwrap();
        let entry = NewWatchlistEntry::for_anime("user-1", &anime);
        assert_eq!(entry.anime_id, "21");
        assert_eq!(entry.anime_title, "One Piece");
        assert_eq!(entry.anime_image, "https://cdn/op.jpg");
    }

    #[test]
    fn test_session_expiry() {
        let session = Session {
            access_token: "token".to_string(),
            token_type: Some("bearer".to_string()),
            expires_in: Some(3600),
            expires_at: Some(1_700_000_000),
            refresh_token: None,
            user: AuthUser {
                id: "user-1".to_string(),
                email: None,
                created_at: None,
            },
        };
        let before = Utc.timestamp_opt(1_699_999_000, 0).unwrap();
        let after = Utc.timestamp_opt(1_700_000_001, 0).unwrap();
        assert!(!session.is_expired_at(before));
        assert!(session.is_expired_at(after));
    }
}
