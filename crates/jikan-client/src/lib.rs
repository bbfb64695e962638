//! Jikan client library for fetching anime metadata from MyAnimeList.
//!
//! This library wraps the Jikan API v4: the filtered discovery feed, the genre
//! list, full detail records and text search, all normalized into the shared
//! models.

pub mod api;
pub mod source;

pub use api::{ApiError, ApiResponse, JikanClient, MAX_LIMIT, MIN_YEAR};
pub use reqwest::StatusCode;
pub use source::AnimeSource;
