//! Service-agnostic seam over the metadata API.
//!
//! Views are generic over [`AnimeSource`] so they can run against the real
//! Jikan client or an in-memory stand-in.

use std::future::Future;

use shared::{Anime, FeedQuery, Genre, Page};

use crate::api::{ApiError, JikanClient};

/// Read-only anime metadata provider
pub trait AnimeSource: Send + Sync {
    /// One page of the filtered, sorted feed.
    fn fetch_feed(
        &self,
        query: &FeedQuery,
    ) -> impl Future<Output = Result<Page<Anime>, ApiError>> + Send;

    /// The complete genre list.
    fn fetch_genres(&self) -> impl Future<Output = Result<Vec<Genre>, ApiError>> + Send;

    /// Full record for one anime, by textual id.
    fn fetch_details(&self, id: &str) -> impl Future<Output = Result<Anime, ApiError>> + Send;

    /// One page of free-text search results.
    fn search(
        &self,
        term: &str,
        page: u32,
        limit: u32,
    ) -> impl Future<Output = Result<Page<Anime>, ApiError>> + Send;
}

impl AnimeSource for JikanClient {
    async fn fetch_feed(&self, query: &FeedQuery) -> Result<Page<Anime>, ApiError> {
        JikanClient::fetch_feed(self, query).await
    }

    async fn fetch_genres(&self) -> Result<Vec<Genre>, ApiError> {
        JikanClient::fetch_genres(self).await
    }

    async fn fetch_details(&self, id: &str) -> Result<Anime, ApiError> {
        JikanClient::fetch_details(self, id).await
    }

    async fn search(&self, term: &str, page: u32, limit: u32) -> Result<Page<Anime>, ApiError> {
        JikanClient::search(self, term, page, limit).await
    }
}
