//! Jikan API client.
//!
//! Every call is a single best-effort request: no retries, no rate limiting,
//! no caching. Input constraints are checked before anything goes on the wire.

use super::error::ApiError;
use super::types::*;
use chrono::Datelike;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use shared::config::JikanConfig;
use shared::{Anime, FeedQuery, Genre, Page};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Largest page size the API accepts
pub const MAX_LIMIT: u32 = 25;

/// Earliest year accepted by the year filter
pub const MIN_YEAR: i32 = 1917;

/// Outcome of one HTTP exchange, before the body is trusted
#[derive(Debug)]
pub enum ApiResponse<T> {
    Success(T),
    HttpError(StatusCode),
    ParseError(String),
}

impl<T: DeserializeOwned> ApiResponse<T> {
    /// Classify a raw status and body
    pub fn classify(status: StatusCode, body: &[u8]) -> Self {
        if !status.is_success() {
            return ApiResponse::HttpError(status);
        }
        match serde_json::from_slice(body) {
            Ok(data) => ApiResponse::Success(data),
            Err(e) => ApiResponse::ParseError(e.to_string()),
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn into_result(self) -> Result<T, ApiError> {
        match self {
            ApiResponse::Success(data) => Ok(data),
            ApiResponse::HttpError(status) => Err(ApiError::Http(status)),
            ApiResponse::ParseError(message) => Err(ApiError::Parse(message)),
        }
    }

    /// Like [`into_result`](Self::into_result), but a 404 means the resource does not exist
    pub fn into_lookup(self) -> Result<T, ApiError> {
        match self {
            ApiResponse::HttpError(status) if status == StatusCode::NOT_FOUND => {
                Err(ApiError::NotFound)
            }
            other => other.into_result(),
        }
    }
}

/// Jikan API v4 client
#[derive(Debug, Clone)]
pub struct JikanClient {
    /// HTTP client
    client: Client,
    /// Base URL for Jikan API
    base_url: Url,
}

impl JikanClient {
    /// Create a new Jikan client
    pub fn new(base_url: &str, timeout: Duration, user_agent: &str) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ApiError::Validation(format!("invalid base URL {}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::Validation(format!(
                "base URL {} cannot carry a path",
                base_url
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;

        Ok(Self { client, base_url })
    }

    /// Create a client from the `[jikan]` config section
    pub fn from_config(config: &JikanConfig) -> Result<Self, ApiError> {
        Self::new(
            &config.base_url,
            Duration::from_secs(config.timeout_seconds),
            &config.user_agent,
        )
    }

    /// Build `{base}/<segments...>`
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::Validation("base URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Build the feed request URL, validating the query first
    pub fn feed_url(&self, query: &FeedQuery) -> Result<Url, ApiError> {
        validate_page(query.page)?;
        validate_limit(query.limit)?;
        if let Some(year) = query.filters.year {
            validate_year(year)?;
        }

        let mut url = self.endpoint(&["anime"])?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("page", &query.page.to_string())
                .append_pair("limit", &query.limit.to_string())
                .append_pair("sfw", "true")
                .append_pair("order_by", query.filters.sort.order_by())
                .append_pair("sort", "desc");

            if let Some(genre) = query.filters.genre {
                pairs.append_pair("genres", &genre.to_string());
            }
            if let Some(year) = query.filters.year {
                pairs
                    .append_pair("start_date", &format!("{}-01-01", year))
                    .append_pair("end_date", &format!("{}-12-31", year));
            }
        }
        Ok(url)
    }

    /// Build the text search URL, validating the input first
    pub fn search_url(&self, term: &str, page: u32, limit: u32) -> Result<Url, ApiError> {
        let term = term.trim();
        if term.is_empty() {
            return Err(ApiError::Validation("search term must not be empty".to_string()));
        }
        validate_page(page)?;
        validate_limit(limit)?;

        let mut url = self.endpoint(&["anime"])?;
        url.query_pairs_mut()
            .append_pair("q", term)
            .append_pair("page", &page.to_string())
            .append_pair("limit", &limit.to_string())
            .append_pair("sfw", "true");
        Ok(url)
    }

    /// Make a single GET request and classify the response
    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<ApiResponse<T>, ApiError> {
        debug!(url = %url, "Making API request");

        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            warn!(url = %url, error = %e, "Request error");
            ApiError::Transport(e)
        })?;
        let status = response.status();
        let body = response.bytes().await?;

        let classified = ApiResponse::classify(status, &body);
        match &classified {
            ApiResponse::Success(_) => debug!(url = %url, "Request successful"),
            ApiResponse::HttpError(status) => warn!(url = %url, status = %status, "Request failed"),
            ApiResponse::ParseError(e) => warn!(url = %url, error = %e, "Failed to parse response"),
        }
        Ok(classified)
    }

    /// Fetch one page of the filtered feed
    pub async fn fetch_feed(&self, query: &FeedQuery) -> Result<Page<Anime>, ApiError> {
        let url = self.feed_url(query)?;
        info!(
            page = query.page,
            sort = %query.filters.sort,
            genre = ?query.filters.genre,
            year = ?query.filters.year,
            "Fetching anime feed"
        );
        let response: PaginatedResponse<Anime> = self.get(url).await?.into_result()?;
        Ok(response.into_page(query.page))
    }

    /// Fetch the full genre list
    pub async fn fetch_genres(&self) -> Result<Vec<Genre>, ApiError> {
        info!("Fetching anime genres");
        let url = self.endpoint(&["genres", "anime"])?;
        let response: DataResponse<Genre> = self.get(url).await?.into_result()?;
        Ok(response.data)
    }

    /// Fetch the full record for one anime
    ///
    /// `id` is taken as text since it usually comes from user input.
    pub async fn fetch_details(&self, id: &str) -> Result<Anime, ApiError> {
        let mal_id = parse_id(id)?;
        debug!(mal_id = mal_id, "Fetching anime details");

        let url = self.endpoint(&["anime", &mal_id.to_string(), "full"])?;
        let response: SingleResponse<Anime> = self.get(url).await?.into_lookup()?;
        Ok(response.data)
    }

    /// Text search over the same collection endpoint as the feed
    pub async fn search(&self, term: &str, page: u32, limit: u32) -> Result<Page<Anime>, ApiError> {
        let url = self.search_url(term, page, limit)?;
        info!(term = term.trim(), page = page, "Searching anime");
        let response: PaginatedResponse<Anime> = self.get(url).await?.into_result()?;
        Ok(response.into_page(page))
    }
}

fn validate_page(page: u32) -> Result<(), ApiError> {
    if page < 1 {
        return Err(ApiError::Validation("page must be at least 1".to_string()));
    }
    Ok(())
}

fn validate_limit(limit: u32) -> Result<(), ApiError> {
    if limit < 1 || limit > MAX_LIMIT {
        return Err(ApiError::Validation(format!(
            "limit must be between 1 and {}, got {}",
            MAX_LIMIT, limit
        )));
    }
    Ok(())
}

fn validate_year(year: i32) -> Result<(), ApiError> {
    let max_year = chrono::Utc::now().year() + 1;
    if !(MIN_YEAR..=max_year).contains(&year) {
        return Err(ApiError::Validation(format!(
            "year must be between {} and {}, got {}",
            MIN_YEAR, max_year, year
        )));
    }
    Ok(())
}

fn parse_id(id: &str) -> Result<u32, ApiError> {
    let id = id.trim();
    if id.is_empty() {
        return Err(ApiError::Validation("anime id must not be empty".to_string()));
    }
    id.parse::<u32>()
        .map_err(|_| ApiError::Validation(format!("invalid anime id: {}", id)))
}
