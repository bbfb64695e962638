//! Watchlist rows in the Supabase REST (PostgREST) store.
//!
//! One table keyed by (user, anime). Every call is authenticated with the
//! caller's session; row-level isolation between users is the backend's job.

use std::future::Future;
use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Url};
use shared::config::SupabaseConfig;
use shared::{NewWatchlistEntry, Session, WatchlistEntry};
use tracing::{debug, info, warn};

use crate::error::{error_message, StoreError};

/// Per-user watchlist storage
pub trait WatchlistStore: Send + Sync {
    /// Whether the user already has an entry for `anime_id`.
    fn contains(
        &self,
        session: &Session,
        anime_id: &str,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Insert a new entry.
    fn insert(
        &self,
        session: &Session,
        entry: &NewWatchlistEntry,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Delete the user's entry for `anime_id`.
    fn remove(
        &self,
        session: &Session,
        anime_id: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// All of the user's entries, newest first.
    fn list(
        &self,
        session: &Session,
    ) -> impl Future<Output = Result<Vec<WatchlistEntry>, StoreError>> + Send;
}

/// PostgREST client for the watchlist table
#[derive(Debug, Clone)]
pub struct WatchlistClient {
    client: Client,
    table_url: Url,
    anon_key: String,
}

impl WatchlistClient {
    pub fn new(
        project_url: &str,
        anon_key: &str,
        table: &str,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let table_url = Url::parse(project_url)
            .and_then(|url| url.join("rest/v1/"))
            .and_then(|url| url.join(table))
            .map_err(|e| StoreError::Parse(format!("invalid project URL {}: {}", project_url, e)))?;

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            table_url,
            anon_key: anon_key.to_string(),
        })
    }

    /// Create a client from the `[supabase]` config section
    pub fn from_config(config: &SupabaseConfig) -> Result<Self, StoreError> {
        Self::new(
            &config.url,
            &config.anon_key,
            &config.table,
            Duration::from_secs(config.timeout_seconds),
        )
    }

    /// `?select=id&user_id=eq.U&anime_id=eq.A`
    pub fn membership_url(&self, user_id: &str, anime_id: &str) -> Url {
        let mut url = self.table_url.clone();
        url.query_pairs_mut()
            .append_pair("select", "id")
            .append_pair("user_id", &format!("eq.{}", user_id))
            .append_pair("anime_id", &format!("eq.{}", anime_id));
        url
    }

    /// `?user_id=eq.U&anime_id=eq.A`
    pub fn delete_url(&self, user_id: &str, anime_id: &str) -> Url {
        let mut url = self.table_url.clone();
        url.query_pairs_mut()
            .append_pair("user_id", &format!("eq.{}", user_id))
            .append_pair("anime_id", &format!("eq.{}", anime_id));
        url
    }

    /// `?select=*&user_id=eq.U&order=created_at.desc`
    pub fn list_url(&self, user_id: &str) -> Url {
        let mut url = self.table_url.clone();
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("user_id", &format!("eq.{}", user_id))
            .append_pair("order", "created_at.desc");
        url
    }

    fn request(&self, method: Method, url: Url, session: &Session) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(&session.access_token)
    }

    async fn execute(&self, builder: RequestBuilder) -> Result<Vec<u8>, StoreError> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let message = error_message(status.as_u16(), &body);
            warn!(status = %status, message = %message, "Watchlist request failed");
            return Err(StoreError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(body.to_vec())
    }
}

impl WatchlistStore for WatchlistClient {
    async fn contains(&self, session: &Session, anime_id: &str) -> Result<bool, StoreError> {
        let url = self.membership_url(session.user_id(), anime_id);
        debug!(anime_id = anime_id, "Checking watchlist membership");

        let body = self.execute(self.request(Method::GET, url, session)).await?;
        let rows: Vec<serde_json::Value> =
            serde_json::from_slice(&body).map_err(|e| StoreError::Parse(e.to_string()))?;
        Ok(!rows.is_empty())
    }

    async fn insert(&self, session: &Session, entry: &NewWatchlistEntry) -> Result<(), StoreError> {
        let builder = self
            .request(Method::POST, self.table_url.clone(), session)
            .header("Prefer", "return=minimal")
            .json(&[entry]);

        self.execute(builder).await?;
        info!(anime_id = %entry.anime_id, title = %entry.anime_title, "Added to watchlist");
        Ok(())
    }

    async fn remove(&self, session: &Session, anime_id: &str) -> Result<(), StoreError> {
        let url = self.delete_url(session.user_id(), anime_id);
        self.execute(self.request(Method::DELETE, url, session)).await?;
        info!(anime_id = anime_id, "Removed from watchlist");
        Ok(())
    }

    async fn list(&self, session: &Session) -> Result<Vec<WatchlistEntry>, StoreError> {
        let url = self.list_url(session.user_id());
        let body = self.execute(self.request(Method::GET, url, session)).await?;
        let entries: Vec<WatchlistEntry> =
            serde_json::from_slice(&body).map_err(|e| StoreError::Parse(e.to_string()))?;
        debug!(count = entries.len(), "Watchlist loaded");
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> WatchlistClient {
        WatchlistClient::new(
            "https://demo.supabase.co",
            "anon",
            "watchlist",
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_membership_url() {
        let url = client().membership_url("user-1", "5114");
        assert_eq!(url.path(), "/rest/v1/watchlist");
        assert_eq!(
            url.query(),
            Some("select=id&user_id=eq.user-1&anime_id=eq.5114")
        );
    }

    #[test]
    fn test_delete_url_has_no_select() {
        let url = client().delete_url("user-1", "21");
        assert_eq!(url.query(), Some("user_id=eq.user-1&anime_id=eq.21"));
    }

    #[test]
    fn test_list_url_orders_newest_first() {
        let url = client().list_url("user-1");
        let query = url.query().unwrap_or_default();
        assert!(query.contains("order=created_at.desc"));
        assert!(query.contains("select=*") || query.contains("select=%2A"));
    }

    #[test]
    fn test_custom_table_name() {
        let client = WatchlistClient::new(
            "https://demo.supabase.co/",
            "anon",
            "saved_anime",
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(client.list_url("u").path(), "/rest/v1/saved_anime");
    }

    #[test]
    fn test_entries_parse_from_rows() {
        let body = r#"[
            {"id": "0b6c", "user_id": "user-1", "anime_id": "21", "anime_title": "One Piece",
             "anime_image": "https://cdn/op.jpg", "created_at": "2024-05-02T08:30:00+00:00"},
            {"id": "0b6b", "user_id": "user-1", "anime_id": "1", "anime_title": "Cowboy Bebop",
             "anime_image": "https://cdn/cb.jpg", "created_at": "2024-05-01T08:30:00+00:00"}
        ]"#;
        let entries: Vec<WatchlistEntry> = serde_json::from_str(body).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].anime_title, "One Piece");
        assert!(entries[0].created_at > entries[1].created_at);
    }

    #[test]
    fn test_rows_with_null_or_missing_image() {
        let body = r#"[
            {"id": "0b6c", "user_id": "user-1", "anime_id": "21", "anime_title": "One Piece",
             "anime_image": null, "created_at": "2024-05-02T08:30:00+00:00"},
            {"id": "0b6b", "user_id": "user-1", "anime_id": "1", "anime_title": "Cowboy Bebop",
             "created_at": "2024-05-01T08:30:00+00:00"}
        ]"#;
        let entries: Vec<WatchlistEntry> = serde_json::from_str(body).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].anime_image, "");
        assert_eq!(entries[1].anime_image, "");
        assert_eq!(entries[1].anime_title, "Cowboy Bebop");
    }
}
