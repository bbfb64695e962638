//! Detail view: one-shot fetch of a single anime.

use jikan_client::{AnimeSource, ApiError};
use shared::Anime;
use tracing::warn;

/// Outcome of loading one anime
#[derive(Debug, Clone, PartialEq)]
pub enum DetailView {
    Loaded(Box<Anime>),
    /// Unknown id; rendered as its own page rather than an error
    NotFound,
    Failed(String),
}

impl DetailView {
    /// Fetch the full record for `id`
    pub async fn load<S: AnimeSource>(source: &S, id: &str) -> Self {
        match source.fetch_details(id).await {
            Ok(anime) => DetailView::Loaded(Box::new(anime)),
            Err(ApiError::NotFound) => DetailView::NotFound,
            Err(e) => {
                warn!(id = id, error = %e, "Detail fetch failed");
                DetailView::Failed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{anime, Call, FakeSource};

    #[tokio::test]
    async fn test_load_known_id() {
        let source = FakeSource::with_pages(1);
        let view = DetailView::load(&source, "42").await;
        assert_eq!(view, DetailView::Loaded(Box::new(anime(42))));
        assert_eq!(source.calls(), vec![Call::Details("42".to_string())]);
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let source = FakeSource::with_pages(1);
        assert_eq!(DetailView::load(&source, "99999").await, DetailView::NotFound);
        assert_eq!(DetailView::load(&source, "0").await, DetailView::NotFound);
    }

    #[tokio::test]
    async fn test_invalid_id_fails() {
        let source = FakeSource::with_pages(1);
        match DetailView::load(&source, "abc").await {
            DetailView::Failed(message) => assert!(message.contains("invalid anime id")),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }
}
