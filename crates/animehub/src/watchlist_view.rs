//! Read-only listing of the signed-in user's watchlist.

use shared::WatchlistEntry;
use supabase_client::{SessionProvider, WatchlistStore};
use tracing::warn;

#[derive(Debug, Clone, PartialEq)]
pub enum WatchlistView {
    SignedOut,
    /// Entries, newest first
    Loaded(Vec<WatchlistEntry>),
    Failed(String),
}

impl WatchlistView {
    pub async fn load<W: WatchlistStore>(store: &W, sessions: &SessionProvider) -> Self {
        let Some(session) = sessions.session() else {
            return WatchlistView::SignedOut;
        };
        match store.list(&session).await {
            Ok(entries) => WatchlistView::Loaded(entries),
            Err(e) => {
                warn!(error = %e, "Failed to load watchlist");
                WatchlistView::Failed(e.to_string())
            }
        }
    }
}
