//! Watchlist toggle for a single anime.
//!
//! Membership is tracked per (anime, signed-in user) and only ever changes
//! after the store confirms a check, insert or delete.

use shared::{Anime, NewWatchlistEntry, Session};
use supabase_client::{SessionProvider, StoreError, WatchlistStore};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Membership of one anime in the current user's watchlist
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    /// Not checked yet for the current user
    Unknown,
    Absent,
    Present,
}

#[derive(Debug, Error)]
pub enum ToggleError {
    #[error("Please sign in first to use the watchlist")]
    SignInRequired,

    #[error("Failed to update the watchlist: {0}")]
    Store(#[from] StoreError),
}

/// Add/remove control for one anime
#[derive(Debug, Clone)]
pub struct WatchlistToggle {
    anime_id: String,
    title: String,
    image: String,
    state: Membership,
    /// User the current state was resolved for
    resolved_for: Option<String>,
}

impl WatchlistToggle {
    pub fn new(anime_id: impl Into<String>, title: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            anime_id: anime_id.into(),
            title: title.into(),
            image: image.into(),
            state: Membership::Unknown,
            resolved_for: None,
        }
    }

    pub fn for_anime(anime: &Anime) -> Self {
        Self::new(
            anime.mal_id.to_string(),
            anime.display_title(),
            anime.image_url().unwrap_or_default(),
        )
    }

    pub fn anime_id(&self) -> &str {
        &self.anime_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Membership as seen by the user currently signed in
    pub fn state(&self, sessions: &SessionProvider) -> Membership {
        match (sessions.user_id(), &self.resolved_for) {
            (Some(user), Some(resolved)) if &user == resolved => self.state,
            _ => Membership::Unknown,
        }
    }

    async fn check<W: WatchlistStore>(&mut self, store: &W, session: &Session) -> Result<Membership, ToggleError> {
        let present = store.contains(session, &self.anime_id).await?;
        self.state = if present {
            Membership::Present
        } else {
            Membership::Absent
        };
        self.resolved_for = Some(session.user_id().to_string());
        debug!(anime_id = %self.anime_id, state = ?self.state, "Watchlist membership resolved");
        Ok(self.state)
    }

    /// Check membership for the signed-in user
    ///
    /// Stays `Unknown` without a session; no request is made then.
    pub async fn resolve<W: WatchlistStore>(
        &mut self,
        store: &W,
        sessions: &SessionProvider,
    ) -> Result<Membership, ToggleError> {
        let Some(session) = sessions.session() else {
            return Ok(Membership::Unknown);
        };
        self.check(store, &session).await.map_err(|e| {
            warn!(anime_id = %self.anime_id, error = %e, "Watchlist membership check failed");
            e
        })
    }

    /// Add when absent, remove when present
    ///
    /// Unresolved membership is checked first so an existing entry is never
    /// inserted twice. On failure the state is left as it was.
    pub async fn toggle<W: WatchlistStore>(
        &mut self,
        store: &W,
        sessions: &SessionProvider,
    ) -> Result<Membership, ToggleError> {
        let Some(session) = sessions.session() else {
            info!(anime_id = %self.anime_id, "Watchlist toggle without a session");
            return Err(ToggleError::SignInRequired);
        };

        let current = match self.state(sessions) {
            Membership::Unknown => self.check(store, &session).await?,
            known => known,
        };

        let result = match current {
            Membership::Present => store
                .remove(&session, &self.anime_id)
                .await
                .map(|_| Membership::Absent),
            _ => {
                let entry = NewWatchlistEntry {
                    user_id: session.user_id().to_string(),
                    anime_id: self.anime_id.clone(),
                    anime_title: self.title.clone(),
                    anime_image: self.image.clone(),
                };
                store.insert(&session, &entry).await.map(|_| Membership::Present)
            }
        };

        match result {
            Ok(next) => {
                self.state = next;
                info!(anime_id = %self.anime_id, state = ?next, "Watchlist updated");
                Ok(next)
            }
            Err(e) => {
                warn!(anime_id = %self.anime_id, error = %e, "Watchlist update failed");
                Err(e.into())
            }
        }
    }
}
