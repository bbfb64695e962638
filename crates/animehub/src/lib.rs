//! AnimeHub: anime discovery with a personal watchlist.
//!
//! Catalog data comes from the Jikan API v4; accounts and the watchlist
//! live in a Supabase project. The views here hold the app state and are
//! driven by the `animehub` terminal front-end.

pub mod app;
pub mod detail;
pub mod discovery;
pub mod render;
pub mod toggle;
pub mod watchlist_view;

#[cfg(test)]
mod testing;

pub use app::{App, BrowseOptions};
pub use detail::DetailView;
pub use discovery::{Completion, DiscoveryView, FeedState, FetchRequest, FetchTicket, PendingFetch};
pub use toggle::{Membership, ToggleError, WatchlistToggle};
pub use watchlist_view::WatchlistView;
