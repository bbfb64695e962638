//! Supabase client library for accounts and per-user watchlists.
//!
//! - [`AuthClient`]: sign-in, sign-up, sign-out and user lookup
//! - [`SessionHub`] / [`SessionProvider`]: the session change stream
//! - [`SessionFile`]: session persistence between runs
//! - [`WatchlistClient`]: membership check, insert, delete and listing

pub mod auth;
pub mod error;
pub mod persist;
pub mod session;
pub mod store;

pub use auth::{AuthClient, SignUp};
pub use error::{AuthError, StoreError};
pub use persist::SessionFile;
pub use session::{SessionHub, SessionProvider};
pub use store::{WatchlistClient, WatchlistStore};
