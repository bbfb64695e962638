//! Jikan API v4 client implementation.
//!
//! This module provides a validating client for the Jikan API (MyAnimeList
//! unofficial API): filtered feed, genre list, detail lookup and text search.

pub mod client;
pub mod error;
pub mod types;

pub use client::{ApiResponse, JikanClient, MAX_LIMIT, MIN_YEAR};
pub use error::ApiError;
pub use types::*;
