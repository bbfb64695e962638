//! Plain-text rendering for the terminal front-end.

use std::fmt::Write;

use shared::{Anime, Genre, WatchlistEntry};

use crate::detail::DetailView;
use crate::discovery::FeedState;
use crate::toggle::Membership;
use crate::watchlist_view::WatchlistView;

fn score(anime: &Anime) -> String {
    anime
        .score
        .map(|s| format!("{:.2}", s))
        .unwrap_or_else(|| "N/A".to_string())
}

/// One grid card: position, rank badge, title and score
pub fn card(position: usize, anime: &Anime) -> String {
    let rank = anime.rank.map(|r| format!("#{} ", r)).unwrap_or_default();
    format!(
        "{:>3}. {}{} [{}] ⭐ {}",
        position,
        rank,
        anime.display_title(),
        anime.mal_id,
        score(anime)
    )
}

/// Heading plus every card of the feed
pub fn feed(state: &FeedState) -> String {
    let mut out = String::new();
    match state.active_search() {
        Some(term) => {
            let _ = writeln!(out, "Search results for \"{}\"", term);
        }
        None => {
            let filters = state.filters();
            let _ = write!(out, "Top anime by {}", filters.sort);
            if let Some(genre) = filters.genre {
                let _ = write!(out, ", genre {}", genre);
            }
            if let Some(year) = filters.year {
                let _ = write!(out, ", {}", year);
            }
            out.push('\n');
        }
    }

    if state.items().is_empty() && state.error().is_none() {
        out.push_str("  No anime found.\n");
    }
    for (i, anime) in state.items().iter().enumerate() {
        let _ = writeln!(out, "{}", card(i + 1, anime));
    }
    if let Some(error) = state.error() {
        let _ = writeln!(out, "  Error: {}", error);
    } else if state.has_more() {
        out.push_str("  (more available)\n");
    }
    out
}

pub fn genres(genres: &[Genre]) -> String {
    genres
        .iter()
        .map(|g| format!("{:>4}  {}", g.mal_id, g.name))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn detail(view: &DetailView) -> String {
    let anime = match view {
        DetailView::Loaded(anime) => anime,
        DetailView::NotFound => return "Anime not found.".to_string(),
        DetailView::Failed(message) => return format!("Could not load anime: {}", message),
    };

    let mut out = String::new();
    let _ = writeln!(out, "{}", anime.display_title());
    if anime.display_title() != anime.title {
        let _ = writeln!(out, "({})", anime.title);
    }
    let _ = writeln!(
        out,
        "⭐ Score: {}   🎬 Episodes: {}   🗓️ Year: {}",
        score(anime),
        anime.episodes.map(|e| e.to_string()).unwrap_or_else(|| "?".to_string()),
        anime.year.map(|y| y.to_string()).unwrap_or_else(|| "?".to_string()),
    );
    if !anime.genres.is_empty() {
        let names: Vec<&str> = anime.genres.iter().map(|g| g.name.as_str()).collect();
        let _ = writeln!(out, "Genres: {}", names.join(", "));
    }
    if let Some(image) = anime.large_image_url() {
        let _ = writeln!(out, "Image: {}", image);
    }
    if let Some(synopsis) = &anime.synopsis {
        let _ = writeln!(out, "\n{}", synopsis);
    }
    if let Some(trailer) = anime.trailer.as_ref().and_then(|t| t.url.as_deref().or(t.embed_url.as_deref())) {
        let _ = writeln!(out, "\nTrailer: {}", trailer);
    }
    out
}

pub fn membership(title: &str, state: Membership) -> String {
    match state {
        Membership::Present => format!("\"{}\" is on your watchlist", title),
        Membership::Absent => format!("\"{}\" is not on your watchlist", title),
        Membership::Unknown => format!("Watchlist status of \"{}\" is unknown", title),
    }
}

fn watchlist_entry(entry: &WatchlistEntry) -> String {
    format!(
        "{:>8}  {}  (added {})",
        entry.anime_id,
        entry.anime_title,
        entry.created_at.format("%Y-%m-%d")
    )
}

pub fn watchlist(view: &WatchlistView) -> String {
    match view {
        WatchlistView::SignedOut => "User not authenticated. Sign in to see your watchlist.".to_string(),
        WatchlistView::Failed(message) => format!("Failed to load watchlist: {}", message),
        WatchlistView::Loaded(entries) if entries.is_empty() => {
            "Your watchlist is empty.".to_string()
        }
        WatchlistView::Loaded(entries) => entries
            .iter()
            .map(watchlist_entry)
            .collect::<Vec<_>>()
            .join("\n"),
    }
}
