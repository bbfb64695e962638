//! Wiring between configuration, the service clients and the views.
//!
//! Each CLI subcommand maps to one screen of the app: discovery (browse),
//! detail, login, signup and watchlist.

use anyhow::{anyhow, bail, Context, Result};
use jikan_client::JikanClient;
use shared::{Anime, Config, FeedFilters, SortKey};
use supabase_client::{
    AuthClient, SessionFile, SessionProvider, SignUp, WatchlistClient, WatchlistStore,
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

use crate::detail::DetailView;
use crate::discovery::{Completion, DiscoveryView};
use crate::render;
use crate::toggle::{Membership, ToggleError, WatchlistToggle};
use crate::watchlist_view::WatchlistView;

/// Auth and storage clients, present when the backend is configured
struct Backend {
    auth: AuthClient,
    store: WatchlistClient,
    session_file: SessionFile,
}

pub struct App {
    config: Config,
    jikan: JikanClient,
    backend: Option<Backend>,
    sessions: Option<SessionProvider>,
}

/// Initial browse state from the command line
#[derive(Debug, Clone, Default)]
pub struct BrowseOptions {
    pub filters: FeedFilters,
    pub query: Option<String>,
}

const BROWSE_HELP: &str = "\
Commands:
  more | <enter>        load the next page
  search <term>         search by title
  genre <id|all>        filter by genre
  year <yyyy|all>       filter by year
  sort <score|popularity|episodes>
  reset                 clear search and filters
  genres                list genre ids
  show <n>              details of item n
  save <n>              add/remove item n on your watchlist
  watchlist             show your watchlist
  help | quit";

impl App {
    /// Build clients from `config` and restore any stored session
    pub fn new(config: Config) -> Result<Self> {
        let jikan = JikanClient::from_config(&config.jikan).context("Failed to create Jikan client")?;

        let backend = if config.supabase_configured() {
            let auth = AuthClient::from_config(&config.supabase)
                .context("Failed to create auth client")?;
            let store = WatchlistClient::from_config(&config.supabase)
                .context("Failed to create watchlist client")?;
            let session_file = SessionFile::new(config.session_path());

            let stored = session_file.load().unwrap_or_else(|e| {
                warn!(error = %e, "Ignoring unreadable session file");
                None
            });
            if auth.restore(stored).is_none() {
                session_file.clear()?;
            }
            Some(Backend {
                auth,
                store,
                session_file,
            })
        } else {
            debug!("Supabase not configured; watchlist features disabled");
            None
        };

        let sessions = backend.as_ref().map(|b| b.auth.subscribe());

        Ok(Self {
            config,
            jikan,
            backend,
            sessions,
        })
    }

    fn backend(&self) -> Result<&Backend> {
        self.backend.as_ref().ok_or_else(|| {
            anyhow!(
                "Accounts are not configured. Set [supabase] url and anon_key in the config file \
                 or the {} / {} environment variables.",
                shared::config::SUPABASE_URL_ENV,
                shared::config::SUPABASE_KEY_ENV
            )
        })
    }

    fn sessions(&self) -> Result<&SessionProvider> {
        self.backend()?;
        self.sessions
            .as_ref()
            .ok_or_else(|| anyhow!("Session provider is not mounted"))
    }

    /// Tear down the session subscription
    pub fn shutdown(self) {
        if let Some(sessions) = self.sessions {
            sessions.unmount();
        }
    }

    /// Detail page text, with watchlist membership when signed in
    async fn detail_page(&self, id: &str) -> String {
        let view = DetailView::load(&self.jikan, id).await;
        let mut page = render::detail(&view);

        if let (DetailView::Loaded(anime), Ok(backend), Ok(sessions)) =
            (&view, self.backend(), self.sessions())
        {
            if let Some(note) = membership_note(anime, &backend.store, sessions).await {
                page.push('\n');
                page.push_str(&note);
            }
        }
        page
    }

    pub async fn show(&self, id: &str) -> Result<()> {
        println!("{}", self.detail_page(id).await);
        Ok(())
    }

    pub async fn genres(&self) -> Result<()> {
        let genres = self.jikan.fetch_genres().await.context("Failed to load genres")?;
        println!("{}", render::genres(&genres));
        Ok(())
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<()> {
        let backend = self.backend()?;
        let session = backend.auth.sign_in(email, password).await?;
        backend.session_file.save(&session)?;
        println!(
            "Signed in as {}",
            session.user.email.as_deref().unwrap_or(&session.user.id)
        );
        Ok(())
    }

    pub async fn signup(&self, email: &str, password: &str) -> Result<()> {
        let backend = self.backend()?;
        match backend.auth.sign_up(email, password).await? {
            SignUp::SignedIn(session) => {
                backend.session_file.save(&session)?;
                println!("Account created, signed in as {}", email.trim());
            }
            SignUp::ConfirmationRequired(_) => {
                println!("Account created. Confirm your email address, then sign in.");
            }
        }
        Ok(())
    }

    pub async fn logout(&self) -> Result<()> {
        let backend = self.backend()?;
        let result = backend.auth.sign_out().await;
        backend.session_file.clear()?;
        if let Err(e) = result {
            warn!(error = %e, "Remote sign-out failed");
        }
        println!("Signed out");
        Ok(())
    }

    pub async fn whoami(&self) -> Result<()> {
        let backend = self.backend()?;
        let Some(session) = self.sessions()?.session() else {
            println!("Not signed in");
            return Ok(());
        };
        let user = backend.auth.user(&session).await?;
        println!("{} ({})", user.email.as_deref().unwrap_or("no email"), user.id);
        Ok(())
    }

    pub async fn watchlist(&self) -> Result<()> {
        let backend = self.backend()?;
        let view = WatchlistView::load(&backend.store, self.sessions()?).await;
        println!("{}", render::watchlist(&view));
        Ok(())
    }

    pub async fn toggle(&self, id: &str) -> Result<()> {
        let backend = self.backend()?;
        let sessions = self.sessions()?;
        if !sessions.is_authenticated() {
            bail!(ToggleError::SignInRequired);
        }

        let anime = match DetailView::load(&self.jikan, id).await {
            DetailView::Loaded(anime) => anime,
            other => bail!(render::detail(&other)),
        };
        let mut toggle = WatchlistToggle::for_anime(&anime);
        let state = toggle.toggle(&backend.store, sessions).await?;
        println!("{}", render::membership(toggle.title(), state));
        Ok(())
    }

    async fn save_item(&self, anime: &Anime) -> String {
        let (Ok(backend), Ok(sessions)) = (self.backend(), self.sessions()) else {
            return ToggleError::SignInRequired.to_string();
        };
        let mut toggle = WatchlistToggle::for_anime(anime);
        match toggle.toggle(&backend.store, sessions).await {
            Ok(state) => render::membership(toggle.title(), state),
            Err(e) => e.to_string(),
        }
    }

    /// Interactive discovery feed
    pub async fn browse(&self, options: BrowseOptions) -> Result<()> {
        let mut view = DiscoveryView::new(self.jikan.clone(), self.config.jikan.page_size);
        let mut stdout = tokio::io::stdout();

        view.initial_load_with(options.filters, options.query.as_deref())
            .await;
        if let Some(error) = view.genre_error() {
            println!("Genres unavailable: {}", error);
        }
        println!("{}", render::feed(view.state()));
        println!("Type 'help' for commands.");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            stdout.write_all(b"> ").await?;
            stdout.flush().await?;

            let Some(line) = lines.next_line().await? else {
                break;
            };
            let line = line.trim();
            let (command, arg) = line
                .split_once(char::is_whitespace)
                .map(|(c, a)| (c, a.trim()))
                .unwrap_or((line, ""));
            debug!(command = command, arg = arg, "Browse command");

            match command {
                "" | "more" | "n" => {
                    let shown = view.state().items().len();
                    match view.last_item_visible().await {
                        Some(Completion::Appended) => {
                            for (i, anime) in view.state().items().iter().enumerate().skip(shown) {
                                println!("{}", render::card(i + 1, anime));
                            }
                            if !view.state().has_more() {
                                println!("  (end of results)");
                            }
                        }
                        Some(_) => println!("{}", render::feed(view.state())),
                        None => println!("No more results."),
                    }
                }
                "search" => match view.submit_search(arg).await {
                    Some(_) => println!("{}", render::feed(view.state())),
                    None => println!("Enter a search term."),
                },
                "genre" | "year" | "sort" => match parse_filter(view.state().filters(), command, arg) {
                    Ok(filters) => {
                        view.apply_filters(filters).await;
                        println!("{}", render::feed(view.state()));
                    }
                    Err(e) => println!("{}", e),
                },
                "reset" => {
                    view.reset().await;
                    println!("{}", render::feed(view.state()));
                }
                "genres" => {
                    if view.genres().is_empty() {
                        println!("No genres loaded.");
                    } else {
                        println!("{}", render::genres(view.genres()));
                    }
                }
                "show" | "save" => {
                    let item = arg
                        .parse::<usize>()
                        .ok()
                        .and_then(|n| n.checked_sub(1))
                        .and_then(|i| view.state().items().get(i));
                    match (command, item) {
                        (_, None) => println!("No item {} in the list.", arg),
                        ("show", Some(anime)) => {
                            println!("{}", self.detail_page(&anime.mal_id.to_string()).await);
                        }
                        (_, Some(anime)) => println!("{}", self.save_item(anime).await),
                    }
                }
                "watchlist" => match self.watchlist().await {
                    Ok(()) => {}
                    Err(e) => println!("{}", e),
                },
                "help" | "?" => println!("{}", BROWSE_HELP),
                "quit" | "q" | "exit" => break,
                other => println!("Unknown command '{}'. Type 'help' for commands.", other),
            }
        }

        info!("Browse session ended");
        Ok(())
    }
}

/// Watchlist line for a detail page; `None` when signed out
async fn membership_note<W: WatchlistStore>(
    anime: &Anime,
    store: &W,
    sessions: &SessionProvider,
) -> Option<String> {
    let mut toggle = WatchlistToggle::for_anime(anime);
    match toggle.resolve(store, sessions).await {
        Ok(Membership::Unknown) => None,
        Ok(state) => Some(render::membership(toggle.title(), state)),
        Err(e) => Some(e.to_string()),
    }
}

/// Apply one `genre`/`year`/`sort` command to the current filters
fn parse_filter(mut filters: FeedFilters, command: &str, arg: &str) -> Result<FeedFilters> {
    let clear = arg.is_empty() || arg.eq_ignore_ascii_case("all");
    match command {
        "genre" => {
            filters.genre = if clear {
                None
            } else {
                Some(arg.parse().with_context(|| format!("Invalid genre id: {}", arg))?)
            };
        }
        "year" => {
            filters.year = if clear {
                None
            } else {
                Some(arg.parse().with_context(|| format!("Invalid year: {}", arg))?)
            };
        }
        "sort" => {
            filters.sort = if clear {
                SortKey::default()
            } else {
                arg.parse()?
            };
        }
        other => bail!("Unknown filter: {}", other),
    }
    Ok(filters)
}
