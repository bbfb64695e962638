//! AnimeHub CLI application.

use animehub::{App, BrowseOptions};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use shared::{Config, FeedFilters, LogConfig, SortKey};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Discover anime and keep a watchlist", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Browse the discovery feed interactively (default)
    Browse {
        /// Start with a title search
        #[arg(short, long)]
        query: Option<String>,

        /// Genre id filter (see `genres`)
        #[arg(short, long)]
        genre: Option<u32>,

        /// Year filter
        #[arg(short, long)]
        year: Option<i32>,

        /// score, popularity or episodes
        #[arg(short, long, default_value = "score")]
        sort: String,
    },

    /// List genre ids
    Genres,

    /// Show details for one anime
    Show { id: String },

    /// Sign in with email and password
    Login {
        email: String,
        /// Read from stdin when omitted
        #[arg(long)]
        password: Option<String>,
    },

    /// Create an account
    Signup {
        email: String,
        /// Read from stdin when omitted
        #[arg(long)]
        password: Option<String>,
    },

    /// Sign out and forget the stored session
    Logout,

    /// Show the signed-in user
    Whoami,

    /// List your watchlist
    Watchlist,

    /// Add or remove an anime on your watchlist
    Toggle { id: String },
}

async fn read_password() -> Result<String> {
    let mut stderr = tokio::io::stderr();
    stderr.write_all(b"Password: ").await?;
    stderr.flush().await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    match lines.next_line().await? {
        Some(line) => Ok(line.trim_end_matches(['\r', '\n']).to_string()),
        None => bail!("No password given"),
    }
}

async fn password_or_prompt(password: Option<String>) -> Result<String> {
    match password {
        Some(p) => Ok(p),
        None => read_password().await,
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = Config::from_file(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    // Initialize logging
    let mut log_config = LogConfig::from_settings(&config.logging, &config.log_dir(), "animehub");
    if args.verbose {
        log_config.default_level = tracing::Level::DEBUG;
        log_config.console = true;
    }
    shared::logging::init(log_config)?;

    info!("AnimeHub starting");
    info!(config_file = %args.config.display(), "Loaded configuration");

    let app = App::new(config)?;

    let command = args.command.unwrap_or(Command::Browse {
        query: None,
        genre: None,
        year: None,
        sort: SortKey::default().to_string(),
    });

    let result = match command {
        Command::Browse {
            query,
            genre,
            year,
            sort,
        } => {
            let options = BrowseOptions {
                filters: FeedFilters {
                    genre,
                    year,
                    sort: sort.parse()?,
                },
                query,
            };
            app.browse(options).await
        }
        Command::Genres => app.genres().await,
        Command::Show { id } => app.show(&id).await,
        Command::Login { email, password } => {
            let password = password_or_prompt(password).await?;
            app.login(&email, &password).await
        }
        Command::Signup { email, password } => {
            let password = password_or_prompt(password).await?;
            app.signup(&email, &password).await
        }
        Command::Logout => app.logout().await,
        Command::Whoami => app.whoami().await,
        Command::Watchlist => app.watchlist().await,
        Command::Toggle { id } => app.toggle(&id).await,
    };

    app.shutdown();
    info!("AnimeHub finished");
    result
}
