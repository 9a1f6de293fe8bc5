//! # Feedback Lens CLI (`fbl`)
//!
//! The `fbl` binary is the operator interface for Feedback Lens. It
//! provides commands for database initialization, feedback creation,
//! filtered listing, statistics, AI summarization, and starting the HTTP
//! API server.
//!
//! ## Usage
//!
//! ```bash
//! fbl --config ./config/fbl.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `fbl init` | Create the SQLite database and run schema migrations |
//! | `fbl add` | Create a feedback record (sentiment classified inline) |
//! | `fbl list` | List feedback with filters and pagination |
//! | `fbl get <id>` | Print a single record |
//! | `fbl reclassify <id>` | Re-run sentiment classification for a record |
//! | `fbl stats` | Print corpus-wide statistics |
//! | `fbl summarize` | Generate an AI summary over ids or a filter |
//! | `fbl serve api` | Start the HTTP API server |

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use feedback_lens::config;
use feedback_lens::feedback;
use feedback_lens::filter::FilterParams;
use feedback_lens::migrate;
use feedback_lens::query;
use feedback_lens::server;
use feedback_lens::stats;
use feedback_lens::summarize;

/// Feedback Lens CLI — browse, filter, and summarize customer feedback
/// with AI-assisted sentiment.
#[derive(Parser)]
#[command(
    name = "fbl",
    about = "Feedback Lens — explore and summarize customer feedback with AI-assisted sentiment",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/fbl.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and the feedback table with its
    /// indexes. This command is idempotent — running it multiple times is
    /// safe.
    Init,

    /// Create a feedback record.
    ///
    /// Sentiment is classified inline by the configured AI provider; if
    /// the provider fails or is disabled, the record is stored with the
    /// neutral fallback.
    Add {
        /// The feedback text.
        #[arg(long)]
        text: String,

        /// Feedback source: support_ticket, survey, or app_store.
        #[arg(long)]
        source: String,

        /// Optional metadata as a JSON object, passed through unexamined.
        #[arg(long)]
        metadata: Option<String>,
    },

    /// List feedback records, newest first.
    List {
        /// Case-insensitive substring match over the feedback text.
        #[arg(long)]
        search: Option<String>,

        /// Filter by source (support_ticket, survey, app_store).
        #[arg(long)]
        source: Option<String>,

        /// Filter by sentiment (positive, negative, neutral).
        #[arg(long)]
        sentiment: Option<String>,

        /// Only records created on or after this date (YYYY-MM-DD or RFC 3339).
        #[arg(long)]
        since: Option<String>,

        /// Only records created on or before this date (YYYY-MM-DD or RFC 3339).
        #[arg(long)]
        until: Option<String>,

        /// Page number (1-indexed).
        #[arg(long, default_value_t = 1)]
        page: i64,

        /// Items per page (clamped to the configured maximum).
        #[arg(long)]
        page_size: Option<i64>,
    },

    /// Print a single feedback record by id.
    Get {
        /// Record id.
        id: i64,
    },

    /// Re-run sentiment classification for a record and overwrite its label.
    Reclassify {
        /// Record id.
        id: i64,
    },

    /// Print corpus-wide statistics: totals, per-sentiment and per-source
    /// counts, and the recent-window count.
    Stats,

    /// Generate an AI summary over matching feedback.
    ///
    /// With `--ids`, the listed records are summarized and all filter
    /// flags are ignored. Otherwise the filter selects the batch, capped
    /// at the configured maximum.
    Summarize {
        /// Explicit record ids (comma-separated). Takes precedence over
        /// every filter flag.
        #[arg(long, value_delimiter = ',')]
        ids: Vec<i64>,

        /// Case-insensitive substring match over the feedback text.
        #[arg(long)]
        search: Option<String>,

        /// Filter by source (support_ticket, survey, app_store).
        #[arg(long)]
        source: Option<String>,

        /// Filter by sentiment (positive, negative, neutral).
        #[arg(long)]
        sentiment: Option<String>,

        /// Only records created on or after this date (YYYY-MM-DD or RFC 3339).
        #[arg(long)]
        since: Option<String>,

        /// Only records created on or before this date (YYYY-MM-DD or RFC 3339).
        #[arg(long)]
        until: Option<String>,
    },

    /// Start a server.
    Serve {
        #[command(subcommand)]
        service: ServeService,
    },
}

/// Server subcommands.
#[derive(Subcommand)]
enum ServeService {
    /// Start the HTTP API server on the configured bind address.
    Api,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Add {
            text,
            source,
            metadata,
        } => {
            feedback::run_add(&cfg, text, source, metadata).await?;
        }
        Commands::List {
            search,
            source,
            sentiment,
            since,
            until,
            page,
            page_size,
        } => {
            let params = FilterParams {
                search,
                source,
                sentiment,
                start_date: since,
                end_date: until,
            };
            query::run_list(&cfg, &params, page, page_size).await?;
        }
        Commands::Get { id } => {
            feedback::run_get(&cfg, id).await?;
        }
        Commands::Reclassify { id } => {
            feedback::run_reclassify(&cfg, id).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
        Commands::Summarize {
            ids,
            search,
            source,
            sentiment,
            since,
            until,
        } => {
            let params = FilterParams {
                search,
                source,
                sentiment,
                start_date: since,
                end_date: until,
            };
            summarize::run_summarize(&cfg, &params, ids).await?;
        }
        Commands::Serve { service } => match service {
            ServeService::Api => {
                server::run_server(&cfg).await?;
            }
        },
    }

    Ok(())
}
