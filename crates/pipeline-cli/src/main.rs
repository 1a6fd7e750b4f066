mod client;
mod cmd;
mod output;
mod root;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use cmd::config::ConfigSubcommand;
use pipeline_core::types::Taxonomy;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "pipeline",
    about = "Opportunity pipeline boards: move deals between stages, track what is due",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .pipeline/)
    #[arg(long, global = true, env = "PIPELINE_ROOT")]
    root: Option<PathBuf>,

    /// Talk to a running `pipeline serve` instead of the local store
    #[arg(long, global = true, env = "PIPELINE_SERVER")]
    server: Option<String>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a pipeline project in the current directory
    Init,

    /// Show a board: one column per stage with totals
    Board {
        /// primary or forecast
        #[arg(default_value = "primary")]
        board: Taxonomy,
    },

    /// Move an opportunity to another stage
    Move {
        /// Opportunity id
        id: String,
        /// Target stage id (or card id with --card)
        target: String,
        /// Board to move on: primary or forecast
        #[arg(long, short = 'b', default_value = "primary")]
        board: Taxonomy,
        /// Treat TARGET as another card; the move lands in that card's stage
        #[arg(long)]
        card: bool,
    },

    /// List pending activities with their urgency
    Agenda {
        /// Group by due day instead of listing
        #[arg(long)]
        calendar: bool,
        /// First calendar day (default: today)
        #[arg(long, requires = "calendar")]
        from: Option<NaiveDate>,
        /// Last calendar day (default: 30 days after --from)
        #[arg(long, requires = "calendar")]
        to: Option<NaiveDate>,
    },

    /// Show overdue and urgent activities
    Bell {
        /// Mark everything currently shown as read (needs --server)
        #[arg(long)]
        mark_read: bool,
    },

    /// Inspect and validate configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },

    /// Run the HTTP server
    Serve {
        /// Port to listen on (default: server.port from config)
        #[arg(long, short = 'p')]
        port: Option<u16>,
        /// Open a browser on the primary board
        #[arg(long)]
        open: bool,
    },

    /// Follow a server's board and reprint it on every external change
    Watch {
        #[arg(default_value = "primary")]
        board: Taxonomy,
        /// Exit after this many refreshes
        #[arg(long)]
        max_updates: Option<usize>,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Serve { .. } | Commands::Watch { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());
    let server = cli.server.as_deref();

    let result = match cli.command {
        Commands::Init => cmd::init::run(&root),
        Commands::Board { board } => cmd::board::run(&root, server, board, cli.json),
        Commands::Move {
            id,
            target,
            board,
            card,
        } => cmd::mv::run(
            &root,
            server,
            cmd::mv::MoveArgs {
                id: &id,
                target: &target,
                taxonomy: board,
                onto_card: card,
            },
            cli.json,
        ),
        Commands::Agenda { calendar, from, to } => cmd::agenda::run(
            &root,
            server,
            cmd::agenda::AgendaArgs { calendar, from, to },
            cli.json,
        ),
        Commands::Bell { mark_read } => cmd::bell::run(&root, server, mark_read, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
        Commands::Serve { port, open } => cmd::serve::run(&root, port, open),
        Commands::Watch { board, max_updates } => match server {
            Some(url) => cmd::watch::run(&root, url, board, max_updates),
            None => Err(anyhow::anyhow!("watch needs --server <URL>")),
        },
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
