//! Modpacker CLI - a Minecraft mod manager with dependency-aware installs.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

use mp_core::ReleaseChannel;

mod commands;
mod display;

use commands::Env;

#[derive(Parser)]
#[command(name = "mp")]
#[command(about = "Modpacker - a Minecraft mod manager with dependency-aware installs")]
#[command(version)]
struct Cli {
    /// Path to the profile metadata file
    #[arg(long, default_value = "modpack.json")]
    pack: PathBuf,

    /// Directory managed mod files are stored in
    #[arg(long, default_value = "mods")]
    mods_dir: PathBuf,

    /// Catalog API endpoint
    #[arg(long, default_value = mp_io::DEFAULT_BASE_URL)]
    api_url: String,

    /// Path to the stored session token (defaults to token.json next to
    /// the profile file)
    #[arg(long)]
    token_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Minimal acceptable release channel for file selection.
#[derive(Clone, Copy, ValueEnum)]
enum ChannelArg {
    Alpha,
    Beta,
    Release,
}

impl From<ChannelArg> for ReleaseChannel {
    fn from(arg: ChannelArg) -> Self {
        match arg {
            ChannelArg::Alpha => ReleaseChannel::Alpha,
            ChannelArg::Beta => ReleaseChannel::Beta,
            ChannelArg::Release => ReleaseChannel::Release,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create and initialize a new mod profile
    New {
        /// Game version the profile is for
        #[arg(long, short = 'v')]
        game_version: String,
    },

    /// Install a mod and its dependencies
    Install {
        /// Mod slug or name to install
        mod_name: String,

        /// Install an exact file id instead of the preferred one
        #[arg(long)]
        file: Option<u64>,

        /// Minimal acceptable release channel
        #[arg(long, value_enum, default_value = "release")]
        release: ChannelArg,
    },

    /// Upgrade one mod, or every directly installed mod
    Upgrade {
        /// Mod to upgrade (omit or pass "all" to upgrade everything)
        mod_name: Option<String>,

        /// Minimal acceptable release channel
        #[arg(long, value_enum, default_value = "release")]
        release: ChannelArg,
    },

    /// Remove a mod (and any dependencies it leaves orphaned)
    Remove {
        /// Mod slug or id to remove
        mod_name: String,

        /// Remove even if other mods still depend on it
        #[arg(long, short = 'f')]
        force: bool,
    },

    /// List installed mods
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Search the catalog for mods
    Search {
        /// Search query (use /regex/ for regex search)
        query: String,
    },

    /// Authenticate against the catalog proxy and store the session token
    Auth {
        /// User name or email
        #[arg(long, short = 'u')]
        user: String,

        /// Password
        #[arg(long, short = 'p')]
        password: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let env = Env::new(
        cli.pack.clone(),
        cli.mods_dir.clone(),
        cli.api_url.clone(),
        cli.token_file.clone(),
    );

    let result = match cli.command {
        Commands::New { game_version } => commands::new::run(&env, &game_version),
        Commands::Install {
            mod_name,
            file,
            release,
        } => commands::install::run(&env, &mod_name, file, release.into()).await,
        Commands::Upgrade { mod_name, release } => {
            commands::upgrade::run(&env, mod_name.as_deref(), release.into()).await
        }
        Commands::Remove { mod_name, force } => commands::remove::run(&env, &mod_name, force).await,
        Commands::List { json } => commands::list::run(&env, json),
        Commands::Search { query } => commands::search::run(&env, &query).await,
        Commands::Auth { user, password } => commands::auth::run(&env, &user, &password).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            display::print_error(&e);
            ExitCode::FAILURE
        }
    }
}
