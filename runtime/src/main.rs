// Copyright 2026 Katsini Contributors
// SPDX-License-Identifier: Apache-2.0

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use katsini_runtime::cli;
use katsini_runtime::cli::lookup::Target;
use katsini_runtime::providers::app_store::AppStoreQuery;
use katsini_runtime::providers::play_store::PlayStoreQuery;
use katsini_runtime::Config;
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Parser)]
#[command(
    name = "katsini",
    about = "Katsini: app metadata from Google Play, the App Store and Huawei AppGallery",
    version,
    after_help = "Run 'katsini <command> --help' for details on each command.\nRun 'katsini' with no command to start the HTTP service."
)]
struct Cli {
    /// Log level when RUST_LOG is unset
    #[arg(long, global = true, default_value = "katsini=info,katsini_runtime=info")]
    log_level: String,

    /// Per-call deadline in seconds (overrides KATSINI_TIMEOUT_SECS)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve lookups over HTTP
    Serve {
        /// Address to bind
        #[arg(long, default_value = cli::serve::DEFAULT_ADDR)]
        addr: SocketAddr,
    },
    /// Look up a single app and print it as JSON
    Lookup {
        #[command(subcommand)]
        store: LookupStore,
    },
    /// Check environment and diagnose issues
    Doctor,
    /// Generate shell completion scripts
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum LookupStore {
    /// Google Play, by package name
    Playstore {
        bundle_id: String,
        #[arg(long)]
        lang: Option<String>,
        #[arg(long)]
        country: Option<String>,
    },
    /// Apple App Store, by track id or bundle id
    Appstore {
        #[arg(long)]
        app_id: Option<String>,
        #[arg(long)]
        bundle_id: Option<String>,
        #[arg(long)]
        country: Option<String>,
    },
    /// Huawei AppGallery, by numeric app id
    Appgallery { app_id: String },
}

impl From<LookupStore> for Target {
    fn from(store: LookupStore) -> Self {
        match store {
            LookupStore::Playstore {
                bundle_id,
                lang,
                country,
            } => Target::PlayStore(PlayStoreQuery {
                bundle_id,
                lang,
                country,
            }),
            LookupStore::Appstore {
                app_id,
                bundle_id,
                country,
            } => Target::AppStore(AppStoreQuery {
                app_id,
                bundle_id,
                country,
            }),
            LookupStore::Appgallery { app_id } => Target::AppGallery(app_id),
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::from_env();
    if let Some(secs) = cli.timeout.filter(|s| *s > 0) {
        config = config.with_deadline(Duration::from_secs(secs));
    }

    match cli.command {
        None => {
            let addr = cli::serve::DEFAULT_ADDR
                .parse()
                .context("invalid default address")?;
            cli::serve::run(addr, config).await
        }
        Some(Commands::Serve { addr }) => cli::serve::run(addr, config).await,
        Some(Commands::Lookup { store }) => cli::lookup::run(store.into(), config).await,
        Some(Commands::Doctor) => cli::doctor::run(config).await,
        Some(Commands::Completions { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "katsini", &mut std::io::stdout());
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Consistent exit codes: 0=success, 1=error
    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
