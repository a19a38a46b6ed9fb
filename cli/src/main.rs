//! votechain: command-line election client.

mod render;

use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use votechain_election::{ClientConfig, ElectionClient};
use votechain_orchestrator::{abandon_pair, AbandonSignal};
use votechain_registry::ImageUpload;
use votechain_types::{CandidateId, Timestamp};
use votechain_utils::LogFormat;

#[derive(Parser)]
#[command(name = "votechain", about = "Role-gated election client")]
struct Cli {
    /// Election backend base URL.
    #[arg(long, env = "VOTECHAIN_BACKEND_URL")]
    backend_url: Option<String>,

    /// Wallet JSON-RPC endpoint used to sign transactions.
    #[arg(long, env = "VOTECHAIN_SIGNER_URL")]
    signer_url: Option<String>,

    /// Content store base URL for candidate images.
    #[arg(long, env = "VOTECHAIN_CONTENT_STORE_URL")]
    content_store_url: Option<String>,

    /// Identity (0x-prefixed address) to act as.
    #[arg(long, env = "VOTECHAIN_IDENTITY")]
    identity: Option<String>,

    /// Seconds to wait for a receipt after broadcast.
    #[arg(long, env = "VOTECHAIN_CONFIRMATION_TIMEOUT")]
    confirmation_timeout: Option<u64>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "VOTECHAIN_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "VOTECHAIN_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Print read results as JSON.
    #[arg(long)]
    json: bool,

    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "VOTECHAIN_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Show the connected identity's role.
    Role,
    /// Show the voting period and its phase.
    Period,
    /// List candidates.
    Candidates,
    /// List registered voters.
    Voters,
    /// Show vote totals and shares.
    Tally,
    /// Show role, period and candidates together.
    Snapshot,
    /// Register the identity as a voter.
    Register,
    /// Remove a voter from the voter roll (admin).
    RemoveVoter { address: String },
    /// Grant the admin role (contract owner).
    AddAdmin { address: String },
    /// Revoke the admin role (contract owner).
    RemoveAdmin { address: String },
    /// Add a candidate (admin).
    AddCandidate {
        name: String,
        /// Image file to upload to the content store first.
        #[arg(long)]
        image: Option<PathBuf>,
    },
    /// Remove a candidate (admin).
    RemoveCandidate { id: CandidateId },
    /// Schedule the voting window, in Unix seconds (admin).
    SetPeriod {
        #[arg(long)]
        start: u64,
        #[arg(long)]
        end: u64,
    },
    /// End the active voting period now (admin).
    StopPeriod,
    /// Cast a vote for a candidate.
    Vote { candidate: CandidateId },
    /// Declare the winner, stopping an active period first (admin).
    Winner,
    /// Follow the voting period and countdown until Ctrl-C.
    Watch,
}

/// File config as the base, CLI flags and env vars on top.
fn resolve_config(cli: &Cli) -> anyhow::Result<ClientConfig> {
    let base = match &cli.config {
        Some(path) => ClientConfig::from_toml_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => ClientConfig::default(),
    };
    let config = ClientConfig {
        backend_url: cli.backend_url.clone().unwrap_or(base.backend_url),
        signer_url: cli.signer_url.clone().unwrap_or(base.signer_url),
        content_store_url: cli.content_store_url.clone().unwrap_or(base.content_store_url),
        identity: cli.identity.clone().or(base.identity),
        confirmation_timeout_secs: cli
            .confirmation_timeout
            .unwrap_or(base.confirmation_timeout_secs),
        log_level: cli.log_level.clone().unwrap_or(base.log_level),
        log_format: cli.log_format.unwrap_or(base.log_format),
        ..base
    };
    config.validate()?;
    Ok(config)
}

fn read_image(path: &Path) -> anyhow::Result<ImageUpload> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase());
    let content_type = match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    };
    Ok(ImageUpload::new(file_name, content_type, bytes))
}

/// An abandon signal that fires on Ctrl-C.
fn ctrl_c_abandons() -> AbandonSignal {
    let (handle, signal) = abandon_pair();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("received SIGINT, abandoning signature request");
            handle.abandon();
        }
    });
    signal
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    votechain_utils::init_logging(config.log_format, &config.log_level);
    tracing::debug!(backend = %config.backend_url, signer = %config.signer_url, "configuration resolved");

    let client = ElectionClient::from_config(&config)?;
    client.events().subscribe(Box::new(render::event));

    match cli.command {
        Command::Role => {
            let role = client.refresh_role().await?;
            if cli.json {
                render::json(&role)?;
            } else {
                println!("{role}");
            }
        }
        Command::Period => {
            let view = client.period().await?;
            if cli.json {
                render::json(&view)?;
            } else {
                render::period(&view);
            }
        }
        Command::Candidates => {
            let list = client.candidates().await?;
            if cli.json {
                render::json(&list)?;
            } else {
                render::candidates(&list);
            }
        }
        Command::Voters => {
            let list = client.voters().await?;
            if cli.json {
                render::json(&list)?;
            } else {
                let counts = client.counts().await?;
                println!("{} registered voters", counts.voters);
                render::voters(&list);
            }
        }
        Command::Tally => {
            let tally = client.tally().await?;
            if cli.json {
                render::json(&tally)?;
            } else {
                render::tally(&tally);
            }
        }
        Command::Snapshot => {
            let snapshot = client.snapshot().await?;
            if cli.json {
                render::json(&snapshot)?;
            } else {
                match (&snapshot.identity, snapshot.role) {
                    (Some(identity), Some(role)) => println!("{identity}: {role}"),
                    _ => println!("no identity connected"),
                }
                render::period(&snapshot.period);
                render::candidates(&snapshot.candidates);
            }
        }
        Command::Register => {
            let outcome = client.register_voter(ctrl_c_abandons()).await?;
            render::outcome("register", &outcome);
        }
        Command::RemoveVoter { address } => {
            let outcome = client.remove_voter(&address, ctrl_c_abandons()).await?;
            render::outcome("remove voter", &outcome);
        }
        Command::AddAdmin { address } => {
            let outcome = client.add_admin(&address, ctrl_c_abandons()).await?;
            render::outcome("add admin", &outcome);
        }
        Command::RemoveAdmin { address } => {
            let outcome = client.remove_admin(&address, ctrl_c_abandons()).await?;
            render::outcome("remove admin", &outcome);
        }
        Command::AddCandidate { name, image } => {
            let image = image.as_deref().map(read_image).transpose()?;
            let outcome = client.add_candidate(&name, image, ctrl_c_abandons()).await?;
            render::outcome("add candidate", &outcome);
            if let Some(list) = outcome.state() {
                render::candidates(list);
            }
        }
        Command::RemoveCandidate { id } => {
            let outcome = client.remove_candidate(id, ctrl_c_abandons()).await?;
            render::outcome("remove candidate", &outcome);
        }
        Command::SetPeriod { start, end } => {
            let outcome = client
                .set_voting_period(Timestamp::new(start), Timestamp::new(end), ctrl_c_abandons())
                .await?;
            render::outcome("set period", &outcome);
            if let Some(view) = outcome.state() {
                render::period(view);
            }
        }
        Command::StopPeriod => {
            let outcome = client.stop_voting_period(ctrl_c_abandons()).await?;
            render::outcome("stop period", &outcome);
        }
        Command::Vote { candidate } => {
            let outcome = client.cast_vote(candidate, ctrl_c_abandons()).await?;
            render::outcome("vote", &outcome);
        }
        Command::Winner => {
            let outcome = client.declare_winner(ctrl_c_abandons()).await?;
            if let Some(stopped) = &outcome.stopped {
                render::outcome("stop period", stopped);
            }
            let votes = outcome
                .winner
                .vote_count
                .map(|v| format!(" with {v} votes"))
                .unwrap_or_default();
            println!("winner: {}{votes}", outcome.winner.name);
        }
        Command::Watch => {
            let watch = client.watch_period(config.period_refresh(), config.countdown_tick());
            let mut views = watch.views();
            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("received SIGINT, stopping watch");
                        break;
                    }
                    changed = views.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let latest = *views.borrow_and_update();
                        if let Some(view) = latest {
                            render::period(&view);
                        }
                    }
                }
            }
            watch.stop().await;
        }
    }

    Ok(())
}
