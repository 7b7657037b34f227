//! skillsync - skill deploy and sync checker
//!
//! Usage:
//!   skillsync status            # Classify local, package and code state
//!   skillsync deploy [--force]  # Deploy when the gate allows it
//!   skillsync export            # Replace the local package with the remote one
//!   skillsync certifications    # List certification records

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use console::style;
use dialoguer::{Confirm, theme::ColorfulTheme};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use skillsync_core::build::RetryPolicy;
use skillsync_core::config::{Settings, SettingsStore};
use skillsync_core::deploy::{
    DeployOutcome, DeploymentSupervisor, ProjectLayout, ProjectStateStore, SyncReport,
};
use skillsync_core::fs::{TreeDigest, ZipPackager};
use skillsync_core::git::GitRepository;
use skillsync_core::remote::{HttpRemoteClient, collect_certifications};
use skillsync_core::sync::DeployDecision;
use skillsync_core::types::{SkillTarget, Stage};

const TOKEN_ENV: &str = "SKILLSYNC_TOKEN";

#[derive(Parser)]
#[command(name = "skillsync")]
#[command(about = "Skill deploy and sync checker", long_about = None)]
struct Cli {
    /// Project root (defaults to the current directory)
    #[arg(long, short = 'C', global = true)]
    project_dir: Option<PathBuf>,

    /// Log engine activity at debug level
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show sync state and what a deploy would do
    Status {
        #[command(flatten)]
        target: TargetArgs,

        /// Evaluate the gate as for a forced deploy
        #[arg(long, short)]
        force: bool,

        /// Output format
        #[arg(short = 'o', long, default_value = "table")]
        format: OutputFormat,
    },

    /// Deploy the skill
    Deploy {
        #[command(flatten)]
        target: TargetArgs,

        /// Ignore stale local and package state
        #[arg(long, short)]
        force: bool,

        /// Skip the confirmation prompt of a forced deploy
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Replace the local skill package with the remote one
    Export {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// List certification records of the skill
    Certifications {
        #[command(flatten)]
        target: TargetArgs,

        /// Output format
        #[arg(short = 'o', long, default_value = "table")]
        format: OutputFormat,
    },
}

#[derive(Args)]
struct TargetArgs {
    /// Profile (defaults to [project] profile)
    #[arg(long, short)]
    profile: Option<String>,

    /// Skill id (defaults to the one recorded for the profile)
    #[arg(long)]
    skill_id: Option<String>,

    /// Stage (development, certification, live)
    #[arg(long)]
    stage: Option<Stage>,

    /// Use the package digest flow even inside a git work tree
    #[arg(long)]
    no_vcs: bool,
}

#[derive(Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// Machine-readable JSON
    Json,
}

/// Everything a command needs, resolved from settings and arguments.
struct Session {
    settings: Settings,
    layout: ProjectLayout,
    state: ProjectStateStore,
    target: SkillTarget,
    client: HttpRemoteClient,
    repo: Option<GitRepository>,
}

impl Session {
    fn open(project_dir: Option<PathBuf>, args: &TargetArgs) -> Result<Self> {
        let store = match project_dir {
            Some(dir) => SettingsStore::from_project_root(dir),
            None => SettingsStore::from_current_dir()?,
        };
        let settings = store.load()?;
        let root = store.project_root().to_path_buf();
        let layout = ProjectLayout::new(&root, &settings.project);
        let state = ProjectStateStore::for_project(&root);

        let profile = args
            .profile
            .clone()
            .unwrap_or_else(|| settings.project.profile.clone());
        let skill_id = match &args.skill_id {
            Some(id) => id.clone(),
            None => state
                .load()?
                .profiles
                .get(&profile)
                .map(|p| p.skill_id.clone())
                .with_context(|| {
                    format!("No skill id recorded for profile '{}'; pass --skill-id", profile)
                })?,
        };
        let stage = args.stage.unwrap_or(settings.project.stage);
        let target = SkillTarget::new(profile, skill_id, stage);

        let endpoint = settings
            .remote
            .endpoint
            .as_deref()
            .context("No remote endpoint configured; set [remote] endpoint in skillsync.toml")?;
        let token = std::env::var(TOKEN_ENV)
            .with_context(|| format!("{} is not set", TOKEN_ENV))?;
        let client = HttpRemoteClient::new(endpoint, token)?;

        let repo = if args.no_vcs {
            None
        } else {
            match GitRepository::open(&root) {
                Ok(repo) => Some(repo),
                Err(err) => {
                    tracing::debug!(error = %err, "no git repository, using package digest flow");
                    None
                }
            }
        };

        Ok(Self {
            settings,
            layout,
            state,
            target,
            client,
            repo,
        })
    }

    fn supervisor(&self, cancel: CancellationToken) -> DeploymentSupervisor<'_> {
        let supervisor = DeploymentSupervisor::new(
            &self.client,
            &TreeDigest,
            &ZipPackager,
            self.state.clone(),
            self.layout.clone(),
        )
        .with_policy(RetryPolicy::from(&self.settings.poller))
        .with_cancel_token(cancel);

        match &self.repo {
            Some(repo) => supervisor.with_repository(repo, self.settings.git.clone()),
            None => supervisor,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("{}", style("Interrupted, cancelling...").yellow());
            on_interrupt.cancel();
        }
    });

    run(cli, cancel).await
}

async fn run(cli: Cli, cancel: CancellationToken) -> Result<()> {
    match cli.command {
        Commands::Status {
            target,
            force,
            format,
        } => {
            let session = Session::open(cli.project_dir, &target)?;
            let report = session.supervisor(cancel).check(&session.target, force).await?;
            match format {
                OutputFormat::Table => print_report(&session.target, &report),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
            }
        }
        Commands::Deploy { target, force, yes } => {
            let session = Session::open(cli.project_dir, &target)?;
            if force && !yes && !confirm_forced(&session.target)? {
                println!("Deploy cancelled.");
                return Ok(());
            }
            run_deploy(&session, force, cancel).await?;
        }
        Commands::Export { target } => {
            let session = Session::open(cli.project_dir, &target)?;
            let outcome = session.supervisor(cancel).export(&session.target).await?;
            println!(
                "{} Exported {} into {}",
                style("✓").green(),
                session.target.skill_id,
                session.layout.package_dir.display()
            );
            if let Some(e_tag) = &outcome.markers.remote_etag {
                println!("  eTag: {}", e_tag);
            }
        }
        Commands::Certifications { target, format } => {
            let session = Session::open(cli.project_dir, &target)?;
            let items = collect_certifications(&session.client, &session.target.skill_id).await?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&items)?),
                OutputFormat::Table => {
                    if items.is_empty() {
                        println!("No certifications found.");
                    }
                    for item in &items {
                        println!(
                            "{:<40} {:<20} {}",
                            item.id,
                            item.status,
                            item.skill_submission_timestamp.as_deref().unwrap_or("-")
                        );
                    }
                }
            }
        }
    }
    Ok(())
}

async fn run_deploy(session: &Session, force: bool, cancel: CancellationToken) -> Result<()> {
    let outcome = session
        .supervisor(cancel)
        .deploy(&session.target, force)
        .await;

    match outcome {
        Ok(DeployOutcome::Rejected { reason, .. }) => {
            eprintln!("{} {}", style("✗").red(), reason);
            std::process::exit(1);
        }
        Ok(DeployOutcome::Deployed {
            mechanism, markers, ..
        }) => {
            println!(
                "{} Deployed {} to {} via {}",
                style("✓").green(),
                session.target.skill_id,
                session.target.stage,
                mechanism
            );
            if let Some(e_tag) = &markers.remote_etag {
                println!("  eTag: {}", e_tag);
            }
            Ok(())
        }
        Err(err) if err.is_cancelled() => {
            eprintln!("{} Deploy cancelled; nothing was recorded.", style("!").yellow());
            std::process::exit(130);
        }
        Err(err) => Err(err.into()),
    }
}

fn confirm_forced(target: &SkillTarget) -> Result<bool> {
    let confirmed = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(format!(
            "Force deploy {} to {}? Remote changes may be overwritten.",
            target.skill_id, target.stage
        ))
        .default(false)
        .interact()?;
    Ok(confirmed)
}

fn mark(valid: bool) -> console::StyledObject<&'static str> {
    if valid {
        style("✓").green()
    } else {
        style("✗").red()
    }
}

fn print_report(target: &SkillTarget, report: &SyncReport) {
    println!(
        "{} ({}, profile {})",
        style(&target.skill_id).bold(),
        target.stage,
        target.profile
    );
    println!("  {} local:   {}", mark(report.local.is_valid()), report.local);
    println!("  {} package: {}", mark(report.package.is_valid()), report.package);
    if let Some(code) = &report.code {
        println!("  {} code:    {}", mark(code.is_valid()), code);
    }
    match &report.decision {
        DeployDecision::Proceed { mechanism } => {
            println!("{} deploy would {}", style("→").green(), mechanism)
        }
        DeployDecision::Reject { reason } => {
            println!("{} deploy blocked: {}", style("→").red(), reason)
        }
    }
}
