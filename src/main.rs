//! glmr - GitLab merge request CLI

mod cli;

use anstream::eprintln;
use clap::{Args, Parser, Subcommand};
use cli::style::Stylize;
use glmr::config::parse_duration;
use glmr::error::Result;
use glmr::types::{ListQuery, MrRef, NewMergeRequest};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "glmr")]
#[command(about = "Drive GitLab merge requests through rebase and merge")]
#[command(version)]
struct Cli {
    /// Path to config file (default: <config dir>/glmr/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Work with merge requests
    #[command(subcommand)]
    Mr(MrCommand),
}

#[derive(Subcommand)]
enum MrCommand {
    /// Merge an MR, waiting for CI and rebasing on demand
    Merge(MergeArgs),

    /// Rebase an MR onto its target branch
    Rebase {
        /// MR reference: global id, `<project>!<iid>` or `group/project!<iid>`
        #[arg(value_parser = parse_reference)]
        reference: MrRef,

        /// Return once the rebase is accepted
        #[arg(long)]
        no_wait: bool,
    },

    /// Show MR details
    Show {
        /// MR reference: global id, `<project>!<iid>` or `group/project!<iid>`
        #[arg(value_parser = parse_reference)]
        reference: MrRef,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// List open MRs
    List {
        /// Only MRs of this project
        #[arg(long)]
        project: Option<u64>,

        /// Only MRs assigned to you
        #[arg(long)]
        mine: bool,

        /// Only MRs with at least one approval
        #[arg(long)]
        approved: bool,
    },

    /// Open a new MR
    Create(CreateArgs),
}

#[derive(Args)]
struct MergeArgs {
    /// MR reference: global id, `<project>!<iid>` or `group/project!<iid>`
    #[arg(value_parser = parse_reference)]
    reference: MrRef,

    /// Rebase automatically when GitLab requires it
    #[arg(long)]
    auto_rebase: bool,

    /// Maximum rebase attempts (default from config: 3)
    #[arg(long)]
    max_retries: Option<u32>,

    /// Overall time budget, e.g. `5m` or `1m30s` (default from config: 5m)
    #[arg(long, value_parser = parse_duration_arg)]
    timeout: Option<Duration>,

    /// Delay between status polls, e.g. `5s` (default from config: 5s)
    #[arg(long, value_parser = parse_duration_arg)]
    poll_interval: Option<Duration>,

    /// Preview the MR and prompt before merging
    #[arg(long)]
    confirm: bool,
}

#[derive(Args)]
#[allow(clippy::struct_excessive_bools)]
struct CreateArgs {
    /// Project id or full path, e.g. `group/project`
    #[arg(long)]
    project: String,

    /// Source branch
    #[arg(long)]
    source: String,

    /// Target branch
    #[arg(long)]
    target: String,

    /// MR title
    #[arg(long)]
    title: String,

    /// MR description
    #[arg(long)]
    description: Option<String>,

    /// Open as a draft
    #[arg(long)]
    draft: bool,

    /// Squash commits on merge
    #[arg(long)]
    squash: bool,

    /// Delete the source branch after merge
    #[arg(long)]
    remove_source_branch: bool,

    /// Allow commits from members who can merge to the target branch
    #[arg(long)]
    allow_collaboration: bool,

    /// Print the created MR as JSON
    #[arg(long)]
    json: bool,
}

fn parse_reference(s: &str) -> std::result::Result<MrRef, String> {
    s.parse::<MrRef>().map_err(|e| e.to_string())
}

fn parse_duration_arg(s: &str) -> std::result::Result<Duration, String> {
    let duration = parse_duration(s)?;
    if duration.is_zero() {
        return Err("duration must be positive".to_string());
    }
    Ok(duration)
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "glmr=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e}", "Error:".failure());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Mr(MrCommand::Merge(args)) => {
            cli::run_merge(
                config,
                &args.reference,
                cli::MergeCommandOptions {
                    auto_rebase: args.auto_rebase,
                    max_retries: args.max_retries,
                    timeout: args.timeout,
                    poll_interval: args.poll_interval,
                    confirm: args.confirm,
                },
            )
            .await
        }
        Commands::Mr(MrCommand::Rebase { reference, no_wait }) => {
            cli::run_rebase(config, &reference, cli::RebaseOptions { no_wait }).await
        }
        Commands::Mr(MrCommand::Show { reference, json }) => {
            cli::run_show(config, &reference, json).await
        }
        Commands::Mr(MrCommand::List {
            project,
            mine,
            approved,
        }) => {
            cli::run_list(
                config,
                ListQuery {
                    project_id: project,
                    mine,
                    approved,
                    per_page: None,
                },
            )
            .await
        }
        Commands::Mr(MrCommand::Create(args)) => {
            let request = NewMergeRequest {
                source_branch: args.source,
                target_branch: args.target,
                title: args.title,
                description: args.description.filter(|d| !d.is_empty()),
                draft: args.draft,
                squash: args.squash,
                remove_source_branch: args.remove_source_branch,
                allow_collaboration: args.allow_collaboration,
            };
            cli::run_create(config, &args.project, &request, args.json).await
        }
    }
}
