use std::io;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use version_manager::config;
use version_manager::domain::{ReleaseKind, ReleaseVersion};
use version_manager::git::Git2Vcs;
use version_manager::release::{ActionManager, ReleaseOutcome};
use version_manager::storage::GitVersionStorage;
use version_manager::ui;

#[derive(Parser)]
#[command(
    name = "version-manager",
    about = "Release semantic versions: bump, branch, tag and push",
    arg_required_else_help = true
)]
struct Args {
    #[arg(short, long, global = true, help = "Custom configuration file path")]
    config: Option<String>,

    #[arg(short, long, help = "Print version information")]
    version: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Release the next major, minor or patch version
    Make {
        #[arg(value_name = "major|minor|patch")]
        kind: ReleaseKind,

        #[arg(short, long, help = "Skip the confirmation prompt")]
        yes: bool,

        #[arg(long, help = "Check preconditions and show the steps without changing anything")]
        dry_run: bool,
    },
    /// Checkout the branch of the latest released version
    Latest,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    if let Err(e) = run(args) {
        ui::display_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    if args.version {
        println!("version-manager {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let Some(command) = args.command else {
        Args::command().print_help()?;
        return Ok(());
    };

    let config = config::load_config(args.config.as_deref())?;
    let policy = config.release_policy()?;
    let vcs = Git2Vcs::open(".", config.vcs.clone())?;
    let storage = GitVersionStorage::new(&vcs, vcs.workdir()?, config.storage.clone());
    let actions = ActionManager::new(&vcs, &storage, &policy);

    match command {
        Command::Make { kind, yes, dry_run } => {
            if dry_run {
                let plan = actions.plan_new_version(kind, read_initial_version)?;
                ui::display_plan(&plan);
                return Ok(());
            }

            let confirm = |version: &ReleaseVersion| {
                yes || ui::confirm_release(&mut io::stdin().lock(), &mut io::stdout(), kind, version)
                    .unwrap_or_else(|e| {
                        warn!(error = %e, "could not read confirmation");
                        false
                    })
            };

            if let ReleaseOutcome::Declined(version) =
                actions.release_new_version(kind, confirm, read_initial_version)?
            {
                ui::display_status(&format!("Release {} cancelled.", version));
            }
        }
        Command::Latest => {
            let latest = actions.checkout_latest()?;
            ui::display_latest(latest.as_ref());
        }
    }

    Ok(())
}

fn read_initial_version() -> Option<ReleaseVersion> {
    ui::prompt_initial_version(&mut io::stdin().lock(), &mut io::stdout()).unwrap_or_else(|e| {
        warn!(error = %e, "could not read initial version");
        None
    })
}
