mod clock;
mod forensics;
mod idset;
mod model;
mod policy;
mod report;
mod store;
#[cfg(test)]
mod testing;
mod twitter;

use crate::clock::SystemClock;
use crate::forensics::nonmutual::find_non_mutuals;
use crate::forensics::{Reconciler, RunOutcome};
use crate::model::Identifier;
use crate::policy::RefreshPolicy;
use crate::report::ConsoleReporter;
use crate::store::FileStore;
use crate::twitter::v1::TwitterClientV1;
use crate::twitter::v2::TwitterClientV2;
use crate::twitter::{Authentication, TwitterClient};
use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio::fs;

#[derive(Parser, Debug)]
#[clap(version, about)]
struct Args {
    /// Path to the authentication details file
    #[clap(short, long, default_value = "./auth.json")]
    auth: PathBuf,
    /// Directory holding the follower snapshot and analytics files
    #[clap(short, long, default_value = "./")]
    data: PathBuf,
    /// Username of the account to monitor
    #[clap(short, long)]
    user: Option<String>,
    /// Id of the account to monitor, skips looking up the username
    #[clap(long)]
    user_id: Option<Identifier>,
    /// Use Twitter API 2
    #[clap(long)]
    api_v2: bool,
    /// Number of previously seen followers / unfollowers to show
    #[clap(long, default_value_t = 3)]
    recent: usize,
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Find the people who've recently unfollowed you
    Unfollowers,
    /// Find the people who you follow and aren't following you back
    Nonmutuals,
    /// Save your current followers as the starting point for `unfollowers`
    Init {
        /// Replace an existing snapshot
        #[clap(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(e) = main2().await {
        eprintln!("{:#}", e);
        std::process::exit(1);
    }
}

async fn main2() -> anyhow::Result<()> {
    let args: Args = Args::parse();
    if !args.data.is_dir() {
        bail!("Data location must be a directory");
    }
    let auth = fs::read_to_string(&args.auth)
        .await
        .context("Unable to read auth file")?;
    let auth =
        serde_json::from_str::<Authentication>(&auth).context("Unable to deserialize auth file")?;

    let client: Box<dyn TwitterClient> = if args.api_v2 {
        log::info!("Using Twitter API v2");
        Box::new(TwitterClientV2::new(&auth)?)
    } else {
        log::info!("Using Twitter API v1.1");
        Box::new(TwitterClientV1::new(&auth))
    };
    let account_id = account_id(&args, client.as_ref()).await?;

    let store = FileStore::new(&args.data);
    let reconciler = Reconciler {
        client: client.as_ref(),
        persistence: &store,
        clock: &SystemClock,
        policy: RefreshPolicy::default(),
        account_id,
        recent_limit: args.recent,
    };

    match args.command {
        Command::Unfollowers => {
            if let RunOutcome::Reconciled {
                total_followers,
                diff,
                persisted,
            } = reconciler.run(&ConsoleReporter).await?
            {
                log::info!(
                    "Checked {} followers, net change {:+}",
                    total_followers,
                    diff.delta()
                );
                if !persisted {
                    log::warn!("Saved follower data in {} is stale", args.data.display());
                }
            }
        }
        Command::Nonmutuals => {
            find_non_mutuals(client.as_ref(), account_id, &ConsoleReporter).await?;
        }
        Command::Init { force } => {
            let snapshot = reconciler.init(force).await?;
            log::info!(
                "Saved {} followers as the starting snapshot",
                snapshot.ids.len()
            );
        }
    }
    Ok(())
}

async fn account_id(args: &Args, twitter: &dyn TwitterClient) -> anyhow::Result<Identifier> {
    match (args.user_id, &args.user) {
        (Some(id), _) => Ok(id),
        (None, Some(username)) => twitter
            .get_id_for_username(username)
            .await
            .context("Unable to find user"),
        (None, None) => bail!("No account provided, use --user or --user-id"),
    }
}
