//! `fundra watch` — periodic re-evaluation over a set of projects.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use fundra_core::RecordId;
use fundra_engine::ScheduledRunner;

use crate::StoreArgs;

#[derive(Args, Debug)]
pub struct WatchArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Project to watch; repeat the flag for several.
    #[arg(long = "project", required = true)]
    pub projects: Vec<String>,

    /// Seconds between evaluation passes.
    #[arg(long, default_value_t = 300)]
    pub every: u64,
}

/// Watch the projects until interrupted. Ctrl-C raises the stop flag; the
/// loop finishes its current pass before exiting, so no release is ever
/// abandoned mid-action.
pub async fn run_watch(args: WatchArgs) -> anyhow::Result<()> {
    let stop = Arc::new(AtomicBool::new(false));
    let runner = args.store.build_runner()?.with_stop_flag(stop.clone());

    let projects: Vec<RecordId> = args.projects.into_iter().map(RecordId::new).collect();
    let schedule = ScheduledRunner::new(runner, Duration::from_secs(args.every), projects);

    let flag = stop.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("stop requested; finishing the current pass");
            flag.store(true, Ordering::Relaxed);
        }
    });

    schedule.run(stop).await;
    Ok(())
}
