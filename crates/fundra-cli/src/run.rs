//! `fundra run` — one evaluation pass for a single project.

use anyhow::Context;
use clap::Args;
use fundra_core::RecordId;

use crate::StoreArgs;

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// The project whose active rules should be evaluated.
    #[arg(long)]
    pub project: String,

    /// Extra context metadata as a JSON object, surfaced to external
    /// condition providers (e.g. '{"websiteUrl": "https://example.org"}').
    #[arg(long)]
    pub metadata: Option<String>,
}

/// Run the project's rules once and print the outcomes as JSON on stdout.
pub async fn run_once(args: RunArgs) -> anyhow::Result<()> {
    let runner = args.store.build_runner()?;

    let metadata = match &args.metadata {
        Some(raw) => serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(raw)
            .context("--metadata must be a JSON object")?,
        None => serde_json::Map::new(),
    };

    let project_id = RecordId::new(args.project);
    let outcomes = runner
        .run_for_project_with_metadata(&project_id, metadata)
        .await?;

    let passed = outcomes.iter().filter(|o| o.passed).count();
    tracing::info!(
        project = %project_id,
        outcomes = outcomes.len(),
        passed,
        "run complete"
    );

    println!("{}", serde_json::to_string_pretty(&outcomes)?);
    Ok(())
}
