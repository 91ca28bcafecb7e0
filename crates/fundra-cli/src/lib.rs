// SPDX-License-Identifier: BUSL-1.1
//! # fundra-cli — Operator CLI for the Escrow Engine
//!
//! ## Subcommands
//!
//! - `fundra run` — evaluate one project's active rules once and print the
//!   outcomes as JSON.
//! - `fundra watch` — re-evaluate a set of projects on an interval, for
//!   time-elapsed conditions nothing else re-triggers.

pub mod run;
pub mod watch;

use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use fundra_engine::{ProjectRuleRunner, ProviderRegistry};
use fundra_store::{RecordStore, StoreConfig};

/// Store connection flags shared by every subcommand.
#[derive(Args, Debug)]
pub struct StoreArgs {
    /// Base URL of the record store. Falls back to FUNDRA_STORE_URL, then
    /// to http://localhost:8090.
    #[arg(long)]
    pub store_url: Option<String>,

    /// Per-request timeout in seconds for store and provider calls.
    #[arg(long, default_value_t = 10)]
    pub timeout_secs: u64,
}

impl StoreArgs {
    /// Flag, then environment, then the local stub default.
    pub fn resolved_url(&self) -> String {
        self.store_url
            .clone()
            .or_else(|| std::env::var("FUNDRA_STORE_URL").ok())
            .unwrap_or_else(|| "http://localhost:8090".to_string())
    }

    /// Build the runner this invocation will use.
    pub fn build_runner(&self) -> anyhow::Result<ProjectRuleRunner> {
        let store = RecordStore::new(
            StoreConfig::new(self.resolved_url()).with_timeout_secs(self.timeout_secs),
        )?;
        let providers =
            ProviderRegistry::with_default_providers(Duration::from_secs(self.timeout_secs))?;
        Ok(ProjectRuleRunner::new(store, Arc::new(providers)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_store_url_flag_wins() {
        let args = StoreArgs {
            store_url: Some("http://store.internal:9000".into()),
            timeout_secs: 5,
        };
        assert_eq!(args.resolved_url(), "http://store.internal:9000");
    }
}
