//! Server commands: section listing, sync and snapshot

use crate::cli::style::{Stylize, arrow, check};
use crate::cli::{connect, open_state, persist_session};
use anstream::println;
use bxt_stage::backend::{BackendService, SnapRequest};
use bxt_stage::config::Config;
use bxt_stage::error::Result;
use bxt_stage::sections::{architectures, branches, repositories};

/// Print the sections known to the server as a tree
pub async fn run_sections(config: &Config) -> Result<()> {
    let state = open_state(config)?;
    let (backend, source) = connect(config, &state)?;
    let listing = backend.list_sections().await?;
    persist_session(&state, &backend, source)?;

    if listing.is_empty() {
        println!("{}", "Server has no sections".muted());
        return Ok(());
    }

    for branch in branches(&listing) {
        println!("{}", branch.emphasis());
        for repository in repositories(&listing, &branch) {
            let archs = architectures(&listing, &branch, &repository);
            println!("  {} {}", repository.accent(), archs.join(" ").muted());
        }
    }
    Ok(())
}

/// Ask the server to sync with its upstream sources
pub async fn run_sync(config: &Config) -> Result<()> {
    let state = open_state(config)?;
    let (backend, source) = connect(config, &state)?;
    backend.sync().await?;
    persist_session(&state, &backend, source)?;

    println!("{} Sync started", check());
    Ok(())
}

/// Snapshot `source_branch` onto `target_branch` for one architecture
pub async fn run_snap(
    config: &Config,
    source_branch: String,
    target_branch: String,
    architecture: String,
) -> Result<()> {
    let state = open_state(config)?;
    let (backend, source) = connect(config, &state)?;

    let request = SnapRequest {
        source_branch,
        target_branch,
        architecture,
    };
    backend.snap(&request).await?;
    persist_session(&state, &backend, source)?;

    println!(
        "{} Snapshot {} {} {} ({})",
        check(),
        request.source_branch.accent(),
        arrow(),
        request.target_branch.accent(),
        request.architecture
    );
    Ok(())
}
