//! Push command - submit the staging area

use crate::cli::progress::CliProgress;
use crate::cli::style::{Stylize, check};
use crate::cli::{connect, open_state, persist_session};
use anstream::{eprintln, println};
use bxt_stage::auth::AuthSource;
use bxt_stage::backend::{BackendService, HttpBackend};
use bxt_stage::config::Config;
use bxt_stage::error::{Error, Result};
use bxt_stage::state::StateDir;
use bxt_stage::submit::PushCoordinator;
use tracing::{debug, warn};

/// Run the push command
pub async fn run_push(config: &Config) -> Result<()> {
    let state = open_state(config)?;
    let mut store = state.load_store()?;

    if store.is_empty() {
        println!("{}", "Nothing staged".muted());
        return Ok(());
    }

    let (backend, source) = connect(config, &state)?;
    let coordinator = PushCoordinator::new();
    let progress = CliProgress::new();

    // Ctrl-C is ignored until the upload settles
    let result = {
        let push = coordinator.push(&mut store, &backend, &progress);
        tokio::pin!(push);
        loop {
            tokio::select! {
                result = &mut push => break result,
                _ = tokio::signal::ctrl_c() => {
                    eprintln!(
                        "{}",
                        "Push in progress, interrupting could apply it twice".warn()
                    );
                }
            }
        }
    };

    let outcome = match result {
        Ok(outcome) => {
            // Applied on the server, so staged.json must not outlive it
            state.save_store(&store)?;
            save_renewed_session(&state, &backend, source);
            outcome
        }
        Err(Error::Unauthorized) => {
            save_renewed_session(&state, &backend, source);
            eprintln!(
                "{}",
                "Session expired, run `bxt-stage login` and push again".warn()
            );
            return Err(Error::Unauthorized);
        }
        Err(e) => {
            save_renewed_session(&state, &backend, source);
            if matches!(e, Error::Http(_)) {
                eprintln!(
                    "{}",
                    "The server may have applied part of the commit; check `bxt-stage sections` before retrying"
                        .warn()
                );
            }
            return Err(e);
        }
    };

    println!(
        "{} Pushed {} packages across {} sections",
        check(),
        outcome.packages.accent(),
        outcome.sections.accent()
    );

    if outcome.reload_sections {
        match backend.list_sections().await {
            Ok(listing) => debug!("Server now lists {} sections", listing.len()),
            Err(e) => warn!("Could not reload sections: {e}"),
        }
    }
    Ok(())
}

fn save_renewed_session(state: &StateDir, backend: &HttpBackend, source: AuthSource) {
    if let Err(e) = persist_session(state, backend, source) {
        warn!("Could not save renewed session: {e}");
    }
}
