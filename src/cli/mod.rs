//! CLI commands
//!
//! Command implementations for the `bxt-stage` binary.

mod auth;
mod progress;
mod push;
mod remote;
mod stage;
mod status;
mod style;

pub use auth::{run_login, run_logout};
pub use push::run_push;
pub use remote::{run_sections, run_snap, run_sync};
pub use stage::{run_add, run_clear, run_copy, run_delete, run_move, run_unstage};
pub use status::run_status;

use bxt_stage::auth::{AuthSource, get_auth};
use bxt_stage::backend::HttpBackend;
use bxt_stage::config::Config;
use bxt_stage::error::Result;
use bxt_stage::state::StateDir;
use tracing::debug;

/// Open the state directory named by `config`
fn open_state(config: &Config) -> Result<StateDir> {
    StateDir::open(&config.state_dir)
}

/// Client authenticated with the current session
fn connect(config: &Config, state: &StateDir) -> Result<(HttpBackend, AuthSource)> {
    let auth = get_auth(state)?;
    debug!("Using {:?} credentials for {}", auth.source, config.server_url);

    let backend = HttpBackend::new(
        config.server_url.clone(),
        Some(auth.session),
        config.timeout(),
    )?;
    Ok((backend, auth.source))
}

/// Store tokens renewed during the command
fn persist_session(state: &StateDir, backend: &HttpBackend, source: AuthSource) -> Result<()> {
    if source != AuthSource::Stored {
        return Ok(());
    }
    match backend.session() {
        Some(session) => state.save_session(&session),
        None => Ok(()),
    }
}
