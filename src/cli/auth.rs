//! Login and logout

use crate::cli::open_state;
use crate::cli::style::{Stylize, check};
use anstream::{eprintln, println};
use bxt_stage::backend::HttpBackend;
use bxt_stage::config::Config;
use bxt_stage::error::{Error, Result};
use dialoguer::{Input, Password};
use tracing::warn;

/// Log in and store the session
pub async fn run_login(config: &Config, user: Option<String>) -> Result<()> {
    let state = open_state(config)?;

    let user = match user {
        Some(user) => user,
        None => Input::<String>::new()
            .with_prompt("User name")
            .interact_text()
            .map_err(|e| Error::Internal(format!("prompt failed: {e}")))?,
    };
    let password = Password::new()
        .with_prompt("Password")
        .interact()
        .map_err(|e| Error::Internal(format!("prompt failed: {e}")))?;

    let backend = HttpBackend::new(config.server_url.clone(), None, config.timeout())?;
    let session = backend.login(&user, &password).await?;
    state.save_session(&session)?;

    println!(
        "{} Logged in to {} as {}",
        check(),
        config.server_url.accent(),
        user.emphasis()
    );
    Ok(())
}

/// Revoke the stored session and forget it locally
pub async fn run_logout(config: &Config) -> Result<()> {
    let state = open_state(config)?;

    let Some(session) = state.load_session()? else {
        println!("Not logged in");
        return Ok(());
    };

    let backend = HttpBackend::new(config.server_url.clone(), Some(session), config.timeout())?;
    if let Err(e) = backend.logout().await {
        warn!("Session revoke failed: {e}");
        eprintln!(
            "{}",
            format!("Could not revoke session on server: {e}").warn()
        );
    }

    state.clear_session()?;
    println!("{} Logged out", check());
    Ok(())
}
