//! CLI progress callback with styled output and an upload bar

use crate::cli::style::{Stylize, check, cross, spinner_style, upload_style};
use anstream::{eprintln, println};
use async_trait::async_trait;
use bxt_stage::error::Error;
use bxt_stage::submit::{Phase, ProgressCallback};
use indicatif::ProgressBar;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Resolution of the upload bar
const BAR_LENGTH: u64 = 1000;

/// CLI progress callback
///
/// Shows a spinner while refreshing the session and a bar while uploading.
pub struct CliProgress {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliProgress {
    /// Create a progress reporter with no active bar
    pub const fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn replace_bar(&self, bar: Option<ProgressBar>) {
        let mut slot = self.bar.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(old) = slot.take() {
            old.finish_and_clear();
        }
        *slot = bar;
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        let slot = self.bar.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(bar) = slot.as_ref() {
            f(bar);
        }
    }
}

#[async_trait]
impl ProgressCallback for CliProgress {
    async fn on_phase(&self, phase: Phase) {
        match phase {
            Phase::Encoding => {
                println!("{}...", phase.to_string().emphasis());
            }
            Phase::RefreshingAuth => {
                let spinner = ProgressBar::new_spinner();
                spinner.set_style(spinner_style());
                spinner.set_message(phase.to_string());
                spinner.enable_steady_tick(Duration::from_millis(80));
                self.replace_bar(Some(spinner));
            }
            Phase::Uploading => {
                let bar = ProgressBar::new(BAR_LENGTH);
                bar.set_style(upload_style());
                bar.set_message(phase.to_string());
                self.replace_bar(Some(bar));
            }
            Phase::Complete => {
                self.replace_bar(None);
                println!("{} {}", check(), phase.to_string().success());
            }
        }
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    async fn on_upload_progress(&self, fraction: f64) {
        let position = (fraction * BAR_LENGTH as f64).round() as u64;
        self.with_bar(|bar| bar.set_position(position.min(BAR_LENGTH)));
    }

    async fn on_error(&self, err: &Error) {
        let slot = self.bar.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(bar) = slot {
            bar.abandon();
        }
        eprintln!("{} {}: {}", cross(), "error".error(), err);
    }

    async fn on_message(&self, message: &str) {
        let slot = self.bar.lock().unwrap_or_else(PoisonError::into_inner);
        match slot.as_ref() {
            Some(bar) => bar.println(message),
            None => println!("{}", message.muted()),
        }
    }
}
