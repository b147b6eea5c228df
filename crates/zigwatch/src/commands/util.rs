//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;

use crate::error::CliError;

/// Cancellation token that trips on Ctrl-C.
///
/// The monitoring window treats cancellation as "classify what you have",
/// not as an abort, so the signal handler only cancels — handlers decide
/// what partial output to produce.
pub fn ctrl_c_token() -> CancellationToken {
    let token = CancellationToken::new();
    let trip = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            trip.cancel();
        }
    });
    token
}

/// Spinner for a bounded listening window, suppressed when quiet or when
/// stderr is not a terminal.
pub fn window_spinner(message: String, quiet: bool) -> ProgressBar {
    if quiet || !std::io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let spinner = ProgressBar::new_spinner().with_message(message);
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg} [{elapsed}]") {
        spinner.set_style(style);
    }
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}

/// Prompt for confirmation, auto-approving if `auto_yes` was passed.
pub fn confirm(message: &str, auto_yes: bool) -> Result<bool, CliError> {
    if auto_yes {
        return Ok(true);
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}
