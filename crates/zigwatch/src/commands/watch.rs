//! Watch command: stream one device's state and print changes.

use zigwatch_core::{DeviceWatcher, state_diff};

use crate::cli::{GlobalOpts, WatchArgs};
use crate::config::RunTarget;
use crate::error::{CliError, exit_code};
use crate::output;

fn format_value(value: Option<&serde_json::Value>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "(absent)".into(),
    }
}

pub async fn handle(
    target: RunTarget,
    args: WatchArgs,
    global: &GlobalOpts,
) -> Result<i32, CliError> {
    let Some(coordinator) = target.coordinators.first() else {
        return Err(CliError::NoCoordinators);
    };
    if target.coordinators.len() > 1 && !global.quiet {
        eprintln!("Multiple coordinators configured; watching via {coordinator}");
    }

    let mut watcher = DeviceWatcher::subscribe(&target.settings, coordinator, &args.device).await?;
    if !global.quiet {
        eprintln!("Watching {} (Ctrl-C to stop)", watcher.topic());
    }

    let mut last_state = None;
    let mut message_count = 0u64;

    loop {
        let message = tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            message = watcher.next_state() => message?,
        };
        message_count += 1;
        let stamp = message.received_at.format("%H:%M:%S");

        match &last_state {
            None => {
                println!("[{stamp}] initial state:");
                println!("{}", output::render_json(&message.state));
            }
            Some(_) if args.all => {
                println!("[{stamp}] state:");
                println!("{}", output::render_json(&message.state));
            }
            Some(previous) => {
                let changes = state_diff(previous, &message.state);
                if changes.is_empty() {
                    println!("[{stamp}] no changes");
                }
                for change in changes {
                    println!(
                        "[{stamp}] {}: {} -> {}",
                        change.key,
                        format_value(change.old.as_ref()),
                        format_value(change.new.as_ref())
                    );
                }
            }
        }
        last_state = Some(message.state);
    }

    watcher.disconnect().await;
    if !global.quiet {
        eprintln!("{message_count} message(s) observed");
    }
    Ok(exit_code::SUCCESS)
}
