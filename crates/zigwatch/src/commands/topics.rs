//! Topics command: device names observed on the wire, per coordinator.
//!
//! Everything retained or published under a coordinator's namespace counts,
//! which makes this the quickest way to spot leftover topics at a glance
//! before running a full monitor pass.

use serde::Serialize;
use tabled::Tabled;

use zigwatch_core::{Coordinator, MonitorSession};

use crate::cli::{GlobalOpts, TopicsArgs};
use crate::config::RunTarget;
use crate::error::{CliError, exit_code};
use crate::output;

use super::util;

#[derive(Serialize)]
struct ObservedRecord {
    coordinator: Coordinator,
    device: String,
}

#[derive(Tabled)]
struct ObservedRow {
    #[tabled(rename = "Coordinator")]
    coordinator: String,
    #[tabled(rename = "Device")]
    device: String,
}

pub async fn handle(
    target: RunTarget,
    args: TopicsArgs,
    global: &GlobalOpts,
) -> Result<i32, CliError> {
    let cancel = util::ctrl_c_token();
    let mut session = MonitorSession::connect(&target.settings, "topics", cancel).await?;

    let spinner = util::window_spinner(
        format!(
            "Listening for {}",
            humantime::format_duration(args.duration)
        ),
        global.quiet,
    );
    let outcome = session.collect(&target.coordinators, args.duration).await?;
    spinner.finish_and_clear();
    session.disconnect().await;

    if outcome.interrupted && !global.quiet {
        eprintln!("Interrupted -- reporting partial results.");
    }

    let records: Vec<ObservedRecord> = target
        .coordinators
        .iter()
        .flat_map(|coordinator| {
            outcome
                .reconciler
                .observed(coordinator)
                .map(|device| ObservedRecord {
                    coordinator: coordinator.clone(),
                    device: device.to_owned(),
                })
                .collect::<Vec<_>>()
        })
        .collect();

    let out = output::render_list(
        &global.output,
        &records,
        |record| ObservedRow {
            coordinator: record.coordinator.to_string(),
            device: record.device.clone(),
        },
        &["Coordinator", "Device"],
        |record| vec![record.coordinator.to_string(), record.device.clone()],
    );
    output::print_output(&out);

    if !global.quiet {
        eprintln!("Total devices across all coordinators: {}", records.len());
    }
    Ok(exit_code::SUCCESS)
}
