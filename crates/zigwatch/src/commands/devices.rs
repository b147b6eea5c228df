//! Devices command: coordinator roster export.

use serde::Serialize;
use tabled::Tabled;

use zigwatch_core::{Coordinator, DeviceKind, MonitorSession};

use crate::cli::{DevicesArgs, GlobalOpts, OutputFormat};
use crate::config::RunTarget;
use crate::error::{CliError, exit_code};
use crate::output;

use super::util;

// ── Row / record shapes ─────────────────────────────────────────────

#[derive(Serialize)]
struct DeviceRecord {
    coordinator: Coordinator,
    friendly_name: String,
    ieee_address: Option<String>,
    kind: Option<DeviceKind>,
    model_id: Option<String>,
}

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "Coordinator")]
    coordinator: String,
    #[tabled(rename = "Friendly Name")]
    name: String,
    #[tabled(rename = "IEEE Address")]
    ieee: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Model")]
    model: String,
}

impl From<&DeviceRecord> for DeviceRow {
    fn from(record: &DeviceRecord) -> Self {
        Self {
            coordinator: record.coordinator.to_string(),
            name: record.friendly_name.clone(),
            ieee: record.ieee_address.clone().unwrap_or_default(),
            kind: record.kind.map(|k| k.to_string()).unwrap_or_default(),
            model: record.model_id.clone().unwrap_or_default(),
        }
    }
}

fn detail(record: &DeviceRecord) -> String {
    [
        format!("Name:  {}", record.friendly_name),
        format!(
            "IEEE:  {}",
            record.ieee_address.as_deref().unwrap_or("-")
        ),
        format!(
            "Type:  {}",
            record.kind.map_or_else(|| "-".into(), |k| k.to_string())
        ),
        format!("Model: {}", record.model_id.as_deref().unwrap_or("-")),
        format!("Via:   {}", record.coordinator),
    ]
    .join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    target: RunTarget,
    args: DevicesArgs,
    global: &GlobalOpts,
) -> Result<i32, CliError> {
    let cancel = util::ctrl_c_token();
    let mut session = MonitorSession::connect(&target.settings, "devices", cancel).await?;

    let spinner = util::window_spinner("Collecting device rosters".into(), global.quiet);
    let rosters = session.collect_rosters(&target.coordinators, args.wait).await?;
    spinner.finish_and_clear();
    session.disconnect().await;

    for coordinator in &target.coordinators {
        if !rosters.contains_key(coordinator) && !global.quiet {
            eprintln!(
                "No roster received from {coordinator} within {}",
                humantime::format_duration(args.wait)
            );
        }
    }
    if rosters.is_empty() {
        return Err(CliError::NoRosterReceived {
            waited_secs: args.wait.as_secs(),
        });
    }

    let filter = args.filter.as_deref().map(str::to_lowercase);
    let records: Vec<DeviceRecord> = rosters
        .iter()
        .flat_map(|(coordinator, snapshot)| {
            snapshot.entries().iter().map(move |entry| DeviceRecord {
                coordinator: coordinator.clone(),
                friendly_name: entry.friendly_name.clone(),
                ieee_address: entry.ieee_address.clone(),
                kind: entry.kind,
                model_id: entry.model_id.clone(),
            })
        })
        .filter(|record| {
            filter
                .as_deref()
                .is_none_or(|f| record.friendly_name.to_lowercase().contains(f))
        })
        .collect();

    if args.details && matches!(global.output, OutputFormat::Table) {
        let blocks: Vec<String> = records.iter().map(detail).collect();
        output::print_output(&blocks.join("\n\n"));
    } else {
        let out = output::render_list(
            &global.output,
            &records,
            |record| DeviceRow::from(record),
            &["Coordinator", "Friendly_Name", "IEEE_Address", "Type", "Model"],
            |record| {
                vec![
                    record.coordinator.to_string(),
                    record.friendly_name.clone(),
                    record.ieee_address.clone().unwrap_or_default(),
                    record.kind.map(|k| k.to_string()).unwrap_or_default(),
                    record.model_id.clone().unwrap_or_default(),
                ]
            },
        );
        output::print_output(&out);
    }

    if !global.quiet {
        eprintln!("{} device(s) across {} roster(s)", records.len(), rosters.len());
    }
    Ok(exit_code::SUCCESS)
}
