//! Monitor command: offline/stranded classification with optional cleanup
//! of stranded retained messages.

use std::io::IsTerminal;

use serde::Serialize;

use zigwatch_core::{
    Classification, CleanupPlan, Coordinator, MonitorSession, OfflineDevice, StrandedDevice,
    StrandedHealthEntry,
};

use crate::cli::{GlobalOpts, MonitorArgs, OutputFormat};
use crate::config::RunTarget;
use crate::error::{CliError, exit_code};
use crate::output;

use super::util;

// ── Report model ────────────────────────────────────────────────────

#[derive(Serialize)]
struct CoordinatorReport {
    coordinator: Coordinator,
    roster_received: bool,
    offline: Vec<OfflineDevice>,
    stranded: Vec<StrandedDevice>,
    stranded_health: Vec<StrandedHealthEntry>,
}

#[derive(Serialize)]
struct MonitorReport {
    coordinators: Vec<CoordinatorReport>,
    availability_messages: u64,
    interrupted: bool,
}

impl MonitorReport {
    fn total_offline(&self) -> usize {
        self.coordinators.iter().map(|c| c.offline.len()).sum()
    }

    fn total_stranded(&self) -> usize {
        self.coordinators.iter().map(|c| c.stranded.len()).sum()
    }

    fn total_stranded_health(&self) -> usize {
        self.coordinators.iter().map(|c| c.stranded_health.len()).sum()
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    target: RunTarget,
    args: MonitorArgs,
    global: &GlobalOpts,
) -> Result<i32, CliError> {
    let cancel = util::ctrl_c_token();
    let mut session = MonitorSession::connect(&target.settings, "monitor", cancel).await?;

    let spinner = util::window_spinner(
        format!(
            "Monitoring {} coordinator(s) for {}",
            target.coordinators.len(),
            humantime::format_duration(args.duration)
        ),
        global.quiet,
    );
    let outcome = session.collect(&target.coordinators, args.duration).await?;
    spinner.finish_and_clear();

    if outcome.interrupted && !global.quiet {
        eprintln!("Interrupted -- reporting partial results.");
    }

    let classifications: Vec<Classification> = target
        .coordinators
        .iter()
        .map(|c| outcome.reconciler.classify(c))
        .collect();

    let report = MonitorReport {
        coordinators: classifications
            .iter()
            .map(|classification| CoordinatorReport {
                coordinator: classification.coordinator.clone(),
                roster_received: classification.roster_received,
                offline: if args.by_recency {
                    classification.offline_by_recency()
                } else {
                    classification.offline.clone()
                },
                stranded: classification.stranded.clone(),
                stranded_health: outcome
                    .reconciler
                    .stranded_health(&classification.coordinator),
            })
            .collect(),
        availability_messages: outcome.reconciler.availability_events(),
        interrupted: outcome.interrupted,
    };

    match global.output {
        OutputFormat::Table => print_report(&report),
        OutputFormat::Json => output::print_output(&output::render_json(&report)),
        OutputFormat::Csv => output::print_output(&render_csv_report(&report)),
    }

    // Counts are part of the contract even in machine formats: log scraping
    // must be able to tell "ran, found nothing" from "did not run".
    if !matches!(global.output, OutputFormat::Table) {
        eprintln!(
            "Found {} offline device(s), {} stranded device(s), {} stranded health entr(ies)",
            report.total_offline(),
            report.total_stranded(),
            report.total_stranded_health()
        );
    }

    // ── Optional cleanup of stranded retained state ──────────────────
    let no_interactive = args.no_interactive || !std::io::stdin().is_terminal();
    if report.total_stranded() > 0 {
        let should_remove = if args.remove_stranded {
            true
        } else if no_interactive {
            false
        } else {
            util::confirm(
                &format!("Remove {} stranded device(s)?", report.total_stranded()),
                false,
            )?
        };

        if should_remove {
            let plan = CleanupPlan::from_classifications(&classifications);
            let cleanup = session.clear_stranded(&plan, args.discovery_window).await?;
            if matches!(global.output, OutputFormat::Table) {
                for topic in &cleanup.cleared {
                    println!("Cleared retained message: {topic}");
                }
            }
            let failed = if cleanup.failed > 0 {
                format!(" ({} failed)", cleanup.failed)
            } else {
                String::new()
            };
            eprintln!("Cleared {} retained message(s){failed}", cleanup.cleared.len());
        }
    }

    session.disconnect().await;

    if args.fail_on_offline && report.total_offline() > 0 {
        return Ok(exit_code::FINDINGS);
    }
    Ok(exit_code::SUCCESS)
}

// ── Table rendering ─────────────────────────────────────────────────

fn section_header(title: &str) {
    println!("\n{}", "=".repeat(60));
    println!("{title}");
    println!("{}", "=".repeat(60));
}

#[allow(clippy::too_many_lines)]
fn print_report(report: &MonitorReport) {
    // Offline devices
    section_header("OFFLINE DEVICES");
    let offline_total = report.total_offline();
    println!("\nFound {offline_total} offline device(s)");
    for coordinator in &report.coordinators {
        if coordinator.offline.is_empty() {
            continue;
        }
        println!("\n{}:", coordinator.coordinator);
        for device in &coordinator.offline {
            println!(
                "  • {} (offline since {})",
                device.name,
                device.seen_at.format("%H:%M:%S")
            );
        }
    }
    println!(
        "\nTotal availability messages checked: {}",
        report.availability_messages
    );

    for coordinator in &report.coordinators {
        if !coordinator.roster_received {
            println!(
                "\nNote: no roster received from {} -- every observed device there is reported as stranded.",
                coordinator.coordinator
            );
        }
    }

    // Stranded devices
    section_header("STRANDED DEVICES (retained messages, not in coordinator)");
    println!("\nFound {} stranded device(s)", report.total_stranded());
    for coordinator in &report.coordinators {
        if coordinator.stranded.is_empty() {
            continue;
        }
        println!("\n{}:", coordinator.coordinator);
        for device in &coordinator.stranded {
            match &device.availability {
                Some(state) => println!("  • {} (availability: {state})", device.name),
                None => println!("  • {}", device.name),
            }
        }
    }

    // Stranded health entries
    section_header("STRANDED HEALTH ENTRIES (tracked in health, not in device list)");
    println!(
        "\nFound {} stranded health entr(ies)",
        report.total_stranded_health()
    );
    for coordinator in &report.coordinators {
        if coordinator.stranded_health.is_empty() {
            continue;
        }
        println!("\n{}:", coordinator.coordinator);
        for entry in &coordinator.stranded_health {
            let name = entry
                .friendly_name
                .as_ref()
                .map(|n| format!(" ({n})"))
                .unwrap_or_default();
            println!("  • {}{name}", entry.ieee_address);
            println!(
                "      messages: {}, leave_count: {}",
                entry.counters.messages, entry.counters.leave_count
            );
        }
    }
    if report.total_stranded_health() > 0 {
        println!(
            "\nNote: these devices are tracked in the coordinator's health data\n\
             but are no longer in the device configuration. Remove them via the\n\
             Zigbee2MQTT web UI or by restarting the coordinator."
        );
    }
    println!("{}", "=".repeat(60));
}

// ── CSV rendering ───────────────────────────────────────────────────

fn render_csv_report(report: &MonitorReport) -> String {
    let mut records: Vec<Vec<String>> = Vec::new();
    for coordinator in &report.coordinators {
        let name = coordinator.coordinator.to_string();
        for device in &coordinator.offline {
            records.push(vec![
                name.clone(),
                device.name.clone(),
                "offline".into(),
                device.seen_at.to_rfc3339(),
            ]);
        }
        for device in &coordinator.stranded {
            records.push(vec![
                name.clone(),
                device.name.clone(),
                "stranded".into(),
                device
                    .availability
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_default(),
            ]);
        }
        for entry in &coordinator.stranded_health {
            records.push(vec![
                name.clone(),
                entry.ieee_address.clone(),
                "stranded-health".into(),
                entry.friendly_name.clone().unwrap_or_default(),
            ]);
        }
    }
    output::render_csv(&["Coordinator", "Device", "Category", "Detail"], records)
}
