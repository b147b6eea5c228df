//! Clap derive structures for the `zigwatch` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// zigwatch -- Zigbee2MQTT coordinator monitoring from the command line
#[derive(Debug, Parser)]
#[command(
    name = "zigwatch",
    version,
    about = "Monitor Zigbee2MQTT coordinators over MQTT",
    long_about = "Monitor Zigbee2MQTT coordinators over MQTT.\n\n\
        Detects offline devices, finds stranded retained messages left by\n\
        removed devices, cross-checks bridge health reports, and can clear\n\
        stranded retained state with tombstone publishes.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Broker profile to use
    #[arg(long, short = 'p', env = "ZIGWATCH_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Broker URL (overrides profile), e.g. mqtt://192.168.1.10:1883
    #[arg(long, short = 'b', env = "ZIGWATCH_BROKER", global = true)]
    pub broker: Option<String>,

    /// Broker username (overrides profile)
    #[arg(long, env = "ZIGWATCH_USERNAME", global = true)]
    pub username: Option<String>,

    /// Broker password (prefer the keyring; see `zigwatch config set-password`)
    #[arg(long, env = "ZIGWATCH_PASSWORD", global = true, hide_env = true)]
    pub password: Option<String>,

    /// Coordinator topic namespace(s) to monitor (overrides profile)
    #[arg(
        long,
        short = 'c',
        env = "ZIGWATCH_COORDINATORS",
        value_delimiter = ',',
        global = true
    )]
    pub coordinator: Vec<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "ZIGWATCH_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-result output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Broker connect timeout in seconds
    #[arg(long, env = "ZIGWATCH_TIMEOUT", default_value = "10", global = true)]
    pub timeout: u64,
}

// ── Output Enum ──────────────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table / report (default, interactive)
    Table,
    /// Comma-separated values (scripting)
    Csv,
    /// Pretty-printed JSON
    Json,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Monitor coordinators for offline and stranded devices
    #[command(alias = "mon", alias = "m")]
    Monitor(MonitorArgs),

    /// Export the coordinator device roster
    #[command(alias = "dev", alias = "d")]
    Devices(DevicesArgs),

    /// List device names observed in MQTT topics
    Topics(TopicsArgs),

    /// Watch a single device and print state changes
    #[command(alias = "w")]
    Watch(WatchArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  MONITOR
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct MonitorArgs {
    /// Length of the monitoring window (e.g. 5s, 30s, 2m)
    #[arg(long, short = 'd', default_value = "5s", value_parser = humantime::parse_duration)]
    pub duration: Duration,

    /// Clear stranded retained messages without prompting
    #[arg(long)]
    pub remove_stranded: bool,

    /// Disable interactive prompts (monitor only, no removal)
    #[arg(long, conflicts_with = "remove_stranded")]
    pub no_interactive: bool,

    /// Length of the retained-message discovery window during cleanup
    #[arg(long, default_value = "2s", value_parser = humantime::parse_duration)]
    pub discovery_window: Duration,

    /// Exit with status 1 when offline devices are found
    #[arg(long)]
    pub fail_on_offline: bool,

    /// Order offline devices most-recently-seen first instead of by name
    #[arg(long)]
    pub by_recency: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  DEVICES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct DevicesArgs {
    /// How long to wait for roster snapshots (e.g. 5s)
    #[arg(long, short = 't', default_value = "5s", value_parser = humantime::parse_duration)]
    pub wait: Duration,

    /// Filter devices by name (case insensitive substring)
    #[arg(long, short = 'f')]
    pub filter: Option<String>,

    /// Show one detail block per device instead of a table
    #[arg(long)]
    pub details: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  TOPICS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct TopicsArgs {
    /// Length of the listening window (e.g. 5s)
    #[arg(long, short = 'd', default_value = "5s", value_parser = humantime::parse_duration)]
    pub duration: Duration,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  WATCH
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Friendly name of the device to watch (e.g. "Makerspace Test Plug")
    pub device: String,

    /// Show the full state on every message, not just changes
    #[arg(long, short = 'a')]
    pub all: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store a broker password in the system keyring
    SetPassword {
        /// Profile name
        #[arg(long)]
        profile: Option<String>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
