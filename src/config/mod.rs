//! Command-line and environment configuration.
//!
//! Every flag can also be set through an environment variable (and a `.env`
//! file via dotenvy), so lab cron jobs can run the bare subcommands.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::pipeline::PipelineSettings;

#[derive(Debug, Parser)]
#[command(
    name = "labnet",
    version,
    about = "Network lab device verification and credential rotation"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run verification checks across the inventory (OSPF/BGP by default)
    Verify(VerifyArgs),
    /// Ping the external target from every device
    Reachability(PipelineArgs),
    /// SSH connectivity and management-station reachability table
    SshCheck(PipelineArgs),
    /// Raw command snapshot for a single device
    Health(HealthArgs),
    /// Rotate device credentials and update the inventory
    Rotate(RotateArgs),
    /// Validate IPv4 addresses (dotted quad, optionally with /prefix)
    ValidateIp(ValidateIpArgs),
}

#[derive(Debug, Clone, Args)]
pub struct CommonArgs {
    /// Inventory file (JSON array of device records)
    #[arg(long, env = "INVENTORY_PATH", default_value = "devices.json")]
    pub inventory: PathBuf,

    /// TCP/SSH connect timeout in seconds
    #[arg(long, env = "CONNECT_TIMEOUT_SECS", default_value_t = 10)]
    pub connect_timeout: u64,

    /// External target pinged by the reachability check
    #[arg(long, env = "PING_TARGET", default_value = "8.8.8.8")]
    pub ping_target: String,

    /// Management station pinged by ssh-check
    #[arg(long, env = "MGMT_TARGET", default_value = "10.0.0.1")]
    pub mgmt_target: String,
}

impl CommonArgs {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }
}

#[derive(Debug, Clone, Args)]
pub struct PipelineArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Maximum devices verified concurrently
    #[arg(long, env = "CONCURRENCY", default_value_t = 4)]
    pub concurrency: usize,

    /// Hard per-device deadline in seconds (connect + checks)
    #[arg(long, env = "DEVICE_DEADLINE_SECS", default_value_t = 60)]
    pub device_deadline: u64,
}

impl PipelineArgs {
    pub fn settings(&self) -> PipelineSettings {
        PipelineSettings {
            concurrency: self.concurrency,
            device_deadline: Duration::from_secs(self.device_deadline),
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct VerifyArgs {
    #[command(flatten)]
    pub pipeline: PipelineArgs,

    /// Comma-separated check names to run (registry order applies)
    #[arg(
        long,
        value_delimiter = ',',
        default_values_t = [crate::checks::OSPF_NEIGHBORS.to_string(), crate::checks::BGP_SESSIONS.to_string()]
    )]
    pub checks: Vec<String>,
}

#[derive(Debug, Clone, Args)]
pub struct HealthArgs {
    /// Host to snapshot, as listed in the inventory
    pub host: String,

    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Debug, Clone, Args)]
pub struct RotateArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Audit log receiving one row per successful rotation
    #[arg(long, env = "AUDIT_LOG", default_value = "Device-credentials.txt")]
    pub audit_log: PathBuf,

    /// Generated password length
    #[arg(long, env = "PASSWORD_LENGTH", default_value_t = crate::rotation::DEFAULT_PASSWORD_LENGTH)]
    pub password_length: usize,

    /// Allow the plaintext credential summary webhook (insecure audit mode)
    #[arg(long, env = "INSECURE_NOTIFY")]
    pub insecure_notify: bool,

    /// Webhook URL for the rotation summary
    #[arg(long, env = "NOTIFY_WEBHOOK_URL")]
    pub webhook_url: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct ValidateIpArgs {
    /// Addresses to classify
    #[arg(required = true)]
    pub addresses: Vec<String>,
}
