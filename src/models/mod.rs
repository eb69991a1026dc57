use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Capability tags a device record can carry. A check that declares a
/// capability only applies to devices tagged with it.
pub mod capability {
    pub const OSPF: &str = "ospf";
    pub const BGP: &str = "bgp";
}

/// One managed network element from the inventory file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    /// Unique identifier across the inventory; an IP address in practice.
    pub host: String,
    /// Vendor CLI family, e.g. "cisco_ios" or "arista_eos".
    pub device_type: String,
    pub current_username: String,
    pub current_password: String,
    /// Capability tags deciding which checks apply (e.g. ["ospf", "bgp"]).
    #[serde(default)]
    pub checks: Vec<String>,
}

impl Device {
    pub fn has_capability(&self, tag: &str) -> bool {
        self.checks.iter().any(|c| c == tag)
    }
}

/// Outcome of a single check against a single device.
///
/// ERROR (connection or command failure) is distinct from FAIL (device
/// reachable, condition not met); both count as not-PASS for the aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Verdict {
    Pass,
    Fail,
    Error,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Pass => write!(f, "PASS"),
            Verdict::Fail => write!(f, "FAIL"),
            Verdict::Error => write!(f, "ERROR"),
        }
    }
}

/// Result of one named check against one device.
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub device_host: String,
    pub check_name: String,
    pub verdict: Verdict,
    /// Raw command output, or the error text for ERROR verdicts.
    pub detail: String,
}

/// Aggregated verification outcome for a single device.
#[derive(Debug, Clone)]
pub struct DeviceReport {
    pub host: String,
    pub username: String,
    pub connected: bool,
    /// Connection-level error text when `connected` is false.
    pub connect_error: Option<String>,
    pub results: Vec<CheckResult>,
}

impl DeviceReport {
    /// True iff the device connected and every applied check passed.
    pub fn passed(&self) -> bool {
        self.connected && self.results.iter().all(|r| r.verdict == Verdict::Pass)
    }
}

/// One historical credential change, appended to the audit log and included
/// in the rotation summary notification.
#[derive(Debug, Clone, Serialize)]
pub struct RotationRecord {
    pub timestamp_utc: DateTime<Utc>,
    pub host: String,
    pub new_username: String,
    pub new_password: String,
}
