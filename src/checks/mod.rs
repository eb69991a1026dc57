//! The check registry: a fixed, ordered set of named verification rules.
//!
//! Each check pairs one literal CLI command with a text-pattern matcher.
//! The literals are the wire contract with real equipment and are kept
//! byte-for-byte; changing them breaks the heuristics against live gear.

use crate::models::{capability, Device, Verdict};

/// A named, deterministic text-pattern rule mapping command output to a
/// PASS/FAIL verdict.
pub struct Check {
    pub name: &'static str,
    /// Capability tag a device must carry for this check to apply;
    /// `None` applies to every device.
    pub capability: Option<&'static str>,
    pub command: String,
    matcher: fn(&str) -> Verdict,
}

impl Check {
    pub fn evaluate(&self, output: &str) -> Verdict {
        (self.matcher)(output)
    }

    pub fn applies_to(&self, device: &Device) -> bool {
        match self.capability {
            None => true,
            Some(tag) => device.has_capability(tag),
        }
    }
}

pub const OSPF_NEIGHBORS: &str = "ospf-neighbors";
pub const BGP_SESSIONS: &str = "bgp-sessions";
pub const REACHABILITY: &str = "reachability";
pub const MGMT_REACHABILITY: &str = "mgmt-reachability";

/// PASS iff the substring `FULL` appears (case-sensitive).
fn ospf_full(output: &str) -> Verdict {
    if output.contains("FULL") {
        Verdict::Pass
    } else {
        Verdict::Fail
    }
}

/// PASS iff the output contains `established` or `estab`, case-insensitively.
fn bgp_established(output: &str) -> Verdict {
    let lower = output.to_lowercase();
    if lower.contains("established") || lower.contains("estab") {
        Verdict::Pass
    } else {
        Verdict::Fail
    }
}

/// FAIL iff the output reports total loss or an unreachable destination.
fn ping_clean(output: &str) -> Verdict {
    let lower = output.to_lowercase();
    if lower.contains("100 percent loss") || lower.contains("unreachable") {
        Verdict::Fail
    } else {
        Verdict::Pass
    }
}

/// PASS iff the output carries one of the vendor success phrases.
fn ping_succeeded(output: &str) -> Verdict {
    if output.contains("Success") || output.contains("bytes from") || output.contains("100% success")
    {
        Verdict::Pass
    } else {
        Verdict::Fail
    }
}

pub fn ospf_check() -> Check {
    Check {
        name: OSPF_NEIGHBORS,
        capability: Some(capability::OSPF),
        command: "show ip ospf neighbor".to_string(),
        matcher: ospf_full,
    }
}

pub fn bgp_check() -> Check {
    Check {
        name: BGP_SESSIONS,
        capability: Some(capability::BGP),
        command: "show ip bgp summary".to_string(),
        matcher: bgp_established,
    }
}

pub fn reachability_check(target: &str) -> Check {
    Check {
        name: REACHABILITY,
        capability: None,
        command: format!("ping {}", target),
        matcher: ping_clean,
    }
}

pub fn mgmt_reachability_check(target: &str) -> Check {
    Check {
        name: MGMT_REACHABILITY,
        capability: None,
        command: format!("ping {}", target),
        matcher: ping_succeeded,
    }
}

/// The full ordered registry.
pub fn registry(ping_target: &str, mgmt_target: &str) -> Vec<Check> {
    vec![
        ospf_check(),
        bgp_check(),
        reachability_check(ping_target),
        mgmt_reachability_check(mgmt_target),
    ]
}

/// Pick registry checks by name, preserving registry order.
/// Fails on an unknown name so typos surface before any device is contacted.
pub fn select(ping_target: &str, mgmt_target: &str, names: &[String]) -> anyhow::Result<Vec<Check>> {
    let mut checks = Vec::new();
    for check in registry(ping_target, mgmt_target) {
        if names.iter().any(|n| n == check.name) {
            checks.push(check);
        }
    }
    if checks.len() != names.len() {
        let known: Vec<&str> = registry(ping_target, mgmt_target)
            .iter()
            .map(|c| c.name)
            .collect();
        anyhow::bail!(
            "unknown check name in {:?}; known checks: {}",
            names,
            known.join(", ")
        );
    }
    Ok(checks)
}

/// Labelled raw-capture commands for the single-device health snapshot.
pub fn snapshot_commands(ping_target: &str) -> Vec<(&'static str, String)> {
    vec![
        ("IP Route", "show ip route".to_string()),
        ("OSPF Neighbors", "show ip ospf neighbor".to_string()),
        ("BGP Summary", "show ip bgp summary".to_string()),
        ("Interface Status", "show ip int brief".to_string()),
        ("Webserver Reachability", format!("ping {}", ping_target)),
    ]
}
