//! Verification pipeline: fan out over the inventory, verify each device in
//! isolation, aggregate into a single report.
//!
//! Per-device failures never abort the run. A device that cannot connect is
//! recorded as failed and the rest of the fleet still gets verified; the
//! aggregate verdict drives the process exit code.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::checks::Check;
use crate::models::{CheckResult, Device, DeviceReport, Verdict};
use crate::session::SessionFactory;

/// Tuning knobs for a verification run.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Maximum devices verified at once.
    pub concurrency: usize,
    /// Hard bound on one device's connect + checks, so a single stuck
    /// device cannot stall the rest of the run.
    pub device_deadline: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            concurrency: 4,
            device_deadline: Duration::from_secs(60),
        }
    }
}

/// Aggregated outcome of one verification run, in inventory order.
#[derive(Debug)]
pub struct PipelineReport {
    pub devices: Vec<DeviceReport>,
}

impl PipelineReport {
    /// Overall success iff every visited device connected and every applied
    /// check passed.
    pub fn all_passed(&self) -> bool {
        self.devices.iter().all(|d| d.passed())
    }
}

pub struct Pipeline {
    factory: Arc<dyn SessionFactory>,
    checks: Arc<Vec<Check>>,
    settings: PipelineSettings,
}

impl Pipeline {
    pub fn new(
        factory: Arc<dyn SessionFactory>,
        checks: Vec<Check>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            factory,
            checks: Arc::new(checks),
            settings,
        }
    }

    /// Verify every device with at least one applicable check. Devices with
    /// none are skipped entirely, matching the original membership-list
    /// behavior.
    pub async fn run(&self, devices: &[Device]) -> PipelineReport {
        let semaphore = Arc::new(Semaphore::new(self.settings.concurrency.max(1)));
        let mut join = JoinSet::new();

        for (index, device) in devices.iter().enumerate() {
            if !self.checks.iter().any(|c| c.applies_to(device)) {
                continue;
            }

            let semaphore = semaphore.clone();
            let factory = self.factory.clone();
            let checks = self.checks.clone();
            let device = device.clone();
            let deadline = self.settings.device_deadline;

            join.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                let host = device.host.clone();
                let username = device.current_username.clone();

                let work =
                    tokio::task::spawn_blocking(move || verify_device(factory.as_ref(), &checks, &device));

                let report = match tokio::time::timeout(deadline, work).await {
                    Ok(Ok(report)) => report,
                    Ok(Err(join_error)) => connect_failed_report(
                        &host,
                        &username,
                        format!("verification task failed: {}", join_error),
                    ),
                    Err(_) => {
                        tracing::warn!("{}: deadline of {:?} exceeded", host, deadline);
                        connect_failed_report(
                            &host,
                            &username,
                            format!("deadline of {}s exceeded", deadline.as_secs()),
                        )
                    }
                };

                (index, report)
            });
        }

        let mut indexed: Vec<(usize, DeviceReport)> = Vec::new();
        while let Some(joined) = join.join_next().await {
            match joined {
                Ok(pair) => indexed.push(pair),
                Err(e) => tracing::error!("verification task panicked: {}", e),
            }
        }
        indexed.sort_by_key(|(index, _)| *index);

        PipelineReport {
            devices: indexed.into_iter().map(|(_, report)| report).collect(),
        }
    }
}

fn connect_failed_report(host: &str, username: &str, error: String) -> DeviceReport {
    DeviceReport {
        host: host.to_string(),
        username: username.to_string(),
        connected: false,
        connect_error: Some(error),
        results: Vec::new(),
    }
}

/// Blocking single-device verification: connect, run each applicable check,
/// close on every path. Called from spawn_blocking.
fn verify_device(factory: &dyn SessionFactory, checks: &[Check], device: &Device) -> DeviceReport {
    let mut report = DeviceReport {
        host: device.host.clone(),
        username: device.current_username.clone(),
        connected: false,
        connect_error: None,
        results: Vec::new(),
    };

    let mut session = match factory.open(device) {
        Ok(session) => session,
        Err(e) => {
            tracing::warn!("{}: connection failed: {}", device.host, e);
            report.connect_error = Some(e.to_string());
            return report;
        }
    };
    report.connected = true;

    for check in checks.iter().filter(|c| c.applies_to(device)) {
        // A failed command is isolated; later checks on this session still run
        let result = match session.run(&check.command) {
            Ok(output) => CheckResult {
                device_host: device.host.clone(),
                check_name: check.name.to_string(),
                verdict: check.evaluate(&output),
                detail: output,
            },
            Err(e) => CheckResult {
                device_host: device.host.clone(),
                check_name: check.name.to_string(),
                verdict: Verdict::Error,
                detail: e.to_string(),
            },
        };
        if result.verdict != Verdict::Pass {
            tracing::warn!("{}: {} -> {}", device.host, result.check_name, result.verdict);
        }
        report.results.push(result);
    }

    session.close();
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks;
    use crate::session::mock::{MockDevice, MockFactory, MockFailure};

    fn device(host: &str, tags: &[&str]) -> Device {
        Device {
            host: host.to_string(),
            device_type: "arista_eos".to_string(),
            current_username: "admin".to_string(),
            current_password: "admin".to_string(),
            checks: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn routing_checks() -> Vec<Check> {
        vec![checks::ospf_check(), checks::bgp_check()]
    }

    #[tokio::test]
    async fn test_healthy_and_unreachable_devices() {
        let factory = Arc::new(
            MockFactory::new()
                .with_device(
                    "10.0.0.8",
                    MockDevice::healthy()
                        .reply("show ip ospf neighbor", "Neighbor 10.0.0.9 FULL/DR")
                        .reply("show ip bgp summary", "BGP state Established"),
                )
                .with_device("10.0.0.9", MockDevice::unreachable(MockFailure::Transport)),
        );

        let pipeline = Pipeline::new(
            factory.clone(),
            routing_checks(),
            PipelineSettings::default(),
        );
        let devices = vec![
            device("10.0.0.8", &["ospf", "bgp"]),
            device("10.0.0.9", &["ospf", "bgp"]),
        ];
        let report = pipeline.run(&devices).await;

        assert_eq!(report.devices.len(), 2);

        let healthy = &report.devices[0];
        assert!(healthy.connected);
        assert_eq!(healthy.results.len(), 2);
        assert!(healthy
            .results
            .iter()
            .all(|r| r.verdict == Verdict::Pass));
        assert_eq!(factory.closes_for("10.0.0.8"), 1);

        let unreachable = &report.devices[1];
        assert!(!unreachable.connected);
        assert!(unreachable.connect_error.is_some());

        // one failed device flips the aggregate, without stopping the run
        assert!(!report.all_passed());
    }

    #[tokio::test]
    async fn test_failed_check_flips_aggregate() {
        let factory = Arc::new(MockFactory::new().with_device(
            "10.0.0.4",
            MockDevice::healthy().reply("show ip ospf neighbor", "DOWN"),
        ));

        let pipeline = Pipeline::new(
            factory,
            vec![checks::ospf_check()],
            PipelineSettings::default(),
        );
        let report = pipeline.run(&[device("10.0.0.4", &["ospf"])]).await;

        assert_eq!(report.devices[0].results[0].verdict, Verdict::Fail);
        assert!(!report.all_passed());
    }

    #[tokio::test]
    async fn test_command_error_does_not_abort_session() {
        let factory = Arc::new(
            MockFactory::new().with_device(
                "10.0.0.8",
                MockDevice::healthy()
                    .failing_command("show ip ospf neighbor")
                    .reply("show ip bgp summary", "Established"),
            ),
        );

        let pipeline = Pipeline::new(
            factory.clone(),
            routing_checks(),
            PipelineSettings::default(),
        );
        let report = pipeline.run(&[device("10.0.0.8", &["ospf", "bgp"])]).await;

        let results = &report.devices[0].results;
        assert_eq!(results[0].verdict, Verdict::Error);
        // the second check still ran on the same session
        assert_eq!(results[1].verdict, Verdict::Pass);
        assert_eq!(factory.closes_for("10.0.0.8"), 1);
        assert!(!report.all_passed());
    }

    #[tokio::test]
    async fn test_devices_without_applicable_checks_are_skipped() {
        let factory = Arc::new(MockFactory::new().with_device(
            "10.0.0.8",
            MockDevice::healthy().reply("show ip bgp summary", "Estab"),
        ));

        let pipeline = Pipeline::new(
            factory,
            routing_checks(),
            PipelineSettings::default(),
        );
        let devices = vec![device("10.0.0.2", &[]), device("10.0.0.8", &["bgp"])];
        let report = pipeline.run(&devices).await;

        assert_eq!(report.devices.len(), 1);
        assert_eq!(report.devices[0].host, "10.0.0.8");
        assert!(report.all_passed());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_stuck_device_hits_deadline_without_stalling_others() {
        let factory = Arc::new(
            MockFactory::new()
                .with_device(
                    "10.0.0.4",
                    MockDevice::healthy()
                        .delay(Duration::from_millis(500))
                        .reply("show ip ospf neighbor", "FULL"),
                )
                .with_device(
                    "10.0.0.5",
                    MockDevice::healthy().reply("show ip ospf neighbor", "FULL"),
                ),
        );

        let settings = PipelineSettings {
            concurrency: 2,
            device_deadline: Duration::from_millis(50),
        };
        let pipeline = Pipeline::new(factory, vec![checks::ospf_check()], settings);
        let devices = vec![
            device("10.0.0.4", &["ospf"]),
            device("10.0.0.5", &["ospf"]),
        ];
        let report = pipeline.run(&devices).await;

        let stuck = &report.devices[0];
        assert!(!stuck.connected);
        assert!(stuck
            .connect_error
            .as_deref()
            .is_some_and(|e| e.contains("deadline")));

        let healthy = &report.devices[1];
        assert!(healthy.passed());
        assert!(!report.all_passed());
    }
}
