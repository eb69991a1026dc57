mod checks;
mod config;
mod inventory;
mod ipcheck;
mod models;
mod notify;
mod pipeline;
mod report;
mod rotation;
mod session;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::{Cli, Command, HealthArgs, PipelineArgs, RotateArgs, VerifyArgs};
use inventory::Inventory;
use notify::WebhookNotifier;
use pipeline::Pipeline;
use session::ssh::SshSessionFactory;
use session::{DeviceSession, SessionError, SessionFactory};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "labnet=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Dispatch one subcommand; the returned flag becomes the process exit
/// status (true = 0), the externally observable automation contract.
async fn run(cli: Cli) -> anyhow::Result<bool> {
    match cli.command {
        Command::Verify(args) => run_verify(&args).await,
        Command::Reachability(args) => run_reachability(&args).await,
        Command::SshCheck(args) => run_ssh_check(&args).await,
        Command::Health(args) => run_health(&args).await,
        Command::Rotate(args) => run_rotate(&args).await,
        Command::ValidateIp(args) => Ok(run_validate_ip(&args.addresses)),
    }
}

fn ssh_factory(common: &config::CommonArgs) -> Arc<dyn SessionFactory> {
    Arc::new(SshSessionFactory::new(common.connect_timeout()))
}

async fn run_verify(args: &VerifyArgs) -> anyhow::Result<bool> {
    let common = &args.pipeline.common;
    let selected = checks::select(&common.ping_target, &common.mgmt_target, &args.checks)?;

    let inventory = Inventory::load(&common.inventory)?;
    let pipeline = Pipeline::new(ssh_factory(common), selected, args.pipeline.settings());
    let run_report = pipeline.run(inventory.devices()).await;

    print!(
        "{}",
        report::render_verification("Routing Health Check", &run_report)
    );
    Ok(run_report.all_passed())
}

async fn run_reachability(args: &PipelineArgs) -> anyhow::Result<bool> {
    let common = &args.common;
    let inventory = Inventory::load(&common.inventory)?;
    let pipeline = Pipeline::new(
        ssh_factory(common),
        vec![checks::reachability_check(&common.ping_target)],
        args.settings(),
    );
    let run_report = pipeline.run(inventory.devices()).await;

    print!(
        "{}",
        report::render_verification("Webserver Ping Test", &run_report)
    );
    Ok(run_report.all_passed())
}

async fn run_ssh_check(args: &PipelineArgs) -> anyhow::Result<bool> {
    let common = &args.common;
    let inventory = Inventory::load(&common.inventory)?;
    let pipeline = Pipeline::new(
        ssh_factory(common),
        vec![checks::mgmt_reachability_check(&common.mgmt_target)],
        args.settings(),
    );
    let run_report = pipeline.run(inventory.devices()).await;

    println!("Checking SSH connectivity and management reachability...\n");
    let headers = vec![
        "Host".to_string(),
        "Username".to_string(),
        "SSH Status".to_string(),
        format!("Ping {}", common.mgmt_target),
    ];
    print!(
        "{}",
        report::render_table(&headers, &report::ssh_check_rows(&run_report))
    );
    Ok(run_report.all_passed())
}

async fn run_health(args: &HealthArgs) -> anyhow::Result<bool> {
    let common = &args.common;
    let inventory = Inventory::load(&common.inventory)?;

    let Some(device) = inventory.find(&args.host) else {
        println!("Device with IP {} not found", args.host);
        return Ok(false);
    };

    let factory = SshSessionFactory::new(common.connect_timeout());
    let device = device.clone();
    let commands = checks::snapshot_commands(&common.ping_target);

    let snapshot = tokio::task::spawn_blocking(
        move || -> Result<Vec<(&'static str, String)>, SessionError> {
            let mut session: Box<dyn DeviceSession> = factory.open(&device)?;
            let mut outputs = Vec::with_capacity(commands.len());
            for (label, command) in commands {
                // per-command failures reported inline; the session keeps going
                let output = match session.run(&command) {
                    Ok(output) => output,
                    Err(e) => format!("Error: {}", e),
                };
                outputs.push((label, output));
            }
            session.close();
            Ok(outputs)
        },
    )
    .await?;

    match snapshot {
        Ok(outputs) => {
            for (label, output) in outputs {
                println!("--- {} ---\n{}\n", label, output);
            }
            Ok(true)
        }
        Err(e) => {
            println!("[ERROR] {}", e);
            Ok(false)
        }
    }
}

async fn run_rotate(args: &RotateArgs) -> anyhow::Result<bool> {
    let common = &args.common;
    let mut inventory = Inventory::load(&common.inventory)?;

    let rotated = rotation::run_rotation(
        ssh_factory(common),
        &mut inventory,
        &common.inventory,
        &args.audit_log,
        args.password_length,
    )
    .await?;

    println!(
        "Inventory updated with latest credentials ({}/{} devices rotated).",
        rotated.len(),
        inventory.devices().len()
    );

    if !rotated.is_empty() && args.insecure_notify {
        match &args.webhook_url {
            Some(url) => {
                // Inventory and audit log are already persisted; a send
                // failure surfaces but cannot lose rotation state.
                WebhookNotifier::new(url.clone())
                    .send_rotation_summary(&rotated)
                    .await?;
                println!("Rotation summary sent to {}", url);
            }
            None => {
                tracing::warn!("--insecure-notify set but no webhook URL configured; skipping notification");
            }
        }
    }

    Ok(true)
}

fn run_validate_ip(addresses: &[String]) -> bool {
    let mut valid = 0usize;
    let mut invalid = 0usize;

    println!("\nIP Address Validation Results:\n");
    for address in addresses {
        let line = ipcheck::describe(address);
        if line.starts_with("Valid") {
            valid += 1;
        } else {
            invalid += 1;
        }
        println!("{}", line);
    }

    println!("\nSummary:");
    println!("Total Records: {}", addresses.len());
    println!("Valid IPs: {}", valid);
    println!("Invalid IPs: {}", invalid);

    invalid == 0
}
