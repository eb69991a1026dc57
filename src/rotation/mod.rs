//! Credential rotation pipeline.
//!
//! For each device: generate a fresh username/password pair, push it over a
//! session, append an audit row, and update the in-memory inventory. The
//! inventory file is rewritten once after all devices are processed.
//! Per-device failures are logged and skipped, never fatal.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::inventory::{ConfigError, Inventory};
use crate::models::{Device, RotationRecord};
use crate::session::{SessionError, SessionFactory};

/// Symbols allowed in generated passwords, alongside ASCII letters and digits.
pub const PASSWORD_SYMBOLS: &str = "!@#$%&*()-_=+";

pub const DEFAULT_PASSWORD_LENGTH: usize = 16;

const AUDIT_HEADER: &str = "timestamp_utc,device,username,password";

/// New username: time-stamped prefix plus a two-digit random suffix,
/// e.g. `user20260828_42`.
pub fn generate_username() -> String {
    let date = Utc::now().format("%Y%m%d");
    let suffix: u8 = rand::thread_rng().gen_range(10..=99);
    format!("user{}_{}", date, suffix)
}

/// Random password drawn from letters, digits and `PASSWORD_SYMBOLS`.
/// Always contains at least one character from each class; lengths below 3
/// are bumped to 3 to keep that guarantee.
pub fn generate_password(length: usize) -> String {
    let length = length.max(3);
    let letters: Vec<char> = ('a'..='z').chain('A'..='Z').collect();
    let digits: Vec<char> = ('0'..='9').collect();
    let symbols: Vec<char> = PASSWORD_SYMBOLS.chars().collect();
    let alphabet: Vec<char> = letters
        .iter()
        .chain(digits.iter())
        .chain(symbols.iter())
        .copied()
        .collect();

    let mut rng = rand::thread_rng();
    let mut chars = Vec::with_capacity(length);
    chars.push(letters[rng.gen_range(0..letters.len())]);
    chars.push(digits[rng.gen_range(0..digits.len())]);
    chars.push(symbols[rng.gen_range(0..symbols.len())]);
    while chars.len() < length {
        chars.push(alphabet[rng.gen_range(0..alphabet.len())]);
    }
    chars.shuffle(&mut rng);
    chars.into_iter().collect()
}

/// Push new credentials to one device and return the (username, password)
/// pair. The replacement account is created before the old one is removed,
/// so a rejected delete cannot strand the device without a working login.
pub fn rotate_on_device(
    factory: &dyn SessionFactory,
    device: &Device,
    password_length: usize,
) -> Result<(String, String), SessionError> {
    let new_user = generate_username();
    let new_pass = generate_password(password_length);

    let commands = [
        format!("username {} secret {}", new_user, new_pass),
        format!("no username {}", device.current_username),
    ];

    let mut session = factory.open(device)?;
    for command in &commands {
        if let Err(e) = session.run(command) {
            session.close();
            return Err(e);
        }
    }
    session.close();

    Ok((new_user, new_pass))
}

/// Append one record to the audit log. The header row is written only when
/// the file is newly created. The log is append-only; rows are never
/// rewritten.
pub fn append_audit_record(path: &Path, record: &RotationRecord) -> std::io::Result<()> {
    use std::io::Write;

    let new_file = !path.exists();
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    if new_file {
        writeln!(file, "{}", AUDIT_HEADER)?;
    }
    writeln!(
        file,
        "{},{},{},{}",
        record.timestamp_utc.to_rfc3339(),
        record.host,
        record.new_username,
        record.new_password
    )?;
    Ok(())
}

/// Rotate every device in the inventory, persist the inventory once at the
/// end, and return the records of the rotations that succeeded.
///
/// The audit row lands before the in-memory inventory is touched, so a
/// crash mid-run still leaves a recoverable trail for the devices already
/// rotated.
pub async fn run_rotation(
    factory: Arc<dyn SessionFactory>,
    inventory: &mut Inventory,
    inventory_path: &Path,
    audit_log: &Path,
    password_length: usize,
) -> Result<Vec<RotationRecord>, ConfigError> {
    let mut rotated = Vec::new();

    for device in inventory.devices_mut() {
        tracing::info!("{}: rotating as {}", device.host, device.current_username);

        let factory = factory.clone();
        let snapshot = device.clone();
        let joined = tokio::task::spawn_blocking(move || {
            rotate_on_device(factory.as_ref(), &snapshot, password_length)
        })
        .await;

        let (new_user, new_pass) = match joined {
            Ok(Ok(pair)) => pair,
            Ok(Err(e)) => {
                tracing::error!("{}: rotation failed: {}", device.host, e);
                continue;
            }
            Err(e) => {
                tracing::error!("{}: rotation task failed: {}", device.host, e);
                continue;
            }
        };

        let record = RotationRecord {
            timestamp_utc: Utc::now(),
            host: device.host.clone(),
            new_username: new_user.clone(),
            new_password: new_pass.clone(),
        };

        if let Err(e) = append_audit_record(audit_log, &record) {
            // The device already accepted the new account; without an audit
            // row the old inventory entry is the only recoverable state, so
            // leave it untouched and report loudly.
            tracing::error!(
                "{}: rotated on device but audit append failed, inventory entry left unchanged: {}",
                device.host,
                e
            );
            continue;
        }

        device.current_username = new_user;
        device.current_password = new_pass;
        rotated.push(record);
        tracing::info!("{}: rotation complete", device.host);
    }

    inventory.save(inventory_path)?;
    Ok(rotated)
}
