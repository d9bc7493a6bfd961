//! Log file setup.
//!
//! lightwatch usually runs from cron, so logs go to a file
//! (`~/check-<instance>.log` by default). The file is rotated by size
//! once per run, before the subscriber opens it.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use lightwatch_core::LightwatchConfig;

const DEFAULT_FILTER: &str = "info,lightwatch=debug";

/// Where log output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    File(PathBuf),
}

/// Pick the log target: `--log-file`, then `[log].file`, then
/// `~/check-<instance>.log`. A path of `-` means stderr.
pub fn resolve_target(flag: Option<&Path>, config: &LightwatchConfig, instance: &str) -> LogTarget {
    let chosen = flag.or(config.log.file.as_deref());
    match chosen {
        Some(path) if path == Path::new("-") => LogTarget::Stderr,
        Some(path) => LogTarget::File(path.to_path_buf()),
        None => LogTarget::File(home_dir().join(format!("check-{instance}.log"))),
    }
}

fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .filter(|h| !h.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Install the global tracing subscriber.
pub fn init(target: &LogTarget, config: &LightwatchConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))
        .context("invalid log filter")?;

    match target {
        LogTarget::Stderr => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::stderr)
                .init();
        }
        LogTarget::File(path) => {
            rotate_if_needed(path, config.log_max_bytes(), config.log_backups())
                .with_context(|| format!("failed to rotate log file {}", path.display()))?;
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
    }
    Ok(())
}

/// Rotate `path` to `path.1` (shifting older backups up) once it has
/// reached `max_bytes`. Backups beyond `backups` are discarded.
/// `max_bytes == 0` disables rotation.
pub fn rotate_if_needed(path: &Path, max_bytes: u64, backups: u32) -> io::Result<()> {
    if max_bytes == 0 {
        return Ok(());
    }

    let len = match fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };
    if len < max_bytes {
        return Ok(());
    }

    if backups == 0 {
        return fs::remove_file(path);
    }

    for n in (1..backups).rev() {
        let from = backup_path(path, n);
        if from.exists() {
            fs::rename(&from, backup_path(path, n + 1))?;
        }
    }
    fs::rename(path, backup_path(path, 1))
}

fn backup_path(path: &Path, n: u32) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(format!(".{n}"));
    PathBuf::from(name)
}
