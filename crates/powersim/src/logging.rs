use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::storage::atomic_write;

pub const LOG_FILE_NAME: &str = "powersim.log";

/// A log file past this size is trimmed when logging starts (5 MB)
const MAX_LOG_BYTES: u64 = 5 * 1024 * 1024;
/// Bytes of recent history a trimmed log keeps (1 MB)
const KEEP_LOG_BYTES: u64 = 1024 * 1024;

/// Cut a log file over `MAX_LOG_BYTES` down to its last `KEEP_LOG_BYTES`,
/// starting at a line boundary. Returns the number of bytes dropped.
fn trim_log(path: &Path) -> std::io::Result<u64> {
    let len = match fs::metadata(path) {
        Ok(metadata) => metadata.len(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e),
    };
    if len <= MAX_LOG_BYTES {
        return Ok(0);
    }

    let mut file = File::open(path)?;
    file.seek(SeekFrom::Start(len - KEEP_LOG_BYTES))?;
    let mut tail = Vec::with_capacity(KEEP_LOG_BYTES as usize);
    file.take(KEEP_LOG_BYTES).read_to_end(&mut tail)?;

    let first_line = tail.iter().position(|&b| b == b'\n').map_or(0, |i| i + 1);
    let kept = &tail[first_line..];
    let dropped = len - kept.len() as u64;

    let mut trimmed = format!("--- {dropped} bytes of older log entries trimmed ---\n").into_bytes();
    trimmed.extend_from_slice(kept);
    atomic_write(path, &trimmed)?;
    Ok(dropped)
}

/// Initialize logging to stderr and, when `log_dir` is given, to
/// `{log_dir}/powersim.log`.
///
/// `RUST_LOG` takes precedence over `level` when set.
pub fn init_logging(log_dir: Option<&Path>, level: &str) -> color_eyre::Result<()> {
    let mut trimmed = 0;
    let file_layer = match log_dir {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            let log_path = dir.join(LOG_FILE_NAME);
            trimmed = trim_log(&log_path).unwrap_or_else(|e| {
                eprintln!("Warning: could not trim {}: {e}", log_path.display());
                0
            });
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_path)?;
            Some(
                fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_target(true),
            )
        }
        None => None,
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("powersim={level},powersim_core={level}")));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(file_layer)
        .try_init()?;

    if trimmed > 0 {
        tracing::debug!(bytes = trimmed, "trimmed old log entries");
    }
    tracing::debug!(log_dir = ?log_dir, "powersim logging initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_small_log_untouched() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(LOG_FILE_NAME);
        fs::write(&path, "line one\nline two\n").unwrap();

        assert_eq!(trim_log(&path).unwrap(), 0);
        assert_eq!(fs::read_to_string(&path).unwrap(), "line one\nline two\n");
    }

    #[test]
    fn test_large_log_keeps_recent_whole_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(LOG_FILE_NAME);
        let line = "x".repeat(99) + "\n";
        let count = (MAX_LOG_BYTES / 100) as usize + 10;
        fs::write(&path, line.repeat(count)).unwrap();

        let dropped = trim_log(&path).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();

        assert!(lines.next().unwrap().contains("trimmed"));
        assert!(lines.all(|l| l.len() == 99));
        assert!(content.len() as u64 <= KEEP_LOG_BYTES + 64);
        assert_eq!(dropped % 100, 0);
    }

    #[test]
    fn test_missing_log_is_ok() {
        let dir = tempdir().unwrap();
        assert_eq!(trim_log(&dir.path().join("absent.log")).unwrap(), 0);
    }
}
