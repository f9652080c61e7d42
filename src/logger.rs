use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::Level;

fn exe_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|d| d.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn log_path() -> PathBuf {
    exe_dir().join("log.txt")
}

/// Installs the global subscriber, appending to `log.txt` next to the executable.
/// Falls back to stderr when the file can't be opened. Safe to call more than once.
pub fn init() {
    let path = log_path();
    let builder = tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false);

    match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(mut f) => {
            let _ = writeln!(f, "===== notice-translator start =====");
            let _ = builder.with_ansi(false).with_writer(Mutex::new(f)).try_init();
        }
        Err(e) => {
            let _ = builder.with_writer(std::io::stderr).try_init();
            tracing::warn!("Could not open {}: {}; logging to stderr", path.display(), e);
        }
    }
}
