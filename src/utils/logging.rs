use std::{
    fs::{self, OpenOptions},
    io,
    path::Path,
    sync::Mutex,
};

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. `RUST_LOG` wins when set; otherwise the
/// level comes from `debug`. With `log_file`, lines are appended there without
/// ANSI colours instead of going to stderr.
pub fn init_logging(debug: bool, log_file: Option<&Path>) -> io::Result<()> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = env_filter(debug, rust_log.as_deref());

    let result = match log_file {
        Some(path) => {
            // Create log directory if it doesn't exist
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .try_init(),
    };

    result.map_err(|e| io::Error::new(io::ErrorKind::Other, e))
}

fn env_filter(debug: bool, directives: Option<&str>) -> EnvFilter {
    let level = if debug { Level::DEBUG } else { Level::INFO };
    EnvFilter::builder()
        .with_default_directive(level.into())
        .parse_lossy(directives.unwrap_or_default())
}
