//! Plugin log file setup.
//!
//! Records go through the `log` macros into `SC4GraphicsOptions.log` next
//! to the DLL. The file is recreated on every start and begins with a
//! header line naming the plugin version.

use std::fmt::Display;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Once;

use env_logger::{Builder, Env, Target};
use log::{Level, LevelFilter};

use crate::constants::LOG_FILTER_ENV;

// The host may load and start the director more than once in a process;
// env_logger can only be installed a single time.
static LOGGER_INIT: Once = Once::new();

pub fn log_file_header() -> String {
    format!("SC4GraphicsOptions v{}", env!("CARGO_PKG_VERSION"))
}

/// Creates the log file and writes the header line.
pub fn open_log_file(path: &Path) -> io::Result<File> {
    let mut file = File::create(path)?;
    writeln!(file, "{}", log_file_header())?;
    Ok(file)
}

pub fn format_line(level: Level, timestamp: Option<&str>, message: impl Display) -> String {
    match timestamp {
        Some(ts) => format!("{} {:<5} {}", ts, level, message),
        None => format!("{:<5} {}", level, message),
    }
}

pub fn init_logging(log_file: &Path, include_timestamp: bool) {
    LOGGER_INIT.call_once(|| {
        let mut builder = Builder::from_env(Env::new().filter_or(LOG_FILTER_ENV, "info"));
        builder
            .filter_module("retour", LevelFilter::Warn)
            .format(move |buf, record| {
                let timestamp = include_timestamp.then(|| buf.timestamp_seconds().to_string());
                writeln!(buf, "{}", format_line(record.level(), timestamp.as_deref(), record.args()))
            });

        match open_log_file(log_file) {
            Ok(file) => {
                builder.target(Target::Pipe(Box::new(file)));
            }
            Err(e) => {
                eprintln!(
                    "[SC4GraphicsOptions] Unable to create {}: {}. Logging to stderr.",
                    log_file.display(),
                    e
                );
            }
        }

        if builder.try_init().is_err() {
            eprintln!("[SC4GraphicsOptions] A logger is already installed.");
        }
    });
}
