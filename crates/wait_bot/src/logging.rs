//! Logger setup. Records always go to stderr; `WAIT_BOT_LOG_FILE` adds a file copy.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

/// Environment variable naming an optional log file.
pub const LOG_FILE_VAR: &str = "WAIT_BOT_LOG_FILE";

/// Writer duplicating every record to two sinks
struct Tee<A, B> {
    console: A,
    file: B,
}

impl<A: Write, B: Write> Write for Tee<A, B> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.console.write_all(buf)?;
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.console.flush()?;
        self.file.flush()
    }
}

/// Installs the process-wide logger.
///
/// Filtering follows `RUST_LOG` and defaults to `info`. When `log_file` is given,
/// records are appended to that file as well as printed to stderr.
pub fn init(log_file: Option<&Path>) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::new().default_filter_or("info"));

    let mut file_error = None;
    if let Some(path) = log_file {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => {
                builder.target(env_logger::Target::Pipe(Box::new(Tee {
                    console: io::stderr(),
                    file,
                })));
            }
            Err(e) => file_error = Some(e),
        }
    }

    if builder.try_init().is_err() {
        return;
    }

    if let (Some(path), Some(e)) = (log_file, file_error) {
        log::warn!(
            "❌ Could not open log file {}: {}. Logging to stderr only",
            path.display(),
            e
        );
    }
}
