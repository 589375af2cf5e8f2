use std::path::Path;
use anyhow::Result;
use flexi_logger::{FileSpec, Logger, LoggerHandle};

/// Log to files under `dir`. Stderr belongs to the terminal UI.
///
/// `RUST_LOG` wins over `level`. Keep the returned handle alive for the
/// lifetime of the program.
pub fn init(level: &str, dir: &Path) -> Result<LoggerHandle> {
    let handle = Logger::try_with_env_or_str(level)?
        .log_to_file(FileSpec::default().directory(dir).basename("chatline"))
        .format(flexi_logger::detailed_format)
        .start()?;

    Ok(handle)
}
