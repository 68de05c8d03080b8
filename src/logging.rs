//! Logger initialization.

use std::io::Write;

use log::{LevelFilter, SetLoggerError};

/// Initialize `env_logger`.
///
/// `RUST_LOG` is read first, then `level` overrides it for this crate and as
/// the global default. HTTP client internals stay at `warn` unless the caller
/// asks for `trace`.
pub fn init_logger(level: LevelFilter) -> Result<(), SetLoggerError> {
    let mut builder = env_logger::Builder::from_default_env();

    let noisy = if level == LevelFilter::Trace { LevelFilter::Trace } else { LevelFilter::Warn };
    builder.filter_level(level);
    builder.filter_module("ureq", noisy);
    builder.filter_module("rustls", noisy);
    builder.filter_module("hyper", noisy);
    builder.filter_module("rideprompt", level);

    builder.format(|buf, record| {
        writeln!(
            buf,
            "[{} {:<5} {}] {}",
            chrono::Local::now().format("%H:%M:%S"),
            record.level(),
            record.target(),
            record.args()
        )
    });

    // try_init: tests may initialize more than once per process.
    builder.try_init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logger_twice_does_not_panic() {
        let _ = init_logger(LevelFilter::Info);
        assert!(init_logger(LevelFilter::Debug).is_err());
    }
}
