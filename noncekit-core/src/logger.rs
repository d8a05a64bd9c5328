use std::sync::{Arc, OnceLock};

/// Receives log records emitted by `NonceKit`.
///
/// Hosts without a `log` backend of their own can implement this trait and
/// register it with [`set_logger`].
///
/// # Examples
///
/// ```rust
/// use noncekit_core::logger::{LogLevel, Logger};
///
/// struct StderrLogger;
///
/// impl Logger for StderrLogger {
///     fn log(&self, level: LogLevel, message: String) {
///         eprintln!("[{level:?}] {message}");
///     }
/// }
/// ```
#[cfg_attr(feature = "ffi", uniffi::export(with_foreign))]
pub trait Logger: Sync + Send {
    /// Logs a message at the specified log level.
    fn log(&self, level: LogLevel, message: String);
}

/// Severity of a log message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
pub enum LogLevel {
    /// Very low priority, extremely detailed messages.
    Trace,
    /// Lower priority debugging information.
    Debug,
    /// Progress of the application.
    Info,
    /// Potentially harmful situations.
    Warn,
    /// Errors the application may recover from.
    Error,
}

impl From<log::Level> for LogLevel {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Error => Self::Error,
            log::Level::Warn => Self::Warn,
            log::Level::Info => Self::Info,
            log::Level::Debug => Self::Debug,
            log::Level::Trace => Self::Trace,
        }
    }
}

/// Forwards `log` records to the registered [`Logger`].
struct ForeignLogger;

impl log::Log for ForeignLogger {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        if !should_forward(record.level(), record.module_path()) {
            return;
        }

        if let Some(logger) = LOGGER_INSTANCE.get() {
            logger.log(record.level().into(), format!("{}", record.args()));
        } else {
            eprintln!("Logger not set: {}", record.args());
        }
    }

    fn flush(&self) {}
}

/// Debug and Trace records are only forwarded from this crate.
fn should_forward(level: log::Level, module_path: Option<&str>) -> bool {
    let is_debug_or_trace = matches!(level, log::Level::Debug | log::Level::Trace);
    let is_from_noncekit = module_path.is_some_and(|path| path.starts_with("noncekit"));
    !is_debug_or_trace || is_from_noncekit
}

static LOGGER_INSTANCE: OnceLock<Arc<dyn Logger>> = OnceLock::new();

/// Registers the global logger and installs the `log` bridge.
///
/// Only the first registration takes effect; later calls are reported on
/// stderr and otherwise ignored.
#[cfg_attr(feature = "ffi", uniffi::export)]
pub fn set_logger(logger: Arc<dyn Logger>) {
    if LOGGER_INSTANCE.set(logger).is_err() {
        eprintln!("Logger already set");
        return;
    }

    if let Err(e) = init_logger() {
        eprintln!("Failed to set logger: {e}");
    }
}

fn init_logger() -> Result<(), log::SetLoggerError> {
    static LOGGER: ForeignLogger = ForeignLogger;
    log::set_logger(&LOGGER)?;
    log::set_max_level(log::LevelFilter::Trace);
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct CapturingLogger {
        records: Mutex<Vec<(LogLevel, String)>>,
    }

    impl Logger for CapturingLogger {
        fn log(&self, level: LogLevel, message: String) {
            self.records.lock().expect("lock").push((level, message));
        }
    }

    #[test]
    fn test_should_forward() {
        assert!(should_forward(log::Level::Info, Some("other_crate")));
        assert!(should_forward(log::Level::Debug, Some("noncekit_core::engine")));
        assert!(!should_forward(log::Level::Debug, Some("other_crate")));
        assert!(!should_forward(log::Level::Trace, None));
    }

    #[test]
    fn test_set_logger_forwards_records() {
        let logger = Arc::new(CapturingLogger::default());
        set_logger(logger.clone());

        log::warn!("nonce test record");

        let records = logger.records.lock().expect("lock");
        assert!(records
            .iter()
            .any(|(level, message)| *level == LogLevel::Warn && message == "nonce test record"));
    }
}
