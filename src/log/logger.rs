//! Category-tagged diagnostics routed through the `log` facade.
//!
//! Under UEFI the `uefi-services` console logger is installed by the
//! application entry point; any other host installs its own `log::Log`.
//! The category becomes the record target, so a sink can filter per
//! subsystem (`measure`, `tpm2`, `firmware`, ...).

#[cfg(feature = "logging")]
#[inline]
pub fn log_debug(category: &str, msg: &str) {
    ::log::debug!(target: category, "{}", msg);
}

#[cfg(feature = "logging")]
#[inline]
pub fn log_info(category: &str, msg: &str) {
    ::log::info!(target: category, "{}", msg);
}

#[cfg(feature = "logging")]
#[inline]
pub fn log_warn(category: &str, msg: &str) {
    ::log::warn!(target: category, "{}", msg);
}

#[cfg(feature = "logging")]
#[inline]
pub fn log_error(category: &str, msg: &str) {
    ::log::error!(target: category, "{}", msg);
}

#[cfg(not(feature = "logging"))]
#[inline]
pub fn log_debug(_category: &str, _msg: &str) {}

#[cfg(not(feature = "logging"))]
#[inline]
pub fn log_info(_category: &str, _msg: &str) {}

#[cfg(not(feature = "logging"))]
#[inline]
pub fn log_warn(_category: &str, _msg: &str) {}

#[cfg(not(feature = "logging"))]
#[inline]
pub fn log_error(_category: &str, _msg: &str) {}

/// Per-thread record capture for unit tests.
#[cfg(test)]
pub(crate) mod capture {
    use std::cell::RefCell;
    use std::string::{String, ToString};
    use std::sync::Once;
    use std::vec::Vec;

    use ::log::{Level, LevelFilter, Log, Metadata, Record};

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub(crate) struct Captured {
        pub level: Level,
        pub target: String,
        pub message: String,
    }

    thread_local! {
        static RECORDS: RefCell<Vec<Captured>> = RefCell::new(Vec::new());
    }

    struct CaptureLogger;

    impl Log for CaptureLogger {
        fn enabled(&self, _metadata: &Metadata) -> bool {
            true
        }

        fn log(&self, record: &Record) {
            RECORDS.with(|records| {
                records.borrow_mut().push(Captured {
                    level: record.level(),
                    target: record.target().to_string(),
                    message: record.args().to_string(),
                })
            });
        }

        fn flush(&self) {}
    }

    static LOGGER: CaptureLogger = CaptureLogger;
    static INSTALL: Once = Once::new();

    /// Install the capture logger (once per process) and clear this thread's records.
    pub(crate) fn install() {
        INSTALL.call_once(|| {
            let _ = ::log::set_logger(&LOGGER);
            ::log::set_max_level(LevelFilter::Trace);
        });
        RECORDS.with(|records| records.borrow_mut().clear());
    }

    /// Drain everything this thread logged since `install`.
    pub(crate) fn take() -> Vec<Captured> {
        RECORDS.with(|records| records.borrow_mut().drain(..).collect())
    }

    pub(crate) fn warnings() -> Vec<Captured> {
        take().into_iter().filter(|c| c.level == Level::Warn).collect()
    }
}
