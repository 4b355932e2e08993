//! NØNOS Measurement Logging

pub mod logger;

pub use logger::{log_debug, log_error, log_info, log_warn};
