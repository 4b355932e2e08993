//! Measurement error taxonomy.
//!
//! A full TPM event log is deliberately absent: the PCR was still extended,
//! so the measurement holds and the call reports success with a warning.

use thiserror::Error;
use uefi::Status;

/// Why an image was not measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MeasureError {
    /// Malformed call: empty image buffer, or an image too large for a TCG2 event.
    #[error("invalid argument: image data is empty or oversized")]
    InvalidArgument,
    /// A TPM protocol exists but the TPM is not functional.
    #[error("TPM not functional")]
    NoDevice,
    /// No TPM, unmeasurable image kind, TPM 1.2, or measurement compiled out.
    #[error("measurement not supported")]
    NotSupported,
    /// The event record could not be allocated.
    #[error("out of memory building TCG2 event")]
    OutOfMemory,
    /// The firmware rejected the extend; the status is kept for diagnostics.
    #[error("TCG2 protocol failure: {0:?}")]
    ProtocolFailure(Status),
}

pub type MeasureResult = Result<(), MeasureError>;

impl MeasureError {
    /// Firmware status a UEFI caller returns for this outcome.
    pub fn status(&self) -> Status {
        match self {
            MeasureError::InvalidArgument => Status::INVALID_PARAMETER,
            MeasureError::NoDevice => Status::NO_MEDIA,
            MeasureError::NotSupported => Status::UNSUPPORTED,
            MeasureError::OutOfMemory => Status::OUT_OF_RESOURCES,
            MeasureError::ProtocolFailure(status) => *status,
        }
    }
}
