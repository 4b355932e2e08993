//! EFI measurement backend — TCG2 event log extension of boot scripts.
//!
//! Flow per image:
//! - reject empty images before touching firmware
//! - prefer TCG2; fall back to the TPM 1.2 stub; otherwise unsupported
//! - `GetCapability` must report a present TPM before anything is built
//! - only scripts are measured: ASCII content as an `EV_EFI_ACTION` event
//! - `HashLogExtendEvent`; a full log still counts as measured
//!
//! The event record is an RAII guard, so it is released on every path
//! once built.

pub mod event;
#[cfg(feature = "measure-efi")]
pub mod firmware;
pub mod protocol;

#[cfg(test)]
pub(crate) mod fake;

use alloc::format;
use uefi::Status;

use crate::config::MeasureConfig;
use crate::error::{MeasureError, MeasureResult};
use crate::image::Image;
use crate::log::logger::{log_debug, log_warn};
use crate::measure::Measure;

pub use event::{EventPool, EventRecord, HeapPool};
pub use protocol::{Tcg, Tcg2, Tcg2BootServiceCapability};

/// TCG2 backend over discovered firmware protocols.
///
/// `T2` is the TCG2 protocol, `T1` the legacy TCG protocol, `P` the pool
/// event records are carved from. Handles are resolved once, when the
/// backend is built, and never re-resolved per call.
pub struct EfiMeasure<T2, T1, P> {
    tcg2: Option<T2>,
    tcg: Option<T1>,
    pool: P,
    config: MeasureConfig,
}

impl<T2: Tcg2, T1: Tcg, P: EventPool> EfiMeasure<T2, T1, P> {
    pub fn new(tcg2: Option<T2>, tcg: Option<T1>, pool: P) -> Self {
        Self::with_config(tcg2, tcg, pool, MeasureConfig::default())
    }

    pub fn with_config(tcg2: Option<T2>, tcg: Option<T1>, pool: P, config: MeasureConfig) -> Self {
        Self { tcg2, tcg, pool, config }
    }

    pub fn has_tcg2(&self) -> bool {
        self.tcg2.is_some()
    }

    pub fn has_tcg(&self) -> bool {
        self.tcg.is_some()
    }
}

impl<T2: Tcg2, T1: Tcg, P: EventPool> Measure for EfiMeasure<T2, T1, P> {
    const NAME: &'static str = "efi";

    fn measure_image(&mut self, image: &Image<'_>) -> MeasureResult {
        if image.is_empty() {
            log_debug("measure", "invalid argument: image data is empty");
            return Err(MeasureError::InvalidArgument);
        }

        if let Some(tcg2) = self.tcg2.as_mut() {
            return measure_tpm2(tcg2, &self.pool, &self.config, image);
        }
        if self.tcg.is_some() {
            return measure_tpm12(image);
        }

        log_debug("measure", "TCG/TCG2 protocol not found");
        Err(MeasureError::NotSupported)
    }
}

/// Open TCG2 first; the legacy protocol is only opened when TCG2 is
/// absent, so an exclusive open never disconnects its other agents needlessly.
pub fn discover<T2, T1>(
    open_tcg2: impl FnOnce() -> Option<T2>,
    open_tcg: impl FnOnce() -> Option<T1>,
) -> (Option<T2>, Option<T1>) {
    match open_tcg2() {
        Some(tcg2) => (Some(tcg2), None),
        None => (None, open_tcg()),
    }
}

fn measure_tpm2<T2: Tcg2, P: EventPool>(
    tcg2: &mut T2,
    pool: &P,
    config: &MeasureConfig,
    image: &Image<'_>,
) -> MeasureResult {
    let mut capability = Tcg2BootServiceCapability::query();
    let status = tcg2.get_capability(&mut capability);
    if status != Status::SUCCESS || !capability.tpm_present() {
        log_debug("tpm2", "TPM not functional");
        return Err(MeasureError::NoDevice);
    }

    if !image.kind.is_measurable() {
        log_debug("tpm2", &format!("image type {}, not supported", image.kind));
        return Err(MeasureError::NotSupported);
    }

    let event = EventRecord::build(pool, config.event_pcr, config.event_type, image.data)
        .map_err(|e| {
            log_debug("tpm2", &format!("event allocation failed: {}", e));
            e
        })?;

    log_debug(
        "tpm2",
        &format!(
            "measuring image {} (type = {}, len = {}) into PCR{}",
            image.name,
            image.kind,
            image.len(),
            event.pcr_index()
        ),
    );

    match tcg2.hash_log_extend_event(config.extend_flags, image.data, &event) {
        Status::SUCCESS => {}
        Status::VOLUME_FULL => {
            log_warn("tpm2", "WARNING - TPM event log is full");
        }
        status => {
            log_debug("tpm2", &format!("HashLogExtendEvent failed: {:?}", status));
            return Err(MeasureError::ProtocolFailure(status));
        }
    }

    log_debug("tpm2", "measurement recorded");
    Ok(())
}

fn measure_tpm12(_image: &Image<'_>) -> MeasureResult {
    log_warn("tpm12", "TPM 1.2 not supported");
    Err(MeasureError::NotSupported)
}
