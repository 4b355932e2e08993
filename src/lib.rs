//! NØNOS Measured Boot — record what the loader is about to run into the TPM.
//!
//! Every boot image handed to [`measure_image`] is extended into the TPM
//! event log before execution so that later attestation can prove what ran.
//!
//! # Layout
//! - [`measure`] — backend contract and build-time selection of the active backend
//! - [`null`]    — do-nothing backend (measurement compiled out)
//! - [`efi`]     — TCG2 backend over the firmware TCG/TCG2 protocols
//! - [`image`]   — borrowed view of a loaded boot image
//! - [`config`]  — PCR / event-type placement of measurements
//! - [`error`]   — measurement error taxonomy
//! - [`log`]     — category-tagged diagnostics

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod config;
pub mod efi;
pub mod error;
pub mod image;
pub mod log;
pub mod measure;
pub mod null;

pub use config::{ExtendFlags, MeasureConfig};
pub use error::{MeasureError, MeasureResult};
pub use image::{Image, ImageKind};
pub use measure::{measure_image, probe, ActiveMeasure, Measure};
