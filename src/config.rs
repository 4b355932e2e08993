//! Placement of measurements: which PCR, which event type, which extend flags.
//!
//! The PCR written into the event header and the flags word passed to
//! `HashLogExtendEvent` are configured independently. Platform guidance
//! places loader configuration data in PCR 5; the extend call itself has
//! always been issued with a zero first argument.

use bitflags::bitflags;

use crate::error::MeasureError;

/// PCR indices from the TCG PC Client Platform Firmware Profile.
pub mod pcr {
    /// Boot manager code and configuration data recorded by UEFI applications.
    pub const BOOT_MANAGER_CONFIG: u32 = 5;
    /// PCR banks exposed by a PC Client TPM (0..=23).
    pub const COUNT: u32 = 24;
}

/// TCG event types used by this crate.
pub mod event_type {
    /// Informational action string (`EV_EFI_ACTION`).
    pub const EV_EFI_ACTION: u32 = 0x8000_0007;
}

bitflags! {
    /// Flags word of `EFI_TCG2_PROTOCOL.HashLogExtendEvent`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ExtendFlags: u64 {
        /// Extend only, do not append to the event log.
        const EXTEND_ONLY = 0x0000_0000_0000_0001;
        /// Data is a PE/COFF image to be hashed per the Authenticode rules.
        const PE_COFF_IMAGE = 0x0000_0000_0000_0010;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeasureConfig {
    /// PCR index recorded in the TCG2 event header.
    pub event_pcr: u32,
    /// Event type recorded in the TCG2 event header.
    pub event_type: u32,
    /// First argument of the extend call.
    pub extend_flags: ExtendFlags,
}

impl MeasureConfig {
    pub fn new(
        event_pcr: u32,
        event_type: u32,
        extend_flags: ExtendFlags,
    ) -> Result<Self, MeasureError> {
        if event_pcr >= pcr::COUNT {
            return Err(MeasureError::InvalidArgument);
        }
        Ok(Self { event_pcr, event_type, extend_flags })
    }
}

impl Default for MeasureConfig {
    fn default() -> Self {
        Self {
            event_pcr: pcr::BOOT_MANAGER_CONFIG,
            event_type: event_type::EV_EFI_ACTION,
            extend_flags: ExtendFlags::empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_places_scripts_in_pcr5_as_action() {
        let cfg = MeasureConfig::default();
        assert_eq!(cfg.event_pcr, 5);
        assert_eq!(cfg.event_type, 0x8000_0007);
        assert_eq!(cfg.extend_flags.bits(), 0);
    }

    #[test]
    fn rejects_pcr_outside_bank() {
        assert_eq!(
            MeasureConfig::new(24, event_type::EV_EFI_ACTION, ExtendFlags::empty()),
            Err(MeasureError::InvalidArgument)
        );
        assert!(MeasureConfig::new(23, event_type::EV_EFI_ACTION, ExtendFlags::empty()).is_ok());
    }

    #[test]
    fn header_pcr_and_extend_flags_are_independent() {
        let cfg = MeasureConfig::new(8, event_type::EV_EFI_ACTION, ExtendFlags::empty()).unwrap();
        assert_eq!(cfg.event_pcr, 8);
        assert_eq!(cfg.extend_flags, MeasureConfig::default().extend_flags);
    }
}
