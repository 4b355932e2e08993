//! Firmware TPM protocol seams.
//!
//! `Tcg2` mirrors the two `EFI_TCG2_PROTOCOL` calls the measurement path
//! needs; `Tcg` marks a discovered legacy (TPM 1.2) `EFI_TCG_PROTOCOL`.
//! Firmware bindings live in `efi::firmware`; tests inject fakes.

use uefi::Status;

use crate::config::ExtendFlags;
use crate::efi::event::EventRecord;

/// `EFI_TCG2_BOOT_SERVICE_CAPABILITY`, natural C alignment (36 bytes).
///
/// Unlike the event structures this one is not packed: `tpm_present_flag`
/// sits at offset 16 and firmware sizes the caller by `size`.
#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
pub struct Tcg2BootServiceCapability {
    pub size: u8,
    pub structure_version_major: u8,
    pub structure_version_minor: u8,
    pub protocol_version_major: u8,
    pub protocol_version_minor: u8,
    pub hash_algorithm_bitmap: u32,
    pub supported_event_logs: u32,
    pub tpm_present_flag: u8,
    pub max_command_size: u16,
    pub max_response_size: u16,
    pub manufacturer_id: u32,
    pub number_of_pcr_banks: u32,
    pub active_pcr_banks: u32,
}

impl Tcg2BootServiceCapability {
    pub const SIZE: u8 = core::mem::size_of::<Self>() as u8;

    /// Descriptor ready for `GetCapability`: `size` announces the layout
    /// this caller understands, everything else is filled by firmware.
    pub fn query() -> Self {
        Self { size: Self::SIZE, ..Self::default() }
    }

    #[inline]
    pub fn tpm_present(&self) -> bool {
        self.tpm_present_flag != 0
    }
}

pub trait Tcg2 {
    /// `GetCapability`: fills `capability` in place.
    fn get_capability(&mut self, capability: &mut Tcg2BootServiceCapability) -> Status;

    /// `HashLogExtendEvent`: hash `data`, extend the PCR named in `event`
    /// and append `event` to the log. `Status::VOLUME_FULL` means the PCR
    /// was extended but the log entry was dropped.
    fn hash_log_extend_event(
        &mut self,
        flags: ExtendFlags,
        data: &[u8],
        event: &EventRecord<'_>,
    ) -> Status;
}

/// Presence of a TPM 1.2 `EFI_TCG_PROTOCOL`.
pub trait Tcg {}

impl<T: Tcg2 + ?Sized> Tcg2 for &mut T {
    fn get_capability(&mut self, capability: &mut Tcg2BootServiceCapability) -> Status {
        (**self).get_capability(capability)
    }

    fn hash_log_extend_event(
        &mut self,
        flags: ExtendFlags,
        data: &[u8],
        event: &EventRecord<'_>,
    ) -> Status {
        (**self).hash_log_extend_event(flags, data, event)
    }
}

impl<T: Tcg + ?Sized> Tcg for &mut T {}

#[cfg(test)]
mod tests {
    use super::*;
    use core::mem::offset_of;

    #[test]
    fn capability_uses_natural_c_layout() {
        assert_eq!(Tcg2BootServiceCapability::SIZE, 36);
        assert_eq!(offset_of!(Tcg2BootServiceCapability, hash_algorithm_bitmap), 8);
        assert_eq!(offset_of!(Tcg2BootServiceCapability, supported_event_logs), 12);
        assert_eq!(offset_of!(Tcg2BootServiceCapability, tpm_present_flag), 16);
        assert_eq!(offset_of!(Tcg2BootServiceCapability, active_pcr_banks), 32);

        let cap = Tcg2BootServiceCapability::query();
        assert_eq!(cap.size, 36);
        assert!(!cap.tpm_present());
    }

    #[test]
    fn present_flag_read_from_firmware_bytes() {
        // Firmware image of a filled descriptor: SHA-256 bank, TCG2 log
        // format, TPM present.
        let mut raw = [0u8; 36];
        raw[0] = 36;
        raw[8..12].copy_from_slice(&0x0000_0002u32.to_le_bytes());
        raw[12..16].copy_from_slice(&0x0000_0002u32.to_le_bytes());
        raw[16] = 1;

        let mut cap = Tcg2BootServiceCapability::default();
        // SAFETY: same size, every bit pattern is valid for the plain-integer fields.
        unsafe {
            core::ptr::copy_nonoverlapping(
                raw.as_ptr(),
                &mut cap as *mut Tcg2BootServiceCapability as *mut u8,
                raw.len(),
            );
        }

        assert!(cap.tpm_present());
        assert_eq!(cap.supported_event_logs, 2);
    }
}
