//! UEFI bindings for the TCG/TCG2 protocols and boot-services pool.
//!
//! Only the leading members of `EFI_TCG2_PROTOCOL` are declared: the
//! structure is never constructed here, only reached through the
//! firmware-owned interface pointer. Boot services identity-map memory,
//! so a buffer's address is its physical address.

use core::ptr::NonNull;

use alloc::format;
use uefi::proto::unsafe_protocol;
use uefi::proto::ProtocolPointer;
use uefi::table::boot::{BootServices, MemoryType, ScopedProtocol};
use uefi::Status;

use crate::config::ExtendFlags;
use crate::efi::event::{report_free, EventPool, EventRecord};
use crate::efi::protocol::{Tcg, Tcg2, Tcg2BootServiceCapability};
use crate::efi::{discover, EfiMeasure};
use crate::log::logger::{log_debug, log_info};

#[repr(C)]
#[unsafe_protocol("607f766c-7455-42be-930b-e4d76db2720f")]
pub struct RawTcg2 {
    get_capability: unsafe extern "efiapi" fn(
        this: *mut RawTcg2,
        protocol_capability: *mut Tcg2BootServiceCapability,
    ) -> Status,
    #[allow(dead_code)]
    get_event_log: unsafe extern "efiapi" fn(
        this: *mut RawTcg2,
        event_log_format: u32,
        event_log_location: *mut u64,
        event_log_last_entry: *mut u64,
        event_log_truncated: *mut bool,
    ) -> Status,
    hash_log_extend_event: unsafe extern "efiapi" fn(
        this: *mut RawTcg2,
        flags: u64,
        data_to_hash: u64,
        data_to_hash_len: u64,
        event: *const u8,
    ) -> Status,
}

/// `EFI_TCG_PROTOCOL`; only its presence matters.
#[repr(C)]
#[unsafe_protocol("f541796d-a62e-4954-a775-9584f61b9cdd")]
pub struct RawTcg {
    #[allow(dead_code)]
    status_check: usize,
}

/// Physical address of a boot-services buffer.
#[inline]
fn phys_addr(data: &[u8]) -> u64 {
    data.as_ptr() as u64
}

pub struct FirmwareTcg2<'a>(ScopedProtocol<'a, RawTcg2>);

impl Tcg2 for FirmwareTcg2<'_> {
    fn get_capability(&mut self, capability: &mut Tcg2BootServiceCapability) -> Status {
        let this: *mut RawTcg2 = &mut *self.0;
        // SAFETY: `this` is an open TCG2 interface; `capability` is a
        // correctly sized, writable descriptor.
        unsafe { ((*this).get_capability)(this, capability) }
    }

    fn hash_log_extend_event(
        &mut self,
        flags: ExtendFlags,
        data: &[u8],
        event: &EventRecord<'_>,
    ) -> Status {
        let this: *mut RawTcg2 = &mut *self.0;
        // SAFETY: `data` and `event` outlive the call; the firmware only reads them.
        unsafe {
            ((*this).hash_log_extend_event)(
                this,
                flags.bits(),
                phys_addr(data),
                data.len() as u64,
                event.as_ptr(),
            )
        }
    }
}

pub struct FirmwareTcg<'a>(#[allow(dead_code)] ScopedProtocol<'a, RawTcg>);

impl Tcg for FirmwareTcg<'_> {}

/// `AllocatePool(EfiBootServicesData)` / `FreePool`.
pub struct BootPool<'a>(&'a BootServices);

impl EventPool for BootPool<'_> {
    fn allocate(&self, size: usize) -> Option<NonNull<u8>> {
        self.0
            .allocate_pool(MemoryType::BOOT_SERVICES_DATA, size)
            .ok()
            .and_then(NonNull::new)
    }

    unsafe fn free(&self, ptr: NonNull<u8>, _size: usize) {
        let status = match self.0.free_pool(ptr.as_ptr()) {
            Ok(()) => Status::SUCCESS,
            Err(e) => e.status(),
        };
        report_free(status);
    }
}

fn open<P: ProtocolPointer + ?Sized>(bs: &BootServices) -> Option<ScopedProtocol<'_, P>> {
    let handle = bs.get_handle_for_protocol::<P>().ok()?;
    match bs.open_protocol_exclusive::<P>(handle) {
        Ok(protocol) => Some(protocol),
        Err(e) => {
            log_debug("firmware", &format!("protocol open failed: {:?}", e.status()));
            None
        }
    }
}

/// Discover the TCG2 and TCG protocols once and bind them to a backend.
pub fn probe(bs: &BootServices) -> EfiMeasure<FirmwareTcg2<'_>, FirmwareTcg<'_>, BootPool<'_>> {
    let (tcg2, tcg) = discover(
        || open::<RawTcg2>(bs).map(FirmwareTcg2),
        || open::<RawTcg>(bs).map(FirmwareTcg),
    );
    let measure = EfiMeasure::new(tcg2, tcg, BootPool(bs));

    match (measure.has_tcg2(), measure.has_tcg()) {
        (true, _) => log_info("firmware", "TCG2 protocol found"),
        (false, true) => log_info("firmware", "TCG (TPM 1.2) protocol found"),
        (false, false) => log_info("firmware", "no TCG/TCG2 protocol found"),
    }

    measure
}
