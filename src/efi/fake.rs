//! Test doubles for the firmware seams.

use core::cell::Cell;
use core::ptr::NonNull;
use std::vec::Vec;

use sha2::{Digest, Sha256};
use uefi::Status;

use crate::config::{pcr, ExtendFlags};
use crate::efi::event::{EventPool, EventRecord, HeapPool, Tcg2EventPrefix};
use crate::efi::protocol::{Tcg, Tcg2, Tcg2BootServiceCapability};

/// Heap pool that counts traffic and can be told to run dry.
#[derive(Default)]
pub(crate) struct CountingPool {
    exhausted: bool,
    allocations: Cell<usize>,
    frees: Cell<usize>,
}

impl CountingPool {
    pub(crate) fn exhausted() -> Self {
        Self { exhausted: true, ..Self::default() }
    }

    pub(crate) fn allocations(&self) -> usize {
        self.allocations.get()
    }

    pub(crate) fn frees(&self) -> usize {
        self.frees.get()
    }

    pub(crate) fn live(&self) -> usize {
        self.allocations() - self.frees()
    }
}

impl EventPool for CountingPool {
    fn allocate(&self, size: usize) -> Option<NonNull<u8>> {
        if self.exhausted {
            return None;
        }
        let ptr = HeapPool.allocate(size)?;
        self.allocations.set(self.allocations.get() + 1);
        Some(ptr)
    }

    unsafe fn free(&self, ptr: NonNull<u8>, size: usize) {
        self.frees.set(self.frees.get() + 1);
        HeapPool.free(ptr, size)
    }
}

/// One observed `HashLogExtendEvent`.
#[derive(Debug, Clone)]
pub(crate) struct ExtendCall {
    pub flags: ExtendFlags,
    pub data: Vec<u8>,
    pub event: Vec<u8>,
}

/// Simulated TPM2 with a SHA-256 PCR bank.
pub(crate) struct SimTpm2 {
    pub capability_status: Status,
    pub present: bool,
    pub extend_status: Status,
    pub capability_sizes: Vec<u8>,
    pub extends: Vec<ExtendCall>,
    pub pcrs: [[u8; 32]; pcr::COUNT as usize],
}

impl SimTpm2 {
    pub(crate) fn functional() -> Self {
        Self {
            capability_status: Status::SUCCESS,
            present: true,
            extend_status: Status::SUCCESS,
            capability_sizes: Vec::new(),
            extends: Vec::new(),
            pcrs: [[0u8; 32]; pcr::COUNT as usize],
        }
    }

    pub(crate) fn absent_tpm() -> Self {
        Self { present: false, ..Self::functional() }
    }

    pub(crate) fn calls(&self) -> usize {
        self.capability_sizes.len() + self.extends.len()
    }
}

impl Tcg2 for SimTpm2 {
    fn get_capability(&mut self, capability: &mut Tcg2BootServiceCapability) -> Status {
        self.capability_sizes.push(capability.size);
        if self.capability_status != Status::SUCCESS {
            return self.capability_status;
        }
        capability.structure_version_major = 1;
        capability.structure_version_minor = 1;
        capability.protocol_version_major = 1;
        capability.protocol_version_minor = 1;
        capability.tpm_present_flag = u8::from(self.present);
        capability.number_of_pcr_banks = 1;
        Status::SUCCESS
    }

    fn hash_log_extend_event(
        &mut self,
        flags: ExtendFlags,
        data: &[u8],
        event: &EventRecord<'_>,
    ) -> Status {
        self.extends.push(ExtendCall {
            flags,
            data: data.to_vec(),
            event: event.as_bytes().to_vec(),
        });
        if self.extend_status != Status::SUCCESS && self.extend_status != Status::VOLUME_FULL {
            return self.extend_status;
        }
        let Some((prefix, _)) = Tcg2EventPrefix::parse(event.as_bytes()) else {
            return Status::INVALID_PARAMETER;
        };
        let Some(bank) = self.pcrs.get_mut(prefix.header.pcr_index.get() as usize) else {
            return Status::INVALID_PARAMETER;
        };
        let digest = Sha256::digest(data);
        let mut hasher = Sha256::new();
        hasher.update(*bank);
        hasher.update(digest);
        *bank = hasher.finalize().into();
        self.extend_status
    }
}

/// Legacy TCG protocol marker.
pub(crate) struct SimTcg;

impl Tcg for SimTcg {}
