//! TCG2 event records (`EFI_TCG2_EVENT`) and the pool they live in.
//!
//! Layout (little-endian, packed):
//!   +----------------------+ 0
//!   | size                 | 4  (u32)  == 18 + event data length
//!   | header_size          | 4  (u32)  == 14
//!   | header_version       | 2  (u16)  == 1
//!   | pcr_index            | 4  (u32)
//!   | event_type           | 4  (u32)
//!   +----------------------+ 18
//!   | event data ...       |   copied verbatim, no terminator
//!   +----------------------+
//!
//! A record owns its pool allocation and hands it back on drop, so every
//! exit path after a successful build releases it exactly once.

use core::alloc::Layout;
use core::mem;
use core::ptr::{self, NonNull};

use alloc::format;
use uefi::Status;
use zerocopy::byteorder::{LittleEndian, U16, U32};
use zerocopy::{AsBytes, FromBytes, LayoutVerified, Unaligned};

use crate::error::MeasureError;
use crate::log::logger::log_debug;

pub const EVENT_HEADER_SIZE: u32 = mem::size_of::<Tcg2EventHeader>() as u32;
pub const EVENT_HEADER_VERSION: u16 = 1;
/// Bytes before the event data: `size` plus the header.
pub const EVENT_FIXED_SIZE: usize = mem::size_of::<Tcg2EventPrefix>();

/// `EFI_TCG2_EVENT_HEADER`
#[derive(AsBytes, FromBytes, Unaligned, Clone, Copy, Debug)]
#[repr(C)]
pub struct Tcg2EventHeader {
    pub header_size: U32<LittleEndian>,
    pub header_version: U16<LittleEndian>,
    pub pcr_index: U32<LittleEndian>,
    pub event_type: U32<LittleEndian>,
}

/// `EFI_TCG2_EVENT` minus its trailing event data.
#[derive(AsBytes, FromBytes, Unaligned, Clone, Copy, Debug)]
#[repr(C)]
pub struct Tcg2EventPrefix {
    pub size: U32<LittleEndian>,
    pub header: Tcg2EventHeader,
}

impl Tcg2EventPrefix {
    /// Split a serialized record into its prefix and event data.
    /// Returns `None` if the buffer is shorter than the declared size.
    pub fn parse(bytes: &[u8]) -> Option<(Self, &[u8])> {
        let (prefix, rest) = LayoutVerified::<_, Self>::new_unaligned_from_prefix(bytes)?;
        let prefix = *prefix;
        let data_len = (prefix.size.get() as usize).checked_sub(EVENT_FIXED_SIZE)?;
        rest.get(..data_len).map(|data| (prefix, data))
    }
}

/// Allocator for event records (UEFI pool or the global heap).
pub trait EventPool {
    /// Allocate `size` bytes, or `None` when the pool is exhausted.
    fn allocate(&self, size: usize) -> Option<NonNull<u8>>;

    /// # Safety
    /// `ptr` must come from `allocate(size)` on this pool and not be freed yet.
    unsafe fn free(&self, ptr: NonNull<u8>, size: usize);
}

impl<P: EventPool + ?Sized> EventPool for &P {
    fn allocate(&self, size: usize) -> Option<NonNull<u8>> {
        (**self).allocate(size)
    }

    unsafe fn free(&self, ptr: NonNull<u8>, size: usize) {
        (**self).free(ptr, size)
    }
}

const HEAP_ALIGN: usize = 8;

/// Event pool backed by the global allocator.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeapPool;

impl EventPool for HeapPool {
    fn allocate(&self, size: usize) -> Option<NonNull<u8>> {
        if size == 0 {
            return None;
        }
        let layout = Layout::from_size_align(size, HEAP_ALIGN).ok()?;
        // SAFETY: layout has non-zero size.
        NonNull::new(unsafe { alloc::alloc::alloc(layout) })
    }

    unsafe fn free(&self, ptr: NonNull<u8>, size: usize) {
        if let Ok(layout) = Layout::from_size_align(size, HEAP_ALIGN) {
            alloc::alloc::dealloc(ptr.as_ptr(), layout);
        }
    }
}

/// A fully initialised TCG2 event living in pool memory.
pub struct EventRecord<'p> {
    ptr: NonNull<u8>,
    len: usize,
    prefix: Tcg2EventPrefix,
    pool: &'p dyn EventPool,
}

impl<'p> EventRecord<'p> {
    /// Allocate and fill a record carrying `event_data` verbatim.
    ///
    /// Fails with `InvalidArgument` if the record size does not fit the
    /// 32-bit size field and with `OutOfMemory` if the pool is exhausted;
    /// neither leaves anything allocated.
    pub fn build(
        pool: &'p dyn EventPool,
        pcr_index: u32,
        event_type: u32,
        event_data: &[u8],
    ) -> Result<Self, MeasureError> {
        let (len, size) = record_len(event_data.len())?;

        let prefix = Tcg2EventPrefix {
            size: U32::new(size),
            header: Tcg2EventHeader {
                header_size: U32::new(EVENT_HEADER_SIZE),
                header_version: U16::new(EVENT_HEADER_VERSION),
                pcr_index: U32::new(pcr_index),
                event_type: U32::new(event_type),
            },
        };

        let ptr = pool.allocate(len).ok_or(MeasureError::OutOfMemory)?;

        // SAFETY: `ptr` is a fresh allocation of `len` bytes; the two copies
        // fill [0, EVENT_FIXED_SIZE) and [EVENT_FIXED_SIZE, len) exactly.
        unsafe {
            ptr::copy_nonoverlapping(prefix.as_bytes().as_ptr(), ptr.as_ptr(), EVENT_FIXED_SIZE);
            ptr::copy_nonoverlapping(
                event_data.as_ptr(),
                ptr.as_ptr().add(EVENT_FIXED_SIZE),
                event_data.len(),
            );
        }

        Ok(Self { ptr, len, prefix, pool })
    }

    /// Declared record size (`size` field).
    #[inline]
    pub fn size(&self) -> u32 {
        self.prefix.size.get()
    }

    #[inline]
    pub fn header(&self) -> &Tcg2EventHeader {
        &self.prefix.header
    }

    #[inline]
    pub fn pcr_index(&self) -> u32 {
        self.prefix.header.pcr_index.get()
    }

    #[inline]
    pub fn event_type(&self) -> u32 {
        self.prefix.header.event_type.get()
    }

    /// Whole serialized record, as handed to the firmware.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        // SAFETY: all `len` bytes were initialised in `build`.
        unsafe { core::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    #[inline]
    pub fn event_data(&self) -> &[u8] {
        &self.as_bytes()[EVENT_FIXED_SIZE..]
    }

    #[inline]
    pub fn as_ptr(&self) -> *const u8 {
        self.ptr.as_ptr()
    }
}

impl Drop for EventRecord<'_> {
    fn drop(&mut self) {
        // SAFETY: allocated from `self.pool` with `self.len` in `build`, freed only here.
        unsafe { self.pool.free(self.ptr, self.len) }
    }
}

/// Total record length for a payload of `data_len` bytes, in memory and as
/// the `u32` wire `size` field.
fn record_len(data_len: usize) -> Result<(usize, u32), MeasureError> {
    let len = EVENT_FIXED_SIZE
        .checked_add(data_len)
        .ok_or(MeasureError::InvalidArgument)?;
    let size = u32::try_from(len).map_err(|_| MeasureError::InvalidArgument)?;
    Ok((len, size))
}

/// Nothing can recover a failed release; it is only traced.
#[cfg_attr(not(feature = "measure-efi"), allow(dead_code))]
pub(crate) fn report_free(status: Status) {
    if status != Status::SUCCESS {
        log_debug("firmware", &format!("FreePool failed: {:?}", status));
    }
}
