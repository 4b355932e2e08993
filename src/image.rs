//! Borrowed view of a boot image handed over by the loader.
//!
//! The loader owns the bytes; measurement borrows them for one call and
//! keeps nothing afterwards.

use core::fmt;

/// Loader image type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    /// Textual boot script (iPXE-style command lines).
    Script,
    /// PE/COFF EFI executable.
    Efi,
    /// Raw ELF executable.
    Elf,
    /// Multiboot kernel.
    Multiboot,
    /// Legacy PXE NBP.
    Pxe,
    /// Anything else the loader recognises by name.
    Other(&'static str),
}

impl ImageKind {
    pub fn name(&self) -> &'static str {
        match self {
            ImageKind::Script => "script",
            ImageKind::Efi => "efi",
            ImageKind::Elf => "elf",
            ImageKind::Multiboot => "multiboot",
            ImageKind::Pxe => "pxe",
            ImageKind::Other(name) => name,
        }
    }

    /// Only scripts have a defined TCG2 encoding: the bare ASCII content,
    /// logged as an `EV_EFI_ACTION` string without a terminator.
    #[inline]
    pub fn is_measurable(&self) -> bool {
        matches!(self, ImageKind::Script)
    }
}

impl fmt::Display for ImageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A loaded image: name, raw bytes and type tag.
#[derive(Debug, Clone, Copy)]
pub struct Image<'a> {
    pub name: &'a str,
    pub data: &'a [u8],
    pub kind: ImageKind,
}

impl<'a> Image<'a> {
    pub const fn new(name: &'a str, data: &'a [u8], kind: ImageKind) -> Self {
        Self { name, data, kind }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
