#![no_std]
#![no_main]

extern crate alloc;

use alloc::format;
use alloc::vec;
use alloc::vec::Vec;

use uefi::prelude::*;
use uefi::proto::media::file::{File, FileAttribute, FileInfo, FileMode, FileType};
use uefi::table::boot::BootServices;
use uefi::CStr16;

use nonos_measure::log::logger::{log_error, log_info, log_warn};
use nonos_measure::{measure_image, probe, Image, ImageKind, Measure};

/// Boot script measured before it is handed to the interpreter.
const SCRIPT_NAME: &str = "autoexec.ipxe";

/// Entry point for UEFI firmware
#[entry]
fn efi_main(handle: Handle, mut system_table: SystemTable<Boot>) -> Status {
    if uefi_services::init(&mut system_table).is_err() {
        return Status::ABORTED;
    }

    log_info("boot", "NØNOS measured boot");

    let bs = system_table.boot_services();

    let script = match load_script(bs, handle) {
        Ok(script) => script,
        Err(e) => {
            log_error("loader", e);
            return Status::NOT_FOUND;
        }
    };

    let image = Image::new(SCRIPT_NAME, &script, ImageKind::Script);
    let mut active = probe(bs);

    log_info(
        "measure",
        &format!("backend {} measuring {} ({} bytes)", active_name(&active), SCRIPT_NAME, image.len()),
    );

    match measure_image(&mut active, &image) {
        Ok(()) => {
            log_info("measure", "[✓] script measured");
            Status::SUCCESS
        }
        Err(e) => {
            log_warn("measure", &format!("[x] script not measured: {}", e));
            e.status()
        }
    }
}

fn active_name<M: Measure>(_active: &M) -> &'static str {
    M::NAME
}

/// Read the boot script from the volume this application was loaded from.
fn load_script(bs: &BootServices, handle: Handle) -> Result<Vec<u8>, &'static str> {
    let mut sfs = bs
        .get_image_file_system(handle)
        .map_err(|_| "[x] Missing SimpleFileSystem")?;

    let mut root = sfs.open_volume().map_err(|_| "[x] Cannot open FS volume")?;

    let mut name_buf = [0u16; 32];
    let name = CStr16::from_str_with_buf(SCRIPT_NAME, &mut name_buf)
        .map_err(|_| "[x] Invalid script filename")?;

    let file_handle = root
        .open(name, FileMode::Read, FileAttribute::empty())
        .map_err(|_| "[x] Script file not found")?;

    let mut file = match file_handle.into_type().map_err(|_| "[x] Script cast failed")? {
        FileType::Regular(f) => f,
        _ => return Err("[x] Script is not a regular file"),
    };

    let info = file
        .get_boxed_info::<FileInfo>()
        .map_err(|_| "[x] Cannot stat script")?;

    let mut script = vec![0u8; info.file_size() as usize];
    let read = file.read(&mut script).map_err(|_| "[x] Failed to read script")?;
    script.truncate(read);

    Ok(script)
}
