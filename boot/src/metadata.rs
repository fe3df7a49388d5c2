//! Encodes the disk location into the header buffer and builds the kernel's argument table.
//!
//! The kernel parses `n64cart.start=` and `n64cart.size=` from its command line, so both facts are
//! passed as ordinary NUL-terminated arguments rather than as environment or a binary blob.

use core::{
    ffi::CStr,
    fmt::{self, Write},
};

use boot_header::{BootSizes, DiskInfo, RawHeaderBuffer, ARGC, CART_SIZE_KEY, CART_START_KEY};

use crate::{
    config::BootConfig,
    error::{BootError, BootResult},
};

/// Formats into a fixed slot and always leaves room for the terminating NUL.
struct SlotWriter<'a> {
    slot: &'a mut [u8],
    pos: usize,
}

impl Write for SlotWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let end = self.pos + s.len();
        if end >= self.slot.len() {
            return Err(fmt::Error);
        }

        self.slot[self.pos..end].copy_from_slice(s.as_bytes());
        self.pos = end;
        Ok(())
    }
}

fn write_record(slot: &mut [u8], key: &str, value: u32) {
    let mut writer = SlotWriter { slot, pos: 0 };
    // `n64cart.start=4294967295` is the longest record and fits a slot with room to spare.
    let written = write!(writer, "{}={}", key, value);
    debug_assert!(written.is_ok(), "record for {} overflows its slot", key);
}

/// Clears `header` and writes the two disk records at offsets 0 and 128.
pub fn write_metadata(
    header: &mut RawHeaderBuffer,
    sizes: &BootSizes,
    image_base: u32,
) -> BootResult<DiskInfo> {
    let start = u32::try_from(image_base as u64 + sizes.disk_offset())
        .map_err(|_| BootError::DiskOffsetOverflow)?;

    header.clear();
    write_record(header.record_mut(0), CART_START_KEY, start);
    write_record(header.record_mut(1), CART_SIZE_KEY, sizes.disk_size);

    Ok(DiskInfo {
        start,
        size: sizes.disk_size,
    })
}

/// The argument vector handed to the kernel.
#[derive(Debug, Clone, Copy)]
pub struct BootArgs<'a> {
    argv: [&'a CStr; ARGC],
}

impl<'a> BootArgs<'a> {
    /// `argv[1]` and `argv[2]` point into `header`, which must already hold the metadata records.
    ///
    /// Fails with `UnterminatedRecord` if a slot has no NUL, as in a header that was never passed
    /// through [`write_metadata`].
    pub fn new(header: &'a RawHeaderBuffer, config: &BootConfig) -> BootResult<Self> {
        let start = CStr::from_bytes_until_nul(header.record(0))
            .map_err(|_| BootError::UnterminatedRecord)?;
        let size = CStr::from_bytes_until_nul(header.record(1))
            .map_err(|_| BootError::UnterminatedRecord)?;

        Ok(Self {
            argv: [config.argv0, start, size, config.root],
        })
    }

    /// The element count of the argument table.
    pub fn argc(&self) -> usize {
        self.argv.len()
    }

    pub fn argv(&self) -> &[&'a CStr; ARGC] {
        &self.argv
    }
}
