#![cfg_attr(not(test), no_std)]

//! The boot contract shared by the cartridge loader, the kernel and the host packaging tool.
//!
//! The loader fills a [`RawHeaderBuffer`] with two metadata records and hands them to the kernel as
//! `argv[1]` and `argv[2]`. Everything that both sides must agree on (addresses, record keys, byte
//! order of the size record) lives here.

/// The external address of the kernel image as seen by the CPU (uncached cartridge window).
pub const CART_IMAGE_BASE: u32 = 0xB010_1000;
/// The two size slots sit directly before the image: `diskSize` at base-8, `kernelSize` at base-4.
pub const SIZE_SLOTS_LEN: u32 = 8;
/// The disk region starts at the first 4 KiB boundary after the kernel image.
pub const DISK_ALIGN: u32 = 0x1000;
/// Extra room reserved by the packaging tool behind the padded image.
pub const PACKAGE_SLACK: u64 = 1024 * 1024;

/// Size of the header scratch buffer.
pub const RAW_HEADER_LEN: usize = 256;
/// Each metadata record owns half of the header buffer.
pub const RECORD_LEN: usize = 128;

pub const CART_START_KEY: &str = "n64cart.start";
pub const CART_SIZE_KEY: &str = "n64cart.size";

/// Placeholder program name passed as `argv[0]`.
pub const ARGV0: &[u8] = b"hello\0";
/// Root device argument passed as `argv[3]`.
pub const ROOT_ARG: &[u8] = b"root=/dev/n64cart\0";
/// The number of entries in the argument table handed to the kernel.
pub const ARGC: usize = 4;

/// The 256-byte scratch region that first holds the ELF header and later the metadata records.
#[repr(C, align(16))]
#[derive(Clone)]
pub struct RawHeaderBuffer(pub [u8; RAW_HEADER_LEN]);

impl RawHeaderBuffer {
    pub const fn new() -> Self {
        Self([0u8; RAW_HEADER_LEN])
    }

    pub fn clear(&mut self) {
        self.0.fill(0);
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.0
    }

    /// The raw bytes of the `index`-th metadata slot (0 or 1).
    pub fn record(&self, index: usize) -> &[u8] {
        &self.0[index * RECORD_LEN..(index + 1) * RECORD_LEN]
    }

    pub fn record_mut(&mut self, index: usize) -> &mut [u8] {
        &mut self.0[index * RECORD_LEN..(index + 1) * RECORD_LEN]
    }
}

impl Default for RawHeaderBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Sizes published in front of the image by the packaging tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootSizes {
    /// The size of the kernel ELF in bytes. Zero means nothing is configured to boot.
    pub kernel_size: u32,
    /// The size of the disk region in bytes.
    pub disk_size: u32,
}

impl BootSizes {
    /// Decodes the 8 bytes that precede the image: `diskSize` first, then `kernelSize`.
    pub fn from_slots(raw: &[u8; SIZE_SLOTS_LEN as usize]) -> Self {
        Self {
            disk_size: u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]),
            kernel_size: u32::from_be_bytes([raw[4], raw[5], raw[6], raw[7]]),
        }
    }

    /// The offset of the disk region relative to the image base.
    pub fn disk_offset(&self) -> u64 {
        align_up(self.kernel_size as u64, DISK_ALIGN as u64)
    }
}

/// Rounds `value` up to a multiple of `align`, which must be a power of two.
pub const fn align_up(value: u64, align: u64) -> u64 {
    (value + align - 1) & !(align - 1)
}

/// Encodes a size slot the way the console reads it back.
pub fn size_record(size: u32) -> [u8; 4] {
    size.to_be_bytes()
}

/// The cartridge allocation needed for an image of `file_size` bytes.
pub fn packaged_size(file_size: u64) -> u64 {
    align_up(file_size, DISK_ALIGN as u64) + PACKAGE_SLACK
}

/// Parses one `key=value` record. The record ends at the first NUL byte or at the end of `raw`.
pub fn parse_record(raw: &[u8]) -> Option<(&str, u32)> {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    let text = core::str::from_utf8(&raw[..end]).ok()?;
    let (key, value) = text.split_once('=')?;

    Some((key, value.parse::<u32>().ok()?))
}

/// The disk region as published to the kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiskInfo {
    /// CPU address of the first disk byte.
    pub start: u32,
    /// The length of the disk in bytes.
    pub size: u32,
}

impl DiskInfo {
    /// Reads both records back from a header buffer.
    ///
    /// Returns `None` if either is missing or malformed.
    pub fn parse(buf: &RawHeaderBuffer) -> Option<Self> {
        let (start_key, start) = parse_record(buf.record(0))?;
        let (size_key, size) = parse_record(buf.record(1))?;

        if start_key != CART_START_KEY || size_key != CART_SIZE_KEY {
            return None;
        }

        Some(Self { start, size })
    }
}
