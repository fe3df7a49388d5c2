//! Synchronous reads from the cartridge address space.

use boot_header::{BootSizes, RawHeaderBuffer, SIZE_SLOTS_LEN};
use log::debug;

use crate::{
    cache::{CacheControl, DCACHE_LINE},
    error::{BootError, BootResult},
};

/// A flat, read-only external address space.
pub trait StorageDevice {
    /// Copies `dst.len()` bytes starting at the external address `addr` into `dst`.
    ///
    /// Returns only once the data has landed in memory. The transfer bypasses the CPU caches, so
    /// the caller invalidates `dst` beforehand. Lengths are expected to be even.
    fn read(&mut self, dst: &mut [u8], addr: u32) -> BootResult<()>;
}

/// The size slots get a D-cache line of their own so invalidating them drops nothing else.
#[repr(C, align(16))]
struct SizeSlots([u8; DCACHE_LINE]);

/// Invalidates `dst` and then fills it from `addr`.
pub fn read_uncached<S, C>(
    storage: &mut S,
    cache: &mut C,
    dst: &mut [u8],
    addr: u32,
) -> BootResult<()>
where
    S: StorageDevice + ?Sized,
    C: CacheControl + ?Sized,
{
    cache.invalidate(dst);
    storage.read(dst, addr)
}

/// Reads the `diskSize` and `kernelSize` slots stored right before `image_base`.
pub fn read_sizes<S, C>(storage: &mut S, cache: &mut C, image_base: u32) -> BootResult<BootSizes>
where
    S: StorageDevice + ?Sized,
    C: CacheControl + ?Sized,
{
    let mut slots = SizeSlots([0u8; DCACHE_LINE]);
    let slots_addr = image_base
        .checked_sub(SIZE_SLOTS_LEN)
        .ok_or(BootError::TransferOutOfRange)?;
    cache.invalidate(&slots.0);
    storage.read(&mut slots.0[..SIZE_SLOTS_LEN as usize], slots_addr)?;

    let mut raw = [0u8; SIZE_SLOTS_LEN as usize];
    raw.copy_from_slice(&slots.0[..SIZE_SLOTS_LEN as usize]);
    let sizes = BootSizes::from_slots(&raw);
    debug!("read_sizes(): {:?}", sizes);

    Ok(sizes)
}

/// Reads the first 256 bytes of the image into `header`.
pub fn read_header<S, C>(
    storage: &mut S,
    cache: &mut C,
    header: &mut RawHeaderBuffer,
    image_base: u32,
) -> BootResult<()>
where
    S: StorageDevice + ?Sized,
    C: CacheControl + ?Sized,
{
    read_uncached(storage, cache, header.as_bytes_mut(), image_base)
}
