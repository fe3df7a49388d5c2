//! Places the loadable segment at its physical address.

use core::ops::Range;

use boot_header::align_up;
use log::info;

use crate::{
    cache::CacheControl,
    elf::SegmentDescriptor,
    error::{BootError, BootResult},
    storage::{read_uncached, StorageDevice},
};

/// Grants exclusive access to ranges of installed RAM.
pub trait PhysicalMemory {
    /// Returns the `len` bytes starting at the CPU address `addr`.
    ///
    /// Fails with `SegmentOutOfRange` if the range is not backed by RAM, and with
    /// `SegmentOverlapsLoader` if it would overwrite the running loader.
    fn region(&mut self, addr: u32, len: usize) -> BootResult<&mut [u8]>;
}

/// Installed RAM and the parts of it the running loader occupies, as physical addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RamLayout {
    size: u32,
    reserved: [Range<u32>; 2],
}

impl RamLayout {
    pub fn new(size: u32, image: Range<u32>, stack: Range<u32>) -> Self {
        Self {
            size,
            reserved: [image, stack],
        }
    }

    /// Checks that `[phys, phys + len)` is installed RAM that the loader does not live in.
    pub fn check(&self, phys: u32, len: usize) -> BootResult<()> {
        let start = u64::from(phys);
        let end = u64::try_from(len)
            .ok()
            .and_then(|len| start.checked_add(len))
            .ok_or(BootError::SegmentOutOfRange)?;
        if end > u64::from(self.size) {
            return Err(BootError::SegmentOutOfRange);
        }

        if len > 0 && self.reserved.iter().any(|range| overlaps(range, start, end)) {
            return Err(BootError::SegmentOverlapsLoader);
        }

        Ok(())
    }
}

fn overlaps(range: &Range<u32>, start: u64, end: u64) -> bool {
    start < u64::from(range.end) && u64::from(range.start) < end
}

fn byte_len(len: u64) -> BootResult<usize> {
    usize::try_from(len).map_err(|_| BootError::SegmentOutOfRange)
}

/// Copies the file-backed part of `segment` to its target and zeroes the remainder up to
/// `memory_size`.
///
/// The transfer length is rounded up to an even byte count for the DMA engine, and the flushed
/// range up to a multiple of four, so up to three bytes past `file_size` may be touched.
pub fn load_segment<S, C, M>(
    storage: &mut S,
    cache: &mut C,
    memory: &mut M,
    image_base: u32,
    segment: &SegmentDescriptor,
) -> BootResult<()>
where
    S: StorageDevice + ?Sized,
    C: CacheControl + ?Sized,
    M: PhysicalMemory + ?Sized,
{
    let file_size = byte_len(u64::from(segment.file_size))?;
    let memory_size = byte_len(u64::from(segment.memory_size))?;
    let dma_len = byte_len(align_up(u64::from(segment.file_size), 2))?;
    let flush_len = byte_len(align_up(u64::from(segment.file_size), 4))?;

    let source = image_base
        .checked_add(segment.file_offset)
        .ok_or(BootError::TransferOutOfRange)?;
    info!("LoadAddress: {:#x}", segment.physical_address);
    info!("LoadOffset: {:#x}", source);

    let target = memory.region(segment.physical_address, memory_size.max(flush_len))?;
    read_uncached(storage, cache, &mut target[..dma_len], source)?;
    cache.writeback_invalidate(&target[..flush_len]);

    if memory_size > file_size {
        target[file_size..memory_size].fill(0);
    }

    Ok(())
}
