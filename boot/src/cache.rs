//! Cache maintenance around DMA transfers and freshly loaded code.
//!
//! The cartridge DMA engine writes RDRAM behind the CPU caches. Every buffer that receives DMA data
//! is invalidated before the transfer, and every range that is about to be executed is written back
//! and invalidated after it. Calls are scoped to the buffer in question, never to the whole cache.

/// VR4300 data cache line size.
pub const DCACHE_LINE: usize = 16;
/// VR4300 instruction cache line size.
pub const ICACHE_LINE: usize = 32;

pub trait CacheControl {
    /// Discards cached copies of `region` so a following DMA write is not masked on readback.
    ///
    /// Lines only partly covered by `region` also hold unrelated data; those are written back
    /// before they are dropped.
    fn invalidate(&mut self, region: &[u8]);

    /// Writes back dirty lines covering `region` and invalidates them, so the next instruction
    /// fetch or data read observes memory.
    fn writeback_invalidate(&mut self, region: &[u8]);
}

/// Walks the `line`-sized cache lines that `start..start + len` touches.
///
/// Yields each line address along with whether the range covers that line completely.
pub fn cache_lines(start: usize, len: usize, line: usize) -> impl Iterator<Item = (usize, bool)> {
    let end = start + len;
    (start & !(line - 1)..end)
        .step_by(line)
        .map(move |addr| (addr, addr >= start && end - addr >= line))
}
