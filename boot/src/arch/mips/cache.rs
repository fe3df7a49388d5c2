//! VR4300 cache maintenance by hit operations.

use core::arch::asm;

use crate::cache::{cache_lines, CacheControl, DCACHE_LINE, ICACHE_LINE};

pub struct Vr4300Cache;

impl CacheControl for Vr4300Cache {
    fn invalidate(&mut self, region: &[u8]) {
        let start = region.as_ptr() as usize;
        for (addr, whole) in cache_lines(start, region.len(), DCACHE_LINE) {
            if whole {
                // Hit_Invalidate_D
                unsafe { asm!("cache 0x11, 0({0})", in(reg) addr) };
            } else {
                // The rest of the line belongs to someone else.
                unsafe { asm!("cache 0x15, 0({0})", in(reg) addr) };
            }
        }
    }

    fn writeback_invalidate(&mut self, region: &[u8]) {
        let start = region.as_ptr() as usize;
        for (addr, _) in cache_lines(start, region.len(), DCACHE_LINE) {
            // Hit_Writeback_Invalidate_D
            unsafe { asm!("cache 0x15, 0({0})", in(reg) addr) };
        }
        for (addr, _) in cache_lines(start, region.len(), ICACHE_LINE) {
            // Hit_Invalidate_I
            unsafe { asm!("cache 0x10, 0({0})", in(reg) addr) };
        }
    }
}
