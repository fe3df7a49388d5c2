//! RDRAM ownership and size detection.

use core::{ptr::addr_of, slice};

use volatile::ReadOnly;

use super::{to_physical, KSEG0};
use crate::{
    error::BootResult,
    loader::{PhysicalMemory, RamLayout},
};

/// `osMemSize` as left behind by the IPL.
const OS_MEM_SIZE: usize = 0xA000_0318;
/// Where CIC-6105 boards store it instead.
const OS_MEM_SIZE_6105: usize = 0xA000_03F0;
const DEFAULT_RAM_SIZE: u32 = 4 * 1024 * 1024;
/// The top of RDRAM kept for the loader's stack. `entry.S` starts the stack at the top of RAM.
pub const STACK_RESERVE: u32 = 64 * 1024;

extern "C" {
    static __image_start: u8;
    static __bss_end: u8;
}

fn read_word(addr: usize) -> u32 {
    unsafe { (*(addr as *const ReadOnly<u32>)).read() }
}

/// The installed RDRAM in bytes.
pub fn ram_size() -> u32 {
    [OS_MEM_SIZE, OS_MEM_SIZE_6105]
        .into_iter()
        .map(read_word)
        .find(|&size| size != 0)
        .unwrap_or(DEFAULT_RAM_SIZE)
}

/// Hands out cached views of installed RDRAM that the loader does not occupy.
pub struct Rdram {
    layout: RamLayout,
}

impl Rdram {
    pub fn new(size: u32) -> Self {
        // SAFETY: only the addresses of the linker symbols are taken.
        let (image_start, image_end) =
            unsafe { (addr_of!(__image_start) as u32, addr_of!(__bss_end) as u32) };
        let image = to_physical(image_start)..to_physical(image_end);
        let stack = size.saturating_sub(STACK_RESERVE)..size;

        Self {
            layout: RamLayout::new(size, image, stack),
        }
    }
}

impl PhysicalMemory for Rdram {
    fn region(&mut self, addr: u32, len: usize) -> BootResult<&mut [u8]> {
        let phys = to_physical(addr);
        self.layout.check(phys, len)?;

        // SAFETY: the range lies in installed RAM outside the loader, and `&mut self` keeps regions
        // from overlapping.
        Ok(unsafe { slice::from_raw_parts_mut((KSEG0 | phys) as *mut u8, len) })
    }
}
