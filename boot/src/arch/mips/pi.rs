//! Cartridge DMA through the peripheral interface.

use core::{
    hint::spin_loop,
    sync::atomic::{compiler_fence, Ordering},
};

use volatile::Volatile;

use super::to_physical;
use crate::{error::BootResult, storage::StorageDevice};

const PI_BASE: usize = 0xA460_0000;
const PI_STATUS_DMA_BUSY: u32 = 1 << 0;
const PI_STATUS_IO_BUSY: u32 = 1 << 1;
/// Cartridge domain 1 starts here on the PI bus.
const CART_DOM1: u32 = 0x1000_0000;

#[repr(C)]
struct PiRegisters {
    dram_addr: Volatile<u32>,
    cart_addr: Volatile<u32>,
    rd_len: Volatile<u32>,
    wr_len: Volatile<u32>,
    status: Volatile<u32>,
}

/// The cartridge ROM seen through PI DMA.
pub struct Cartridge {
    regs: &'static mut PiRegisters,
}

impl Cartridge {
    /// # Safety
    ///
    /// Only one `Cartridge` may exist; it owns the PI registers.
    pub unsafe fn new() -> Self {
        Self {
            regs: &mut *(PI_BASE as *mut PiRegisters),
        }
    }

    fn wait_idle(&self) {
        while self.regs.status.read() & (PI_STATUS_DMA_BUSY | PI_STATUS_IO_BUSY) != 0 {
            spin_loop();
        }
    }
}

impl StorageDevice for Cartridge {
    fn read(&mut self, dst: &mut [u8], addr: u32) -> BootResult<()> {
        if dst.is_empty() {
            return Ok(());
        }

        self.wait_idle();
        self.regs.dram_addr.write(to_physical(dst.as_mut_ptr() as u32));
        self.regs.cart_addr.write(to_physical(addr | CART_DOM1));
        // "Write length" moves cartridge data into RDRAM.
        self.regs.wr_len.write(dst.len() as u32 - 1);
        self.wait_idle();

        // The engine wrote `dst` behind the compiler's back.
        compiler_fence(Ordering::SeqCst);
        Ok(())
    }
}
