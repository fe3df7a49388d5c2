//! Interrupt masking and the jump into the kernel.

use core::{
    arch::asm,
    ffi::{c_char, c_int},
    mem, ptr,
};

use bitflags::bitflags;
use boot_header::ARGC;
use volatile::Volatile;

use crate::{handoff::Machine, metadata::BootArgs};

const MI_MASK: usize = 0xA430_000C;
const VI_V_INTR: usize = 0xA440_000C;
/// Interrupt enable bit of the COP0 status register.
const STATUS_IE: u32 = 1 << 0;

bitflags! {
    /// Write-side encoding of the MI interrupt mask register.
    pub struct MiMask: u32 {
        const CLR_SP = 1 << 0;
        const SET_SP = 1 << 1;
        const CLR_SI = 1 << 2;
        const SET_SI = 1 << 3;
        const CLR_AI = 1 << 4;
        const SET_AI = 1 << 5;
        const CLR_VI = 1 << 6;
        const SET_VI = 1 << 7;
        const CLR_PI = 1 << 8;
        const SET_PI = 1 << 9;
        const CLR_DP = 1 << 10;
        const SET_DP = 1 << 11;
    }
}

type KernelEntry =
    extern "C" fn(c_int, *const *const c_char, *const *const c_char, *mut c_int) -> !;

pub struct N64Machine;

impl Machine for N64Machine {
    fn disable_interrupts(&mut self) {
        unsafe {
            let status: u32;
            asm!("mfc0 {0}, $12", out(reg) status);
            asm!("mtc0 {0}, $12", "nop", "nop", in(reg) status & !STATUS_IE);
        }
    }

    fn disable_vi_interrupt(&mut self) {
        unsafe {
            (*(MI_MASK as *mut Volatile<u32>)).write(MiMask::CLR_VI.bits());
            (*(VI_V_INTR as *mut Volatile<u32>)).write(0);
        }
    }

    unsafe fn enter(&mut self, entry: u32, args: &BootArgs<'_>) -> ! {
        let argv: [*const c_char; ARGC] = (*args.argv()).map(|arg| arg.as_ptr());
        let envp: [*const c_char; 1] = [ptr::null()];

        let kernel: KernelEntry = mem::transmute(entry as usize);
        kernel(args.argc() as c_int, argv.as_ptr(), envp.as_ptr(), ptr::null_mut())
    }
}
