//! The one-way handoff to the loaded kernel.

use log::info;

use crate::metadata::BootArgs;

/// CPU control needed for the final jump.
pub trait Machine {
    /// Masks every interrupt source at the CPU.
    fn disable_interrupts(&mut self);

    /// Stops the periodic video interrupt, which would otherwise fire into the kernel's early boot.
    fn disable_vi_interrupt(&mut self);

    /// Calls `entry(argc, argv, envp, NULL)` with an empty `envp`.
    ///
    /// # Safety
    ///
    /// `entry` must be the entry point of code that is loaded and coherent for instruction fetch.
    unsafe fn enter(&mut self, entry: u32, args: &BootArgs<'_>) -> !;
}

/// Everything the kernel receives.
///
/// Only a successful [`Loader::run`](crate::Loader::run) creates one.
#[derive(Debug, Clone, Copy)]
pub struct Handoff<'a> {
    entry: u32,
    args: BootArgs<'a>,
}

impl<'a> Handoff<'a> {
    pub(crate) fn new(entry: u32, args: BootArgs<'a>) -> Self {
        Self { entry, args }
    }

    pub fn entry(&self) -> u32 {
        self.entry
    }

    pub fn args(&self) -> &BootArgs<'a> {
        &self.args
    }
}

/// Masks interrupts and jumps to the kernel. Never returns.
pub fn transfer<M: Machine + ?Sized>(machine: &mut M, handoff: &Handoff<'_>) -> ! {
    info!("Jumping: {:#x}", handoff.entry);

    machine.disable_interrupts();
    machine.disable_vi_interrupt();

    // SAFETY: a `Handoff` only exists after the segment holding `entry` was loaded and flushed.
    unsafe { machine.enter(handoff.entry, &handoff.args) }
}
