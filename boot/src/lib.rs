//! The second boot stage for the Nintendo 64: loads a Linux ELF kernel from the cartridge, tells it
//! where the cartridge disk lives and jumps into it.
//!
//! Every piece of hardware is reached through a small capability trait ([`StorageDevice`],
//! [`CacheControl`], [`PhysicalMemory`], [`DebugSink`], [`Machine`]), so the whole sequence runs on
//! the host against simulated devices. The console implementations live in `arch`.
#![cfg_attr(not(test), no_std)]
#![cfg_attr(target_arch = "mips", feature(asm_experimental_arch))]

pub mod cache;
pub mod config;
pub mod elf;
pub mod error;
pub mod handoff;
pub mod loader;
pub mod logging;
pub mod metadata;
pub mod sequence;
pub mod storage;

#[cfg(test)]
mod sim;

#[cfg(target_arch = "mips")]
#[path = "arch/mips/mod.rs"]
pub mod arch;

pub use boot_header::{BootSizes, DiskInfo, RawHeaderBuffer};
pub use cache::CacheControl;
pub use config::BootConfig;
pub use error::{BootError, BootResult};
pub use handoff::{transfer, Handoff, Machine};
pub use loader::PhysicalMemory;
pub use logging::DebugSink;
pub use sequence::{BootState, Loader};
pub use storage::StorageDevice;

/// The log level picked at build time through `BOOT_LOG_LEVEL`.
pub const LOG_LEVEL: &str = match option_env!("BOOT_LOG_LEVEL") {
    Some(level) => level,
    None => "info",
};

/// Stops here for good. Used when nothing can be booted.
pub fn halt() -> ! {
    loop {
        core::hint::spin_loop();
    }
}
