//! Nintendo 64 (VR4300) implementations of the boot capabilities.

pub mod cache;
pub mod cpu;
pub mod isviewer;
pub mod memory;
pub mod pi;

pub use cache::Vr4300Cache;
pub use cpu::N64Machine;
pub use isviewer::IsViewer;
pub use memory::{ram_size, Rdram};
pub use pi::Cartridge;

/// Strips the segment bits from a KSEG0/KSEG1 address.
pub const PHYS_MASK: u32 = 0x1FFF_FFFF;
/// Cached, unmapped kernel segment.
pub const KSEG0: u32 = 0x8000_0000;

pub const fn to_physical(addr: u32) -> u32 {
    addr & PHYS_MASK
}
