//! Interprets the ELF32 header held in the raw header buffer.
//!
//! Identification problems are reported, not enforced: the loader proceeds optimistically and
//! leaves the policy to the caller. Program headers are read in the CPU's native byte order.

use core::mem::size_of;

use bitflags::bitflags;
use boot_header::RawHeaderBuffer;
use xmas_elf::{
    header::{Class, HeaderPt1, HeaderPt2_},
    program::{ProgramHeader32, Type},
};

use crate::error::{BootError, BootResult};

const PH_ENTRY_LEN: usize = size_of::<ProgramHeader32>();

bitflags! {
    /// Problems found in the identification bytes.
    #[derive(Default)]
    pub struct ValidationWarnings: u8 {
        /// Bytes 1..4 of the identification field are not `ELF`.
        const BAD_MAGIC = 1 << 0;
        /// The class marker is not `ELFCLASS32`.
        const NOT_32BIT = 1 << 1;
    }
}

/// The outcome of checking the identification bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationResult {
    warnings: ValidationWarnings,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn warnings(&self) -> ValidationWarnings {
        self.warnings
    }
}

/// The fields of the executable header the loader relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutableHeader {
    pub ident: [u8; 16],
    pub entry: u32,
    pub ph_offset: u32,
    pub ph_entry_size: u16,
    pub ph_count: u16,
}

impl ExecutableHeader {
    pub fn parse(buf: &RawHeaderBuffer) -> Self {
        let bytes = buf.as_bytes();
        let pt2: &HeaderPt2_<u32> = zero::read(&bytes[size_of::<HeaderPt1>()..]);

        let mut ident = [0u8; 16];
        ident.copy_from_slice(&bytes[..16]);

        Self {
            ident,
            entry: pt2.entry_point,
            ph_offset: pt2.ph_offset,
            ph_entry_size: pt2.ph_entry_size,
            ph_count: pt2.ph_count,
        }
    }
}

/// Checks the magic and class bytes. The buffer is not modified.
pub fn validate(buf: &RawHeaderBuffer) -> ValidationResult {
    let pt1: &HeaderPt1 = zero::read(&buf.as_bytes()[..size_of::<HeaderPt1>()]);
    let mut warnings = ValidationWarnings::empty();

    // Byte 0 is not checked; only the letters have to match.
    if pt1.magic[1..4] != *b"ELF" {
        warnings |= ValidationWarnings::BAD_MAGIC;
    }
    if !matches!(pt1.class(), Class::ThirtyTwo) {
        warnings |= ValidationWarnings::NOT_32BIT;
    }

    ValidationResult { warnings }
}

/// One program header entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentDescriptor {
    pub file_offset: u32,
    pub physical_address: u32,
    pub file_size: u32,
    pub memory_size: u32,
    pub align: u32,
}

impl From<&ProgramHeader32> for SegmentDescriptor {
    fn from(ph: &ProgramHeader32) -> Self {
        Self {
            file_offset: ph.offset,
            physical_address: ph.physical_addr,
            file_size: ph.file_size,
            memory_size: ph.mem_size,
            align: ph.align,
        }
    }
}

#[repr(C, align(4))]
struct EntryBuf([u8; PH_ENTRY_LEN]);

/// Returns the first `PT_LOAD` entry among the `ph_count` declared program headers.
pub fn find_loadable_segment(
    buf: &RawHeaderBuffer,
    header: &ExecutableHeader,
) -> BootResult<SegmentDescriptor> {
    let stride = (header.ph_entry_size as usize).max(PH_ENTRY_LEN);

    for index in 0..header.ph_count as usize {
        let raw = index
            .checked_mul(stride)
            .and_then(|offset| offset.checked_add(header.ph_offset as usize))
            .and_then(|start| Some(start..start.checked_add(PH_ENTRY_LEN)?))
            .and_then(|range| buf.as_bytes().get(range))
            .ok_or(BootError::ProgramHeaderOutOfBounds)?;

        // Entries may sit at any offset; copy into an aligned slot before viewing it.
        let mut entry = EntryBuf([0u8; PH_ENTRY_LEN]);
        entry.0.copy_from_slice(raw);
        let ph: &ProgramHeader32 = zero::read(&entry.0);

        if matches!(ph.get_type(), Ok(Type::Load)) {
            return Ok(SegmentDescriptor::from(ph));
        }
    }

    Err(BootError::NoLoadableSegment)
}
