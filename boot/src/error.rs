use core::{fmt, result::Result};

/// Errors that stop the boot sequence before control reaches the kernel.
///
/// Header validation problems are not errors: they are reported through
/// [`ValidationResult`](crate::elf::ValidationResult) and the sequence carries on.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BootError {
    /// `kernelSize` is zero; nothing is configured to boot.
    NoKernel,
    /// None of the declared program headers is a loadable segment.
    NoLoadableSegment,
    /// A declared program header does not fit inside the header buffer.
    ProgramHeaderOutOfBounds,
    /// The segment target is not backed by installed RAM.
    SegmentOutOfRange,
    /// The segment target overlaps the running loader's image or stack.
    SegmentOverlapsLoader,
    /// A storage read started outside the device window.
    TransferOutOfRange,
    /// `image base + disk offset` does not fit a 32-bit address.
    DiskOffsetOverflow,
    /// A metadata slot holds no terminating NUL, so it cannot be passed as an argument.
    UnterminatedRecord,
}

/// The return value that indicates a successful step ([`Ok`]) or a reason to stop booting
/// ([`Err`]).
pub type BootResult<T> = Result<T, BootError>;

impl fmt::Display for BootError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BootError::NoKernel => write!(f, "No kernel configured"),
            BootError::NoLoadableSegment => write!(f, "No loadable segment in the kernel"),
            BootError::ProgramHeaderOutOfBounds => {
                write!(f, "Program header lies outside the header buffer")
            }
            BootError::SegmentOutOfRange => write!(f, "Segment does not fit in RAM"),
            BootError::SegmentOverlapsLoader => write!(f, "Segment overlaps the loader"),
            BootError::TransferOutOfRange => write!(f, "Read outside the cartridge window"),
            BootError::DiskOffsetOverflow => write!(f, "Disk start address overflows"),
            BootError::UnterminatedRecord => write!(f, "Metadata record is not NUL-terminated"),
        }
    }
}
