//! Drives the boot stages in order: sizes, header, segment, metadata.

use boot_header::RawHeaderBuffer;
use log::{error, info, trace, warn};

use crate::{
    cache::CacheControl,
    config::BootConfig,
    elf::{self, ExecutableHeader, ValidationWarnings},
    error::{BootError, BootResult},
    handoff::Handoff,
    loader::{load_segment, PhysicalMemory},
    logging::DebugSink,
    metadata::{write_metadata, BootArgs},
    storage::{read_header, read_sizes, StorageDevice},
};

/// Where the boot sequence currently is. `Transfer` and `Halt` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootState {
    Init,
    StorageProbe,
    ReadSizes,
    ValidateHeader,
    LocateSegment,
    LoadSegment,
    WriteMetadata,
    Transfer,
    Halt,
}

/// The boot sequence over borrowed devices.
pub struct Loader<'d, S: ?Sized, C: ?Sized, M: ?Sized> {
    storage: &'d mut S,
    cache: &'d mut C,
    memory: &'d mut M,
    config: BootConfig,
    state: BootState,
}

impl<'d, S, C, M> Loader<'d, S, C, M>
where
    S: StorageDevice + ?Sized,
    C: CacheControl + ?Sized,
    M: PhysicalMemory + ?Sized,
{
    pub fn new(
        storage: &'d mut S,
        cache: &'d mut C,
        memory: &'d mut M,
        config: BootConfig,
    ) -> Self {
        Self {
            storage,
            cache,
            memory,
            config,
            state: BootState::Init,
        }
    }

    pub fn state(&self) -> BootState {
        self.state
    }

    fn advance(&mut self, next: BootState) {
        trace!("{:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Probes the optional debug sideband. Returns the sink only if it answered.
    pub fn probe_debug<D: DebugSink>(&mut self, mut sink: D) -> Option<D> {
        self.advance(BootState::StorageProbe);
        sink.probe().then_some(sink)
    }

    /// Loads the kernel and prepares its arguments in `header`.
    ///
    /// On error the loader is in [`BootState::Halt`] and the caller must not transfer control.
    pub fn run<'h>(&mut self, header: &'h mut RawHeaderBuffer) -> BootResult<Handoff<'h>> {
        match self.stage(header) {
            Ok(handoff) => {
                self.advance(BootState::Transfer);
                Ok(handoff)
            }
            Err(err) => {
                error!("{}", err);
                self.advance(BootState::Halt);
                Err(err)
            }
        }
    }

    fn stage<'h>(&mut self, header: &'h mut RawHeaderBuffer) -> BootResult<Handoff<'h>> {
        let base = self.config.image_base;

        self.advance(BootState::ReadSizes);
        let sizes = read_sizes(self.storage, self.cache, base)?;
        if sizes.kernel_size == 0 {
            return Err(BootError::NoKernel);
        }
        info!(
            "Booting kernel {} kb, {} kb",
            sizes.kernel_size / 1024,
            sizes.disk_size / 1024
        );

        self.advance(BootState::ValidateHeader);
        info!("Address: {:p}", header.as_bytes().as_ptr());
        read_header(self.storage, self.cache, header, base)?;
        let warnings = elf::validate(header).warnings();
        if warnings.contains(ValidationWarnings::BAD_MAGIC) {
            warn!("Not an ELF kernel?");
        }
        if warnings.contains(ValidationWarnings::NOT_32BIT) {
            warn!("Not a 32-bit kernel?");
        }

        self.advance(BootState::LocateSegment);
        let exec = ExecutableHeader::parse(header);
        let segment = elf::find_loadable_segment(header, &exec)?;

        self.advance(BootState::LoadSegment);
        load_segment(self.storage, self.cache, self.memory, base, &segment)?;
        info!("Entry: {:#x}", exec.entry);

        self.advance(BootState::WriteMetadata);
        let disk = write_metadata(header, &sizes, base)?;
        info!("Disk: {}", sizes.disk_offset());

        let header: &'h RawHeaderBuffer = header;
        let args = BootArgs::new(header, &self.config)?;
        for arg in &args.argv()[1..3] {
            info!("{}", arg.to_str().unwrap_or("?"));
        }
        trace!("{:?}", disk);

        Ok(Handoff::new(exec.entry, args))
    }
}
