//! Simulated devices for host tests. Every device appends to a shared journal so tests can check
//! the order of cache maintenance and DMA.

use std::{
    cell::RefCell,
    rc::Rc,
    sync::{Arc, Mutex, Once},
};

use boot_header::{size_record, BootSizes, SIZE_SLOTS_LEN};
use log::{LevelFilter, Log, Metadata, Record};

use crate::{
    cache::CacheControl,
    error::{BootError, BootResult},
    handoff::Machine,
    loader::PhysicalMemory,
    logging::DebugSink,
    metadata::BootArgs,
};

pub const PT_LOAD: u32 = 1;
pub const PT_NOTE: u32 = 4;

const EHDR_LEN: u32 = 52;
const PHDR_LEN: u32 = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Invalidate { addr: usize, len: usize },
    WritebackInvalidate { addr: usize, len: usize },
    Dma { addr: usize, len: usize, source: u32 },
}

#[derive(Debug, Clone, Default)]
pub struct Journal(Rc<RefCell<Vec<Event>>>);

impl Journal {
    fn push(&self, event: Event) {
        self.0.borrow_mut().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.borrow().clone()
    }
}

/// A cartridge window that starts with the two size slots, followed by the image.
pub struct SimCart {
    window_start: u32,
    window: Vec<u8>,
    journal: Journal,
}

impl SimCart {
    pub fn new(image_base: u32, sizes: BootSizes, image: &[u8], journal: Journal) -> Self {
        let mut window = Vec::with_capacity(image.len() + SIZE_SLOTS_LEN as usize);
        window.extend_from_slice(&size_record(sizes.disk_size));
        window.extend_from_slice(&size_record(sizes.kernel_size));
        window.extend_from_slice(image);

        Self {
            window_start: image_base - SIZE_SLOTS_LEN,
            window,
            journal,
        }
    }
}

impl crate::storage::StorageDevice for SimCart {
    fn read(&mut self, dst: &mut [u8], addr: u32) -> BootResult<()> {
        assert_eq!(dst.len() % 2, 0, "odd DMA length {}", dst.len());

        let start = addr
            .checked_sub(self.window_start)
            .map(|offset| offset as usize)
            .filter(|&offset| offset <= self.window.len())
            .ok_or(BootError::TransferOutOfRange)?;

        // Bytes past the end of the window read as zero, like an erased cartridge.
        let available = (self.window.len() - start).min(dst.len());
        dst[..available].copy_from_slice(&self.window[start..start + available]);
        dst[available..].fill(0);

        self.journal.push(Event::Dma {
            addr: dst.as_ptr() as usize,
            len: dst.len(),
            source: addr,
        });
        Ok(())
    }
}

pub struct SimCache {
    journal: Journal,
}

impl SimCache {
    pub fn new(journal: Journal) -> Self {
        Self { journal }
    }
}

impl CacheControl for SimCache {
    fn invalidate(&mut self, region: &[u8]) {
        self.journal.push(Event::Invalidate {
            addr: region.as_ptr() as usize,
            len: region.len(),
        });
    }

    fn writeback_invalidate(&mut self, region: &[u8]) {
        self.journal.push(Event::WritebackInvalidate {
            addr: region.as_ptr() as usize,
            len: region.len(),
        });
    }
}

/// RAM pre-filled with garbage so zero-filling is observable.
pub struct SimRam {
    base: u32,
    bytes: Vec<u8>,
}

impl SimRam {
    pub const FILL: u8 = 0xcc;

    pub fn new(base: u32, size: usize) -> Self {
        Self {
            base,
            bytes: vec![Self::FILL; size],
        }
    }

    fn offset(&self, addr: u32) -> usize {
        (addr - self.base) as usize
    }

    pub fn bytes(&self, addr: u32, len: usize) -> &[u8] {
        let offset = self.offset(addr);
        &self.bytes[offset..offset + len]
    }

    /// The host address backing `addr`, as recorded in the journal.
    pub fn address_of(&self, addr: u32) -> usize {
        self.bytes[self.offset(addr)..].as_ptr() as usize
    }

    pub fn untouched(&self) -> bool {
        self.bytes.iter().all(|&b| b == Self::FILL)
    }
}

impl PhysicalMemory for SimRam {
    fn region(&mut self, addr: u32, len: usize) -> BootResult<&mut [u8]> {
        let start = addr
            .checked_sub(self.base)
            .ok_or(BootError::SegmentOutOfRange)? as usize;
        let end = start
            .checked_add(len)
            .ok_or(BootError::SegmentOutOfRange)?;

        self.bytes
            .get_mut(start..end)
            .ok_or(BootError::SegmentOutOfRange)
    }
}

/// A debug sink that records everything written to it.
#[derive(Clone)]
pub struct SimSink {
    present: bool,
    out: Arc<Mutex<Vec<u8>>>,
}

impl SimSink {
    pub fn present() -> Self {
        Self {
            present: true,
            out: Arc::default(),
        }
    }

    pub fn absent() -> Self {
        Self {
            present: false,
            out: Arc::default(),
        }
    }

    pub fn output(&self) -> String {
        String::from_utf8(self.out.lock().unwrap().clone()).unwrap()
    }
}

impl DebugSink for SimSink {
    fn probe(&mut self) -> bool {
        self.present
    }

    fn write(&mut self, bytes: &[u8]) {
        if self.present {
            self.out.lock().unwrap().extend_from_slice(bytes);
        }
    }
}

thread_local! {
    static CAPTURED: RefCell<Vec<String>> = RefCell::new(Vec::new());
}

/// Keeps the log lines of each test thread apart.
struct CaptureLogger;

impl Log for CaptureLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        let line = format!("[{:>5}] {}", record.level(), record.args());
        CAPTURED.with(|lines| lines.borrow_mut().push(line));
    }

    fn flush(&self) {}
}

static CAPTURE: CaptureLogger = CaptureLogger;
static INSTALL: Once = Once::new();

/// Starts recording `log` output of the calling thread, dropping anything recorded before.
pub fn capture_logs() {
    INSTALL.call_once(|| {
        log::set_logger(&CAPTURE).expect("another logger is installed");
        log::set_max_level(LevelFilter::Trace);
    });
    CAPTURED.with(|lines| lines.borrow_mut().clear());
}

/// The lines recorded on this thread since [`capture_logs`].
pub fn captured_logs() -> Vec<String> {
    CAPTURED.with(|lines| lines.borrow().clone())
}

/// A CPU whose `enter` checks the interrupt state and then panics with a recognizable message.
pub struct SimMachine {
    interrupts: bool,
    vi_interrupt: bool,
}

impl SimMachine {
    pub fn new() -> Self {
        Self {
            interrupts: true,
            vi_interrupt: true,
        }
    }
}

impl Machine for SimMachine {
    fn disable_interrupts(&mut self) {
        self.interrupts = false;
    }

    fn disable_vi_interrupt(&mut self) {
        self.vi_interrupt = false;
    }

    unsafe fn enter(&mut self, entry: u32, args: &BootArgs<'_>) -> ! {
        assert!(!self.interrupts, "interrupts still enabled");
        assert!(!self.vi_interrupt, "VI interrupt still enabled");
        assert_eq!(args.argv()[0].to_bytes(), b"hello");
        assert_eq!(args.argv()[3].to_bytes(), b"root=/dev/n64cart");

        panic!("kernel entered at {:#x} with argc {}", entry, args.argc());
    }
}

/// Builds an ELF32 image in the host's byte order.
pub struct ElfBuilder {
    entry: u32,
    magic: [u8; 4],
    class: u8,
    ph_offset: u32,
    segments: Vec<[u32; 5]>,
}

impl ElfBuilder {
    pub fn new(entry: u32) -> Self {
        Self {
            entry,
            magic: *b"\x7fELF",
            class: 1,
            ph_offset: EHDR_LEN,
            segments: Vec::new(),
        }
    }

    pub fn magic(mut self, magic: [u8; 4]) -> Self {
        self.magic = magic;
        self
    }

    pub fn class(mut self, class: u8) -> Self {
        self.class = class;
        self
    }

    pub fn ph_offset(mut self, ph_offset: u32) -> Self {
        self.ph_offset = ph_offset;
        self
    }

    /// Adds a program header. Loadable file bytes are filled with a non-zero pattern.
    pub fn segment(
        mut self,
        kind: u32,
        offset: u32,
        paddr: u32,
        file_size: u32,
        mem_size: u32,
    ) -> Self {
        self.segments.push([kind, offset, paddr, file_size, mem_size]);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let table_end = self.ph_offset + PHDR_LEN * self.segments.len() as u32;
        let data_end = self
            .segments
            .iter()
            .map(|[_, offset, _, file_size, _]| offset + file_size)
            .max()
            .unwrap_or(0);
        let mut image = vec![0u8; table_end.max(data_end).max(256) as usize];

        let data = if cfg!(target_endian = "big") { 2 } else { 1 };
        image[..4].copy_from_slice(&self.magic);
        image[4] = self.class;
        image[5] = data;
        image[6] = 1;

        let put16 = |image: &mut Vec<u8>, at: usize, value: u16| {
            image[at..at + 2].copy_from_slice(&value.to_ne_bytes())
        };
        put16(&mut image, 16, 2); // ET_EXEC
        put16(&mut image, 18, 8); // EM_MIPS
        put16(&mut image, 40, EHDR_LEN as u16);
        put16(&mut image, 42, PHDR_LEN as u16);
        put16(&mut image, 44, self.segments.len() as u16);

        let put32 = |image: &mut Vec<u8>, at: usize, value: u32| {
            image[at..at + 4].copy_from_slice(&value.to_ne_bytes())
        };
        put32(&mut image, 20, 1);
        put32(&mut image, 24, self.entry);
        put32(&mut image, 28, self.ph_offset);

        for (index, segment) in self.segments.iter().enumerate() {
            let [kind, offset, paddr, file_size, mem_size] = *segment;
            let at = (self.ph_offset + PHDR_LEN * index as u32) as usize;
            put32(&mut image, at, kind);
            put32(&mut image, at + 4, offset);
            put32(&mut image, at + 8, paddr);
            put32(&mut image, at + 12, paddr);
            put32(&mut image, at + 16, file_size);
            put32(&mut image, at + 20, mem_size);
            put32(&mut image, at + 24, 0x7); // RWX
            put32(&mut image, at + 28, 0x10);

            if kind == PT_LOAD {
                for (i, byte) in image[offset as usize..(offset + file_size) as usize]
                    .iter_mut()
                    .enumerate()
                {
                    *byte = (i % 251) as u8 + 1;
                }
            }
        }

        image
    }
}
