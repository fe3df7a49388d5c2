//! The IS-Viewer 64 debug port, usually only present under emulation.

use core::sync::atomic::{fence, Ordering};

use volatile::Volatile;

use crate::logging::DebugSink;

const ISVIEWER_WRITE_LEN: usize = 0xB3FF_0014;
const ISVIEWER_BUFFER: usize = 0xB3FF_0020;
const ISVIEWER_BUFFER_LEN: usize = 0xFF7F;
const SENTINEL: u32 = 0x1234_5678;

pub struct IsViewer;

impl IsViewer {
    fn word(index: usize) -> &'static mut Volatile<u32> {
        unsafe { &mut *((ISVIEWER_BUFFER + index * 4) as *mut Volatile<u32>) }
    }

    fn write_len() -> &'static mut Volatile<u32> {
        unsafe { &mut *(ISVIEWER_WRITE_LEN as *mut Volatile<u32>) }
    }
}

impl DebugSink for IsViewer {
    fn probe(&mut self) -> bool {
        // Reads back only if there is memory behind the buffer.
        Self::word(0).write(SENTINEL);
        fence(Ordering::SeqCst);
        Self::word(0).read() == SENTINEL
    }

    fn write(&mut self, bytes: &[u8]) {
        for chunk in bytes.chunks(ISVIEWER_BUFFER_LEN) {
            for (index, word) in chunk.chunks(4).enumerate() {
                let mut packed = [0u8; 4];
                packed[..word.len()].copy_from_slice(word);
                Self::word(index).write(u32::from_be_bytes(packed));
            }

            Self::write_len().write(chunk.len() as u32);
        }
    }
}
