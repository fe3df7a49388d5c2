//! The console entry point. The IPL jumps to `_start`, which clears `.bss`, points the stack at the
//! top of RDRAM and calls `boot_main`.
#![no_std]
#![no_main]
#![feature(asm_experimental_arch)]

use core::{arch::global_asm, panic::PanicInfo};

use boot::{
    arch::{ram_size, Cartridge, IsViewer, N64Machine, Rdram, Vr4300Cache},
    halt,
    logging::{self, EnvLogger},
    transfer, BootConfig, Loader, RawHeaderBuffer,
};
use log::{error, info};

global_asm!(include_str!("arch/mips/entry.S"));

static LOGGER: EnvLogger<IsViewer> = EnvLogger::new();

#[no_mangle]
pub extern "C" fn boot_main() -> ! {
    let _ = logging::init_env_logger(&LOGGER);

    // SAFETY: this is the only owner of the PI registers.
    let mut cart = unsafe { Cartridge::new() };
    let mut cache = Vr4300Cache;
    let ram_size = ram_size();
    let mut ram = Rdram::new(ram_size);

    // `boot_main` never returns, so the buffer outlives the handoff. It sits in the reserved stack,
    // which `Rdram` never hands out to a segment.
    let mut header = RawHeaderBuffer::new();

    let mut loader = Loader::new(&mut cart, &mut cache, &mut ram, BootConfig::default());
    let sink = loader.probe_debug(IsViewer);
    let detected = sink.is_some();
    LOGGER.attach(sink);
    if detected {
        info!("Detected IS Viewer-64");
    }
    info!("Found {} kb of RAM", ram_size / 1024);

    match loader.run(&mut header) {
        Ok(handoff) => transfer(&mut N64Machine, &handoff),
        Err(_) => halt(),
    }
}

#[panic_handler]
fn panic(info: &PanicInfo<'_>) -> ! {
    error!("{}", info);
    halt()
}
