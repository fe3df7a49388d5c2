use core::ffi::CStr;

use boot_header::{ARGV0, CART_IMAGE_BASE, ROOT_ARG};

/// The configuration of the boot stage.
///
/// There is no filesystem to read a configuration file from, so everything is fixed at build time.
#[derive(Debug, Clone, Copy)]
pub struct BootConfig {
    /// The external address of the first image byte. The size slots sit right before it.
    pub image_base: u32,
    /// The program name handed to the kernel as `argv[0]`.
    pub argv0: &'static CStr,
    /// The root device argument handed to the kernel as `argv[3]`.
    pub root: &'static CStr,
}

impl Default for BootConfig {
    fn default() -> Self {
        Self {
            image_base: CART_IMAGE_BASE,
            argv0: CStr::from_bytes_with_nul(ARGV0).unwrap_or_default(),
            root: CStr::from_bytes_with_nul(ROOT_ARG).unwrap_or_default(),
        }
    }
}
