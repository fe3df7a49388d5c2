//! Host-side helpers for packaging a kernel image behind the boot stage.
//!
//! The boot stage reads `kernelSize` from the four bytes right before the image. This tool produces
//! that record and tells the build how much cartridge space the padded image needs.

use std::{
    fs,
    io::{self, ErrorKind},
    path::Path,
};

use boot_header::{packaged_size, size_record};

/// Encodes the size record for an image of `len` bytes.
pub fn size_record_for(len: u64) -> io::Result<[u8; 4]> {
    let size = u32::try_from(len)
        .map_err(|_| io::Error::new(ErrorKind::InvalidInput, "image larger than 4 GiB"))?;

    Ok(size_record(size))
}

/// Returns the cartridge allocation for `image` and optionally writes its size record to `record`.
pub fn package(image: &Path, record: Option<&Path>) -> io::Result<u64> {
    let len = fs::metadata(image)?.len();

    if let Some(record) = record {
        fs::write(record, size_record_for(len)?)?;
    }

    Ok(packaged_size(len))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{env, path::PathBuf, process};

    fn scratch(name: &str) -> PathBuf {
        env::temp_dir().join(format!("cart-image-{}-{}", process::id(), name))
    }

    #[test]
    fn record_is_big_endian() {
        assert_eq!(size_record_for(5000).unwrap(), [0x00, 0x00, 0x13, 0x88]);
        assert!(size_record_for(1 << 32).is_err());
    }

    #[test]
    fn packages_an_image() {
        let image = scratch("kernel.elf");
        let record = scratch("size.bin");
        fs::write(&image, vec![0u8; 5000]).unwrap();

        let size = package(&image, Some(&record)).unwrap();
        assert_eq!(size, 8192 + 1024 * 1024);
        assert_eq!(fs::read(&record).unwrap(), 5000u32.to_be_bytes());

        fs::remove_file(image).unwrap();
        fs::remove_file(record).unwrap();
    }

    #[test]
    fn record_is_optional() {
        let image = scratch("small.elf");
        fs::write(&image, b"\x7fELF").unwrap();

        assert_eq!(package(&image, None).unwrap(), 4096 + 1024 * 1024);
        fs::remove_file(image).unwrap();
    }

    #[test]
    fn missing_image_is_an_error() {
        assert!(package(&scratch("does-not-exist"), None).is_err());
    }
}
