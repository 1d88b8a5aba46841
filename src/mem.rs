//! Physical-memory mapping of a controller register window.
//!
//! [`PeripheralWindow`] gives the process a byte-addressable view of one
//! page of physical address space through `/dev/mem`. A window is either
//! fully mapped or it does not exist: construction performs the mapping
//! (or fails), and dropping the window unmaps it.

use std::fs::OpenOptions;
use std::io;
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsRawFd;
use std::ptr;

use crate::constants::PAGE_SIZE;
use crate::error::{Error, Result};

/// Split a physical address into its page base and in-page byte offset.
///
/// `mmap` offsets must be page aligned; the BSC register blocks are, but
/// callers handing in a base with nonzero low bits still get a valid
/// mapping of the containing page.
pub(crate) fn split_page(physical: usize) -> (usize, usize) {
    let page_base = physical & !(PAGE_SIZE - 1);
    (page_base, physical - page_base)
}

/// An active mapping of one page of physical memory.
///
/// Owned exclusively by the engine that created it; two channels never
/// share a window. The raw pointer member makes this type neither `Send`
/// nor `Sync`, which matches the single-threaded access discipline the
/// register protocol requires.
#[derive(Debug)]
pub(crate) struct PeripheralWindow {
    /// Page-aligned mapped address.
    page: *mut u32,
    /// Word offset of the register block within the page.
    offset_words: usize,
}

impl PeripheralWindow {
    /// Map the page containing `physical_base`.
    ///
    /// Opens `/dev/mem` read/write with `O_SYNC` and maps one shared
    /// page. The descriptor is closed again before returning; the mapping
    /// outlives it. Fails with [`Error::Map`] when the open or the map is
    /// refused, which without root privileges it will be.
    pub(crate) fn map(physical_base: usize) -> Result<Self> {
        let (page_base, in_page) = split_page(physical_base);

        let mem = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_SYNC)
            .open("/dev/mem")
            .map_err(|source| Error::Map {
                base: physical_base,
                source,
            })?;

        let page = unsafe {
            libc::mmap(
                ptr::null_mut(),
                PAGE_SIZE,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                mem.as_raw_fd(),
                page_base as libc::off_t,
            )
        };
        if page == libc::MAP_FAILED {
            return Err(Error::Map {
                base: physical_base,
                source: io::Error::last_os_error(),
            });
        }

        log::debug!("mapped peripheral page {page_base:#x} (+{in_page:#x})");

        Ok(Self {
            page: page as *mut u32,
            offset_words: in_page / 4,
        })
    }

    /// Volatile read of the 32-bit register at `word` words past the base.
    pub(crate) fn read_word(&self, word: usize) -> u32 {
        let index = self.offset_words + word;
        debug_assert!((index + 1) * 4 <= PAGE_SIZE);
        unsafe { ptr::read_volatile(self.page.add(index)) }
    }

    /// Volatile write of the 32-bit register at `word` words past the base.
    pub(crate) fn write_word(&mut self, word: usize, value: u32) {
        let index = self.offset_words + word;
        debug_assert!((index + 1) * 4 <= PAGE_SIZE);
        unsafe { ptr::write_volatile(self.page.add(index), value) }
    }
}

impl Drop for PeripheralWindow {
    fn drop(&mut self) {
        let rc = unsafe { libc::munmap(self.page as *mut libc::c_void, PAGE_SIZE) };
        if rc != 0 {
            log::warn!(
                "munmap of peripheral page failed: {}",
                io::Error::last_os_error()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_page_aligned_base() {
        assert_eq!(split_page(0x2020_5000), (0x2020_5000, 0));
    }

    #[test]
    fn split_page_offset_base() {
        assert_eq!(split_page(0x2020_5010), (0x2020_5000, 0x10));
        assert_eq!(split_page(0x0000_0fff), (0, 0xfff));
    }
}
