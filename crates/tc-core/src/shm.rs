//! Shared memory price slot.
//!
//! The relay publishes the latest trade price into a tiny file-backed mapping
//! that one external consumer reads after each pipe wake-up.
//!
//! # Memory layout
//!
//! ```text
//! ┌──────────────────────────────┬────┬───────────────────┐
//! │ ASCII price, 2 fraction digits │ \0 │ zero padding      │
//! └──────────────────────────────┴────┴───────────────────┘
//!   0                                              SHM_BUFFER_SIZE
//! ```
//!
//! Readers scan up to the first zero byte. A price whose text fills the whole
//! slot is stored without a terminator.

use std::fs::OpenOptions;
use std::io::{Cursor, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use std::sync::atomic::{Ordering, fence};

use crate::error::TcError;

/// Capacity of the price slot in bytes.
pub const SHM_BUFFER_SIZE: usize = 32;

/// Single-writer publisher over the mapped price slot.
///
/// The mapping is created once and stays valid until the publisher is dropped.
pub struct ShmPricePublisher {
    /// Base pointer to the mmap'd region.
    base: *mut u8,
    /// Backing file path (for diagnostics).
    path: PathBuf,
}

// SAFETY: the mapping is owned exclusively by this struct and only written
// through `&mut self`.
unsafe impl Send for ShmPricePublisher {}

impl ShmPricePublisher {
    /// Create (or reuse) the backing file, size it to [`SHM_BUFFER_SIZE`], and
    /// map it read/write shared.
    pub fn create(path: &Path) -> Result<Self, TcError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .mode(0o666)
            .open(path)
            .map_err(|e| TcError::Shm(format!("open {}: {e}", path.display())))?;

        file.set_len(SHM_BUFFER_SIZE as u64)
            .map_err(|e| TcError::Shm(format!("truncate {}: {e}", path.display())))?;

        // SAFETY: mapping a regular file we just sized to SHM_BUFFER_SIZE. The
        // mapping holds its own reference, so dropping `file` afterwards is fine.
        let base = unsafe {
            libc::mmap(
                std::ptr::null_mut(),
                SHM_BUFFER_SIZE,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                file.as_raw_fd(),
                0,
            )
        };
        if base == libc::MAP_FAILED {
            return Err(TcError::Shm(format!(
                "mmap {}: {}",
                path.display(),
                std::io::Error::last_os_error()
            )));
        }

        Ok(Self { base: base as *mut u8, path: path.to_path_buf() })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `price` as a two-decimal ASCII string at offset 0.
    ///
    /// Everything after the string is zeroed, so a shorter price never leaves
    /// digits of a longer predecessor behind.
    pub fn publish(&mut self, price: f64) {
        let mut buf = [0u8; SHM_BUFFER_SIZE];
        let len = format_price(price, &mut buf);

        // SAFETY: both ranges lie inside the SHM_BUFFER_SIZE mapping.
        unsafe {
            std::ptr::copy_nonoverlapping(buf.as_ptr(), self.base, len);
            // Orders this process's stores only; readers get no guarantee
            // without a matching acquire on their side.
            fence(Ordering::Release);
            std::ptr::write_bytes(self.base.add(len), 0, SHM_BUFFER_SIZE - len);
        }
    }

    /// Copy of the current slot contents.
    pub fn snapshot(&self) -> [u8; SHM_BUFFER_SIZE] {
        let mut out = [0u8; SHM_BUFFER_SIZE];
        // SAFETY: the mapping is SHM_BUFFER_SIZE bytes long and readable.
        unsafe {
            std::ptr::copy_nonoverlapping(self.base, out.as_mut_ptr(), SHM_BUFFER_SIZE);
        }
        out
    }
}

impl Drop for ShmPricePublisher {
    fn drop(&mut self) {
        // The file itself stays in place for readers.
        // SAFETY: `base` came from a successful SHM_BUFFER_SIZE mmap in
        // `create` and is unmapped exactly once, here.
        unsafe {
            libc::munmap(self.base as *mut libc::c_void, SHM_BUFFER_SIZE);
        }
    }
}

/// Format `price` with two fraction digits into `buf`, returning the number of
/// bytes written. Text longer than the buffer is cut at capacity.
fn format_price(price: f64, buf: &mut [u8; SHM_BUFFER_SIZE]) -> usize {
    let mut cursor = Cursor::new(&mut buf[..]);
    // An overflow error only means the text was truncated to capacity.
    let _ = write!(cursor, "{price:.2}");
    cursor.position() as usize
}

/// Parse a slot the way consumers do: read up to the first zero byte.
pub fn parse_slot(bytes: &[u8]) -> Option<f64> {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    std::str::from_utf8(&bytes[..end]).ok()?.parse().ok()
}

/// The slot text up to its terminator.
#[cfg(test)]
fn slot_text(bytes: &[u8]) -> &str {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    std::str::from_utf8(&bytes[..end]).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("tc_shm_{}_{name}", std::process::id()))
    }

    #[test]
    fn publish_two_decimals() {
        let path = temp_path("two_dec");
        let mut shm = ShmPricePublisher::create(&path).unwrap();

        shm.publish(2583.4);
        let slot = shm.snapshot();
        assert_eq!(slot_text(&slot), "2583.40");
        assert_eq!(slot[7], 0);

        let back = parse_slot(&slot).unwrap();
        assert!((back - 2583.4).abs() <= 0.005);

        drop(shm);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn shorter_price_leaves_no_stale_bytes() {
        let path = temp_path("stale");
        let mut shm = ShmPricePublisher::create(&path).unwrap();

        shm.publish(123456.789);
        assert_eq!(slot_text(&shm.snapshot()), "123456.79");

        shm.publish(9.5);
        let slot = shm.snapshot();
        assert_eq!(slot_text(&slot), "9.50");
        assert!(slot[4..].iter().all(|&b| b == 0));

        drop(shm);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn backing_file_is_sized_and_shared() {
        let path = temp_path("file");
        std::fs::write(&path, vec![b'x'; 100]).unwrap();

        let mut shm = ShmPricePublisher::create(&path).unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), SHM_BUFFER_SIZE as u64);

        shm.publish(2500.0);
        // Another reader of the file sees the same bytes.
        let on_disk = std::fs::read(&path).unwrap();
        assert_eq!(parse_slot(&on_disk), Some(2500.0));

        drop(shm);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn oversized_price_is_truncated() {
        let path = temp_path("huge");
        let mut shm = ShmPricePublisher::create(&path).unwrap();

        shm.publish(1e40);
        let slot = shm.snapshot();
        assert!(slot.iter().all(|&b| b != 0));
        assert!(slot.iter().all(|b| b.is_ascii_digit()));

        drop(shm);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn create_fails_in_missing_directory() {
        let path = temp_path("missing_dir").join("slot");
        assert!(matches!(ShmPricePublisher::create(&path), Err(TcError::Shm(_))));
    }
}
