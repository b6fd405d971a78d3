//! Named pipe (FIFO) wake-up notifier.
//!
//! The pipe never carries the price. Each byte written (value `1`) tells the
//! consumer to re-read the shared memory slot.

use std::ffi::CString;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::FileTypeExt;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::TcError;

/// Byte written for every signal.
pub const SIGNAL_BYTE: u8 = 1;

/// Write end of the wake-up FIFO, held open for the process lifetime.
pub struct PipeNotifier {
    file: File,
    path: PathBuf,
}

impl PipeNotifier {
    /// Create the FIFO if absent and open it write-only.
    ///
    /// Opening blocks until a reader has the FIFO open, so call this from a
    /// blocking context.
    pub fn open(path: &Path) -> Result<Self, TcError> {
        ensure_fifo(path)?;

        let file = OpenOptions::new()
            .write(true)
            .open(path)
            .map_err(|e| TcError::Pipe(format!("open {}: {e}", path.display())))?;

        Ok(Self { file, path: path.to_path_buf() })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write one wake-up byte.
    ///
    /// This is a blocking write. It returns at once while the FIFO buffer has
    /// room, which holds as long as the consumer keeps reading.
    pub fn signal(&mut self) -> Result<(), TcError> {
        self.file
            .write_all(&[SIGNAL_BYTE])
            .map_err(|e| TcError::Pipe(format!("write {}: {e}", self.path.display())))
    }
}

/// Make sure `path` is a FIFO, creating it with mode 0666 when missing.
pub fn ensure_fifo(path: &Path) -> Result<(), TcError> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.file_type().is_fifo() => return Ok(()),
        Ok(_) => {
            return Err(TcError::Pipe(format!("{} exists and is not a FIFO", path.display())));
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(TcError::Pipe(format!("stat {}: {e}", path.display()))),
    }

    let c_path = CString::new(path.as_os_str().as_bytes())
        .map_err(|e| TcError::Pipe(format!("bad pipe path {}: {e}", path.display())))?;

    // SAFETY: c_path is a valid NUL-terminated string for the call duration.
    let rc = unsafe { libc::mkfifo(c_path.as_ptr(), 0o666) };
    if rc != 0 {
        let err = std::io::Error::last_os_error();
        // Lost a race with another creator.
        if err.kind() != std::io::ErrorKind::AlreadyExists {
            return Err(TcError::Pipe(format!("mkfifo {}: {err}", path.display())));
        }
    }
    info!("created pipe {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Read;
    use std::os::unix::fs::OpenOptionsExt;

    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("tc_pipe_{}_{name}", std::process::id()))
    }

    /// Reader end that does not block on open.
    fn open_reader(path: &Path) -> File {
        OpenOptions::new()
            .read(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(path)
            .unwrap()
    }

    #[test]
    fn creates_fifo_when_absent() {
        let path = temp_path("create");
        let _ = std::fs::remove_file(&path);

        ensure_fifo(&path).unwrap();
        assert!(std::fs::metadata(&path).unwrap().file_type().is_fifo());

        // Idempotent on an existing FIFO.
        ensure_fifo(&path).unwrap();
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn rejects_regular_file() {
        let path = temp_path("regular");
        std::fs::write(&path, b"not a pipe").unwrap();
        assert!(matches!(ensure_fifo(&path), Err(TcError::Pipe(_))));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn signal_writes_single_byte() {
        let path = temp_path("signal");
        let _ = std::fs::remove_file(&path);
        ensure_fifo(&path).unwrap();

        let mut reader = open_reader(&path);
        let mut notifier = PipeNotifier::open(&path).unwrap();

        notifier.signal().unwrap();
        notifier.signal().unwrap();

        let mut buf = [0u8; 8];
        let n = reader.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], &[SIGNAL_BYTE, SIGNAL_BYTE]);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn signal_reports_broken_pipe() {
        let path = temp_path("broken");
        let _ = std::fs::remove_file(&path);
        ensure_fifo(&path).unwrap();

        let reader = open_reader(&path);
        let mut notifier = PipeNotifier::open(&path).unwrap();
        drop(reader);

        // The test harness ignores SIGPIPE like any Rust binary, so the write
        // surfaces EPIPE instead of killing the process.
        assert!(matches!(notifier.signal(), Err(TcError::Pipe(_))));
        let _ = std::fs::remove_file(&path);
    }
}
