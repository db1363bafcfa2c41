//! The OS capability the protocol consumes: positioned, direct transfers.
//!
//! Everything platform-specific lives here. The protocol itself only sees
//! the [`Volume`] trait, so it never branches on the target OS and tests can
//! substitute an in-memory device.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;

/// A handle supporting direct, unbuffered positioned reads and writes.
///
/// Byte counts and timing must reach the device as issued; implementations
/// back this with direct-I/O file handles (or a simulation in tests).
pub trait Volume {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<usize>;
    fn write_at(&mut self, offset: u64, buf: &[u8]) -> io::Result<usize>;
}

/// Open a block device for direct, unbuffered, synchronous transfer.
#[cfg(unix)]
pub fn open_direct(path: &Path) -> io::Result<File> {
    use std::os::unix::fs::OpenOptionsExt;

    OpenOptions::new()
        .read(true)
        .write(true)
        .custom_flags(libc::O_DIRECT | libc::O_NONBLOCK | libc::O_SYNC)
        .open(path)
}

/// Open a volume with host-side caching disabled.
#[cfg(windows)]
pub fn open_direct(path: &Path) -> io::Result<File> {
    use std::os::windows::fs::OpenOptionsExt;

    const FILE_FLAG_NO_BUFFERING: u32 = 0x2000_0000;
    const FILE_FLAG_WRITE_THROUGH: u32 = 0x8000_0000;

    OpenOptions::new()
        .read(true)
        .write(true)
        .custom_flags(FILE_FLAG_NO_BUFFERING | FILE_FLAG_WRITE_THROUGH)
        .open(path)
}

#[cfg(unix)]
impl Volume for File {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        std::os::unix::fs::FileExt::read_at(self, buf, offset)
    }

    fn write_at(&mut self, offset: u64, buf: &[u8]) -> io::Result<usize> {
        std::os::unix::fs::FileExt::write_at(self, buf, offset)
    }
}

#[cfg(windows)]
impl Volume for File {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        std::os::windows::fs::FileExt::seek_read(self, buf, offset)
    }

    fn write_at(&mut self, offset: u64, buf: &[u8]) -> io::Result<usize> {
        std::os::windows::fs::FileExt::seek_write(self, buf, offset)
    }
}
