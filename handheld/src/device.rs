//! Device handle, sector channel, and the page-level protocol.
//!
//! A [`Handheld`] owns one opened device and serialises the stateful
//! conversation with it: framed commands go to the command sector, page
//! payloads move through the data sectors, and every raw write is followed
//! by a settling delay the hardware depends on. None of this is safe to
//! interleave from two threads; all methods take `&mut self` and callers
//! must keep one handle per device.

use std::cmp;
use std::fs::File;
use std::thread;
use std::time::{Duration, Instant};

use crate::buffer::{transfer_alignment, AlignedBuf};
use crate::codec::round_up;
use crate::commands::{ReadCommand, ReadReverseCommand, WriteCommand, WriteFilemarksCommand};
use crate::error::DeviceError;
use crate::layout::{
    COMMAND_SECTOR, DATA_READ_SECTOR, DATA_WRITE_SECTOR, IDENTITY_OFFSET, IDENTITY_SECTOR,
    IDENTITY_SIGNATURE, PAGE_COUNT, PAGE_LENGTH_PREFIX, PAGE_SIZE, SECTOR_SIZE,
};
use crate::otp;
use crate::volume::{open_direct, Volume};

/// Post-write settling delay policy.
///
/// Writing to the device again too soon after a previous write makes it stop
/// responding, even though direct I/O should not return early. The delay is
/// a fraction of the measured write duration; the divisor is empirically
/// tuned against real hardware, not derived from any documented timing, so
/// it is kept as data rather than hard-coded in the transfer path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettlePolicy {
    /// The delay is the write duration divided by this.
    pub divisor: u32,
    /// Lower bound on the delay regardless of write duration.
    pub minimum: Duration,
}

impl SettlePolicy {
    pub fn delay_for(&self, write_time: Duration) -> Duration {
        cmp::max(write_time / self.divisor, self.minimum)
    }
}

#[cfg(unix)]
impl Default for SettlePolicy {
    fn default() -> Self {
        Self {
            divisor: 3,
            minimum: Duration::ZERO,
        }
    }
}

// Windows 10 needs considerably more time between writes.
#[cfg(windows)]
impl Default for SettlePolicy {
    fn default() -> Self {
        Self {
            divisor: 2,
            minimum: Duration::from_millis(1),
        }
    }
}

/// One candidate or verified handheld device.
///
/// Generic over the volume so the protocol can run against simulated
/// hardware in tests. The handle owns the volume exclusively; `close`
/// releases it and later transfers fail.
pub struct Handheld<V> {
    path: String,
    volume: Option<V>,
    alignment: usize,
    settle: SettlePolicy,
}

impl Handheld<File> {
    /// Open `path` in direct, unbuffered, synchronous mode.
    pub fn open(path: impl Into<String>) -> Result<Self, DeviceError> {
        let path = path.into();
        let file = open_direct(path.as_ref()).map_err(|source| DeviceError::Open {
            path: path.clone(),
            source,
        })?;
        Ok(Self::with_volume(path, file))
    }
}

impl<V: Volume> Handheld<V> {
    /// Wrap an already-opened volume.
    pub fn with_volume(path: impl Into<String>, volume: V) -> Self {
        Self {
            path: path.into(),
            volume: Some(volume),
            alignment: transfer_alignment(),
            settle: SettlePolicy::default(),
        }
    }

    /// Override the post-write settling policy.
    pub fn with_settle_policy(mut self, settle: SettlePolicy) -> Self {
        self.settle = settle;
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Release the underlying volume. Idempotent; the handle stays closed.
    pub fn close(&mut self) {
        self.volume = None;
    }

    pub fn is_closed(&self) -> bool {
        self.volume.is_none()
    }

    /// Borrow the underlying volume, if the handle is still open.
    pub fn volume(&self) -> Option<&V> {
        self.volume.as_ref()
    }

    /// Mutably borrow the underlying volume, if the handle is still open.
    pub fn volume_mut(&mut self) -> Option<&mut V> {
        self.volume.as_mut()
    }

    fn open_volume(&mut self) -> Result<&mut V, DeviceError> {
        self.volume.as_mut().ok_or_else(DeviceError::closed)
    }

    /// Write `data` to the device at `sector`, staging through an aligned
    /// buffer and settling afterwards. `data` must be at least one sector.
    pub fn write_sector(&mut self, sector: u32, data: &[u8]) -> Result<usize, DeviceError> {
        if data.len() < SECTOR_SIZE {
            return Err(DeviceError::Size {
                actual: data.len(),
                required: SECTOR_SIZE,
            });
        }

        let mut staged = AlignedBuf::zeroed(data.len(), self.alignment)?;
        staged[..data.len()].copy_from_slice(data);

        let settle = self.settle;
        let offset = sector as u64 * SECTOR_SIZE as u64;
        let volume = self.open_volume()?;

        let started = Instant::now();
        let result = volume.write_at(offset, &staged[..data.len()]);
        let elapsed = started.elapsed();

        // The settle delay applies whether or not the write succeeded; the
        // device may have consumed part of a failed transfer.
        thread::sleep(settle.delay_for(elapsed));

        result.map_err(DeviceError::Io)
    }

    /// Fill `buf` from the device starting at `sector`. The transfer itself
    /// is rounded up to whole sectors; only `buf.len()` bytes are copied
    /// back. Returns the OS byte count for the full transfer.
    pub fn read_sector(&mut self, sector: u32, buf: &mut [u8]) -> Result<usize, DeviceError> {
        if buf.len() < SECTOR_SIZE {
            return Err(DeviceError::Size {
                actual: buf.len(),
                required: SECTOR_SIZE,
            });
        }

        let required = round_up(buf.len(), SECTOR_SIZE);
        let mut staged = AlignedBuf::zeroed(required, self.alignment)?;

        let offset = sector as u64 * SECTOR_SIZE as u64;
        let volume = self.open_volume()?;
        let read = volume
            .read_at(offset, &mut staged[..required])
            .map_err(DeviceError::Io)?;

        buf.copy_from_slice(&staged[..buf.len()]);
        Ok(read)
    }

    /// Send a framed command: zero-pad to a whole sector and write it to the
    /// command sector.
    pub fn send_command(&mut self, command: &[u8]) -> Result<usize, DeviceError> {
        let padded_len = round_up(command.len().max(1), SECTOR_SIZE);
        let mut padded = vec![0u8; padded_len];
        padded[..command.len()].copy_from_slice(command);
        self.write_sector(COMMAND_SECTOR, &padded)
    }

    /// Read one flash page into `buf`, which must be exactly one page.
    ///
    /// The initiator and terminator commands are best-effort: the device
    /// tolerates redundant framing, so their failures are not surfaced and
    /// only the data transfer decides the outcome.
    pub fn read_page(&mut self, page: u32, buf: &mut [u8]) -> Result<usize, DeviceError> {
        if buf.len() != PAGE_SIZE {
            return Err(DeviceError::Size {
                actual: buf.len(),
                required: PAGE_SIZE,
            });
        }

        let _ = self.send_command(&WriteFilemarksCommand.to_bytes());
        let _ = self.send_command(&ReadCommand::new(page).to_bytes());

        // The device prepends a big-endian length word to the page payload.
        let mut response = vec![0u8; PAGE_LENGTH_PREFIX + PAGE_SIZE];
        let result = self.read_sector(DATA_READ_SECTOR, &mut response);
        if result.is_ok() {
            buf.copy_from_slice(&response[PAGE_LENGTH_PREFIX..]);
        }

        let _ = self.send_command(&ReadReverseCommand.to_bytes());

        result
    }

    /// Write one flash page from `buf`, which must be exactly one page.
    pub fn write_page(&mut self, page: u32, buf: &[u8]) -> Result<usize, DeviceError> {
        if buf.len() != PAGE_SIZE {
            return Err(DeviceError::Size {
                actual: buf.len(),
                required: PAGE_SIZE,
            });
        }

        let _ = self.send_command(&WriteFilemarksCommand.to_bytes());
        let _ = self.send_command(&WriteCommand::new(page, PAGE_SIZE as u32).to_bytes());

        let result = self.write_sector(DATA_WRITE_SECTOR, buf);

        let _ = self.send_command(&ReadReverseCommand.to_bytes());

        result
    }

    /// Probe whether the opened volume is actually a handheld.
    ///
    /// This mirrors the official sync software's check: sector 0 must read
    /// back in full and carry the vendor signature at its fixed offset.
    pub fn is_handheld(&mut self) -> bool {
        let mut sector = [0u8; SECTOR_SIZE];
        match self.read_sector(IDENTITY_SECTOR, &mut sector) {
            Ok(read) if read >= SECTOR_SIZE => {
                &sector[IDENTITY_OFFSET..IDENTITY_OFFSET + IDENTITY_SIGNATURE.len()]
                    == IDENTITY_SIGNATURE
            }
            _ => false,
        }
    }

    /// Read the one-time-programmable memory as a linear image.
    ///
    /// The raw view at sector 0 is rotated by the firmware; the read must
    /// return the full region before the rotation is undone.
    pub fn read_otp(&mut self) -> Result<Vec<u8>, DeviceError> {
        let mut raw = vec![0u8; otp::OTP_SIZE];
        let read = self.read_sector(IDENTITY_SECTOR, &mut raw)?;
        if read < otp::OTP_SIZE {
            return Err(DeviceError::Size {
                actual: read,
                required: otp::OTP_SIZE,
            });
        }
        Ok(otp::rotate(&raw))
    }

    /// Detach the device by reading one page past the end of flash. The
    /// handheld drops off the bus in response, so the result is discarded.
    pub fn eject(&mut self) {
        let mut page = vec![0u8; PAGE_SIZE];
        let _ = self.read_page(PAGE_COUNT, &mut page);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    /// Volume that records call counts and serves a fixed sector 0.
    struct FixedVolume {
        sector_zero: Vec<u8>,
        short_reads: bool,
        reads: usize,
        writes: usize,
    }

    impl FixedVolume {
        fn new(sector_zero: Vec<u8>) -> Self {
            Self {
                sector_zero,
                short_reads: false,
                reads: 0,
                writes: 0,
            }
        }
    }

    impl Volume for FixedVolume {
        fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
            self.reads += 1;
            if self.short_reads {
                return Ok(buf.len() / 2);
            }
            let start = offset as usize;
            for (i, byte) in buf.iter_mut().enumerate() {
                *byte = self.sector_zero.get(start + i).copied().unwrap_or(0);
            }
            Ok(buf.len())
        }

        fn write_at(&mut self, _offset: u64, buf: &[u8]) -> io::Result<usize> {
            self.writes += 1;
            Ok(buf.len())
        }
    }

    fn signed_sector_zero() -> Vec<u8> {
        let mut sector = vec![0u8; SECTOR_SIZE];
        sector[IDENTITY_OFFSET..IDENTITY_OFFSET + 10].copy_from_slice(IDENTITY_SIGNATURE);
        sector
    }

    #[test]
    fn identity_accepts_signature_at_fixed_offset() {
        let mut handheld = Handheld::with_volume("/dev/test", FixedVolume::new(signed_sector_zero()));
        assert!(handheld.is_handheld());
    }

    #[test]
    fn identity_rejects_other_content() {
        let mut sector = signed_sector_zero();
        sector[IDENTITY_OFFSET] = b'X';
        let mut handheld = Handheld::with_volume("/dev/test", FixedVolume::new(sector));
        assert!(!handheld.is_handheld());
    }

    #[test]
    fn identity_rejects_signature_at_wrong_offset() {
        let mut sector = vec![0u8; SECTOR_SIZE];
        sector[0..10].copy_from_slice(IDENTITY_SIGNATURE);
        let mut handheld = Handheld::with_volume("/dev/test", FixedVolume::new(sector));
        assert!(!handheld.is_handheld());
    }

    #[test]
    fn identity_rejects_short_reads() {
        let mut volume = FixedVolume::new(signed_sector_zero());
        volume.short_reads = true;
        let mut handheld = Handheld::with_volume("/dev/test", volume);
        assert!(!handheld.is_handheld());
    }

    #[test]
    fn write_sector_rejects_undersized_data_without_io() {
        let mut handheld = Handheld::with_volume("/dev/test", FixedVolume::new(Vec::new()));
        let err = handheld
            .write_sector(0, &[0u8; SECTOR_SIZE - 1])
            .expect_err("undersized write must fail");
        assert!(matches!(
            err,
            DeviceError::Size {
                actual: 511,
                required: 512
            }
        ));
        let volume = handheld.volume.as_ref().expect("volume");
        assert_eq!(volume.writes, 0);
        assert_eq!(volume.reads, 0);
    }

    #[test]
    fn read_sector_rejects_undersized_buffer_without_io() {
        let mut handheld = Handheld::with_volume("/dev/test", FixedVolume::new(Vec::new()));
        let mut buf = [0u8; 64];
        assert!(matches!(
            handheld.read_sector(0, &mut buf),
            Err(DeviceError::Size { .. })
        ));
        assert_eq!(handheld.volume.as_ref().expect("volume").reads, 0);
    }

    #[test]
    fn page_transfers_reject_wrong_buffer_length_before_any_command() {
        let mut handheld = Handheld::with_volume("/dev/test", FixedVolume::new(Vec::new()));
        let mut short_buf = vec![0u8; PAGE_SIZE - 1];
        assert!(matches!(
            handheld.read_page(0, &mut short_buf),
            Err(DeviceError::Size { .. })
        ));
        let long_buf = vec![0u8; PAGE_SIZE + 1];
        assert!(matches!(
            handheld.write_page(0, &long_buf),
            Err(DeviceError::Size { .. })
        ));
        let volume = handheld.volume.as_ref().expect("volume");
        assert_eq!(volume.writes, 0);
        assert_eq!(volume.reads, 0);
    }

    #[test]
    fn closed_handles_refuse_transfers() {
        let mut handheld = Handheld::with_volume("/dev/test", FixedVolume::new(Vec::new()));
        handheld.close();
        handheld.close(); // idempotent
        assert!(handheld.is_closed());
        let mut buf = [0u8; SECTOR_SIZE];
        assert!(matches!(
            handheld.read_sector(0, &mut buf),
            Err(DeviceError::Io(_))
        ));
    }

    #[test]
    fn settle_policy_scales_with_write_time() {
        let policy = SettlePolicy {
            divisor: 3,
            minimum: Duration::ZERO,
        };
        assert_eq!(
            policy.delay_for(Duration::from_micros(300)),
            Duration::from_micros(100)
        );
        assert_eq!(policy.delay_for(Duration::ZERO), Duration::ZERO);

        let floored = SettlePolicy {
            divisor: 2,
            minimum: Duration::from_millis(1),
        };
        assert_eq!(
            floored.delay_for(Duration::from_micros(10)),
            Duration::from_millis(1)
        );
    }
}
