//! In-memory device simulation.
//!
//! [`LoopbackVolume`] implements [`Volume`] over a flash image held in
//! memory and speaks just enough of the device's sector conversation to
//! exercise the full page protocol: commands written to the command sector
//! are parsed, page writes land in the flash image, and page reads serve
//! the image back with the device's length prefix. Tests in this crate and
//! in the CLI drive the real protocol code against it.

use std::io;

use crate::codec::be32_read;
use crate::commands::{OPCODE_READ, OPCODE_WRITE};
use crate::layout::{
    COMMAND_SECTOR, DATA_READ_SECTOR, DATA_WRITE_SECTOR, FLASH_SIZE, IDENTITY_OFFSET,
    IDENTITY_SIGNATURE, PAGE_COUNT, PAGE_SIZE, SECTOR_SIZE,
};
use crate::otp::OTP_SIZE;
use crate::volume::Volume;

/// Simulated handheld backed by an in-memory flash image.
pub struct LoopbackVolume {
    /// Full flash image, one page per [`PAGE_SIZE`] slice.
    pub flash: Vec<u8>,
    /// Bytes served at the start of the disk: identity signature plus the
    /// raw (rotated) OTP view.
    pub boot: Vec<u8>,
    /// Every raw frame written to the command sector, leading 16 bytes.
    pub commands: Vec<Vec<u8>>,
    /// Number of data-sector reads to fail before succeeding again.
    pub failing_data_reads: usize,
    /// Raw read syscall count.
    pub reads: usize,
    /// Raw write syscall count.
    pub writes: usize,
    pending_read_page: Option<u32>,
    pending_write_page: Option<u32>,
}

impl LoopbackVolume {
    /// A device with a zeroed flash image and a valid identity signature.
    pub fn new() -> Self {
        let mut boot = vec![0u8; OTP_SIZE];
        boot[IDENTITY_OFFSET..IDENTITY_OFFSET + IDENTITY_SIGNATURE.len()]
            .copy_from_slice(IDENTITY_SIGNATURE);
        Self {
            flash: vec![0u8; FLASH_SIZE],
            boot,
            commands: Vec::new(),
            failing_data_reads: 0,
            reads: 0,
            writes: 0,
            pending_read_page: None,
            pending_write_page: None,
        }
    }

    /// Opcodes of the commands received so far, in order.
    pub fn opcodes(&self) -> Vec<u8> {
        self.commands.iter().map(|frame| frame[0]).collect()
    }

    fn page_slice(&self, page: u32) -> &[u8] {
        let start = page as usize * PAGE_SIZE;
        &self.flash[start..start + PAGE_SIZE]
    }
}

impl Default for LoopbackVolume {
    fn default() -> Self {
        Self::new()
    }
}

impl Volume for LoopbackVolume {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        self.reads += 1;
        let sector = offset / SECTOR_SIZE as u64;

        if sector == DATA_READ_SECTOR as u64 {
            if self.failing_data_reads > 0 {
                self.failing_data_reads -= 1;
                return Err(io::Error::new(io::ErrorKind::Other, "injected read fault"));
            }

            let page = self
                .pending_read_page
                .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "no read command pending"))?;
            if page >= PAGE_COUNT {
                // Reading past the end of flash is how eject works; the
                // real device detaches instead of answering.
                return Err(io::Error::new(io::ErrorKind::NotConnected, "device detached"));
            }

            buf.fill(0);
            buf[..4].copy_from_slice(&(PAGE_SIZE as u32).to_be_bytes());
            let payload = self.page_slice(page);
            let end = buf.len().min(4 + PAGE_SIZE);
            buf[4..end].copy_from_slice(&payload[..end - 4]);
            return Ok(buf.len());
        }

        // Everything below the command window reads from the boot region.
        let start = offset as usize;
        for (i, byte) in buf.iter_mut().enumerate() {
            *byte = self.boot.get(start + i).copied().unwrap_or(0);
        }
        Ok(buf.len())
    }

    fn write_at(&mut self, offset: u64, buf: &[u8]) -> io::Result<usize> {
        self.writes += 1;
        let sector = offset / SECTOR_SIZE as u64;

        if sector == COMMAND_SECTOR as u64 {
            let frame = buf[..buf.len().min(16)].to_vec();
            match frame[0] {
                OPCODE_READ => self.pending_read_page = Some(be32_read(&frame[1..5])),
                OPCODE_WRITE => self.pending_write_page = Some(be32_read(&frame[1..5])),
                _ => {}
            }
            self.commands.push(frame);
            return Ok(buf.len());
        }

        if sector == DATA_WRITE_SECTOR as u64 {
            let page = self
                .pending_write_page
                .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "no write command pending"))?;
            if page >= PAGE_COUNT {
                return Err(io::Error::new(io::ErrorKind::Other, "page out of range"));
            }
            if buf.len() < PAGE_SIZE {
                return Err(io::Error::new(io::ErrorKind::Other, "short page payload"));
            }
            let start = page as usize * PAGE_SIZE;
            self.flash[start..start + PAGE_SIZE].copy_from_slice(&buf[..PAGE_SIZE]);
            return Ok(buf.len());
        }

        Ok(buf.len())
    }
}
