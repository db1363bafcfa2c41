//! The four pseudo-SCSI command frames the device understands.
//!
//! Each command is a fixed byte layout starting with a one-byte opcode;
//! multi-byte fields are big-endian with no padding between fields. The
//! constructors are pure; sending happens through the sector channel, which
//! zero-pads the frame to a full sector.

use crate::codec::be32_write;

pub const OPCODE_READ: u8 = 0x28;
pub const OPCODE_WRITE: u8 = 0x2A;
pub const OPCODE_WRITE_FILEMARKS: u8 = 0x80;
pub const OPCODE_READ_REVERSE: u8 = 0x81;

/// Request a page transfer from flash into the device's response buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadCommand {
    pub source_page: u32,
}

impl ReadCommand {
    pub fn new(source_page: u32) -> Self {
        Self { source_page }
    }

    pub fn to_bytes(self) -> [u8; 5] {
        let mut bytes = [0u8; 5];
        bytes[0] = OPCODE_READ;
        be32_write(&mut bytes[1..5], self.source_page);
        bytes
    }
}

/// Announce a page write of `payload_size` bytes into `destination_page`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteCommand {
    pub destination_page: u32,
    pub payload_size: u32,
}

impl WriteCommand {
    pub fn new(destination_page: u32, payload_size: u32) -> Self {
        Self {
            destination_page,
            payload_size,
        }
    }

    pub fn to_bytes(self) -> [u8; 9] {
        let mut bytes = [0u8; 9];
        bytes[0] = OPCODE_WRITE;
        be32_write(&mut bytes[1..5], self.destination_page);
        be32_write(&mut bytes[5..9], self.payload_size);
        bytes
    }
}

/// Terminator sent after every page transfer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadReverseCommand;

impl ReadReverseCommand {
    pub fn to_bytes(self) -> [u8; 1] {
        [OPCODE_READ_REVERSE]
    }
}

/// Initiator that resets the command interface before a page transfer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteFilemarksCommand;

impl WriteFilemarksCommand {
    pub fn to_bytes(self) -> [u8; 1] {
        [OPCODE_WRITE_FILEMARKS]
    }
}
