//! Fixed addresses and sizes of the handheld's sector-level interface.
//!
//! These constants are specific to this device family and were established
//! by observing device behaviour; none of them are configurable.

/// Addressable unit of the underlying block device.
pub const SECTOR_SIZE: usize = 512;

/// Logical flash unit reachable through the page protocol.
pub const PAGE_SIZE: usize = 0x1000;

/// Number of flash pages (`0x000..=0x1FF`).
pub const PAGE_COUNT: u32 = 0x200;

/// Size of a full flash image.
pub const FLASH_SIZE: usize = PAGE_SIZE * PAGE_COUNT as usize;

/// Sector that receives framed commands. Write-only.
pub const COMMAND_SECTOR: u32 = 0x31;

/// Sector exposing the device's response buffer. Read-only.
pub const DATA_READ_SECTOR: u32 = 0x58;

/// Sector feeding the device's input buffer. Write-only.
pub const DATA_WRITE_SECTOR: u32 = 0x33;

/// Sector probed for the identity signature and the OTP view.
pub const IDENTITY_SECTOR: u32 = 0;

/// Byte offset of the identity signature inside sector 0.
pub const IDENTITY_OFFSET: usize = 43;

/// Signature the official sync software looks for. Any block device
/// exposing this at [`IDENTITY_OFFSET`] is treated as a handheld.
pub const IDENTITY_SIGNATURE: &[u8; 10] = b"SITRONIXTM";

/// Big-endian length field the device prepends to page-read responses.
pub const PAGE_LENGTH_PREFIX: usize = 4;

/// Page holding the persisted settings fields (version, character, credits).
pub const SETTINGS_PAGE: u32 = 0x1FF;
