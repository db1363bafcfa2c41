//! Persisted fields inside the settings page (`0x1FF`).
//!
//! The page is not mapped as a whole; only three fields at fixed offsets are
//! understood. They are read and written through whole-page transfers, so
//! this module operates on a page-sized byte image.

use crate::codec::{hcd_decode, hcd_encode, le16_read, le32_read, le32_write};
use crate::layout::PAGE_SIZE;

/// Offset of the little-endian version word.
pub const VERSION_OFFSET: usize = 0x9A4;

/// Offset of the unit/character identifier byte.
pub const UNIT_ID_OFFSET: usize = 0x9A8;

/// Offset of the 32-bit credits counter.
pub const CREDITS_OFFSET: usize = 0x9AA;

/// Character names indexed by the unit identifier.
pub const UNIT_NAMES: &[&str] = &[
    "Cloe", "Yasmin", "Spike", "Dash", "Roc", "Creeper", "Inferno",
];

/// How the hex-coded-decimal credits word is laid out in the page.
///
/// Both layouts have shipped in sync tooling at different times and the
/// on-hardware truth has not been verified, so the caller picks. The
/// little-endian wrapping is what the most recent tooling writes and is the
/// default throughout this crate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CreditsEncoding {
    /// HCD word stored little-endian.
    #[default]
    HcdLittleEndian,
    /// HCD word stored big-endian (no endian wrapping of the nibble order).
    HcdBigEndian,
}

/// View over a settings-page image.
pub struct SettingsPage {
    bytes: Vec<u8>,
}

impl SettingsPage {
    /// Wrap a page image. The image must be exactly one page.
    pub fn from_bytes(bytes: Vec<u8>) -> Option<Self> {
        (bytes.len() == PAGE_SIZE).then_some(Self { bytes })
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Firmware version as (major, minor). The high byte of the version
    /// word is the major number, the low byte a two-digit minor.
    pub fn version(&self) -> (u8, u8) {
        let word = le16_read(&self.bytes[VERSION_OFFSET..]);
        ((word >> 8) as u8, (word & 0xFF) as u8)
    }

    pub fn unit_id(&self) -> u8 {
        self.bytes[UNIT_ID_OFFSET]
    }

    /// Character name for the unit identifier; out-of-range ids map to
    /// "Unknown".
    pub fn unit_name(&self) -> &'static str {
        UNIT_NAMES
            .get(self.unit_id() as usize)
            .copied()
            .unwrap_or("Unknown")
    }

    /// Decode the credits counter using the given layout.
    pub fn credits(&self, encoding: CreditsEncoding) -> u32 {
        let field = &self.bytes[CREDITS_OFFSET..CREDITS_OFFSET + 4];
        let word = match encoding {
            CreditsEncoding::HcdLittleEndian => le32_read(field),
            CreditsEncoding::HcdBigEndian => crate::codec::be32_read(field),
        };
        hcd_decode(word)
    }

    /// Encode and store the credits counter. Values of 10^8 or more
    /// truncate to their low eight digits, as the field cannot hold more.
    pub fn set_credits(&mut self, value: u32, encoding: CreditsEncoding) {
        let word = hcd_encode(value);
        let field = &mut self.bytes[CREDITS_OFFSET..CREDITS_OFFSET + 4];
        match encoding {
            CreditsEncoding::HcdLittleEndian => le32_write(field, word),
            CreditsEncoding::HcdBigEndian => crate::codec::be32_write(field, word),
        }
    }
}
