//! One-time-programmable memory access.
//!
//! Reading 16 KiB starting at sector 0 exposes the OTP region, but rotated:
//! the firmware serves the image beginning at offset 0xBDC. The rotation is
//! fixed in the firmware and not configurable.

/// Size of the OTP region.
pub const OTP_SIZE: usize = 0x4000;

/// Offset inside the OTP at which the raw sector-0 view begins.
pub const ROTATION_OFFSET: usize = 0xBDC;

/// Undo the firmware's rotation: the last `ROTATION_OFFSET` bytes of the raw
/// view are the start of the linear image.
///
/// # Panics
///
/// Panics if `raw` is shorter than `ROTATION_OFFSET`. Callers pass the full
/// [`OTP_SIZE`] raw view.
pub fn rotate(raw: &[u8]) -> Vec<u8> {
    assert!(
        raw.len() >= ROTATION_OFFSET,
        "raw OTP view of {} bytes is shorter than the {ROTATION_OFFSET}-byte rotation",
        raw.len()
    );
    let pivot = raw.len() - ROTATION_OFFSET;
    let mut linear = Vec::with_capacity(raw.len());
    linear.extend_from_slice(&raw[pivot..]);
    linear.extend_from_slice(&raw[..pivot]);
    linear
}

/// Plain byte sum, printed by `dump-otp --checksum` for quick comparison of
/// dumps between devices.
pub fn byte_checksum(buf: &[u8]) -> u64 {
    buf.iter().map(|&byte| u64::from(byte)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_moves_the_tail_to_the_front() {
        let mut raw = vec![0u8; OTP_SIZE];
        // Head bytes 0xAA, tail bytes 0xBB in the raw view.
        for byte in raw[..OTP_SIZE - ROTATION_OFFSET].iter_mut() {
            *byte = 0xAA;
        }
        for byte in raw[OTP_SIZE - ROTATION_OFFSET..].iter_mut() {
            *byte = 0xBB;
        }

        let linear = rotate(&raw);
        assert_eq!(linear.len(), OTP_SIZE);
        assert!(linear[..ROTATION_OFFSET].iter().all(|&b| b == 0xBB));
        assert!(linear[ROTATION_OFFSET..].iter().all(|&b| b == 0xAA));
    }

    #[test]
    fn rotation_preserves_byte_order_within_parts() {
        let raw: Vec<u8> = (0..OTP_SIZE).map(|i| (i % 251) as u8).collect();
        let linear = rotate(&raw);
        let pivot = OTP_SIZE - ROTATION_OFFSET;
        assert_eq!(&linear[..ROTATION_OFFSET], &raw[pivot..]);
        assert_eq!(&linear[ROTATION_OFFSET..], &raw[..pivot]);
    }

    #[test]
    #[should_panic(expected = "shorter than the")]
    fn rotation_rejects_views_shorter_than_the_offset() {
        rotate(&[0u8; ROTATION_OFFSET - 1]);
    }

    #[test]
    fn checksum_sums_bytes() {
        assert_eq!(byte_checksum(&[]), 0);
        assert_eq!(byte_checksum(&[1, 2, 3]), 6);
        assert_eq!(byte_checksum(&[0xFF; 0x4000]), 0xFF * 0x4000);
    }
}
