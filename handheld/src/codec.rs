//! Byte-level codecs used across the protocol.
//!
//! The device mixes three encodings: command fields are big-endian, stored
//! settings values are little-endian, and the credits counter is hex-coded
//! decimal (one decimal digit per 4-bit nibble, least significant nibble
//! first). Callers guarantee buffer lengths; these functions do not fail.

/// Read a little-endian u16 from the first two bytes of `bytes`.
pub fn le16_read(bytes: &[u8]) -> u16 {
    u16::from_le_bytes([bytes[0], bytes[1]])
}

/// Write `value` as little-endian into the first two bytes of `bytes`.
pub fn le16_write(bytes: &mut [u8], value: u16) {
    bytes[..2].copy_from_slice(&value.to_le_bytes());
}

/// Read a little-endian u32 from the first four bytes of `bytes`.
pub fn le32_read(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// Write `value` as little-endian into the first four bytes of `bytes`.
pub fn le32_write(bytes: &mut [u8], value: u32) {
    bytes[..4].copy_from_slice(&value.to_le_bytes());
}

/// Read a big-endian u32 from the first four bytes of `bytes`.
pub fn be32_read(bytes: &[u8]) -> u32 {
    u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// Write `value` as big-endian into the first four bytes of `bytes`.
pub fn be32_write(bytes: &mut [u8], value: u32) {
    bytes[..4].copy_from_slice(&value.to_be_bytes());
}

/// Encode `value` as hex-coded decimal: nibble `i` of the result holds the
/// `i`-th decimal digit, least significant first. Values of 10^8 or more
/// lose their upper digits; the device field holds eight digits at most.
pub fn hcd_encode(mut value: u32) -> u32 {
    let mut result = 0u32;
    for place in 0..8 {
        let digit = value % 10;
        result |= digit << (place * 4);
        value /= 10;
    }
    result
}

/// Decode a hex-coded decimal word. Nibbles above 9 are not rejected; a
/// malformed word decodes to a numerically meaningless value.
pub fn hcd_decode(word: u32) -> u32 {
    let mut result = 0u32;
    let mut place = 1u32;
    for i in 0..8 {
        let digit = (word >> (i * 4)) & 0xF;
        result = result.wrapping_add(digit.wrapping_mul(place));
        place = place.wrapping_mul(10);
    }
    result
}

/// Smallest multiple of `alignment` that is at least `n`.
pub fn round_up(n: usize, alignment: usize) -> usize {
    if n % alignment == 0 {
        n
    } else {
        (n / alignment + 1) * alignment
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn le16_round_trips() {
        for value in [0u16, 1, 0x00FF, 0xFF00, 0xABCD, u16::MAX] {
            let mut bytes = [0u8; 2];
            le16_write(&mut bytes, value);
            assert_eq!(le16_read(&bytes), value);
        }
    }

    #[test]
    fn le32_round_trips() {
        for value in [0u32, 1, 0xDEADBEEF, 0x00FF00FF, u32::MAX] {
            let mut bytes = [0u8; 4];
            le32_write(&mut bytes, value);
            assert_eq!(le32_read(&bytes), value);
        }
    }

    #[test]
    fn le32_byte_order() {
        let mut bytes = [0u8; 4];
        le32_write(&mut bytes, 0x11223344);
        assert_eq!(bytes, [0x44, 0x33, 0x22, 0x11]);
    }

    #[test]
    fn be32_round_trips() {
        for value in [0u32, 1, 0x01FF, 0xCAFEBABE, u32::MAX] {
            let mut bytes = [0u8; 4];
            be32_write(&mut bytes, value);
            assert_eq!(be32_read(&bytes), value);
        }
    }

    #[test]
    fn be32_byte_order() {
        let mut bytes = [0u8; 4];
        be32_write(&mut bytes, 0x11223344);
        assert_eq!(bytes, [0x11, 0x22, 0x33, 0x44]);
    }

    #[test]
    fn hcd_encodes_digits_into_nibbles() {
        assert_eq!(hcd_encode(0), 0x0000_0000);
        assert_eq!(hcd_encode(7), 0x0000_0007);
        assert_eq!(hcd_encode(42), 0x0000_0042);
        assert_eq!(hcd_encode(12_345_678), 0x1234_5678);
        assert_eq!(hcd_encode(99_999_999), 0x9999_9999);
    }

    #[test]
    fn hcd_round_trips_representable_values() {
        for value in [0u32, 1, 9, 10, 99, 1000, 987_654, 12_345_678, 99_999_999] {
            assert_eq!(hcd_decode(hcd_encode(value)), value);
        }
    }

    #[test]
    fn hcd_truncates_to_eight_digits() {
        assert_eq!(
            hcd_decode(hcd_encode(123_456_789)),
            hcd_decode(hcd_encode(123_456_789 % 100_000_000))
        );
        assert_eq!(hcd_encode(100_000_000), hcd_encode(0));
    }

    #[test]
    fn round_up_properties() {
        for n in [0usize, 1, 511, 512, 513, 4095, 4096, 4100, 12345] {
            for alignment in [1usize, 512, 4096] {
                let rounded = round_up(n, alignment);
                assert!(rounded >= n);
                assert_eq!(rounded % alignment, 0);
                assert_eq!(round_up(rounded, alignment), rounded);
            }
        }
    }

    #[test]
    fn round_up_exact_multiples_are_unchanged() {
        assert_eq!(round_up(1024, 512), 1024);
        assert_eq!(round_up(0, 512), 0);
        assert_eq!(round_up(16, 512), 512);
        assert_eq!(round_up(4100, 512), 4608);
    }
}
