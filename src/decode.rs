//! Reassembly of counters transported as raw octet strings.
//!
//! Switches that cannot ship native 64-bit counters expose them as byte
//! strings instead; the last byte is the least significant.

/// Decode an octet-string counter into a native value.
///
/// Walks the bytes from last to first, accumulating with a base-256
/// multiplier. Every input decodes to a defined value: the empty string is 0
/// and anything wider than 64 bit saturates.
pub fn decode_wide_counter(bytes: &[u8]) -> u64 {
    let mut value: u128 = 0;
    let mut multiplier: u128 = 1;

    for byte in bytes.iter().rev() {
        value = value.saturating_add(u128::from(*byte).saturating_mul(multiplier));
        multiplier = multiplier.saturating_mul(256);
    }

    u64::try_from(value).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_decodes_to_zero() {
        assert_eq!(decode_wide_counter(&[]), 0);
    }

    #[test]
    fn test_last_byte_is_least_significant() {
        assert_eq!(decode_wide_counter(&[0x01, 0x00]), 256);
        assert_eq!(decode_wide_counter(&[0x00, 0x01]), 1);
        assert_eq!(decode_wide_counter(&[0x01, 0x02, 0x03]), 0x0001_0203);
    }

    #[test]
    fn test_single_byte() {
        assert_eq!(decode_wide_counter(&[0xff]), 255);
        assert_eq!(decode_wide_counter(&[0x00]), 0);
    }

    #[test]
    fn test_round_trip_u64() {
        for value in [
            0u64,
            1,
            255,
            256,
            0xdead_beef,
            u64::from(u32::MAX) + 1,
            u64::MAX - 1,
            u64::MAX,
        ] {
            let bytes: Vec<u8> = value.to_be_bytes().to_vec();
            assert_eq!(decode_wide_counter(&bytes), value, "value {value}");
        }
    }

    #[test]
    fn test_leading_zero_padding_is_harmless() {
        assert_eq!(decode_wide_counter(&[0x00, 0x00, 0x01, 0x00]), 256);
    }

    #[test]
    fn test_wider_than_u64_saturates() {
        let bytes = vec![0xff; 12];
        assert_eq!(decode_wide_counter(&bytes), u64::MAX);
    }
}
