//! Key material domain: entries, pools, and bit-level helpers.

pub mod entry;
pub mod pool;

use sha2::{Digest, Sha256};

/// Pack a bit vector into bytes, most significant bit first, zero
/// padding the final partial byte.
#[must_use]
pub fn bits_to_bytes(bits: &[bool]) -> Vec<u8> {
    bits.chunks(8)
        .map(|chunk| {
            chunk
                .iter()
                .enumerate()
                .fold(0u8, |byte, (i, bit)| if *bit { byte | (1 << (7 - i)) } else { byte })
        })
        .collect()
}

/// Unpack bytes into a bit vector, most significant bit first.
#[must_use]
pub fn bytes_to_bits(bytes: &[u8]) -> Vec<bool> {
    bytes
        .iter()
        .flat_map(|byte| (0..8).map(move |i| (byte >> (7 - i)) & 1 == 1))
        .collect()
}

/// Hex-encoded SHA-256 over the key rendered as an ASCII bit string.
///
/// Uses the same rendering the protocol engine hashes during privacy
/// amplification, so a digest identifies the same material in both
/// subsystems.
#[must_use]
pub fn digest_hex(bits: &[bool]) -> String {
    let ascii: String = bits.iter().map(|b| if *b { '1' } else { '0' }).collect();
    hex::encode(Sha256::digest(ascii.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bits_pack_msb_first() {
        let bits = [true, false, true, false, false, false, false, true];
        assert_eq!(bits_to_bytes(&bits), vec![0b1010_0001]);
    }

    #[test]
    fn test_partial_byte_zero_padded() {
        let bits = [true, true, true];
        assert_eq!(bits_to_bytes(&bits), vec![0b1110_0000]);
    }

    #[test]
    fn test_bytes_round_trip_whole_bytes() {
        let bytes = vec![0x00, 0xff, 0x5a, 0xc3];
        assert_eq!(bits_to_bytes(&bytes_to_bits(&bytes)), bytes);
    }

    #[test]
    fn test_digest_is_stable_and_distinct() {
        let a = digest_hex(&[true, false, true]);
        let b = digest_hex(&[true, false, true]);
        let c = digest_hex(&[false, false, true]);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }
}
