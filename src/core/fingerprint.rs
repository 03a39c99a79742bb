//! # Fingerprint
//!
//! 64-bit FNV-1a over wire bytes. Used as an identity for deduplicating
//! encoded records; it is not collision resistant and not a long-term content
//! address, since the same record encodes differently on platforms with a
//! different `usize` width.

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Hash an encoded buffer.
#[inline]
pub fn hash(data: &[u8]) -> u64 {
    data.iter().fold(FNV_OFFSET_BASIS, |acc, &byte| {
        (acc ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_vectors() {
        assert_eq!(hash(b""), 0xcbf2_9ce4_8422_2325);
        assert_eq!(hash(b"a"), 0xaf63_dc4c_8601_ec8c);
        assert_eq!(hash(b"foobar"), 0x8594_4171_f739_67e8);
    }

    #[test]
    fn test_order_sensitive() {
        assert_ne!(hash(b"ab"), hash(b"ba"));
        assert_eq!(hash(b"ab"), hash(b"ab"));
    }
}
