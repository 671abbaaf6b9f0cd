use crc::{crc32, Hasher32};

/// Plain (un-XORed) CRC-32/IEEE 802.3 of `data`, the same polynomial
/// FINGERPRINT uses (RFC 5389 §15.5). The 0x5354554E XOR is applied by
/// the caller, separately, so decode can compare the de-XORed wire
/// value against this directly.
pub(super) fn crc32_of(data: &[u8]) -> u32 {
    let mut crc = crc32::Digest::new(crc32::IEEE);
    crc.write(data);
    crc.sum32()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_known_crc32_vector() {
        assert_eq!(crc32_of(b"123456789"), 0xCBF4_3926);
    }
}
