use super::hash::Sha1Func;
use crate::error::CryptoError;
use crate::view::View;

const BLOCK_SIZE: usize = 64;

/// A pre-XORed HMAC pad key (RFC 2104). Computing it once per password
/// means every MESSAGE-INTEGRITY computation afterwards is a plain
/// hash-then-hash, never re-deriving the pads from the raw key.
#[derive(Clone, PartialEq, Eq)]
pub struct PadKey<const XOR: u8> {
    data: [u8; BLOCK_SIZE],
}

impl<const XOR: u8> PadKey<XOR> {
    pub fn from_key(key: &[u8], hash: &Sha1Func) -> Result<Self, CryptoError> {
        let mut data = [0u8; BLOCK_SIZE];
        if key.len() > BLOCK_SIZE {
            let digest = hash(&[View::new(key)])?;
            data[..digest.len()].copy_from_slice(&digest);
        } else {
            data[..key.len()].copy_from_slice(key);
        }
        for byte in data.iter_mut() {
            *byte ^= XOR;
        }
        Ok(Self { data })
    }

    pub fn view(&self) -> View<'_> {
        View::new(&self.data)
    }
}

pub type IPadKey = PadKey<0x36>;
pub type OPadKey = PadKey<0x5C>;

/// `HMAC-SHA1(key, data) = H((opad) || H((ipad) || data))`, computed
/// from precomputed pad keys rather than the raw key.
pub fn digest(data: &[View<'_>], opad: &OPadKey, ipad: &IPadKey, hash: &Sha1Func) -> Result<[u8; 20], CryptoError> {
    let mut inner_parts = Vec::with_capacity(data.len() + 1);
    inner_parts.push(ipad.view());
    inner_parts.extend_from_slice(data);
    let inner = hash(&inner_parts)?;

    let outer_parts = [opad.view(), View::new(&inner)];
    hash(&outer_parts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::hash::default_sha1;

    #[test]
    fn matches_rfc2202_test_case_1() {
        let key = [0x0bu8; 20];
        let hash = default_sha1();
        let ipad = IPadKey::from_key(&key, &hash).unwrap();
        let opad = OPadKey::from_key(&key, &hash).unwrap();
        let data = b"Hi There";
        let d = digest(&[View::new(data)], &opad, &ipad, &hash).unwrap();
        assert_eq!(
            d,
            [
                0xb6, 0x17, 0x31, 0x86, 0x55, 0x05, 0x72, 0x64, 0xe2, 0x8b, 0xc0, 0xb6, 0xfb, 0x37,
                0x8c, 0x8e, 0xf1, 0x46, 0xbe, 0x00
            ]
        );
    }

    #[test]
    fn long_key_is_hashed_down_first() {
        let hash = default_sha1();
        let long_key = [0xaau8; 80];
        let ipad = IPadKey::from_key(&long_key, &hash).unwrap();
        let hashed_key = hash(&[View::new(&long_key)]).unwrap();
        let ipad2 = IPadKey::from_key(&hashed_key, &hash).unwrap();
        assert!(ipad.view().data() == ipad2.view().data());
    }
}
