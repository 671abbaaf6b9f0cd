use std::sync::Arc;

use crate::error::CryptoError;
use crate::view::View;

/// Injected SHA1 binding: the core never links a crypto provider
/// directly, it calls whatever the embedder hands it. The closure
/// receives the message fragments it must hash *in order* (so callers
/// never need to concatenate into one buffer first).
pub type Sha1Func = Arc<dyn for<'a> Fn(&[View<'a>]) -> Result<[u8; 20], CryptoError> + Send + Sync>;

/// Same contract for MD5, used only to derive the long-term-credential
/// key (`MD5(username:realm:password)`, RFC 5389 §15.4).
pub type Md5Func = Arc<dyn for<'a> Fn(&[View<'a>]) -> Result<[u8; 16], CryptoError> + Send + Sync>;

fn concat(parts: &[View<'_>]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(parts.iter().map(|p| p.len()).sum());
    for p in parts {
        buf.extend_from_slice(p.data());
    }
    buf
}

/// Default SHA1 binding backed by the `sha-1` crate. Embedders may
/// supply their own (e.g. an OpenSSL binding) through `Sha1Func`.
pub fn default_sha1() -> Sha1Func {
    Arc::new(|parts: &[View<'_>]| {
        use sha1::{Digest, Sha1};
        let mut hasher = Sha1::new();
        hasher.update(&concat(parts));
        let out = hasher.finalize();
        let mut buf = [0u8; 20];
        buf.copy_from_slice(&out);
        Ok(buf)
    })
}

/// Default MD5 binding backed by the `md-5` crate.
pub fn default_md5() -> Md5Func {
    Arc::new(|parts: &[View<'_>]| {
        use md5::{Digest, Md5};
        let mut hasher = Md5::new();
        hasher.update(&concat(parts));
        let out = hasher.finalize();
        let mut buf = [0u8; 16];
        buf.copy_from_slice(&out);
        Ok(buf)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha1_matches_known_vector() {
        let h = default_sha1();
        let digest = h(&[View::new(b"abc")]).unwrap();
        assert_eq!(
            digest,
            [
                0xa9, 0x99, 0x3e, 0x36, 0x47, 0x06, 0x81, 0x6a, 0xba, 0x3e, 0x25, 0x71, 0x78, 0x50,
                0xc2, 0x6c, 0x9c, 0xd0, 0xd8, 0x9d
            ]
        );
    }

    #[test]
    fn md5_matches_known_vector() {
        let h = default_md5();
        let digest = h(&[View::new(b"abc")]).unwrap();
        assert_eq!(
            digest,
            [
                0x90, 0x01, 0x50, 0x98, 0x3c, 0xd2, 0x4f, 0xb0, 0xd6, 0x96, 0x3f, 0x7d, 0x28, 0xe1,
                0x7f, 0x72
            ]
        );
    }

    #[test]
    fn hashes_multiple_fragments_in_order() {
        let h = default_sha1();
        let whole = h(&[View::new(b"abc")]).unwrap();
        let split = h(&[View::new(b"ab"), View::new(b"c")]).unwrap();
        assert_eq!(whole, split);
    }
}
