use crate::crypto::{IPadKey, OPadKey, Sha1Func};
use crate::error::{CryptoError, Error, Result};

/// Wraps precomputed HMAC-SHA1 inner/outer pad keys so that integrity
/// computation against repeated messages never re-derives the pads
/// from the raw password.
///
/// <https://www.rfc-editor.org/rfc/rfc8489.html#section-18.5.1>
#[derive(Clone, PartialEq, Eq)]
pub struct Password {
    ipad: IPadKey,
    opad: OPadKey,
}

impl Password {
    pub fn ipad(&self) -> &IPadKey {
        &self.ipad
    }

    pub fn opad(&self) -> &OPadKey {
        &self.opad
    }

    /// Short-term credential: the key is the SASLprep'd password bytes
    /// directly (RFC 5389 §15.4).
    pub fn short_term(password: &str, hash: &Sha1Func) -> Result<Self> {
        let prepped = saslprep(password)?;
        let key = prepped.as_bytes();
        let ipad = IPadKey::from_key(key, hash)?;
        let opad = OPadKey::from_key(key, hash)?;
        Ok(Self { ipad, opad })
    }

    /// Long-term credential: the key is `MD5(username ":" realm ":"
    /// SASLprep(password))` (RFC 5389 §15.4).
    pub fn long_term(
        username: &str,
        realm: &str,
        password: &str,
        sha1: &Sha1Func,
        md5: &crate::crypto::Md5Func,
    ) -> Result<Self> {
        let prepped = saslprep(password)?;
        let key_str = format!("{}:{}:{}", username, realm, prepped);
        let digest = md5(&[crate::view::View::new(key_str.as_bytes())])?;
        let ipad = IPadKey::from_key(&digest, sha1)?;
        let opad = OPadKey::from_key(&digest, sha1)?;
        Ok(Self { ipad, opad })
    }
}

fn saslprep(s: &str) -> Result<String> {
    stringprep::saslprep(s)
        .map(|cow| cow.into_owned())
        .map_err(|_| Error::new(CryptoError::SaslPrepFailed))
}

/// Everything needed to check or sign MESSAGE-INTEGRITY on a message:
/// the derived password and the hash function it was derived with.
#[derive(Clone)]
pub struct IntegrityData {
    pub password: Password,
    pub hash: Sha1Func,
}

pub type MaybeIntegrity = Option<IntegrityData>;
