pub mod hash;
pub mod hmac;

pub use hash::{default_md5, default_sha1, Md5Func, Sha1Func};
pub use hmac::{digest, IPadKey, OPadKey, PadKey};
