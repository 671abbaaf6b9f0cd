mod decode;
mod encode;
mod errors;
mod message;
mod private_utils;
mod utils;

pub use decode::ParseStat;
pub use errors::{MessageDecodeError, MessageEncodeError};
pub use message::Message;
