use crate::header::StunHeader;
use crate::view::View;

/// Checks for a STUN message header
///
/// This function is intended to be used with multiplexed streams in order to separate STUN packets from other protocols
///
/// Arguments:
/// * `data_bytes`: Streaming data bytes that need to be checked. Note that only the first 20 bytes are processed.
pub fn check_for_stun_message_header(data_bytes: &[u8]) -> Option<StunHeader> {
    StunHeader::decode(View::new(data_bytes)).ok()
}
