use std::rc::Rc;

use crate::clock::Timepoint;
use crate::path::Path;
use crate::retransmit::RetransmitAlgo;
use crate::transaction_id::TransactionId;

use super::handle::Handle;
use super::settings::Auth;

/// Live state for one outstanding client transaction. Born in
/// `ClientUdp::create`, removed the moment the first terminal effect
/// (`TransactionOk`/`TransactionFailed`) for its handle is dequeued by
/// `next`.
pub(crate) struct Transaction {
    pub tid: TransactionId,
    pub handle: Handle,
    pub msg_bytes: Rc<Vec<u8>>,
    pub rtx_algo: RetransmitAlgo,
    pub path: Path,
    pub create_time: Timepoint,
    pub maybe_auth: Option<Auth>,
    pub rtx_count: u32,
}
