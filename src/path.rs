use std::net::{IpAddr, SocketAddr};

/// A network path, source and target IP addresses, that keys RTO
/// history and retransmission scheduling. Ports are not part of the
/// key: NAT behavior and round-trip time are dominated by the IP hop,
/// not the port pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Path {
    pub source: IpAddr,
    pub target: IpAddr,
}

impl Path {
    pub fn new(source: IpAddr, target: IpAddr) -> Self {
        Self { source, target }
    }

    pub fn to_target(source: IpAddr, target: SocketAddr) -> Self {
        Self::new(source, target.ip())
    }
}
