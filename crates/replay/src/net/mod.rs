mod interfaces;
mod monitor;
mod sink;
mod transport;

pub use interfaces::{broadcast_sources, default_route_ipv4};
pub use monitor::{TcpMonitor, UdpMonitor, forward};
pub use sink::{BroadcastSink, Sink, SinkError, StreamSink, is_disconnect};
pub use transport::{ReplayListener, connect};
