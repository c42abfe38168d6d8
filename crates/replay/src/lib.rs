//! Replays timestamped NMEA 0183 / YDWG raw logs over the network at their
//! recorded pace, plus the receive-only monitors used to watch a replay.

pub mod config;
pub mod net;
pub mod replay;
pub mod version;

pub use config::{BroadcastConfig, MAX_DATAGRAM_SIZE, ReplayConfig, any_addr};
pub use net::{
    BroadcastSink, ReplayListener, Sink, SinkError, StreamSink, TcpMonitor, UdpMonitor,
    broadcast_sources, connect, default_route_ipv4, forward, is_disconnect,
};
pub use replay::{
    LogError, LogLine, ReplayError, ReplayLog, Replayer, SessionStats, Timeline, parse_timestamp,
};
pub use version::{VersionError, encode_hex};
