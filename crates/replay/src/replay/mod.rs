mod recording;
mod scheduler;
mod timeline;

pub use recording::{LogError, LogLine, ReplayLog, parse_timestamp};
pub use scheduler::{ReplayError, Replayer, SessionStats};
pub use timeline::Timeline;
