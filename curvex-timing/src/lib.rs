pub mod pacer;
pub mod timer;

pub use pacer::FramePacer;
pub use timer::{FrameLog, HighPrecisionTimer, ManualTimer, PacingStats, Timer};
