pub mod geometry;
pub mod input;
pub mod phase;
pub mod stimulus;
pub mod trial;

pub use input::{Button, ButtonSet, EdgeDetector};
pub use phase::Stage;
pub use stimulus::{AdjustableDriver, DashedDriver, StimulusDriver, TextPanel, Visibility};
pub use trial::{AdjustParams, Response, RotationDirection, TrialKind, TrialOutcome, TrialSpec};
