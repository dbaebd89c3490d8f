//! Interfaces of the stimulus drivers the experiment controller calls into.
//!
//! Drivers own whatever they render with. They receive trial parameters by
//! reference at reset and never see the controller's stage state.

use crate::trial::{AdjustParams, TrialSpec};

pub trait Visibility {
    fn show(&mut self);
    fn hide(&mut self);
}

pub trait StimulusDriver: Visibility {
    /// Reconfigures the driver for a trial and returns it to its initial pose.
    fn reset_to(&mut self, spec: &TrialSpec);
}

/// Dashed curve with independently controlled dash motion.
pub trait DashedDriver: StimulusDriver {
    fn start_motion(&mut self);
    fn stop_motion(&mut self);
}

/// Curve the participant deforms during solid trials.
pub trait AdjustableDriver: StimulusDriver {
    fn current_params(&self) -> AdjustParams;
}

/// Instruction text shown to the participant.
pub trait TextPanel {
    fn display(&mut self, text: &str);
    fn clear(&mut self);
}
