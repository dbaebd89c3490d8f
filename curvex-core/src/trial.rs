use serde::{Deserialize, Serialize};

/// Rotation sense of a presented curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RotationDirection {
    CW,
    CCW,
}

impl RotationDirection {
    /// Parses the trial-file token. Surrounding whitespace is ignored.
    pub fn parse(token: &str) -> Option<Self> {
        match token.trim() {
            "CW" => Some(Self::CW),
            "CCW" => Some(Self::CCW),
            _ => None,
        }
    }

    /// Sign applied to angle increments: clockwise runs negative.
    pub fn sign(&self) -> f32 {
        match self {
            Self::CW => -1.0,
            Self::CCW => 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrialKind {
    Dashed,
    Solid,
}

/// Participant's binary judgement on a dashed trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Response {
    X,
    Y,
}

impl Response {
    pub fn as_str(&self) -> &'static str {
        match self {
            Response::X => "X",
            Response::Y => "Y",
        }
    }

    pub fn parse(token: &str) -> Option<Self> {
        match token.trim() {
            "X" => Some(Response::X),
            "Y" => Some(Response::Y),
            _ => None,
        }
    }
}

/// One row of the trial-definition file. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialSpec {
    /// Lobe count of the curve.
    pub n: u32,
    pub r1: f32,
    pub r2: f32,
    pub width: f32,
    /// Tessellation density; curves are sampled at `segments + 1` points.
    pub segments: u32,
    /// Degrees per second, unsigned. Direction lives in `rotation_direction`.
    pub rotation_speed: f32,
    pub rotation_direction: RotationDirection,
    /// Raw index as written in the file; use [`TrialSpec::arrow_anchor`].
    pub arrow_point_index: i32,
    pub is_dashed: bool,
    /// Signed; the sign encodes the dash-motion direction.
    pub dash_speed: f32,
    pub is_self_rotating: bool,
    pub arrow_direction: bool,
}

impl TrialSpec {
    pub fn kind(&self) -> TrialKind {
        if self.is_dashed {
            TrialKind::Dashed
        } else {
            TrialKind::Solid
        }
    }

    /// Arrow sample index clamped into `[0, segments]`.
    pub fn arrow_anchor(&self) -> usize {
        (self.arrow_point_index.max(0) as u32).min(self.segments) as usize
    }

    /// The response that counts as correct on a dashed trial.
    ///
    /// `X` when exactly one of "dashes run forward" and "arrow drawn forward"
    /// holds, `Y` otherwise. Solid trials have no correct response.
    pub fn expected_response(&self) -> Option<Response> {
        if !self.is_dashed {
            return None;
        }
        let condition = (self.dash_speed > 0.0) ^ self.arrow_direction;
        Some(if condition { Response::X } else { Response::Y })
    }
}

impl Default for TrialSpec {
    fn default() -> Self {
        Self {
            n: 3,
            r1: 1.0,
            r2: 1.5,
            width: 0.02,
            segments: 1000,
            rotation_speed: 60.0,
            rotation_direction: RotationDirection::CW,
            arrow_point_index: 0,
            is_dashed: false,
            dash_speed: 1.0,
            is_self_rotating: true,
            arrow_direction: true,
        }
    }
}

/// The adjustable preview curve's free parameters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AdjustParams {
    pub a: f32,
    pub b: f32,
    pub multiplier: f32,
}

impl AdjustParams {
    /// Values the preview returns to at the start of every solid trial.
    pub const RESET: AdjustParams = AdjustParams {
        a: 0.0,
        b: 1.0,
        multiplier: 0.0,
    };
}

/// Recorded result of one completed trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialOutcome {
    pub trial_number: usize,
    /// Zeroed on dashed trials.
    pub params: AdjustParams,
    /// Empty on solid trials.
    pub response: Option<Response>,
    /// Seconds from stimulus-ready to response.
    pub reaction_time: f32,
    #[serde(skip)]
    pub practice: bool,
    #[serde(skip)]
    pub correct: Option<bool>,
}

impl TrialOutcome {
    pub fn solid(trial_number: usize, params: AdjustParams, reaction_time: f32) -> Self {
        Self {
            trial_number,
            params,
            response: None,
            reaction_time,
            practice: false,
            correct: None,
        }
    }

    pub fn dashed(trial_number: usize, response: Response, reaction_time: f32) -> Self {
        Self {
            trial_number,
            params: AdjustParams::default(),
            response: Some(response),
            reaction_time,
            practice: false,
            correct: None,
        }
    }

    pub fn kind(&self) -> TrialKind {
        if self.response.is_some() {
            TrialKind::Dashed
        } else {
            TrialKind::Solid
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dashed(dash_speed: f32, arrow_direction: bool) -> TrialSpec {
        TrialSpec {
            is_dashed: true,
            dash_speed,
            arrow_direction,
            ..TrialSpec::default()
        }
    }

    #[test]
    fn forward_dashes_with_forward_arrow_expect_y() {
        assert_eq!(dashed(2.0, true).expected_response(), Some(Response::Y));
    }

    #[test]
    fn expected_response_follows_xor() {
        assert_eq!(dashed(2.0, false).expected_response(), Some(Response::X));
        assert_eq!(dashed(-2.0, true).expected_response(), Some(Response::X));
        assert_eq!(dashed(-2.0, false).expected_response(), Some(Response::Y));
        // zero speed is not "positive"
        assert_eq!(dashed(0.0, true).expected_response(), Some(Response::X));
    }

    #[test]
    fn solid_trials_have_no_expected_response() {
        assert_eq!(TrialSpec::default().expected_response(), None);
    }

    #[test]
    fn arrow_anchor_is_clamped_to_segments() {
        let mut spec = TrialSpec {
            segments: 100,
            arrow_point_index: 250,
            ..TrialSpec::default()
        };
        assert_eq!(spec.arrow_anchor(), 100);
        spec.arrow_point_index = -4;
        assert_eq!(spec.arrow_anchor(), 0);
        spec.arrow_point_index = 42;
        assert_eq!(spec.arrow_anchor(), 42);
    }

    #[test]
    fn arrow_anchor_handles_segment_counts_past_i32() {
        let mut spec = TrialSpec {
            segments: 3_000_000_000,
            arrow_point_index: 5,
            ..TrialSpec::default()
        };
        assert_eq!(spec.arrow_anchor(), 5);
        spec.arrow_point_index = i32::MAX;
        assert_eq!(spec.arrow_anchor(), i32::MAX as usize);
        spec.arrow_point_index = i32::MIN;
        assert_eq!(spec.arrow_anchor(), 0);
    }

    #[test]
    fn rotation_direction_tokens() {
        assert_eq!(RotationDirection::parse(" CW "), Some(RotationDirection::CW));
        assert_eq!(RotationDirection::parse("CCW"), Some(RotationDirection::CCW));
        assert_eq!(RotationDirection::parse("cw"), None);
        assert_eq!(RotationDirection::CW.sign(), -1.0);
    }

    #[test]
    fn outcome_kind_follows_response() {
        let solid = TrialOutcome::solid(0, AdjustParams::RESET, 1.0);
        let dashed = TrialOutcome::dashed(1, Response::X, 0.4);
        assert_eq!(solid.kind(), TrialKind::Solid);
        assert_eq!(dashed.kind(), TrialKind::Dashed);
        assert_eq!(dashed.params, AdjustParams::default());
    }
}
