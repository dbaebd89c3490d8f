//! Scene state shared between the renderer and the stimulus drivers.
//!
//! The controller only ever sees the driver handles; the renderer reads the
//! same state once per frame.

use curvex_core::geometry::{Point3, preview_points, rotate_z, trefoil_points};
use curvex_core::{
    AdjustParams, AdjustableDriver, DashedDriver, StimulusDriver, TextPanel, TrialSpec, Visibility,
};
use log::debug;
use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

pub const PREVIEW_RESOLUTION: usize = 240;
/// Radius of the path followed by curves that orbit instead of spinning.
pub const ORBIT_RADIUS: f32 = 0.5;
/// Dash travel in pixels per second for a dash speed of 1.
pub const DASH_PX_PER_UNIT: f32 = 40.0;
/// Preview parameter change per second at full axis deflection.
pub const ADJUST_RATE: f32 = 0.5;
pub const A_RANGE: (f32, f32) = (-1.0, 1.0);
pub const MULTIPLIER_RANGE: (f32, f32) = (-2.0, 2.0);

#[derive(Debug, Clone, Default)]
pub struct RotatingCurve {
    pub visible: bool,
    pub spec: TrialSpec,
    pub points: Vec<Point3>,
    pub angle_deg: f32,
}

impl RotatingCurve {
    pub fn reset(&mut self, spec: &TrialSpec) {
        self.spec = spec.clone();
        self.points = trefoil_points(spec);
        self.angle_deg = 0.0;
    }

    pub fn advance(&mut self, dt: f32) {
        let delta = self.spec.rotation_direction.sign() * self.spec.rotation_speed * dt;
        self.angle_deg = (self.angle_deg + delta).rem_euclid(360.0);
    }

    /// Sample `i` after self-rotation, or after moving along the orbit.
    pub fn placed(&self, i: usize) -> Option<Point3> {
        let p = *self.points.get(i)?;
        if self.spec.is_self_rotating {
            Some(rotate_z(p, self.angle_deg))
        } else {
            let c = rotate_z([ORBIT_RADIUS, 0.0, 0.0], self.angle_deg);
            Some([p[0] + c[0], p[1] + c[1], p[2]])
        }
    }

    pub fn placed_points(&self) -> Vec<Point3> {
        (0..self.points.len()).filter_map(|i| self.placed(i)).collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct DashedCurve {
    pub curve: RotatingCurve,
    pub moving: bool,
    /// Signed; follows the sign of the trial's dash speed.
    pub dash_offset: f32,
}

impl DashedCurve {
    pub fn advance(&mut self, dt: f32) {
        self.curve.advance(dt);
        if self.moving {
            self.dash_offset += self.curve.spec.dash_speed * DASH_PX_PER_UNIT * dt;
        }
    }
}

/// Arrow cue placed on a sample of the dashed curve.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ArrowCue {
    pub visible: bool,
    pub anchor: usize,
    /// Points along increasing sample index when set.
    pub forward: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PreviewCurve {
    pub visible: bool,
    pub r1: f32,
    pub r2: f32,
    pub params: AdjustParams,
}

impl Default for PreviewCurve {
    fn default() -> Self {
        Self {
            visible: false,
            r1: 1.0,
            r2: 1.5,
            params: AdjustParams::RESET,
        }
    }
}

impl PreviewCurve {
    pub fn points(&self) -> Vec<Point3> {
        preview_points(self.r1, self.r2, self.params, PREVIEW_RESOLUTION)
    }

    /// Applies the two analog axes, each in `[-1, 1]`.
    pub fn adjust(&mut self, a_axis: f32, multiplier_axis: f32, dt: f32) {
        let step = ADJUST_RATE * dt;
        self.params.a =
            (self.params.a + a_axis.clamp(-1.0, 1.0) * step).clamp(A_RANGE.0, A_RANGE.1);
        self.params.multiplier = (self.params.multiplier
            + multiplier_axis.clamp(-1.0, 1.0) * step)
            .clamp(MULTIPLIER_RANGE.0, MULTIPLIER_RANGE.1);
    }
}

#[derive(Debug, Clone, Default)]
pub struct SceneState {
    pub reference: RotatingCurve,
    pub dashed: DashedCurve,
    pub arrow: ArrowCue,
    pub preview: PreviewCurve,
    pub demo_visible: bool,
    pub text: Option<String>,
}

impl SceneState {
    pub fn advance(&mut self, dt: f32) {
        self.reference.advance(dt);
        self.dashed.advance(dt);
    }

    pub fn adjust_preview(&mut self, a_axis: f32, multiplier_axis: f32, dt: f32) {
        if self.preview.visible {
            self.preview.adjust(a_axis, multiplier_axis, dt);
        }
    }
}

/// Cheaply clonable handle to the shared scene.
#[derive(Debug, Clone, Default)]
pub struct Scene(Rc<RefCell<SceneState>>);

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> Ref<'_, SceneState> {
        self.0.borrow()
    }

    pub fn state_mut(&self) -> RefMut<'_, SceneState> {
        self.0.borrow_mut()
    }

    pub fn reference(&self) -> ReferenceHandle {
        ReferenceHandle(self.clone())
    }

    pub fn dashed(&self) -> DashedHandle {
        DashedHandle(self.clone())
    }

    pub fn arrow(&self) -> ArrowHandle {
        ArrowHandle(self.clone())
    }

    pub fn preview(&self) -> PreviewHandle {
        PreviewHandle(self.clone())
    }

    pub fn demo(&self) -> DemoHandle {
        DemoHandle(self.clone())
    }

    pub fn text(&self) -> TextHandle {
        TextHandle(self.clone())
    }
}

pub struct ReferenceHandle(Scene);
pub struct DashedHandle(Scene);
pub struct ArrowHandle(Scene);
pub struct PreviewHandle(Scene);
pub struct DemoHandle(Scene);
pub struct TextHandle(Scene);

impl Visibility for ReferenceHandle {
    fn show(&mut self) {
        self.0.state_mut().reference.visible = true;
    }
    fn hide(&mut self) {
        self.0.state_mut().reference.visible = false;
    }
}

impl StimulusDriver for ReferenceHandle {
    fn reset_to(&mut self, spec: &TrialSpec) {
        self.0.state_mut().reference.reset(spec);
    }
}

impl Visibility for DashedHandle {
    fn show(&mut self) {
        self.0.state_mut().dashed.curve.visible = true;
    }
    fn hide(&mut self) {
        self.0.state_mut().dashed.curve.visible = false;
    }
}

impl StimulusDriver for DashedHandle {
    fn reset_to(&mut self, spec: &TrialSpec) {
        let mut state = self.0.state_mut();
        state.dashed.curve.reset(spec);
        state.dashed.dash_offset = 0.0;
        state.dashed.moving = false;
    }
}

impl DashedDriver for DashedHandle {
    fn start_motion(&mut self) {
        self.0.state_mut().dashed.moving = true;
    }
    fn stop_motion(&mut self) {
        self.0.state_mut().dashed.moving = false;
    }
}

impl Visibility for ArrowHandle {
    fn show(&mut self) {
        self.0.state_mut().arrow.visible = true;
    }
    fn hide(&mut self) {
        self.0.state_mut().arrow.visible = false;
    }
}

impl StimulusDriver for ArrowHandle {
    fn reset_to(&mut self, spec: &TrialSpec) {
        let mut state = self.0.state_mut();
        state.arrow.anchor = spec.arrow_anchor();
        state.arrow.forward = spec.arrow_direction;
    }
}

impl Visibility for PreviewHandle {
    fn show(&mut self) {
        self.0.state_mut().preview.visible = true;
    }
    fn hide(&mut self) {
        self.0.state_mut().preview.visible = false;
    }
}

impl StimulusDriver for PreviewHandle {
    fn reset_to(&mut self, spec: &TrialSpec) {
        let mut state = self.0.state_mut();
        state.preview.r1 = spec.r1;
        state.preview.r2 = spec.r2;
        state.preview.params = AdjustParams::RESET;
    }
}

impl AdjustableDriver for PreviewHandle {
    fn current_params(&self) -> AdjustParams {
        self.0.state().preview.params
    }
}

impl Visibility for DemoHandle {
    fn show(&mut self) {
        self.0.state_mut().demo_visible = true;
    }
    fn hide(&mut self) {
        self.0.state_mut().demo_visible = false;
    }
}

impl TextPanel for TextHandle {
    fn display(&mut self, text: &str) {
        debug!("text: {}", text.lines().next().unwrap_or_default());
        self.0.state_mut().text = Some(text.to_string());
    }
    fn clear(&mut self) {
        self.0.state_mut().text = None;
    }
}
