#![allow(dead_code)]

use curvex_core::{
    AdjustParams, AdjustableDriver, Button, ButtonSet, DashedDriver, StimulusDriver, TextPanel,
    TrialSpec, Visibility,
};
use curvex_experiment::{
    Awaiting, ConfigError, DriversBuilder, ExperimentConfig, ExperimentController,
    ExperimentEvent, parse_trials,
};
use curvex_timing::{ManualTimer, Timer};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tempfile::TempDir;

pub const HEADER: &str = "n,R1,R2,width,segments,rotationSpeed,rotationDirection,arrowPointIndex,isDashed,dashSpeed,isSelfRotating,arrowDirection";

pub fn dashed_row(dash_speed: f32, arrow_direction: u8) -> String {
    format!("3,1,1.5,0.02,200,60,CW,40,True,{},True,{}", dash_speed, arrow_direction)
}

pub fn solid_row() -> String {
    "3,1,1.5,0.05,200,45,CCW,0,False,0,True,0".to_string()
}

pub fn trial_file(rows: &[String]) -> String {
    let mut text = String::from(HEADER);
    for row in rows {
        text.push('\n');
        text.push_str(row);
    }
    text
}

pub type CallLog = Rc<RefCell<Vec<String>>>;

/// Records every call as `"<name>.<method>"`.
struct Recording {
    name: &'static str,
    log: CallLog,
    params: Rc<Cell<AdjustParams>>,
}

impl Recording {
    fn push(&self, method: &str) {
        self.log.borrow_mut().push(format!("{}.{}", self.name, method));
    }
}

impl Visibility for Recording {
    fn show(&mut self) {
        self.push("show");
    }
    fn hide(&mut self) {
        self.push("hide");
    }
}

impl StimulusDriver for Recording {
    fn reset_to(&mut self, _spec: &TrialSpec) {
        self.push("reset");
    }
}

impl DashedDriver for Recording {
    fn start_motion(&mut self) {
        self.push("start_motion");
    }
    fn stop_motion(&mut self) {
        self.push("stop_motion");
    }
}

impl AdjustableDriver for Recording {
    fn current_params(&self) -> AdjustParams {
        self.params.get()
    }
}

impl TextPanel for Recording {
    fn display(&mut self, _text: &str) {
        self.push("display");
    }
    fn clear(&mut self) {
        self.push("clear");
    }
}

pub struct Harness {
    pub controller: ExperimentController<ManualTimer, StdRng>,
    pub timer: ManualTimer,
    pub log: CallLog,
    pub params: Rc<Cell<AdjustParams>>,
    pub events: Vec<ExperimentEvent>,
    pub output: TempDir,
}

/// Tick spacing used while waiting on the controller.
pub const TICK_MS: u64 = 10;

impl Harness {
    pub fn new(rows: &[String], config: ExperimentConfig) -> Self {
        Self::try_new(rows, config).unwrap()
    }

    pub fn try_new(rows: &[String], mut config: ExperimentConfig) -> Result<Self, ConfigError> {
        let output = TempDir::new().unwrap();
        config.output_dir = output.path().to_path_buf();

        let log: CallLog = Rc::new(RefCell::new(Vec::new()));
        let params = Rc::new(Cell::new(AdjustParams::RESET));
        let driver = |name| Recording {
            name,
            log: log.clone(),
            params: params.clone(),
        };
        let drivers = DriversBuilder::new()
            .reference(driver("reference"))
            .dashed(driver("dashed"))
            .arrow(driver("arrow"))
            .preview(driver("preview"))
            .demo(driver("demo"))
            .text(driver("text"))
            .build()
            .unwrap();

        let trials = parse_trials(&trial_file(rows)).unwrap();
        let timer = ManualTimer::new();
        let controller = ExperimentController::new(
            config,
            trials,
            drivers,
            timer.clone(),
            StdRng::seed_from_u64(7),
        )?;

        Ok(Self {
            controller,
            timer,
            log,
            params,
            events: Vec::new(),
            output,
        })
    }

    pub fn now_ms(&self) -> u64 {
        self.timer.now() / 1_000_000
    }

    pub fn tick_with(&mut self, pressed: ButtonSet) -> Vec<ExperimentEvent> {
        let events = self.controller.tick(pressed);
        self.events.extend(events.iter().cloned());
        events
    }

    pub fn tick(&mut self) -> Vec<ExperimentEvent> {
        self.tick_with(ButtonSet::empty())
    }

    pub fn step(&mut self, ms: u64) -> Vec<ExperimentEvent> {
        self.timer.advance_ms(ms);
        self.tick()
    }

    pub fn press(&mut self, button: Button) -> Vec<ExperimentEvent> {
        self.tick_with(ButtonSet::empty().with(button))
    }

    /// Ticks until the controller blocks on `want`, giving up after `limit_ms`.
    pub fn wait_for(&mut self, want: Awaiting, limit_ms: u64) -> bool {
        let deadline = self.now_ms() + limit_ms;
        loop {
            self.tick();
            if self.controller.awaiting() == Some(want) {
                return true;
            }
            if self.now_ms() >= deadline || self.controller.is_finished() {
                return false;
            }
            self.timer.advance_ms(TICK_MS);
        }
    }

    pub fn confirm(&mut self) {
        assert!(
            self.wait_for(Awaiting::Confirm, 30_000),
            "never asked for confirmation"
        );
        self.press(Button::Confirm);
    }

    pub fn choose(&mut self, button: Button) {
        assert!(
            self.wait_for(Awaiting::Choice, 30_000),
            "never asked for a choice"
        );
        self.press(button);
    }

    pub fn calls_since(&self, mark: usize) -> Vec<String> {
        self.log.borrow()[mark..].to_vec()
    }

    pub fn log_len(&self) -> usize {
        self.log.borrow().len()
    }
}

/// No practice share, so every row is measured.
pub fn measurement_only() -> ExperimentConfig {
    ExperimentConfig {
        practice_solid_trials: 0,
        practice_dashed_trials: 0,
        ..ExperimentConfig::default()
    }
}
