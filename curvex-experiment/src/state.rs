use crate::config::ExperimentConfig;
use crate::drivers::Drivers;
use crate::error::ConfigError;
use crate::loader::{MeasurementCounts, TrialSet};
use crate::protocol::{DashedProtocol, DashedTimings, ProtocolAction, deadline_after};
use crate::recorder::TrialRecorder;
use crate::routine::{StageRoutine, Step, trial_steps};
use crate::script;
use crate::session::SessionState;
use curvex_core::{
    AdjustParams, Button, ButtonSet, Response, Stage, TrialKind, TrialOutcome, TrialSpec,
};
use curvex_timing::Timer;
use log::{debug, error, info, warn};
use rand::Rng;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub enum ExperimentEvent {
    StageEntered(Stage),
    StageCompleted(Stage),
    TrialStarted {
        trial: usize,
        kind: TrialKind,
        practice: bool,
    },
    StimulusReady {
        trial: usize,
    },
    TrialCompleted {
        trial: usize,
        reaction_time: f32,
    },
    DataSaved(PathBuf),
    SaveFailed(String),
}

/// Participant input the active stage is currently blocked on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Awaiting {
    Confirm,
    Choice,
}

enum StepOutcome {
    Done,
    Blocked,
    Replace(Step),
    Expand(Vec<Step>),
}

/// Drives the whole session from a single per-tick entry point.
pub struct ExperimentController<T, R>
where
    T: Timer<Timestamp = u64>,
    R: Rng,
{
    config: ExperimentConfig,
    trials: Vec<TrialSpec>,
    counts: MeasurementCounts,
    drivers: Drivers,
    recorder: TrialRecorder,
    session: SessionState,
    routine: Option<StageRoutine>,
    dashed: Option<DashedProtocol>,
    saved_to: Option<PathBuf>,
    timer: T,
    rng: R,
}

impl<T, R> ExperimentController<T, R>
where
    T: Timer<Timestamp = u64>,
    R: Rng,
{
    pub fn new(
        config: ExperimentConfig,
        trial_set: TrialSet,
        mut drivers: Drivers,
        timer: T,
        rng: R,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let counts = trial_set.measurement_counts(&config);
        info!(
            "session ready: {} trials, {} dashed / {} solid measured",
            trial_set.len(),
            counts.dashed,
            counts.solid
        );

        drivers.hide_stimuli();
        drivers.demo.hide();
        drivers.text.clear();

        Ok(Self {
            config,
            trials: trial_set.trials,
            counts,
            drivers,
            recorder: TrialRecorder::new(),
            session: SessionState::new(),
            routine: None,
            dashed: None,
            saved_to: None,
            timer,
            rng,
        })
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn recorder(&self) -> &TrialRecorder {
        &self.recorder
    }

    pub fn outcomes(&self) -> &[TrialOutcome] {
        self.recorder.outcomes()
    }

    pub fn counts(&self) -> MeasurementCounts {
        self.counts
    }

    pub fn trials(&self) -> &[TrialSpec] {
        &self.trials
    }

    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    pub fn stage(&self) -> Option<Stage> {
        self.session.stage()
    }

    pub fn is_finished(&self) -> bool {
        self.session.is_finished()
    }

    pub fn saved_to(&self) -> Option<&PathBuf> {
        self.saved_to.as_ref()
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    pub fn dashed_protocol(&self) -> Option<&DashedProtocol> {
        self.dashed.as_ref()
    }

    pub fn awaiting(&self) -> Option<Awaiting> {
        match self.routine.as_ref()?.front()? {
            Step::AwaitConfirm => Some(Awaiting::Confirm),
            Step::AwaitChoice { .. } => Some(Awaiting::Choice),
            _ => None,
        }
    }

    /// Advances the session by one scheduler tick.
    ///
    /// `pressed` must hold only buttons that went down since the previous
    /// tick. Each press satisfies at most one wait.
    pub fn tick(&mut self, pressed: ButtonSet) -> Vec<ExperimentEvent> {
        let mut events = Vec::new();
        let mut input = pressed;

        self.poll_dashed(&mut events);

        if self.session.trial_number <= self.trials.len() && self.session.may_launch() {
            if let Some(stage) = self.session.stage() {
                self.launch(stage, &mut events);
            }
        }

        self.run_routine(&mut input, &mut events);
        events
    }

    fn launch(&mut self, stage: Stage, events: &mut Vec<ExperimentEvent>) {
        self.session.enter_stage();
        info!("entering stage {}", stage);
        events.push(ExperimentEvent::StageEntered(stage));

        let routine = match stage {
            Stage::Introduction => StageRoutine::introduction(&self.config),
            Stage::Practice => StageRoutine::practice(&self.config),
            Stage::MeasurementA | Stage::MeasurementB => {
                match self.trials.get(self.session.trial_number) {
                    Some(spec) => {
                        let kind = spec.kind();
                        let count = self.counts.for_kind(kind);
                        info!("{} runs {} {:?} trials", stage, count, kind);
                        StageRoutine::measurement(stage, kind, count, &self.config)
                    }
                    None => {
                        warn!("{} has no trials left to run", stage);
                        StageRoutine::empty(stage)
                    }
                }
            }
            Stage::MidBreak => StageRoutine::mid_break(&self.config),
            Stage::Termination => {
                self.terminate(events);
                return;
            }
        };
        self.routine = Some(routine);
    }

    fn terminate(&mut self, events: &mut Vec<ExperimentEvent>) {
        self.drivers.text.display(script::FAREWELL);
        match self
            .recorder
            .flush(&self.config.output_dir, chrono::Local::now())
        {
            Ok(path) => {
                self.saved_to = Some(path.clone());
                events.push(ExperimentEvent::DataSaved(path));
            }
            Err(e) => {
                error!("failed to save trial data: {}", e);
                events.push(ExperimentEvent::SaveFailed(e.to_string()));
            }
        }
        self.session.exit_stage();
        events.push(ExperimentEvent::StageCompleted(Stage::Termination));
    }

    fn run_routine(&mut self, input: &mut ButtonSet, events: &mut Vec<ExperimentEvent>) {
        let Some(mut routine) = self.routine.take() else {
            return;
        };

        while let Some(step) = routine.front().cloned() {
            match self.poll_step(step, routine.stage(), input, events) {
                StepOutcome::Done => {
                    routine.pop();
                }
                StepOutcome::Blocked => break,
                StepOutcome::Replace(step) => routine.replace_front(step),
                StepOutcome::Expand(steps) => routine.expand_front(steps),
            }
        }

        if !routine.is_done() {
            self.routine = Some(routine);
        }
    }

    fn poll_step(
        &mut self,
        step: Step,
        stage: Stage,
        input: &mut ButtonSet,
        events: &mut Vec<ExperimentEvent>,
    ) -> StepOutcome {
        match step {
            Step::Display(text) => {
                self.drivers.text.display(text);
                StepOutcome::Done
            }
            Step::ClearText => {
                self.drivers.text.clear();
                StepOutcome::Done
            }
            Step::ShowDemo => {
                self.drivers.demo.show();
                StepOutcome::Done
            }
            Step::HideDemo => {
                self.drivers.demo.hide();
                StepOutcome::Done
            }
            Step::Pause(ms) => StepOutcome::Replace(Step::Sleeping {
                until: deadline_after(self.timer.now(), ms),
            }),
            Step::Sleeping { until } => {
                if self.timer.now() >= until {
                    StepOutcome::Done
                } else {
                    StepOutcome::Blocked
                }
            }
            Step::AwaitConfirm => {
                if input.take(Button::Confirm) {
                    StepOutcome::Done
                } else {
                    StepOutcome::Blocked
                }
            }
            Step::RunTrial { planned, practice } => {
                let Some(spec) = self.trials.get(self.session.trial_number) else {
                    warn!(
                        "no trial left at index {}; skipping a planned {:?} trial",
                        self.session.trial_number, planned
                    );
                    return StepOutcome::Done;
                };
                let kind = spec.kind();
                if kind != planned {
                    warn!(
                        "trial {} is {:?} but {} planned {:?}",
                        self.session.trial_number, kind, stage, planned
                    );
                }
                StepOutcome::Expand(trial_steps(kind, practice, &self.config))
            }
            Step::BeginTrial { practice } => {
                self.begin_trial(practice, events);
                StepOutcome::Done
            }
            Step::AwaitReady(kind) => {
                if self.session.is_ready(kind) {
                    StepOutcome::Done
                } else {
                    StepOutcome::Blocked
                }
            }
            Step::AwaitChoice { practice } => {
                let response = if input.take(Button::ChoiceX) {
                    Response::X
                } else if input.take(Button::ChoiceY) {
                    Response::Y
                } else {
                    return StepOutcome::Blocked;
                };
                self.end_dashed_trial(response, practice, events);
                StepOutcome::Done
            }
            Step::CaptureAdjustment { practice } => {
                let params = self.drivers.preview.current_params();
                self.end_solid_trial(params, practice, events);
                StepOutcome::Done
            }
            Step::CompleteStage => {
                self.session.exit_stage();
                info!("completed stage {}", stage);
                events.push(ExperimentEvent::StageCompleted(stage));
                StepOutcome::Done
            }
        }
    }

    fn begin_trial(&mut self, practice: bool, events: &mut Vec<ExperimentEvent>) {
        self.drivers.text.clear();
        let trial = self.session.trial_number;
        let Some(spec) = self.trials.get(trial).cloned() else {
            return;
        };
        info!("start trial {} ({:?})", trial, spec.kind());
        events.push(ExperimentEvent::TrialStarted {
            trial,
            kind: spec.kind(),
            practice,
        });
        match spec.kind() {
            TrialKind::Dashed => self.start_dashed_trial(&spec),
            TrialKind::Solid => {
                self.start_solid_trial(&spec);
                events.push(ExperimentEvent::StimulusReady { trial });
            }
        }
    }

    fn start_dashed_trial(&mut self, spec: &TrialSpec) {
        self.drivers.reference.hide();
        self.drivers.preview.hide();

        self.drivers.arrow.reset_to(spec);
        self.drivers.dashed.reset_to(spec);
        self.drivers.dashed.show();
        self.drivers.dashed.stop_motion();

        let timings = DashedTimings::sample(&self.config, &mut self.rng);
        debug!("arrow appears after {} ms", timings.pre_arrow_ms);
        self.dashed = Some(DashedProtocol::start(self.timer.now(), timings));
    }

    fn start_solid_trial(&mut self, spec: &TrialSpec) {
        self.drivers.reference.reset_to(spec);
        self.drivers.reference.show();
        self.drivers.preview.reset_to(spec);
        self.drivers.preview.show();

        self.drivers.arrow.hide();
        self.drivers.dashed.hide();

        self.session.mark_ready(TrialKind::Solid, self.timer.now());
    }

    fn poll_dashed(&mut self, events: &mut Vec<ExperimentEvent>) {
        let now = self.timer.now();
        let Some(protocol) = self.dashed.as_mut() else {
            return;
        };
        match protocol.poll(now) {
            Some(ProtocolAction::RevealArrow) => self.drivers.arrow.show(),
            Some(ProtocolAction::StartMotion) => {
                self.drivers.dashed.start_motion();
                self.session.mark_ready(TrialKind::Dashed, now);
                events.push(ExperimentEvent::StimulusReady {
                    trial: self.session.trial_number,
                });
            }
            Some(ProtocolAction::Teardown) => {
                self.drivers.dashed.stop_motion();
                self.drivers.dashed.hide();
                self.drivers.arrow.hide();
                self.dashed = None;
            }
            None => {}
        }
    }

    fn reaction_time(&self) -> f32 {
        let now = self.timer.now();
        let anchor = self.session.reaction_anchor_ns.unwrap_or(now);
        now.saturating_sub(anchor) as f32 / 1e9
    }

    fn end_dashed_trial(
        &mut self,
        response: Response,
        practice: bool,
        events: &mut Vec<ExperimentEvent>,
    ) {
        // Cancel whatever the presentation still had scheduled.
        self.dashed = None;

        let trial = self.session.trial_number;
        let reaction_time = self.reaction_time();
        debug!("reaction time: {:.3} s", reaction_time);

        let mut outcome = TrialOutcome::dashed(trial, response, reaction_time);
        outcome.practice = practice;
        if let Some(expected) = self.trials.get(trial).and_then(TrialSpec::expected_response) {
            let correct = expected == response;
            outcome.correct = Some(correct);
            info!(
                "trial {} {}",
                trial,
                if correct { "correct" } else { "incorrect" }
            );
        }
        self.recorder.record(outcome);

        self.session.clear_ready(TrialKind::Dashed);
        self.finish_trial(trial, reaction_time, events);
    }

    fn end_solid_trial(
        &mut self,
        params: AdjustParams,
        practice: bool,
        events: &mut Vec<ExperimentEvent>,
    ) {
        let trial = self.session.trial_number;
        let reaction_time = self.reaction_time();
        debug!("reaction time: {:.3} s, params {:?}", reaction_time, params);

        let mut outcome = TrialOutcome::solid(trial, params, reaction_time);
        outcome.practice = practice;
        self.recorder.record(outcome);

        self.session.clear_ready(TrialKind::Solid);
        self.finish_trial(trial, reaction_time, events);
    }

    fn finish_trial(&mut self, trial: usize, reaction_time: f32, events: &mut Vec<ExperimentEvent>) {
        self.drivers.hide_stimuli();
        self.session.trial_number += 1;
        events.push(ExperimentEvent::TrialCompleted {
            trial,
            reaction_time,
        });
    }
}
