//! Stage bodies expressed as step queues.
//!
//! A routine is the body of one macro-stage. The controller pops steps off the
//! front each tick until one of them has to wait; the wait is the suspension
//! point, and the queue itself is the continuation.

use crate::config::ExperimentConfig;
use crate::script;
use curvex_core::{Stage, TrialKind};
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Display(&'static str),
    ClearText,
    ShowDemo,
    HideDemo,
    /// Fixed wait; becomes `Sleeping` when first reached.
    Pause(u64),
    Sleeping { until: u64 },
    AwaitConfirm,
    /// Placeholder for one trial of the planned task; expanded when reached.
    RunTrial { planned: TrialKind, practice: bool },
    BeginTrial { practice: bool },
    AwaitReady(TrialKind),
    /// Ends a dashed trial with whichever choice button comes first.
    AwaitChoice { practice: bool },
    /// Ends a solid trial with the preview's parameters at this moment.
    CaptureAdjustment { practice: bool },
    CompleteStage,
}

#[derive(Debug, Clone)]
pub struct StageRoutine {
    stage: Stage,
    steps: VecDeque<Step>,
}

impl StageRoutine {
    fn new(stage: Stage) -> Self {
        Self {
            stage,
            steps: VecDeque::new(),
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn front(&self) -> Option<&Step> {
        self.steps.front()
    }

    pub fn replace_front(&mut self, step: Step) {
        if let Some(front) = self.steps.front_mut() {
            *front = step;
        }
    }

    pub fn pop(&mut self) -> Option<Step> {
        self.steps.pop_front()
    }

    /// Replaces the front step with `steps`, preserving their order.
    pub fn expand_front(&mut self, steps: Vec<Step>) {
        self.steps.pop_front();
        for step in steps.into_iter().rev() {
            self.steps.push_front(step);
        }
    }

    pub fn is_done(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    fn push(&mut self, step: Step) -> &mut Self {
        self.steps.push_back(step);
        self
    }

    /// Text, settle pause, confirm, clear.
    fn prompt(&mut self, text: &'static str, config: &ExperimentConfig) -> &mut Self {
        self.push(Step::Display(text))
            .push(Step::Pause(config.prompt_settle_ms))
            .push(Step::AwaitConfirm)
            .push(Step::ClearText)
    }

    fn trials(&mut self, kind: TrialKind, count: usize, practice: bool) -> &mut Self {
        for _ in 0..count {
            self.push(Step::RunTrial {
                planned: kind,
                practice,
            });
        }
        self
    }

    pub fn introduction(config: &ExperimentConfig) -> Self {
        let mut r = Self::new(Stage::Introduction);
        r.prompt(script::WELCOME, config)
            .push(Step::ShowDemo)
            .push(Step::Pause(config.prompt_settle_ms))
            .push(Step::AwaitConfirm)
            .push(Step::HideDemo)
            .prompt(script::TASKS, config)
            .prompt(script::PRACTICE_INTRO, config)
            .push(Step::CompleteStage);
        r
    }

    pub fn practice(config: &ExperimentConfig) -> Self {
        let mut r = Self::new(Stage::Practice);
        r.prompt(script::PRACTICE_SOLID, config)
            .trials(TrialKind::Solid, config.practice_solid_trials, true)
            .prompt(script::PRACTICE_DASHED, config)
            .trials(TrialKind::Dashed, config.practice_dashed_trials, true)
            .prompt(script::READY, config)
            .push(Step::CompleteStage);
        r
    }

    pub fn measurement(stage: Stage, kind: TrialKind, count: usize, config: &ExperimentConfig) -> Self {
        let text = match kind {
            TrialKind::Dashed => script::DASHED_TASK,
            TrialKind::Solid => script::SOLID_TASK,
        };
        let mut r = Self::new(stage);
        r.prompt(text, config)
            .trials(kind, count, false)
            .push(Step::CompleteStage);
        r
    }

    /// A measurement stage with nothing left to run.
    pub fn empty(stage: Stage) -> Self {
        let mut r = Self::new(stage);
        r.push(Step::CompleteStage);
        r
    }

    pub fn mid_break(config: &ExperimentConfig) -> Self {
        let mut r = Self::new(Stage::MidBreak);
        r.prompt(script::MIDPOINT, config).push(Step::CompleteStage);
        r
    }
}

/// The concrete steps of one trial of `kind`.
pub fn trial_steps(kind: TrialKind, practice: bool, config: &ExperimentConfig) -> Vec<Step> {
    match kind {
        TrialKind::Solid => vec![
            Step::Pause(config.solid_lead_ms),
            Step::BeginTrial { practice },
            Step::AwaitReady(TrialKind::Solid),
            Step::Pause(config.prompt_settle_ms),
            Step::AwaitConfirm,
            Step::CaptureAdjustment { practice },
        ],
        TrialKind::Dashed => vec![
            Step::Pause(config.dashed_lead_ms),
            Step::BeginTrial { practice },
            Step::AwaitReady(TrialKind::Dashed),
            Step::Pause(config.prompt_settle_ms),
            Step::AwaitChoice { practice },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn confirms(r: &StageRoutine) -> usize {
        r.steps.iter().filter(|s| **s == Step::AwaitConfirm).count()
    }

    #[test]
    fn introduction_has_four_confirmed_screens() {
        let r = StageRoutine::introduction(&ExperimentConfig::default());
        assert_eq!(confirms(&r), 4);
        let demo_at = r.steps.iter().position(|s| *s == Step::ShowDemo).unwrap();
        let hide_at = r.steps.iter().position(|s| *s == Step::HideDemo).unwrap();
        assert!(demo_at < hide_at);
        assert_eq!(r.steps.back(), Some(&Step::CompleteStage));
    }

    #[test]
    fn practice_runs_solid_then_dashed() {
        let r = StageRoutine::practice(&ExperimentConfig::default());
        let planned: Vec<TrialKind> = r
            .steps
            .iter()
            .filter_map(|s| match s {
                Step::RunTrial { planned, practice } => {
                    assert!(*practice);
                    Some(*planned)
                }
                _ => None,
            })
            .collect();
        assert_eq!(planned.len(), 22);
        assert_eq!(planned[0], TrialKind::Solid);
        assert!(planned[1..].iter().all(|k| *k == TrialKind::Dashed));
    }

    #[test]
    fn measurement_loops_the_derived_count() {
        let config = ExperimentConfig::default();
        let r = StageRoutine::measurement(Stage::MeasurementA, TrialKind::Dashed, 4, &config);
        let runs = r
            .steps
            .iter()
            .filter(|s| matches!(s, Step::RunTrial { practice: false, .. }))
            .count();
        assert_eq!(runs, 4);
        assert_eq!(r.front(), Some(&Step::Display(script::DASHED_TASK)));
    }

    #[test]
    fn expand_front_keeps_order() {
        let config = ExperimentConfig::default();
        let mut r = StageRoutine::measurement(Stage::MeasurementB, TrialKind::Solid, 1, &config);
        while !matches!(r.front(), Some(Step::RunTrial { .. })) {
            r.pop();
        }
        r.expand_front(trial_steps(TrialKind::Solid, false, &config));
        assert_eq!(r.pop(), Some(Step::Pause(config.solid_lead_ms)));
        assert_eq!(r.pop(), Some(Step::BeginTrial { practice: false }));
        assert_eq!(r.pop(), Some(Step::AwaitReady(TrialKind::Solid)));
        assert_eq!(r.len(), 4);
    }

    #[test]
    fn dashed_trial_waits_for_ready_before_choice() {
        let steps = trial_steps(TrialKind::Dashed, true, &ExperimentConfig::default());
        let ready = steps
            .iter()
            .position(|s| *s == Step::AwaitReady(TrialKind::Dashed))
            .unwrap();
        let choice = steps
            .iter()
            .position(|s| matches!(s, Step::AwaitChoice { .. }))
            .unwrap();
        assert!(ready < choice);
    }
}
