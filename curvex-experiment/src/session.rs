use curvex_core::{Stage, TrialKind};

/// Working memory of one session. Only the controller holds a mutable handle.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub(crate) trial_number: usize,
    pub(crate) current_stage: u8,
    pub(crate) executing_stage: u8,
    pub(crate) dashed_ready: bool,
    pub(crate) solid_ready: bool,
    pub(crate) reaction_anchor_ns: Option<u64>,
    pub(crate) launches: usize,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            trial_number: 0,
            current_stage: Stage::Introduction.ordinal(),
            executing_stage: 0,
            dashed_ready: false,
            solid_ready: false,
            reaction_anchor_ns: None,
            launches: 0,
        }
    }

    /// Index of the next trial to run.
    pub fn trial_number(&self) -> usize {
        self.trial_number
    }

    pub fn current_stage(&self) -> u8 {
        self.current_stage
    }

    pub fn executing_stage(&self) -> u8 {
        self.executing_stage
    }

    pub fn stage(&self) -> Option<Stage> {
        Stage::from_ordinal(self.current_stage)
    }

    /// How many stage bodies have been entered so far.
    pub fn launches(&self) -> usize {
        self.launches
    }

    pub fn reaction_anchor_ns(&self) -> Option<u64> {
        self.reaction_anchor_ns
    }

    /// A stage body may start only if the previous one has both entered and exited.
    pub fn may_launch(&self) -> bool {
        self.executing_stage + 1 == self.current_stage
    }

    pub(crate) fn enter_stage(&mut self) {
        self.executing_stage += 1;
        self.launches += 1;
    }

    pub(crate) fn exit_stage(&mut self) {
        self.current_stage += 1;
    }

    pub fn is_finished(&self) -> bool {
        self.current_stage > Stage::Termination.ordinal()
    }

    pub fn is_ready(&self, kind: TrialKind) -> bool {
        match kind {
            TrialKind::Dashed => self.dashed_ready,
            TrialKind::Solid => self.solid_ready,
        }
    }

    pub(crate) fn mark_ready(&mut self, kind: TrialKind, now_ns: u64) {
        match kind {
            TrialKind::Dashed => self.dashed_ready = true,
            TrialKind::Solid => self.solid_ready = true,
        }
        self.reaction_anchor_ns = Some(now_ns);
    }

    pub(crate) fn clear_ready(&mut self, kind: TrialKind) {
        match kind {
            TrialKind::Dashed => self.dashed_ready = false,
            TrialKind::Solid => self.solid_ready = false,
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_opens_only_between_stages() {
        let mut s = SessionState::new();
        assert!(s.may_launch());
        s.enter_stage();
        assert!(!s.may_launch());
        s.exit_stage();
        assert!(s.may_launch());
        assert_eq!(s.stage(), Some(Stage::Practice));
    }

    #[test]
    fn finished_after_termination_exits() {
        let mut s = SessionState::new();
        for _ in Stage::ALL {
            s.enter_stage();
            s.exit_stage();
        }
        assert!(s.is_finished());
        assert_eq!(s.stage(), None);
        assert_eq!(s.launches(), 6);
    }

    #[test]
    fn ready_flags_are_per_kind() {
        let mut s = SessionState::new();
        s.mark_ready(TrialKind::Solid, 42);
        assert!(s.is_ready(TrialKind::Solid));
        assert!(!s.is_ready(TrialKind::Dashed));
        assert_eq!(s.reaction_anchor_ns(), Some(42));
        s.clear_ready(TrialKind::Solid);
        assert!(!s.is_ready(TrialKind::Solid));
    }
}
