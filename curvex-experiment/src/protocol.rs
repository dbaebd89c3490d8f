use crate::config::ExperimentConfig;
use rand::Rng;

/// Deadline `ms` milliseconds after `now_ns`, pinned at the end of the clock.
pub(crate) fn deadline_after(now_ns: u64, ms: u64) -> u64 {
    now_ns.saturating_add(ms.saturating_mul(1_000_000))
}

/// Durations of one dashed presentation, with the random pre-arrow wait already drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashedTimings {
    pub pre_arrow_ms: u64,
    pub arrow_lead_ms: u64,
    pub observation_ms: u64,
}

impl DashedTimings {
    pub fn sample<R: Rng>(config: &ExperimentConfig, rng: &mut R) -> Self {
        let (lo, hi) = config.arrow_delay_range_ms;
        Self {
            pre_arrow_ms: rng.random_range(lo..=hi),
            arrow_lead_ms: config.arrow_lead_ms,
            observation_ms: config.observation_window_ms,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashedPhase {
    /// Curve visible and still, arrow hidden.
    AwaitingArrow { until: u64 },
    /// Arrow visible, dashes not yet moving.
    ArrowLead { until: u64 },
    /// Dashes moving; the stimulus is ready from the start of this phase.
    Observing { until: u64 },
    Finished,
}

/// What the controller must do to the drivers on a phase change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolAction {
    RevealArrow,
    StartMotion,
    Teardown,
}

/// The suspended part of a dashed trial, advanced one transition per tick.
///
/// Every deadline is measured from the tick on which the previous phase
/// ended, so a late tick can only push later phases back, never forward.
/// Dropping the value cancels whatever has not happened yet.
#[derive(Debug, Clone)]
pub struct DashedProtocol {
    phase: DashedPhase,
    timings: DashedTimings,
}

impl DashedProtocol {
    pub fn start(now_ns: u64, timings: DashedTimings) -> Self {
        Self {
            phase: DashedPhase::AwaitingArrow {
                until: deadline_after(now_ns, timings.pre_arrow_ms),
            },
            timings,
        }
    }

    pub fn phase(&self) -> DashedPhase {
        self.phase
    }

    pub fn timings(&self) -> DashedTimings {
        self.timings
    }

    pub fn is_finished(&self) -> bool {
        self.phase == DashedPhase::Finished
    }

    pub fn poll(&mut self, now_ns: u64) -> Option<ProtocolAction> {
        match self.phase {
            DashedPhase::AwaitingArrow { until } if now_ns >= until => {
                self.phase = DashedPhase::ArrowLead {
                    until: deadline_after(now_ns, self.timings.arrow_lead_ms),
                };
                Some(ProtocolAction::RevealArrow)
            }
            DashedPhase::ArrowLead { until } if now_ns >= until => {
                self.phase = DashedPhase::Observing {
                    until: deadline_after(now_ns, self.timings.observation_ms),
                };
                Some(ProtocolAction::StartMotion)
            }
            DashedPhase::Observing { until } if now_ns >= until => {
                self.phase = DashedPhase::Finished;
                Some(ProtocolAction::Teardown)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const MS: u64 = 1_000_000;

    fn timings() -> DashedTimings {
        DashedTimings {
            pre_arrow_ms: 7000,
            arrow_lead_ms: 500,
            observation_ms: 2000,
        }
    }

    #[test]
    fn phases_fire_in_order_at_their_deadlines() {
        let mut p = DashedProtocol::start(0, timings());
        assert_eq!(p.poll(6999 * MS), None);
        assert_eq!(p.poll(7000 * MS), Some(ProtocolAction::RevealArrow));
        assert_eq!(p.poll(7499 * MS), None);
        assert_eq!(p.poll(7500 * MS), Some(ProtocolAction::StartMotion));
        assert_eq!(p.poll(9499 * MS), None);
        assert_eq!(p.poll(9500 * MS), Some(ProtocolAction::Teardown));
        assert!(p.is_finished());
        assert_eq!(p.poll(60_000 * MS), None);
    }

    #[test]
    fn one_transition_per_poll_even_when_late() {
        let mut p = DashedProtocol::start(0, timings());
        assert_eq!(p.poll(20_000 * MS), Some(ProtocolAction::RevealArrow));
        // lead is measured from the late reveal, not from the original schedule
        assert_eq!(p.poll(20_000 * MS), None);
        assert_eq!(p.poll(20_500 * MS), Some(ProtocolAction::StartMotion));
    }

    #[test]
    fn huge_waits_pin_the_deadline_instead_of_wrapping() {
        let long = DashedTimings {
            pre_arrow_ms: u64::MAX,
            ..timings()
        };
        let mut p = DashedProtocol::start(5 * MS, long);
        assert_eq!(p.phase(), DashedPhase::AwaitingArrow { until: u64::MAX });
        assert_eq!(p.poll(u64::MAX - 1), None);
        assert_eq!(deadline_after(u64::MAX - 1, 1), u64::MAX);
    }

    #[test]
    fn sampled_delay_stays_in_range() {
        let config = ExperimentConfig::default();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let t = DashedTimings::sample(&config, &mut rng);
            assert!((6000..=10000).contains(&t.pre_arrow_ms));
            assert_eq!(t.arrow_lead_ms, 500);
            assert_eq!(t.observation_ms, 2000);
        }
    }
}
