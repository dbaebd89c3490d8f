/// Macro-stages of a session, in the order they run.
///
/// Stages only ever move forward. Ordinals start at 1 so that the controller's
/// "executing" counter can start at 0 before anything has been entered.
#[derive(Copy, Debug, Clone, PartialEq, Eq, Default)]
pub enum Stage {
    #[default]
    Introduction,
    Practice,
    MeasurementA,
    MidBreak,
    MeasurementB,
    Termination,
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Stage::Introduction,
        Stage::Practice,
        Stage::MeasurementA,
        Stage::MidBreak,
        Stage::MeasurementB,
        Stage::Termination,
    ];

    pub fn ordinal(&self) -> u8 {
        use Stage::*;
        match self {
            Introduction => 1,
            Practice => 2,
            MeasurementA => 3,
            MidBreak => 4,
            MeasurementB => 5,
            Termination => 6,
        }
    }

    pub fn from_ordinal(ordinal: u8) -> Option<Self> {
        let index = (ordinal as usize).checked_sub(1)?;
        Self::ALL.get(index).copied()
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Introduction => "introduction",
            Stage::Practice => "practice",
            Stage::MeasurementA => "measurement A",
            Stage::MidBreak => "mid-break",
            Stage::MeasurementB => "measurement B",
            Stage::Termination => "termination",
        };
        write!(f, "{} ({})", name, self.ordinal())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinals_run_one_to_six() {
        let ordinals: Vec<u8> = Stage::ALL.iter().map(Stage::ordinal).collect();
        assert_eq!(ordinals, vec![1, 2, 3, 4, 5, 6]);
        for stage in Stage::ALL {
            assert_eq!(Stage::from_ordinal(stage.ordinal()), Some(stage));
        }
    }

    #[test]
    fn out_of_range_ordinals_have_no_stage() {
        assert_eq!(Stage::from_ordinal(0), None);
        assert_eq!(Stage::from_ordinal(7), None);
    }

    #[test]
    fn display_names_the_ordinal() {
        assert_eq!(Stage::MidBreak.to_string(), "mid-break (4)");
        assert_eq!(Stage::default(), Stage::Introduction);
    }
}
