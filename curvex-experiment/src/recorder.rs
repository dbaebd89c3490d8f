use crate::error::RecordError;
use chrono::{DateTime, Local};
use curvex_core::{AdjustParams, Response, TrialKind, TrialOutcome};
use log::{error, info};
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const HEADER: &str = "TrialNumber,a,b,Multiplier,Result,ReactionTime";
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Append-only store of completed trials, written out once at the end.
#[derive(Debug, Default)]
pub struct TrialRecorder {
    outcomes: Vec<TrialOutcome>,
    flushed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub total_trials: usize,
    pub practice_trials: usize,
    pub measurement_dashed: usize,
    pub measurement_solid: usize,
    pub dashed_correct: usize,
    pub dashed_accuracy: Option<f64>,
    pub mean_dashed_rt_s: Option<f64>,
    pub mean_solid_rt_s: Option<f64>,
}

impl TrialRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: TrialOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn outcomes(&self) -> &[TrialOutcome] {
        &self.outcomes
    }

    /// Outcomes from the measurement stages only.
    pub fn measurement_outcomes(&self) -> impl Iterator<Item = &TrialOutcome> {
        self.outcomes.iter().filter(|o| !o.practice)
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn is_flushed(&self) -> bool {
        self.flushed
    }

    pub fn to_csv(&self) -> String {
        let mut out = String::with_capacity(HEADER.len() + 1 + self.outcomes.len() * 32);
        out.push_str(HEADER);
        out.push('\n');
        for o in &self.outcomes {
            out.push_str(&format!(
                "{},{},{},{},{},{}\n",
                o.trial_number,
                o.params.a,
                o.params.b,
                o.params.multiplier,
                o.response.map_or("", |r| r.as_str()),
                o.reaction_time,
            ));
        }
        out
    }

    pub fn summary(&self) -> SessionSummary {
        let measured: Vec<&TrialOutcome> = self.measurement_outcomes().collect();
        let dashed: Vec<&&TrialOutcome> = measured
            .iter()
            .filter(|o| o.kind() == TrialKind::Dashed)
            .collect();
        let solid: Vec<&&TrialOutcome> = measured
            .iter()
            .filter(|o| o.kind() == TrialKind::Solid)
            .collect();
        let dashed_correct = dashed.iter().filter(|o| o.correct == Some(true)).count();

        let mean_rt = |items: &[&&TrialOutcome]| {
            if items.is_empty() {
                None
            } else {
                Some(items.iter().map(|o| o.reaction_time as f64).sum::<f64>() / items.len() as f64)
            }
        };

        SessionSummary {
            total_trials: self.outcomes.len(),
            practice_trials: self.outcomes.len() - measured.len(),
            measurement_dashed: dashed.len(),
            measurement_solid: solid.len(),
            dashed_correct,
            dashed_accuracy: if dashed.is_empty() {
                None
            } else {
                Some(dashed_correct as f64 / dashed.len() as f64)
            },
            mean_dashed_rt_s: mean_rt(&dashed),
            mean_solid_rt_s: mean_rt(&solid),
        }
    }

    /// Writes `TrialData_<timestamp>.csv` and its JSON summary into `dir`.
    ///
    /// Only the first call writes; later calls fail with
    /// [`RecordError::AlreadyFlushed`] even if the first attempt failed.
    pub fn flush(&mut self, dir: &Path, at: DateTime<Local>) -> Result<PathBuf, RecordError> {
        if self.flushed {
            return Err(RecordError::AlreadyFlushed);
        }
        self.flushed = true;

        let stamp = at.format(TIMESTAMP_FORMAT).to_string();
        let csv_path = dir.join(format!("TrialData_{}.csv", stamp));
        let summary_path = dir.join(format!("TrialData_{}.summary.json", stamp));

        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source: std::io::Error| RecordError::Io { path, source }
        };

        std::fs::create_dir_all(dir).map_err(io_err(dir))?;
        std::fs::write(&csv_path, self.to_csv()).map_err(io_err(&csv_path))?;
        info!("trial data saved to {}", csv_path.display());

        let summary = self.summary();
        let json = serde_json::to_string_pretty(&summary)?;
        if let Err(e) = std::fs::write(&summary_path, json) {
            // the CSV is the record of truth; a missing summary is not fatal
            error!("cannot write summary {}: {}", summary_path.display(), e);
        }

        Ok(csv_path)
    }
}

/// Reads back the format produced by [`TrialRecorder::to_csv`].
pub fn parse_outcomes(text: &str) -> Result<Vec<TrialOutcome>, RecordError> {
    let mut lines = text.lines().enumerate().filter(|(_, l)| !l.trim().is_empty());
    match lines.next() {
        Some((_, header)) if header.trim() == HEADER => {}
        Some((line, _)) => {
            return Err(RecordError::Malformed {
                line: line + 1,
                reason: "unexpected header".into(),
            });
        }
        None => return Ok(Vec::new()),
    }

    lines
        .map(|(index, line)| {
            let malformed = |reason: &str| RecordError::Malformed {
                line: index + 1,
                reason: reason.to_string(),
            };
            let fields: Vec<&str> = line.split(',').collect();
            if fields.len() != 6 {
                return Err(malformed("expected 6 fields"));
            }
            let float = |i: usize| {
                fields[i]
                    .trim()
                    .parse::<f32>()
                    .map_err(|_| malformed("bad number"))
            };
            let response = match fields[4].trim() {
                "" => None,
                token => Some(Response::parse(token).ok_or_else(|| malformed("bad result"))?),
            };
            Ok(TrialOutcome {
                trial_number: fields[0]
                    .trim()
                    .parse()
                    .map_err(|_| malformed("bad trial number"))?,
                params: AdjustParams {
                    a: float(1)?,
                    b: float(2)?,
                    multiplier: float(3)?,
                },
                response,
                reaction_time: float(5)?,
                practice: false,
                correct: None,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> TrialRecorder {
        let mut recorder = TrialRecorder::new();
        let mut practice = TrialOutcome::dashed(0, Response::Y, 0.731);
        practice.practice = true;
        recorder.record(practice);
        let mut dashed = TrialOutcome::dashed(1, Response::X, 1.25);
        dashed.correct = Some(true);
        recorder.record(dashed);
        recorder.record(TrialOutcome::solid(
            2,
            AdjustParams {
                a: 0.125,
                b: 1.0,
                multiplier: -0.3,
            },
            12.5,
        ));
        recorder
    }

    #[test]
    fn csv_keeps_recording_order() {
        let csv = sample().to_csv();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], HEADER);
        assert_eq!(lines[1], "0,0,0,0,Y,0.731");
        assert_eq!(lines[2], "1,0,0,0,X,1.25");
        assert_eq!(lines[3], "2,0.125,1,-0.3,,12.5");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn written_rows_read_back_identically() {
        let recorder = sample();
        let parsed = parse_outcomes(&recorder.to_csv()).unwrap();
        assert_eq!(parsed.len(), recorder.len());
        for (got, want) in parsed.iter().zip(recorder.outcomes()) {
            assert_eq!(got.trial_number, want.trial_number);
            assert_eq!(got.params, want.params);
            assert_eq!(got.response, want.response);
            assert_eq!(got.reaction_time, want.reaction_time);
        }
    }

    #[test]
    fn reader_rejects_foreign_header() {
        assert!(matches!(
            parse_outcomes("a,b,c\n1,2,3"),
            Err(RecordError::Malformed { line: 1, .. })
        ));
    }

    #[test]
    fn summary_excludes_practice() {
        let summary = sample().summary();
        assert_eq!(summary.total_trials, 3);
        assert_eq!(summary.practice_trials, 1);
        assert_eq!(summary.measurement_dashed, 1);
        assert_eq!(summary.measurement_solid, 1);
        assert_eq!(summary.dashed_accuracy, Some(1.0));
        assert_eq!(summary.mean_solid_rt_s, Some(12.5));
    }

    #[test]
    fn flush_writes_timestamped_file_once() {
        let dir = tempfile::tempdir().unwrap();
        let at = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        let mut recorder = sample();

        let path = recorder.flush(dir.path(), at).unwrap();
        assert_eq!(path.file_name().unwrap(), "TrialData_20240309_140507.csv");
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, recorder.to_csv());
        assert!(dir.path().join("TrialData_20240309_140507.summary.json").exists());

        assert!(matches!(
            recorder.flush(dir.path(), at),
            Err(RecordError::AlreadyFlushed)
        ));
    }

    #[test]
    fn flush_into_unwritable_location_reports_io() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "").unwrap();
        let mut recorder = sample();
        let err = recorder.flush(&blocker.join("sub"), Local::now()).unwrap_err();
        assert!(matches!(err, RecordError::Io { .. }));
        assert!(recorder.is_flushed());
    }
}
