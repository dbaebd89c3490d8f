//! Trial-definition files: one header row, then comma-separated rows of
//! `n, R1, R2, width, segments, rotationSpeed, rotationDirection,
//! arrowPointIndex, isDashed, dashSpeed, isSelfRotating, arrowDirection`.
//!
//! Bad rows are dropped with a log line; only an empty result is fatal.

use crate::config::ExperimentConfig;
use crate::error::{ConfigError, LoadError, RowError};
use curvex_core::{RotationDirection, TrialKind, TrialSpec};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const MIN_FIELDS: usize = 12;

/// Upper bound on `segments`; every curve allocates `segments + 1` samples.
pub const MAX_SEGMENTS: u32 = 100_000;

const FIELD_NAMES: [&str; MIN_FIELDS] = [
    "n",
    "R1",
    "R2",
    "width",
    "segments",
    "rotationSpeed",
    "rotationDirection",
    "arrowPointIndex",
    "isDashed",
    "dashSpeed",
    "isSelfRotating",
    "arrowDirection",
];

/// Trials in file order, plus the per-task tallies used to size stages.
#[derive(Debug, Clone, Default)]
pub struct TrialSet {
    pub trials: Vec<TrialSpec>,
    pub dashed: usize,
    pub solid: usize,
    pub skipped: usize,
}

/// Trials left for the measurement stages once practice has used its share.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MeasurementCounts {
    pub dashed: usize,
    pub solid: usize,
}

impl MeasurementCounts {
    pub fn for_kind(&self, kind: TrialKind) -> usize {
        match kind {
            TrialKind::Dashed => self.dashed,
            TrialKind::Solid => self.solid,
        }
    }
}

impl TrialSet {
    pub fn len(&self) -> usize {
        self.trials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }

    /// Raw counts minus the practice constants, saturating at zero.
    pub fn measurement_counts(&self, config: &ExperimentConfig) -> MeasurementCounts {
        let derive = |raw: usize, practice: usize, label: &str| {
            if raw < practice {
                warn!(
                    "only {} {} trials for {} practice trials; measurement count clamped to 0",
                    raw, label, practice
                );
            }
            raw.saturating_sub(practice)
        };
        MeasurementCounts {
            dashed: derive(self.dashed, config.practice_dashed_trials, "dashed"),
            solid: derive(self.solid, config.practice_solid_trials, "solid"),
        }
    }
}

pub fn parse_trials(text: &str) -> Result<TrialSet, LoadError> {
    let mut set = TrialSet::default();
    let rows = text.split(['\n', '\r']).filter(|row| !row.is_empty());

    for row in rows.skip(1) {
        match parse_row(row) {
            Ok(spec) => {
                match spec.kind() {
                    TrialKind::Dashed => set.dashed += 1,
                    TrialKind::Solid => set.solid += 1,
                }
                set.trials.push(spec);
            }
            Err(e @ (RowError::TooFewFields { .. } | RowError::UnknownDirection(_))) => {
                warn!("skipping row `{}`: {}", row, e);
                set.skipped += 1;
            }
            Err(e) => {
                error!("error parsing row `{}`: {}", row, e);
                set.skipped += 1;
            }
        }
    }

    if set.trials.is_empty() {
        return Err(LoadError::NoTrials {
            skipped: set.skipped,
        });
    }

    info!("loaded {} trials ({} skipped)", set.len(), set.skipped);
    info!("dashed trials: {}, solid trials: {}", set.dashed, set.solid);
    Ok(set)
}

pub fn parse_row(row: &str) -> Result<TrialSpec, RowError> {
    let fields: Vec<&str> = row.split(',').map(str::trim).collect();
    if fields.len() < MIN_FIELDS {
        return Err(RowError::TooFewFields {
            expected: MIN_FIELDS,
            found: fields.len(),
        });
    }

    let rotation_direction = RotationDirection::parse(fields[6])
        .ok_or_else(|| RowError::UnknownDirection(fields[6].to_string()))?;

    let spec = TrialSpec {
        n: number(&fields, 0)?,
        r1: number(&fields, 1)?,
        r2: number(&fields, 2)?,
        width: number(&fields, 3)?,
        segments: number(&fields, 4)?,
        rotation_speed: number(&fields, 5)?,
        rotation_direction,
        arrow_point_index: number(&fields, 7)?,
        is_dashed: flag(&fields, 8)?,
        dash_speed: number(&fields, 9)?,
        is_self_rotating: flag(&fields, 10)?,
        arrow_direction: number::<i32>(&fields, 11)? == 1,
    };

    if spec.n < 1 {
        return Err(RowError::OutOfRange {
            field: "n",
            reason: "must be at least 1",
        });
    }
    if spec.segments < 3 {
        return Err(RowError::OutOfRange {
            field: "segments",
            reason: "must be at least 3",
        });
    }
    if spec.segments > MAX_SEGMENTS {
        return Err(RowError::OutOfRange {
            field: "segments",
            reason: "must be at most 100000",
        });
    }
    if !(spec.width > 0.0) {
        return Err(RowError::OutOfRange {
            field: "width",
            reason: "must be positive",
        });
    }
    Ok(spec)
}

fn number<T: FromStr>(fields: &[&str], index: usize) -> Result<T, RowError> {
    fields[index]
        .parse()
        .map_err(|_| RowError::InvalidNumber {
            field: FIELD_NAMES[index],
            value: fields[index].to_string(),
        })
}

fn flag(fields: &[&str], index: usize) -> Result<bool, RowError> {
    let value = fields[index];
    if value.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if value.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(RowError::InvalidBool {
            field: FIELD_NAMES[index],
            value: value.to_string(),
        })
    }
}

/// Picks the lexicographically greatest name. Date-prefixed names therefore
/// select the newest file; nothing here looks at timestamps.
pub fn latest_name<'a, I>(names: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    names.into_iter().max()
}

/// Chooses the trial file in `dir` whose stem sorts last.
pub fn select_trial_file(dir: &Path) -> Result<PathBuf, ConfigError> {
    let entries = std::fs::read_dir(dir).map_err(|source| ConfigError::Read {
        path: dir.to_path_buf(),
        source,
    })?;

    let candidates: Vec<(String, PathBuf)> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
        })
        .filter_map(|path| {
            let stem = path.file_stem()?.to_str()?.to_string();
            Some((stem, path))
        })
        .collect();

    let latest = latest_name(candidates.iter().map(|(stem, _)| stem.as_str()))
        .ok_or_else(|| ConfigError::NoTrialFiles(dir.to_path_buf()))?;
    let chosen = candidates
        .iter()
        .find(|(stem, _)| stem == latest)
        .map(|(_, path)| path.clone())
        .ok_or_else(|| ConfigError::NoTrialFiles(dir.to_path_buf()))?;

    info!("selected trial file {}", chosen.display());
    Ok(chosen)
}

pub fn load_trial_file(path: &Path) -> Result<TrialSet, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_trials(&text)
}
