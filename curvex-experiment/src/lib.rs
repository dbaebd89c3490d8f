pub mod config;
pub mod drivers;
pub mod error;
pub mod loader;
pub mod protocol;
pub mod recorder;
pub mod routine;
pub mod script;
pub mod session;
pub mod state;

pub use config::ExperimentConfig;
pub use drivers::{Drivers, DriversBuilder};
pub use error::{ConfigError, LoadError, RecordError, RowError};
pub use loader::{MeasurementCounts, TrialSet, load_trial_file, parse_trials, select_trial_file};
pub use recorder::{SessionSummary, TrialRecorder, parse_outcomes};
pub use session::SessionState;
pub use state::{Awaiting, ExperimentController, ExperimentEvent};
