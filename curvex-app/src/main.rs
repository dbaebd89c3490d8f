mod app;
pub use app::App;

use ab_glyph::FontVec;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use curvex_experiment::{ExperimentConfig, load_trial_file, select_trial_file};
use log::{info, warn};
use std::path::{Path, PathBuf};

const FALLBACK_FONTS: [&str; 3] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
];

#[derive(Parser)]
#[command(name = "curvex")]
#[command(about = "Rotating-curve perception experiment", long_about = None)]
struct Cli {
    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a full session
    Run {
        /// TOML experiment configuration
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Directory searched for trial-definition files
        #[arg(long, value_name = "DIR")]
        trials_dir: Option<PathBuf>,

        /// Where the result file is written
        #[arg(long, value_name = "DIR")]
        output_dir: Option<PathBuf>,

        /// Use this trial file instead of the newest one in the trial directory
        #[arg(long, value_name = "FILE")]
        trial_file: Option<PathBuf>,

        /// TrueType font for the instruction panel
        #[arg(long, value_name = "FILE")]
        font: Option<PathBuf>,

        /// Pace frames at this rate instead of the monitor's refresh rate
        #[arg(long, value_name = "HZ")]
        frame_rate: Option<f64>,
    },

    /// Parse a trial file and report what a session would run
    Check {
        file: PathBuf,

        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&cli.log_level))
        .init();

    match cli.command {
        Commands::Run {
            config,
            trials_dir,
            output_dir,
            trial_file,
            font,
            frame_rate,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(dir) = trials_dir {
                config.trials_dir = dir;
            }
            if let Some(dir) = output_dir {
                config.output_dir = dir;
            }
            config.validate()?;

            let path = match trial_file {
                Some(path) => path,
                None => select_trial_file(&config.trials_dir)?,
            };
            info!("loading trials from {}", path.display());
            let trials = load_trial_file(&path)
                .with_context(|| format!("loading trials from {}", path.display()))?;

            let app = App::new(config, trials, load_font(font.as_deref()), frame_rate)?;
            app.run()?;
        }
        Commands::Check { file, config } => {
            let config = load_config(config.as_deref())?;
            let trials = load_trial_file(&file)
                .with_context(|| format!("loading trials from {}", file.display()))?;
            let counts = trials.measurement_counts(&config);
            println!("{}", file.display());
            println!("  usable rows:   {}", trials.len());
            println!("  skipped rows:  {}", trials.skipped);
            println!("  dashed / solid: {} / {}", trials.dashed, trials.solid);
            println!(
                "  measured after practice: {} dashed, {} solid",
                counts.dashed, counts.solid
            );
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<ExperimentConfig> {
    match path {
        Some(path) => ExperimentConfig::load(path)
            .with_context(|| format!("reading configuration {}", path.display())),
        None => Ok(ExperimentConfig::default()),
    }
}

fn load_font(path: Option<&Path>) -> Option<FontVec> {
    let candidates = path
        .map(Path::to_path_buf)
        .into_iter()
        .chain(FALLBACK_FONTS.iter().map(PathBuf::from));
    for candidate in candidates {
        let Ok(bytes) = std::fs::read(&candidate) else {
            continue;
        };
        match FontVec::try_from_vec(bytes) {
            Ok(font) => {
                info!("using font {}", candidate.display());
                return Some(font);
            }
            Err(e) => warn!("cannot use font {}: {}", candidate.display(), e),
        }
    }
    None
}
