//! RustPace - Race Pacing & Segment Planning
//!
//! Command line entry point.
//!
//! ```bash
//! # Terrain mix of a course
//! rustpace profile leadville.gpx
//!
//! # Power targets at altitude
//! rustpace targets --ftp 250 --altitude 0.2
//!
//! # Full plan with aid stations, preset and goal time, as device JSON
//! rustpace plan leadville.gpx --aid "Pipeline@13.5" --aid "Twin Lakes@40@270" \
//!     --preset aggressive --goal-minutes 600
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use rustpace::course::import::load_course;
use rustpace::export::{export_csv, AthleteSummary, DeviceExport};
use rustpace::power::{PowerInputs, PowerTargetTable};
use rustpace::storage::config::{load_config, load_config_from, AppConfig};
use rustpace::{AidStation, CourseProfile, EffortLevel, EffortPreset, PlannerCommand, SegmentPlanner};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "rustpace",
    version,
    about = "Race pacing and segment planning",
    long_about = "Classifies course terrain, derives power targets from FTP and builds a segment pacing plan."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Configuration file (defaults to the platform data directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Print the terrain profile of a course
    Profile {
        /// Course file (.gpx or .json)
        course: PathBuf,
    },

    /// Print the power target table
    Targets {
        #[command(flatten)]
        power: PowerArgs,
    },

    /// Build a plan and print the device export
    Plan {
        /// Course file (.gpx or .json)
        course: PathBuf,

        /// Aid station as NAME@MILE or NAME@MILE@CUTOFF_MINUTES
        #[arg(long = "aid", value_parser = parse_aid_station)]
        aid_stations: Vec<AidStation>,

        /// Effort preset applied to every segment
        #[arg(long, value_enum)]
        preset: Option<PresetArg>,

        /// Goal finish time spread over segments by distance
        #[arg(long)]
        goal_minutes: Option<f64>,

        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Json)]
        format: Format,

        #[command(flatten)]
        power: PowerArgs,
    },
}

/// Overrides for the athlete's power inputs.
#[derive(clap::Args)]
struct PowerArgs {
    /// FTP in watts
    #[arg(long)]
    ftp: Option<f64>,

    /// Fraction of FTP lost at altitude (0.0-0.5)
    #[arg(long)]
    altitude: Option<f64>,

    /// Intensity factor for safe effort
    #[arg(long)]
    safe: Option<f64>,

    /// Intensity factor for tempo effort
    #[arg(long)]
    tempo: Option<f64>,

    /// Intensity factor for pushing effort
    #[arg(long)]
    pushing: Option<f64>,
}

impl PowerArgs {
    fn resolve(&self, config: &AppConfig) -> PowerInputs {
        let mut inputs = config.athlete.power_inputs();
        if let Some(ftp) = self.ftp {
            inputs.ftp_watts = ftp;
        }
        if let Some(altitude) = self.altitude {
            inputs.altitude_adjustment_factor = altitude;
        }
        if let Some(safe) = self.safe {
            inputs.intensity_factors.safe = safe;
        }
        if let Some(tempo) = self.tempo {
            inputs.intensity_factors.tempo = tempo;
        }
        if let Some(pushing) = self.pushing {
            inputs.intensity_factors.pushing = pushing;
        }
        inputs
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum PresetArg {
    Conservative,
    Tempo,
    Aggressive,
}

impl From<PresetArg> for EffortPreset {
    fn from(arg: PresetArg) -> Self {
        match arg {
            PresetArg::Conservative => EffortPreset::Conservative,
            PresetArg::Tempo => EffortPreset::Tempo,
            PresetArg::Aggressive => EffortPreset::Aggressive,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Json,
    Csv,
}

fn parse_aid_station(value: &str) -> Result<AidStation, String> {
    let mut parts = value.split('@');
    let name = parts
        .next()
        .filter(|n| !n.is_empty())
        .ok_or_else(|| format!("Missing aid station name in '{}'", value))?;
    let mile = parts
        .next()
        .ok_or_else(|| format!("Missing mile in '{}'", value))?
        .parse::<f64>()
        .map_err(|e| format!("Invalid mile in '{}': {}", value, e))?;
    if !mile.is_finite() || mile < 0.0 {
        return Err(format!("Mile must be a non-negative number in '{}'", value));
    }

    let station = AidStation::new(name, mile);
    match parts.next() {
        Some(cutoff) => {
            let minutes = cutoff
                .parse::<f64>()
                .map_err(|e| format!("Invalid cutoff in '{}': {}", value, e))?;
            if !minutes.is_finite() || minutes < 0.0 {
                return Err(format!("Cutoff must be a non-negative number in '{}'", value));
            }
            Ok(station.with_cutoff(minutes))
        }
        None => Ok(station),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting RustPace v{}", env!("CARGO_PKG_VERSION"));

    let config = match &cli.config {
        Some(path) => load_config_from(path),
        None => load_config(),
    }
    .context("Failed to load configuration")?;

    match cli.command {
        Command::Profile { course } => {
            let course = load_course(&course, Vec::new())
                .with_context(|| format!("Failed to load course {}", course.display()))?;
            let (distance, unit) = config.athlete.convert_distance(course.total_distance());
            println!("{}: {:.1} {}", course.name, distance, unit);
            print_profile(&course.profile(&config.planner.thresholds));
        }

        Command::Targets { power } => {
            let inputs = power.resolve(&config);
            inputs.validate().context("Invalid power inputs")?;
            let table = PowerTargetTable::calculate_with(
                inputs.ftp_watts,
                inputs.altitude_adjustment_factor,
                &inputs.intensity_factors,
                &config.planner.multipliers,
            );
            println!(
                "Base FTP {:.0} W, adjusted FTP {:.0} W",
                table.base_ftp, table.adjusted_ftp
            );
            println!("{:<8} {:>8} {:>8} {:>8} {:>8}", "effort", "NP", "climb", "flat", "descent");
            for effort in EffortLevel::ALL {
                println!(
                    "{:<8} {:>8.1} {:>8.1} {:>8.1} {:>8.1}",
                    effort.label(),
                    table.normalized_power.get(effort),
                    table.climbing_power.get(effort),
                    table.flat_power.get(effort),
                    table.descent_power.get(effort),
                );
            }
        }

        Command::Plan {
            course,
            aid_stations,
            preset,
            goal_minutes,
            format,
            power,
        } => {
            let course = load_course(&course, aid_stations)
                .with_context(|| format!("Failed to load course {}", course.display()))?;
            let inputs = power.resolve(&config);
            let mut planner = SegmentPlanner::new(course, &inputs, config.planner)
                .context("Invalid power inputs")?;

            if let Some(preset) = preset {
                planner.apply_preset(preset.into())?;
            }
            if let Some(total_minutes) = goal_minutes {
                planner.dispatch(PlannerCommand::DistributeGoalTime { total_minutes })?;
            }

            let athlete = AthleteSummary {
                name: config.athlete.name.clone(),
                ftp_watts: inputs.ftp_watts,
                weight_kg: config.athlete.weight_kg as f64,
            };
            let export = DeviceExport::from_planner(&planner, athlete)?;

            match format {
                Format::Json => println!("{}", export.to_json()?),
                Format::Csv => print!("{}", export_csv(&export.checkpoints)?),
            }
        }
    }

    Ok(())
}

fn print_profile(profile: &CourseProfile) {
    if profile.is_empty() {
        println!("No terrain data");
        return;
    }

    println!(
        "Climbing {}%  Flat {}%  Descent {}%",
        profile.climbing_pct, profile.flat_pct, profile.descent_pct
    );
    println!(
        "Avg climb {:.1}%  Avg descent {:.1}%",
        profile.avg_climb_grade, profile.avg_descent_grade
    );
    println!(
        "Gain {:.0} ft  Loss {:.0} ft",
        profile.elevation_gain_ft, profile.elevation_loss_ft
    );
}
