mod config;
mod elements;
mod render;
mod tracker;
mod web;

use chrono::Utc;
use clap::{Parser, Subcommand};
use std::io;
use std::process::ExitCode;
use tokio::sync::oneshot;

use crate::config::{Config, Overrides};
use crate::elements::{ElementSource, TleFileSource};
use crate::render::{Fanout, JsonWriter, MapFile};
use crate::tracker::{needs_refresh, Tracker};
use crate::web::{bind, run_server, AppState, LiveFrame};

#[derive(Parser)]
#[command(name = "groundtrack")]
#[command(about = "Live position and ground track of a single satellite")]
struct Cli {
    /// YAML configuration file
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Length of the predicted ground track
    #[arg(long, env = "ORBIT_DURATION_MINUTES", global = true)]
    orbit_duration_minutes: Option<u32>,

    /// Pause between two tracking cycles
    #[arg(long, env = "UPDATE_INTERVAL_SECONDS", global = true)]
    update_interval_seconds: Option<u64>,

    /// Age after which the element file is downloaded again
    #[arg(long, env = "STALENESS_THRESHOLD_DAYS", global = true)]
    staleness_threshold_days: Option<f64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Track the satellite until interrupted
    Run,
    /// Compute one frame and print it as JSON
    Predict {
        #[arg(long)]
        pretty: bool,
    },
    /// Show the age and epoch of the stored elements
    Status {
        /// Download fresh elements if the stored ones are stale
        #[arg(long)]
        refresh: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let overrides = Overrides {
        orbit_duration_minutes: cli.orbit_duration_minutes,
        update_interval_seconds: cli.update_interval_seconds,
        staleness_threshold_days: cli.staleness_threshold_days,
    };

    let config = match Config::load(cli.config.as_deref(), &overrides) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Run => run(config).await,
        Commands::Predict { pretty } => predict(config, pretty),
        Commands::Status { refresh } => status(config, refresh),
    }
}

fn element_source(config: &Config) -> TleFileSource {
    TleFileSource::new(
        config.satellite.tle_file.clone(),
        config.satellite.tle_url(),
        config.satellite.norad_id,
    )
}

async fn run(config: Config) -> ExitCode {
    let settings = config.track_settings();

    let mut sinks = Fanout::new();
    if config.map.enabled {
        sinks = sinks.with(MapFile::new(
            config.map.path.clone(),
            config.map.zoom,
            settings.update_interval,
        ));
    }
    if let Some(web) = &config.web {
        let live = LiveFrame::new();
        sinks = sinks.with(live.clone());

        let state = AppState {
            live,
            refresh: settings.update_interval,
        };
        let listener = match bind(&web.bind).await {
            Ok(listener) => listener,
            Err(e) => {
                eprintln!("ERROR: Cannot serve the web view on {}: {}", web.bind, e);
                return ExitCode::FAILURE;
            }
        };
        tokio::spawn(async move {
            if let Err(e) = run_server(listener, state).await {
                log::error!("Web view stopped: {}", e);
            }
        });
    }

    let mut tracker = Tracker::new(element_source(&config), sinks, settings);
    if let Err(e) = tracker.bootstrap(Utc::now()) {
        eprintln!("ERROR: {}\nQuitting the program.", e);
        return ExitCode::FAILURE;
    }

    let (stop_tx, stop_rx) = oneshot::channel();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                let _ = stop_tx.send(());
            }
            Err(e) => {
                log::warn!("Cannot listen for Ctrl-C: {}", e);
                // A dropped sender would read as a stop request.
                let _stop_tx = stop_tx;
                std::future::pending::<()>().await
            }
        }
    });

    match tracker.run(stop_rx).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("ERROR: {}\nQuitting the program.", e);
            ExitCode::FAILURE
        }
    }
}

fn predict(config: Config, pretty: bool) -> ExitCode {
    let settings = config.track_settings();
    let sink = JsonWriter::new(io::stdout().lock(), pretty);
    let mut tracker = Tracker::new(element_source(&config), sink, settings);

    match tracker.run_cycle(Utc::now()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn status(config: Config, refresh: bool) -> ExitCode {
    let mut source = element_source(&config);
    let threshold = config.tracking.staleness_threshold_days;
    let now = Utc::now();

    let age = match source.age_days(now) {
        Ok(age) => age,
        Err(e) => {
            eprintln!("Error reading {}: {}", source.path().display(), e);
            return ExitCode::FAILURE;
        }
    };
    match age {
        Some(age) => println!(
            "{}: {:.2} days old ({})",
            source.path().display(),
            age,
            if needs_refresh(Some(age), threshold) { "stale" } else { "fresh" }
        ),
        None => println!("{}: missing", source.path().display()),
    }

    if refresh && needs_refresh(age, threshold) {
        if let Err(e) = source.refresh() {
            eprintln!("ERROR: Failed to download the TLE data: {}", e);
            return ExitCode::FAILURE;
        }
        println!("Downloaded fresh elements from {}", config.satellite.tle_url());
    }

    match source.load() {
        Ok(set) => {
            println!("  {} (NORAD {}) from {}", set.name, set.norad_id, set.tle_source);
            println!(
                "  epoch {} ({:.2} days ago)",
                set.epoch,
                set.epoch_age_days(now)
            );
            println!("  orbital period {:.1} minutes", set.orbital_period_minutes());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error loading elements: {}", e);
            ExitCode::FAILURE
        }
    }
}
