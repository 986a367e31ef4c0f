mod abort;
mod elements;
mod predict;
mod service;
mod web;

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use clap::{Parser, Subcommand};
use std::fs;
use std::process::ExitCode;

use crate::abort::Cancellation;
use crate::elements::OrbitalElementSet;
use crate::predict::{
    estimate_period, find_passes, ObserverSite, Propagator, SearchOptions,
    DEFAULT_MIN_ELEVATION_DEG,
};

#[derive(Parser)]
#[command(name = "iss-tracker")]
#[command(about = "ISS position, speed and visible pass prediction")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve {
        #[arg(short, long, default_value = "config.yaml")]
        config: String,
    },
    /// Predict passes offline from a TLE file
    Passes {
        #[arg(long)]
        tle: String,
        /// Pick this object from a multi-satellite file
        #[arg(long)]
        norad_id: Option<u64>,
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        #[arg(long, default_value_t = 0.0)]
        alt: f64,
        #[arg(long, default_value_t = 24)]
        hours: i64,
        #[arg(long, default_value_t = DEFAULT_MIN_ELEVATION_DEG)]
        min_elevation: f64,
        /// IANA timezone for the printed times
        #[arg(long, default_value = "UTC")]
        timezone: String,
    },
    /// Validate a TLE file and print its orbit
    Check {
        #[arg(long)]
        tle: String,
        #[arg(long)]
        norad_id: Option<u64>,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config } => serve(&config),
        Commands::Passes {
            tle,
            norad_id,
            lat,
            lon,
            alt,
            hours,
            min_elevation,
            timezone,
        } => passes(&tle, norad_id, lat, lon, alt, hours, min_elevation, &timezone),
        Commands::Check { tle, norad_id } => check(&tle, norad_id),
    }
}

fn serve(path: &str) -> ExitCode {
    let config = match web::Config::from_file(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config {}: {}", path, e);
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(web::run_server(config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("Server failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_elements(path: &str, norad_id: Option<u64>) -> Result<OrbitalElementSet, String> {
    let content =
        fs::read_to_string(path).map_err(|e| format!("Error reading {}: {}", path, e))?;
    let parsed = match norad_id {
        Some(id) => OrbitalElementSet::find_in(&content, id),
        None => OrbitalElementSet::parse(&content),
    };
    parsed.map_err(|e| format!("Invalid TLE in {}: {}", path, e))
}

fn window_end(start: DateTime<Utc>, hours: i64) -> Result<DateTime<Utc>, String> {
    Duration::try_hours(hours)
        .filter(|span| *span > Duration::zero())
        .and_then(|span| start.checked_add_signed(span))
        .ok_or_else(|| format!("--hours must be a positive number of hours, got {}", hours))
}

#[allow(clippy::too_many_arguments)]
fn passes(
    path: &str,
    norad_id: Option<u64>,
    lat: f64,
    lon: f64,
    alt: f64,
    hours: i64,
    min_elevation: f64,
    timezone: &str,
) -> ExitCode {
    let elements = match load_elements(path, norad_id) {
        Ok(e) => e,
        Err(msg) => {
            eprintln!("{}", msg);
            return ExitCode::FAILURE;
        }
    };
    let tz: Tz = match timezone.parse() {
        Ok(tz) => tz,
        Err(e) => {
            eprintln!("Unknown timezone {}: {}", timezone, e);
            return ExitCode::FAILURE;
        }
    };
    let observer = match ObserverSite::new("observer", lat, lon, alt) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let start = Utc::now();
    let end = match window_end(start, hours) {
        Ok(end) => end,
        Err(msg) => {
            eprintln!("{}", msg);
            return ExitCode::FAILURE;
        }
    };
    let found = match find_passes(
        &Propagator::default(),
        &elements,
        &observer,
        start,
        end,
        min_elevation,
        &SearchOptions::default(),
        &Cancellation::new(),
    ) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Prediction failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    println!(
        "{} passes above {:.0} deg in the next {} h ({})",
        found.len(),
        min_elevation,
        hours,
        tz.name()
    );
    for (i, pass) in found.iter().enumerate() {
        println!(
            "  {:2}: {}  {} -> {}  max {:5.1} deg  {:4.0} s  from {} to {}",
            i + 1,
            pass.rise.with_timezone(&tz).format("%Y-%m-%d"),
            pass.rise.with_timezone(&tz).format("%H:%M:%S"),
            pass.set.with_timezone(&tz).format("%H:%M:%S"),
            pass.peak_elevation_deg,
            pass.duration_seconds,
            pass.rise_direction,
            pass.set_direction
        );
    }
    ExitCode::SUCCESS
}

fn check(path: &str, norad_id: Option<u64>) -> ExitCode {
    let elements = match load_elements(path, norad_id) {
        Ok(e) => e,
        Err(msg) => {
            eprintln!("{}", msg);
            return ExitCode::FAILURE;
        }
    };

    let period = estimate_period(&elements);
    println!("TLE is valid");
    println!("  name:          {}", elements.name().unwrap_or("-"));
    println!("  norad id:      {}", elements.norad_id());
    println!("  epoch:         {}", elements.epoch());
    println!(
        "  period:        {:.2} min",
        period.num_milliseconds() as f64 / 60_000.0
    );
    println!("  inclination:   {:.4} deg", elements.inclination_deg());
    println!("  eccentricity:  {:.7}", elements.eccentricity());

    let propagator = Propagator::default();
    if propagator.check_horizon(&elements, Utc::now()).is_err() {
        println!(
            "  usable until:  {} (stale now)",
            propagator.valid_until(&elements)
        );
    } else {
        println!("  usable until:  {}", propagator.valid_until(&elements));
    }
    ExitCode::SUCCESS
}
