//! `ringsieve` – run the ring outlier filter over a recorded scan.
//!
//! 1. Loads `~/.ringsieve/config.toml` (or `--config`), applying
//!    `RINGSIEVE_*` environment overrides.
//! 2. Reads a raw `PointXYZIRADRT` scan.
//! 3. Filters it and writes the accepted points, and optionally the noise
//!    points and the visibility grid.
//! 4. Prints per-scan statistics and the visibility score.

mod config;
mod scan_io;

use std::path::PathBuf;

use clap::Parser;
use colored::Colorize;
use tracing::{info, warn};

use ringsieve_perception::{FilterOutput, RingOutlierFilter};

#[derive(Parser, Debug)]
#[command(name = "ringsieve", version)]
#[command(about = "Remove rain, dust and spray returns from spinning-LIDAR scans")]
struct Cli {
    /// Configuration file [default: ~/.ringsieve/config.toml]
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the default configuration to the config path and exit
    #[arg(long)]
    write_default_config: bool,

    /// Raw PointXYZIRADRT scan (48-byte records)
    #[arg(short, long, required_unless_present = "write_default_config")]
    input: Option<PathBuf>,

    /// Frame id of the input scan
    #[arg(long, default_value = "lidar")]
    frame_id: String,

    /// The input scan is big-endian
    #[arg(long)]
    big_endian: bool,

    /// Where to write accepted points (packed x, y, z, intensity)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Where to write rejected points
    #[arg(long)]
    noise_output: Option<PathBuf>,

    /// Where to write the visibility grid (PGM)
    #[arg(long)]
    grid_output: Option<PathBuf>,

    /// Enable noise output and visibility regardless of the config file
    #[arg(long)]
    publish_noise: bool,
}

fn main() {
    // ── Structured logging ────────────────────────────────────────────────
    // RUST_LOG selects the level (default "info"); RINGSIEVE_LOG_FORMAT=json
    // switches to newline-delimited JSON.
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    if std::env::var("RINGSIEVE_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .compact()
            .init();
    }

    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    let config_path = cli.config.clone().unwrap_or_else(config::config_path);

    if cli.write_default_config {
        config::save_to(&config::Config::default(), &config_path)?;
        println!(
            "  {} Default config written to {}",
            "✓".green().bold(),
            config_path.display().to_string().bold()
        );
        return Ok(());
    }

    let Some(input) = cli.input.as_ref() else {
        return Err("--input is required".to_string());
    };

    let mut cfg = config::load_or_default(&config_path)?;
    info!(path = %config_path.display(), "configuration loaded");
    if cli.publish_noise {
        cfg.filter.publish_noise_points = true;
    }

    let transform = cfg.transform.as_ref().map(config::TransformConfig::to_rigid);
    let filter = RingOutlierFilter::new(cfg.filter).map_err(|e| e.to_string())?;

    let scan = scan_io::read_scan(input, &cli.frame_id, cli.big_endian)?;
    let out = filter
        .filter(&scan, transform.as_ref())
        .map_err(|e| e.to_string())?;

    print_summary(&out);

    if let Some(path) = &cli.output {
        scan_io::write_cloud(path, &out.points)?;
    }
    match (&cli.noise_output, &out.noise) {
        (Some(path), Some(noise)) => scan_io::write_cloud(path, noise)?,
        (Some(_), None) => warn!("--noise-output given but noise output is disabled"),
        _ => {}
    }
    match (&cli.grid_output, &out.visibility) {
        (Some(path), Some(report)) => scan_io::write_grid(path, report)?,
        (Some(_), None) => warn!("--grid-output given but noise output is disabled"),
        _ => {}
    }
    Ok(())
}

fn print_summary(out: &FilterOutput) {
    let s = &out.stats;
    println!();
    println!("  {}  {}", "Frame".bold(), out.points.header.frame_id);
    println!("  {}  {}", "Input points".bold(), s.input_points);
    println!(
        "  {}  {} in {} of {} walks",
        "Accepted".bold(),
        s.accepted_points.to_string().green(),
        s.cluster_walks,
        s.walks
    );
    println!("  {}  {}", "Rejected".bold(), s.rejected_points.to_string().yellow());
    if s.skipped_ring + s.dropped_capacity > 0 {
        println!(
            "  {}  {} (bad ring), {} (ring full)",
            "Skipped".bold(),
            s.skipped_ring.to_string().red(),
            s.dropped_capacity.to_string().red()
        );
    }
    if let Some(report) = &out.visibility {
        println!(
            "  {}  {:.3} ({} of {} cells filled)",
            "Visibility".bold(),
            report.visibility,
            report.filled_cells,
            report.occupancy.len()
        );
    }
    println!();
}
