//! skyradar: CLI + web server for the live aircraft radar.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use comfy_table::{Cell, Table};

use radar_core::config::{self, Config};
use radar_core::{BoundingBox, ProjectedPoint, RadarController, RefreshOutcome, Registry};

mod feed;
mod live;
mod web;

use feed::{OpenSkyClient, SnapshotIngester};
use live::LiveRadar;

#[derive(Parser)]
#[command(name = "radar", version, about = "Live aircraft radar over a bounding box")]
struct Cli {
    /// Config file (default: ~/.skyradar/config.yaml)
    #[arg(long, global = true, env = "SKYRADAR_CONFIG")]
    config: Option<PathBuf>,

    /// Override the state-feed base URL
    #[arg(long, global = true)]
    feed_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch one snapshot and print the aircraft table
    Snapshot {
        /// Viewport as lon_min,lon_max,lat_min,lat_max
        #[arg(long, value_parser = parse_bbox, allow_hyphen_values = true)]
        bbox: Option<BoundingBox>,
    },

    /// Fetch one snapshot and print the info panel for a click
    Query {
        /// Click longitude
        #[arg(long, allow_hyphen_values = true)]
        x: f64,

        /// Click latitude
        #[arg(long, allow_hyphen_values = true)]
        y: f64,

        /// Viewport as lon_min,lon_max,lat_min,lat_max
        #[arg(long, value_parser = parse_bbox, allow_hyphen_values = true)]
        bbox: Option<BoundingBox>,

        /// Maximum click distance in degrees
        #[arg(long)]
        threshold: Option<f64>,
    },

    /// Serve the JSON API for map front-ends
    Serve {
        /// Bind address (default from config)
        #[arg(long)]
        host: Option<String>,

        /// Port (default from config)
        #[arg(long)]
        port: Option<u16>,

        /// Skip the refresh before listening
        #[arg(long)]
        no_initial_refresh: bool,
    },

    /// Manage the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write the default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the effective config
    Show,
}

fn parse_bbox(s: &str) -> Result<BoundingBox, String> {
    let parts: Vec<&str> = s.split(',').collect();
    let fields: [&str; 4] = parts
        .try_into()
        .map_err(|_| "expected lon_min,lon_max,lat_min,lat_max".to_string())?;
    let input = BoundingBox::parse_fields(fields).map_err(|e| e.to_string())?;
    BoundingBox::try_from(input).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config_path = cli.config.clone().unwrap_or_else(config::config_file);
    let mut config = config::load_config_from(&config_path);
    if let Some(url) = cli.feed_url {
        config.feed.base_url = url;
    }

    match cli.command {
        Commands::Snapshot { bbox } => cmd_snapshot(&config, bbox).await,
        Commands::Query {
            x,
            y,
            bbox,
            threshold,
        } => cmd_query(&config, x, y, bbox, threshold).await,
        Commands::Serve {
            host,
            port,
            no_initial_refresh,
        } => cmd_serve(&config, host, port, !no_initial_refresh).await,
        Commands::Config { action } => match action {
            ConfigAction::Init { force } => cmd_config_init(&config_path, force),
            ConfigAction::Show => print!("{}", config::serialize_config(&config)),
        },
    }
}

fn build_radar(config: &Config, bbox: Option<BoundingBox>, threshold: Option<f64>) -> LiveRadar {
    let bbox = bbox.unwrap_or_else(|| config.bbox());
    let threshold = threshold
        .filter(|t| t.is_finite() && *t > 0.0)
        .unwrap_or_else(|| config.hit_threshold());
    let controller = RadarController::new(bbox, threshold, config.map.clone());

    let client = OpenSkyClient::new(
        &config.feed.base_url,
        Duration::from_secs(config.feed.timeout_secs),
    );
    log::debug!("state feed at {}", client.base_url());
    LiveRadar::new(controller, SnapshotIngester::new(Arc::new(client)))
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

async fn cmd_snapshot(config: &Config, bbox: Option<BoundingBox>) {
    let radar = build_radar(config, bbox, None);
    let outcome = radar.refresh().await;
    report_failure(outcome.as_ref());

    let (registry, bbox) = {
        let r = radar.read();
        (r.registry(), *r.bbox())
    };
    println!("Viewport: {bbox}");
    if !registry.is_empty() {
        print_table(&registry);
    }
    println!("Total aircraft: {}", registry.len());
}

async fn cmd_query(
    config: &Config,
    x: f64,
    y: f64,
    bbox: Option<BoundingBox>,
    threshold: Option<f64>,
) {
    let radar = build_radar(config, bbox, threshold);
    let outcome = radar.refresh().await;
    report_failure(outcome.as_ref());

    let panel = radar.click(Some(ProjectedPoint::new(x, y)));
    println!("{panel}");
    match panel.hit {
        Some(hit) => println!("(index {}, {:.4} deg from click)", hit.index, hit.distance),
        None => println!("(no aircraft within {} deg)", radar.read().threshold()),
    }
}

async fn cmd_serve(config: &Config, host: Option<String>, port: Option<u16>, initial: bool) {
    let radar = Arc::new(build_radar(config, None, None));
    let host = host.unwrap_or_else(|| config.dashboard.host.clone());
    let port = port.unwrap_or(config.dashboard.port);

    if let Err(e) = web::serve(radar, &host, port, initial).await {
        eprintln!("Server error: {e}");
        std::process::exit(1);
    }
}

fn cmd_config_init(path: &Path, force: bool) {
    if path.exists() && !force {
        eprintln!("{} already exists (use --force to overwrite)", path.display());
        std::process::exit(1);
    }
    match config::save_config_to(&Config::default(), path) {
        Ok(()) => println!("Wrote {}", path.display()),
        Err(e) => {
            eprintln!("Error writing config: {e}");
            std::process::exit(1);
        }
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

fn report_failure(outcome: Option<&RefreshOutcome>) {
    if let Some(RefreshOutcome::Cleared { error }) = outcome {
        eprintln!("No aircraft data ({}): {error}", error.reason());
    }
}

fn fmt_opt(v: Option<f64>, precision: usize) -> String {
    v.map(|v| format!("{v:.precision$}"))
        .unwrap_or_else(|| "-".into())
}

fn print_table(registry: &Registry) {
    let mut table = Table::new();
    table.set_header(vec![
        "ICAO", "Callsign", "Country", "Lon", "Lat", "Alt (m)", "Speed (m/s)", "Track",
        "Squawk", "Last Contact",
    ]);

    for record in registry.records() {
        table.add_row(vec![
            Cell::new(&record.icao_id),
            Cell::new(record.callsign.as_deref().unwrap_or("-")),
            Cell::new(&record.origin_country),
            Cell::new(format!("{:.2}", record.longitude)),
            Cell::new(format!("{:.2}", record.latitude)),
            Cell::new(fmt_opt(record.baro_altitude, 0)),
            Cell::new(fmt_opt(record.velocity, 1)),
            Cell::new(fmt_opt(record.true_track, 0)),
            Cell::new(record.squawk.as_deref().unwrap_or("-")),
            Cell::new(radar_core::format_time_of_day(record.last_contact)),
        ]);
    }

    println!("{table}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use radar_core::BoundsInput;

    #[test]
    fn test_parse_bbox() {
        let bbox = parse_bbox("-12.5,3.25,49,61.5").unwrap();
        assert_eq!(bbox, BoundingBox::create(-12.5, 3.25, 49.0, 61.5).unwrap());
    }

    #[test]
    fn test_parse_bbox_rejects() {
        assert!(parse_bbox("1,2,3").is_err());
        assert!(parse_bbox("a,2,3,4").unwrap_err().contains("lon_min"));
        assert!(parse_bbox("5,-5,49,61").unwrap_err().contains("longitude"));
    }

    #[test]
    fn test_cli_parses_negative_bbox() {
        let cli = Cli::try_parse_from([
            "radar", "query", "--x", "-0.5", "--y", "51.5", "--bbox", "-1,1,50,52",
        ])
        .unwrap();
        match cli.command {
            Commands::Query { x, bbox, .. } => {
                assert_eq!(x, -0.5);
                assert_eq!(bbox.map(|b| b.lon_min()), Some(-1.0));
            }
            _ => panic!("expected query"),
        }
    }

    #[test]
    fn test_build_radar_threshold_override() {
        let config = Config::default();
        let radar = build_radar(&config, None, Some(0.5));
        assert_eq!(radar.read().threshold(), 0.5);
        let radar = build_radar(&config, None, Some(-1.0));
        assert_eq!(radar.read().threshold(), config.hit_threshold());
    }

    #[test]
    fn test_bounds_input_matches_config_order() {
        let input = BoundsInput {
            lon_min: -1.0,
            lon_max: 1.0,
            lat_min: 50.0,
            lat_max: 52.0,
        };
        let parsed = parse_bbox("-1,1,50,52").unwrap();
        assert_eq!(parsed.to_input(), input);
    }
}
