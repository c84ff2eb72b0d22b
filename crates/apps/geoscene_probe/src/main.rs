use std::error::Error;
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use clap::Parser;
use formats::{BuildingCatalog, GeoSceneConfig, TileStyle};
use foundation::math::{LatLng, LatLngAlt};
use runtime::MessagePoster;
use scene::headless::{HeadlessResources, RecordingScene};
use scene::{GeoEngine, GeoMessage, Translation, TranslationFunction};
use serde::Serialize;
use streaming::{TileCoord, TileProvider};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_ALT_M: f64 = 5.0;
const DEFAULT_START: &str = "48.8708735,2.3036656";
const DEFAULT_ROUTE: [&str; 5] = [
    "48.870307,2.302872",
    "48.869571,2.302226",
    "48.869250,2.302792",
    "48.869871,2.304026",
    "48.870706,2.304672",
];

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Flies a camera along a route through a headless geo scene"
)]
struct Args {
    /// Scene config (JSON); built-in defaults when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Tile style sheet (JSON)
    #[arg(long)]
    style: Option<PathBuf>,

    /// Building catalog: {"<id>": {"lat": .., "lng": ..}}
    #[arg(long)]
    buildings: Option<PathBuf>,

    /// Start position: lat,lng[,alt]
    #[arg(long, default_value = DEFAULT_START, value_parser = parse_waypoint)]
    start: Waypoint,

    /// Route waypoint lat,lng[,alt]; repeat for more (default: a short Paris loop)
    #[arg(long = "waypoint", value_parser = parse_waypoint)]
    waypoints: Vec<Waypoint>,

    /// Camera translation per waypoint (seconds); negative places instantly
    #[arg(long, default_value_t = 0.5, allow_negative_numbers = true)]
    translation_s: f64,

    /// Engine steps per waypoint
    #[arg(long, default_value_t = 3)]
    steps_per_waypoint: u32,

    /// Simulated tile load latency (milliseconds)
    #[arg(long, default_value_t = 2)]
    latency_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Waypoint {
    position: LatLng,
    alt: Option<f64>,
}

impl Waypoint {
    fn at(self, default_alt: f64) -> LatLngAlt {
        LatLngAlt::new(
            self.position.lat,
            self.position.lng,
            self.alt.unwrap_or(default_alt),
        )
    }
}

fn parse_waypoint(raw: &str) -> Result<Waypoint, String> {
    let parts = raw
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid coordinate in {raw:?}: {e}"))?;
    let (lat, lng, alt) = match parts.as_slice() {
        [lat, lng] => (*lat, *lng, None),
        [lat, lng, alt] => (*lat, *lng, Some(*alt)),
        _ => return Err(format!("expected lat,lng[,alt], got {raw:?}")),
    };
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
        return Err(format!("coordinates out of range: {raw:?}"));
    }
    Ok(Waypoint {
        position: LatLng::new(lat, lng),
        alt,
    })
}

/// Tile provider that hands requests to a worker thread, which reports
/// completion back through the engine's message queue.
///
/// Stands in for a network tile fetcher: a plain thread with a fixed
/// latency, since the probe has no async runtime.
struct ThreadedTileLoader {
    requests: mpsc::Sender<TileCoord>,
}

impl TileProvider for ThreadedTileLoader {
    fn on_tile_requested(&mut self, coord: TileCoord) {
        if self.requests.send(coord).is_err() {
            warn!(?coord, "tile loader stopped, dropping request");
        }
    }
}

fn spawn_tile_loader(
    poster: MessagePoster<GeoMessage>,
    latency: Duration,
) -> (ThreadedTileLoader, JoinHandle<usize>) {
    let (tx, rx) = mpsc::channel::<TileCoord>();
    let worker = thread::spawn(move || {
        let mut loaded = 0;
        for coord in rx {
            thread::sleep(latency);
            poster.post(GeoMessage::TileAvailable {
                x: coord.x,
                y: coord.y,
                zoom: coord.z,
            });
            loaded += 1;
        }
        loaded
    });
    (ThreadedTileLoader { requests: tx }, worker)
}

#[derive(Debug, Serialize)]
struct Summary {
    origin: [f64; 2],
    camera: Option<[f64; 3]>,
    window_center: Option<[i64; 2]>,
    tiles: Vec<TileCoord>,
    resident_tiles: usize,
    tiles_loaded: usize,
    stale_tiles: usize,
    frames: u64,
    entities: usize,
    entities_in_scene: usize,
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => GeoSceneConfig::load(path)?,
        None => GeoSceneConfig::default(),
    };
    let latency = Duration::from_millis(args.latency_ms);

    let mut engine = GeoEngine::new(RecordingScene::new(), config);
    if let Some(path) = &args.style {
        engine.manager_mut().apply_style(TileStyle::load(path)?);
    }
    let (loader, worker) = spawn_tile_loader(engine.poster(), latency);
    engine.manager_mut().set_tile_provider(Some(Box::new(loader)));

    let start = args.start.at(DEFAULT_ALT_M);
    engine.init(start);
    if let Some(path) = &args.buildings {
        let catalog = BuildingCatalog::load(path)?;
        engine.load_buildings(&mut HeadlessResources::permissive(), &catalog)?;
    }

    let route = if args.waypoints.is_empty() {
        DEFAULT_ROUTE
            .iter()
            .map(|raw| parse_waypoint(raw))
            .collect::<Result<Vec<_>, _>>()?
    } else {
        args.waypoints.clone()
    };

    let mut stale_tiles = 0;
    for waypoint in &route {
        let coords = waypoint.at(start.alt);
        info!(lat = coords.lat, lng = coords.lng, "flying to waypoint");
        engine.post(GeoMessage::PlaceCamera {
            coords,
            translation: Translation::from_duration(args.translation_s, TranslationFunction::Ease),
        });
        for _ in 0..args.steps_per_waypoint.max(1) {
            stale_tiles += engine.step().stale_tiles;
            thread::sleep(latency);
        }
    }

    // Stop the loader, let it flush, then apply what it reported.
    engine.manager_mut().set_tile_provider(None);
    let tiles_loaded = worker.join().map_err(|_| "tile loader panicked")?;
    stale_tiles += engine.step().stale_tiles;

    let manager = engine.manager();
    let summary = Summary {
        origin: [manager.origin().lat, manager.origin().lng],
        camera: manager.camera_coords().map(|c| [c.lat, c.lng, c.alt]),
        window_center: manager.window_center().map(|c| [c.x, c.y]),
        tiles: manager.grid().tiles().map(|t| t.coord()).collect(),
        resident_tiles: manager
            .grid()
            .tiles()
            .filter(|t| t.residency().is_resident())
            .count(),
        tiles_loaded,
        stale_tiles,
        frames: manager.scene().frames(),
        entities: manager.geo_entity_count(),
        entities_in_scene: manager
            .registry()
            .iter()
            .filter(|(_, e)| e.in_scene())
            .count(),
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::parse_waypoint;
    use foundation::math::LatLngAlt;

    #[test]
    fn waypoints_take_an_optional_altitude() {
        let wp = parse_waypoint("48.87, 2.30").expect("valid");
        assert_eq!(wp.at(7.0), LatLngAlt::new(48.87, 2.30, 7.0));
        let wp = parse_waypoint("48.87,2.30,120").expect("valid");
        assert_eq!(wp.at(7.0), LatLngAlt::new(48.87, 2.30, 120.0));

        assert!(parse_waypoint("48.87").is_err());
        assert!(parse_waypoint("95,0").is_err());
        assert!(parse_waypoint("a,b").is_err());
    }
}
