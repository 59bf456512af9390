use clap::Parser;
use roadmap_lib::{Config, MAX_DEPTH_LIMIT, ViewportConfig};

#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
/// Roadmap Viewer - Replays a pan/zoom session over a synthetic road network
pub struct Settings {
    /// Window width in pixels
    #[clap(long, default_value = "1024")]
    pub width: u32,

    /// Window height in pixels
    #[clap(long, default_value = "768")]
    pub height: u32,

    /// Fraction of the map shown at start (0-1]
    #[clap(short, long, default_value = "1.0")]
    pub zoom: f64,

    /// Items a quad-tree leaf holds before it splits
    #[clap(long, default_value = "400")]
    pub capacity: usize,

    /// Quad-tree depth limit, counting the root
    #[clap(
        long,
        default_value = "15",
        value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_DEPTH_LIMIT))
    )]
    pub max_depth: u32,

    /// Intersections per side of the synthetic street grid
    #[clap(short, long, default_value = "200")]
    pub grid_size: u64,

    /// Distance between neighbouring intersections in map units
    #[clap(long, default_value = "100.0")]
    pub spacing: f64,

    /// Pixels moved per scripted pan step
    #[clap(long, default_value = "48.0")]
    pub pan_step: f64,

    /// Number of scripted pan steps
    #[clap(long, default_value = "8")]
    pub pan_steps: usize,
}

impl Settings {
    /// Index configuration derived from the CLI
    pub fn network_config(&self) -> Config {
        Config {
            capacity: self.capacity,
            max_depth: self.max_depth,
            ..Config::default()
        }
    }

    pub fn viewport_config(&self) -> ViewportConfig {
        ViewportConfig {
            initial_zoom: self.zoom,
            ..ViewportConfig::default()
        }
    }
}
