use crate::state::train::{TrainState, WorldState};
use anyhow::{Context, Result};
use chrono::Utc;
use std::path::Path;
use tracing::info;

/// Load the initial world state.
///
/// Reads `{timestamp, trains: [...]}` JSON from the seed file when it
/// exists; otherwise falls back to the built-in two-train default. A seed
/// file that exists but fails to parse is a startup error.
pub fn load_world(path: Option<&Path>) -> Result<WorldState> {
    match path {
        Some(p) if p.exists() => {
            let contents = std::fs::read_to_string(p)
                .with_context(|| format!("Failed to read seed file {}", p.display()))?;
            let world: WorldState = serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse seed file {}", p.display()))?;

            info!(
                path = %p.display(),
                trains = world.trains.len(),
                "Loaded seed state"
            );
            Ok(world)
        }
        _ => {
            info!("No seed file, using built-in default state");
            Ok(default_world())
        }
    }
}

/// Built-in fallback: two demo trains on the southern Indian network
pub fn default_world() -> WorldState {
    let train = |id: &str, name: &str, route: &str, lat, lon, speed_kmh| TrainState {
        id: id.to_string(),
        name: name.to_string(),
        route: route.to_string(),
        lat,
        lon,
        speed_kmh,
        signal: 1,
        track_id: 2,
        target: None,
    };

    WorldState {
        timestamp: Utc::now().timestamp_micros() as f64 / 1_000_000.0,
        trains: vec![
            train("T001", "Train_A", "Chennai-Bangalore", 13.0827, 80.2707, 80.0),
            train("T002", "Train_B", "Kovai-Madurai", 12.9827, 80.0707, 70.0),
        ],
    }
}
