//! Optional background demo loop.
//!
//! Periodically moves each train with a `target` a small step toward it,
//! proportional to elapsed time and current speed, then submits the moves
//! as ordinary update records through the same merge-and-broadcast path
//! external producers use. Off by default.

use crate::state::{TrainRegistry, UpdateRecord, WorldState};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Run the stepping loop forever. Spawned as a background task when
/// `[stepper] enabled = true`.
pub async fn run(registry: Arc<TrainRegistry>, interval: Duration) {
    info!(
        interval_seconds = interval.as_secs_f64(),
        "Demo stepper started"
    );

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let world = registry.snapshot();
        let moves = plan_moves(&world, interval.as_secs_f64());
        if moves.is_empty() {
            continue;
        }

        // All moves target existing trains, so this cannot hit the strict
        // new-train path; still, never let the loop die on a rejection
        if let Err(e) = registry.apply_updates(&moves) {
            warn!(error = %e, "Stepper update rejected");
        }
    }
}

/// Compute one step toward the target for every train that has one
fn plan_moves(world: &WorldState, interval_seconds: f64) -> Vec<UpdateRecord> {
    let mut moves = Vec::new();

    for train in &world.trains {
        let Some(target) = train.target else {
            continue;
        };

        let dist_km = haversine_km(train.lat, train.lon, target.lat, target.lon);
        if !dist_km.is_finite() {
            continue;
        }

        let step_km = (train.speed_kmh * interval_seconds / 3600.0).max(0.01);

        let (lat, lon) = if step_km >= dist_km {
            (target.lat, target.lon)
        } else {
            // Linear interpolation, fine for short steps
            let frac = step_km / dist_km;
            (
                train.lat + (target.lat - train.lat) * frac,
                train.lon + (target.lon - train.lon) * frac,
            )
        };

        let mut fields = Map::new();
        fields.insert("id".to_string(), Value::from(train.id.clone()));
        fields.insert("lat".to_string(), Value::from(lat));
        fields.insert("lon".to_string(), Value::from(lon));
        moves.push(UpdateRecord::new(fields));
    }

    moves
}

/// Great-circle distance in kilometers (haversine formula)
fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    const EARTH_RADIUS_KM: f64 = 6371.0;

    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();

    let a = (dlat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}
