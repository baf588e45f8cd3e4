use crate::state::{TrainState, WorldState};
use serde::Serialize;

/// Server → Client: full-state broadcast.
///
/// Sent once on connect and again after every successful mutation. Always
/// carries the entire registry, never a diff.
#[derive(Debug, Clone, Serialize)]
pub struct TrainUpdateMessage {
    #[serde(rename = "type")]
    pub msg_type: String,
    pub timestamp: f64,
    pub trains: Vec<TrainState>,
}

impl From<WorldState> for TrainUpdateMessage {
    fn from(world: WorldState) -> Self {
        Self {
            msg_type: "train_update".to_string(),
            timestamp: world.timestamp,
            trains: world.trains,
        }
    }
}
