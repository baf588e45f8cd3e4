use crate::state::train::{coerce_f64, coerce_i64, MergeError, TrainState, UpdateRecord, WorldState};
use chrono::Utc;
use std::sync::Mutex;
use tokio::sync::broadcast;
use tracing::debug;

/// Result of applying one update batch
#[derive(Clone, Copy, Debug)]
pub struct MergeOutcome {
    /// True if at least one field actually changed
    pub changed: bool,
    /// Registry timestamp after the batch
    pub timestamp: f64,
    /// Number of trains tracked after the batch
    pub trains_count: usize,
}

/// Shared registry of train state.
///
/// One mutex serializes every read and mutation; the whole registry is a
/// single critical section. Mutations that change anything publish a full
/// snapshot on the broadcast channel, after the lock is released.
pub struct TrainRegistry {
    inner: Mutex<WorldState>,

    /// Broadcast channel carrying full post-mutation snapshots
    snapshot_tx: broadcast::Sender<WorldState>,
}

impl TrainRegistry {
    pub fn new(initial: WorldState) -> Self {
        let (snapshot_tx, _) = broadcast::channel(256);

        Self {
            inner: Mutex::new(initial),
            snapshot_tx,
        }
    }

    /// Full clone of the current state, taken under the lock
    pub fn snapshot(&self) -> WorldState {
        self.inner.lock().unwrap().clone()
    }

    /// Look up a single train by id
    pub fn get_train(&self, id: &str) -> Option<TrainState> {
        let world = self.inner.lock().unwrap();
        world.position(id).map(|i| world.trains[i].clone())
    }

    /// Subscribe to post-mutation snapshots
    pub fn subscribe(&self) -> broadcast::Receiver<WorldState> {
        self.snapshot_tx.subscribe()
    }

    /// Apply a batch of update records (core state mutation).
    ///
    /// Records without a usable id are skipped. Unknown ids append a new
    /// train (strict coercion, see `TrainState::from_record`); known ids
    /// merge field by field with per-field lenient coercion. The timestamp
    /// is refreshed once per batch, only if something changed, and the
    /// post-mutation snapshot is broadcast after the lock is dropped.
    ///
    /// On a creation error the batch stops where it is: earlier records
    /// stay applied, the timestamp is untouched and nothing is broadcast.
    pub fn apply_updates(&self, records: &[UpdateRecord]) -> Result<MergeOutcome, MergeError> {
        let snapshot = {
            let mut world = self.inner.lock().unwrap();
            let mut changed = false;

            for rec in records {
                let Some(id) = rec.id() else {
                    continue;
                };

                match world.position(id) {
                    None => {
                        let train = TrainState::from_record(id, rec)?;
                        debug!(id = %id, "Adding new train");
                        world.trains.push(train);
                        changed = true;
                    }
                    Some(idx) => {
                        if merge_fields(&mut world.trains[idx], rec) {
                            changed = true;
                        }
                    }
                }
            }

            if !changed {
                return Ok(MergeOutcome {
                    changed: false,
                    timestamp: world.timestamp,
                    trains_count: world.trains.len(),
                });
            }

            // Monotonic: never move backwards even if the clock does
            world.timestamp = world.timestamp.max(epoch_seconds());
            world.clone()
        };

        let outcome = MergeOutcome {
            changed: true,
            timestamp: snapshot.timestamp,
            trains_count: snapshot.trains.len(),
        };

        // Best-effort fan-out; no receivers is not an error
        let _ = self.snapshot_tx.send(snapshot);

        Ok(outcome)
    }
}

/// Merge provided fields into an existing train. A field that fails
/// coercion is skipped; the rest still apply. Returns true if any
/// field was written.
fn merge_fields(train: &mut TrainState, rec: &UpdateRecord) -> bool {
    let mut applied = false;

    for (field, slot) in [
        ("lat", &mut train.lat),
        ("lon", &mut train.lon),
        ("speed_kmh", &mut train.speed_kmh),
    ] {
        if let Some(v) = rec.field(field) {
            match coerce_f64(v) {
                Some(f) => {
                    *slot = f;
                    applied = true;
                }
                None => debug!(id = %train.id, field = field, "Skipping field (bad type)"),
            }
        }
    }

    for (field, slot) in [("signal", &mut train.signal), ("track_id", &mut train.track_id)] {
        if let Some(v) = rec.field(field) {
            match coerce_i64(v) {
                Some(i) => {
                    *slot = i;
                    applied = true;
                }
                None => debug!(id = %train.id, field = field, "Skipping field (bad type)"),
            }
        }
    }

    for (field, slot) in [("name", &mut train.name), ("route", &mut train.route)] {
        if let Some(v) = rec.field(field) {
            match v.as_str() {
                Some(s) => {
                    *slot = s.to_string();
                    applied = true;
                }
                None => debug!(id = %train.id, field = field, "Skipping field (bad type)"),
            }
        }
    }

    applied
}

/// Current time as fractional epoch seconds
fn epoch_seconds() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}
