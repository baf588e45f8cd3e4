// Train data model, shared registry and seed loading

mod registry;
mod train;
pub mod seed;

pub use registry::{MergeOutcome, TrainRegistry};
pub use train::{MergeError, TargetPoint, TrainState, UpdateRecord, WorldState};
