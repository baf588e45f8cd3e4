use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Optional destination used by the demo stepper. Only ever set by the
/// seed file; `/update` cannot write it.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct TargetPoint {
    pub lat: f64,
    pub lon: f64,
}

/// Last-known attributes of one tracked train
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrainState {
    /// Unique train identifier (e.g., "T001"), immutable once assigned
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub route: String,

    #[serde(default)]
    pub lat: f64,

    #[serde(default)]
    pub lon: f64,

    #[serde(default)]
    pub speed_kmh: f64,

    #[serde(default = "default_signal")]
    pub signal: i64,

    #[serde(default = "default_track_id")]
    pub track_id: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<TargetPoint>,
}

fn default_signal() -> i64 {
    1
}

fn default_track_id() -> i64 {
    1
}

/// Full registry state: all tracked trains plus the epoch-seconds
/// timestamp of the last mutation. Insertion order is preserved.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorldState {
    #[serde(default)]
    pub timestamp: f64,
    #[serde(default)]
    pub trains: Vec<TrainState>,
}

impl WorldState {
    /// Find the position of a train by id
    pub fn position(&self, id: &str) -> Option<usize> {
        self.trains.iter().position(|t| t.id == id)
    }
}

/// One client-submitted partial description of a train, as raw JSON fields.
/// Normalized at the API boundary; coercion happens during the merge.
#[derive(Clone, Debug, Deserialize)]
#[serde(transparent)]
pub struct UpdateRecord(Map<String, Value>);

impl UpdateRecord {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Train id, if present as a non-empty string. Records without a
    /// usable id are skipped by the merger.
    pub fn id(&self) -> Option<&str> {
        self.0
            .get("id")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Raw value of a field, treating explicit JSON null as absent
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.0.get(name).filter(|v| !v.is_null())
    }
}

/// Merge failure while constructing a brand-new train.
///
/// Creation is strict: a field that fails coercion rejects the whole
/// request, unlike updates to existing trains where bad fields are
/// skipped one by one.
#[derive(Debug, PartialEq)]
pub enum MergeError {
    /// Field value could not be coerced while creating a new train
    BadNewTrainField { id: String, field: &'static str },
}

impl std::fmt::Display for MergeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MergeError::BadNewTrainField { id, field } => {
                write!(f, "invalid value for field '{}' on new train '{}'", field, id)
            }
        }
    }
}

impl std::error::Error for MergeError {}

impl TrainState {
    /// Construct a new train from an update record, applying defaults for
    /// absent fields. Provided numeric fields must coerce.
    pub fn from_record(id: &str, rec: &UpdateRecord) -> Result<Self, MergeError> {
        let bad = |field| MergeError::BadNewTrainField {
            id: id.to_string(),
            field,
        };

        let lat = match rec.field("lat") {
            Some(v) => coerce_f64(v).ok_or_else(|| bad("lat"))?,
            None => 0.0,
        };
        let lon = match rec.field("lon") {
            Some(v) => coerce_f64(v).ok_or_else(|| bad("lon"))?,
            None => 0.0,
        };
        let speed_kmh = match rec.field("speed_kmh") {
            Some(v) => coerce_f64(v).ok_or_else(|| bad("speed_kmh"))?,
            None => 0.0,
        };
        let signal = match rec.field("signal") {
            Some(v) => coerce_i64(v).ok_or_else(|| bad("signal"))?,
            None => 1,
        };
        let track_id = match rec.field("track_id") {
            Some(v) => coerce_i64(v).ok_or_else(|| bad("track_id"))?,
            None => 1,
        };

        Ok(Self {
            id: id.to_string(),
            name: rec
                .field("name")
                .and_then(Value::as_str)
                .unwrap_or(id)
                .to_string(),
            route: rec
                .field("route")
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string(),
            lat,
            lon,
            speed_kmh,
            signal,
            track_id,
            target: None,
        })
    }
}

/// Coerce a JSON value to f64: numbers directly, strings by parsing
pub(crate) fn coerce_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Coerce a JSON value to i64: integers directly, floats truncated,
/// strings parsed as integers
pub(crate) fn coerce_i64(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
