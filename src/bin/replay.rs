//! Trace replayer: posts recorded train positions to a running backend.
//!
//! Reads a `{"trace": [{"trains": [...]}, ...]}` file and POSTs each
//! frame's trains to `/update`, with a configurable inter-frame delay,
//! looped N times or forever. Pure HTTP client — no shared state with
//! the server.

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "replay", about = "Replay a recorded trace against the /update endpoint")]
struct Args {
    /// Backend base URL
    #[arg(long, default_value = "http://localhost:5000")]
    host: String,

    /// Trace JSON path
    #[arg(long, default_value = "sample_trace.json")]
    file: PathBuf,

    /// Seconds between frames
    #[arg(long, default_value_t = 1.0)]
    interval: f64,

    /// Number of times to loop the trace (0 = infinite)
    #[arg(long = "loop", default_value_t = 1)]
    loops: u32,
}

#[derive(Deserialize)]
struct TraceFile {
    #[serde(default)]
    trace: Vec<Frame>,
}

#[derive(Deserialize)]
struct Frame {
    #[serde(default)]
    trains: Vec<Value>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "replay=info".into()),
        )
        .init();

    let args = Args::parse();

    let contents = std::fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read trace file {}", args.file.display()))?;
    let trace: TraceFile = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse trace file {}", args.file.display()))?;

    if trace.trace.is_empty() {
        anyhow::bail!("No trace frames found in {}", args.file.display());
    }

    let client = reqwest::Client::new();
    let url = format!("{}/update", args.host.trim_end_matches('/'));

    info!(
        url = %url,
        frames = trace.trace.len(),
        loops = args.loops,
        "Starting replay"
    );

    let mut loop_count = 0u32;
    loop {
        for frame in &trace.trace {
            post_frame(&client, &url, &frame.trains).await;
            tokio::time::sleep(Duration::from_secs_f64(args.interval)).await;
        }

        loop_count += 1;
        if args.loops > 0 && loop_count >= args.loops {
            break;
        }
    }

    info!(loops = loop_count, "Replay finished");
    Ok(())
}

/// POST one frame's trains; errors are reported and the replay goes on
async fn post_frame(client: &reqwest::Client, url: &str, trains: &[Value]) {
    let ids: Vec<&str> = trains
        .iter()
        .filter_map(|t| t.get("id").and_then(Value::as_str))
        .collect();

    let result = client
        .post(url)
        .json(&json!({ "trains": trains }))
        .timeout(Duration::from_secs(5))
        .send()
        .await;

    match result {
        Ok(resp) if resp.status().is_success() => {
            info!(ids = ?ids, "Posted update");
        }
        Ok(resp) => {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "POST error");
        }
        Err(e) => {
            warn!(error = %e, "Request failed");
        }
    }
}
