//! Agrocast Server - Headless inference serving
//!
//! Reads one JSON request per stdin line and writes one JSON response per
//! stdout line, suitable for running behind any front end that owns the
//! transport. Errors are structured payloads with a discriminated kind.
//!
//! # Usage
//! ```sh
//! echo '{"task":"price_forecast","market":"hospet","crop":"Rice"}' | \
//!     MODEL_DIR=./models cargo run --bin server
//! ```
//!
//! # Environment Variables
//! - `MODEL_DIR` - Directory containing trained artifacts (default: models)
//! - `SEQ_LENGTH` - Model input sequence length (default: 30)
//! - `CALIBRATION_ALPHA` / `CLAMP_PCT` - Blend and clamp parameters
//! - `PADDING_POLICY` - 'repeat-last' or 'trend'

use agrocast::application::serving::ServingContext;
use agrocast::config::Config;
use agrocast::domain::types::{ErrorPayload, ServingRequest};
use anyhow::Result;
use clap::Parser;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tracing::{Level, info, warn};
use tracing_subscriber::prelude::*;

#[derive(Parser)]
#[command(author, version, about = "Agrocast inference server", long_about = None)]
struct Cli {
    /// Override the model artifact directory from the environment
    #[arg(long)]
    model_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Logs go to stderr so stdout stays a clean response stream.
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stderr_layer)
        .init();

    info!("Agrocast Server {} starting...", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    if let Some(model_dir) = cli.model_dir {
        config.model_dir = model_dir;
    }
    info!(
        "Configuration loaded: model_dir={:?}, seq_length={}, alpha={}, clamp_pct={}",
        config.model_dir, config.seq_length, config.calibration_alpha, config.clamp_pct
    );

    let context = ServingContext::build(config);
    info!("Serving. One JSON request per line on stdin.");

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout().lock();
    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let response = serve_line(&context, &line);
        stdout.write_all(response.as_bytes())?;
        stdout.write_all(b"\n")?;
        stdout.flush()?;
    }

    info!("Input stream closed. Exiting...");
    Ok(())
}

fn serve_line(context: &ServingContext, line: &str) -> String {
    let request: ServingRequest = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(e) => {
            warn!("Malformed request: {e}");
            let payload = ErrorPayload {
                kind: "input_error",
                error: format!("malformed request: {e}"),
            };
            return serde_json::to_string(&payload).unwrap_or_default();
        }
    };

    match context.handle(request) {
        Ok(outcome) => serde_json::to_string(&outcome).unwrap_or_default(),
        Err(err) => {
            warn!("Request failed: {err}");
            serde_json::to_string(&ErrorPayload::from(&err)).unwrap_or_default()
        }
    }
}
