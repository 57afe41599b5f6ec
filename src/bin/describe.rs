//! Sends one image to the description endpoint and prints the result.

use std::path::PathBuf;

use clap::Parser;

use multimodal_llm_service::{DEFAULT_ENDPOINT, client, telemetry::init_tracing_stderr};

#[derive(Parser, Debug)]
#[command(about = "Client for the multi-modal LLM description API")]
struct Args {
    /// Path to the image file
    #[arg(long)]
    image: PathBuf,
    /// API endpoint URL
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    endpoint: String,
}

fn main() -> std::io::Result<()> {
    init_tracing_stderr();
    let args = Args::parse();

    let outcome = client::describe(&args.image, &args.endpoint);
    if let Err(err) = &outcome {
        tracing::debug!(%err, local = err.is_local(), "request failed");
    }
    client::report(&outcome, &mut std::io::stdout().lock())
}
