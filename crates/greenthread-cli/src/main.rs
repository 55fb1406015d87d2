mod display;

use std::io::Read;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use greenthread_ai::{ArtifactBundle, Predictor};
use greenthread_core::{PredictorKind, RawInput};
use greenthread_store::ArtifactDir;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "greenthread",
    version,
    about = "Carbon and price predictions for artisan products"
)]
struct Cli {
    /// Root directory holding the `carbon/` and `price/` artifact bundles.
    #[arg(long, global = true, env = "GREENTHREAD_ARTIFACTS", default_value = "artifacts")]
    artifacts: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Predict for one JSON request read from a file or stdin.
    Predict {
        kind: PredictorKind,
        /// Request file; stdin when omitted.
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Load a bundle and describe it.
    Inspect { kind: PredictorKind },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let dir = ArtifactDir::new(&cli.artifacts);
    tracing::debug!(
        artifacts = %cli.artifacts.display(),
        "greenthread v{}",
        env!("CARGO_PKG_VERSION")
    );

    match cli.command {
        Command::Predict { kind, input } => {
            let raw = read_request(input.as_ref())?;
            let prediction = Predictor::new(dir).predict(kind, &raw);
            let body = display::prediction_json(kind, &prediction);
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        Command::Inspect { kind } => match ArtifactBundle::load(kind, &dir) {
            Ok(bundle) => print!("{}", display::bundle_report(&bundle)),
            Err(e) => print!("{}", display::missing_report(&dir.paths(kind), &e)),
        },
    }
    Ok(())
}

/// Read a request from `input`, or stdin when no file is given.
fn read_request(input: Option<&PathBuf>) -> anyhow::Result<RawInput> {
    let body = match input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => {
            let mut body = String::new();
            std::io::stdin()
                .read_to_string(&mut body)
                .context("reading request from stdin")?;
            body
        }
    };
    parse_request(&body)
}

/// Anything but a JSON object is rejected.
fn parse_request(body: &str) -> anyhow::Result<RawInput> {
    RawInput::from_json(body).context("request must be a JSON object")
}
