//! nimbus: enrich a cloud photo from the command line.
//!
//! Prints the enriched record as JSON on stdout; logs go to stderr or to
//! `LOG_FILE`.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nimbus_core::{extract_metadata, CaptureHints, GeoPoint, RawCapture, StylePersona};
use nimbus_pipeline::CapturePipeline;

const DEFAULT_LOG_FILTER: &str = "nimbus_pipeline=info,nimbus_enrich=info,nimbus_inference=info";

#[derive(Parser)]
#[command(name = "nimbus")]
#[command(author, version, about = "Cloud photo enrichment")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full enrichment pipeline on a photo
    Enrich {
        /// Photo to enrich
        image: PathBuf,

        /// Persona id (hand, broom, catPaw, glassCover or a descriptive id)
        #[arg(short, long, default_value = "hand")]
        persona: String,

        /// Declared content type (sniffed from the bytes when omitted)
        #[arg(long)]
        content_type: Option<String>,

        /// Capture time hint
        #[arg(long)]
        time: Option<String>,

        /// Place hint ("当前位置" asks for persona-specific text)
        #[arg(long)]
        place: Option<String>,

        /// Weather hint
        #[arg(long)]
        weather: Option<String>,

        /// Latitude hint, used when the photo has no GPS tags
        #[arg(long, requires = "lon", allow_negative_numbers = true)]
        lat: Option<f64>,

        /// Longitude hint
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lon: Option<f64>,

        /// Single-line JSON
        #[arg(long)]
        compact: bool,
    },

    /// Print the EXIF GPS point and timestamp of a photo
    Metadata {
        image: PathBuf,
    },

    /// List the available personas
    Personas,
}

/// Initialize tracing.
///
/// Environment variables:
///   LOG_FORMAT  - "json" or "text" (default: "text")
///   LOG_FILE    - path to log file (optional, daily rotation)
///   RUST_LOG    - standard env filter
fn init_tracing() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let registry = tracing_subscriber::registry().with(env_filter);

    let guard = if let Some(ref path) = log_file {
        let file_dir = Path::new(path).parent().unwrap_or(Path::new("."));
        let file_name = Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("nimbus.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(non_blocking))
                .init();
        } else {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(non_blocking)
                        .with_ansi(false),
                )
                .init();
        }
        Some(guard)
    } else {
        // stdout carries the JSON result
        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        } else {
            registry
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
        None
    };

    info!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stderr)"),
        "Logging initialized"
    );
    guard
}

fn read_image(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let _log_guard = init_tracing();

    match cli.command {
        Commands::Enrich {
            image,
            persona,
            content_type,
            time,
            place,
            weather,
            lat,
            lon,
            compact,
        } => {
            let bytes = read_image(&image)?;
            let capture = RawCapture::new(bytes, content_type.as_deref());

            let mut hints = CaptureHints {
                time,
                place,
                weather,
                point: None,
            };
            if let (Some(lat), Some(lon)) = (lat, lon) {
                hints = hints.with_point(GeoPoint::new(lat, lon).context("invalid --lat/--lon")?);
            }

            let pipeline = CapturePipeline::from_env().context("failed to configure pipeline")?;
            let enriched = pipeline
                .enrich(&capture, StylePersona::resolve(&persona), &hints)
                .await?;

            let out = if compact {
                serde_json::to_string(&enriched)?
            } else {
                serde_json::to_string_pretty(&enriched)?
            };
            println!("{}", out);
        }
        Commands::Metadata { image } => {
            let metadata = extract_metadata(&read_image(&image)?);
            println!("{}", serde_json::to_string_pretty(&metadata)?);
        }
        Commands::Personas => {
            for persona in StylePersona::ALL {
                let style = persona.style();
                println!("{:<12} {:<18} {}", style.id, style.slug, style.label);
            }
        }
    }

    Ok(())
}
