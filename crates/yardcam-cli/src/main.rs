//! yardcam CLI: capture, compress and upload yard photos.
//!
//! Set YARDCAM_API_URL (or API_URL) and, when the endpoint requires one,
//! YARDCAM_FUNCTION_KEY (or FUNCTION_KEY).

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use yardcam_api_client::ApiClient;
use yardcam_cli::{capture_photo, init_tracing, print_json};
use yardcam_processing::CompressionSettings;

#[derive(Parser)]
#[command(name = "yardcam", about = "Capture, compress and upload yard photos")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone, Copy)]
struct CompressionArgs {
    /// Maximum output width in pixels
    #[arg(long, default_value_t = 1024)]
    max_width: u32,
    /// JPEG quality between 0 (exclusive) and 1
    #[arg(long, default_value_t = 0.8)]
    quality: f32,
}

impl CompressionArgs {
    fn settings(self) -> anyhow::Result<CompressionSettings> {
        Ok(CompressionSettings::new(self.max_width, self.quality)?)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Capture an image file, compress it and upload it
    Upload {
        /// Path to the photo
        file: PathBuf,
        /// User the photo belongs to
        #[arg(long)]
        user_id: String,
        /// Name to store the photo under (sanitized by the server)
        #[arg(long)]
        file_name: Option<String>,
        /// Endpoint base URL (overrides YARDCAM_API_URL)
        #[arg(long)]
        url: Option<String>,
        #[command(flatten)]
        compression: CompressionArgs,
    },
    /// Compress an image file to a bounded-width JPEG
    Compress {
        /// Path to the photo
        file: PathBuf,
        /// Where to write the JPEG
        #[arg(short, long)]
        output: PathBuf,
        #[command(flatten)]
        compression: CompressionArgs,
    },
    /// Check the endpoint's health
    Health {
        /// Endpoint base URL (overrides YARDCAM_API_URL)
        #[arg(long)]
        url: Option<String>,
    },
}

fn api_client(url: Option<String>) -> anyhow::Result<ApiClient> {
    let client = ApiClient::from_env().context("Failed to create API client")?;
    Ok(match url {
        Some(url) => client.with_base_url(&url),
        None => client,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Upload {
            file,
            user_id,
            file_name,
            url,
            compression,
        } => {
            let client = api_client(url)?;
            let photo = capture_photo(&file, compression.settings()?).await?;
            tracing::info!(
                width = photo.width(),
                height = photo.height(),
                size_bytes = photo.len(),
                "Photo compressed"
            );
            let response = client
                .upload_image(photo.to_data_uri(), &user_id, file_name.as_deref())
                .await?;
            print_json(&response)?;
        }
        Commands::Compress {
            file,
            output,
            compression,
        } => {
            let photo = capture_photo(&file, compression.settings()?).await?;
            tokio::fs::write(&output, photo.data())
                .await
                .with_context(|| format!("Failed to write {}", output.display()))?;
            print_json(&serde_json::json!({
                "output": output.display().to_string(),
                "width": photo.width(),
                "height": photo.height(),
                "sizeBytes": photo.len(),
            }))?;
        }
        Commands::Health { url } => {
            let response = api_client(url)?.health().await?;
            print_json(&response)?;
        }
    }

    Ok(())
}
