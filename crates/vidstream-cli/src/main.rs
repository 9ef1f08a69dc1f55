//! vidstream: upload videos to object storage and browse the streaming catalog.
//!
//! Configuration is read from the environment; a `.env` file is honored.

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use vidstream_api_client::ApiClient;
use vidstream_cli::{init_tracing, progress_line};
use vidstream_core::models::{
    thumbnail_url, video_id_from_file_name, UploadProgress, UploadReceipt,
};
use vidstream_core::{Config, ErrorMetadata};
use vidstream_services::{ChunkedUploadCoordinator, FileSource, UploadSource};
use vidstream_storage::create_storage;

#[derive(Parser)]
#[command(name = "vidstream", about = "Chunked video uploads and streaming catalog")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a video file in chunks
    Upload {
        /// Path to the video file
        file: PathBuf,
        /// Declared content type (inferred from the extension by default)
        #[arg(long)]
        content_type: Option<String>,
        /// Leave the multipart upload in place when it fails
        #[arg(long)]
        no_abort: bool,
    },
    /// List the videos available for streaming
    List,
    /// Resolve the manifest URL to play a video
    Play {
        /// Video id
        video_id: String,
        /// Resolution key, e.g. 720p
        #[arg(long)]
        quality: Option<String>,
    },
    /// Show every resolution of a video
    Resolutions {
        /// Video id
        video_id: String,
    },
    /// Print the thumbnail URL of a video
    Thumbnail {
        /// Video id or uploaded file name
        video: String,
    },
}

#[derive(Serialize)]
struct UploadOutput {
    #[serde(flatten)]
    receipt: UploadReceipt,
    video_id: String,
    thumbnail_url: String,
}

#[derive(Serialize)]
struct ThumbnailOutput {
    video_id: String,
    thumbnail_url: String,
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::from_env().context("Failed to load configuration")?;
    init_tracing(&config.log_format);

    tracing::debug!(
        environment = %config.environment,
        storage_backend = %config.storage_backend,
        "Configuration loaded"
    );

    match cli.command {
        Commands::Upload {
            file,
            content_type,
            no_abort,
        } => {
            let storage = create_storage(&config)
                .await
                .context("Failed to initialize storage")?;
            let coordinator = ChunkedUploadCoordinator::from_config(storage, &config)
                .with_abort_on_failure(config.upload_abort_on_failure && !no_abort);

            let source = FileSource::open(&file, content_type)
                .await
                .with_context(|| format!("Failed to open {}", file.display()))?;

            let file_name = source.name().to_string();
            let report = move |progress: &UploadProgress| {
                eprintln!("{}", progress_line(&file_name, progress));
            };

            match coordinator.upload(&source, &report).await {
                Ok(receipt) => {
                    eprintln!("{}", receipt.message);
                    let video_id = video_id_from_file_name(source.name()).to_string();
                    let thumbnail_url =
                        thumbnail_url(&config.s3_bucket, config.region_or_default(), &video_id);
                    print_json(&UploadOutput {
                        receipt,
                        video_id,
                        thumbnail_url,
                    })?;
                }
                Err(e) => {
                    eprintln!("{}", e.client_message());
                    std::process::exit(1);
                }
            }
        }
        Commands::List => {
            let client = ApiClient::from_config(&config)?;
            let listing = client.list_all_videos().await;
            print_json(&listing)?;
        }
        Commands::Play { video_id, quality } => {
            let client = ApiClient::from_config(&config)?;
            match client.playback_source(&video_id, quality.as_deref()).await {
                Some(source) => print_json(&source)?,
                None => {
                    eprintln!("Playback unavailable for {}", video_id);
                    std::process::exit(1);
                }
            }
        }
        Commands::Resolutions { video_id } => {
            let client = ApiClient::from_config(&config)?;
            let resolutions = client
                .resolutions(&video_id)
                .await
                .with_context(|| format!("Failed to fetch resolutions for {}", video_id))?;
            print_json(&resolutions)?;
        }
        Commands::Thumbnail { video } => {
            let video_id = video_id_from_file_name(&video).to_string();
            let thumbnail_url =
                thumbnail_url(&config.s3_bucket, config.region_or_default(), &video_id);
            print_json(&ThumbnailOutput {
                video_id,
                thumbnail_url,
            })?;
        }
    }

    Ok(())
}
