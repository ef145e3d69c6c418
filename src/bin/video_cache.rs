#![forbid(unsafe_code)]

//! Scans a folder of raw downloads once and stores the result, so that site
//! rebuilds do not have to probe every video again.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vidarchive_tools::process::ensure_program_available;
use vidarchive_tools::video_cache::scan_video_folder;

#[derive(Parser, Debug)]
#[command(author, version, about = "Build the video cache used by build_site.")]
struct Cli {
    #[arg(value_name = "VIDEOS", help = "Videos' folder")]
    videos: PathBuf,
    #[arg(value_name = "CACHE", help = "Resulting cache file")]
    video_cache: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    ensure_program_available("ffprobe")?;

    let catalog = scan_video_folder(&cli.videos)?;
    catalog.save(&cli.video_cache)?;
    info!(
        "Cached {} video(s) in {}",
        catalog.len(),
        cli.video_cache.display()
    );
    Ok(())
}
