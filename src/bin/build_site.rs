#![forbid(unsafe_code)]

//! Generates the static archive site: one page per playlist plus `index.html`.

use anyhow::Result;
use clap::{ArgGroup, Parser};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vidarchive_tools::config::{DEFAULT_CONFIG_PATH, load_site_settings_from};
use vidarchive_tools::site::{BuildRequest, VideoSource, build_site};

#[derive(Parser, Debug)]
#[command(author, version, about = "Build the static video archive site.")]
#[command(group(
    ArgGroup::new("source")
        .args(["video_cache", "videos"])
        .required(true)
        .multiple(false)
))]
struct Cli {
    #[arg(
        long = "video-cache",
        value_name = "PATH",
        help = "Cache file for video and related files like description and thumbnail"
    )]
    video_cache: Option<PathBuf>,
    #[arg(long = "videos", value_name = "DIR", help = "Unprocessed videos' folder")]
    videos: Option<PathBuf>,
    #[arg(
        long = "site-name",
        value_name = "NAME",
        help = "Site name shown in page titles (overrides the config file)"
    )]
    site_name: Option<String>,
    #[arg(long = "config", value_name = "PATH", default_value = DEFAULT_CONFIG_PATH, help = "Path to the config file")]
    config: PathBuf,
    #[arg(value_name = "PLAYLISTS", help = "Playlists JSON")]
    playlist: PathBuf,
    #[arg(value_name = "OUTPUT", help = "Output folder for HTML files")]
    output: PathBuf,
}

impl Cli {
    fn video_source(&self) -> VideoSource {
        match (&self.video_cache, &self.videos) {
            (Some(cache), _) => VideoSource::Cache(cache.clone()),
            (None, Some(dir)) => VideoSource::Folder(dir.clone()),
            // clap enforces exactly one of the two.
            (None, None) => unreachable!("source group is required"),
        }
    }
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
    let mut settings = load_site_settings_from(&cli.config)?;
    if let Some(site_name) = &cli.site_name {
        settings.site_name = site_name.clone();
    }

    let request = BuildRequest {
        playlists: cli.playlist.clone(),
        output: cli.output.clone(),
        videos: cli.video_source(),
    };
    build_site(&request, &settings)?;
    Ok(())
}
