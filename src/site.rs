//! The whole site build: load every input, resolve the playlist tree, render
//! and write the pages.
//!
//! All inputs are read and validated before the output folder is touched, so
//! a bad playlist file or template never leaves a half-written site behind.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::SiteSettings;
use crate::metadata::VideoCatalog;
use crate::placeholder::PlaceholderSelector;
use crate::playlist::{
    RawPlaylist, ResolvedPlaylist, duplicate_page_names, load_playlists, resolve,
};
use crate::process::ensure_program_available;
use crate::render::{SiteRenderer, write_pages};
use crate::template::TemplateSet;
use crate::video_cache::scan_video_folder;

/// Where video metadata comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoSource {
    /// A cache file written by `video_cache`.
    Cache(PathBuf),
    /// A folder of raw downloads, scanned on the fly.
    Folder(PathBuf),
}

#[derive(Debug, Clone)]
pub struct BuildRequest {
    pub playlists: PathBuf,
    pub output: PathBuf,
    pub videos: VideoSource,
}

/// What a build produced, for the final log line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildSummary {
    pub pages: usize,
    pub playlists: usize,
    pub missing_videos: usize,
}

pub fn load_catalog(source: &VideoSource) -> Result<VideoCatalog> {
    match source {
        VideoSource::Cache(path) => VideoCatalog::load(path),
        VideoSource::Folder(dir) => {
            ensure_program_available("ffprobe")?;
            scan_video_folder(dir)
        }
    }
}

pub fn load_templates(settings: &SiteSettings) -> Result<TemplateSet> {
    match &settings.templates_dir {
        Some(dir) => TemplateSet::load_dir(dir)
            .with_context(|| format!("loading templates from {}", dir.display())),
        None => TemplateSet::builtin(),
    }
}

pub fn build_site(request: &BuildRequest, settings: &SiteSettings) -> Result<BuildSummary> {
    let catalog = load_catalog(&request.videos)?;
    let templates = load_templates(settings)?;
    let entries = load_playlists(&request.playlists)?;
    info!(
        "Loaded {} cached video(s) and {} top-level entries",
        catalog.len(),
        entries.len()
    );

    let root = RawPlaylist::root(settings.root_title.clone(), entries);
    let resolved = resolve(&root, &catalog);

    for name in duplicate_page_names(&resolved) {
        warn!("Several playlists share the page {}; only the last one is kept", name);
    }

    let placeholders = PlaceholderSelector::new(settings.placeholders.clone());
    let mut renderer = SiteRenderer::new(templates, placeholders, settings.clone());
    let pages = renderer.render_site(&resolved)?;
    write_pages(&request.output, &pages)?;

    let summary = BuildSummary {
        pages: pages.len(),
        playlists: resolved.descendant_count(),
        missing_videos: count_missing(&resolved),
    };
    info!(
        "Wrote {} page(s) for {} playlist(s) to {} ({} video id(s) not found)",
        summary.pages,
        summary.playlists,
        request.output.display(),
        summary.missing_videos
    );
    Ok(summary)
}

fn count_missing(playlist: &ResolvedPlaylist<'_>) -> usize {
    playlist.missing.len() + playlist.playlists.iter().map(count_missing).sum::<usize>()
}
