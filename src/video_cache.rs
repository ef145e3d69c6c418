//! Builds the video cache by scanning a folder of raw downloads.
//!
//! Downloads are expected to be named `<index>-<title>-<video id>.<ext>`,
//! as produced by the downloader's output template. Every id collects up to
//! four files: the `.mp4` itself, a `.jpg`/`.webp` thumbnail, a
//! `.description` and an `.info.json` with the view count.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::process::Command;
use std::sync::LazyLock;
use std::time::UNIX_EPOCH;

use anyhow::{Context, Result, bail};
use regex::Regex;
use serde::Deserialize;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::metadata::{MediaFile, VideoCatalog};

static FILE_NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]+-(.+)-([^.]{11})\.([a-z0-9.]+)$").expect("file name pattern is valid")
});

/// The parts of a download's file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadName<'a> {
    pub title: &'a str,
    pub video_id: &'a str,
    pub extension: &'a str,
}

/// Splits `<index>-<title>-<video id>.<ext>`; anything else is not ours.
pub fn parse_download_name(file_name: &str) -> Option<DownloadName<'_>> {
    let captures = FILE_NAME_PATTERN.captures(file_name)?;
    Some(DownloadName {
        title: captures.get(1)?.as_str(),
        video_id: captures.get(2)?.as_str(),
        extension: captures.get(3)?.as_str(),
    })
}

/// Only the view count is read from `.info.json`.
#[derive(Deserialize)]
struct MinimalInfo {
    view_count: Option<u64>,
}

/// Scans `directory` (not recursively) and probes every video with ffprobe.
pub fn scan_video_folder(directory: &Path) -> Result<VideoCatalog> {
    scan_video_folder_with(directory, probe_duration)
}

/// Like [`scan_video_folder`] with a custom duration probe.
pub fn scan_video_folder_with<P>(directory: &Path, mut probe: P) -> Result<VideoCatalog>
where
    P: FnMut(&Path) -> Result<f64>,
{
    if !directory.is_dir() {
        bail!("video folder {} does not exist", directory.display());
    }

    let mut catalog = VideoCatalog::new();
    for entry in WalkDir::new(directory)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("Skipping unreadable entry in {}: {}", directory.display(), err);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let file_name = entry.file_name().to_string_lossy().into_owned();
        let Some(name) = parse_download_name(&file_name) else {
            continue;
        };
        let record = catalog.entry(name.video_id);

        match name.extension {
            "mp4" => {
                let stat = entry
                    .metadata()
                    .with_context(|| format!("reading metadata of {}", entry.path().display()))?;
                let mtime = stat
                    .modified()
                    .ok()
                    .and_then(|modified| modified.duration_since(UNIX_EPOCH).ok())
                    .map(|since| since.as_secs_f64())
                    .unwrap_or_default();
                let duration = match probe(entry.path()) {
                    Ok(duration) => duration,
                    Err(err) => {
                        warn!("Video corrupted {}: {:#}", file_name, err);
                        0.0
                    }
                };
                record.title = name.title.to_owned();
                record.video = MediaFile {
                    path: file_name.clone(),
                    mtime,
                    size: stat.len(),
                    duration,
                };
            }
            "jpg" | "webp" => record.thumbnail = file_name.clone(),
            "description" => record.description = file_name.clone(),
            "info.json" => {
                record.view_count = read_view_count(entry.path()).unwrap_or_else(|err| {
                    warn!("Could not read views from {}: {:#}", file_name, err);
                    0
                });
            }
            _ => {}
        }
    }

    info!(
        "Found {} video(s) in {}",
        catalog.len(),
        directory.display()
    );
    Ok(catalog)
}

fn read_view_count(path: &Path) -> Result<u64> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let info: MinimalInfo = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(info.view_count.unwrap_or_default())
}

/// Asks ffprobe for the container duration in seconds.
pub fn probe_duration(path: &Path) -> Result<f64> {
    let output = Command::new("ffprobe")
        .args(["-v", "error", "-show_entries", "format=duration"])
        .args(["-of", "default=noprint_wrappers=1:nokey=1"])
        .arg(path)
        .output()
        .with_context(|| format!("running ffprobe on {}", path.display()))?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    stdout
        .trim()
        .parse::<f64>()
        .with_context(|| format!("ffprobe reported no duration for {}", path.display()))
}
