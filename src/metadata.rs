//! Video metadata cache shared by the site builder and the cache scanner.
//!
//! The cache is a single JSON object keyed by the 11-character video id. Each
//! value describes what the scanner found next to the downloaded video: the
//! media file itself, its thumbnail, its description and the view count taken
//! from the `.info.json` sidecar. Any of the sidecars may be missing, in which
//! case the corresponding field stays empty (or zero) and the renderer copes.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use tempfile::NamedTempFile;

/// On-disk shape of the media descriptor: `[path, mtime, size, duration]`.
type MediaTuple = (String, f64, u64, f64);

/// The downloaded video file relative to the site root.
///
/// Serialized as a four element array to stay compatible with caches written
/// by earlier tooling.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "MediaTuple", into = "MediaTuple")]
pub struct MediaFile {
    pub path: String,
    /// Modification time in (fractional) seconds since the epoch.
    pub mtime: f64,
    pub size: u64,
    /// Duration in seconds as reported by the probe.
    pub duration: f64,
}

impl From<MediaTuple> for MediaFile {
    fn from((path, mtime, size, duration): MediaTuple) -> Self {
        Self {
            path,
            mtime,
            size,
            duration,
        }
    }
}

impl From<MediaFile> for MediaTuple {
    fn from(media: MediaFile) -> Self {
        (media.path, media.mtime, media.size, media.duration)
    }
}

/// One downloaded video as stored in the cache.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoRecord {
    /// Filled from the cache key on load; never serialized.
    #[serde(skip)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub video: MediaFile,
    #[serde(default)]
    pub thumbnail: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "views_or_zero")]
    pub view_count: u64,
}

impl VideoRecord {
    /// Empty record used by the scanner before any file for `id` is seen.
    pub fn placeholder(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }
}

/// `info.json` files written by some downloader versions carry `null` views.
fn views_or_zero<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(deserializer)?.unwrap_or_default())
}

/// In-memory view of the whole cache. Lookups are read-only; the site
/// builder borrows records from here for the duration of a run.
#[derive(Debug, Clone, Default)]
pub struct VideoCatalog {
    videos: BTreeMap<String, VideoRecord>,
}

impl VideoCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, video_id: &str) -> Option<&VideoRecord> {
        self.videos.get(video_id)
    }

    pub fn len(&self) -> usize {
        self.videos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.videos.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &VideoRecord> {
        self.videos.values()
    }

    /// Adds or replaces a record keyed by its id.
    pub fn insert(&mut self, record: VideoRecord) {
        self.videos.insert(record.id.clone(), record);
    }

    /// Returns the record for `video_id`, creating an empty one first if the
    /// id has not been seen yet.
    pub fn entry(&mut self, video_id: &str) -> &mut VideoRecord {
        self.videos
            .entry(video_id.to_owned())
            .or_insert_with(|| VideoRecord::placeholder(video_id))
    }

    /// Parses a cache document, copying each key into the record's `id`.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let videos: BTreeMap<String, VideoRecord> =
            serde_json::from_str(raw).context("deserializing video cache JSON")?;
        Ok(Self::from_map(videos))
    }

    /// Reads the cache written by `video_cache` (or an earlier tool).
    pub fn load(path: &Path) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("opening video cache {}", path.display()))?;
        let videos: BTreeMap<String, VideoRecord> =
            serde_json::from_reader(BufReader::new(file))
                .with_context(|| format!("parsing video cache {}", path.display()))?;
        Ok(Self::from_map(videos))
    }

    /// Writes the cache next to its final location first and renames it in
    /// place, so an interrupted run never leaves a truncated cache behind.
    pub fn save(&self, path: &Path) -> Result<()> {
        let parent = path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let temp = NamedTempFile::new_in(parent)
            .with_context(|| format!("creating temporary cache in {}", parent.display()))?;
        {
            let mut writer = BufWriter::new(temp.as_file());
            serde_json::to_writer(&mut writer, &self.videos).context("serializing video cache")?;
            writer.flush().context("flushing video cache")?;
        }
        temp.persist(path)
            .with_context(|| format!("writing video cache {}", path.display()))?;
        Ok(())
    }

    fn from_map(mut videos: BTreeMap<String, VideoRecord>) -> Self {
        for (id, record) in videos.iter_mut() {
            record.id.clone_from(id);
        }
        Self { videos }
    }
}

impl FromIterator<VideoRecord> for VideoCatalog {
    fn from_iter<I: IntoIterator<Item = VideoRecord>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for record in iter {
            catalog.insert(record);
        }
        catalog
    }
}
