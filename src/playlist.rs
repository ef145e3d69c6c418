//! Playlist tree as fetched from the channel, and its resolution against the
//! local video cache.
//!
//! The raw tree mixes bare video ids and nested playlists in one list.
//! Resolution splits every list into the videos that exist locally and the
//! (recursively resolved) child playlists, keeping the relative order of each
//! kind. Ids with no local copy are reported and skipped.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::format::page_file_name;
use crate::metadata::{VideoCatalog, VideoRecord};

/// One entry of a playlist listing, decided by its JSON shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PlaylistEntry {
    /// Bare 11-character video id.
    Video(String),
    Playlist(RawPlaylist),
}

/// A playlist exactly as the fetcher wrote it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPlaylist {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(default)]
    pub playlists_and_ids: Vec<PlaylistEntry>,
}

impl RawPlaylist {
    /// Synthetic top-level playlist wrapping the whole fetched listing.
    pub fn root(title: impl Into<String>, entries: Vec<PlaylistEntry>) -> Self {
        Self {
            title: title.into(),
            playlists_and_ids: entries,
            ..Self::default()
        }
    }
}

pub fn parse_playlists(raw: &str) -> Result<Vec<PlaylistEntry>> {
    serde_json::from_str(raw).context("deserializing playlists JSON")
}

/// Reads the listing written by `fetch_playlists`.
pub fn load_playlists(path: &Path) -> Result<Vec<PlaylistEntry>> {
    let file = File::open(path).with_context(|| format!("opening playlists {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing playlists {}", path.display()))
}

/// A playlist whose entries have been matched against the cache. Video
/// records are borrowed from the catalog and never modified.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPlaylist<'a> {
    pub id: String,
    pub url: String,
    pub title: String,
    pub videos: Vec<&'a VideoRecord>,
    pub playlists: Vec<ResolvedPlaylist<'a>>,
    /// Ids listed in this playlist that the cache does not know about.
    pub missing: Vec<String>,
}

impl ResolvedPlaylist<'_> {
    /// Thumbnail shown on this playlist's card: the first own video's, else
    /// the first child playlist's first video's, else none.
    pub fn thumbnail(&self) -> &str {
        if let Some(video) = self.videos.first() {
            return &video.thumbnail;
        }
        self.playlists
            .first()
            .and_then(|child| child.videos.first())
            .map(|video| video.thumbnail.as_str())
            .unwrap_or_default()
    }

    /// Whether a page would have anything to show.
    pub fn has_content(&self) -> bool {
        !self.videos.is_empty() || !self.playlists.is_empty()
    }

    pub fn page_file_name(&self) -> String {
        page_file_name(&self.title)
    }

    /// Total number of playlists in this subtree, not counting `self`.
    pub fn descendant_count(&self) -> usize {
        self.playlists
            .iter()
            .map(|child| 1 + child.descendant_count())
            .sum()
    }
}

/// Matches `playlist` and all of its descendants against `catalog`.
///
/// Children are resolved depth-first before being attached to their parent.
/// Resolving the same tree twice against the same catalog yields equal
/// results.
pub fn resolve<'a>(playlist: &RawPlaylist, catalog: &'a VideoCatalog) -> ResolvedPlaylist<'a> {
    let mut videos = Vec::new();
    let mut playlists = Vec::new();
    let mut missing = Vec::new();

    for entry in &playlist.playlists_and_ids {
        match entry {
            PlaylistEntry::Video(video_id) => match catalog.lookup(video_id) {
                Some(record) => videos.push(record),
                None => {
                    warn!(
                        "Could not find {} (playlist \"{}\") in input folder",
                        video_id, playlist.title
                    );
                    missing.push(video_id.clone());
                }
            },
            PlaylistEntry::Playlist(child) => playlists.push(resolve(child, catalog)),
        }
    }

    ResolvedPlaylist {
        id: playlist.id.clone(),
        url: playlist.url.clone(),
        title: playlist.title.clone(),
        videos,
        playlists,
        missing,
    }
}

/// Page file names claimed by more than one playlist below `root`. Pages
/// live in one flat folder, so such playlists overwrite each other.
pub fn duplicate_page_names(root: &ResolvedPlaylist<'_>) -> Vec<String> {
    fn count(node: &ResolvedPlaylist<'_>, seen: &mut BTreeMap<String, usize>) {
        for child in &node.playlists {
            *seen.entry(child.page_file_name()).or_default() += 1;
            count(child, seen);
        }
    }

    let mut seen = BTreeMap::new();
    count(root, &mut seen);
    seen.into_iter()
        .filter(|(_, occurrences)| *occurrences > 1)
        .map(|(name, _)| name)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::MediaFile;

    fn record(id: &str, thumbnail: &str) -> VideoRecord {
        VideoRecord {
            id: id.to_owned(),
            title: format!("Video {id}"),
            video: MediaFile {
                path: format!("{id}.mp4"),
                mtime: 1_672_929_000.0,
                size: 2048,
                duration: 125.0,
            },
            thumbnail: thumbnail.to_owned(),
            description: format!("{id}.description"),
            view_count: 0,
        }
    }

    fn catalog() -> VideoCatalog {
        ["aaaaaaaaaaa", "bbbbbbbbbbb", "ccccccccccc", "ddddddddddd"]
            .into_iter()
            .map(|id| record(id, &format!("{id}.webp")))
            .collect()
    }

    const TREE: &str = r#"[
        "aaaaaaaaaaa",
        {"id": "p1", "url": "https://example.com/p1", "title": "Music", "playlists_and_ids": [
            "ccccccccccc",
            {"id": "p2", "title": "Live", "playlists_and_ids": ["ddddddddddd"]},
            "zzzzzzzzzzz",
            "bbbbbbbbbbb",
            {"id": "p3", "title": "Empty", "playlists_and_ids": []}
        ]},
        "yyyyyyyyyyy"
    ]"#;

    #[test]
    fn parses_both_entry_shapes() -> Result<()> {
        let entries = parse_playlists(TREE)?;
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0], PlaylistEntry::Video("aaaaaaaaaaa".to_owned()));
        match &entries[1] {
            PlaylistEntry::Playlist(playlist) => {
                assert_eq!(playlist.title, "Music");
                assert_eq!(playlist.url, "https://example.com/p1");
                assert_eq!(playlist.playlists_and_ids.len(), 5);
            }
            other => panic!("expected playlist, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn malformed_listing_is_rejected() {
        assert!(parse_playlists("{\"not\": \"a list\"}").is_err());
        assert!(parse_playlists("[42]").is_err());
        assert!(parse_playlists("[").is_err());
    }

    #[test]
    fn resolve_partitions_and_keeps_order() -> Result<()> {
        let catalog = catalog();
        let root = RawPlaylist::root("Videos", parse_playlists(TREE)?);
        let resolved = resolve(&root, &catalog);

        assert_eq!(resolved.title, "Videos");
        let root_ids: Vec<&str> = resolved.videos.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(root_ids, vec!["aaaaaaaaaaa"]);
        assert_eq!(resolved.missing, vec!["yyyyyyyyyyy"]);

        let music = &resolved.playlists[0];
        let music_ids: Vec<&str> = music.videos.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(music_ids, vec!["ccccccccccc", "bbbbbbbbbbb"]);
        assert_eq!(music.missing, vec!["zzzzzzzzzzz"]);
        let child_titles: Vec<&str> = music.playlists.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(child_titles, vec!["Live", "Empty"]);
        assert_eq!(music.playlists[0].videos[0].id, "ddddddddddd");
        assert_eq!(resolved.descendant_count(), 3);
        Ok(())
    }

    #[test]
    fn resolved_plus_missing_accounts_for_every_id() -> Result<()> {
        fn check(raw: &RawPlaylist, resolved: &ResolvedPlaylist<'_>) {
            let ids = raw
                .playlists_and_ids
                .iter()
                .filter(|entry| matches!(entry, PlaylistEntry::Video(_)))
                .count();
            assert_eq!(resolved.videos.len() + resolved.missing.len(), ids);

            let children = raw.playlists_and_ids.iter().filter_map(|entry| match entry {
                PlaylistEntry::Playlist(child) => Some(child),
                PlaylistEntry::Video(_) => None,
            });
            for (child, resolved_child) in children.zip(&resolved.playlists) {
                check(child, resolved_child);
            }
        }

        let catalog = catalog();
        let root = RawPlaylist::root("Videos", parse_playlists(TREE)?);
        check(&root, &resolve(&root, &catalog));
        Ok(())
    }

    #[test]
    fn resolve_is_idempotent() -> Result<()> {
        let catalog = catalog();
        let root = RawPlaylist::root("Videos", parse_playlists(TREE)?);
        assert_eq!(resolve(&root, &catalog), resolve(&root, &catalog));
        Ok(())
    }

    #[test]
    fn thumbnail_prefers_own_videos_then_first_child() {
        let catalog = catalog();
        let child = RawPlaylist {
            title: "Child".to_owned(),
            playlists_and_ids: vec![PlaylistEntry::Video("ddddddddddd".to_owned())],
            ..RawPlaylist::default()
        };
        let with_videos = RawPlaylist {
            title: "Own".to_owned(),
            playlists_and_ids: vec![
                PlaylistEntry::Playlist(child.clone()),
                PlaylistEntry::Video("bbbbbbbbbbb".to_owned()),
            ],
            ..RawPlaylist::default()
        };
        assert_eq!(resolve(&with_videos, &catalog).thumbnail(), "bbbbbbbbbbb.webp");

        let only_children = RawPlaylist::root("Parent", vec![PlaylistEntry::Playlist(child)]);
        assert_eq!(resolve(&only_children, &catalog).thumbnail(), "ddddddddddd.webp");

        let grandchildren_only = RawPlaylist::root(
            "Grand",
            vec![PlaylistEntry::Playlist(only_children.clone())],
        );
        assert_eq!(resolve(&grandchildren_only, &catalog).thumbnail(), "");
        assert!(resolve(&grandchildren_only, &catalog).has_content());
        assert!(!resolve(&RawPlaylist::root("Empty", vec![]), &catalog).has_content());
    }

    #[test]
    fn duplicate_titles_are_reported_once() {
        let catalog = catalog();
        let leaf = |title: &str| {
            PlaylistEntry::Playlist(RawPlaylist {
                title: title.to_owned(),
                ..RawPlaylist::default()
            })
        };
        let nested = RawPlaylist {
            title: "Music".to_owned(),
            playlists_and_ids: vec![leaf("Live"), leaf("AC/DC")],
            ..RawPlaylist::default()
        };
        let root = RawPlaylist::root(
            "Videos",
            vec![
                PlaylistEntry::Playlist(nested),
                leaf("Live"),
                leaf("AC_DC"),
                leaf("Live"),
            ],
        );
        let duplicates = duplicate_page_names(&resolve(&root, &catalog));
        assert_eq!(duplicates, vec!["AC_DC.html", "Live.html"]);
    }
}
