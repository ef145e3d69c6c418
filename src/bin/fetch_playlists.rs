#![forbid(unsafe_code)]

//! Fetches a channel's playlist tree with the downloader's flat-playlist mode
//! and stores it as the `playlists.json` consumed by `build_site`.
//!
//! Every listed entry with an 11-character id is a video. Anything else is a
//! nested listing (a tab of the channel, a playlist) and is fetched
//! recursively through its URL.

use anyhow::{Context, Result, bail};
use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vidarchive_tools::config::{DEFAULT_CONFIG_PATH, load_site_settings_from};
use vidarchive_tools::playlist::{PlaylistEntry, RawPlaylist};
use vidarchive_tools::process::ensure_program_available;

const VIDEO_ID_LEN: usize = 11;

#[derive(Parser, Debug)]
#[command(author, version, about = "Fetch the nested playlist tree of a channel.")]
struct Cli {
    #[arg(value_name = "URL_OR_ID", help = "Channel or playlist URL (or id)")]
    url: String,
    #[arg(
        short = 'o',
        long = "output",
        value_name = "PATH",
        default_value = "playlists.json",
        help = "Where to write the playlist tree"
    )]
    output: PathBuf,
    #[arg(long = "config", value_name = "PATH", default_value = DEFAULT_CONFIG_PATH, help = "Path to the config file")]
    config: PathBuf,
}

/// The handful of fields kept from each `--flat-playlist -j` line.
#[derive(Debug, Deserialize)]
struct FlatEntry {
    id: Option<String>,
    url: Option<String>,
    title: Option<String>,
}

/// Downloader invocation shared by every (recursive) listing.
struct Downloader {
    program: String,
    cookies: PathBuf,
}

impl Downloader {
    /// Runs `<program> -j --flat-playlist <url>` and returns its stdout.
    fn list(&self, url_or_id: &str) -> Result<String> {
        let mut command = Command::new(&self.program);
        if self.cookies.exists() {
            command.arg("--cookies").arg(&self.cookies);
        }
        command.arg("-j").arg("--flat-playlist").arg(url_or_id);

        let output = command
            .output()
            .with_context(|| format!("retrieving playlist from {}", url_or_id))?;

        if !output.status.success() {
            bail!(
                "failed to list {} (status: {})",
                url_or_id,
                output.status
            );
        }

        String::from_utf8(output.stdout).context("parsing playlist listing as UTF-8")
    }
}

/// Builds the tree below `url_or_id`, asking `list` for each level.
fn fetch_playlist<F>(url_or_id: &str, list: &mut F) -> Result<Vec<PlaylistEntry>>
where
    F: FnMut(&str) -> Result<String>,
{
    info!("Downloading playlist {}", url_or_id);
    let listing = list(url_or_id)?;

    let mut entries = Vec::new();
    for line in listing.lines().map(str::trim).filter(|line| !line.is_empty()) {
        let entry: FlatEntry = serde_json::from_str(line)
            .with_context(|| format!("parsing listing entry of {}", url_or_id))?;

        if let Some(id) = entry.id.as_deref()
            && id.chars().count() == VIDEO_ID_LEN
        {
            entries.push(PlaylistEntry::Video(id.to_owned()));
            continue;
        }

        let Some(url) = entry.url.clone() else {
            warn!(
                "Skipping entry {:?} of {}: it is neither a video nor has a URL",
                entry.title.as_deref().unwrap_or_default(),
                url_or_id
            );
            continue;
        };
        let children = fetch_playlist(&url, list)?;
        entries.push(PlaylistEntry::Playlist(RawPlaylist {
            id: entry.id.unwrap_or_default(),
            url,
            title: entry.title.unwrap_or_default(),
            playlists_and_ids: children,
        }));
    }

    Ok(entries)
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
    let settings = load_site_settings_from(&cli.config)?;
    ensure_program_available(&settings.downloader)?;

    let downloader = Downloader {
        program: settings.downloader,
        cookies: settings.cookies,
    };
    let entries = fetch_playlist(&cli.url, &mut |url: &str| downloader.list(url))?;

    let json = serde_json::to_string(&entries).context("serializing playlists")?;
    fs::write(&cli.output, json).with_context(|| format!("writing {}", cli.output.display()))?;
    info!("Wrote {} top-level entries to {}", entries.len(), cli.output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    #[cfg(unix)]
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;
    use tempfile::tempdir;

    fn listings() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            (
                "https://www.youtube.com/@chan",
                concat!(
                    r#"{"id": "UCchannel-videos", "url": "https://www.youtube.com/@chan/videos", "title": "Uploads", "view_count": 3}"#,
                    "\n",
                    r#"{"id": "PLallplaylists", "url": "https://www.youtube.com/@chan/playlists", "title": "Playlists"}"#,
                    "\n"
                ),
            ),
            (
                "https://www.youtube.com/@chan/videos",
                "{\"id\": \"aaaaaaaaaaa\"}\n\n{\"id\": \"bbbbbbbbbbb\"}\n",
            ),
            (
                "https://www.youtube.com/@chan/playlists",
                r#"{"id": "PL1", "url": "https://www.youtube.com/playlist?list=PL1", "title": "Live"}
{"title": "orphan without url"}"#,
            ),
            ("https://www.youtube.com/playlist?list=PL1", "{\"id\": \"bbbbbbbbbbb\"}"),
        ])
    }

    #[test]
    fn fetch_recurses_into_nested_listings() -> Result<()> {
        let listings = listings();
        let mut calls = Vec::new();
        let entries = fetch_playlist("https://www.youtube.com/@chan", &mut |url: &str| {
            calls.push(url.to_owned());
            listings
                .get(url)
                .map(|listing| listing.to_string())
                .ok_or_else(|| anyhow::anyhow!("unexpected url {url}"))
        })?;

        assert_eq!(calls.len(), 4);
        let json = serde_json::to_value(&entries)?;
        assert_eq!(
            json,
            serde_json::json!([
                {
                    "id": "UCchannel-videos",
                    "url": "https://www.youtube.com/@chan/videos",
                    "title": "Uploads",
                    "playlists_and_ids": ["aaaaaaaaaaa", "bbbbbbbbbbb"]
                },
                {
                    "id": "PLallplaylists",
                    "url": "https://www.youtube.com/@chan/playlists",
                    "title": "Playlists",
                    "playlists_and_ids": [
                        {
                            "id": "PL1",
                            "url": "https://www.youtube.com/playlist?list=PL1",
                            "title": "Live",
                            "playlists_and_ids": ["bbbbbbbbbbb"]
                        }
                    ]
                }
            ])
        );
        Ok(())
    }

    #[test]
    fn malformed_listing_lines_are_fatal() {
        let result = fetch_playlist("x", &mut |_| Ok("not json\n".to_string()));
        assert!(result.is_err());
    }

    fn install_downloader_stub(dir: &Path) -> Result<PathBuf> {
        let script_path = dir.join("yt-dlp");
        let script = r#"#!/usr/bin/env bash
set -euo pipefail
for arg in "$@"; do last="$arg"; done
case "$last" in
    root) echo '{"id": "PLx", "url": "nested", "title": "Nested"}' ;;
    nested) echo '{"id": "ccccccccccc"}' ;;
    *) exit 3 ;;
esac
"#;
        fs::write(&script_path, script)?;
        #[cfg(unix)]
        {
            let mut perms = fs::metadata(&script_path)?.permissions();
            perms.set_mode(0o755);
            fs::set_permissions(&script_path, perms)?;
        }
        Ok(script_path)
    }

    #[cfg(unix)]
    #[test]
    fn downloader_stub_drives_the_fetch() -> Result<()> {
        let temp = tempdir()?;
        let downloader = Downloader {
            program: install_downloader_stub(temp.path())?
                .to_string_lossy()
                .into_owned(),
            cookies: temp.path().join("missing-cookies.txt"),
        };

        let entries = fetch_playlist("root", &mut |url: &str| downloader.list(url))?;
        match entries.as_slice() {
            [PlaylistEntry::Playlist(nested)] => {
                assert_eq!(nested.title, "Nested");
                assert_eq!(
                    nested.playlists_and_ids,
                    vec![PlaylistEntry::Video("ccccccccccc".to_owned())]
                );
            }
            other => panic!("unexpected entries {other:?}"),
        }

        assert!(downloader.list("unknown").is_err());
        Ok(())
    }
}
