//! Turns a resolved playlist tree into HTML pages.
//!
//! Every playlist with content gets its own page, named after its title, with
//! a section of cards linking to its child playlists followed by a section of
//! its own videos. Pages are produced depth-first, children before parents.
//! The root is special: its page becomes `index.html`, and the top-level
//! playlist titled like the configured uploads playlist is folded into that
//! index instead of getting a page of its own.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::SiteSettings;
use crate::format::{
    escape_text, format_local_date, href, human_readable_size, human_readable_time,
    raw_timestamp, view_count_label,
};
use crate::metadata::VideoRecord;
use crate::placeholder::PlaceholderSelector;
use crate::playlist::ResolvedPlaylist;
use crate::template::{TemplateKind, TemplateSet};

pub const INDEX_FILE_NAME: &str = "index.html";

/// A finished page, ready to be written into the output folder.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPage {
    pub file_name: String,
    pub html: String,
}

pub struct SiteRenderer {
    templates: TemplateSet,
    placeholders: PlaceholderSelector,
    settings: SiteSettings,
    format_date: fn(f64) -> String,
}

impl SiteRenderer {
    pub fn new(
        templates: TemplateSet,
        placeholders: PlaceholderSelector,
        settings: SiteSettings,
    ) -> Self {
        Self {
            templates,
            placeholders,
            settings,
            format_date: format_local_date,
        }
    }

    /// Replaces the local-time date formatter, mostly so tests do not depend
    /// on the machine's time zone.
    pub fn with_date_formatter(mut self, format_date: fn(f64) -> String) -> Self {
        self.format_date = format_date;
        self
    }

    /// Renders every page of the site. The index page is always last.
    pub fn render_site(&mut self, root: &ResolvedPlaylist<'_>) -> Result<Vec<RenderedPage>> {
        let mut pages = Vec::new();
        let mut cards = String::new();
        let mut uploads = None;

        for child in &root.playlists {
            if uploads.is_none() && child.title == self.settings.uploads_title {
                info!("Folding {} into the index", child.title);
                for nested in &child.playlists {
                    if nested.has_content() {
                        self.render_playlist(nested, &mut pages)?;
                    }
                }
                uploads = Some(if child.videos.is_empty() {
                    String::new()
                } else {
                    self.videos_fragment(&child.videos)?
                });
                continue;
            }
            if child.has_content() {
                self.render_playlist(child, &mut pages)?;
            }
            cards.push_str(&self.playlist_card(child)?);
        }

        let mut content = self
            .templates
            .render(TemplateKind::PlaylistsSection, &[("playlists", cards.as_str())])?;
        if !root.videos.is_empty() {
            content.push_str(&self.videos_fragment(&root.videos)?);
        }
        content.push_str(&format!(
            "<h2>{}</h2>",
            escape_text(&self.settings.uploads_title)
        ));
        content.push_str(&uploads.unwrap_or_default());

        if pages.iter().any(|page| page.file_name == INDEX_FILE_NAME) {
            warn!("A playlist page is named {INDEX_FILE_NAME}; the site index replaces it");
        }

        let html = self.page(
            &self.settings.index_header_title(),
            &self.settings.index_meta_title(),
            &content,
        )?;
        pages.push(RenderedPage {
            file_name: INDEX_FILE_NAME.to_string(),
            html,
        });
        Ok(pages)
    }

    /// Renders `playlist`'s descendants and then its own page.
    fn render_playlist(
        &mut self,
        playlist: &ResolvedPlaylist<'_>,
        pages: &mut Vec<RenderedPage>,
    ) -> Result<()> {
        let content = self.render_contents(playlist, pages)?;
        info!("Creating HTML for {}", playlist.title);
        let html = self.page(
            &playlist.title,
            &self.settings.page_meta_title(&playlist.title),
            &content,
        )?;
        pages.push(RenderedPage {
            file_name: playlist.page_file_name(),
            html,
        });
        Ok(())
    }

    /// Body of `playlist`'s page. Child pages are pushed onto `pages` first.
    fn render_contents(
        &mut self,
        playlist: &ResolvedPlaylist<'_>,
        pages: &mut Vec<RenderedPage>,
    ) -> Result<String> {
        let mut content = String::new();

        if !playlist.playlists.is_empty() {
            let mut cards = String::new();
            for child in &playlist.playlists {
                if child.has_content() {
                    self.render_playlist(child, pages)?;
                }
                cards.push_str(&self.playlist_card(child)?);
            }
            content.push_str(
                &self
                    .templates
                    .render(TemplateKind::PlaylistsSection, &[("playlists", cards.as_str())])?,
            );
        }

        if !playlist.videos.is_empty() {
            content.push_str(&self.videos_fragment(&playlist.videos)?);
        }

        Ok(content)
    }

    pub fn videos_fragment(&mut self, videos: &[&VideoRecord]) -> Result<String> {
        let mut cards = String::new();
        for video in videos {
            cards.push_str(&self.video_card(video)?);
        }
        self.templates
            .render(TemplateKind::VideosSection, &[("videos", cards.as_str())])
    }

    pub fn video_card(&mut self, video: &VideoRecord) -> Result<String> {
        let title = if video.title.is_empty() {
            &video.id
        } else {
            &video.title
        };
        let media = &video.video;
        let title = escape_text(title);
        let placeholder = self.placeholders.next().unwrap_or_default();
        let thumbnail = href(&video.thumbnail);
        let video_href = href(&media.path);
        let timestamp = raw_timestamp(media.mtime);
        let date = (self.format_date)(media.mtime);
        let size = human_readable_size(media.size);
        let length = human_readable_time(media.duration);
        let description_href = href(&video.description);
        let views = view_count_label(video.view_count);

        self.templates.render(
            TemplateKind::Video,
            &[
                ("title", title.as_str()),
                ("placeholder", placeholder.as_str()),
                ("thumbnail", thumbnail.as_str()),
                ("video", video_href.as_str()),
                ("timestamp", timestamp.as_str()),
                ("date", date.as_str()),
                ("video_size", size.as_str()),
                ("video_length", length.as_str()),
                ("description_href", description_href.as_str()),
                ("views", views.as_str()),
            ],
        )
    }

    pub fn playlist_card(&mut self, playlist: &ResolvedPlaylist<'_>) -> Result<String> {
        let title = escape_text(&playlist.title);
        let placeholder = self.placeholders.next().unwrap_or_default();
        let thumbnail = href(playlist.thumbnail());
        let videos_href = href(&playlist.page_file_name());

        self.templates.render(
            TemplateKind::Playlist,
            &[
                ("title", title.as_str()),
                ("placeholder", placeholder.as_str()),
                ("thumbnail", thumbnail.as_str()),
                ("videos_href", videos_href.as_str()),
            ],
        )
    }

    /// Wraps `content` in the main layout. Titles are escaped here.
    fn page(&self, header_title: &str, meta_title: &str, content: &str) -> Result<String> {
        let header_title = escape_text(header_title);
        let meta_title = escape_text(meta_title);
        self.templates.render(
            TemplateKind::Main,
            &[
                ("content", content),
                ("header_title", header_title.as_str()),
                ("metatitle", meta_title.as_str()),
            ],
        )
    }
}

/// Writes every page into `output_dir`, creating the folder itself if needed
/// but nothing below it.
pub fn write_pages(output_dir: &Path, pages: &[RenderedPage]) -> Result<()> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("creating {}", output_dir.display()))?;
    for page in pages {
        let path = output_dir.join(&page.file_name);
        fs::write(&path, &page.html).with_context(|| format!("writing {}", path.display()))?;
    }
    Ok(())
}
