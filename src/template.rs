//! Named-slot text templates.
//!
//! Templates use `$name` or `${name}` for slots and `$$` for a literal
//! dollar sign. There is no other syntax: no loops, no conditionals, no
//! nested expansion of substituted values.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    Slot(String),
}

/// A parsed template. Parsing happens once at startup so that malformed
/// templates are reported before any page is written.
#[derive(Debug, Clone)]
pub struct Template {
    name: String,
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(name: &str, source: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = source.char_indices().peekable();

        while let Some((offset, ch)) = chars.next() {
            if ch != '$' {
                literal.push(ch);
                continue;
            }

            let slot = match chars.peek().map(|&(_, next)| next) {
                Some('$') => {
                    chars.next();
                    literal.push('$');
                    continue;
                }
                Some('{') => {
                    chars.next();
                    let mut ident = String::new();
                    loop {
                        match chars.next() {
                            Some((_, '}')) => break,
                            Some((_, c)) if is_ident_char(c, ident.is_empty()) => ident.push(c),
                            _ => bail!("template {name}: malformed placeholder at byte {offset}"),
                        }
                    }
                    if ident.is_empty() {
                        bail!("template {name}: empty placeholder at byte {offset}");
                    }
                    ident
                }
                Some(c) if is_ident_char(c, true) => {
                    let mut ident = String::new();
                    while let Some(&(_, c)) = chars.peek() {
                        if !is_ident_char(c, ident.is_empty()) {
                            break;
                        }
                        ident.push(c);
                        chars.next();
                    }
                    ident
                }
                _ => bail!("template {name}: stray '$' at byte {offset}"),
            };

            if !literal.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }
            segments.push(Segment::Slot(slot));
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            name: name.to_owned(),
            segments,
        })
    }

    pub fn load(name: &str, path: &Path) -> Result<Self> {
        let source = fs::read_to_string(path)
            .with_context(|| format!("reading template {}", path.display()))?;
        Self::parse(name, &source)
    }

    /// Names of all slots, in order of appearance, duplicates included.
    pub fn slots(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Slot(slot) => Some(slot.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Fills every slot from `values`. A slot without a value is an error;
    /// extra values are ignored.
    pub fn substitute(&self, values: &[(&str, &str)]) -> Result<String> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Slot(slot) => {
                    let value = values
                        .iter()
                        .find(|(key, _)| *key == slot.as_str())
                        .map(|(_, value)| *value);
                    match value {
                        Some(value) => out.push_str(value),
                        None => bail!("template {} has no value for ${slot}", self.name),
                    }
                }
            }
        }
        Ok(out)
    }
}

fn is_ident_char(c: char, first: bool) -> bool {
    c == '_' || c.is_ascii_alphabetic() || (!first && c.is_ascii_digit())
}

/// The five templates a site is rendered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    Main = 0,
    PlaylistsSection,
    Playlist,
    VideosSection,
    Video,
}

impl TemplateKind {
    pub const ALL: [TemplateKind; 5] = [
        TemplateKind::Main,
        TemplateKind::PlaylistsSection,
        TemplateKind::Playlist,
        TemplateKind::VideosSection,
        TemplateKind::Video,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TemplateKind::Main => "main",
            TemplateKind::PlaylistsSection => "playlists_section",
            TemplateKind::Playlist => "playlist",
            TemplateKind::VideosSection => "videos_section",
            TemplateKind::Video => "video",
        }
    }

    pub fn file_name(self) -> String {
        format!("{}.tpl.html", self.name())
    }

    fn builtin_source(self) -> &'static str {
        match self {
            TemplateKind::Main => include_str!("../templates/main.tpl.html"),
            TemplateKind::PlaylistsSection => {
                include_str!("../templates/playlists_section.tpl.html")
            }
            TemplateKind::Playlist => include_str!("../templates/playlist.tpl.html"),
            TemplateKind::VideosSection => include_str!("../templates/videos_section.tpl.html"),
            TemplateKind::Video => include_str!("../templates/video.tpl.html"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TemplateSet {
    templates: Vec<Template>,
}

impl TemplateSet {
    /// Templates compiled into the binary.
    pub fn builtin() -> Result<Self> {
        let templates = TemplateKind::ALL
            .iter()
            .map(|kind| Template::parse(kind.name(), kind.builtin_source()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { templates })
    }

    /// Loads `<dir>/<name>.tpl.html` for every template; all must exist.
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let templates = TemplateKind::ALL
            .iter()
            .map(|kind| Template::load(kind.name(), &dir.join(kind.file_name())))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { templates })
    }

    pub fn get(&self, kind: TemplateKind) -> &Template {
        // `templates` is built in `TemplateKind::ALL` order.
        &self.templates[kind as usize]
    }

    pub fn render(&self, kind: TemplateKind, values: &[(&str, &str)]) -> Result<String> {
        self.get(kind).substitute(values)
    }
}
