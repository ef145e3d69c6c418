use anyhow::{Context, Result};
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::placeholder::DEFAULT_PLACEHOLDERS;

pub const DEFAULT_CONFIG_PATH: &str = "vidarchive.toml";
pub const DEFAULT_SITE_NAME: &str = "Video Archive";
pub const DEFAULT_ROOT_TITLE: &str = "Videos";
pub const DEFAULT_UPLOADS_TITLE: &str = "Uploads";
pub const DEFAULT_DOWNLOADER: &str = "yt-dlp";
pub const DEFAULT_COOKIES_FILE: &str = ".cookies-youtube-com.txt";

/// Raw contents of the optional TOML config file. Every key may be omitted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    pub site_name: Option<String>,
    pub templates_dir: Option<PathBuf>,
    pub placeholders: Option<Vec<String>>,
    pub root_title: Option<String>,
    pub uploads_title: Option<String>,
    pub downloader: Option<String>,
    pub cookies: Option<PathBuf>,
}

/// Config with every default applied.
#[derive(Debug, Clone)]
pub struct SiteSettings {
    pub site_name: String,
    /// `None` selects the templates compiled into the binary.
    pub templates_dir: Option<PathBuf>,
    pub placeholders: Vec<String>,
    pub root_title: String,
    /// Title of the top-level playlist whose videos are folded into the index.
    pub uploads_title: String,
    pub downloader: String,
    pub cookies: PathBuf,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self::from_config(SiteConfig::default())
    }
}

impl SiteSettings {
    fn from_config(cfg: SiteConfig) -> Self {
        Self {
            site_name: cfg
                .site_name
                .unwrap_or_else(|| DEFAULT_SITE_NAME.to_string()),
            templates_dir: cfg.templates_dir,
            placeholders: cfg.placeholders.unwrap_or_else(|| {
                DEFAULT_PLACEHOLDERS
                    .iter()
                    .map(|path| path.to_string())
                    .collect()
            }),
            root_title: cfg
                .root_title
                .unwrap_or_else(|| DEFAULT_ROOT_TITLE.to_string()),
            uploads_title: cfg
                .uploads_title
                .unwrap_or_else(|| DEFAULT_UPLOADS_TITLE.to_string()),
            downloader: cfg
                .downloader
                .unwrap_or_else(|| DEFAULT_DOWNLOADER.to_string()),
            cookies: cfg
                .cookies
                .unwrap_or_else(|| PathBuf::from(DEFAULT_COOKIES_FILE)),
        }
    }

    /// `<title> - <site name>`, used for the `<title>` of playlist pages.
    pub fn page_meta_title(&self, title: &str) -> String {
        format!("{title} - {}", self.site_name)
    }

    pub fn index_header_title(&self) -> String {
        format!("{} by {}", self.root_title, self.site_name)
    }

    pub fn index_meta_title(&self) -> String {
        format!("{} archive - {}", self.root_title, self.site_name)
    }
}

pub fn read_site_config(path: &Path) -> Result<Option<SiteConfig>> {
    if !path.exists() {
        return Ok(None);
    }
    let content =
        fs::read_to_string(path).with_context(|| format!("Reading {}", path.display()))?;
    let cfg: SiteConfig =
        toml::from_str(&content).with_context(|| format!("Parsing {}", path.display()))?;
    Ok(Some(cfg))
}

/// Loads the settings from the TOML file at `path`. A missing file is not an
/// error: the defaults are used instead.
pub fn load_site_settings_from(path: impl AsRef<Path>) -> Result<SiteSettings> {
    let cfg = read_site_config(path.as_ref())?.unwrap_or_default();
    Ok(SiteSettings::from_config(cfg))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn make_config(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", contents).unwrap();
        file
    }

    #[test]
    fn read_site_config_extracts_values() {
        let cfg = make_config(
            "site_name = \"Sephira Su\"\nplaceholders = [\"/a.webp\", \"/b.webp\"]\n",
        );
        let parsed = read_site_config(cfg.path()).unwrap().unwrap();
        assert_eq!(parsed.site_name.as_deref(), Some("Sephira Su"));
        assert_eq!(parsed.placeholders.unwrap().len(), 2);
        assert!(parsed.templates_dir.is_none());
    }

    #[test]
    fn load_site_settings_defaults_missing_keys() {
        let cfg = make_config("templates_dir = \"/srv/templates\"\n");
        let settings = load_site_settings_from(cfg.path()).unwrap();
        assert_eq!(settings.site_name, DEFAULT_SITE_NAME);
        assert_eq!(settings.uploads_title, DEFAULT_UPLOADS_TITLE);
        assert_eq!(settings.root_title, DEFAULT_ROOT_TITLE);
        assert_eq!(settings.downloader, DEFAULT_DOWNLOADER);
        assert_eq!(settings.placeholders.len(), DEFAULT_PLACEHOLDERS.len());
        assert_eq!(settings.templates_dir, Some(PathBuf::from("/srv/templates")));
    }

    #[test]
    fn missing_config_file_means_defaults() {
        let settings = load_site_settings_from("/definitely/not/here.toml").unwrap();
        assert_eq!(settings.site_name, DEFAULT_SITE_NAME);
        assert_eq!(settings.cookies, PathBuf::from(DEFAULT_COOKIES_FILE));
    }

    #[test]
    fn unknown_or_malformed_keys_are_errors() {
        let typo = make_config("site_nmae = \"oops\"\n");
        assert!(load_site_settings_from(typo.path()).is_err());
        let broken = make_config("site_name = [\n");
        assert!(load_site_settings_from(broken.path()).is_err());
    }

    #[test]
    fn titles_follow_site_name() {
        let settings = SiteSettings {
            site_name: "Sephira Su".to_string(),
            ..SiteSettings::default()
        };
        assert_eq!(settings.page_meta_title("Music"), "Music - Sephira Su");
        assert_eq!(settings.index_header_title(), "Videos by Sephira Su");
        assert_eq!(settings.index_meta_title(), "Videos archive - Sephira Su");
    }
}
