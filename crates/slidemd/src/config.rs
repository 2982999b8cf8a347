use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::remote::{BuiltinStatic, HashStore, HttpHashStore, HttpStatic, StaticSource};
use crate::session::Mode;
use crate::theme::{BuiltinThemes, DirThemes, HttpThemes, Layered, ThemeSource};

const FILENAME: &str = "config.yaml";
const APP_DIR: &str = "slidemd";

pub const DEFAULT_ORIGIN: &str = "http://localhost:3000";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<RemoteConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub themes: Option<ThemesConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Theme used when a document names none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_mode: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Base URL share links are built on; also serves themes and static docs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,

    /// Hash store endpoint. Defaults to `{origin}/api`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThemesConfig {
    /// Directory searched for `{name}.css` before the built-in themes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

impl Config {
    pub fn path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|d| d.join(APP_DIR).join(FILENAME))
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
    }

    pub fn load() -> Result<Self> {
        let path = Self::path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                anyhow::anyhow!("No config found. Run `slidemd config show` to see defaults.")
            } else {
                anyhow::anyhow!("Failed to read config: {e}")
            }
        })?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::debug!("using default config: {e}");
            Self::default()
        })
    }

    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let yaml = serde_yaml::to_string(self)?;
        let contents = format!("# slidemd configuration\n{yaml}");
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "defaults.theme" => {
                let plain = value
                    .chars()
                    .all(|c| c.is_alphanumeric() || c == '-' || c == '_');
                if value.is_empty() || !plain {
                    anyhow::bail!(
                        "Invalid theme: {value}. Use a plain name such as 'default' or 'dark'."
                    );
                }
                self.defaults
                    .get_or_insert_with(DefaultsConfig::default)
                    .theme = Some(value.to_string());
            }
            "defaults.start_mode" => {
                if value != "view" && value != "edit" {
                    anyhow::bail!("Invalid start_mode: {value}. Must be 'view' or 'edit'.");
                }
                self.defaults
                    .get_or_insert_with(DefaultsConfig::default)
                    .start_mode = Some(value.to_string());
            }
            "remote.origin" | "remote.store_url" => {
                let parsed = url::Url::parse(value)
                    .map_err(|e| anyhow::anyhow!("Invalid URL for {key}: {e}"))?;
                if !matches!(parsed.scheme(), "http" | "https") {
                    anyhow::bail!("Invalid URL for {key}: {value}. Must be http or https.");
                }
                let remote = self.remote.get_or_insert_with(RemoteConfig::default);
                let value = Some(value.trim_end_matches('/').to_string());
                if key == "remote.origin" {
                    remote.origin = value;
                } else {
                    remote.store_url = value;
                }
            }
            "themes.dir" => {
                self.themes.get_or_insert_with(ThemesConfig::default).dir =
                    Some(PathBuf::from(value));
            }
            _ => anyhow::bail!(
                "Unknown config key: {key}. Valid keys: defaults.theme, defaults.start_mode, \
                 remote.origin, remote.store_url, themes.dir"
            ),
        }
        Ok(())
    }

    pub fn default_theme(&self) -> Option<&str> {
        self.defaults.as_ref().and_then(|d| d.theme.as_deref())
    }

    pub fn start_mode(&self) -> Mode {
        self.defaults
            .as_ref()
            .and_then(|d| d.start_mode.as_deref())
            .map(Mode::from_name)
            .unwrap_or_default()
    }

    pub fn origin(&self) -> &str {
        self.configured_origin().unwrap_or(DEFAULT_ORIGIN)
    }

    pub fn store_url(&self) -> String {
        self.remote
            .as_ref()
            .and_then(|r| r.store_url.clone())
            .unwrap_or_else(|| format!("{}/api", self.origin()))
    }

    /// Configured theme directory, then the configured origin's `/theme/`,
    /// then the built-in themes.
    pub fn theme_source(&self, offline: bool) -> Layered {
        self.theme_source_at(self.configured_origin(), offline)
    }

    /// Like [`Config::theme_source`], asking `origin` instead. Without an
    /// origin only local themes are consulted.
    pub fn theme_source_at(&self, origin: Option<&str>, offline: bool) -> Layered {
        let mut sources: Vec<Box<dyn ThemeSource>> = Vec::new();
        if let Some(dir) = self.themes.as_ref().and_then(|t| t.dir.clone()) {
            sources.push(Box::new(DirThemes::new(dir)));
        }
        if let Some(origin) = origin.filter(|_| !offline) {
            sources.push(Box::new(HttpThemes::new(origin)));
        }
        sources.push(Box::new(BuiltinThemes));
        Layered::new(sources)
    }

    /// Origin set in the config file, if any.
    pub fn configured_origin(&self) -> Option<&str> {
        self.remote.as_ref().and_then(|r| r.origin.as_deref())
    }

    /// Static documents served next to `origin`, or the built-in ones when
    /// there is no origin to ask.
    pub fn static_source(origin: Option<&str>, offline: bool) -> Box<dyn StaticSource> {
        match origin {
            Some(origin) if !offline => Box::new(HttpStatic::new(origin)),
            _ => Box::new(BuiltinStatic),
        }
    }

    pub fn store(&self) -> Box<dyn HashStore> {
        Box::new(HttpHashStore::new(self.store_url()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(FILENAME);

        let mut config = Config::default();
        config.set("defaults.theme", "dark").unwrap();
        config.set("defaults.start_mode", "edit").unwrap();
        config.set("remote.origin", "https://slides.example.org/").unwrap();
        config.set("themes.dir", "/tmp/themes").unwrap();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.default_theme(), Some("dark"));
        assert_eq!(loaded.start_mode(), Mode::Edit);
        assert_eq!(loaded.origin(), "https://slides.example.org");
        assert_eq!(loaded.store_url(), "https://slides.example.org/api");
        assert_eq!(
            loaded.themes.and_then(|t| t.dir),
            Some(PathBuf::from("/tmp/themes"))
        );
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.default_theme(), None);
        assert_eq!(config.start_mode(), Mode::View);
        assert_eq!(config.origin(), DEFAULT_ORIGIN);
        assert_eq!(config.store_url(), "http://localhost:3000/api");
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = Config::default();
        assert!(config.set("defaults.start_mode", "overview").is_err());
        assert!(config.set("defaults.theme", "../etc").is_err());
        assert!(config.set("remote.origin", "ftp://x.example").is_err());
        assert!(config.set("remote.store_url", "not a url").is_err());
        assert!(config.set("nope", "x").is_err());
        assert!(config.defaults.is_none());
        assert!(config.remote.is_none());
    }

    #[test]
    fn test_missing_file_is_friendly_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load_from(&dir.path().join("absent.yaml")).unwrap_err();
        assert!(err.to_string().contains("slidemd config show"));
    }

    #[test]
    fn test_static_source_without_origin_is_builtin() {
        let statics = Config::static_source(None, false);
        assert!(statics.load(crate::session::INFO_DOCUMENT_NAME).is_ok());
        let offline = Config::static_source(Some("http://localhost:9"), true);
        assert!(offline.load(crate::session::INFO_DOCUMENT_NAME).is_ok());
    }

    #[test]
    fn test_unconfigured_theme_source_skips_network() {
        let source = Config::default().theme_source(false);
        assert_eq!(source.len(), 1);
        let vars = crate::theme::resolve_theme(&source, "dark").unwrap();
        assert!(vars.get("background").is_some());

        let mut config = Config::default();
        config.set("remote.origin", "https://slides.example.org").unwrap();
        assert_eq!(config.theme_source(false).len(), 2);
        assert_eq!(config.theme_source(true).len(), 1);
        assert_eq!(
            Config::default()
                .theme_source_at(Some("https://slides.example.org"), false)
                .len(),
            2
        );
    }

    #[test]
    fn test_offline_theme_source_uses_builtins() {
        let source = Config::default().theme_source(true);
        assert!(source.load("dark").unwrap().contains("--background"));
    }
}
