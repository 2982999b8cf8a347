use std::path::PathBuf;

use crate::remote::{self, FetchError};

/// Somewhere theme stylesheets can be loaded from by name.
pub trait ThemeSource: Send + Sync {
    fn load(&self, name: &str) -> Result<String, FetchError>;
}

/// Themes compiled into the binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinThemes;

impl BuiltinThemes {
    pub const NAMES: [&'static str; 2] = ["default", "dark"];
}

impl ThemeSource for BuiltinThemes {
    fn load(&self, name: &str) -> Result<String, FetchError> {
        match name {
            "default" => Ok(include_str!("../../themes/default.css").to_string()),
            "dark" => Ok(include_str!("../../themes/dark.css").to_string()),
            _ => Err(FetchError::Missing(format!("theme {name}"))),
        }
    }
}

/// `{dir}/{name}.css` on disk.
#[derive(Debug, Clone)]
pub struct DirThemes {
    dir: PathBuf,
}

impl DirThemes {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ThemeSource for DirThemes {
    fn load(&self, name: &str) -> Result<String, FetchError> {
        remote::read_in_dir(&self.dir, &format!("{name}.css"))
    }
}

/// `GET {origin}/theme/{name}.css`.
#[derive(Debug, Clone)]
pub struct HttpThemes {
    origin: String,
}

impl HttpThemes {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into().trim_end_matches('/').to_string(),
        }
    }
}

impl ThemeSource for HttpThemes {
    fn load(&self, name: &str) -> Result<String, FetchError> {
        if name.contains(['/', '\\', '?', '#']) {
            return Err(FetchError::Missing(format!("theme {name}")));
        }
        remote::fetch_text(&format!("{}/theme/{name}.css", self.origin))
    }
}

/// Tries each source in order; the first that loads wins.
pub struct Layered {
    sources: Vec<Box<dyn ThemeSource>>,
}

impl Layered {
    pub fn new(sources: Vec<Box<dyn ThemeSource>>) -> Self {
        Self { sources }
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl ThemeSource for Layered {
    fn load(&self, name: &str) -> Result<String, FetchError> {
        let mut last = FetchError::Missing(format!("theme {name}"));
        for source in &self.sources {
            match source.load(name) {
                Ok(css) => return Ok(css),
                Err(e) => {
                    tracing::debug!(theme = name, "theme source skipped: {e}");
                    last = e;
                }
            }
        }
        Err(last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::parse_css_vars;

    #[test]
    fn test_builtin_themes_parse() {
        for name in BuiltinThemes::NAMES {
            let vars = parse_css_vars(&BuiltinThemes.load(name).unwrap());
            assert!(vars.get("background").is_some(), "{name}");
            assert!(vars.get("color").is_some(), "{name}");
        }
        assert!(BuiltinThemes.load("neon").is_err());
    }

    #[test]
    fn test_dir_themes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("neon.css"), "--color: #0f0;").unwrap();
        let source = DirThemes::new(dir.path());
        assert_eq!(source.load("neon").unwrap(), "--color: #0f0;");
        assert!(source.load("../neon").is_err());
        assert!(source.load("absent").is_err());
    }

    #[test]
    fn test_layered_falls_through() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("dark.css"), "--color: #111;").unwrap();
        let layered = Layered::new(vec![
            Box::new(DirThemes::new(dir.path())),
            Box::new(BuiltinThemes),
        ]);
        assert_eq!(layered.load("dark").unwrap(), "--color: #111;");
        assert!(layered.load("default").unwrap().contains("--background"));
        assert!(matches!(layered.load("neon"), Err(FetchError::Missing(_))));
    }

    #[test]
    fn test_http_themes_reject_paths() {
        let source = HttpThemes::new("http://localhost:9/");
        assert!(matches!(source.load("a/b"), Err(FetchError::Missing(_))));
    }
}
