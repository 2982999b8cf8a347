pub mod palette;
pub mod source;

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::frontmatter::Frontmatter;

pub use palette::Palette;
pub use source::{BuiltinThemes, DirThemes, HttpThemes, Layered, ThemeSource};

static CSS_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"--([\w-]+)\s*:\s*([^;]+);").expect("valid pattern"));

static VAR_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w-]+$").expect("valid pattern"));

/// Style variables by name, without the leading `--`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleVars {
    vars: BTreeMap<String, String>,
}

impl StyleVars {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for StyleVars {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut vars = Self::default();
        for (k, v) in iter {
            vars.set(k, v);
        }
        vars
    }
}

/// Extract every `--name: value;` declaration from a stylesheet.
pub fn parse_css_vars(css: &str) -> StyleVars {
    CSS_VAR
        .captures_iter(css)
        .map(|cap| (cap[1].trim().to_string(), cap[2].trim().to_string()))
        .collect()
}

/// Load a named theme. A theme that cannot be loaded is logged and yields
/// `None`; callers keep whatever variables are already active.
pub fn resolve_theme(source: &dyn ThemeSource, name: &str) -> Option<StyleVars> {
    match source.load(name) {
        Ok(css) => {
            let vars = parse_css_vars(&css);
            tracing::debug!(theme = name, variables = vars.len(), "loaded theme");
            Some(vars)
        }
        Err(e) => {
            tracing::warn!(theme = name, "failed to load theme: {e}");
            None
        }
    }
}

/// Whether a frontmatter key is applied as a style variable.
pub fn is_style_key(key: &str) -> bool {
    !Frontmatter::is_reserved_key(key) && VAR_NAME.is_match(key)
}

/// Frontmatter keys layered over `base`, last write wins.
pub fn apply_overrides(base: &StyleVars, frontmatter: &Frontmatter) -> StyleVars {
    let mut vars = base.clone();
    for (key, value) in frontmatter.iter() {
        if is_style_key(key) {
            vars.set(key, value);
        } else {
            tracing::trace!(key, "ignoring frontmatter key");
        }
    }
    vars
}

/// The one style configuration every view reads from.
///
/// Rebuilt whenever the theme name or the frontmatter changes.
#[derive(Debug, Clone, Default)]
pub struct StyleContext {
    theme: Option<String>,
    frontmatter: Frontmatter,
    vars: StyleVars,
    generation: u64,
}

impl StyleContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vars(&self) -> &StyleVars {
        &self.vars
    }

    pub fn theme_name(&self) -> Option<&str> {
        self.theme.as_deref()
    }

    /// Bumped on every [`apply`](Self::apply).
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn needs_refresh(&self, theme: &str, frontmatter: &Frontmatter) -> bool {
        self.theme.as_deref() != Some(theme) || &self.frontmatter != frontmatter
    }

    /// Install `base` plus the frontmatter overrides. When the theme failed to
    /// load (`base` is `None`) the current variables stay and only the
    /// overrides are applied on top.
    pub fn apply(&mut self, theme: &str, base: Option<StyleVars>, frontmatter: &Frontmatter) {
        let base = base.unwrap_or_else(|| self.vars.clone());
        self.vars = apply_overrides(&base, frontmatter);
        self.theme = Some(theme.to_string());
        self.frontmatter = frontmatter.clone();
        self.generation += 1;
    }

    /// Resolve `theme` from `source` and apply it with the overrides.
    pub fn refresh(&mut self, source: &dyn ThemeSource, theme: &str, frontmatter: &Frontmatter) {
        let base = resolve_theme(source, theme);
        self.apply(theme, base, frontmatter);
    }
}
