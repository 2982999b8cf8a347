use std::collections::BTreeMap;

pub const DEFAULT_THEME: &str = "default";
const THEME_KEY: &str = "theme";
const TITLE_KEY: &str = "title";

/// Metadata from the leading `---` block of a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frontmatter {
    entries: BTreeMap<String, String>,
}

impl Frontmatter {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Theme named by the document, `default` when absent or blank.
    pub fn theme(&self) -> &str {
        self.theme_or(DEFAULT_THEME)
    }

    /// Theme named by the document, `fallback` when absent or blank.
    pub fn theme_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.get(THEME_KEY)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(fallback)
    }

    /// Document title, if one is given.
    pub fn title(&self) -> Option<&str> {
        self.get(TITLE_KEY)
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    /// Keys that describe the document rather than its style.
    pub fn is_reserved_key(key: &str) -> bool {
        key == THEME_KEY || key == TITLE_KEY
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Frontmatter {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fm = Self::default();
        for (k, v) in iter {
            fm.insert(k, v);
        }
        fm
    }
}

/// Separate a leading metadata block from the document body.
///
/// The block must open on the very first line with `---` and close with a
/// `---` (or `...`) line. Without a complete block the body is returned
/// untouched.
pub fn split(raw: &str) -> (Frontmatter, String) {
    let Some((yaml, body)) = locate_block(raw) else {
        return (Frontmatter::default(), raw.to_string());
    };
    (parse_block(yaml), body.to_string())
}

/// Returns `(block, body)` slices of `raw` when it starts with a metadata block.
fn locate_block(raw: &str) -> Option<(&str, &str)> {
    let content = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let mut lines = content.split_inclusive('\n');

    let opening = lines.next()?;
    if !opening.ends_with('\n') || opening.trim_end() != "---" {
        return None;
    }

    let block_start = opening.len();
    let mut offset = block_start;
    for line in lines {
        let trimmed = line.trim_end();
        if trimmed == "---" || trimmed == "..." {
            let block = &content[block_start..offset];
            let body = &content[offset + line.len()..];
            return Some((block, body));
        }
        offset += line.len();
    }
    None
}

fn parse_block(yaml: &str) -> Frontmatter {
    if yaml.trim().is_empty() {
        return Frontmatter::default();
    }

    let mapping: serde_yaml::Mapping = match serde_yaml::from_str(yaml) {
        Ok(m) => m,
        Err(e) => {
            tracing::debug!("frontmatter is not a YAML mapping ({e}), reading key: value lines");
            return parse_block_manual(yaml);
        }
    };

    mapping
        .iter()
        .filter_map(|(key, value)| Some((scalar_to_string(key)?, scalar_to_string(value)?)))
        .collect()
}

fn scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Fallback: parse key: value lines manually
fn parse_block_manual(yaml: &str) -> Frontmatter {
    yaml.lines()
        .filter_map(|line| {
            let (key, value) = line.trim().split_once(':')?;
            let key = key.trim();
            if key.is_empty() || key.starts_with('#') {
                return None;
            }
            Some((key.to_string(), value.trim().trim_matches('"').to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_frontmatter() {
        let content = "---\ntheme: dark\ncolor: \"#fff\"\n---\n\n# Slide";
        let (fm, body) = split(content);
        assert_eq!(fm.get("theme"), Some("dark"));
        assert_eq!(fm.get("color"), Some("#fff"));
        assert_eq!(body, "\n# Slide");
    }

    #[test]
    fn test_reserved_keys() {
        let (fm, _) = split("---\ntitle: \"  Q3 Review \"\ntheme: dark\n---\nBody");
        assert_eq!(fm.title(), Some("Q3 Review"));
        assert!(Frontmatter::is_reserved_key("title"));
        assert!(Frontmatter::is_reserved_key("theme"));
        assert!(!Frontmatter::is_reserved_key("color"));
        assert_eq!(Frontmatter::default().title(), None);
    }

    #[test]
    fn test_no_frontmatter() {
        let content = "# Just a slide\n\nSome content";
        let (fm, body) = split(content);
        assert!(fm.is_empty());
        assert_eq!(body, content);
    }

    #[test]
    fn test_split_is_idempotent_without_frontmatter() {
        let content = "  leading spaces\n\n---\nnot frontmatter\n---\n";
        let (fm, body) = split(content);
        assert!(fm.is_empty());
        assert_eq!(body, content);
        let (fm, again) = split(&body);
        assert!(fm.is_empty());
        assert_eq!(again, body);
    }

    #[test]
    fn test_unclosed_block_is_body() {
        let content = "---\ntheme: dark\n# Slide";
        let (fm, body) = split(content);
        assert!(fm.is_empty());
        assert_eq!(body, content);
    }

    #[test]
    fn test_empty_block() {
        let (fm, body) = split("---\n---\nBody");
        assert!(fm.is_empty());
        assert_eq!(body, "Body");
    }

    #[test]
    fn test_dots_close_block() {
        let (fm, body) = split("---\nfont-size: 3em\n...\nBody");
        assert_eq!(fm.get("font-size"), Some("3em"));
        assert_eq!(body, "Body");
    }

    #[test]
    fn test_crlf_block() {
        let (fm, body) = split("---\r\ntheme: dark\r\n---\r\nBody\r\n");
        assert_eq!(fm.theme(), "dark");
        assert_eq!(body, "Body\r\n");
    }

    #[test]
    fn test_non_string_scalars() {
        let (fm, _) = split("---\nscale: 2\nshadow: false\nlist: [1, 2]\nempty:\n---\n");
        assert_eq!(fm.get("scale"), Some("2"));
        assert_eq!(fm.get("shadow"), Some("false"));
        assert_eq!(fm.get("list"), None);
        assert_eq!(fm.get("empty"), None);
    }

    #[test]
    fn test_manual_fallback() {
        let (fm, _) = split("---\ncolor: red\n  bad: [indent\n---\n");
        assert_eq!(fm.get("color"), Some("red"));
    }

    #[test]
    fn test_theme_defaults() {
        assert_eq!(Frontmatter::default().theme(), DEFAULT_THEME);
        let fm: Frontmatter = [("theme", "  ")].into_iter().collect();
        assert_eq!(fm.theme(), DEFAULT_THEME);
        assert_eq!(fm.theme_or("dark"), "dark");
        let named: Frontmatter = [("theme", " neon ")].into_iter().collect();
        assert_eq!(named.theme_or("dark"), "neon");
    }
}
