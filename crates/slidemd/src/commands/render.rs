use anyhow::Result;
use colored::Colorize;
use std::path::Path;

use crate::config::Config;
use crate::deck::Deck;
use crate::deck::html::render_document;
use crate::session::Session;
use crate::theme::ThemeSource;

pub fn run(file: &Path, output: Option<&Path>, theme: Option<String>, offline: bool) -> Result<()> {
    let config = Config::load_or_default();
    let raw = super::read_document(file)?;
    let fallback = theme
        .or_else(|| config.default_theme().map(str::to_string))
        .unwrap_or_else(|| crate::frontmatter::DEFAULT_THEME.to_string());
    let title = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "slidemd".to_string());

    let html = render_html(&raw, &fallback, &config.theme_source(offline), &title);
    super::write_output(output, &html)?;
    if let Some(path) = output {
        eprintln!("{} {}", "Rendered".green().bold(), path.display());
    }
    Ok(())
}

/// Standalone HTML for a document, styled through the same context the
/// viewer uses.
pub fn render_html(
    raw: &str,
    fallback_theme: &str,
    themes: &dyn ThemeSource,
    title: &str,
) -> String {
    let mut session = Session::default().with_default_theme(fallback_theme);
    session.set_content(raw);
    session.refresh_style(themes);
    let deck: &Deck = session.deck();
    let title = deck.frontmatter.title().unwrap_or(title).to_string();
    render_document(deck, session.style().vars(), &title)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::BuiltinThemes;

    #[test]
    fn test_render_html_applies_theme_and_overrides() {
        let html = render_html(
            "---\ntheme: dark\naccent: red\n---\n# A\n\nhello",
            "default",
            &BuiltinThemes,
            "talk",
        );
        assert!(html.contains("--background: #1e1e1e;"));
        assert!(html.contains("--accent: red;"));
        assert!(html.contains("<title>talk</title>"));
        assert!(html.contains("<p>hello</p>"));
    }

    #[test]
    fn test_title_is_not_a_style_variable() {
        let html = render_html(
            "---\ntitle: My Talk\n---\nhi",
            "default",
            &BuiltinThemes,
            "talk",
        );
        assert!(html.contains("<title>My Talk</title>"));
        assert!(!html.contains("--title"));
    }

    #[test]
    fn test_unknown_theme_still_renders() {
        let html = render_html("---\ntheme: neon\n---\nhi", "default", &BuiltinThemes, "t");
        assert!(html.contains("<p>hi</p>"));
    }
}
