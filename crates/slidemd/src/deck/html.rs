use std::fmt::Write;

use super::{Deck, Fragment, FragmentContent, Inline};
use crate::theme::StyleVars;

const PAGE_CSS: &str = "\
html, body { margin: 0; height: 100%; }
body { background: var(--background, #fff); color: var(--color, #222); font-size: var(--font-size, 2em); font-family: var(--font-family, sans-serif); }
section { display: contents; }
div.page { display: none; min-height: 100vh; box-sizing: border-box; padding: 8vh 8vw; align-items: center; justify-content: center; flex-direction: column; }
div.page.active { display: flex; }
div.page img { max-width: 100%; max-height: 84vh; }
code { background: var(--code-background, #eee); }
a { color: var(--accent, #1a6bb5); }
";

const NAV_SCRIPT: &str = "\
const pages = Array.from(document.querySelectorAll('div.page'));
let current = 0;
const show = (index) => pages.forEach((page, i) => page.classList.toggle('active', i === index));
document.addEventListener('keydown', (e) => {
  if (e.key === 'ArrowRight' && current < pages.length - 1) { current += 1; show(current); }
  else if (e.key === 'ArrowLeft' && current > 0) { current -= 1; show(current); }
});
show(current);
";

impl Fragment {
    /// HTML for this fragment: a `div.page` wrapping its paragraphs or image.
    pub fn to_html(&self) -> String {
        let mut out = String::from("<div class=\"page\">");
        match &self.content {
            FragmentContent::Text { lines } => {
                for line in lines {
                    out.push_str("<p>");
                    push_inlines(&mut out, line);
                    out.push_str("</p>");
                }
            }
            FragmentContent::Image { url } => {
                let _ = write!(out, "<img src=\"{}\" alt=\"Image\" />", escape(url));
            }
        }
        out.push_str("</div>");
        out
    }
}

fn push_inlines(out: &mut String, inlines: &[Inline]) {
    for inline in inlines {
        match inline {
            Inline::Text(s) => out.push_str(&escape(s)),
            Inline::Bold(children) => wrap(out, "strong", children),
            Inline::Italic(children) => wrap(out, "em", children),
            Inline::Strikethrough(children) => wrap(out, "del", children),
            Inline::Code(s) => {
                let _ = write!(out, "<code>{}</code>", escape(s));
            }
            Inline::Link { text, url } => {
                let _ = write!(
                    out,
                    "<a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\">",
                    escape(url)
                );
                push_inlines(out, text);
                out.push_str("</a>");
            }
            Inline::Image { alt, url } => {
                let _ = write!(out, "<img src=\"{}\" alt=\"{}\" />", escape(url), escape(alt));
            }
        }
    }
}

fn wrap(out: &mut String, tag: &str, children: &[Inline]) {
    let _ = write!(out, "<{tag}>");
    push_inlines(out, children);
    let _ = write!(out, "</{tag}>");
}

/// Escape text for use in HTML content and double-quoted attributes.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Body markup: one `<section>` per section, fragments inside in order.
/// Sections without fragments are still emitted so the class sequence
/// mirrors the document.
pub fn render_sections(deck: &Deck) -> String {
    let mut out = String::new();
    for (index, section) in deck.sections.iter().enumerate() {
        let _ = write!(out, "<section class=\"{}\">", section.kind.class());
        for fragment in deck.fragments_in(index) {
            out.push_str(&fragment.to_html());
        }
        out.push_str("</section>\n");
    }
    out
}

/// `:root` declarations for the effective style variables.
pub fn root_style(vars: &StyleVars) -> String {
    let mut out = String::from(":root {\n");
    for (name, value) in vars.iter() {
        let _ = writeln!(out, "  --{name}: {};", value.replace(['<', '>', ';', '}'], ""));
    }
    out.push_str("}\n");
    out
}

/// A standalone page: style variables, the deck, and arrow-key navigation.
pub fn render_document(deck: &Deck, vars: &StyleVars, title: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\" />\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\" />\n\
         <title>{title}</title>\n<style>\n{root}{PAGE_CSS}</style>\n</head>\n<body>\n\
         <main>\n{sections}</main>\n<script>\n{NAV_SCRIPT}</script>\n</body>\n</html>\n",
        title = escape(title),
        root = root_style(vars),
        sections = render_sections(deck),
    )
}
