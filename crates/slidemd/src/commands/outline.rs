use anyhow::Result;
use colored::Colorize;
use std::path::Path;

use crate::deck::{Deck, FragmentContent};

pub fn run(file: &Path) -> Result<()> {
    let deck = Deck::parse(&super::read_document(file)?);
    print!("{}", outline(&deck));
    if deck.is_empty() {
        println!("{}", "No slides found.".yellow());
    }
    Ok(())
}

/// One line per section, then its fragments indented below it.
pub fn outline(deck: &Deck) -> String {
    let mut out = String::new();
    if !deck.frontmatter.is_empty() {
        out.push_str(&format!("theme: {}\n", deck.theme()));
    }
    for (index, section) in deck.sections.iter().enumerate() {
        let mut fragments = deck.fragments_in(index).peekable();
        if index == 0 && fragments.peek().is_none() {
            continue;
        }
        let title = if section.title.is_empty() {
            String::new()
        } else {
            format!(" {}", section.title)
        };
        out.push_str(&format!("[{}]{title}\n", section.kind.class()));
        for fragment in fragments {
            let summary = match &fragment.content {
                FragmentContent::Text { .. } => fragment.plain_text().replace('\n', " / "),
                FragmentContent::Image { url } => format!("image {url}"),
            };
            out.push_str(&format!("  {:>3}  {summary}\n", fragment.index + 1));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outline_lists_sections_and_fragments() {
        let deck = Deck::parse("# Intro\n\nhello\nworld\n\n## Pics\n\n> https://x.example/a.png");
        assert_eq!(
            outline(&deck),
            "[kind-1] Intro\n    1  hello / world\n\
             [kind-2] Pics\n    2  image https://x.example/a.png\n"
        );
    }

    #[test]
    fn test_outline_lead_and_theme() {
        let deck = Deck::parse("---\ntheme: dark\n---\nfirst");
        assert_eq!(outline(&deck), "theme: dark\n[lead]\n    1  first\n");
    }
}
