pub mod grammar;
pub mod html;

use crate::frontmatter::{self, Frontmatter};

/// A parsed document: its frontmatter plus the ordered slide fragments.
#[derive(Debug, Clone, Default)]
pub struct Deck {
    pub frontmatter: Frontmatter,
    /// Always starts with the implicit leading section; every heading opens
    /// another one.
    pub sections: Vec<Section>,
    pub fragments: Vec<Fragment>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub kind: SectionKind,
    /// Heading text. Kept for outlines, never drawn on a slide.
    pub title: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    /// Content before the first heading.
    Lead,
    Heading(u8),
}

impl SectionKind {
    /// Class used by the HTML output and by style variable lookups.
    pub fn class(&self) -> String {
        match self {
            Self::Lead => "lead".to_string(),
            Self::Heading(level) => format!("kind-{level}"),
        }
    }
}

/// One navigable unit of content.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub index: usize,
    /// Index into [`Deck::sections`].
    pub section: usize,
    pub content: FragmentContent,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FragmentContent {
    /// A paragraph. Each line came from a line break in the source and is
    /// rendered as its own inline paragraph.
    Text { lines: Vec<Vec<Inline>> },
    /// A blockquote holding nothing but an image URL.
    Image { url: String },
}

#[derive(Debug, Clone, PartialEq)]
#[allow(clippy::enum_variant_names)]
pub enum Inline {
    Text(String),
    Bold(Vec<Inline>),
    Italic(Vec<Inline>),
    Strikethrough(Vec<Inline>),
    Code(String),
    Link { text: Vec<Inline>, url: String },
    Image { alt: String, url: String },
}

impl Deck {
    /// Split frontmatter from `raw` and render the body into fragments.
    pub fn parse(raw: &str) -> Self {
        let (frontmatter, body) = frontmatter::split(raw);
        let (sections, fragments) = grammar::render(&body);
        tracing::debug!(
            sections = sections.len(),
            fragments = fragments.len(),
            "parsed deck"
        );
        Self {
            frontmatter,
            sections,
            fragments,
        }
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn theme(&self) -> &str {
        self.frontmatter.theme()
    }

    pub fn section_of(&self, fragment: &Fragment) -> &Section {
        &self.sections[fragment.section]
    }

    /// Fragments belonging to the section at `section`, in order.
    pub fn fragments_in(&self, section: usize) -> impl Iterator<Item = &Fragment> {
        self.fragments.iter().filter(move |f| f.section == section)
    }
}

impl Fragment {
    /// Plain text of the fragment, lines joined with `\n`.
    pub fn plain_text(&self) -> String {
        match &self.content {
            FragmentContent::Text { lines } => lines
                .iter()
                .map(|line| inlines_to_text(line))
                .collect::<Vec<_>>()
                .join("\n"),
            FragmentContent::Image { url } => url.clone(),
        }
    }
}

/// Extract plain text from inline elements.
pub fn inlines_to_text(inlines: &[Inline]) -> String {
    let mut text = String::new();
    for inline in inlines {
        match inline {
            Inline::Text(s) | Inline::Code(s) => text.push_str(s),
            Inline::Bold(children) | Inline::Italic(children) | Inline::Strikethrough(children) => {
                text.push_str(&inlines_to_text(children));
            }
            Inline::Link { text: t, .. } => text.push_str(&inlines_to_text(t)),
            Inline::Image { alt, .. } => text.push_str(alt),
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(deck: &Deck) -> Vec<String> {
        deck.fragments.iter().map(Fragment::plain_text).collect()
    }

    #[test]
    fn test_empty_body() {
        let deck = Deck::parse("");
        assert!(deck.is_empty());
        assert_eq!(deck.sections.len(), 1);
        assert_eq!(deck.sections[0].kind, SectionKind::Lead);
    }

    #[test]
    fn test_paragraph_count() {
        let deck = Deck::parse("one\n\ntwo\n\nthree");
        assert_eq!(deck.len(), 3);
        assert!(deck.fragments.iter().all(|f| f.section == 0));
        assert_eq!(texts(&deck), ["one", "two", "three"]);
    }

    #[test]
    fn test_headings_are_boundaries() {
        let deck = Deck::parse("# A\n\nfoo\n\n# B\n\nbar");
        assert_eq!(texts(&deck), ["foo", "bar"]);
        assert_eq!(deck.sections.len(), 3);
        assert_eq!(deck.section_of(&deck.fragments[0]).title, "A");
        assert_eq!(deck.section_of(&deck.fragments[1]).title, "B");
        for fragment in &deck.fragments {
            let html = fragment.to_html();
            assert!(!html.contains('A') && !html.contains('B'), "{html}");
        }
    }

    #[test]
    fn test_section_kinds_follow_level() {
        let deck = Deck::parse("intro\n\n## Two\n\nx\n\n### Three\n\ny");
        let kinds: Vec<String> = deck.sections.iter().map(|s| s.kind.class()).collect();
        assert_eq!(kinds, ["lead", "kind-2", "kind-3"]);
        assert_eq!(deck.fragments_in(1).count(), 1);
        assert_eq!(deck.fragments_in(2).next().map(Fragment::plain_text).as_deref(), Some("y"));
    }

    #[test]
    fn test_fragment_indices_are_sequential() {
        let deck = Deck::parse("a\n\n# H\n\nb\n\n> https://x.com/c.png\n\nd");
        let indices: Vec<usize> = deck.fragments.iter().map(|f| f.index).collect();
        assert_eq!(indices, [0, 1, 2, 3]);
    }

    #[test]
    fn test_frontmatter_is_separated() {
        let deck = Deck::parse("---\ntheme: dark\naccent: red\n---\nHello");
        assert_eq!(deck.theme(), "dark");
        assert_eq!(deck.frontmatter.get("accent"), Some("red"));
        assert_eq!(texts(&deck), ["Hello"]);
    }

    #[test]
    fn test_parse_is_deterministic() {
        let doc = "# T\n\n*a* `b` [c](https://d.example)\n\n> https://x.com/y.gif";
        assert_eq!(Deck::parse(doc).fragments, Deck::parse(doc).fragments);
    }
}
