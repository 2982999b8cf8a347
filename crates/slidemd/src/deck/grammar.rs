//! The restricted slide grammar.
//!
//! Walks pulldown-cmark events and keeps only what a slide can show:
//! headings open sections, paragraphs become fragments, and a blockquote
//! holding a lone image URL becomes an image fragment. Code blocks, lists,
//! rules, tables and raw HTML are parsed and dropped.

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};

use super::{Fragment, FragmentContent, Inline, Section, SectionKind};

const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "svg"];

pub fn render(body: &str) -> (Vec<Section>, Vec<Fragment>) {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let mut walker = Walker::default();
    for (event, range) in Parser::new_ext(body, options).into_offset_iter() {
        walker.event(event, &body[range]);
    }
    (walker.sections, walker.fragments)
}

/// An inline container still waiting for its end tag.
enum Frame {
    Bold,
    Italic,
    Strikethrough,
    Link(String),
    Image(String),
    /// Inline tags the grammar has no markup for; children are kept as-is.
    Transparent,
}

struct Paragraph {
    lines: Vec<Vec<Inline>>,
    current: Vec<Inline>,
    stack: Vec<(Frame, Vec<Inline>)>,
}

impl Paragraph {
    fn new() -> Self {
        Self {
            lines: Vec::new(),
            current: Vec::new(),
            stack: Vec::new(),
        }
    }

    fn target(&mut self) -> &mut Vec<Inline> {
        match self.stack.last_mut() {
            Some((_, children)) => children,
            None => &mut self.current,
        }
    }

    fn push(&mut self, inline: Inline) {
        let target = self.target();
        if let (Inline::Text(new), Some(Inline::Text(prev))) = (&inline, target.last_mut()) {
            prev.push_str(new);
            return;
        }
        target.push(inline);
    }

    fn open(&mut self, frame: Frame) {
        self.stack.push((frame, Vec::new()));
    }

    fn close(&mut self) {
        let Some((frame, children)) = self.stack.pop() else {
            return;
        };
        let inline = match frame {
            Frame::Bold => Inline::Bold(children),
            Frame::Italic => Inline::Italic(children),
            Frame::Strikethrough => Inline::Strikethrough(children),
            Frame::Link(url) => Inline::Link {
                text: children,
                url,
            },
            Frame::Image(url) => Inline::Image {
                alt: super::inlines_to_text(&children),
                url,
            },
            Frame::Transparent => {
                for child in children {
                    self.push(child);
                }
                return;
            }
        };
        self.push(inline);
    }

    /// Break mode: a line break ends the current inline paragraph.
    fn line_break(&mut self) {
        // Breaks inside an open inline container stay inside it.
        if self.stack.is_empty() {
            let line = std::mem::take(&mut self.current);
            self.lines.push(line);
        } else {
            self.push(Inline::Text(" ".to_string()));
        }
    }

    fn finish(mut self) -> Vec<Vec<Inline>> {
        while !self.stack.is_empty() {
            self.close();
        }
        let line = std::mem::take(&mut self.current);
        self.lines.push(line);
        self.lines.retain(|line| !line.is_empty());
        self.lines
    }
}

struct Walker {
    sections: Vec<Section>,
    fragments: Vec<Fragment>,
    paragraph: Option<Paragraph>,
    /// Nesting depth inside a construct whose events are discarded.
    skip: usize,
    /// Heading text being collected while its events are skipped.
    heading_title: Option<String>,
}

impl Default for Walker {
    fn default() -> Self {
        Self {
            sections: vec![Section {
                kind: SectionKind::Lead,
                title: String::new(),
            }],
            fragments: Vec::new(),
            paragraph: None,
            skip: 0,
            heading_title: None,
        }
    }
}

impl Walker {
    fn event(&mut self, event: Event<'_>, source: &str) {
        if self.skip > 0 {
            self.skipped(event);
            return;
        }

        if let Some(paragraph) = self.paragraph.as_mut() {
            match event {
                Event::End(TagEnd::Paragraph) => self.end_paragraph(),
                Event::Start(tag) => paragraph.open(inline_frame(tag)),
                Event::End(_) => paragraph.close(),
                Event::Text(text) => paragraph.push(Inline::Text(text.into_string())),
                Event::Code(code) => paragraph.push(Inline::Code(code.into_string())),
                Event::InlineHtml(html) | Event::Html(html) => {
                    paragraph.push(Inline::Text(html.into_string()));
                }
                Event::SoftBreak | Event::HardBreak => paragraph.line_break(),
                _ => {}
            }
            return;
        }

        match event {
            Event::Start(Tag::Paragraph) => self.paragraph = Some(Paragraph::new()),
            Event::Start(Tag::Heading { level, .. }) => {
                self.heading_title = Some(String::new());
                self.sections.push(Section {
                    kind: SectionKind::Heading(heading_number(level)),
                    title: String::new(),
                });
                self.skip = 1;
            }
            Event::Start(Tag::BlockQuote(_)) => {
                if let Some(url) = blockquote_image(source) {
                    self.push_fragment(FragmentContent::Image { url });
                } else {
                    tracing::trace!("dropping blockquote without an image URL");
                }
                self.skip = 1;
            }
            // Code blocks, lists, tables, HTML blocks and anything else
            // block-level that the grammar does not show.
            Event::Start(_) => self.skip = 1,
            _ => {}
        }
    }

    fn skipped(&mut self, event: Event<'_>) {
        match event {
            Event::Start(_) => self.skip += 1,
            Event::End(TagEnd::Heading(_)) if self.skip == 1 => {
                self.skip = 0;
                if let (Some(title), Some(section)) =
                    (self.heading_title.take(), self.sections.last_mut())
                {
                    section.title = title.trim().to_string();
                }
            }
            Event::End(_) => self.skip -= 1,
            Event::Text(text) | Event::Code(text) => {
                if let Some(title) = self.heading_title.as_mut() {
                    title.push_str(&text);
                }
            }
            Event::SoftBreak | Event::HardBreak => {
                if let Some(title) = self.heading_title.as_mut() {
                    title.push(' ');
                }
            }
            _ => {}
        }
    }

    fn end_paragraph(&mut self) {
        let Some(paragraph) = self.paragraph.take() else {
            return;
        };
        let lines = paragraph.finish();
        if !lines.is_empty() {
            self.push_fragment(FragmentContent::Text { lines });
        }
    }

    fn push_fragment(&mut self, content: FragmentContent) {
        self.fragments.push(Fragment {
            index: self.fragments.len(),
            section: self.sections.len() - 1,
            content,
        });
    }
}

fn inline_frame(tag: Tag<'_>) -> Frame {
    match tag {
        Tag::Strong => Frame::Bold,
        Tag::Emphasis => Frame::Italic,
        Tag::Strikethrough => Frame::Strikethrough,
        Tag::Link { dest_url, .. } => Frame::Link(dest_url.into_string()),
        Tag::Image { dest_url, .. } => Frame::Image(dest_url.into_string()),
        _ => Frame::Transparent,
    }
}

fn heading_number(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// The image URL of a blockquote whose whole content is one http(s) URL
/// ending in a known image extension.
fn blockquote_image(source: &str) -> Option<String> {
    let content = source
        .lines()
        .map(|line| {
            let line = line.trim_start();
            line.strip_prefix('>').unwrap_or(line).trim()
        })
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    if content.is_empty() || content.chars().any(char::is_whitespace) {
        return None;
    }

    let url = url::Url::parse(&content).ok()?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return None;
    }
    let extension = url.path().rsplit_once('.')?.1.to_ascii_lowercase();
    IMAGE_EXTENSIONS
        .contains(&extension.as_str())
        .then_some(content)
}
