//! Markdown → display tree for chat turns.
//!
//! Rendering is pure: the same text always yields the same tree. Raw HTML in
//! the input is kept as text, and link and image targets are limited to
//! http(s), mailto and relative references, so the tree can be shown without
//! further sanitising.

use std::sync::OnceLock;

use pulldown_cmark::{Alignment, CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use syntect::easy::HighlightLines;
use syntect::highlighting::{FontStyle, Theme, ThemeSet};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;
use url::{ParseError, Url};

use crate::models::{CodeBlock, RenderNode, RenderedMessage, StyledSpan};
use crate::services::config_service::DEFAULT_THEME;

const ALLOWED_SCHEMES: &[&str] = &["http", "https", "mailto"];

pub struct MessageRenderer {
    syntaxes: SyntaxSet,
    theme: Theme,
}

impl MessageRenderer {
    /// Builds a renderer using the named highlight theme, falling back to the
    /// default theme when the name is unknown.
    pub fn new(theme_name: &str) -> Self {
        let mut themes = ThemeSet::load_defaults().themes;
        let theme = match themes.remove(theme_name) {
            Some(theme) => theme,
            None => {
                log::warn!("Unknown highlight theme {:?}, using {}", theme_name, DEFAULT_THEME);
                themes.remove(DEFAULT_THEME).unwrap_or_default()
            }
        };

        Self {
            syntaxes: SyntaxSet::load_defaults_newlines(),
            theme,
        }
    }

    pub fn render(&self, text: &str) -> RenderedMessage {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_FOOTNOTES);

        let mut builder = TreeBuilder::default();
        for event in Parser::new_ext(text, options) {
            builder.handle(event, self);
        }
        builder.finish()
    }

    /// Highlights `code` when `language` names a known syntax.
    fn highlight(&self, language: &str, code: &str) -> Option<Vec<Vec<StyledSpan>>> {
        let syntax = self.syntaxes.find_syntax_by_token(language)?;
        let mut highlighter = HighlightLines::new(syntax, &self.theme);
        let mut lines = Vec::new();

        for line in LinesWithEndings::from(code) {
            let ranges = highlighter.highlight_line(line, &self.syntaxes).ok()?;
            lines.push(
                ranges
                    .into_iter()
                    .map(|(style, piece)| StyledSpan {
                        text: piece.to_string(),
                        color: format!(
                            "#{:02x}{:02x}{:02x}",
                            style.foreground.r, style.foreground.g, style.foreground.b
                        ),
                        bold: style.font_style.contains(FontStyle::BOLD),
                        italic: style.font_style.contains(FontStyle::ITALIC),
                    })
                    .collect(),
            );
        }

        Some(lines)
    }
}

impl Default for MessageRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_THEME)
    }
}

/// Renders with a process-wide renderer using the default theme.
pub fn render_markdown(text: &str) -> RenderedMessage {
    static RENDERER: OnceLock<MessageRenderer> = OnceLock::new();
    RENDERER.get_or_init(MessageRenderer::default).render(text)
}

struct Frame {
    tag: String,
    attrs: Vec<(String, String)>,
    children: Vec<RenderNode>,
}

#[derive(Default)]
struct TreeBuilder {
    root: Vec<RenderNode>,
    stack: Vec<Frame>,
    code: Option<(Option<String>, String)>,
    alignments: Vec<Alignment>,
    in_table_head: bool,
    cell_index: usize,
}

impl TreeBuilder {
    fn push_node(&mut self, node: RenderNode) {
        match self.stack.last_mut() {
            Some(frame) => frame.children.push(node),
            None => self.root.push(node),
        }
    }

    fn open(&mut self, tag: &str, attrs: Vec<(String, String)>) {
        self.stack.push(Frame {
            tag: tag.to_string(),
            attrs,
            children: Vec::new(),
        });
    }

    fn close(&mut self) {
        let Some(mut frame) = self.stack.pop() else {
            return;
        };

        match frame.tag.as_str() {
            "thead" => {
                let cells = std::mem::take(&mut frame.children);
                frame.children.push(RenderNode::element("tr", cells));
            }
            "table" => {
                let mut children = std::mem::take(&mut frame.children).into_iter();
                if let Some(head) = children.next() {
                    frame.children.push(head);
                }
                let rows: Vec<RenderNode> = children.collect();
                if !rows.is_empty() {
                    frame.children.push(RenderNode::element("tbody", rows));
                }
            }
            "img" => {
                let alt = plain_text(&frame.children);
                frame.attrs.push(("alt".to_string(), alt));
                frame.children.clear();
            }
            _ => {}
        }

        self.push_node(RenderNode::Element {
            tag: frame.tag,
            attrs: frame.attrs,
            children: frame.children,
        });
    }

    fn handle(&mut self, event: Event<'_>, renderer: &MessageRenderer) {
        if let Some((_, code)) = self.code.as_mut() {
            match &event {
                Event::Text(text) => {
                    code.push_str(text);
                    return;
                }
                Event::End(TagEnd::CodeBlock) => {}
                _ => return,
            }
        }

        match event {
            Event::Start(Tag::CodeBlock(kind)) => {
                let language = match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .map(str::to_string),
                    CodeBlockKind::Indented => None,
                };
                self.code = Some((language, String::new()));
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some((language, mut code)) = self.code.take() {
                    if code.ends_with('\n') {
                        code.pop();
                    }
                    let lines = language
                        .as_deref()
                        .and_then(|lang| renderer.highlight(lang, &code));
                    self.push_node(RenderNode::CodeBlock(CodeBlock { language, code, lines }));
                }
            }
            Event::Start(tag) => self.start_tag(tag),
            Event::End(TagEnd::TableHead) => {
                self.in_table_head = false;
                self.close();
            }
            Event::End(_) => self.close(),
            Event::Text(text) => self.push_node(RenderNode::text(&text)),
            Event::Code(code) => self.push_node(RenderNode::InlineCode {
                code: code.to_string(),
            }),
            Event::Html(html) | Event::InlineHtml(html) => self.push_node(RenderNode::text(&html)),
            Event::SoftBreak => self.push_node(RenderNode::text(" ")),
            Event::HardBreak => self.push_node(RenderNode::element("br", Vec::new())),
            Event::Rule => self.push_node(RenderNode::element("hr", Vec::new())),
            Event::TaskListMarker(checked) => {
                let mut attrs = vec![
                    ("type".to_string(), "checkbox".to_string()),
                    ("disabled".to_string(), "disabled".to_string()),
                ];
                if checked {
                    attrs.push(("checked".to_string(), "checked".to_string()));
                }
                self.push_node(RenderNode::Element {
                    tag: "input".to_string(),
                    attrs,
                    children: Vec::new(),
                });
            }
            Event::FootnoteReference(name) => {
                self.push_node(RenderNode::element("sup", vec![RenderNode::text(&name)]));
            }
            _ => {}
        }
    }

    fn start_tag(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => self.open("p", Vec::new()),
            Tag::Heading { level, .. } => self.open(&format!("h{}", level as u8), Vec::new()),
            Tag::BlockQuote(_) => self.open("blockquote", Vec::new()),
            Tag::List(None) => self.open("ul", Vec::new()),
            Tag::List(Some(start)) => {
                let attrs = if start == 1 {
                    Vec::new()
                } else {
                    vec![("start".to_string(), start.to_string())]
                };
                self.open("ol", attrs);
            }
            Tag::Item => self.open("li", Vec::new()),
            Tag::Emphasis => self.open("em", Vec::new()),
            Tag::Strong => self.open("strong", Vec::new()),
            Tag::Strikethrough => self.open("del", Vec::new()),
            Tag::Link { dest_url, title, .. } => {
                let mut attrs = vec![("href".to_string(), safe_url(&dest_url))];
                if !title.is_empty() {
                    attrs.push(("title".to_string(), title.to_string()));
                }
                self.open("a", attrs);
            }
            Tag::Image { dest_url, .. } => {
                self.open("img", vec![("src".to_string(), safe_url(&dest_url))]);
            }
            Tag::Table(alignments) => {
                self.alignments = alignments;
                self.open("table", Vec::new());
            }
            Tag::TableHead => {
                self.in_table_head = true;
                self.cell_index = 0;
                self.open("thead", Vec::new());
            }
            Tag::TableRow => {
                self.cell_index = 0;
                self.open("tr", Vec::new());
            }
            Tag::TableCell => {
                let attrs = match self.alignments.get(self.cell_index) {
                    Some(Alignment::Left) => vec![("style".to_string(), "text-align: left".to_string())],
                    Some(Alignment::Center) => vec![("style".to_string(), "text-align: center".to_string())],
                    Some(Alignment::Right) => vec![("style".to_string(), "text-align: right".to_string())],
                    _ => Vec::new(),
                };
                self.cell_index += 1;
                let cell = if self.in_table_head { "th" } else { "td" };
                self.open(cell, attrs);
            }
            Tag::FootnoteDefinition(name) => {
                self.open("div", vec![("class".to_string(), format!("footnote footnote-{}", name))]);
            }
            _ => self.open("div", Vec::new()),
        }
    }

    fn finish(mut self) -> RenderedMessage {
        while !self.stack.is_empty() {
            self.close();
        }
        RenderedMessage { nodes: self.root }
    }
}

/// Keeps http(s), mailto and scheme-less targets; anything else becomes `#`.
/// Control characters are dropped first since browsers ignore them inside a
/// scheme (`java\tscript:`).
fn safe_url(url: &str) -> String {
    let cleaned: String = url.chars().filter(|c| !c.is_ascii_control()).collect();
    let cleaned = cleaned.trim();

    match Url::parse(cleaned) {
        Ok(parsed) if ALLOWED_SCHEMES.contains(&parsed.scheme()) => cleaned.to_string(),
        Err(ParseError::RelativeUrlWithoutBase) => cleaned.to_string(),
        _ => "#".to_string(),
    }
}

fn plain_text(nodes: &[RenderNode]) -> String {
    let mut text = String::new();
    for node in nodes {
        match node {
            RenderNode::Text { text: t } => text.push_str(t),
            RenderNode::InlineCode { code } => text.push_str(code),
            RenderNode::Element { children, .. } => text.push_str(&plain_text(children)),
            RenderNode::CodeBlock(block) => text.push_str(&block.code),
        }
    }
    text
}
