use serde::{Deserialize, Serialize};

const VOID_TAGS: &[&str] = &["br", "hr", "img", "input"];

/// Output of the message renderer: a tree of display nodes for one chat turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedMessage {
    pub nodes: Vec<RenderNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RenderNode {
    Element {
        tag: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        attrs: Vec<(String, String)>,
        children: Vec<RenderNode>,
    },
    Text {
        text: String,
    },
    InlineCode {
        code: String,
    },
    CodeBlock(CodeBlock),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeBlock {
    /// Language tag as written after the opening fence.
    pub language: Option<String>,
    pub code: String,
    /// Highlighted lines, present only when the language was recognised.
    pub lines: Option<Vec<Vec<StyledSpan>>>,
}

impl CodeBlock {
    pub fn is_highlighted(&self) -> bool {
        self.lines.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyledSpan {
    pub text: String,
    /// Foreground colour as `#rrggbb`.
    pub color: String,
    pub bold: bool,
    pub italic: bool,
}

impl RenderNode {
    pub fn element(tag: &str, children: Vec<RenderNode>) -> Self {
        RenderNode::Element {
            tag: tag.to_string(),
            attrs: Vec::new(),
            children,
        }
    }

    pub fn text(text: &str) -> Self {
        RenderNode::Text {
            text: text.to_string(),
        }
    }

    fn write_html(&self, out: &mut String) {
        match self {
            RenderNode::Element { tag, attrs, children } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attrs {
                    out.push_str(&format!(r#" {}="{}""#, name, html_escape(value)));
                }
                out.push('>');
                if VOID_TAGS.contains(&tag.as_str()) {
                    return;
                }
                for child in children {
                    child.write_html(out);
                }
                out.push_str(&format!("</{}>", tag));
            }
            RenderNode::Text { text } => out.push_str(&html_escape(text)),
            RenderNode::InlineCode { code } => {
                out.push_str(&format!(r#"<code class="inline-code">{}</code>"#, html_escape(code)));
            }
            RenderNode::CodeBlock(block) => block.write_html(out),
        }
    }

    fn collect_code_blocks<'a>(&'a self, found: &mut Vec<&'a CodeBlock>) {
        match self {
            RenderNode::CodeBlock(block) => found.push(block),
            RenderNode::Element { children, .. } => {
                for child in children {
                    child.collect_code_blocks(found);
                }
            }
            _ => {}
        }
    }
}

impl CodeBlock {
    fn write_html(&self, out: &mut String) {
        match (&self.lines, &self.language) {
            (Some(lines), Some(language)) => {
                out.push_str(&format!(
                    r#"<pre class="code-block" data-language="{}"><code>"#,
                    html_escape(language)
                ));
                for span in lines.iter().flatten() {
                    let mut style = format!("color:{}", span.color);
                    if span.bold {
                        style.push_str(";font-weight:bold");
                    }
                    if span.italic {
                        style.push_str(";font-style:italic");
                    }
                    out.push_str(&format!(
                        r#"<span style="{}">{}</span>"#,
                        style,
                        html_escape(&span.text)
                    ));
                }
                out.push_str("</code></pre>");
            }
            _ => {
                out.push_str(&format!(
                    r#"<pre class="code-plain"><code class="inline-code">{}</code></pre>"#,
                    html_escape(&self.code)
                ));
            }
        }
    }
}

impl RenderedMessage {
    pub fn to_html(&self) -> String {
        let mut html = String::new();
        for node in &self.nodes {
            node.write_html(&mut html);
        }
        html
    }

    pub fn code_blocks(&self) -> Vec<&CodeBlock> {
        let mut found = Vec::new();
        for node in &self.nodes {
            node.collect_code_blocks(&mut found);
        }
        found
    }
}

pub fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
