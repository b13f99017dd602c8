//! Presentational rendering of document snapshots.
//!
//! # Responsibility
//! - Map block and mark types to presentational wrappers.
//! - Fall back to a default wrapper for unknown types.

use crate::model::document::Document;
use crate::model::node::{Block, BlockType, Mark, MarkType, Node, Text};

/// Rendering collaborator. Unknown types go to the `default_*` hooks.
pub trait Renderer {
    /// Wraps already rendered `children` for `block`; `None` defers to
    /// [`Renderer::default_block`].
    fn render_block(&self, block: &Block, children: &str) -> Option<String>;

    /// Wraps already rendered `inner` content for `mark`.
    fn render_mark(&self, mark: &Mark, inner: &str) -> Option<String>;

    fn default_block(&self, block: &Block, children: &str) -> String;

    fn default_mark(&self, mark: &Mark, inner: &str) -> String;

    fn render_text(&self, text: &Text) -> String;
}

/// HTML renderer using the editor's tag vocabulary.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlRenderer;

impl Renderer for HtmlRenderer {
    fn render_block(&self, block: &Block, children: &str) -> Option<String> {
        let tag = match &block.kind {
            BlockType::BlockQuote => "blockquote",
            BlockType::BulletedList => "ul",
            BlockType::NumberedList => "ol",
            BlockType::HeadingOne => "h1",
            BlockType::HeadingTwo => "h2",
            BlockType::ListItem => "li",
            BlockType::Image => {
                let src = escape_html(block.src().unwrap_or_default());
                return Some(format!("<img src=\"{src}\" />"));
            }
            BlockType::Paragraph | BlockType::Other(_) => return None,
        };
        Some(format!("<{tag}>{children}</{tag}>"))
    }

    fn render_mark(&self, mark: &Mark, inner: &str) -> Option<String> {
        let tag = match &mark.kind {
            MarkType::Bold => "strong",
            MarkType::Code => "code",
            MarkType::Italic => "em",
            MarkType::Underlined => "u",
            MarkType::Other(_) => return None,
        };
        Some(format!("<{tag}>{inner}</{tag}>"))
    }

    fn default_block(&self, block: &Block, children: &str) -> String {
        if block.kind == BlockType::Paragraph {
            return format!("<p>{children}</p>");
        }
        format!(
            "<div data-type=\"{}\">{children}</div>",
            escape_html(block.kind.as_str())
        )
    }

    fn default_mark(&self, mark: &Mark, inner: &str) -> String {
        format!(
            "<span data-mark=\"{}\">{inner}</span>",
            escape_html(mark.kind.as_str())
        )
    }

    fn render_text(&self, text: &Text) -> String {
        escape_html(&text.text)
    }
}

/// Renders every root block of `document` in order.
pub fn render_document(renderer: &dyn Renderer, document: &Document) -> String {
    document
        .nodes()
        .iter()
        .map(|node| render_node(renderer, node))
        .collect()
}

fn render_node(renderer: &dyn Renderer, node: &Node) -> String {
    match node {
        Node::Text(text) => text
            .marks
            .iter()
            .fold(renderer.render_text(text), |inner, mark| {
                renderer
                    .render_mark(mark, &inner)
                    .unwrap_or_else(|| renderer.default_mark(mark, &inner))
            }),
        Node::Block(block) => {
            let children: String = block
                .nodes
                .iter()
                .map(|child| render_node(renderer, child))
                .collect();
            renderer
                .render_block(block, &children)
                .unwrap_or_else(|| renderer.default_block(block, &children))
        }
    }
}

fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}
