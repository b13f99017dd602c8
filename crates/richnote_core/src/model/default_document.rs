//! Bundled default document.
//!
//! Used at session start when storage holds no valid snapshot, and on reset.

use crate::model::document::Document;
use crate::model::node::{Block, BlockType, MarkType, Text};

/// Root key of the bundled document.
pub const DEFAULT_DOCUMENT_KEY: &str = "default";

/// Builds the bundled default document.
///
/// The result already satisfies the standard schema (last child is a
/// paragraph), so normalizing it is a no-op.
pub fn default_document() -> Document {
    let blocks = vec![
        Block::with_key("default-title", BlockType::HeadingOne)
            .child(Text::with_key("default-title-text", "Welcome to RichNote")),
        Block::with_key("default-intro", BlockType::Paragraph)
            .child(Text::with_key("default-intro-plain", "Text can be "))
            .child(Text::with_key("default-intro-bold", "bold").marked(MarkType::Bold))
            .child(Text::with_key("default-intro-sep", ", "))
            .child(Text::with_key("default-intro-italic", "italic").marked(MarkType::Italic))
            .child(Text::with_key("default-intro-and", " or "))
            .child(Text::with_key("default-intro-code", "code").marked(MarkType::Code))
            .child(Text::with_key("default-intro-end", ".")),
        Block::with_key("default-list", BlockType::BulletedList)
            .child(
                Block::with_key("default-list-1", BlockType::ListItem)
                    .child(Text::with_key("default-list-1-text", "Press Tab to indent")),
            )
            .child(
                Block::with_key("default-list-2", BlockType::ListItem)
                    .child(Text::with_key("default-list-2-text", "Shift+Tab to outdent")),
            ),
        Block::with_key("default-quote", BlockType::BlockQuote).child(Text::with_key(
            "default-quote-text",
            "Drop or paste an image to embed it.",
        )),
        Block::with_key("default-tail", BlockType::Paragraph)
            .child(Text::with_key("default-tail-text", "")),
    ];

    match Document::with_key(DEFAULT_DOCUMENT_KEY, blocks) {
        Ok(document) => document,
        // Static content with unique keys; a failure here is a build defect.
        Err(err) => unreachable!("bundled default document is invalid: {err}"),
    }
}
