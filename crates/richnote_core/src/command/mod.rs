//! Editing command engine.
//!
//! # Responsibility
//! - Map editing intents (marks, block types, lists, images) to pure
//!   `(document, selection, args) -> (document', selection')` transforms.
//! - Run the schema normalizer on every produced document.
//!
//! # Invariants
//! - Commands never mutate their inputs; the caller decides whether to
//!   publish the returned snapshot.
//! - Node keys that survive a command keep naming the same content, so the
//!   incoming selection stays valid unless stated otherwise.

mod blocks;
mod image;
mod marks;

use crate::model::document::{Document, DocumentError, Parent};
use crate::model::node::{BlockType, MarkType};
use crate::model::selection::Selection;
use crate::schema::{Schema, SchemaError};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub use blocks::IndentDirection;

/// Block type restored by default when a block type or list is toggled off.
pub const DEFAULT_BLOCK_TYPE: BlockType = BlockType::Paragraph;

/// Result of one command: the next snapshot and where the cursor lands.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutcome {
    pub document: Document,
    pub selection: Selection,
}

impl CommandOutcome {
    /// Outcome that leaves both inputs unchanged.
    pub fn unchanged(document: &Document, selection: &Selection) -> Self {
        Self {
            document: document.clone(),
            selection: selection.clone(),
        }
    }
}

pub type CommandResult = Result<CommandOutcome, CommandError>;

/// Command failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// A structural transform was rejected.
    Document(DocumentError),
    /// Normalization failed (schema defect).
    Schema(SchemaError),
}

impl Display for CommandError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Document(err) => write!(f, "{err}"),
            Self::Schema(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CommandError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Document(err) => Some(err),
            Self::Schema(err) => Some(err),
        }
    }
}

impl From<DocumentError> for CommandError {
    fn from(value: DocumentError) -> Self {
        Self::Document(value)
    }
}

impl From<SchemaError> for CommandError {
    fn from(value: SchemaError) -> Self {
        Self::Schema(value)
    }
}

/// True if any text leaf touched by `selection` carries `mark`.
pub fn has_mark(document: &Document, selection: &Selection, mark: &MarkType) -> bool {
    selection
        .texts(document)
        .iter()
        .any(|text| text.has_mark(mark))
}

/// True if any block touched by `selection` has type `kind`.
pub fn has_block(document: &Document, selection: &Selection, kind: &BlockType) -> bool {
    selection
        .blocks(document)
        .iter()
        .any(|block| &block.kind == kind)
}

/// True if some selected block has an ancestor of type `kind`.
pub fn has_ancestor(document: &Document, selection: &Selection, kind: &BlockType) -> bool {
    selection.blocks(document).iter().any(|block| {
        document
            .closest_ancestor(&block.key, |parent| &parent.kind == kind)
            .is_some()
    })
}

/// Toolbar state for a mark control.
pub fn is_mark_active(document: &Document, selection: &Selection, mark: &MarkType) -> bool {
    has_mark(document, selection, mark)
}

/// Toolbar state for a block control.
///
/// List controls are active only when the selection is in a list item whose
/// direct parent is that list type.
pub fn is_block_active(document: &Document, selection: &Selection, kind: &BlockType) -> bool {
    if !kind.is_list() {
        return has_block(document, selection, kind);
    }
    if !has_block(document, selection, &BlockType::ListItem) {
        return false;
    }
    let blocks = selection.blocks(document);
    let Some(first) = blocks.first() else {
        return false;
    };
    match document.get_parent(&first.key) {
        Some(Parent::Block(parent)) => &parent.kind == kind,
        _ => false,
    }
}

/// Stateless command executor bound to one schema.
#[derive(Debug, Clone)]
pub struct CommandEngine {
    schema: Schema,
    default_block: BlockType,
}

impl Default for CommandEngine {
    fn default() -> Self {
        Self::standard()
    }
}

impl CommandEngine {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            default_block: DEFAULT_BLOCK_TYPE,
        }
    }

    /// Overrides the type restored when a block type is toggled off.
    pub fn with_default_block(mut self, kind: BlockType) -> Self {
        self.default_block = kind;
        self
    }

    pub fn default_block(&self) -> &BlockType {
        &self.default_block
    }

    /// Engine using [`Schema::standard`].
    pub fn standard() -> Self {
        Self::new(Schema::standard())
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Normalizes a document against this engine's schema.
    pub fn normalize(&self, document: &Document) -> Result<Document, SchemaError> {
        self.schema.normalize(document)
    }

    fn finish(&self, document: Document, selection: Selection) -> CommandResult {
        let document = self.schema.normalize(&document)?;
        Ok(CommandOutcome {
            document,
            selection,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{has_block, has_mark, is_block_active};
    use crate::model::document::Document;
    use crate::model::node::{Block, BlockType, MarkType, Text};
    use crate::model::selection::Selection;

    fn sample() -> Document {
        Document::with_key(
            "doc",
            vec![
                Block::with_key("p", BlockType::Paragraph)
                    .child(Text::with_key("p.t1", "plain"))
                    .child(Text::with_key("p.t2", "bold").marked(MarkType::Bold)),
                Block::with_key("list", BlockType::NumberedList).child(
                    Block::with_key("li", BlockType::ListItem)
                        .child(Text::with_key("li.t", "item")),
                ),
                Block::with_key("z", BlockType::Paragraph).child(Text::with_key("z.t", "")),
            ],
        )
        .unwrap()
    }

    #[test]
    fn has_mark_is_true_when_any_leaf_carries_it() {
        let doc = sample();
        assert!(has_mark(&doc, &Selection::between("p.t1", "p.t2"), &MarkType::Bold));
        assert!(!has_mark(&doc, &Selection::collapsed("p.t1", 0), &MarkType::Bold));
    }

    #[test]
    fn list_button_state_checks_direct_parent() {
        let doc = sample();
        let in_list = Selection::collapsed("li.t", 0);
        assert!(has_block(&doc, &in_list, &BlockType::ListItem));
        assert!(is_block_active(&doc, &in_list, &BlockType::NumberedList));
        assert!(!is_block_active(&doc, &in_list, &BlockType::BulletedList));

        let outside = Selection::collapsed("p.t1", 0);
        assert!(!is_block_active(&doc, &outside, &BlockType::NumberedList));
        assert!(is_block_active(&doc, &outside, &BlockType::Paragraph));
    }
}
