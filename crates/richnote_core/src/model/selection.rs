//! Selection model.
//!
//! # Responsibility
//! - Describe the active cursor or range as an anchor/focus point pair.
//! - Resolve which text leaves and leaf blocks a range touches.
//!
//! # Invariants
//! - Anchor and focus may appear in either document order.
//! - A range ending on a block covers that block's whole subtree.

use crate::model::document::Document;
use crate::model::node::{Block, Node, NodeKey, Text};
use serde::{Deserialize, Serialize};

/// One end of a selection: a node key plus a character/child offset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub key: NodeKey,
    pub offset: usize,
}

impl Point {
    pub fn new(key: impl Into<NodeKey>, offset: usize) -> Self {
        Self {
            key: key.into(),
            offset,
        }
    }
}

/// Anchor/focus pair over a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selection {
    pub anchor: Point,
    pub focus: Point,
}

impl Selection {
    pub fn new(anchor: Point, focus: Point) -> Self {
        Self { anchor, focus }
    }

    /// Collapsed cursor at `offset` inside `key`.
    pub fn collapsed(key: impl Into<NodeKey>, offset: usize) -> Self {
        let point = Point::new(key, offset);
        Self {
            anchor: point.clone(),
            focus: point,
        }
    }

    /// Range from the start of `start` to the start of `end`.
    pub fn between(start: impl Into<NodeKey>, end: impl Into<NodeKey>) -> Self {
        Self::new(Point::new(start, 0), Point::new(end, 0))
    }

    /// Cursor at the start of the first text leaf, or on the root when the
    /// document has no text.
    pub fn start_of(document: &Document) -> Self {
        match document.texts().first() {
            Some(text) => Self::collapsed(text.key.clone(), 0),
            None => Self::collapsed(document.key().clone(), 0),
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    /// Returns whether both points still name nodes in `document`.
    pub fn is_valid_in(&self, document: &Document) -> bool {
        document.contains(&self.anchor.key) && document.contains(&self.focus.key)
    }

    /// Point that comes first in document order, when both resolve.
    pub fn start<'s>(&'s self, document: &Document) -> Option<&'s Point> {
        let (start, _) = self.ordered(document)?;
        Some(start)
    }

    /// Nodes covered by the range in document order.
    ///
    /// Empty when either point no longer exists.
    pub fn nodes<'a>(&self, document: &'a Document) -> Vec<&'a Node> {
        let preorder = document.preorder();
        if self.anchor.key == *document.key() || self.focus.key == *document.key() {
            return preorder;
        }
        let Some(anchor) = position(&preorder, &self.anchor.key) else {
            return Vec::new();
        };
        let Some(focus) = position(&preorder, &self.focus.key) else {
            return Vec::new();
        };
        let (start, end) = if anchor <= focus {
            (anchor, focus)
        } else {
            (focus, anchor)
        };
        let end = end + subtree_len(preorder[end]) - 1;
        preorder[start..=end].to_vec()
    }

    /// Text leaves touched by the range.
    pub fn texts<'a>(&self, document: &'a Document) -> Vec<&'a Text> {
        self.nodes(document)
            .into_iter()
            .filter_map(Node::as_text)
            .collect()
    }

    /// Lowest blocks touched by the range, deduplicated, in document order.
    pub fn blocks<'a>(&self, document: &'a Document) -> Vec<&'a Block> {
        let mut blocks: Vec<&'a Block> = Vec::new();
        for node in self.nodes(document) {
            let Some(block) = document.leaf_block_of(node.key()) else {
                continue;
            };
            if !blocks.iter().any(|seen| seen.key == block.key) {
                blocks.push(block);
            }
        }
        blocks
    }

    fn ordered(&self, document: &Document) -> Option<(&Point, &Point)> {
        let anchor = document.path_of(&self.anchor.key)?;
        let focus = document.path_of(&self.focus.key)?;
        if anchor <= focus {
            Some((&self.anchor, &self.focus))
        } else {
            Some((&self.focus, &self.anchor))
        }
    }
}

fn position(preorder: &[&Node], key: &NodeKey) -> Option<usize> {
    preorder.iter().position(|node| node.key() == key)
}

fn subtree_len(node: &Node) -> usize {
    1 + node
        .children()
        .iter()
        .map(|child| subtree_len(child))
        .sum::<usize>()
}

#[cfg(test)]
mod tests {
    use super::Selection;
    use crate::model::document::Document;
    use crate::model::node::{Block, BlockType, NodeKey, Text};

    fn sample() -> Document {
        Document::with_key(
            "doc",
            vec![
                Block::with_key("a", BlockType::Paragraph).child(Text::with_key("a.t", "alpha")),
                Block::with_key("list", BlockType::NumberedList)
                    .child(
                        Block::with_key("li1", BlockType::ListItem)
                            .child(Text::with_key("li1.t", "one")),
                    )
                    .child(
                        Block::with_key("li2", BlockType::ListItem)
                            .child(Text::with_key("li2.t", "two")),
                    ),
                Block::image("cat.png"),
                Block::with_key("z", BlockType::Paragraph).child(Text::with_key("z.t", "")),
            ],
        )
        .unwrap()
    }

    fn keys<'a>(items: impl IntoIterator<Item = &'a NodeKey>) -> Vec<String> {
        items.into_iter().map(|key| key.to_string()).collect()
    }

    #[test]
    fn collapsed_cursor_touches_its_leaf_and_block() {
        let doc = sample();
        let selection = Selection::collapsed("li1.t", 1);
        assert_eq!(keys(selection.texts(&doc).iter().map(|t| &t.key)), ["li1.t"]);
        assert_eq!(keys(selection.blocks(&doc).iter().map(|b| &b.key)), ["li1"]);
    }

    #[test]
    fn backwards_range_is_ordered_and_spans_blocks() {
        let doc = sample();
        let selection = Selection::between("li2.t", "a.t");
        assert_eq!(
            keys(selection.blocks(&doc).iter().map(|b| &b.key)),
            ["a", "li1", "li2"]
        );
        assert_eq!(selection.start(&doc).unwrap().key, NodeKey::from("a.t"));
    }

    #[test]
    fn range_ending_on_container_covers_subtree() {
        let doc = sample();
        let selection = Selection::between("a.t", "list");
        assert_eq!(
            keys(selection.texts(&doc).iter().map(|t| &t.key)),
            ["a.t", "li1.t", "li2.t"]
        );
    }

    #[test]
    fn void_block_counts_as_touched_block() {
        let doc = sample();
        let image_key = doc.nodes()[2].key().clone();
        let selection = Selection::collapsed(image_key.clone(), 0);
        let blocks = selection.blocks(&doc);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].key, image_key);
        assert!(selection.texts(&doc).is_empty());
    }

    #[test]
    fn stale_selection_touches_nothing() {
        let doc = sample();
        let selection = Selection::collapsed("gone", 0);
        assert!(!selection.is_valid_in(&doc));
        assert!(selection.nodes(&doc).is_empty());
    }
}
