//! Block type, list and nesting commands.

use super::{
    has_ancestor, has_block, CommandEngine, CommandError, CommandOutcome, CommandResult,
};
use crate::model::document::{Document, DocumentError};
use crate::model::node::{BlockType, NodeKey};
use crate::model::selection::Selection;

/// Tab direction for list nesting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndentDirection {
    /// Tab: nest one level deeper.
    Indent,
    /// Shift+Tab: lift one level out.
    Outdent,
}

const LIST_TYPES: [BlockType; 2] = [BlockType::BulletedList, BlockType::NumberedList];

impl CommandEngine {
    /// Toggles the selected blocks to `requested`.
    ///
    /// Non-list types flip between `requested` and the default type and drop
    /// any list wrapper. List types enter, switch or leave list mode.
    pub fn set_block_type(
        &self,
        document: &Document,
        selection: &Selection,
        requested: &BlockType,
    ) -> CommandResult {
        let in_list = has_block(document, selection, &BlockType::ListItem);
        let next = if !requested.is_list() {
            let kind = if has_block(document, selection, requested) {
                self.default_block.clone()
            } else {
                requested.clone()
            };
            let next = set_blocks(document, selection, &kind)?;
            if in_list {
                unwrap_lists(&next, selection)?
            } else {
                next
            }
        } else {
            let same_list = has_ancestor(document, selection, requested);
            if in_list && same_list {
                let next = set_blocks(document, selection, &self.default_block)?;
                unwrap_lists(&next, selection)?
            } else if in_list {
                let other = requested.other_list().unwrap_or(BlockType::BulletedList);
                let next = unwrap_selection(document, selection, &other)?;
                wrap_selection(&next, selection, requested)?
            } else {
                let next = set_blocks(document, selection, &BlockType::ListItem)?;
                wrap_selection(&next, selection, requested)?
            }
        };
        self.finish(next, selection.clone())
    }

    /// List type that Tab acts on: numbered lists win over bulleted ones.
    pub fn list_type_for_tab(
        &self,
        document: &Document,
        selection: &Selection,
    ) -> Option<BlockType> {
        if !has_block(document, selection, &BlockType::ListItem) {
            return None;
        }
        [BlockType::NumberedList, BlockType::BulletedList]
            .into_iter()
            .find(|kind| has_ancestor(document, selection, kind))
    }

    /// Changes list nesting of the selection.
    ///
    /// Returns `Ok(None)` when the selection is not inside a list, so the key
    /// can fall through to the host.
    pub fn indent(
        &self,
        document: &Document,
        selection: &Selection,
        direction: IndentDirection,
    ) -> Result<Option<CommandOutcome>, CommandError> {
        let Some(list_type) = self.list_type_for_tab(document, selection) else {
            return Ok(None);
        };
        let next = match direction {
            IndentDirection::Outdent => unwrap_selection(document, selection, &list_type)?,
            IndentDirection::Indent => {
                let next = set_blocks(document, selection, &BlockType::ListItem)?;
                wrap_selection(&next, selection, &list_type)?
            }
        };
        self.finish(next, selection.clone()).map(Some)
    }
}

/// Retypes every selected leaf block; void blocks keep their type.
fn set_blocks(
    document: &Document,
    selection: &Selection,
    kind: &BlockType,
) -> Result<Document, DocumentError> {
    let targets: Vec<NodeKey> = selection
        .blocks(document)
        .into_iter()
        .filter(|block| !block.is_void() && &block.kind != kind)
        .map(|block| block.key.clone())
        .collect();
    let mut current = document.clone();
    for key in targets {
        current = current.replace_type(&key, kind.clone())?;
    }
    Ok(current)
}

fn selected_block_keys(document: &Document, selection: &Selection) -> Vec<NodeKey> {
    selection
        .blocks(document)
        .into_iter()
        .map(|block| block.key.clone())
        .collect()
}

fn unwrap_selection(
    document: &Document,
    selection: &Selection,
    wrapper: &BlockType,
) -> Result<Document, DocumentError> {
    let keys = selected_block_keys(document, selection);
    if keys.is_empty() {
        return Ok(document.clone());
    }
    document.unwrap_nodes(&keys, wrapper)
}

fn unwrap_lists(document: &Document, selection: &Selection) -> Result<Document, DocumentError> {
    let mut current = document.clone();
    for list in &LIST_TYPES {
        current = unwrap_selection(&current, selection, list)?;
    }
    Ok(current)
}

/// Wraps the contiguous children of the deepest common container of the
/// first and last selected blocks in one new `wrapper` block.
fn wrap_selection(
    document: &Document,
    selection: &Selection,
    wrapper: &BlockType,
) -> Result<Document, DocumentError> {
    let keys = selected_block_keys(document, selection);
    let (Some(first), Some(last)) = (keys.first(), keys.last()) else {
        return Ok(document.clone());
    };

    let first_chain = chain_to_root(document, first);
    let last_chain = chain_to_root(document, last);
    let mut found = None;
    for (depth, container) in first_chain.iter().enumerate().skip(1) {
        if let Some(last_depth) = last_chain.iter().skip(1).position(|key| key == container) {
            found = Some((
                container.clone(),
                first_chain[depth - 1].clone(),
                last_chain[last_depth].clone(),
            ));
            break;
        }
    }
    let Some((container, first_child, last_child)) = found else {
        return Err(DocumentError::NotSiblings);
    };

    let siblings = if &container == document.key() {
        document.nodes()
    } else {
        document
            .get_block(&container)
            .map(|block| block.nodes.as_slice())
            .ok_or_else(|| DocumentError::NodeNotFound(container.clone()))?
    };
    let start = siblings
        .iter()
        .position(|node| node.key() == &first_child)
        .ok_or(DocumentError::InvalidPath)?;
    let end = siblings
        .iter()
        .position(|node| node.key() == &last_child)
        .ok_or(DocumentError::InvalidPath)?;
    let (start, end) = if start <= end { (start, end) } else { (end, start) };
    let range: Vec<NodeKey> = siblings[start..=end]
        .iter()
        .map(|node| node.key().clone())
        .collect();
    document.wrap_nodes(&range, wrapper.clone())
}

/// `key`, its parent, ..., the root key.
fn chain_to_root(document: &Document, key: &NodeKey) -> Vec<NodeKey> {
    let mut chain = vec![key.clone()];
    let mut cursor = document.parent_key(key);
    while let Some(parent) = cursor {
        chain.push(parent.clone());
        cursor = document.parent_key(parent);
    }
    chain
}

#[cfg(test)]
mod tests {
    use super::IndentDirection;
    use crate::command::CommandEngine;
    use crate::model::document::{Document, Parent};
    use crate::model::node::{Block, BlockType, NodeKey, Text};
    use crate::model::selection::Selection;

    fn key(value: &str) -> NodeKey {
        NodeKey::from(value)
    }

    fn paragraph(name: &str) -> Block {
        Block::with_key(name, BlockType::Paragraph).child(Text::with_key(format!("{name}.t"), name))
    }

    fn parent_kind(doc: &Document, name: &str) -> Option<BlockType> {
        match doc.get_parent(&key(name))? {
            Parent::Root => None,
            Parent::Block(block) => Some(block.kind.clone()),
        }
    }

    #[test]
    fn heading_toggles_back_to_paragraph() {
        let engine = CommandEngine::standard();
        let doc = Document::with_key("doc", vec![paragraph("a"), paragraph("z")]).unwrap();
        let selection = Selection::collapsed("a.t", 0);

        let on = engine
            .set_block_type(&doc, &selection, &BlockType::HeadingTwo)
            .unwrap();
        assert_eq!(on.document.get_block(&key("a")).unwrap().kind, BlockType::HeadingTwo);

        let off = engine
            .set_block_type(&on.document, &selection, &BlockType::HeadingTwo)
            .unwrap();
        assert_eq!(off.document, doc);
    }

    #[test]
    fn non_list_type_inside_list_drops_wrapper() {
        let engine = CommandEngine::standard();
        let doc = Document::with_key(
            "doc",
            vec![
                Block::with_key("list", BlockType::BulletedList).child(
                    Block::with_key("li", BlockType::ListItem).child(Text::with_key("li.t", "x")),
                ),
                paragraph("z"),
            ],
        )
        .unwrap();
        let outcome = engine
            .set_block_type(&doc, &Selection::collapsed("li.t", 0), &BlockType::BlockQuote)
            .unwrap();
        assert!(!outcome.document.contains(&key("list")));
        assert_eq!(outcome.document.get_block(&key("li")).unwrap().kind, BlockType::BlockQuote);
        assert_eq!(outcome.document.get_parent(&key("li")), Some(Parent::Root));
    }

    #[test]
    fn void_blocks_keep_their_type() {
        let engine = CommandEngine::standard();
        let doc = Document::with_key(
            "doc",
            vec![Block::with_key("img", BlockType::Image), paragraph("z")],
        )
        .unwrap();
        let outcome = engine
            .set_block_type(&doc, &Selection::collapsed("img", 0), &BlockType::HeadingOne)
            .unwrap();
        assert_eq!(outcome.document, doc);
    }

    fn item(name: &str) -> Block {
        Block::with_key(name, BlockType::ListItem).child(Text::with_key(format!("{name}.t"), name))
    }

    fn nested_fixture() -> Document {
        Document::with_key(
            "doc",
            vec![
                Block::with_key("list", BlockType::NumberedList)
                    .child(item("li1"))
                    .child(item("li2")),
                paragraph("z"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn tab_nests_then_shift_tab_lifts() {
        let engine = CommandEngine::standard();
        let doc = nested_fixture();
        let selection = Selection::collapsed("li2.t", 0);

        let indented = engine
            .indent(&doc, &selection, IndentDirection::Indent)
            .unwrap()
            .unwrap();
        let inner = indented.document.parent_key(&key("li2")).unwrap().clone();
        assert_ne!(inner, key("list"));
        assert_eq!(parent_kind(&indented.document, "li2"), Some(BlockType::NumberedList));
        assert_eq!(indented.document.parent_key(&inner), Some(&key("list")));

        let outdented = engine
            .indent(&indented.document, &selection, IndentDirection::Outdent)
            .unwrap()
            .unwrap();
        assert_eq!(outdented.document, doc);
    }

    #[test]
    fn tab_outside_list_is_not_handled() {
        let engine = CommandEngine::standard();
        let doc = nested_fixture();
        let result = engine
            .indent(&doc, &Selection::collapsed("z.t", 0), IndentDirection::Indent)
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn tab_prefers_numbered_list_when_both_enclose_selection() {
        let engine = CommandEngine::standard();
        let doc = Document::with_key(
            "doc",
            vec![
                Block::with_key("outer", BlockType::BulletedList).child(
                    Block::with_key("inner", BlockType::NumberedList).child(
                        Block::with_key("li", BlockType::ListItem)
                            .child(Text::with_key("li.t", "x")),
                    ),
                ),
                paragraph("z"),
            ],
        )
        .unwrap();
        assert_eq!(
            engine.list_type_for_tab(&doc, &Selection::collapsed("li.t", 0)),
            Some(BlockType::NumberedList)
        );
    }
}
