//! Image block insertion.

use super::{CommandEngine, CommandOutcome, CommandResult};
use crate::model::document::Document;
use crate::model::node::{Block, NodeKey};
use crate::model::selection::Selection;

impl CommandEngine {
    /// Inserts a void image block next to the block at the selection start.
    ///
    /// `target` replaces `selection` when given. A target or selection that
    /// no longer resolves in `document` leaves everything unchanged.
    pub fn insert_image(
        &self,
        document: &Document,
        selection: &Selection,
        src: &str,
        target: Option<&Selection>,
    ) -> CommandResult {
        let at = target.unwrap_or(selection);
        let Some(start) = at.start(document) else {
            return Ok(CommandOutcome::unchanged(document, selection));
        };
        let Some((parent, index)) = insertion_slot(document, &start.key, start.offset) else {
            return Ok(CommandOutcome::unchanged(document, selection));
        };

        let image = Block::image(src);
        let image_key = image.key.clone();
        let next = document.insert_node(&parent, index, image)?;
        self.finish(next, Selection::collapsed(image_key, 0))
    }

    /// Image URL prompt result. `None` or blank input is a cancel.
    pub fn insert_image_from_prompt(
        &self,
        document: &Document,
        selection: &Selection,
        input: Option<&str>,
    ) -> CommandResult {
        match input.map(str::trim).filter(|src| !src.is_empty()) {
            Some(src) => self.insert_image(document, selection, src, None),
            None => Ok(CommandOutcome::unchanged(document, selection)),
        }
    }

    /// Inserts each source in order, each one after the previous image.
    pub fn insert_images<S: AsRef<str>>(
        &self,
        document: &Document,
        selection: &Selection,
        sources: &[S],
    ) -> CommandResult {
        let mut outcome = CommandOutcome::unchanged(document, selection);
        for src in sources {
            outcome =
                self.insert_image(&outcome.document, &outcome.selection, src.as_ref(), None)?;
        }
        Ok(outcome)
    }
}

/// Parent key and child index where a block anchored at `key` goes.
fn insertion_slot(
    document: &Document,
    key: &NodeKey,
    offset: usize,
) -> Option<(NodeKey, usize)> {
    if key == document.key() {
        return Some((key.clone(), offset.min(document.nodes().len())));
    }
    let anchor = match document.leaf_block_of(key) {
        Some(block) => block,
        None => document.get_block(key)?,
    };
    let parent = document.parent_key(&anchor.key)?.clone();
    let index = *document.path_of(&anchor.key)?.last()?;

    let at_block_start = offset == 0
        && anchor
            .nodes
            .first()
            .and_then(|node| node.as_text())
            .is_some_and(|text| &text.key == key);
    let before = at_block_start && !anchor.is_void() && !anchor.text().is_empty();
    Some((parent, if before { index } else { index + 1 }))
}
