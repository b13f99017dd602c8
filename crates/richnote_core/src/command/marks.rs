//! Mark toggling.

use super::{has_mark, CommandEngine, CommandOutcome, CommandResult};
use crate::model::document::Document;
use crate::model::node::{Mark, MarkType};
use crate::model::selection::Selection;
use std::collections::BTreeSet;

impl CommandEngine {
    /// Removes `mark` from every selected leaf if any carries it, otherwise
    /// adds it to every selected leaf.
    pub fn toggle_mark(
        &self,
        document: &Document,
        selection: &Selection,
        mark: &MarkType,
    ) -> CommandResult {
        let targets: BTreeSet<_> = selection
            .texts(document)
            .into_iter()
            .map(|text| text.key.clone())
            .collect();
        if targets.is_empty() {
            return Ok(CommandOutcome::unchanged(document, selection));
        }

        let remove = has_mark(document, selection, mark);
        let next = document.update_texts(&targets, |text| {
            let entry = Mark::new(mark.clone());
            if remove {
                text.marks.remove(&entry);
            } else {
                text.marks.insert(entry);
            }
        })?;
        self.finish(next, selection.clone())
    }
}
