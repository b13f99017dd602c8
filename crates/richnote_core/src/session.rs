//! Editor session: the single owner of the active document.
//!
//! # Responsibility
//! - Hold the current `Document`/`Selection` pair and publish new snapshots.
//! - Route input events to commands, persistence and the decode runtime.
//! - Apply finished image decodes against the document current at that time.
//!
//! # Invariants
//! - Every change is snapshot-then-replace: commands build a new document
//!   from the current one and the session swaps it in as a whole.
//! - Decode completions are applied one at a time on the session's thread.
//! - A completion whose target no longer exists, or that was started before
//!   the last reset, is dropped, never applied to a replaced document.

use crate::command::{is_block_active, is_mark_active, CommandEngine, CommandError, CommandOutcome};
use crate::config::SessionConfig;
use crate::dispatch::decode::{DecodeCompletion, DecodeRuntime, FileDecoder};
use crate::dispatch::image_url::ExtensionImagePredicate;
use crate::dispatch::{
    resolve_key, resolve_transfer, Control, Dispatch, EditorEvent, KeyAction, TransferAction,
};
use crate::model::document::Document;
use crate::model::node::{BlockType, MarkType};
use crate::model::selection::Selection;
use crate::render::{render_document, HtmlRenderer};
use crate::repo::snapshot_repo::SnapshotStore;
use crate::schema::{Schema, SchemaError};
use crate::service::persistence_gateway::{LoadSource, PersistError, PersistenceGateway};
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;
use std::sync::Arc;

#[derive(Debug)]
pub enum SessionError {
    Command(CommandError),
    Schema(SchemaError),
    Persist(PersistError),
    /// Decode runtime could not start.
    Runtime(io::Error),
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Command(err) => write!(f, "{err}"),
            Self::Schema(err) => write!(f, "{err}"),
            Self::Persist(err) => write!(f, "{err}"),
            Self::Runtime(err) => write!(f, "failed to start decode runtime: {err}"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Command(err) => Some(err),
            Self::Schema(err) => Some(err),
            Self::Persist(err) => Some(err),
            Self::Runtime(err) => Some(err),
        }
    }
}

impl From<CommandError> for SessionError {
    fn from(value: CommandError) -> Self {
        Self::Command(value)
    }
}

impl From<SchemaError> for SessionError {
    fn from(value: SchemaError) -> Self {
        Self::Schema(value)
    }
}

impl From<PersistError> for SessionError {
    fn from(value: PersistError) -> Self {
        Self::Persist(value)
    }
}

impl From<io::Error> for SessionError {
    fn from(value: io::Error) -> Self {
        Self::Runtime(value)
    }
}

pub type SessionResult<T> = Result<T, SessionError>;

/// Active editing session over one snapshot store.
pub struct EditorSession<S: SnapshotStore> {
    config: SessionConfig,
    engine: CommandEngine,
    gateway: PersistenceGateway<S>,
    predicate: ExtensionImagePredicate,
    decodes: DecodeRuntime,
    document: Document,
    selection: Selection,
    version: u64,
    /// Bumped on every reset; decodes started in an older epoch are stale.
    epoch: u64,
}

impl<S: SnapshotStore> EditorSession<S> {
    /// Loads the stored document (or the bundled default) and starts the
    /// data-URL decode runtime.
    pub fn open(store: S, config: SessionConfig) -> SessionResult<Self> {
        let decodes = DecodeRuntime::data_url()?;
        Self::open_with_runtime(store, config, decodes)
    }

    /// Same as [`EditorSession::open`] with a custom file decoder.
    pub fn open_with_decoder(
        store: S,
        config: SessionConfig,
        decoder: Arc<dyn FileDecoder>,
    ) -> SessionResult<Self> {
        let decodes = DecodeRuntime::new(decoder)?;
        Self::open_with_runtime(store, config, decodes)
    }

    fn open_with_runtime(
        store: S,
        config: SessionConfig,
        decodes: DecodeRuntime,
    ) -> SessionResult<Self> {
        let engine = CommandEngine::new(
            Schema::standard().with_max_passes(config.max_normalize_passes),
        )
        .with_default_block(config.default_block.clone());
        let gateway = PersistenceGateway::with_key(store, config.storage_key.clone());
        let predicate = ExtensionImagePredicate::new(&config.image_extensions);

        let loaded = gateway.load()?;
        let document = engine.normalize(&loaded.document)?;
        let selection = Selection::start_of(&document);
        info!(
            "event=session_open module=session status=ok source={} nodes={}",
            match loaded.source {
                LoadSource::Persisted => "persisted",
                LoadSource::Default(_) => "default",
            },
            document.node_count()
        );

        Ok(Self {
            config,
            engine,
            gateway,
            predicate,
            decodes,
            document,
            selection,
            version: 0,
            epoch: 0,
        })
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Moves the cursor; stale selections are accepted and make commands
    /// no-ops until replaced.
    pub fn select(&mut self, selection: Selection) {
        self.selection = selection;
    }

    /// Count of published document changes since open.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        self.gateway.store()
    }

    /// Decodes started and not yet applied.
    pub fn pending_decodes(&self) -> usize {
        self.decodes.in_flight()
    }

    pub fn is_mark_active(&self, mark: &MarkType) -> bool {
        is_mark_active(&self.document, &self.selection, mark)
    }

    pub fn is_block_active(&self, kind: &BlockType) -> bool {
        is_block_active(&self.document, &self.selection, kind)
    }

    pub fn render_html(&self) -> String {
        render_document(&HtmlRenderer, &self.document)
    }

    /// Routes one input event.
    pub fn dispatch(&mut self, event: EditorEvent) -> SessionResult<Dispatch> {
        match event {
            EditorEvent::Key(key) => match resolve_key(&key) {
                KeyAction::ToggleMark(mark) => {
                    self.toggle_mark(&mark)?;
                    Ok(Dispatch::Handled)
                }
                KeyAction::Nest(direction) => {
                    let nested = self
                        .engine
                        .indent(&self.document, &self.selection, direction)?;
                    match nested {
                        Some(outcome) => {
                            self.publish("indent", outcome);
                            Ok(Dispatch::Handled)
                        }
                        None => Ok(Dispatch::Unhandled),
                    }
                }
                KeyAction::PassThrough => Ok(Dispatch::Unhandled),
            },
            EditorEvent::Control(control) => {
                self.apply_control(control)?;
                Ok(Dispatch::Handled)
            }
            EditorEvent::Transfer(transfer) => {
                match resolve_transfer(&transfer, &self.selection, &self.predicate) {
                    TransferAction::DecodeImages { files, target } => {
                        let started = files.len();
                        for file in files {
                            self.decodes.spawn(file, target.clone(), self.epoch);
                        }
                        debug!(
                            "event=decode_start module=session status=ok files={started}"
                        );
                        if started == 0 {
                            Ok(Dispatch::Handled)
                        } else {
                            Ok(Dispatch::Pending(started))
                        }
                    }
                    TransferAction::InsertUrl { src, target } => {
                        self.insert_image(&src, Some(&target))?;
                        Ok(Dispatch::Handled)
                    }
                    TransferAction::PassThrough => Ok(Dispatch::Unhandled),
                }
            }
        }
    }

    fn apply_control(&mut self, control: Control) -> SessionResult<()> {
        match control {
            Control::Mark(mark) => self.toggle_mark(&mark),
            Control::Block(kind) => self.set_block_type(&kind),
            Control::ImagePrompt(input) => {
                let outcome = self.engine.insert_image_from_prompt(
                    &self.document,
                    &self.selection,
                    input.as_deref(),
                )?;
                self.publish("insert_image", outcome);
                Ok(())
            }
            Control::PickedImages(sources) => {
                let outcome =
                    self.engine
                        .insert_images(&self.document, &self.selection, &sources)?;
                self.publish("insert_images", outcome);
                Ok(())
            }
            Control::Save => self.save(),
            Control::Cancel => self.reset(),
        }
    }

    pub fn toggle_mark(&mut self, mark: &MarkType) -> SessionResult<()> {
        let outcome = self
            .engine
            .toggle_mark(&self.document, &self.selection, mark)?;
        self.publish("toggle_mark", outcome);
        Ok(())
    }

    pub fn set_block_type(&mut self, kind: &BlockType) -> SessionResult<()> {
        let outcome = self
            .engine
            .set_block_type(&self.document, &self.selection, kind)?;
        self.publish("set_block_type", outcome);
        Ok(())
    }

    pub fn insert_image(&mut self, src: &str, target: Option<&Selection>) -> SessionResult<()> {
        let outcome = self
            .engine
            .insert_image(&self.document, &self.selection, src, target)?;
        self.publish("insert_image", outcome);
        Ok(())
    }

    /// Persists the active document.
    pub fn save(&mut self) -> SessionResult<()> {
        self.gateway.save(&self.document)?;
        Ok(())
    }

    /// Drops the stored snapshot and returns to the bundled document.
    pub fn reset(&mut self) -> SessionResult<()> {
        let document = self.engine.normalize(&self.gateway.reset()?)?;
        self.selection = Selection::start_of(&document);
        self.document = document;
        self.version += 1;
        self.epoch += 1;
        info!(
            "event=session_reset module=session status=ok version={} epoch={}",
            self.version, self.epoch
        );
        Ok(())
    }

    /// Applies every decode that has finished, without blocking.
    pub fn poll_decodes(&mut self) -> SessionResult<usize> {
        let mut applied = 0;
        while let Some(completion) = self.decodes.try_next() {
            if self.apply_completion(completion)? {
                applied += 1;
            }
        }
        Ok(applied)
    }

    /// Blocks until no decode is in flight or one wait exceeds the
    /// configured settle timeout.
    pub fn settle_decodes(&mut self) -> SessionResult<usize> {
        let mut applied = 0;
        while self.decodes.in_flight() > 0 {
            let Some(completion) = self.decodes.next_timeout(self.config.settle_timeout) else {
                warn!(
                    "event=decode_settle module=session status=timeout in_flight={}",
                    self.decodes.in_flight()
                );
                break;
            };
            if self.apply_completion(completion)? {
                applied += 1;
            }
        }
        Ok(applied)
    }

    fn apply_completion(&mut self, completion: DecodeCompletion) -> SessionResult<bool> {
        let src = match completion.result {
            Ok(src) => src,
            Err(err) => {
                warn!(
                    "event=decode_finish module=session status=error file={} error={err}",
                    completion.file_name
                );
                return Ok(false);
            }
        };
        if completion.epoch != self.epoch || !completion.target.is_valid_in(&self.document) {
            debug!(
                "event=decode_finish module=session status=stale file={}",
                completion.file_name
            );
            return Ok(false);
        }
        let outcome = self.engine.insert_image(
            &self.document,
            &self.selection,
            &src,
            Some(&completion.target),
        )?;
        self.publish("insert_image", outcome);
        Ok(true)
    }

    fn publish(&mut self, command: &str, outcome: CommandOutcome) {
        self.selection = outcome.selection;
        if outcome.document == self.document {
            return;
        }
        self.document = outcome.document;
        self.version += 1;
        debug!(
            "event=publish module=session status=ok command={command} version={} nodes={}",
            self.version,
            self.document.node_count()
        );
    }
}

impl<S: SnapshotStore> std::fmt::Debug for EditorSession<S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorSession")
            .field("document", &self.document.key())
            .field("version", &self.version)
            .field("decodes", &self.decodes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::EditorSession;
    use crate::config::SessionConfig;
    use crate::dispatch::{Control, Dispatch, EditorEvent, Key, KeyEvent, Modifiers};
    use crate::model::default_document::default_document;
    use crate::model::node::{MarkType, Node, NodeKey};
    use crate::model::selection::Selection;
    use crate::repo::snapshot_repo::MemorySnapshotStore;

    #[test]
    fn opens_with_default_document_and_cursor_at_start() {
        let store = MemorySnapshotStore::new();
        let session = EditorSession::open(&store, SessionConfig::default()).unwrap();
        assert_eq!(session.document(), &default_document());
        assert_eq!(
            session.selection(),
            &Selection::collapsed("default-title-text", 0)
        );
        assert_eq!(session.version(), 0);
    }

    #[test]
    fn hotkey_publishes_new_version() {
        let store = MemorySnapshotStore::new();
        let mut session = EditorSession::open(&store, SessionConfig::default()).unwrap();
        let result = session
            .dispatch(EditorEvent::Key(KeyEvent::new(
                Key::Char('b'),
                Modifiers::primary(),
            )))
            .unwrap();
        assert_eq!(result, Dispatch::Handled);
        assert_eq!(session.version(), 1);
        let title = session
            .document()
            .get_node(&NodeKey::from("default-title-text"))
            .and_then(Node::as_text)
            .unwrap();
        assert!(title.has_mark(&MarkType::Bold));
        assert!(session.is_mark_active(&MarkType::Bold));
    }

    #[test]
    fn plain_keys_pass_through_without_publishing() {
        let store = MemorySnapshotStore::new();
        let mut session = EditorSession::open(&store, SessionConfig::default()).unwrap();
        let result = session
            .dispatch(EditorEvent::Key(KeyEvent::new(
                Key::Char('b'),
                Modifiers::default(),
            )))
            .unwrap();
        assert_eq!(result, Dispatch::Unhandled);
        assert_eq!(session.version(), 0);
    }

    #[test]
    fn save_control_persists_and_cancel_resets() {
        let store = MemorySnapshotStore::new();
        let mut session = EditorSession::open(&store, SessionConfig::default()).unwrap();
        session.toggle_mark(&MarkType::Italic).unwrap();
        session
            .dispatch(EditorEvent::Control(Control::Save))
            .unwrap();
        assert_eq!(store.len(), 1);

        session
            .dispatch(EditorEvent::Control(Control::Cancel))
            .unwrap();
        assert!(store.is_empty());
        assert_eq!(session.document(), &default_document());
    }
}
