//! Input event model and routing.
//!
//! # Responsibility
//! - Describe keyboard, toolbar and drag/drop/paste input as plain data.
//! - Resolve each event to the editing intent it stands for.
//!
//! # Invariants
//! - Resolution is pure; applying the intent is the session's job.
//! - Hotkeys are tested in fixed priority order: bold, italic, underline,
//!   code, then Tab.
//!
//! # See also
//! - docs: `crate::session::EditorSession::dispatch`

pub mod decode;
pub mod hotkey;
pub mod image_url;

use crate::command::IndentDirection;
use crate::model::node::{BlockType, MarkType};
use crate::model::selection::Selection;
use hotkey::Hotkey;
use image_url::ImageUrlPredicate;

/// Modifier state of one key press.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
    pub alt: bool,
}

impl Modifiers {
    /// Platform modifier alone.
    pub fn primary() -> Self {
        Self {
            ctrl: true,
            ..Self::default()
        }
    }

    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Self::default()
        }
    }

    /// `mod` in hotkey notation: Ctrl or Cmd.
    pub fn is_mod(&self) -> bool {
        self.ctrl || self.meta
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Tab,
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn new(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }
}

/// Toolbar controls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Control {
    Mark(MarkType),
    Block(BlockType),
    /// Image URL prompt result; `None` when the prompt was dismissed.
    ImagePrompt(Option<String>),
    /// Sources returned by the multi-file picker, already encoded.
    PickedImages(Vec<String>),
    Save,
    Cancel,
}

/// One transferred file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileBlob {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl FileBlob {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes,
        }
    }

    /// MIME top-level type is `image`.
    pub fn is_image(&self) -> bool {
        self.mime
            .split('/')
            .next()
            .is_some_and(|top| top.trim().eq_ignore_ascii_case("image"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferPayload {
    Files(Vec<FileBlob>),
    Text(String),
    /// Anything else (HTML fragments, editor fragments, ...).
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferKind {
    Drop,
    Paste,
}

/// Drop or paste, with the range it was aimed at when the host knows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferEvent {
    pub kind: TransferKind,
    pub payload: TransferPayload,
    pub target: Option<Selection>,
}

impl TransferEvent {
    pub fn drop(payload: TransferPayload, target: Option<Selection>) -> Self {
        Self {
            kind: TransferKind::Drop,
            payload,
            target,
        }
    }

    pub fn paste(payload: TransferPayload, target: Option<Selection>) -> Self {
        Self {
            kind: TransferKind::Paste,
            payload,
            target,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEvent {
    Key(KeyEvent),
    Control(Control),
    Transfer(TransferEvent),
}

/// What the session did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Handled,
    /// Handled; this many decodes were started and will land later.
    Pending(usize),
    /// Left to the host's default behavior.
    Unhandled,
}

impl Dispatch {
    pub fn is_handled(&self) -> bool {
        !matches!(self, Self::Unhandled)
    }
}

/// Intent behind a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAction {
    ToggleMark(MarkType),
    Nest(IndentDirection),
    PassThrough,
}

pub fn resolve_key(event: &KeyEvent) -> KeyAction {
    if let Some(hotkey) = Hotkey::find(event) {
        return KeyAction::ToggleMark(hotkey.mark());
    }
    if event.key == Key::Tab {
        let direction = if event.modifiers.shift {
            IndentDirection::Outdent
        } else {
            IndentDirection::Indent
        };
        return KeyAction::Nest(direction);
    }
    KeyAction::PassThrough
}

/// Intent behind a drop or paste.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferAction {
    /// Decode these image files and insert each at `target`.
    DecodeImages {
        files: Vec<FileBlob>,
        target: Selection,
    },
    InsertUrl {
        src: String,
        target: Selection,
    },
    PassThrough,
}

/// Resolves a transfer. `current` stands in for a missing paste target.
///
/// A file payload is always consumed, even when no file is an image.
pub fn resolve_transfer(
    event: &TransferEvent,
    current: &Selection,
    predicate: &dyn ImageUrlPredicate,
) -> TransferAction {
    let target = match (&event.target, event.kind) {
        (Some(target), _) => target.clone(),
        (None, TransferKind::Drop) => return TransferAction::PassThrough,
        (None, TransferKind::Paste) => current.clone(),
    };
    match &event.payload {
        TransferPayload::Files(files) => TransferAction::DecodeImages {
            files: files.iter().filter(|file| file.is_image()).cloned().collect(),
            target,
        },
        TransferPayload::Text(text) if predicate.is_image_url(text) => TransferAction::InsertUrl {
            src: text.clone(),
            target,
        },
        TransferPayload::Text(_) | TransferPayload::Other => TransferAction::PassThrough,
    }
}
