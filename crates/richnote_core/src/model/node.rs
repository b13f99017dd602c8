//! Content node model.
//!
//! # Responsibility
//! - Define the block/text node variants that make up a rich-text tree.
//! - Define block and mark vocabularies with their stable wire names.
//!
//! # Invariants
//! - `NodeKey` values are unique inside one document.
//! - A void block (`BlockType::is_void`) never owns children.
//! - Text marks form a set; order carries no meaning.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use uuid::Uuid;

/// Stable identifier of one node inside a document.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeKey(String);

impl NodeKey {
    /// Generates a fresh random key.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for NodeKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for NodeKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Structural block vocabulary.
///
/// Serialized as the kebab-case names used by persisted snapshots. Unknown
/// names survive a round trip through `Other`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BlockType {
    Paragraph,
    HeadingOne,
    HeadingTwo,
    BlockQuote,
    BulletedList,
    NumberedList,
    ListItem,
    Image,
    Other(String),
}

impl BlockType {
    pub fn parse(value: &str) -> Self {
        match value {
            "paragraph" => Self::Paragraph,
            "heading-one" => Self::HeadingOne,
            "heading-two" => Self::HeadingTwo,
            "block-quote" => Self::BlockQuote,
            "bulleted-list" => Self::BulletedList,
            "numbered-list" => Self::NumberedList,
            "list-item" => Self::ListItem,
            "image" => Self::Image,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Paragraph => "paragraph",
            Self::HeadingOne => "heading-one",
            Self::HeadingTwo => "heading-two",
            Self::BlockQuote => "block-quote",
            Self::BulletedList => "bulleted-list",
            Self::NumberedList => "numbered-list",
            Self::ListItem => "list-item",
            Self::Image => "image",
            Self::Other(value) => value.as_str(),
        }
    }

    /// Returns whether this type wraps `list-item` children.
    pub fn is_list(&self) -> bool {
        matches!(self, Self::BulletedList | Self::NumberedList)
    }

    /// Returns whether blocks of this type hold no editable children.
    pub fn is_void(&self) -> bool {
        matches!(self, Self::Image)
    }

    /// Returns the list wrapper that is not `self`, for list types only.
    pub fn other_list(&self) -> Option<Self> {
        match self {
            Self::BulletedList => Some(Self::NumberedList),
            Self::NumberedList => Some(Self::BulletedList),
            _ => None,
        }
    }
}

impl Display for BlockType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for BlockType {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<BlockType> for String {
    fn from(value: BlockType) -> Self {
        value.as_str().to_string()
    }
}

/// Inline formatting vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MarkType {
    Bold,
    Italic,
    Underlined,
    Code,
    Other(String),
}

impl MarkType {
    pub fn parse(value: &str) -> Self {
        match value {
            "bold" => Self::Bold,
            "italic" => Self::Italic,
            "underlined" => Self::Underlined,
            "code" => Self::Code,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Bold => "bold",
            Self::Italic => "italic",
            Self::Underlined => "underlined",
            Self::Code => "code",
            Self::Other(value) => value.as_str(),
        }
    }
}

impl Display for MarkType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for MarkType {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<MarkType> for String {
    fn from(value: MarkType) -> Self {
        value.as_str().to_string()
    }
}

/// Formatting annotation attached to a text leaf.
///
/// Serialized as `{ "type": "<mark>" }`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Mark {
    #[serde(rename = "type")]
    pub kind: MarkType,
}

impl Mark {
    pub fn new(kind: MarkType) -> Self {
        Self { kind }
    }
}

/// Text leaf: a character run plus its mark set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Text {
    #[serde(default = "NodeKey::generate")]
    pub key: NodeKey,
    pub text: String,
    #[serde(default)]
    pub marks: BTreeSet<Mark>,
}

impl Text {
    pub fn new(text: impl Into<String>) -> Self {
        Self::with_key(NodeKey::generate(), text)
    }

    pub fn with_key(key: impl Into<NodeKey>, text: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            text: text.into(),
            marks: BTreeSet::new(),
        }
    }

    /// Builder-style helper adding one mark.
    pub fn marked(mut self, kind: MarkType) -> Self {
        self.marks.insert(Mark::new(kind));
        self
    }

    pub fn has_mark(&self, kind: &MarkType) -> bool {
        self.marks.iter().any(|mark| &mark.kind == kind)
    }
}

/// Structural container node.
///
/// `data` is an opaque attribute map; images keep their source under `src`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    #[serde(default = "NodeKey::generate")]
    pub key: NodeKey,
    #[serde(rename = "type")]
    pub kind: BlockType,
    #[serde(default)]
    pub nodes: Vec<Arc<Node>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, Value>,
}

impl Block {
    /// Creates an empty block with a generated key.
    pub fn new(kind: BlockType) -> Self {
        Self::with_key(NodeKey::generate(), kind)
    }

    pub fn with_key(key: impl Into<NodeKey>, kind: BlockType) -> Self {
        Self {
            key: key.into(),
            kind,
            nodes: Vec::new(),
            data: BTreeMap::new(),
        }
    }

    /// Builder-style helper appending one child node.
    pub fn child(mut self, node: impl Into<Node>) -> Self {
        self.nodes.push(Arc::new(node.into()));
        self
    }

    /// Creates the schema's default block: a paragraph holding one empty text.
    pub fn default_paragraph() -> Self {
        Self::new(BlockType::Paragraph).child(Text::new(""))
    }

    /// Creates a void image block pointing at `src`.
    pub fn image(src: impl Into<String>) -> Self {
        let mut block = Self::new(BlockType::Image);
        block
            .data
            .insert("src".to_string(), Value::String(src.into()));
        block
    }

    pub fn is_void(&self) -> bool {
        self.kind.is_void()
    }

    /// Returns whether no child of this block is itself a block.
    pub fn is_leaf(&self) -> bool {
        !self
            .nodes
            .iter()
            .any(|node| matches!(node.as_ref(), Node::Block(_)))
    }

    /// Image source, when present.
    pub fn src(&self) -> Option<&str> {
        self.data.get("src").and_then(Value::as_str)
    }

    /// Concatenated text of every descendant leaf.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            node.collect_text(&mut out);
        }
        out
    }
}

/// Tree node: either a structural block or a text leaf.
///
/// Blocks carry `type` + `nodes`; text leaves carry `text` + `marks`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Block(Block),
    Text(Text),
}

impl Node {
    pub fn key(&self) -> &NodeKey {
        match self {
            Self::Block(block) => &block.key,
            Self::Text(text) => &text.key,
        }
    }

    pub fn as_block(&self) -> Option<&Block> {
        match self {
            Self::Block(block) => Some(block),
            Self::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&Text> {
        match self {
            Self::Text(text) => Some(text),
            Self::Block(_) => None,
        }
    }

    /// Children of a block; text leaves have none.
    pub fn children(&self) -> &[Arc<Node>] {
        match self {
            Self::Block(block) => &block.nodes,
            Self::Text(_) => &[],
        }
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Self::Text(text) => out.push_str(&text.text),
            Self::Block(block) => {
                for child in &block.nodes {
                    child.collect_text(out);
                }
            }
        }
    }
}

impl From<Block> for Node {
    fn from(value: Block) -> Self {
        Self::Block(value)
    }
}

impl From<Text> for Node {
    fn from(value: Text) -> Self {
        Self::Text(value)
    }
}

#[cfg(test)]
mod tests {
    use super::{Block, BlockType, MarkType, Node, Text};

    #[test]
    fn block_type_wire_names_round_trip() {
        for name in [
            "paragraph",
            "heading-one",
            "heading-two",
            "block-quote",
            "bulleted-list",
            "numbered-list",
            "list-item",
            "image",
            "video",
        ] {
            assert_eq!(BlockType::parse(name).as_str(), name);
        }
        assert_eq!(
            BlockType::parse("video"),
            BlockType::Other("video".to_string())
        );
    }

    #[test]
    fn image_block_is_void_and_keeps_src() {
        let image = Block::image("https://example.com/cat.png");
        assert!(image.is_void());
        assert!(image.nodes.is_empty());
        assert_eq!(image.src(), Some("https://example.com/cat.png"));
    }

    #[test]
    fn untagged_node_decodes_text_and_block_shapes() {
        let text: Node = serde_json::from_value(serde_json::json!({
            "key": "t1",
            "text": "hello",
            "marks": [{ "type": "bold" }]
        }))
        .unwrap();
        let text = text.as_text().unwrap();
        assert!(text.has_mark(&MarkType::Bold));

        let block: Node = serde_json::from_value(serde_json::json!({
            "key": "b1",
            "type": "paragraph",
            "nodes": [{ "key": "t2", "text": "" }]
        }))
        .unwrap();
        let block = block.as_block().unwrap();
        assert_eq!(block.kind, BlockType::Paragraph);
        assert_eq!(block.nodes.len(), 1);
    }

    #[test]
    fn empty_data_is_not_serialized() {
        let paragraph = Block::with_key("p", BlockType::Paragraph).child(Text::with_key("t", "x"));
        let json = serde_json::to_value(&paragraph).unwrap();
        assert!(json.get("data").is_none());
        assert_eq!(json["type"], "paragraph");
    }
}
