//! Immutable document tree and structural transforms.
//!
//! # Responsibility
//! - Own the root node sequence and a child -> parent back-reference index.
//! - Provide pure query and copy-on-write transform primitives.
//!
//! # Invariants
//! - Every transform returns a new `Document`; the receiver is never mutated.
//! - Only the root-to-target spine is copied; untouched subtrees stay shared
//!   (`Arc::ptr_eq`) between versions.
//! - Keys are unique, root children are blocks, void blocks are empty.

use crate::model::node::{Block, BlockType, Node, NodeKey, Text};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub type DocumentResult<T> = Result<T, DocumentError>;

/// Structural errors raised by document queries and transforms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    /// Key does not exist in this document version.
    NodeNotFound(NodeKey),
    /// Target is a text leaf where a container was required.
    NotAContainer(NodeKey),
    /// Target is a text leaf where a block was required.
    NotABlock(NodeKey),
    /// Attempted to place children under a void block.
    VoidParent(NodeKey),
    /// Insert position is past the end of the parent's children.
    IndexOutOfBounds {
        parent: NodeKey,
        index: usize,
        len: usize,
    },
    /// Wrap targets do not share one parent.
    NotSiblings,
    /// Operation received no target nodes.
    NoTargets,
    /// Two nodes share one key.
    DuplicateKey(NodeKey),
    /// The root itself cannot be removed or retyped.
    RootTarget,
    /// A text leaf sits directly under the root.
    TextAtRoot(NodeKey),
    /// A void block owns children.
    NonEmptyVoid(NodeKey),
    /// A child-index path no longer resolves.
    InvalidPath,
}

impl Display for DocumentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NodeNotFound(key) => write!(f, "node not found: {key}"),
            Self::NotAContainer(key) => write!(f, "node cannot hold children: {key}"),
            Self::NotABlock(key) => write!(f, "node is not a block: {key}"),
            Self::VoidParent(key) => write!(f, "void block cannot hold children: {key}"),
            Self::IndexOutOfBounds { parent, index, len } => write!(
                f,
                "index {index} out of bounds for parent {parent} with {len} children"
            ),
            Self::NotSiblings => write!(f, "wrap targets must share one parent"),
            Self::NoTargets => write!(f, "operation requires at least one target node"),
            Self::DuplicateKey(key) => write!(f, "duplicate node key: {key}"),
            Self::RootTarget => write!(f, "document root cannot be the target"),
            Self::TextAtRoot(key) => write!(f, "text leaf directly under document root: {key}"),
            Self::NonEmptyVoid(key) => write!(f, "void block has children: {key}"),
            Self::InvalidPath => write!(f, "node path does not resolve in this document"),
        }
    }
}

impl Error for DocumentError {}

/// Containing node returned by [`Document::get_parent`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Parent<'a> {
    /// The node is a direct child of the document root.
    Root,
    Block(&'a Block),
}

/// Immutable rich-text document.
///
/// Serialized as `{ "key": ..., "nodes": [...] }`; deserialization runs the
/// same structural validation as [`Document::new`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "DocumentWire", into = "DocumentWire")]
pub struct Document {
    key: NodeKey,
    nodes: Vec<Arc<Node>>,
    parents: Arc<HashMap<NodeKey, NodeKey>>,
}

#[derive(Serialize, Deserialize)]
struct DocumentWire {
    #[serde(default = "NodeKey::generate")]
    key: NodeKey,
    #[serde(default)]
    nodes: Vec<Arc<Node>>,
}

impl TryFrom<DocumentWire> for Document {
    type Error = DocumentError;

    fn try_from(value: DocumentWire) -> Result<Self, Self::Error> {
        Self::from_parts(value.key, value.nodes)
    }
}

impl From<Document> for DocumentWire {
    fn from(value: Document) -> Self {
        Self {
            key: value.key,
            nodes: value.nodes,
        }
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.nodes == other.nodes
    }
}

impl Document {
    /// Builds a validated document from root blocks with a generated root key.
    pub fn new(blocks: Vec<Block>) -> DocumentResult<Self> {
        Self::with_key(NodeKey::generate(), blocks)
    }

    pub fn with_key(key: impl Into<NodeKey>, blocks: Vec<Block>) -> DocumentResult<Self> {
        let nodes = blocks
            .into_iter()
            .map(|block| Arc::new(Node::Block(block)))
            .collect();
        Self::from_parts(key.into(), nodes)
    }

    fn from_parts(key: NodeKey, nodes: Vec<Arc<Node>>) -> DocumentResult<Self> {
        let mut parents = HashMap::new();
        for node in &nodes {
            if let Node::Text(text) = node.as_ref() {
                return Err(DocumentError::TextAtRoot(text.key.clone()));
            }
            index_subtree(&key, node, &mut parents)?;
        }
        if parents.contains_key(&key) {
            return Err(DocumentError::DuplicateKey(key));
        }
        Ok(Self {
            key,
            nodes,
            parents: Arc::new(parents),
        })
    }

    fn rebuilt(&self, nodes: Vec<Arc<Node>>) -> DocumentResult<Self> {
        Self::from_parts(self.key.clone(), nodes)
    }

    pub fn key(&self) -> &NodeKey {
        &self.key
    }

    /// Root children in order.
    pub fn nodes(&self) -> &[Arc<Node>] {
        &self.nodes
    }

    pub fn last_block(&self) -> Option<&Block> {
        self.nodes.last().and_then(|node| node.as_block())
    }

    /// Returns whether `key` names the root or one of its descendants.
    pub fn contains(&self, key: &NodeKey) -> bool {
        key == &self.key || self.parents.contains_key(key)
    }

    /// Number of nodes below the root.
    pub fn node_count(&self) -> usize {
        self.parents.len()
    }

    /// Child-index path from the root to `key`; empty for the root itself.
    pub fn path_of(&self, key: &NodeKey) -> Option<Vec<usize>> {
        if key == &self.key {
            return Some(Vec::new());
        }
        let mut chain = vec![key];
        let mut cursor = self.parents.get(key)?;
        while cursor != &self.key {
            chain.push(cursor);
            cursor = self.parents.get(cursor)?;
        }

        let mut path = Vec::with_capacity(chain.len());
        let mut siblings: &[Arc<Node>] = &self.nodes;
        for step in chain.into_iter().rev() {
            let index = siblings.iter().position(|node| node.key() == step)?;
            path.push(index);
            siblings = siblings[index].children();
        }
        Some(path)
    }

    /// Resolves a child-index path; `None` for the empty (root) path.
    pub fn node_at(&self, path: &[usize]) -> Option<&Node> {
        let (first, rest) = path.split_first()?;
        let mut node = self.nodes.get(*first)?.as_ref();
        for index in rest {
            node = node.children().get(*index)?.as_ref();
        }
        Some(node)
    }

    pub fn get_node(&self, key: &NodeKey) -> Option<&Node> {
        let path = self.path_of(key)?;
        self.node_at(&path)
    }

    pub fn get_block(&self, key: &NodeKey) -> Option<&Block> {
        self.get_node(key).and_then(Node::as_block)
    }

    /// Nearest containing node, or `None` when `key` is the root or unknown.
    pub fn get_parent(&self, key: &NodeKey) -> Option<Parent<'_>> {
        let parent_key = self.parents.get(key)?;
        if parent_key == &self.key {
            return Some(Parent::Root);
        }
        self.get_block(parent_key).map(Parent::Block)
    }

    /// Key of the containing node (the root key for top-level blocks).
    pub fn parent_key(&self, key: &NodeKey) -> Option<&NodeKey> {
        self.parents.get(key)
    }

    /// Block ancestors of `key`, nearest first. The root is not included.
    pub fn ancestors(&self, key: &NodeKey) -> Vec<&Block> {
        let mut result = Vec::new();
        let mut cursor = self.parents.get(key);
        while let Some(current) = cursor {
            if current == &self.key {
                break;
            }
            match self.get_block(current) {
                Some(block) => result.push(block),
                None => break,
            }
            cursor = self.parents.get(current);
        }
        result
    }

    /// Walks ancestors outward from `key` and returns the first match.
    pub fn closest_ancestor(
        &self,
        key: &NodeKey,
        predicate: impl Fn(&Block) -> bool,
    ) -> Option<&Block> {
        self.ancestors(key).into_iter().find(|block| predicate(*block))
    }

    /// Every node below the root in document (pre-)order.
    pub fn preorder(&self) -> Vec<&Node> {
        let mut out = Vec::with_capacity(self.parents.len());
        for node in &self.nodes {
            push_preorder(node, &mut out);
        }
        out
    }

    /// Text leaves in document order.
    pub fn texts(&self) -> Vec<&Text> {
        self.preorder()
            .into_iter()
            .filter_map(Node::as_text)
            .collect()
    }

    /// Lowest block covering `key`: the block itself when it is a leaf, the
    /// parent block for text leaves, `None` for containers and the root.
    pub fn leaf_block_of(&self, key: &NodeKey) -> Option<&Block> {
        match self.get_node(key)? {
            Node::Block(block) if block.is_leaf() => Some(block),
            Node::Block(_) => None,
            Node::Text(_) => match self.get_parent(key)? {
                Parent::Block(block) => Some(block),
                Parent::Root => None,
            },
        }
    }

    /// Inserts `node` as child `index` of `parent` (the root key is allowed).
    pub fn insert_node(
        &self,
        parent: &NodeKey,
        index: usize,
        node: impl Into<Node>,
    ) -> DocumentResult<Self> {
        let node = Arc::new(node.into());
        let path = self.container_path(parent)?;
        let nodes = edit_children(&self.nodes, &path, |children| {
            if index > children.len() {
                return Err(DocumentError::IndexOutOfBounds {
                    parent: parent.clone(),
                    index,
                    len: children.len(),
                });
            }
            children.insert(index, node);
            Ok(())
        })?;
        self.rebuilt(nodes)
    }

    /// Removes `key` and its whole subtree.
    pub fn remove_node(&self, key: &NodeKey) -> DocumentResult<Self> {
        let (parent_path, index) = self.split_path(key)?;
        let nodes = edit_children(&self.nodes, &parent_path, |children| {
            children.remove(index);
            Ok(())
        })?;
        self.rebuilt(nodes)
    }

    /// Changes the type of block `key`, keeping its key, data and children.
    pub fn replace_type(&self, key: &NodeKey, kind: BlockType) -> DocumentResult<Self> {
        self.update_block(key, |block| block.kind = kind)
    }

    /// Applies `edit` to a copy of block `key` and publishes it in place.
    pub fn update_block(
        &self,
        key: &NodeKey,
        edit: impl FnOnce(&mut Block),
    ) -> DocumentResult<Self> {
        let (parent_path, index) = self.split_path(key)?;
        let nodes = edit_children(&self.nodes, &parent_path, |children| {
            let Node::Block(block) = children[index].as_ref() else {
                return Err(DocumentError::NotABlock(key.clone()));
            };
            let mut block = block.clone();
            edit(&mut block);
            children[index] = Arc::new(Node::Block(block));
            Ok(())
        })?;
        self.rebuilt(nodes)
    }

    /// Applies `edit` to every text leaf named in `keys` in one pass.
    ///
    /// Unknown keys are ignored; subtrees with no targeted leaf stay shared.
    pub fn update_texts(
        &self,
        keys: &BTreeSet<NodeKey>,
        edit: impl Fn(&mut Text),
    ) -> DocumentResult<Self> {
        let nodes = self
            .nodes
            .iter()
            .map(|node| map_texts(node, keys, &edit))
            .collect();
        self.rebuilt(nodes)
    }

    /// Wraps the designated siblings in a new block of `wrapper`.
    ///
    /// The wrapper takes the position of the first designated node and
    /// receives the designated nodes in their original relative order.
    pub fn wrap_nodes(&self, keys: &[NodeKey], wrapper: BlockType) -> DocumentResult<Self> {
        self.wrap_nodes_in(keys, Block::new(wrapper))
    }

    /// Same as [`Document::wrap_nodes`] with a caller-built (empty) wrapper.
    pub fn wrap_nodes_in(&self, keys: &[NodeKey], wrapper: Block) -> DocumentResult<Self> {
        let first = keys.first().ok_or(DocumentError::NoTargets)?;
        if wrapper.is_void() {
            return Err(DocumentError::VoidParent(wrapper.key));
        }
        let (parent_path, _) = self.split_path(first)?;
        let parent_key = self.parents.get(first).cloned();

        let mut indices = Vec::with_capacity(keys.len());
        for key in keys {
            if self.parents.get(key).cloned() != parent_key {
                return Err(DocumentError::NotSiblings);
            }
            let (_, index) = self.split_path(key)?;
            if !indices.contains(&index) {
                indices.push(index);
            }
        }
        indices.sort_unstable();

        let nodes = edit_children(&self.nodes, &parent_path, move |children| {
            let mut wrapper = wrapper;
            for index in &indices {
                wrapper.nodes.push(Arc::clone(&children[*index]));
            }
            for index in indices.iter().rev() {
                children.remove(*index);
            }
            children.insert(indices[0], Arc::new(Node::Block(wrapper)));
            Ok(())
        })?;
        self.rebuilt(nodes)
    }

    /// Dissolves the closest `wrapper` ancestor of each designated node.
    ///
    /// The wrapper's children are spliced into the wrapper's own position.
    /// Nodes without such an ancestor are skipped.
    pub fn unwrap_nodes(&self, keys: &[NodeKey], wrapper: &BlockType) -> DocumentResult<Self> {
        let mut wrappers: Vec<NodeKey> = Vec::new();
        for key in keys {
            if !self.contains(key) {
                return Err(DocumentError::NodeNotFound(key.clone()));
            }
            if let Some(found) = self.closest_ancestor(key, |block| &block.kind == wrapper) {
                if !wrappers.contains(&found.key) {
                    wrappers.push(found.key.clone());
                }
            }
        }

        let mut current = self.clone();
        for wrapper_key in wrappers {
            if !current.contains(&wrapper_key) {
                continue;
            }
            let (parent_path, index) = current.split_path(&wrapper_key)?;
            let nodes = edit_children(&current.nodes, &parent_path, |children| {
                let spliced = children.remove(index);
                for (offset, child) in spliced.children().iter().enumerate() {
                    children.insert(index + offset, Arc::clone(child));
                }
                Ok(())
            })?;
            current = current.rebuilt(nodes)?;
        }
        Ok(current)
    }

    fn container_path(&self, key: &NodeKey) -> DocumentResult<Vec<usize>> {
        let path = self
            .path_of(key)
            .ok_or_else(|| DocumentError::NodeNotFound(key.clone()))?;
        if path.is_empty() {
            return Ok(path);
        }
        match self.node_at(&path) {
            Some(Node::Block(block)) if block.is_void() => {
                Err(DocumentError::VoidParent(key.clone()))
            }
            Some(Node::Block(_)) => Ok(path),
            Some(Node::Text(_)) => Err(DocumentError::NotAContainer(key.clone())),
            None => Err(DocumentError::NodeNotFound(key.clone())),
        }
    }

    fn split_path(&self, key: &NodeKey) -> DocumentResult<(Vec<usize>, usize)> {
        let mut path = self
            .path_of(key)
            .ok_or_else(|| DocumentError::NodeNotFound(key.clone()))?;
        let index = path.pop().ok_or(DocumentError::RootTarget)?;
        Ok((path, index))
    }
}

fn index_subtree(
    parent: &NodeKey,
    node: &Arc<Node>,
    parents: &mut HashMap<NodeKey, NodeKey>,
) -> DocumentResult<()> {
    let key = node.key();
    if parents.insert(key.clone(), parent.clone()).is_some() {
        return Err(DocumentError::DuplicateKey(key.clone()));
    }
    if let Node::Block(block) = node.as_ref() {
        if block.is_void() && !block.nodes.is_empty() {
            return Err(DocumentError::NonEmptyVoid(key.clone()));
        }
        for child in &block.nodes {
            index_subtree(key, child, parents)?;
        }
    }
    Ok(())
}

fn push_preorder<'a>(node: &'a Arc<Node>, out: &mut Vec<&'a Node>) {
    out.push(node.as_ref());
    for child in node.children() {
        push_preorder(child, out);
    }
}

/// Copies the child list at `path` (and every list above it), lets `edit`
/// change it, and relinks the copies up to the root.
fn edit_children<F>(
    nodes: &[Arc<Node>],
    path: &[usize],
    edit: F,
) -> DocumentResult<Vec<Arc<Node>>>
where
    F: FnOnce(&mut Vec<Arc<Node>>) -> DocumentResult<()>,
{
    let mut copy = nodes.to_vec();
    match path.split_first() {
        None => edit(&mut copy)?,
        Some((index, rest)) => {
            let child = copy.get(*index).ok_or(DocumentError::InvalidPath)?;
            let Node::Block(block) = child.as_ref() else {
                return Err(DocumentError::NotAContainer(child.key().clone()));
            };
            let mut block = block.clone();
            block.nodes = edit_children(&block.nodes, rest, edit)?;
            copy[*index] = Arc::new(Node::Block(block));
        }
    }
    Ok(copy)
}

fn map_texts(
    node: &Arc<Node>,
    keys: &BTreeSet<NodeKey>,
    edit: &impl Fn(&mut Text),
) -> Arc<Node> {
    match node.as_ref() {
        Node::Text(text) if keys.contains(&text.key) => {
            let mut text = text.clone();
            edit(&mut text);
            Arc::new(Node::Text(text))
        }
        Node::Text(_) => Arc::clone(node),
        Node::Block(block) => {
            let children: Vec<Arc<Node>> = block
                .nodes
                .iter()
                .map(|child| map_texts(child, keys, edit))
                .collect();
            let unchanged = children
                .iter()
                .zip(&block.nodes)
                .all(|(new, old)| Arc::ptr_eq(new, old));
            if unchanged {
                return Arc::clone(node);
            }
            let mut block = block.clone();
            block.nodes = children;
            Arc::new(Node::Block(block))
        }
    }
}
