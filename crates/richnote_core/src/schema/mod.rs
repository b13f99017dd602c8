//! Declarative schema and fixpoint normalizer.
//!
//! # Responsibility
//! - Hold an ordered table of (scope, check, fixup) rules.
//! - Repair violations after every transform until no rule fires.
//!
//! # Invariants
//! - Rules are evaluated bottom-up: every block is checked after its
//!   descendants, and document rules run last.
//! - Normalizing an already-normalized document returns it unchanged.
//! - A violation without a fixup is a schema-authoring defect
//!   (`SchemaError`), never silently ignored.

use crate::model::document::{Document, DocumentError};
use crate::model::node::{Block, BlockType, Node, NodeKey};
use log::{debug, error};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Upper bound on repair passes for one `normalize` call.
pub const MAX_NORMALIZE_PASSES: usize = 64;

/// Machine-readable violation code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationCode {
    /// Document's last child is missing or not of the required type.
    LastChildTypeInvalid { found: Option<BlockType> },
    /// A void block owns children.
    VoidHasChildren,
}

/// One rule violation located at `key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub key: NodeKey,
    pub code: ViolationCode,
}

/// Which node a rule inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleScope {
    Document,
    Block,
}

/// Scope-specific violation predicate.
#[derive(Clone, Copy)]
pub enum RuleCheck {
    Document(fn(&Document) -> Option<Violation>),
    Block(fn(&Block) -> Option<Violation>),
}

/// Repair action producing a new document.
pub type RuleFix = fn(&Document, &Violation) -> Result<Document, DocumentError>;

/// One schema rule. `fix: None` marks a structural rule that must hold by
/// construction.
#[derive(Clone, Copy)]
pub struct SchemaRule {
    pub name: &'static str,
    pub check: RuleCheck,
    pub fix: Option<RuleFix>,
}

impl SchemaRule {
    pub fn scope(&self) -> RuleScope {
        match self.check {
            RuleCheck::Document(_) => RuleScope::Document,
            RuleCheck::Block(_) => RuleScope::Block,
        }
    }
}

impl std::fmt::Debug for SchemaRule {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaRule")
            .field("name", &self.name)
            .field("scope", &self.scope())
            .field("repairable", &self.fix.is_some())
            .finish()
    }
}

/// Normalization failure. Always a defect in the rule table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// Rule fired but has no fixup.
    Unrepairable { rule: &'static str, key: NodeKey },
    /// Fixup itself failed to transform the document.
    RepairFailed {
        rule: &'static str,
        source: DocumentError,
    },
    /// Rules kept firing past the pass limit.
    NoFixpoint { passes: usize },
}

impl Display for SchemaError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unrepairable { rule, key } => {
                write!(f, "schema rule `{rule}` violated at {key} and has no fixup")
            }
            Self::RepairFailed { rule, source } => {
                write!(f, "schema rule `{rule}` fixup failed: {source}")
            }
            Self::NoFixpoint { passes } => {
                write!(f, "normalization did not converge after {passes} passes")
            }
        }
    }
}

impl Error for SchemaError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::RepairFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Ordered rule table plus the generic fixpoint walk.
#[derive(Debug, Clone)]
pub struct Schema {
    rules: Vec<SchemaRule>,
    max_passes: usize,
}

impl Default for Schema {
    fn default() -> Self {
        Self::standard()
    }
}

impl Schema {
    pub fn new(rules: Vec<SchemaRule>) -> Self {
        Self {
            rules,
            max_passes: MAX_NORMALIZE_PASSES,
        }
    }

    /// The editor schema: trailing paragraph + empty void blocks.
    pub fn standard() -> Self {
        Self::new(vec![last_child_paragraph_rule(), void_block_empty_rule()])
    }

    /// Appends one rule; the walk itself is unchanged.
    pub fn with_rule(mut self, rule: SchemaRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes.max(1);
        self
    }

    pub fn rules(&self) -> &[SchemaRule] {
        &self.rules
    }

    /// First violation in bottom-up order, if any.
    pub fn validate(&self, document: &Document) -> Option<(SchemaRule, Violation)> {
        let mut blocks = Vec::new();
        for node in document.nodes() {
            collect_postorder(node, &mut blocks);
        }
        for block in blocks {
            for rule in &self.rules {
                if let RuleCheck::Block(check) = rule.check {
                    if let Some(violation) = check(block) {
                        return Some((*rule, violation));
                    }
                }
            }
        }
        for rule in &self.rules {
            if let RuleCheck::Document(check) = rule.check {
                if let Some(violation) = check(document) {
                    return Some((*rule, violation));
                }
            }
        }
        None
    }

    /// Repairs violations until none remain.
    pub fn normalize(&self, document: &Document) -> Result<Document, SchemaError> {
        let mut current = document.clone();
        for _ in 0..self.max_passes {
            let Some((rule, violation)) = self.validate(&current) else {
                return Ok(current);
            };
            let Some(fix) = rule.fix else {
                error!(
                    "event=schema_normalize module=schema status=error error_code=unrepairable rule={} key={}",
                    rule.name, violation.key
                );
                return Err(SchemaError::Unrepairable {
                    rule: rule.name,
                    key: violation.key,
                });
            };
            debug!(
                "event=schema_repair module=schema status=ok rule={} key={}",
                rule.name, violation.key
            );
            current = fix(&current, &violation).map_err(|source| SchemaError::RepairFailed {
                rule: rule.name,
                source,
            })?;
        }
        error!(
            "event=schema_normalize module=schema status=error error_code=no_fixpoint passes={}",
            self.max_passes
        );
        Err(SchemaError::NoFixpoint {
            passes: self.max_passes,
        })
    }
}

/// Document rule: the last root child must be a paragraph.
pub fn last_child_paragraph_rule() -> SchemaRule {
    SchemaRule {
        name: "document.last_child_paragraph",
        check: RuleCheck::Document(|document| {
            let last = document.last_block().map(|block| block.kind.clone());
            if last == Some(BlockType::Paragraph) {
                return None;
            }
            Some(Violation {
                key: document.key().clone(),
                code: ViolationCode::LastChildTypeInvalid { found: last },
            })
        }),
        fix: Some(|document, _| {
            document.insert_node(
                document.key(),
                document.nodes().len(),
                Block::default_paragraph(),
            )
        }),
    }
}

/// Block rule: void blocks own no children. Holds by construction.
pub fn void_block_empty_rule() -> SchemaRule {
    SchemaRule {
        name: "block.void_empty",
        check: RuleCheck::Block(|block| {
            if block.is_void() && !block.nodes.is_empty() {
                return Some(Violation {
                    key: block.key.clone(),
                    code: ViolationCode::VoidHasChildren,
                });
            }
            None
        }),
        fix: None,
    }
}

fn collect_postorder<'a>(node: &'a Arc<Node>, out: &mut Vec<&'a Block>) {
    if let Node::Block(block) = node.as_ref() {
        for child in &block.nodes {
            collect_postorder(child, out);
        }
        out.push(block);
    }
}
