//! Shard-safety guard.
//!
//! Decides whether a planned operation may run against a sharded
//! collection. A veto is a silent skip, not an error.

use workload_types::{Filter, OperationKind, QueryMode, UpdateOp};

/// Sharding facts for one namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShardMetadata {
    pub is_sharded: bool,
    pub shard_key_fields: Vec<String>,
}

impl ShardMetadata {
    pub fn unsharded() -> Self {
        Self::default()
    }

    pub fn sharded<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            is_sharded: true,
            shard_key_fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Shard key fields the filter does not reference.
    pub fn missing_from(&self, filter: &Filter) -> Vec<String> {
        self.shard_key_fields
            .iter()
            .filter(|f| !filter.contains_field(f))
            .cloned()
            .collect()
    }
}

/// Outcome of a guard check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Skip { missing: Vec<String> },
}

impl GuardDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    fn from_missing(missing: Vec<String>) -> Self {
        if missing.is_empty() {
            Self::Allow
        } else {
            Self::Skip { missing }
        }
    }
}

/// Whether any update operator targets a shard key field.
pub fn modifies_shard_key(ops: &[UpdateOp], meta: &ShardMetadata) -> bool {
    ops.iter()
        .any(|op| meta.shard_key_fields.iter().any(|k| k == op.field()))
}

/// Check one planned operation against the shard metadata.
///
/// Inserts always pass. Selects in optimized mode must reference every shard
/// key field. Updates that modify a shard key must reference every shard key
/// field. Single-document deletes (optimized mode) must reference every
/// shard key field; multi-document deletes always pass.
pub fn assess(
    kind: OperationKind,
    mode: QueryMode,
    filter: &Filter,
    ops: &[UpdateOp],
    meta: &ShardMetadata,
) -> GuardDecision {
    if !meta.is_sharded || meta.shard_key_fields.is_empty() {
        return GuardDecision::Allow;
    }

    match kind {
        OperationKind::Insert => GuardDecision::Allow,
        OperationKind::Select if mode.is_optimized() => {
            GuardDecision::from_missing(meta.missing_from(filter))
        }
        OperationKind::Select => GuardDecision::Allow,
        OperationKind::Update if modifies_shard_key(ops, meta) => {
            GuardDecision::from_missing(meta.missing_from(filter))
        }
        OperationKind::Update => GuardDecision::Allow,
        OperationKind::Delete if mode.is_optimized() => {
            GuardDecision::from_missing(meta.missing_from(filter))
        }
        OperationKind::Delete => GuardDecision::Allow,
    }
}
