//! Operation classes and query modes.

use std::fmt;

/// The four operation classes the workload mixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OperationKind {
    Insert,
    Update,
    Delete,
    Select,
}

impl OperationKind {
    /// All kinds in ratio order.
    pub const ALL: [OperationKind; 4] = [Self::Insert, Self::Update, Self::Delete, Self::Select];

    /// Position of this kind in ratio and counter arrays.
    pub fn index(self) -> usize {
        match self {
            Self::Insert => 0,
            Self::Update => 1,
            Self::Delete => 2,
            Self::Select => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Select => "select",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether queries should be routed by key or broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryMode {
    /// Filters anchor the primary key with equality.
    #[default]
    Optimized,
    /// Filters omit the key and fan out to every shard.
    Ineffective,
}

impl QueryMode {
    pub fn from_optimized(optimized: bool) -> Self {
        if optimized {
            Self::Optimized
        } else {
            Self::Ineffective
        }
    }

    pub fn is_optimized(self) -> bool {
        self == Self::Optimized
    }
}

impl fmt::Display for QueryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Optimized => f.write_str("optimized"),
            Self::Ineffective => f.write_str("ineffective"),
        }
    }
}
