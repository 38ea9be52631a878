//! Typed query specifications.
//!
//! The planner and the replayer talk about queries in these terms; they are
//! converted to BSON documents only at the store boundary.

use crate::values::GeneratedValue;

/// Characters with a meaning in MongoDB (PCRE) regular expressions.
const REGEX_META: &[char] = &[
    '\\', '^', '$', '.', '|', '?', '*', '+', '(', ')', '[', ']', '{', '}', '-', '/',
];

/// One predicate on one field.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `{field: value}`
    Eq(GeneratedValue),
    /// `{field: {$gt: value}}`
    Gt(GeneratedValue),
    /// `{field: {$lt: value}}`
    Lt(GeneratedValue),
    /// `{field: {$gte: gte, $lte: lte}}`
    Range {
        gte: GeneratedValue,
        lte: GeneratedValue,
    },
    /// `{field: {$regex: pattern}}`
    Regex(String),
    /// `{field: {$in: [...]}}`
    In(Vec<GeneratedValue>),
    /// `{field: {$exists: bool}}`
    Exists(bool),
}

impl Predicate {
    /// Anchored prefix match on the literal `prefix`.
    pub fn prefix(prefix: &str) -> Self {
        Self::Regex(format!("^{}", escape_regex(prefix)))
    }

    /// Whether this predicate pins the field to one value.
    pub fn is_equality(&self) -> bool {
        matches!(self, Self::Eq(_))
    }
}

/// Escape regex metacharacters so `text` matches literally.
pub fn escape_regex(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if REGEX_META.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Conjunction of field predicates; an empty filter matches every document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<(String, Predicate)>,
}

impl Filter {
    /// Filter matching every document.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Equality on the primary key only.
    pub fn key_only(key: impl Into<String>, value: GeneratedValue) -> Self {
        Self::empty().with(key, Predicate::Eq(value))
    }

    /// Add a clause, returning the extended filter.
    pub fn with(mut self, field: impl Into<String>, predicate: Predicate) -> Self {
        self.clauses.push((field.into(), predicate));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Clauses in insertion order.
    pub fn clauses(&self) -> &[(String, Predicate)] {
        &self.clauses
    }

    /// Fields referenced by this filter.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.clauses.iter().map(|(f, _)| f.as_str())
    }

    /// Whether `field` appears in any clause.
    pub fn contains_field(&self, field: &str) -> bool {
        self.fields().any(|f| f == field)
    }

    /// Whether the filter pins `key` with an equality predicate.
    pub fn is_key_anchored(&self, key: &str) -> bool {
        self.clauses
            .iter()
            .any(|(f, p)| f == key && p.is_equality())
    }

    /// Equality value for `field`, if the filter has one.
    pub fn equality_value(&self, field: &str) -> Option<&GeneratedValue> {
        self.clauses.iter().find_map(|(f, p)| match p {
            Predicate::Eq(v) if f == field => Some(v),
            _ => None,
        })
    }
}

/// One update operator applied to one field.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOp {
    /// `{$set: {field: value}}`
    Set { field: String, value: GeneratedValue },
    /// `{$inc: {field: delta}}`
    Inc { field: String, delta: GeneratedValue },
    /// `{$push: {field: value}}`
    Push { field: String, value: GeneratedValue },
}

impl UpdateOp {
    /// The field modified by this operator.
    pub fn field(&self) -> &str {
        match self {
            Self::Set { field, .. } | Self::Inc { field, .. } | Self::Push { field, .. } => field,
        }
    }

    /// MongoDB operator name.
    pub fn operator(&self) -> &'static str {
        match self {
            Self::Set { .. } => "$set",
            Self::Inc { .. } => "$inc",
            Self::Push { .. } => "$push",
        }
    }
}

/// Inclusion projection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Projection {
    fields: Vec<String>,
}

impl Projection {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut projection = Self::default();
        for field in fields {
            let field = field.into();
            if !projection.fields.contains(&field) {
                projection.fields.push(field);
            }
        }
        projection
    }

    /// Projection of the key and one other field.
    pub fn key_and(key: &str, field: &str) -> Self {
        Self::new([key, field])
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_anchoring_requires_equality() {
        let anchored = Filter::key_only("id", 5.into()).with("n", Predicate::Gt(1.into()));
        assert!(anchored.is_key_anchored("id"));

        let exists = Filter::empty().with("id", Predicate::Exists(true));
        assert!(exists.contains_field("id"));
        assert!(!exists.is_key_anchored("id"));

        assert!(!Filter::empty().is_key_anchored("id"));
    }

    #[test]
    fn test_equality_value() {
        let filter = Filter::key_only("id", 7.into());
        assert_eq!(filter.equality_value("id"), Some(&GeneratedValue::Int32(7)));
        assert_eq!(filter.equality_value("other"), None);
    }

    #[test]
    fn test_prefix_escapes_metacharacters() {
        assert_eq!(
            Predicate::prefix("a.b(c"),
            Predicate::Regex("^a\\.b\\(c".to_string())
        );
        assert_eq!(escape_regex("plain"), "plain");
    }

    #[test]
    fn test_projection_dedups_fields() {
        let projection = Projection::key_and("_id", "_id");
        assert_eq!(projection.fields(), ["_id".to_string()]);
        assert_eq!(Projection::key_and("id", "gate").fields().len(), 2);
    }

    #[test]
    fn test_update_op_field() {
        let op = UpdateOp::Inc {
            field: "count".into(),
            delta: 3.into(),
        };
        assert_eq!(op.field(), "count");
        assert_eq!(op.operator(), "$inc");
    }
}
