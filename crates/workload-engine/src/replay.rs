//! Replay of user-supplied query templates.
//!
//! A template names a namespace, a driver operation and its parts:
//!
//! ```json
//! {"database": "airline", "collection": "flights", "operation": "find",
//!  "filter": {"gate": "<gate>"}, "projection": {"gate": 1}, "limit": 5}
//! ```
//!
//! String values of the form `<token>` are placeholders: a known type token
//! generates a value of that type, otherwise the provider registry is asked,
//! otherwise the literal is kept and a warning logged.

use crate::handlers::OperationHandler;
use crate::ratio::WorkloadRatios;
use crate::store::{StoreError, WorkloadStore};
use crate::target::CollectionTarget;
use crate::worker::{OperationPicker, StopCondition};
use bson::{Bson, Document};
use mongodb_types::BsonValue;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::RngCore;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, warn};
use workload_generator::{generate_for_type, ProviderRegistry};
use workload_types::{FieldType, Namespace, OperationKind};

/// Why a template could not be executed.
#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("missing database, collection or operation")]
    MissingTarget,

    #[error("missing '{part}' for operation '{operation}'")]
    MissingPart {
        operation: String,
        part: &'static str,
    },

    #[error("'{0}' must be a document")]
    NotDocument(&'static str),

    #[error("unsupported operation '{0}'")]
    Unsupported(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// One query template as loaded from a queries file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryTemplate {
    pub database: Option<String>,
    pub collection: Option<String>,
    pub operation: Option<String>,
    pub filter: Option<Bson>,
    pub update: Option<Bson>,
    pub document: Option<Bson>,
    pub projection: Option<Bson>,
    pub pipeline: Option<Bson>,
    pub limit: Option<Bson>,
}

impl QueryTemplate {
    pub fn from_document(doc: &Document) -> Self {
        let text = |key: &str| doc.get_str(key).ok().map(str::to_string);
        Self {
            database: text("database"),
            collection: text("collection"),
            operation: text("operation"),
            filter: doc.get("filter").cloned(),
            update: doc.get("update").cloned(),
            document: doc.get("document").cloned(),
            projection: doc.get("projection").cloned(),
            pipeline: doc.get("pipeline").cloned(),
            limit: doc.get("limit").cloned(),
        }
    }

    /// Bucket this template's operation belongs to.
    pub fn bucket(&self) -> Option<OperationKind> {
        match self.operation.as_deref()? {
            "find" | "aggregate" => Some(OperationKind::Select),
            "updateOne" | "updateMany" => Some(OperationKind::Update),
            "deleteOne" | "deleteMany" => Some(OperationKind::Delete),
            "insertOne" => Some(OperationKind::Insert),
            _ => None,
        }
    }

    pub fn namespace(&self) -> Option<Namespace> {
        match (&self.database, &self.collection) {
            (Some(db), Some(coll)) if !db.is_empty() && !coll.is_empty() => {
                Some(Namespace::new(db, coll))
            }
            _ => None,
        }
    }
}

/// Text inside `<...>`, if `value` is a placeholder.
pub fn placeholder_token(value: &str) -> Option<&str> {
    value
        .strip_prefix('<')?
        .strip_suffix('>')
        .filter(|token| !token.is_empty())
}

/// Resolves `<token>` placeholders in BSON trees.
#[derive(Debug, Clone)]
pub struct PlaceholderResolver {
    registry: Arc<ProviderRegistry>,
}

impl PlaceholderResolver {
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self { registry }
    }

    /// A copy of `value` with every placeholder resolved.
    pub fn resolve(&self, value: &Bson, rng: &mut dyn RngCore) -> Bson {
        match value {
            Bson::String(s) => match placeholder_token(s) {
                Some(token) => self.resolve_token(token, rng),
                None => value.clone(),
            },
            Bson::Document(doc) => Bson::Document(self.resolve_document(doc, rng)),
            Bson::Array(items) => Bson::Array(items.iter().map(|v| self.resolve(v, rng)).collect()),
            other => other.clone(),
        }
    }

    pub fn resolve_document(&self, doc: &Document, rng: &mut dyn RngCore) -> Document {
        doc.iter()
            .map(|(k, v)| (k.clone(), self.resolve(v, rng)))
            .collect()
    }

    fn resolve_token(&self, token: &str, rng: &mut dyn RngCore) -> Bson {
        if let Some(field_type) = FieldType::from_token(token) {
            return BsonValue::from(generate_for_type(&field_type, rng)).into_inner();
        }
        match self.registry.generate(token, rng, None) {
            Ok(value) => BsonValue::from(value).into_inner(),
            Err(_) => {
                warn!("Unknown type or provider '{token}'. Keeping placeholder.");
                Bson::String(format!("<{token}>"))
            }
        }
    }
}

/// Counts produced by one replayed template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayOutcome {
    pub kind: OperationKind,
    pub ops: u64,
    pub docs: u64,
}

fn resolved_document(
    resolver: &PlaceholderResolver,
    value: Option<&Bson>,
    part: &'static str,
    rng: &mut dyn RngCore,
) -> Result<Option<Document>, ReplayError> {
    match value.map(|v| resolver.resolve(v, rng)) {
        None => Ok(None),
        Some(Bson::Document(doc)) => Ok(Some(doc)),
        Some(_) => Err(ReplayError::NotDocument(part)),
    }
}

fn required(
    doc: Option<Document>,
    operation: &str,
    part: &'static str,
) -> Result<Document, ReplayError> {
    doc.ok_or_else(|| ReplayError::MissingPart {
        operation: operation.to_string(),
        part,
    })
}

/// A positive whole-number `limit`; anything else runs the find unlimited.
fn limit_value(value: &Bson) -> Option<i64> {
    let limit = match value {
        Bson::Int32(v) => Some(i64::from(*v)),
        Bson::Int64(v) => Some(*v),
        Bson::Double(v) if v.fract() == 0.0 && v.abs() < i64::MAX as f64 => Some(*v as i64),
        _ => None,
    };
    match limit {
        Some(limit) if limit > 0 => Some(limit),
        _ => {
            debug!("Ignoring query limit {value}");
            None
        }
    }
}

/// Resolve placeholders in `template` and run it.
pub async fn execute_template<S: WorkloadStore + ?Sized>(
    store: &S,
    resolver: &PlaceholderResolver,
    template: &QueryTemplate,
    rng: &mut StdRng,
) -> Result<ReplayOutcome, ReplayError> {
    let (Some(ns), Some(operation)) = (template.namespace(), template.operation.as_deref()) else {
        return Err(ReplayError::MissingTarget);
    };

    let filter = resolved_document(resolver, template.filter.as_ref(), "filter", rng)?;
    let update = resolved_document(resolver, template.update.as_ref(), "update", rng)?;
    let document = resolved_document(resolver, template.document.as_ref(), "document", rng)?;
    let projection = resolved_document(resolver, template.projection.as_ref(), "projection", rng)?;
    let limit = template
        .limit
        .as_ref()
        .map(|v| resolver.resolve(v, rng))
        .as_ref()
        .and_then(limit_value);

    debug!("Running user query {operation} on {ns}: filter={filter:?} update={update:?}");

    let (kind, docs) = match operation {
        "find" => {
            let docs = store
                .find(&ns, filter.unwrap_or_default(), projection, limit)
                .await?;
            (OperationKind::Select, docs)
        }
        "aggregate" => {
            let pipeline = match template.pipeline.as_ref().map(|v| resolver.resolve(v, rng)) {
                Some(Bson::Array(stages)) => stages
                    .into_iter()
                    .map(|stage| match stage {
                        Bson::Document(doc) => Ok(doc),
                        _ => Err(ReplayError::NotDocument("pipeline stage")),
                    })
                    .collect::<Result<Vec<_>, _>>()?,
                Some(_) => return Err(ReplayError::NotDocument("pipeline")),
                None => {
                    return Err(ReplayError::MissingPart {
                        operation: operation.to_string(),
                        part: "pipeline",
                    })
                }
            };
            (OperationKind::Select, store.aggregate(&ns, pipeline).await?)
        }
        "insertOne" => {
            let document = required(document, operation, "document")?;
            let id = store.insert_one(&ns, document).await?;
            let docs = u64::from(!matches!(id, Bson::Null));
            (OperationKind::Insert, docs)
        }
        "updateOne" | "updateMany" => {
            let filter = required(filter, operation, "filter")?;
            let update = required(update, operation, "update")?;
            let outcome = store
                .update(&ns, filter, update, operation == "updateMany")
                .await?;
            (OperationKind::Update, outcome.modified)
        }
        "deleteOne" | "deleteMany" => {
            let filter = required(filter, operation, "filter")?;
            let deleted = store
                .delete(&ns, filter, operation == "deleteMany")
                .await?;
            (OperationKind::Delete, deleted)
        }
        other => return Err(ReplayError::Unsupported(other.to_string())),
    };

    Ok(ReplayOutcome { kind, ops: 1, docs })
}

/// Templates grouped by the operation kind they count as.
#[derive(Debug, Clone, Default)]
pub struct TemplateBuckets {
    select: Vec<Arc<QueryTemplate>>,
    update: Vec<Arc<QueryTemplate>>,
    delete: Vec<Arc<QueryTemplate>>,
    insert: Vec<Arc<QueryTemplate>>,
}

impl TemplateBuckets {
    pub fn new(templates: impl IntoIterator<Item = QueryTemplate>) -> Self {
        let mut buckets = Self::default();
        for template in templates {
            match template.bucket() {
                Some(OperationKind::Select) => buckets.select.push(Arc::new(template)),
                Some(OperationKind::Update) => buckets.update.push(Arc::new(template)),
                Some(OperationKind::Delete) => buckets.delete.push(Arc::new(template)),
                Some(OperationKind::Insert) => buckets.insert.push(Arc::new(template)),
                None => warn!(
                    "Skipping query with unsupported operation '{}'",
                    template.operation.as_deref().unwrap_or("")
                ),
            }
        }
        buckets
    }

    pub fn get(&self, kind: OperationKind) -> &[Arc<QueryTemplate>] {
        match kind {
            OperationKind::Select => &self.select,
            OperationKind::Update => &self.update,
            OperationKind::Delete => &self.delete,
            OperationKind::Insert => &self.insert,
        }
    }

    pub fn len(&self) -> usize {
        self.select.len() + self.update.len() + self.delete.len() + self.insert.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Weights for kinds that have a positive ratio and something to run.
    ///
    /// Inserts can always fall back to random generation when collections
    /// exist.
    pub fn weights(&self, ratios: &WorkloadRatios, has_targets: bool) -> Vec<(OperationKind, f64)> {
        ratios
            .weighted_kinds()
            .into_iter()
            .filter(|(kind, _)| {
                !self.get(*kind).is_empty() || (*kind == OperationKind::Insert && has_targets)
            })
            .collect()
    }
}

/// Templates and the resolver shared by every custom worker of a run.
#[derive(Debug, Clone)]
pub struct QueryReplay {
    pub resolver: PlaceholderResolver,
    pub buckets: TemplateBuckets,
}

impl QueryReplay {
    pub fn new(registry: Arc<ProviderRegistry>, templates: Vec<QueryTemplate>) -> Self {
        Self {
            resolver: PlaceholderResolver::new(registry),
            buckets: TemplateBuckets::new(templates),
        }
    }
}

/// Replay templates until the stop condition fires.
///
/// Inserts without an `insertOne` template use the random insert handler.
/// Returns the number of operations dispatched.
pub async fn run_custom_worker<S: WorkloadStore>(
    worker_id: usize,
    handler: Arc<OperationHandler<S>>,
    replay: Arc<QueryReplay>,
    targets: Arc<Vec<CollectionTarget>>,
    ratios: WorkloadRatios,
    stop: StopCondition,
    mut rng: StdRng,
) -> u64 {
    let buckets = &replay.buckets;
    let weights = buckets.weights(&ratios, !targets.is_empty());
    let Some(picker) = OperationPicker::from_weights(weights) else {
        warn!("No operations available for the given ratios and user query file. Worker {worker_id} is idle.");
        return 0;
    };
    debug!("Custom worker {worker_id} started. Operations enabled: {:?}", picker.kinds());

    let state = Arc::clone(handler.state());
    let mut dispatched = 0u64;
    while !stop.should_stop() {
        let kind = picker.pick(&mut rng);
        dispatched += 1;

        let Some(template) = buckets.get(kind).choose(&mut rng).cloned() else {
            if let Some(target) = targets.choose(&mut rng) {
                handler.insert(target, &mut rng).await;
            }
            tokio::task::yield_now().await;
            continue;
        };

        match execute_template(handler.store().as_ref(), &replay.resolver, &template, &mut rng).await {
            Ok(outcome) => state.record(outcome.kind, outcome.docs),
            Err(ReplayError::Store(e)) => {
                let ns = template.namespace().map(|ns| ns.to_string()).unwrap_or_default();
                error!("MongoDB error on {ns} with query {:?}: {e}", template.operation);
                state.record(kind, 0);
            }
            Err(e) => warn!("Skipping invalid query {:?}: {e}", template.operation),
        }
        tokio::task::yield_now().await;
    }

    dispatched
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use rand::SeedableRng;

    fn resolver() -> PlaceholderResolver {
        PlaceholderResolver::new(Arc::new(ProviderRegistry::builtin()))
    }

    #[test]
    fn test_limit_value_keeps_positive_whole_numbers() {
        assert_eq!(limit_value(&Bson::Int32(5)), Some(5));
        assert_eq!(limit_value(&Bson::Int64(20)), Some(20));
        assert_eq!(limit_value(&Bson::Double(3.0)), Some(3));
        assert_eq!(limit_value(&Bson::Int32(0)), None);
        assert_eq!(limit_value(&Bson::Int64(-2)), None);
        assert_eq!(limit_value(&Bson::Double(2.5)), None);
        assert_eq!(limit_value(&Bson::Double(f64::NAN)), None);
        assert_eq!(limit_value(&Bson::String("5".into())), None);
    }

    #[test]
    fn test_placeholder_token() {
        assert_eq!(placeholder_token("<int>"), Some("int"));
        assert_eq!(placeholder_token("<>"), None);
        assert_eq!(placeholder_token("int"), None);
        assert_eq!(placeholder_token("<int"), None);
    }

    #[test]
    fn test_resolve_types_providers_and_unknown() {
        let mut rng = StdRng::seed_from_u64(42);
        let template = doc! {
            "n": "<int>",
            "nested": { "gate": "<gate>", "list": ["<bool>", "plain"] },
            "odd": "<no_such_thing>",
        };
        let resolved = resolver().resolve_document(&template, &mut rng);

        assert!(matches!(resolved.get("n"), Some(Bson::Int32(_))));
        let nested = resolved.get_document("nested").unwrap();
        let gate = nested.get_str("gate").unwrap();
        assert!(!gate.starts_with('<'));
        let list = nested.get_array("list").unwrap();
        assert!(matches!(list[0], Bson::Boolean(_)));
        assert_eq!(list[1], Bson::String("plain".into()));
        assert_eq!(resolved.get_str("odd").unwrap(), "<no_such_thing>");

        // the template itself is untouched
        assert_eq!(template.get_str("n").unwrap(), "<int>");
    }

    #[test]
    fn test_buckets_and_weights() {
        let templates = [
            doc! { "database": "a", "collection": "b", "operation": "find" },
            doc! { "database": "a", "collection": "b", "operation": "aggregate", "pipeline": [] },
            doc! { "database": "a", "collection": "b", "operation": "updateMany" },
            doc! { "database": "a", "collection": "b", "operation": "drop" },
        ]
        .iter()
        .map(QueryTemplate::from_document)
        .collect::<Vec<_>>();

        let buckets = TemplateBuckets::new(templates);
        assert_eq!(buckets.get(OperationKind::Select).len(), 2);
        assert_eq!(buckets.get(OperationKind::Update).len(), 1);
        assert_eq!(buckets.len(), 3);

        let kinds: Vec<OperationKind> = buckets
            .weights(&WorkloadRatios::default(), true)
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(
            kinds,
            [OperationKind::Insert, OperationKind::Update, OperationKind::Select]
        );

        let without_targets: Vec<OperationKind> = buckets
            .weights(&WorkloadRatios::default(), false)
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert!(!without_targets.contains(&OperationKind::Insert));
    }

    #[test]
    fn test_namespace_requires_both_names() {
        let template = QueryTemplate::from_document(&doc! { "database": "a", "operation": "find" });
        assert!(template.namespace().is_none());
        assert_eq!(template.bucket(), Some(OperationKind::Select));
    }
}
