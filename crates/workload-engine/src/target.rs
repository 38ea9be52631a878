//! Concrete collections a workload runs against.

use std::sync::Arc;
use workload_generator::DocumentGenerator;
use workload_types::{CollectionDefinition, Namespace};

/// One created collection instance and the definition it was built from.
#[derive(Debug, Clone)]
pub struct CollectionTarget {
    pub namespace: Namespace,
    pub definition: Arc<CollectionDefinition>,
    pub primary_key: String,
    /// Whether inserted documents need a generation context.
    pub needs_context: bool,
}

impl CollectionTarget {
    pub fn new(
        namespace: Namespace,
        definition: Arc<CollectionDefinition>,
        generator: &DocumentGenerator,
    ) -> Self {
        let primary_key = definition.primary_key().to_string();
        let needs_context = generator.requires_context(&definition.fields);
        Self {
            namespace,
            definition,
            primary_key,
            needs_context,
        }
    }

    /// Every instance of every definition, `instances` per definition.
    pub fn expand(
        definitions: &[Arc<CollectionDefinition>],
        instances: usize,
        generator: &DocumentGenerator,
    ) -> Vec<Self> {
        definitions
            .iter()
            .flat_map(|def| {
                def.instance_names(instances)
                    .into_iter()
                    .map(move |name| (Arc::clone(def), name))
            })
            .map(|(def, name)| {
                let namespace = Namespace::new(&def.database_name, name);
                Self::new(namespace, def, generator)
            })
            .collect()
    }
}
