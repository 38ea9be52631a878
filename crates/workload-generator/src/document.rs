//! Schema-driven document generation.

use crate::context::{is_context_field, GenerationContext};
use crate::generators::generate_for_type;
use crate::providers::ProviderRegistry;
use rand::RngCore;
use std::sync::Arc;
use tracing::warn;
use workload_types::schema::OrderedMap;
use workload_types::{
    CollectionDefinition, FieldDefinition, GeneratedDocument, GeneratedValue, DEFAULT_ID_FIELD,
};

/// Produces documents and field values from a collection definition.
#[derive(Debug, Clone)]
pub struct DocumentGenerator {
    registry: Arc<ProviderRegistry>,
}

impl Default for DocumentGenerator {
    fn default() -> Self {
        Self::new(Arc::new(ProviderRegistry::builtin()))
    }
}

impl DocumentGenerator {
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Whether documents of this schema need a generation context.
    ///
    /// True when any field uses a context-aware provider, or when a context
    /// field is declared without a provider.
    pub fn requires_context(&self, fields: &OrderedMap<FieldDefinition>) -> bool {
        self.fields_require_context(fields.iter())
    }

    /// Whether any of the given fields needs a generation context.
    pub fn fields_require_context<'a>(
        &self,
        fields: impl IntoIterator<Item = (&'a str, &'a FieldDefinition)>,
    ) -> bool {
        fields.into_iter().any(|(name, def)| match &def.provider {
            Some(provider) => self.registry.needs_context(provider),
            None => is_context_field(name),
        })
    }

    /// Generate one document for the schema.
    ///
    /// Provider fields draw from the registry; other fields generate by type.
    /// Context fields declared without a provider are filled from `ctx` after
    /// the main pass so they agree with the provider fields.
    pub fn generate(
        &self,
        fields: &OrderedMap<FieldDefinition>,
        ctx: Option<&GenerationContext>,
        rng: &mut dyn RngCore,
    ) -> GeneratedDocument {
        let mut doc = GeneratedDocument::new();
        let mut deferred = Vec::new();

        for (name, def) in fields.iter() {
            match &def.provider {
                Some(provider) => {
                    let value = match self.registry.generate(provider, rng, ctx) {
                        Ok(value) => value,
                        Err(e) => {
                            warn!("{e} for field '{name}'");
                            GeneratedValue::Null
                        }
                    };
                    doc.insert(name.to_string(), value);
                }
                None if ctx.is_some() && is_context_field(name) => deferred.push(name),
                None => {
                    doc.insert(name.to_string(), generate_for_type(&def.field_type, rng));
                }
            }
        }

        if let Some(ctx) = ctx {
            for name in deferred {
                if let Some(value) = ctx.get(name) {
                    doc.insert(name.to_string(), value);
                }
            }
        }

        doc
    }

    /// Generate a document for insertion, with a fresh context when needed
    /// and the primary key filled by type if no field produced it.
    pub fn generate_for_insert(
        &self,
        def: &CollectionDefinition,
        primary_key: &str,
        needs_context: bool,
        rng: &mut dyn RngCore,
    ) -> GeneratedDocument {
        let ctx = needs_context.then(|| GenerationContext::random(rng));
        let mut doc = self.generate(&def.fields, ctx.as_ref(), rng);

        if primary_key != DEFAULT_ID_FIELD && !doc.contains_key(primary_key) {
            let value = generate_for_type(&def.field_type(primary_key), rng);
            doc.insert(primary_key.to_string(), value);
        }
        doc
    }

    /// Generate a replacement value for one field.
    ///
    /// Unknown providers fall back to a type-generated value.
    pub fn generate_field(
        &self,
        name: &str,
        def: &FieldDefinition,
        ctx: Option<&GenerationContext>,
        rng: &mut dyn RngCore,
    ) -> GeneratedValue {
        match &def.provider {
            Some(provider) => match self.registry.generate(provider, rng, ctx) {
                Ok(value) => value,
                Err(e) => {
                    warn!(
                        "{e} for field '{name}', falling back to type '{}'",
                        def.field_type
                    );
                    generate_for_type(&def.field_type, rng)
                }
            },
            None => generate_for_type(&def.field_type, rng),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use workload_types::FieldType;

    fn flights() -> CollectionDefinition {
        CollectionDefinition::from_json(
            r#"{
            "databaseName": "airline",
            "collectionName": "flights",
            "fieldName": {
                "flight_id": {"type": "int", "provider": "flight_id"},
                "passengers": {"type": "array", "provider": "passengers"},
                "equipment": {"type": "object", "provider": "equip"},
                "total_seats": {"type": "int"},
                "num_passengers": {"type": "int"},
                "seats_available": {"type": "int"},
                "gate": {"type": "string", "provider": "gate"}
            },
            "shardConfig": {"key": {"flight_id": 1}}
        }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_context_fields_agree_with_providers() {
        let generator = DocumentGenerator::default();
        let def = flights();
        assert!(generator.requires_context(&def.fields));

        let mut rng = StdRng::seed_from_u64(21);
        for _ in 0..100 {
            let doc = generator.generate_for_insert(&def, "flight_id", true, &mut rng);

            let total = doc["total_seats"].as_f64().unwrap() as i64;
            let passengers = doc["num_passengers"].as_f64().unwrap() as i64;
            let available = doc["seats_available"].as_f64().unwrap() as i64;
            assert_eq!(available, total - passengers);
            assert_eq!(doc["passengers"].as_array().unwrap().len() as i64, passengers);

            let GeneratedValue::Object(equip) = &doc["equipment"] else {
                panic!("Expected equipment record");
            };
            assert_eq!(equip["total_seats"].as_f64().unwrap() as i64, total);
        }
    }

    #[test]
    fn test_without_context_fields_generate_by_type() {
        let generator = DocumentGenerator::default();
        let def = flights();
        let mut rng = StdRng::seed_from_u64(21);

        let doc = generator.generate(&def.fields, None, &mut rng);
        assert!(matches!(doc["seats_available"], GeneratedValue::Int32(_)));
        assert_eq!(doc.len(), def.fields.len());
    }

    #[test]
    fn test_unknown_provider_yields_null() {
        let generator = DocumentGenerator::default();
        let fields = OrderedMap(vec![(
            "x".to_string(),
            FieldDefinition::with_provider(FieldType::Int, "does_not_exist"),
        )]);
        let mut rng = StdRng::seed_from_u64(1);

        let doc = generator.generate(&fields, None, &mut rng);
        assert!(doc["x"].is_null());

        let value = generator.generate_field("x", &fields.0[0].1, None, &mut rng);
        assert!(matches!(value, GeneratedValue::Int32(_)));
    }

    #[test]
    fn test_requires_context_is_static() {
        let generator = DocumentGenerator::default();
        let plain = OrderedMap(vec![
            ("gate".to_string(), FieldDefinition::with_provider(FieldType::String, "gate")),
            ("count".to_string(), FieldDefinition::typed(FieldType::Int)),
        ]);
        assert!(!generator.requires_context(&plain));

        let context_field = OrderedMap(vec![(
            "seats_available".to_string(),
            FieldDefinition::typed(FieldType::Int),
        )]);
        assert!(generator.requires_context(&context_field));
    }

    #[test]
    fn test_primary_key_filled_when_missing() {
        let generator = DocumentGenerator::default();
        let def = CollectionDefinition::from_json(
            r#"{
            "databaseName": "db",
            "collectionName": "c",
            "fieldName": {"name": {"type": "string"}}
        }"#,
        )
        .unwrap();
        let mut rng = StdRng::seed_from_u64(1);

        let doc = generator.generate_for_insert(&def, "code", false, &mut rng);
        assert!(matches!(doc["code"], GeneratedValue::String(_)));

        let doc = generator.generate_for_insert(&def, DEFAULT_ID_FIELD, false, &mut rng);
        assert!(!doc.contains_key(DEFAULT_ID_FIELD));
    }
}
