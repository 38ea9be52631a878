//! Named value providers.
//!
//! A collection definition may name a provider instead of (or in addition
//! to) a type: `{"type": "string", "provider": "gate"}`. Providers are looked
//! up in a [`ProviderRegistry`]; an unknown name is reported as
//! [`GeneratorError::UnknownProvider`] for the caller to handle.

pub mod aviation;
pub mod person;

use crate::context::GenerationContext;
use rand::RngCore;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use workload_types::GeneratedValue;

/// Error type for generator operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeneratorError {
    /// No provider registered under this name
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),
}

/// A named value source.
pub trait Provider: Send + Sync {
    /// Produce one value.
    ///
    /// Context-aware providers read `ctx` and fall back to defaults when it
    /// is absent; all others ignore it.
    fn generate(&self, rng: &mut dyn RngCore, ctx: Option<&GenerationContext>) -> GeneratedValue;

    /// Whether this provider reads the generation context.
    fn needs_context(&self) -> bool {
        false
    }
}

/// Context-free provider backed by a plain function.
#[derive(Clone, Copy)]
pub struct FnProvider(pub fn(&mut dyn RngCore) -> GeneratedValue);

impl Provider for FnProvider {
    fn generate(&self, rng: &mut dyn RngCore, _ctx: Option<&GenerationContext>) -> GeneratedValue {
        (self.0)(rng)
    }
}

/// Registry of providers by name.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn Provider>>,
}

impl ProviderRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every built-in provider.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        person::register(&mut registry);
        aviation::register(&mut registry);
        registry
    }

    /// Register (or replace) a provider.
    pub fn register(&mut self, name: impl Into<String>, provider: impl Provider + 'static) {
        self.providers.insert(name.into(), Arc::new(provider));
    }

    /// Register a context-free provider function.
    pub fn register_fn(&mut self, name: impl Into<String>, f: fn(&mut dyn RngCore) -> GeneratedValue) {
        self.register(name, FnProvider(f));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }

    /// Look up a provider.
    pub fn get(&self, name: &str) -> Result<&dyn Provider, GeneratorError> {
        self.providers
            .get(name)
            .map(|p| p.as_ref())
            .ok_or_else(|| GeneratorError::UnknownProvider(name.to_string()))
    }

    /// Generate a value from the named provider.
    pub fn generate(
        &self,
        name: &str,
        rng: &mut dyn RngCore,
        ctx: Option<&GenerationContext>,
    ) -> Result<GeneratedValue, GeneratorError> {
        Ok(self.get(name)?.generate(rng, ctx))
    }

    /// Whether the named provider is registered and reads the context.
    pub fn needs_context(&self, name: &str) -> bool {
        self.providers
            .get(name)
            .is_some_and(|p| p.needs_context())
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.providers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_unknown_provider_is_typed() {
        let registry = ProviderRegistry::builtin();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            registry.generate("no_such_provider", &mut rng, None),
            Err(GeneratorError::UnknownProvider("no_such_provider".to_string()))
        );
    }

    #[test]
    fn test_builtin_names() {
        let registry = ProviderRegistry::builtin();
        for name in [
            "name",
            "first_name",
            "last_name",
            "email",
            "word",
            "sentence",
            "city",
            "country",
            "company",
            "phone_number",
            "uuid4",
            "date_time",
            "flight_id",
            "flight_code",
            "gate",
            "ticket_number",
            "aircraft_type",
            "passengers",
            "equip",
            "total_seats",
            "seats_available",
        ] {
            assert!(registry.contains(name), "missing provider {name}");
        }
    }

    #[test]
    fn test_context_awareness() {
        let registry = ProviderRegistry::builtin();
        for name in ["passengers", "equip", "total_seats", "seats_available"] {
            assert!(registry.needs_context(name), "{name} should need context");
        }
        assert!(!registry.needs_context("gate"));
        assert!(!registry.needs_context("no_such_provider"));
    }

    #[test]
    fn test_register_custom_provider() {
        let mut registry = ProviderRegistry::new();
        registry.register_fn("answer", |_| GeneratedValue::Int32(42));
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            registry.generate("answer", &mut rng, None),
            Ok(GeneratedValue::Int32(42))
        );
    }
}
