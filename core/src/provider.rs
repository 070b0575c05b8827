//! Instance providers available to deserializers.
//!
//! A deserializer that needs a dependent value (a default, a builder, a
//! shared handle) asks the [`DeserializationContext`](crate::DeserializationContext)
//! for it instead of constructing it itself. Providers are registered by
//! type during startup.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

type Factory = Arc<dyn Fn() -> Box<dyn Any + Send> + Send + Sync>;

#[derive(Default)]
pub struct ProviderManager {
    factories: RwLock<HashMap<TypeId, Factory>>,
}

impl ProviderManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the factory for `T`, replacing any previous one.
    pub fn register<T, F>(&self, factory: F)
    where
        T: Send + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        let factory: Factory = Arc::new(move || Box::new(factory()) as Box<dyn Any + Send>);
        self.factories.write().insert(TypeId::of::<T>(), factory);
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.factories.read().contains_key(&TypeId::of::<T>())
    }

    /// A fresh instance of `T`, if a factory is registered.
    pub fn get<T: 'static>(&self) -> Option<T> {
        let factory = self.factories.read().get(&TypeId::of::<T>()).cloned()?;
        factory().downcast::<T>().ok().map(|boxed| *boxed)
    }
}

impl std::fmt::Debug for ProviderManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderManager")
            .field("providers", &self.factories.read().len())
            .finish()
    }
}
