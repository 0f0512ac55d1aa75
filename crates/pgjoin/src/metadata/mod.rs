//! Descriptor lookup service.
//!
//! A [`DescriptorRegistry`] is populated once at startup, either by hand with
//! [`DescriptorRegistry::register`] or from every `#[derive(Entity)]` type via
//! [`DescriptorRegistry::discover`], and is read-only afterwards. Queries hold
//! it behind an `Arc` through [`JoinConfig`](crate::JoinConfig).

use crate::entity::{Entity, EntityDescriptor};
use crate::error::{BuildError, BuildResult};
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

/// Registration record submitted by `#[derive(Entity)]`.
pub struct EntityRegistration {
    /// Function that registers an entity type with a [`DescriptorRegistry`].
    pub register_fn: fn(&mut DescriptorRegistry),
}

inventory::collect!(EntityRegistration);

/// Process-wide cache of entity descriptors keyed by entity type.
#[derive(Debug, Clone, Default)]
pub struct DescriptorRegistry {
    descriptors: HashMap<TypeId, Arc<EntityDescriptor>>,
}

impl DescriptorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry holding every entity registered through the derive macro.
    pub fn discover() -> Self {
        let mut registry = Self::new();
        for reg in inventory::iter::<EntityRegistration> {
            (reg.register_fn)(&mut registry);
        }
        tracing::debug!(
            target: "pgjoin.metadata",
            entities = registry.len(),
            "discovered entity descriptors"
        );
        registry
    }

    /// Register entity `E`, replacing any earlier descriptor for it.
    pub fn register<E: Entity>(&mut self) -> &mut Self {
        self.descriptors
            .insert(TypeId::of::<E>(), Arc::new(E::descriptor()));
        self
    }

    /// Builder form of [`register`](Self::register).
    pub fn with<E: Entity>(mut self) -> Self {
        self.register::<E>();
        self
    }

    /// Look up the descriptor of `E`.
    pub fn get<E: Entity>(&self) -> BuildResult<Arc<EntityDescriptor>> {
        self.descriptors
            .get(&TypeId::of::<E>())
            .cloned()
            .ok_or(BuildError::MetadataUnavailable(std::any::type_name::<E>()))
    }

    pub fn contains<E: Entity>(&self) -> bool {
        self.descriptors.contains_key(&TypeId::of::<E>())
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}
