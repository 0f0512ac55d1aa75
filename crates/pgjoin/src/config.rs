//! Query configuration: settings, tenant source, executor and descriptors.

use crate::exec::JoinExecutor;
use crate::metadata::DescriptorRegistry;
use crate::value::SqlValue;
use serde::Deserialize;
use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

/// What to do when an entity type is joined a second time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateJoinPolicy {
    /// Replace the earlier registration and log a warning.
    #[default]
    Overwrite,
    /// Fail with [`BuildError::DuplicateEntityJoin`](crate::BuildError::DuplicateEntityJoin).
    Reject,
}

/// Plain settings, loadable from TOML.
///
/// ```toml
/// soft_delete = true
/// default_page_size = 20
/// duplicate_join = "reject"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct JoinSettings {
    /// Inject `alias.column = <not deleted>` for soft-delete tables.
    pub soft_delete: bool,
    /// Page size used when a page request asks for size 0.
    pub default_page_size: u64,
    pub duplicate_join: DuplicateJoinPolicy,
}

impl Default for JoinSettings {
    fn default() -> Self {
        Self {
            soft_delete: false,
            default_page_size: 10,
            duplicate_join: DuplicateJoinPolicy::Overwrite,
        }
    }
}

impl JoinSettings {
    /// Parse settings from a TOML document; missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }
}

/// Supplies the tenant scope applied to tenant-aware tables.
pub trait TenantSource: Send + Sync {
    /// Tenant column name; `None` or empty disables tenant injection.
    fn tenant_column(&self) -> Option<&str>;

    /// Tenant values visible to the current caller.
    fn tenant_values(&self) -> Vec<SqlValue>;

    /// Marker type that tenant-aware entities declare as their base.
    fn tenant_base_type(&self) -> Option<TypeId>;
}

/// A tenant source with a fixed column, value set and base type.
#[derive(Debug, Clone)]
pub struct StaticTenant {
    column: String,
    values: Vec<SqlValue>,
    base: TypeId,
}

impl StaticTenant {
    /// Scope entities whose tenant base is `B` by `column IN values`.
    pub fn new<B: 'static>(
        column: impl Into<String>,
        values: impl IntoIterator<Item = impl Into<SqlValue>>,
    ) -> Self {
        Self {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
            base: TypeId::of::<B>(),
        }
    }
}

impl TenantSource for StaticTenant {
    fn tenant_column(&self) -> Option<&str> {
        Some(&self.column)
    }

    fn tenant_values(&self) -> Vec<SqlValue> {
        self.values.clone()
    }

    fn tenant_base_type(&self) -> Option<TypeId> {
        Some(self.base)
    }
}

/// Shared configuration handed to every query.
#[derive(Clone)]
pub struct JoinConfig {
    pub settings: JoinSettings,
    tenant: Option<Arc<dyn TenantSource>>,
    executor: Option<Arc<dyn JoinExecutor>>,
    descriptors: Arc<DescriptorRegistry>,
}

impl Default for JoinConfig {
    fn default() -> Self {
        Self::new(DescriptorRegistry::discover())
    }
}

impl fmt::Debug for JoinConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JoinConfig")
            .field("settings", &self.settings)
            .field("tenant", &self.tenant.is_some())
            .field("executor", &self.executor.is_some())
            .field("descriptors", &self.descriptors.len())
            .finish()
    }
}

impl JoinConfig {
    /// Create a configuration over a populated descriptor registry.
    pub fn new(descriptors: DescriptorRegistry) -> Self {
        Self {
            settings: JoinSettings::default(),
            tenant: None,
            executor: None,
            descriptors: Arc::new(descriptors),
        }
    }

    pub fn settings(mut self, settings: JoinSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Enable or disable soft-delete injection.
    pub fn soft_delete(mut self, enabled: bool) -> Self {
        self.settings.soft_delete = enabled;
        self
    }

    pub fn duplicate_join(mut self, policy: DuplicateJoinPolicy) -> Self {
        self.settings.duplicate_join = policy;
        self
    }

    pub fn tenant(mut self, source: impl TenantSource + 'static) -> Self {
        self.tenant = Some(Arc::new(source));
        self
    }

    pub fn executor(mut self, executor: impl JoinExecutor + 'static) -> Self {
        self.executor = Some(Arc::new(executor));
        self
    }

    /// Use an executor that is already shared.
    pub fn shared_executor(mut self, executor: Arc<dyn JoinExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn descriptors(&self) -> &DescriptorRegistry {
        &self.descriptors
    }

    pub fn tenant_source(&self) -> Option<&dyn TenantSource> {
        self.tenant.as_deref()
    }

    pub fn executor_ref(&self) -> Option<&Arc<dyn JoinExecutor>> {
        self.executor.as_ref()
    }

    /// Whether tenant injection can apply at all.
    pub fn tenant_enabled(&self) -> bool {
        self.tenant.as_ref().is_some_and(|t| {
            t.tenant_base_type().is_some()
                && t.tenant_column().is_some_and(|c| !c.trim().is_empty())
        })
    }
}
