use crate::types::{ProviderRecord, ServiceDefinition};

/// Source of the provider and service collections, queried once per session.
pub trait ProviderRepository: Send + Sync {
    fn fetch_providers(&self) -> anyhow::Result<Vec<ProviderRecord>>;
    fn fetch_services(&self) -> anyhow::Result<Vec<ServiceDefinition>>;
}
