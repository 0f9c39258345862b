//! Snapshot loading from a [`ProviderRepository`].
//!
//! The loader is the boundary where supplied data is checked: prices that are
//! negative or non-finite and ratings outside `[0, 5]` are dropped with a
//! warning, so the engines only ever see finite values or `None`.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::catalog::ServiceCatalog;
use crate::traits::ProviderRepository;
use crate::types::{PriceFacet, ProviderRecord, ServiceDefinition};

pub const PROVIDERS_FILE: &str = "providers.json";
pub const SERVICES_FILE: &str = "services.json";

/// Reads `providers.json` and `services.json` from a directory.
#[derive(Debug, Clone)]
pub struct JsonRepository {
    dir: PathBuf,
}

impl JsonRepository {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn read_json<T: serde::de::DeserializeOwned>(&self, file: &str) -> Result<T> {
        let path = self.dir.join(file);
        let raw = fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
    }
}

impl ProviderRepository for JsonRepository {
    fn fetch_providers(&self) -> Result<Vec<ProviderRecord>> {
        self.read_json(PROVIDERS_FILE)
    }

    fn fetch_services(&self) -> Result<Vec<ServiceDefinition>> {
        self.read_json(SERVICES_FILE)
    }
}

/// Fixed collections held in memory, for tests and embedding callers.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    pub providers: Vec<ProviderRecord>,
    pub services: Vec<ServiceDefinition>,
}

impl ProviderRepository for InMemoryRepository {
    fn fetch_providers(&self) -> Result<Vec<ProviderRecord>> {
        Ok(self.providers.clone())
    }

    fn fetch_services(&self) -> Result<Vec<ServiceDefinition>> {
        Ok(self.services.clone())
    }
}

/// Read-only provider and service collections for one session.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub providers: Vec<ProviderRecord>,
    pub catalog: ServiceCatalog,
}

impl Snapshot {
    pub fn load(repo: &dyn ProviderRepository) -> Result<Self> {
        let services = repo.fetch_services().context("fetching services")?;
        let catalog = ServiceCatalog::new(services)?;
        let mut providers = repo.fetch_providers().context("fetching providers")?;
        for record in &mut providers {
            sanitize(record, &catalog);
        }
        info!(providers = providers.len(), services = catalog.len(), "snapshot loaded");
        Ok(Self { providers, catalog })
    }

    pub fn from_dir(dir: &Path) -> Result<Self> {
        Self::load(&JsonRepository::new(dir))
    }
}

fn sanitize(record: &mut ProviderRecord, catalog: &ServiceCatalog) {
    for facet in PriceFacet::ALL {
        if let Some(v) = record.prices.get(facet) {
            if !v.is_finite() || v < 0.0 {
                warn!(id = %record.id, facet = %facet, value = v, "dropping invalid price");
                record.prices.set(facet, None);
            }
        }
    }
    if let Some(r) = record.rating {
        if !r.is_finite() || !(0.0..=5.0).contains(&r) {
            warn!(id = %record.id, rating = r, "dropping out-of-range rating");
            record.rating = None;
        }
    }
    for code in &record.services {
        if catalog.get(code).is_none() {
            warn!(id = %record.id, code = %code, "provider lists unknown service code");
        }
    }
}
