//! Service catalog: code lookup and category membership.
//!
//! Category membership is defined only by the explicit `parent` reference of a
//! [`ServiceDefinition`]. Dotted codes (`vaccine.rabies`) look hierarchical, but
//! the prefix carries no meaning here; [`ServiceCatalog::prefix_divergences`]
//! reports codes whose prefix and parent disagree so the data can be fixed.

use std::collections::HashMap;

use tracing::warn;

use crate::error::{Error, Result};
use crate::types::ServiceDefinition;

#[derive(Debug, Clone, Default)]
pub struct ServiceCatalog {
    definitions: Vec<ServiceDefinition>,
    by_code: HashMap<String, usize>,
}

impl ServiceCatalog {
    /// Builds the catalog, rejecting duplicate codes and dangling parent references.
    pub fn new(mut definitions: Vec<ServiceDefinition>) -> Result<Self> {
        definitions.sort_by(|a, b| a.position.cmp(&b.position).then_with(|| a.code.cmp(&b.code)));
        let mut by_code = HashMap::with_capacity(definitions.len());
        for (i, def) in definitions.iter().enumerate() {
            if by_code.insert(def.code.clone(), i).is_some() {
                return Err(Error::InvalidCatalog(format!("duplicate service code '{}'", def.code)));
            }
        }
        for def in &definitions {
            if let Some(parent) = &def.parent {
                if !by_code.contains_key(parent) {
                    return Err(Error::InvalidCatalog(format!(
                        "service '{}' references unknown parent '{}'",
                        def.code, parent
                    )));
                }
            }
        }
        let catalog = Self { definitions, by_code };
        for (code, prefix) in catalog.prefix_divergences() {
            warn!(code = %code, prefix = %prefix, "service code prefix names a category that is not its parent");
        }
        Ok(catalog)
    }

    /// Definitions in sort-position order.
    pub fn definitions(&self) -> &[ServiceDefinition] {
        &self.definitions
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn get(&self, code: &str) -> Option<&ServiceDefinition> {
        self.by_code.get(code).map(|&i| &self.definitions[i])
    }

    /// Display name for a code, if the code is known.
    pub fn display_name(&self, code: &str) -> Option<&str> {
        self.get(code).map(|d| d.name.as_str())
    }

    pub fn categories(&self) -> impl Iterator<Item = &ServiceDefinition> {
        self.definitions.iter().filter(|d| d.is_category())
    }

    pub fn children_of<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a ServiceDefinition> + 'a {
        self.definitions
            .iter()
            .filter(move |d| d.parent.as_deref() == Some(category))
    }

    /// Resolves a search term to a category by case-insensitive code or display name.
    pub fn resolve_category(&self, term: &str) -> Option<&ServiceDefinition> {
        let term = term.trim();
        if term.is_empty() {
            return None;
        }
        self.categories()
            .find(|d| d.code.eq_ignore_ascii_case(term) || d.name.eq_ignore_ascii_case(term))
    }

    /// True when `code` is the category itself or directly names it as parent.
    pub fn belongs_to(&self, code: &str, category: &str) -> bool {
        code == category
            || self
                .get(code)
                .and_then(|d| d.parent.as_deref())
                .is_some_and(|p| p == category)
    }

    /// `(code, prefix)` pairs where the dotted prefix of `code` is an existing
    /// category but the explicit parent reference points elsewhere (or nowhere).
    pub fn prefix_divergences(&self) -> Vec<(String, String)> {
        self.definitions
            .iter()
            .filter_map(|d| {
                let (prefix, _) = d.code.rsplit_once('.')?;
                let prefix_def = self.get(prefix)?;
                if prefix_def.is_category() && d.parent.as_deref() != Some(prefix) {
                    Some((d.code.clone(), prefix.to_string()))
                } else {
                    None
                }
            })
            .collect()
    }
}
