//! Lightweight configuration loader and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars.
//! Typed sections are pulled out with [`Config::get`] or the `*_settings`
//! helpers, which fall back to defaults when a section is absent.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::types::PriceFacet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub dir: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self { dir: "data".to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub page_size: usize,
    pub debounce_ms: u64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self { page_size: 12, debounce_ms: 300 }
    }
}

/// Overrides for the "cheap" price heuristics; unset facets keep the built-in value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserSettings {
    pub cheap_thresholds: BTreeMap<PriceFacet, f64>,
}

pub struct Config {
    figment: Figment,
    base_dir: PathBuf,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        Self::load_from(Path::new("."), &env_name)
    }

    /// Loads `config.toml` and the env-specific overlay from `base_dir`.
    /// Missing files are skipped.
    pub fn load_from(base_dir: &Path, env_name: &str) -> anyhow::Result<Self> {
        let mut figment = Figment::new()
            .merge(Serialized::default("data", DataSettings::default()))
            .merge(Serialized::default("search", SearchSettings::default()))
            .merge(Toml::file(base_dir.join("config.toml")));
        match env_name {
            "dev" | "development" => figment = figment.merge(Toml::file(base_dir.join("config.dev.toml"))),
            "prod" | "production" => figment = figment.merge(Toml::file(base_dir.join("config.prod.toml"))),
            "test" | "testing" => figment = figment.merge(Toml::file(base_dir.join("config.test.toml"))),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment, base_dir: base_dir.to_path_buf() };
        config.validate_for_env(env_name)?;
        Ok(config)
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    fn get_or_default<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned + Default,
    {
        if self.figment.find_value(key).is_err() {
            return Ok(T::default());
        }
        self.get(key)
    }

    pub fn data_settings(&self) -> anyhow::Result<DataSettings> {
        self.get_or_default("data")
    }

    pub fn search_settings(&self) -> anyhow::Result<SearchSettings> {
        self.get_or_default("search")
    }

    pub fn parser_settings(&self) -> anyhow::Result<ParserSettings> {
        self.get_or_default("parser")
    }

    /// Data directory with `~`/`$VAR` expanded, relative to the config base dir.
    pub fn data_dir(&self) -> anyhow::Result<PathBuf> {
        Ok(resolve_with_base(&self.base_dir, self.data_settings()?.dir))
    }

    fn validate_for_env(&self, env: &str) -> anyhow::Result<()> {
        let search = self.search_settings()?;
        if search.page_size == 0 {
            return Err(Error::InvalidConfig("search.page_size must be at least 1".to_string()).into());
        }
        match env {
            "prod" | "production" if search.debounce_ms == 0 => Err(Error::InvalidConfig(
                "search.debounce_ms must be non-zero in production".to_string(),
            )
            .into()),
            _ => Ok(()),
        }
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
