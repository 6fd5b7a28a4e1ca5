//! Application configuration: one TOML file plus environment overrides.

use std::path::Path;

use anyhow::{Context, Result};
use dreamforge_access::AccessConfig;
use dreamforge_db::DbConfig;
use dreamforge_remote::{StabilityConfig, SupabaseConfig};
use serde::Deserialize;

/// Environment variable naming the config file when `--config` is absent.
pub const CONFIG_ENV: &str = "DREAMFORGE_CONFIG";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub db: DbConfig,
    pub access: AccessConfig,
    pub stability: StabilityConfig,
    pub supabase: SupabaseConfig,
}

impl AppConfig {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_toml(&contents).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// File settings (if any), then `DREAMFORGE_*` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Override secrets and endpoints from `lookup`. Empty values are
    /// ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(v) = get("DREAMFORGE_DB_URL") {
            self.db.url = v;
        }
        if let Some(v) = get("DREAMFORGE_DB_USERNAME") {
            self.db.username = v;
        }
        if let Some(v) = get("DREAMFORGE_DB_PASSWORD") {
            self.db.password = v;
        }
        if let Some(v) = get("DREAMFORGE_STABILITY_API_KEY") {
            self.stability.api_key = v;
        }
        if let Some(v) = get("DREAMFORGE_SUPABASE_URL") {
            self.supabase.url = v;
        }
        if let Some(v) = get("DREAMFORGE_SUPABASE_ANON_KEY") {
            self.supabase.anon_key = v;
        }
        if let Some(v) = get("DREAMFORGE_ACCESS_TOKEN") {
            self.supabase.access_token = Some(v);
        }
        if let Some(v) = get("DREAMFORGE_PRO_PRICE_ID") {
            self.access.pro_price_id = v;
        }
        if let Some(v) = get("DREAMFORGE_STUDIO_PRICE_ID") {
            self.access.studio_price_id = v;
        }
    }
}
