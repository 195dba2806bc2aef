use anyhow::Context;
use serde::Deserialize;

use crate::domain::identity::{Identity, IdentityCatalog};

#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    pub store: StoreSettings,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub collector: CollectorSettings,
    #[serde(default)]
    pub news: NewsSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreSettings {
    pub host: String,
    pub token: String,
    pub database: String,
    #[serde(default = "default_retention_policy")]
    pub retention_policy: String,
    #[serde(default = "default_measurement")]
    pub measurement: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CollectorSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_period_secs")]
    pub period_secs: u64,
    #[serde(default = "default_vs_currency")]
    pub vs_currency: String,
    #[serde(default = "default_quote_url")]
    pub quote_url: String,
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            period_secs: default_period_secs(),
            vs_currency: default_vs_currency(),
            quote_url: default_quote_url(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct NewsSettings {
    #[serde(default = "default_news_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub source_domains: Vec<String>,
    #[serde(default = "default_max_records")]
    pub max_records: u32,
}

impl Default for NewsSettings {
    fn default() -> Self {
        Self {
            endpoint: default_news_endpoint(),
            keywords: Vec::new(),
            source_domains: Vec::new(),
            max_records: default_max_records(),
        }
    }
}

/// Static asset/subject catalog, read once at process start.
#[derive(Debug, Deserialize, Clone)]
pub struct Catalog {
    #[serde(default)]
    pub assets: Vec<AssetEntry>,
    #[serde(default)]
    pub subjects: Vec<SubjectEntry>,
    #[serde(default = "default_subject")]
    pub default_subject: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AssetEntry {
    pub id: String,
    pub color: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SubjectEntry {
    pub name: String,
    pub icon: String,
}

impl Catalog {
    pub fn color_for(&self, asset_id: &str) -> Option<String> {
        self.assets
            .iter()
            .find(|a| a.id == asset_id)
            .and_then(|a| a.color.clone())
    }

    pub fn asset_ids(&self) -> Vec<String> {
        self.assets.iter().map(|a| a.id.clone()).collect()
    }

    pub fn identity_catalog(&self) -> IdentityCatalog {
        let identities = self
            .subjects
            .iter()
            .map(|s| Identity {
                id: s.name.to_lowercase(),
                icon: s.icon.clone(),
            })
            .collect();
        IdentityCatalog::new(identities, &self.default_subject)
    }
}

pub fn load_service_config() -> anyhow::Result<ServiceConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/service"))
        .build()?;

    Ok(settings.try_deserialize()?)
}

pub fn load_catalog(path: &str) -> anyhow::Result<Catalog> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read catalog file {}", path))?;
    let catalog: Catalog = toml::from_str(&raw)
        .with_context(|| format!("failed to parse catalog file {}", path))?;
    Ok(catalog)
}

fn default_retention_policy() -> String {
    "autogen".to_string()
}

fn default_measurement() -> String {
    "crypto_price".to_string()
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_period_secs() -> u64 {
    300
}

fn default_vs_currency() -> String {
    "eur".to_string()
}

fn default_quote_url() -> String {
    "https://api.coingecko.com/api/v3/simple/price".to_string()
}

fn default_news_endpoint() -> String {
    "https://api.gdeltproject.org/api/v2/doc/doc".to_string()
}

fn default_max_records() -> u32 {
    25
}

fn default_subject() -> String {
    "trump".to_string()
}
