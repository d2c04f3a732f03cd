use serde::{Deserialize, Serialize};

use crate::fetch::DEFAULT_TIMEOUT;
use crate::trailer::SourceKind;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub fetch: FetchConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub sources: SourcesConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Deployment location tag reported by `/health` (e.g. a region code)
    #[serde(default)]
    pub edge: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    7000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            edge: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FetchConfig {
    /// Hard timeout for a single upstream exchange, in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// User-Agent sent to JSON APIs (scrapers send a browser agent)
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT.as_millis() as u64
}
fn default_user_agent() -> String {
    "TrailerioLite/1.0".to_string()
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Time-to-live of a cached resolution result (default: 24h)
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    /// Upper bound on in-memory entries before the oldest are evicted
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

fn default_ttl_secs() -> u64 {
    86_400
}
fn default_max_entries() -> usize {
    10_000
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            max_entries: default_max_entries(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourcesConfig {
    /// Sources queried for every request. Order here does not affect ranking.
    #[serde(default = "default_enabled_sources")]
    pub enabled: Vec<SourceKind>,

    /// Look up a display title alongside the trailer sources
    #[serde(default = "default_title_lookup")]
    pub title_lookup: bool,

    #[serde(default)]
    pub endpoints: EndpointsConfig,
}

fn default_enabled_sources() -> Vec<SourceKind> {
    SourceKind::ALL.to_vec()
}
fn default_title_lookup() -> bool {
    true
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled_sources(),
            title_lookup: default_title_lookup(),
            endpoints: EndpointsConfig::default(),
        }
    }
}

/// Base URLs of every upstream service. Overridable so a mirror or a mock
/// server can stand in for the real hosts.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EndpointsConfig {
    pub wikidata: String,
    pub apple_tv: String,
    pub plex_auth: String,
    pub plex_metadata: String,
    pub rotten_tomatoes: String,
    /// Host of the media links embedded in Rotten Tomatoes pages
    pub theplatform: String,
    pub digital_digest: String,
    pub imdb: String,
}

impl EndpointsConfig {
    /// Point every endpoint at the same base URL.
    pub fn all_at(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            wikidata: format!("{base}/sparql"),
            apple_tv: base.to_string(),
            plex_auth: base.to_string(),
            plex_metadata: base.to_string(),
            rotten_tomatoes: base.to_string(),
            theplatform: base.to_string(),
            digital_digest: base.to_string(),
            imdb: base.to_string(),
        }
    }
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            wikidata: "https://query.wikidata.org/sparql".to_string(),
            apple_tv: "https://tv.apple.com".to_string(),
            plex_auth: "https://plex.tv".to_string(),
            plex_metadata: "https://metadata.provider.plex.tv".to_string(),
            rotten_tomatoes: "https://www.rottentomatoes.com".to_string(),
            theplatform: "https://link.theplatform.com".to_string(),
            digital_digest: "https://trailers.digitaldigest.com".to_string(),
            imdb: "https://www.imdb.com".to_string(),
        }
    }
}
