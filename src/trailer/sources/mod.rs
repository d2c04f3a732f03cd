//! Concrete trailer source implementations.
//!
//! Each submodule wraps a single upstream service and implements the
//! [`TrailerSource`] trait.

pub mod apple_tv;
pub mod digital_digest;
pub mod imdb;
pub mod plex;
pub mod rotten_tomatoes;

use std::sync::Arc;

pub use apple_tv::AppleTvSource;
pub use digital_digest::DigitalDigestSource;
pub use imdb::ImdbSource;
pub use plex::PlexSource;
pub use rotten_tomatoes::RottenTomatoesSource;

use super::wikidata::Wikidata;
use super::{SourceKind, TrailerSource};
use crate::config::SourcesConfig;
use crate::fetch::BoundedFetch;

/// Desktop browser agent for HTML pages that reject bot agents.
pub(crate) const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";

/// Instantiate every source listed in `config.enabled`.
pub fn build_sources(config: &SourcesConfig, fetch: &BoundedFetch) -> Vec<Arc<dyn TrailerSource>> {
    let endpoints = &config.endpoints;
    let wikidata = Wikidata::new(fetch.clone(), endpoints.wikidata.clone());

    config
        .enabled
        .iter()
        .map(|kind| -> Arc<dyn TrailerSource> {
            match kind {
                SourceKind::AppleTv => Arc::new(AppleTvSource::new(
                    fetch.clone(),
                    wikidata.clone(),
                    endpoints.apple_tv.clone(),
                )),
                SourceKind::Plex => Arc::new(PlexSource::new(
                    fetch.clone(),
                    endpoints.plex_auth.clone(),
                    endpoints.plex_metadata.clone(),
                )),
                SourceKind::RottenTomatoes => Arc::new(RottenTomatoesSource::new(
                    fetch.clone(),
                    wikidata.clone(),
                    endpoints.rotten_tomatoes.clone(),
                    &endpoints.theplatform,
                )),
                SourceKind::DigitalDigest => Arc::new(DigitalDigestSource::new(
                    fetch.clone(),
                    endpoints.digital_digest.clone(),
                )),
                SourceKind::Imdb => Arc::new(ImdbSource::new(fetch.clone(), endpoints.imdb.clone())),
            }
        })
        .collect()
}
