//! Display title lookup run alongside the trailer sources.

use async_trait::async_trait;
use tracing::debug;

use super::wikidata::Wikidata;

/// Resolves a human-readable title for an identifier. Like trailer sources,
/// failures are absorbed and reported as `None`.
#[async_trait]
pub trait TitleLookup: Send + Sync {
    async fn title(&self, id: &str) -> Option<String>;
}

/// English Wikidata label of the item carrying the IMDb ID.
pub struct WikidataTitle {
    wikidata: Wikidata,
}

impl WikidataTitle {
    pub fn new(wikidata: Wikidata) -> Self {
        Self { wikidata }
    }
}

#[async_trait]
impl TitleLookup for WikidataTitle {
    async fn title(&self, id: &str) -> Option<String> {
        match self.wikidata.english_label(id).await {
            Ok(label) => Some(label),
            Err(e) => {
                debug!(id, reason = %e, "no title");
                None
            }
        }
    }
}
