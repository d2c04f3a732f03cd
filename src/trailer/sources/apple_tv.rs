//! Apple TV trailers (HLS, typically 4K).
//!
//! Wikidata maps the IMDb ID to an Apple TV movie ID; the public movie page
//! embeds the trailer's HLS manifest URL.

use async_trait::async_trait;
use regex::Regex;

use super::BROWSER_USER_AGENT;
use crate::fetch::BoundedFetch;
use crate::trailer::wikidata::{Wikidata, PROP_APPLE_TV_MOVIE};
use crate::trailer::{Resolution, SourceError, SourceKind, TrailerDescriptor, TrailerSource};

pub struct AppleTvSource {
    fetch: BoundedFetch,
    wikidata: Wikidata,
    base_url: String,
    manifest_pattern: Regex,
}

impl AppleTvSource {
    pub fn new(fetch: BoundedFetch, wikidata: Wikidata, base_url: impl Into<String>) -> Self {
        Self {
            fetch,
            wikidata,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            manifest_pattern: Regex::new(r#"https://[^"]*\.m3u8[^"]*"#)
                .expect("static manifest pattern"),
        }
    }

    async fn lookup(&self, id: &str) -> Result<TrailerDescriptor, SourceError> {
        let apple_id = self
            .wikidata
            .cross_reference(id, PROP_APPLE_TV_MOVIE)
            .await?;

        let page_url = format!("{}/us/movie/{}", self.base_url, apple_id);
        let html = self
            .fetch
            .text(
                self.fetch
                    .get(&page_url)
                    .header("User-Agent", BROWSER_USER_AGENT),
            )
            .await?;

        let url = self
            .extract_manifest(&html)
            .ok_or(SourceError::Pattern("HLS manifest"))?;

        Ok(TrailerDescriptor::new(url, SourceKind::AppleTv.provider_name()).with_quality("4K"))
    }

    fn extract_manifest(&self, html: &str) -> Option<String> {
        self.manifest_pattern
            .find(html)
            .map(|m| m.as_str().to_string())
    }
}

#[async_trait]
impl TrailerSource for AppleTvSource {
    fn kind(&self) -> SourceKind {
        SourceKind::AppleTv
    }

    async fn resolve(&self, id: &str) -> Resolution {
        Resolution::from_lookup(self.kind(), id, self.lookup(id).await)
    }
}
