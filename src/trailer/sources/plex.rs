//! Plex trailers (1080p, served from Plex's video CDN).
//!
//! Three dependent calls: an anonymous token, a catalog match by IMDb GUID,
//! then the match's extras where the first `trailer` subtype wins.

use async_trait::async_trait;
use serde::Deserialize;

use crate::fetch::BoundedFetch;
use crate::trailer::{Resolution, SourceError, SourceKind, TrailerDescriptor, TrailerSource};

const CLIENT_IDENTIFIER: &str = "trailerio-lite";
const PRODUCT: &str = "Plex Web";
const PLEX_VERSION: &str = "4.141.1";

// ---------------------------------------------------------------------------
// Plex API response types (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnonymousUser {
    auth_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContainerResponse {
    #[serde(rename = "MediaContainer")]
    media_container: Option<MediaContainer>,
}

#[derive(Debug, Deserialize)]
struct MediaContainer {
    #[serde(rename = "Metadata", default)]
    metadata: Vec<PlexMetadata>,
}

#[derive(Debug, Deserialize)]
struct PlexMetadata {
    #[serde(rename = "ratingKey")]
    rating_key: Option<String>,
    subtype: Option<String>,
    #[serde(rename = "Media", default)]
    media: Vec<PlexMedia>,
}

#[derive(Debug, Deserialize)]
struct PlexMedia {
    url: Option<String>,
}

impl ContainerResponse {
    fn into_metadata(self) -> Vec<PlexMetadata> {
        self.media_container
            .map(|c| c.metadata)
            .unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

pub struct PlexSource {
    fetch: BoundedFetch,
    auth_url: String,
    metadata_url: String,
}

impl PlexSource {
    pub fn new(
        fetch: BoundedFetch,
        auth_url: impl Into<String>,
        metadata_url: impl Into<String>,
    ) -> Self {
        Self {
            fetch,
            auth_url: auth_url.into().trim_end_matches('/').to_string(),
            metadata_url: metadata_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn anonymous_token(&self) -> Result<String, SourceError> {
        let request = self
            .fetch
            .post(format!("{}/api/v2/users/anonymous", self.auth_url))
            .header("Accept", "application/json")
            .header("X-Plex-Client-Identifier", CLIENT_IDENTIFIER)
            .header("X-Plex-Product", PRODUCT)
            .header("X-Plex-Version", PLEX_VERSION);

        let user: AnonymousUser = self.fetch.json(request).await?;
        user.auth_token
            .filter(|t| !t.is_empty())
            .ok_or(SourceError::Missing("plex auth token"))
    }

    async fn metadata(
        &self,
        request: reqwest::RequestBuilder,
        token: &str,
    ) -> Result<Vec<PlexMetadata>, SourceError> {
        let request = request
            .header("Accept", "application/json")
            .header("X-Plex-Token", token);
        let body: ContainerResponse = self.fetch.json(request).await?;
        Ok(body.into_metadata())
    }

    async fn lookup(&self, id: &str) -> Result<TrailerDescriptor, SourceError> {
        let token = self.anonymous_token().await?;

        let guid = format!("imdb://{id}");
        let matches = self
            .metadata(
                self.fetch
                    .get(format!("{}/library/metadata/matches", self.metadata_url))
                    .query(&[("type", "1"), ("guid", guid.as_str())]),
                &token,
            )
            .await?;
        let rating_key = matches
            .into_iter()
            .next()
            .and_then(|m| m.rating_key)
            .ok_or(SourceError::Missing("plex rating key"))?;

        let extras = self
            .metadata(
                self.fetch.get(format!(
                    "{}/library/metadata/{}/extras",
                    self.metadata_url, rating_key
                )),
                &token,
            )
            .await?;
        let url = extras
            .into_iter()
            .find(|m| m.subtype.as_deref() == Some("trailer"))
            .and_then(|m| m.media.into_iter().next())
            .and_then(|media| media.url)
            .ok_or(SourceError::Missing("plex trailer extra"))?;

        Ok(TrailerDescriptor::new(url, SourceKind::Plex.provider_name()).with_quality("1080p"))
    }
}

#[async_trait]
impl TrailerSource for PlexSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Plex
    }

    async fn resolve(&self, id: &str) -> Resolution {
        Resolution::from_lookup(self.kind(), id, self.lookup(id).await)
    }
}
