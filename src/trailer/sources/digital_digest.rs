//! Digital Digest trailers, served from a PeerTube instance (often 4K).

use async_trait::async_trait;
use serde::Deserialize;

use crate::fetch::BoundedFetch;
use crate::trailer::{Resolution, SourceError, SourceKind, TrailerDescriptor, TrailerSource};

const DEFAULT_QUALITY: &str = "1080p";
const SEARCH_COUNT: &str = "5";

// ---------------------------------------------------------------------------
// PeerTube API response types (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    uuid: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoDetail {
    #[serde(default)]
    files: Vec<VideoFile>,
    #[serde(default)]
    streaming_playlists: Vec<StreamingPlaylist>,
}

#[derive(Debug, Deserialize)]
struct StreamingPlaylist {
    #[serde(default)]
    files: Vec<VideoFile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoFile {
    resolution: Option<FileResolution>,
    file_url: Option<String>,
    file_download_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FileResolution {
    id: Option<u32>,
    label: Option<String>,
}

impl VideoDetail {
    /// Web-video files, or the first HLS playlist's files when there are none.
    fn into_files(self) -> Vec<VideoFile> {
        if !self.files.is_empty() {
            return self.files;
        }
        self.streaming_playlists
            .into_iter()
            .next()
            .map(|p| p.files)
            .unwrap_or_default()
    }
}

impl VideoFile {
    fn resolution_id(&self) -> u32 {
        self.resolution.as_ref().and_then(|r| r.id).unwrap_or(0)
    }
}

/// Highest-resolution file that carries a usable URL.
fn best_file(mut files: Vec<VideoFile>) -> Option<(String, Option<String>)> {
    files.sort_by(|a, b| b.resolution_id().cmp(&a.resolution_id()));
    let best = files.into_iter().next()?;
    let url = best.file_url.or(best.file_download_url)?;
    let label = best.resolution.and_then(|r| r.label);
    Some((url, label))
}

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

pub struct DigitalDigestSource {
    fetch: BoundedFetch,
    base_url: String,
}

impl DigitalDigestSource {
    pub fn new(fetch: BoundedFetch, base_url: impl Into<String>) -> Self {
        Self {
            fetch,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn lookup(&self, id: &str) -> Result<TrailerDescriptor, SourceError> {
        let search: SearchResponse = self
            .fetch
            .json(
                self.fetch
                    .get(format!("{}/api/v1/search/videos", self.base_url))
                    .query(&[("search", id), ("count", SEARCH_COUNT)])
                    .header("Accept", "application/json"),
            )
            .await?;
        let hit = search
            .data
            .into_iter()
            .next()
            .ok_or(SourceError::Missing("search hit"))?;

        let detail: VideoDetail = self
            .fetch
            .json(
                self.fetch
                    .get(format!("{}/api/v1/videos/{}", self.base_url, hit.uuid))
                    .header("Accept", "application/json"),
            )
            .await?;

        let (url, label) =
            best_file(detail.into_files()).ok_or(SourceError::Missing("video file"))?;

        Ok(
            TrailerDescriptor::new(url, SourceKind::DigitalDigest.provider_name())
                .with_quality(label.unwrap_or_else(|| DEFAULT_QUALITY.to_string())),
        )
    }
}

#[async_trait]
impl TrailerSource for DigitalDigestSource {
    fn kind(&self) -> SourceKind {
        SourceKind::DigitalDigest
    }

    async fn resolve(&self, id: &str) -> Resolution {
        Resolution::from_lookup(self.kind(), id, self.lookup(id).await)
    }
}
