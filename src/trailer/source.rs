//! Trait definition and identities for trailer sources.
//!
//! Every source translates an identifier into at most one
//! [`TrailerDescriptor`]. Sources never fail towards their caller: any
//! internal error collapses into [`Resolution::NotFound`], so a broken or
//! rate-limited upstream only removes its own link from the result.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::TrailerDescriptor;
use crate::fetch::FetchError;

// ---------------------------------------------------------------------------
// Identity and priority
// ---------------------------------------------------------------------------

/// Identity of a trailer source. The priority is tied to the identity, not to
/// the position of the source in any list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    AppleTv,
    Plex,
    RottenTomatoes,
    DigitalDigest,
    Imdb,
}

impl SourceKind {
    pub const ALL: [SourceKind; 5] = [
        SourceKind::AppleTv,
        SourceKind::Plex,
        SourceKind::RottenTomatoes,
        SourceKind::DigitalDigest,
        SourceKind::Imdb,
    ];

    /// Fixed rank; lower wins.
    pub fn priority(self) -> u8 {
        match self {
            SourceKind::AppleTv => 0,
            SourceKind::Plex => 1,
            SourceKind::RottenTomatoes => 2,
            SourceKind::DigitalDigest => 3,
            SourceKind::Imdb => 4,
        }
    }

    /// Provider label used in descriptors.
    pub fn provider_name(self) -> &'static str {
        match self {
            SourceKind::AppleTv => "Apple TV",
            SourceKind::Plex => "Plex",
            SourceKind::RottenTomatoes => "Rotten Tomatoes",
            SourceKind::DigitalDigest => "Digital Digest",
            SourceKind::Imdb => "IMDb",
        }
    }

    /// Configuration key, e.g. `"apple_tv"`.
    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::AppleTv => "apple_tv",
            SourceKind::Plex => "plex",
            SourceKind::RottenTomatoes => "rotten_tomatoes",
            SourceKind::DigitalDigest => "digital_digest",
            SourceKind::Imdb => "imdb",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Outcome of asking one source for a trailer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found(TrailerDescriptor),
    NotFound,
}

impl Resolution {
    /// Collapse an internal lookup result, logging the reason on failure.
    pub fn from_lookup(kind: SourceKind, id: &str, lookup: Result<TrailerDescriptor, SourceError>) -> Self {
        match lookup {
            Ok(descriptor) => {
                debug!(source = %kind, id, url = %descriptor.url, "trailer found");
                Resolution::Found(descriptor)
            }
            Err(e) => {
                debug!(source = %kind, id, reason = %e, "no trailer");
                Resolution::NotFound
            }
        }
    }

    pub fn found(self) -> Option<TrailerDescriptor> {
        match self {
            Resolution::Found(descriptor) => Some(descriptor),
            Resolution::NotFound => None,
        }
    }
}

/// Internal failure reasons of a source. Never leaves the source boundary
/// except through logging.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// An expected field or cross reference is absent.
    #[error("missing {0}")]
    Missing(&'static str),

    /// Scraped content did not contain the expected pattern.
    #[error("no match for {0}")]
    Pattern(&'static str),
}

// ---------------------------------------------------------------------------
// Source trait
// ---------------------------------------------------------------------------

/// Async trait implemented by every trailer source.
///
/// Implementations are shared behind an `Arc` and queried concurrently.
#[async_trait]
pub trait TrailerSource: Send + Sync {
    fn kind(&self) -> SourceKind;

    /// Resolve `id` to a trailer. Must not panic or propagate errors.
    async fn resolve(&self, id: &str) -> Resolution;
}
