//! Multi-source trailer resolution.
//!
//! # Module layout
//!
//! - [`source`] -- The [`TrailerSource`] trait, source identities and priorities.
//! - [`sources`] -- Concrete sources (Apple TV, Plex, Rotten Tomatoes,
//!   Digital Digest, IMDb).
//! - [`wikidata`] -- SPARQL helper shared by the cross-reference sources.
//! - [`title`] -- Display title lookup.
//! - [`resolver`] -- Concurrent fan-out, ranking and caching.

pub mod resolver;
pub mod source;
pub mod sources;
pub mod title;
pub mod wikidata;

use serde::{Deserialize, Serialize};

pub use resolver::{ResolverStats, SourceStats, TrailerResolver};
pub use source::{Resolution, SourceError, SourceKind, TrailerSource};

/// A playable trailer found by one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrailerDescriptor {
    /// Playable media URL (HLS manifest or direct file).
    pub url: String,
    /// Display name of the provider (e.g. "Apple TV").
    pub provider: String,
    /// Resolution label such as "4K" or "1080p", when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
}

impl TrailerDescriptor {
    pub fn new(url: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            provider: provider.into(),
            quality: None,
        }
    }

    pub fn with_quality(mut self, quality: impl Into<String>) -> Self {
        self.quality = Some(quality.into());
        self
    }

    /// Whether the URL points at an HLS manifest rather than a plain file.
    pub fn is_hls(&self) -> bool {
        self.url.contains(".m3u8")
    }
}

/// A descriptor tagged with the priority of the source that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedLink {
    pub priority: u8,
    /// Set on the first link of a result only.
    pub preferred: bool,
    #[serde(flatten)]
    pub descriptor: TrailerDescriptor,
}

impl RankedLink {
    /// Provider label shown to clients, e.g. `"★ Apple TV (4K)"`.
    pub fn label(&self) -> String {
        let base = match &self.descriptor.quality {
            Some(quality) => format!("{} ({})", self.descriptor.provider, quality),
            None => self.descriptor.provider.clone(),
        };
        if self.preferred {
            format!("★ {base}")
        } else {
            base
        }
    }
}

/// Merged outcome of all sources for one identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionResult {
    /// Display name; the identifier itself when no title was found.
    pub title: String,
    /// Ordered ascending by priority.
    pub links: Vec<RankedLink>,
}

impl ResolutionResult {
    /// Rank `found` by priority, keep one descriptor per priority (the
    /// earliest given) and mark the first entry as preferred.
    pub fn from_ranked(title: String, mut found: Vec<(u8, TrailerDescriptor)>) -> Self {
        found.sort_by_key(|(priority, _)| *priority);
        found.dedup_by_key(|(priority, _)| *priority);
        let links = found
            .into_iter()
            .enumerate()
            .map(|(idx, (priority, descriptor))| RankedLink {
                priority,
                preferred: idx == 0,
                descriptor,
            })
            .collect();
        Self { title, links }
    }

    pub fn preferred(&self) -> Option<&RankedLink> {
        self.links.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranks_by_priority_and_marks_first_preferred() {
        let result = ResolutionResult::from_ranked(
            "Heat".into(),
            vec![
                (4, TrailerDescriptor::new("https://e/4.mp4", "IMDb")),
                (1, TrailerDescriptor::new("https://b/1.mp4", "Plex")),
                (3, TrailerDescriptor::new("https://d/3.mp4", "Digital Digest")),
            ],
        );

        let priorities: Vec<u8> = result.links.iter().map(|l| l.priority).collect();
        assert_eq!(priorities, vec![1, 3, 4]);
        assert!(result.links[0].preferred);
        assert!(!result.links[1].preferred);
        assert!(!result.links[2].preferred);
        assert_eq!(result.preferred().unwrap().descriptor.provider, "Plex");
    }

    #[test]
    fn keeps_one_link_per_priority() {
        let result = ResolutionResult::from_ranked(
            "Heat".into(),
            vec![
                (2, TrailerDescriptor::new("https://c/first.mp4", "Rotten Tomatoes")),
                (0, TrailerDescriptor::new("https://a/x.m3u8", "Apple TV")),
                (2, TrailerDescriptor::new("https://c/second.mp4", "Rotten Tomatoes")),
            ],
        );
        assert_eq!(result.links.len(), 2);
        assert_eq!(result.links[1].descriptor.url, "https://c/first.mp4");
    }

    #[test]
    fn empty_result_has_no_preferred_link() {
        let result = ResolutionResult::from_ranked("tt0000001".into(), Vec::new());
        assert!(result.links.is_empty());
        assert!(result.preferred().is_none());
    }

    #[test]
    fn label_includes_quality_and_star() {
        let link = RankedLink {
            priority: 0,
            preferred: true,
            descriptor: TrailerDescriptor::new("https://a/x.m3u8", "Apple TV").with_quality("4K"),
        };
        assert_eq!(link.label(), "★ Apple TV (4K)");

        let plain = RankedLink {
            priority: 4,
            preferred: false,
            descriptor: TrailerDescriptor::new("https://e/x.mp4", "IMDb"),
        };
        assert_eq!(plain.label(), "IMDb");
    }

    #[test]
    fn hls_detection() {
        assert!(TrailerDescriptor::new("https://a/master.m3u8?x=1", "Apple TV").is_hls());
        assert!(!TrailerDescriptor::new("https://e/clip.mp4", "IMDb").is_hls());
    }
}
