//! Resolution orchestrator.
//!
//! [`TrailerResolver`] checks the result cache, and on a miss polls every
//! configured source concurrently within the calling task, together with the
//! optional title lookup. All outcomes are awaited (no short-circuiting) so
//! the final order depends only on source priority, never on completion
//! order. Non-empty results are cached; empty ones are not, so the next
//! request retries every source.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use tracing::{debug, info};

use super::sources::build_sources;
use super::title::{TitleLookup, WikidataTitle};
use super::wikidata::Wikidata;
use super::{Resolution, ResolutionResult, SourceKind, TrailerDescriptor, TrailerSource};
use crate::cache::ResultCache;
use crate::config::Config;
use crate::fetch::{BoundedFetch, FetchError};

// ---------------------------------------------------------------------------
// Outcome counters
// ---------------------------------------------------------------------------

/// Per-source outcome counters.
#[derive(Debug, Default)]
pub struct SourceStats {
    invocations: AtomicU64,
    found: AtomicU64,
    not_found: AtomicU64,
}

impl SourceStats {
    pub fn invocations(&self) -> u64 {
        self.invocations.load(Ordering::Relaxed)
    }

    pub fn found(&self) -> u64 {
        self.found.load(Ordering::Relaxed)
    }

    pub fn not_found(&self) -> u64 {
        self.not_found.load(Ordering::Relaxed)
    }
}

/// Side-channel counters; they never influence responses.
#[derive(Debug, Default)]
pub struct ResolverStats {
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    sources: [SourceStats; SourceKind::ALL.len()],
}

impl ResolverStats {
    pub fn cache_hits(&self) -> u64 {
        self.cache_hits.load(Ordering::Relaxed)
    }

    pub fn cache_misses(&self) -> u64 {
        self.cache_misses.load(Ordering::Relaxed)
    }

    pub fn source(&self, kind: SourceKind) -> &SourceStats {
        &self.sources[kind.priority() as usize]
    }

    fn record_outcome(&self, kind: SourceKind, resolution: &Resolution) {
        let stats = self.source(kind);
        match resolution {
            Resolution::Found(_) => stats.found.fetch_add(1, Ordering::Relaxed),
            Resolution::NotFound => stats.not_found.fetch_add(1, Ordering::Relaxed),
        };
    }
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

pub struct TrailerResolver {
    sources: Vec<Arc<dyn TrailerSource>>,
    title: Option<Arc<dyn TitleLookup>>,
    cache: ResultCache,
    stats: ResolverStats,
}

impl TrailerResolver {
    pub fn new(sources: Vec<Arc<dyn TrailerSource>>, cache: ResultCache) -> Self {
        Self {
            sources,
            title: None,
            cache,
            stats: ResolverStats::default(),
        }
    }

    pub fn with_title_lookup(mut self, lookup: Arc<dyn TitleLookup>) -> Self {
        self.title = Some(lookup);
        self
    }

    /// Build the resolver described by `config`: one shared bounded client,
    /// the enabled sources, an in-memory cache and the optional title lookup.
    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        let fetch = BoundedFetch::new(
            &config.fetch.user_agent,
            Duration::from_millis(config.fetch.timeout_ms),
        )?;
        let sources = build_sources(&config.sources, &fetch);
        let cache = ResultCache::in_memory(
            config.cache.max_entries,
            Duration::from_secs(config.cache.ttl_secs),
        );

        let resolver = Self::new(sources, cache);
        if !config.sources.title_lookup {
            return Ok(resolver);
        }

        let wikidata = Wikidata::new(fetch, config.sources.endpoints.wikidata.clone());
        Ok(resolver.with_title_lookup(Arc::new(WikidataTitle::new(wikidata))))
    }

    pub fn stats(&self) -> &ResolverStats {
        &self.stats
    }

    pub fn cache_ttl(&self) -> Duration {
        self.cache.ttl()
    }

    pub fn source_kinds(&self) -> Vec<SourceKind> {
        self.sources.iter().map(|s| s.kind()).collect()
    }

    /// Resolve every trailer for `id`, ranked by source priority.
    ///
    /// Always returns a result; `links` is empty when no source succeeded.
    pub async fn resolve_all(&self, id: &str) -> ResolutionResult {
        let id = id.trim();
        if let Some(cached) = self.cache.load(id).await {
            self.stats.cache_hits.fetch_add(1, Ordering::Relaxed);
            debug!(id, links = cached.links.len(), "cache hit");
            return cached;
        }
        self.stats.cache_misses.fetch_add(1, Ordering::Relaxed);

        let started = Instant::now();
        let lookups = self.sources.iter().map(|source| self.resolve_one(source.as_ref(), id));
        let title_lookup = async {
            match &self.title {
                Some(lookup) => lookup.title(id).await,
                None => None,
            }
        };
        let (outcomes, title) = tokio::join!(join_all(lookups), title_lookup);

        let found: Vec<(u8, TrailerDescriptor)> = outcomes
            .into_iter()
            .filter_map(|(kind, resolution)| resolution.found().map(|d| (kind.priority(), d)))
            .collect();
        let result = ResolutionResult::from_ranked(title.unwrap_or_else(|| id.to_string()), found);

        info!(
            id,
            links = result.links.len(),
            preferred = result.preferred().map(|l| l.descriptor.provider.as_str()),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "resolved trailers"
        );

        if !result.links.is_empty() {
            self.cache.store(id, &result).await;
        }
        result
    }

    async fn resolve_one(&self, source: &dyn TrailerSource, id: &str) -> (SourceKind, Resolution) {
        let kind = source.kind();
        self.stats
            .source(kind)
            .invocations
            .fetch_add(1, Ordering::Relaxed);
        let resolution = source.resolve(id).await;
        self.stats.record_outcome(kind, &resolution);
        (kind, resolution)
    }
}
