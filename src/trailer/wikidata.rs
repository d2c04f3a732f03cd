//! Wikidata SPARQL lookups keyed by IMDb identifier (property `P345`).

use std::collections::HashMap;

use serde::Deserialize;
use tracing::debug;

use super::SourceError;
use crate::fetch::BoundedFetch;

/// Apple TV movie identifier.
pub const PROP_APPLE_TV_MOVIE: &str = "P9586";
/// Rotten Tomatoes identifier (e.g. `m/the_shawshank_redemption`).
pub const PROP_ROTTEN_TOMATOES: &str = "P1258";

#[derive(Debug, Deserialize)]
struct SparqlResponse {
    #[serde(default)]
    results: SparqlResults,
}

#[derive(Debug, Default, Deserialize)]
struct SparqlResults {
    #[serde(default)]
    bindings: Vec<HashMap<String, SparqlValue>>,
}

#[derive(Debug, Deserialize)]
struct SparqlValue {
    value: String,
}

#[derive(Debug, Clone)]
pub struct Wikidata {
    fetch: BoundedFetch,
    endpoint: String,
}

impl Wikidata {
    pub fn new(fetch: BoundedFetch, endpoint: impl Into<String>) -> Self {
        Self {
            fetch,
            endpoint: endpoint.into(),
        }
    }

    /// Value of `property` on the item whose IMDb ID is `imdb_id`.
    pub async fn cross_reference(
        &self,
        imdb_id: &str,
        property: &str,
    ) -> Result<String, SourceError> {
        let sparql = format!(
            "SELECT ?id WHERE {{ ?item wdt:P345 \"{}\" . ?item wdt:{property} ?id . }}",
            escape_literal(imdb_id)
        );
        self.first_value(&sparql, "id")
            .await?
            .ok_or(SourceError::Missing("wikidata cross reference"))
    }

    /// English label of the item whose IMDb ID is `imdb_id`.
    pub async fn english_label(&self, imdb_id: &str) -> Result<String, SourceError> {
        let sparql = format!(
            "SELECT ?label WHERE {{ ?item wdt:P345 \"{}\" . ?item rdfs:label ?label . \
             FILTER(LANG(?label) = \"en\") }} LIMIT 1",
            escape_literal(imdb_id)
        );
        self.first_value(&sparql, "label")
            .await?
            .ok_or(SourceError::Missing("wikidata label"))
    }

    async fn first_value(&self, sparql: &str, var: &str) -> Result<Option<String>, SourceError> {
        debug!(endpoint = %self.endpoint, var, "wikidata query");
        let request = self
            .fetch
            .get(&self.endpoint)
            .query(&[("format", "json"), ("query", sparql)])
            .header("Accept", "application/sparql-results+json");

        let body: SparqlResponse = self.fetch.json(request).await?;
        Ok(body
            .results
            .bindings
            .into_iter()
            .next()
            .and_then(|mut row| row.remove(var))
            .map(|v| v.value)
            .filter(|v| !v.is_empty()))
    }
}

/// Escape a value for use inside a double-quoted SPARQL string literal.
fn escape_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out
}
