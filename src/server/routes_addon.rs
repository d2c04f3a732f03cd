//! Addon protocol endpoints: manifest, health and trailer metadata.

use crate::error::{Error, Result};
use crate::server::AppContext;
use crate::trailer::{RankedLink, ResolutionResult};
use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::json;

pub const ADDON_ID: &str = "io.trailerio.lite";
pub const ADDON_NAME: &str = "Trailerio Lite";

const SUPPORTED_TYPES: [&str; 2] = ["movie", "series"];

pub fn addon_routes() -> Router<AppContext> {
    Router::new()
        .route("/manifest.json", get(manifest))
        .route("/health", get(health))
        .route("/meta/:type/:id", get(meta))
}

async fn manifest() -> impl IntoResponse {
    Json(json!({
        "id": ADDON_ID,
        "version": env!("CARGO_PKG_VERSION"),
        "name": ADDON_NAME,
        "description": "Trailer addon - Apple TV, Plex, RT, Digital Digest, IMDb",
        "logo": "https://raw.githubusercontent.com/9mousaa/trailerio-lite/main/icon.png",
        "resources": ["meta"],
        "types": SUPPORTED_TYPES,
        "idPrefixes": ["tt"],
        "catalogs": [],
    }))
}

async fn health(State(ctx): State<AppContext>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "edge": ctx.config.server.edge,
    }))
}

#[derive(Debug, Serialize)]
struct MetaResponse {
    meta: Meta,
}

#[derive(Debug, Serialize)]
struct Meta {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    name: String,
    links: Vec<MetaLink>,
}

#[derive(Debug, Serialize)]
struct MetaLink {
    trailers: String,
    provider: String,
}

impl From<&RankedLink> for MetaLink {
    fn from(link: &RankedLink) -> Self {
        Self {
            trailers: link.descriptor.url.clone(),
            provider: link.label(),
        }
    }
}

impl MetaResponse {
    fn new(id: String, kind: String, result: &ResolutionResult) -> Self {
        Self {
            meta: Meta {
                id,
                kind,
                name: result.title.clone(),
                links: result.links.iter().map(MetaLink::from).collect(),
            },
        }
    }
}

/// Extract the bare identifier from a `<id>[:<suffix>].json` path segment.
fn parse_meta_id(segment: &str) -> Result<String> {
    let raw = segment.strip_suffix(".json").ok_or(Error::NotFound)?;
    let id = raw.split(':').next().unwrap_or_default().trim();
    if id.is_empty() {
        return Err(Error::invalid_input("identifier must not be empty"));
    }
    Ok(id.to_string())
}

async fn meta(
    State(ctx): State<AppContext>,
    Path((kind, segment)): Path<(String, String)>,
) -> Result<impl IntoResponse> {
    if !SUPPORTED_TYPES.contains(&kind.as_str()) {
        return Err(Error::NotFound);
    }
    let id = parse_meta_id(&segment)?;

    let result = ctx.resolver.resolve_all(&id).await;
    let cache_control = format!("max-age={}", ctx.resolver.cache_ttl().as_secs());

    Ok((
        [(header::CACHE_CONTROL, cache_control)],
        Json(MetaResponse::new(id, kind, &result)),
    ))
}
