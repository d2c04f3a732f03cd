//! Shared test harness for integration tests.
//!
//! [`TestHarness`] starts a [`MockServer`] standing in for every upstream
//! trailer source, points the configuration at it and serves the addon on a
//! random port. The [`upstream`] module mounts canned responses per source.

#![allow(dead_code)]

use std::net::SocketAddr;

use trailerio::config::{Config, EndpointsConfig};
use trailerio::server::{create_router, AppContext};
use wiremock::MockServer;

pub struct TestHarness {
    pub ctx: AppContext,
    pub addr: SocketAddr,
    pub upstream: MockServer,
    client: reqwest::Client,
}

impl TestHarness {
    /// Start with default configuration aimed at a fresh mock upstream.
    pub async fn start() -> Self {
        Self::start_with(|_| {}).await
    }

    /// Start with a configuration tweaked by `configure` after the endpoints
    /// have been pointed at the mock upstream.
    pub async fn start_with(configure: impl FnOnce(&mut Config)) -> Self {
        let upstream = MockServer::start().await;

        let mut config = Config::default();
        config.fetch.timeout_ms = 2_000;
        config.sources.endpoints = EndpointsConfig::all_at(&upstream.uri());
        configure(&mut config);

        let ctx = AppContext::from_config(config).expect("failed to build context");
        let app = create_router(ctx.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Self {
            ctx,
            addr,
            upstream,
            client: reqwest::Client::new(),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("request failed")
    }

    /// GET `path` and decode the JSON body.
    pub async fn get_json(&self, path: &str) -> serde_json::Value {
        self.get(path).await.json().await.expect("invalid JSON body")
    }

    pub async fn options(&self, path: &str) -> reqwest::Response {
        self.client
            .request(reqwest::Method::OPTIONS, self.url(path))
            .send()
            .await
            .expect("request failed")
    }
}

/// Canned upstream responses, one helper per source.
pub mod upstream {
    use std::time::Duration;

    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    /// Matches SPARQL requests whose query text contains `needle`.
    fn sparql_mentions(needle: &'static str) -> impl Fn(&Request) -> bool + Send + Sync {
        move |req: &Request| {
            req.url.path() == "/sparql"
                && req
                    .url
                    .query_pairs()
                    .any(|(k, v)| k == "query" && v.contains(needle))
        }
    }

    fn bindings(var: &str, value: &str) -> serde_json::Value {
        json!({ "results": { "bindings": [{ var: { "value": value } }] } })
    }

    pub const APPLE_TV_URL: &str = "https://play-edge.itunes.apple.com/WebObjects/hls/master.m3u8?cc=US";
    pub const PLEX_URL: &str = "https://vid.plex.tv/trailer.mp4";
    pub const RT_URL: &str = "https://cdn.rt.example/trailer_1080.mp4";
    pub const DD_URL: &str = "https://dd.example/720.mp4";
    pub const IMDB_URL: &str = "https://imdb-video.media-imdb.com/vi123/clip.mp4?Expires=1&Signature=x";

    pub async fn title(server: &MockServer, label: &str) {
        Mock::given(sparql_mentions("rdfs:label"))
            .respond_with(ResponseTemplate::new(200).set_body_json(bindings("label", label)))
            .mount(server)
            .await;
    }

    pub async fn apple_tv(server: &MockServer) {
        apple_tv_with_delay(server, Duration::ZERO).await;
    }

    /// Apple TV whose movie page takes `delay` to answer.
    pub async fn apple_tv_with_delay(server: &MockServer, delay: Duration) {
        Mock::given(sparql_mentions("P9586"))
            .respond_with(ResponseTemplate::new(200).set_body_json(bindings("id", "umc.cmc.test")))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/us/movie/umc.cmc.test"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(format!(r#"<script>{{"hlsUrl":"{APPLE_TV_URL}"}}</script>"#))
                    .set_delay(delay),
            )
            .mount(server)
            .await;
    }

    /// Plex, with the token endpoint expected to be hit `auth_calls` times.
    pub async fn plex(server: &MockServer, id: &str, auth_calls: u64) {
        Mock::given(method("POST"))
            .and(path("/api/v2/users/anonymous"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "authToken": "tok" })))
            .expect(auth_calls)
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/library/metadata/matches"))
            .and(query_param("guid", format!("imdb://{id}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "MediaContainer": { "Metadata": [{ "ratingKey": "rk1" }] }
            })))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/library/metadata/rk1/extras"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "MediaContainer": { "Metadata": [
                    { "subtype": "trailer", "Media": [{ "url": PLEX_URL }] }
                ]}
            })))
            .mount(server)
            .await;
    }

    pub async fn rotten_tomatoes(server: &MockServer) {
        Mock::given(sparql_mentions("P1258"))
            .respond_with(ResponseTemplate::new(200).set_body_json(bindings("id", "m/test_movie")))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/m/test_movie/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!(
                r#"<div data-video="{}/s/acct/clip?formats=M3U"></div>"#,
                server.uri()
            )))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/s/acct/clip"))
            .and(query_param("format", "SMIL"))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!(
                r#"<smil><body><switch><video src="{RT_URL}" height="1080"/></switch></body></smil>"#
            )))
            .mount(server)
            .await;
    }

    pub async fn digital_digest(server: &MockServer, id: &str) {
        Mock::given(method("GET"))
            .and(path("/api/v1/search/videos"))
            .and(query_param("search", id))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "data": [{ "uuid": "dd-1" }] })),
            )
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/videos/dd-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "files": [{ "resolution": { "id": 720, "label": "720p" }, "fileUrl": DD_URL }]
            })))
            .mount(server)
            .await;
    }

    pub async fn imdb(server: &MockServer, id: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/title/{id}/")))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(r#"<a href="/video/vi123/">Trailer</a>"#),
            )
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/video/vi123/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"url":"https://imdb-video.media-imdb.com/vi123/clip.mp4?Expires=1&Signature=x"}"#,
            ))
            .mount(server)
            .await;
    }

    /// IMDb title page without any video, expected `calls` times.
    pub async fn imdb_without_video(server: &MockServer, id: &str, calls: u64) {
        Mock::given(method("GET"))
            .and(path(format!("/title/{id}/")))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>no video</html>"))
            .expect(calls)
            .mount(server)
            .await;
    }

    /// Every source answers for `id`.
    pub async fn all(server: &MockServer, id: &str) {
        apple_tv(server).await;
        plex(server, id, 1).await;
        rotten_tomatoes(server).await;
        digital_digest(server, id).await;
        imdb(server, id).await;
    }
}
