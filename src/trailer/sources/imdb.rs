//! IMDb trailers, the last-resort source.
//!
//! The title page links a video page (`/video/vi…`), whose embedded JSON holds
//! a direct MP4 URL with JSON-escaped ampersands.

use async_trait::async_trait;
use regex::Regex;

use super::BROWSER_USER_AGENT;
use crate::fetch::BoundedFetch;
use crate::trailer::{Resolution, SourceError, SourceKind, TrailerDescriptor, TrailerSource};

pub struct ImdbSource {
    fetch: BoundedFetch,
    base_url: String,
    video_id_pattern: Regex,
    media_url_pattern: Regex,
}

impl ImdbSource {
    pub fn new(fetch: BoundedFetch, base_url: impl Into<String>) -> Self {
        Self {
            fetch,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            video_id_pattern: Regex::new(r"/video/(vi\d+)").expect("static video id pattern"),
            media_url_pattern: Regex::new(
                r#""url":"(https://imdb-video\.media-imdb\.com[^"]+\.mp4[^"]*)""#,
            )
            .expect("static media url pattern"),
        }
    }

    async fn page(&self, url: String) -> Result<String, SourceError> {
        let request = self
            .fetch
            .get(url)
            .header("User-Agent", BROWSER_USER_AGENT)
            .header("Accept-Language", "en-US,en");
        Ok(self.fetch.text(request).await?)
    }

    async fn lookup(&self, id: &str) -> Result<TrailerDescriptor, SourceError> {
        let title_page = self.page(format!("{}/title/{}/", self.base_url, id)).await?;
        let video_id = self
            .video_id_pattern
            .captures(&title_page)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or(SourceError::Pattern("video id"))?;

        let video_page = self
            .page(format!("{}/video/{}/", self.base_url, video_id))
            .await?;
        let url = self
            .media_url_pattern
            .captures(&video_page)
            .and_then(|c| c.get(1))
            .map(|m| unescape_ampersands(m.as_str()))
            .ok_or(SourceError::Pattern("mp4 url"))?;

        Ok(TrailerDescriptor::new(url, SourceKind::Imdb.provider_name()).with_quality("1080p"))
    }
}

fn unescape_ampersands(url: &str) -> String {
    url.replace("\\u0026", "&").replace("&amp;", "&")
}

#[async_trait]
impl TrailerSource for ImdbSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Imdb
    }

    async fn resolve(&self, id: &str) -> Resolution {
        Resolution::from_lookup(self.kind(), id, self.lookup(id).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{headers, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn source(server: &MockServer) -> ImdbSource {
        let fetch = BoundedFetch::new("test", Duration::from_secs(2)).unwrap();
        ImdbSource::new(fetch, server.uri())
    }

    #[test]
    fn unescapes_json_and_html_ampersands() {
        assert_eq!(
            unescape_ampersands(r"https://x/a.mp4?Expires=1\u0026Signature=2&amp;Key=3"),
            "https://x/a.mp4?Expires=1&Signature=2&Key=3"
        );
    }

    #[tokio::test]
    async fn follows_video_page_to_mp4() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/title/tt0111161/"))
            .and(headers("Accept-Language", vec!["en-US", "en"]))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<a href="/video/vi3877612057/?ref_=tt_vi_i_1">Trailer</a>"#,
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/video/vi3877612057/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"playbackURLs":[{"url":"https://imdb-video.media-imdb.com/vi3877612057/1434659607842-pgv4ql-1616202333253.mp4?Expires=1700000000\u0026Signature=abc"}]}"#,
            ))
            .mount(&server)
            .await;

        let descriptor = source(&server).resolve("tt0111161").await.found().unwrap();
        assert_eq!(
            descriptor.url,
            "https://imdb-video.media-imdb.com/vi3877612057/1434659607842-pgv4ql-1616202333253.mp4?Expires=1700000000&Signature=abc"
        );
        assert_eq!(descriptor.provider, "IMDb");
    }

    #[tokio::test]
    async fn title_without_video_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/title/tt0000002/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>no video</html>"))
            .mount(&server)
            .await;

        assert_eq!(source(&server).resolve("tt0000002").await, Resolution::NotFound);
    }

    #[tokio::test]
    async fn upstream_error_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        assert_eq!(source(&server).resolve("tt0111161").await, Resolution::NotFound);
    }
}
