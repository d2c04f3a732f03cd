//! Rotten Tomatoes trailers (Fandango CDN via thePlatform links).
//!
//! Wikidata maps the IMDb ID to a Rotten Tomatoes slug. The title page either
//! embeds a thePlatform media link directly or only links to a videos page,
//! which is followed once. The media link's SMIL document lists renditions;
//! the tallest one wins, and the MPEG4 redirect form of the link is used when
//! the SMIL document is unusable.

use async_trait::async_trait;
use regex::Regex;

use crate::fetch::BoundedFetch;
use crate::trailer::wikidata::{Wikidata, PROP_ROTTEN_TOMATOES};
use crate::trailer::{Resolution, SourceError, SourceKind, TrailerDescriptor, TrailerSource};

const RT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
const FALLBACK_QUALITY: &str = "1080p";

pub struct RottenTomatoesSource {
    fetch: BoundedFetch,
    wikidata: Wikidata,
    base_url: String,
    slug_pattern: Regex,
    media_link_pattern: Regex,
    video_page_pattern: Regex,
    formats_pattern: Regex,
    video_tag_pattern: Regex,
    src_pattern: Regex,
    height_pattern: Regex,
}

impl RottenTomatoesSource {
    /// `media_host` is the thePlatform link host, normally
    /// `https://link.theplatform.com`.
    pub fn new(
        fetch: BoundedFetch,
        wikidata: Wikidata,
        base_url: impl Into<String>,
        media_host: &str,
    ) -> Self {
        let media_host = media_host.trim_end_matches('/');
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let video_page_pattern = Regex::new(&format!(
            r#"(?:{})?(/(?:m|tv)/[^"'\s<>]+/videos/[^"'\s<>]*)"#,
            regex::escape(&base_url)
        ))
        .expect("escaped video page pattern");
        Self {
            fetch,
            wikidata,
            base_url,
            slug_pattern: Regex::new(r"(?:^|/)((?:m|tv)/.+)").expect("static slug pattern"),
            media_link_pattern: Regex::new(&format!(r#"{}/s/[^"]+"#, regex::escape(media_host)))
                .expect("escaped media link pattern"),
            video_page_pattern,
            formats_pattern: Regex::new(r"formats=[^&]+").expect("static formats pattern"),
            video_tag_pattern: Regex::new(r"<video\b[^>]*>").expect("static video tag pattern"),
            src_pattern: Regex::new(r#"\bsrc="([^"]+)""#).expect("static src pattern"),
            height_pattern: Regex::new(r#"\bheight="(\d+)""#).expect("static height pattern"),
        }
    }

    async fn lookup(&self, id: &str) -> Result<TrailerDescriptor, SourceError> {
        let slug = self.wikidata.cross_reference(id, PROP_ROTTEN_TOMATOES).await?;
        let slug = self.normalize_slug(&slug);

        let html = self.page(&format!("{}/{}/", self.base_url, slug)).await?;
        let link = match self.media_link(&html) {
            Some(link) => link,
            None => {
                let video_page = self
                    .video_page(&html)
                    .ok_or(SourceError::Pattern("media link or video page"))?;
                let html = self.page(&format!("{}{}", self.base_url, video_page)).await?;
                self.media_link(&html)
                    .ok_or(SourceError::Pattern("media link on video page"))?
            }
        };

        let provider = SourceKind::RottenTomatoes.provider_name();
        match self.best_rendition(&link).await {
            Some((height, src)) => {
                Ok(TrailerDescriptor::new(src, provider).with_quality(format!("{height}p")))
            }
            None => Ok(TrailerDescriptor::new(self.redirect_url(&link), provider)
                .with_quality(FALLBACK_QUALITY)),
        }
    }

    async fn page(&self, url: &str) -> Result<String, SourceError> {
        let request = self.fetch.get(url).header("User-Agent", RT_USER_AGENT);
        Ok(self.fetch.text(request).await?)
    }

    /// Reduce a Wikidata value such as `m/heat_1995` or a full URL to its
    /// `m/…` / `tv/…` path.
    fn normalize_slug(&self, raw: &str) -> String {
        let slug = self
            .slug_pattern
            .captures(raw)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
            .unwrap_or(raw);
        slug.trim_end_matches('/').to_string()
    }

    fn media_link(&self, html: &str) -> Option<String> {
        self.media_link_pattern
            .find(html)
            .map(|m| m.as_str().replace("&amp;", "&"))
    }

    fn video_page(&self, html: &str) -> Option<String> {
        self.video_page_pattern
            .captures(html)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
    }

    /// Fetch the SMIL rendition list; `None` on any failure.
    async fn best_rendition(&self, link: &str) -> Option<(u32, String)> {
        let smil_url = append_param(&self.with_mpeg4(link), "format=SMIL");
        match self.fetch.text(self.fetch.get(&smil_url)).await {
            Ok(smil) => self.select_rendition(&smil),
            Err(e) => {
                tracing::debug!(url = %smil_url, error = %e, "SMIL document unavailable");
                None
            }
        }
    }

    /// Tallest `<video>` entry of a SMIL document.
    fn select_rendition(&self, smil: &str) -> Option<(u32, String)> {
        let mut renditions: Vec<(u32, String)> = self
            .video_tag_pattern
            .find_iter(smil)
            .filter_map(|tag| {
                let tag = tag.as_str();
                let src = self.src_pattern.captures(tag)?.get(1)?.as_str();
                let height = self
                    .height_pattern
                    .captures(tag)?
                    .get(1)?
                    .as_str()
                    .parse::<u32>()
                    .ok()?;
                Some((height, src.replace("&amp;", "&")))
            })
            .collect();

        renditions.sort_by(|a, b| b.0.cmp(&a.0));
        renditions.into_iter().next()
    }

    fn with_mpeg4(&self, link: &str) -> String {
        self.formats_pattern
            .replace(link, "formats=MPEG4")
            .into_owned()
    }

    fn redirect_url(&self, link: &str) -> String {
        append_param(&self.with_mpeg4(link), "format=redirect")
    }
}

fn append_param(url: &str, param: &str) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}{param}")
}

#[async_trait]
impl TrailerSource for RottenTomatoesSource {
    fn kind(&self) -> SourceKind {
        SourceKind::RottenTomatoes
    }

    async fn resolve(&self, id: &str) -> Resolution {
        Resolution::from_lookup(self.kind(), id, self.lookup(id).await)
    }
}
