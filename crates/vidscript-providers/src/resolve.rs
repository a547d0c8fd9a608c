//! resolve-video adapters

use crate::http::HttpEndpoint;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};
use url::Url;
use vidscript_core::{Error, Provider, ResolveRequest, ResolvedVideo};

const SHORT_LINK_HOST: &str = "v.douyin.com";
const CDN_HOST: &str = "v26-web.douyinvod.com";

fn parse_video_url(raw: &str) -> Result<Url, Error> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::validation("Video URL is empty", Some("url"), Some(raw.into())));
    }
    let url = Url::parse(trimmed).map_err(|e| {
        Error::validation(format!("Invalid video URL: {}", e), Some("url"), Some(raw.into()))
    })?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(Error::validation(
            "Video URL must be an http(s) URL with a host",
            Some("url"),
            Some(raw.into()),
        ));
    }
    Ok(url)
}

/// Rewrites known short-link hosts to their CDN host without any I/O
#[derive(Debug, Clone)]
pub struct LocalParser {
    name: String,
}

impl LocalParser {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for LocalParser {
    fn default() -> Self {
        Self::new("LocalParser")
    }
}

#[async_trait]
impl Provider<ResolveRequest, ResolvedVideo> for LocalParser {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, input: &ResolveRequest) -> anyhow::Result<ResolvedVideo> {
        let mut url = parse_video_url(&input.url)?;
        if url.host_str() != Some(SHORT_LINK_HOST) {
            return Err(Error::parse(
                "video link",
                Some("local parser only understands short links"),
            )
            .with_context("host", url.host_str().unwrap_or_default())
            .into());
        }

        url.set_host(Some(CDN_HOST))?;
        info!(provider = %self.name, "Rewrote short link to CDN host");
        Ok(ResolvedVideo { url: url.into() })
    }
}

/// Last resort: hands the input URL back unchanged once it is a valid URL
#[derive(Debug, Clone)]
pub struct DirectUrl {
    name: String,
}

impl DirectUrl {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for DirectUrl {
    fn default() -> Self {
        Self::new("DirectUrl")
    }
}

#[async_trait]
impl Provider<ResolveRequest, ResolvedVideo> for DirectUrl {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, input: &ResolveRequest) -> anyhow::Result<ResolvedVideo> {
        let url = parse_video_url(&input.url)?;
        warn!(provider = %self.name, "Using the original URL as a last attempt");
        Ok(ResolvedVideo { url: url.into() })
    }
}

#[derive(Debug, Deserialize)]
struct ResolveBody {
    url: Option<String>,
    data: Option<ResolveData>,
}

#[derive(Debug, Deserialize)]
struct ResolveData {
    url: Option<String>,
}

/// Generic resolver service: `POST {"url"}` → `{"url"}` or `{"data":{"url"}}`
#[derive(Debug, Clone)]
pub struct HttpResolver {
    name: String,
    endpoint: HttpEndpoint,
}

impl HttpResolver {
    pub fn new(name: impl Into<String>, endpoint: HttpEndpoint) -> Self {
        Self {
            name: name.into(),
            endpoint,
        }
    }
}

#[async_trait]
impl Provider<ResolveRequest, ResolvedVideo> for HttpResolver {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, input: &ResolveRequest) -> anyhow::Result<ResolvedVideo> {
        parse_video_url(&input.url)?;
        let body: ResolveBody = self.endpoint.post_json(&json!({ "url": input.url })).await?;

        let url = body
            .url
            .or_else(|| body.data.and_then(|data| data.url))
            .filter(|url| !url.is_empty())
            .ok_or_else(|| {
                Error::video_processing("resolve", "resolver returned no playable URL")
                    .with_context("service", self.endpoint.service())
            })?;
        Ok(ResolvedVideo { url })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vidscript_core::ErrorHandler;

    fn request(url: &str) -> ResolveRequest {
        ResolveRequest::new(url)
    }

    #[tokio::test]
    async fn test_local_parser_rewrites_short_links() {
        let resolved = LocalParser::default()
            .invoke(&request("https://v.douyin.com/iRNBho6/"))
            .await
            .unwrap();
        assert_eq!(resolved.url, "https://v26-web.douyinvod.com/iRNBho6/");
    }

    #[tokio::test]
    async fn test_local_parser_rejects_other_hosts() {
        let err = LocalParser::default()
            .invoke(&request("https://www.example.com/video/1"))
            .await
            .unwrap_err();
        assert_eq!(ErrorHandler::code(&*err), "PARSE_ERROR");
        assert!(!ErrorHandler::is_retryable(&*err));
    }

    #[tokio::test]
    async fn test_direct_url_validates() {
        let direct = DirectUrl::default();
        let resolved = direct.invoke(&request(" https://www.example.com/v/1 ")).await.unwrap();
        assert_eq!(resolved.url, "https://www.example.com/v/1");

        for bad in ["", "not a url", "ftp://example.com/a"] {
            let err = direct.invoke(&request(bad)).await.unwrap_err();
            assert_eq!(ErrorHandler::code(&*err), "VALIDATION_ERROR", "{:?}", bad);
        }
    }
}
