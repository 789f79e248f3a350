//! DuckDuckGo HTML search
//!
//! Scrapes the no-JavaScript results page. Result anchors point at a
//! DuckDuckGo redirect whose `uddg` query parameter carries the target URL.

use super::SearchError;
use regex::Regex;
use reqwest::{Client, Url};
use std::collections::HashSet;
use std::sync::LazyLock;
use std::time::Duration;

const SEARCH_URL: &str = "https://html.duckduckgo.com/html/";
const USER_AGENT: &str = concat!("llm-copilot/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

static ANCHOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<a\s([^>]*)>").expect("anchor pattern is valid"));
static CLASS_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"class="([^"]*)""#).expect("class pattern is valid"));
static HREF_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"href="([^"]*)""#).expect("href pattern is valid"));

#[derive(Clone)]
pub struct DuckDuckGoSearch {
    client: Client,
    endpoint: String,
}

impl DuckDuckGoSearch {
    pub fn new() -> Result<Self, SearchError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SearchError::Request(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: SEARCH_URL.to_string(),
        })
    }

    /// Fetch up to `limit` result links for `query`
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>, SearchError> {
        if limit == 0 || query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let url = Url::parse_with_params(&self.endpoint, &[("q", query.trim())])
            .map_err(|e| SearchError::Request(e.to_string()))?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SearchError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| SearchError::Request(e.to_string()))?;

        let links = extract_result_links(&body, limit);
        tracing::debug!(query = %query, found = links.len(), "Web search completed");
        Ok(links)
    }
}

/// Pull result targets out of a results page, in page order, deduplicated
pub fn extract_result_links(html: &str, limit: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for anchor in ANCHOR.captures_iter(html) {
        if links.len() >= limit {
            break;
        }
        let attrs = &anchor[1];
        let is_result = CLASS_ATTR
            .captures(attrs)
            .is_some_and(|c| c[1].split_whitespace().any(|class| class == "result__a"));
        if !is_result {
            continue;
        }
        let Some(href) = HREF_ATTR.captures(attrs) else {
            continue;
        };
        if let Some(link) = decode_result_link(&href[1]) {
            if seen.insert(link.clone()) {
                links.push(link);
            }
        }
    }

    links
}

/// Resolve a result href to its absolute http(s) target. Ad redirects and
/// anything that does not resolve yield `None`.
fn decode_result_link(raw: &str) -> Option<String> {
    let href = raw.replace("&amp;", "&");
    let absolute = if href.starts_with("//") {
        format!("https:{href}")
    } else if href.starts_with('/') {
        format!("https://duckduckgo.com{href}")
    } else {
        href
    };

    let url = Url::parse(&absolute).ok()?;
    let target = if url.host_str().is_some_and(|h| h.ends_with("duckduckgo.com")) {
        if url.path().starts_with("/y.js") {
            return None;
        }
        url.query_pairs()
            .find(|(key, _)| key == "uddg")
            .map(|(_, value)| value.into_owned())?
    } else {
        absolute
    };

    let parsed = Url::parse(&target).ok()?;
    if parsed.host_str().is_some_and(|h| h.ends_with("duckduckgo.com"))
        && parsed.path().starts_with("/y.js")
    {
        return None;
    }
    matches!(parsed.scheme(), "http" | "https").then_some(target)
}
