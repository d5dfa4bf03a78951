use std::sync::OnceLock;

use anyhow::Context;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde::Deserialize;

use crate::models::Post;

pub const DEFAULT_API_BASE: &str = "https://public-api.wordpress.com/wp/v2/sites";
pub const POSTS_PER_PAGE: u32 = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Response { status: u16, body: String },
    Unreachable(String),
}

pub struct BlogClient {
    client: reqwest::Client,
    api_base: String,
}

impl BlogClient {
    pub fn new(api_base: impl Into<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("blog-health-check/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn api_url(&self, blog_url: &str) -> String {
        api_url(&self.api_base, blog_url)
    }

    #[tracing::instrument(skip(self), name = "BlogClient::fetch")]
    pub async fn fetch(&self, api_url: &str) -> FetchOutcome {
        let response = match self.client.get(api_url).send().await {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(error = %err, "request failed");
                return FetchOutcome::Unreachable(err.to_string());
            }
        };

        let status = response.status().as_u16();
        tracing::debug!(status, "received response");

        match response.text().await {
            Ok(body) => FetchOutcome::Response { status, body },
            Err(err) => {
                tracing::warn!(error = %err, status, "failed to read response body");
                FetchOutcome::Unreachable(format!("{status} response body could not be read: {err}"))
            }
        }
    }
}

fn protocol_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"https?://").expect("valid protocol pattern"))
}

pub fn strip_protocol(url: &str) -> String {
    protocol_pattern().replace_all(url, "").into_owned()
}

/// Everything up to the first `.com`, or the whole host path with slashes trimmed.
pub fn domain_only(url: &str) -> &str {
    match url.find(".com") {
        Some(index) => &url[..index + ".com".len()],
        None => url.trim_matches('/'),
    }
}

pub fn public_blog_url(raw: &str) -> String {
    format!("https://{}", strip_protocol(raw))
}

pub fn api_url(api_base: &str, blog_url: &str) -> String {
    let host = strip_protocol(blog_url);
    format!(
        "{}/{}/posts?per_page={}&orderby=date&order=desc",
        api_base,
        domain_only(&host),
        POSTS_PER_PAGE
    )
}

#[derive(Deserialize)]
struct ApiPost {
    date: String,
    title: Rendered,
    content: Rendered,
}

#[derive(Deserialize)]
struct Rendered {
    rendered: String,
}

pub fn parse_posts(body: &str) -> anyhow::Result<Vec<Post>> {
    let items: Vec<ApiPost> =
        serde_json::from_str(body).context("response is not a list of posts")?;

    let mut posts = Vec::with_capacity(items.len());
    for item in items {
        posts.push(Post {
            published: parse_post_date(&item.date)?,
            title: item.title.rendered,
            content: item.content.rendered,
        });
    }

    Ok(posts)
}

/// Calendar date of a post timestamp; any UTC offset is dropped, not applied.
pub fn parse_post_date(raw: &str) -> anyhow::Result<NaiveDate> {
    let raw = raw.trim();

    if let Ok(stamp) = DateTime::parse_from_rfc3339(raw) {
        return Ok(stamp.naive_local().date());
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(stamp) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(stamp.date());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("unrecognised post date {raw:?}"))
}
