use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::blog::{self, FetchOutcome};
use crate::models::{Post, RosterEntry, StudentRecord, Verdict};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckConfig {
    pub max_days: i64,
    pub min_post_words: usize,
    /// Catches placeholder names such as "TBD".
    pub min_project_name_len: usize,
    pub check_project_name: bool,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            max_days: 7,
            min_post_words: 30,
            min_project_name_len: 4,
            check_project_name: true,
        }
    }
}

pub fn check_project_name(name: &str, config: &CheckConfig) -> Verdict {
    if name.trim().is_empty() {
        Verdict::danger("No project name specified")
    } else if name.chars().count() < config.min_project_name_len {
        Verdict::warning(format!("Project Name: {name} (suspiciously short)"))
    } else {
        Verdict::ok(format!("Project Name: {name}"))
    }
}

pub fn check_total_posts(count: usize) -> Verdict {
    match count {
        0 => Verdict::danger("No posts"),
        1 => Verdict::warning("One post, only"),
        n => Verdict::ok(format!("{n} posts")),
    }
}

pub fn check_last_post_date(
    last_post_date: Option<NaiveDate>,
    today: NaiveDate,
    config: &CheckConfig,
) -> Verdict {
    let Some(published) = last_post_date else {
        return Verdict::danger("No posts");
    };

    let days = (today - published).num_days();
    let message = format!("Last Post {} day{} ago", days, if days == 1 { "" } else { "s" });

    if days > config.max_days {
        Verdict::warning(message)
    } else {
        Verdict::ok(message)
    }
}

/// Looks at the final post of the fetched page. The API lists newest first,
/// so this is the oldest post on the page rather than the latest one.
pub fn check_last_post_length(posts: &[Post], config: &CheckConfig) -> Verdict {
    let Some(post) = posts.last() else {
        return Verdict::warning("no last post");
    };

    match word_count(&post.content) {
        0 => Verdict::warning("0 words in last post"),
        n if n < config.min_post_words => Verdict::warning(format!(
            "last post shorter than {} words",
            config.min_post_words
        )),
        _ => Verdict::ok("last post OK"),
    }
}

fn tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"<.*?>").expect("valid tag pattern"))
}

pub fn strip_html(html: &str) -> String {
    tag_pattern().replace_all(html, "").into_owned()
}

pub fn word_count(html: &str) -> usize {
    strip_html(html).split_whitespace().count()
}

pub fn evaluate(
    entry: RosterEntry,
    outcome: FetchOutcome,
    api_url: String,
    today: NaiveDate,
    config: &CheckConfig,
) -> StudentRecord {
    let project_name = if config.check_project_name {
        check_project_name(&entry.project_name, config)
    } else {
        Verdict::none()
    };

    let mut record = StudentRecord {
        blog_url: blog::public_blog_url(&entry.blog_url),
        api_url,
        status: None,
        failure_body: None,
        posts: Vec::new(),
        fetch: Verdict::none(),
        project_name,
        total_posts: Verdict::none(),
        last_post: Verdict::none(),
        last_post_length: Verdict::none(),
        entry,
    };

    match outcome {
        FetchOutcome::Unreachable(error) => {
            record.fetch = Verdict::danger(format!("Could not reach blog: {error}"));
        }
        FetchOutcome::Response { status, body } if status != 200 => {
            record.status = Some(status);
            record.fetch = Verdict::danger(format!(
                "{status} error code when fetching blogs: {body}"
            ));
            record.failure_body = Some(body);
        }
        FetchOutcome::Response { status, body } => {
            record.status = Some(status);
            match blog::parse_posts(&body) {
                Ok(posts) => {
                    record.posts = posts;
                    record.fetch = Verdict::ok("Fetched blogs successfully");
                    record.last_post =
                        check_last_post_date(record.last_post_date(), today, config);
                    record.last_post_length = check_last_post_length(&record.posts, config);
                    record.total_posts = check_total_posts(record.post_count());
                }
                Err(err) => {
                    tracing::warn!(api_url = %record.api_url, error = %err, "unreadable blog payload");
                    record.fetch = Verdict::danger(format!("Could not read blog posts: {err:#}"));
                    record.failure_body = Some(body);
                }
            }
        }
    }

    record
}
