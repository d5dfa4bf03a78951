use chrono::NaiveDate;

#[derive(Debug, Clone)]
pub struct RosterEntry {
    pub student_number: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub project_name: String,
    pub blog_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub title: String,
    pub published: NaiveDate,
    pub content: String,
}

/// Ordered by ascending concern; `None` marks a check that did not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    None,
    Ok,
    Warning,
    Danger,
}

impl Severity {
    pub fn css_class(self) -> &'static str {
        match self {
            Severity::None => "invisible",
            Severity::Ok => "alert alert-success",
            Severity::Warning => "alert alert-warning",
            Severity::Danger => "alert alert-danger",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub severity: Severity,
    pub message: String,
}

impl Verdict {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Ok,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Danger,
            message: message.into(),
        }
    }

    pub fn none() -> Self {
        Self {
            severity: Severity::None,
            message: String::new(),
        }
    }

    pub fn is_concern(&self) -> bool {
        matches!(self.severity, Severity::Warning | Severity::Danger)
    }

    pub fn css_class(&self) -> &'static str {
        self.severity.css_class()
    }
}

#[derive(Debug, Clone)]
pub struct StudentRecord {
    pub entry: RosterEntry,
    pub blog_url: String,
    pub api_url: String,
    /// `None` when the request never produced a response.
    pub status: Option<u16>,
    pub failure_body: Option<String>,
    pub posts: Vec<Post>,
    pub fetch: Verdict,
    pub project_name: Verdict,
    pub total_posts: Verdict,
    pub last_post: Verdict,
    pub last_post_length: Verdict,
}

impl StudentRecord {
    pub fn post_count(&self) -> usize {
        self.posts.len()
    }

    pub fn most_recent_post(&self) -> Option<&Post> {
        self.posts.iter().max_by_key(|post| post.published)
    }

    pub fn last_post_date(&self) -> Option<NaiveDate> {
        self.most_recent_post().map(|post| post.published)
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.entry.first_name, self.entry.last_name)
    }

    pub fn verdicts(&self) -> [&Verdict; 5] {
        [
            &self.fetch,
            &self.project_name,
            &self.total_posts,
            &self.last_post,
            &self.last_post_length,
        ]
    }
}
