use std::fmt::Write;

use anyhow::Context;
use askama::Template;
use chrono::{NaiveDate, NaiveDateTime};

use crate::models::{Severity, StudentRecord};

#[derive(Template)]
#[template(path = "report.html")]
struct HtmlReport<'a> {
    generated_at: String,
    records: &'a [StudentRecord],
}

pub fn render_html(records: &[StudentRecord], generated_at: NaiveDateTime) -> anyhow::Result<String> {
    HtmlReport {
        generated_at: generated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        records,
    }
    .render()
    .context("failed to render HTML report")
}

pub fn html_file_name(generated_at: NaiveDateTime) -> String {
    format!("output_{}.html", generated_at.format("%Y_%m_%d_%H_%M_%S"))
}

pub fn summary_column_header(date: NaiveDate) -> String {
    format!("Blog {}", date.format("%d/%b/%Y"))
}

/// Folds the post checks into the text written to the roster's dated column.
///
/// Only 403 overrides the text; there is no "not found" case, so a 404 leaves
/// every folded verdict neutral and reads as "Blog OK". A blog that never
/// answered, or answered 200 with an unreadable payload, reports the fetch
/// failure instead.
pub fn summarize(record: &StudentRecord) -> String {
    let mut line = String::new();

    if record.fetch.is_concern() && matches!(record.status, None | Some(200)) {
        let _ = write!(line, "{}.", record.fetch.message.trim());
    }

    if record.total_posts.is_concern() {
        let _ = write!(line, "{}. ", record.total_posts.message.trim());
    }
    if record.last_post.is_concern() {
        let _ = write!(line, "{}. ", record.last_post.message.trim());
    }
    if record.last_post_length.is_concern() {
        let _ = write!(line, "{}.", record.last_post_length.message.trim());
    }
    if record.status == Some(403) {
        line = "Unauthorized access".to_string();
    }
    if line.is_empty() {
        line = "Blog OK".to_string();
    }

    line
}

pub fn build_digest(records: &[StudentRecord]) -> String {
    let failed = records
        .iter()
        .filter(|record| record.fetch.severity == Severity::Danger)
        .count();
    let flagged = records
        .iter()
        .filter(|record| record.verdicts().iter().any(|verdict| verdict.is_concern()))
        .count();

    let mut output = String::new();
    let _ = writeln!(output, "Checked {} blogs.", records.len());
    let _ = writeln!(output, "- {} could not be fetched", failed);
    let _ = writeln!(output, "- {} with at least one warning", flagged);

    let mut stale: Vec<&StudentRecord> = records
        .iter()
        .filter(|record| record.last_post.severity == Severity::Warning)
        .collect();
    stale.sort_by_key(|record| record.last_post_date());

    if !stale.is_empty() {
        let _ = writeln!(output, "Longest without a post:");
        for record in stale.iter().take(5) {
            let _ = writeln!(
                output,
                "- {} ({}): {}",
                record.full_name(),
                record.entry.email,
                record.last_post.message
            );
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blog::FetchOutcome;
    use crate::checks::{evaluate, CheckConfig};
    use crate::models::{RosterEntry, Verdict};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
    }

    fn record(outcome: FetchOutcome) -> StudentRecord {
        let entry = RosterEntry {
            student_number: "A001".to_string(),
            first_name: "Jules".to_string(),
            last_name: "Moreno".to_string(),
            email: "jules@example.com".to_string(),
            project_name: "Tide <Charts>".to_string(),
            blog_url: "https://julesmoreno.wordpress.com".to_string(),
        };
        evaluate(
            entry,
            outcome,
            "https://api.test/julesmoreno.wordpress.com/posts".to_string(),
            today(),
            &CheckConfig::default(),
        )
    }

    fn ok(body: &str) -> FetchOutcome {
        FetchOutcome::Response {
            status: 200,
            body: body.to_string(),
        }
    }

    fn status(code: u16) -> FetchOutcome {
        FetchOutcome::Response {
            status: code,
            body: "nope".to_string(),
        }
    }

    #[test]
    fn summary_lists_concerns_in_order() {
        let summary = summarize(&record(ok("[]")));
        assert_eq!(summary, "No posts. No posts. no last post.");
    }

    #[test]
    fn summary_is_ok_when_nothing_flagged() {
        let words = vec!["word"; 35].join(" ");
        let body = format!(
            r#"[{{"date": "2026-03-09T08:00:00", "title": {{"rendered": "a"}}, "content": {{"rendered": "{words}"}}}},
                {{"date": "2026-03-05T08:00:00", "title": {{"rendered": "b"}}, "content": {{"rendered": "{words}"}}}}]"#
        );
        assert_eq!(summarize(&record(ok(&body))), "Blog OK");
    }

    #[test]
    fn summary_trims_and_skips_passing_checks() {
        let mut rec = record(ok("[]"));
        rec.total_posts = Verdict::ok("3 posts");
        rec.last_post = Verdict::warning(" Last Post 12 days ago ");
        rec.last_post_length = Verdict::ok("last post OK");
        assert_eq!(summarize(&rec), "Last Post 12 days ago. ");
    }

    #[test]
    fn forbidden_overrides_summary() {
        assert_eq!(summarize(&record(status(403))), "Unauthorized access");
    }

    #[test]
    fn not_found_has_no_override() {
        assert_eq!(summarize(&record(status(404))), "Blog OK");
    }

    #[test]
    fn unreachable_blog_reports_fetch_failure() {
        let rec = record(FetchOutcome::Unreachable("dns error".to_string()));
        assert_eq!(summarize(&rec), "Could not reach blog: dns error.");
    }

    #[test]
    fn unreadable_payload_reports_fetch_failure() {
        let summary = summarize(&record(ok("<html>maintenance</html>")));
        assert!(summary.starts_with("Could not read blog posts: "), "{summary}");
        assert!(summary.ends_with('.'));
        assert_ne!(summary, "Blog OK");
    }

    #[test]
    fn html_report_escapes_and_lists_students() {
        let records = vec![record(ok("[]")), record(status(500))];
        let generated_at = today().and_hms_opt(14, 5, 9).unwrap();
        let html = render_html(&records, generated_at).expect("render");

        assert!(html.contains("Generated 2026-03-10 14:05:09 for 2 students"));
        assert!(html.contains("Jules Moreno"));
        assert!(html.contains("Tide &lt;Charts&gt;"));
        assert!(html.contains("alert alert-danger"));
        assert!(html.contains("500 error code when fetching blogs: nope"));
        assert!(html.contains("api.test"));
        assert!(html.contains("invisible"));
    }

    #[test]
    fn html_report_keeps_rendered_title_entities() {
        let body = r#"[{"date": "2026-03-09T08:00:00", "title": {"rendered": "Week&#8217;s notes"}, "content": {"rendered": "x"}}]"#;
        let html = render_html(&[record(ok(body))], today().and_hms_opt(9, 0, 0).unwrap())
            .expect("render");

        assert!(html.contains("Week&#8217;s notes"));
        assert!(!html.contains("&amp;#8217;"));
    }

    #[test]
    fn file_and_column_names_carry_dates() {
        let generated_at = today().and_hms_opt(7, 3, 1).unwrap();
        assert_eq!(html_file_name(generated_at), "output_2026_03_10_07_03_01.html");
        assert_eq!(summary_column_header(today()), "Blog 10/Mar/2026");
    }

    #[test]
    fn digest_counts_failures_and_flags() {
        let records = vec![record(ok("[]")), record(status(404))];
        let digest = build_digest(&records);
        assert!(digest.starts_with("Checked 2 blogs."));
        assert!(digest.contains("- 1 could not be fetched"));
        assert!(digest.contains("- 2 with at least one warning"));
        assert!(!digest.contains("Longest without a post"));
    }
}
