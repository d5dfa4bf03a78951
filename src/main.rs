use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use chrono::Local;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod blog;
mod checks;
mod models;
mod report;
mod roster;

use blog::BlogClient;
use checks::CheckConfig;
use models::StudentRecord;
use roster::Roster;

const UPDATED_ROSTER_STEM: &str = "BlogListUpdated";

#[derive(Parser)]
#[command(name = "blog-health-check")]
#[command(
    about = "Check that every student's project blog is named, active and substantial",
    long_about = "Reads a roster CSV with the columns 'Student Number', 'First Name', 'Last Name', \
                  'Email', 'Project' and 'Blog Address', fetches each blog through the WordPress \
                  public API and writes an HTML report plus an updated roster with a dated Blog column."
)]
struct Cli {
    /// Print the latest post of every student, not just students with potential issues
    #[arg(long)]
    verbose: bool,
    /// Days allowed since a student's last post before it is flagged
    #[arg(long, default_value_t = 7)]
    max_days: i64,
    /// Minimum number of words expected in the last post
    #[arg(long, default_value_t = 30)]
    min_post_len: usize,
    /// Skip checking that a project name is set
    #[arg(long)]
    suppress_project_check: bool,
    /// Roster CSV, relative to the current directory
    #[arg(long, default_value = "BlogList.csv")]
    file_path: PathBuf,
    /// Directory that receives the report and the updated roster
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
}

impl Cli {
    fn check_config(&self) -> CheckConfig {
        CheckConfig {
            max_days: self.max_days,
            min_post_words: self.min_post_len,
            check_project_name: !self.suppress_project_check,
            ..CheckConfig::default()
        }
    }
}

fn init_logging() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!(err))
        .context("failed to init logger")
}

fn print_outcome(record: &StudentRecord, verbose: bool) {
    let concerns: Vec<&str> = record
        .verdicts()
        .into_iter()
        .filter(|verdict| verdict.is_concern())
        .map(|verdict| verdict.message.trim())
        .collect();

    if !concerns.is_empty() {
        print!("{} ", concerns.join("; "));
    }

    if verbose {
        if let Some(post) = record.most_recent_post() {
            print!("[{} on {}] ", post.title, post.published);
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging()?;
    let cli = Cli::parse();
    let config = cli.check_config();

    let api_base =
        std::env::var("BLOG_API_BASE").unwrap_or_else(|_| blog::DEFAULT_API_BASE.to_string());
    let client = BlogClient::new(api_base)?;

    let mut roster = Roster::from_path(&cli.file_path)?;
    let entries: Vec<_> = roster.entries().collect();
    tracing::info!(
        students = entries.len(),
        rows = roster.row_count(),
        "loaded roster from {}",
        cli.file_path.display()
    );

    let today = Local::now().date_naive();
    let mut records = Vec::with_capacity(entries.len());
    let mut summaries = HashMap::new();
    let mut stdout = std::io::stdout();

    for (index, entry) in entries {
        print!("{} {}: ", entry.first_name, entry.last_name);
        stdout.flush()?;

        let api_url = client.api_url(&blog::public_blog_url(&entry.blog_url));
        let outcome = client.fetch(&api_url).await;
        let record = checks::evaluate(entry, outcome, api_url, today, &config);

        print_outcome(&record, cli.verbose);
        println!("Done");

        summaries.insert(index, report::summarize(&record));
        records.push(record);
    }

    std::fs::create_dir_all(&cli.out_dir)
        .with_context(|| format!("failed to create {}", cli.out_dir.display()))?;

    let generated_at = Local::now().naive_local();
    let html_path = cli.out_dir.join(report::html_file_name(generated_at));
    let html = report::render_html(&records, generated_at)?;
    std::fs::write(&html_path, html)
        .with_context(|| format!("failed to write {}", html_path.display()))?;
    tracing::info!(path = %html_path.display(), "report written");

    roster.append_column(report::summary_column_header(today), summaries);

    let csv_path = cli.out_dir.join(format!("{UPDATED_ROSTER_STEM}.csv"));
    roster.write_csv(&csv_path)?;
    let xlsx_path = cli.out_dir.join(format!("{UPDATED_ROSTER_STEM}.xlsx"));
    roster.write_xlsx(&xlsx_path)?;
    tracing::info!(csv = %csv_path.display(), xlsx = %xlsx_path.display(), "roster written");

    print!("{}", report::build_digest(&records));
    println!("Report written to {}.", html_path.display());
    println!(
        "Updated roster written to {} and {}.",
        csv_path.display(),
        xlsx_path.display()
    );

    Ok(())
}
