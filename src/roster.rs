use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use anyhow::Context;
use rust_xlsxwriter::{Format, Workbook};

use crate::models::RosterEntry;

pub const STUDENT_NUMBER: &str = "Student Number";
pub const FIRST_NAME: &str = "First Name";
pub const LAST_NAME: &str = "Last Name";
pub const EMAIL: &str = "Email";
pub const PROJECT: &str = "Project";
pub const BLOG_ADDRESS: &str = "Blog Address";

const REQUIRED_COLUMNS: [&str; 6] = [
    STUDENT_NUMBER,
    FIRST_NAME,
    LAST_NAME,
    EMAIL,
    PROJECT,
    BLOG_ADDRESS,
];

#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    #[error("roster is missing the {0:?} column")]
    MissingColumn(String),
    #[error("csv: {0}")]
    Csv(#[from] csv::Error),
}

/// The roster table as read, every column kept so it can be written back out.
#[derive(Debug, Clone)]
pub struct Roster {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    columns: [usize; 6],
}

impl Roster {
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("failed to open roster {}", path.display()))?;
        Self::from_reader(file).with_context(|| format!("failed to read roster {}", path.display()))
    }

    pub fn from_reader<R: Read>(input: R) -> Result<Self, RosterError> {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(input);
        let headers: Vec<String> = reader.headers()?.iter().map(String::from).collect();

        let mut columns = [0usize; 6];
        for (slot, name) in columns.iter_mut().zip(REQUIRED_COLUMNS) {
            *slot = headers
                .iter()
                .position(|header| header.trim() == name)
                .ok_or_else(|| RosterError::MissingColumn(name.to_string()))?;
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let mut row: Vec<String> = record?.iter().map(String::from).collect();
            row.resize(headers.len(), String::new());
            rows.push(row);
        }

        Ok(Self {
            headers,
            rows,
            columns,
        })
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Rows with a student number, paired with their position in the table.
    pub fn entries(&self) -> impl Iterator<Item = (usize, RosterEntry)> + '_ {
        self.rows.iter().enumerate().filter_map(|(index, row)| {
            let [number, first, last, email, project, blog] = self.columns.map(|c| row[c].clone());
            if number.is_empty() {
                return None;
            }

            Some((
                index,
                RosterEntry {
                    student_number: number,
                    first_name: first,
                    last_name: last,
                    email,
                    project_name: project,
                    blog_url: blog,
                },
            ))
        })
    }

    /// Rows missing from `values` get an empty cell.
    pub fn append_column(&mut self, header: impl Into<String>, mut values: HashMap<usize, String>) {
        self.headers.push(header.into());
        for (index, row) in self.rows.iter_mut().enumerate() {
            row.push(values.remove(&index).unwrap_or_default());
        }
    }

    pub fn write_csv(&self, path: &Path) -> anyhow::Result<()> {
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn write_xlsx(&self, path: &Path) -> anyhow::Result<()> {
        let mut workbook = Workbook::new();
        let bold = Format::new().set_bold();
        let worksheet = workbook.add_worksheet();

        for (col, header) in self.headers.iter().enumerate() {
            worksheet.write_string_with_format(0, u16::try_from(col)?, header.as_str(), &bold)?;
        }

        for (index, row) in self.rows.iter().enumerate() {
            let line = u32::try_from(index + 1)?;
            for (col, cell) in row.iter().enumerate() {
                worksheet.write_string(line, u16::try_from(col)?, cell.as_str())?;
            }
        }

        workbook
            .save(path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROSTER: &str = "\
Student Number,First Name,Last Name,Email,Project,Blog Address,Section
A001,Avery,Lee,avery@example.com,Plant Tracker,averylee.wordpress.com,B
,Nobody,Here,,,,
A002,Kiara,Patel,kiara@example.com
";

    #[test]
    fn loads_entries_and_skips_blank_student_numbers() {
        let roster = Roster::from_reader(ROSTER.as_bytes()).expect("roster");
        assert_eq!(roster.row_count(), 3);

        let entries: Vec<_> = roster.entries().collect();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, 0);
        assert_eq!(entries[0].1.project_name, "Plant Tracker");
        assert_eq!(entries[0].1.blog_url, "averylee.wordpress.com");
        assert_eq!(entries[1].0, 2);
        assert_eq!(entries[1].1.first_name, "Kiara");
        assert_eq!(entries[1].1.project_name, "");
        assert_eq!(entries[1].1.blog_url, "");
    }

    #[test]
    fn columns_are_found_by_name() {
        let input = "Blog Address,Project,Email,Last Name,First Name,Student Number\n\
                     jo.blog.com,Loom,jo@example.com,Ito,Jo,B9\n";
        let roster = Roster::from_reader(input.as_bytes()).expect("roster");
        let (_, entry) = roster.entries().next().expect("entry");
        assert_eq!(entry.student_number, "B9");
        assert_eq!(entry.blog_url, "jo.blog.com");
        assert_eq!(entry.last_name, "Ito");
    }

    #[test]
    fn missing_column_is_fatal() {
        let input = "Student Number,First Name,Last Name,Email,Project\nA1,a,b,c,d\n";
        match Roster::from_reader(input.as_bytes()) {
            Err(RosterError::MissingColumn(name)) => assert_eq!(name, BLOG_ADDRESS),
            other => panic!("expected missing column, got {other:?}"),
        }
    }

    #[test]
    fn appended_column_lines_up_with_rows() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("BlogListUpdated.csv");

        let mut roster = Roster::from_reader(ROSTER.as_bytes()).expect("roster");
        let values = HashMap::from([(0, "Blog OK".to_string()), (2, "No posts. ".to_string())]);
        roster.append_column("Blog 10/Mar/2026", values);
        roster.write_csv(&path).expect("write");

        let mut reader = csv::Reader::from_path(&path).expect("reopen");
        let headers = reader.headers().expect("headers").clone();
        assert_eq!(headers.len(), 8);
        assert_eq!(&headers[7], "Blog 10/Mar/2026");
        assert_eq!(&headers[6], "Section");

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.expect("row")).collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(&rows[0][7], "Blog OK");
        assert_eq!(&rows[1][7], "");
        assert_eq!(&rows[2][7], "No posts. ");
        assert_eq!(&rows[2][4], "");
    }

    #[test]
    fn writes_workbook() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("BlogListUpdated.xlsx");

        let roster = Roster::from_reader(ROSTER.as_bytes()).expect("roster");
        roster.write_xlsx(&path).expect("write");

        let bytes = std::fs::read(&path).expect("read back");
        assert!(bytes.starts_with(b"PK"));
    }
}
