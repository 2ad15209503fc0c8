//! Output records and the export column schema

use std::ops::Range;

use serde::Serialize;

/// Column order of the export. Consumers import this layout as-is.
pub const EXPORT_COLUMNS: &[&str] = &[
    "Name",
    "Slug",
    "Company",
    "Type",
    "Description",
    "Location",
    "Industry",
    "Level",
    "Deadline",
    "Apply URL",
    "Collection ID",
    "Locale ID",
    "Item ID",
    "Archived",
    "Draft",
    "Created On",
    "Updated On",
    "Published On",
    "Department",
    "Function",
    "Qualifications",
    "Contact Email",
    "Job ID",
    "Link",
    "Error",
];

/// CMS bookkeeping columns within `EXPORT_COLUMNS`, always exported empty.
pub const PLACEHOLDER_COLUMNS: Range<usize> = 10..18;

/// A successfully fetched and normalized job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobRecord {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Slug")]
    pub slug: String,
    #[serde(rename = "Company")]
    pub company: String,
    #[serde(rename = "Type")]
    pub job_type: Option<String>,
    /// Markup fragment, not plain text
    #[serde(rename = "Description")]
    pub description: Option<String>,
    #[serde(rename = "Location")]
    pub location: Option<String>,
    /// Empty rather than absent when the page has no Job-Center label
    #[serde(rename = "Industry")]
    pub industry: String,
    #[serde(rename = "Level")]
    pub level: Option<String>,
    #[serde(rename = "Deadline")]
    pub deadline: Option<String>,
    #[serde(rename = "Apply URL")]
    pub apply_url: Option<String>,
    #[serde(rename = "Department")]
    pub department: Option<String>,
    #[serde(rename = "Function")]
    pub function: Option<String>,
    #[serde(rename = "Qualifications")]
    pub qualifications: Option<String>,
    #[serde(rename = "Contact Email")]
    pub contact_email: Option<String>,
    #[serde(rename = "Job ID")]
    pub job_id: String,
    #[serde(rename = "Link")]
    pub link: String,
}

/// Stands in for a job whose detail page could not be fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureRecord {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Error")]
    pub error: String,
}

/// One result per dispatched stub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum JobOutcome {
    Job(JobRecord),
    Failure(FailureRecord),
}

impl JobOutcome {
    pub fn name(&self) -> &str {
        match self {
            JobOutcome::Job(job) => &job.name,
            JobOutcome::Failure(failure) => &failure.name,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, JobOutcome::Failure(_))
    }

    pub fn as_job(&self) -> Option<&JobRecord> {
        match self {
            JobOutcome::Job(job) => Some(job),
            JobOutcome::Failure(_) => None,
        }
    }

    /// Cells in `EXPORT_COLUMNS` order; absent values become empty cells.
    pub fn to_row(&self) -> Vec<&str> {
        match self {
            JobOutcome::Job(job) => {
                let mut row = vec![
                    job.name.as_str(),
                    job.slug.as_str(),
                    job.company.as_str(),
                    cell(&job.job_type),
                    cell(&job.description),
                    cell(&job.location),
                    job.industry.as_str(),
                    cell(&job.level),
                    cell(&job.deadline),
                    cell(&job.apply_url),
                ];
                debug_assert_eq!(row.len(), PLACEHOLDER_COLUMNS.start);
                row.resize(PLACEHOLDER_COLUMNS.end, "");
                row.extend([
                    cell(&job.department),
                    cell(&job.function),
                    cell(&job.qualifications),
                    cell(&job.contact_email),
                    job.job_id.as_str(),
                    job.link.as_str(),
                    "",
                ]);
                row
            }
            JobOutcome::Failure(failure) => {
                let mut row = vec![""; EXPORT_COLUMNS.len()];
                row[0] = failure.name.as_str();
                row[EXPORT_COLUMNS.len() - 1] = failure.error.as_str();
                row
            }
        }
    }
}

fn cell(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("")
}

impl From<JobRecord> for JobOutcome {
    fn from(job: JobRecord) -> Self {
        JobOutcome::Job(job)
    }
}

impl From<FailureRecord> for JobOutcome {
    fn from(failure: FailureRecord) -> Self {
        JobOutcome::Failure(failure)
    }
}
