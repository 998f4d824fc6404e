use chrono::{Days, Local, NaiveDate};
use clap::ValueEnum;
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Opaque activity identifier. Garmin sends these as JSON numbers, but
/// nothing here relies on that.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActivityId(String);

impl ActivityId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActivityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActivityId {
    fn from(id: &str) -> Self {
        ActivityId(id.to_string())
    }
}

impl From<u64> for ActivityId {
    fn from(id: u64) -> Self {
        ActivityId(id.to_string())
    }
}

impl<'de> Deserialize<'de> for ActivityId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Error;
        match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::String(s) => Ok(ActivityId(s)),
            serde_json::Value::Number(n) => Ok(ActivityId(n.to_string())),
            other => Err(D::Error::custom(format!(
                "expected string or number, got {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActivityType {
    pub type_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(rename = "activityId")]
    pub id: ActivityId,
    #[serde(rename = "activityName", default)]
    pub name: Option<String>,
    #[serde(default)]
    pub start_time_local: Option<String>,
    #[serde(default)]
    pub activity_type: Option<ActivityType>,
}

impl Activity {
    pub fn new(id: impl Into<ActivityId>, name: Option<&str>, start_time_local: Option<&str>) -> Self {
        Self {
            id: id.into(),
            name: name.map(str::to_string),
            start_time_local: start_time_local.map(str::to_string),
            activity_type: None,
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Unnamed")
    }

    pub fn start_time(&self) -> &str {
        self.start_time_local.as_deref().unwrap_or("Unknown")
    }

    pub fn type_key(&self) -> &str {
        self.activity_type
            .as_ref()
            .and_then(|t| t.type_key.as_deref())
            .unwrap_or("activity")
    }
}

/// Output format requested by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FileFormat {
    Gpx,
    Tcx,
    Fit,
    Original,
}

impl FileFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            FileFormat::Gpx => "gpx",
            FileFormat::Tcx => "tcx",
            FileFormat::Fit => "fit",
            FileFormat::Original => "original",
        }
    }

    /// The encoding actually requested from the service. FIT is never
    /// exported directly; it comes out of the original upload.
    pub fn export_format(&self) -> ExportFormat {
        match self {
            FileFormat::Gpx => ExportFormat::Gpx,
            FileFormat::Tcx => ExportFormat::Tcx,
            FileFormat::Fit | FileFormat::Original => ExportFormat::Original,
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Wire-level download encodings understood by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Gpx,
    Tcx,
    Original,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub const DEFAULT_SPAN_DAYS: u64 = 365;

    /// Fills in missing bounds: the end defaults to `today` and the start to
    /// a year before the (resolved) end. An inverted range is passed through.
    pub fn resolve(start: Option<NaiveDate>, end: Option<NaiveDate>, today: NaiveDate) -> Self {
        let end = end.unwrap_or(today);
        let start = start.unwrap_or_else(|| {
            end.checked_sub_days(Days::new(Self::DEFAULT_SPAN_DAYS))
                .unwrap_or(NaiveDate::MIN)
        });
        Self { start, end }
    }

    pub fn ending_today(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self::resolve(start, end, Local::now().date_naive())
    }
}

#[derive(Debug, Clone)]
pub struct DownloadTask {
    pub activity: Activity,
    pub file_name: String,
    pub output_path: PathBuf,
    pub format: FileFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadStatus {
    Downloaded,
    Skipped,
    Failed,
}

#[derive(Debug)]
pub struct DownloadReport {
    pub activity_id: ActivityId,
    pub file_name: String,
    pub status: DownloadStatus,
    pub bytes_written: u64,
    pub duration: Duration,
    pub error: Option<String>,
    /// Set when a FIT archive had no FIT entry and was saved whole.
    pub archive_fallback: bool,
}

#[derive(Debug)]
pub struct DownloadSummary {
    pub total_activities: usize,
    pub downloaded: usize,
    pub skipped: usize,
    pub errors: usize,
    pub warnings: usize,
    pub output_dir: PathBuf,
    pub total_duration: Duration,
    pub reports: Vec<DownloadReport>,
}

impl DownloadSummary {
    pub fn new(total_activities: usize, output_dir: PathBuf) -> Self {
        Self {
            total_activities,
            downloaded: 0,
            skipped: 0,
            errors: 0,
            warnings: 0,
            output_dir,
            total_duration: Duration::ZERO,
            reports: Vec::with_capacity(total_activities),
        }
    }

    pub fn record(&mut self, report: DownloadReport) {
        match report.status {
            DownloadStatus::Downloaded => self.downloaded += 1,
            DownloadStatus::Skipped => self.skipped += 1,
            DownloadStatus::Failed => self.errors += 1,
        }
        if report.archive_fallback {
            self.warnings += 1;
        }
        self.reports.push(report);
    }

    pub fn failed(&self) -> impl Iterator<Item = &DownloadReport> {
        self.reports
            .iter()
            .filter(|r| r.status == DownloadStatus::Failed)
    }
}
