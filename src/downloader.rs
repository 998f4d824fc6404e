use crate::client::ActivitySession;
use crate::error::DownloaderError;
use crate::naming::activity_filename;
use crate::resolver;
use crate::types::{Activity, DownloadReport, DownloadStatus, DownloadSummary, DownloadTask, FileFormat};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;

pub struct Downloader {
    format: FileFormat,
    output_dir: PathBuf,
    show_progress: bool,
}

impl Downloader {
    pub fn new(format: FileFormat, output_dir: PathBuf) -> Self {
        Self {
            format,
            output_dir,
            show_progress: true,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Downloads each activity in turn. A failure on one activity is recorded
    /// in its report and never stops the rest of the batch.
    pub async fn download_all<S: ActivitySession + ?Sized>(
        &self,
        session: &S,
        activities: Vec<Activity>,
    ) -> DownloadSummary {
        let start_time = Instant::now();
        let tasks = self.create_download_tasks(activities);
        let total = tasks.len();
        let pb = self.create_progress_bar(total);
        let mut summary = DownloadSummary::new(total, self.output_dir.clone());

        for (index, task) in tasks.into_iter().enumerate() {
            let report = self.download_one(session, task, index + 1, total, &pb).await;
            pb.inc(1);
            summary.record(report);
        }

        pb.finish_and_clear();
        summary.total_duration = start_time.elapsed();
        info!(
            "Batch finished: {} downloaded, {} skipped, {} errors",
            summary.downloaded, summary.skipped, summary.errors
        );
        summary
    }

    async fn download_one<S: ActivitySession + ?Sized>(
        &self,
        session: &S,
        task: DownloadTask,
        position: usize,
        total: usize,
        pb: &ProgressBar,
    ) -> DownloadReport {
        let start_time = Instant::now();
        let activity = &task.activity;

        if fs::try_exists(&task.output_path).await.unwrap_or(false) {
            status_line(
                pb,
                format!("[{position}/{total}] Skipping (already exists): {}", task.file_name),
            );
            return report(&task, DownloadStatus::Skipped, 0, start_time.elapsed(), None);
        }

        let date: String = activity.start_time().chars().take(10).collect();
        pb.set_message(activity.display_name().to_string());
        status_line(
            pb,
            format!(
                "[{position}/{total}] Downloading: {} ({date})...",
                activity.display_name()
            ),
        );

        let result = async {
            let payload = resolver::resolve(session, &activity.id, task.format).await?;
            write_atomically(&task.output_path, payload.bytes()).await?;
            Ok::<_, DownloaderError>(payload)
        }
        .await;

        match result {
            Ok(payload) => {
                if payload.is_fallback() {
                    status_line(
                        pb,
                        format!(
                            "    {} No {} file found in archive, saving as-is",
                            "⚠".yellow(),
                            task.format.extension().to_uppercase()
                        ),
                    );
                }
                status_line(
                    pb,
                    format!("    {} Saved to: {}", "✓".green(), task.file_name),
                );
                let mut done = report(
                    &task,
                    DownloadStatus::Downloaded,
                    payload.bytes().len() as u64,
                    start_time.elapsed(),
                    None,
                );
                done.archive_fallback = payload.is_fallback();
                done
            }
            Err(e) => {
                error!("Download failed for activity {}: {}", activity.id, e);
                status_line(
                    pb,
                    format!(
                        "    {} Error downloading activity {}: {}",
                        "✗".red(),
                        activity.id,
                        e
                    ),
                );
                report(
                    &task,
                    DownloadStatus::Failed,
                    0,
                    start_time.elapsed(),
                    Some(e.to_string()),
                )
            }
        }
    }

    fn create_download_tasks(&self, activities: Vec<Activity>) -> Vec<DownloadTask> {
        let tasks: Vec<DownloadTask> = activities
            .into_iter()
            .map(|activity| self.create_task(activity))
            .collect();
        for task in &tasks {
            debug!("Download task: {} -> {}", task.activity.id, task.output_path.display());
        }
        tasks
    }

    fn create_task(&self, activity: Activity) -> DownloadTask {
        let file_name = activity_filename(&activity, self.format);
        let output_path = self.output_dir.join(&file_name);

        DownloadTask {
            activity,
            file_name,
            output_path,
            format: self.format,
        }
    }

    fn create_progress_bar(&self, total: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(total as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .expect("progress template is valid")
                .progress_chars("#>-"),
        );
        pb
    }
}

/// Creates the output directory (and parents) and returns its absolute path.
pub async fn prepare_output_dir(output_dir: &Path) -> Result<PathBuf, DownloaderError> {
    fs::create_dir_all(output_dir).await?;
    Ok(fs::canonicalize(output_dir).await?)
}

/// Writes next to the target and renames into place, so a failed write never
/// leaves a truncated file at `path`.
async fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), DownloaderError> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("download");
    let partial = path.with_file_name(format!(".{file_name}.part"));

    let written = async {
        let mut file = File::create(&partial).await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;
        drop(file);
        fs::rename(&partial, path).await
    }
    .await;

    if let Err(e) = written {
        if let Err(cleanup) = fs::remove_file(&partial).await {
            warn!("Could not remove partial file {}: {}", partial.display(), cleanup);
        }
        return Err(e.into());
    }
    Ok(())
}

fn status_line(pb: &ProgressBar, line: String) {
    pb.suspend(|| println!("{line}"));
}

fn report(
    task: &DownloadTask,
    status: DownloadStatus,
    bytes_written: u64,
    duration: Duration,
    error: Option<String>,
) -> DownloadReport {
    DownloadReport {
        activity_id: task.activity.id.clone(),
        file_name: task.file_name.clone(),
        status,
        bytes_written,
        duration,
        error,
        archive_fallback: false,
    }
}
