//! Descriptor downloader: fetches one `.flatpakref` per app id named by a
//! set of reference lists, trying the mirror once when the primary fails.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use flatref_core::{
    parse_reference_list, plan_downloads, subject_of, DownloadItem, DownloadOutcome,
    DownloadTally, SourceList,
};
use flatref_logging::{flatref_debug, flatref_info};
use thiserror::Error;

use crate::filename::{descriptor_filename, sanitize_component, REFS_EXTENSION};
use crate::persist::{ensure_output_dir, is_present, AtomicFileWriter, PersistError};
use crate::{DownloadEvent, Endpoints, FailedAttempt, FetchOutput, Fetcher, ProgressSink};

pub const DEFAULT_DESCRIPTOR_DIR: &str = "flatpakrefs";

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("input not found: {}", .0.display())]
    InputMissing(PathBuf),
    #[error("no reference lists given; provide list files and/or a list directory")]
    NoInputs,
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    OutputDir(#[from] PersistError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOptions {
    pub refs_files: Vec<PathBuf>,
    pub refs_dir: Option<PathBuf>,
    pub out_dir: PathBuf,
    /// Pause before each item that needs the network, except the first.
    pub throttle: Duration,
    /// Stop after this many successful downloads; 0 means no limit.
    pub limit: usize,
    pub skip_existing: bool,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            refs_files: Vec::new(),
            refs_dir: None,
            out_dir: PathBuf::from(DEFAULT_DESCRIPTOR_DIR),
            throttle: Duration::ZERO,
            limit: 0,
            skip_existing: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadReport {
    pub tally: DownloadTally,
    /// Items for which at least one request was sent.
    pub network_items: usize,
    pub requests: usize,
    pub throttle_pauses: usize,
    pub stopped_at_limit: bool,
}

/// Every `*.refs` file directly inside `dir`, sorted by name.
pub fn find_lists_in_dir(dir: &Path) -> Result<Vec<PathBuf>, DownloadError> {
    if !dir.is_dir() {
        return Err(DownloadError::InputMissing(dir.to_path_buf()));
    }
    let read_err = |source: io::Error| DownloadError::Read {
        path: dir.to_path_buf(),
        source,
    };
    let mut lists = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_err)? {
        let path = entry.map_err(read_err)?.path();
        let is_list = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(REFS_EXTENSION));
        if is_list && path.is_file() {
            lists.push(path);
        }
    }
    lists.sort();
    Ok(lists)
}

/// Directory lists first, then explicit files; every path must exist.
pub fn resolve_inputs(options: &DownloadOptions) -> Result<Vec<PathBuf>, DownloadError> {
    let mut inputs = match &options.refs_dir {
        Some(dir) => find_lists_in_dir(dir)?,
        None => Vec::new(),
    };
    for file in &options.refs_files {
        if !file.is_file() {
            return Err(DownloadError::InputMissing(file.clone()));
        }
        if !inputs.contains(file) {
            inputs.push(file.clone());
        }
    }
    if inputs.is_empty() && options.refs_dir.is_none() {
        return Err(DownloadError::NoInputs);
    }
    Ok(inputs)
}

/// Reads each list. Lines without the reference shape are dropped quietly.
pub fn load_sources(paths: &[PathBuf]) -> Result<Vec<SourceList>, DownloadError> {
    let mut sources = Vec::with_capacity(paths.len());
    for path in paths {
        let text = fs::read_to_string(path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => DownloadError::InputMissing(path.clone()),
            _ => DownloadError::Read {
                path: path.clone(),
                source,
            },
        })?;
        let parsed = parse_reference_list(&text);
        if !parsed.malformed_lines.is_empty() {
            flatref_debug!(
                "Ignoring {} malformed lines in {}: {:?}",
                parsed.malformed_lines.len(),
                path.display(),
                parsed.malformed_lines
            );
        }
        let subject = subject_of(path);
        if parsed.references.is_empty() {
            flatref_info!("No app IDs found in {}", path.display());
        } else {
            flatref_info!(
                "Subject '{}': {} refs from {}",
                subject,
                parsed.references.len(),
                path.display()
            );
        }
        sources.push(SourceList {
            subject,
            references: parsed.references,
        });
    }
    Ok(sources)
}

pub struct Downloader<'a> {
    fetcher: &'a dyn Fetcher,
    endpoints: &'a Endpoints,
    sink: &'a dyn ProgressSink,
}

impl<'a> Downloader<'a> {
    pub fn new(
        fetcher: &'a dyn Fetcher,
        endpoints: &'a Endpoints,
        sink: &'a dyn ProgressSink,
    ) -> Self {
        Self {
            fetcher,
            endpoints,
            sink,
        }
    }

    /// Validates inputs, then downloads. Input problems surface before any
    /// request is made; per-item failures only show up in the report.
    pub async fn run(&self, options: &DownloadOptions) -> Result<DownloadReport, DownloadError> {
        let inputs = resolve_inputs(options)?;
        let sources = load_sources(&inputs)?;
        ensure_output_dir(&options.out_dir)?;
        let items = plan_downloads(&sources);
        flatref_info!(
            "{} unique app IDs from {} lists",
            items.len(),
            sources.len()
        );
        Ok(self.download_items(&items, options).await)
    }

    pub async fn download_items(
        &self,
        items: &[DownloadItem],
        options: &DownloadOptions,
    ) -> DownloadReport {
        let mut report = DownloadReport::default();
        for item in items {
            if report.tally.limit_reached(options.limit) {
                flatref_info!("Reached limit of {} downloads", options.limit);
                report.stopped_at_limit = true;
                break;
            }
            let outcome = self.process(item, options, &mut report).await;
            report.tally.record(outcome);
        }
        report
    }

    async fn process(
        &self,
        item: &DownloadItem,
        options: &DownloadOptions,
        report: &mut DownloadReport,
    ) -> DownloadOutcome {
        let dir = match &item.subject {
            Some(subject) => options.out_dir.join(sanitize_component(subject)),
            None => options.out_dir.clone(),
        };
        let writer = AtomicFileWriter::new(dir);
        let filename = descriptor_filename(&item.app_id);
        let target = writer.target(&filename);

        if options.skip_existing && is_present(&target) {
            self.sink.emit(DownloadEvent::Skipped {
                app_id: item.app_id.clone(),
                path: target,
            });
            return DownloadOutcome::SkippedExisting;
        }

        if report.network_items > 0 && !options.throttle.is_zero() {
            tokio::time::sleep(options.throttle).await;
            report.throttle_pauses += 1;
        }
        report.network_items += 1;

        let (output, url) = match self.fetch_with_fallback(&item.app_id, report).await {
            Ok(fetched) => fetched,
            Err(attempts) => {
                self.sink.emit(DownloadEvent::Failed {
                    app_id: item.app_id.clone(),
                    subject: item.subject.clone(),
                    attempts,
                });
                return DownloadOutcome::Failed;
            }
        };

        match writer.write(&filename, &output.bytes) {
            Ok(path) => {
                self.sink.emit(DownloadEvent::Saved {
                    app_id: item.app_id.clone(),
                    path,
                    url,
                    ordinal: report.tally.success + 1,
                });
                DownloadOutcome::Success
            }
            Err(err) => {
                self.sink.emit(DownloadEvent::WriteFailed {
                    app_id: item.app_id.clone(),
                    path: target,
                    message: err.to_string(),
                });
                DownloadOutcome::Failed
            }
        }
    }

    /// Primary first, then exactly one mirror attempt.
    async fn fetch_with_fallback(
        &self,
        app_id: &str,
        report: &mut DownloadReport,
    ) -> Result<(FetchOutput, String), Vec<FailedAttempt>> {
        let urls = [
            self.endpoints.primary_url(app_id),
            self.endpoints.mirror_url(app_id),
        ];
        let mut attempts = Vec::with_capacity(urls.len());
        for url in urls {
            report.requests += 1;
            match self.fetcher.fetch(&url).await {
                Ok(output) => return Ok((output, url)),
                Err(error) => {
                    flatref_debug!("{} failed for {}: {}", url, app_id, error);
                    attempts.push(FailedAttempt { url, error });
                }
            }
        }
        Err(attempts)
    }
}
