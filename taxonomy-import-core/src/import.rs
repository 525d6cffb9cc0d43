//! Import driver: validates rows, runs the resolver per record, tallies outcomes.
//!
//! Records are processed strictly one at a time. A record that fails does not
//! affect the others, and the run always finishes with an [`ImportReport`].
//! Failed records are not retried within a run; re-running the whole import is
//! safe because every level is get-or-create.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::cache::PathCache;
use crate::config::Tuning;
use crate::contract::{Discovery, Writer};
use crate::resolver::HierarchyResolver;

/// One spreadsheet row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRecord {
    /// 1-based line number in the input file (the header is line 1).
    pub row: usize,
    pub brand_name: String,
    pub model_line_name: String,
    pub sub_model_line_name: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImportError {
    #[error("row {row}: missing required field {field}")]
    MissingField { row: usize, field: &'static str },
}

impl ImportRecord {
    pub fn new(
        row: usize,
        brand_name: impl Into<String>,
        model_line_name: impl Into<String>,
        sub_model_line_name: impl Into<String>,
    ) -> Self {
        Self {
            row,
            brand_name: brand_name.into(),
            model_line_name: model_line_name.into(),
            sub_model_line_name: sub_model_line_name.into(),
        }
    }

    /// All three fields empty after trimming. Such rows are dropped on input.
    pub fn is_blank(&self) -> bool {
        self.brand_name.trim().is_empty()
            && self.model_line_name.trim().is_empty()
            && self.sub_model_line_name.trim().is_empty()
    }

    /// Trimmed copy, or the first field that is missing.
    pub fn validate(&self) -> Result<ImportRecord, ImportError> {
        let fields = [
            ("merk", &self.brand_name),
            ("modellijn", &self.model_line_name),
            ("sub-modellijn", &self.sub_model_line_name),
        ];
        if let Some((field, _)) = fields.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(ImportError::MissingField {
                row: self.row,
                field: *field,
            });
        }
        Ok(ImportRecord::new(
            self.row,
            self.brand_name.trim(),
            self.model_line_name.trim(),
            self.sub_model_line_name.trim(),
        ))
    }

    pub fn label(&self) -> String {
        format!(
            "{} > {} > {}",
            self.brand_name, self.model_line_name, self.sub_model_line_name
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RecordOutcome {
    Created,
    Exists,
    Failed,
    Skipped,
}

/// Run counters. Only ever incremented.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImportStats {
    pub processed: usize,
    pub created: usize,
    pub already_exists: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Records where at least one level's path was slug-predicted because
    /// Discovery could not confirm it. Also counted as created/exists.
    pub unconfirmed: usize,
}

impl ImportStats {
    pub fn record(&mut self, outcome: RecordOutcome) {
        self.processed += 1;
        match outcome {
            RecordOutcome::Created => self.created += 1,
            RecordOutcome::Exists => self.already_exists += 1,
            RecordOutcome::Failed => self.failed += 1,
            RecordOutcome::Skipped => self.skipped += 1,
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.processed == self.created + self.already_exists + self.failed + self.skipped
    }
}

#[derive(Debug, Clone)]
pub struct DriverOptions {
    /// Validate and report only; no remote calls, valid rows count as created.
    pub dry_run: bool,
    /// Pause after each record that reached the remote APIs.
    pub record_delay: Duration,
    /// Log a progress line every this many records. 0 disables.
    pub progress_every: usize,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self::from_tuning(&Tuning::default(), false)
    }
}

impl DriverOptions {
    pub fn from_tuning(tuning: &Tuning, dry_run: bool) -> Self {
        Self {
            dry_run,
            record_delay: tuning.record_delay(),
            progress_every: 50,
        }
    }
}

/// A record that did not make it, with the reason.
#[derive(Debug, Clone, Serialize)]
pub struct RecordIssue {
    pub row: usize,
    pub label: String,
    pub message: String,
}

#[derive(Debug, Default, Serialize)]
pub struct ImportReport {
    pub stats: ImportStats,
    pub failed: Vec<RecordIssue>,
    pub skipped: Vec<RecordIssue>,
}

/// Runs every record through `resolver`, in order.
///
/// `cache` is owned by the caller and lives for the whole run.
pub async fn run_import<D, W>(
    records: &[ImportRecord],
    resolver: &HierarchyResolver<D, W>,
    options: &DriverOptions,
    cache: &mut PathCache,
) -> ImportReport
where
    D: Discovery,
    W: Writer,
{
    info!(
        records = records.len(),
        dry_run = options.dry_run,
        "[IMPORT] Starting import"
    );
    let mut report = ImportReport::default();

    for raw in records {
        let outcome = match raw.validate() {
            Err(e) => {
                warn!(row = raw.row, error = %e, "[IMPORT] Missing required data; skipping row");
                report.skipped.push(RecordIssue {
                    row: raw.row,
                    label: raw.label(),
                    message: e.to_string(),
                });
                RecordOutcome::Skipped
            }
            Ok(record) if options.dry_run => {
                info!(row = record.row, record = %record.label(), "[IMPORT][DRY-RUN] Would create");
                RecordOutcome::Created
            }
            Ok(record) => {
                let outcome = match resolver.ensure_hierarchy(&record, cache).await {
                    Ok(resolution) => {
                        if !resolution.all_confirmed() {
                            report.stats.unconfirmed += 1;
                        }
                        let outcome = if resolution.leaf_created() {
                            RecordOutcome::Created
                        } else {
                            RecordOutcome::Exists
                        };
                        info!(
                            row = record.row,
                            path = resolution.leaf_path(),
                            ?outcome,
                            confirmed = resolution.all_confirmed(),
                            "[IMPORT] Record resolved"
                        );
                        outcome
                    }
                    Err(e) => {
                        error!(row = record.row, record = %record.label(), error = %e, "[IMPORT][ERROR] Record failed");
                        report.failed.push(RecordIssue {
                            row: record.row,
                            label: record.label(),
                            message: e.to_string(),
                        });
                        RecordOutcome::Failed
                    }
                };
                if !options.record_delay.is_zero() {
                    tokio::time::sleep(options.record_delay).await;
                }
                outcome
            }
        };
        report.stats.record(outcome);

        if options.progress_every > 0 && report.stats.processed % options.progress_every == 0 {
            let s = &report.stats;
            info!(
                processed = s.processed,
                total = records.len(),
                created = s.created,
                exists = s.already_exists,
                failed = s.failed,
                skipped = s.skipped,
                "[IMPORT] Progress"
            );
        }
    }

    info!(stats = ?report.stats, "[IMPORT] Import finished");
    report
}
