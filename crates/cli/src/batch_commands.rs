//! Bounded-concurrency batch conversion.
//!
//! Each file is converted on the blocking pool; at most `concurrency` files
//! are in flight. Conversion failures are counted, not raised, unless
//! `fail_fast` is set, in which case no new file is started after the first
//! failure.

use std::{
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};

use {
    canon_formats::{Format, FormatConfig, ParseMetadata},
    futures::{StreamExt, stream},
    tracing::{debug, info, warn},
    walkdir::WalkDir,
};

use crate::convert_commands::{output_file_name, package_id};

/// Extensions treated as convertible documents.
const DOCUMENT_EXTENSIONS: &[&str] = &["md", "mdc", "markdown"];

/// What to convert and how.
#[derive(Debug, Clone)]
pub struct BatchJob {
    pub from: Format,
    pub to: Format,
    pub options: FormatConfig,
    pub out_dir: Option<PathBuf>,
    pub concurrency: usize,
    pub fail_fast: bool,
}

/// Aggregated batch outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub succeeded: usize,
    pub failed: usize,
    /// Files that are not documents.
    pub skipped: usize,
    /// Documents never started because an earlier file failed in fail-fast mode.
    pub cancelled: usize,
    /// Sum of per-file conversion time.
    pub total_duration: Duration,
    /// Files whose conversion was lossy.
    pub lossy: usize,
}

impl BatchStats {
    #[must_use]
    pub fn attempted(&self) -> usize {
        self.succeeded + self.failed
    }

    #[must_use]
    pub fn average_duration(&self) -> Duration {
        match u32::try_from(self.attempted()) {
            Ok(0) | Err(_) => Duration::ZERO,
            Ok(n) => self.total_duration / n,
        }
    }

    fn record(&mut self, outcome: &FileOutcome) {
        match outcome {
            FileOutcome::Converted {
                duration, lossy, ..
            } => {
                self.succeeded += 1;
                self.total_duration += *duration;
                if *lossy {
                    self.lossy += 1;
                }
            },
            FileOutcome::Failed { duration, .. } => {
                self.failed += 1;
                self.total_duration += *duration;
            },
            FileOutcome::Cancelled { .. } => self.cancelled += 1,
        }
    }
}

#[derive(Debug)]
enum FileOutcome {
    Converted {
        path: PathBuf,
        duration: Duration,
        lossy: bool,
    },
    Failed {
        path: PathBuf,
        reason: String,
        duration: Duration,
    },
    Cancelled {
        path: PathBuf,
    },
}

pub async fn handle_batch(dir: &Path, job: BatchJob) -> anyhow::Result<()> {
    let stats = run_batch(dir, job).await?;
    eprintln!(
        "{} converted ({} lossy), {} failed, {} skipped, {} cancelled in {:.2?} (avg {:.2?})",
        stats.succeeded,
        stats.lossy,
        stats.failed,
        stats.skipped,
        stats.cancelled,
        stats.total_duration,
        stats.average_duration(),
    );
    if stats.failed > 0 {
        anyhow::bail!("{} file(s) failed to convert", stats.failed);
    }
    Ok(())
}

/// Convert every document under `dir`.
pub async fn run_batch(dir: &Path, job: BatchJob) -> anyhow::Result<BatchStats> {
    anyhow::ensure!(job.concurrency > 0, "concurrency must be at least 1");
    anyhow::ensure!(dir.is_dir(), "{} is not a directory", dir.display());

    let mut stats = BatchStats::default();
    let mut documents = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        if is_document(entry.path()) {
            documents.push(entry.into_path());
        } else {
            debug!(path = %entry.path().display(), "skipping non-document");
            stats.skipped += 1;
        }
    }
    info!(
        dir = %dir.display(),
        documents = documents.len(),
        skipped = stats.skipped,
        concurrency = job.concurrency,
        "starting batch"
    );

    let job = Arc::new(job);
    let root = Arc::new(dir.to_path_buf());
    let stop = Arc::new(AtomicBool::new(false));

    let outcomes: Vec<FileOutcome> = stream::iter(documents.into_iter().map(|path| {
        let job = Arc::clone(&job);
        let root = Arc::clone(&root);
        let stop = Arc::clone(&stop);
        async move {
            if stop.load(Ordering::SeqCst) {
                return FileOutcome::Cancelled { path };
            }
            let task_path = path.clone();
            let task_job = Arc::clone(&job);
            let outcome = tokio::task::spawn_blocking(move || {
                convert_file(&root, &task_path, &task_job)
            })
            .await;
            let outcome = outcome.unwrap_or_else(|e| FileOutcome::Failed {
                path,
                reason: format!("conversion task failed: {e}"),
                duration: Duration::ZERO,
            });
            if matches!(outcome, FileOutcome::Failed { .. }) && job.fail_fast {
                stop.store(true, Ordering::SeqCst);
            }
            outcome
        }
    }))
    .buffer_unordered(job.concurrency)
    .collect()
    .await;

    for outcome in &outcomes {
        match outcome {
            FileOutcome::Failed { path, reason, .. } => {
                warn!(path = %path.display(), %reason, "conversion failed");
            },
            FileOutcome::Cancelled { path } => {
                debug!(path = %path.display(), "not started after earlier failure");
            },
            FileOutcome::Converted { path, lossy, .. } => {
                debug!(path = %path.display(), lossy, "converted");
            },
        }
        stats.record(outcome);
    }
    info!(
        succeeded = stats.succeeded,
        failed = stats.failed,
        cancelled = stats.cancelled,
        "batch finished"
    );
    Ok(stats)
}

fn is_document(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            DOCUMENT_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

fn convert_file(root: &Path, path: &Path, job: &BatchJob) -> FileOutcome {
    let started = Instant::now();
    let failed = |reason: String| FileOutcome::Failed {
        path: path.to_path_buf(),
        reason,
        duration: started.elapsed(),
    };

    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => return failed(format!("failed to read: {e}")),
    };
    let id = package_id(path);
    let pkg = job.from.parse(&raw, &ParseMetadata::new(id.as_str()));
    let result = job.to.generate(&pkg, &job.options);
    if result.is_error() {
        return failed(result.warnings.join("; "));
    }

    if let Some(ref out_dir) = job.out_dir {
        let relative = path
            .strip_prefix(root)
            .ok()
            .and_then(Path::parent)
            .unwrap_or_else(|| Path::new(""));
        let target = out_dir.join(relative).join(output_file_name(&id, job.to));
        if let Some(parent) = target.parent()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            return failed(format!("failed to create {}: {e}", parent.display()));
        }
        if let Err(e) = std::fs::write(&target, &result.content) {
            return failed(format!("failed to write {}: {e}", target.display()));
        }
        debug!(from = %path.display(), to = %target.display(), "wrote");
    }

    FileOutcome::Converted {
        path: path.to_path_buf(),
        duration: started.elapsed(),
        lossy: result.lossy_conversion,
    }
}
