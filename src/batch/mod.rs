//! Batch orchestration across a work list
//!
//! Drives the conversion engine over an ordered list of work items with
//! per-item preset resolution, retry with backoff, pause/resume/stop, an
//! inter-call throttle for the completion service, and per-business output
//! partitioning. Items are processed strictly sequentially: title uniqueness
//! accumulates in the engine across items, and the throttle contract forbids
//! concurrent calls.

mod estimate;

pub use estimate::{estimate_usage, UsageEstimate};

use crate::engine::ConversionEngine;
use crate::models::{BusinessProfile, ItemStatus, WorkItem};
use crate::presets::PresetStore;
use crate::utils::{lock_mutex_recover, run_timestamp, ResultExt};
use crate::worklist::escape_csv_field;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Subdirectory names inside a business's run directory.
const SUCCESS_DIR: &str = "성공";
const FAILED_DIR: &str = "실패";
/// Failure report filename inside the failed directory.
const FAILURE_REPORT_FILE: &str = "failed_items.csv";
/// Per-business summary filename at the business root.
const SUMMARY_FILE: &str = "summary.json";

/// Settings for one batch run.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Root under which run-scoped output directories are created.
    pub output_base_dir: PathBuf,
    /// Directory the preset store resolves references against.
    pub preset_dir: PathBuf,
    /// Attempts per item before it is terminally failed.
    pub max_retries: u32,
    /// Fixed backoff between attempts of the same item.
    pub retry_delay_secs: u64,
    /// Throttle between completed items, protecting the completion service.
    pub api_delay_secs: u64,
    /// Poll interval while paused.
    pub pause_poll_ms: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            output_base_dir: PathBuf::from("output"),
            preset_dir: PathBuf::from("업체정보"),
            max_retries: 3,
            retry_delay_secs: 5,
            api_delay_secs: 2,
            pause_poll_ms: 500,
        }
    }
}

/// Control handle for a running batch. Clone it into a controlling thread;
/// the worker observes flags cooperatively at item boundaries.
#[derive(Clone, Default)]
pub struct BatchHandle {
    stop_requested: Arc<Mutex<bool>>,
    pause_requested: Arc<Mutex<bool>>,
}

impl BatchHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request the run to end. The in-flight item completes; items not yet
    /// reached stay pending.
    pub fn stop(&self) {
        *lock_mutex_recover(&self.stop_requested) = true;
        log::info!("[Batch] stop requested");
    }

    /// Hold the run before the next item.
    pub fn pause(&self) {
        *lock_mutex_recover(&self.pause_requested) = true;
        log::info!("[Batch] pause requested");
    }

    pub fn resume(&self) {
        *lock_mutex_recover(&self.pause_requested) = false;
        log::info!("[Batch] resumed");
    }

    pub fn is_stop_requested(&self) -> bool {
        *lock_mutex_recover(&self.stop_requested)
    }

    pub fn is_pause_requested(&self) -> bool {
        *lock_mutex_recover(&self.pause_requested)
    }
}

/// Progress events emitted on the optional status channel.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BatchStatusEvent {
    ItemStarted {
        index: usize,
        keyword: String,
    },
    Retrying {
        index: usize,
        attempt: u32,
        max_retries: u32,
        error: String,
    },
    ItemFinished {
        index: usize,
        status: ItemStatus,
        message: String,
    },
    Progress {
        completed: usize,
        total: usize,
    },
}

/// Per-business outcome counts.
#[derive(Debug, Clone, Serialize)]
pub struct BusinessSummary {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub business_name: String,
    pub timestamp: String,
}

/// Aggregate outcome of a whole run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub by_business: BTreeMap<String, BusinessSummary>,
    pub timestamp: String,
    pub run_id: String,
}

/// Success/failed directory pair for one business within a run.
struct OutputDirs {
    success: PathBuf,
    failed: PathBuf,
}

/// Drives a whole batch run on the calling (worker) thread.
pub struct BatchOrchestrator {
    config: BatchConfig,
    engine: ConversionEngine,
    preset_store: PresetStore,
    handle: BatchHandle,
    status_tx: Option<Sender<BatchStatusEvent>>,
    run_id: String,
}

impl BatchOrchestrator {
    pub fn new(config: BatchConfig, engine: ConversionEngine) -> Self {
        let preset_store = PresetStore::new(&config.preset_dir);
        Self {
            config,
            engine,
            preset_store,
            handle: BatchHandle::new(),
            status_tx: None,
            run_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// Handle for a controlling thread to stop/pause/resume this run.
    pub fn handle(&self) -> BatchHandle {
        self.handle.clone()
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Attach a status event channel.
    pub fn set_status_sender(&mut self, sender: Sender<BatchStatusEvent>) {
        self.status_tx = Some(sender);
    }

    fn emit(&self, event: BatchStatusEvent) {
        if let Some(tx) = &self.status_tx {
            if tx.send(event).is_err() {
                log::debug!("[Batch] status receiver dropped");
            }
        }
    }

    /// Process every item in order and return the aggregate summary.
    ///
    /// Individual item failures never abort the run; only an empty work list
    /// or an invalid default profile prevents it from starting.
    pub fn run(
        &mut self,
        items: &mut [WorkItem],
        default_profile: &BusinessProfile,
    ) -> Result<RunSummary, String> {
        if items.is_empty() {
            return Err("work list contains no items".to_string());
        }
        default_profile
            .validate()
            .map_err(|e| format!("invalid default business profile: {}", e))?;

        let timestamp = run_timestamp();
        let total = items.len();
        let mut preset_cache: HashMap<String, BusinessProfile> = HashMap::new();
        let mut output_dirs: HashMap<String, OutputDirs> = HashMap::new();
        let mut completed = 0usize;

        log::info!(
            "[Batch] run {} starting: {} item(s), output under {}",
            self.run_id,
            total,
            self.config.output_base_dir.display()
        );

        for i in 0..items.len() {
            if self.handle.is_stop_requested() {
                log::warn!("[Batch] stopped before item {} of {}", i + 1, total);
                break;
            }

            // Cooperative pause; stop wins over pause
            while self.handle.is_pause_requested() && !self.handle.is_stop_requested() {
                std::thread::sleep(Duration::from_millis(self.config.pause_poll_ms));
            }
            if self.handle.is_stop_requested() {
                log::warn!("[Batch] stopped while paused before item {}", i + 1);
                break;
            }

            let item = &mut items[i];
            log::info!(
                "[Batch] item {}/{}: '{}' ({})",
                i + 1,
                total,
                item.keyword,
                item.source_file.display()
            );
            self.emit(BatchStatusEvent::ItemStarted {
                index: item.index,
                keyword: item.keyword.clone(),
            });

            loop {
                let started = Instant::now();
                let attempt_result = Self::process_item(
                    &mut self.engine,
                    &self.preset_store,
                    &self.config,
                    item,
                    default_profile,
                    &mut preset_cache,
                    &mut output_dirs,
                    &timestamp,
                );
                item.elapsed_secs = started.elapsed().as_secs_f64();

                match attempt_result {
                    Ok(()) => {
                        log::info!(
                            "[Batch] item {} succeeded in {:.1}s",
                            i + 1,
                            item.elapsed_secs
                        );
                        self.emit(BatchStatusEvent::ItemFinished {
                            index: item.index,
                            status: ItemStatus::Success,
                            message: format!("완료 ({:.1}초)", item.elapsed_secs),
                        });
                        break;
                    }
                    Err(error) => {
                        item.retry_count += 1;
                        let _ = item.set_status(ItemStatus::Failed);
                        item.error = Some(error.clone());

                        if item.retry_count < self.config.max_retries {
                            log::warn!(
                                "[Batch] item {} attempt {}/{} failed: {}. Retrying in {}s...",
                                i + 1,
                                item.retry_count,
                                self.config.max_retries,
                                error,
                                self.config.retry_delay_secs
                            );
                            self.emit(BatchStatusEvent::Retrying {
                                index: item.index,
                                attempt: item.retry_count,
                                max_retries: self.config.max_retries,
                                error: error.clone(),
                            });
                            std::thread::sleep(Duration::from_secs(self.config.retry_delay_secs));
                            continue;
                        }

                        log::error!(
                            "[Batch] item {} failed terminally after {} attempt(s): {}",
                            i + 1,
                            item.retry_count,
                            error
                        );
                        self.emit(BatchStatusEvent::ItemFinished {
                            index: item.index,
                            status: ItemStatus::Failed,
                            message: error,
                        });
                        break;
                    }
                }
            }

            completed += 1;
            self.emit(BatchStatusEvent::Progress { completed, total });

            // Throttle the completion service between items
            if completed < total {
                std::thread::sleep(Duration::from_secs(self.config.api_delay_secs));
            }
        }

        let summary = self.finish_run(items, default_profile, &mut output_dirs, &timestamp)?;
        log::info!(
            "[Batch] run {} complete: {}/{} succeeded, {} failed",
            self.run_id,
            summary.success,
            summary.total,
            summary.failed
        );
        Ok(summary)
    }

    /// One attempt at one item. Any error is a failed attempt; the caller
    /// owns retry policy.
    #[allow(clippy::too_many_arguments)]
    fn process_item(
        engine: &mut ConversionEngine,
        preset_store: &PresetStore,
        config: &BatchConfig,
        item: &mut WorkItem,
        default_profile: &BusinessProfile,
        preset_cache: &mut HashMap<String, BusinessProfile>,
        output_dirs: &mut HashMap<String, OutputDirs>,
        timestamp: &str,
    ) -> Result<(), String> {
        item.set_status(ItemStatus::Processing)
            .map_err(|e| e.to_string())?;

        let source_text = std::fs::read_to_string(&item.source_file).with_context(&format!(
            "Failed to read source file '{}'",
            item.source_file.display()
        ))?;

        let profile = Self::resolve_profile(preset_store, item, default_profile, preset_cache);
        item.business_name = Some(profile.name.clone());

        let dirs = Self::ensure_output_dirs(config, output_dirs, &profile.name, timestamp)?;
        let success_dir = dirs.success.clone();

        let derived = profile.with_keyword(item.keyword.clone());
        let outcome = engine.convert(&source_text, &derived)?;

        let filename = format!("{}_{}.txt", profile.name, item.keyword);
        let output_path = success_dir.join(filename);
        std::fs::write(&output_path, outcome.document()).with_context(&format!(
            "Failed to write output file '{}'",
            output_path.display()
        ))?;

        item.result_text = Some(outcome.document());
        item.output_path = Some(output_path);
        item.error = None;
        item.set_status(ItemStatus::Success)
            .map_err(|e| e.to_string())?;
        Ok(())
    }

    /// Resolve the effective profile for an item, caching by preset
    /// reference. A missing or corrupt preset downgrades to the default
    /// profile and is cached under the same reference so later items do not
    /// retry the lookup.
    fn resolve_profile(
        preset_store: &PresetStore,
        item: &WorkItem,
        default_profile: &BusinessProfile,
        cache: &mut HashMap<String, BusinessProfile>,
    ) -> BusinessProfile {
        let preset_ref = match &item.preset_ref {
            Some(preset_ref) => preset_ref,
            None => return default_profile.clone(),
        };

        if let Some(cached) = cache.get(preset_ref) {
            return cached.clone();
        }

        let resolved = match preset_store.load(preset_ref) {
            Ok(profile) => profile,
            Err(e) => {
                log::warn!(
                    "[Batch] preset '{}' could not be loaded ({}); falling back to default profile",
                    preset_ref,
                    e
                );
                default_profile.clone()
            }
        };
        cache.insert(preset_ref.clone(), resolved.clone());
        resolved
    }

    /// Create (idempotently) the success/failed directory pair for a
    /// business and return it.
    fn ensure_output_dirs<'a>(
        config: &BatchConfig,
        output_dirs: &'a mut HashMap<String, OutputDirs>,
        business_name: &str,
        timestamp: &str,
    ) -> Result<&'a OutputDirs, String> {
        if !output_dirs.contains_key(business_name) {
            // Run-scoped timestamp root, one directory per business under it
            let root = config.output_base_dir.join(timestamp).join(business_name);
            let success = root.join(SUCCESS_DIR);
            let failed = root.join(FAILED_DIR);
            std::fs::create_dir_all(&success).with_context(&format!(
                "Failed to create output directory '{}'",
                success.display()
            ))?;
            std::fs::create_dir_all(&failed).with_context(&format!(
                "Failed to create output directory '{}'",
                failed.display()
            ))?;
            output_dirs.insert(
                business_name.to_string(),
                OutputDirs { success, failed },
            );
        }
        Ok(&output_dirs[business_name])
    }

    /// Write failure reports and per-business summaries, and assemble the
    /// aggregate run summary.
    fn finish_run(
        &self,
        items: &[WorkItem],
        default_profile: &BusinessProfile,
        output_dirs: &mut HashMap<String, OutputDirs>,
        timestamp: &str,
    ) -> Result<RunSummary, String> {
        // Failed items grouped by business; items that failed before a
        // profile could be resolved belong to the default business
        let mut failed_by_business: BTreeMap<String, Vec<&WorkItem>> = BTreeMap::new();
        for item in items {
            if item.status != ItemStatus::Failed {
                continue;
            }
            let business = item
                .business_name
                .clone()
                .unwrap_or_else(|| default_profile.name.clone());
            failed_by_business.entry(business).or_default().push(item);
        }

        for (business, failed_items) in &failed_by_business {
            let dirs =
                Self::ensure_output_dirs(&self.config, output_dirs, business, timestamp)?;
            let report_path = dirs.failed.join(FAILURE_REPORT_FILE);
            let mut report = String::from("원본파일경로,키워드,프리셋파일,에러메시지\n");
            for item in failed_items {
                report.push_str(&format!(
                    "{},{},{},{}\n",
                    escape_csv_field(&item.source_file.display().to_string()),
                    escape_csv_field(&item.keyword),
                    escape_csv_field(item.preset_ref.as_deref().unwrap_or("")),
                    escape_csv_field(item.error.as_deref().unwrap_or("")),
                ));
            }
            std::fs::write(&report_path, report).with_context(&format!(
                "Failed to write failure report '{}'",
                report_path.display()
            ))?;
            log::info!(
                "[Batch] wrote failure report for '{}' ({} item(s))",
                business,
                failed_items.len()
            );
        }

        // Per-business summaries over every item that resolved to that
        // business
        let mut by_business = BTreeMap::new();
        for (business, dirs) in output_dirs.iter() {
            let business_items: Vec<&WorkItem> = items
                .iter()
                .filter(|item| item.business_name.as_deref() == Some(business.as_str()))
                .collect();
            let success = business_items
                .iter()
                .filter(|item| item.status == ItemStatus::Success)
                .count();
            let failed = business_items
                .iter()
                .filter(|item| item.status == ItemStatus::Failed)
                .count();
            let summary = BusinessSummary {
                total: business_items.len(),
                success,
                failed,
                business_name: business.clone(),
                timestamp: timestamp.to_string(),
            };

            let summary_path = dirs
                .success
                .parent()
                .map(|p| p.join(SUMMARY_FILE))
                .ok_or_else(|| "output directory has no parent".to_string())?;
            let contents = serde_json::to_string_pretty(&summary)
                .map_err(|e| format!("Failed to serialize summary: {}", e))?;
            std::fs::write(&summary_path, contents).with_context(&format!(
                "Failed to write summary '{}'",
                summary_path.display()
            ))?;

            by_business.insert(business.clone(), summary);
        }

        let success = items
            .iter()
            .filter(|item| item.status == ItemStatus::Success)
            .count();
        let failed = items
            .iter()
            .filter(|item| item.status == ItemStatus::Failed)
            .count();

        Ok(RunSummary {
            total: items.len(),
            success,
            failed,
            by_business,
            timestamp: timestamp.to_string(),
            run_id: self.run_id.clone(),
        })
    }
}
