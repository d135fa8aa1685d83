use anyhow::{Result, anyhow};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, warn, info, debug};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::app_config::Config;
use crate::encoding::EncodingResolver;
use crate::fetch::PageSource;
use crate::file_utils::{FileManager, PageStore};
use crate::manifest::{self, HelpEntry};
use crate::translation::{LogEntry, SegmentedTranslator, Translate};
use crate::url_rewrite::{self, RewriteOutcome};

// @module: Application controller for the help page batches

/// Name of the issues log written into each batch's output directory
pub const ISSUES_LOG_FILE: &str = "helptrans.issues.log";

/// Counts reported at the end of a batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} total, {} succeeded, {} failed, {} skipped",
            self.total, self.succeeded, self.failed, self.skipped
        )
    }
}

/// Main application controller
pub struct Controller {
    // @field: App configuration
    config: Config,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn resolver(&self) -> EncodingResolver {
        if self.config.download.statistical_detection {
            EncodingResolver::with_statistical_detection()
        } else {
            EncodingResolver::without_detection()
        }
    }

    fn segmented_translator(&self) -> SegmentedTranslator {
        SegmentedTranslator::new(
            self.config.translation.region_markers(),
            self.config.translation.retry_policy(),
        )
    }

    /// Load the YAML manifest named in the configuration
    pub fn load_entries(&self) -> Result<Vec<HelpEntry>> {
        let entries = manifest::load_manifest(&self.config.paths.manifest)?;
        info!("Loaded {} help page entries", entries.len());
        Ok(entries)
    }

    /// Render the manifest grouped by category, each group ordered by `order`
    pub fn list_pages(&self) -> Result<String> {
        let entries = self.load_entries()?;
        Ok(Self::format_listing(&entries))
    }

    pub fn format_listing(entries: &[HelpEntry]) -> String {
        let mut listing = format!("{} help pages:\n\n", entries.len());
        for (category, items) in manifest::group_by_category(entries) {
            listing.push_str(&format!("[{}]\n", category));
            for item in items {
                listing.push_str(&format!("   {} - {}\n", item.id, item.name));
            }
            listing.push('\n');
        }
        listing
    }

    /// Download every manifest entry into the download directory
    pub async fn run_download(&self, source: &dyn PageSource, force_overwrite: bool) -> Result<BatchSummary> {
        let start_time = Instant::now();
        let entries = self.load_entries()?;
        let store = PageStore::new(&self.config.paths.download_dir);
        FileManager::ensure_dir(store.dir())?;

        let resolver = self.resolver();
        let delay = Duration::from_millis(self.config.download.request_delay_ms);
        let mut summary = BatchSummary { total: entries.len(), ..BatchSummary::default() };
        let mut issues = Vec::new();

        let progress_bar = Self::progress_bar(entries.len() as u64, "pages");
        progress_bar.set_message("Downloading");

        for (index, entry) in entries.iter().enumerate() {
            progress_bar.set_message(format!("Downloading: {}", entry.id));
            debug!("[{}] {} ({})", entry.category(), entry.id, entry.name);

            if !entry.has_detail_url() {
                warn!("Skipping {}: no detailUrl", entry.id);
                summary.skipped += 1;
                progress_bar.inc(1);
                continue;
            }

            if store.exists(&entry.id) && !force_overwrite {
                debug!("Skipping {}: already downloaded (use -f to force overwrite)", entry.id);
                summary.skipped += 1;
                progress_bar.inc(1);
                continue;
            }

            match Self::download_entry(source, &resolver, &store, entry).await {
                Ok(path) => {
                    debug!("Saved {}", path.display());
                    summary.succeeded += 1;
                }
                Err(e) => {
                    error!("Failed to download {}: {}", entry.id, e);
                    issues.push(LogEntry::error(format!("{}: {}", entry.id, e)));
                    summary.failed += 1;
                }
            }
            progress_bar.inc(1);

            if index + 1 < entries.len() {
                Self::pause(delay).await;
            }
        }

        progress_bar.finish_with_message("Download complete");
        self.finish_batch("Download", store.dir(), &summary, issues, start_time.elapsed());
        Ok(summary)
    }

    /// Download one entry by id, overwriting any existing copy
    pub async fn download_single(&self, source: &dyn PageSource, id: &str) -> Result<PathBuf> {
        let entries = self.load_entries()?;
        let entry = manifest::find_entry(&entries, id)
            .ok_or_else(|| anyhow!("No help page with id '{}'", id))?;

        if !entry.has_detail_url() {
            return Err(anyhow!("Help page '{}' has no detailUrl", id));
        }

        let store = PageStore::new(&self.config.paths.download_dir);
        let path = Self::download_entry(source, &self.resolver(), &store, entry).await?;
        info!("Downloaded {}", path.display());
        Ok(path)
    }

    async fn download_entry(
        source: &dyn PageSource,
        resolver: &EncodingResolver,
        store: &PageStore,
        entry: &HelpEntry,
    ) -> Result<PathBuf> {
        let raw = source.fetch(&entry.detail_url).await?;
        let decoded = resolver.resolve_document(&raw);
        debug!("{}: decoded as {} ({:?})", entry.id, decoded.encoding, decoded.method);
        store.write(&entry.id, &decoded.text)
    }

    /// Translate every downloaded page into the translated directory
    pub async fn run_translate(&self, backend: &dyn Translate, force_overwrite: bool) -> Result<BatchSummary> {
        let start_time = Instant::now();
        let input_store = PageStore::new(&self.config.paths.download_dir);
        let output_store = PageStore::new(&self.config.paths.translated_dir);

        if !FileManager::dir_exists(input_store.dir()) {
            return Err(anyhow!("Input directory does not exist: {:?}", input_store.dir()));
        }
        FileManager::ensure_dir(output_store.dir())?;

        let pages = input_store.list()?;
        if pages.is_empty() {
            warn!("No HTML files found in {:?}", input_store.dir());
        }

        // Translating in place: existing outputs are the inputs
        let in_place = input_store.dir() == output_store.dir();
        let translator = self.segmented_translator();
        let delay = Duration::from_millis(self.config.translation.common.document_delay_ms);
        let mut summary = BatchSummary { total: pages.len(), ..BatchSummary::default() };
        let mut issues = Vec::new();

        let progress_bar = Self::progress_bar(pages.len() as u64, "files");
        progress_bar.set_message("Translating");

        for (index, page) in pages.iter().enumerate() {
            let Some(id) = page.file_stem().map(|stem| stem.to_string_lossy().to_string()) else {
                summary.skipped += 1;
                progress_bar.inc(1);
                continue;
            };
            progress_bar.set_message(format!("Translating: {}", id));

            if !in_place && output_store.exists(&id) && !force_overwrite {
                debug!("Skipping {}: translation already exists (use -f to force overwrite)", id);
                summary.skipped += 1;
                progress_bar.inc(1);
                continue;
            }

            let content = match FileManager::read_to_string(page) {
                Ok(content) => content,
                Err(e) => {
                    error!("Failed to read {}: {}", page.display(), e);
                    issues.push(LogEntry::error(format!("{}: {}", id, e)));
                    summary.failed += 1;
                    progress_bar.inc(1);
                    continue;
                }
            };

            let translated = translator.translate(&content, backend).await;
            let report = &translated.report;
            debug!(
                "{}: {}/{} segments translated, {} failed",
                id, report.translated, report.eligible, report.failed
            );
            issues.extend(
                report.issues.iter()
                    .map(|entry| LogEntry::new(entry.level.clone(), format!("{}: {}", id, entry.message))),
            );

            match output_store.write(&id, &translated.text) {
                Ok(_) => summary.succeeded += 1,
                Err(e) => {
                    error!("Failed to write translation of {}: {}", id, e);
                    issues.push(LogEntry::error(format!("{}: {}", id, e)));
                    summary.failed += 1;
                }
            }
            progress_bar.inc(1);

            if index + 1 < pages.len() {
                Self::pause(delay).await;
            }
        }

        progress_bar.finish_with_message("Translation complete");
        self.finish_batch("Translation", output_store.dir(), &summary, issues, start_time.elapsed());
        Ok(summary)
    }

    /// Point the JSON manifest's detailUrl fields at the translated pages
    pub fn run_rewrite_urls(&self, output: Option<&Path>) -> Result<RewriteOutcome> {
        url_rewrite::rewrite_file(
            &self.config.paths.url_manifest,
            output,
            &self.config.url_rewrite.template,
        )
    }

    fn finish_batch(&self, name: &str, dir: &Path, summary: &BatchSummary, mut issues: Vec<LogEntry>, duration: Duration) {
        let summary_message = format!("{} completed: {}", name, summary);
        info!("{} in {}", summary_message, Self::format_duration(duration));

        issues.push(LogEntry::info(format!(
            "{} - Duration: {}",
            summary_message,
            Self::format_duration(duration)
        )));

        let log_file_path = dir.join(ISSUES_LOG_FILE);
        let context = format!("{}: {}", name, dir.display());
        if let Err(e) = Self::write_logs_to_file(&issues, &log_file_path, &context) {
            warn!("Failed to write logs to file: {}", e);
        } else {
            debug!("Logs written to {}", log_file_path.display());
        }
    }

    /// Write batch logs to a log file
    fn write_logs_to_file(logs: &[LogEntry], file_path: &Path, context: &str) -> Result<()> {
        let mut log_content = String::new();

        log_content.push_str(&format!("Batch Log - {}\n", chrono::Local::now().format("%Y-%m-%d %H:%M:%S")));
        log_content.push_str(&format!("Context: {}\n\n", context));

        for entry in logs {
            log_content.push_str(&format!("{}\n", entry));
        }

        FileManager::write_to_file(file_path, &log_content)
    }

    fn progress_bar(len: u64, unit: &str) -> ProgressBar {
        let progress_bar = ProgressBar::new(len);
        let style = ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {} ({{percent}}%) {{msg}} {{eta}}",
                unit
            ))
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style.progress_chars("█▓▒░"));
        progress_bar
    }

    async fn pause(duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }

    // Format duration in a human-readable format
    pub fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
