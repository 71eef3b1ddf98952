//! End-to-end scan pipeline
//!
//! intake checks → staging → sniffing → expansion → ordering → dispatch →
//! aggregation. Each request owns one [`ResourceGuard`], released on every
//! exit path before the result is returned.

use anyhow::Context;
use std::path::Path;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use triage_analyzers::{
    AnalyzerPool, AnalyzerRegistry, Dispatcher, DocumentAnalyzer, FrameSampling, HttpClassifier,
    ImageAnalyzer, LabelNormalizer, VideoAnalyzer,
};
use triage_core::{
    mime_table, ArchiveManifest, ErrorMetadata, LogLevel, ResolvedType, ScanEnvelope, ScanError,
    ScanRequest, ScanResult, ScanTarget, SkipReason, TriageConfig,
};
use triage_processing::{
    ArchiveExpander, ArchiveKind, ExpansionLimits, IntakeValidator, PriorityScheduler,
    ResourceGuard, TypeSniffer, ValidationError,
};

use super::types::{IntakeRequest, ScanInput};
use crate::aggregator::ResultAggregator;

/// Shared, stateless across requests. Clone or wrap in `Arc` to serve
/// concurrent requests.
#[derive(Clone)]
pub struct ScanService {
    config: Arc<TriageConfig>,
    validator: IntakeValidator,
    sniffer: TypeSniffer,
    expander: ArchiveExpander,
    scheduler: PriorityScheduler,
    dispatcher: Dispatcher,
    aggregator: ResultAggregator,
}

impl ScanService {
    pub fn new(config: TriageConfig, dispatcher: Dispatcher) -> Self {
        let sniffer = TypeSniffer::new(config.sniff_bytes);
        Self {
            validator: IntakeValidator::from_config(&config),
            expander: ArchiveExpander::new(ExpansionLimits::from_config(&config), sniffer),
            sniffer,
            scheduler: PriorityScheduler::new(),
            dispatcher,
            aggregator: ResultAggregator::new(config.nsfw_threshold),
            config: Arc::new(config),
        }
    }

    /// Service with the built-in image, video and document analyzers, all
    /// sharing one classifier pool.
    pub async fn with_pool(config: TriageConfig, pool: Arc<AnalyzerPool>) -> Result<Self, ScanError> {
        let registry = AnalyzerRegistry::new();
        registry
            .register(Arc::new(ImageAnalyzer::new(Arc::clone(&pool))), "Still images")
            .await?;
        registry
            .register(
                Arc::new(VideoAnalyzer::new(
                    Arc::clone(&pool),
                    FrameSampling::from_config(&config),
                )),
                "Frames sampled with ffmpeg",
            )
            .await?;
        registry
            .register(
                Arc::new(DocumentAnalyzer::new(pool)),
                "Images embedded in PDF, DOC and DOCX",
            )
            .await?;

        let dispatcher = Dispatcher::new(registry, LabelNormalizer::from_config(&config));
        Ok(Self::new(config, dispatcher))
    }

    /// Service backed by the remote classifier endpoint named in `config`.
    pub async fn from_config(config: TriageConfig) -> anyhow::Result<Self> {
        let pool = AnalyzerPool::new(
            HttpClassifier::factory(&config),
            config.analyzer_reset_threshold,
        )
        .context("Failed to build classifier pool")?;

        let service = Self::with_pool(config, Arc::new(pool))
            .await
            .context("Failed to register analyzers")?;
        Ok(service)
    }

    pub fn config(&self) -> &TriageConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Run one request to a verdict.
    ///
    /// Tripping `cancel` aborts with [`ScanError::Cancelled`]. Temporary files
    /// are gone by the time this returns, whatever the outcome.
    pub async fn scan(
        &self,
        request: IntakeRequest,
        cancel: &CancellationToken,
    ) -> Result<ScanEnvelope, ScanError> {
        let started = std::time::Instant::now();
        let base_dir = self
            .config
            .temp_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir);
        let guard = Arc::new(ResourceGuard::in_dir(base_dir));

        let outcome = self.run(request, &guard, cancel).await;
        let released = guard.release();
        let duration_ms = started.elapsed().as_millis() as u64;

        match &outcome {
            Ok(envelope) => tracing::info!(
                status = ?envelope.status(),
                overall_flag = envelope.overall_flag(),
                files = envelope.reports().len(),
                released,
                duration_ms,
                "Scan completed"
            ),
            Err(e) => log_failure(e, released, duration_ms),
        }
        outcome
    }

    async fn run(
        &self,
        request: IntakeRequest,
        guard: &Arc<ResourceGuard>,
        cancel: &CancellationToken,
    ) -> Result<ScanEnvelope, ScanError> {
        let deadline = Instant::now() + self.config.request_timeout;

        self.validator.validate_token(request.token.as_deref())?;

        let scan_request = self.stage(request, guard).await?;
        if cancel.is_cancelled() {
            return Err(ScanError::Cancelled);
        }

        let root_type = self
            .sniffer
            .resolve_path(&scan_request.source, &scan_request.claimed_name)?;
        tracing::info!(
            request_id = %scan_request.id,
            file = %scan_request.claimed_name,
            bytes = scan_request.size_bytes,
            mime = %root_type.mime,
            received_at = %scan_request.received_at,
            "Scan request accepted"
        );

        let (mut manifest, expanded) = self
            .build_manifest(scan_request, root_type, guard, cancel, deadline)
            .await?;
        let targets = self
            .scheduler
            .order(std::mem::take(&mut manifest.ordered_targets));
        let results = self.analyze(targets, guard, cancel, deadline).await?;

        let verdict = self.aggregator.aggregate(&manifest, results);
        Ok(self
            .aggregator
            .envelope(verdict, &manifest.root_request.claimed_name, expanded))
    }

    /// Validate the input and make sure its content sits in a local file.
    ///
    /// Size is checked against the budget before any content is read.
    async fn stage(
        &self,
        request: IntakeRequest,
        guard: &ResourceGuard,
    ) -> Result<ScanRequest, ScanError> {
        let budget = request.max_size_bytes;
        match request.input {
            ScanInput::Path(path) => {
                let (canonical, size) = self.validator.validate_path(&path)?;
                self.validator.validate_file_size(size, budget)?;

                let name = request
                    .claimed_name
                    .or_else(|| file_name(&canonical))
                    .ok_or_else(|| ValidationError::InvalidFilename(path.display().to_string()))?;
                self.validator.validate_claimed_name(&name)?;
                Ok(ScanRequest::new(canonical, name, size))
            }
            ScanInput::Upload { data, content_type } => {
                let name = request
                    .claimed_name
                    .ok_or_else(|| ValidationError::InvalidFilename("missing file name".to_string()))?;
                self.validator.validate_claimed_name(&name)?;
                self.validator
                    .validate_content_type(content_type.as_deref())?;
                let size = data.len() as u64;
                self.validator.validate_file_size(size, budget)?;

                let suffix = mime_table::extension_of(&name).unwrap_or_default();
                let (file, lease) = guard.create_file(&suffix)?;
                let mut file = tokio::fs::File::from_std(file);
                file.write_all(&data).await?;
                file.flush().await?;

                Ok(ScanRequest::new(lease.path().to_path_buf(), name, size))
            }
        }
    }

    /// Expand archives; everything else is a one-target manifest.
    ///
    /// Returns whether the request was expanded.
    async fn build_manifest(
        &self,
        request: ScanRequest,
        root_type: ResolvedType,
        guard: &Arc<ResourceGuard>,
        cancel: &CancellationToken,
        deadline: Instant,
    ) -> Result<(ArchiveManifest, bool), ScanError> {
        if !root_type.is_archive() {
            let target = ScanTarget::resolved(
                request.source.clone(),
                request.claimed_name.clone(),
                root_type,
                vec![],
                request.size_bytes,
            );
            return Ok((ArchiveManifest::single(request, target), false));
        }

        if ArchiveKind::from_mime(&root_type.mime).is_none() {
            tracing::debug!(mime = %root_type.mime, "Container format cannot be expanded");
            let target = ScanTarget::skipped(
                request.source.clone(),
                request.claimed_name.clone(),
                Some(root_type),
                vec![],
                request.size_bytes,
                SkipReason::UnsupportedContainer,
            );
            return Ok((ArchiveManifest::single(request, target), false));
        }

        // The walk stops itself at the deadline and hands back a truncated
        // manifest; the child token stops it on cancellation.
        let expander = self.expander.clone();
        let blocking_guard = Arc::clone(guard);
        let token = cancel.child_token();
        let std_deadline = deadline.into_std();
        let task = tokio::task::spawn_blocking(move || {
            expander.expand(&request, &root_type, &blocking_guard, &token, Some(std_deadline))
        });

        tokio::select! {
            _ = cancel.cancelled() => Err(ScanError::Cancelled),
            joined = task => match joined {
                Ok(result) => result.map(|manifest| (manifest, true)),
                Err(e) => Err(ScanError::Internal(format!(
                    "archive expansion task failed: {}",
                    e
                ))),
            },
        }
    }

    /// Dispatch targets one at a time in scheduler order.
    async fn analyze(
        &self,
        targets: Vec<ScanTarget>,
        guard: &ResourceGuard,
        cancel: &CancellationToken,
        deadline: Instant,
    ) -> Result<Vec<ScanResult>, ScanError> {
        let mut results = Vec::with_capacity(targets.len());
        let mut flagged = false;
        let mut skipped = 0usize;
        let mut timed_out = 0usize;

        for target in targets {
            if cancel.is_cancelled() {
                return Err(ScanError::Cancelled);
            }
            if flagged && !self.config.check_all_files {
                skipped += 1;
                results.push(ScanResult::skipped(target));
                continue;
            }
            if Instant::now() >= deadline {
                timed_out += 1;
                results.push(ScanResult::timed_out(target));
                continue;
            }

            let fallback = target.clone();
            let result = tokio::select! {
                _ = cancel.cancelled() => return Err(ScanError::Cancelled),
                dispatched = tokio::time::timeout_at(deadline, self.dispatcher.dispatch(target, guard)) => {
                    dispatched.unwrap_or_else(|_| {
                        timed_out += 1;
                        ScanResult::timed_out(fallback)
                    })
                }
            };

            if !flagged && self.aggregator.is_flagged(&result) {
                tracing::info!(
                    file = %result.target.display_name,
                    depth = result.target.origin_depth,
                    "Target flagged"
                );
                flagged = true;
            }
            results.push(result);
        }

        if skipped > 0 || timed_out > 0 {
            tracing::debug!(skipped, timed_out, "Targets left unanalyzed");
        }
        Ok(results)
    }
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}

fn log_failure(err: &ScanError, released: usize, duration_ms: u64) {
    let kind = err.error_kind().as_str();
    match err.log_level() {
        LogLevel::Error => {
            tracing::error!(error = %err, error_kind = kind, released, duration_ms, "Scan failed")
        }
        LogLevel::Warn => {
            tracing::warn!(error = %err, error_kind = kind, released, duration_ms, "Scan failed")
        }
        LogLevel::Debug => {
            tracing::debug!(error = %err, error_kind = kind, released, duration_ms, "Scan rejected")
        }
    }
}
