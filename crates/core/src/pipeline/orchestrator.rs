//! Pipeline orchestrator implementation.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::content::{classify, Artifact, CANONICAL_VIDEO_EXTENSION};
use crate::converter::{TranscodeJob, Transcoder};
use crate::delivery::{ChatPlatform, DeliveryDispatcher, DeliveryReceipt};
use crate::downloader::{DownloadError, DownloadResult, HttpDownloader, ProgressEvent};
use crate::metrics;
use crate::source::{
    sanitize_file_name, suggested_file_name, FetchPlan, SourceResolver, FALLBACK_FILE_NAME,
};

use super::error::PipelineError;
use super::types::{
    DeliveryOutcome, PipelineReport, PipelineRequest, PipelineStage, StatusEvent,
};
use super::workspace::Workspace;

/// Name the payload is streamed to before it gets its final name.
const STAGING_FILE_NAME: &str = ".incoming";

/// Buffer between the downloader and the status forwarder.
const PROGRESS_BUFFER: usize = 16;

/// Settings the orchestrator needs beyond its components.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub temp_root: PathBuf,
    pub video_extensions: Vec<String>,
}

impl From<&Config> for PipelineSettings {
    fn from(config: &Config) -> Self {
        Self {
            temp_root: config.workspace.temp_root.clone(),
            video_extensions: config.converter.video_extensions.clone(),
        }
    }
}

/// Runs download, classify, normalize and deliver for one request at a time.
///
/// Cloning is cheap; clones share the same components. Runs share no mutable
/// state, so any number can execute concurrently on separate tasks.
pub struct PipelineOrchestrator<T: Transcoder> {
    resolver: Arc<SourceResolver>,
    downloader: Arc<HttpDownloader>,
    transcoder: Arc<T>,
    dispatcher: DeliveryDispatcher,
    settings: Arc<PipelineSettings>,
}

impl<T: Transcoder> Clone for PipelineOrchestrator<T> {
    fn clone(&self) -> Self {
        Self {
            resolver: Arc::clone(&self.resolver),
            downloader: Arc::clone(&self.downloader),
            transcoder: Arc::clone(&self.transcoder),
            dispatcher: self.dispatcher.clone(),
            settings: Arc::clone(&self.settings),
        }
    }
}

/// Mutable bookkeeping for one run.
struct RunContext<'a> {
    run_id: Uuid,
    stage: PipelineStage,
    status: &'a mpsc::Sender<StatusEvent>,
}

impl RunContext<'_> {
    async fn enter(&mut self, stage: PipelineStage, detail: Option<String>) {
        info!(
            run_id = %self.run_id,
            from = %self.stage,
            to = %stage,
            "Pipeline stage transition"
        );
        self.stage = stage;
        self.notify(StatusEvent::Stage { stage, detail }).await;
    }

    async fn notify(&self, event: StatusEvent) {
        if self.status.send(event).await.is_err() {
            debug!(run_id = %self.run_id, "Status receiver gone, event dropped");
        }
    }
}

impl<T: Transcoder + 'static> PipelineOrchestrator<T> {
    pub fn new(
        resolver: SourceResolver,
        downloader: HttpDownloader,
        transcoder: Arc<T>,
        dispatcher: DeliveryDispatcher,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            resolver: Arc::new(resolver),
            downloader: Arc::new(downloader),
            transcoder,
            dispatcher,
            settings: Arc::new(settings),
        }
    }

    /// Builds every component from `config`.
    pub fn from_config(
        config: &Config,
        transcoder: Arc<T>,
        platform: Arc<dyn ChatPlatform>,
    ) -> Result<Self, PipelineError> {
        let resolver = SourceResolver::new(&config.source)?;
        let downloader =
            HttpDownloader::new(&config.http, &config.source, &config.downloader)?;
        let dispatcher = DeliveryDispatcher::new(platform, config.delivery.clone());

        Ok(Self::new(
            resolver,
            downloader,
            transcoder,
            dispatcher,
            PipelineSettings::from(config),
        ))
    }

    /// Runs `request` on its own task.
    pub fn spawn(
        &self,
        request: PipelineRequest,
        status: mpsc::Sender<StatusEvent>,
        cancel: CancellationToken,
    ) -> JoinHandle<PipelineReport> {
        let this = self.clone();
        tokio::spawn(async move { this.run(request, status, cancel).await })
    }

    /// Runs one request to completion.
    ///
    /// The workspace is removed before the final [`StatusEvent::Finished`] is
    /// sent, whatever the outcome. Nothing is retried.
    pub async fn run(
        &self,
        request: PipelineRequest,
        status: mpsc::Sender<StatusEvent>,
        cancel: CancellationToken,
    ) -> PipelineReport {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let mut ctx = RunContext {
            run_id,
            stage: PipelineStage::Idle,
            status: &status,
        };
        let mut workspace: Option<Workspace> = None;

        info!(
            run_id = %run_id,
            chat_id = request.target.chat_id,
            "Pipeline started"
        );

        let result = self
            .execute(&request, &mut ctx, &mut workspace, &cancel)
            .await;
        let failed_in = ctx.stage;

        ctx.enter(PipelineStage::Cleanup, None).await;
        if let Some(ws) = workspace.as_mut() {
            ws.cleanup().await;
        }

        let (outcome, final_stage) = match result {
            Ok(receipt) => (DeliveryOutcome::Success(receipt), PipelineStage::Done),
            Err(e) => {
                let stage = e.stage(failed_in);
                warn!(run_id = %run_id, stage = %stage, error = ?e, "Pipeline failed");
                (
                    DeliveryOutcome::Failure {
                        stage,
                        reason: e.to_string(),
                    },
                    PipelineStage::Failed,
                )
            }
        };

        ctx.enter(final_stage, None).await;
        metrics::PIPELINE_RUNS
            .with_label_values(&[final_stage.as_str()])
            .inc();
        ctx.notify(StatusEvent::Finished(outcome.clone())).await;

        PipelineReport {
            run_id,
            outcome,
            final_stage,
            started_at,
            finished_at: Utc::now(),
        }
    }

    async fn execute(
        &self,
        request: &PipelineRequest,
        ctx: &mut RunContext<'_>,
        workspace: &mut Option<Workspace>,
        cancel: &CancellationToken,
    ) -> Result<DeliveryReceipt, PipelineError> {
        ctx.enter(PipelineStage::Resolving, None).await;
        let plan = self.resolver.resolve(&request.source_url)?;
        check_cancelled(cancel)?;

        let ws = workspace.insert(
            Workspace::create(&self.settings.temp_root, ctx.run_id)
                .await
                .map_err(|e| PipelineError::io(&self.settings.temp_root, e))?,
        );

        // Download
        let provisional_name = provisional_name(&plan);
        ctx.enter(PipelineStage::Downloading, Some(provisional_name.clone()))
            .await;
        let staging = ws.file(STAGING_FILE_NAME);
        let download = self.download(&plan, &staging, ctx, cancel).await?;

        // Rename within the workspace so classification sees the final name
        let declared_name = request
            .preferences
            .rename
            .as_deref()
            .and_then(|raw| {
                let name = sanitize_file_name(raw);
                if name.is_none() {
                    debug!(run_id = %ctx.run_id, rename = %raw, "Ignoring unusable rename");
                }
                name
            })
            .or(download.suggested_name)
            .unwrap_or(provisional_name);
        let path = ws.file(&declared_name);
        tokio::fs::rename(&staging, &path)
            .await
            .map_err(|e| PipelineError::io(&path, e))?;

        // Classify
        ctx.enter(PipelineStage::Classifying, Some(declared_name.clone()))
            .await;
        let classification = classify(&declared_name, &self.settings.video_extensions);
        let mut artifact = Artifact {
            path,
            declared_name,
            size_bytes: download.bytes_written,
            category: classification.category,
        };
        debug!(
            run_id = %ctx.run_id,
            category = ?artifact.category,
            needs_normalization = classification.needs_normalization,
            "Classified artifact"
        );

        // Normalize
        if classification.needs_normalization {
            ctx.enter(PipelineStage::Normalizing, Some(artifact.declared_name.clone()))
                .await;
            self.normalize(&mut artifact, ws, ctx, cancel).await?;
        }
        check_cancelled(cancel)?;

        // Deliver
        ctx.enter(PipelineStage::Delivering, Some(artifact.declared_name.clone()))
            .await;
        let receipt = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(PipelineError::Cancelled),
            result = self.dispatcher.deliver(
                &artifact,
                &request.target,
                &artifact.declared_name,
                request.preferences.thumbnail.as_deref(),
            ) => result?,
        };

        info!(
            run_id = %ctx.run_id,
            mode = %receipt.mode,
            bytes = receipt.size_bytes,
            "Artifact delivered"
        );
        Ok(receipt)
    }

    /// Streams the payload while forwarding throttled progress as status
    /// events in byte order.
    async fn download(
        &self,
        plan: &FetchPlan,
        destination: &Path,
        ctx: &RunContext<'_>,
        cancel: &CancellationToken,
    ) -> Result<DownloadResult, DownloadError> {
        let (progress_tx, mut progress_rx) = mpsc::channel::<ProgressEvent>(PROGRESS_BUFFER);
        let downloader = &self.downloader;

        let transfer = async move {
            let result = downloader
                .download(plan, destination, Some(&progress_tx), cancel)
                .await;
            drop(progress_tx);
            result
        };

        let forward = async {
            while let Some(event) = progress_rx.recv().await {
                // Progress is best-effort; a backed-up relay drops updates.
                if ctx.status.try_send(StatusEvent::Progress(event)).is_err() {
                    debug!(run_id = %ctx.run_id, "Status channel busy, progress dropped");
                }
            }
        };

        let (result, ()) = tokio::join!(transfer, forward);
        result
    }

    /// Transcodes `artifact` to mp4 in place. A failed transcode leaves the
    /// original untouched and emits a warning.
    async fn normalize(
        &self,
        artifact: &mut Artifact,
        ws: &Workspace,
        ctx: &RunContext<'_>,
        cancel: &CancellationToken,
    ) -> Result<(), PipelineError> {
        let stem = Path::new(&artifact.declared_name)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| artifact.declared_name.clone());
        let output_name = format!("{}.{}", stem, CANONICAL_VIDEO_EXTENSION);
        let output_path = ws.file(&output_name);

        let job = TranscodeJob::new(ctx.run_id.to_string(), &artifact.path, &output_path);
        let start = Instant::now();
        let result = self.transcoder.transcode(job, cancel).await;
        let elapsed = start.elapsed().as_secs_f64();

        match result {
            Ok(done) => {
                metrics::TRANSCODES_TOTAL.with_label_values(&["success"]).inc();
                metrics::TRANSCODE_DURATION
                    .with_label_values(&["success"])
                    .observe(elapsed);

                if let Err(e) = tokio::fs::remove_file(&artifact.path).await {
                    warn!(path = %artifact.path.display(), error = %e, "Failed to remove pre-transcode file");
                }
                artifact.path = done.output_path;
                artifact.declared_name = output_name;
                artifact.size_bytes = done.output_size_bytes;
                Ok(())
            }
            Err(e) if !e.is_recoverable() => {
                metrics::TRANSCODES_TOTAL.with_label_values(&["cancelled"]).inc();
                Err(PipelineError::Cancelled)
            }
            Err(e) => {
                metrics::TRANSCODES_TOTAL.with_label_values(&["failed"]).inc();
                metrics::TRANSCODE_DURATION
                    .with_label_values(&["failed"])
                    .observe(elapsed);
                warn!(
                    run_id = %ctx.run_id,
                    transcoder = self.transcoder.name(),
                    error = %e,
                    "Transcode failed, delivering original"
                );
                ctx.notify(StatusEvent::Warning(format!(
                    "Conversion failed, sending the original file ({})",
                    e
                )))
                .await;
                Ok(())
            }
        }
    }
}

fn check_cancelled(cancel: &CancellationToken) -> Result<(), PipelineError> {
    if cancel.is_cancelled() {
        Err(PipelineError::Cancelled)
    } else {
        Ok(())
    }
}

/// Name used until the server or the user supplies a better one.
fn provisional_name(plan: &FetchPlan) -> String {
    match plan.provider_file_id() {
        Some(id) => sanitize_file_name(id).unwrap_or_else(|| FALLBACK_FILE_NAME.to_string()),
        None => suggested_file_name(plan.primary_endpoint()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Url;

    #[test]
    fn test_provisional_name() {
        let plan = FetchPlan::direct(Url::parse("https://example.com/v/clip.avi?x=1").unwrap());
        assert_eq!(provisional_name(&plan), "clip.avi");

        let plan = FetchPlan::two_phase(
            Url::parse("https://docs.google.com/uc?export=download").unwrap(),
            "1AbC",
        )
        .unwrap();
        assert_eq!(provisional_name(&plan), "1AbC");
    }
}
