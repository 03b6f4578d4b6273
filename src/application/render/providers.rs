//! Built-in render strategies: synchronous file composition, dry-run preview,
//! and the long-running veo provider.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use sha2::{Digest, Sha256};
use thiserror::Error;
use time::OffsetDateTime;
use url::Url;

use crate::application::capabilities::{self, ProviderCapabilities, clamp_target_seconds};
use crate::application::render::orchestrator::{
    Disposition, RenderError, RenderOutcome, Renderer,
};
use crate::domain::entities::{
    RenderArtifact, RenderMetrics, RenderTask, VeoState, VideoAssetManifest, VideoLibraryItem,
};
use crate::domain::types::{QualityTier, RenderMode, RenderStatus, VeoPhase};

fn per_second_rate(provider: &str, tier: QualityTier) -> f64 {
    match (provider, tier) {
        ("veo", QualityTier::Fast) => 0.15,
        ("veo", QualityTier::Standard) => 0.50,
        (_, QualityTier::Fast) => 0.05,
        (_, QualityTier::Standard) => 0.10,
    }
}

fn base_metrics(
    model: &str,
    tier: QualityTier,
    provider: &str,
    target_seconds: u32,
) -> RenderMetrics {
    RenderMetrics {
        seconds_generated: 0,
        extends_requested: 0,
        extends_completed: 0,
        model: model.to_string(),
        tier,
        cost_estimate_usd: per_second_rate(provider, tier) * f64::from(target_seconds),
    }
}

/// Condensed shot list handed to generation providers as the prompt.
fn storyboard_prompt(manifest: &VideoAssetManifest) -> String {
    manifest
        .storyboard
        .iter()
        .map(|shot| {
            format!(
                "[{} {}s] {} | VO: {}",
                shot.phase.as_str(),
                shot.duration_seconds,
                shot.visual,
                shot.voice_over
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Synchronous template compositor. Renders within the call and answers 201
/// with a terminal task; registered under sync provider ids.
pub struct FileRenderer {
    provider: String,
    media_base_url: Url,
}

impl FileRenderer {
    pub fn new(provider: impl Into<String>, media_base_url: Url) -> Self {
        Self {
            provider: provider.into(),
            media_base_url,
        }
    }

    fn artifact_url(&self, item: &VideoLibraryItem, version: u32, file: &str) -> String {
        let mut url = self.media_base_url.clone();
        let item_id = item.id.to_string();
        let version_segment = format!("v{version}");
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.extend([
                "renders",
                item_id.as_str(),
                version_segment.as_str(),
                file,
            ]);
        }
        url.to_string()
    }
}

#[async_trait]
impl Renderer for FileRenderer {
    fn provider(&self) -> &str {
        &self.provider
    }

    async fn render(
        &self,
        manifest: &VideoAssetManifest,
        tier: QualityTier,
        item: &VideoLibraryItem,
    ) -> Result<RenderOutcome, RenderError> {
        if manifest.storyboard.is_empty() {
            return Err(RenderError::Validation(
                "manifest has an empty storyboard".into(),
            ));
        }
        let caps = capabilities::capabilities(&self.provider, Some(&manifest.spec.model_id));
        if !caps
            .supported_aspect_ratios
            .contains(&manifest.spec.aspect_ratio.as_str())
        {
            return Err(RenderError::Validation(format!(
                "aspect ratio `{}` unsupported by `{}`",
                manifest.spec.aspect_ratio, self.provider
            )));
        }

        let seconds = clamp_target_seconds(manifest.storyboard_seconds(), &caps);
        let mut metrics = base_metrics(&manifest.spec.model_id, tier, &self.provider, seconds);
        metrics.seconds_generated = seconds;

        let task = RenderTask {
            mode: RenderMode::File,
            status: RenderStatus::Completed,
            metrics,
            result: Some(RenderArtifact::Media {
                video_url: self.artifact_url(item, manifest.version, "asset.mp4"),
                poster_url: self.artifact_url(item, manifest.version, "poster.jpg"),
                caption_file_url: Some(self.artifact_url(item, manifest.version, "captions.vtt")),
            }),
            error: None,
        };
        Ok(RenderOutcome {
            task,
            veo: None,
            disposition: Disposition::Created,
            extend_hop: false,
        })
    }
}

/// Preview strategy: no provider call, answers 200 with a `skipped` task
/// carrying the bundle that would have been sent.
pub struct DryRunRenderer;

#[async_trait]
impl Renderer for DryRunRenderer {
    fn provider(&self) -> &str {
        "dry_run"
    }

    async fn render(
        &self,
        manifest: &VideoAssetManifest,
        tier: QualityTier,
        _item: &VideoLibraryItem,
    ) -> Result<RenderOutcome, RenderError> {
        let caps =
            capabilities::capabilities(&manifest.spec.provider, Some(&manifest.spec.model_id));
        let target = clamp_target_seconds(manifest.spec.target_seconds, &caps);
        let bundle = json!({
            "provider": manifest.spec.provider,
            "model": manifest.spec.model_id,
            "aspect_ratio": manifest.spec.aspect_ratio,
            "target_seconds": target,
            "planned_extends": manifest.generator.planned_extends,
            "prompt": storyboard_prompt(manifest),
        });
        let mut metrics = base_metrics(&manifest.spec.model_id, tier, "dry_run", target);
        metrics.cost_estimate_usd = 0.0;

        let task = RenderTask {
            mode: RenderMode::DryRun,
            status: RenderStatus::Skipped,
            metrics,
            result: Some(RenderArtifact::DryRun { bundle }),
            error: None,
        };
        Ok(RenderOutcome {
            task,
            veo: None,
            disposition: Disposition::Completed,
            extend_hop: false,
        })
    }
}

/// Transport and API-level failures from the veo operations collaborator.
#[derive(Debug, Error)]
pub enum VeoApiError {
    #[error("veo rate limited")]
    RateLimited,
    #[error("veo transport error: {0}")]
    Transport(String),
}

#[derive(Debug, Clone)]
pub struct VeoStartRequest {
    pub model_id: String,
    pub prompt: String,
    pub duration_seconds: u32,
    pub aspect_ratio: String,
    pub tier: QualityTier,
}

#[derive(Debug, Clone)]
pub struct VeoExtendRequest {
    pub model_id: String,
    pub source_video_url: String,
    pub additional_seconds: u32,
    pub prompt: String,
}

/// Finished clip returned by a completed operation.
#[derive(Debug, Clone)]
pub struct VeoClip {
    pub video_url: String,
    pub poster_url: String,
    pub caption_file_url: Option<String>,
    pub seconds: u32,
}

/// State of a long-running operation at fetch time.
#[derive(Debug, Clone)]
pub enum VeoPoll {
    Running,
    Ready(VeoClip),
    Failed(String),
}

/// Collaborator wrapping the vendor's long-running-operations API.
#[async_trait]
pub trait VeoOperations: Send + Sync {
    /// Kick off generation; returns the operation name to poll.
    async fn start_generation(&self, request: VeoStartRequest) -> Result<String, VeoApiError>;

    /// Kick off an extend hop appending seconds to an existing clip.
    async fn start_extend(&self, request: VeoExtendRequest) -> Result<String, VeoApiError>;

    async fn fetch_operation(&self, operation_name: &str) -> Result<VeoPoll, VeoApiError>;
}

/// Async strategy for the veo provider.
///
/// First call starts the remote operation and answers 202; later calls see
/// the stored operation name and fetch instead of starting again, so a poll
/// can never trigger a second billable generation.
pub struct VeoRenderer {
    ops: Arc<dyn VeoOperations>,
}

impl VeoRenderer {
    pub fn new(ops: Arc<dyn VeoOperations>) -> Self {
        Self { ops }
    }

    fn first_clip_seconds(caps: &ProviderCapabilities, target: u32) -> u32 {
        caps.supported_durations
            .iter()
            .copied()
            .filter(|&d| d <= target)
            .max()
            .unwrap_or(caps.max_single_shot_seconds)
    }

    fn content_hash(clip: &VeoClip) -> String {
        let mut hasher = Sha256::new();
        hasher.update(clip.video_url.as_bytes());
        hasher.update(clip.seconds.to_le_bytes());
        hex::encode(hasher.finalize())
    }

    /// Carry metric counters across poll attempts for the same manifest.
    fn carried_metrics(
        item: &VideoLibraryItem,
        model: &str,
        tier: QualityTier,
        target: u32,
    ) -> RenderMetrics {
        item.render_task
            .as_ref()
            .filter(|task| task.mode == RenderMode::Veo)
            .map(|task| task.metrics.clone())
            .unwrap_or_else(|| base_metrics(model, tier, "veo", target))
    }
}

#[async_trait]
impl Renderer for VeoRenderer {
    fn provider(&self) -> &str {
        "veo"
    }

    async fn render(
        &self,
        manifest: &VideoAssetManifest,
        tier: QualityTier,
        item: &VideoLibraryItem,
    ) -> Result<RenderOutcome, RenderError> {
        let caps = capabilities::capabilities("veo", Some(&manifest.spec.model_id));
        if !caps
            .supported_aspect_ratios
            .contains(&manifest.spec.aspect_ratio.as_str())
        {
            return Err(RenderError::Validation(format!(
                "aspect ratio `{}` unsupported by veo",
                manifest.spec.aspect_ratio
            )));
        }
        let target = clamp_target_seconds(manifest.spec.target_seconds, &caps);
        let model = manifest.spec.model_id.clone();

        let Some(operation_name) = item.veo.operation_name.clone() else {
            // First attempt for this manifest: start the operation.
            let request = VeoStartRequest {
                model_id: model.clone(),
                prompt: storyboard_prompt(manifest),
                duration_seconds: Self::first_clip_seconds(&caps, target),
                aspect_ratio: manifest.spec.aspect_ratio.clone(),
                tier,
            };
            let operation = self
                .ops
                .start_generation(request)
                .await
                .map_err(|err| RenderError::provider("veo", err.to_string()))?;

            let task = RenderTask {
                mode: RenderMode::Veo,
                status: RenderStatus::Pending,
                metrics: base_metrics(&model, tier, "veo", target),
                result: None,
                error: None,
            };
            let veo = VeoState {
                operation_name: Some(operation),
                status: VeoPhase::Predicting,
                attempts: item.veo.attempts,
                last_fetch_at: None,
                hash: None,
            };
            return Ok(RenderOutcome {
                task,
                veo: Some(veo),
                disposition: Disposition::Accepted,
                extend_hop: false,
            });
        };

        // Poll path: fetch the stored operation.
        let mut veo = item.veo.clone();
        veo.attempts += 1;
        veo.last_fetch_at = Some(OffsetDateTime::now_utc());
        veo.status = VeoPhase::Fetching;
        let mut metrics = Self::carried_metrics(item, &model, tier, target);

        let poll = match self.ops.fetch_operation(&operation_name).await {
            Ok(poll) => poll,
            Err(VeoApiError::RateLimited) => {
                veo.status = VeoPhase::RateLimited;
                let task = RenderTask {
                    mode: RenderMode::Veo,
                    status: RenderStatus::Rendering,
                    metrics,
                    result: None,
                    error: None,
                };
                return Ok(RenderOutcome {
                    task,
                    veo: Some(veo),
                    disposition: Disposition::Accepted,
                    extend_hop: false,
                });
            }
            Err(VeoApiError::Transport(message)) => {
                return Err(RenderError::provider("veo", message));
            }
        };

        match poll {
            VeoPoll::Running => {
                veo.status = VeoPhase::Predicting;
                let task = RenderTask {
                    mode: RenderMode::Veo,
                    status: RenderStatus::Rendering,
                    metrics,
                    result: None,
                    error: None,
                };
                Ok(RenderOutcome {
                    task,
                    veo: Some(veo),
                    disposition: Disposition::Accepted,
                    extend_hop: false,
                })
            }
            VeoPoll::Failed(message) => {
                // The operation is dead; a retry must start a fresh one.
                veo.operation_name = None;
                veo.status = VeoPhase::Failed;
                let task = RenderTask {
                    mode: RenderMode::Veo,
                    status: RenderStatus::Failed,
                    metrics,
                    result: None,
                    error: Some(message),
                };
                Ok(RenderOutcome {
                    task,
                    veo: Some(veo),
                    disposition: Disposition::Completed,
                    extend_hop: false,
                })
            }
            VeoPoll::Ready(clip) => {
                if metrics.extends_requested > metrics.extends_completed {
                    metrics.extends_completed += 1;
                }
                metrics.seconds_generated += clip.seconds;
                veo.hash = Some(Self::content_hash(&clip));

                let wants_more = metrics.seconds_generated < target
                    && caps.supports_extend
                    && metrics.extends_requested < manifest.generator.planned_extends;
                if wants_more {
                    let hop_seconds = caps
                        .extend_step_seconds
                        .min(target - metrics.seconds_generated);
                    let request = VeoExtendRequest {
                        model_id: model,
                        source_video_url: clip.video_url,
                        additional_seconds: hop_seconds,
                        prompt: storyboard_prompt(manifest),
                    };
                    let operation = self
                        .ops
                        .start_extend(request)
                        .await
                        .map_err(|err| RenderError::provider("veo", err.to_string()))?;
                    metrics.extends_requested += 1;
                    veo.operation_name = Some(operation);
                    veo.status = VeoPhase::Predicting;
                    let task = RenderTask {
                        mode: RenderMode::Veo,
                        status: RenderStatus::Rendering,
                        metrics,
                        result: None,
                        error: None,
                    };
                    return Ok(RenderOutcome {
                        task,
                        veo: Some(veo),
                        disposition: Disposition::Accepted,
                        extend_hop: true,
                    });
                }

                veo.status = VeoPhase::Ready;
                let task = RenderTask {
                    mode: RenderMode::Veo,
                    status: RenderStatus::Completed,
                    metrics,
                    result: Some(RenderArtifact::Media {
                        video_url: clip.video_url,
                        poster_url: clip.poster_url,
                        caption_file_url: clip.caption_file_url,
                    }),
                    error: None,
                };
                Ok(RenderOutcome {
                    task,
                    veo: Some(veo),
                    disposition: Disposition::Completed,
                    extend_hop: false,
                })
            }
        }
    }
}
