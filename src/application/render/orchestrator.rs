//! Render dispatch across pluggable provider strategies.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use metrics::counter;
use thiserror::Error;
use tracing::debug;

use crate::application::error::PipelineError;
use crate::domain::entities::{RenderTask, VeoState, VideoAssetManifest, VideoLibraryItem};
use crate::domain::types::{AssetStatus, QualityTier, RenderStatus};

/// HTTP-style disposition of one render attempt. `Accepted` is the async
/// contract: the caller must schedule a completion poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Completed,
    Created,
    Accepted,
}

impl Disposition {
    pub fn status_code(self) -> u16 {
        match self {
            Disposition::Completed => 200,
            Disposition::Created => 201,
            Disposition::Accepted => 202,
        }
    }

    pub fn is_pending(self) -> bool {
        matches!(self, Disposition::Accepted)
    }
}

/// What one render attempt produced.
#[derive(Debug, Clone)]
pub struct RenderOutcome {
    pub task: RenderTask,
    pub veo: Option<VeoState>,
    pub disposition: Disposition,
    /// Set when this attempt started an additional extend hop.
    pub extend_hop: bool,
}

/// Renderer failures split the way callers need them: validation is a caller
/// mistake rejected before any provider call; provider failures are
/// gateway-style and retryable.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("render request invalid: {0}")]
    Validation(String),
    #[error("provider `{provider}` failed: {message}")]
    Provider { provider: String, message: String },
}

impl RenderError {
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }
}

impl From<RenderError> for PipelineError {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::Validation(message) => PipelineError::Validation(message),
            RenderError::Provider { provider, message } => {
                PipelineError::Provider { provider, message }
            }
        }
    }
}

/// One render strategy per provider. Sync strategies return a terminal task
/// within the call; async strategies return `Accepted` and an operation
/// handle in [`VeoState`] for the poller to chase.
#[async_trait]
pub trait Renderer: Send + Sync {
    fn provider(&self) -> &str;

    async fn render(
        &self,
        manifest: &VideoAssetManifest,
        tier: QualityTier,
        item: &VideoLibraryItem,
    ) -> Result<RenderOutcome, RenderError>;
}

/// Provider-id keyed strategy lookup.
#[derive(Default, Clone)]
pub struct RendererRegistry {
    renderers: HashMap<String, Arc<dyn Renderer>>,
}

impl RendererRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, renderer: Arc<dyn Renderer>) {
        self.renderers
            .insert(renderer.provider().to_string(), renderer);
    }

    pub fn get(&self, provider: &str) -> Option<Arc<dyn Renderer>> {
        self.renderers.get(provider).cloned()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    /// Route through the dry-run strategy instead of the channel's provider.
    pub dry_run: bool,
}

pub struct RenderOrchestrator {
    registry: RendererRegistry,
    dry_run: Arc<dyn Renderer>,
    prefer_fast_tier: bool,
}

impl RenderOrchestrator {
    pub fn new(
        registry: RendererRegistry,
        dry_run: Arc<dyn Renderer>,
        prefer_fast_tier: bool,
    ) -> Self {
        Self {
            registry,
            dry_run,
            prefer_fast_tier,
        }
    }

    /// Approved items re-render at standard quality; everything else renders
    /// fast unless the feature flag says otherwise.
    pub fn select_tier(&self, status: AssetStatus) -> QualityTier {
        if status == AssetStatus::Approved {
            QualityTier::Standard
        } else if self.prefer_fast_tier {
            QualityTier::Fast
        } else {
            QualityTier::Standard
        }
    }

    pub async fn render(
        &self,
        manifest: &VideoAssetManifest,
        item: &VideoLibraryItem,
        options: RenderOptions,
    ) -> Result<RenderOutcome, PipelineError> {
        let renderer = if options.dry_run {
            Arc::clone(&self.dry_run)
        } else {
            self.registry.get(&manifest.spec.provider).ok_or_else(|| {
                PipelineError::validation(format!(
                    "no renderer registered for provider `{}`",
                    manifest.spec.provider
                ))
            })?
        };

        let tier = self.select_tier(item.status);
        counter!("vetrina_renders_started_total").increment(1);
        debug!(
            target = "application::render::orchestrator",
            item_id = %item.id,
            provider = renderer.provider(),
            tier = tier.as_str(),
            manifest_version = manifest.version,
            "dispatching render attempt"
        );

        let outcome = renderer.render(manifest, tier, item).await?;
        match outcome.task.status {
            RenderStatus::Completed | RenderStatus::Skipped => {
                counter!("vetrina_renders_completed_total").increment(1);
            }
            RenderStatus::Failed => {
                counter!("vetrina_renders_failed_total").increment(1);
            }
            _ => {}
        }
        Ok(outcome)
    }

    /// Lifecycle status an item lands in after this attempt.
    pub fn next_status(outcome: &RenderOutcome) -> AssetStatus {
        match outcome.task.status {
            // Skipped is the dry-run terminal; it parks the item as ready.
            RenderStatus::Completed | RenderStatus::Skipped => AssetStatus::Ready,
            RenderStatus::Failed => AssetStatus::Planned,
            _ if outcome.extend_hop => AssetStatus::Extending,
            _ => AssetStatus::Generating,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::render::providers::DryRunRenderer;
    use crate::domain::entities::{RenderMetrics, RenderTask};
    use crate::domain::types::RenderMode;

    fn orchestrator(prefer_fast: bool) -> RenderOrchestrator {
        RenderOrchestrator::new(RendererRegistry::new(), Arc::new(DryRunRenderer), prefer_fast)
    }

    fn outcome(status: RenderStatus, extend_hop: bool) -> RenderOutcome {
        RenderOutcome {
            task: RenderTask {
                mode: RenderMode::Veo,
                status,
                metrics: RenderMetrics {
                    seconds_generated: 0,
                    extends_requested: 0,
                    extends_completed: 0,
                    model: "veo-3.0-fast".into(),
                    tier: QualityTier::Fast,
                    cost_estimate_usd: 0.0,
                },
                result: None,
                error: None,
            },
            veo: None,
            disposition: Disposition::Accepted,
            extend_hop,
        }
    }

    #[test]
    fn approved_items_render_standard() {
        let orchestrator = orchestrator(true);
        assert_eq!(
            orchestrator.select_tier(AssetStatus::Approved),
            QualityTier::Standard
        );
        assert_eq!(
            orchestrator.select_tier(AssetStatus::Planned),
            QualityTier::Fast
        );
    }

    #[test]
    fn fast_tier_flag_off_always_renders_standard() {
        let orchestrator = orchestrator(false);
        assert_eq!(
            orchestrator.select_tier(AssetStatus::Planned),
            QualityTier::Standard
        );
    }

    #[test]
    fn status_mapping_follows_terminal_outcomes() {
        assert_eq!(
            RenderOrchestrator::next_status(&outcome(RenderStatus::Completed, false)),
            AssetStatus::Ready
        );
        assert_eq!(
            RenderOrchestrator::next_status(&outcome(RenderStatus::Skipped, false)),
            AssetStatus::Ready
        );
        assert_eq!(
            RenderOrchestrator::next_status(&outcome(RenderStatus::Failed, false)),
            AssetStatus::Planned
        );
        assert_eq!(
            RenderOrchestrator::next_status(&outcome(RenderStatus::Rendering, true)),
            AssetStatus::Extending
        );
        assert_eq!(
            RenderOrchestrator::next_status(&outcome(RenderStatus::Pending, false)),
            AssetStatus::Generating
        );
    }

    #[test]
    fn disposition_codes_match_http_semantics() {
        assert_eq!(Disposition::Completed.status_code(), 200);
        assert_eq!(Disposition::Created.status_code(), 201);
        assert_eq!(Disposition::Accepted.status_code(), 202);
        assert!(Disposition::Accepted.is_pending());
        assert!(!Disposition::Created.is_pending());
    }
}
