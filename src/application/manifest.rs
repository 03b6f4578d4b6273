//! Manifest construction with deterministic fallback.
//!
//! The builder asks the content-generation collaborator for the narrative
//! (storyboard, caption, compliance). Any failure or malformed response
//! degrades to a deterministic minimal manifest; generator trouble is never a
//! hard error for this step.

use std::sync::Arc;

use async_trait::async_trait;
use metrics::counter;
use thiserror::Error;
use tracing::warn;
use url::Url;

use crate::application::capabilities::{self, clamp_target_seconds, planned_extends};
use crate::application::error::PipelineError;
use crate::domain::channels::{self, CAPTION_MAX_CHARS, CAPTION_MAX_HASHTAGS, ChannelSpec};
use crate::domain::entities::{
    Caption, ComplianceReport, GeneratorInfo, JobSnapshot, Shot, ThumbnailPlan, TrackingPlan,
    VideoAssetManifest,
};
use crate::domain::types::{GeneratorMode, ShotPhase};

/// Raw narrative returned by the content-generation collaborator.
#[derive(Debug, Clone)]
pub struct GeneratedContent {
    pub storyboard: Vec<Shot>,
    pub caption: Caption,
    pub thumbnail: ThumbnailPlan,
    pub compliance: ComplianceReport,
    pub warnings: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ContentGenError {
    #[error("content generation failed: {0}")]
    Generation(String),
    #[error("content generator returned malformed output: {0}")]
    Malformed(String),
}

/// Collaborator producing storyboard/caption/compliance text for one channel.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate(
        &self,
        job: &JobSnapshot,
        spec: &ChannelSpec,
        recommended_medium: Option<&str>,
    ) -> Result<GeneratedContent, ContentGenError>;
}

pub struct ManifestBuilder {
    generator: Arc<dyn ContentGenerator>,
}

impl ManifestBuilder {
    pub fn new(generator: Arc<dyn ContentGenerator>) -> Self {
        Self { generator }
    }

    /// Build one manifest version for a channel.
    ///
    /// The version is supplied by the caller so the aggregate keeps its
    /// append-only ordering; it is never invented here. The only hard failure
    /// is an unknown channel id.
    pub async fn build(
        &self,
        job: &JobSnapshot,
        channel_id: &str,
        recommended_medium: Option<&str>,
        version: u32,
    ) -> Result<VideoAssetManifest, PipelineError> {
        let spec = channels::resolve(channel_id).ok_or_else(|| {
            PipelineError::validation(format!("unknown channel `{channel_id}`"))
        })?;

        let caps = capabilities::capabilities(&spec.provider, Some(&spec.model_id));
        let target = clamp_target_seconds(spec.target_seconds, &caps);
        let extends = planned_extends(target, &caps);

        let generated = self
            .generator
            .generate(job, &spec, recommended_medium)
            .await;

        let (storyboard, caption, thumbnail, compliance, generator) = match generated {
            Ok(content) => match validate_content(&content) {
                Ok(()) => (
                    content.storyboard,
                    content.caption,
                    content.thumbnail,
                    content.compliance,
                    GeneratorInfo {
                        mode: GeneratorMode::Llm,
                        warnings: content.warnings,
                        planned_extends: extends,
                    },
                ),
                Err(reason) => {
                    warn!(
                        target = "application::manifest",
                        channel = channel_id,
                        reason = %reason,
                        "content generator output rejected, using fallback manifest"
                    );
                    counter!("vetrina_manifest_fallback_total").increment(1);
                    fallback_content(job, &spec, target, extends, reason)
                }
            },
            Err(err) => {
                warn!(
                    target = "application::manifest",
                    channel = channel_id,
                    error = %err,
                    "content generation failed, using fallback manifest"
                );
                counter!("vetrina_manifest_fallback_total").increment(1);
                fallback_content(job, &spec, target, extends, err.to_string())
            }
        };

        Ok(VideoAssetManifest {
            version,
            channel_id: spec.channel_id.clone(),
            tracking: tracking_plan(job, &spec, version),
            spec,
            job: job.clone(),
            storyboard,
            caption,
            thumbnail,
            compliance,
            generator,
        })
    }
}

/// Reject generated narrative that breaks placement constraints.
fn validate_content(content: &GeneratedContent) -> Result<(), String> {
    if content.storyboard.len() < 4 {
        return Err(format!(
            "storyboard has {} shots, need at least 4",
            content.storyboard.len()
        ));
    }
    validate_caption(&content.caption)
}

/// Caption limits shared with the caption-edit operation.
pub fn validate_caption(caption: &Caption) -> Result<(), String> {
    if caption.text.chars().count() > CAPTION_MAX_CHARS {
        return Err(format!("caption exceeds {CAPTION_MAX_CHARS} characters"));
    }
    if caption.hashtags.len() > CAPTION_MAX_HASHTAGS {
        return Err(format!("caption carries more than {CAPTION_MAX_HASHTAGS} hashtags"));
    }
    Ok(())
}

fn fallback_content(
    job: &JobSnapshot,
    spec: &ChannelSpec,
    target_seconds: u32,
    extends: u32,
    reason: String,
) -> (Vec<Shot>, Caption, ThumbnailPlan, ComplianceReport, GeneratorInfo) {
    let storyboard = fallback_storyboard(job, spec, target_seconds);
    let caption = Caption {
        text: format!(
            "{} is hiring: {} in {}. {}",
            job.company, job.title, job.location, spec.cta_label
        ),
        hashtags: vec!["#hiring".into(), "#jobs".into()],
    };
    let thumbnail = ThumbnailPlan {
        headline: job.title.clone(),
        subline: job.company.clone(),
    };
    let compliance = ComplianceReport {
        flags: Vec::new(),
        qa_checklist: vec![
            "verify pay transparency wording".into(),
            "verify location accuracy".into(),
        ],
    };
    let generator = GeneratorInfo {
        mode: GeneratorMode::Fallback,
        warnings: vec![format!("generator unavailable, fallback manifest used: {reason}")],
        planned_extends: extends,
    };
    (storyboard, caption, thumbnail, compliance, generator)
}

/// Deterministic hook -> proof -> offer -> action storyboard.
fn fallback_storyboard(job: &JobSnapshot, spec: &ChannelSpec, target_seconds: u32) -> Vec<Shot> {
    // Fixed beat split; each beat gets at least one second.
    let beats = [
        (ShotPhase::Hook, 15u32),
        (ShotPhase::Proof, 40),
        (ShotPhase::Offer, 25),
        (ShotPhase::Action, 20),
    ];
    let mut shots = Vec::with_capacity(beats.len());
    let mut start = 0u32;
    for (index, (phase, share)) in beats.iter().enumerate() {
        let duration = if index == beats.len() - 1 {
            target_seconds.saturating_sub(start).max(1)
        } else {
            (target_seconds * share / 100).max(1)
        };
        let (visual, voice_over, on_screen) = match phase {
            ShotPhase::Hook => (
                format!("Fast push-in on a {} workspace", job.role_family),
                format!("Looking for a {} role in {}?", job.title, job.location),
                job.title.clone(),
            ),
            ShotPhase::Proof => (
                format!("Day-in-the-life montage at {}", job.company),
                format!("{} is growing its team.", job.company),
                job.company.clone(),
            ),
            ShotPhase::Offer => (
                "Clean text card over brand background".into(),
                job.salary_range
                    .clone()
                    .unwrap_or_else(|| "Competitive pay and real growth.".into()),
                job.salary_range.clone().unwrap_or_default(),
            ),
            ShotPhase::Action => (
                "CTA card with animated arrow".into(),
                format!("{} today.", spec.cta_label),
                spec.cta_label.clone(),
            ),
        };
        shots.push(Shot {
            phase: *phase,
            order: index as u32 + 1,
            start_seconds: start,
            duration_seconds: duration,
            visual,
            voice_over,
            on_screen_text: on_screen,
        });
        start += duration;
    }
    shots
}

/// UTM attribution for the asset's landing link.
fn tracking_plan(job: &JobSnapshot, spec: &ChannelSpec, version: u32) -> TrackingPlan {
    let utm_source = spec.channel_name.to_lowercase().replace(' ', "_");
    let utm_campaign = format!("job_{}", job.id.simple());
    let utm_content = format!("v{version}");
    let landing_url = match Url::parse(&job.apply_url) {
        Ok(mut url) => {
            url.query_pairs_mut()
                .append_pair("utm_source", &utm_source)
                .append_pair("utm_medium", "short_video")
                .append_pair("utm_campaign", &utm_campaign)
                .append_pair("utm_content", &utm_content);
            url.to_string()
        }
        Err(_) => job.apply_url.clone(),
    };
    TrackingPlan {
        utm_source,
        utm_medium: "short_video".into(),
        utm_campaign,
        utm_content,
        landing_url,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    struct FailingGenerator;

    #[async_trait]
    impl ContentGenerator for FailingGenerator {
        async fn generate(
            &self,
            _job: &JobSnapshot,
            _spec: &ChannelSpec,
            _recommended_medium: Option<&str>,
        ) -> Result<GeneratedContent, ContentGenError> {
            Err(ContentGenError::Generation("model overloaded".into()))
        }
    }

    struct ShortStoryboardGenerator;

    #[async_trait]
    impl ContentGenerator for ShortStoryboardGenerator {
        async fn generate(
            &self,
            job: &JobSnapshot,
            spec: &ChannelSpec,
            _recommended_medium: Option<&str>,
        ) -> Result<GeneratedContent, ContentGenError> {
            let mut shots = fallback_storyboard(job, spec, 16);
            shots.truncate(2);
            Ok(GeneratedContent {
                storyboard: shots,
                caption: Caption {
                    text: "too short".into(),
                    hashtags: Vec::new(),
                },
                thumbnail: ThumbnailPlan {
                    headline: "h".into(),
                    subline: "s".into(),
                },
                compliance: ComplianceReport::default(),
                warnings: Vec::new(),
            })
        }
    }

    fn job() -> JobSnapshot {
        JobSnapshot {
            id: Uuid::new_v4(),
            title: "Forklift Operator".into(),
            company: "Nordlager".into(),
            location: "Hamburg, DE".into(),
            geo: "EU".into(),
            role_family: "logistics".into(),
            salary_range: Some("€18-21/h".into()),
            apply_url: "https://jobs.example.com/forklift".into(),
        }
    }

    #[tokio::test]
    async fn generator_failure_degrades_to_fallback() {
        let builder = ManifestBuilder::new(Arc::new(FailingGenerator));
        let manifest = builder.build(&job(), "TIKTOK_LEAD", None, 1).await.unwrap();
        assert_eq!(manifest.generator.mode, GeneratorMode::Fallback);
        assert!(manifest.storyboard.len() >= 4);
        assert_eq!(manifest.version, 1);
        assert!(!manifest.generator.warnings.is_empty());
    }

    #[tokio::test]
    async fn malformed_storyboard_is_rejected_into_fallback() {
        let builder = ManifestBuilder::new(Arc::new(ShortStoryboardGenerator));
        let manifest = builder.build(&job(), "REELS_REACH", None, 3).await.unwrap();
        assert_eq!(manifest.generator.mode, GeneratorMode::Fallback);
        assert!(manifest.storyboard.len() >= 4);
        assert_eq!(manifest.version, 3);
    }

    #[tokio::test]
    async fn unknown_channel_is_a_hard_validation_error() {
        let builder = ManifestBuilder::new(Arc::new(FailingGenerator));
        let err = builder.build(&job(), "FAX_BLAST", None, 1).await.unwrap_err();
        assert!(matches!(err, PipelineError::Validation(_)));
    }

    #[tokio::test]
    async fn tracking_plan_carries_utm_parameters() {
        let builder = ManifestBuilder::new(Arc::new(FailingGenerator));
        let manifest = builder.build(&job(), "TIKTOK_LEAD", None, 2).await.unwrap();
        assert_eq!(manifest.tracking.utm_source, "tiktok");
        assert_eq!(manifest.tracking.utm_content, "v2");
        assert!(manifest.tracking.landing_url.contains("utm_campaign=job_"));
    }

    #[test]
    fn fallback_storyboard_covers_target_duration() {
        let spec = channels::resolve("TIKTOK_LEAD").unwrap();
        let shots = fallback_storyboard(&job(), &spec, 24);
        assert_eq!(shots.len(), 4);
        let total: u32 = shots.iter().map(|s| s.duration_seconds).sum();
        assert_eq!(total, 24);
        assert_eq!(shots[0].start_seconds, 0);
        for window in shots.windows(2) {
            assert_eq!(
                window[1].start_seconds,
                window[0].start_seconds + window[0].duration_seconds
            );
        }
    }

    #[test]
    fn caption_limits_are_enforced() {
        let long_text = "x".repeat(CAPTION_MAX_CHARS + 1);
        assert!(validate_caption(&Caption {
            text: long_text,
            hashtags: Vec::new()
        })
        .is_err());
        let many_tags = (0..CAPTION_MAX_HASHTAGS + 1)
            .map(|n| format!("#tag{n}"))
            .collect();
        assert!(validate_caption(&Caption {
            text: "ok".into(),
            hashtags: many_tags
        })
        .is_err());
    }
}
