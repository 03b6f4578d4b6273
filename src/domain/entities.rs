//! Persisted aggregate and value objects of the video asset pipeline.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::channels::ChannelSpec;
use crate::domain::error::DomainError;
use crate::domain::types::{
    AssetStatus, GeneratorMode, PublishStatus, QualityTier, RenderMode, RenderStatus, ShotPhase,
    VeoPhase,
};

/// Maximum number of audit entries retained per item; oldest evicted first.
pub const AUDIT_LOG_CAP: usize = 50;

/// Snapshot of the job posting taken at manifest-build time. Never re-fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub id: Uuid,
    pub title: String,
    pub company: String,
    pub location: String,
    pub geo: String,
    pub role_family: String,
    pub salary_range: Option<String>,
    pub apply_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shot {
    pub phase: ShotPhase,
    pub order: u32,
    pub start_seconds: u32,
    pub duration_seconds: u32,
    pub visual: String,
    pub voice_over: String,
    pub on_screen_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Caption {
    pub text: String,
    pub hashtags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThumbnailPlan {
    pub headline: String,
    pub subline: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ComplianceReport {
    pub flags: Vec<String>,
    pub qa_checklist: Vec<String>,
}

/// UTM attribution attached to the asset's call-to-action link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingPlan {
    pub utm_source: String,
    pub utm_medium: String,
    pub utm_campaign: String,
    pub utm_content: String,
    pub landing_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorInfo {
    pub mode: GeneratorMode,
    pub warnings: Vec<String>,
    pub planned_extends: u32,
}

/// A versioned, immutable snapshot of everything needed to render one asset.
///
/// The single mutation allowed after creation is a caption patch, which never
/// bumps the version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoAssetManifest {
    pub version: u32,
    pub channel_id: String,
    pub spec: ChannelSpec,
    pub job: JobSnapshot,
    pub storyboard: Vec<Shot>,
    pub caption: Caption,
    pub thumbnail: ThumbnailPlan,
    pub compliance: ComplianceReport,
    pub tracking: TrackingPlan,
    pub generator: GeneratorInfo,
}

impl VideoAssetManifest {
    /// Total seconds across the storyboard.
    pub fn storyboard_seconds(&self) -> u32 {
        self.storyboard.iter().map(|shot| shot.duration_seconds).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderMetrics {
    pub seconds_generated: u32,
    pub extends_requested: u32,
    pub extends_completed: u32,
    pub model: String,
    pub tier: QualityTier,
    pub cost_estimate_usd: f64,
}

/// Artifact produced by a terminal render attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum RenderArtifact {
    Media {
        video_url: String,
        poster_url: String,
        caption_file_url: Option<String>,
    },
    DryRun {
        bundle: serde_json::Value,
    },
}

/// Record of one attempt to turn a manifest into a playable asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderTask {
    pub mode: RenderMode,
    pub status: RenderStatus,
    pub metrics: RenderMetrics,
    pub result: Option<RenderArtifact>,
    pub error: Option<String>,
}

/// Tracking record for a long-running provider operation and its polling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VeoState {
    pub operation_name: Option<String>,
    pub status: VeoPhase,
    pub attempts: u32,
    pub last_fetch_at: Option<OffsetDateTime>,
    pub hash: Option<String>,
}

impl VeoState {
    /// The empty state applied on creation and on every manifest rebuild.
    pub fn reset() -> Self {
        Self {
            operation_name: None,
            status: VeoPhase::Idle,
            attempts: 0,
            last_fetch_at: None,
            hash: None,
        }
    }
}

impl Default for VeoState {
    fn default() -> Self {
        Self::reset()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishTask {
    pub status: PublishStatus,
    pub payload: Option<serde_json::Value>,
    pub response: Option<serde_json::Value>,
    pub error: Option<String>,
}

/// Attribution counters, written only by external collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AssetAnalytics {
    pub impressions: u64,
    pub clicks: u64,
    pub applies: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub at: OffsetDateTime,
    pub action: String,
    pub detail: String,
}

/// Aggregate root: one channel-specific short-video asset for one job posting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoLibraryItem {
    pub id: Uuid,
    pub job_id: Uuid,
    pub owner_user_id: Uuid,
    pub channel_id: String,
    pub channel_name: String,
    pub placement_name: String,
    pub status: AssetStatus,
    pub manifest_version: u32,
    pub manifests: Vec<VideoAssetManifest>,
    pub veo: VeoState,
    pub render_task: Option<RenderTask>,
    pub publish_task: Option<PublishTask>,
    pub analytics: AssetAnalytics,
    pub audit_log: VecDeque<AuditEntry>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl VideoLibraryItem {
    pub fn new(owner_user_id: Uuid, job_id: Uuid, manifest: VideoAssetManifest) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id: Uuid::new_v4(),
            job_id,
            owner_user_id,
            channel_id: manifest.spec.channel_id.clone(),
            channel_name: manifest.spec.channel_name.clone(),
            placement_name: manifest.spec.placement.clone(),
            status: AssetStatus::Planned,
            manifest_version: manifest.version,
            manifests: vec![manifest],
            veo: VeoState::reset(),
            render_task: None,
            publish_task: None,
            analytics: AssetAnalytics::default(),
            audit_log: VecDeque::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// The manifest all reads and render attempts go through.
    ///
    /// Upholds `manifests.len() == manifest_version` by construction:
    /// manifests are only ever appended via [`Self::append_manifest`].
    pub fn active_manifest(&self) -> &VideoAssetManifest {
        &self.manifests[self.manifest_version as usize - 1]
    }

    pub fn active_manifest_mut(&mut self) -> &mut VideoAssetManifest {
        &mut self.manifests[self.manifest_version as usize - 1]
    }

    /// Append the next manifest version and reset all render/publish state.
    ///
    /// The manifest's version must be exactly `manifest_version + 1`; the
    /// history is append-only and never truncated.
    pub fn append_manifest(&mut self, manifest: VideoAssetManifest) -> Result<(), DomainError> {
        if manifest.version != self.manifest_version + 1 {
            return Err(DomainError::invariant(format!(
                "manifest version {} does not follow {}",
                manifest.version, self.manifest_version
            )));
        }
        self.channel_id = manifest.spec.channel_id.clone();
        self.channel_name = manifest.spec.channel_name.clone();
        self.placement_name = manifest.spec.placement.clone();
        self.manifest_version = manifest.version;
        self.manifests.push(manifest);
        self.veo = VeoState::reset();
        self.render_task = None;
        self.publish_task = None;
        Ok(())
    }

    /// Append to the bounded audit ring buffer, evicting the oldest entry.
    pub fn record_audit(&mut self, action: impl Into<String>, detail: impl Into<String>) {
        while self.audit_log.len() >= AUDIT_LOG_CAP {
            self.audit_log.pop_front();
        }
        self.audit_log.push_back(AuditEntry {
            at: OffsetDateTime::now_utc(),
            action: action.into(),
            detail: detail.into(),
        });
    }

    pub fn touch(&mut self) {
        self.updated_at = OffsetDateTime::now_utc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::channels;

    fn sample_job() -> JobSnapshot {
        JobSnapshot {
            id: Uuid::new_v4(),
            title: "Line Cook".into(),
            company: "Trattoria Nove".into(),
            location: "Turin, IT".into(),
            geo: "EU".into(),
            role_family: "hospitality".into(),
            salary_range: None,
            apply_url: "https://jobs.example.com/line-cook".into(),
        }
    }

    fn sample_manifest(version: u32) -> VideoAssetManifest {
        let spec = channels::resolve("TIKTOK_LEAD").expect("known channel");
        VideoAssetManifest {
            version,
            channel_id: spec.channel_id.clone(),
            spec,
            job: sample_job(),
            storyboard: Vec::new(),
            caption: Caption {
                text: "caption".into(),
                hashtags: Vec::new(),
            },
            thumbnail: ThumbnailPlan {
                headline: "h".into(),
                subline: "s".into(),
            },
            compliance: ComplianceReport::default(),
            tracking: TrackingPlan {
                utm_source: "tiktok".into(),
                utm_medium: "short_video".into(),
                utm_campaign: "c".into(),
                utm_content: "v1".into(),
                landing_url: "https://jobs.example.com/line-cook".into(),
            },
            generator: GeneratorInfo {
                mode: GeneratorMode::Fallback,
                warnings: Vec::new(),
                planned_extends: 0,
            },
        }
    }

    #[test]
    fn append_manifest_enforces_sequential_versions() {
        let mut item = VideoLibraryItem::new(Uuid::new_v4(), Uuid::new_v4(), sample_manifest(1));
        assert!(item.append_manifest(sample_manifest(3)).is_err());
        assert!(item.append_manifest(sample_manifest(2)).is_ok());
        assert_eq!(item.manifest_version, 2);
        assert_eq!(item.manifests.len(), 2);
        assert_eq!(item.active_manifest().version, 2);
    }

    #[test]
    fn append_manifest_resets_render_state() {
        let mut item = VideoLibraryItem::new(Uuid::new_v4(), Uuid::new_v4(), sample_manifest(1));
        item.veo.operation_name = Some("operations/abc".into());
        item.veo.status = VeoPhase::Predicting;
        item.veo.attempts = 4;
        item.append_manifest(sample_manifest(2)).unwrap();
        assert_eq!(item.veo, VeoState::reset());
        assert!(item.render_task.is_none());
        assert!(item.publish_task.is_none());
    }

    #[test]
    fn audit_log_evicts_oldest_beyond_cap() {
        let mut item = VideoLibraryItem::new(Uuid::new_v4(), Uuid::new_v4(), sample_manifest(1));
        for n in 0..(AUDIT_LOG_CAP + 7) {
            item.record_audit("test.append", format!("entry {n}"));
        }
        assert_eq!(item.audit_log.len(), AUDIT_LOG_CAP);
        assert_eq!(item.audit_log.front().unwrap().detail, "entry 7");
        assert_eq!(
            item.audit_log.back().unwrap().detail,
            format!("entry {}", AUDIT_LOG_CAP + 6)
        );
    }
}
