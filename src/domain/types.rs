//! Shared domain enumerations for the asset pipeline.

use serde::{Deserialize, Serialize};

/// Authoritative lifecycle status of a [`VideoLibraryItem`](crate::domain::entities::VideoLibraryItem).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetStatus {
    Planned,
    Generating,
    Extending,
    Ready,
    Approved,
    Published,
    Archived,
}

impl AssetStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AssetStatus::Planned => "planned",
            AssetStatus::Generating => "generating",
            AssetStatus::Extending => "extending",
            AssetStatus::Ready => "ready",
            AssetStatus::Approved => "approved",
            AssetStatus::Published => "published",
            AssetStatus::Archived => "archived",
        }
    }
}

impl TryFrom<&str> for AssetStatus {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "planned" => Ok(AssetStatus::Planned),
            "generating" => Ok(AssetStatus::Generating),
            "extending" => Ok(AssetStatus::Extending),
            "ready" => Ok(AssetStatus::Ready),
            "approved" => Ok(AssetStatus::Approved),
            "published" => Ok(AssetStatus::Published),
            "archived" => Ok(AssetStatus::Archived),
            _ => Err(()),
        }
    }
}

/// How a render attempt produces its artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    File,
    DryRun,
    Veo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderStatus {
    Pending,
    Rendering,
    Completed,
    Failed,
    Skipped,
}

impl RenderStatus {
    /// Terminal statuses end the render attempt; anything else keeps polling.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RenderStatus::Completed | RenderStatus::Failed | RenderStatus::Skipped
        )
    }
}

/// Phase of a long-running provider operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VeoPhase {
    #[serde(rename = "none")]
    Idle,
    Predicting,
    Fetching,
    Ready,
    Failed,
    RateLimited,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishStatus {
    Idle,
    Ready,
    Publishing,
    Published,
    Failed,
}

/// Who authored the manifest narrative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneratorMode {
    Llm,
    Fallback,
}

/// Quality/cost level for a render attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityTier {
    Fast,
    Standard,
}

impl QualityTier {
    pub fn as_str(self) -> &'static str {
        match self {
            QualityTier::Fast => "fast",
            QualityTier::Standard => "standard",
        }
    }
}

/// Narrative beat of a storyboard shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShotPhase {
    Hook,
    Proof,
    Offer,
    Action,
}

impl ShotPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            ShotPhase::Hook => "hook",
            ShotPhase::Proof => "proof",
            ShotPhase::Offer => "offer",
            ShotPhase::Action => "action",
        }
    }
}

/// Actions accepted by the bulk update operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkAction {
    Approve,
    Archive,
}
