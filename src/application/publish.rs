//! Publish dispatch to per-channel adapters.
//!
//! Only a published result advances the lifecycle; adapter failures land in
//! the publish task and leave the item's status for the caller to retry. No
//! retry happens here.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use metrics::counter;
use serde_json::json;
use thiserror::Error;
use tracing::warn;

use crate::application::error::PipelineError;
use crate::domain::entities::{PublishTask, RenderArtifact, RenderTask, VideoAssetManifest};
use crate::domain::types::PublishStatus;

#[derive(Debug, Error)]
#[error("publish adapter failed: {0}")]
pub struct PublishError(pub String);

/// Channel-specific publishing collaborator.
#[async_trait]
pub trait ChannelPublisher: Send + Sync {
    fn channel_id(&self) -> &str;

    async fn publish(
        &self,
        manifest: &VideoAssetManifest,
        render: &RenderTask,
    ) -> Result<serde_json::Value, PublishError>;
}

#[derive(Default, Clone)]
pub struct PublisherDispatcher {
    adapters: HashMap<String, Arc<dyn ChannelPublisher>>,
}

impl PublisherDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, adapter: Arc<dyn ChannelPublisher>) {
        self.adapters
            .insert(adapter.channel_id().to_string(), adapter);
    }

    /// Hand a ready render to the channel's adapter.
    pub async fn dispatch(
        &self,
        manifest: &VideoAssetManifest,
        render: &RenderTask,
    ) -> Result<PublishTask, PipelineError> {
        let adapter = self.adapters.get(&manifest.channel_id).ok_or_else(|| {
            PipelineError::validation(format!(
                "no publish adapter for channel `{}`",
                manifest.channel_id
            ))
        })?;

        let video_url = match &render.result {
            Some(RenderArtifact::Media { video_url, .. }) => video_url.clone(),
            _ => {
                return Err(PipelineError::validation(
                    "render task carries no playable artifact",
                ));
            }
        };
        let payload = json!({
            "channel_id": manifest.channel_id,
            "caption": manifest.caption,
            "video_url": video_url,
            "landing_url": manifest.tracking.landing_url,
            "manifest_version": manifest.version,
        });

        counter!("vetrina_publish_total").increment(1);
        match adapter.publish(manifest, render).await {
            Ok(response) => Ok(PublishTask {
                status: PublishStatus::Published,
                payload: Some(payload),
                response: Some(response),
                error: None,
            }),
            Err(err) => {
                warn!(
                    target = "application::publish",
                    channel = %manifest.channel_id,
                    error = %err,
                    "publish adapter failed"
                );
                Ok(PublishTask {
                    status: PublishStatus::Failed,
                    payload: Some(payload),
                    response: None,
                    error: Some(err.to_string()),
                })
            }
        }
    }
}
