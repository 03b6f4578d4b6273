//! The video library lifecycle manager: the public operation surface of the
//! pipeline.
//!
//! Every operation enforces exclusive ownership; a missing item or a foreign
//! owner is `Ok(None)`, the caller's 404-equivalent. All writes are
//! whole-document overwrites of the aggregate; render triggering is
//! deliberately not mutex-protected, so concurrent triggers are
//! last-writer-wins on the render task.

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::application::error::PipelineError;
use crate::application::manifest::{ManifestBuilder, validate_caption};
use crate::application::poller::AsyncCompletionPoller;
use crate::application::publish::PublisherDispatcher;
use crate::application::render::{RenderOptions, RenderOrchestrator, RenderOutcome};
use crate::application::repos::{ItemQueryFilter, LibraryRepo};
use crate::domain::entities::{Caption, JobSnapshot, VideoLibraryItem};
use crate::domain::lifecycle;
use crate::domain::types::{AssetStatus, BulkAction, PublishStatus, RenderStatus};

#[derive(Debug, Clone)]
pub struct CreateAssetCommand {
    pub job: JobSnapshot,
    pub channel_id: String,
    pub recommended_medium: Option<String>,
}

/// What a render trigger hands back: the HTTP-style disposition of the
/// attempt plus the item as persisted.
#[derive(Debug, Clone)]
pub struct RenderReport {
    pub status_code: u16,
    pub item: VideoLibraryItem,
}

/// Outcome of one fired poll, from the poller's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollVerdict {
    /// Provider still pending; arm the next poll.
    Pending,
    /// Terminal outcome or nothing left to poll; clear the schedule.
    Settled,
}

pub struct VideoLibraryService {
    store: Arc<dyn LibraryRepo>,
    manifests: ManifestBuilder,
    orchestrator: RenderOrchestrator,
    poller: AsyncCompletionPoller,
    publisher: PublisherDispatcher,
}

impl VideoLibraryService {
    pub fn new(
        store: Arc<dyn LibraryRepo>,
        manifests: ManifestBuilder,
        orchestrator: RenderOrchestrator,
        poller: AsyncCompletionPoller,
        publisher: PublisherDispatcher,
    ) -> Self {
        Self {
            store,
            manifests,
            orchestrator,
            poller,
            publisher,
        }
    }

    pub fn poller(&self) -> &AsyncCompletionPoller {
        &self.poller
    }

    /// Fetch an item the caller is allowed to see.
    async fn owned_item(
        &self,
        owner_user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<VideoLibraryItem>, PipelineError> {
        let Some(item) = self.store.find_item(id).await? else {
            return Ok(None);
        };
        if item.owner_user_id != owner_user_id {
            return Ok(None);
        }
        Ok(Some(item))
    }

    /// Create an item with manifest v1. Rendering is a separate, explicit
    /// operation; the new item stays `planned`.
    pub async fn create(
        &self,
        owner_user_id: Uuid,
        command: CreateAssetCommand,
    ) -> Result<VideoLibraryItem, PipelineError> {
        let manifest = self
            .manifests
            .build(
                &command.job,
                &command.channel_id,
                command.recommended_medium.as_deref(),
                1,
            )
            .await?;
        let mut item = VideoLibraryItem::new(owner_user_id, command.job.id, manifest);
        item.record_audit(
            "asset.create",
            format!("manifest v1 for {}", item.channel_id),
        );
        self.store.save_item(&item).await?;
        info!(
            target = "application::library",
            item_id = %item.id,
            channel = %item.channel_id,
            "video library item created"
        );
        Ok(item)
    }

    pub async fn get(
        &self,
        owner_user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<VideoLibraryItem>, PipelineError> {
        self.owned_item(owner_user_id, id).await
    }

    pub async fn list(
        &self,
        owner_user_id: Uuid,
        filter: &ItemQueryFilter,
    ) -> Result<Vec<VideoLibraryItem>, PipelineError> {
        Ok(self.store.list_items(owner_user_id, filter).await?)
    }

    /// Append the next manifest version. A new manifest invalidates any
    /// in-flight or finished render for the previous one, so veo state and
    /// the render/publish tasks are always reset.
    pub async fn regenerate(
        &self,
        owner_user_id: Uuid,
        id: Uuid,
        recommended_medium: Option<&str>,
    ) -> Result<Option<VideoLibraryItem>, PipelineError> {
        let Some(mut item) = self.owned_item(owner_user_id, id).await? else {
            return Ok(None);
        };
        if item.status == AssetStatus::Archived {
            return Err(PipelineError::validation("item is archived"));
        }
        let version = item.manifest_version + 1;
        let job = item.active_manifest().job.clone();
        let channel_id = item.channel_id.clone();
        let manifest = self
            .manifests
            .build(&job, &channel_id, recommended_medium, version)
            .await?;
        item.append_manifest(manifest)?;
        item.record_audit("manifest.regenerate", format!("manifest v{version}"));
        item.touch();
        self.store.save_item(&item).await?;
        Ok(Some(item))
    }

    /// Trigger a render of the active manifest.
    ///
    /// A 202 disposition arms exactly one completion poll; repeated triggers
    /// while the operation is pending re-enter the fetch path and never start
    /// a second billable generation.
    pub async fn trigger_render(
        self: &Arc<Self>,
        owner_user_id: Uuid,
        id: Uuid,
        options: RenderOptions,
    ) -> Result<Option<RenderReport>, PipelineError> {
        let Some(mut item) = self.owned_item(owner_user_id, id).await? else {
            return Ok(None);
        };
        lifecycle::check(item.status, AssetStatus::Generating)?;

        // Tier selection reads the pre-trigger status, so approved items
        // re-render at standard quality.
        let manifest = item.active_manifest().clone();
        let outcome = match self.orchestrator.render(&manifest, &item, options).await {
            Ok(outcome) => outcome,
            Err(err) => {
                // Validation errors reject before any provider call and leave
                // the item untouched; provider failures are recorded and the
                // item parks as planned, retryable.
                if err.is_provider_failure() {
                    item.status = AssetStatus::Planned;
                    item.record_audit("render.error", err.to_string());
                    item.touch();
                    self.store.save_item(&item).await?;
                }
                return Err(err);
            }
        };

        item.status = AssetStatus::Generating;
        self.apply_outcome(&mut item, &outcome)?;
        item.record_audit(
            "render.trigger",
            format!(
                "attempt {} -> {}",
                outcome.disposition.status_code(),
                item.status.as_str()
            ),
        );
        item.touch();
        self.store.save_item(&item).await?;

        if outcome.disposition.is_pending() {
            self.poller
                .schedule(Arc::clone(self), owner_user_id, item.id);
        }
        Ok(Some(RenderReport {
            status_code: outcome.disposition.status_code(),
            item,
        }))
    }

    /// Poll re-entry for a pending long-running render. Never surfaces to a
    /// synchronous caller.
    pub async fn poll_render(
        self: &Arc<Self>,
        owner_user_id: Uuid,
        id: Uuid,
    ) -> Result<PollVerdict, PipelineError> {
        let Some(mut item) = self.owned_item(owner_user_id, id).await? else {
            return Ok(PollVerdict::Settled);
        };
        if item.status == AssetStatus::Archived {
            debug!(
                target = "application::library",
                item_id = %id,
                "poll fired for archived item, ignoring"
            );
            return Ok(PollVerdict::Settled);
        }
        // Each extend hop re-enters polling through `generating`.
        if item.status == AssetStatus::Extending {
            item.status = AssetStatus::Generating;
        }
        if item.status != AssetStatus::Generating {
            return Ok(PollVerdict::Settled);
        }

        let manifest = item.active_manifest().clone();
        let outcome = self
            .orchestrator
            .render(&manifest, &item, RenderOptions::default())
            .await?;
        self.apply_outcome(&mut item, &outcome)?;
        item.record_audit(
            "render.poll",
            format!(
                "attempt {} -> {}",
                outcome.disposition.status_code(),
                item.status.as_str()
            ),
        );
        item.touch();
        self.store.save_item(&item).await?;

        Ok(if outcome.disposition.is_pending() {
            PollVerdict::Pending
        } else {
            PollVerdict::Settled
        })
    }

    fn apply_outcome(
        &self,
        item: &mut VideoLibraryItem,
        outcome: &RenderOutcome,
    ) -> Result<(), PipelineError> {
        item.render_task = Some(outcome.task.clone());
        if let Some(veo) = &outcome.veo {
            item.veo = veo.clone();
        }
        let next = RenderOrchestrator::next_status(outcome);
        lifecycle::check(item.status, next)?;
        item.status = next;
        Ok(())
    }

    /// Patch the active manifest's caption in place. Never bumps the version.
    pub async fn edit_caption(
        &self,
        owner_user_id: Uuid,
        id: Uuid,
        caption: Caption,
    ) -> Result<Option<VideoLibraryItem>, PipelineError> {
        let Some(mut item) = self.owned_item(owner_user_id, id).await? else {
            return Ok(None);
        };
        if item.status == AssetStatus::Archived {
            return Err(PipelineError::validation("item is archived"));
        }
        validate_caption(&caption).map_err(PipelineError::validation)?;
        item.active_manifest_mut().caption = caption;
        item.record_audit("caption.edit", format!("manifest v{}", item.manifest_version));
        item.touch();
        self.store.save_item(&item).await?;
        Ok(Some(item))
    }

    /// Approve a ready item. Approving an approved item is a no-op returning
    /// current state.
    pub async fn approve(
        &self,
        owner_user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<VideoLibraryItem>, PipelineError> {
        let Some(mut item) = self.owned_item(owner_user_id, id).await? else {
            return Ok(None);
        };
        if item.status == AssetStatus::Approved {
            return Ok(Some(item));
        }
        lifecycle::check(item.status, AssetStatus::Approved)?;
        item.status = AssetStatus::Approved;
        item.record_audit("asset.approve", format!("manifest v{}", item.manifest_version));
        item.touch();
        self.store.save_item(&item).await?;
        Ok(Some(item))
    }

    /// Publish an approved item's completed render through the channel
    /// adapter. Adapter failure keeps the item approved and retryable.
    pub async fn publish(
        &self,
        owner_user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<VideoLibraryItem>, PipelineError> {
        let Some(mut item) = self.owned_item(owner_user_id, id).await? else {
            return Ok(None);
        };
        lifecycle::check(item.status, AssetStatus::Published)?;
        let render = item
            .render_task
            .clone()
            .filter(|task| task.status == RenderStatus::Completed)
            .ok_or_else(|| {
                PipelineError::validation("item has no completed render to publish")
            })?;

        let manifest = item.active_manifest().clone();
        let publish_task = self.publisher.dispatch(&manifest, &render).await?;
        let published = publish_task.status == PublishStatus::Published;
        item.publish_task = Some(publish_task);
        if published {
            item.status = AssetStatus::Published;
            info!(
                target = "application::library",
                item_id = %item.id,
                channel = %item.channel_id,
                "asset published"
            );
        } else {
            warn!(
                target = "application::library",
                item_id = %item.id,
                channel = %item.channel_id,
                "publish attempt failed, item stays approved"
            );
        }
        item.record_audit(
            "asset.publish",
            json!({ "published": published }).to_string(),
        );
        item.touch();
        self.store.save_item(&item).await?;
        Ok(Some(item))
    }

    /// Archive from any status. Terminal but not destructive; an armed poll
    /// for this item will observe the status and no-op.
    pub async fn archive(
        &self,
        owner_user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<VideoLibraryItem>, PipelineError> {
        let Some(mut item) = self.owned_item(owner_user_id, id).await? else {
            return Ok(None);
        };
        if item.status != AssetStatus::Archived {
            item.status = AssetStatus::Archived;
            item.record_audit("asset.archive", String::new());
            item.touch();
            self.store.save_item(&item).await?;
        }
        Ok(Some(item))
    }

    /// Sequential best-effort bulk approve/archive. Missing, foreign, and
    /// transition-ineligible ids are skipped; callers get back exactly the
    /// items that changed.
    pub async fn bulk_update(
        &self,
        owner_user_id: Uuid,
        ids: &[Uuid],
        action: BulkAction,
    ) -> Result<Vec<VideoLibraryItem>, PipelineError> {
        let mut updated = Vec::with_capacity(ids.len());
        for &id in ids {
            let result = match action {
                BulkAction::Approve => self.approve(owner_user_id, id).await,
                BulkAction::Archive => self.archive(owner_user_id, id).await,
            };
            match result {
                Ok(Some(item)) => updated.push(item),
                Ok(None) => {}
                Err(err) => {
                    warn!(
                        target = "application::library",
                        item_id = %id,
                        error = %err,
                        "bulk update skipped item"
                    );
                }
            }
        }
        Ok(updated)
    }
}
