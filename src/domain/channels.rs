//! Channel placement catalogue.
//!
//! Each channel pins the provider, model, aspect ratio, and target duration a
//! manifest is built against. The catalogue is static; unknown channel ids are
//! rejected at item creation.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Caption limits shared by every supported placement.
pub const CAPTION_MAX_CHARS: usize = 400;
pub const CAPTION_MAX_HASHTAGS: usize = 8;

/// Placement rules for one distribution channel, snapshotted into manifests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelSpec {
    pub channel_id: String,
    pub channel_name: String,
    pub placement: String,
    pub provider: String,
    pub model_id: String,
    pub aspect_ratio: String,
    pub target_seconds: u32,
    pub cta_label: String,
}

static CHANNELS: Lazy<Vec<ChannelSpec>> = Lazy::new(|| {
    vec![
        ChannelSpec {
            channel_id: "TIKTOK_LEAD".into(),
            channel_name: "TikTok".into(),
            placement: "lead_gen_feed".into(),
            provider: "veo".into(),
            model_id: "veo-3.0-fast".into(),
            aspect_ratio: "9:16".into(),
            target_seconds: 24,
            cta_label: "Apply now".into(),
        },
        ChannelSpec {
            channel_id: "REELS_REACH".into(),
            channel_name: "Instagram Reels".into(),
            placement: "reach_reels".into(),
            provider: "veo".into(),
            model_id: "veo-3.0-generate".into(),
            aspect_ratio: "9:16".into(),
            target_seconds: 16,
            cta_label: "See the role".into(),
        },
        ChannelSpec {
            channel_id: "SHORTS_APPLY".into(),
            channel_name: "YouTube Shorts".into(),
            placement: "shorts_apply".into(),
            provider: "sora".into(),
            model_id: "sora-turbo".into(),
            aspect_ratio: "9:16".into(),
            target_seconds: 12,
            cta_label: "Apply in one tap".into(),
        },
        ChannelSpec {
            channel_id: "LINKEDIN_FEED".into(),
            channel_name: "LinkedIn".into(),
            placement: "feed_native".into(),
            provider: "sora".into(),
            model_id: "sora-turbo".into(),
            aspect_ratio: "1:1".into(),
            target_seconds: 8,
            cta_label: "View opening".into(),
        },
    ]
});

/// Look up a placement spec by channel id.
pub fn resolve(channel_id: &str) -> Option<ChannelSpec> {
    CHANNELS
        .iter()
        .find(|spec| spec.channel_id == channel_id)
        .cloned()
}

pub fn known_channel_ids() -> Vec<&'static str> {
    CHANNELS.iter().map(|spec| spec.channel_id.as_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_channels() {
        let spec = resolve("TIKTOK_LEAD").unwrap();
        assert_eq!(spec.provider, "veo");
        assert_eq!(spec.aspect_ratio, "9:16");
        assert!(resolve("BILLBOARD_TIMES_SQUARE").is_none());
    }

    #[test]
    fn catalogue_ids_are_unique() {
        let mut ids = known_channel_ids();
        ids.sort_unstable();
        let before = ids.len();
        ids.dedup();
        assert_eq!(before, ids.len());
    }
}
