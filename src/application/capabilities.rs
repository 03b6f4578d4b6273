//! Static per-provider render constraints.
//!
//! Two incompatible vendor profiles ship today: `veo` renders short clips and
//! grows them through extend hops; `sora` renders a single longer shot with no
//! extension. Unknown providers fall back to a conservative single-clip
//! profile; callers must treat that fallback as advisory, not authoritative.

#[derive(Debug, Clone, PartialEq)]
pub struct ProviderCapabilities {
    pub supported_durations: &'static [u32],
    pub max_single_shot_seconds: u32,
    pub supports_extend: bool,
    pub extend_step_seconds: u32,
    pub max_total_seconds: u32,
    pub supported_aspect_ratios: &'static [&'static str],
    pub supported_resolutions: &'static [&'static str],
}

const VEO: ProviderCapabilities = ProviderCapabilities {
    supported_durations: &[4, 6, 8],
    max_single_shot_seconds: 8,
    supports_extend: true,
    extend_step_seconds: 7,
    max_total_seconds: 60,
    supported_aspect_ratios: &["9:16", "16:9"],
    supported_resolutions: &["720p", "1080p"],
};

const SORA: ProviderCapabilities = ProviderCapabilities {
    supported_durations: &[4, 8, 12],
    max_single_shot_seconds: 12,
    supports_extend: false,
    extend_step_seconds: 0,
    max_total_seconds: 12,
    supported_aspect_ratios: &["9:16", "16:9", "1:1"],
    supported_resolutions: &["720p"],
};

const FALLBACK: ProviderCapabilities = ProviderCapabilities {
    supported_durations: &[8],
    max_single_shot_seconds: 8,
    supports_extend: false,
    extend_step_seconds: 0,
    max_total_seconds: 8,
    supported_aspect_ratios: &["9:16"],
    supported_resolutions: &["720p"],
};

/// Look up the constraints for a provider. The model id selects between
/// same-provider variants where it matters; today only the veo fast model
/// differs (shorter total budget).
pub fn capabilities(provider: &str, model_id: Option<&str>) -> ProviderCapabilities {
    match provider {
        "veo" => {
            let mut caps = VEO;
            if matches!(model_id, Some(model) if model.ends_with("-fast")) {
                caps.max_total_seconds = 30;
            }
            caps
        }
        "sora" => SORA,
        _ => FALLBACK,
    }
}

/// Clamp a requested duration into what the provider can actually produce.
pub fn clamp_target_seconds(target: u32, caps: &ProviderCapabilities) -> u32 {
    let floor = caps
        .supported_durations
        .first()
        .copied()
        .unwrap_or(caps.max_single_shot_seconds);
    target.clamp(floor, caps.max_total_seconds)
}

/// Number of extend hops needed to reach `target_seconds` past the first clip.
pub fn planned_extends(target_seconds: u32, caps: &ProviderCapabilities) -> u32 {
    if !caps.supports_extend || caps.extend_step_seconds == 0 {
        return 0;
    }
    let remainder = target_seconds.saturating_sub(caps.max_single_shot_seconds);
    remainder.div_ceil(caps.extend_step_seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_provider_gets_conservative_fallback() {
        let caps = capabilities("lumina", None);
        assert_eq!(caps.max_single_shot_seconds, 8);
        assert!(!caps.supports_extend);
        assert_eq!(caps.supported_aspect_ratios, ["9:16"]);
    }

    #[test]
    fn veo_fast_model_tightens_total_budget() {
        assert_eq!(capabilities("veo", Some("veo-3.0-fast")).max_total_seconds, 30);
        assert_eq!(
            capabilities("veo", Some("veo-3.0-generate")).max_total_seconds,
            60
        );
    }

    #[test]
    fn extend_planning_rounds_up() {
        let caps = capabilities("veo", None);
        // 24s target: 8s first clip + ceil(16 / 7) = 3 hops.
        assert_eq!(planned_extends(24, &caps), 3);
        assert_eq!(planned_extends(8, &caps), 0);
        assert_eq!(planned_extends(15, &caps), 1);
    }

    #[test]
    fn no_extends_without_provider_support() {
        let caps = capabilities("sora", None);
        assert_eq!(planned_extends(40, &caps), 0);
    }

    #[test]
    fn clamps_target_into_provider_range() {
        let veo = capabilities("veo", None);
        assert_eq!(clamp_target_seconds(90, &veo), 60);
        assert_eq!(clamp_target_seconds(2, &veo), 4);
        let sora = capabilities("sora", None);
        assert_eq!(clamp_target_seconds(24, &sora), 12);
    }
}
