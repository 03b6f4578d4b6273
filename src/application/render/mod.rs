//! Render orchestration: strategy trait, provider registry, and the built-in
//! file/dry-run/veo strategies.

mod orchestrator;
mod providers;

pub use orchestrator::{
    Disposition, RenderError, RenderOptions, RenderOrchestrator, RenderOutcome, Renderer,
    RendererRegistry,
};
pub use providers::{
    DryRunRenderer, FileRenderer, VeoApiError, VeoClip, VeoExtendRequest, VeoOperations, VeoPoll,
    VeoRenderer, VeoStartRequest,
};
