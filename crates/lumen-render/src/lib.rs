//! Lumen Render - Screen glare materials and the post-process pass chain
//!
//! The pass chain is written against the [`RenderBackend`] trait so it can be
//! driven by a GPU backend or by the headless [`RecordingBackend`], which
//! records every command for previews and tests.

mod error;

pub mod backend;
pub mod glare;
pub mod passes;
pub mod pipeline;
pub mod uniform;
pub mod vertex;

pub use backend::{
    BackendCaps, Destination, RecordingBackend, RenderBackend, RenderCommand, SceneFilter,
    SceneOverride, TargetDesc, TargetId,
};
pub use error::RenderError;
pub use glare::{
    shade_glare, GlareMaterial, GlareMaterialFactory, GlareMaterialId, GlareParams,
    GlareRegistry, GlareSample, GlareSlot, GlareSurface, GlareUniforms,
};
pub use passes::{
    edge_only_overlay, BloomPass, BloomSettings, FrameInput, OutlineControl, OutlinePass,
    OutlinePassState, OutlineSettings, OutlineStats, Pass, RenderPass,
};
pub use pipeline::{CompositeMode, Compositor, PostProcessPipeline};
pub use uniform::{BlendMode, MaterialState, ShaderMaterial, UniformKind, UniformSet, UniformValue};
pub use vertex::GlareVertex;
