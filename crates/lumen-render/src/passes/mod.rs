//! Post-process passes
//!
//! Passes run in a fixed order against the pipeline's HDR color target:
//! [`RenderPass`] draws the scene, [`BloomPass`] adds scattered light from
//! bright pixels and [`OutlinePass`] composites the attention outline.

mod base;
mod bloom;
mod outline;

use std::time::Duration;

use lumen_core::Extent;

use crate::backend::{RenderBackend, TargetId};
use crate::error::RenderError;
use crate::uniform::{ShaderMaterial, UniformValue};

pub use base::RenderPass;
pub use bloom::{BloomPass, BloomSettings, BLOOM_MIP_LEVELS};
pub use outline::{
    edge_only_overlay, OutlineControl, OutlinePass, OutlinePassState, OutlineSettings,
    OutlineStats, OverlayUniforms, OVERLAY_REQUIRED_UNIFORMS,
};

/// Per-frame input shared by every pass
#[derive(Debug, Clone, Copy)]
pub struct FrameInput {
    /// HDR target holding the frame being composited
    pub color_target: TargetId,
    /// Time since startup
    pub time: Duration,
}

/// One stage of the post-process chain
pub trait Pass {
    fn name(&self) -> &'static str;

    fn is_enabled(&self) -> bool;

    /// Viewport resolution the pass's internal targets are sized for
    fn resolution(&self) -> Extent;

    /// Resize internal targets for a new viewport
    fn set_size(&mut self, backend: &mut dyn RenderBackend, size: Extent);

    fn render(&mut self, backend: &mut dyn RenderBackend, frame: &FrameInput);
}

/// Write several uniforms, stopping at the first failure
fn bind(
    material: &mut ShaderMaterial,
    values: &[(&str, UniformValue)],
) -> Result<(), RenderError> {
    for (name, value) in values {
        material.set_uniform(name, *value)?;
    }
    Ok(())
}
