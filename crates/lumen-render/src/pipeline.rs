//! Ordered post-process chain and its direct-rendering fallback

use std::time::Duration;

use lumen_core::{Extent, ObjectId};
use tracing::{info, warn};

use crate::backend::{Destination, RenderBackend, SceneFilter, SceneOverride, TargetDesc, TargetId};
use crate::error::RenderError;
use crate::passes::{
    BloomPass, BloomSettings, FrameInput, OutlineControl, OutlinePass, OutlinePassState,
    OutlineSettings, OutlineStats, Pass, RenderPass,
};
use crate::uniform::{MaterialState, ShaderMaterial, UniformSet, UniformValue};

const OUTPUT_FRAGMENT: &str = r#"#version 450
layout(location = 0) in vec2 v_uv;
layout(set = 0, binding = 0) uniform sampler2D source_texture;
layout(location = 0) out vec4 out_color;

void main() {
    vec3 hdr = texture(source_texture, v_uv).rgb;
    out_color = vec4(hdr / (hdr + vec3(1.0)), 1.0);
}
"#;

/// Base render, bloom and outline over a shared HDR color target, then a
/// tone-mapped copy to the screen
#[derive(Debug, Clone)]
pub struct PostProcessPipeline {
    size: Extent,
    color_target: TargetId,
    base: RenderPass,
    bloom: BloomPass,
    outline: OutlinePass,
    output: ShaderMaterial,
}

impl PostProcessPipeline {
    pub fn new(
        backend: &mut dyn RenderBackend,
        size: Extent,
        bloom: BloomSettings,
        outline: OutlineSettings,
    ) -> Result<Self, RenderError> {
        let caps = backend.caps();
        if !caps.supports_post_processing(size) {
            return Err(RenderError::BackendUnavailable(format!(
                "float targets: {}, max target size {} for a {}x{} viewport",
                caps.float_render_targets, caps.max_target_size, size.width, size.height
            )));
        }

        let color_target = backend.create_target(TargetDesc::hdr("scene_color", size));
        let base = RenderPass::new(size);
        let bloom = BloomPass::new(backend, size, bloom);
        let outline = OutlinePass::new(backend, size, outline)?;
        let output = ShaderMaterial::fullscreen(
            "output_copy",
            OUTPUT_FRAGMENT,
            UniformSet::new().with("source_texture", UniformValue::Texture(Some(color_target))),
            MaterialState::FULLSCREEN,
        );

        info!("Post-process pipeline ready at {}x{}", size.width, size.height);

        Ok(Self {
            size,
            color_target,
            base,
            bloom,
            outline,
            output,
        })
    }

    pub fn size(&self) -> Extent {
        self.size
    }

    pub fn color_target(&self) -> TargetId {
        self.color_target
    }

    /// Passes in execution order
    pub fn passes(&self) -> [&dyn Pass; 3] {
        [&self.base, &self.bloom, &self.outline]
    }

    pub fn bloom(&self) -> &BloomPass {
        &self.bloom
    }

    pub fn outline(&self) -> &OutlinePass {
        &self.outline
    }

    pub fn outline_mut(&mut self) -> &mut OutlinePass {
        &mut self.outline
    }

    pub fn render(&mut self, backend: &mut dyn RenderBackend, time: Duration) {
        let frame = FrameInput {
            color_target: self.color_target,
            time,
        };
        let passes: [&mut dyn Pass; 3] = [&mut self.base, &mut self.bloom, &mut self.outline];
        for pass in passes {
            if pass.is_enabled() {
                pass.render(backend, &frame);
            }
        }
        backend.draw_fullscreen(Destination::Screen, &self.output);
    }

    pub fn set_size(&mut self, backend: &mut dyn RenderBackend, size: Extent) {
        self.size = size;
        backend.resize_target(self.color_target, size);
        let passes: [&mut dyn Pass; 3] = [&mut self.base, &mut self.bloom, &mut self.outline];
        for pass in passes {
            pass.set_size(backend, size);
        }
    }
}

/// How frames reach the screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositeMode {
    Composited,
    /// Scene drawn straight to the screen, no post-processing
    Direct,
}

/// The composited pass chain, or direct rendering when the backend cannot
/// run it. Outline state is kept in both modes.
#[derive(Debug, Clone)]
pub enum Compositor {
    Composited(Box<PostProcessPipeline>),
    Direct { outline: OutlinePassState },
}

impl Compositor {
    pub fn new(
        backend: &mut dyn RenderBackend,
        size: Extent,
        bloom: BloomSettings,
        outline: OutlineSettings,
    ) -> Self {
        match PostProcessPipeline::new(backend, size, bloom, outline) {
            Ok(pipeline) => Compositor::Composited(Box::new(pipeline)),
            Err(e) => {
                warn!("{}, rendering without post-processing", e);
                Compositor::Direct {
                    outline: OutlinePassState::new(),
                }
            }
        }
    }

    pub fn mode(&self) -> CompositeMode {
        match self {
            Compositor::Composited(_) => CompositeMode::Composited,
            Compositor::Direct { .. } => CompositeMode::Direct,
        }
    }

    pub fn pipeline(&self) -> Option<&PostProcessPipeline> {
        match self {
            Compositor::Composited(pipeline) => Some(&**pipeline),
            Compositor::Direct { .. } => None,
        }
    }

    pub fn outline_state(&self) -> &OutlinePassState {
        match self {
            Compositor::Composited(pipeline) => pipeline.outline().state(),
            Compositor::Direct { outline } => outline,
        }
    }

    pub fn outline_stats(&self) -> OutlineStats {
        self.pipeline()
            .map(|pipeline| pipeline.outline().stats())
            .unwrap_or_default()
    }

    /// Fix the set of objects the outline highlights
    pub fn wire_outline_targets(&mut self, targets: Vec<ObjectId>) -> Result<(), RenderError> {
        match self {
            Compositor::Composited(pipeline) => pipeline.outline_mut().set_targets(targets),
            Compositor::Direct { outline } => outline.assign_targets(targets),
        }
    }

    pub fn render(&mut self, backend: &mut dyn RenderBackend, time: Duration) {
        match self {
            Compositor::Composited(pipeline) => pipeline.render(backend, time),
            Compositor::Direct { .. } => {
                backend.render_scene(Destination::Screen, &SceneFilter::All, SceneOverride::None);
            }
        }
    }

    /// Resize the framebuffer and every pass. Must be called on viewport change.
    pub fn resize(&mut self, backend: &mut dyn RenderBackend, size: Extent) {
        info!("Resizing to {}x{}", size.width, size.height);
        backend.resize_framebuffer(size);

        let supported = backend.caps().supports_post_processing(size);
        let fallback = match self {
            Compositor::Composited(pipeline) if supported => {
                pipeline.set_size(backend, size);
                None
            }
            Compositor::Composited(pipeline) => Some(pipeline.outline().state().clone()),
            Compositor::Direct { .. } => None,
        };

        if let Some(outline) = fallback {
            warn!(
                "Viewport {}x{} exceeds post-processing limits, rendering directly",
                size.width, size.height
            );
            *self = Compositor::Direct { outline };
        }
    }
}

impl OutlineControl for Compositor {
    fn outline_enabled(&self) -> bool {
        self.outline_state().enabled
    }

    fn set_outline_enabled(&mut self, enabled: bool) {
        match self {
            Compositor::Composited(pipeline) => pipeline.outline_mut().set_outline_enabled(enabled),
            Compositor::Direct { outline } => outline.set_outline_enabled(enabled),
        }
    }

    fn edge_strength(&self) -> f32 {
        self.outline_state().edge_strength
    }

    fn set_edge_strength(&mut self, strength: f32) {
        match self {
            Compositor::Composited(pipeline) => pipeline.outline_mut().set_edge_strength(strength),
            Compositor::Direct { outline } => outline.set_edge_strength(strength),
        }
    }
}
