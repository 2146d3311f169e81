use lumen_core::Extent;

use crate::backend::{Destination, RenderBackend, SceneFilter, SceneOverride};

use super::{FrameInput, Pass};

/// Draws the full scene into the pipeline's color target
#[derive(Debug, Clone)]
pub struct RenderPass {
    size: Extent,
}

impl RenderPass {
    pub fn new(size: Extent) -> Self {
        Self { size }
    }
}

impl Pass for RenderPass {
    fn name(&self) -> &'static str {
        "render"
    }

    fn is_enabled(&self) -> bool {
        true
    }

    fn resolution(&self) -> Extent {
        self.size
    }

    fn set_size(&mut self, _backend: &mut dyn RenderBackend, size: Extent) {
        self.size = size;
    }

    fn render(&mut self, backend: &mut dyn RenderBackend, frame: &FrameInput) {
        backend.render_scene(
            Destination::Target(frame.color_target),
            &SceneFilter::All,
            SceneOverride::None,
        );
    }
}
