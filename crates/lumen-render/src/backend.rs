//! The render backend seam
//!
//! Passes only talk to the GPU through [`RenderBackend`]. The
//! [`RecordingBackend`] implements it headlessly by recording commands and
//! tracking render target sizes and shared render state.

use lumen_core::{Color, Extent, ObjectId};
use tracing::debug;
use vulkano::format::Format;

use crate::uniform::{BlendMode, ShaderMaterial, UniformSet};

/// Handle to an offscreen render target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetId(pub u32);

/// Description of an offscreen render target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetDesc {
    pub label: &'static str,
    pub size: Extent,
    pub format: Format,
}

impl TargetDesc {
    /// HDR color target, needed so bloom sees values above 1.0
    pub fn hdr(label: &'static str, size: Extent) -> Self {
        Self {
            label,
            size,
            format: Format::R16G16B16A16_SFLOAT,
        }
    }

    /// 8-bit target for masks and edge buffers
    pub fn ldr(label: &'static str, size: Extent) -> Self {
        Self {
            label,
            size,
            format: Format::R8G8B8A8_UNORM,
        }
    }
}

/// What the backend can do, probed once at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendCaps {
    /// Renderable half-float color targets
    pub float_render_targets: bool,
    /// Largest supported target dimension
    pub max_target_size: u32,
}

impl BackendCaps {
    pub const FULL: BackendCaps = BackendCaps {
        float_render_targets: true,
        max_target_size: 8192,
    };

    /// Capabilities of a backend that can only draw straight to the screen
    pub const DIRECT_ONLY: BackendCaps = BackendCaps {
        float_render_targets: false,
        max_target_size: 0,
    };

    /// Whether the offscreen pass chain can run at the given viewport size
    pub fn supports_post_processing(&self, viewport: Extent) -> bool {
        self.float_render_targets
            && viewport.width <= self.max_target_size
            && viewport.height <= self.max_target_size
    }
}

/// Where a draw lands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Screen,
    Target(TargetId),
}

/// Which scene objects a scene render includes
#[derive(Debug, Clone, PartialEq)]
pub enum SceneFilter {
    All,
    /// Every other object is hidden for the duration of the render
    Only(Vec<ObjectId>),
}

/// Material override applied to every object of a scene render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneOverride {
    None,
    DepthOnly,
    /// Flat selection-mask color
    Mask,
}

/// GPU operations the pass chain needs
pub trait RenderBackend {
    fn caps(&self) -> BackendCaps;

    fn framebuffer_size(&self) -> Extent;
    fn resize_framebuffer(&mut self, size: Extent);

    fn create_target(&mut self, desc: TargetDesc) -> TargetId;
    fn resize_target(&mut self, target: TargetId, size: Extent);
    fn target_size(&self, target: TargetId) -> Option<Extent>;

    fn clear_color(&self) -> Color;
    fn set_clear_color(&mut self, color: Color);
    fn background_enabled(&self) -> bool;
    fn set_background_enabled(&mut self, enabled: bool);

    fn render_scene(
        &mut self,
        destination: Destination,
        filter: &SceneFilter,
        material_override: SceneOverride,
    );

    fn draw_fullscreen(&mut self, destination: Destination, material: &ShaderMaterial);
}

/// A command captured by [`RecordingBackend`]
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand {
    ResizeFramebuffer(Extent),
    CreateTarget {
        target: TargetId,
        label: &'static str,
        size: Extent,
    },
    ResizeTarget {
        target: TargetId,
        size: Extent,
    },
    SetClearColor(Color),
    SetBackground(bool),
    RenderScene {
        destination: Destination,
        filter: SceneFilter,
        material_override: SceneOverride,
    },
    DrawFullscreen {
        destination: Destination,
        material: &'static str,
        blend: BlendMode,
        uniforms: UniformSet,
    },
}

#[derive(Debug, Clone)]
struct RecordedTarget {
    desc: TargetDesc,
}

/// Headless backend that records every command it receives
#[derive(Debug, Clone)]
pub struct RecordingBackend {
    caps: BackendCaps,
    framebuffer: Extent,
    targets: Vec<RecordedTarget>,
    clear_color: Color,
    background: bool,
    commands: Vec<RenderCommand>,
}

impl RecordingBackend {
    pub fn new(caps: BackendCaps, framebuffer: Extent) -> Self {
        Self {
            caps,
            framebuffer,
            targets: Vec::new(),
            clear_color: Color::BLACK,
            background: true,
            commands: Vec::new(),
        }
    }

    pub fn commands(&self) -> &[RenderCommand] {
        &self.commands
    }

    /// Drain the recorded commands
    pub fn take_commands(&mut self) -> Vec<RenderCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn target_label(&self, target: TargetId) -> Option<&'static str> {
        self.targets.get(target.0 as usize).map(|t| t.desc.label)
    }

    pub fn target_format(&self, target: TargetId) -> Option<Format> {
        self.targets.get(target.0 as usize).map(|t| t.desc.format)
    }

    pub fn target_count(&self) -> usize {
        self.targets.len()
    }
}

impl RenderBackend for RecordingBackend {
    fn caps(&self) -> BackendCaps {
        self.caps
    }

    fn framebuffer_size(&self) -> Extent {
        self.framebuffer
    }

    fn resize_framebuffer(&mut self, size: Extent) {
        self.framebuffer = size;
        self.commands.push(RenderCommand::ResizeFramebuffer(size));
    }

    fn create_target(&mut self, desc: TargetDesc) -> TargetId {
        let target = TargetId(self.targets.len() as u32);
        debug!(
            "Creating target {:?} '{}' {}x{}",
            target, desc.label, desc.size.width, desc.size.height
        );
        self.targets.push(RecordedTarget { desc });
        self.commands.push(RenderCommand::CreateTarget {
            target,
            label: desc.label,
            size: desc.size,
        });
        target
    }

    fn resize_target(&mut self, target: TargetId, size: Extent) {
        if let Some(recorded) = self.targets.get_mut(target.0 as usize) {
            recorded.desc.size = size;
            self.commands
                .push(RenderCommand::ResizeTarget { target, size });
        }
    }

    fn target_size(&self, target: TargetId) -> Option<Extent> {
        self.targets.get(target.0 as usize).map(|t| t.desc.size)
    }

    fn clear_color(&self) -> Color {
        self.clear_color
    }

    fn set_clear_color(&mut self, color: Color) {
        self.clear_color = color;
        self.commands.push(RenderCommand::SetClearColor(color));
    }

    fn background_enabled(&self) -> bool {
        self.background
    }

    fn set_background_enabled(&mut self, enabled: bool) {
        self.background = enabled;
        self.commands.push(RenderCommand::SetBackground(enabled));
    }

    fn render_scene(
        &mut self,
        destination: Destination,
        filter: &SceneFilter,
        material_override: SceneOverride,
    ) {
        self.commands.push(RenderCommand::RenderScene {
            destination,
            filter: filter.clone(),
            material_override,
        });
    }

    fn draw_fullscreen(&mut self, destination: Destination, material: &ShaderMaterial) {
        self.commands.push(RenderCommand::DrawFullscreen {
            destination,
            material: material.label,
            blend: material.state.blend,
            uniforms: material.uniforms.clone(),
        });
    }
}
