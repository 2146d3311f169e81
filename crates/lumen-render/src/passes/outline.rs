//! Attention outline pass
//!
//! Renders a selection mask of a fixed set of target objects, detects its
//! silhouette edges at half and quarter resolution and adds a pulsing edge
//! glow onto the frame.
//!
//! The stock overlay of this effect multiplies the edge output by the
//! selection mask, which is zero on every unselected pixel, so under
//! additive blending it contributes nothing. [`edge_only_overlay`] replaces
//! it with a shader that adds the two edge textures directly. The
//! replacement still declares every slot the per-frame write touches (see
//! [`OVERLAY_REQUIRED_UNIFORMS`]); a missing slot aborts the composite for
//! that frame.
//!
//! Known limitation: the mask and edge renders run every frame the pass is
//! enabled, whether or not anything is outlined, and the mask render swaps
//! out the shared clear color and background while it runs. The resulting
//! dimming persists for as long as the pass stays enabled. Removing it needs
//! a single-pass edge-only effect that skips those extra renders.

use std::f32::consts::TAU;

use lumen_core::{Color, Extent, ObjectId};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::backend::{Destination, RenderBackend, SceneFilter, SceneOverride, TargetDesc, TargetId};
use crate::error::RenderError;
use crate::uniform::{MaterialState, ShaderMaterial, UniformSet, UniformValue};

use super::{bind, FrameInput, Pass};

/// Every uniform the overlay composite writes each frame
pub const OVERLAY_REQUIRED_UNIFORMS: [&str; 7] = [
    "mask_texture",
    "edge_texture_1",
    "edge_texture_2",
    "pattern_texture",
    "edge_strength",
    "edge_glow",
    "use_pattern_texture",
];

const MASK_CLEAR_COLOR: Color = Color::WHITE;

const DOWNSAMPLE_FRAGMENT: &str = r#"#version 450
layout(location = 0) in vec2 v_uv;
layout(set = 0, binding = 0) uniform sampler2D source_texture;
layout(location = 0) out vec4 out_color;

void main() {
    out_color = texture(source_texture, v_uv);
}
"#;

const EDGE_DETECT_FRAGMENT: &str = r#"#version 450
layout(location = 0) in vec2 v_uv;
layout(set = 0, binding = 0) uniform sampler2D mask_texture;
layout(set = 0, binding = 1) uniform EdgeDetect {
    vec3 visible_edge_color;
    vec3 hidden_edge_color;
    float edge_thickness;
};
layout(location = 0) out vec4 out_color;

void main() {
    vec2 texel = edge_thickness / vec2(textureSize(mask_texture, 0));
    vec4 c1 = texture(mask_texture, v_uv + vec2(texel.x, 0.0));
    vec4 c2 = texture(mask_texture, v_uv - vec2(texel.x, 0.0));
    vec4 c3 = texture(mask_texture, v_uv + vec2(0.0, texel.y));
    vec4 c4 = texture(mask_texture, v_uv - vec2(0.0, texel.y));
    float dx = (c1.r - c2.r) * 0.5;
    float dy = (c3.r - c4.r) * 0.5;
    float edge = length(vec2(dx, dy));
    float hidden = min(min(c1.g, c2.g), min(c3.g, c4.g));
    vec3 color = mix(visible_edge_color, hidden_edge_color, step(0.5, hidden));
    out_color = vec4(color, 1.0) * edge;
}
"#;

const EDGE_BLUR_FRAGMENT: &str = r#"#version 450
layout(location = 0) in vec2 v_uv;
layout(set = 0, binding = 0) uniform sampler2D source_texture;
layout(set = 0, binding = 1) uniform EdgeBlur {
    float kernel_radius;
};
layout(location = 0) out vec4 out_color;

void main() {
    vec2 texel = kernel_radius / vec2(textureSize(source_texture, 0));
    vec4 sum = texture(source_texture, v_uv) * 0.36;
    sum += texture(source_texture, v_uv + texel) * 0.16;
    sum += texture(source_texture, v_uv - texel) * 0.16;
    sum += texture(source_texture, v_uv + vec2(texel.x, -texel.y)) * 0.16;
    sum += texture(source_texture, v_uv + vec2(-texel.x, texel.y)) * 0.16;
    out_color = sum;
}
"#;

/// Overlay that adds both edge textures without the mask multiplication.
/// The mask and pattern slots are declared but never read.
const EDGE_ONLY_OVERLAY_FRAGMENT: &str = r#"#version 450
layout(location = 0) in vec2 v_uv;
layout(set = 0, binding = 0) uniform sampler2D mask_texture;
layout(set = 0, binding = 1) uniform sampler2D edge_texture_1;
layout(set = 0, binding = 2) uniform sampler2D edge_texture_2;
layout(set = 0, binding = 3) uniform sampler2D pattern_texture;
layout(set = 0, binding = 4) uniform Overlay {
    float edge_strength;
    float edge_glow;
    bool use_pattern_texture;
};
layout(location = 0) out vec4 out_color;

void main() {
    vec4 edge_1 = texture(edge_texture_1, v_uv);
    vec4 edge_2 = texture(edge_texture_2, v_uv);
    out_color = edge_strength * (edge_1 + edge_2 * edge_glow);
}
"#;

/// Outline tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlineSettings {
    /// Edge strength reached at the end of a hint fade-in
    pub target_edge_strength: f32,
    pub edge_glow: f32,
    pub edge_thickness: f32,
    /// Seconds per brightness pulse; 0 disables pulsing
    pub pulse_period_secs: f32,
    pub visible_edge_color: Color,
    pub hidden_edge_color: Color,
    pub use_pattern_texture: bool,
}

impl Default for OutlineSettings {
    fn default() -> Self {
        Self {
            target_edge_strength: 3.0,
            edge_glow: 1.0,
            edge_thickness: 1.0,
            pulse_period_secs: 2.0,
            visible_edge_color: Color::from_hex(0x9fd4ff),
            hidden_edge_color: Color::from_hex(0x2a3a66),
            use_pattern_texture: false,
        }
    }
}

impl OutlineSettings {
    /// Brightness multiplier of the visible edge color at `secs`, in [0.5, 1]
    pub fn pulse(&self, secs: f32) -> f32 {
        if self.pulse_period_secs <= 0.0 {
            return 1.0;
        }
        0.75 + 0.25 * (TAU * secs / self.pulse_period_secs).cos()
    }
}

/// Switchable outline state, also kept when compositing falls back to direct
/// rendering so the hint scheduler has something to drive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutlinePassState {
    pub enabled: bool,
    pub edge_strength: f32,
    targets: Vec<ObjectId>,
    targets_assigned: bool,
}

impl OutlinePassState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn targets(&self) -> &[ObjectId] {
        &self.targets
    }

    /// Fix the outlined object set. Only the first call succeeds.
    pub fn assign_targets(&mut self, targets: Vec<ObjectId>) -> Result<(), RenderError> {
        if self.targets_assigned {
            return Err(RenderError::OutlineTargetsAlreadyAssigned);
        }
        debug!("Outline targets assigned: {} objects", targets.len());
        self.targets = targets;
        self.targets_assigned = true;
        Ok(())
    }
}

/// The knobs the hint scheduler turns
pub trait OutlineControl {
    fn outline_enabled(&self) -> bool;
    fn set_outline_enabled(&mut self, enabled: bool);
    fn edge_strength(&self) -> f32;
    fn set_edge_strength(&mut self, strength: f32);
}

impl OutlineControl for OutlinePassState {
    fn outline_enabled(&self) -> bool {
        self.enabled
    }

    fn set_outline_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn edge_strength(&self) -> f32 {
        self.edge_strength
    }

    fn set_edge_strength(&mut self, strength: f32) {
        self.edge_strength = strength.max(0.0);
    }
}

/// Values written into the overlay each frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayUniforms {
    pub mask_texture: Option<TargetId>,
    pub edge_texture_1: Option<TargetId>,
    pub edge_texture_2: Option<TargetId>,
    pub pattern_texture: Option<TargetId>,
    pub edge_strength: f32,
    pub edge_glow: f32,
    pub use_pattern_texture: bool,
}

impl Default for OverlayUniforms {
    fn default() -> Self {
        Self {
            mask_texture: None,
            edge_texture_1: None,
            edge_texture_2: None,
            pattern_texture: None,
            edge_strength: 0.0,
            edge_glow: 1.0,
            use_pattern_texture: false,
        }
    }
}

impl OverlayUniforms {
    pub fn entries(&self) -> [(&'static str, UniformValue); 7] {
        [
            ("mask_texture", UniformValue::Texture(self.mask_texture)),
            ("edge_texture_1", UniformValue::Texture(self.edge_texture_1)),
            ("edge_texture_2", UniformValue::Texture(self.edge_texture_2)),
            ("pattern_texture", UniformValue::Texture(self.pattern_texture)),
            ("edge_strength", UniformValue::Float(self.edge_strength)),
            ("edge_glow", UniformValue::Float(self.edge_glow)),
            ("use_pattern_texture", UniformValue::Bool(self.use_pattern_texture)),
        ]
    }

    pub fn to_uniform_set(&self) -> UniformSet {
        self.entries()
            .into_iter()
            .fold(UniformSet::new(), |set, (name, value)| set.with(name, value))
    }
}

/// The replacement overlay: additive, no depth, every required slot declared
pub fn edge_only_overlay() -> ShaderMaterial {
    ShaderMaterial::fullscreen(
        "outline_overlay",
        EDGE_ONLY_OVERLAY_FRAGMENT,
        OverlayUniforms::default().to_uniform_set(),
        MaterialState::ADDITIVE_OVERLAY,
    )
}

/// Frame counters of the outline pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutlineStats {
    /// Frames where the mask and edge renders ran
    pub upstream_renders: u64,
    /// Frames where the overlay was added onto the color target
    pub composites: u64,
    /// Frames where the overlay write failed after the upstream renders ran
    pub skipped_composites: u64,
}

#[derive(Debug, Clone, Copy)]
struct OutlineTargets {
    mask: TargetId,
    mask_half: TargetId,
    edge_1: TargetId,
    edge_2: TargetId,
}

impl OutlineTargets {
    fn create(backend: &mut dyn RenderBackend, size: Extent) -> Self {
        Self {
            mask: backend.create_target(TargetDesc::ldr("outline_mask", size)),
            mask_half: backend.create_target(TargetDesc::ldr("outline_mask_half", size.halved(1))),
            edge_1: backend.create_target(TargetDesc::ldr("outline_edge_1", size.halved(1))),
            edge_2: backend.create_target(TargetDesc::ldr("outline_edge_2", size.halved(2))),
        }
    }

    fn resize(&self, backend: &mut dyn RenderBackend, size: Extent) {
        backend.resize_target(self.mask, size);
        backend.resize_target(self.mask_half, size.halved(1));
        backend.resize_target(self.edge_1, size.halved(1));
        backend.resize_target(self.edge_2, size.halved(2));
    }
}

/// Silhouette outline of the target objects with an edge-only overlay
#[derive(Debug, Clone)]
pub struct OutlinePass {
    settings: OutlineSettings,
    state: OutlinePassState,
    size: Extent,
    targets: OutlineTargets,
    downsample: ShaderMaterial,
    edge_detect: ShaderMaterial,
    edge_blur: ShaderMaterial,
    overlay: ShaderMaterial,
    stats: OutlineStats,
}

impl OutlinePass {
    pub fn new(
        backend: &mut dyn RenderBackend,
        size: Extent,
        settings: OutlineSettings,
    ) -> Result<Self, RenderError> {
        Self::with_overlay(backend, size, settings, edge_only_overlay())
    }

    /// Build the pass around a custom overlay, rejecting overlays that do not
    /// declare every slot in [`OVERLAY_REQUIRED_UNIFORMS`]
    pub fn with_overlay(
        backend: &mut dyn RenderBackend,
        size: Extent,
        settings: OutlineSettings,
        overlay: ShaderMaterial,
    ) -> Result<Self, RenderError> {
        overlay.validate(&OVERLAY_REQUIRED_UNIFORMS)?;
        Ok(Self::assemble(backend, size, settings, overlay))
    }

    /// Skips overlay validation so the per-frame failure path can be exercised
    #[cfg(test)]
    fn unvalidated(
        backend: &mut dyn RenderBackend,
        size: Extent,
        settings: OutlineSettings,
        overlay: ShaderMaterial,
    ) -> Self {
        Self::assemble(backend, size, settings, overlay)
    }

    fn assemble(
        backend: &mut dyn RenderBackend,
        size: Extent,
        settings: OutlineSettings,
        overlay: ShaderMaterial,
    ) -> Self {
        let targets = OutlineTargets::create(backend, size);

        let downsample = ShaderMaterial::fullscreen(
            "outline_downsample",
            DOWNSAMPLE_FRAGMENT,
            UniformSet::new().with("source_texture", UniformValue::Texture(Some(targets.mask))),
            MaterialState::FULLSCREEN,
        );
        let edge_detect = ShaderMaterial::fullscreen(
            "outline_edge_detect",
            EDGE_DETECT_FRAGMENT,
            UniformSet::new()
                .with("mask_texture", UniformValue::Texture(Some(targets.mask_half)))
                .with(
                    "visible_edge_color",
                    UniformValue::Vec3(settings.visible_edge_color.to_vec3()),
                )
                .with(
                    "hidden_edge_color",
                    UniformValue::Vec3(settings.hidden_edge_color.to_vec3()),
                )
                .with("edge_thickness", UniformValue::Float(settings.edge_thickness)),
            MaterialState::FULLSCREEN,
        );
        let edge_blur = ShaderMaterial::fullscreen(
            "outline_edge_blur",
            EDGE_BLUR_FRAGMENT,
            UniformSet::new()
                .with("source_texture", UniformValue::Texture(Some(targets.edge_1)))
                .with("kernel_radius", UniformValue::Float(settings.edge_thickness * 2.0)),
            MaterialState::FULLSCREEN,
        );

        Self {
            settings,
            state: OutlinePassState::new(),
            size,
            targets,
            downsample,
            edge_detect,
            edge_blur,
            overlay,
            stats: OutlineStats::default(),
        }
    }

    pub fn settings(&self) -> &OutlineSettings {
        &self.settings
    }

    pub fn state(&self) -> &OutlinePassState {
        &self.state
    }

    pub fn stats(&self) -> OutlineStats {
        self.stats
    }

    pub fn overlay(&self) -> &ShaderMaterial {
        &self.overlay
    }

    pub fn set_targets(&mut self, targets: Vec<ObjectId>) -> Result<(), RenderError> {
        self.state.assign_targets(targets)
    }

    fn render_mask(&self, backend: &mut dyn RenderBackend) {
        let saved_clear = backend.clear_color();
        let saved_background = backend.background_enabled();

        backend.set_background_enabled(false);
        backend.set_clear_color(MASK_CLEAR_COLOR);
        backend.render_scene(
            Destination::Target(self.targets.mask),
            &SceneFilter::Only(self.state.targets.clone()),
            SceneOverride::Mask,
        );

        backend.set_clear_color(saved_clear);
        backend.set_background_enabled(saved_background);
    }

    fn render_edges(
        &mut self,
        backend: &mut dyn RenderBackend,
        frame: &FrameInput,
    ) -> Result<(), RenderError> {
        backend.draw_fullscreen(Destination::Target(self.targets.mask_half), &self.downsample);

        let pulse = self.settings.pulse(frame.time.as_secs_f32());
        bind(
            &mut self.edge_detect,
            &[(
                "visible_edge_color",
                UniformValue::Vec3(self.settings.visible_edge_color.to_vec3() * pulse),
            )],
        )?;
        backend.draw_fullscreen(Destination::Target(self.targets.edge_1), &self.edge_detect);
        backend.draw_fullscreen(Destination::Target(self.targets.edge_2), &self.edge_blur);
        Ok(())
    }

    fn overlay_uniforms(&self) -> OverlayUniforms {
        OverlayUniforms {
            mask_texture: Some(self.targets.mask),
            edge_texture_1: Some(self.targets.edge_1),
            edge_texture_2: Some(self.targets.edge_2),
            pattern_texture: None,
            edge_strength: self.state.edge_strength,
            edge_glow: self.settings.edge_glow,
            use_pattern_texture: self.settings.use_pattern_texture,
        }
    }
}

impl OutlineControl for OutlinePass {
    fn outline_enabled(&self) -> bool {
        self.state.outline_enabled()
    }

    fn set_outline_enabled(&mut self, enabled: bool) {
        self.state.set_outline_enabled(enabled);
    }

    fn edge_strength(&self) -> f32 {
        self.state.edge_strength()
    }

    fn set_edge_strength(&mut self, strength: f32) {
        self.state.set_edge_strength(strength);
    }
}

impl Pass for OutlinePass {
    fn name(&self) -> &'static str {
        "outline"
    }

    fn is_enabled(&self) -> bool {
        self.state.enabled
    }

    fn resolution(&self) -> Extent {
        self.size
    }

    fn set_size(&mut self, backend: &mut dyn RenderBackend, size: Extent) {
        self.size = size;
        self.targets.resize(backend, size);
    }

    fn render(&mut self, backend: &mut dyn RenderBackend, frame: &FrameInput) {
        if !self.state.enabled {
            return;
        }

        self.render_mask(backend);
        let edges = self.render_edges(backend, frame);
        self.stats.upstream_renders += 1;
        if let Err(e) = edges {
            error!("Outline edge detection failed: {}", e);
            self.stats.skipped_composites += 1;
            return;
        }

        let uniforms = self.overlay_uniforms();
        match bind(&mut self.overlay, &uniforms.entries()) {
            Ok(()) => {
                backend.draw_fullscreen(Destination::Target(frame.color_target), &self.overlay);
                self.stats.composites += 1;
            }
            Err(e) => {
                error!("Outline overlay composite skipped: {}", e);
                self.stats.skipped_composites += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendCaps, RecordingBackend, RenderCommand};
    use crate::uniform::BlendMode;
    use std::time::Duration;

    fn frame(color: TargetId) -> FrameInput {
        FrameInput {
            color_target: color,
            time: Duration::from_millis(500),
        }
    }

    fn setup() -> (RecordingBackend, TargetId) {
        let size = Extent::new(1024, 768);
        let mut backend = RecordingBackend::new(BackendCaps::FULL, size);
        let color = backend.create_target(TargetDesc::hdr("color", size));
        (backend, color)
    }

    fn overlay_without(slot: &str) -> ShaderMaterial {
        let set = OverlayUniforms::default()
            .entries()
            .into_iter()
            .filter(|(name, _)| *name != slot)
            .fold(UniformSet::new(), |set, (name, value)| set.with(name, value));
        ShaderMaterial::fullscreen(
            "outline_overlay",
            EDGE_ONLY_OVERLAY_FRAGMENT,
            set,
            MaterialState::ADDITIVE_OVERLAY,
        )
    }

    fn overlay_draws(commands: &[RenderCommand]) -> usize {
        commands
            .iter()
            .filter(|c| {
                matches!(
                    c,
                    RenderCommand::DrawFullscreen {
                        material: "outline_overlay",
                        ..
                    }
                )
            })
            .count()
    }

    #[test]
    fn test_replacement_overlay_declares_every_slot() {
        let overlay = edge_only_overlay();
        assert!(overlay.validate(&OVERLAY_REQUIRED_UNIFORMS).is_ok());
        assert_eq!(overlay.state.blend, BlendMode::Additive);
        assert!(!overlay.state.depth_test);
        assert!(!overlay.state.depth_write);
    }

    #[test]
    fn test_overlay_missing_pattern_texture_is_rejected() {
        let (mut backend, _) = setup();
        let result = OutlinePass::with_overlay(
            &mut backend,
            Extent::new(1024, 768),
            OutlineSettings::default(),
            overlay_without("pattern_texture"),
        );
        assert_eq!(
            result.err(),
            Some(RenderError::MissingUniform {
                material: "outline_overlay".into(),
                uniform: "pattern_texture".into(),
            })
        );
    }

    #[test]
    fn test_unvalidated_overlay_failure_is_flagged() {
        let (mut backend, color) = setup();
        let mut pass = OutlinePass::unvalidated(
            &mut backend,
            Extent::new(1024, 768),
            OutlineSettings::default(),
            overlay_without("pattern_texture"),
        );
        pass.set_targets(vec![ObjectId::new()]).unwrap();
        pass.set_outline_enabled(true);
        pass.set_edge_strength(3.0);
        backend.take_commands();

        pass.render(&mut backend, &frame(color));

        let stats = pass.stats();
        assert_eq!(stats.upstream_renders, 1);
        assert_eq!(stats.skipped_composites, 1);
        assert_eq!(stats.composites, 0);
        assert_eq!(overlay_draws(backend.commands()), 0);
    }

    #[test]
    fn test_enabled_pass_composites_onto_color_target() {
        let (mut backend, color) = setup();
        let mut pass =
            OutlinePass::new(&mut backend, Extent::new(1024, 768), OutlineSettings::default())
                .unwrap();
        let target = ObjectId::new();
        pass.set_targets(vec![target]).unwrap();
        pass.set_outline_enabled(true);
        pass.set_edge_strength(1.5);
        backend.take_commands();

        pass.render(&mut backend, &frame(color));
        let commands = backend.take_commands();

        assert!(commands.contains(&RenderCommand::RenderScene {
            destination: Destination::Target(pass.targets.mask),
            filter: SceneFilter::Only(vec![target]),
            material_override: SceneOverride::Mask,
        }));
        let last = commands.last().unwrap();
        match last {
            RenderCommand::DrawFullscreen {
                destination,
                material,
                blend,
                uniforms,
            } => {
                assert_eq!(*destination, Destination::Target(color));
                assert_eq!(*material, "outline_overlay");
                assert_eq!(*blend, BlendMode::Additive);
                assert_eq!(uniforms.get("edge_strength"), Some(UniformValue::Float(1.5)));
            }
            other => panic!("unexpected last command {:?}", other),
        }
        assert_eq!(pass.stats().composites, 1);
    }

    #[test]
    fn test_mask_render_restores_shared_state() {
        let (mut backend, color) = setup();
        backend.set_clear_color(Color::rgb(0.1, 0.1, 0.2));
        let mut pass =
            OutlinePass::new(&mut backend, Extent::new(1024, 768), OutlineSettings::default())
                .unwrap();
        pass.set_outline_enabled(true);
        pass.render(&mut backend, &frame(color));

        assert_eq!(backend.clear_color(), Color::rgb(0.1, 0.1, 0.2));
        assert!(backend.background_enabled());
    }

    #[test]
    fn test_enabled_pass_renders_upstream_even_without_targets() {
        let (mut backend, color) = setup();
        let mut pass =
            OutlinePass::new(&mut backend, Extent::new(1024, 768), OutlineSettings::default())
                .unwrap();
        pass.set_outline_enabled(true);
        pass.render(&mut backend, &frame(color));
        assert_eq!(pass.stats().upstream_renders, 1);
    }

    #[test]
    fn test_disabled_pass_records_nothing() {
        let (mut backend, color) = setup();
        let mut pass =
            OutlinePass::new(&mut backend, Extent::new(1024, 768), OutlineSettings::default())
                .unwrap();
        backend.take_commands();
        pass.render(&mut backend, &frame(color));
        assert!(backend.commands().is_empty());
        assert_eq!(pass.stats(), OutlineStats::default());
    }

    #[test]
    fn test_targets_are_assigned_once() {
        let mut state = OutlinePassState::new();
        state.assign_targets(vec![ObjectId::new()]).unwrap();
        assert_eq!(
            state.assign_targets(vec![]),
            Err(RenderError::OutlineTargetsAlreadyAssigned)
        );
        assert_eq!(state.targets().len(), 1);
    }

    #[test]
    fn test_resize_updates_edge_targets() {
        let (mut backend, _) = setup();
        let mut pass =
            OutlinePass::new(&mut backend, Extent::new(1024, 768), OutlineSettings::default())
                .unwrap();
        pass.set_size(&mut backend, Extent::new(640, 480));
        assert_eq!(pass.resolution(), Extent::new(640, 480));
        assert_eq!(backend.target_size(pass.targets.mask), Some(Extent::new(640, 480)));
        assert_eq!(backend.target_size(pass.targets.edge_1), Some(Extent::new(320, 240)));
        assert_eq!(backend.target_size(pass.targets.edge_2), Some(Extent::new(160, 120)));
    }

    #[test]
    fn test_pulse_stays_in_range() {
        let settings = OutlineSettings::default();
        for step in 0..100 {
            let pulse = settings.pulse(step as f32 * 0.037);
            assert!((0.5..=1.0).contains(&pulse));
        }
        assert!((settings.pulse(0.0) - 1.0).abs() < 1e-6);
        let flat = OutlineSettings {
            pulse_period_secs: 0.0,
            ..OutlineSettings::default()
        };
        assert_eq!(flat.pulse(1.3), 1.0);
    }
}
