use lumen_core::Extent;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::backend::{Destination, RenderBackend, TargetDesc, TargetId};
use crate::uniform::{MaterialState, ShaderMaterial, UniformSet, UniformValue};

use super::{bind, FrameInput, Pass};

/// Number of blur mip levels in the bloom chain
pub const BLOOM_MIP_LEVELS: usize = 5;

const BLUR_TEXTURE_UNIFORMS: [&str; BLOOM_MIP_LEVELS] = [
    "blur_texture_0",
    "blur_texture_1",
    "blur_texture_2",
    "blur_texture_3",
    "blur_texture_4",
];

const HIGH_PASS_FRAGMENT: &str = r#"#version 450
layout(location = 0) in vec2 v_uv;
layout(set = 0, binding = 0) uniform sampler2D source_texture;
layout(set = 0, binding = 1) uniform HighPass {
    float luminosity_threshold;
    float smooth_width;
};
layout(location = 0) out vec4 out_color;

void main() {
    vec4 texel = texture(source_texture, v_uv);
    float luma = dot(texel.rgb, vec3(0.299, 0.587, 0.114));
    float weight = smoothstep(luminosity_threshold, luminosity_threshold + smooth_width, luma);
    out_color = texel * weight;
}
"#;

const BLUR_FRAGMENT: &str = r#"#version 450
layout(location = 0) in vec2 v_uv;
layout(set = 0, binding = 0) uniform sampler2D source_texture;
layout(location = 0) out vec4 out_color;

void main() {
    vec2 texel = 1.0 / vec2(textureSize(source_texture, 0));
    vec4 sum = texture(source_texture, v_uv) * 0.4;
    sum += texture(source_texture, v_uv + vec2(texel.x, 0.0)) * 0.15;
    sum += texture(source_texture, v_uv - vec2(texel.x, 0.0)) * 0.15;
    sum += texture(source_texture, v_uv + vec2(0.0, texel.y)) * 0.15;
    sum += texture(source_texture, v_uv - vec2(0.0, texel.y)) * 0.15;
    out_color = sum;
}
"#;

const COMPOSITE_FRAGMENT: &str = r#"#version 450
layout(location = 0) in vec2 v_uv;
layout(set = 0, binding = 0) uniform sampler2D blur_texture_0;
layout(set = 0, binding = 1) uniform sampler2D blur_texture_1;
layout(set = 0, binding = 2) uniform sampler2D blur_texture_2;
layout(set = 0, binding = 3) uniform sampler2D blur_texture_3;
layout(set = 0, binding = 4) uniform sampler2D blur_texture_4;
layout(set = 0, binding = 5) uniform Composite {
    float bloom_strength;
    float bloom_radius;
};
layout(location = 0) out vec4 out_color;

float factor(float f) {
    return mix(f, 1.2 - f, bloom_radius);
}

void main() {
    out_color = bloom_strength * (
        factor(1.0) * texture(blur_texture_0, v_uv) +
        factor(0.8) * texture(blur_texture_1, v_uv) +
        factor(0.6) * texture(blur_texture_2, v_uv) +
        factor(0.4) * texture(blur_texture_3, v_uv) +
        factor(0.2) * texture(blur_texture_4, v_uv));
}
"#;

/// Bloom tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BloomSettings {
    /// Luminance above which pixels bloom
    pub threshold: f32,
    /// Width of the soft knee above the threshold
    pub smooth_width: f32,
    pub strength: f32,
    /// 0 keeps bloom tight, 1 spreads it across the whole chain
    pub radius: f32,
}

impl Default for BloomSettings {
    fn default() -> Self {
        Self {
            threshold: 0.75,
            smooth_width: 0.01,
            strength: 0.8,
            radius: 0.4,
        }
    }
}

/// Threshold-gated bright-pass, mip blur chain and additive composite
#[derive(Debug, Clone)]
pub struct BloomPass {
    settings: BloomSettings,
    size: Extent,
    bright_target: TargetId,
    mip_targets: [TargetId; BLOOM_MIP_LEVELS],
    high_pass: ShaderMaterial,
    blur: ShaderMaterial,
    composite: ShaderMaterial,
}

impl BloomPass {
    pub fn new(backend: &mut dyn RenderBackend, size: Extent, settings: BloomSettings) -> Self {
        let bright_target = backend.create_target(TargetDesc::hdr("bloom_bright", size.halved(1)));
        let mip_targets = std::array::from_fn(|level| {
            backend.create_target(TargetDesc::hdr("bloom_mip", size.halved(level as u32 + 1)))
        });

        let high_pass = ShaderMaterial::fullscreen(
            "bloom_high_pass",
            HIGH_PASS_FRAGMENT,
            UniformSet::new()
                .with("source_texture", UniformValue::Texture(None))
                .with("luminosity_threshold", UniformValue::Float(settings.threshold))
                .with("smooth_width", UniformValue::Float(settings.smooth_width)),
            MaterialState::FULLSCREEN,
        );
        let blur = ShaderMaterial::fullscreen(
            "bloom_blur",
            BLUR_FRAGMENT,
            UniformSet::new().with("source_texture", UniformValue::Texture(None)),
            MaterialState::FULLSCREEN,
        );
        let composite_uniforms = BLUR_TEXTURE_UNIFORMS
            .iter()
            .zip(mip_targets)
            .fold(UniformSet::new(), |set, (name, target)| {
                set.with(name, UniformValue::Texture(Some(target)))
            })
            .with("bloom_strength", UniformValue::Float(settings.strength))
            .with("bloom_radius", UniformValue::Float(settings.radius));
        let composite = ShaderMaterial::fullscreen(
            "bloom_composite",
            COMPOSITE_FRAGMENT,
            composite_uniforms,
            MaterialState::ADDITIVE_OVERLAY,
        );

        Self {
            settings,
            size,
            bright_target,
            mip_targets,
            high_pass,
            blur,
            composite,
        }
    }

    pub fn settings(&self) -> &BloomSettings {
        &self.settings
    }

    pub fn bright_target(&self) -> TargetId {
        self.bright_target
    }

    pub fn mip_targets(&self) -> &[TargetId; BLOOM_MIP_LEVELS] {
        &self.mip_targets
    }
}

impl Pass for BloomPass {
    fn name(&self) -> &'static str {
        "bloom"
    }

    fn is_enabled(&self) -> bool {
        self.settings.strength > 0.0
    }

    fn resolution(&self) -> Extent {
        self.size
    }

    fn set_size(&mut self, backend: &mut dyn RenderBackend, size: Extent) {
        self.size = size;
        backend.resize_target(self.bright_target, size.halved(1));
        for (level, target) in self.mip_targets.iter().enumerate() {
            backend.resize_target(*target, size.halved(level as u32 + 1));
        }
    }

    fn render(&mut self, backend: &mut dyn RenderBackend, frame: &FrameInput) {
        if let Err(e) = bind(
            &mut self.high_pass,
            &[("source_texture", UniformValue::Texture(Some(frame.color_target)))],
        ) {
            error!("Bloom high pass skipped: {}", e);
            return;
        }
        backend.draw_fullscreen(Destination::Target(self.bright_target), &self.high_pass);

        let mut source = self.bright_target;
        for target in self.mip_targets {
            if let Err(e) = bind(
                &mut self.blur,
                &[("source_texture", UniformValue::Texture(Some(source)))],
            ) {
                error!("Bloom blur skipped: {}", e);
                return;
            }
            backend.draw_fullscreen(Destination::Target(target), &self.blur);
            source = target;
        }

        backend.draw_fullscreen(Destination::Target(frame.color_target), &self.composite);
    }
}
