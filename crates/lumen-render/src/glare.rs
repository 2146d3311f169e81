//! View-dependent glare overlays for emissive screens
//!
//! A glare material is a transparent, additively blended overlay laid over a
//! planar emissive surface. It fakes specular glare from up to four tracked
//! rig lights plus a Fresnel rim glow, without reflecting scene geometry.
//!
//! Light positions and colors are captured once when a material is built.
//! Two things change afterwards: the camera position, refreshed on every live
//! material each frame, and the window slot's intensity, which follows the
//! sun through [`SunIntensitySink`].

use std::collections::BTreeMap;

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use lumen_core::Color;
use lumen_light::{names, LightKind, LightRig, SunIntensitySink};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::RenderError;
use crate::uniform::MaterialState;
use crate::vertex::GlareVertex;

/// Number of light slots a glare material tracks
pub const GLARE_LIGHT_SLOTS: usize = 4;

/// Upper bound on overlay opacity
pub const MAX_GLARE_ALPHA: f32 = 0.7;

/// Linear and quadratic attenuation terms, `1 / (1 + K1 d + K2 d^2)`
const ATTENUATION_LINEAR: f32 = 0.09;
const ATTENUATION_QUADRATIC: f32 = 0.032;

/// Weight of the Fresnel rim term
const FRESNEL_WEIGHT: f32 = 0.15;

/// Faint cool tint of the rim glow
const FRESNEL_TINT: Vec3 = Vec3::new(0.6, 0.75, 1.0);

/// Which rig light feeds each uniform slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlareSlot {
    /// Daylight through the window; intensity follows the sun every frame
    Window = 0,
    Fill = 1,
    Rim = 2,
    /// First point-light fixture registered by a collaborator, if any
    Lamp = 3,
}

/// Per-surface glare tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlareParams {
    /// Overall opacity scaler
    pub glare_intensity: f32,
    /// Specular exponent base
    pub glare_sharpness: f32,
    /// Edge falloff exponent
    pub fresnel_power: f32,
}

impl GlareParams {
    /// A large desktop monitor: broad, fairly strong glare
    pub fn primary_screen() -> Self {
        Self {
            glare_intensity: 0.6,
            glare_sharpness: 32.0,
            fresnel_power: 3.0,
        }
    }

    /// A laptop panel: tighter, dimmer highlights
    pub fn laptop_screen() -> Self {
        Self {
            glare_intensity: 0.4,
            glare_sharpness: 64.0,
            fresnel_power: 4.0,
        }
    }
}

impl Default for GlareParams {
    fn default() -> Self {
        Self::primary_screen()
    }
}

/// The planar surface a glare overlay covers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlareSurface {
    pub center: Vec3,
    pub normal: Vec3,
    /// In-plane axis along the surface width
    pub tangent: Vec3,
    pub width: f32,
    pub height: f32,
}

impl GlareSurface {
    /// Overlay quad, two triangles as a strip in (bl, br, tl, tr) order
    pub fn quad(&self) -> [GlareVertex; 4] {
        let normal = self.normal.normalize_or_zero();
        let right = self.tangent.normalize_or_zero() * (self.width * 0.5);
        let up = normal.cross(self.tangent).normalize_or_zero() * (self.height * 0.5);
        let n = normal.to_array();
        [
            GlareVertex::new((self.center - right - up).to_array(), n, [0.0, 1.0]),
            GlareVertex::new((self.center + right - up).to_array(), n, [1.0, 1.0]),
            GlareVertex::new((self.center - right + up).to_array(), n, [0.0, 0.0]),
            GlareVertex::new((self.center + right + up).to_array(), n, [1.0, 0.0]),
        ]
    }
}

/// Uniform block of a glare material, laid out for a std140 uniform buffer
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct GlareUniforms {
    pub light_positions: [[f32; 4]; GLARE_LIGHT_SLOTS], // xyz = position
    pub light_colors: [[f32; 4]; GLARE_LIGHT_SLOTS],    // rgb = color
    pub light_intensities: [f32; GLARE_LIGHT_SLOTS],    // 0 = unused slot
    pub camera_position: [f32; 4],                      // xyz = world position
    pub tuning: [f32; 4], // x = glare intensity, y = sharpness, z = fresnel power
}

impl GlareUniforms {
    pub fn set_light(&mut self, slot: GlareSlot, position: Vec3, color: Color, intensity: f32) {
        let i = slot as usize;
        self.light_positions[i] = position.extend(1.0).to_array();
        self.light_colors[i] = [color.r, color.g, color.b, 1.0];
        self.light_intensities[i] = intensity;
    }

    pub fn light_intensity(&self, slot: GlareSlot) -> f32 {
        self.light_intensities[slot as usize]
    }

    pub fn set_light_intensity(&mut self, slot: GlareSlot, intensity: f32) {
        self.light_intensities[slot as usize] = intensity;
    }

    pub fn camera_position(&self) -> Vec3 {
        Vec3::new(
            self.camera_position[0],
            self.camera_position[1],
            self.camera_position[2],
        )
    }

    pub fn set_camera_position(&mut self, position: Vec3) {
        self.camera_position = position.extend(1.0).to_array();
    }

    pub fn params(&self) -> GlareParams {
        GlareParams {
            glare_intensity: self.tuning[0],
            glare_sharpness: self.tuning[1],
            fresnel_power: self.tuning[2],
        }
    }

    /// Raw bytes for upload into a uniform buffer
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

/// Output of the glare shading function for one fragment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlareSample {
    pub color: Vec3,
    pub alpha: f32,
}

/// CPU evaluation of the glare fragment shader, mirroring [`GLARE_FRAGMENT`]
pub fn shade_glare(uniforms: &GlareUniforms, position: Vec3, normal: Vec3) -> GlareSample {
    let GlareParams {
        glare_intensity,
        glare_sharpness,
        fresnel_power,
    } = uniforms.params();
    let normal = normal.normalize_or_zero();
    let view = (uniforms.camera_position() - position).normalize_or_zero();

    let mut specular = 0.0;
    let mut color = Vec3::ZERO;
    for slot in 0..GLARE_LIGHT_SLOTS {
        let intensity = uniforms.light_intensities[slot];
        if intensity <= 0.0 {
            continue;
        }
        let [x, y, z, _] = uniforms.light_positions[slot];
        let to_light = Vec3::new(x, y, z) - position;
        let distance = to_light.length();
        let half = (to_light.normalize_or_zero() + view).normalize_or_zero();

        let highlight = normal.dot(half).max(0.0).powf(glare_sharpness);
        let attenuation =
            1.0 / (1.0 + ATTENUATION_LINEAR * distance + ATTENUATION_QUADRATIC * distance * distance);
        let contribution = highlight * attenuation * intensity;

        let [r, g, b, _] = uniforms.light_colors[slot];
        specular += contribution;
        color += Vec3::new(r, g, b) * contribution;
    }

    let fresnel = (1.0 - normal.dot(view).max(0.0)).powf(fresnel_power) * FRESNEL_WEIGHT;
    let raw_alpha = (specular + fresnel) * glare_intensity;
    let alpha = if raw_alpha.is_nan() {
        0.0
    } else {
        raw_alpha.clamp(0.0, MAX_GLARE_ALPHA)
    };

    GlareSample {
        color: color + FRESNEL_TINT * fresnel,
        alpha,
    }
}

pub const GLARE_VERTEX: &str = r#"#version 450
layout(location = 0) in vec3 position;
layout(location = 1) in vec3 normal;
layout(location = 2) in vec2 uv;

layout(push_constant) uniform Transform {
    mat4 model;
    mat4 view_projection;
} transform;

layout(location = 0) out vec3 v_world_position;
layout(location = 1) out vec3 v_world_normal;

void main() {
    vec4 world = transform.model * vec4(position, 1.0);
    v_world_position = world.xyz;
    v_world_normal = normalize(mat3(transform.model) * normal);
    gl_Position = transform.view_projection * world;
}
"#;

pub const GLARE_FRAGMENT: &str = r#"#version 450
layout(location = 0) in vec3 v_world_position;
layout(location = 1) in vec3 v_world_normal;

layout(set = 0, binding = 0) uniform GlareUniforms {
    vec4 light_positions[4];
    vec4 light_colors[4];
    vec4 light_intensities;
    vec4 camera_position;
    vec4 tuning;
} u;

layout(location = 0) out vec4 out_color;

void main() {
    vec3 n = normalize(v_world_normal);
    vec3 v = normalize(u.camera_position.xyz - v_world_position);

    float specular = 0.0;
    vec3 color = vec3(0.0);
    for (int i = 0; i < 4; i++) {
        float intensity = u.light_intensities[i];
        if (intensity <= 0.0) {
            continue;
        }
        vec3 to_light = u.light_positions[i].xyz - v_world_position;
        float d = length(to_light);
        vec3 h = normalize(normalize(to_light) + v);
        float highlight = pow(max(dot(n, h), 0.0), u.tuning.y);
        float attenuation = 1.0 / (1.0 + 0.09 * d + 0.032 * d * d);
        float contribution = highlight * attenuation * intensity;
        specular += contribution;
        color += u.light_colors[i].rgb * contribution;
    }

    float fresnel = pow(1.0 - max(dot(n, v), 0.0), u.tuning.z) * 0.15;
    float alpha = clamp((specular + fresnel) * u.tuning.x, 0.0, 0.7);
    out_color = vec4(color + vec3(0.6, 0.75, 1.0) * fresnel, alpha);
}
"#;

/// A live glare overlay
#[derive(Debug, Clone, PartialEq)]
pub struct GlareMaterial {
    pub surface: GlareSurface,
    pub uniforms: GlareUniforms,
    pub state: MaterialState,
    pub vertex_source: &'static str,
    pub fragment_source: &'static str,
}

impl GlareMaterial {
    pub fn params(&self) -> GlareParams {
        self.uniforms.params()
    }

    /// Shade the overlay at its center as seen from the current camera
    pub fn shade_center(&self) -> GlareSample {
        shade_glare(&self.uniforms, self.surface.center, self.surface.normal)
    }
}

/// Builds glare materials from the rig's current light fixtures
#[derive(Debug, Clone, Copy, Default)]
pub struct GlareMaterialFactory;

impl GlareMaterialFactory {
    /// Build a ready-to-use overlay for `surface` with call-site tuning
    pub fn build(
        &self,
        rig: &LightRig,
        params: GlareParams,
        surface: GlareSurface,
        camera_position: Vec3,
    ) -> GlareMaterial {
        let mut uniforms = GlareUniforms::zeroed();
        uniforms.tuning = [
            params.glare_intensity,
            params.glare_sharpness,
            params.fresnel_power,
            0.0,
        ];
        uniforms.set_camera_position(camera_position);

        let sun = rig.sun();
        uniforms.set_light(GlareSlot::Window, sun.position, sun.color, sun.intensity);
        let fill = rig.fill();
        uniforms.set_light(GlareSlot::Fill, fill.position, fill.color, fill.intensity);
        let rim = rig.rim();
        uniforms.set_light(GlareSlot::Rim, rim.position, rim.color, rim.intensity);

        let lamp = rig
            .lights()
            .filter(|(name, _)| !names::BUILT_IN.contains(name))
            .find(|(_, light)| light.kind == LightKind::Point);
        if let Some((_, lamp)) = lamp {
            uniforms.set_light(GlareSlot::Lamp, lamp.position, lamp.color, lamp.intensity);
        }

        GlareMaterial {
            surface,
            uniforms,
            state: MaterialState {
                depth_test: true,
                ..MaterialState::ADDITIVE_OVERLAY
            },
            vertex_source: GLARE_VERTEX,
            fragment_source: GLARE_FRAGMENT,
        }
    }
}

/// Handle to a live glare material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GlareMaterialId(u64);

impl GlareMaterialId {
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Every live glare material, so per-frame uniform writes reach all of them
/// and none after they are unregistered.
#[derive(Debug, Clone, Default)]
pub struct GlareRegistry {
    factory: GlareMaterialFactory,
    materials: BTreeMap<GlareMaterialId, GlareMaterial>,
    next_id: u64,
    camera_position: Vec3,
    sun_intensity: Option<f32>,
}

impl GlareRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build and register a glare material
    pub fn create(
        &mut self,
        rig: &LightRig,
        params: GlareParams,
        surface: GlareSurface,
    ) -> GlareMaterialId {
        let mut material = self
            .factory
            .build(rig, params, surface, self.camera_position);
        if let Some(intensity) = self.sun_intensity {
            material
                .uniforms
                .set_light_intensity(GlareSlot::Window, intensity);
        }

        self.next_id += 1;
        let id = GlareMaterialId(self.next_id);
        debug!("Registered glare material {} ({:?})", id.0, params);
        self.materials.insert(id, material);
        id
    }

    /// Stop updating a material and hand it back
    pub fn unregister(&mut self, id: GlareMaterialId) -> Result<GlareMaterial, RenderError> {
        self.materials
            .remove(&id)
            .ok_or(RenderError::UnknownGlareMaterial(id.0))
    }

    pub fn get(&self, id: GlareMaterialId) -> Option<&GlareMaterial> {
        self.materials.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (GlareMaterialId, &GlareMaterial)> {
        self.materials.iter().map(|(id, material)| (*id, material))
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    /// Per-frame camera refresh across every live material
    pub fn refresh_camera(&mut self, camera_position: Vec3) {
        self.camera_position = camera_position;
        for material in self.materials.values_mut() {
            material.uniforms.set_camera_position(camera_position);
        }
    }
}

impl SunIntensitySink for GlareRegistry {
    fn set_sun_intensity(&mut self, intensity: f32) {
        self.sun_intensity = Some(intensity);
        for material in self.materials.values_mut() {
            material
                .uniforms
                .set_light_intensity(GlareSlot::Window, intensity);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_light::{DeviceClass, Falloff, Light, LightingConfig, RoomBounds};
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn rig() -> LightRig {
        LightRig::new(
            &LightingConfig::default(),
            DeviceClass::Desktop,
            RoomBounds::default(),
        )
    }

    fn monitor() -> GlareSurface {
        GlareSurface {
            center: Vec3::new(0.0, 1.2, -0.5),
            normal: Vec3::Z,
            tangent: Vec3::X,
            width: 0.6,
            height: 0.35,
        }
    }

    #[test]
    fn test_uniform_block_is_std140_sized() {
        assert_eq!(std::mem::size_of::<GlareUniforms>(), 4 * 16 * 2 + 16 * 3);
        let uniforms = GlareUniforms::zeroed();
        assert_eq!(uniforms.as_bytes().len(), std::mem::size_of::<GlareUniforms>());
    }

    #[test]
    fn test_factory_tracks_rig_lights() {
        let rig = rig();
        let material = GlareMaterialFactory.build(
            &rig,
            GlareParams::laptop_screen(),
            monitor(),
            Vec3::new(0.0, 1.5, 2.0),
        );
        let u = &material.uniforms;
        assert_eq!(u.light_positions[GlareSlot::Window as usize][..3], rig.sun().position.to_array());
        assert_eq!(u.light_intensity(GlareSlot::Fill), rig.fill().intensity);
        assert_eq!(u.light_intensity(GlareSlot::Rim), rig.rim().intensity);
        // No lamp registered: slot stays unused
        assert_eq!(u.light_intensity(GlareSlot::Lamp), 0.0);
        assert_eq!(material.params(), GlareParams::laptop_screen());
        assert_eq!(material.state.blend, crate::uniform::BlendMode::Additive);
        assert!(!material.state.depth_write);
    }

    #[test]
    fn test_factory_picks_up_registered_lamp() {
        let mut rig = rig();
        rig.register(
            "desk_lamp",
            Light::point(Vec3::new(0.8, 1.6, 0.2), Color::from_hex(0xffaa55), 1.8, Falloff::new(6.0, 2.0)),
        )
        .unwrap();
        let material = GlareMaterialFactory.build(&rig, GlareParams::default(), monitor(), Vec3::ZERO);
        assert_eq!(material.uniforms.light_intensity(GlareSlot::Lamp), 1.8);
    }

    #[test]
    fn test_registry_refreshes_camera_on_live_materials_only() {
        let rig = rig();
        let mut registry = GlareRegistry::new();
        let a = registry.create(&rig, GlareParams::primary_screen(), monitor());
        let b = registry.create(&rig, GlareParams::laptop_screen(), monitor());

        let removed = registry.unregister(b).unwrap();
        let camera = Vec3::new(1.0, 2.0, 3.0);
        registry.refresh_camera(camera);

        assert_eq!(registry.get(a).unwrap().uniforms.camera_position(), camera);
        assert_ne!(removed.uniforms.camera_position(), camera);
        assert_eq!(registry.unregister(b), Err(RenderError::UnknownGlareMaterial(b.raw())));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_sun_intensity_reaches_window_slot() {
        let rig = rig();
        let mut registry = GlareRegistry::new();
        let early = registry.create(&rig, GlareParams::default(), monitor());
        registry.set_sun_intensity(0.42);
        let late = registry.create(&rig, GlareParams::default(), monitor());

        for id in [early, late] {
            let uniforms = &registry.get(id).unwrap().uniforms;
            assert_eq!(uniforms.light_intensity(GlareSlot::Window), 0.42);
            assert_eq!(uniforms.light_intensity(GlareSlot::Fill), rig.fill().intensity);
        }
    }

    #[test]
    fn test_view_dependent_glare_changes_with_camera() {
        let rig = rig();
        let mut registry = GlareRegistry::new();
        let id = registry.create(&rig, GlareParams::primary_screen(), monitor());

        registry.refresh_camera(Vec3::new(0.0, 1.2, 2.0));
        let head_on = registry.get(id).unwrap().shade_center();
        registry.refresh_camera(Vec3::new(3.0, 1.2, 0.0));
        let grazing = registry.get(id).unwrap().shade_center();

        assert_ne!(head_on, grazing);
        // Grazing views pick up more rim glow
        assert!(grazing.color.z > head_on.color.z);
    }

    #[test]
    fn test_glare_alpha_stays_bounded() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let coord = |rng: &mut StdRng| rng.gen_range(-20.0f32..20.0);

        for _ in 0..2000 {
            let mut uniforms = GlareUniforms::zeroed();
            uniforms.tuning = [
                rng.gen_range(0.0..5.0),
                rng.gen_range(1.0..256.0),
                rng.gen_range(0.5..8.0),
                0.0,
            ];
            uniforms.set_camera_position(Vec3::new(coord(&mut rng), coord(&mut rng), coord(&mut rng)));
            for slot in [GlareSlot::Window, GlareSlot::Fill, GlareSlot::Rim, GlareSlot::Lamp] {
                let position = Vec3::new(coord(&mut rng), coord(&mut rng), coord(&mut rng));
                let intensity = if rng.gen_bool(0.2) { 0.0 } else { rng.gen_range(0.0..50.0) };
                uniforms.set_light(slot, position, Color::rgb(rng.gen(), rng.gen(), rng.gen()), intensity);
            }
            let fragment = Vec3::new(coord(&mut rng), coord(&mut rng), coord(&mut rng));
            let normal = Vec3::new(coord(&mut rng), coord(&mut rng), coord(&mut rng));

            let sample = shade_glare(&uniforms, fragment, normal);
            assert!(
                (0.0..=MAX_GLARE_ALPHA).contains(&sample.alpha),
                "alpha {} out of range",
                sample.alpha
            );
        }
    }

    #[test]
    fn test_unused_slots_contribute_nothing() {
        let mut uniforms = GlareUniforms::zeroed();
        uniforms.tuning = [1.0, 16.0, 3.0, 0.0];
        uniforms.set_camera_position(Vec3::new(0.0, 0.0, 2.0));
        let dark = shade_glare(&uniforms, Vec3::ZERO, Vec3::Z);

        uniforms.set_light(GlareSlot::Fill, Vec3::new(0.0, 0.0, 3.0), Color::WHITE, 0.0);
        assert_eq!(shade_glare(&uniforms, Vec3::ZERO, Vec3::Z), dark);

        uniforms.set_light_intensity(GlareSlot::Fill, 2.0);
        assert!(shade_glare(&uniforms, Vec3::ZERO, Vec3::Z).alpha > dark.alpha);
    }

    #[test]
    fn test_quad_spans_surface() {
        let quad = monitor().quad();
        let xs: Vec<f32> = quad.iter().map(|v| v.position[0]).collect();
        assert!((xs[1] - xs[0] - 0.6).abs() < 1e-5);
        assert!(quad.iter().all(|v| v.normal == [0.0, 0.0, 1.0]));
    }
}
