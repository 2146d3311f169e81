//! Baked environment reflections
//!
//! A throwaway auxiliary light setup is rendered once into an
//! equirectangular radiance image, then successively downsampled into a mip
//! chain that stands in for roughness prefiltering. Materials that declare an
//! environment intensity sample this map instead of reflecting live geometry.

use std::f32::consts::PI;
use std::sync::Arc;

use glam::Vec3;
use image::imageops::{self, FilterType};
use image::{Rgb, Rgb32FImage};
use lumen_core::Color;
use tracing::info;

use crate::config::EnvironmentSettings;
use crate::error::LightingError;

/// Exponent of the specular-like lobe each auxiliary directional casts
const LOBE_EXPONENT: i32 = 8;

/// A directional light in the auxiliary bake scene
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AuxiliaryLight {
    /// Direction pointing toward the light
    pub direction: Vec3,
    pub color: Color,
    pub intensity: f32,
}

impl AuxiliaryLight {
    pub fn new(direction: Vec3, color: Color, intensity: f32) -> Self {
        Self {
            direction: direction.normalize_or_zero(),
            color,
            intensity,
        }
    }
}

/// The auxiliary light setup that gets baked. Discarded after baking.
#[derive(Debug, Clone, PartialEq)]
pub struct AuxiliaryScene {
    pub directionals: Vec<AuxiliaryLight>,
    pub ambient: Color,
    pub ambient_intensity: f32,
    pub sky: Color,
    pub ground: Color,
    pub hemisphere_intensity: f32,
}

impl AuxiliaryScene {
    /// Three tinted directionals echoing the lamp (warm), the screens (cool)
    /// and the window (neutral-warm), over a soft ambient/hemisphere fill.
    pub fn room() -> Self {
        Self {
            directionals: vec![
                AuxiliaryLight::new(Vec3::new(-1.0, 1.2, 0.5), Color::from_hex(0xffb46b), 1.4),
                AuxiliaryLight::new(Vec3::new(0.0, 0.4, -1.0), Color::from_hex(0x7fb2ff), 1.0),
                AuxiliaryLight::new(Vec3::new(1.0, 0.9, 0.3), Color::from_hex(0xffe8c8), 1.2),
            ],
            ambient: Color::from_hex(0x202030),
            ambient_intensity: 0.4,
            sky: Color::from_hex(0x9fb4e0),
            ground: Color::from_hex(0x2a2018),
            hemisphere_intensity: 0.5,
        }
    }

    /// Incoming radiance from `direction`
    pub fn radiance(&self, direction: Vec3) -> Vec3 {
        let mut radiance = self.ambient.to_vec3() * self.ambient_intensity;

        let sky_weight = direction.y * 0.5 + 0.5;
        radiance += self.ground.to_vec3().lerp(self.sky.to_vec3(), sky_weight)
            * self.hemisphere_intensity;

        for light in &self.directionals {
            let lobe = direction.dot(light.direction).max(0.0).powi(LOBE_EXPONENT);
            radiance += light.color.to_vec3() * light.intensity * lobe;
        }
        radiance
    }
}

/// Direction for normalized equirectangular coordinates
fn direction_from_uv(u: f32, v: f32) -> Vec3 {
    let phi = (u - 0.5) * 2.0 * PI;
    let theta = v * PI;
    Vec3::new(theta.sin() * phi.sin(), theta.cos(), -theta.sin() * phi.cos())
}

/// Normalized equirectangular coordinates for a direction
fn uv_from_direction(direction: Vec3) -> (f32, f32) {
    let d = direction.normalize_or_zero();
    let u = d.x.atan2(-d.z) / (2.0 * PI) + 0.5;
    let v = d.y.clamp(-1.0, 1.0).acos() / PI;
    (u, v)
}

/// A baked, mipmapped equirectangular environment texture
#[derive(Debug, Clone)]
pub struct EnvironmentMap {
    levels: Vec<Rgb32FImage>,
}

impl EnvironmentMap {
    pub fn mip_count(&self) -> usize {
        self.levels.len()
    }

    pub fn level(&self, index: usize) -> Option<&Rgb32FImage> {
        self.levels.get(index)
    }

    /// Base level size
    pub fn dimensions(&self) -> (u32, u32) {
        self.levels[0].dimensions()
    }

    /// Nearest-texel lookup at the mip level closest to `lod`
    pub fn sample(&self, direction: Vec3, lod: f32) -> Vec3 {
        let max_level = self.levels.len() - 1;
        let level = (lod.max(0.0).round() as usize).min(max_level);
        let image = &self.levels[level];
        let (width, height) = image.dimensions();

        let (u, v) = uv_from_direction(direction);
        let x = ((u * width as f32) as u32).min(width - 1);
        let y = ((v * height as f32) as u32).min(height - 1);
        let Rgb([r, g, b]) = *image.get_pixel(x, y);
        Vec3::new(r, g, b)
    }
}

/// Bakes an [`AuxiliaryScene`] into an [`EnvironmentMap`]
#[derive(Debug, Clone)]
pub struct EnvironmentMapBaker {
    settings: EnvironmentSettings,
}

impl EnvironmentMapBaker {
    pub fn new(settings: EnvironmentSettings) -> Self {
        Self { settings }
    }

    /// Number of mip levels the bake will produce, base level included
    pub fn mip_levels(&self) -> u32 {
        let largest = self.settings.width.max(self.settings.height).max(1);
        let full_chain = u32::BITS - largest.leading_zeros();
        full_chain.min(self.settings.max_mip_levels.max(1))
    }

    pub fn bake(&self, scene: &AuxiliaryScene) -> Result<EnvironmentMap, LightingError> {
        let EnvironmentSettings { width, height, .. } = self.settings;
        if width == 0 || height == 0 {
            return Err(LightingError::InvalidBakeResolution { width, height });
        }

        info!(
            "Baking environment map {}x{} from {} auxiliary lights",
            width,
            height,
            scene.directionals.len()
        );

        let base = Rgb32FImage::from_fn(width, height, |x, y| {
            let u = (x as f32 + 0.5) / width as f32;
            let v = (y as f32 + 0.5) / height as f32;
            let radiance = scene.radiance(direction_from_uv(u, v));
            Rgb([radiance.x, radiance.y, radiance.z])
        });

        let mip_levels = self.mip_levels() as usize;
        let mut levels = Vec::with_capacity(mip_levels);
        levels.push(base);
        while levels.len() < mip_levels {
            let previous = &levels[levels.len() - 1];
            let (w, h) = previous.dimensions();
            let next = imageops::resize(previous, (w / 2).max(1), (h / 2).max(1), FilterType::Triangle);
            levels.push(next);
        }

        info!("Environment map baked with {} mip levels", levels.len());
        Ok(EnvironmentMap { levels })
    }
}

/// How a material sees the environment: the shared baked map, or flat shading
/// when the bake never happened.
#[derive(Debug, Clone)]
pub enum EnvironmentBinding {
    Reflective {
        map: Arc<EnvironmentMap>,
        intensity: f32,
    },
    Flat,
}

impl EnvironmentBinding {
    pub fn is_reflective(&self) -> bool {
        matches!(self, EnvironmentBinding::Reflective { .. })
    }

    /// Reflected radiance along `direction`; zero for flat materials
    pub fn reflection(&self, direction: Vec3, roughness: f32) -> Vec3 {
        match self {
            EnvironmentBinding::Reflective { map, intensity } => {
                let lod = roughness.clamp(0.0, 1.0) * (map.mip_count() - 1) as f32;
                map.sample(direction, lod) * *intensity
            }
            EnvironmentBinding::Flat => Vec3::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bake() -> EnvironmentMap {
        EnvironmentMapBaker::new(EnvironmentSettings::default())
            .bake(&AuxiliaryScene::room())
            .unwrap()
    }

    #[test]
    fn test_bake_produces_mip_chain() {
        let map = bake();
        assert_eq!(map.dimensions(), (128, 64));
        assert_eq!(map.mip_count(), 6);
        assert_eq!(map.level(1).map(|l| l.dimensions()), Some((64, 32)));
        assert_eq!(map.level(5).map(|l| l.dimensions()), Some((4, 2)));
        assert!(map.level(6).is_none());
    }

    #[test]
    fn test_mip_levels_capped_by_resolution() {
        let baker = EnvironmentMapBaker::new(EnvironmentSettings {
            width: 8,
            height: 4,
            max_mip_levels: 10,
        });
        assert_eq!(baker.mip_levels(), 4);
    }

    #[test]
    fn test_zero_resolution_is_rejected() {
        let baker = EnvironmentMapBaker::new(EnvironmentSettings {
            width: 0,
            height: 64,
            max_mip_levels: 4,
        });
        assert_eq!(
            baker.bake(&AuxiliaryScene::room()).unwrap_err(),
            LightingError::InvalidBakeResolution { width: 0, height: 64 }
        );
    }

    #[test]
    fn test_reflections_are_tinted_toward_lights() {
        let scene = AuxiliaryScene::room();
        let map = bake();

        let lamp = scene.directionals[0];
        let toward_lamp = map.sample(lamp.direction, 0.0);
        let away_from_lamp = map.sample(-lamp.direction, 0.0);
        assert!(toward_lamp.x > away_from_lamp.x);
        // Warm lamp: red dominates blue in its direction
        assert!(toward_lamp.x > toward_lamp.z);

        let screens = scene.directionals[1];
        let toward_screens = map.sample(screens.direction, 0.0);
        assert!(toward_screens.z > toward_screens.x);
    }

    #[test]
    fn test_uv_mapping_round_trips_directions() {
        let direction = Vec3::new(0.3, 0.5, -0.8).normalize();
        let (u, v) = uv_from_direction(direction);
        let back = direction_from_uv(u, v);
        assert!(back.distance(direction) < 1e-4);
    }

    #[test]
    fn test_flat_binding_reflects_nothing() {
        assert_eq!(EnvironmentBinding::Flat.reflection(Vec3::Y, 0.5), Vec3::ZERO);

        let binding = EnvironmentBinding::Reflective {
            map: Arc::new(bake()),
            intensity: 0.5,
        };
        assert!(binding.is_reflective());
        assert!(binding.reflection(Vec3::Y, 0.2).length() > 0.0);
    }
}
