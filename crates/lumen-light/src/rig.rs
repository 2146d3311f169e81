//! The persistent light rig
//!
//! Five built-in lights live for the whole session: a low ambient, a sky/ground
//! hemisphere, the shadow-casting sun and two falloff point lights (fill and
//! rim). Collaborators look lights up by name and may register their own
//! fixtures, but nothing is ever removed or replaced.

use glam::Vec3;
use lumen_core::{Color, Extent};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::LightingConfig;
use crate::error::LightingError;

/// Stable names of the built-in rig lights
pub mod names {
    pub const AMBIENT: &str = "ambient";
    pub const HEMISPHERE: &str = "hemisphere";
    pub const SUN: &str = "sun";
    pub const FILL: &str = "fill";
    pub const RIM: &str = "rim";

    pub const BUILT_IN: [&str; 5] = [AMBIENT, HEMISPHERE, SUN, FILL, RIM];
}

/// Coarse device capability signal used once to size shadow maps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceClass {
    Mobile,
    Desktop,
}

impl DeviceClass {
    /// Viewports narrower than this are treated as mobile
    const MOBILE_MAX_WIDTH: u32 = 900;

    /// Guess the device class from the initial viewport size
    pub fn from_viewport(viewport: Extent) -> Self {
        if viewport.width < Self::MOBILE_MAX_WIDTH {
            DeviceClass::Mobile
        } else {
            DeviceClass::Desktop
        }
    }
}

/// What kind of light this is, with kind-specific parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LightKind {
    Ambient,
    /// `color` is the sky color, blended toward `ground_color` below the horizon
    Hemisphere { ground_color: Color },
    /// Parallel light shining from `position` toward `target`
    Directional { target: Vec3 },
    Point,
}

/// Inverse-distance falloff with a decay exponent, windowed to zero at `distance`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Falloff {
    /// Cutoff range. Zero means unlimited.
    pub distance: f32,
    /// Decay exponent applied to distance
    pub decay: f32,
}

impl Falloff {
    pub fn new(distance: f32, decay: f32) -> Self {
        Self { distance, decay }
    }

    /// Attenuation factor at distance `d` from the light
    pub fn attenuation(&self, d: f32) -> f32 {
        let d = d.max(0.0);
        let inverse = 1.0 / d.max(0.01).powf(self.decay);
        if self.distance <= 0.0 {
            return inverse;
        }
        let ratio = (d / self.distance).powi(4);
        let window = (1.0 - ratio).clamp(0.0, 1.0);
        inverse * window * window
    }
}

/// Orthographic shadow camera bounds for a directional light
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShadowFrustum {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
    pub near: f32,
    pub far: f32,
}

/// Shadow casting parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShadowConfig {
    pub map_size: u32,
    pub frustum: ShadowFrustum,
    pub bias: f32,
    pub normal_bias: f32,
}

/// Axis-aligned bounds of the room, used to fit the sun's shadow frustum
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoomBounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl RoomBounds {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Radius of the bounding sphere
    pub fn radius(&self) -> f32 {
        (self.max - self.min).length() * 0.5
    }

    /// Fit an orthographic frustum for a light at `eye` looking at the room center
    pub fn fit_frustum(&self, eye: Vec3) -> ShadowFrustum {
        let radius = self.radius();
        let distance = eye.distance(self.center());
        ShadowFrustum {
            left: -radius,
            right: radius,
            top: radius,
            bottom: -radius,
            near: (distance - radius).max(0.1),
            far: distance + radius,
        }
    }
}

impl Default for RoomBounds {
    fn default() -> Self {
        Self {
            min: Vec3::new(-5.0, 0.0, -5.0),
            max: Vec3::new(5.0, 4.0, 5.0),
        }
    }
}

/// A single light source owned by the rig
#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    pub kind: LightKind,
    pub position: Vec3,
    pub color: Color,
    pub intensity: f32,
    pub falloff: Option<Falloff>,
    pub shadow: Option<ShadowConfig>,
}

impl Light {
    pub fn ambient(color: Color, intensity: f32) -> Self {
        Self {
            kind: LightKind::Ambient,
            position: Vec3::ZERO,
            color,
            intensity,
            falloff: None,
            shadow: None,
        }
    }

    pub fn hemisphere(sky: Color, ground: Color, intensity: f32) -> Self {
        Self {
            kind: LightKind::Hemisphere {
                ground_color: ground,
            },
            position: Vec3::Y,
            color: sky,
            intensity,
            falloff: None,
            shadow: None,
        }
    }

    pub fn directional(position: Vec3, target: Vec3, color: Color, intensity: f32) -> Self {
        Self {
            kind: LightKind::Directional { target },
            position,
            color,
            intensity,
            falloff: None,
            shadow: None,
        }
    }

    pub fn point(position: Vec3, color: Color, intensity: f32, falloff: Falloff) -> Self {
        Self {
            kind: LightKind::Point,
            position,
            color,
            intensity,
            falloff: Some(falloff),
            shadow: None,
        }
    }

    pub fn with_shadow(mut self, shadow: ShadowConfig) -> Self {
        self.shadow = Some(shadow);
        self
    }

    pub fn casts_shadow(&self) -> bool {
        self.shadow.is_some()
    }
}

/// A collaborator-registered light
#[derive(Debug, Clone)]
struct Fixture {
    name: String,
    light: Light,
}

/// The fixed set of session lights plus any registered fixtures
#[derive(Debug, Clone)]
pub struct LightRig {
    ambient: Light,
    hemisphere: Light,
    sun: Light,
    fill: Light,
    rim: Light,
    fixtures: Vec<Fixture>,
    device_class: DeviceClass,
}

impl LightRig {
    /// Where the sun sits: outside the window, high and to the right
    pub const SUN_POSITION: Vec3 = Vec3::new(5.0, 8.0, 3.0);
    pub const FILL_POSITION: Vec3 = Vec3::new(-3.0, 3.0, 2.0);
    pub const RIM_POSITION: Vec3 = Vec3::new(2.0, 4.0, -4.0);

    /// Build the session rig, sizing the sun's shadow once for `device_class`
    pub fn new(config: &LightingConfig, device_class: DeviceClass, bounds: RoomBounds) -> Self {
        let shadow = ShadowConfig {
            map_size: config.shadow_map_size(device_class),
            frustum: bounds.fit_frustum(Self::SUN_POSITION),
            bias: -0.0005,
            normal_bias: 0.02,
        };

        let rig = Self {
            ambient: Light::ambient(Color::from_hex(0x404060), config.secondary.ambient_base),
            hemisphere: Light::hemisphere(
                Color::from_hex(0xb1c4ff),
                Color::from_hex(0x3b2a1f),
                config.secondary.hemisphere_base,
            ),
            sun: Light::directional(
                Self::SUN_POSITION,
                bounds.center(),
                Color::from_hex(0xfff4e0),
                1.0,
            )
            .with_shadow(shadow),
            fill: Light::point(
                Self::FILL_POSITION,
                Color::from_hex(0x8fa8ff),
                0.4,
                Falloff::new(15.0, 2.0),
            ),
            rim: Light::point(
                Self::RIM_POSITION,
                Color::from_hex(0xffd2a0),
                0.3,
                Falloff::new(12.0, 2.0),
            ),
            fixtures: Vec::new(),
            device_class,
        };

        info!(
            "Light rig ready: {:?} device, {}px sun shadow map",
            device_class, shadow.map_size
        );
        rig
    }

    pub fn device_class(&self) -> DeviceClass {
        self.device_class
    }

    /// Look up a light by name
    pub fn get(&self, name: &str) -> Option<&Light> {
        match name {
            names::AMBIENT => Some(&self.ambient),
            names::HEMISPHERE => Some(&self.hemisphere),
            names::SUN => Some(&self.sun),
            names::FILL => Some(&self.fill),
            names::RIM => Some(&self.rim),
            _ => self
                .fixtures
                .iter()
                .find(|f| f.name == name)
                .map(|f| &f.light),
        }
    }

    /// Look up a light by name for in-place mutation
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Light> {
        match name {
            names::AMBIENT => Some(&mut self.ambient),
            names::HEMISPHERE => Some(&mut self.hemisphere),
            names::SUN => Some(&mut self.sun),
            names::FILL => Some(&mut self.fill),
            names::RIM => Some(&mut self.rim),
            _ => self
                .fixtures
                .iter_mut()
                .find(|f| f.name == name)
                .map(|f| &mut f.light),
        }
    }

    /// Like [`get`](Self::get), but a missing light is an error
    pub fn require(&self, name: &str) -> Result<&Light, LightingError> {
        self.get(name)
            .ok_or_else(|| LightingError::UnknownLight(name.to_string()))
    }

    /// Add a collaborator fixture (for example a desk lamp's bulb)
    pub fn register(&mut self, name: impl Into<String>, light: Light) -> Result<(), LightingError> {
        let name = name.into();
        if self.get(&name).is_some() {
            return Err(LightingError::DuplicateLight(name));
        }
        info!("Registered rig fixture '{}' ({:?})", name, light.kind);
        self.fixtures.push(Fixture { name, light });
        Ok(())
    }

    /// All lights, built-ins first, then fixtures in registration order
    pub fn lights(&self) -> impl Iterator<Item = (&str, &Light)> {
        let built_in: [(&str, &Light); 5] = [
            (names::AMBIENT, &self.ambient),
            (names::HEMISPHERE, &self.hemisphere),
            (names::SUN, &self.sun),
            (names::FILL, &self.fill),
            (names::RIM, &self.rim),
        ];
        built_in
            .into_iter()
            .chain(self.fixtures.iter().map(|f| (f.name.as_str(), &f.light)))
    }

    /// Built-in lights plus registered fixtures
    pub fn light_count(&self) -> usize {
        names::BUILT_IN.len() + self.fixtures.len()
    }

    pub fn ambient(&self) -> &Light {
        &self.ambient
    }

    pub fn hemisphere(&self) -> &Light {
        &self.hemisphere
    }

    pub fn sun(&self) -> &Light {
        &self.sun
    }

    pub fn fill(&self) -> &Light {
        &self.fill
    }

    pub fn rim(&self) -> &Light {
        &self.rim
    }

    /// Write the day/night result into the sun and the two fill lights
    pub(crate) fn apply_daylight(
        &mut self,
        sun_color: Color,
        sun_intensity: f32,
        ambient_intensity: f32,
        hemisphere_intensity: f32,
    ) {
        self.sun.color = sun_color;
        self.sun.intensity = sun_intensity;
        self.ambient.intensity = ambient_intensity;
        self.hemisphere.intensity = hemisphere_intensity;
    }
}
