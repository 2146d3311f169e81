//! Lighting context handed to prop factories
//!
//! Props never reach into scene globals: each factory call receives the
//! context explicitly and uses it to bind the environment map, register its
//! own fixtures into the rig and create glare materials.

use glam::Vec3;
use lumen_core::ObjectId;
use lumen_light::{EnvironmentBinding, Light, LightRig, LightingError};
use lumen_render::{
    GlareMaterial, GlareMaterialId, GlareParams, GlareRegistry, GlareSurface, RenderError,
};

use crate::error::SceneError;

/// The session's lighting state shared with every prop factory
#[derive(Debug)]
pub struct LightingContext {
    rig: LightRig,
    glare: GlareRegistry,
    environment: EnvironmentBinding,
}

impl LightingContext {
    pub fn new(rig: LightRig, environment: EnvironmentBinding) -> Self {
        Self {
            rig,
            glare: GlareRegistry::new(),
            environment,
        }
    }

    pub fn rig(&self) -> &LightRig {
        &self.rig
    }

    pub fn glare(&self) -> &GlareRegistry {
        &self.glare
    }

    /// Environment binding for a material with the given reflection intensity
    pub fn environment(&self, intensity: f32) -> EnvironmentBinding {
        match &self.environment {
            EnvironmentBinding::Reflective { map, .. } => EnvironmentBinding::Reflective {
                map: map.clone(),
                intensity,
            },
            EnvironmentBinding::Flat => EnvironmentBinding::Flat,
        }
    }

    /// Add an application fixture, such as a desk lamp, to the rig
    pub fn register_fixture(&mut self, name: &str, light: Light) -> Result<(), LightingError> {
        self.rig.register(name, light)
    }

    pub fn create_glare_material(
        &mut self,
        params: GlareParams,
        surface: GlareSurface,
    ) -> GlareMaterialId {
        self.glare.create(&self.rig, params, surface)
    }

    /// Unregister a disposed surface's material so per-frame updates stop
    /// reaching it
    pub fn dispose_glare(&mut self, id: GlareMaterialId) -> Result<GlareMaterial, RenderError> {
        self.glare.unregister(id)
    }

    /// Split borrows for the per-frame day/night update
    pub(crate) fn rig_and_glare_mut(&mut self) -> (&mut LightRig, &mut GlareRegistry) {
        (&mut self.rig, &mut self.glare)
    }

    pub(crate) fn refresh_camera(&mut self, camera_position: Vec3) {
        self.glare.refresh_camera(camera_position);
    }
}

/// A built prop as the scene sees it
#[derive(Debug, Clone)]
pub struct Prop {
    pub id: ObjectId,
    pub name: String,
    /// Whether selecting it counts as interaction and it joins the outline set
    pub interactive: bool,
    pub environment: EnvironmentBinding,
    pub glare: Option<GlareMaterialId>,
}

impl Prop {
    pub fn new(name: impl Into<String>, environment: EnvironmentBinding) -> Self {
        Self {
            id: ObjectId::new(),
            name: name.into(),
            interactive: false,
            environment,
            glare: None,
        }
    }

    pub fn interactive(mut self) -> Self {
        self.interactive = true;
        self
    }

    pub fn with_glare(mut self, glare: GlareMaterialId) -> Self {
        self.glare = Some(glare);
        self
    }
}

/// Builds one piece of scene geometry against the lighting context
pub trait PropFactory {
    fn name(&self) -> &str;

    fn build(&self, context: &mut LightingContext) -> Result<Prop, SceneError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::{Color, Extent};
    use lumen_light::{
        AuxiliaryScene, DeviceClass, EnvironmentMapBaker, Falloff, LightingConfig, RoomBounds,
    };
    use std::sync::Arc;

    fn context(environment: EnvironmentBinding) -> LightingContext {
        let rig = LightRig::new(
            &LightingConfig::default(),
            DeviceClass::from_viewport(Extent::new(1280, 720)),
            RoomBounds::default(),
        );
        LightingContext::new(rig, environment)
    }

    #[test]
    fn test_fixtures_register_by_name() {
        let mut ctx = context(EnvironmentBinding::Flat);
        let lamp = Light::point(
            Vec3::new(1.0, 1.2, 0.0),
            Color::from_hex(0xffb46b),
            1.5,
            Falloff::new(6.0, 2.0),
        );
        ctx.register_fixture("desk_lamp", lamp.clone()).unwrap();
        assert_eq!(ctx.rig().get("desk_lamp"), Some(&lamp));
        assert_eq!(
            ctx.register_fixture("desk_lamp", lamp),
            Err(LightingError::DuplicateLight("desk_lamp".into()))
        );
    }

    #[test]
    fn test_environment_is_shared_with_per_material_intensity() {
        let map = EnvironmentMapBaker::new(Default::default())
            .bake(&AuxiliaryScene::room())
            .unwrap();
        let ctx = context(EnvironmentBinding::Reflective {
            map: Arc::new(map),
            intensity: 1.0,
        });
        match ctx.environment(0.35) {
            EnvironmentBinding::Reflective { intensity, .. } => assert_eq!(intensity, 0.35),
            EnvironmentBinding::Flat => panic!("expected the baked map"),
        }
    }

    #[test]
    fn test_flat_environment_stays_flat() {
        let ctx = context(EnvironmentBinding::Flat);
        assert!(!ctx.environment(1.0).is_reflective());
    }

    #[test]
    fn test_glare_materials_land_in_registry() {
        let mut ctx = context(EnvironmentBinding::Flat);
        let surface = GlareSurface {
            center: Vec3::new(0.0, 1.1, -0.4),
            normal: Vec3::Z,
            tangent: Vec3::X,
            width: 0.6,
            height: 0.35,
        };
        let id = ctx.create_glare_material(GlareParams::primary_screen(), surface);
        assert_eq!(ctx.glare().len(), 1);
        assert!(ctx.glare().get(id).is_some());
    }

    #[test]
    fn test_disposed_glare_stops_receiving_updates() {
        let mut ctx = context(EnvironmentBinding::Flat);
        let surface = GlareSurface {
            center: Vec3::new(0.7, 0.9, -0.2),
            normal: Vec3::Z,
            tangent: Vec3::X,
            width: 0.33,
            height: 0.21,
        };
        let kept = ctx.create_glare_material(GlareParams::primary_screen(), surface);
        let disposed = ctx.create_glare_material(GlareParams::laptop_screen(), surface);

        let before = Vec3::new(0.0, 1.6, 2.0);
        ctx.refresh_camera(before);
        let material = ctx.dispose_glare(disposed).unwrap();
        ctx.refresh_camera(Vec3::new(1.0, 1.6, 3.0));

        assert_eq!(material.uniforms.camera_position(), before);
        assert_eq!(ctx.glare().len(), 1);
        assert_eq!(
            ctx.glare().get(kept).unwrap().uniforms.camera_position(),
            Vec3::new(1.0, 1.6, 3.0)
        );
        assert_eq!(
            ctx.dispose_glare(disposed).err(),
            Some(RenderError::UnknownGlareMaterial(2))
        );
    }
}
