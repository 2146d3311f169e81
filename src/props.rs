//! The room's props, built against the lighting context

use glam::Vec3;
use lumen_core::Color;
use lumen_light::{Falloff, Light};
use lumen_render::{GlareParams, GlareSurface};
use lumen_scene::{LightingContext, Prop, PropFactory, SceneError};

/// Desk lamp with its own warm bulb in the rig
pub struct DeskLamp {
    pub bulb_position: Vec3,
}

impl PropFactory for DeskLamp {
    fn name(&self) -> &str {
        "desk_lamp"
    }

    fn build(&self, context: &mut LightingContext) -> Result<Prop, SceneError> {
        let bulb = Light::point(
            self.bulb_position,
            Color::from_hex(0xffb46b),
            1.4,
            Falloff::new(6.0, 2.0),
        );
        context.register_fixture("desk_lamp", bulb)?;
        Ok(Prop::new("desk_lamp", context.environment(0.4)).interactive())
    }
}

/// A screen surface with view-dependent glare
pub struct Screen {
    pub label: &'static str,
    pub params: GlareParams,
    pub surface: GlareSurface,
}

impl Screen {
    pub fn monitor() -> Self {
        Self {
            label: "monitor",
            params: GlareParams::primary_screen(),
            surface: GlareSurface {
                center: Vec3::new(0.0, 1.15, -0.45),
                normal: Vec3::Z,
                tangent: Vec3::X,
                width: 0.62,
                height: 0.36,
            },
        }
    }

    pub fn laptop() -> Self {
        Self {
            label: "laptop",
            params: GlareParams::laptop_screen(),
            surface: GlareSurface {
                center: Vec3::new(0.7, 0.92, -0.2),
                normal: Vec3::new(-0.3, 0.35, 0.89).normalize(),
                tangent: Vec3::new(0.95, 0.0, 0.32).normalize(),
                width: 0.33,
                height: 0.21,
            },
        }
    }
}

impl PropFactory for Screen {
    fn name(&self) -> &str {
        self.label
    }

    fn build(&self, context: &mut LightingContext) -> Result<Prop, SceneError> {
        let glare = context.create_glare_material(self.params, self.surface);
        Ok(Prop::new(self.label, context.environment(0.25))
            .interactive()
            .with_glare(glare))
    }
}

/// Static room shell: walls, floor and shelving
pub struct Room;

impl PropFactory for Room {
    fn name(&self) -> &str {
        "room"
    }

    fn build(&self, context: &mut LightingContext) -> Result<Prop, SceneError> {
        Ok(Prop::new("room", context.environment(0.05)))
    }
}
