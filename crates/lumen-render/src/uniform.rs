//! Typed uniforms and shader material descriptors

use glam::Vec3;

use crate::backend::TargetId;
use crate::error::RenderError;

/// The type of a uniform slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformKind {
    Float,
    Bool,
    Vec3,
    Texture,
}

/// A value bound to a uniform slot
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Bool(bool),
    Vec3(Vec3),
    /// `None` binds the backend's blank texture
    Texture(Option<TargetId>),
}

impl UniformValue {
    pub fn kind(&self) -> UniformKind {
        match self {
            UniformValue::Float(_) => UniformKind::Float,
            UniformValue::Bool(_) => UniformKind::Bool,
            UniformValue::Vec3(_) => UniformKind::Vec3,
            UniformValue::Texture(_) => UniformKind::Texture,
        }
    }
}

/// The set of uniform slots a shader declares, in declaration order.
///
/// Slots are fixed at construction; writes to undeclared slots fail.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UniformSet {
    slots: Vec<(&'static str, UniformValue)>,
}

impl UniformSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a slot with its initial value. Redeclaring replaces the value.
    pub fn with(mut self, name: &'static str, value: UniformValue) -> Self {
        match self.slots.iter_mut().find(|(slot, _)| *slot == name) {
            Some(slot) => slot.1 = value,
            None => self.slots.push((name, value)),
        }
        self
    }

    pub fn declares(&self, name: &str) -> bool {
        self.slots.iter().any(|(slot, _)| *slot == name)
    }

    pub fn get(&self, name: &str) -> Option<UniformValue> {
        self.slots
            .iter()
            .find(|(slot, _)| *slot == name)
            .map(|(_, value)| *value)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.slots.iter().map(|(name, _)| *name)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Names from `required` that this set does not declare
    pub fn missing<'a>(&self, required: &[&'a str]) -> Vec<&'a str> {
        required
            .iter()
            .copied()
            .filter(|name| !self.declares(name))
            .collect()
    }

    fn slot_mut(&mut self, name: &str) -> Option<&mut UniformValue> {
        self.slots
            .iter_mut()
            .find(|(slot, _)| *slot == name)
            .map(|(_, value)| value)
    }
}

/// Blending of a material's output into the destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMode {
    /// Replace the destination
    Opaque,
    /// Alpha-blend over the destination
    Normal,
    /// Add onto the destination
    Additive,
}

/// Fixed-function state a material renders with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaterialState {
    pub blend: BlendMode,
    pub depth_test: bool,
    pub depth_write: bool,
    pub transparent: bool,
}

impl MaterialState {
    /// Opaque fullscreen pass: no depth, replaces destination
    pub const FULLSCREEN: MaterialState = MaterialState {
        blend: BlendMode::Opaque,
        depth_test: false,
        depth_write: false,
        transparent: false,
    };

    /// Additive overlay that never occludes or writes depth
    pub const ADDITIVE_OVERLAY: MaterialState = MaterialState {
        blend: BlendMode::Additive,
        depth_test: false,
        depth_write: false,
        transparent: true,
    };
}

/// A shader program with its declared uniforms and render state
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderMaterial {
    pub label: &'static str,
    pub vertex_source: &'static str,
    pub fragment_source: &'static str,
    pub uniforms: UniformSet,
    pub state: MaterialState,
}

/// Vertex stage shared by every fullscreen material
pub const FULLSCREEN_VERTEX: &str = r#"#version 450
layout(location = 0) out vec2 v_uv;

void main() {
    v_uv = vec2((gl_VertexIndex << 1) & 2, gl_VertexIndex & 2);
    gl_Position = vec4(v_uv * 2.0 - 1.0, 0.0, 1.0);
}
"#;

impl ShaderMaterial {
    /// A fullscreen material using the shared vertex stage
    pub fn fullscreen(
        label: &'static str,
        fragment_source: &'static str,
        uniforms: UniformSet,
        state: MaterialState,
    ) -> Self {
        Self {
            label,
            vertex_source: FULLSCREEN_VERTEX,
            fragment_source,
            uniforms,
            state,
        }
    }

    /// Write a declared uniform. Undeclared slots and type changes are errors.
    pub fn set_uniform(&mut self, name: &str, value: UniformValue) -> Result<(), RenderError> {
        let label = self.label;
        let slot = self
            .uniforms
            .slot_mut(name)
            .ok_or_else(|| RenderError::MissingUniform {
                material: label.to_string(),
                uniform: name.to_string(),
            })?;

        if slot.kind() != value.kind() {
            return Err(RenderError::UniformTypeMismatch {
                material: label.to_string(),
                uniform: name.to_string(),
                expected: slot.kind(),
                found: value.kind(),
            });
        }

        *slot = value;
        Ok(())
    }

    /// Check the material declares every name in `required`
    pub fn validate(&self, required: &[&str]) -> Result<(), RenderError> {
        match self.uniforms.missing(required).first() {
            Some(name) => Err(RenderError::MissingUniform {
                material: self.label.to_string(),
                uniform: name.to_string(),
            }),
            None => Ok(()),
        }
    }
}
