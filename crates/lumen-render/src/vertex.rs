//! Vertex layout of glare overlay quads

use bytemuck::{Pod, Zeroable};
use std::collections::HashMap;

/// Vertex of a planar glare overlay: position, surface normal and uv
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GlareVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl GlareVertex {
    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }

    /// Vulkano vertex buffer description
    pub fn per_vertex() -> vulkano::pipeline::graphics::vertex_input::VertexBufferDescription {
        let stride = std::mem::size_of::<Self>() as u32;
        let member = |offset: u32, format: vulkano::format::Format| {
            vulkano::pipeline::graphics::vertex_input::VertexMemberInfo {
                offset,
                format,
                num_elements: 1,
                stride,
            }
        };

        vulkano::pipeline::graphics::vertex_input::VertexBufferDescription {
            stride,
            input_rate: vulkano::pipeline::graphics::vertex_input::VertexInputRate::Vertex,
            members: HashMap::from([
                (
                    "position".to_string(),
                    member(0, vulkano::format::Format::R32G32B32_SFLOAT),
                ),
                (
                    "normal".to_string(),
                    member(12, vulkano::format::Format::R32G32B32_SFLOAT),
                ),
                (
                    "uv".to_string(),
                    member(24, vulkano::format::Format::R32G32_SFLOAT),
                ),
            ]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<GlareVertex>(), 32);
        let description = GlareVertex::per_vertex();
        assert_eq!(description.stride, 32);
        assert_eq!(description.members.len(), 3);
        assert_eq!(description.members["uv"].offset, 24);
    }
}
