//! Vertex data and renderable models

use ash::vk;
use bytemuck::{Pod, Zeroable};

use crate::render::vulkan::{Buffer, VulkanContext, VulkanResult};

/// A single vertex: position and color, interleaved
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// Position in model space
    pub position: [f32; 3],
    /// Vertex color
    pub color: [f32; 3],
}

impl Vertex {
    /// Vertex buffer binding descriptions
    pub fn binding_descriptions() -> [vk::VertexInputBindingDescription; 1] {
        [vk::VertexInputBindingDescription {
            binding: 0,
            stride: std::mem::size_of::<Vertex>() as u32,
            input_rate: vk::VertexInputRate::VERTEX,
        }]
    }

    /// Vertex attribute descriptions matching the shader inputs
    pub fn attribute_descriptions() -> [vk::VertexInputAttributeDescription; 2] {
        [
            vk::VertexInputAttributeDescription {
                location: 0,
                binding: 0,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: 0,
            },
            vk::VertexInputAttributeDescription {
                location: 1,
                binding: 0,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: std::mem::size_of::<[f32; 3]>() as u32,
            },
        ]
    }
}

/// A renderable mesh: one vertex buffer, drawn non-indexed
pub struct Model {
    vertex_buffer: Buffer,
    vertex_count: u32,
}

impl Model {
    /// Upload vertices into a host-visible vertex buffer.
    pub fn new(context: &VulkanContext, vertices: &[Vertex]) -> VulkanResult<Self> {
        assert!(
            vertices.len() >= 3,
            "A model needs at least one triangle, got {} vertices",
            vertices.len()
        );

        let size = std::mem::size_of_val(vertices) as vk::DeviceSize;
        let vertex_buffer = Buffer::new(
            context,
            size,
            vk::BufferUsageFlags::VERTEX_BUFFER,
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
        )?;
        vertex_buffer.write_data(vertices)?;

        Ok(Self {
            vertex_buffer,
            vertex_count: vertices.len() as u32,
        })
    }

    /// Bind the vertex buffer.
    pub fn bind(&self, context: &VulkanContext, command_buffer: vk::CommandBuffer) {
        let buffers = [self.vertex_buffer.handle()];
        let offsets = [0];
        unsafe {
            context
                .device()
                .device
                .cmd_bind_vertex_buffers(command_buffer, 0, &buffers, &offsets);
        }
    }

    /// Issue the draw for the whole mesh. The buffer must be bound first.
    pub fn draw(&self, context: &VulkanContext, command_buffer: vk::CommandBuffer) {
        unsafe {
            context
                .device()
                .device
                .cmd_draw(command_buffer, self.vertex_count, 1, 0, 0);
        }
    }

    /// Number of vertices in the mesh
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_layout_matches_shader_inputs() {
        let bindings = Vertex::binding_descriptions();
        assert_eq!(bindings[0].stride, 24);

        let attributes = Vertex::attribute_descriptions();
        assert_eq!(attributes[0].offset, 0);
        assert_eq!(attributes[1].offset, 12);
        assert_eq!(attributes[0].format, vk::Format::R32G32B32_SFLOAT);
        assert_eq!(attributes[1].format, vk::Format::R32G32B32_SFLOAT);
    }

    #[test]
    fn vertex_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<Vertex>(), 24);
    }
}
