//! Scene draw system
//!
//! Owns the push-constant graphics pipeline and renders a slice of game
//! objects: bind once, then push constants and draw per object.

use ash::vk;
use bytemuck::{Pod, Zeroable};

use crate::config::RendererConfig;
use crate::render::vulkan::{
    PipelineConfig, RenderPipeline, ShaderModule, Vertex, VulkanContext, VulkanError, VulkanResult,
};
use crate::scene::{advance_animation, GameObject};

/// Push-constant block shared by the vertex and fragment stages.
///
/// Layout matches the shader declaration: a column-major mat4 followed by a
/// 16-byte-aligned vec3 color, 80 bytes total.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct SimplePushConstants {
    /// Model transform, column-major
    pub transform: [[f32; 4]; 4],
    /// Override color for the object
    pub color: [f32; 3],
    /// Std430 pads vec3 to 16 bytes
    pub _padding: f32,
}

/// Renders game objects through one push-constant pipeline
pub struct SceneDrawSystem {
    pipeline: RenderPipeline,
}

impl SceneDrawSystem {
    /// Build the pipeline from the configured shaders against the swapchain
    /// render pass.
    pub fn new(
        context: &VulkanContext,
        render_pass: vk::RenderPass,
        config: &RendererConfig,
    ) -> VulkanResult<Self> {
        let device = context.raw_device();

        let vertex_path = RendererConfig::resolve_shader_path(&config.vertex_shader)
            .map_err(|e| VulkanError::InitializationFailed(e.to_string()))?;
        let fragment_path = RendererConfig::resolve_shader_path(&config.fragment_shader)
            .map_err(|e| VulkanError::InitializationFailed(e.to_string()))?;

        let vertex_shader = ShaderModule::from_file(device.clone(), vertex_path)?;
        let fragment_shader = ShaderModule::from_file(device.clone(), fragment_path)?;

        let binding_descriptions = Vertex::binding_descriptions();
        let attribute_descriptions = Vertex::attribute_descriptions();
        let vertex_input_info = vk::PipelineVertexInputStateCreateInfo::builder()
            .vertex_binding_descriptions(&binding_descriptions)
            .vertex_attribute_descriptions(&attribute_descriptions)
            .build();

        let pipeline_config = PipelineConfig {
            push_constant_size: std::mem::size_of::<SimplePushConstants>() as u32,
            ..PipelineConfig::default()
        };

        let pipeline = RenderPipeline::new(
            device,
            render_pass,
            &vertex_shader,
            &fragment_shader,
            vertex_input_info,
            &pipeline_config,
        )?;

        Ok(Self { pipeline })
    }

    /// Record draws for every object into the command buffer.
    ///
    /// The pipeline is bound once up front. Each object's illustrative spin
    /// advances every frame; objects without a model still animate but emit
    /// no draw.
    pub fn render_game_objects(
        &self,
        context: &VulkanContext,
        command_buffer: vk::CommandBuffer,
        objects: &mut [GameObject],
    ) {
        let mut recorder = PipelineRecorder {
            context,
            command_buffer,
            pipeline: &self.pipeline,
        };
        record_objects(&mut recorder, objects);
    }
}

/// The per-object state the recording loop needs from a renderable.
pub(crate) trait Renderable {
    /// Advance per-frame animation state.
    fn animate(&mut self);
    /// Vertex count of the attached mesh, if any.
    fn mesh_vertices(&self) -> Option<u32>;
}

impl Renderable for GameObject {
    fn animate(&mut self) {
        advance_animation(&mut self.transform);
    }

    fn mesh_vertices(&self) -> Option<u32> {
        self.model.as_ref().map(|model| model.vertex_count())
    }
}

/// Sink for the recorded commands of one frame. The Vulkan implementation
/// writes into a command buffer.
pub(crate) trait ObjectRecorder<T> {
    /// Bind the graphics pipeline; called once before any draws.
    fn bind_pipeline(&mut self);
    /// Record the draw for one object that has a mesh.
    fn draw(&mut self, object: &T);
}

/// Recording loop: bind the pipeline once, animate every object, and draw
/// each object that carries a mesh.
pub(crate) fn record_objects<T, R>(recorder: &mut R, objects: &mut [T])
where
    T: Renderable,
    R: ObjectRecorder<T>,
{
    recorder.bind_pipeline();

    for object in objects.iter_mut() {
        object.animate();
        if object.mesh_vertices().is_some() {
            recorder.draw(object);
        }
    }
}

/// Writes recorded commands into a Vulkan command buffer
struct PipelineRecorder<'a> {
    context: &'a VulkanContext,
    command_buffer: vk::CommandBuffer,
    pipeline: &'a RenderPipeline,
}

impl ObjectRecorder<GameObject> for PipelineRecorder<'_> {
    fn bind_pipeline(&mut self) {
        self.pipeline.bind(self.command_buffer);
    }

    fn draw(&mut self, object: &GameObject) {
        let Some(model) = &object.model else {
            return;
        };

        let push = push_constants_for(object);

        unsafe {
            self.context.device().device.cmd_push_constants(
                self.command_buffer,
                self.pipeline.layout(),
                vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT,
                0,
                bytemuck::bytes_of(&push),
            );
        }

        model.bind(self.context, self.command_buffer);
        model.draw(self.context, self.command_buffer);
    }
}

/// Build the push-constant block for one object.
fn push_constants_for(object: &GameObject) -> SimplePushConstants {
    SimplePushConstants {
        transform: object.transform.mat4().into(),
        color: object.color.into(),
        _padding: 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use crate::scene::GameObjectWorld;
    use approx::assert_relative_eq;

    #[test]
    fn push_constant_block_is_80_bytes() {
        assert_eq!(std::mem::size_of::<SimplePushConstants>(), 80);
        assert_eq!(memoffset_of_color(), 64);
    }

    fn memoffset_of_color() -> usize {
        let value = SimplePushConstants::zeroed();
        let base = std::ptr::addr_of!(value) as usize;
        let field = std::ptr::addr_of!(value.color) as usize;
        field - base
    }

    #[derive(Default)]
    struct CountingRecorder {
        binds: usize,
        draws: Vec<u32>,
    }

    struct MeshStub {
        vertices: Option<u32>,
        animated: usize,
    }

    impl Renderable for MeshStub {
        fn animate(&mut self) {
            self.animated += 1;
        }

        fn mesh_vertices(&self) -> Option<u32> {
            self.vertices
        }
    }

    impl ObjectRecorder<MeshStub> for CountingRecorder {
        fn bind_pipeline(&mut self) {
            self.binds += 1;
        }

        fn draw(&mut self, object: &MeshStub) {
            self.draws.push(object.vertices.unwrap_or(0));
        }
    }

    impl ObjectRecorder<GameObject> for CountingRecorder {
        fn bind_pipeline(&mut self) {
            self.binds += 1;
        }

        fn draw(&mut self, object: &GameObject) {
            self.draws
                .push(object.model.as_ref().map_or(0, |model| model.vertex_count()));
        }
    }

    #[test]
    fn recording_binds_once_and_draws_each_meshed_object() {
        let mut recorder = CountingRecorder::default();
        let mut objects = [
            MeshStub {
                vertices: Some(36),
                animated: 0,
            },
            MeshStub {
                vertices: None,
                animated: 0,
            },
        ];

        record_objects(&mut recorder, &mut objects);

        assert_eq!(recorder.binds, 1);
        assert_eq!(recorder.draws, vec![36]);
        assert_eq!(objects[0].animated, 1);
        assert_eq!(objects[1].animated, 1);
    }

    #[test]
    fn objects_without_meshes_animate_but_emit_no_draw() {
        let mut world = GameObjectWorld::new();
        let mut objects = [world.spawn()];
        let before = objects[0].transform.rotation;

        let mut recorder = CountingRecorder::default();
        record_objects(&mut recorder, &mut objects);

        assert_eq!(recorder.binds, 1);
        assert!(recorder.draws.is_empty());
        assert!(objects[0].transform.rotation.y > before.y);
    }

    #[test]
    fn push_constants_carry_transform_and_color() {
        let mut world = GameObjectWorld::new();
        let mut object = world.spawn();
        object.color = Vec3::new(0.2, 0.4, 0.6);
        object.transform.translation = Vec3::new(1.0, 2.0, 3.0);

        let push = push_constants_for(&object);
        let expected: [[f32; 4]; 4] = object.transform.mat4().into();

        assert_eq!(push.transform, expected);
        assert_relative_eq!(push.color[0], 0.2);
        assert_relative_eq!(push.color[1], 0.4);
        assert_relative_eq!(push.color[2], 0.6);
        // Translation lands in the last column
        assert_relative_eq!(push.transform[3][0], 1.0);
        assert_relative_eq!(push.transform[3][1], 2.0);
        assert_relative_eq!(push.transform[3][2], 3.0);
    }
}
