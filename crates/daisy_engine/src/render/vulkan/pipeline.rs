//! Shader modules and the graphics pipeline
//!
//! SPIR-V loading plus a fixed-function configuration suited to the forward
//! pass: dynamic viewport/scissor, depth test and write, opaque blending.

use ash::{vk, Device};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::render::vulkan::{VulkanError, VulkanResult};

/// Shader module wrapper with RAII cleanup
pub struct ShaderModule {
    device: Device,
    module: vk::ShaderModule,
}

impl ShaderModule {
    /// Create shader module from SPIR-V bytecode
    pub fn from_bytes(device: Device, bytes: &[u8]) -> VulkanResult<Self> {
        // SPIR-V words are u32; reject misaligned or truncated blobs
        let (prefix, u32_slice, suffix) = unsafe { bytes.align_to::<u32>() };
        if !prefix.is_empty() || !suffix.is_empty() {
            return Err(VulkanError::InitializationFailed(
                "SPIR-V bytecode is not properly aligned".to_string(),
            ));
        }

        let create_info = vk::ShaderModuleCreateInfo::builder().code(u32_slice);

        let module = unsafe {
            device
                .create_shader_module(&create_info, None)
                .map_err(VulkanError::Api)?
        };

        Ok(Self { device, module })
    }

    /// Load shader from a SPIR-V file
    pub fn from_file<P: AsRef<Path>>(device: Device, path: P) -> VulkanResult<Self> {
        let path = path.as_ref();
        let mut file = File::open(path).map_err(|e| {
            VulkanError::InitializationFailed(format!(
                "Failed to open shader file {}: {e}",
                path.display()
            ))
        })?;

        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes).map_err(|e| {
            VulkanError::InitializationFailed(format!(
                "Failed to read shader file {}: {e}",
                path.display()
            ))
        })?;

        Self::from_bytes(device, &bytes)
    }

    /// Get shader module handle
    pub fn handle(&self) -> vk::ShaderModule {
        self.module
    }
}

impl Drop for ShaderModule {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_shader_module(self.module, None);
        }
    }
}

/// Fixed-function state for [`RenderPipeline`]
pub struct PipelineConfig {
    /// Faces culled during rasterization
    pub cull_mode: vk::CullModeFlags,
    /// Winding order considered front-facing
    pub front_face: vk::FrontFace,
    /// Size in bytes of the push-constant block, visible to both stages
    pub push_constant_size: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            cull_mode: vk::CullModeFlags::NONE,
            front_face: vk::FrontFace::CLOCKWISE,
            push_constant_size: 0,
        }
    }
}

/// Graphics pipeline wrapper with RAII cleanup
pub struct RenderPipeline {
    device: Device,
    pipeline: vk::Pipeline,
    layout: vk::PipelineLayout,
}

impl RenderPipeline {
    /// Build the graphics pipeline against a render pass.
    ///
    /// Viewport and scissor are dynamic; the pipeline survives swapchain
    /// rebuilds as long as the attachment formats do.
    pub fn new(
        device: Device,
        render_pass: vk::RenderPass,
        vertex_shader: &ShaderModule,
        fragment_shader: &ShaderModule,
        vertex_input_info: vk::PipelineVertexInputStateCreateInfo,
        config: &PipelineConfig,
    ) -> VulkanResult<Self> {
        let entry_point = std::ffi::CStr::from_bytes_with_nul(b"main\0").map_err(|_| {
            VulkanError::InitializationFailed("Invalid shader entry point".to_string())
        })?;

        let shader_stages = [
            vk::PipelineShaderStageCreateInfo::builder()
                .stage(vk::ShaderStageFlags::VERTEX)
                .module(vertex_shader.handle())
                .name(entry_point)
                .build(),
            vk::PipelineShaderStageCreateInfo::builder()
                .stage(vk::ShaderStageFlags::FRAGMENT)
                .module(fragment_shader.handle())
                .name(entry_point)
                .build(),
        ];

        let input_assembly = vk::PipelineInputAssemblyStateCreateInfo::builder()
            .topology(vk::PrimitiveTopology::TRIANGLE_LIST)
            .primitive_restart_enable(false);

        // Counts only; actual viewport and scissor are set per frame
        let viewport_state = vk::PipelineViewportStateCreateInfo::builder()
            .viewport_count(1)
            .scissor_count(1);

        let dynamic_states = [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];
        let dynamic_state =
            vk::PipelineDynamicStateCreateInfo::builder().dynamic_states(&dynamic_states);

        let rasterizer = vk::PipelineRasterizationStateCreateInfo::builder()
            .depth_clamp_enable(false)
            .rasterizer_discard_enable(false)
            .polygon_mode(vk::PolygonMode::FILL)
            .line_width(1.0)
            .cull_mode(config.cull_mode)
            .front_face(config.front_face)
            .depth_bias_enable(false);

        let multisampling = vk::PipelineMultisampleStateCreateInfo::builder()
            .sample_shading_enable(false)
            .rasterization_samples(vk::SampleCountFlags::TYPE_1);

        let depth_stencil = vk::PipelineDepthStencilStateCreateInfo::builder()
            .depth_test_enable(true)
            .depth_write_enable(true)
            .depth_compare_op(vk::CompareOp::LESS)
            .depth_bounds_test_enable(false)
            .stencil_test_enable(false);

        let color_blend_attachment = vk::PipelineColorBlendAttachmentState::builder()
            .color_write_mask(vk::ColorComponentFlags::RGBA)
            .blend_enable(false)
            .build();

        let color_blend_attachments = [color_blend_attachment];
        let color_blending = vk::PipelineColorBlendStateCreateInfo::builder()
            .logic_op_enable(false)
            .attachments(&color_blend_attachments);

        let push_constant_ranges = [vk::PushConstantRange {
            stage_flags: vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT,
            offset: 0,
            size: config.push_constant_size,
        }];

        let layout_info = if config.push_constant_size > 0 {
            vk::PipelineLayoutCreateInfo::builder().push_constant_ranges(&push_constant_ranges)
        } else {
            vk::PipelineLayoutCreateInfo::builder()
        };

        let layout = unsafe {
            device
                .create_pipeline_layout(&layout_info, None)
                .map_err(VulkanError::Api)?
        };

        let pipeline_info = vk::GraphicsPipelineCreateInfo::builder()
            .stages(&shader_stages)
            .vertex_input_state(&vertex_input_info)
            .input_assembly_state(&input_assembly)
            .viewport_state(&viewport_state)
            .dynamic_state(&dynamic_state)
            .rasterization_state(&rasterizer)
            .multisample_state(&multisampling)
            .depth_stencil_state(&depth_stencil)
            .color_blend_state(&color_blending)
            .layout(layout)
            .render_pass(render_pass)
            .subpass(0);

        let pipelines = unsafe {
            device
                .create_graphics_pipelines(vk::PipelineCache::null(), &[pipeline_info.build()], None)
                .map_err(|(_, err)| VulkanError::Api(err))?
        };

        let pipeline = pipelines[0];

        Ok(Self {
            device,
            pipeline,
            layout,
        })
    }

    /// Bind the pipeline for graphics work.
    pub fn bind(&self, command_buffer: vk::CommandBuffer) {
        unsafe {
            self.device.cmd_bind_pipeline(
                command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                self.pipeline,
            );
        }
    }

    /// Get pipeline handle
    pub fn handle(&self) -> vk::Pipeline {
        self.pipeline
    }

    /// Get layout handle
    pub fn layout(&self) -> vk::PipelineLayout {
        self.layout
    }
}

impl Drop for RenderPipeline {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_pipeline(self.pipeline, None);
            self.device.destroy_pipeline_layout(self.layout, None);
        }
    }
}
