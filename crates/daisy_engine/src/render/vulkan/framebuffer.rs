//! Framebuffer and depth attachment management

use ash::{vk, Device};

use crate::render::vulkan::{VulkanContext, VulkanError, VulkanResult};

/// Framebuffer wrapper with RAII cleanup
pub struct Framebuffer {
    device: Device,
    framebuffer: vk::Framebuffer,
}

impl Framebuffer {
    /// Create a framebuffer binding the given attachments to a render pass.
    pub fn new(
        device: Device,
        render_pass: vk::RenderPass,
        attachments: &[vk::ImageView],
        extent: vk::Extent2D,
    ) -> VulkanResult<Self> {
        let framebuffer_create_info = vk::FramebufferCreateInfo::builder()
            .render_pass(render_pass)
            .attachments(attachments)
            .width(extent.width)
            .height(extent.height)
            .layers(1);

        let framebuffer = unsafe {
            device
                .create_framebuffer(&framebuffer_create_info, None)
                .map_err(VulkanError::Api)?
        };

        Ok(Self {
            device,
            framebuffer,
        })
    }

    /// Get the framebuffer handle
    pub fn handle(&self) -> vk::Framebuffer {
        self.framebuffer
    }
}

impl Drop for Framebuffer {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_framebuffer(self.framebuffer, None);
        }
    }
}

/// Depth attachment: image, backing memory, and view
pub struct DepthBuffer {
    device: Device,
    image: vk::Image,
    memory: vk::DeviceMemory,
    image_view: vk::ImageView,
}

impl DepthBuffer {
    /// Create a depth buffer matching the swapchain extent.
    ///
    /// The format comes from [`VulkanContext::find_depth_format`] so the
    /// render pass and every depth buffer agree on it.
    pub fn new(
        context: &VulkanContext,
        format: vk::Format,
        extent: vk::Extent2D,
    ) -> VulkanResult<Self> {
        let device = context.raw_device();

        let image_create_info = vk::ImageCreateInfo::builder()
            .image_type(vk::ImageType::TYPE_2D)
            .extent(vk::Extent3D {
                width: extent.width,
                height: extent.height,
                depth: 1,
            })
            .mip_levels(1)
            .array_layers(1)
            .format(format)
            .tiling(vk::ImageTiling::OPTIMAL)
            .initial_layout(vk::ImageLayout::UNDEFINED)
            .usage(vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT)
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .samples(vk::SampleCountFlags::TYPE_1);

        let image = unsafe {
            device
                .create_image(&image_create_info, None)
                .map_err(VulkanError::Api)?
        };

        let memory_requirements = unsafe { device.get_image_memory_requirements(image) };

        let memory_type_index = context.find_memory_type(
            memory_requirements.memory_type_bits,
            vk::MemoryPropertyFlags::DEVICE_LOCAL,
        )?;

        let alloc_info = vk::MemoryAllocateInfo::builder()
            .allocation_size(memory_requirements.size)
            .memory_type_index(memory_type_index);

        let memory = unsafe {
            device
                .allocate_memory(&alloc_info, None)
                .map_err(VulkanError::Api)?
        };

        unsafe {
            device
                .bind_image_memory(image, memory, 0)
                .map_err(VulkanError::Api)?;
        }

        let image_view_create_info = vk::ImageViewCreateInfo::builder()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(format)
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask: vk::ImageAspectFlags::DEPTH,
                base_mip_level: 0,
                level_count: 1,
                base_array_layer: 0,
                layer_count: 1,
            });

        let image_view = unsafe {
            device
                .create_image_view(&image_view_create_info, None)
                .map_err(VulkanError::Api)?
        };

        Ok(Self {
            device,
            image,
            memory,
            image_view,
        })
    }

    /// Get the image view handle
    pub fn image_view(&self) -> vk::ImageView {
        self.image_view
    }
}

impl Drop for DepthBuffer {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_image_view(self.image_view, None);
            self.device.destroy_image(self.image, None);
            self.device.free_memory(self.memory, None);
        }
    }
}
