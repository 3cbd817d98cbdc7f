//! Vulkan swapchain management
//!
//! The swapchain owns everything whose lifetime tracks it: images and views,
//! the render pass, depth buffers, framebuffers, and the frame-in-flight
//! synchronization objects. Rebuilds chain through `old_swapchain` so
//! in-flight presentation can finish cleanly.

use ash::extensions::khr::Swapchain as SwapchainLoader;
use ash::{vk, Device};

use crate::config::PresentModePreference;
use crate::render::vulkan::{
    DepthBuffer, Framebuffer, FrameSync, ImageFenceTable, RenderPass, VulkanContext, VulkanError,
    VulkanResult,
};

/// Number of frames the CPU may record ahead of the GPU.
///
/// Two keeps one frame recording while the other renders; more adds latency
/// without throughput.
pub const MAX_FRAMES_IN_FLIGHT: usize = 2;

/// Swapchain and all of its lifetime-coupled resources
pub struct Swapchain {
    device: Device,
    swapchain_loader: SwapchainLoader,
    swapchain: vk::SwapchainKHR,
    images: Vec<vk::Image>,
    image_views: Vec<vk::ImageView>,
    // Declaration order is teardown order: depth resources, framebuffers,
    // render pass, then sync primitives
    #[allow(dead_code)] // Held for the framebuffers that reference their image views
    depth_buffers: Vec<DepthBuffer>,
    framebuffers: Vec<Framebuffer>,
    render_pass: RenderPass,
    frame_sync: Vec<FrameSync>,
    images_in_flight: ImageFenceTable,
    surface_format: vk::SurfaceFormatKHR,
    depth_format: vk::Format,
    extent: vk::Extent2D,
    current_frame: usize,
}

impl Swapchain {
    /// Create a swapchain for the surface.
    ///
    /// `old` chains the previous swapchain into the new one during a rebuild;
    /// the old instance stays alive (and presentable) until dropped by the
    /// caller, which must also verify format stability with
    /// [`Swapchain::compare_swap_formats`].
    pub fn new(
        context: &VulkanContext,
        window_extent: vk::Extent2D,
        preferred_present_mode: vk::PresentModeKHR,
        old: Option<&Swapchain>,
    ) -> VulkanResult<Self> {
        let device = context.raw_device();
        let swapchain_loader = context.swapchain_loader().clone();

        // Support data goes stale across window changes; always re-query
        let support = context.query_swapchain_support()?;

        let surface_format = choose_surface_format(&support.formats);
        let present_mode = choose_present_mode(&support.present_modes, preferred_present_mode);
        let extent = choose_extent(&support.capabilities, window_extent);
        let image_count = choose_image_count(&support.capabilities);

        log::info!(
            "Creating swapchain: {}x{}, {:?}, {:?}, {} images",
            extent.width,
            extent.height,
            surface_format.format,
            present_mode,
            image_count
        );

        let physical = context.physical_device();
        let queue_family_indices = [physical.graphics_family, physical.present_family];

        let mut swapchain_create_info = vk::SwapchainCreateInfoKHR::builder()
            .surface(context.surface())
            .min_image_count(image_count)
            .image_format(surface_format.format)
            .image_color_space(surface_format.color_space)
            .image_extent(extent)
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .pre_transform(support.capabilities.current_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(present_mode)
            .clipped(true)
            .old_swapchain(old.map_or(vk::SwapchainKHR::null(), |s| s.swapchain));

        // Distinct graphics and present families share images concurrently;
        // a single family keeps exclusive access
        swapchain_create_info = if physical.graphics_family == physical.present_family {
            swapchain_create_info.image_sharing_mode(vk::SharingMode::EXCLUSIVE)
        } else {
            swapchain_create_info
                .image_sharing_mode(vk::SharingMode::CONCURRENT)
                .queue_family_indices(&queue_family_indices)
        };

        let swapchain = unsafe {
            swapchain_loader
                .create_swapchain(&swapchain_create_info, None)
                .map_err(VulkanError::Api)?
        };

        let images = unsafe {
            swapchain_loader
                .get_swapchain_images(swapchain)
                .map_err(VulkanError::Api)?
        };

        let image_views: Result<Vec<_>, _> = images
            .iter()
            .map(|&image| {
                let create_info = vk::ImageViewCreateInfo::builder()
                    .image(image)
                    .view_type(vk::ImageViewType::TYPE_2D)
                    .format(surface_format.format)
                    .subresource_range(vk::ImageSubresourceRange {
                        aspect_mask: vk::ImageAspectFlags::COLOR,
                        base_mip_level: 0,
                        level_count: 1,
                        base_array_layer: 0,
                        layer_count: 1,
                    });

                unsafe { device.create_image_view(&create_info, None) }
            })
            .collect();
        let image_views = image_views.map_err(VulkanError::Api)?;

        let depth_format = context.find_depth_format()?;
        let render_pass =
            RenderPass::new_forward_pass(device.clone(), surface_format.format, depth_format)?;

        let depth_buffers: VulkanResult<Vec<_>> = images
            .iter()
            .map(|_| DepthBuffer::new(context, depth_format, extent))
            .collect();
        let depth_buffers = depth_buffers?;

        let framebuffers: VulkanResult<Vec<_>> = image_views
            .iter()
            .zip(depth_buffers.iter())
            .map(|(&color_view, depth)| {
                let attachments = [color_view, depth.image_view()];
                Framebuffer::new(device.clone(), render_pass.handle(), &attachments, extent)
            })
            .collect();
        let framebuffers = framebuffers?;

        let frame_sync: VulkanResult<Vec<_>> = (0..MAX_FRAMES_IN_FLIGHT)
            .map(|_| FrameSync::new(&device))
            .collect();
        let frame_sync = frame_sync?;

        let images_in_flight = ImageFenceTable::new(images.len());
        let image_count = images.len();

        log::debug!("Swapchain ready with {image_count} images, depth format {depth_format:?}");

        Ok(Self {
            device,
            swapchain_loader,
            swapchain,
            images,
            image_views,
            render_pass,
            depth_buffers,
            framebuffers,
            frame_sync,
            images_in_flight,
            surface_format,
            depth_format,
            extent,
            current_frame: 0,
        })
    }

    /// Acquire the next presentable image.
    ///
    /// Blocks until the current frame slot's previous submission finishes,
    /// then asks the presentation engine for an image, signaling the slot's
    /// image-available semaphore. Returns the image index and whether the
    /// swapchain is suboptimal for the surface;
    /// `VulkanError::Api(vk::Result::ERROR_OUT_OF_DATE_KHR)` means the
    /// swapchain must be rebuilt before any rendering.
    pub fn acquire_next_image(&mut self) -> VulkanResult<(u32, bool)> {
        let sync = &self.frame_sync[self.current_frame];
        sync.in_flight.wait(u64::MAX)?;

        unsafe {
            self.swapchain_loader
                .acquire_next_image(
                    self.swapchain,
                    u64::MAX,
                    sync.image_available.handle(),
                    vk::Fence::null(),
                )
                .map_err(VulkanError::Api)
        }
    }

    /// Submit a recorded command buffer for `image_index` and present it.
    ///
    /// Waits for whichever earlier frame last targeted this image, records
    /// the current frame's fence as its new guard, submits with the
    /// image-available/render-finished semaphore pair, presents, and advances
    /// the frame slot. The slot advances even when presentation reports the
    /// surface stale, so a rebuilt swapchain starts from a clean slot.
    ///
    /// Returns whether presentation reported the swapchain suboptimal.
    pub fn submit_command_buffers(
        &mut self,
        context: &VulkanContext,
        command_buffer: vk::CommandBuffer,
        image_index: u32,
    ) -> VulkanResult<bool> {
        let sync = &self.frame_sync[self.current_frame];

        if let Some(previous_fence) = self
            .images_in_flight
            .mark_in_use(image_index as usize, sync.in_flight.handle())
        {
            unsafe {
                self.device
                    .wait_for_fences(&[previous_fence], true, u64::MAX)
                    .map_err(VulkanError::Api)?;
            }
        }

        sync.in_flight.reset()?;

        let wait_semaphores = [sync.image_available.handle()];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let command_buffers = [command_buffer];
        let signal_semaphores = [sync.render_finished.handle()];

        let submit_info = vk::SubmitInfo::builder()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        unsafe {
            self.device
                .queue_submit(
                    context.graphics_queue(),
                    &[submit_info.build()],
                    sync.in_flight.handle(),
                )
                .map_err(VulkanError::Api)?;
        }

        let swapchains = [self.swapchain];
        let image_indices = [image_index];
        let present_info = vk::PresentInfoKHR::builder()
            .wait_semaphores(&signal_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        let present_result = unsafe {
            self.swapchain_loader
                .queue_present(context.present_queue(), &present_info)
        };

        self.current_frame = (self.current_frame + 1) % MAX_FRAMES_IN_FLIGHT;

        present_result.map_err(VulkanError::Api)
    }

    /// Whether a rebuilt swapchain kept the formats the render pass and
    /// pipelines were built against.
    pub fn compare_swap_formats(&self, other: &Swapchain) -> bool {
        formats_stable(
            (other.surface_format.format, other.depth_format),
            (self.surface_format.format, self.depth_format),
        )
    }

    /// Get swapchain extent
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    /// Width over height of the swapchain images
    pub fn aspect_ratio(&self) -> f32 {
        self.extent.width as f32 / self.extent.height as f32
    }

    /// Get surface format
    pub fn surface_format(&self) -> vk::SurfaceFormatKHR {
        self.surface_format
    }

    /// Get the render pass drawing into these images
    pub fn render_pass(&self) -> vk::RenderPass {
        self.render_pass.handle()
    }

    /// Get the framebuffer for an image index
    pub fn framebuffer(&self, image_index: u32) -> vk::Framebuffer {
        self.framebuffers[image_index as usize].handle()
    }

    /// Get image count
    pub fn image_count(&self) -> usize {
        self.images.len()
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        unsafe {
            for &image_view in &self.image_views {
                self.device.destroy_image_view(image_view, None);
            }

            self.swapchain_loader.destroy_swapchain(self.swapchain, None);
        }
        // Render pass, depth buffers, framebuffers, and sync objects clean up
        // through their own Drop impls
    }
}

/// Whether a rebuilt swapchain kept the (color, depth) format pair its
/// predecessor carried. A drift in either invalidates the long-lived render
/// pass and pipelines, which the renderer treats as fatal.
pub fn formats_stable(
    previous: (vk::Format, vk::Format),
    rebuilt: (vk::Format, vk::Format),
) -> bool {
    previous == rebuilt
}

/// Prefer B8G8R8A8 sRGB with a nonlinear sRGB color space, else take the
/// first format the surface offers.
pub fn choose_surface_format(formats: &[vk::SurfaceFormatKHR]) -> vk::SurfaceFormatKHR {
    formats
        .iter()
        .find(|sf| {
            sf.format == vk::Format::B8G8R8A8_SRGB
                && sf.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR
        })
        .copied()
        .unwrap_or(formats[0])
}

/// Use the preferred mode when the surface supports it, else FIFO, which
/// every conforming implementation provides.
pub fn choose_present_mode(
    available: &[vk::PresentModeKHR],
    preferred: vk::PresentModeKHR,
) -> vk::PresentModeKHR {
    available
        .iter()
        .copied()
        .find(|&mode| mode == preferred)
        .unwrap_or(vk::PresentModeKHR::FIFO)
}

/// Surface-dictated extent when fixed, otherwise the window extent clamped
/// to the surface bounds.
pub fn choose_extent(
    capabilities: &vk::SurfaceCapabilitiesKHR,
    window_extent: vk::Extent2D,
) -> vk::Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        capabilities.current_extent
    } else {
        vk::Extent2D {
            width: window_extent.width.clamp(
                capabilities.min_image_extent.width,
                capabilities.max_image_extent.width,
            ),
            height: window_extent.height.clamp(
                capabilities.min_image_extent.height,
                capabilities.max_image_extent.height,
            ),
        }
    }
}

/// One image above the minimum so acquisition rarely blocks, clamped to the
/// surface maximum when one exists (zero means unbounded).
pub fn choose_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let desired = capabilities.min_image_count + 1;
    if capabilities.max_image_count > 0 {
        desired.min(capabilities.max_image_count)
    } else {
        desired
    }
}

/// Map a configured preference onto the Vulkan present mode it names.
pub fn present_mode_from_preference(preference: PresentModePreference) -> vk::PresentModeKHR {
    match preference {
        PresentModePreference::Fifo => vk::PresentModeKHR::FIFO,
        PresentModePreference::Mailbox => vk::PresentModeKHR::MAILBOX,
        PresentModePreference::Immediate => vk::PresentModeKHR::IMMEDIATE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format(format: vk::Format, color_space: vk::ColorSpaceKHR) -> vk::SurfaceFormatKHR {
        vk::SurfaceFormatKHR {
            format,
            color_space,
        }
    }

    fn capabilities(
        min_count: u32,
        max_count: u32,
        current: vk::Extent2D,
        min_extent: vk::Extent2D,
        max_extent: vk::Extent2D,
    ) -> vk::SurfaceCapabilitiesKHR {
        vk::SurfaceCapabilitiesKHR {
            min_image_count: min_count,
            max_image_count: max_count,
            current_extent: current,
            min_image_extent: min_extent,
            max_image_extent: max_extent,
            ..Default::default()
        }
    }

    #[test]
    fn surface_format_prefers_bgra_srgb() {
        let formats = [
            format(vk::Format::R8G8B8A8_UNORM, vk::ColorSpaceKHR::SRGB_NONLINEAR),
            format(vk::Format::B8G8R8A8_SRGB, vk::ColorSpaceKHR::SRGB_NONLINEAR),
        ];
        let chosen = choose_surface_format(&formats);
        assert_eq!(chosen.format, vk::Format::B8G8R8A8_SRGB);
    }

    #[test]
    fn surface_format_falls_back_to_first() {
        let formats = [
            format(vk::Format::R8G8B8A8_UNORM, vk::ColorSpaceKHR::SRGB_NONLINEAR),
            format(vk::Format::R16G16B16A16_SFLOAT, vk::ColorSpaceKHR::SRGB_NONLINEAR),
        ];
        let chosen = choose_surface_format(&formats);
        assert_eq!(chosen.format, vk::Format::R8G8B8A8_UNORM);
    }

    #[test]
    fn srgb_format_with_wrong_color_space_is_not_preferred() {
        let formats = [
            format(vk::Format::R8G8B8A8_UNORM, vk::ColorSpaceKHR::SRGB_NONLINEAR),
            format(vk::Format::B8G8R8A8_SRGB, vk::ColorSpaceKHR::EXTENDED_SRGB_LINEAR_EXT),
        ];
        let chosen = choose_surface_format(&formats);
        assert_eq!(chosen.format, vk::Format::R8G8B8A8_UNORM);
    }

    #[test]
    fn present_mode_honors_supported_preference() {
        let available = [vk::PresentModeKHR::FIFO, vk::PresentModeKHR::MAILBOX];
        assert_eq!(
            choose_present_mode(&available, vk::PresentModeKHR::MAILBOX),
            vk::PresentModeKHR::MAILBOX
        );
    }

    #[test]
    fn present_mode_falls_back_to_fifo() {
        let available = [vk::PresentModeKHR::FIFO];
        assert_eq!(
            choose_present_mode(&available, vk::PresentModeKHR::IMMEDIATE),
            vk::PresentModeKHR::FIFO
        );
    }

    #[test]
    fn extent_uses_surface_dictated_size() {
        let caps = capabilities(
            2,
            0,
            vk::Extent2D { width: 640, height: 480 },
            vk::Extent2D { width: 1, height: 1 },
            vk::Extent2D { width: 4096, height: 4096 },
        );
        let extent = choose_extent(&caps, vk::Extent2D { width: 800, height: 600 });
        assert_eq!(extent.width, 640);
        assert_eq!(extent.height, 480);
    }

    #[test]
    fn extent_clamps_window_size_when_flexible() {
        let caps = capabilities(
            2,
            0,
            vk::Extent2D { width: u32::MAX, height: u32::MAX },
            vk::Extent2D { width: 100, height: 100 },
            vk::Extent2D { width: 1000, height: 1000 },
        );
        let extent = choose_extent(&caps, vk::Extent2D { width: 2000, height: 50 });
        assert_eq!(extent.width, 1000);
        assert_eq!(extent.height, 100);
    }

    #[test]
    fn image_count_is_min_plus_one() {
        let caps = capabilities(
            2,
            8,
            vk::Extent2D::default(),
            vk::Extent2D::default(),
            vk::Extent2D::default(),
        );
        assert_eq!(choose_image_count(&caps), 3);
    }

    #[test]
    fn image_count_respects_surface_maximum() {
        let caps = capabilities(
            3,
            3,
            vk::Extent2D::default(),
            vk::Extent2D::default(),
            vk::Extent2D::default(),
        );
        assert_eq!(choose_image_count(&caps), 3);
    }

    #[test]
    fn image_count_unbounded_when_max_is_zero() {
        let caps = capabilities(
            4,
            0,
            vk::Extent2D::default(),
            vk::Extent2D::default(),
            vk::Extent2D::default(),
        );
        assert_eq!(choose_image_count(&caps), 5);
    }

    #[test]
    fn unchanged_formats_are_stable() {
        let pair = (vk::Format::B8G8R8A8_SRGB, vk::Format::D32_SFLOAT);
        assert!(formats_stable(pair, pair));
    }

    #[test]
    fn color_format_drift_is_flagged() {
        assert!(!formats_stable(
            (vk::Format::B8G8R8A8_SRGB, vk::Format::D32_SFLOAT),
            (vk::Format::R8G8B8A8_UNORM, vk::Format::D32_SFLOAT),
        ));
    }

    #[test]
    fn depth_format_drift_is_flagged() {
        assert!(!formats_stable(
            (vk::Format::B8G8R8A8_SRGB, vk::Format::D32_SFLOAT),
            (vk::Format::B8G8R8A8_SRGB, vk::Format::D24_UNORM_S8_UINT),
        ));
    }

    #[test]
    fn preference_maps_onto_vulkan_modes() {
        assert_eq!(
            present_mode_from_preference(PresentModePreference::Fifo),
            vk::PresentModeKHR::FIFO
        );
        assert_eq!(
            present_mode_from_preference(PresentModePreference::Mailbox),
            vk::PresentModeKHR::MAILBOX
        );
        assert_eq!(
            present_mode_from_preference(PresentModePreference::Immediate),
            vk::PresentModeKHR::IMMEDIATE
        );
    }
}
