//! Frame renderer
//!
//! Drives the per-frame protocol: acquire an image, record into the frame
//! slot's command buffer, submit and present, and rebuild the swapchain when
//! the surface goes stale. Lifecycle misuse (ending a frame that never
//! began, recording outside a frame) is a programming error and asserts.

use ash::{vk, Device};

use crate::config::PresentModePreference;
use crate::render::vulkan::swapchain::{present_mode_from_preference, MAX_FRAMES_IN_FLIGHT};
use crate::render::vulkan::{Swapchain, VulkanContext, VulkanError, VulkanResult};
use crate::render::window::WindowHandle;

/// Background clear color, a dark blue
const CLEAR_COLOR: [f32; 4] = [0.01, 0.01, 0.1, 1.0];

/// Tracks where the renderer is inside the frame lifecycle.
///
/// Pure state so the transitions are testable without a device: `begin`
/// latches the acquired image, `end` releases it and advances the
/// frame-in-flight slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct FrameState {
    image_index: u32,
    frame_index: usize,
    in_progress: bool,
}

impl FrameState {
    fn begin(&mut self, image_index: u32) {
        assert!(
            !self.in_progress,
            "begin_frame called while a frame is already in progress"
        );
        self.image_index = image_index;
        self.in_progress = true;
    }

    fn end(&mut self) {
        assert!(self.in_progress, "end_frame called with no frame in progress");
        self.in_progress = false;
        self.frame_index = (self.frame_index + 1) % MAX_FRAMES_IN_FLIGHT;
    }
}

/// Owns the swapchain and per-frame command buffers, and runs the
/// begin/record/end frame protocol.
pub struct Renderer {
    device: Device,
    command_pool: vk::CommandPool,
    command_buffers: Vec<vk::CommandBuffer>,
    swapchain: Swapchain,
    state: FrameState,
    preferred_present_mode: vk::PresentModeKHR,
}

impl Renderer {
    /// Create a renderer for the window.
    pub fn new(
        context: &VulkanContext,
        window: &WindowHandle,
        present_mode: PresentModePreference,
    ) -> VulkanResult<Self> {
        let preferred_present_mode = present_mode_from_preference(present_mode);
        let swapchain = Swapchain::new(
            context,
            window.framebuffer_extent(),
            preferred_present_mode,
            None,
        )?;

        let command_buffers = context.allocate_command_buffers(MAX_FRAMES_IN_FLIGHT as u32)?;

        Ok(Self {
            device: context.raw_device(),
            command_pool: context.command_pool(),
            command_buffers,
            swapchain,
            state: FrameState::default(),
            preferred_present_mode,
        })
    }

    /// Width over height of the current swapchain images
    pub fn aspect_ratio(&self) -> f32 {
        self.swapchain.aspect_ratio()
    }

    /// The render pass compatible with pipelines drawing into the swapchain
    pub fn swapchain_render_pass(&self) -> vk::RenderPass {
        self.swapchain.render_pass()
    }

    /// Whether a frame is currently being recorded
    pub fn is_frame_in_progress(&self) -> bool {
        self.state.in_progress
    }

    /// Command buffer for the frame being recorded
    pub fn current_command_buffer(&self) -> vk::CommandBuffer {
        assert!(
            self.state.in_progress,
            "Cannot get command buffer when no frame is in progress"
        );
        self.command_buffers[self.state.frame_index]
    }

    /// Begin a frame: acquire an image and start recording.
    ///
    /// Returns `None` when the swapchain was out of date and has been
    /// rebuilt; the caller skips rendering this iteration and tries again.
    pub fn begin_frame(
        &mut self,
        context: &VulkanContext,
        window: &mut WindowHandle,
    ) -> VulkanResult<Option<vk::CommandBuffer>> {
        assert!(
            !self.state.in_progress,
            "begin_frame called while a frame is already in progress"
        );

        let image_index = match self.swapchain.acquire_next_image() {
            Ok((image_index, _suboptimal)) => image_index,
            Err(VulkanError::Api(vk::Result::ERROR_OUT_OF_DATE_KHR)) => {
                self.recreate_swapchain(context, window)?;
                return Ok(None);
            }
            Err(err) => return Err(err),
        };

        self.state.begin(image_index);

        let command_buffer = self.current_command_buffer();
        let begin_info = vk::CommandBufferBeginInfo::builder();

        unsafe {
            self.device
                .begin_command_buffer(command_buffer, &begin_info)
                .map_err(VulkanError::Api)?;
        }

        Ok(Some(command_buffer))
    }

    /// End the frame: submit, present, and rebuild the swapchain when the
    /// surface reports stale or the window was resized.
    pub fn end_frame(
        &mut self,
        context: &VulkanContext,
        window: &mut WindowHandle,
    ) -> VulkanResult<()> {
        let command_buffer = self.current_command_buffer();

        unsafe {
            self.device
                .end_command_buffer(command_buffer)
                .map_err(VulkanError::Api)?;
        }

        let needs_rebuild = match self.swapchain.submit_command_buffers(
            context,
            command_buffer,
            self.state.image_index,
        ) {
            Ok(suboptimal) => suboptimal || window.was_resized(),
            Err(VulkanError::Api(vk::Result::ERROR_OUT_OF_DATE_KHR)) => true,
            Err(err) => return Err(err),
        };

        if needs_rebuild {
            window.reset_resized_flag();
            self.recreate_swapchain(context, window)?;
        }

        self.state.end();
        Ok(())
    }

    /// Begin the swapchain render pass on the current command buffer and set
    /// the full-extent viewport and scissor.
    pub fn begin_swapchain_render_pass(&self, command_buffer: vk::CommandBuffer) {
        assert!(
            self.state.in_progress,
            "Cannot begin render pass when no frame is in progress"
        );
        assert!(
            command_buffer == self.current_command_buffer(),
            "Cannot begin render pass on a command buffer from a different frame"
        );

        let extent = self.swapchain.extent();

        let clear_values = [
            vk::ClearValue {
                color: vk::ClearColorValue {
                    float32: CLEAR_COLOR,
                },
            },
            vk::ClearValue {
                depth_stencil: vk::ClearDepthStencilValue {
                    depth: 1.0,
                    stencil: 0,
                },
            },
        ];

        let render_pass_begin = vk::RenderPassBeginInfo::builder()
            .render_pass(self.swapchain.render_pass())
            .framebuffer(self.swapchain.framebuffer(self.state.image_index))
            .render_area(vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent,
            })
            .clear_values(&clear_values);

        let viewport = vk::Viewport {
            x: 0.0,
            y: 0.0,
            width: extent.width as f32,
            height: extent.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        };

        let scissor = vk::Rect2D {
            offset: vk::Offset2D { x: 0, y: 0 },
            extent,
        };

        unsafe {
            self.device.cmd_begin_render_pass(
                command_buffer,
                &render_pass_begin,
                vk::SubpassContents::INLINE,
            );
            self.device.cmd_set_viewport(command_buffer, 0, &[viewport]);
            self.device.cmd_set_scissor(command_buffer, 0, &[scissor]);
        }
    }

    /// End the swapchain render pass on the current command buffer.
    pub fn end_swapchain_render_pass(&self, command_buffer: vk::CommandBuffer) {
        assert!(
            self.state.in_progress,
            "Cannot end render pass when no frame is in progress"
        );
        assert!(
            command_buffer == self.current_command_buffer(),
            "Cannot end render pass on a command buffer from a different frame"
        );

        unsafe {
            self.device.cmd_end_render_pass(command_buffer);
        }
    }

    /// Rebuild the swapchain for the current framebuffer extent.
    ///
    /// Blocks while the window is minimized, then waits for the device to
    /// idle before replacing the chain. A rebuild that changes the color or
    /// depth format is fatal: the render pass and pipelines were built
    /// against the old formats.
    fn recreate_swapchain(
        &mut self,
        context: &VulkanContext,
        window: &mut WindowHandle,
    ) -> VulkanResult<()> {
        let extent = wait_for_nonzero_extent(window.framebuffer_extent(), || {
            window.wait_events();
            window.framebuffer_extent()
        });

        context.wait_idle()?;

        let new_swapchain = Swapchain::new(
            context,
            extent,
            self.preferred_present_mode,
            Some(&self.swapchain),
        )?;

        if !new_swapchain.compare_swap_formats(&self.swapchain) {
            return Err(VulkanError::SwapchainFormatChanged);
        }

        log::info!(
            "Swapchain rebuilt at {}x{}",
            extent.width,
            extent.height
        );

        self.swapchain = new_swapchain;
        Ok(())
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        unsafe {
            self.device
                .free_command_buffers(self.command_pool, &self.command_buffers);
        }
    }
}

/// Loop until the extent has nonzero area, pulling a fresh extent from
/// `wait` each iteration. Factored out of the rebuild path so the
/// minimized-window behavior is testable without a window.
fn wait_for_nonzero_extent(
    initial: vk::Extent2D,
    mut wait: impl FnMut() -> vk::Extent2D,
) -> vk::Extent2D {
    let mut extent = initial;
    while extent.width == 0 || extent.height == 0 {
        extent = wait();
    }
    extent
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::scene_draw::{record_objects, ObjectRecorder, Renderable};

    struct CubeStub {
        animated: bool,
    }

    impl Renderable for CubeStub {
        fn animate(&mut self) {
            self.animated = true;
        }

        fn mesh_vertices(&self) -> Option<u32> {
            Some(36)
        }
    }

    #[derive(Default)]
    struct CountingRecorder {
        binds: usize,
        draws: Vec<u32>,
    }

    impl ObjectRecorder<CubeStub> for CountingRecorder {
        fn bind_pipeline(&mut self) {
            self.binds += 1;
        }

        fn draw(&mut self, object: &CubeStub) {
            self.draws.push(object.mesh_vertices().unwrap_or(0));
        }
    }

    #[test]
    fn frame_cycle_draws_cube_once_and_returns_to_idle() {
        let mut state = FrameState::default();
        let mut recorder = CountingRecorder::default();
        let mut scene = [CubeStub { animated: false }];

        state.begin(0);
        record_objects(&mut recorder, &mut scene);
        state.end();

        assert_eq!(recorder.binds, 1);
        assert_eq!(recorder.draws, vec![36]);
        assert!(scene[0].animated);
        assert!(!state.in_progress);
        assert_eq!(state.frame_index, 1);
    }

    #[test]
    fn frame_state_starts_idle() {
        let state = FrameState::default();
        assert!(!state.in_progress);
        assert_eq!(state.frame_index, 0);
    }

    #[test]
    fn frame_state_cycles_through_in_flight_slots() {
        let mut state = FrameState::default();

        state.begin(2);
        assert!(state.in_progress);
        assert_eq!(state.image_index, 2);
        state.end();
        assert_eq!(state.frame_index, 1);

        state.begin(0);
        state.end();
        assert_eq!(state.frame_index, 0);
        assert!(!state.in_progress);
    }

    #[test]
    #[should_panic(expected = "already in progress")]
    fn frame_state_rejects_double_begin() {
        let mut state = FrameState::default();
        state.begin(0);
        state.begin(1);
    }

    #[test]
    #[should_panic(expected = "no frame in progress")]
    fn frame_state_rejects_end_without_begin() {
        let mut state = FrameState::default();
        state.end();
    }

    #[test]
    fn nonzero_extent_passes_through() {
        let extent = wait_for_nonzero_extent(
            vk::Extent2D {
                width: 800,
                height: 600,
            },
            || panic!("should not wait when extent is already valid"),
        );
        assert_eq!(extent.width, 800);
        assert_eq!(extent.height, 600);
    }

    #[test]
    fn zero_extent_waits_until_restored() {
        let sizes = [
            vk::Extent2D { width: 0, height: 0 },
            vk::Extent2D { width: 0, height: 600 },
            vk::Extent2D { width: 1024, height: 768 },
        ];
        let mut calls = 0;

        let extent = wait_for_nonzero_extent(vk::Extent2D { width: 800, height: 0 }, || {
            let next = sizes[calls];
            calls += 1;
            next
        });

        assert_eq!(calls, 3);
        assert_eq!(extent.width, 1024);
        assert_eq!(extent.height, 768);
    }
}
