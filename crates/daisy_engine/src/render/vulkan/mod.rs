//! Vulkan rendering stack
//!
//! Every module here follows the same ownership rule: a wrapper struct owns
//! its native handle, destroys it exactly once in `Drop`, and hands out raw
//! `vk` handles only as borrows.

pub mod buffer;
pub mod context;
pub mod framebuffer;
pub mod model;
pub mod pipeline;
pub mod render_pass;
pub mod renderer;
pub mod swapchain;
pub mod sync;

pub use buffer::Buffer;
pub use context::{
    LogicalDevice, PhysicalDeviceInfo, SwapchainSupport, VulkanContext, VulkanError,
    VulkanInstance, VulkanResult,
};
pub use framebuffer::{DepthBuffer, Framebuffer};
pub use model::{Model, Vertex};
pub use pipeline::{PipelineConfig, RenderPipeline, ShaderModule};
pub use render_pass::RenderPass;
pub use renderer::Renderer;
pub use swapchain::{Swapchain, MAX_FRAMES_IN_FLIGHT};
pub use sync::{Fence, FrameSync, ImageFenceTable, Semaphore};
