//! Daisy Engine - a minimal real-time rendering engine built on Vulkan
//!
//! The engine is split into a handful of layers:
//!
//! - [`foundation`]: logging and math primitives shared by everything above
//! - [`config`]: renderer configuration loaded from TOML
//! - [`render`]: windowing, the Vulkan device/swapchain/pipeline stack, and
//!   the frame renderer
//! - [`scene`]: game objects and their transforms
//!
//! GPU resources are owned by RAII wrappers that release their native handle
//! exactly once on drop; raw `vk` handles handed out by accessors are
//! borrows, never transfers of ownership. All FFI crossings live in the
//! wrappers, which uphold the handle-validity invariants the raw API cannot
//! express.

pub mod config;
pub mod foundation;
pub mod render;
pub mod scene;

pub use config::RendererConfig;
pub use render::vulkan::{VulkanContext, VulkanError, VulkanResult};
pub use render::window::{WindowError, WindowHandle};
