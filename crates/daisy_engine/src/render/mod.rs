//! Rendering layer: windowing, the Vulkan stack, and scene drawing

pub mod scene_draw;
pub mod vulkan;
pub mod window;
