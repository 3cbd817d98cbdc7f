//! Window management using GLFW
//!
//! Provides cross-platform window creation and event handling for Vulkan.
//! The renderer only ever sees this wrapper: framebuffer extent queries,
//! the resize flag, and surface creation all go through it.

use ash::vk;
use thiserror::Error;

/// Window management errors
#[derive(Error, Debug)]
pub enum WindowError {
    /// GLFW library failed to initialize
    #[error("GLFW initialization failed")]
    InitializationFailed,

    /// GLFW could not create the window
    #[error("Window creation failed")]
    CreationFailed,

    /// Any other GLFW failure
    #[error("GLFW error: {0}")]
    GlfwError(String),
}

/// Result alias for window operations
pub type WindowResult<T> = Result<T, WindowError>;

/// GLFW window wrapper with resize tracking
pub struct WindowHandle {
    glfw: glfw::Glfw,
    window: glfw::PWindow,
    events: glfw::GlfwReceiver<(f64, glfw::WindowEvent)>,
    framebuffer_resized: bool,
}

impl WindowHandle {
    /// Create a resizable window with no client API context.
    pub fn new(title: &str, width: u32, height: u32) -> WindowResult<Self> {
        let mut glfw = glfw::init(glfw::fail_on_errors)
            .map_err(|_| WindowError::InitializationFailed)?;

        // No OpenGL context; Vulkan drives the surface
        glfw.window_hint(glfw::WindowHint::ClientApi(glfw::ClientApiHint::NoApi));
        glfw.window_hint(glfw::WindowHint::Resizable(true));

        let (mut window, events) = glfw
            .create_window(width, height, title, glfw::WindowMode::Windowed)
            .ok_or(WindowError::CreationFailed)?;

        window.set_close_polling(true);
        window.set_framebuffer_size_polling(true);

        Ok(Self {
            glfw,
            window,
            events,
            framebuffer_resized: false,
        })
    }

    /// Whether the user has requested the window to close.
    pub fn should_close(&self) -> bool {
        self.window.should_close()
    }

    /// Process pending events without blocking.
    pub fn poll_events(&mut self) {
        self.glfw.poll_events();
        self.drain_events();
    }

    /// Block until at least one event arrives, then process pending events.
    ///
    /// Used while the window is minimized: the renderer cannot make progress
    /// on a zero-extent framebuffer, so it sleeps until the window changes.
    pub fn wait_events(&mut self) {
        self.glfw.wait_events();
        self.drain_events();
    }

    fn drain_events(&mut self) {
        for (_, event) in glfw::flush_messages(&self.events) {
            if let glfw::WindowEvent::FramebufferSize(_, _) = event {
                self.framebuffer_resized = true;
            }
        }
    }

    /// Current framebuffer extent in pixels. Either dimension may be zero
    /// while the window is minimized.
    pub fn framebuffer_extent(&self) -> vk::Extent2D {
        let (width, height) = self.window.get_framebuffer_size();
        vk::Extent2D {
            width: width as u32,
            height: height as u32,
        }
    }

    /// Whether the framebuffer was resized since the flag was last reset.
    pub fn was_resized(&self) -> bool {
        self.framebuffer_resized
    }

    /// Reset the resize flag after the renderer has handled the resize.
    pub fn reset_resized_flag(&mut self) {
        self.framebuffer_resized = false;
    }

    /// Get required Vulkan instance extensions from GLFW
    pub fn required_instance_extensions(&self) -> WindowResult<Vec<String>> {
        self.glfw
            .get_required_instance_extensions()
            .ok_or_else(|| WindowError::GlfwError("Failed to get required extensions".to_string()))
    }

    /// Create a Vulkan surface using GLFW's built-in functionality
    pub fn create_surface(&mut self, instance: vk::Instance) -> WindowResult<vk::SurfaceKHR> {
        let mut surface = vk::SurfaceKHR::null();
        let result = self
            .window
            .create_window_surface(instance, std::ptr::null(), &mut surface);

        if result == vk::Result::SUCCESS {
            Ok(surface)
        } else {
            Err(WindowError::GlfwError(format!(
                "Failed to create Vulkan surface: {result:?}"
            )))
        }
    }
}
