//! Demo application: one spinning cube

use std::rc::Rc;

use thiserror::Error;

use daisy_engine::config::{ConfigError, RendererConfig};
use daisy_engine::foundation::math::Vec3;
use daisy_engine::render::scene_draw::SceneDrawSystem;
use daisy_engine::render::vulkan::{Model, Renderer, VulkanContext, VulkanError};
use daisy_engine::render::window::{WindowError, WindowHandle};
use daisy_engine::scene::{GameObject, GameObjectWorld};

use crate::cube::cube_vertices;

/// Top-level application errors
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Window(#[from] WindowError),

    #[error(transparent)]
    Vulkan(#[from] VulkanError),
}

/// Owns the window, the rendering stack, and the scene.
///
/// Field order is drop order: scene resources release their GPU buffers
/// before the renderer and context tear the device down, and the window
/// outlives the surface.
pub struct App {
    objects: Vec<GameObject>,
    #[allow(dead_code)] // Retained so later spawns keep ids unique
    world: GameObjectWorld,
    draw_system: SceneDrawSystem,
    renderer: Renderer,
    context: VulkanContext,
    window: WindowHandle,
}

impl App {
    pub fn new() -> Result<Self, AppError> {
        let config = RendererConfig::load("daisy.toml")?;

        let mut window = WindowHandle::new(
            &config.window_title,
            config.window_width,
            config.window_height,
        )?;
        let context = VulkanContext::new(&mut window, &config.window_title)?;
        let renderer = Renderer::new(&context, &window, config.present_mode)?;
        let draw_system =
            SceneDrawSystem::new(&context, renderer.swapchain_render_pass(), &config)?;

        let mut world = GameObjectWorld::new();
        let objects = vec![spawn_cube(&mut world, &context)?];

        Ok(Self {
            objects,
            world,
            draw_system,
            renderer,
            context,
            window,
        })
    }

    /// Run the frame loop until the window closes.
    pub fn run(mut self) -> Result<(), AppError> {
        log::info!("Entering main loop");

        while !self.window.should_close() {
            self.window.poll_events();

            // None means the swapchain went stale and was rebuilt; skip this
            // iteration and acquire against the new chain
            if let Some(command_buffer) =
                self.renderer.begin_frame(&self.context, &mut self.window)?
            {
                self.renderer.begin_swapchain_render_pass(command_buffer);
                self.draw_system.render_game_objects(
                    &self.context,
                    command_buffer,
                    &mut self.objects,
                );
                self.renderer.end_swapchain_render_pass(command_buffer);
                self.renderer.end_frame(&self.context, &mut self.window)?;
            }
        }

        // Let in-flight frames drain before destructors run
        self.context.wait_idle()?;
        Ok(())
    }
}

fn spawn_cube(world: &mut GameObjectWorld, context: &VulkanContext) -> Result<GameObject, AppError> {
    let model = Rc::new(Model::new(context, &cube_vertices())?);

    let mut cube = world.spawn();
    cube.model = Some(model);
    cube.transform.translation = Vec3::new(0.0, 0.0, 0.5);
    cube.transform.scale = Vec3::new(0.5, 0.5, 0.5);

    Ok(cube)
}
