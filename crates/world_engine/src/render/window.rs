//! Window management using GLFW
//!
//! Provides the Vulkan-ready window and turns its events into camera input
//! and resize notifications for the renderer.

use std::collections::HashSet;
use thiserror::Error;

use crate::core::config::WindowConfig;
use crate::render::camera::{CameraMovement, FlyCamera};
use crate::render::renderer::FrameSizeSource;

/// Window management errors
#[derive(Error, Debug)]
pub enum WindowError {
    /// GLFW could not be initialised
    #[error("GLFW initialization failed")]
    InitializationFailed,

    /// The window could not be created
    #[error("Window creation failed")]
    CreationFailed,

    /// Any other GLFW failure
    #[error("GLFW error: {0}")]
    GlfwError(String),
}

/// Result type for window operations
pub type WindowResult<T> = Result<T, WindowError>;

/// Input gathered from one batch of window events
#[derive(Debug, Default)]
pub struct InputState {
    held: HashSet<CameraMovement>,
    mouse_look: bool,
    last_cursor: Option<(f64, f64)>,
    mouse_delta: (f32, f32),
    resized: bool,
    close_requested: bool,
}

fn movement_for(key: glfw::Key) -> Option<CameraMovement> {
    match key {
        glfw::Key::W => Some(CameraMovement::Forward),
        glfw::Key::S => Some(CameraMovement::Backward),
        glfw::Key::A => Some(CameraMovement::Left),
        glfw::Key::D => Some(CameraMovement::Right),
        _ => None,
    }
}

impl InputState {
    /// Fold one event into the state
    pub fn handle_event(&mut self, event: &glfw::WindowEvent) {
        match *event {
            glfw::WindowEvent::FramebufferSize(width, height) => {
                log::debug!("Framebuffer resized to {}x{}", width, height);
                self.resized = true;
            }
            glfw::WindowEvent::Key(glfw::Key::Escape, _, glfw::Action::Press, _) | glfw::WindowEvent::Close => {
                self.close_requested = true;
            }
            glfw::WindowEvent::Key(key, _, action, _) => {
                if let Some(movement) = movement_for(key) {
                    match action {
                        glfw::Action::Press | glfw::Action::Repeat => {
                            self.held.insert(movement);
                        }
                        glfw::Action::Release => {
                            self.held.remove(&movement);
                        }
                    }
                }
            }
            glfw::WindowEvent::MouseButton(glfw::MouseButton::Button2, glfw::Action::Press, _) => {
                self.mouse_look = !self.mouse_look;
                self.last_cursor = None;
            }
            glfw::WindowEvent::CursorPos(x, y) => {
                if self.mouse_look {
                    if let Some((last_x, last_y)) = self.last_cursor {
                        // Screen y grows downwards
                        self.mouse_delta.0 += (x - last_x) as f32;
                        self.mouse_delta.1 += (last_y - y) as f32;
                    }
                    self.last_cursor = Some((x, y));
                }
            }
            _ => {}
        }
    }

    /// Whether mouse look is active
    pub fn mouse_look(&self) -> bool {
        self.mouse_look
    }

    /// Whether a movement key is held
    pub fn is_held(&self, movement: CameraMovement) -> bool {
        self.held.contains(&movement)
    }

    /// Take the resize notification, clearing it
    pub fn take_resized(&mut self) -> bool {
        std::mem::take(&mut self.resized)
    }

    /// Whether escape or the close button was pressed
    pub fn close_requested(&self) -> bool {
        self.close_requested
    }

    /// Move and turn the camera with everything gathered since the last call
    pub fn apply_to_camera(&mut self, camera: &mut FlyCamera, delta_seconds: f32) {
        for &movement in &self.held {
            camera.process_movement(movement, delta_seconds);
        }
        let (dx, dy) = std::mem::take(&mut self.mouse_delta);
        if dx != 0.0 || dy != 0.0 {
            camera.process_mouse(dx, dy);
        }
    }
}

/// GLFW window wrapper with proper resource management
pub struct Window {
    glfw: glfw::Glfw,
    window: glfw::PWindow,
    events: glfw::GlfwReceiver<(f64, glfw::WindowEvent)>,
    input: InputState,
}

impl Window {
    /// Create a window without a client API, ready for a Vulkan surface
    pub fn new(config: &WindowConfig) -> WindowResult<Self> {
        let mut glfw = glfw::init(glfw::fail_on_errors).map_err(|_| WindowError::InitializationFailed)?;

        if !glfw.vulkan_supported() {
            return Err(WindowError::GlfwError("Vulkan is not supported by GLFW".to_string()));
        }

        glfw.window_hint(glfw::WindowHint::ClientApi(glfw::ClientApiHint::NoApi));
        glfw.window_hint(glfw::WindowHint::Resizable(config.resizable));

        let (mut window, events) = glfw
            .create_window(config.width, config.height, &config.title, glfw::WindowMode::Windowed)
            .ok_or(WindowError::CreationFailed)?;

        window.set_key_polling(true);
        window.set_close_polling(true);
        window.set_framebuffer_size_polling(true);
        window.set_mouse_button_polling(true);
        window.set_cursor_pos_polling(true);

        log::info!("Window created: {} ({}x{})", config.title, config.width, config.height);
        Ok(Self {
            glfw,
            window,
            events,
            input: InputState::default(),
        })
    }

    /// Whether the window was asked to close
    pub fn should_close(&self) -> bool {
        self.window.should_close()
    }

    /// Poll GLFW and fold the queued events into the input state
    pub fn poll_events(&mut self) {
        self.glfw.poll_events();
        let was_looking = self.input.mouse_look();
        for (_, event) in glfw::flush_messages(&self.events) {
            self.input.handle_event(&event);
        }

        if self.input.close_requested() {
            self.window.set_should_close(true);
        }
        if self.input.mouse_look() != was_looking {
            let mode = if self.input.mouse_look() {
                glfw::CursorMode::Disabled
            } else {
                glfw::CursorMode::Normal
            };
            self.window.set_cursor_mode(mode);
        }
    }

    /// Input gathered by [`poll_events`](Self::poll_events)
    pub fn input_mut(&mut self) -> &mut InputState {
        &mut self.input
    }

    /// Window size in screen coordinates
    pub fn get_size(&self) -> (u32, u32) {
        let (width, height) = self.window.get_size();
        (width.max(0) as u32, height.max(0) as u32)
    }

    /// Change the title bar text
    pub fn set_title(&mut self, title: &str) {
        self.window.set_title(title);
    }

    /// Get required Vulkan instance extensions from GLFW
    pub fn required_instance_extensions(&self) -> WindowResult<Vec<String>> {
        self.glfw
            .get_required_instance_extensions()
            .ok_or_else(|| WindowError::GlfwError("Failed to get required extensions".to_string()))
    }

    /// Create Vulkan surface using GLFW's built-in functionality
    pub fn create_vulkan_surface(&mut self, instance: ash::vk::Instance) -> WindowResult<ash::vk::SurfaceKHR> {
        let mut surface = ash::vk::SurfaceKHR::null();
        let result = self.window.create_window_surface(instance, std::ptr::null(), &mut surface);

        if result == ash::vk::Result::SUCCESS {
            Ok(surface)
        } else {
            Err(WindowError::GlfwError(format!("Failed to create Vulkan surface: {result:?}")))
        }
    }
}

impl FrameSizeSource for Window {
    fn framebuffer_size(&self) -> (u32, u32) {
        let (width, height) = self.window.get_framebuffer_size();
        (width.max(0) as u32, height.max(0) as u32)
    }

    fn wait_events(&mut self) {
        self.glfw.wait_events();
        for (_, event) in glfw::flush_messages(&self.events) {
            self.input.handle_event(&event);
        }
    }
}
