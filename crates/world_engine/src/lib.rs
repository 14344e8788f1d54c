//! # World Engine
//!
//! A Vulkan scene renderer: loads a glTF model or a set of meshes into a
//! graph, then draws it through a synchronized frame loop that survives
//! window resizes and minimization.
//!
//! ## Features
//!
//! - **Resource lifecycle**: every GPU object has one owner and one destroy path
//! - **Scene graph**: node hierarchy, per-image uniforms and descriptor sets
//! - **Frame loop**: frames in flight, swap chain recreation, overlay hook
//! - **Asset loading**: glTF models and PNG/JPEG textures
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::rc::Rc;
//! use world_engine::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ApplicationConfig::default();
//!     let mut window = Window::new(&config.window)?;
//!     let context = Rc::new(VulkanContext::new(&mut window, &config.renderer)?);
//!     let mut renderer = Renderer::new(context, &window, &config.renderer)?;
//!
//!     let source = GraphSource::Meshes(vec![MeshInput::cube()]);
//!     renderer.create_graph(source, &FileImageLoader)?;
//!
//!     let camera = FlyCamera::default();
//!     while !window.should_close() {
//!         window.poll_events();
//!         renderer.draw_frame(&mut window, |uniform, extent| {
//!             camera.update_uniform(uniform, extent.width, extent.height);
//!         })?;
//!     }
//!     renderer.wait_idle()?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod core;
pub mod config;
pub mod foundation;

pub mod assets;
pub mod render;
pub mod scene;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        assets::{load_model, FileImageLoader, ImageLoader},
        core::config::{ApplicationConfig, CameraConfig, Config, RendererConfig, WindowConfig},
        foundation::math::{Mat4, Vec3},
        render::{
            CameraMovement, FlyCamera, FrameOutcome, Renderer, UiOverlay, VulkanContext, Window,
        },
        scene::{CameraUniform, Graph, GraphSource, MeshInput},
    };
}
