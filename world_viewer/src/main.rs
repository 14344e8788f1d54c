//! World viewer
//!
//! Opens a window and renders either a glTF model or a cube with the
//! engine's frame loop. WASD moves, the right mouse button toggles mouse
//! look, escape quits.
//!
//! Usage: `world_viewer [config.toml|config.ron]` (defaults to `world.toml`)

use std::path::Path;
use std::rc::Rc;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use thiserror::Error;
use world_engine::assets::{load_model, AssetError, FileImageLoader};
use world_engine::core::config::{ApplicationConfig, Config, ConfigError};
use world_engine::foundation::logging::{self, LogHistory};
use world_engine::render::{FlyCamera, Renderer, VulkanContext, VulkanError, Window, WindowError};
use world_engine::scene::{GraphSource, MeshInput};

const DEFAULT_CONFIG_PATH: &str = "world.toml";

#[derive(Error, Debug)]
enum ViewerError {
    #[error("window: {0}")]
    Window(#[from] WindowError),

    #[error("vulkan: {0}")]
    Vulkan(#[from] VulkanError),

    #[error("asset: {0}")]
    Asset(#[from] AssetError),
}

/// `None` when the file does not exist
fn load_config(path: &str) -> Result<Option<ApplicationConfig>, ConfigError> {
    if !Path::new(path).exists() {
        return Ok(None);
    }
    let config = ApplicationConfig::load_from_file(path)?;
    config.validate()?;
    Ok(Some(config))
}

fn graph_source(config: &ApplicationConfig) -> Result<GraphSource, AssetError> {
    if config.graph.model_path.is_empty() {
        let mut cube = MeshInput::cube();
        if !config.graph.cube_texture.is_empty() {
            cube = cube.with_texture(config.graph.cube_texture.clone());
        }
        return Ok(GraphSource::Meshes(vec![cube]));
    }
    log::info!("Loading model {}", config.graph.model_path);
    load_model(&config.graph.model_path).map(GraphSource::Model)
}

fn run(config: &ApplicationConfig) -> Result<(), ViewerError> {
    let mut window = Window::new(&config.window)?;
    let context = Rc::new(VulkanContext::new(&mut window, &config.renderer)?);
    let mut renderer = Renderer::new(context, &window, &config.renderer)?;

    renderer.create_graph(graph_source(config)?, &FileImageLoader)?;

    let mut camera = FlyCamera::from_config(&config.camera);
    let mut last_frame = Instant::now();
    let mut fps_timer = Instant::now();
    let mut frames = 0u32;

    while !window.should_close() {
        window.poll_events();
        if window.input_mut().take_resized() {
            renderer.notify_resized();
        }

        let now = Instant::now();
        let delta = now.duration_since(last_frame).as_secs_f32();
        last_frame = now;
        window.input_mut().apply_to_camera(&mut camera, delta);

        renderer.draw_frame(&mut window, |uniform, extent| {
            camera.update_uniform(uniform, extent.width, extent.height);
        })?;

        frames += 1;
        let elapsed = fps_timer.elapsed().as_secs_f32();
        if elapsed >= 1.0 {
            window.set_title(&format!("{} - {:.0} fps", config.window.title, frames as f32 / elapsed));
            frames = 0;
            fps_timer = Instant::now();
        }
    }

    renderer.wait_idle()?;
    Ok(())
}

fn dump_history(history: &Arc<Mutex<LogHistory>>, path: &str) {
    let history = history.lock().unwrap_or_else(PoisonError::into_inner);
    match history.dump_to_file(path) {
        Ok(()) => eprintln!("Log written to {}", path),
        Err(e) => eprintln!("Failed to write log to {}: {}", path, e),
    }
}

fn main() {
    let config_path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    let loaded = load_config(&config_path);
    let capacity = match &loaded {
        Ok(Some(config)) => config.logger.capacity,
        _ => logging::DEFAULT_HISTORY_CAPACITY,
    };
    let history = logging::init_with_history(capacity);

    let mut config = match loaded {
        Ok(Some(config)) => {
            log::info!("Loaded configuration from {}", config_path);
            config
        }
        Ok(None) => {
            log::info!("No configuration at {}, using defaults", config_path);
            ApplicationConfig::default()
        }
        Err(e) => {
            log::error!("Invalid configuration {}: {}", config_path, e);
            std::process::exit(1);
        }
    };

    config.renderer.shaders = std::mem::take(&mut config.renderer.shaders).with_path_resolution();
    log::debug!("Shader directory: {}", config.renderer.shaders.path.display());

    let result = run(&config);
    if let Err(e) = &result {
        log::error!("Viewer failed: {}", e);
    }

    if config.logger.save_log {
        dump_history(&history, &config.logger.path);
    }

    if result.is_err() {
        std::process::exit(1);
    }
    log::info!("Viewer closed cleanly");
}
