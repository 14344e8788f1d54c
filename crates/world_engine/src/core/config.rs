//! # Application Configuration
//!
//! All configuration structures for the viewer and the engine subsystems it
//! drives: window, renderer, graph source, camera and logger. Every struct is
//! serializable through the [`Config`] trait (TOML or RON) and falls back to
//! defaults for missing fields.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub use crate::config::{Config, ConfigError};

/// Largest supported number of frames in flight
pub const MAX_FRAMES_IN_FLIGHT_LIMIT: usize = 8;

/// Shader stage of a SPIR-V module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShaderKind {
    /// Vertex stage
    Vertex,
    /// Fragment stage
    Fragment,
    /// Geometry stage
    Geometry,
}

/// # Shader Sources
///
/// Parallel lists of shader stages and SPIR-V file names, resolved against
/// a directory. Entry `i` of `types` describes file `i` of `names`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShaderSourceDetails {
    /// Stage of each module
    pub types: Vec<ShaderKind>,
    /// File name of each module
    pub names: Vec<String>,
    /// Directory holding the compiled modules
    pub path: PathBuf,
}

impl ShaderSourceDetails {
    /// Create shader details for the given stages and files
    pub fn new(types: Vec<ShaderKind>, names: Vec<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            types,
            names,
            path: path.into(),
        }
    }

    /// Check that at least one module is listed and the lists line up
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.names.is_empty() {
            return Err(ConfigError::Invalid("no shader modules listed".to_string()));
        }
        if self.types.len() != self.names.len() {
            return Err(ConfigError::Invalid(format!(
                "{} shader types for {} shader files",
                self.types.len(),
                self.names.len()
            )));
        }
        Ok(())
    }

    /// Stage and full path of every module
    pub fn resolve(&self) -> Result<Vec<(ShaderKind, PathBuf)>, ConfigError> {
        self.validate()?;
        Ok(self
            .types
            .iter()
            .zip(&self.names)
            .map(|(kind, name)| (*kind, self.path.join(name)))
            .collect())
    }

    /// Look for the shader directory in the usual places relative to the
    /// working directory, keeping the configured path when nothing matches
    pub fn with_path_resolution(mut self) -> Self {
        if self.path.is_dir() {
            return self;
        }
        let candidates = ["target/shaders", "shaders", "resources/shaders", "../target/shaders"];
        if let Some(dir) = candidates.iter().map(Path::new).find(|dir| {
            self.names.first().is_some_and(|name| dir.join(name).exists())
        }) {
            self.path = dir.to_path_buf();
        }
        self
    }
}

impl Default for ShaderSourceDetails {
    fn default() -> Self {
        Self::new(
            vec![ShaderKind::Vertex, ShaderKind::Fragment],
            vec!["scene.vert.spv".to_string(), "scene.frag.spv".to_string()],
            "target/shaders",
        )
    }
}

/// Window creation settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Title bar text
    pub title: String,
    /// Initial width in screen coordinates
    pub width: u32,
    /// Initial height in screen coordinates
    pub height: u32,
    /// Whether the user can resize the window
    pub resizable: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "World Viewer".to_string(),
            width: 800,
            height: 600,
            resizable: true,
        }
    }
}

impl WindowConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::Invalid("window size must be non-zero".to_string()));
        }
        Ok(())
    }
}

/// # Renderer Configuration
///
/// Instance metadata, frame pacing and attachment setup of the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Application name for Vulkan instance creation
    pub application_name: String,
    /// Whether to enable validation layers and the debug messenger
    pub enable_validation: bool,
    /// Number of frames the CPU may record ahead of the GPU
    pub max_frames_in_flight: usize,
    /// Clear color of the color attachment
    pub clear_color: [f32; 4],
    /// Create and test against a depth attachment
    pub enable_depth: bool,
    /// Render into a multisampled color attachment and resolve
    pub enable_msaa: bool,
    /// Compiled shader modules
    pub shaders: ShaderSourceDetails,
}

impl RendererConfig {
    /// Create a renderer configuration with defaults
    pub fn new(application_name: impl Into<String>) -> Self {
        Self {
            application_name: application_name.into(),
            enable_validation: cfg!(debug_assertions),
            max_frames_in_flight: 2,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            enable_depth: true,
            enable_msaa: false,
            shaders: ShaderSourceDetails::default(),
        }
    }

    /// Set maximum frames in flight
    pub fn with_max_frames_in_flight(mut self, frames: usize) -> Self {
        self.max_frames_in_flight = frames;
        self
    }

    /// Enable or disable the depth attachment
    pub fn with_depth(mut self, enabled: bool) -> Self {
        self.enable_depth = enabled;
        self
    }

    /// Enable or disable multisampling
    pub fn with_msaa(mut self, enabled: bool) -> Self {
        self.enable_msaa = enabled;
        self
    }

    /// Set custom shader sources
    pub fn with_shaders(mut self, shaders: ShaderSourceDetails) -> Self {
        self.shaders = shaders;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.application_name.is_empty() {
            return Err(ConfigError::Invalid("application name cannot be empty".to_string()));
        }
        if self.max_frames_in_flight == 0 || self.max_frames_in_flight > MAX_FRAMES_IN_FLIGHT_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "max frames in flight must be within 1..={MAX_FRAMES_IN_FLIGHT_LIMIT}, got {}",
                self.max_frames_in_flight
            )));
        }
        self.shaders.validate()
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self::new("World Viewer")
    }
}

/// Which geometry the viewer loads into its graph
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Path to a `.gltf` or `.glb` file; empty selects the built-in cube
    pub model_path: String,
    /// Base-color texture for the built-in cube; empty leaves it untextured
    pub cube_texture: String,
}

impl GraphConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model_path.is_empty() {
            return Ok(());
        }
        let extension = Path::new(&self.model_path)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("gltf" | "glb") => Ok(()),
            _ => Err(ConfigError::Invalid(format!("unsupported model file: {}", self.model_path))),
        }
    }
}

/// Fly camera settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Initial eye position
    pub position: [f32; 3],
    /// World up direction
    pub up: [f32; 3],
    /// Movement speed in units per second
    pub speed: f32,
    /// Degrees of rotation per pixel of mouse movement
    pub sensitivity: f32,
    /// Vertical field of view
    pub fov_degrees: f32,
    /// Near clip plane
    pub near: f32,
    /// Far clip plane
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [2.0, 2.0, 2.0],
            up: [0.0, 1.0, 0.0],
            speed: 5.0,
            sensitivity: 0.1,
            fov_degrees: 60.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

impl CameraConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.near <= 0.0 || self.far <= self.near {
            return Err(ConfigError::Invalid(format!(
                "clip planes must satisfy 0 < near < far, got {} and {}",
                self.near, self.far
            )));
        }
        if self.fov_degrees <= 0.0 || self.fov_degrees >= 180.0 {
            return Err(ConfigError::Invalid(format!("field of view out of range: {}", self.fov_degrees)));
        }
        Ok(())
    }
}

/// Log history settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Where the history is written on exit
    pub path: String,
    /// Whether to write the history on exit
    pub save_log: bool,
    /// Number of messages kept in memory
    pub capacity: usize,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            path: "world.log".to_string(),
            save_log: false,
            capacity: crate::foundation::logging::DEFAULT_HISTORY_CAPACITY,
        }
    }
}

/// # Complete Application Configuration
///
/// Top-level configuration that encompasses all subsystems.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    /// Window settings
    pub window: WindowConfig,
    /// Renderer settings
    pub renderer: RendererConfig,
    /// Graph source
    pub graph: GraphConfig,
    /// Camera settings
    pub camera: CameraConfig,
    /// Logger settings
    pub logger: LoggerConfig,
}

impl ApplicationConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.window.validate()?;
        self.renderer.validate()?;
        self.graph.validate()?;
        self.camera.validate()?;
        if self.logger.capacity == 0 {
            return Err(ConfigError::Invalid("log capacity must be at least 1".to_string()));
        }
        Ok(())
    }
}

impl Config for ApplicationConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("world_engine_{}_{name}", std::process::id()))
    }

    #[test]
    fn test_defaults() {
        let config = ApplicationConfig::default();
        assert_eq!(config.window.width, 800);
        assert_eq!(config.window.height, 600);
        assert_eq!(config.renderer.max_frames_in_flight, 2);
        assert!(config.renderer.enable_depth);
        assert!(!config.renderer.enable_msaa);
        assert_eq!(config.camera.position, [2.0, 2.0, 2.0]);
        assert_eq!(config.logger.path, "world.log");
        assert_eq!(config.logger.capacity, 2000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = ApplicationConfig::default();
        config.renderer.enable_msaa = true;
        config.renderer.clear_color = [0.1, 0.2, 0.3, 1.0];
        config.graph.model_path = "models/box.gltf".to_string();

        let path = temp_path("config.toml");
        config.save_to_file(&path).unwrap();
        let loaded = ApplicationConfig::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_ron_round_trip() {
        let mut config = ApplicationConfig::default();
        config.camera.speed = 12.5;
        config.logger.save_log = true;

        let path = temp_path("config.ron");
        config.save_to_file(&path).unwrap();
        let loaded = ApplicationConfig::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ApplicationConfig = toml::from_str("[window]\nwidth = 1024\n").unwrap();
        assert_eq!(config.window.width, 1024);
        assert_eq!(config.window.height, 600);
        assert_eq!(config.renderer.max_frames_in_flight, 2);
    }

    #[test]
    fn test_unsupported_extension() {
        let result = ApplicationConfig::default().save_to_file(temp_path("config.json"));
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_shader_details_validation() {
        let empty = ShaderSourceDetails::new(vec![], vec![], "shaders");
        assert!(matches!(empty.validate(), Err(ConfigError::Invalid(_))));

        let mismatched = ShaderSourceDetails::new(
            vec![ShaderKind::Vertex],
            vec!["a.spv".to_string(), "b.spv".to_string()],
            "shaders",
        );
        assert!(mismatched.validate().is_err());

        let resolved = ShaderSourceDetails::default().resolve().unwrap();
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[0].0, ShaderKind::Vertex);
        assert_eq!(resolved[1].1, Path::new("target/shaders").join("scene.frag.spv"));
    }

    #[test]
    fn test_frames_in_flight_bounds() {
        assert!(RendererConfig::default().with_max_frames_in_flight(0).validate().is_err());
        assert!(RendererConfig::default().with_max_frames_in_flight(9).validate().is_err());
        assert!(RendererConfig::default().with_max_frames_in_flight(8).validate().is_ok());
    }

    #[test]
    fn test_graph_model_extension() {
        let mut graph = GraphConfig::default();
        assert!(graph.validate().is_ok());
        graph.model_path = "scene.GLB".to_string();
        assert!(graph.validate().is_ok());
        graph.model_path = "scene.obj".to_string();
        assert!(graph.validate().is_err());
    }
}
