//! # Core Engine Module
//!
//! Shared configuration for every subsystem.

pub mod config;

pub use config::{
    ApplicationConfig, CameraConfig, Config, ConfigError, GraphConfig, LoggerConfig, RendererConfig,
    ShaderKind, ShaderSourceDetails, WindowConfig,
};
