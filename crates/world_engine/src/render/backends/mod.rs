//! Graphics backends
//!
//! Vulkan is the only backend; the scene and frame loop reach it through
//! [`vulkan::DeviceProvider`].

/// Vulkan rendering backend implementation
pub mod vulkan;
