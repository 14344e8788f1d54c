//! Vulkan backend implementation
//!
//! Organized into initialization, resources, rendering and state modules.
//! Everything above the device layer talks to the GPU through
//! [`DeviceProvider`].

/// Device provider interface and its result types
pub mod device;

/// Vulkan initialization types (instance, devices, context)
pub mod initialization;

/// Vulkan resource management (buffers, textures, descriptors)
pub mod resources;

/// Vulkan rendering operations (render pass, shaders, pipeline)
pub mod rendering;

/// Vulkan state management (swap chain, framebuffers, synchronization)
pub mod state;

/// Recording device for unit tests
#[cfg(test)]
pub mod mock;

pub use device::{AcquireOutcome, DeviceProvider, PresentOutcome, QueueFamilyIndices, SubmitRequest, SwapchainSupport};
pub use initialization::context::{PhysicalDeviceInfo, VulkanContext, VulkanError, VulkanResult};
pub use rendering::{GraphicsPipeline, RenderPass, RenderPassLayout, Vertex, VulkanVertexLayout};
pub use resources::{Buffer, Image, ResourceFactory, Texture, TextureSet};
pub use state::{FrameSyncState, RenderTargets, Swapchain, SwapchainManager};
