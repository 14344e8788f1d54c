//! # Rendering System
//!
//! Vulkan scene rendering: the device layer and its resources live under
//! [`backends::vulkan`], the frame loop in [`renderer`].
//!
//! ## Architecture
//!
//! - **Renderer**: swap chain, render pass, pipeline, frame slots and the
//!   recreation protocol
//! - **Camera**: fly camera producing Vulkan-convention matrices
//! - **Window**: GLFW window and input
//! - **Overlay**: hook for UI drawn inside the scene render pass

pub mod camera;
pub mod overlay;
pub mod renderer;
pub mod window;

/// Graphics backend implementations
pub mod backends;

pub use backends::vulkan::{DeviceProvider, Vertex, VulkanContext, VulkanError, VulkanResult};
pub use camera::{CameraMovement, FlyCamera};
pub use overlay::{OverlayContext, UiOverlay};
pub use renderer::{FrameOutcome, FrameSizeSource, Renderer};
pub use window::{InputState, Window, WindowError, WindowResult};
