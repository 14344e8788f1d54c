//! Swap chain, framebuffers and frame synchronization

pub mod swapchain;
pub mod swapchain_manager;
pub mod sync;

pub use swapchain::{choose_extent, choose_image_count, choose_present_mode, choose_surface_format, Swapchain};
pub use swapchain_manager::{RenderTargets, SwapchainManager};
pub use sync::{FrameSync, FrameSyncState};
