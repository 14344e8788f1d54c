//! UI overlay hook
//!
//! An overlay records its own draw commands into the scene command buffer
//! after the meshes and before the render pass ends. The drawing itself is
//! up to the implementation.

use ash::vk;

use crate::render::backends::vulkan::{DeviceProvider, VulkanResult};

/// Render state an overlay needs to build its own pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayContext {
    /// Render pass the overlay draws inside
    pub render_pass: vk::RenderPass,
    /// Current swap chain image count
    pub image_count: usize,
    /// Color attachment sample count
    pub msaa_samples: vk::SampleCountFlags,
}

/// Draw commands composited on top of the scene
pub trait UiOverlay {
    /// Record into `command_buffer` while the scene render pass is active
    fn record(
        &mut self,
        device: &dyn DeviceProvider,
        command_buffer: vk::CommandBuffer,
        image_index: usize,
    ) -> VulkanResult<()>;
}

/// Shorter-lived borrow of an optional overlay, for passing it on in a loop
pub(crate) fn reborrow<'a>(overlay: &'a mut Option<&mut dyn UiOverlay>) -> Option<&'a mut dyn UiOverlay> {
    match overlay {
        Some(overlay) => Some(&mut **overlay),
        None => None,
    }
}

/// Overlay that records nothing and counts how often it was asked to
#[cfg(test)]
#[derive(Debug, Default)]
pub struct CountingOverlay {
    /// `(command_buffer, image_index)` of each call
    pub recorded: Vec<(vk::CommandBuffer, usize)>,
}

#[cfg(test)]
impl UiOverlay for CountingOverlay {
    fn record(
        &mut self,
        _device: &dyn DeviceProvider,
        command_buffer: vk::CommandBuffer,
        image_index: usize,
    ) -> VulkanResult<()> {
        self.recorded.push((command_buffer, image_index));
        Ok(())
    }
}
