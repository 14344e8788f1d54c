//! Framebuffer and attachment management
//!
//! Owns the depth image, the optional multisampled color image and one
//! framebuffer per swap chain image. Framebuffers and attachments are torn
//! down separately because the resize protocol destroys the pipeline between
//! them.

use ash::vk;
use std::rc::Rc;

use crate::render::backends::vulkan::resources::{Image, ImageSpec, ResourceFactory};
use crate::render::backends::vulkan::rendering::RenderPassLayout;
use crate::render::backends::vulkan::state::Swapchain;
use crate::render::backends::vulkan::{DeviceProvider, VulkanResult};

/// Everything the graph needs to record a frame's command buffers
#[derive(Clone, Copy)]
pub struct RenderTargets<'a> {
    /// Pool the per-image command buffers are allocated from
    pub command_pool: vk::CommandPool,
    /// Forward render pass
    pub render_pass: vk::RenderPass,
    /// One framebuffer per swap chain image
    pub framebuffers: &'a [vk::Framebuffer],
    /// Render area
    pub extent: vk::Extent2D,
    /// Clear values in attachment order
    pub clear_values: &'a [vk::ClearValue],
    /// Scene pipeline
    pub pipeline: vk::Pipeline,
    /// Layout of the scene pipeline
    pub pipeline_layout: vk::PipelineLayout,
}

impl RenderTargets<'_> {
    /// Number of swap chain images covered
    pub fn image_count(&self) -> usize {
        self.framebuffers.len()
    }
}

/// Manages swapchain-related resources like framebuffers and depth buffers
pub struct SwapchainManager {
    device: Rc<dyn DeviceProvider>,
    depth: Option<Image>,
    color: Option<Image>,
    framebuffers: Vec<vk::Framebuffer>,
}

impl SwapchainManager {
    /// Create attachments, then one framebuffer per swap chain image
    pub fn new(
        factory: &ResourceFactory,
        layout: &RenderPassLayout,
        render_pass: vk::RenderPass,
        swapchain: &Swapchain,
    ) -> VulkanResult<Self> {
        let mut manager = Self {
            device: Rc::clone(factory.device()),
            depth: None,
            color: None,
            framebuffers: Vec::new(),
        };
        manager.create_attachments(factory, layout, swapchain.extent())?;
        manager.create_framebuffers(layout, render_pass, swapchain)?;
        Ok(manager)
    }

    /// Create the depth image and the multisampled color image as enabled
    pub fn create_attachments(
        &mut self,
        factory: &ResourceFactory,
        layout: &RenderPassLayout,
        extent: vk::Extent2D,
    ) -> VulkanResult<()> {
        if let Some(depth_format) = layout.depth_format {
            let spec = ImageSpec {
                samples: layout.samples,
                aspect: vk::ImageAspectFlags::DEPTH,
                ..ImageSpec::color(
                    extent.width,
                    extent.height,
                    depth_format,
                    vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT,
                )
            };
            let depth = factory.create_image(&spec)?;
            factory.transition_image_layout(
                depth.handle(),
                depth_format,
                vk::ImageLayout::UNDEFINED,
                vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
                1,
            )?;
            self.depth = Some(depth);
        }

        if layout.has_msaa() {
            let spec = ImageSpec {
                samples: layout.samples,
                ..ImageSpec::color(
                    extent.width,
                    extent.height,
                    layout.color_format,
                    vk::ImageUsageFlags::TRANSIENT_ATTACHMENT | vk::ImageUsageFlags::COLOR_ATTACHMENT,
                )
            };
            self.color = Some(factory.create_image(&spec)?);
        }

        log::debug!(
            "Created frame attachments {}x{} (depth: {}, msaa: {})",
            extent.width,
            extent.height,
            self.depth.is_some(),
            self.color.is_some()
        );
        Ok(())
    }

    /// Create one framebuffer per swap chain image view
    pub fn create_framebuffers(
        &mut self,
        layout: &RenderPassLayout,
        render_pass: vk::RenderPass,
        swapchain: &Swapchain,
    ) -> VulkanResult<()> {
        let extent = swapchain.extent();
        let depth_view = self.depth.as_ref().map(Image::view);
        let color_view = self.color.as_ref().map(Image::view);

        for &swap_view in swapchain.image_views() {
            let attachments = layout.framebuffer_attachments(swap_view, depth_view, color_view);
            let create_info = vk::FramebufferCreateInfo::builder()
                .render_pass(render_pass)
                .attachments(&attachments)
                .width(extent.width)
                .height(extent.height)
                .layers(1);
            let framebuffer = self.device.create_framebuffer(&create_info)?;
            self.framebuffers.push(framebuffer);
        }

        log::debug!("Created {} framebuffers", self.framebuffers.len());
        Ok(())
    }

    /// Get framebuffer for a specific swapchain image
    pub fn get_framebuffer(&self, image_index: usize) -> Option<vk::Framebuffer> {
        self.framebuffers.get(image_index).copied()
    }

    /// All framebuffers in swap chain image order
    pub fn framebuffers(&self) -> &[vk::Framebuffer] {
        &self.framebuffers
    }

    /// Get the number of framebuffers
    pub fn framebuffer_count(&self) -> usize {
        self.framebuffers.len()
    }

    /// Depth attachment, when enabled
    pub fn depth_image(&self) -> Option<&Image> {
        self.depth.as_ref()
    }

    /// Multisampled color attachment, when enabled
    pub fn color_image(&self) -> Option<&Image> {
        self.color.as_ref()
    }

    /// Destroy every framebuffer
    pub fn destroy_framebuffers(&mut self) {
        for framebuffer in self.framebuffers.drain(..) {
            self.device.destroy_framebuffer(framebuffer);
        }
    }

    /// Destroy the depth and color attachments
    pub fn destroy_attachments(&mut self) {
        if let Some(mut depth) = self.depth.take() {
            depth.destroy();
        }
        if let Some(mut color) = self.color.take() {
            color.destroy();
        }
    }

    /// Destroy framebuffers, then attachments
    pub fn destroy(&mut self) {
        self.destroy_framebuffers();
        self.destroy_attachments();
    }
}

impl Drop for SwapchainManager {
    fn drop(&mut self) {
        self.destroy();
    }
}
