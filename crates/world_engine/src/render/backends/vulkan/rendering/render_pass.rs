//! Render pass management
//!
//! A single forward pass whose attachment list depends on two independent
//! features: a depth attachment, and a multisampled color attachment resolved
//! into the swap chain image.

use ash::vk;
use bitflags::bitflags;
use std::rc::Rc;

use crate::render::backends::vulkan::{DeviceProvider, VulkanResult};

/// Depth formats in order of preference
pub const DEPTH_FORMAT_CANDIDATES: [vk::Format; 3] = [
    vk::Format::D32_SFLOAT,
    vk::Format::D32_SFLOAT_S8_UINT,
    vk::Format::D24_UNORM_S8_UINT,
];

bitflags! {
    /// Optional attachments of the forward pass
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RenderPassFeatures: u32 {
        /// Depth attachment tested and written by the pipeline
        const DEPTH = 1 << 0;
        /// Multisampled color attachment resolved into the swap image
        const MSAA = 1 << 1;
    }
}

impl RenderPassFeatures {
    /// Features requested by the two renderer flags
    pub fn from_flags(enable_depth: bool, enable_msaa: bool) -> Self {
        let mut features = Self::empty();
        features.set(Self::DEPTH, enable_depth);
        features.set(Self::MSAA, enable_msaa);
        features
    }
}

/// Formats, sample count and attachment order of the forward pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderPassLayout {
    /// Enabled optional attachments
    pub features: RenderPassFeatures,
    /// Swap chain format
    pub color_format: vk::Format,
    /// Depth format when depth is enabled
    pub depth_format: Option<vk::Format>,
    /// Sample count of color and depth attachments
    pub samples: vk::SampleCountFlags,
}

impl RenderPassLayout {
    /// Resolve formats and sample count against the device
    ///
    /// MSAA is dropped when the device cannot sample more than once, so the
    /// pass never carries a resolve attachment with a single sample source.
    pub fn new(device: &dyn DeviceProvider, features: RenderPassFeatures, color_format: vk::Format) -> VulkanResult<Self> {
        let mut features = features;
        let depth_format = if features.contains(RenderPassFeatures::DEPTH) {
            Some(device.find_supported_format(
                &DEPTH_FORMAT_CANDIDATES,
                vk::ImageTiling::OPTIMAL,
                vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT,
            )?)
        } else {
            None
        };
        let mut samples = vk::SampleCountFlags::TYPE_1;
        if features.contains(RenderPassFeatures::MSAA) {
            samples = device.max_usable_sample_count();
            if samples == vk::SampleCountFlags::TYPE_1 {
                log::warn!("MSAA requested but the device supports a single sample; rendering without MSAA");
                features.remove(RenderPassFeatures::MSAA);
            }
        }
        Ok(Self {
            features,
            color_format,
            depth_format,
            samples,
        })
    }

    /// Whether a depth attachment is present
    pub fn has_depth(&self) -> bool {
        self.depth_format.is_some()
    }

    /// Whether color is rendered multisampled and resolved
    pub fn has_msaa(&self) -> bool {
        self.features.contains(RenderPassFeatures::MSAA)
    }

    /// Number of attachments: color, then depth, then resolve
    pub fn attachment_count(&self) -> usize {
        1 + usize::from(self.has_depth()) + usize::from(self.has_msaa())
    }

    /// Clear values in attachment order
    pub fn clear_values(&self, clear_color: [f32; 4]) -> Vec<vk::ClearValue> {
        let color = vk::ClearValue {
            color: vk::ClearColorValue { float32: clear_color },
        };
        let mut values = vec![color];
        if self.has_depth() {
            values.push(vk::ClearValue {
                depth_stencil: vk::ClearDepthStencilValue { depth: 1.0, stencil: 0 },
            });
        }
        if self.has_msaa() {
            values.push(color);
        }
        values
    }

    /// Framebuffer attachments in pass order
    pub fn framebuffer_attachments(
        &self,
        swap_view: vk::ImageView,
        depth_view: Option<vk::ImageView>,
        msaa_view: Option<vk::ImageView>,
    ) -> Vec<vk::ImageView> {
        let mut views = Vec::with_capacity(self.attachment_count());
        match msaa_view.filter(|_| self.has_msaa()) {
            Some(color) => views.push(color),
            None => views.push(swap_view),
        }
        if let Some(depth) = depth_view.filter(|_| self.has_depth()) {
            views.push(depth);
        }
        if self.has_msaa() {
            views.push(swap_view);
        }
        views
    }

    fn attachment_descriptions(&self) -> Vec<vk::AttachmentDescription> {
        let mut attachments = Vec::with_capacity(self.attachment_count());
        let color_final = if self.has_msaa() {
            vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL
        } else {
            vk::ImageLayout::PRESENT_SRC_KHR
        };
        attachments.push(
            vk::AttachmentDescription::builder()
                .format(self.color_format)
                .samples(self.samples)
                .load_op(vk::AttachmentLoadOp::CLEAR)
                .store_op(vk::AttachmentStoreOp::STORE)
                .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
                .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
                .initial_layout(vk::ImageLayout::UNDEFINED)
                .final_layout(color_final)
                .build(),
        );
        if let Some(depth_format) = self.depth_format {
            attachments.push(
                vk::AttachmentDescription::builder()
                    .format(depth_format)
                    .samples(self.samples)
                    .load_op(vk::AttachmentLoadOp::CLEAR)
                    .store_op(vk::AttachmentStoreOp::DONT_CARE)
                    .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
                    .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
                    .initial_layout(vk::ImageLayout::UNDEFINED)
                    .final_layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL)
                    .build(),
            );
        }
        if self.has_msaa() {
            attachments.push(
                vk::AttachmentDescription::builder()
                    .format(self.color_format)
                    .samples(vk::SampleCountFlags::TYPE_1)
                    .load_op(vk::AttachmentLoadOp::DONT_CARE)
                    .store_op(vk::AttachmentStoreOp::STORE)
                    .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
                    .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
                    .initial_layout(vk::ImageLayout::UNDEFINED)
                    .final_layout(vk::ImageLayout::PRESENT_SRC_KHR)
                    .build(),
            );
        }
        attachments
    }
}

/// Vulkan render pass wrapper with RAII cleanup
pub struct RenderPass {
    device: Rc<dyn DeviceProvider>,
    render_pass: vk::RenderPass,
    layout: RenderPassLayout,
}

impl RenderPass {
    /// Create the forward pass described by `layout`
    pub fn new(device: Rc<dyn DeviceProvider>, layout: RenderPassLayout) -> VulkanResult<Self> {
        let attachments = layout.attachment_descriptions();

        let color_ref = [vk::AttachmentReference {
            attachment: 0,
            layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        }];
        let depth_ref = vk::AttachmentReference {
            attachment: 1,
            layout: vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
        };
        let resolve_ref = [vk::AttachmentReference {
            attachment: if layout.has_depth() { 2 } else { 1 },
            layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        }];

        let mut subpass = vk::SubpassDescription::builder()
            .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
            .color_attachments(&color_ref);
        if layout.has_depth() {
            subpass = subpass.depth_stencil_attachment(&depth_ref);
        }
        if layout.has_msaa() {
            subpass = subpass.resolve_attachments(&resolve_ref);
        }
        let subpasses = [subpass.build()];

        let stages = vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT | vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS;
        let dependencies = [vk::SubpassDependency::builder()
            .src_subpass(vk::SUBPASS_EXTERNAL)
            .dst_subpass(0)
            .src_stage_mask(stages)
            .src_access_mask(vk::AccessFlags::empty())
            .dst_stage_mask(stages)
            .dst_access_mask(
                vk::AccessFlags::COLOR_ATTACHMENT_WRITE | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
            )
            .build()];

        let create_info = vk::RenderPassCreateInfo::builder()
            .attachments(&attachments)
            .subpasses(&subpasses)
            .dependencies(&dependencies);

        let render_pass = device.create_render_pass(&create_info)?;
        log::debug!(
            "Created render pass with {} attachments ({:?}, {:?} samples)",
            attachments.len(),
            layout.features,
            layout.samples
        );

        Ok(Self {
            device,
            render_pass,
            layout,
        })
    }

    /// Get the render pass handle
    pub fn handle(&self) -> vk::RenderPass {
        self.render_pass
    }

    /// Attachment layout the pass was built with
    pub fn layout(&self) -> &RenderPassLayout {
        &self.layout
    }

    /// Destroy the pass; later calls do nothing
    pub fn destroy(&mut self) {
        if self.render_pass != vk::RenderPass::null() {
            self.device.destroy_render_pass(self.render_pass);
            self.render_pass = vk::RenderPass::null();
        }
    }
}

impl Drop for RenderPass {
    fn drop(&mut self) {
        self.destroy();
    }
}
