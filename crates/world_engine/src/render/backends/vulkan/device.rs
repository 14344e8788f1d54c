//! Device provider interface
//!
//! Every GPU call the renderer, graph and resource factory make goes through
//! [`DeviceProvider`]. The production implementation is
//! [`VulkanContext`](super::VulkanContext); tests drive the same code through a
//! recording mock.

use ash::vk;

use super::VulkanResult;

/// Queue family indices used for graphics and presentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueFamilyIndices {
    /// Family that accepts graphics work
    pub graphics: u32,
    /// Family that can present to the surface
    pub present: u32,
}

impl QueueFamilyIndices {
    /// Whether graphics and present use different families
    pub fn is_split(&self) -> bool {
        self.graphics != self.present
    }
}

/// Surface capabilities, formats and present modes
#[derive(Debug, Clone, Default)]
pub struct SwapchainSupport {
    /// Image count and extent limits
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    /// Supported surface formats
    pub formats: Vec<vk::SurfaceFormatKHR>,
    /// Supported present modes
    pub present_modes: Vec<vk::PresentModeKHR>,
}

/// Result of acquiring a swap chain image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireOutcome {
    /// An image is ready
    Acquired {
        /// Index into the swap chain images
        index: u32,
        /// The swap chain no longer matches the surface exactly
        suboptimal: bool,
    },
    /// The swap chain must be recreated before it can be used
    OutOfDate,
}

/// Result of presenting a swap chain image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentOutcome {
    /// Presented normally
    Presented,
    /// Presented, but the swap chain should be recreated
    Suboptimal,
    /// Not presented, the swap chain must be recreated
    OutOfDate,
}

/// One command buffer submission to the graphics queue
#[derive(Debug, Clone, Copy)]
pub struct SubmitRequest {
    /// Command buffer to execute
    pub command_buffer: vk::CommandBuffer,
    /// Semaphore to wait on and the stage that waits
    pub wait_semaphore: Option<(vk::Semaphore, vk::PipelineStageFlags)>,
    /// Semaphore signalled on completion
    pub signal_semaphore: Option<vk::Semaphore>,
    /// Fence signalled on completion, may be null
    pub fence: vk::Fence,
}

impl SubmitRequest {
    /// Submission without semaphores or fence
    pub fn one_shot(command_buffer: vk::CommandBuffer) -> Self {
        Self {
            command_buffer,
            wait_semaphore: None,
            signal_semaphore: None,
            fence: vk::Fence::null(),
        }
    }
}

/// Access to the Vulkan device and every call made against it.
///
/// Handles returned by `create_*`/`allocate_*` belong to the caller, which
/// must release them through the matching `destroy_*`/`free_*` call exactly
/// once.
pub trait DeviceProvider {
    // Queries

    /// Graphics and present queue families
    fn queue_families(&self) -> QueueFamilyIndices;

    /// Surface the swap chain presents to
    fn surface(&self) -> vk::SurfaceKHR;

    /// Current surface capabilities, formats and present modes
    fn swapchain_support(&self) -> VulkanResult<SwapchainSupport>;

    /// Index of a memory type allowed by `type_bits` with all `properties`
    fn find_memory_type(&self, type_bits: u32, properties: vk::MemoryPropertyFlags) -> VulkanResult<u32>;

    /// Format feature support
    fn format_properties(&self, format: vk::Format) -> vk::FormatProperties;

    /// First candidate supporting `features` with the given tiling
    fn find_supported_format(
        &self,
        candidates: &[vk::Format],
        tiling: vk::ImageTiling,
        features: vk::FormatFeatureFlags,
    ) -> VulkanResult<vk::Format> {
        candidates
            .iter()
            .copied()
            .find(|&format| {
                let properties = self.format_properties(format);
                match tiling {
                    vk::ImageTiling::LINEAR => properties.linear_tiling_features.contains(features),
                    _ => properties.optimal_tiling_features.contains(features),
                }
            })
            .ok_or_else(|| super::VulkanError::UnsupportedFormat(format!("none of {candidates:?} supports {features:?}")))
    }

    /// Highest sample count supported by both color and depth attachments
    fn max_usable_sample_count(&self) -> vk::SampleCountFlags;

    /// Device limit for sampler anisotropy
    fn max_sampler_anisotropy(&self) -> f32;

    // Memory

    /// Allocate device memory
    fn allocate_memory(&self, size: vk::DeviceSize, memory_type_index: u32) -> VulkanResult<vk::DeviceMemory>;

    /// Free device memory
    fn free_memory(&self, memory: vk::DeviceMemory);

    /// Map host-visible memory, copy `data` at `offset`, unmap
    fn write_memory(&self, memory: vk::DeviceMemory, offset: vk::DeviceSize, data: &[u8]) -> VulkanResult<()>;

    // Buffers and images

    /// Create a buffer
    fn create_buffer(&self, info: &vk::BufferCreateInfo) -> VulkanResult<vk::Buffer>;

    /// Destroy a buffer
    fn destroy_buffer(&self, buffer: vk::Buffer);

    /// Memory requirements of a buffer
    fn buffer_memory_requirements(&self, buffer: vk::Buffer) -> vk::MemoryRequirements;

    /// Bind memory to a buffer
    fn bind_buffer_memory(&self, buffer: vk::Buffer, memory: vk::DeviceMemory) -> VulkanResult<()>;

    /// Create an image
    fn create_image(&self, info: &vk::ImageCreateInfo) -> VulkanResult<vk::Image>;

    /// Destroy an image
    fn destroy_image(&self, image: vk::Image);

    /// Memory requirements of an image
    fn image_memory_requirements(&self, image: vk::Image) -> vk::MemoryRequirements;

    /// Bind memory to an image
    fn bind_image_memory(&self, image: vk::Image, memory: vk::DeviceMemory) -> VulkanResult<()>;

    /// Create an image view
    fn create_image_view(&self, info: &vk::ImageViewCreateInfo) -> VulkanResult<vk::ImageView>;

    /// Destroy an image view
    fn destroy_image_view(&self, view: vk::ImageView);

    /// Create a sampler
    fn create_sampler(&self, info: &vk::SamplerCreateInfo) -> VulkanResult<vk::Sampler>;

    /// Destroy a sampler
    fn destroy_sampler(&self, sampler: vk::Sampler);

    // Descriptors

    /// Create a descriptor set layout
    fn create_descriptor_set_layout(
        &self,
        bindings: &[vk::DescriptorSetLayoutBinding],
    ) -> VulkanResult<vk::DescriptorSetLayout>;

    /// Destroy a descriptor set layout
    fn destroy_descriptor_set_layout(&self, layout: vk::DescriptorSetLayout);

    /// Create a pool whose sets can be freed individually
    fn create_descriptor_pool(
        &self,
        max_sets: u32,
        pool_sizes: &[vk::DescriptorPoolSize],
    ) -> VulkanResult<vk::DescriptorPool>;

    /// Destroy a descriptor pool
    fn destroy_descriptor_pool(&self, pool: vk::DescriptorPool);

    /// Allocate one set per layout
    fn allocate_descriptor_sets(
        &self,
        pool: vk::DescriptorPool,
        layouts: &[vk::DescriptorSetLayout],
    ) -> VulkanResult<Vec<vk::DescriptorSet>>;

    /// Return sets to their pool
    fn free_descriptor_sets(&self, pool: vk::DescriptorPool, sets: &[vk::DescriptorSet]) -> VulkanResult<()>;

    /// Write descriptors
    fn update_descriptor_sets(&self, writes: &[vk::WriteDescriptorSet]);

    // Pipeline objects

    /// Create a shader module from SPIR-V words
    fn create_shader_module(&self, code: &[u32]) -> VulkanResult<vk::ShaderModule>;

    /// Destroy a shader module
    fn destroy_shader_module(&self, module: vk::ShaderModule);

    /// Create a pipeline layout
    fn create_pipeline_layout(
        &self,
        set_layouts: &[vk::DescriptorSetLayout],
        push_constant_ranges: &[vk::PushConstantRange],
    ) -> VulkanResult<vk::PipelineLayout>;

    /// Destroy a pipeline layout
    fn destroy_pipeline_layout(&self, layout: vk::PipelineLayout);

    /// Create a graphics pipeline
    fn create_graphics_pipeline(&self, info: &vk::GraphicsPipelineCreateInfo) -> VulkanResult<vk::Pipeline>;

    /// Destroy a pipeline
    fn destroy_pipeline(&self, pipeline: vk::Pipeline);

    /// Create a render pass
    fn create_render_pass(&self, info: &vk::RenderPassCreateInfo) -> VulkanResult<vk::RenderPass>;

    /// Destroy a render pass
    fn destroy_render_pass(&self, render_pass: vk::RenderPass);

    /// Create a framebuffer
    fn create_framebuffer(&self, info: &vk::FramebufferCreateInfo) -> VulkanResult<vk::Framebuffer>;

    /// Destroy a framebuffer
    fn destroy_framebuffer(&self, framebuffer: vk::Framebuffer);

    // Command pools and buffers

    /// Create a command pool on the graphics family
    fn create_command_pool(&self, flags: vk::CommandPoolCreateFlags) -> VulkanResult<vk::CommandPool>;

    /// Destroy a command pool
    fn destroy_command_pool(&self, pool: vk::CommandPool);

    /// Allocate primary command buffers
    fn allocate_command_buffers(&self, pool: vk::CommandPool, count: u32) -> VulkanResult<Vec<vk::CommandBuffer>>;

    /// Free command buffers
    fn free_command_buffers(&self, pool: vk::CommandPool, buffers: &[vk::CommandBuffer]);

    /// Begin recording
    fn begin_command_buffer(
        &self,
        command_buffer: vk::CommandBuffer,
        flags: vk::CommandBufferUsageFlags,
    ) -> VulkanResult<()>;

    /// End recording
    fn end_command_buffer(&self, command_buffer: vk::CommandBuffer) -> VulkanResult<()>;

    // Recording

    /// Begin an inline render pass
    fn cmd_begin_render_pass(&self, command_buffer: vk::CommandBuffer, info: &vk::RenderPassBeginInfo);

    /// End the current render pass
    fn cmd_end_render_pass(&self, command_buffer: vk::CommandBuffer);

    /// Bind a graphics pipeline
    fn cmd_bind_pipeline(&self, command_buffer: vk::CommandBuffer, pipeline: vk::Pipeline);

    /// Bind a vertex buffer at binding 0, offset 0
    fn cmd_bind_vertex_buffer(&self, command_buffer: vk::CommandBuffer, buffer: vk::Buffer);

    /// Bind an index buffer at offset 0
    fn cmd_bind_index_buffer(&self, command_buffer: vk::CommandBuffer, buffer: vk::Buffer, index_type: vk::IndexType);

    /// Bind a descriptor set at set 0 of a graphics pipeline layout
    fn cmd_bind_descriptor_set(
        &self,
        command_buffer: vk::CommandBuffer,
        layout: vk::PipelineLayout,
        set: vk::DescriptorSet,
    );

    /// Update push constants
    fn cmd_push_constants(
        &self,
        command_buffer: vk::CommandBuffer,
        layout: vk::PipelineLayout,
        stages: vk::ShaderStageFlags,
        offset: u32,
        data: &[u8],
    );

    /// Non-indexed draw of one instance
    fn cmd_draw(&self, command_buffer: vk::CommandBuffer, vertex_count: u32, first_vertex: u32);

    /// Indexed draw of one instance
    fn cmd_draw_indexed(&self, command_buffer: vk::CommandBuffer, index_count: u32, first_index: u32, vertex_offset: i32);

    /// Image memory barriers between two stages
    fn cmd_pipeline_barrier(
        &self,
        command_buffer: vk::CommandBuffer,
        src_stage: vk::PipelineStageFlags,
        dst_stage: vk::PipelineStageFlags,
        barriers: &[vk::ImageMemoryBarrier],
    );

    /// Copy `size` bytes between buffers
    fn cmd_copy_buffer(&self, command_buffer: vk::CommandBuffer, src: vk::Buffer, dst: vk::Buffer, size: vk::DeviceSize);

    /// Copy a tightly packed buffer into mip level 0 of an image in `TRANSFER_DST_OPTIMAL`
    fn cmd_copy_buffer_to_image(
        &self,
        command_buffer: vk::CommandBuffer,
        buffer: vk::Buffer,
        image: vk::Image,
        width: u32,
        height: u32,
    );

    /// Linear blit between two levels of the same image (`TRANSFER_SRC` to `TRANSFER_DST`)
    fn cmd_blit_image(&self, command_buffer: vk::CommandBuffer, image: vk::Image, region: &vk::ImageBlit);

    // Synchronization

    /// Create a binary semaphore
    fn create_semaphore(&self) -> VulkanResult<vk::Semaphore>;

    /// Destroy a semaphore
    fn destroy_semaphore(&self, semaphore: vk::Semaphore);

    /// Create a fence, optionally already signalled
    fn create_fence(&self, signaled: bool) -> VulkanResult<vk::Fence>;

    /// Destroy a fence
    fn destroy_fence(&self, fence: vk::Fence);

    /// Block until the fence is signalled or `timeout` nanoseconds pass
    fn wait_for_fence(&self, fence: vk::Fence, timeout: u64) -> VulkanResult<()>;

    /// Return a fence to the unsignalled state
    fn reset_fence(&self, fence: vk::Fence) -> VulkanResult<()>;

    // Swap chain and queues

    /// Create a swap chain
    fn create_swapchain(&self, info: &vk::SwapchainCreateInfoKHR) -> VulkanResult<vk::SwapchainKHR>;

    /// Destroy a swap chain
    fn destroy_swapchain(&self, swapchain: vk::SwapchainKHR);

    /// Images owned by a swap chain
    fn swapchain_images(&self, swapchain: vk::SwapchainKHR) -> VulkanResult<Vec<vk::Image>>;

    /// Acquire the next presentable image, signalling `semaphore`
    fn acquire_next_image(&self, swapchain: vk::SwapchainKHR, semaphore: vk::Semaphore) -> VulkanResult<AcquireOutcome>;

    /// Submit to the graphics queue
    fn queue_submit(&self, request: &SubmitRequest) -> VulkanResult<()>;

    /// Present on the present queue after `wait_semaphore`
    fn queue_present(
        &self,
        swapchain: vk::SwapchainKHR,
        image_index: u32,
        wait_semaphore: vk::Semaphore,
    ) -> VulkanResult<PresentOutcome>;

    /// Block until the graphics queue is idle
    fn graphics_queue_wait_idle(&self) -> VulkanResult<()>;

    /// Block until the whole device is idle
    fn device_wait_idle(&self) -> VulkanResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::backends::vulkan::mock::MockDevice;

    #[test]
    fn test_find_supported_format_prefers_first_match() {
        let device = MockDevice::new();
        let format = device
            .find_supported_format(
                &[vk::Format::D32_SFLOAT, vk::Format::D24_UNORM_S8_UINT],
                vk::ImageTiling::OPTIMAL,
                vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT,
            )
            .unwrap();
        assert_eq!(format, vk::Format::D32_SFLOAT);
    }

    #[test]
    fn test_find_supported_format_reports_unsupported() {
        let device = MockDevice::new();
        device.set_linear_blit_supported(false);
        let result = device.find_supported_format(
            &[vk::Format::R8G8B8A8_SRGB],
            vk::ImageTiling::OPTIMAL,
            vk::FormatFeatureFlags::SAMPLED_IMAGE_FILTER_LINEAR,
        );
        assert!(matches!(result, Err(crate::render::backends::vulkan::VulkanError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_queue_family_split() {
        assert!(!QueueFamilyIndices { graphics: 0, present: 0 }.is_split());
        assert!(QueueFamilyIndices { graphics: 0, present: 1 }.is_split());
    }
}
