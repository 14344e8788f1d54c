//! Recording device used by unit tests
//!
//! Hands out fake handles, records every call, tracks handle lifetimes and
//! simulates fence state so ordering and synchronization rules can be checked
//! without a GPU.

use ash::vk::{self, Handle};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;

use super::device::{AcquireOutcome, DeviceProvider, PresentOutcome, QueueFamilyIndices, SubmitRequest, SwapchainSupport};
use super::{VulkanError, VulkanResult};
use crate::assets::{AssetResult, ImageData, ImageLoader};

/// Memory type index handed out for device-local requests
pub const DEVICE_LOCAL_TYPE: u32 = 0;
/// Memory type index handed out for host-visible requests
pub const HOST_VISIBLE_TYPE: u32 = 1;

/// Layout transition recorded from a barrier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarrierRecord {
    /// Image the barrier applies to
    pub image: vk::Image,
    /// First mip level covered
    pub base_mip_level: u32,
    /// Number of mip levels covered
    pub level_count: u32,
    /// Layout before the barrier
    pub old_layout: vk::ImageLayout,
    /// Layout after the barrier
    pub new_layout: vk::ImageLayout,
}

/// One recorded device call
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    AllocateMemory { memory: vk::DeviceMemory, size: vk::DeviceSize, type_index: u32 },
    FreeMemory(vk::DeviceMemory),
    WriteMemory { memory: vk::DeviceMemory, offset: vk::DeviceSize, len: usize },
    CreateBuffer { buffer: vk::Buffer, size: vk::DeviceSize, usage: vk::BufferUsageFlags },
    DestroyBuffer(vk::Buffer),
    BindBufferMemory { buffer: vk::Buffer, memory: vk::DeviceMemory },
    CreateImage { image: vk::Image, extent: vk::Extent3D, mip_levels: u32, format: vk::Format, samples: vk::SampleCountFlags },
    DestroyImage(vk::Image),
    BindImageMemory { image: vk::Image, memory: vk::DeviceMemory },
    CreateImageView { view: vk::ImageView, image: vk::Image },
    DestroyImageView(vk::ImageView),
    CreateSampler { sampler: vk::Sampler, max_lod: f32, max_anisotropy: f32 },
    DestroySampler(vk::Sampler),
    CreateDescriptorSetLayout { layout: vk::DescriptorSetLayout, bindings: Vec<u32> },
    DestroyDescriptorSetLayout(vk::DescriptorSetLayout),
    CreateDescriptorPool { pool: vk::DescriptorPool, max_sets: u32, pool_sizes: Vec<(vk::DescriptorType, u32)> },
    DestroyDescriptorPool(vk::DescriptorPool),
    AllocateDescriptorSets { pool: vk::DescriptorPool, sets: Vec<vk::DescriptorSet> },
    FreeDescriptorSets { pool: vk::DescriptorPool, count: usize },
    UpdateDescriptorSets { writes: Vec<(vk::DescriptorSet, u32)> },
    CreateShaderModule(vk::ShaderModule),
    DestroyShaderModule(vk::ShaderModule),
    CreatePipelineLayout(vk::PipelineLayout),
    DestroyPipelineLayout(vk::PipelineLayout),
    CreatePipeline(vk::Pipeline),
    DestroyPipeline(vk::Pipeline),
    CreateRenderPass { render_pass: vk::RenderPass, attachments: u32 },
    DestroyRenderPass(vk::RenderPass),
    CreateFramebuffer { framebuffer: vk::Framebuffer, attachments: u32 },
    DestroyFramebuffer(vk::Framebuffer),
    CreateCommandPool(vk::CommandPool),
    DestroyCommandPool(vk::CommandPool),
    AllocateCommandBuffers(Vec<vk::CommandBuffer>),
    FreeCommandBuffers(Vec<vk::CommandBuffer>),
    BeginCommandBuffer(vk::CommandBuffer),
    EndCommandBuffer(vk::CommandBuffer),
    BeginRenderPass { command_buffer: vk::CommandBuffer, framebuffer: vk::Framebuffer, clear_values: u32 },
    EndRenderPass(vk::CommandBuffer),
    BindPipeline { command_buffer: vk::CommandBuffer, pipeline: vk::Pipeline },
    BindVertexBuffer { command_buffer: vk::CommandBuffer, buffer: vk::Buffer },
    BindIndexBuffer { command_buffer: vk::CommandBuffer, buffer: vk::Buffer, index_type: vk::IndexType },
    BindDescriptorSet { command_buffer: vk::CommandBuffer, set: vk::DescriptorSet },
    PushConstants { command_buffer: vk::CommandBuffer, stages: vk::ShaderStageFlags, offset: u32, data: Vec<u8> },
    Draw { command_buffer: vk::CommandBuffer, vertex_count: u32, first_vertex: u32 },
    DrawIndexed { command_buffer: vk::CommandBuffer, index_count: u32, first_index: u32, vertex_offset: i32 },
    PipelineBarrier { src_stage: vk::PipelineStageFlags, dst_stage: vk::PipelineStageFlags, barriers: Vec<BarrierRecord> },
    CopyBuffer { src: vk::Buffer, dst: vk::Buffer, size: vk::DeviceSize },
    CopyBufferToImage { buffer: vk::Buffer, image: vk::Image, width: u32, height: u32 },
    BlitImage { image: vk::Image, src_mip: u32, dst_mip: u32, dst_extent: (i32, i32) },
    CreateSemaphore(vk::Semaphore),
    DestroySemaphore(vk::Semaphore),
    CreateFence { fence: vk::Fence, signaled: bool },
    DestroyFence(vk::Fence),
    WaitForFence(vk::Fence),
    ResetFence(vk::Fence),
    CreateSwapchain { swapchain: vk::SwapchainKHR, extent: vk::Extent2D, min_image_count: u32, sharing_mode: vk::SharingMode },
    DestroySwapchain(vk::SwapchainKHR),
    AcquireNextImage { semaphore: vk::Semaphore, outcome: AcquireOutcome },
    QueueSubmit { command_buffer: vk::CommandBuffer, fence: vk::Fence, wait: Option<vk::Semaphore>, signal: Option<vk::Semaphore> },
    QueuePresent { image_index: u32, wait: vk::Semaphore },
    GraphicsQueueWaitIdle,
    DeviceWaitIdle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FenceState {
    Unsignaled,
    Pending,
    Signaled,
}

/// Fake [`DeviceProvider`] for tests
pub struct MockDevice {
    next_handle: Cell<u64>,
    calls: RefCell<Vec<Call>>,
    live: RefCell<HashSet<u64>>,
    violations: RefCell<Vec<String>>,
    fences: RefCell<HashMap<vk::Fence, FenceState>>,
    memory: RefCell<HashMap<vk::DeviceMemory, Vec<u8>>>,
    buffer_sizes: RefCell<HashMap<vk::Buffer, vk::DeviceSize>>,
    swapchain_image_count: Cell<u32>,
    swapchain_images: RefCell<HashMap<vk::SwapchainKHR, Vec<vk::Image>>>,
    extent: Cell<vk::Extent2D>,
    queue_families: Cell<QueueFamilyIndices>,
    linear_blit_supported: Cell<bool>,
    max_samples: Cell<vk::SampleCountFlags>,
    acquire_calls: Cell<usize>,
    next_image: Cell<u32>,
    acquire_out_of_date_on: RefCell<HashSet<usize>>,
    acquire_script: RefCell<VecDeque<u32>>,
    present_script: RefCell<VecDeque<PresentOutcome>>,
}

impl Default for MockDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDevice {
    /// Device with three swap chain images and an 800x600 surface
    pub fn new() -> Self {
        Self {
            next_handle: Cell::new(0x1000),
            calls: RefCell::new(Vec::new()),
            live: RefCell::new(HashSet::new()),
            violations: RefCell::new(Vec::new()),
            fences: RefCell::new(HashMap::new()),
            memory: RefCell::new(HashMap::new()),
            buffer_sizes: RefCell::new(HashMap::new()),
            swapchain_image_count: Cell::new(3),
            swapchain_images: RefCell::new(HashMap::new()),
            extent: Cell::new(vk::Extent2D { width: 800, height: 600 }),
            queue_families: Cell::new(QueueFamilyIndices { graphics: 0, present: 0 }),
            linear_blit_supported: Cell::new(true),
            max_samples: Cell::new(vk::SampleCountFlags::TYPE_4),
            acquire_calls: Cell::new(0),
            next_image: Cell::new(0),
            acquire_out_of_date_on: RefCell::new(HashSet::new()),
            acquire_script: RefCell::new(VecDeque::new()),
            present_script: RefCell::new(VecDeque::new()),
        }
    }

    /// Number of images the next swap chain will own
    pub fn set_swapchain_image_count(&self, count: u32) {
        self.swapchain_image_count.set(count);
    }

    /// Surface extent reported as `current_extent`
    pub fn set_extent(&self, width: u32, height: u32) {
        self.extent.set(vk::Extent2D { width, height });
    }

    /// Report graphics and present on different families
    pub fn set_queue_families(&self, graphics: u32, present: u32) {
        self.queue_families.set(QueueFamilyIndices { graphics, present });
    }

    /// Toggle `SAMPLED_IMAGE_FILTER_LINEAR` on every color format
    pub fn set_linear_blit_supported(&self, supported: bool) {
        self.linear_blit_supported.set(supported);
    }

    /// Highest sample count usable for color and depth together
    pub fn set_max_usable_sample_count(&self, samples: vk::SampleCountFlags) {
        self.max_samples.set(samples);
    }

    /// Image indices for upcoming acquires; afterwards acquires cycle
    pub fn script_acquire(&self, indices: impl IntoIterator<Item = u32>) {
        self.acquire_script.borrow_mut().extend(indices);
    }

    /// Make the `call`-th acquire (1-based) report out of date
    pub fn set_acquire_out_of_date_on(&self, call: usize) {
        self.acquire_out_of_date_on.borrow_mut().insert(call);
    }

    /// Queue results for upcoming presents; afterwards presents succeed
    pub fn script_present(&self, outcomes: impl IntoIterator<Item = PresentOutcome>) {
        self.present_script.borrow_mut().extend(outcomes);
    }

    /// Every call made so far
    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    /// Calls recorded after position `start`
    pub fn calls_since(&self, start: usize) -> Vec<Call> {
        self.calls.borrow()[start..].to_vec()
    }

    /// Number of calls recorded so far
    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }

    /// Forget recorded calls, keeping handle and fence state
    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    /// Misuse detected so far (double destroy, bad fence use, ...)
    pub fn violations(&self) -> Vec<String> {
        self.violations.borrow().clone()
    }

    /// Handles created and not yet destroyed
    pub fn live_handle_count(&self) -> usize {
        self.live.borrow().len()
    }

    /// Whether a handle is still alive
    pub fn is_live(&self, handle: impl Handle) -> bool {
        self.live.borrow().contains(&handle.as_raw())
    }

    /// Bytes written to a memory object
    pub fn memory_contents(&self, memory: vk::DeviceMemory) -> Option<Vec<u8>> {
        self.memory.borrow().get(&memory).cloned()
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    fn violation(&self, message: String) {
        self.violations.borrow_mut().push(message);
    }

    fn issue<H: Handle>(&self) -> H {
        let raw = self.next_handle.get();
        self.next_handle.set(raw + 1);
        self.live.borrow_mut().insert(raw);
        H::from_raw(raw)
    }

    fn release(&self, handle: impl Handle, what: &str) {
        let raw = handle.as_raw();
        if raw == 0 {
            self.violation(format!("destroy of null {what}"));
        } else if !self.live.borrow_mut().remove(&raw) {
            self.violation(format!("{what} {raw:#x} destroyed twice or never created"));
        }
    }

    fn require_live(&self, handle: impl Handle, what: &str) {
        let raw = handle.as_raw();
        if !self.live.borrow().contains(&raw) {
            self.violation(format!("{what} {raw:#x} used while not alive"));
        }
    }

    fn requirements(size: vk::DeviceSize) -> vk::MemoryRequirements {
        vk::MemoryRequirements {
            size: size.div_ceil(256) * 256,
            alignment: 256,
            memory_type_bits: 0b11,
        }
    }
}

impl DeviceProvider for MockDevice {
    fn queue_families(&self) -> QueueFamilyIndices {
        self.queue_families.get()
    }

    fn surface(&self) -> vk::SurfaceKHR {
        vk::SurfaceKHR::from_raw(0x1)
    }

    fn swapchain_support(&self) -> VulkanResult<SwapchainSupport> {
        let extent = self.extent.get();
        Ok(SwapchainSupport {
            capabilities: vk::SurfaceCapabilitiesKHR {
                min_image_count: 2,
                max_image_count: 0,
                current_extent: extent,
                min_image_extent: vk::Extent2D { width: 1, height: 1 },
                max_image_extent: vk::Extent2D { width: 4096, height: 4096 },
                max_image_array_layers: 1,
                current_transform: vk::SurfaceTransformFlagsKHR::IDENTITY,
                supported_usage_flags: vk::ImageUsageFlags::COLOR_ATTACHMENT,
                ..Default::default()
            },
            formats: vec![vk::SurfaceFormatKHR {
                format: vk::Format::B8G8R8A8_SRGB,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            }],
            present_modes: vec![vk::PresentModeKHR::FIFO, vk::PresentModeKHR::MAILBOX],
        })
    }

    fn find_memory_type(&self, type_bits: u32, properties: vk::MemoryPropertyFlags) -> VulkanResult<u32> {
        let index = if properties.contains(vk::MemoryPropertyFlags::HOST_VISIBLE) {
            HOST_VISIBLE_TYPE
        } else {
            DEVICE_LOCAL_TYPE
        };
        if type_bits & (1 << index) == 0 {
            return Err(VulkanError::NoSuitableMemoryType);
        }
        Ok(index)
    }

    fn format_properties(&self, format: vk::Format) -> vk::FormatProperties {
        let is_depth = matches!(
            format,
            vk::Format::D32_SFLOAT | vk::Format::D32_SFLOAT_S8_UINT | vk::Format::D24_UNORM_S8_UINT
        );
        let optimal = if is_depth {
            vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT
        } else {
            let mut features = vk::FormatFeatureFlags::SAMPLED_IMAGE
                | vk::FormatFeatureFlags::BLIT_SRC
                | vk::FormatFeatureFlags::BLIT_DST
                | vk::FormatFeatureFlags::COLOR_ATTACHMENT;
            if self.linear_blit_supported.get() {
                features |= vk::FormatFeatureFlags::SAMPLED_IMAGE_FILTER_LINEAR;
            }
            features
        };
        vk::FormatProperties {
            linear_tiling_features: vk::FormatFeatureFlags::empty(),
            optimal_tiling_features: optimal,
            buffer_features: vk::FormatFeatureFlags::empty(),
        }
    }

    fn max_usable_sample_count(&self) -> vk::SampleCountFlags {
        self.max_samples.get()
    }

    fn max_sampler_anisotropy(&self) -> f32 {
        8.0
    }

    fn allocate_memory(&self, size: vk::DeviceSize, memory_type_index: u32) -> VulkanResult<vk::DeviceMemory> {
        let memory: vk::DeviceMemory = self.issue();
        self.memory
            .borrow_mut()
            .insert(memory, vec![0; usize::try_from(size).unwrap_or(0)]);
        self.record(Call::AllocateMemory {
            memory,
            size,
            type_index: memory_type_index,
        });
        Ok(memory)
    }

    fn free_memory(&self, memory: vk::DeviceMemory) {
        self.release(memory, "memory");
        self.memory.borrow_mut().remove(&memory);
        self.record(Call::FreeMemory(memory));
    }

    fn write_memory(&self, memory: vk::DeviceMemory, offset: vk::DeviceSize, data: &[u8]) -> VulkanResult<()> {
        self.require_live(memory, "memory");
        let mut contents = self.memory.borrow_mut();
        let bytes = contents
            .get_mut(&memory)
            .ok_or(VulkanError::ResourceNotFound { id: memory.as_raw() })?;
        let start = usize::try_from(offset).unwrap_or(usize::MAX);
        let end = start.saturating_add(data.len());
        if end > bytes.len() {
            return Err(VulkanError::InvalidOperation {
                reason: format!("write of {} bytes at {start} overflows {} byte allocation", data.len(), bytes.len()),
            });
        }
        bytes[start..end].copy_from_slice(data);
        drop(contents);
        self.record(Call::WriteMemory {
            memory,
            offset,
            len: data.len(),
        });
        Ok(())
    }

    fn create_buffer(&self, info: &vk::BufferCreateInfo) -> VulkanResult<vk::Buffer> {
        let buffer: vk::Buffer = self.issue();
        self.buffer_sizes.borrow_mut().insert(buffer, info.size);
        self.record(Call::CreateBuffer {
            buffer,
            size: info.size,
            usage: info.usage,
        });
        Ok(buffer)
    }

    fn destroy_buffer(&self, buffer: vk::Buffer) {
        self.release(buffer, "buffer");
        self.record(Call::DestroyBuffer(buffer));
    }

    fn buffer_memory_requirements(&self, buffer: vk::Buffer) -> vk::MemoryRequirements {
        let size = self.buffer_sizes.borrow().get(&buffer).copied().unwrap_or(0);
        Self::requirements(size)
    }

    fn bind_buffer_memory(&self, buffer: vk::Buffer, memory: vk::DeviceMemory) -> VulkanResult<()> {
        self.require_live(buffer, "buffer");
        self.require_live(memory, "memory");
        self.record(Call::BindBufferMemory { buffer, memory });
        Ok(())
    }

    fn create_image(&self, info: &vk::ImageCreateInfo) -> VulkanResult<vk::Image> {
        let image: vk::Image = self.issue();
        self.record(Call::CreateImage {
            image,
            extent: info.extent,
            mip_levels: info.mip_levels,
            format: info.format,
            samples: info.samples,
        });
        Ok(image)
    }

    fn destroy_image(&self, image: vk::Image) {
        self.release(image, "image");
        self.record(Call::DestroyImage(image));
    }

    fn image_memory_requirements(&self, _image: vk::Image) -> vk::MemoryRequirements {
        Self::requirements(4096)
    }

    fn bind_image_memory(&self, image: vk::Image, memory: vk::DeviceMemory) -> VulkanResult<()> {
        self.require_live(image, "image");
        self.require_live(memory, "memory");
        self.record(Call::BindImageMemory { image, memory });
        Ok(())
    }

    fn create_image_view(&self, info: &vk::ImageViewCreateInfo) -> VulkanResult<vk::ImageView> {
        let view: vk::ImageView = self.issue();
        self.record(Call::CreateImageView { view, image: info.image });
        Ok(view)
    }

    fn destroy_image_view(&self, view: vk::ImageView) {
        self.release(view, "image view");
        self.record(Call::DestroyImageView(view));
    }

    fn create_sampler(&self, info: &vk::SamplerCreateInfo) -> VulkanResult<vk::Sampler> {
        let sampler: vk::Sampler = self.issue();
        self.record(Call::CreateSampler {
            sampler,
            max_lod: info.max_lod,
            max_anisotropy: info.max_anisotropy,
        });
        Ok(sampler)
    }

    fn destroy_sampler(&self, sampler: vk::Sampler) {
        self.release(sampler, "sampler");
        self.record(Call::DestroySampler(sampler));
    }

    fn create_descriptor_set_layout(
        &self,
        bindings: &[vk::DescriptorSetLayoutBinding],
    ) -> VulkanResult<vk::DescriptorSetLayout> {
        let layout: vk::DescriptorSetLayout = self.issue();
        self.record(Call::CreateDescriptorSetLayout {
            layout,
            bindings: bindings.iter().map(|b| b.binding).collect(),
        });
        Ok(layout)
    }

    fn destroy_descriptor_set_layout(&self, layout: vk::DescriptorSetLayout) {
        self.release(layout, "descriptor set layout");
        self.record(Call::DestroyDescriptorSetLayout(layout));
    }

    fn create_descriptor_pool(
        &self,
        max_sets: u32,
        pool_sizes: &[vk::DescriptorPoolSize],
    ) -> VulkanResult<vk::DescriptorPool> {
        let pool: vk::DescriptorPool = self.issue();
        self.record(Call::CreateDescriptorPool {
            pool,
            max_sets,
            pool_sizes: pool_sizes.iter().map(|s| (s.ty, s.descriptor_count)).collect(),
        });
        Ok(pool)
    }

    fn destroy_descriptor_pool(&self, pool: vk::DescriptorPool) {
        self.release(pool, "descriptor pool");
        self.record(Call::DestroyDescriptorPool(pool));
    }

    fn allocate_descriptor_sets(
        &self,
        pool: vk::DescriptorPool,
        layouts: &[vk::DescriptorSetLayout],
    ) -> VulkanResult<Vec<vk::DescriptorSet>> {
        self.require_live(pool, "descriptor pool");
        let sets: Vec<vk::DescriptorSet> = layouts.iter().map(|_| self.issue()).collect();
        self.record(Call::AllocateDescriptorSets {
            pool,
            sets: sets.clone(),
        });
        Ok(sets)
    }

    fn free_descriptor_sets(&self, pool: vk::DescriptorPool, sets: &[vk::DescriptorSet]) -> VulkanResult<()> {
        self.require_live(pool, "descriptor pool");
        for &set in sets {
            self.release(set, "descriptor set");
        }
        self.record(Call::FreeDescriptorSets { pool, count: sets.len() });
        Ok(())
    }

    fn update_descriptor_sets(&self, writes: &[vk::WriteDescriptorSet]) {
        for write in writes {
            self.require_live(write.dst_set, "descriptor set");
        }
        self.record(Call::UpdateDescriptorSets {
            writes: writes.iter().map(|w| (w.dst_set, w.dst_binding)).collect(),
        });
    }

    fn create_shader_module(&self, code: &[u32]) -> VulkanResult<vk::ShaderModule> {
        if code.is_empty() {
            return Err(VulkanError::InvalidOperation {
                reason: "empty SPIR-V".to_string(),
            });
        }
        let module: vk::ShaderModule = self.issue();
        self.record(Call::CreateShaderModule(module));
        Ok(module)
    }

    fn destroy_shader_module(&self, module: vk::ShaderModule) {
        self.release(module, "shader module");
        self.record(Call::DestroyShaderModule(module));
    }

    fn create_pipeline_layout(
        &self,
        set_layouts: &[vk::DescriptorSetLayout],
        _push_constant_ranges: &[vk::PushConstantRange],
    ) -> VulkanResult<vk::PipelineLayout> {
        for &layout in set_layouts {
            self.require_live(layout, "descriptor set layout");
        }
        let layout: vk::PipelineLayout = self.issue();
        self.record(Call::CreatePipelineLayout(layout));
        Ok(layout)
    }

    fn destroy_pipeline_layout(&self, layout: vk::PipelineLayout) {
        self.release(layout, "pipeline layout");
        self.record(Call::DestroyPipelineLayout(layout));
    }

    fn create_graphics_pipeline(&self, info: &vk::GraphicsPipelineCreateInfo) -> VulkanResult<vk::Pipeline> {
        self.require_live(info.render_pass, "render pass");
        self.require_live(info.layout, "pipeline layout");
        let pipeline: vk::Pipeline = self.issue();
        self.record(Call::CreatePipeline(pipeline));
        Ok(pipeline)
    }

    fn destroy_pipeline(&self, pipeline: vk::Pipeline) {
        self.release(pipeline, "pipeline");
        self.record(Call::DestroyPipeline(pipeline));
    }

    fn create_render_pass(&self, info: &vk::RenderPassCreateInfo) -> VulkanResult<vk::RenderPass> {
        let render_pass: vk::RenderPass = self.issue();
        self.record(Call::CreateRenderPass {
            render_pass,
            attachments: info.attachment_count,
        });
        Ok(render_pass)
    }

    fn destroy_render_pass(&self, render_pass: vk::RenderPass) {
        self.release(render_pass, "render pass");
        self.record(Call::DestroyRenderPass(render_pass));
    }

    fn create_framebuffer(&self, info: &vk::FramebufferCreateInfo) -> VulkanResult<vk::Framebuffer> {
        self.require_live(info.render_pass, "render pass");
        let framebuffer: vk::Framebuffer = self.issue();
        self.record(Call::CreateFramebuffer {
            framebuffer,
            attachments: info.attachment_count,
        });
        Ok(framebuffer)
    }

    fn destroy_framebuffer(&self, framebuffer: vk::Framebuffer) {
        self.release(framebuffer, "framebuffer");
        self.record(Call::DestroyFramebuffer(framebuffer));
    }

    fn create_command_pool(&self, _flags: vk::CommandPoolCreateFlags) -> VulkanResult<vk::CommandPool> {
        let pool: vk::CommandPool = self.issue();
        self.record(Call::CreateCommandPool(pool));
        Ok(pool)
    }

    fn destroy_command_pool(&self, pool: vk::CommandPool) {
        self.release(pool, "command pool");
        self.record(Call::DestroyCommandPool(pool));
    }

    fn allocate_command_buffers(&self, pool: vk::CommandPool, count: u32) -> VulkanResult<Vec<vk::CommandBuffer>> {
        self.require_live(pool, "command pool");
        let buffers: Vec<vk::CommandBuffer> = (0..count).map(|_| self.issue()).collect();
        self.record(Call::AllocateCommandBuffers(buffers.clone()));
        Ok(buffers)
    }

    fn free_command_buffers(&self, pool: vk::CommandPool, buffers: &[vk::CommandBuffer]) {
        self.require_live(pool, "command pool");
        for &buffer in buffers {
            self.release(buffer, "command buffer");
        }
        self.record(Call::FreeCommandBuffers(buffers.to_vec()));
    }

    fn begin_command_buffer(
        &self,
        command_buffer: vk::CommandBuffer,
        _flags: vk::CommandBufferUsageFlags,
    ) -> VulkanResult<()> {
        self.require_live(command_buffer, "command buffer");
        self.record(Call::BeginCommandBuffer(command_buffer));
        Ok(())
    }

    fn end_command_buffer(&self, command_buffer: vk::CommandBuffer) -> VulkanResult<()> {
        self.record(Call::EndCommandBuffer(command_buffer));
        Ok(())
    }

    fn cmd_begin_render_pass(&self, command_buffer: vk::CommandBuffer, info: &vk::RenderPassBeginInfo) {
        self.require_live(info.framebuffer, "framebuffer");
        self.record(Call::BeginRenderPass {
            command_buffer,
            framebuffer: info.framebuffer,
            clear_values: info.clear_value_count,
        });
    }

    fn cmd_end_render_pass(&self, command_buffer: vk::CommandBuffer) {
        self.record(Call::EndRenderPass(command_buffer));
    }

    fn cmd_bind_pipeline(&self, command_buffer: vk::CommandBuffer, pipeline: vk::Pipeline) {
        self.require_live(pipeline, "pipeline");
        self.record(Call::BindPipeline { command_buffer, pipeline });
    }

    fn cmd_bind_vertex_buffer(&self, command_buffer: vk::CommandBuffer, buffer: vk::Buffer) {
        self.require_live(buffer, "vertex buffer");
        self.record(Call::BindVertexBuffer { command_buffer, buffer });
    }

    fn cmd_bind_index_buffer(&self, command_buffer: vk::CommandBuffer, buffer: vk::Buffer, index_type: vk::IndexType) {
        self.require_live(buffer, "index buffer");
        self.record(Call::BindIndexBuffer {
            command_buffer,
            buffer,
            index_type,
        });
    }

    fn cmd_bind_descriptor_set(
        &self,
        command_buffer: vk::CommandBuffer,
        _layout: vk::PipelineLayout,
        set: vk::DescriptorSet,
    ) {
        self.require_live(set, "descriptor set");
        self.record(Call::BindDescriptorSet { command_buffer, set });
    }

    fn cmd_push_constants(
        &self,
        command_buffer: vk::CommandBuffer,
        _layout: vk::PipelineLayout,
        stages: vk::ShaderStageFlags,
        offset: u32,
        data: &[u8],
    ) {
        self.record(Call::PushConstants {
            command_buffer,
            stages,
            offset,
            data: data.to_vec(),
        });
    }

    fn cmd_draw(&self, command_buffer: vk::CommandBuffer, vertex_count: u32, first_vertex: u32) {
        self.record(Call::Draw {
            command_buffer,
            vertex_count,
            first_vertex,
        });
    }

    fn cmd_draw_indexed(&self, command_buffer: vk::CommandBuffer, index_count: u32, first_index: u32, vertex_offset: i32) {
        self.record(Call::DrawIndexed {
            command_buffer,
            index_count,
            first_index,
            vertex_offset,
        });
    }

    fn cmd_pipeline_barrier(
        &self,
        _command_buffer: vk::CommandBuffer,
        src_stage: vk::PipelineStageFlags,
        dst_stage: vk::PipelineStageFlags,
        barriers: &[vk::ImageMemoryBarrier],
    ) {
        self.record(Call::PipelineBarrier {
            src_stage,
            dst_stage,
            barriers: barriers
                .iter()
                .map(|b| BarrierRecord {
                    image: b.image,
                    base_mip_level: b.subresource_range.base_mip_level,
                    level_count: b.subresource_range.level_count,
                    old_layout: b.old_layout,
                    new_layout: b.new_layout,
                })
                .collect(),
        });
    }

    fn cmd_copy_buffer(&self, _command_buffer: vk::CommandBuffer, src: vk::Buffer, dst: vk::Buffer, size: vk::DeviceSize) {
        self.require_live(src, "buffer");
        self.require_live(dst, "buffer");
        self.record(Call::CopyBuffer { src, dst, size });
    }

    fn cmd_copy_buffer_to_image(
        &self,
        _command_buffer: vk::CommandBuffer,
        buffer: vk::Buffer,
        image: vk::Image,
        width: u32,
        height: u32,
    ) {
        self.require_live(buffer, "buffer");
        self.require_live(image, "image");
        self.record(Call::CopyBufferToImage {
            buffer,
            image,
            width,
            height,
        });
    }

    fn cmd_blit_image(&self, _command_buffer: vk::CommandBuffer, image: vk::Image, region: &vk::ImageBlit) {
        self.record(Call::BlitImage {
            image,
            src_mip: region.src_subresource.mip_level,
            dst_mip: region.dst_subresource.mip_level,
            dst_extent: (region.dst_offsets[1].x, region.dst_offsets[1].y),
        });
    }

    fn create_semaphore(&self) -> VulkanResult<vk::Semaphore> {
        let semaphore: vk::Semaphore = self.issue();
        self.record(Call::CreateSemaphore(semaphore));
        Ok(semaphore)
    }

    fn destroy_semaphore(&self, semaphore: vk::Semaphore) {
        self.release(semaphore, "semaphore");
        self.record(Call::DestroySemaphore(semaphore));
    }

    fn create_fence(&self, signaled: bool) -> VulkanResult<vk::Fence> {
        let fence: vk::Fence = self.issue();
        let state = if signaled {
            FenceState::Signaled
        } else {
            FenceState::Unsignaled
        };
        self.fences.borrow_mut().insert(fence, state);
        self.record(Call::CreateFence { fence, signaled });
        Ok(fence)
    }

    fn destroy_fence(&self, fence: vk::Fence) {
        self.release(fence, "fence");
        if self.fences.borrow_mut().remove(&fence) == Some(FenceState::Pending) {
            self.violation(format!("fence {:#x} destroyed while pending", fence.as_raw()));
        }
        self.record(Call::DestroyFence(fence));
    }

    fn wait_for_fence(&self, fence: vk::Fence, _timeout: u64) -> VulkanResult<()> {
        self.record(Call::WaitForFence(fence));
        let mut fences = self.fences.borrow_mut();
        match fences.get(&fence).copied() {
            Some(FenceState::Signaled) => Ok(()),
            Some(FenceState::Pending) => {
                fences.insert(fence, FenceState::Signaled);
                Ok(())
            }
            Some(FenceState::Unsignaled) => {
                drop(fences);
                self.violation(format!("wait on fence {:#x} that nothing will signal", fence.as_raw()));
                Err(VulkanError::Api(vk::Result::TIMEOUT))
            }
            None => {
                drop(fences);
                self.violation(format!("wait on unknown fence {:#x}", fence.as_raw()));
                Err(VulkanError::ResourceNotFound { id: fence.as_raw() })
            }
        }
    }

    fn reset_fence(&self, fence: vk::Fence) -> VulkanResult<()> {
        self.record(Call::ResetFence(fence));
        let previous = self.fences.borrow_mut().insert(fence, FenceState::Unsignaled);
        if previous == Some(FenceState::Pending) {
            self.violation(format!("reset of pending fence {:#x}", fence.as_raw()));
        }
        Ok(())
    }

    fn create_swapchain(&self, info: &vk::SwapchainCreateInfoKHR) -> VulkanResult<vk::SwapchainKHR> {
        let swapchain: vk::SwapchainKHR = self.issue();
        let images = (0..self.swapchain_image_count.get())
            .map(|i| vk::Image::from_raw(0xF000_0000 + swapchain.as_raw() * 16 + u64::from(i)))
            .collect();
        self.swapchain_images.borrow_mut().insert(swapchain, images);
        self.next_image.set(0);
        self.record(Call::CreateSwapchain {
            swapchain,
            extent: info.image_extent,
            min_image_count: info.min_image_count,
            sharing_mode: info.image_sharing_mode,
        });
        Ok(swapchain)
    }

    fn destroy_swapchain(&self, swapchain: vk::SwapchainKHR) {
        self.release(swapchain, "swapchain");
        self.swapchain_images.borrow_mut().remove(&swapchain);
        self.record(Call::DestroySwapchain(swapchain));
    }

    fn swapchain_images(&self, swapchain: vk::SwapchainKHR) -> VulkanResult<Vec<vk::Image>> {
        self.swapchain_images
            .borrow()
            .get(&swapchain)
            .cloned()
            .ok_or(VulkanError::ResourceNotFound { id: swapchain.as_raw() })
    }

    fn acquire_next_image(&self, swapchain: vk::SwapchainKHR, semaphore: vk::Semaphore) -> VulkanResult<AcquireOutcome> {
        self.require_live(swapchain, "swapchain");
        let call = self.acquire_calls.get() + 1;
        self.acquire_calls.set(call);

        let outcome = if self.acquire_out_of_date_on.borrow().contains(&call) {
            AcquireOutcome::OutOfDate
        } else if let Some(index) = self.acquire_script.borrow_mut().pop_front() {
            AcquireOutcome::Acquired {
                index,
                suboptimal: false,
            }
        } else {
            let count = self.swapchain_image_count.get().max(1);
            let index = self.next_image.get() % count;
            self.next_image.set(index + 1);
            AcquireOutcome::Acquired {
                index,
                suboptimal: false,
            }
        };
        self.record(Call::AcquireNextImage { semaphore, outcome });
        Ok(outcome)
    }

    fn queue_submit(&self, request: &SubmitRequest) -> VulkanResult<()> {
        self.require_live(request.command_buffer, "command buffer");
        if request.fence != vk::Fence::null() {
            let mut fences = self.fences.borrow_mut();
            match fences.get(&request.fence).copied() {
                Some(FenceState::Unsignaled) => {
                    fences.insert(request.fence, FenceState::Pending);
                }
                state => {
                    drop(fences);
                    self.violation(format!(
                        "submit with fence {:#x} in state {state:?}",
                        request.fence.as_raw()
                    ));
                }
            }
        }
        self.record(Call::QueueSubmit {
            command_buffer: request.command_buffer,
            fence: request.fence,
            wait: request.wait_semaphore.map(|(semaphore, _)| semaphore),
            signal: request.signal_semaphore,
        });
        Ok(())
    }

    fn queue_present(
        &self,
        swapchain: vk::SwapchainKHR,
        image_index: u32,
        wait_semaphore: vk::Semaphore,
    ) -> VulkanResult<PresentOutcome> {
        self.require_live(swapchain, "swapchain");
        self.record(Call::QueuePresent {
            image_index,
            wait: wait_semaphore,
        });
        Ok(self.present_script.borrow_mut().pop_front().unwrap_or(PresentOutcome::Presented))
    }

    fn graphics_queue_wait_idle(&self) -> VulkanResult<()> {
        self.record(Call::GraphicsQueueWaitIdle);
        Ok(())
    }

    fn device_wait_idle(&self) -> VulkanResult<()> {
        let mut fences = self.fences.borrow_mut();
        for state in fences.values_mut() {
            if *state == FenceState::Pending {
                *state = FenceState::Signaled;
            }
        }
        drop(fences);
        self.record(Call::DeviceWaitIdle);
        Ok(())
    }
}

/// Serves 2x2 white RGBA images and remembers which paths were requested
#[derive(Default)]
pub struct FakeImageLoader {
    /// Paths passed to `load`, in call order
    pub requests: RefCell<Vec<String>>,
}

impl ImageLoader for FakeImageLoader {
    fn load(&self, path: &Path) -> AssetResult<ImageData> {
        self.requests.borrow_mut().push(path.display().to_string());
        Ok(ImageData::solid_color(2, 2, [255, 255, 255, 255]))
    }
}
