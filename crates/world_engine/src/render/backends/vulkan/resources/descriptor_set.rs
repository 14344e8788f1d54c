//! Descriptor set layouts, pool sizing and writes
//!
//! The scene uses a single layout: camera uniform at binding 0, node uniform
//! at binding 1 and the five material samplers at bindings 2..=6.

use ash::vk;

use crate::render::backends::vulkan::{DeviceProvider, VulkanResult};

/// Camera uniform buffer binding
pub const CAMERA_BINDING: u32 = 0;
/// Node uniform buffer binding
pub const NODE_BINDING: u32 = 1;
/// First of the material sampler bindings
pub const FIRST_TEXTURE_BINDING: u32 = 2;
/// Number of material sampler bindings
pub const TEXTURE_SLOT_COUNT: u32 = 5;

/// Descriptor set layout builder for creating reusable layouts
#[derive(Debug, Clone, Default)]
pub struct DescriptorSetLayoutBuilder {
    bindings: Vec<vk::DescriptorSetLayoutBinding>,
}

impl DescriptorSetLayoutBuilder {
    /// Create a new descriptor set layout builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a uniform buffer binding
    pub fn add_uniform_buffer(self, binding: u32, stage_flags: vk::ShaderStageFlags) -> Self {
        self.add(binding, vk::DescriptorType::UNIFORM_BUFFER, stage_flags)
    }

    /// Add a combined image sampler binding
    pub fn add_combined_image_sampler(self, binding: u32, stage_flags: vk::ShaderStageFlags) -> Self {
        self.add(binding, vk::DescriptorType::COMBINED_IMAGE_SAMPLER, stage_flags)
    }

    fn add(mut self, binding: u32, descriptor_type: vk::DescriptorType, stage_flags: vk::ShaderStageFlags) -> Self {
        self.bindings.push(
            vk::DescriptorSetLayoutBinding::builder()
                .binding(binding)
                .descriptor_type(descriptor_type)
                .descriptor_count(1)
                .stage_flags(stage_flags)
                .build(),
        );
        self
    }

    /// Bindings added so far
    pub fn bindings(&self) -> &[vk::DescriptorSetLayoutBinding] {
        &self.bindings
    }

    /// Create the layout; the caller owns the handle
    pub fn build(&self, device: &dyn DeviceProvider) -> VulkanResult<vk::DescriptorSetLayout> {
        device.create_descriptor_set_layout(&self.bindings)
    }
}

/// The seven-binding scene layout
pub fn scene_layout() -> DescriptorSetLayoutBuilder {
    (0..TEXTURE_SLOT_COUNT).fold(
        DescriptorSetLayoutBuilder::new()
            .add_uniform_buffer(CAMERA_BINDING, vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT)
            .add_uniform_buffer(NODE_BINDING, vk::ShaderStageFlags::VERTEX),
        |builder, slot| builder.add_combined_image_sampler(FIRST_TEXTURE_BINDING + slot, vk::ShaderStageFlags::FRAGMENT),
    )
}

/// Pool sizes for `set_count` scene sets: two uniform buffers and five
/// samplers per set
pub fn scene_pool_sizes(set_count: u32) -> [vk::DescriptorPoolSize; 2] {
    [
        vk::DescriptorPoolSize {
            ty: vk::DescriptorType::UNIFORM_BUFFER,
            descriptor_count: 2 * set_count,
        },
        vk::DescriptorPoolSize {
            ty: vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
            descriptor_count: TEXTURE_SLOT_COUNT * set_count,
        },
    ]
}

/// Batches descriptor writes and submits them in one update.
///
/// Buffer and image infos are owned by the writer; the raw write structs that
/// point at them are only built inside [`update`](Self::update).
#[derive(Debug, Default)]
pub struct DescriptorSetWriter {
    buffers: Vec<(vk::DescriptorSet, u32, vk::DescriptorBufferInfo)>,
    images: Vec<(vk::DescriptorSet, u32, vk::DescriptorImageInfo)>,
}

impl DescriptorSetWriter {
    /// Create a new descriptor set writer
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a whole uniform buffer to a binding
    pub fn write_buffer(mut self, set: vk::DescriptorSet, binding: u32, buffer: vk::Buffer, range: vk::DeviceSize) -> Self {
        self.buffers.push((
            set,
            binding,
            vk::DescriptorBufferInfo {
                buffer,
                offset: 0,
                range,
            },
        ));
        self
    }

    /// Write a combined image sampler to a binding
    pub fn write_image(mut self, set: vk::DescriptorSet, binding: u32, info: vk::DescriptorImageInfo) -> Self {
        self.images.push((set, binding, info));
        self
    }

    /// Number of queued writes
    pub fn len(&self) -> usize {
        self.buffers.len() + self.images.len()
    }

    /// Whether nothing is queued
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Execute all write operations
    pub fn update(&self, device: &dyn DeviceProvider) {
        let buffer_writes = self.buffers.iter().map(|(set, binding, info)| {
            vk::WriteDescriptorSet::builder()
                .dst_set(*set)
                .dst_binding(*binding)
                .dst_array_element(0)
                .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                .buffer_info(std::slice::from_ref(info))
                .build()
        });
        let image_writes = self.images.iter().map(|(set, binding, info)| {
            vk::WriteDescriptorSet::builder()
                .dst_set(*set)
                .dst_binding(*binding)
                .dst_array_element(0)
                .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                .image_info(std::slice::from_ref(info))
                .build()
        });
        let writes: Vec<vk::WriteDescriptorSet> = buffer_writes.chain(image_writes).collect();
        if !writes.is_empty() {
            device.update_descriptor_sets(&writes);
        }
    }
}
