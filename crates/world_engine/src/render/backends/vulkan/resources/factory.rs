//! GPU resource factory
//!
//! Creates buffers and images with correctly sized memory, performs staged
//! uploads through one-shot command buffers, transitions image layouts and
//! builds mip chains.

use ash::vk;
use std::rc::Rc;

use super::buffer::{Buffer, Image};
use crate::render::backends::vulkan::{DeviceProvider, SubmitRequest, VulkanError, VulkanResult};

/// Parameters of a 2D image and its view
#[derive(Debug, Clone, Copy)]
pub struct ImageSpec {
    /// Width of level 0
    pub width: u32,
    /// Height of level 0
    pub height: u32,
    /// Number of mip levels
    pub mip_levels: u32,
    /// Samples per pixel
    pub samples: vk::SampleCountFlags,
    /// Pixel format
    pub format: vk::Format,
    /// Memory tiling
    pub tiling: vk::ImageTiling,
    /// Image usage
    pub usage: vk::ImageUsageFlags,
    /// Memory properties
    pub properties: vk::MemoryPropertyFlags,
    /// Aspect of the view
    pub aspect: vk::ImageAspectFlags,
}

impl ImageSpec {
    /// Single-sampled, optimally tiled, device-local color image
    pub fn color(width: u32, height: u32, format: vk::Format, usage: vk::ImageUsageFlags) -> Self {
        Self {
            width,
            height,
            mip_levels: 1,
            samples: vk::SampleCountFlags::TYPE_1,
            format,
            tiling: vk::ImageTiling::OPTIMAL,
            usage,
            properties: vk::MemoryPropertyFlags::DEVICE_LOCAL,
            aspect: vk::ImageAspectFlags::COLOR,
        }
    }
}

/// Number of levels in a full mip chain for the given size
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    let largest = width.max(height).max(1);
    u32::BITS - largest.leading_zeros()
}

/// Whether the format carries a stencil component
pub fn has_stencil_component(format: vk::Format) -> bool {
    matches!(format, vk::Format::D32_SFLOAT_S8_UINT | vk::Format::D24_UNORM_S8_UINT)
}

/// Factory for buffers, images and transfer work
pub struct ResourceFactory {
    device: Rc<dyn DeviceProvider>,
    command_pool: vk::CommandPool,
}

impl ResourceFactory {
    /// Create a factory with its own transient command pool
    pub fn new(device: Rc<dyn DeviceProvider>) -> VulkanResult<Self> {
        let command_pool = device.create_command_pool(vk::CommandPoolCreateFlags::TRANSIENT)?;
        Ok(Self { device, command_pool })
    }

    /// Device this factory creates resources on
    pub fn device(&self) -> &Rc<dyn DeviceProvider> {
        &self.device
    }

    /// Create a buffer backed by memory with the given properties
    pub fn create_buffer(
        &self,
        size: vk::DeviceSize,
        usage: vk::BufferUsageFlags,
        properties: vk::MemoryPropertyFlags,
    ) -> VulkanResult<Buffer> {
        let buffer_info = vk::BufferCreateInfo::builder()
            .size(size)
            .usage(usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE);

        let handle = self.device.create_buffer(&buffer_info)?;

        let requirements = self.device.buffer_memory_requirements(handle);
        let memory = match self
            .device
            .find_memory_type(requirements.memory_type_bits, properties)
            .and_then(|type_index| self.device.allocate_memory(requirements.size, type_index))
        {
            Ok(memory) => memory,
            Err(e) => {
                self.device.destroy_buffer(handle);
                return Err(e);
            }
        };

        // From here on the wrapper owns both handles
        let buffer = Buffer::from_parts(Rc::clone(&self.device), handle, memory, size);
        self.device.bind_buffer_memory(handle, memory)?;
        Ok(buffer)
    }

    /// Host-visible, coherent buffer for data rewritten every frame
    pub fn create_host_buffer(&self, size: vk::DeviceSize, usage: vk::BufferUsageFlags) -> VulkanResult<Buffer> {
        self.create_buffer(
            size,
            usage,
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
        )
    }

    /// Host-visible staging buffer holding `bytes`
    pub fn create_staging_buffer(&self, bytes: &[u8]) -> VulkanResult<Buffer> {
        let staging = self.create_host_buffer(bytes.len() as vk::DeviceSize, vk::BufferUsageFlags::TRANSFER_SRC)?;
        staging.write(bytes)?;
        Ok(staging)
    }

    /// Device-local buffer filled through a staging copy
    pub fn create_buffer_with_data(&self, usage: vk::BufferUsageFlags, bytes: &[u8]) -> VulkanResult<Buffer> {
        if bytes.is_empty() {
            return Err(VulkanError::InvalidOperation {
                reason: "cannot upload an empty buffer".to_string(),
            });
        }
        let size = bytes.len() as vk::DeviceSize;

        let mut staging = self.create_staging_buffer(bytes)?;
        let buffer = self.create_buffer(
            size,
            vk::BufferUsageFlags::TRANSFER_DST | usage,
            vk::MemoryPropertyFlags::DEVICE_LOCAL,
        )?;

        self.copy_buffer(&staging, &buffer, size)?;
        staging.destroy();
        Ok(buffer)
    }

    /// Create an image, its memory and a view over all levels
    pub fn create_image(&self, spec: &ImageSpec) -> VulkanResult<Image> {
        let image_info = vk::ImageCreateInfo::builder()
            .image_type(vk::ImageType::TYPE_2D)
            .extent(vk::Extent3D {
                width: spec.width,
                height: spec.height,
                depth: 1,
            })
            .mip_levels(spec.mip_levels)
            .array_layers(1)
            .format(spec.format)
            .tiling(spec.tiling)
            .initial_layout(vk::ImageLayout::UNDEFINED)
            .usage(spec.usage)
            .samples(spec.samples)
            .sharing_mode(vk::SharingMode::EXCLUSIVE);

        let handle = self.device.create_image(&image_info)?;

        let requirements = self.device.image_memory_requirements(handle);
        let memory = match self
            .device
            .find_memory_type(requirements.memory_type_bits, spec.properties)
            .and_then(|type_index| self.device.allocate_memory(requirements.size, type_index))
        {
            Ok(memory) => memory,
            Err(e) => {
                self.device.destroy_image(handle);
                return Err(e);
            }
        };

        let mut image = Image::from_parts(
            Rc::clone(&self.device),
            handle,
            memory,
            spec.format,
            vk::Extent2D {
                width: spec.width,
                height: spec.height,
            },
            spec.mip_levels,
        );
        self.device.bind_image_memory(handle, memory)?;

        let view = self.create_image_view(handle, spec.format, spec.aspect, spec.mip_levels)?;
        image.set_view(view);
        Ok(image)
    }

    /// 2D view over `mip_levels` levels of an image
    pub fn create_image_view(
        &self,
        image: vk::Image,
        format: vk::Format,
        aspect: vk::ImageAspectFlags,
        mip_levels: u32,
    ) -> VulkanResult<vk::ImageView> {
        let view_info = vk::ImageViewCreateInfo::builder()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(format)
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask: aspect,
                base_mip_level: 0,
                level_count: mip_levels,
                base_array_layer: 0,
                layer_count: 1,
            });
        self.device.create_image_view(&view_info)
    }

    /// Device-local sampled image filled from `staging` with a full mip chain.
    ///
    /// Every level ends in `SHADER_READ_ONLY_OPTIMAL`.
    pub fn create_texture_image(
        &self,
        width: u32,
        height: u32,
        mip_levels: u32,
        format: vk::Format,
        staging: &Buffer,
    ) -> VulkanResult<Image> {
        let spec = ImageSpec {
            mip_levels,
            ..ImageSpec::color(
                width,
                height,
                format,
                vk::ImageUsageFlags::TRANSFER_SRC | vk::ImageUsageFlags::TRANSFER_DST | vk::ImageUsageFlags::SAMPLED,
            )
        };
        let image = self.create_image(&spec)?;

        self.transition_image_layout(
            image.handle(),
            format,
            vk::ImageLayout::UNDEFINED,
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            mip_levels,
        )?;
        self.copy_buffer_to_image(staging, image.handle(), width, height)?;
        self.generate_mipmaps(image.handle(), format, width, height, mip_levels)?;

        Ok(image)
    }

    /// Blit each level from the previous one and leave the whole chain
    /// shader-readable. Expects every level in `TRANSFER_DST_OPTIMAL`.
    pub fn generate_mipmaps(
        &self,
        image: vk::Image,
        format: vk::Format,
        width: u32,
        height: u32,
        mip_levels: u32,
    ) -> VulkanResult<()> {
        let properties = self.device.format_properties(format);
        if !properties
            .optimal_tiling_features
            .contains(vk::FormatFeatureFlags::SAMPLED_IMAGE_FILTER_LINEAR)
        {
            return Err(VulkanError::UnsupportedFormat(format!(
                "{format:?} does not support linear blitting"
            )));
        }

        let device = Rc::clone(&self.device);
        self.single_time_commands(|command_buffer| {
            let level_barrier = |level: u32,
                                 old_layout: vk::ImageLayout,
                                 new_layout: vk::ImageLayout,
                                 src_access: vk::AccessFlags,
                                 dst_access: vk::AccessFlags| {
                vk::ImageMemoryBarrier::builder()
                    .old_layout(old_layout)
                    .new_layout(new_layout)
                    .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                    .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                    .image(image)
                    .subresource_range(vk::ImageSubresourceRange {
                        aspect_mask: vk::ImageAspectFlags::COLOR,
                        base_mip_level: level,
                        level_count: 1,
                        base_array_layer: 0,
                        layer_count: 1,
                    })
                    .src_access_mask(src_access)
                    .dst_access_mask(dst_access)
                    .build()
            };

            let mut mip_width = i32::try_from(width).unwrap_or(i32::MAX);
            let mut mip_height = i32::try_from(height).unwrap_or(i32::MAX);

            for level in 1..mip_levels {
                device.cmd_pipeline_barrier(
                    command_buffer,
                    vk::PipelineStageFlags::TRANSFER,
                    vk::PipelineStageFlags::TRANSFER,
                    &[level_barrier(
                        level - 1,
                        vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                        vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
                        vk::AccessFlags::TRANSFER_WRITE,
                        vk::AccessFlags::TRANSFER_READ,
                    )],
                );

                let next_width = (mip_width / 2).max(1);
                let next_height = (mip_height / 2).max(1);

                let blit = vk::ImageBlit {
                    src_subresource: vk::ImageSubresourceLayers {
                        aspect_mask: vk::ImageAspectFlags::COLOR,
                        mip_level: level - 1,
                        base_array_layer: 0,
                        layer_count: 1,
                    },
                    src_offsets: [
                        vk::Offset3D { x: 0, y: 0, z: 0 },
                        vk::Offset3D {
                            x: mip_width,
                            y: mip_height,
                            z: 1,
                        },
                    ],
                    dst_subresource: vk::ImageSubresourceLayers {
                        aspect_mask: vk::ImageAspectFlags::COLOR,
                        mip_level: level,
                        base_array_layer: 0,
                        layer_count: 1,
                    },
                    dst_offsets: [
                        vk::Offset3D { x: 0, y: 0, z: 0 },
                        vk::Offset3D {
                            x: next_width,
                            y: next_height,
                            z: 1,
                        },
                    ],
                };
                device.cmd_blit_image(command_buffer, image, &blit);

                device.cmd_pipeline_barrier(
                    command_buffer,
                    vk::PipelineStageFlags::TRANSFER,
                    vk::PipelineStageFlags::FRAGMENT_SHADER,
                    &[level_barrier(
                        level - 1,
                        vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
                        vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
                        vk::AccessFlags::TRANSFER_READ,
                        vk::AccessFlags::SHADER_READ,
                    )],
                );

                mip_width = next_width;
                mip_height = next_height;
            }

            device.cmd_pipeline_barrier(
                command_buffer,
                vk::PipelineStageFlags::TRANSFER,
                vk::PipelineStageFlags::FRAGMENT_SHADER,
                &[level_barrier(
                    mip_levels.saturating_sub(1),
                    vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                    vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
                    vk::AccessFlags::TRANSFER_WRITE,
                    vk::AccessFlags::SHADER_READ,
                )],
            );
            Ok(())
        })
    }

    /// Move every level of an image between the supported layouts
    pub fn transition_image_layout(
        &self,
        image: vk::Image,
        format: vk::Format,
        old_layout: vk::ImageLayout,
        new_layout: vk::ImageLayout,
        mip_levels: u32,
    ) -> VulkanResult<()> {
        let (src_access, dst_access, src_stage, dst_stage) = match (old_layout, new_layout) {
            (vk::ImageLayout::UNDEFINED, vk::ImageLayout::TRANSFER_DST_OPTIMAL) => (
                vk::AccessFlags::empty(),
                vk::AccessFlags::TRANSFER_WRITE,
                vk::PipelineStageFlags::TOP_OF_PIPE,
                vk::PipelineStageFlags::TRANSFER,
            ),
            (vk::ImageLayout::TRANSFER_DST_OPTIMAL, vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL) => (
                vk::AccessFlags::TRANSFER_WRITE,
                vk::AccessFlags::SHADER_READ,
                vk::PipelineStageFlags::TRANSFER,
                vk::PipelineStageFlags::FRAGMENT_SHADER,
            ),
            (vk::ImageLayout::UNDEFINED, vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL) => (
                vk::AccessFlags::empty(),
                vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_READ | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
                vk::PipelineStageFlags::TOP_OF_PIPE,
                vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS,
            ),
            _ => {
                return Err(VulkanError::InvalidOperation {
                    reason: format!("unsupported layout transition {old_layout:?} -> {new_layout:?}"),
                })
            }
        };

        let aspect_mask = if new_layout == vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL {
            if has_stencil_component(format) {
                vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL
            } else {
                vk::ImageAspectFlags::DEPTH
            }
        } else {
            vk::ImageAspectFlags::COLOR
        };

        let barrier = vk::ImageMemoryBarrier::builder()
            .old_layout(old_layout)
            .new_layout(new_layout)
            .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .image(image)
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask,
                base_mip_level: 0,
                level_count: mip_levels,
                base_array_layer: 0,
                layer_count: 1,
            })
            .src_access_mask(src_access)
            .dst_access_mask(dst_access)
            .build();

        let device = Rc::clone(&self.device);
        self.single_time_commands(|command_buffer| {
            device.cmd_pipeline_barrier(command_buffer, src_stage, dst_stage, &[barrier]);
            Ok(())
        })
    }

    /// Copy `size` bytes from one buffer to another
    pub fn copy_buffer(&self, src: &Buffer, dst: &Buffer, size: vk::DeviceSize) -> VulkanResult<()> {
        let device = Rc::clone(&self.device);
        self.single_time_commands(|command_buffer| {
            device.cmd_copy_buffer(command_buffer, src.handle(), dst.handle(), size);
            Ok(())
        })
    }

    /// Copy a tightly packed staging buffer into level 0 of an image
    pub fn copy_buffer_to_image(&self, buffer: &Buffer, image: vk::Image, width: u32, height: u32) -> VulkanResult<()> {
        let device = Rc::clone(&self.device);
        self.single_time_commands(|command_buffer| {
            device.cmd_copy_buffer_to_image(command_buffer, buffer.handle(), image, width, height);
            Ok(())
        })
    }

    /// Record with `record` into a fresh primary buffer, submit it to the
    /// graphics queue and wait for the queue to drain
    pub fn single_time_commands<F>(&self, record: F) -> VulkanResult<()>
    where
        F: FnOnce(vk::CommandBuffer) -> VulkanResult<()>,
    {
        let command_buffers = self.device.allocate_command_buffers(self.command_pool, 1)?;
        let result = self.submit_one_shot(&command_buffers, record);
        self.device.free_command_buffers(self.command_pool, &command_buffers);
        result
    }

    fn submit_one_shot<F>(&self, command_buffers: &[vk::CommandBuffer], record: F) -> VulkanResult<()>
    where
        F: FnOnce(vk::CommandBuffer) -> VulkanResult<()>,
    {
        let command_buffer = command_buffers.first().copied().ok_or_else(|| VulkanError::InvalidOperation {
            reason: "no command buffer allocated".to_string(),
        })?;

        self.device
            .begin_command_buffer(command_buffer, vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT)?;
        record(command_buffer)?;
        self.device.end_command_buffer(command_buffer)?;

        self.device.queue_submit(&SubmitRequest::one_shot(command_buffer))?;
        self.device.graphics_queue_wait_idle()
    }
}

impl Drop for ResourceFactory {
    fn drop(&mut self) {
        self.device.destroy_command_pool(self.command_pool);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::backends::vulkan::mock::{BarrierRecord, Call, MockDevice, DEVICE_LOCAL_TYPE, HOST_VISIBLE_TYPE};

    fn setup() -> (Rc<MockDevice>, ResourceFactory) {
        let mock = Rc::new(MockDevice::new());
        let factory = ResourceFactory::new(mock.clone()).unwrap();
        (mock, factory)
    }

    #[test]
    fn test_mip_level_count() {
        assert_eq!(mip_level_count(1, 1), 1);
        assert_eq!(mip_level_count(2, 1), 2);
        assert_eq!(mip_level_count(512, 512), 10);
        assert_eq!(mip_level_count(640, 480), 10);
        assert_eq!(mip_level_count(1024, 3), 11);
    }

    #[test]
    fn test_buffer_memory_sized_to_requirement() {
        let (mock, factory) = setup();
        let buffer = factory
            .create_buffer(100, vk::BufferUsageFlags::VERTEX_BUFFER, vk::MemoryPropertyFlags::DEVICE_LOCAL)
            .unwrap();

        assert_eq!(buffer.size(), 100);
        let allocation = mock
            .calls()
            .into_iter()
            .find_map(|call| match call {
                Call::AllocateMemory { size, type_index, .. } => Some((size, type_index)),
                _ => None,
            })
            .unwrap();
        assert_eq!(allocation, (256, DEVICE_LOCAL_TYPE));
    }

    #[test]
    fn test_buffer_destroy_is_idempotent() {
        let (mock, factory) = setup();
        let mut buffer = factory.create_host_buffer(64, vk::BufferUsageFlags::UNIFORM_BUFFER).unwrap();
        let handle = buffer.handle();
        let memory = buffer.memory();

        buffer.destroy();
        buffer.destroy();
        drop(buffer);

        let calls = mock.calls();
        let destroy_at = calls.iter().position(|c| *c == Call::DestroyBuffer(handle)).unwrap();
        let free_at = calls.iter().position(|c| *c == Call::FreeMemory(memory)).unwrap();
        assert!(destroy_at < free_at);
        assert_eq!(calls.iter().filter(|c| **c == Call::DestroyBuffer(handle)).count(), 1);
        assert!(mock.violations().is_empty());
    }

    #[test]
    fn test_image_destroy_is_idempotent() {
        let (mock, factory) = setup();
        let mut image = factory
            .create_image(&ImageSpec::color(4, 4, vk::Format::R8G8B8A8_SRGB, vk::ImageUsageFlags::SAMPLED))
            .unwrap();
        assert!(image.is_allocated());

        image.destroy();
        image.destroy();
        assert!(!image.is_allocated());
        drop(image);
        drop(factory);

        assert!(mock.violations().is_empty());
        assert_eq!(mock.live_handle_count(), 0);
    }

    #[test]
    fn test_staged_upload() {
        let (mock, factory) = setup();
        mock.clear_calls();
        let bytes = [1_u8, 2, 3, 4, 5, 6, 7, 8];
        let buffer = factory
            .create_buffer_with_data(vk::BufferUsageFlags::VERTEX_BUFFER, &bytes)
            .unwrap();

        let calls = mock.calls();
        let staging = calls
            .iter()
            .find_map(|c| match c {
                Call::CreateBuffer { buffer, usage, .. } if *usage == vk::BufferUsageFlags::TRANSFER_SRC => Some(*buffer),
                _ => None,
            })
            .unwrap();
        let host_allocations = calls
            .iter()
            .filter(|c| matches!(c, Call::AllocateMemory { type_index, .. } if *type_index == HOST_VISIBLE_TYPE))
            .count();
        assert_eq!(host_allocations, 1);
        assert!(calls.contains(&Call::CopyBuffer {
            src: staging,
            dst: buffer.handle(),
            size: 8
        }));
        assert!(calls.contains(&Call::DestroyBuffer(staging)));
        assert!(calls.contains(&Call::GraphicsQueueWaitIdle));
        assert!(mock.is_live(buffer.handle()));
        assert!(!mock.is_live(staging));
    }

    #[test]
    fn test_empty_upload_rejected() {
        let (_mock, factory) = setup();
        let result = factory.create_buffer_with_data(vk::BufferUsageFlags::INDEX_BUFFER, &[]);
        assert!(matches!(result, Err(VulkanError::InvalidOperation { .. })));
    }

    #[test]
    fn test_mip_chain_barrier_sequence() {
        let (mock, factory) = setup();
        let staging = factory.create_staging_buffer(&[0_u8; 64]).unwrap();
        mock.clear_calls();

        let image = factory
            .create_texture_image(4, 4, 3, vk::Format::R8G8B8A8_SRGB, &staging)
            .unwrap();
        let handle = image.handle();

        let barrier = |level, old_layout, new_layout| BarrierRecord {
            image: handle,
            base_mip_level: level,
            level_count: 1,
            old_layout,
            new_layout,
        };
        let dst = vk::ImageLayout::TRANSFER_DST_OPTIMAL;
        let src = vk::ImageLayout::TRANSFER_SRC_OPTIMAL;
        let read = vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL;

        let transfer_ops: Vec<Call> = mock
            .calls()
            .into_iter()
            .filter(|c| matches!(c, Call::PipelineBarrier { .. } | Call::BlitImage { .. } | Call::CopyBufferToImage { .. }))
            .map(|c| match c {
                Call::PipelineBarrier { barriers, .. } => Call::PipelineBarrier {
                    src_stage: vk::PipelineStageFlags::empty(),
                    dst_stage: vk::PipelineStageFlags::empty(),
                    barriers,
                },
                other => other,
            })
            .collect();

        let barrier_call = |record: BarrierRecord| Call::PipelineBarrier {
            src_stage: vk::PipelineStageFlags::empty(),
            dst_stage: vk::PipelineStageFlags::empty(),
            barriers: vec![record],
        };

        let expected = vec![
            barrier_call(BarrierRecord {
                level_count: 3,
                ..barrier(0, vk::ImageLayout::UNDEFINED, dst)
            }),
            Call::CopyBufferToImage {
                buffer: staging.handle(),
                image: handle,
                width: 4,
                height: 4,
            },
            barrier_call(barrier(0, dst, src)),
            Call::BlitImage {
                image: handle,
                src_mip: 0,
                dst_mip: 1,
                dst_extent: (2, 2),
            },
            barrier_call(barrier(0, src, read)),
            barrier_call(barrier(1, dst, src)),
            Call::BlitImage {
                image: handle,
                src_mip: 1,
                dst_mip: 2,
                dst_extent: (1, 1),
            },
            barrier_call(barrier(1, src, read)),
            barrier_call(barrier(2, dst, read)),
        ];
        assert_eq!(transfer_ops, expected);
    }

    #[test]
    fn test_mip_generation_requires_linear_blit() {
        let (mock, factory) = setup();
        mock.set_linear_blit_supported(false);
        let staging = factory.create_staging_buffer(&[0_u8; 16]).unwrap();

        let result = factory.create_texture_image(2, 2, 2, vk::Format::R8G8B8A8_SRGB, &staging);
        assert!(matches!(result, Err(VulkanError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_unsupported_transition() {
        let (_mock, factory) = setup();
        let result = factory.transition_image_layout(
            vk::Image::null(),
            vk::Format::R8G8B8A8_SRGB,
            vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            1,
        );
        assert!(matches!(result, Err(VulkanError::InvalidOperation { .. })));
    }

    #[test]
    fn test_depth_transition_adds_stencil_aspect() {
        let (mock, factory) = setup();
        mock.clear_calls();
        factory
            .transition_image_layout(
                vk::Image::null(),
                vk::Format::D24_UNORM_S8_UINT,
                vk::ImageLayout::UNDEFINED,
                vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
                1,
            )
            .unwrap();
        let stages = mock.calls().into_iter().find_map(|c| match c {
            Call::PipelineBarrier { dst_stage, .. } => Some(dst_stage),
            _ => None,
        });
        assert_eq!(stages, Some(vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS));
        assert!(has_stencil_component(vk::Format::D24_UNORM_S8_UINT));
        assert!(!has_stencil_component(vk::Format::D32_SFLOAT));
    }
}
