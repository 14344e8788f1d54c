//! Buffer and image handles with their backing memory
//!
//! Both wrappers release the handle before the memory and are safe to
//! destroy more than once; `Drop` runs the same teardown.

use ash::vk;
use std::rc::Rc;

use crate::render::backends::vulkan::{DeviceProvider, VulkanResult};

/// Buffer wrapper with memory management
pub struct Buffer {
    device: Rc<dyn DeviceProvider>,
    handle: vk::Buffer,
    memory: vk::DeviceMemory,
    size: vk::DeviceSize,
    allocated: bool,
}

impl Buffer {
    pub(crate) fn from_parts(
        device: Rc<dyn DeviceProvider>,
        handle: vk::Buffer,
        memory: vk::DeviceMemory,
        size: vk::DeviceSize,
    ) -> Self {
        Self {
            device,
            handle,
            memory,
            size,
            allocated: true,
        }
    }

    /// Get buffer handle
    pub fn handle(&self) -> vk::Buffer {
        self.handle
    }

    /// Get the backing memory
    pub fn memory(&self) -> vk::DeviceMemory {
        self.memory
    }

    /// Requested size in bytes
    pub fn size(&self) -> vk::DeviceSize {
        self.size
    }

    /// Whether the handle and memory are still alive
    pub fn is_allocated(&self) -> bool {
        self.allocated
    }

    /// Copy bytes into host-visible memory (map, copy, unmap)
    pub fn write(&self, data: &[u8]) -> VulkanResult<()> {
        self.device.write_memory(self.memory, 0, data)
    }

    /// Destroy the buffer, then free its memory
    pub fn destroy(&mut self) {
        if !self.allocated {
            return;
        }
        self.device.destroy_buffer(self.handle);
        self.device.free_memory(self.memory);
        self.handle = vk::Buffer::null();
        self.memory = vk::DeviceMemory::null();
        self.allocated = false;
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        self.destroy();
    }
}

/// Image wrapper owning its memory and a single view
pub struct Image {
    device: Rc<dyn DeviceProvider>,
    handle: vk::Image,
    memory: vk::DeviceMemory,
    view: vk::ImageView,
    format: vk::Format,
    extent: vk::Extent2D,
    mip_levels: u32,
    allocated: bool,
}

impl Image {
    pub(crate) fn from_parts(
        device: Rc<dyn DeviceProvider>,
        handle: vk::Image,
        memory: vk::DeviceMemory,
        format: vk::Format,
        extent: vk::Extent2D,
        mip_levels: u32,
    ) -> Self {
        Self {
            device,
            handle,
            memory,
            view: vk::ImageView::null(),
            format,
            extent,
            mip_levels,
            allocated: true,
        }
    }

    pub(crate) fn set_view(&mut self, view: vk::ImageView) {
        self.view = view;
    }

    /// Image handle
    pub fn handle(&self) -> vk::Image {
        self.handle
    }

    /// View over every mip level
    pub fn view(&self) -> vk::ImageView {
        self.view
    }

    /// Backing memory
    pub fn memory(&self) -> vk::DeviceMemory {
        self.memory
    }

    /// Pixel format
    pub fn format(&self) -> vk::Format {
        self.format
    }

    /// Size of mip level 0
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    /// Number of mip levels
    pub fn mip_levels(&self) -> u32 {
        self.mip_levels
    }

    /// Whether the handles are still alive
    pub fn is_allocated(&self) -> bool {
        self.allocated
    }

    /// Destroy view and image, then free the memory
    pub fn destroy(&mut self) {
        if !self.allocated {
            return;
        }
        if self.view != vk::ImageView::null() {
            self.device.destroy_image_view(self.view);
        }
        self.device.destroy_image(self.handle);
        self.device.free_memory(self.memory);
        self.view = vk::ImageView::null();
        self.handle = vk::Image::null();
        self.memory = vk::DeviceMemory::null();
        self.allocated = false;
    }
}

impl Drop for Image {
    fn drop(&mut self) {
        self.destroy();
    }
}
