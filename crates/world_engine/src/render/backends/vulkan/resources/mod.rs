//! Vulkan resource management
//!
//! Buffers, images, textures and descriptor helpers. Everything here owns its
//! handles through an `Rc<dyn DeviceProvider>` and releases them exactly once.

/// Buffer and image handles with their memory
pub mod buffer;

/// Creation, staged upload and layout transitions
pub mod factory;

/// Textures and the per-graph texture set
pub mod texture;

/// Descriptor set layouts, pools and writes
pub mod descriptor_set;

pub use buffer::{Buffer, Image};
pub use descriptor_set::{
    scene_layout, scene_pool_sizes, DescriptorSetLayoutBuilder, DescriptorSetWriter, CAMERA_BINDING,
    FIRST_TEXTURE_BINDING, NODE_BINDING, TEXTURE_SLOT_COUNT,
};
pub use factory::{mip_level_count, ImageSpec, ResourceFactory};
pub use texture::{image_format, Texture, TextureSet};
