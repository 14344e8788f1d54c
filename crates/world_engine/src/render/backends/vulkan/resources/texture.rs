//! Sampled textures and the per-graph texture set
//!
//! Index 0 of every [`TextureSet`] is a 1x1 transparent placeholder so mesh
//! texture slots never need an "absent" value.

use ash::vk;
use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;

use super::buffer::Image;
use super::factory::{mip_level_count, ResourceFactory};
use crate::assets::{AssetError, AssetResult, ImageData, ImageLoader};
use crate::render::backends::vulkan::{DeviceProvider, VulkanError, VulkanResult};

/// Preferred maximum anisotropy, capped by the device limit
pub const MAX_ANISOTROPY: f32 = 16.0;

/// Vulkan format for a pixel layout
pub fn image_format(components: u8, bits: u8) -> AssetResult<vk::Format> {
    let format = match (components, bits) {
        (1, 8) => vk::Format::R8_SRGB,
        (1, 16) => vk::Format::R16_UNORM,
        (2, 8) => vk::Format::R8G8_SRGB,
        (2, 16) => vk::Format::R16G16_UNORM,
        (3, 8) => vk::Format::R8G8B8_SRGB,
        (3, 16) => vk::Format::R16G16B16_UNORM,
        (4, 8) => vk::Format::R8G8B8A8_SRGB,
        (4, 16) => vk::Format::R16G16B16A16_UNORM,
        _ => return Err(AssetError::UnsupportedImage { components, bits }),
    };
    Ok(format)
}

/// Image, view and sampler of one texture
pub struct Texture {
    device: Rc<dyn DeviceProvider>,
    image: Image,
    sampler: vk::Sampler,
    ready: bool,
}

impl Texture {
    /// Upload decoded pixels with a full mip chain and create the sampler
    pub fn from_image_data(factory: &ResourceFactory, data: &ImageData) -> VulkanResult<Self> {
        let format = image_format(data.components, data.bits)?;

        let expected = data.width as usize * data.height as usize * usize::from(data.components) * usize::from(data.bits / 8);
        if data.width == 0 || data.height == 0 || data.pixels.len() != expected {
            return Err(VulkanError::InvalidOperation {
                reason: format!(
                    "image of {}x{} with {} bytes does not match its layout",
                    data.width,
                    data.height,
                    data.pixels.len()
                ),
            });
        }

        let mip_levels = mip_level_count(data.width, data.height);
        log::debug!(
            "Creating texture {}x{} {:?} with {} mip levels",
            data.width,
            data.height,
            format,
            mip_levels
        );

        let mut staging = factory.create_staging_buffer(&data.pixels)?;
        let image = factory.create_texture_image(data.width, data.height, mip_levels, format, &staging)?;
        staging.destroy();

        let sampler = create_sampler(factory.device().as_ref(), mip_levels)?;

        Ok(Self {
            device: Rc::clone(factory.device()),
            image,
            sampler,
            ready: true,
        })
    }

    /// Backing image
    pub fn image(&self) -> &Image {
        &self.image
    }

    /// View over every mip level
    pub fn view(&self) -> vk::ImageView {
        self.image.view()
    }

    /// Sampler
    pub fn sampler(&self) -> vk::Sampler {
        self.sampler
    }

    /// Number of mip levels
    pub fn mip_levels(&self) -> u32 {
        self.image.mip_levels()
    }

    /// Whether the texture can be sampled
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Descriptor for a combined image sampler binding
    pub fn descriptor_info(&self) -> vk::DescriptorImageInfo {
        vk::DescriptorImageInfo {
            sampler: self.sampler,
            image_view: self.image.view(),
            image_layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        }
    }

    /// Destroy sampler, view, image and memory
    pub fn destroy(&mut self) {
        if !self.ready {
            return;
        }
        self.device.destroy_sampler(self.sampler);
        self.sampler = vk::Sampler::null();
        self.image.destroy();
        self.ready = false;
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        self.destroy();
    }
}

fn create_sampler(device: &dyn DeviceProvider, mip_levels: u32) -> VulkanResult<vk::Sampler> {
    let sampler_info = vk::SamplerCreateInfo::builder()
        .mag_filter(vk::Filter::LINEAR)
        .min_filter(vk::Filter::LINEAR)
        .address_mode_u(vk::SamplerAddressMode::REPEAT)
        .address_mode_v(vk::SamplerAddressMode::REPEAT)
        .address_mode_w(vk::SamplerAddressMode::REPEAT)
        .anisotropy_enable(true)
        .max_anisotropy(MAX_ANISOTROPY.min(device.max_sampler_anisotropy()))
        .border_color(vk::BorderColor::INT_OPAQUE_BLACK)
        .unnormalized_coordinates(false)
        .compare_enable(false)
        .compare_op(vk::CompareOp::ALWAYS)
        .mipmap_mode(vk::SamplerMipmapMode::LINEAR)
        .mip_lod_bias(0.0)
        .min_lod(0.0)
        .max_lod(mip_levels as f32);
    device.create_sampler(&sampler_info)
}

/// Flat array of textures addressed by index; index 0 is the placeholder
pub struct TextureSet {
    textures: Vec<Texture>,
}

impl TextureSet {
    /// Set holding only the transparent placeholder
    pub fn new(factory: &ResourceFactory) -> VulkanResult<Self> {
        let placeholder = Texture::from_image_data(factory, &ImageData::solid_color(1, 1, [0, 0, 0, 0]))?;
        Ok(Self {
            textures: vec![placeholder],
        })
    }

    /// Load each distinct path once, in first-seen order.
    ///
    /// Returns the texture index of every entry of `paths`.
    pub fn create_textures_from_paths(
        &mut self,
        factory: &ResourceFactory,
        loader: &dyn ImageLoader,
        paths: &[String],
    ) -> VulkanResult<Vec<u32>> {
        let mut loaded: HashMap<&str, u32> = HashMap::new();
        let mut indices = Vec::with_capacity(paths.len());

        for path in paths {
            if let Some(&index) = loaded.get(path.as_str()) {
                indices.push(index);
                continue;
            }
            let data = loader.load(Path::new(path))?;
            let index = self.push(Texture::from_image_data(factory, &data)?)?;
            log::debug!("Texture {} loaded from {}", index, path);
            loaded.insert(path.as_str(), index);
            indices.push(index);
        }
        Ok(indices)
    }

    /// Upload pre-decoded images; returns the index of each
    pub fn create_textures_from_images(
        &mut self,
        factory: &ResourceFactory,
        images: &[ImageData],
    ) -> VulkanResult<Vec<u32>> {
        images
            .iter()
            .map(|data| self.push(Texture::from_image_data(factory, data)?))
            .collect()
    }

    fn push(&mut self, texture: Texture) -> VulkanResult<u32> {
        let index = u32::try_from(self.textures.len()).map_err(|_| VulkanError::InvalidOperation {
            reason: "too many textures".to_string(),
        })?;
        self.textures.push(texture);
        Ok(index)
    }

    /// Texture by index
    pub fn get(&self, index: u32) -> Option<&Texture> {
        self.textures.get(index as usize)
    }

    /// Texture by index, or the placeholder when out of range
    pub fn get_or_placeholder(&self, index: u32) -> Option<&Texture> {
        self.get(index).or_else(|| self.textures.first())
    }

    /// Number of textures, placeholder included
    pub fn len(&self) -> usize {
        self.textures.len()
    }

    /// Whether the set holds no textures (after `destroy`)
    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    /// Destroy every texture once and empty the set
    pub fn destroy(&mut self) {
        for texture in &mut self.textures {
            texture.destroy();
        }
        self.textures.clear();
    }
}
